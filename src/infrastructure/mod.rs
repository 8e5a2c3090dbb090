use std::time::Duration;

use sqlx::PgPool;
use tokio::time;

#[cfg(test)]
pub mod memory;
pub mod person;

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("database connection timed out after {0}ms")]
    Timeout(u64),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Opens the pool shared by the repositories.
pub async fn connect(url: &str, timeout: u64) -> Result<PgPool, ConnectionError> {
    let pool = time::timeout(Duration::from_millis(timeout), PgPool::connect(url))
        .await
        .map_err(|_| ConnectionError::Timeout(timeout))??;
    Ok(pool)
}
