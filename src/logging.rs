use std::io;

use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
#[error("Failed to setup logging with error: {0}")]
pub struct LoggingError(String);

/// JSON logs on stdout, filtered by `RUST_LOG` (`info` when unset).
pub fn setup_logging() -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .flatten_event(true)
        .with_thread_ids(true)
        .with_writer(io::stdout)
        .try_init()
        .map_err(|e| LoggingError(e.to_string()))
}
