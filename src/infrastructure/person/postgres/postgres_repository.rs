use std::time::Duration;

use sqlx::{postgres::PgRow, Error, PgConnection, PgPool, Row};
use tokio::time;

use crate::domain::person::{Person, PersonId, PersonRepository, PersonRepositoryError};

impl From<Error> for PersonRepositoryError {
    fn from(value: Error) -> Self {
        match value {
            Error::RowNotFound => Self::PersonNotFound,
            _ => Self::InternalError(value.to_string()),
        }
    }
}

impl TryFrom<PgRow> for Person {
    type Error = PersonRepositoryError;

    fn try_from(value: PgRow) -> Result<Self, Self::Error> {
        let id: i64 = value.try_get("id")?;
        let first_name: &str = value.try_get("first_name")?;
        let last_name: &str = value.try_get("last_name")?;
        let email: &str = value.try_get("email")?;
        return Ok(Person::new(PersonId::new(id), first_name, last_name, email));
    }
}

#[derive(Debug, Clone)]
pub struct PostgresPersonRepository {
    pool: PgPool,
    timeout: u64,
}

async fn init_table_async(pool: &PgPool, timeout: u64) -> Result<(), PersonRepositoryError> {
    let create_table_queries = [
        r#"CREATE TABLE IF NOT EXISTS persons (
        id BIGINT PRIMARY KEY,
        first_name VARCHAR(50),
        last_name VARCHAR(50),
        email VARCHAR(100)
    )"#,
        r#"CREATE TABLE IF NOT EXISTS users (
        id BIGINT PRIMARY KEY,
        username VARCHAR(50) UNIQUE
    )"#,
    ];
    for create_table_query in create_table_queries {
        let _result = time::timeout(
            Duration::from_millis(timeout),
            sqlx::query(create_table_query).execute(pool),
        )
        .await
        .map_err(|e| PersonRepositoryError::InternalError(e.to_string()))??;
    }
    Ok(())
}

/// Runs a `DELETE ... WHERE id = $1` on the given connection and returns the
/// number of removed rows.
async fn delete_by_id(
    connection: &mut PgConnection,
    query: &str,
    id: &PersonId,
    timeout: u64,
) -> Result<u64, PersonRepositoryError> {
    let result = time::timeout(
        Duration::from_millis(timeout),
        sqlx::query(query).bind(id.value()).execute(connection),
    )
    .await
    .map_err(|e| PersonRepositoryError::InternalError(e.to_string()))??;
    Ok(result.rows_affected())
}

impl PostgresPersonRepository {
    pub async fn new(pool: PgPool, timeout: u64) -> Result<Self, PersonRepositoryError> {
        init_table_async(&pool, timeout).await?;
        Ok(Self { pool, timeout })
    }
}

/// Wraps a search term for a substring `ILIKE` match, escaping its wildcards.
fn like_pattern(search_term: &str) -> String {
    let escaped = search_term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait::async_trait]
impl PersonRepository for PostgresPersonRepository {
    async fn update_person(&self, person: &Person) -> Result<(), PersonRepositoryError> {
        let result = time::timeout(
            Duration::from_millis(self.timeout),
            sqlx::query(
                "UPDATE persons SET first_name = $2, last_name = $3, email = $4 WHERE id = $1;",
            )
            .bind(person.id().value())
            .bind(person.first_name())
            .bind(person.last_name())
            .bind(person.email())
            .execute(&self.pool),
        )
        .await
        .map_err(|e| PersonRepositoryError::InternalError(e.to_string()))??;
        if result.rows_affected() == 0 {
            return Err(PersonRepositoryError::PersonNotFound);
        }
        Ok(())
    }

    async fn get_person_by_id(&self, id: &PersonId) -> Result<Person, PersonRepositoryError> {
        let person_found = time::timeout(
            Duration::from_millis(self.timeout),
            sqlx::query("SELECT id, first_name, last_name, email FROM persons WHERE id = $1;")
                .bind(id.value())
                .fetch_one(&self.pool),
        )
        .await
        .map_err(|e| PersonRepositoryError::InternalError(e.to_string()))??;
        return Ok(person_found.try_into()?);
    }

    async fn get_persons(&self) -> Result<Vec<Person>, PersonRepositoryError> {
        let result = time::timeout(
            Duration::from_millis(self.timeout),
            sqlx::query("SELECT id, first_name, last_name, email FROM persons ORDER BY id;")
                .fetch_all(&self.pool),
        )
        .await
        .map_err(|e| PersonRepositoryError::InternalError(e.to_string()))??;
        result.into_iter().map(Person::try_from).collect()
    }

    async fn search_persons(
        &self,
        search_term: &str,
    ) -> Result<Vec<Person>, PersonRepositoryError> {
        let result = time::timeout(
            Duration::from_millis(self.timeout),
            sqlx::query(
                "SELECT id, first_name, last_name, email FROM persons WHERE first_name ILIKE $1 OR last_name ILIKE $1 ORDER BY id;",
            )
            .bind(like_pattern(search_term))
            .fetch_all(&self.pool),
        )
        .await
        .map_err(|e| PersonRepositoryError::InternalError(e.to_string()))??;
        result.into_iter().map(Person::try_from).collect()
    }

    async fn delete_person_and_user(&self, id: &PersonId) -> Result<(), PersonRepositoryError> {
        let mut tx = self.pool.begin().await?;
        let persons_deleted = match delete_by_id(
            &mut *tx,
            "DELETE FROM persons WHERE id = $1",
            id,
            self.timeout,
        )
        .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tx.rollback().await?;
                return Err(e);
            }
        };
        if persons_deleted == 0 {
            tx.rollback().await?;
            return Err(PersonRepositoryError::PersonNotFound);
        }
        match delete_by_id(&mut *tx, "DELETE FROM users WHERE id = $1", id, self.timeout).await {
            Ok(0) => {
                tracing::warn!(person_id = %id, "Person {} had no user account to delete", id);
            }
            Ok(_) => {}
            Err(e) => {
                tx.rollback().await?;
                return Err(e);
            }
        }
        tx.commit().await?;
        Ok(())
    }
}
