use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{debug, instrument, warn};

use super::kv::{KvStore, StorageError};

/// PostgreSQL implementation of the blob store
///
/// Expects a `herald_store` table:
///
/// ```sql
/// CREATE TABLE herald_store (
///     key   TEXT PRIMARY KEY,
///     value BYTEA NOT NULL
/// );
/// ```
pub struct PostgresKvStore {
    pool: PgPool,
}

impl PostgresKvStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KvStore for PostgresKvStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        debug!(key = %key, "Fetching blob from database");

        let row = sqlx::query("SELECT value FROM herald_store WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, key = %key, "Failed to fetch blob from database");
                StorageError::Backend(e.to_string())
            })?;

        Ok(row.map(|row| row.get("value")))
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        debug!(key = %key, bytes = value.len(), "Storing blob in database");

        sqlx::query(
            "INSERT INTO herald_store (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(key)
        .bind(&value)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, key = %key, "Failed to store blob in database");
            StorageError::Backend(e.to_string())
        })?;

        Ok(())
    }
}
