use crate::application::ports::KeyValueStore;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Sqlite};

/// Durable key-value storage over the app's sqlite database. Each `set`
/// completes its write before returning, which is what lets the queue treat
/// its in-memory counters as authoritative afterwards.
pub struct SqliteKvStore {
    pool: Pool<Sqlite>,
}

impl SqliteKvStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyValueStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM kv_entries WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let now = Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM kv_entries WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::ConnectionPool;

    async fn setup_store() -> SqliteKvStore {
        let pool = ConnectionPool::from_memory().await.unwrap();
        pool.initialize_schema().await.unwrap();
        SqliteKvStore::new(pool.get_pool().clone())
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = setup_store().await;

        store.set("sync::request_queue", "[]").await.unwrap();
        assert_eq!(
            store.get("sync::request_queue").await.unwrap().as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn set_overwrites_existing_value() {
        let store = setup_store().await;

        store.set("k", "first").await.unwrap();
        store.set("k", "second").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn remove_is_tolerant_of_missing_keys() {
        let store = setup_store().await;

        store.set("k", "v").await.unwrap();
        store.remove("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());

        // removing again is not an error
        store.remove("k").await.unwrap();
    }
}
