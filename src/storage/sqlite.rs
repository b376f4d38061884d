//! Key-value storage using SQLite

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use super::{parse_stored, KeyValueStore, StorageError};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `db_path`
    pub async fn new(db_path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create an in-memory store for testing
    #[cfg(test)]
    pub async fn new_in_memory() -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[cfg(test)]
    async fn write_raw(&self, key: &str, raw: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT OR REPLACE INTO kv (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(raw)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn read(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(|(raw,)| parse_stored(key, &raw)))
    }

    async fn write(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;

        sqlx::query(
            r#"
            INSERT INTO kv (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')
            "#,
        )
        .bind(key)
        .bind(raw)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_write_then_read() {
        let store = SqliteStore::new_in_memory().await.unwrap();

        store.write("history", &json!([{"id": 1}])).await.unwrap();
        store.write("history", &json!([{"id": 2}])).await.unwrap();

        let value = store.read("history").await.unwrap();
        assert_eq!(value, Some(json!([{"id": 2}])));
    }

    #[tokio::test]
    async fn test_missing_and_corrupt_are_empty() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        assert!(store.read("history").await.unwrap().is_none());

        store.write_raw("history", "[{broken").await.unwrap();
        assert!(store.read("history").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        store.write("history", &json!([])).await.unwrap();
        store.remove("history").await.unwrap();
        assert!(store.read("history").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_on_disk_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.db");

        let store = SqliteStore::new(&path).await.unwrap();
        store.write("k", &json!("v")).await.unwrap();
        drop(store);

        let reopened = SqliteStore::new(&path).await.unwrap();
        assert_eq!(reopened.read("k").await.unwrap(), Some(json!("v")));
    }
}
