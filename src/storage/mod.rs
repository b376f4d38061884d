//! Key-value persistence for client state
//!
//! Every backend stores one JSON document per key. A stored value that cannot
//! be parsed is reported as absent, so callers only ever see "a value" or
//! "nothing" and never a parse failure.

mod file;
mod memory;
mod sqlite;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::StorageBackend;

pub use file::JsonFileStore;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`. Missing and corrupt values are both `None`.
    async fn read(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Replace the value under `key`
    async fn write(&self, key: &str, value: &Value) -> Result<(), StorageError>;

    /// Drop `key` entirely
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Parse a raw stored document, treating garbage as absent
fn parse_stored(key: &str, raw: &str) -> Option<Value> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring corrupt value under '{}': {}", key, e);
            None
        }
    }
}

/// Open the configured backend rooted at `data_dir`
pub async fn open(
    backend: StorageBackend,
    data_dir: &Path,
) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    tracing::info!("Client state stored via {:?} in {}", backend, data_dir.display());

    match backend {
        StorageBackend::Sqlite => {
            let store = SqliteStore::new(&data_dir.join("neuralflow.db")).await?;
            Ok(Arc::new(store))
        }
        StorageBackend::File => Ok(Arc::new(JsonFileStore::new(data_dir))),
        StorageBackend::Memory => Ok(Arc::new(InMemoryStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stored_rejects_garbage() {
        assert!(parse_stored("k", "{not json").is_none());
        assert_eq!(parse_stored("k", "[1,2]"), Some(serde_json::json!([1, 2])));
    }

    #[tokio::test]
    async fn test_open_memory_backend() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(StorageBackend::Memory, dir.path()).await.unwrap();

        store.write("k", &serde_json::json!(["a"])).await.unwrap();
        assert_eq!(store.read("k").await.unwrap(), Some(serde_json::json!(["a"])));
    }
}
