// src/db/kv.rs
//! Whole-value key-value persistence used for snapshotting collections.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;

/// Result type for key-value operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while reading or writing persisted state
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize stored data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// A store of opaque string values addressed by a fixed key.
///
/// Reads and writes always move the complete value; there are no partial
/// updates and no versioning.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` if nothing was ever written under `key`.
    async fn read(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replaces the value under `key`.
    async fn write(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;

    /// Cheap round-trip used by the readiness check.
    async fn ping(&self) -> StorageResult<()> {
        self.read("health_ping").await.map(|_| ())
    }
}

/// Process-local store; state is lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a key, used to simulate state left by an earlier session.
    pub async fn with_entry(self, key: &str, value: impl Into<String>) -> Self {
        self.entries.write().await.insert(key.to_string(), value.into());
        self
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn read(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Stores every key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn read(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).await?;

        // Readers only ever see a complete snapshot.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_reads_back_last_write() {
        let store = InMemoryKeyValueStore::new();
        assert_eq!(store.read("k").await.unwrap(), None);

        store.write("k", "one").await.unwrap();
        store.write("k", "two").await.unwrap();
        assert_eq!(store.read("k").await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        let first = FileKeyValueStore::new(dir.path().join("nested"));
        assert_eq!(first.read("findeasy_service_requests").await.unwrap(), None);
        first.write("findeasy_service_requests", "[]").await.unwrap();

        let second = FileKeyValueStore::new(dir.path().join("nested"));
        assert_eq!(
            second.read("findeasy_service_requests").await.unwrap().as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path());

        let err = store.write("../escape", "x").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
