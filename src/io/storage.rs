use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::common::error::StorageError;

/// A durable string-valued slot store.
///
/// The ledger only ever uses one slot, but the contract is a plain
/// key-value one so any backend with get/set semantics fits.
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when the slot has never been written.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Overwrites the slot.
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), StorageError>> + Send;
}

impl<S: KeyValueStore> KeyValueStore for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        (**self).set(key, value).await
    }
}

/// Process-local store, mostly for tests and for running without a disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates a slot, e.g. with a snapshot written by an older run.
    pub fn with_slot(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut slots = HashMap::new();
        slots.insert(key.into(), value.into());
        Self {
            slots: Mutex::new(slots),
        }
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.slots.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Stores each slot as `<dir>/<key>.json`.
///
/// Writes go to a uniquely named temp file in the same directory and are
/// renamed over the target, so a crash mid-write never leaves a truncated
/// snapshot behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn slot_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty()
            || key.starts_with('.')
            || key.contains(['/', '\\'])
        {
            return Err(StorageError::Unavailable(format!("invalid slot name {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.slot_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let path = self.slot_path(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let tmp = self
            .dir
            .join(format!(".{key}.{}.tmp", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, value).await?;
        if let Err(err) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(err.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_get_set() {
        let store = MemoryStore::new();
        assert_eq!(store.get("transactions").await.unwrap(), None);

        store.set("transactions", "[]".to_string()).await.unwrap();
        store.set("transactions", "[1]".to_string()).await.unwrap();

        assert_eq!(
            store.get("transactions").await.unwrap().as_deref(),
            Some("[1]")
        );
        assert_eq!(store.get("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.get("transactions").await.unwrap(), None);

        store.set("transactions", "[]".to_string()).await.unwrap();
        store.set("transactions", "[{}]".to_string()).await.unwrap();

        assert_eq!(
            store.get("transactions").await.unwrap().as_deref(),
            Some("[{}]")
        );
        let on_disk = std::fs::read_to_string(dir.path().join("nested/transactions.json")).unwrap();
        assert_eq!(on_disk, "[{}]");

        // no temp files left behind
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        assert!(store.set("../escape", "x".to_string()).await.is_err());
        assert!(store.get("a/b").await.is_err());
        assert!(store.get("").await.is_err());
    }

    #[tokio::test]
    async fn arc_wrapped_store_shares_state() {
        let shared = Arc::new(MemoryStore::new());
        let handle = Arc::clone(&shared);

        handle.set("k", "v".to_string()).await.unwrap();

        assert_eq!(shared.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
