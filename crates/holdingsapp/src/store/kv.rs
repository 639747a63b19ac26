//! Key-value primitives for the flat backend.
//!
//! The native platform gives us a plain string key-value store. This module
//! abstracts it as [`KeyValueStore`] with two implementations:
//!
//! - [`FsKeyValueStore`]: one `<key>.json` file per key in a directory.
//! - [`MemKeyValueStore`]: a map in memory, for tests.

use crate::error::{Result, StorageError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Make the store usable. Idempotent.
    async fn open(&self) -> Result<()>;

    /// The value under `key`, or `None` if nothing is stored.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    /// Must not leave a partially written value behind.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

pub struct FsKeyValueStore {
    root: PathBuf,
}

impl FsKeyValueStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

#[async_trait]
impl KeyValueStore for FsKeyValueStore {
    async fn open(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            StorageError::InitFailure(format!("{}: {}", self.root.display(), e))
        })?;
        let meta = fs::metadata(&self.root)
            .await
            .map_err(|e| StorageError::InitFailure(format!("{}: {}", self.root.display(), e)))?;
        if !meta.is_dir() {
            return Err(StorageError::InitFailure(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.key_path(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let target = self.key_path(key);

        // Atomic write
        let tmp = self.root.join(format!(".{}-{}.tmp", key, Uuid::new_v4()));
        fs::write(&tmp, value).await?;
        if let Err(e) = fs::rename(&tmp, &target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StorageError::Io(e));
        }
        debug!(key, bytes = value.len(), "Wrote key");
        Ok(())
    }
}

/// In-memory key-value store for testing.
///
/// Failure simulation flags let tests drive the degraded paths of the
/// layers above.
#[derive(Default)]
pub struct MemKeyValueStore {
    values: RwLock<HashMap<String, String>>,
    simulate_open_error: AtomicBool,
    simulate_write_error: AtomicBool,
}

impl MemKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `open` fail, as if the platform store were unavailable.
    pub fn set_simulate_open_error(&self, simulate: bool) {
        self.simulate_open_error.store(simulate, Ordering::SeqCst);
    }

    /// Make `set` fail.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("Simulated write error".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemKeyValueStore {
    async fn open(&self) -> Result<()> {
        if self.simulate_open_error.load(Ordering::SeqCst) {
            return Err(StorageError::InitFailure("Simulated open error".to_string()));
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mem_store_roundtrip() {
        let store = MemKeyValueStore::new();
        store.open().await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        store.set("k", "w").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("w"));
    }

    #[tokio::test]
    async fn test_mem_store_simulated_failures() {
        let store = MemKeyValueStore::new();
        store.set_simulate_open_error(true);
        assert!(matches!(
            store.open().await,
            Err(StorageError::InitFailure(_))
        ));

        store.set_simulate_write_error(true);
        assert!(store.set("k", "v").await.is_err());
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fs_store_open_fails_on_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        std::fs::write(&file, "x").unwrap();

        let store = FsKeyValueStore::new(&file);
        assert!(matches!(
            store.open().await,
            Err(StorageError::InitFailure(_))
        ));
    }
}
