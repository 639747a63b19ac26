//! Object-database primitives for the structured backend.
//!
//! The browser platform gives us a versioned database made of named object
//! stores, each mapping a primary key to a structured record. This module
//! abstracts that as [`ObjectDatabase`]:
//!
//! - [`FsObjectDatabase`]: a directory per database, a sub-directory per
//!   object store and one JSON file per record.
//! - [`MemObjectDatabase`]: in memory, one lock per object store, for tests.
//!
//! Opening with a [`Schema`] creates any missing object stores and records
//! the schema version. Opening an already-open database with the same schema
//! changes nothing; opening with an older version than the stored one fails.
//!
//! ## On-disk Layout
//!
//! ```text
//! <root>/<db name>/
//! ├── schema.json            # {"version": 1, "stores": ["items", "app"]}
//! ├── items/
//! │   └── <escaped key>.json     # long keys: <prefix>~<sha256>.json
//! └── app/
//!     └── singleton.json
//! ```

use crate::error::{Result, StorageError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub version: u32,
    pub stores: Vec<String>,
}

#[async_trait]
pub trait ObjectDatabase: Send + Sync {
    /// Open the database, creating missing object stores. Idempotent.
    async fn open(&self, schema: &Schema) -> Result<()>;

    async fn get(&self, store: &str, key: &str) -> Result<Option<Value>>;

    /// Every record in `store`, ordered by key.
    async fn get_all(&self, store: &str) -> Result<Vec<Value>>;

    /// Insert or replace the record under `key`.
    async fn put(&self, store: &str, key: &str, value: &Value) -> Result<()>;

    /// Remove the record under `key`; no-op when absent.
    async fn delete(&self, store: &str, key: &str) -> Result<()>;
}

type Records = Arc<RwLock<BTreeMap<String, Value>>>;

#[derive(Default)]
pub struct MemObjectDatabase {
    version: RwLock<u32>,
    stores: RwLock<HashMap<String, Records>>,
    simulate_open_error: AtomicBool,
    simulate_write_error: AtomicBool,
}

impl MemObjectDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_simulate_open_error(&self, simulate: bool) {
        self.simulate_open_error.store(simulate, Ordering::SeqCst);
    }

    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Current schema version; 0 before the first open.
    pub async fn version(&self) -> u32 {
        *self.version.read().await
    }

    pub async fn store_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    async fn records(&self, store: &str) -> Result<Records> {
        self.stores
            .read()
            .await
            .get(store)
            .cloned()
            .ok_or_else(|| StorageError::Backend(format!("No object store named '{}'", store)))
    }

    fn check_writable(&self) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("Simulated write error".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectDatabase for MemObjectDatabase {
    async fn open(&self, schema: &Schema) -> Result<()> {
        if self.simulate_open_error.load(Ordering::SeqCst) {
            return Err(StorageError::InitFailure("Simulated open error".to_string()));
        }
        let mut version = self.version.write().await;
        if schema.version < *version {
            return Err(StorageError::InitFailure(format!(
                "database '{}' is at version {}, cannot open at {}",
                schema.name, *version, schema.version
            )));
        }
        let mut stores = self.stores.write().await;
        for name in &schema.stores {
            stores.entry(name.clone()).or_default();
        }
        *version = schema.version;
        Ok(())
    }

    async fn get(&self, store: &str, key: &str) -> Result<Option<Value>> {
        let records = self.records(store).await?;
        let records = records.read().await;
        Ok(records.get(key).cloned())
    }

    async fn get_all(&self, store: &str) -> Result<Vec<Value>> {
        let records = self.records(store).await?;
        let records = records.read().await;
        Ok(records.values().cloned().collect())
    }

    async fn put(&self, store: &str, key: &str, value: &Value) -> Result<()> {
        self.check_writable()?;
        let records = self.records(store).await?;
        records.write().await.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn delete(&self, store: &str, key: &str) -> Result<()> {
        self.check_writable()?;
        let records = self.records(store).await?;
        records.write().await.remove(key);
        Ok(())
    }
}

const SCHEMA_FILE: &str = "schema.json";

pub struct FsObjectDatabase {
    root: PathBuf,
    name: RwLock<Option<String>>,
}

impl FsObjectDatabase {
    /// `root` is the directory the database directory is created in.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            name: RwLock::new(None),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn db_dir(&self) -> Result<PathBuf> {
        match self.name.read().await.as_deref() {
            Some(name) => Ok(self.root.join(name)),
            None => Err(StorageError::Backend("Database is not open".to_string())),
        }
    }

    async fn store_dir(&self, store: &str) -> Result<PathBuf> {
        let dir = self.db_dir().await?.join(store);
        if !fs::try_exists(&dir).await.unwrap_or(false) {
            return Err(StorageError::Backend(format!(
                "No object store named '{}'",
                store
            )));
        }
        Ok(dir)
    }

    async fn write_atomic(dir: &Path, file_name: &str, content: &str) -> Result<()> {
        let tmp = dir.join(format!(".{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, content).await?;
        if let Err(e) = fs::rename(&tmp, dir.join(file_name)).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StorageError::Io(e));
        }
        Ok(())
    }

    async fn read_record(path: &Path) -> Result<Option<Value>> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Io(e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StorageError::corrupt(&path.display().to_string(), e))
    }
}

#[async_trait]
impl ObjectDatabase for FsObjectDatabase {
    async fn open(&self, schema: &Schema) -> Result<()> {
        let init_err = |e: std::io::Error| StorageError::InitFailure(e.to_string());
        let db_dir = self.root.join(&schema.name);
        fs::create_dir_all(&db_dir).await.map_err(init_err)?;

        let mut stores: Vec<String> = Vec::new();
        match Self::read_record(&db_dir.join(SCHEMA_FILE)).await {
            Ok(Some(value)) => {
                let stored: Schema = serde_json::from_value(value)
                    .map_err(|e| StorageError::InitFailure(format!("unreadable schema: {}", e)))?;
                if schema.version < stored.version {
                    return Err(StorageError::InitFailure(format!(
                        "database '{}' is at version {}, cannot open at {}",
                        schema.name, stored.version, schema.version
                    )));
                }
                stores = stored.stores;
            }
            Ok(None) => {}
            Err(e) => return Err(StorageError::InitFailure(e.to_string())),
        }

        for store in &schema.stores {
            fs::create_dir_all(db_dir.join(store)).await.map_err(init_err)?;
            if !stores.contains(store) {
                stores.push(store.clone());
            }
        }

        let current = Schema {
            name: schema.name.clone(),
            version: schema.version,
            stores,
        };
        let content = serde_json::to_string_pretty(&current)?;
        Self::write_atomic(&db_dir, SCHEMA_FILE, &content)
            .await
            .map_err(|e| StorageError::InitFailure(e.to_string()))?;

        *self.name.write().await = Some(schema.name.clone());
        debug!(path = %db_dir.display(), version = schema.version, "Opened object database");
        Ok(())
    }

    async fn get(&self, store: &str, key: &str) -> Result<Option<Value>> {
        let dir = self.store_dir(store).await?;
        Self::read_record(&dir.join(record_file_name(key))).await
    }

    async fn get_all(&self, store: &str) -> Result<Vec<Value>> {
        let dir = self.store_dir(store).await?;
        let mut paths = Vec::new();
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_record = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(".json") && !n.starts_with('.'))
                .unwrap_or(false);
            if is_record {
                paths.push(path);
            }
        }
        paths.sort();

        let mut records = Vec::with_capacity(paths.len());
        for path in paths {
            match Self::read_record(&path).await {
                Ok(Some(value)) => records.push(value),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Skipping unreadable record"),
            }
        }
        Ok(records)
    }

    async fn put(&self, store: &str, key: &str, value: &Value) -> Result<()> {
        let dir = self.store_dir(store).await?;
        let content = serde_json::to_string_pretty(value)?;
        Self::write_atomic(&dir, &record_file_name(key), &content).await
    }

    async fn delete(&self, store: &str, key: &str) -> Result<()> {
        let dir = self.store_dir(store).await?;
        match fs::remove_file(dir.join(record_file_name(key))).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

/// Longest record file name we produce, in bytes. Common filesystems cap
/// names at 255.
const MAX_FILE_NAME: usize = 200;
const HASHED_PREFIX_LEN: usize = 64;

/// File name for a record key. Keys are opaque strings, so anything outside
/// `[A-Za-z0-9_-]` is percent-escaped byte by byte. Names that would get too
/// long keep a prefix of the escaped key followed by `~` and the SHA-256 of
/// the whole key; `~` never appears in an escaped name.
fn record_file_name(key: &str) -> String {
    let mut name = String::with_capacity(key.len() + 5);
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            name.push(byte as char);
        } else {
            name.push_str(&format!("%{:02X}", byte));
        }
    }
    if name.len() + ".json".len() > MAX_FILE_NAME {
        // Escaped names are ASCII, so any byte index is a char boundary.
        name.truncate(HASHED_PREFIX_LEN);
        name.push('~');
        name.push_str(&format!("{:x}", Sha256::digest(key.as_bytes())));
    }
    name.push_str(".json");
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(version: u32) -> Schema {
        Schema {
            name: "test".to_string(),
            version,
            stores: vec!["items".to_string(), "app".to_string()],
        }
    }

    #[test]
    fn test_record_file_name_escapes_unsafe_bytes() {
        assert_eq!(record_file_name("abc-1_2"), "abc-1_2.json");
        assert_eq!(record_file_name("../x"), "%2E%2E%2Fx.json");
        assert_eq!(record_file_name("a b"), "a%20b.json");
    }

    #[test]
    fn test_record_file_name_stays_short_for_long_keys() {
        let ascii = "x".repeat(300);
        let unicode = "写真".repeat(40);
        for key in [ascii.as_str(), unicode.as_str()] {
            let name = record_file_name(key);
            assert!(name.len() <= MAX_FILE_NAME, "{} bytes", name.len());
            assert!(name.contains('~'));
            assert_eq!(name, record_file_name(key));
        }
        // Keys sharing the escaped prefix still get distinct names.
        let other = format!("{}y", ascii);
        assert_ne!(record_file_name(&ascii), record_file_name(&other));
    }

    #[tokio::test]
    async fn test_fs_roundtrip_with_long_unicode_key() {
        let dir = tempfile::tempdir().unwrap();
        let db = FsObjectDatabase::new(dir.path());
        db.open(&schema(1)).await.unwrap();

        let key = "ヴィンテージのフィルムカメラ".repeat(10);
        db.put("items", &key, &json!({"id": key})).await.unwrap();
        assert_eq!(db.get("items", &key).await.unwrap(), Some(json!({"id": key})));
        assert_eq!(db.get_all("items").await.unwrap().len(), 1);

        db.delete("items", &key).await.unwrap();
        assert_eq!(db.get("items", &key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_mem_open_is_idempotent() {
        let db = MemObjectDatabase::new();
        db.open(&schema(1)).await.unwrap();
        db.put("items", "k", &json!({"a": 1})).await.unwrap();
        db.open(&schema(1)).await.unwrap();

        assert_eq!(db.store_names().await, vec!["app", "items"]);
        assert_eq!(db.get("items", "k").await.unwrap(), Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn test_mem_refuses_downgrade() {
        let db = MemObjectDatabase::new();
        db.open(&schema(2)).await.unwrap();
        assert!(matches!(
            db.open(&schema(1)).await,
            Err(StorageError::InitFailure(_))
        ));
        assert_eq!(db.version().await, 2);
    }

    #[tokio::test]
    async fn test_mem_unknown_store_is_an_error() {
        let db = MemObjectDatabase::new();
        db.open(&schema(1)).await.unwrap();
        assert!(db.get("nope", "k").await.is_err());
    }

    #[tokio::test]
    async fn test_mem_get_all_is_ordered_by_key() {
        let db = MemObjectDatabase::new();
        db.open(&schema(1)).await.unwrap();
        db.put("items", "b", &json!(2)).await.unwrap();
        db.put("items", "a", &json!(1)).await.unwrap();
        assert_eq!(db.get_all("items").await.unwrap(), vec![json!(1), json!(2)]);
    }

    #[tokio::test]
    async fn test_fs_roundtrip_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db = FsObjectDatabase::new(dir.path());
        db.open(&schema(1)).await.unwrap();
        db.put("items", "id/1", &json!({"id": "id/1"})).await.unwrap();

        let reopened = FsObjectDatabase::new(dir.path());
        reopened.open(&schema(1)).await.unwrap();
        assert_eq!(
            reopened.get("items", "id/1").await.unwrap(),
            Some(json!({"id": "id/1"}))
        );
        reopened.delete("items", "id/1").await.unwrap();
        reopened.delete("items", "id/1").await.unwrap();
        assert!(reopened.get_all("items").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fs_requires_open() {
        let dir = tempfile::tempdir().unwrap();
        let db = FsObjectDatabase::new(dir.path());
        assert!(db.get("items", "k").await.is_err());
    }

    #[tokio::test]
    async fn test_fs_skips_corrupt_records_in_get_all() {
        let dir = tempfile::tempdir().unwrap();
        let db = FsObjectDatabase::new(dir.path());
        db.open(&schema(1)).await.unwrap();
        db.put("items", "good", &json!({"ok": true})).await.unwrap();
        std::fs::write(dir.path().join("test/items/bad.json"), "{oops").unwrap();

        assert_eq!(db.get_all("items").await.unwrap(), vec![json!({"ok": true})]);
        assert!(matches!(
            db.get("items", "bad").await,
            Err(StorageError::CorruptRecord { .. })
        ));
    }
}
