//! The flat (native) backend.
//!
//! Every entity class lives under one key as a JSON document:
//!
//! | Key          | Value                                                 |
//! |--------------|-------------------------------------------------------|
//! | `items`      | JSON array of items                                   |
//! | `settings`   | JSON object                                           |
//! | `profile`    | JSON object                                           |
//! | `categories` | `{defaultCategories, userCategories}` or legacy array |
//!
//! Every write is a read-modify-write of a whole aggregate. Those sections
//! are serialized by `write_lock` so two writers going through the same
//! backend cannot drop each other's updates. Category registration is a
//! read-modify-write one level up and takes `category_lock` first.
//! Unreadable values are logged and read as absent.

use super::backend::{BackendKind, StorageBackend};
use super::kv::KeyValueStore;
use crate::codec::{self, CategoryRecord};
use crate::error::{Result, StorageError};
use crate::model::{CollectionItem, Profile, ProfileUpdate, Settings};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{Mutex, OnceCell};
use tracing::warn;

pub const ITEMS_KEY: &str = "items";
pub const SETTINGS_KEY: &str = "settings";
pub const PROFILE_KEY: &str = "profile";
pub const CATEGORIES_KEY: &str = "categories";

pub struct FlatBackend<K: KeyValueStore> {
    store: K,
    opened: OnceCell<()>,
    write_lock: Mutex<()>,
    category_lock: Mutex<()>,
}

impl<K: KeyValueStore> FlatBackend<K> {
    pub fn new(store: K) -> Self {
        Self {
            store,
            opened: OnceCell::new(),
            write_lock: Mutex::new(()),
            category_lock: Mutex::new(()),
        }
    }

    /// The underlying key-value store.
    pub fn store(&self) -> &K {
        &self.store
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(text) = self.store.get(key).await? else {
            return Ok(None);
        };
        match codec::decode_json(key, &text) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "Ignoring unreadable record");
                Ok(None)
            }
        }
    }

    async fn write<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized + Sync,
    {
        let text = codec::encode_json(value)?;
        self.store.set(key, &text).await
    }
}

#[async_trait]
impl<K: KeyValueStore> StorageBackend for FlatBackend<K> {
    fn kind(&self) -> BackendKind {
        BackendKind::Flat
    }

    async fn init(&self) -> Result<()> {
        self.opened
            .get_or_try_init(|| async {
                self.store.open().await.map_err(|e| match e {
                    e @ StorageError::InitFailure(_) => e,
                    other => StorageError::InitFailure(other.to_string()),
                })
            })
            .await?;
        Ok(())
    }

    async fn get_items(&self) -> Result<Vec<CollectionItem>> {
        Ok(self
            .read::<Vec<CollectionItem>>(ITEMS_KEY)
            .await?
            .unwrap_or_default())
    }

    async fn put_item(&self, item: &CollectionItem) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.get_items().await?;
        match items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item.clone(),
            None => items.push(item.clone()),
        }
        self.write(ITEMS_KEY, &items).await
    }

    async fn delete_item(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.get_items().await?;
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Ok(());
        }
        self.write(ITEMS_KEY, &items).await
    }

    async fn get_settings(&self) -> Result<Option<Settings>> {
        self.read(SETTINGS_KEY).await
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write(SETTINGS_KEY, settings).await
    }

    async fn get_profile(&self) -> Result<Option<Profile>> {
        self.read(PROFILE_KEY).await
    }

    async fn save_profile(&self, update: &ProfileUpdate) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let current: Profile = self.read(PROFILE_KEY).await?.unwrap_or_default();
        self.write(PROFILE_KEY, &update.apply(current)).await
    }

    async fn load_category_record(&self) -> Result<Option<CategoryRecord>> {
        self.read(CATEGORIES_KEY).await
    }

    async fn store_category_record(&self, record: &CategoryRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write(CATEGORIES_KEY, record).await
    }

    fn category_lock(&self) -> &Mutex<()> {
        &self.category_lock
    }
}
