use crate::categories::{self, CategorySet};
use crate::codec::{normalize_categories, CategoryRecord};
use crate::error::{Result, StorageError};
use crate::model::{CollectionItem, Profile, ProfileUpdate, Settings};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Which storage family a backend belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// One JSON aggregate per entity class in a key-value store.
    Flat,
    /// Per-entity-class object stores in a versioned database.
    Structured,
}

/// The storage contract both adapters implement.
///
/// Implementors provide raw record I/O; the category operations
/// (`get_categories`, `add_category`, `delete_category`, ...) and the
/// implicit registration done by `save_item` are provided on top of
/// [`load_category_record`](StorageBackend::load_category_record) and
/// [`store_category_record`](StorageBackend::store_category_record), so the
/// integrity rules are identical for every backend. Those provided methods
/// serialize their read-modify-write of the category record on
/// [`category_lock`](StorageBackend::category_lock).
///
/// Absence is never an error: missing records read as empty/`None`, and
/// deleting something that does not exist succeeds.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    // --- Lifecycle ---

    /// Prepare the backend. Must be idempotent and safe to call concurrently.
    /// Fails with [`StorageError::InitFailure`] if the platform store cannot
    /// be opened.
    async fn init(&self) -> Result<()>;

    // --- Items ---

    /// All items. Order is unspecified but stable across reads with no
    /// writes in between.
    async fn get_items(&self) -> Result<Vec<CollectionItem>>;

    /// Upsert by id, replacing the whole record. No category bookkeeping.
    async fn put_item(&self, item: &CollectionItem) -> Result<()>;

    /// Remove by id; no-op when absent.
    async fn delete_item(&self, id: &str) -> Result<()>;

    // --- Singletons ---

    async fn get_settings(&self) -> Result<Option<Settings>>;

    /// Replace the stored settings.
    async fn save_settings(&self, settings: &Settings) -> Result<()>;

    async fn get_profile(&self) -> Result<Option<Profile>>;

    /// Merge `update` onto the stored profile (or onto an empty profile if
    /// none is stored yet).
    async fn save_profile(&self, update: &ProfileUpdate) -> Result<()>;

    // --- Category Record ---

    /// The raw stored category record, or `None` if there is none (or it
    /// is unreadable).
    async fn load_category_record(&self) -> Result<Option<CategoryRecord>>;

    async fn store_category_record(&self, record: &CategoryRecord) -> Result<()>;

    /// Guards read-modify-write of the category record. Never held by the
    /// record primitives themselves.
    fn category_lock(&self) -> &Mutex<()>;

    // --- Provided ---

    /// Upsert an item and register its category if it is new. The category
    /// is stored trimmed, the same way it is registered.
    async fn save_item(&self, item: &CollectionItem) -> Result<()> {
        let item = categories::normalize_item(item);
        self.put_item(&item).await?;
        if !item.category.is_empty() {
            self.add_category(&item.category).await?;
        }
        Ok(())
    }

    /// The current category set. A legacy flat record is migrated and the
    /// partitioned form written back before returning.
    ///
    /// Does not take [`category_lock`](StorageBackend::category_lock);
    /// callers that may write hold it.
    async fn load_categories(&self) -> Result<CategorySet> {
        let Some(record) = self.load_category_record().await? else {
            return Ok(CategorySet::new());
        };
        let normalized = normalize_categories(record);
        if normalized.migrated_legacy {
            info!(
                user_categories = normalized.set.user().len(),
                "Migrated legacy category list"
            );
        }
        if normalized.needs_persist {
            self.store_category_record(&CategoryRecord::from(&normalized.set))
                .await?;
        }
        Ok(normalized.set)
    }

    async fn store_categories(&self, set: &CategorySet) -> Result<()> {
        self.store_category_record(&CategoryRecord::from(set)).await
    }

    /// Defaults first (canonical order), then user categories (insertion order).
    async fn get_categories(&self) -> Result<Vec<String>> {
        let _guard = self.category_lock().lock().await;
        Ok(self.load_categories().await?.all())
    }

    async fn get_user_categories(&self) -> Result<Vec<String>> {
        let _guard = self.category_lock().lock().await;
        Ok(self.load_categories().await?.user().to_vec())
    }

    /// Register a user category; no-op if already known or blank.
    async fn add_category(&self, name: &str) -> Result<()> {
        let _guard = self.category_lock().lock().await;
        let mut set = self.load_categories().await?;
        if set.add(name) {
            debug!(category = name.trim(), "Registered user category");
            self.store_categories(&set).await?;
        }
        Ok(())
    }

    /// Delete a user category, moving its items to the fallback category
    /// first. Built-in categories are rejected with
    /// [`StorageError::CannotDeleteDefault`].
    ///
    /// Not atomic: if this fails after some items were reassigned, the
    /// category stays registered and a retry completes the deletion.
    async fn delete_category(&self, name: &str) -> Result<()> {
        if !categories::is_category_deletable(name) {
            return Err(StorageError::CannotDeleteDefault(name.trim().to_string()));
        }
        let _guard = self.category_lock().lock().await;

        let items = self.get_items().await?;
        let reassigned = categories::reassign_to_fallback(items, name);
        for item in &reassigned {
            self.put_item(item).await?;
        }

        let mut set = self.load_categories().await?;
        if set.remove_user(name) {
            self.store_categories(&set).await?;
        }
        info!(
            category = name.trim(),
            reassigned = reassigned.len(),
            "Deleted category"
        );
        Ok(())
    }

    fn is_category_deletable(&self, name: &str) -> bool {
        categories::is_category_deletable(name)
    }

    /// Clear the user partition and refill it from `names`. Built-in names
    /// in `names` are skipped.
    async fn replace_user_categories(&self, names: &[String]) -> Result<()> {
        let _guard = self.category_lock().lock().await;
        let mut set = self.load_categories().await?;
        set.replace_user(names.iter().cloned());
        self.store_categories(&set).await
    }
}
