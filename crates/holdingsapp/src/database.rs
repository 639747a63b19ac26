//! # Database Facade
//!
//! [`Database`] is the single entry point the rest of the application uses
//! for persistence. It wraps exactly one [`StorageBackend`], chosen once
//! when the facade is built, and never swaps it.
//!
//! ## Lifetime
//!
//! Build one `Database` at startup and share it (typically in an `Arc`)
//! with everything that needs storage. There is no global instance.
//!
//! ## Lazy Initialization
//!
//! Every method initializes the backend first if that has not succeeded
//! yet. Concurrent first calls share one initialization. A failed
//! initialization is not remembered: the next call tries again.
//!
//! ## Safe Defaults
//!
//! A storage fault must never take the UI down, so methods do not return
//! errors. They return an [`Outcome`]: the value read (or a safe default:
//! empty list, `None`, unit) plus the fault, if there was one. Callers that
//! do not care use the value; callers that do can check
//! [`Outcome::is_degraded`]. Every fault is also logged.
//!
//! The one exception is [`Database::delete_category`], which returns
//! `Err(CannotDeleteDefault)` for built-in categories so the UI can refuse
//! the action with a message.

use crate::categories;
use crate::config::HoldingsConfig;
use crate::error::{Result, StorageError};
use crate::model::{CollectionItem, Profile, ProfileUpdate, Settings};
use crate::seed;
use crate::store::{self, BackendKind, StorageBackend};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// A value produced by the facade, with the fault that forced a safe
/// default in its place (if any).
#[must_use]
#[derive(Debug)]
pub struct Outcome<T> {
    value: T,
    fault: Option<StorageError>,
}

impl<T> Outcome<T> {
    pub fn ok(value: T) -> Self {
        Self { value, fault: None }
    }

    pub fn degraded(value: T, fault: StorageError) -> Self {
        Self {
            value,
            fault: Some(fault),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn is_degraded(&self) -> bool {
        self.fault.is_some()
    }

    pub fn fault(&self) -> Option<&StorageError> {
        self.fault.as_ref()
    }

    pub fn into_parts(self) -> (T, Option<StorageError>) {
        (self.value, self.fault)
    }

    /// The value, or the fault as an error.
    pub fn into_result(self) -> Result<T> {
        match self.fault {
            Some(fault) => Err(fault),
            None => Ok(self.value),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            fault: self.fault,
        }
    }
}

pub struct Database {
    backend: Arc<dyn StorageBackend>,
    ready: OnceCell<()>,
    seed_sample_data: bool,
}

impl Database {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            ready: OnceCell::new(),
            seed_sample_data: true,
        }
    }

    /// Build the facade over the on-disk backend for the configured platform.
    pub fn open(config: &HoldingsConfig) -> Result<Self> {
        let backend = store::open_backend(config)?;
        Ok(Self::new(backend).with_sample_data(config.seed_sample_data))
    }

    /// Whether [`load_items`](Self::load_items) seeds an empty collection.
    pub fn with_sample_data(mut self, enabled: bool) -> Self {
        self.seed_sample_data = enabled;
        self
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }

    /// Initialize the backend and seed the default categories.
    /// Idempotent; returns the failure instead of degrading.
    pub async fn init(&self) -> Result<()> {
        self.ready
            .get_or_try_init(|| async {
                self.backend.init().await?;
                if let Err(e) = seed::ensure_default_categories(self.backend.as_ref()).await {
                    warn!(error = %e, "Could not seed default categories");
                }
                info!(backend = ?self.backend.kind(), "Storage ready");
                Ok::<(), StorageError>(())
            })
            .await?;
        Ok(())
    }

    /// Run `call` once the backend is ready, substituting `fallback` on failure.
    /// `call` is not polled if initialization fails.
    async fn call<T, F>(&self, op: &'static str, fallback: T, call: F) -> Outcome<T>
    where
        F: Future<Output = Result<T>>,
    {
        if let Err(e) = self.init().await {
            return Self::fallback(op, fallback, e);
        }
        match call.await {
            Ok(value) => Outcome::ok(value),
            Err(e) => Self::fallback(op, fallback, e),
        }
    }

    fn fallback<T>(op: &'static str, value: T, fault: StorageError) -> Outcome<T> {
        warn!(op, error = %fault, "Storage operation failed, using safe default");
        Outcome::degraded(value, fault)
    }

    // --- Items ---

    pub async fn get_items(&self) -> Outcome<Vec<CollectionItem>> {
        self.call("get_items", Vec::new(), self.backend.get_items())
            .await
    }

    pub async fn get_item(&self, id: &str) -> Outcome<Option<CollectionItem>> {
        self.get_items()
            .await
            .map(|items| items.into_iter().find(|item| item.id == id))
    }

    /// Items for display: like [`get_items`](Self::get_items), but an empty
    /// collection is seeded with sample items first (when enabled).
    pub async fn load_items(&self) -> Outcome<Vec<CollectionItem>> {
        let items = self.get_items().await;
        if items.is_degraded() || !items.value().is_empty() || !self.seed_sample_data {
            return items;
        }
        self.call(
            "seed_items",
            Vec::new(),
            seed::seed_items_if_empty(self.backend.as_ref()),
        )
        .await
    }

    pub async fn save_item(&self, item: &CollectionItem) -> Outcome<()> {
        self.call("save_item", (), self.backend.save_item(item)).await
    }

    pub async fn delete_item(&self, id: &str) -> Outcome<()> {
        self.call("delete_item", (), self.backend.delete_item(id))
            .await
    }

    // --- Settings & Profile ---

    pub async fn get_settings(&self) -> Outcome<Option<Settings>> {
        self.call("get_settings", None, self.backend.get_settings())
            .await
    }

    pub async fn save_settings(&self, settings: &Settings) -> Outcome<()> {
        self.call("save_settings", (), self.backend.save_settings(settings))
            .await
    }

    pub async fn get_profile(&self) -> Outcome<Option<Profile>> {
        self.call("get_profile", None, self.backend.get_profile())
            .await
    }

    /// Merge `update` onto the stored profile.
    pub async fn save_profile(&self, update: &ProfileUpdate) -> Outcome<()> {
        self.call("save_profile", (), self.backend.save_profile(update))
            .await
    }

    // --- Categories ---

    pub async fn get_categories(&self) -> Outcome<Vec<String>> {
        self.call("get_categories", Vec::new(), self.backend.get_categories())
            .await
    }

    pub async fn get_user_categories(&self) -> Outcome<Vec<String>> {
        self.call(
            "get_user_categories",
            Vec::new(),
            self.backend.get_user_categories(),
        )
        .await
    }

    pub async fn add_category(&self, name: &str) -> Outcome<()> {
        self.call("add_category", (), self.backend.add_category(name))
            .await
    }

    /// Delete a user category, moving its items to the fallback category.
    ///
    /// Built-in categories are refused with `Err(CannotDeleteDefault)`
    /// before anything is touched. Any other fault is reported through the
    /// returned [`Outcome`].
    pub async fn delete_category(&self, name: &str) -> Result<Outcome<()>> {
        if !categories::is_category_deletable(name) {
            return Err(StorageError::CannotDeleteDefault(name.trim().to_string()));
        }
        if let Err(e) = self.init().await {
            return Ok(Self::fallback("delete_category", (), e));
        }
        match self.backend.delete_category(name).await {
            Ok(()) => Ok(Outcome::ok(())),
            Err(e @ StorageError::CannotDeleteDefault(_)) => Err(e),
            Err(e) => Ok(Self::fallback("delete_category", (), e)),
        }
    }

    pub fn is_category_deletable(&self, name: &str) -> bool {
        self.backend.is_category_deletable(name)
    }

    /// Clear the user categories and register `names` instead.
    pub async fn replace_user_categories(&self, names: &[String]) -> Outcome<()> {
        self.call(
            "replace_user_categories",
            (),
            self.backend.replace_user_categories(names),
        )
        .await
    }
}
