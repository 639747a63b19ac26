//! The structured (browser) backend.
//!
//! One versioned database with two object stores:
//!
//! - `items`: one record per item, keyed by item id.
//! - `app`: a single row under [`SINGLETON_KEY`] holding the settings
//!   fields, the profile fields and the `categories` record side by side.
//!
//! Because settings, profile and categories share the row, every write to
//! it is a field-level merge done under `row_lock`; saving settings never
//! touches profile fields and vice versa. Item writes go straight to their
//! own record, so they do not contend with each other or with the row.

use super::backend::{BackendKind, StorageBackend};
use super::objects::{ObjectDatabase, Schema};
use crate::codec::{self, CategoryRecord};
use crate::error::{Result, StorageError};
use crate::model::{CollectionItem, Profile, ProfileUpdate, Settings};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, OnceCell};
use tracing::warn;

pub const SCHEMA_VERSION: u32 = 1;
pub const ITEMS_STORE: &str = "items";
pub const APP_STORE: &str = "app";
pub const SINGLETON_KEY: &str = "singleton";
pub const CATEGORIES_FIELD: &str = "categories";

type Row = Map<String, Value>;

pub struct StructuredBackend<D: ObjectDatabase> {
    db: D,
    schema: Schema,
    opened: OnceCell<()>,
    row_lock: Mutex<()>,
    category_lock: Mutex<()>,
}

impl<D: ObjectDatabase> StructuredBackend<D> {
    pub fn new(db: D, database_name: &str) -> Self {
        Self {
            db,
            schema: Schema {
                name: database_name.to_string(),
                version: SCHEMA_VERSION,
                stores: vec![ITEMS_STORE.to_string(), APP_STORE.to_string()],
            },
            opened: OnceCell::new(),
            row_lock: Mutex::new(()),
            category_lock: Mutex::new(()),
        }
    }

    pub fn database(&self) -> &D {
        &self.db
    }

    async fn load_row(&self) -> Result<Row> {
        match self.db.get(APP_STORE, SINGLETON_KEY).await {
            Ok(Some(Value::Object(row))) => Ok(row),
            Ok(Some(_)) => {
                warn!(key = SINGLETON_KEY, "Ignoring app row that is not an object");
                Ok(Row::new())
            }
            Ok(None) => Ok(Row::new()),
            Err(e @ StorageError::CorruptRecord { .. }) => {
                warn!(error = %e, "Ignoring unreadable app row");
                Ok(Row::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Read-modify-write of the singleton row.
    async fn update_row<F>(&self, update: F) -> Result<()>
    where
        F: FnOnce(&mut Row) -> Result<()> + Send,
    {
        let _guard = self.row_lock.lock().await;
        let mut row = self.load_row().await?;
        update(&mut row)?;
        self.db
            .put(APP_STORE, SINGLETON_KEY, &Value::Object(row))
            .await
    }
}

#[async_trait]
impl<D: ObjectDatabase> StorageBackend for StructuredBackend<D> {
    fn kind(&self) -> BackendKind {
        BackendKind::Structured
    }

    async fn init(&self) -> Result<()> {
        self.opened
            .get_or_try_init(|| async {
                self.db.open(&self.schema).await.map_err(|e| match e {
                    e @ StorageError::InitFailure(_) => e,
                    other => StorageError::InitFailure(other.to_string()),
                })
            })
            .await?;
        Ok(())
    }

    async fn get_items(&self) -> Result<Vec<CollectionItem>> {
        let records = self.db.get_all(ITEMS_STORE).await?;
        let mut items = Vec::with_capacity(records.len());
        for record in records {
            match codec::decode_value::<CollectionItem>(ITEMS_STORE, record) {
                Ok(item) => items.push(item),
                Err(e) => warn!(error = %e, "Skipping unreadable item"),
            }
        }
        Ok(items)
    }

    async fn put_item(&self, item: &CollectionItem) -> Result<()> {
        let value = codec::encode_value(item)?;
        self.db.put(ITEMS_STORE, &item.id, &value).await
    }

    async fn delete_item(&self, id: &str) -> Result<()> {
        self.db.delete(ITEMS_STORE, id).await
    }

    async fn get_settings(&self) -> Result<Option<Settings>> {
        Ok(codec::settings_from_row(&self.load_row().await?))
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.update_row(|row| codec::merge_fields(row, settings))
            .await
    }

    async fn get_profile(&self) -> Result<Option<Profile>> {
        Ok(codec::profile_from_row(&self.load_row().await?))
    }

    async fn save_profile(&self, update: &ProfileUpdate) -> Result<()> {
        self.update_row(|row| {
            let current = codec::profile_from_row(row).unwrap_or_default();
            codec::merge_fields(row, &update.apply(current))
        })
        .await
    }

    async fn load_category_record(&self) -> Result<Option<CategoryRecord>> {
        let Some(value) = self.load_row().await?.remove(CATEGORIES_FIELD) else {
            return Ok(None);
        };
        match codec::decode_value(CATEGORIES_FIELD, value) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable category record");
                Ok(None)
            }
        }
    }

    async fn store_category_record(&self, record: &CategoryRecord) -> Result<()> {
        let value = codec::encode_value(record)?;
        self.update_row(|row| {
            row.insert(CATEGORIES_FIELD.to_string(), value);
            Ok(())
        })
        .await
    }

    fn category_lock(&self) -> &Mutex<()> {
        &self.category_lock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::FALLBACK_CATEGORY;
    use crate::model::Theme;
    use crate::store::objects::MemObjectDatabase;
    use chrono::NaiveDate;
    use serde_json::json;

    fn item(id: &str, category: &str) -> CollectionItem {
        let day = NaiveDate::from_ymd_opt(2023, 11, 2).unwrap();
        CollectionItem::new(id, format!("Item {}", id), category, "Loft", day)
    }

    async fn make_backend() -> StructuredBackend<MemObjectDatabase> {
        let backend = StructuredBackend::new(MemObjectDatabase::new(), "holdings");
        backend.init().await.unwrap();
        backend
    }

    #[tokio::test]
    async fn test_init_creates_schema_once() {
        let backend = make_backend().await;
        backend.init().await.unwrap();
        assert_eq!(backend.database().version().await, SCHEMA_VERSION);
        assert_eq!(backend.database().store_names().await, vec!["app", "items"]);
    }

    #[tokio::test]
    async fn test_init_failure_is_reported() {
        let db = MemObjectDatabase::new();
        db.set_simulate_open_error(true);
        let backend = StructuredBackend::new(db, "holdings");
        assert!(matches!(
            backend.init().await,
            Err(StorageError::InitFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_items_are_keyed_by_id() {
        let backend = make_backend().await;
        backend.save_item(&item("b", "Books")).await.unwrap();
        backend.save_item(&item("a", "Books")).await.unwrap();
        backend.save_item(&item("a", "Tools")).await.unwrap();

        let items = backend.get_items().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "a");
        assert_eq!(items[0].category, "Tools");
    }

    #[tokio::test]
    async fn test_settings_and_profile_share_row_without_clobbering() {
        let backend = make_backend().await;
        backend
            .save_profile(&ProfileUpdate {
                name: Some("Lee".to_string()),
                email: Some("lee@example.com".to_string()),
                avatar: None,
            })
            .await
            .unwrap();
        let settings = Settings {
            theme: Theme::Light,
            currency: "EUR".to_string(),
            ..Settings::default()
        };
        backend.save_settings(&settings).await.unwrap();
        backend.add_category("Vinyl").await.unwrap();

        assert_eq!(backend.get_settings().await.unwrap(), Some(settings));
        assert_eq!(backend.get_profile().await.unwrap().unwrap().name, "Lee");
        assert_eq!(
            backend.get_user_categories().await.unwrap(),
            vec!["Vinyl".to_string()]
        );
    }

    #[tokio::test]
    async fn test_settings_absent_until_saved() {
        let backend = make_backend().await;
        backend.add_category("Vinyl").await.unwrap();
        assert_eq!(backend.get_settings().await.unwrap(), None);
        assert_eq!(backend.get_profile().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_legacy_category_field_is_migrated_in_place() {
        let backend = make_backend().await;
        backend
            .database()
            .put(
                APP_STORE,
                SINGLETON_KEY,
                &json!({"currency": "GBP", "theme": "dark", "notificationsEnabled": false,
                        "onboardingCompleted": true, "categories": ["Books", "Custom1"]}),
            )
            .await
            .unwrap();

        assert_eq!(
            backend.get_user_categories().await.unwrap(),
            vec!["Custom1".to_string()]
        );
        let row = backend
            .database()
            .get(APP_STORE, SINGLETON_KEY)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row["categories"]["userCategories"], json!(["Custom1"]));
        assert_eq!(row["currency"], "GBP");
    }

    #[tokio::test]
    async fn test_unreadable_item_is_skipped() {
        let backend = make_backend().await;
        backend.save_item(&item("ok", "Books")).await.unwrap();
        backend
            .database()
            .put(ITEMS_STORE, "zz", &json!({"id": "zz"}))
            .await
            .unwrap();
        let items = backend.get_items().await.unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_category_cascades() {
        let backend = make_backend().await;
        backend.save_item(&item("1", "Vinyl")).await.unwrap();
        backend.delete_category("Vinyl").await.unwrap();
        backend.delete_category("Vinyl").await.unwrap();

        assert_eq!(
            backend.get_items().await.unwrap()[0].category,
            FALLBACK_CATEGORY
        );
        assert!(!backend
            .get_categories()
            .await
            .unwrap()
            .contains(&"Vinyl".to_string()));
    }
}
