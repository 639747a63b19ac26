//! # Record Codec
//!
//! Converts entities to and from the representation a backend stores:
//!
//! - The flat backend keeps one JSON text value per entity class
//!   ([`decode_json`] / [`encode_json`]).
//! - The structured backend keeps structured records. Items are stored as
//!   they are; settings and profile share one singleton row, so they are
//!   written by field-level merge ([`merge_fields`]) and read back by
//!   projecting the row ([`settings_from_row`], [`profile_from_row`]).
//!
//! ## Category Records
//!
//! Categories were originally stored as a flat `string[]`. The current
//! layout is `{defaultCategories, userCategories}`. [`CategoryRecord`]
//! accepts either shape and [`normalize_categories`] turns it into a
//! [`CategorySet`], reporting whether the stored form needs rewriting. A
//! legacy list always does; an already partitioned record only does if
//! normalization changed it, so an up-to-date store is never rewritten on
//! read.

use crate::categories::CategorySet;
use crate::error::{Result, StorageError};
use crate::model::{Profile, Settings};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored category record, in either layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRecord {
    Legacy(Vec<String>),
    Partitioned(PartitionedCategories),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PartitionedCategories {
    #[serde(default)]
    pub default_categories: Vec<String>,
    #[serde(default)]
    pub user_categories: Vec<String>,
}

impl From<&CategorySet> for CategoryRecord {
    fn from(set: &CategorySet) -> Self {
        CategoryRecord::Partitioned(PartitionedCategories {
            default_categories: set.defaults().to_vec(),
            user_categories: set.user().to_vec(),
        })
    }
}

/// Result of reading a category record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCategories {
    pub set: CategorySet,
    /// The stored record differs from `set` and should be rewritten.
    pub needs_persist: bool,
    /// The stored record was in the legacy flat layout.
    pub migrated_legacy: bool,
}

pub fn normalize_categories(record: CategoryRecord) -> NormalizedCategories {
    match record {
        CategoryRecord::Legacy(names) => NormalizedCategories {
            set: CategorySet::from_legacy(names),
            needs_persist: true,
            migrated_legacy: true,
        },
        CategoryRecord::Partitioned(parts) => {
            let set = CategorySet::from_parts(
                parts.default_categories.iter().cloned(),
                parts.user_categories.iter().cloned(),
            );
            let needs_persist = set.defaults() != parts.default_categories.as_slice()
                || set.user() != parts.user_categories.as_slice();
            NormalizedCategories {
                set,
                needs_persist,
                migrated_legacy: false,
            }
        }
    }
}

/// Decode a JSON text value stored under `key`.
pub fn decode_json<T: DeserializeOwned>(key: &str, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| StorageError::corrupt(key, e))
}

pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(StorageError::Serialization)
}

/// Decode a structured record stored under `key`.
pub fn decode_value<T: DeserializeOwned>(key: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| StorageError::corrupt(key, e))
}

pub fn encode_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(StorageError::Serialization)
}

/// Overwrite the fields of `row` with the fields of `entity`, leaving all
/// other fields as they are.
pub fn merge_fields<T: Serialize + ?Sized>(row: &mut Map<String, Value>, entity: &T) -> Result<()> {
    match encode_value(entity)? {
        Value::Object(fields) => {
            for (key, value) in fields {
                row.insert(key, value);
            }
            Ok(())
        }
        other => Err(StorageError::Backend(format!(
            "expected an object to merge into the row, got {}",
            other
        ))),
    }
}

/// Settings projected out of the shared singleton row.
/// `None` when the row holds no (complete) settings.
pub fn settings_from_row(row: &Map<String, Value>) -> Option<Settings> {
    serde_json::from_value(Value::Object(row.clone())).ok()
}

/// Profile projected out of the shared singleton row.
pub fn profile_from_row(row: &Map<String, Value>) -> Option<Profile> {
    serde_json::from_value(Value::Object(row.clone())).ok()
}
