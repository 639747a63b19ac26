//! Backup export and restore.
//!
//! A backup is one JSON document:
//!
//! ```json
//! {
//!   "inventory": [ ...items... ],
//!   "categories": [ "Electronics", ..., "Vinyl" ],
//!   "settings": { ... },
//!   "profile": { ... },
//!   "timestamp": "2024-06-01T10:00:00Z",
//!   "version": "1.0"
//! }
//! ```
//!
//! Restoring replaces the user categories with the backup's list (built-in
//! names in it are skipped), upserts every item, and replaces settings and
//! profile wholesale. Items already in the store but absent from the backup
//! are kept. Getting the document to and from a file is the caller's job.

use crate::database::{Database, Outcome};
use crate::error::{Result, StorageError};
use crate::model::{CollectionItem, Profile, ProfileUpdate, Settings};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const BACKUP_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub inventory: Vec<CollectionItem>,
    pub categories: Vec<String>,
    #[serde(default)]
    pub settings: Option<Settings>,
    #[serde(default)]
    pub profile: Option<Profile>,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl BackupDocument {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| StorageError::corrupt("backup", e))
    }
}

/// What a restore did.
#[derive(Debug, Default)]
pub struct RestoreReport {
    pub items_restored: usize,
    pub settings_restored: bool,
    pub profile_restored: bool,
    /// Faults hit along the way. Restore keeps going after a fault.
    pub faults: Vec<StorageError>,
}

impl RestoreReport {
    pub fn is_complete(&self) -> bool {
        self.faults.is_empty()
    }

    fn record(&mut self, outcome: Outcome<()>) -> bool {
        match outcome.into_parts() {
            (_, Some(fault)) => {
                self.faults.push(fault);
                false
            }
            (_, None) => true,
        }
    }
}

/// Snapshot the current store. The outcome is degraded if any part of the
/// snapshot had to fall back to a safe default.
pub async fn export(db: &Database) -> Outcome<BackupDocument> {
    let mut fault = None;
    let inventory = keep_first_fault(db.get_items().await, &mut fault);
    let categories = keep_first_fault(db.get_categories().await, &mut fault);
    let settings = keep_first_fault(db.get_settings().await, &mut fault);
    let profile = keep_first_fault(db.get_profile().await, &mut fault);

    let document = BackupDocument {
        inventory,
        categories,
        settings,
        profile,
        timestamp: Utc::now(),
        version: BACKUP_VERSION.to_string(),
    };
    match fault {
        Some(fault) => Outcome::degraded(document, fault),
        None => Outcome::ok(document),
    }
}

fn keep_first_fault<T>(outcome: Outcome<T>, fault: &mut Option<StorageError>) -> T {
    let (value, f) = outcome.into_parts();
    if fault.is_none() {
        *fault = f;
    }
    value
}

pub async fn restore(db: &Database, document: &BackupDocument) -> RestoreReport {
    if document.version != BACKUP_VERSION {
        warn!(version = %document.version, "Restoring backup with unknown version");
    }
    let mut report = RestoreReport::default();

    report.record(db.replace_user_categories(&document.categories).await);

    for item in &document.inventory {
        if report.record(db.save_item(item).await) {
            report.items_restored += 1;
        }
    }

    if let Some(settings) = &document.settings {
        report.settings_restored = report.record(db.save_settings(settings).await);
    }
    if let Some(profile) = &document.profile {
        let update = ProfileUpdate::replacing(profile.clone());
        report.profile_restored = report.record(db.save_profile(&update).await);
    }

    info!(
        items = report.items_restored,
        faults = report.faults.len(),
        "Restored backup"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_shape() {
        let raw = r#"{
            "inventory": [{"id":"1","name":"Lamp","category":"Decor","location":"Desk","lastUsed":"2024-01-02"}],
            "categories": ["Decor", "Vinyl"],
            "settings": {"currency":"EUR","theme":"dark","notificationsEnabled":true,"onboardingCompleted":true},
            "profile": {"name":"Jo","email":"jo@example.com","avatar":null},
            "timestamp": "2024-06-01T10:00:00Z",
            "version": "1.0"
        }"#;
        let doc = BackupDocument::from_json(raw).unwrap();
        assert_eq!(doc.inventory.len(), 1);
        assert_eq!(doc.settings.unwrap().currency, "EUR");
        assert_eq!(doc.profile.unwrap().name, "Jo");
    }

    #[test]
    fn test_missing_singletons_are_allowed() {
        let raw = r#"{"inventory":[],"categories":[],"timestamp":"2024-06-01T10:00:00Z","version":"1.0"}"#;
        let doc = BackupDocument::from_json(raw).unwrap();
        assert!(doc.settings.is_none());
        assert!(doc.profile.is_none());
    }

    #[test]
    fn test_garbage_is_corrupt_record() {
        assert!(matches!(
            BackupDocument::from_json("[]"),
            Err(StorageError::CorruptRecord { .. })
        ));
    }
}
