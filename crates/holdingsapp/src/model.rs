//! # Domain Model
//!
//! The records the storage layer persists: [`CollectionItem`], [`Settings`]
//! and [`Profile`], plus [`ProfileUpdate`] for partial profile edits.
//!
//! ## Field Naming
//!
//! Persisted field names are camelCase (`lastUsed`, `pricePaid`,
//! `notificationsEnabled`) so that data written by either backend, and
//! backup documents, share one shape.
//!
//! ## Validation
//!
//! The store does not validate item content. A blank `name` or a negative
//! price is the caller's problem; the store only relies on `id` being unique
//! within the collection, and on `category` resolving to a registered
//! category (which it enforces itself, see [`crate::categories`]).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single cataloged possession.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItem {
    /// Caller-generated, immutable once created.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub location: String,
    /// Calendar date the item was last used (`YYYY-MM-DD`).
    pub last_used: NaiveDate,
    /// URI, path or blob reference owned by the image collaborator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_paid: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_expected: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Older screens call items "inventory items"; the shape is identical.
pub type InventoryItem = CollectionItem;

impl CollectionItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        location: impl Into<String>,
        last_used: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            location: location.into(),
            last_used,
            image_url: None,
            price_paid: None,
            price_expected: None,
            notes: None,
        }
    }

    /// Days since the item was last used, relative to `today`.
    /// Negative when `last_used` lies in the future.
    pub fn days_unused(&self, today: NaiveDate) -> i64 {
        (today - self.last_used).num_days()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Auto,
}

/// Per-installation preferences. Saved as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// ISO 4217 code, e.g. `USD`. Formatting is a presentation concern.
    pub currency: String,
    pub theme: Theme,
    pub notifications_enabled: bool,
    pub onboarding_completed: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            theme: Theme::Auto,
            notifications_enabled: true,
            onboarding_completed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// A partial profile edit. `None` fields leave the stored value untouched.
///
/// `avatar` is doubly optional: `Some(None)` clears the avatar, `None`
/// keeps whatever is stored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<Option<String>>,
}

impl ProfileUpdate {
    /// An update that overwrites every field, i.e. a wholesale replace.
    pub fn replacing(profile: Profile) -> Self {
        Self {
            name: Some(profile.name),
            email: Some(profile.email),
            avatar: Some(profile.avatar),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.avatar.is_none()
    }

    /// Merge this update onto `base`.
    pub fn apply(&self, base: Profile) -> Profile {
        Profile {
            name: self.name.clone().unwrap_or(base.name),
            email: self.email.clone().unwrap_or(base.email),
            avatar: match &self.avatar {
                Some(avatar) => avatar.clone(),
                None => base.avatar,
            },
        }
    }
}

impl From<Profile> for ProfileUpdate {
    fn from(profile: Profile) -> Self {
        Self::replacing(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_item_serializes_camel_case_and_iso_date() {
        let mut item = CollectionItem::new("a1", "Drill", "Tools", "Garage", date("2024-03-05"));
        item.price_paid = Some(89.5);

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["lastUsed"], "2024-03-05");
        assert_eq!(json["pricePaid"], 89.5);
        assert!(json.get("priceExpected").is_none());
        assert!(json.get("imageUrl").is_none());
    }

    #[test]
    fn test_item_deserializes_with_missing_optional_fields() {
        let raw = r#"{"id":"x","name":"Lamp","lastUsed":"2023-12-31"}"#;
        let item: CollectionItem = serde_json::from_str(raw).unwrap();
        assert_eq!(item.category, "");
        assert_eq!(item.location, "");
        assert_eq!(item.notes, None);
        assert_eq!(item.last_used, date("2023-12-31"));
    }

    #[test]
    fn test_days_unused() {
        let item = CollectionItem::new("a", "Tent", "Sports", "Attic", date("2024-01-01"));
        assert_eq!(item.days_unused(date("2024-01-31")), 30);
        assert_eq!(item.days_unused(date("2023-12-31")), -1);
    }

    #[test]
    fn test_theme_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), "\"dark\"");
        let theme: Theme = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(theme, Theme::Auto);
    }

    #[test]
    fn test_profile_update_merges_only_given_fields() {
        let base = Profile {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            avatar: Some("file:///a.png".to_string()),
        };
        let update = ProfileUpdate {
            name: Some("Ana Maria".to_string()),
            ..Default::default()
        };

        let merged = update.apply(base);
        assert_eq!(merged.name, "Ana Maria");
        assert_eq!(merged.email, "ana@example.com");
        assert_eq!(merged.avatar.as_deref(), Some("file:///a.png"));
    }

    #[test]
    fn test_profile_update_can_clear_avatar() {
        let base = Profile {
            avatar: Some("x".to_string()),
            ..Default::default()
        };
        let update = ProfileUpdate {
            avatar: Some(None),
            ..Default::default()
        };
        assert_eq!(update.apply(base).avatar, None);
    }

    #[test]
    fn test_replacing_overwrites_everything() {
        let base = Profile {
            name: "Old".to_string(),
            email: "old@example.com".to_string(),
            avatar: Some("old.png".to_string()),
        };
        let fresh = Profile {
            name: "New".to_string(),
            email: "new@example.com".to_string(),
            avatar: None,
        };
        assert_eq!(ProfileUpdate::replacing(fresh.clone()).apply(base), fresh);
    }
}
