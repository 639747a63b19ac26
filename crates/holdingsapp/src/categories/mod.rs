//! Category support for holdings.
//!
//! Every item carries a free-form `category` string. The set of known
//! categories is split in two partitions:
//!
//! - **Defaults**: the fixed built-in list in [`defaults`]. Always present,
//!   never deletable, always listed first and in canonical order.
//! - **User categories**: names added by the user, either explicitly or
//!   implicitly by saving an item with an unseen category. Listed after the
//!   defaults in insertion order. Deletable.
//!
//! A name lives in exactly one partition and the union never contains
//! duplicates. [`CategorySet`] is the in-memory form that enforces this; the
//! storage backends persist it through [`crate::codec`].
//!
//! ## Deleting a Category
//!
//! Deleting a user category first moves every item tagged with it to
//! [`FALLBACK_CATEGORY`] and only then drops the name. The two steps are not
//! atomic: a crash in between leaves items already reassigned but the name
//! still registered, and retrying the delete finishes the job. Deleting a
//! name that is not registered is a no-op.
//!
//! Names are matched exactly (case-sensitive) after trimming surrounding
//! whitespace.

pub mod defaults;

use crate::model::CollectionItem;
use serde::Serialize;
use std::borrow::Cow;

pub use defaults::{is_default_category, DEFAULT_CATEGORIES, FALLBACK_CATEGORY};

/// The two-partition category set.
///
/// Serializes to the canonical `{defaultCategories, userCategories}` shape.
/// Construct it through [`CategorySet::new`], [`CategorySet::from_parts`] or
/// [`CategorySet::from_legacy`], which all uphold the partition invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySet {
    default_categories: Vec<String>,
    user_categories: Vec<String>,
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::new()
    }
}

impl CategorySet {
    /// Defaults only.
    pub fn new() -> Self {
        Self {
            default_categories: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            user_categories: Vec::new(),
        }
    }

    /// Rebuild a set from a stored partitioned record.
    ///
    /// The canonical defaults always win: stored default names that are no
    /// longer built in are kept as user categories (so items referencing
    /// them stay resolvable), and user entries that collide with a default
    /// or repeat an earlier entry are dropped.
    pub fn from_parts<D, U>(stored_defaults: D, stored_user: U) -> Self
    where
        D: IntoIterator<Item = String>,
        U: IntoIterator<Item = String>,
    {
        let mut set = Self::new();
        for name in stored_defaults.into_iter().chain(stored_user) {
            set.add(&name);
        }
        set
    }

    /// Split a legacy flat list into canonical defaults plus user entries.
    pub fn from_legacy<I>(names: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self::from_parts(Vec::new(), names)
    }

    pub fn defaults(&self) -> &[String] {
        &self.default_categories
    }

    pub fn user(&self) -> &[String] {
        &self.user_categories
    }

    /// Defaults first, then user categories.
    pub fn all(&self) -> Vec<String> {
        self.default_categories
            .iter()
            .chain(self.user_categories.iter())
            .cloned()
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        let name = name.trim();
        is_default_category(name) || self.user_categories.iter().any(|c| c == name)
    }

    /// Register `name` as a user category.
    /// Returns `false` when it was blank or already known.
    pub fn add(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.user_categories.push(name.to_string());
        true
    }

    /// Drop a user category. Returns `false` if it was not registered.
    pub fn remove_user(&mut self, name: &str) -> bool {
        let name = name.trim();
        let before = self.user_categories.len();
        self.user_categories.retain(|c| c != name);
        self.user_categories.len() != before
    }

    /// Clear the user partition and refill it from `names`.
    pub fn replace_user<I>(&mut self, names: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.user_categories.clear();
        for name in names {
            self.add(&name);
        }
    }
}

pub fn is_category_deletable(name: &str) -> bool {
    !is_default_category(name.trim())
}

/// `item` with its category trimmed the way [`CategorySet`] registers
/// names. Borrows when nothing needs trimming.
pub fn normalize_item(item: &CollectionItem) -> Cow<'_, CollectionItem> {
    let trimmed = item.category.trim();
    if trimmed.len() == item.category.len() {
        return Cow::Borrowed(item);
    }
    let mut normalized = item.clone();
    normalized.category = trimmed.to_string();
    Cow::Owned(normalized)
}

/// Items tagged `name`, retagged with [`FALLBACK_CATEGORY`].
/// Items in other categories are not returned.
pub fn reassign_to_fallback(items: Vec<CollectionItem>, name: &str) -> Vec<CollectionItem> {
    let name = name.trim();
    items
        .into_iter()
        .filter(|item| item.category.trim() == name)
        .map(|mut item| {
            item.category = FALLBACK_CATEGORY.to_string();
            item
        })
        .collect()
}
