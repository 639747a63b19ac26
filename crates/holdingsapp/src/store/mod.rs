//! # Storage Layer
//!
//! This module defines the storage abstraction for holdings. The
//! [`StorageBackend`] trait is the one contract the rest of the crate talks
//! to; two adapters implement it for the two storage families the app runs
//! on:
//!
//! | Adapter | Platform | Primitive | Layout |
//! |---------|----------|-----------|--------|
//! | [`flat::FlatBackend`] | native | [`kv::KeyValueStore`] | one JSON document per entity class |
//! | [`structured::StructuredBackend`] | browser | [`objects::ObjectDatabase`] | object stores keyed by primary key |
//!
//! ## Layering
//!
//! ```text
//! Database (facade)            lazy init, safe defaults, Outcome
//!   └── StorageBackend         items, singletons, category integrity
//!         └── primitive        KeyValueStore / ObjectDatabase
//! ```
//!
//! Adapters implement raw record I/O only. Category integrity (implicit
//! registration, legacy migration, cascading delete) is provided once by
//! the trait on top of the category record primitives.
//!
//! ## Backend Selection
//!
//! [`open_backend`] picks the adapter from the configured (or detected)
//! [`Platform`] exactly once; callers never inspect which adapter they
//! got. [`memory_backend`] builds the same adapters over in-memory
//! primitives.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/                  # native
//! ├── items.json
//! ├── settings.json
//! ├── profile.json
//! └── categories.json
//!
//! <data_dir>/<database_name>/  # browser
//! ├── schema.json
//! ├── items/<id>.json
//! └── app/singleton.json
//! ```

use crate::config::{HoldingsConfig, Platform};
use crate::error::Result;
use std::sync::Arc;
use tracing::debug;

pub mod backend;
pub mod flat;
pub mod kv;
pub mod objects;
pub mod structured;

pub use backend::{BackendKind, StorageBackend};

use flat::FlatBackend;
use kv::{FsKeyValueStore, MemKeyValueStore};
use objects::{FsObjectDatabase, MemObjectDatabase};
use structured::StructuredBackend;

/// Build the on-disk backend for the configured platform.
///
/// Nothing is opened here; that happens on the first `init`.
pub fn open_backend(config: &HoldingsConfig) -> Result<Arc<dyn StorageBackend>> {
    let data_dir = config.resolve_data_dir()?;
    let platform = config.platform();
    debug!(%platform, path = %data_dir.display(), "Selecting storage backend");
    Ok(match platform {
        Platform::Native => Arc::new(FlatBackend::new(FsKeyValueStore::new(data_dir))),
        Platform::Browser => Arc::new(StructuredBackend::new(
            FsObjectDatabase::new(data_dir),
            &config.database_name,
        )),
    })
}

/// Build a backend for `platform` over in-memory primitives.
pub fn memory_backend(platform: Platform) -> Arc<dyn StorageBackend> {
    match platform {
        Platform::Native => Arc::new(FlatBackend::new(MemKeyValueStore::new())),
        Platform::Browser => Arc::new(StructuredBackend::new(MemObjectDatabase::new(), "holdings")),
    }
}
