//! # Holdings
//!
//! Local persistence for a personal-asset inventory: the items a user owns,
//! the categories they file them under, their settings and their profile.
//!
//! The library is UI agnostic. Screens, state containers and backup file
//! handling sit outside it and talk to one object, the [`Database`] facade.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Database (database.rs)                                      │
//! │  - lazy init, safe defaults, Outcome<T>                      │
//! │  - seeding on first load (seed.rs), backup (backup.rs)       │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StorageBackend (store/backend.rs)                           │
//! │  - FlatBackend (native)  /  StructuredBackend (browser)      │
//! │  - category integrity (categories/) provided by the trait    │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Codec (codec.rs) + platform primitive                       │
//! │  - KeyValueStore  /  ObjectDatabase                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Getting Started
//!
//! ```no_run
//! # async fn demo() -> holdingsapp::error::Result<()> {
//! use holdingsapp::config::HoldingsConfig;
//! use holdingsapp::database::Database;
//!
//! let config = HoldingsConfig::load(None)?;
//! let db = Database::open(&config)?;
//! for item in db.load_items().await.value() {
//!     println!("{} ({})", item.name, item.category);
//! }
//! # Ok(())
//! # }
//! ```

pub mod backup;
pub mod categories;
pub mod codec;
pub mod config;
pub mod database;
pub mod error;
pub mod model;
pub mod seed;
pub mod store;

pub use database::{Database, Outcome};
pub use error::{Result, StorageError};
pub use model::{CollectionItem, InventoryItem, Profile, ProfileUpdate, Settings, Theme};
