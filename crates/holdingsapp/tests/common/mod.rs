#![allow(dead_code)]

use chrono::NaiveDate;
use holdingsapp::config::{HoldingsConfig, Platform};
use holdingsapp::model::CollectionItem;
use holdingsapp::Database;
use std::path::PathBuf;
use tempfile::TempDir;

pub const PLATFORMS: [Platform; 2] = [Platform::Native, Platform::Browser];

pub struct TestEnv {
    // Keep the directory alive until the test is done
    pub _temp_dir: TempDir,
    pub root: PathBuf,
    pub config: HoldingsConfig,
}

impl TestEnv {
    pub fn new(platform: Platform) -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let config = HoldingsConfig {
            data_dir: Some(root.clone()),
            platform: Some(platform),
            database_name: "holdings".to_string(),
            seed_sample_data: true,
        };
        Self {
            _temp_dir: temp_dir,
            root,
            config,
        }
    }

    /// A fresh facade over the same on-disk data.
    pub fn database(&self) -> Database {
        Database::open(&self.config).expect("failed to open database")
    }
}

pub fn item(id: &str, category: &str) -> CollectionItem {
    let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    let mut item = CollectionItem::new(id, format!("Item {}", id), category, "Shelf", day);
    item.price_paid = Some(19.99);
    item
}
