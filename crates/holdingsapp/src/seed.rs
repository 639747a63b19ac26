//! First-run data.
//!
//! Two things are seeded so a fresh install is never empty:
//!
//! - The default category set, written on the first successful init when no
//!   category record exists yet. A legacy record found at that point is
//!   migrated instead of overwritten.
//! - A handful of sample items, written when the item collection is loaded
//!   and found empty. A collection with even one item is left alone.
//!
//! Seeding is a read followed by a conditional write. Two bootstraps racing
//! each other can both seed; with one user and one process that does not
//! happen in practice.

use crate::categories::CategorySet;
use crate::error::Result;
use crate::model::CollectionItem;
use crate::store::StorageBackend;
use chrono::{Duration, NaiveDate, Utc};
use tracing::info;

pub const SAMPLE_ID_PREFIX: &str = "sample-";

struct Sample {
    name: &'static str,
    category: &'static str,
    location: &'static str,
    days_ago: i64,
    price_paid: Option<f64>,
    price_expected: Option<f64>,
    notes: Option<&'static str>,
}

const SAMPLES: [Sample; 6] = [
    Sample {
        name: "Cordless Drill",
        category: "Tools",
        location: "Garage",
        days_ago: 45,
        price_paid: Some(129.0),
        price_expected: Some(60.0),
        notes: None,
    },
    Sample {
        name: "Road Bike",
        category: "Bikes",
        location: "Shed",
        days_ago: 210,
        price_paid: Some(850.0),
        price_expected: Some(400.0),
        notes: Some("Needs new brake pads"),
    },
    Sample {
        name: "Espresso Machine",
        category: "Kitchen",
        location: "Kitchen counter",
        days_ago: 1,
        price_paid: Some(349.0),
        price_expected: Some(180.0),
        notes: None,
    },
    Sample {
        name: "Camping Tent",
        category: "Camping",
        location: "Attic",
        days_ago: 400,
        price_paid: Some(220.0),
        price_expected: Some(90.0),
        notes: None,
    },
    Sample {
        name: "Acoustic Guitar",
        category: "Instruments",
        location: "Living room",
        days_ago: 14,
        price_paid: Some(499.0),
        price_expected: Some(350.0),
        notes: None,
    },
    Sample {
        name: "Winter Coat",
        category: "Clothing",
        location: "Hall closet",
        days_ago: 120,
        price_paid: Some(180.0),
        price_expected: None,
        notes: Some("Dry clean only"),
    },
];

/// The built-in sample set, with `lastUsed` dates relative to `today`.
pub fn sample_items(today: NaiveDate) -> Vec<CollectionItem> {
    SAMPLES
        .iter()
        .enumerate()
        .map(|(n, sample)| {
            let mut item = CollectionItem::new(
                format!("{}{}", SAMPLE_ID_PREFIX, n + 1),
                sample.name,
                sample.category,
                sample.location,
                today - Duration::days(sample.days_ago),
            );
            item.price_paid = sample.price_paid;
            item.price_expected = sample.price_expected;
            item.notes = sample.notes.map(str::to_string);
            item
        })
        .collect()
}

/// Write the default category set unless a category record already exists.
pub async fn ensure_default_categories(backend: &dyn StorageBackend) -> Result<()> {
    let _guard = backend.category_lock().lock().await;
    if backend.load_category_record().await?.is_some() {
        // Normalizes (and migrates) whatever is there.
        backend.load_categories().await?;
        return Ok(());
    }
    backend.store_categories(&CategorySet::new()).await?;
    info!("Seeded default categories");
    Ok(())
}

/// Seed the sample items if the collection is empty. Returns the collection
/// as it stands afterwards.
pub async fn seed_items_if_empty(backend: &dyn StorageBackend) -> Result<Vec<CollectionItem>> {
    let existing = backend.get_items().await?;
    if !existing.is_empty() {
        return Ok(existing);
    }
    let samples = sample_items(Utc::now().date_naive());
    for item in &samples {
        backend.save_item(item).await?;
    }
    info!(count = samples.len(), "Seeded sample items");
    backend.get_items().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::is_default_category;
    use crate::config::Platform;
    use crate::store::memory_backend;

    #[test]
    fn test_sample_items_are_well_formed() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let items = sample_items(today);
        assert_eq!(items.len(), SAMPLES.len());
        assert!(items.iter().all(|i| i.id.starts_with(SAMPLE_ID_PREFIX)));
        assert!(items.iter().all(|i| is_default_category(&i.category)));
        assert!(items.iter().all(|i| i.last_used <= today));
        assert_eq!(items[0].days_unused(today), 45);
    }

    #[tokio::test]
    async fn test_seed_only_when_empty() {
        let backend = memory_backend(Platform::Native);
        backend.init().await.unwrap();

        let seeded = seed_items_if_empty(backend.as_ref()).await.unwrap();
        assert_eq!(seeded.len(), SAMPLES.len());

        let again = seed_items_if_empty(backend.as_ref()).await.unwrap();
        assert_eq!(again.len(), SAMPLES.len());
    }

    #[tokio::test]
    async fn test_no_seed_when_one_item_exists() {
        let backend = memory_backend(Platform::Browser);
        backend.init().await.unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        backend
            .save_item(&CollectionItem::new("mine", "Mug", "Kitchen", "Shelf", day))
            .await
            .unwrap();

        let items = seed_items_if_empty(backend.as_ref()).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "mine");
    }

    #[tokio::test]
    async fn test_default_categories_written_once() {
        let backend = memory_backend(Platform::Native);
        backend.init().await.unwrap();
        assert!(backend.load_category_record().await.unwrap().is_none());

        ensure_default_categories(backend.as_ref()).await.unwrap();
        backend.add_category("Vinyl").await.unwrap();
        ensure_default_categories(backend.as_ref()).await.unwrap();

        assert_eq!(
            backend.get_user_categories().await.unwrap(),
            vec!["Vinyl".to_string()]
        );
    }
}
