mod common;

use common::{item, TestEnv};
use holdingsapp::backup::{self, BackupDocument, BACKUP_VERSION};
use holdingsapp::config::Platform;
use holdingsapp::model::{ProfileUpdate, Settings, Theme};

#[tokio::test]
async fn test_export_from_flat_restore_into_structured() {
    let source_env = TestEnv::new(Platform::Native);
    let source = source_env.database();
    source.save_item(&item("1", "Vinyl")).await.into_result().unwrap();
    source.save_item(&item("2", "Books")).await.into_result().unwrap();
    source
        .save_settings(&Settings {
            currency: "CAD".to_string(),
            theme: Theme::Dark,
            ..Settings::default()
        })
        .await
        .into_result()
        .unwrap();
    source
        .save_profile(&ProfileUpdate {
            name: Some("Sam".to_string()),
            email: Some("sam@example.com".to_string()),
            avatar: None,
        })
        .await
        .into_result()
        .unwrap();

    let document = backup::export(&source).await.into_result().unwrap();
    assert_eq!(document.version, BACKUP_VERSION);
    assert_eq!(document.inventory.len(), 2);

    // The document survives its JSON form.
    let text = document.to_json_pretty().unwrap();
    let parsed = BackupDocument::from_json(&text).unwrap();
    assert_eq!(parsed.categories, document.categories);
    assert_eq!(parsed.settings, document.settings);
    assert_eq!(parsed.timestamp, document.timestamp);

    let target_env = TestEnv::new(Platform::Browser);
    let target = target_env.database();
    let report = backup::restore(&target, &parsed).await;
    assert!(report.is_complete(), "{:?}", report.faults);
    assert_eq!(report.items_restored, 2);
    assert!(report.settings_restored);
    assert!(report.profile_restored);

    assert_eq!(target.get_item("1").await.into_value().unwrap().category, "Vinyl");
    assert_eq!(
        target.get_user_categories().await.into_value(),
        vec!["Vinyl".to_string()]
    );
    assert_eq!(
        target.get_settings().await.into_value().unwrap().currency,
        "CAD"
    );
    assert_eq!(
        target.get_profile().await.into_value().unwrap().email,
        "sam@example.com"
    );
}

#[tokio::test]
async fn test_restore_keeps_items_not_in_backup() {
    let env = TestEnv::new(Platform::Native);
    let db = env.database();
    db.save_item(&item("local", "Books")).await.into_result().unwrap();
    db.add_category("Stale").await.into_result().unwrap();

    let document = BackupDocument::from_json(
        r#"{
            "inventory": [{"id":"remote","name":"Lamp","category":"Decor","location":"Desk","lastUsed":"2024-01-02"}],
            "categories": ["Decor", "Kitchen"],
            "timestamp": "2024-06-01T10:00:00Z",
            "version": "1.0"
        }"#,
    )
    .unwrap();

    let report = backup::restore(&db, &document).await;
    assert!(report.is_complete());
    assert!(!report.settings_restored);

    let ids: Vec<String> = db
        .get_items()
        .await
        .into_value()
        .into_iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(ids, vec!["local".to_string(), "remote".to_string()]);
    assert_eq!(
        db.get_user_categories().await.into_value(),
        vec!["Decor".to_string()]
    );
}
