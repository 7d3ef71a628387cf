//! Integration tests for the file-backed store and seeding.

use chrono::NaiveDate;
use demand_data::{HistorySeeder, SalesStore, SeedConfig, columns};

#[test]
fn test_seeded_file_store_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demand.db");
    let today = NaiveDate::from_ymd_opt(2025, 9, 30).unwrap();

    let summary = {
        let store = SalesStore::open(&path).unwrap();
        let summary = HistorySeeder::new(SeedConfig::default())
            .seed(&store, today)
            .unwrap();
        store.close().unwrap();
        summary
    };

    let store = SalesStore::open(&path).unwrap();
    let stats = store.stats().unwrap();
    assert_eq!(stats.products, summary.products);
    assert_eq!(stats.history_rows, summary.records);
    assert_eq!(stats.last_date, Some(today));

    let sales = store.load_sales().unwrap();
    assert_eq!(sales.height(), summary.records);

    let quantities = sales.column(columns::QUANTITY_SOLD).unwrap().i64().unwrap();
    assert!(quantities.into_iter().flatten().all(|q| q > 0));
}

#[test]
fn test_reseeding_replaces_history() {
    let store = SalesStore::in_memory().unwrap();
    let today = NaiveDate::from_ymd_opt(2025, 9, 30).unwrap();
    let seeder = HistorySeeder::default();

    let first = seeder.seed(&store, today).unwrap();
    let second = seeder.seed(&store, today).unwrap();

    assert_eq!(first.records, second.records);
    assert_eq!(store.stats().unwrap().history_rows, second.records);
    assert_eq!(store.product_ids().unwrap().len(), second.products);
}
