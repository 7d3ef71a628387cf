//! End-to-end tests: store -> features -> trainer -> registry -> predictor.

use chrono::NaiveDate;
use demand_data::{NewProduct, SaleRecord, SalesStore};
use demand_model::{
    ModelKey, ModelRegistry, Partitioning, SplitStrategy, Trainer, TrainerConfig,
    daily_observations, predictor, request,
};

fn product(store: &SalesStore, sku: &str) -> i64 {
    store
        .insert_product(&NewProduct {
            sku: sku.to_string(),
            name: format!("Product {}", sku),
            category: None,
            price: 10.0,
            stock: 50,
        })
        .unwrap()
}

fn record_days(store: &SalesStore, product_id: i64, days: usize) {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let records: Vec<SaleRecord> = start
        .iter_days()
        .take(days)
        .enumerate()
        .map(|(i, d)| SaleRecord::new(product_id, d, 5 + i as u32))
        .collect();
    store.record_sales_batch(&records).unwrap();
}

#[test]
fn test_threshold_decides_which_products_get_models() {
    let store = SalesStore::in_memory().unwrap();
    let enough = product(&store, "A");
    let exactly_five = product(&store, "B");
    let too_few = product(&store, "C");
    record_days(&store, enough, 30);
    record_days(&store, exactly_five, 5);
    record_days(&store, too_few, 4);

    let observations = daily_observations(&store.load_sales().unwrap()).unwrap();
    let outcome = Trainer::default().train(&observations);

    let dir = tempfile::tempdir().unwrap();
    let registry = ModelRegistry::new(dir.path());
    for artifact in outcome.models.values() {
        registry.save(artifact).unwrap();
    }

    assert!(registry.contains(ModelKey::Product(enough)));
    assert!(registry.contains(ModelKey::Product(exactly_five)));
    assert!(!registry.contains(ModelKey::Product(too_few)));
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].key, ModelKey::Product(too_few));
}

#[test]
fn test_empty_history_trains_nothing() {
    let store = SalesStore::in_memory().unwrap();
    product(&store, "A");

    let sales = store.load_sales().unwrap();
    assert_eq!(sales.height(), 0);

    let observations = daily_observations(&sales).unwrap();
    let outcome = Trainer::default().train(&observations);
    assert!(outcome.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let registry = ModelRegistry::new(dir.path().join("models"));
    assert!(registry.keys().unwrap().is_empty());
    store.close().unwrap();
}

#[test]
fn test_saved_model_predicts_identically_after_reload() {
    let store = SalesStore::in_memory().unwrap();
    let id = product(&store, "A");
    record_days(&store, id, 40);

    let observations = daily_observations(&store.load_sales().unwrap()).unwrap();
    let outcome = Trainer::default().train(&observations);
    let trained = &outcome.models[&ModelKey::Product(id)];

    let dir = tempfile::tempdir().unwrap();
    let registry = ModelRegistry::new(dir.path());
    registry.save(trained).unwrap();
    let loaded = registry.load(ModelKey::Product(id)).unwrap();
    assert_eq!(loaded.key, trained.key);
    assert_eq!(loaded.metrics, trained.metrics);

    let today = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
    let before = predictor::forecast(trained, today, 30, None).unwrap();
    let after = predictor::forecast(&loaded, today, 30, None).unwrap();
    assert_eq!(before, after);
    assert_eq!(after.len(), 30);
    assert_eq!(after[0].date, NaiveDate::from_ymd_opt(2024, 4, 11).unwrap());
    assert!(after.windows(2).all(|w| w[0].date < w[1].date));
}

#[test]
fn test_global_model_answers_stdin_request() {
    let store = SalesStore::in_memory().unwrap();
    let a = product(&store, "A");
    let b = product(&store, "B");
    record_days(&store, a, 20);
    record_days(&store, b, 20);

    let observations = daily_observations(&store.load_sales().unwrap()).unwrap();
    let trainer = Trainer::with_config(TrainerConfig {
        partitioning: Partitioning::Global,
        split: SplitStrategy::Shuffled { seed: 42 },
        ..Default::default()
    })
    .unwrap();
    let outcome = trainer.train(&observations);

    let dir = tempfile::tempdir().unwrap();
    let registry = ModelRegistry::new(dir.path());
    let path = registry.save(&outcome.models[&ModelKey::Global]).unwrap();

    let today = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
    let input = format!(r#"{{"fecha": "2024-04-01", "producto_id": {}}}"#, a);
    let response = request::respond(&input, &path, today).unwrap();

    assert!(response.predicted >= 0.0);
    assert_eq!(response.lower, (0.9 * response.predicted).max(0.0));
    assert_eq!(response.upper, 1.1 * response.predicted);
    assert_eq!(
        response.target_date,
        NaiveDate::from_ymd_opt(2024, 4, 17).unwrap()
    );

    let err = request::respond(r#"{"producto_id": 1}"#, &path, today).unwrap_err();
    assert_eq!(err.exit_code(), 1);
    assert!(err.payload().error.contains("fecha"));

    let err = request::respond("", &path, today).unwrap_err();
    assert_eq!(err.exit_code(), 0);
}
