//! Training pipeline.
//!
//! Loads the sales history, aggregates it to daily observations, fits one
//! model per partition and persists each model as soon as it is fitted. A
//! partition that is skipped or fails never stops the others.

use demand_data::SalesStore;
use demand_model::trainer::{FailedPartition, SkippedPartition};
use demand_model::{
    ModelArtifact, ModelKey, ModelRegistry, Trainer, TrainingSink, daily_observations,
};
use indicatif::ProgressBar;
use std::path::PathBuf;
use tracing::info;

/// Error type for training pipeline operations.
#[derive(Debug, thiserror::Error)]
pub(crate) enum TrainingPipelineError {
    /// Sales history could not be read.
    #[error("Data load error: {0}")]
    Load(#[from] demand_data::DataError),
    /// History could not be turned into observations.
    #[error("Feature error: {0}")]
    Features(#[from] demand_model::ModelError),
}

/// What a training run did.
#[derive(Debug, Default)]
pub(crate) struct TrainingReport {
    /// Rows in the loaded sales frame.
    pub rows: usize,
    /// Persisted artifacts.
    pub saved: Vec<(ModelKey, PathBuf)>,
    /// Partitions below the observation threshold.
    pub skipped: Vec<SkippedPartition>,
    /// Partitions that failed to fit or persist.
    pub failed: Vec<FailedPartition>,
}

impl TrainingReport {
    /// True when the store held no history at all.
    pub(crate) const fn is_empty_history(&self) -> bool {
        self.rows == 0
    }
}

/// Saves each model as soon as it is fitted and drives the progress bar.
struct RegistrySink<'a> {
    registry: &'a ModelRegistry,
    progress: Option<&'a ProgressBar>,
    saved: Vec<(ModelKey, PathBuf)>,
}

impl TrainingSink for RegistrySink<'_> {
    fn begin(&mut self, partitions: usize) {
        if let Some(pb) = self.progress {
            pb.set_length(partitions as u64);
        }
    }

    fn started(&mut self, key: ModelKey) {
        if let Some(pb) = self.progress {
            pb.set_message(format!("Training {}", key));
        }
    }

    fn accept(&mut self, artifact: &ModelArtifact) -> demand_model::Result<()> {
        let path = self.registry.save(artifact)?;
        self.saved.push((artifact.key, path));
        Ok(())
    }

    fn finished(&mut self, _key: ModelKey) {
        if let Some(pb) = self.progress {
            pb.inc(1);
        }
    }
}

/// Run the pipeline, advancing `progress` once per partition.
pub(crate) fn run_training(
    store: &SalesStore,
    trainer: &Trainer,
    registry: &ModelRegistry,
    progress: Option<&ProgressBar>,
) -> Result<TrainingReport, TrainingPipelineError> {
    let sales = store.load_sales()?;
    info!(rows = sales.height(), "Loaded sales history");

    if sales.height() == 0 {
        return Ok(TrainingReport::default());
    }

    let observations = daily_observations(&sales)?;
    let mut sink = RegistrySink {
        registry,
        progress,
        saved: Vec::new(),
    };
    let outcome = trainer.train_into(&observations, &mut sink);

    Ok(TrainingReport {
        rows: sales.height(),
        saved: sink.saved,
        skipped: outcome.skipped,
        failed: outcome.failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use demand_data::{NewProduct, SaleRecord};
    use demand_model::{Partitioning, TrainerConfig};

    fn store_with_history(days: &[usize]) -> SalesStore {
        let store = SalesStore::in_memory().unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        for (i, &n) in days.iter().enumerate() {
            let id = store
                .insert_product(&NewProduct {
                    sku: format!("SKU-{}", i),
                    name: format!("Product {}", i),
                    category: None,
                    price: 1.0,
                    stock: 10,
                })
                .unwrap();
            let records: Vec<SaleRecord> = start
                .iter_days()
                .take(n)
                .map(|d| SaleRecord::new(id, d, 3))
                .collect();
            store.record_sales_batch(&records).unwrap();
        }
        store
    }

    #[test]
    fn test_empty_history_writes_nothing() {
        let store = SalesStore::in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(dir.path().join("models"));

        let report = run_training(&store, &Trainer::default(), &registry, None).unwrap();
        assert!(report.is_empty_history());
        assert!(report.saved.is_empty());
        assert!(!registry.root().exists());
    }

    #[test]
    fn test_saves_qualifying_products() {
        let store = store_with_history(&[10, 3, 5]);
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(dir.path());
        let pb = ProgressBar::hidden();

        let report = run_training(&store, &Trainer::default(), &registry, Some(&pb)).unwrap();
        assert_eq!(report.saved.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.failed.is_empty());
        assert_eq!(pb.position(), 3);
        assert_eq!(registry.keys().unwrap().len(), 2);
    }

    #[test]
    fn test_save_failure_is_reported_per_partition() {
        let store = store_with_history(&[10, 10]);
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the model directory should be.
        let blocked = dir.path().join("models");
        std::fs::write(&blocked, "not a directory").unwrap();
        let registry = ModelRegistry::new(&blocked);

        let report = run_training(&store, &Trainer::default(), &registry, None).unwrap();
        assert!(report.saved.is_empty());
        assert_eq!(report.failed.len(), 2);
    }

    #[test]
    fn test_global_model() {
        let store = store_with_history(&[6, 6]);
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(dir.path());
        let trainer = Trainer::with_config(TrainerConfig {
            partitioning: Partitioning::Global,
            ..Default::default()
        })
        .unwrap();

        let report = run_training(&store, &trainer, &registry, None).unwrap();
        assert_eq!(report.saved.len(), 1);
        assert!(registry.contains(ModelKey::Global));
    }
}
