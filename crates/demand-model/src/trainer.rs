//! Model training
//!
//! Splits daily observations into partitions (one per product, or a single
//! global partition), fits a [`LinearRegression`] per partition on the
//! training rows and evaluates it on the held-out rows. Evaluation is
//! reported, never used to reject a model.
//!
//! Fitted models are handed to a [`TrainingSink`] as soon as they exist, so
//! a caller can persist each one before the next partition is fitted.

use crate::artifact::{ModelArtifact, ModelKey};
use crate::error::{ModelError, Result};
use crate::features::{DailyObservation, design_matrix};
use crate::metrics::EvaluationMetrics;
use crate::regression::LinearRegression;
use crate::split::{SplitStrategy, train_test_split};
use chrono::Utc;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, info, warn};

/// How observations are grouped into models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partitioning {
    /// One model per product
    #[default]
    PerProduct,
    /// One model over all products
    Global,
}

/// Configuration for the trainer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainerConfig {
    /// Partitioning mode
    pub partitioning: Partitioning,
    /// Train/test split strategy
    pub split: SplitStrategy,
    /// Fraction of rows held out for evaluation
    pub test_fraction: f64,
    /// Partitions with fewer observations are skipped
    pub min_observations: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            partitioning: Partitioning::PerProduct,
            split: SplitStrategy::Chronological,
            test_fraction: 0.2,
            min_observations: 5,
        }
    }
}

impl TrainerConfig {
    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ModelError::InvalidParameter(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.min_observations < 2 {
            return Err(ModelError::InvalidParameter(format!(
                "min_observations must be at least 2, got {}",
                self.min_observations
            )));
        }
        Ok(())
    }
}

/// A partition left untrained for lack of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedPartition {
    /// Partition key
    pub key: ModelKey,
    /// Observations available
    pub observations: usize,
}

/// A partition whose fit failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPartition {
    /// Partition key
    pub key: ModelKey,
    /// Error message
    pub reason: String,
}

/// Result of fitting one partition.
#[derive(Debug)]
pub enum PartitionOutcome {
    /// Model fitted
    Trained(Box<ModelArtifact>),
    /// Not enough observations
    Skipped(SkippedPartition),
}

/// Everything a training run produced.
#[derive(Debug, Default)]
pub struct TrainingOutcome {
    /// Fitted models keyed by partition
    pub models: BTreeMap<ModelKey, ModelArtifact>,
    /// Partitions skipped for insufficient data
    pub skipped: Vec<SkippedPartition>,
    /// Partitions that failed to fit or were rejected by the sink
    pub failed: Vec<FailedPartition>,
}

impl TrainingOutcome {
    /// True when no partition produced a model.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Receives partition results while a training run is in progress.
pub trait TrainingSink {
    /// Called once with the number of partitions about to be trained.
    fn begin(&mut self, _partitions: usize) {}

    /// Called before a partition is fitted.
    fn started(&mut self, _key: ModelKey) {}

    /// Called with each fitted model.
    ///
    /// An error marks the partition as failed and keeps the model out of
    /// the [`TrainingOutcome`].
    fn accept(&mut self, _artifact: &ModelArtifact) -> Result<()> {
        Ok(())
    }

    /// Called once a partition is trained, skipped or failed.
    fn finished(&mut self, _key: ModelKey) {}
}

impl TrainingSink for () {}

/// Fits one estimator per partition.
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    /// Create a trainer with a validated configuration.
    pub fn with_config(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration.
    pub const fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Group observations into partitions.
    ///
    /// Per-product partitions keep the input's date order. The global
    /// partition is re-sorted by date so a chronological split holds out
    /// the most recent days across all products.
    pub fn partition(
        &self,
        observations: &[DailyObservation],
    ) -> BTreeMap<ModelKey, Vec<DailyObservation>> {
        let mut partitions: BTreeMap<ModelKey, Vec<DailyObservation>> = BTreeMap::new();
        if observations.is_empty() {
            return partitions;
        }

        match self.config.partitioning {
            Partitioning::PerProduct => {
                for obs in observations {
                    partitions
                        .entry(ModelKey::Product(obs.product_id))
                        .or_default()
                        .push(*obs);
                }
                for rows in partitions.values_mut() {
                    rows.sort_by_key(|o| o.date);
                }
            }
            Partitioning::Global => {
                let mut rows = observations.to_vec();
                rows.sort_by_key(|o| (o.date, o.product_id));
                partitions.insert(ModelKey::Global, rows);
            }
        }

        partitions
    }

    /// Fit and evaluate a single partition.
    pub fn fit_partition(
        &self,
        key: ModelKey,
        observations: &[DailyObservation],
    ) -> Result<PartitionOutcome> {
        let n = observations.len();
        if n < self.config.min_observations {
            warn!(
                partition = %key,
                observations = n,
                required = self.config.min_observations,
                "Insufficient data, skipping"
            );
            return Ok(PartitionOutcome::Skipped(SkippedPartition {
                key,
                observations: n,
            }));
        }

        let split = train_test_split(n, self.config.test_fraction, self.config.split)?;
        let select = |indices: &[usize]| -> Vec<DailyObservation> {
            indices.iter().map(|&i| observations[i]).collect()
        };
        let train_rows = select(&split.train);
        let test_rows = select(&split.test);

        let features = key.feature_kinds();
        let x_train = design_matrix(&features, &train_rows);
        let y_train: Array1<f64> = train_rows.iter().map(|o| o.quantity).collect();
        let regression = LinearRegression::fit(&x_train, &y_train)?;

        let x_test = design_matrix(&features, &test_rows);
        let predicted = regression.predict(&x_test)?;
        let actual: Vec<f64> = test_rows.iter().map(|o| o.quantity).collect();
        let metrics = EvaluationMetrics::evaluate(&actual, &predicted.to_vec())?;

        let columns: Vec<&str> = features.iter().map(|f| f.name()).collect();
        info!(
            partition = %key,
            features = %columns.join(","),
            train = train_rows.len(),
            test = test_rows.len(),
            mse = metrics.mse,
            mae = metrics.mae,
            "Model trained"
        );

        Ok(PartitionOutcome::Trained(Box::new(ModelArtifact {
            key,
            features,
            regression,
            metrics,
            train_samples: train_rows.len(),
            split: self.config.split,
            trained_at: Utc::now(),
        })))
    }

    /// Train every partition, keeping the models in memory.
    pub fn train(&self, observations: &[DailyObservation]) -> TrainingOutcome {
        self.train_into(observations, &mut ())
    }

    /// Train every partition, handing each fitted model to `sink`.
    ///
    /// A skip or failure in one partition never prevents the others from
    /// being trained.
    pub fn train_into<S: TrainingSink + ?Sized>(
        &self,
        observations: &[DailyObservation],
        sink: &mut S,
    ) -> TrainingOutcome {
        let partitions = self.partition(observations);
        sink.begin(partitions.len());

        let mut outcome = TrainingOutcome::default();
        for (key, rows) in partitions {
            sink.started(key);

            let result = match self.fit_partition(key, &rows) {
                Ok(PartitionOutcome::Trained(artifact)) => {
                    sink.accept(&artifact).map(|()| PartitionOutcome::Trained(artifact))
                }
                other => other,
            };

            match result {
                Ok(PartitionOutcome::Trained(artifact)) => {
                    outcome.models.insert(key, *artifact);
                }
                Ok(PartitionOutcome::Skipped(skipped)) => outcome.skipped.push(skipped),
                Err(e) => {
                    error!(partition = %key, error = %e, "Training failed");
                    outcome.failed.push(FailedPartition {
                        key,
                        reason: e.to_string(),
                    });
                }
            }

            sink.finished(key);
        }

        outcome
    }
}
