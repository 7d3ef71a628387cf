#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/demand/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod advisory;
pub mod artifact;
pub mod error;
pub mod features;
pub mod metrics;
pub mod predictor;
pub mod registry;
pub mod regression;
pub mod request;
pub mod split;
pub mod trainer;

pub use advisory::{RestockAdvice, RestockPriority};
pub use artifact::{ModelArtifact, ModelKey};
pub use error::{ModelError, Result};
pub use features::{DailyObservation, FeatureKind, daily_observations};
pub use metrics::EvaluationMetrics;
pub use predictor::{DEFAULT_HORIZON_DAYS, DemandOutlook, ForecastPoint};
pub use registry::ModelRegistry;
pub use regression::LinearRegression;
pub use request::{ErrorPayload, PredictionError, PredictionRequest, PredictionResponse};
pub use split::{SplitStrategy, TrainTestSplit};
pub use trainer::{Partitioning, Trainer, TrainerConfig, TrainingOutcome, TrainingSink};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
