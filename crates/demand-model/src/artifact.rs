//! Persisted model artifacts.

use crate::error::{ModelError, Result};
use crate::features::{FeatureKind, feature_row};
use crate::metrics::EvaluationMetrics;
use crate::regression::LinearRegression;
use crate::split::SplitStrategy;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

const FILE_PREFIX: &str = "model_";
const FILE_EXTENSION: &str = ".json";
const GLOBAL_SUFFIX: &str = "global";

/// Partition a model was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "product_id", rename_all = "snake_case")]
pub enum ModelKey {
    /// One model across all products
    Global,
    /// One model per product
    Product(i64),
}

impl ModelKey {
    /// Artifact file name, e.g. `model_12.json` or `model_global.json`.
    pub fn file_name(self) -> String {
        match self {
            Self::Global => format!("{FILE_PREFIX}{GLOBAL_SUFFIX}{FILE_EXTENSION}"),
            Self::Product(id) => format!("{FILE_PREFIX}{id}{FILE_EXTENSION}"),
        }
    }

    /// Inverse of [`ModelKey::file_name`].
    pub fn parse_file_name(name: &str) -> Option<Self> {
        let stem = name
            .strip_prefix(FILE_PREFIX)?
            .strip_suffix(FILE_EXTENSION)?;
        if stem == GLOBAL_SUFFIX {
            Some(Self::Global)
        } else {
            stem.parse().ok().map(Self::Product)
        }
    }

    /// Feature layout used for this partition.
    pub fn feature_kinds(self) -> Vec<FeatureKind> {
        match self {
            Self::Global => vec![FeatureKind::ProductId, FeatureKind::DateOrdinal],
            Self::Product(_) => vec![FeatureKind::DateOrdinal],
        }
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Product(id) => write!(f, "product {}", id),
        }
    }
}

/// A fitted estimator with the metadata needed to use it.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Partition key
    pub key: ModelKey,
    /// Ordered feature layout the estimator expects
    pub features: Vec<FeatureKind>,
    /// Fitted estimator
    pub regression: LinearRegression,
    /// Held-out evaluation
    pub metrics: EvaluationMetrics,
    /// Number of training rows
    pub train_samples: usize,
    /// Split used for evaluation
    pub split: SplitStrategy,
    /// When the model was fitted
    pub trained_at: DateTime<Utc>,
}

impl ModelArtifact {
    /// Product to predict for, given an optional request.
    ///
    /// Per-product models default to their own product and reject others.
    /// Global models require an explicit product.
    pub fn resolve_product(&self, requested: Option<i64>) -> Result<i64> {
        match (self.key, requested) {
            (ModelKey::Product(own), None) => Ok(own),
            (ModelKey::Product(own), Some(id)) if id == own => Ok(own),
            (ModelKey::Product(own), Some(id)) => Err(ModelError::ProductMismatch {
                expected: own,
                actual: id,
            }),
            (ModelKey::Global, Some(id)) => Ok(id),
            (ModelKey::Global, None) => Err(ModelError::MissingProductId),
        }
    }

    /// Raw (unclamped) prediction for a product on a date.
    pub fn predict(&self, product_id: i64, date: NaiveDate) -> Result<f64> {
        let row = feature_row(&self.features, product_id, date);
        self.regression.predict_one(&row)
    }

    /// Read an artifact from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let load_error = |reason: String| ModelError::Load {
            path: path.display().to_string(),
            reason,
        };

        let bytes = std::fs::read(path).map_err(|e| load_error(e.to_string()))?;
        let artifact: Self =
            serde_json::from_slice(&bytes).map_err(|e| load_error(e.to_string()))?;

        if artifact.features.len() != artifact.regression.n_features() {
            return Err(load_error(format!(
                "{} features declared but estimator expects {}",
                artifact.features.len(),
                artifact.regression.n_features()
            )));
        }
        artifact
            .regression
            .validate()
            .map_err(|e| load_error(e.to_string()))?;

        Ok(artifact)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regression::exact_fit;
    use rstest::rstest;
    use std::io::Write;

    fn artifact(key: ModelKey) -> ModelArtifact {
        let features = key.feature_kinds();
        let coefficients = vec![0.5; features.len()];
        let origin = vec![0.0; features.len()];
        ModelArtifact {
            key,
            features,
            regression: exact_fit(&coefficients, 1.0, &origin),
            metrics: EvaluationMetrics {
                mae: 1.0,
                mse: 2.0,
                test_samples: 3,
            },
            train_samples: 10,
            split: SplitStrategy::Chronological,
            trained_at: Utc::now(),
        }
    }

    #[rstest]
    #[case(ModelKey::Global, "model_global.json")]
    #[case(ModelKey::Product(12), "model_12.json")]
    #[case(ModelKey::Product(-3), "model_-3.json")]
    fn test_file_names(#[case] key: ModelKey, #[case] name: &str) {
        assert_eq!(key.file_name(), name);
        assert_eq!(ModelKey::parse_file_name(name), Some(key));
    }

    #[rstest]
    #[case("model_.json")]
    #[case("model_abc.json")]
    #[case("model_3.bin")]
    #[case("other_3.json")]
    fn test_unrecognised_file_names(#[case] name: &str) {
        assert_eq!(ModelKey::parse_file_name(name), None);
    }

    #[test]
    fn test_resolve_product() {
        let per_product = artifact(ModelKey::Product(4));
        assert_eq!(per_product.resolve_product(None).unwrap(), 4);
        assert_eq!(per_product.resolve_product(Some(4)).unwrap(), 4);
        assert!(matches!(
            per_product.resolve_product(Some(5)),
            Err(ModelError::ProductMismatch { expected: 4, actual: 5 })
        ));

        let global = artifact(ModelKey::Global);
        assert_eq!(global.resolve_product(Some(9)).unwrap(), 9);
        assert!(matches!(
            global.resolve_product(None),
            Err(ModelError::MissingProductId)
        ));
    }

    #[test]
    fn test_load_missing_and_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("model_1.json");
        assert!(matches!(
            ModelArtifact::load(&missing),
            Err(ModelError::Load { .. })
        ));

        let corrupt = dir.path().join("model_2.json");
        let mut file = std::fs::File::create(&corrupt).unwrap();
        file.write_all(b"{not json").unwrap();
        let err = ModelArtifact::load(&corrupt).unwrap_err();
        assert!(err.to_string().contains("model_2.json"));
    }

    #[test]
    fn test_load_rejects_inconsistent_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_global.json");
        let mut bad = artifact(ModelKey::Global);
        bad.features = vec![FeatureKind::DateOrdinal];
        std::fs::write(&path, bad.to_json().unwrap()).unwrap();

        assert!(matches!(
            ModelArtifact::load(&path),
            Err(ModelError::Load { .. })
        ));
    }
}
