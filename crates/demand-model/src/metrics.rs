//! Evaluation metrics for held-out predictions.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};

/// Error summary computed on the test split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    /// Mean absolute error
    pub mae: f64,
    /// Mean squared error
    pub mse: f64,
    /// Number of held-out rows
    pub test_samples: usize,
}

impl EvaluationMetrics {
    /// Evaluate predictions against actual values.
    pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<Self> {
        Ok(Self {
            mae: mean_absolute_error(actual, predicted)?,
            mse: mean_squared_error(actual, predicted)?,
            test_samples: actual.len(),
        })
    }
}

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() {
        return Err(ModelError::DimensionMismatch {
            expected: actual.len(),
            actual: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(ModelError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    Ok(())
}

/// Mean absolute error.
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();
    Ok(total / actual.len() as f64)
}

/// Mean squared error.
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Ok(total / actual.len() as f64)
}
