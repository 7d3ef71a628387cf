//! Error types for model operations.

use demand_data::DataError;
use thiserror::Error;

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur while building features, training or predicting.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Insufficient data for fitting or evaluation
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Estimator failed to fit or predict
    #[error("Estimator error: {0}")]
    Estimator(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Malformed input table
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A global model was used without a product identifier
    #[error("Model expects a product identifier but none was given")]
    MissingProductId,

    /// A per-product model was asked about another product
    #[error("Model was trained for product {expected}, not product {actual}")]
    ProductMismatch {
        /// Product the model was trained for
        expected: i64,
        /// Product requested
        actual: i64,
    },

    /// Artifact could not be read or decoded
    #[error("Could not load model from {path}: {reason}")]
    Load {
        /// Artifact path
        path: String,
        /// Underlying failure
        reason: String,
    },

    /// Data layer error
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
