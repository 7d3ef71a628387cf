//! Single-request prediction
//!
//! One JSON object on stdin, one JSON object on stdout. The checks run in a
//! fixed order: model load, empty input, JSON parse, `fecha`, `producto_id`.
//! Every failure maps to an `{"error": ...}` payload and an exit code; only
//! empty input exits with status 0.

use crate::artifact::ModelArtifact;
use crate::error::ModelError;
use crate::predictor::clamp_demand;
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Days between invocation and the reported target date.
pub const TARGET_OFFSET_DAYS: u64 = 7;

/// Lower band factor applied to the point prediction.
pub const LOWER_BAND: f64 = 0.9;

/// Upper band factor applied to the point prediction.
pub const UPPER_BAND: f64 = 1.1;

const DATE_FIELD: &str = "fecha";
const PRODUCT_FIELD: &str = "producto_id";

/// Failures of the single-request flow.
#[derive(Debug, Error)]
pub enum PredictionError {
    /// Artifact missing or unreadable
    #[error("Could not load model: {0}")]
    ModelLoad(ModelError),

    /// Nothing on stdin
    #[error("No input data received")]
    EmptyInput,

    /// Input is not a JSON object or a field has the wrong type
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// `fecha` absent
    #[error("Missing required field 'fecha'")]
    MissingDate,

    /// `producto_id` absent
    #[error("Missing required field 'producto_id'")]
    MissingProductId,

    /// `fecha` present but not a date
    #[error("Invalid date '{0}'")]
    InvalidDate(String),

    /// Prediction failed
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl PredictionError {
    /// Process exit status for this failure.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::EmptyInput => 0,
            _ => 1,
        }
    }

    /// Structured payload written to stdout.
    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            error: self.to_string(),
        }
    }
}

/// Error object written to stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable message
    pub error: String,
}

/// A validated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionRequest {
    /// Requested date
    pub date: NaiveDate,
    /// Requested product
    pub product_id: i64,
}

impl PredictionRequest {
    /// Parse and validate raw stdin contents.
    pub fn parse(input: &str) -> Result<Self, PredictionError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(PredictionError::EmptyInput);
        }

        let value: Value = serde_json::from_str(input)
            .map_err(|e| PredictionError::InvalidRequest(e.to_string()))?;
        let object = value.as_object().ok_or_else(|| {
            PredictionError::InvalidRequest("expected a JSON object".to_string())
        })?;

        let date = match object.get(DATE_FIELD) {
            None | Some(Value::Null) => return Err(PredictionError::MissingDate),
            Some(Value::String(s)) => parse_date(s)?,
            Some(other) => return Err(PredictionError::InvalidDate(other.to_string())),
        };

        let product_id = match object.get(PRODUCT_FIELD) {
            None | Some(Value::Null) => return Err(PredictionError::MissingProductId),
            Some(v) => v.as_i64().ok_or_else(|| {
                PredictionError::InvalidRequest(format!(
                    "'{}' must be an integer, got {}",
                    PRODUCT_FIELD, v
                ))
            })?,
        };

        Ok(Self { date, product_id })
    }
}

/// Accepts `YYYY-MM-DD`, RFC 3339 and naive `YYYY-MM-DDTHH:MM:SS`.
fn parse_date(raw: &str) -> Result<NaiveDate, PredictionError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
        .map_err(|_| PredictionError::InvalidDate(raw.to_string()))
}

/// Successful response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Point prediction, never negative
    #[serde(rename = "demanda_predicha")]
    pub predicted: f64,
    /// `max(0, 0.9 * predicted)`
    #[serde(rename = "limite_inferior")]
    pub lower: f64,
    /// `1.1 * predicted`
    #[serde(rename = "limite_superior")]
    pub upper: f64,
    /// Invocation date plus seven days, independent of the requested date
    #[serde(rename = "fecha_objetivo")]
    pub target_date: NaiveDate,
}

impl PredictionResponse {
    /// Build a response from a raw estimator output.
    pub fn from_raw(raw: f64, today: NaiveDate) -> Self {
        let predicted = clamp_demand(raw);
        Self {
            predicted,
            lower: (predicted * LOWER_BAND).max(0.0),
            upper: predicted * UPPER_BAND,
            target_date: today
                .checked_add_days(Days::new(TARGET_OFFSET_DAYS))
                .unwrap_or(today),
        }
    }
}

/// Answer a request with an already loaded model.
pub fn predict_request(
    artifact: &ModelArtifact,
    input: &str,
    today: NaiveDate,
) -> Result<PredictionResponse, PredictionError> {
    let request = PredictionRequest::parse(input)?;
    let product_id = artifact.resolve_product(Some(request.product_id))?;
    let raw = artifact.predict(product_id, request.date)?;
    Ok(PredictionResponse::from_raw(raw, today))
}

/// Load the model at `model_path` and answer the request in `input`.
pub fn respond(
    input: &str,
    model_path: &Path,
    today: NaiveDate,
) -> Result<PredictionResponse, PredictionError> {
    let artifact = ModelArtifact::load(model_path).map_err(PredictionError::ModelLoad)?;
    predict_request(&artifact, input, today)
}
