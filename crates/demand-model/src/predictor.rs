//! Batch forecasting
//!
//! Predictions for a contiguous run of future days starting tomorrow.
//! Every predicted quantity is clamped at zero.

use crate::artifact::ModelArtifact;
use crate::error::Result;
use crate::features::future_dates;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default forecast horizon in days.
pub const DEFAULT_HORIZON_DAYS: usize = 30;

/// One forecast day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Forecast date
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    /// Predicted quantity, never negative
    #[serde(rename = "prediccion")]
    pub prediction: f64,
}

/// Aggregate demand for one product over a horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandOutlook {
    /// Product identifier
    #[serde(rename = "producto_id")]
    pub product_id: i64,
    /// Horizon in days
    #[serde(rename = "dias")]
    pub days: usize,
    /// Mean predicted daily demand
    #[serde(rename = "promedio_diario")]
    pub average_daily: f64,
    /// Total predicted demand
    #[serde(rename = "total_predicho")]
    pub total: f64,
    /// Daily predictions
    #[serde(rename = "predicciones")]
    pub points: Vec<ForecastPoint>,
}

/// Clamp a raw prediction at zero.
pub const fn clamp_demand(raw: f64) -> f64 {
    if raw > 0.0 { raw } else { 0.0 }
}

/// Forecast `days` days after `today`.
///
/// `product_id` is required for a global model and optional for a
/// per-product one.
pub fn forecast(
    artifact: &ModelArtifact,
    today: NaiveDate,
    days: usize,
    product_id: Option<i64>,
) -> Result<Vec<ForecastPoint>> {
    let product_id = artifact.resolve_product(product_id)?;

    future_dates(today, days)
        .into_iter()
        .map(|date| {
            let raw = artifact.predict(product_id, date)?;
            Ok(ForecastPoint {
                date,
                prediction: clamp_demand(raw),
            })
        })
        .collect()
}

/// Average and total demand for a product over `days` days.
pub fn outlook(
    artifact: &ModelArtifact,
    product_id: i64,
    today: NaiveDate,
    days: usize,
) -> Result<DemandOutlook> {
    let points = forecast(artifact, today, days, Some(product_id))?;
    let total: f64 = points.iter().map(|p| p.prediction).sum();
    let average_daily = if points.is_empty() {
        0.0
    } else {
        total / points.len() as f64
    };

    Ok(DemandOutlook {
        product_id,
        days,
        average_daily,
        total,
        points,
    })
}
