//! Feature construction
//!
//! Maps sales history and future dates onto the numeric rows the regression
//! consumes. Dates are encoded as ordinals in the proleptic Gregorian
//! calendar (0001-01-01 is day 1), which keeps the encoding strictly
//! monotonic and reversible. Product identifiers pass through unencoded, so
//! the estimator treats them as a numeric feature.

use crate::error::{ModelError, Result};
use chrono::{Datelike, NaiveDate};
use demand_data::{DATE_FORMAT, columns};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// One aggregated day of demand for one product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    /// Product identifier
    pub product_id: i64,
    /// Calendar date
    pub date: NaiveDate,
    /// Total units sold that day
    pub quantity: f64,
}

/// Input column of the design matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Raw product identifier
    ProductId,
    /// Ordinal day number of the date
    DateOrdinal,
}

impl FeatureKind {
    /// Numeric value of this feature for a product on a date.
    pub fn value(self, product_id: i64, date: NaiveDate) -> f64 {
        match self {
            Self::ProductId => product_id as f64,
            Self::DateOrdinal => date_ordinal(date) as f64,
        }
    }

    /// Column name used in logs and reports.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ProductId => "product_id",
            Self::DateOrdinal => "date_ordinal",
        }
    }
}

/// Ordinal day number of `date` (0001-01-01 is day 1).
pub fn date_ordinal(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce())
}

/// `days` contiguous calendar days starting the day after `today`.
pub fn future_dates(today: NaiveDate, days: usize) -> Vec<NaiveDate> {
    today.iter_days().skip(1).take(days).collect()
}

/// Feature row for a product on a date.
pub fn feature_row(kinds: &[FeatureKind], product_id: i64, date: NaiveDate) -> Vec<f64> {
    kinds.iter().map(|k| k.value(product_id, date)).collect()
}

/// Design matrix (one row per observation, one column per feature kind).
pub fn design_matrix(kinds: &[FeatureKind], observations: &[DailyObservation]) -> Array2<f64> {
    Array2::from_shape_fn((observations.len(), kinds.len()), |(i, j)| {
        let obs = &observations[i];
        kinds[j].value(obs.product_id, obs.date)
    })
}

/// Aggregate the loaded sales frame into daily observations.
///
/// Quantities are summed per product and date. The result is ordered by
/// product, then date.
pub fn daily_observations(sales: &DataFrame) -> Result<Vec<DailyObservation>> {
    if sales.height() == 0 {
        return Ok(Vec::new());
    }

    let daily = sales
        .clone()
        .lazy()
        .group_by([col(columns::PRODUCT_ID), col(columns::SALE_DATE)])
        .agg([col(columns::QUANTITY_SOLD).sum()])
        .sort(
            [columns::PRODUCT_ID, columns::SALE_DATE],
            Default::default(),
        )
        .collect()?;

    let product_ids = daily.column(columns::PRODUCT_ID)?.i64()?;
    let dates = daily.column(columns::SALE_DATE)?.str()?;
    let quantities = daily
        .column(columns::QUANTITY_SOLD)?
        .cast(&DataType::Float64)?;
    let quantities = quantities.f64()?;

    let mut observations = Vec::with_capacity(daily.height());
    for i in 0..daily.height() {
        let product_id = product_ids
            .get(i)
            .ok_or_else(|| ModelError::InvalidData("Missing product_id".to_string()))?;
        let date = dates
            .get(i)
            .ok_or_else(|| ModelError::InvalidData("Missing sale_date".to_string()))?;
        let date = NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map_err(|e| ModelError::InvalidData(format!("Invalid sale_date '{}': {}", date, e)))?;
        let quantity = quantities
            .get(i)
            .ok_or_else(|| ModelError::InvalidData("Missing quantity_sold".to_string()))?;

        observations.push(DailyObservation {
            product_id,
            date,
            quantity,
        });
    }

    Ok(observations)
}
