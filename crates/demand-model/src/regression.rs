//! Ordinary least squares
//!
//! Wraps smartcore's SVD-backed [`OlsEstimator`]. Inputs are mean-centered
//! before they reach the estimator so that columns holding large values,
//! such as date ordinals, stay well conditioned.
//!
//! Columns that hold a single value across every training row (a global
//! model trained on one product, say) carry no information and are left out
//! of the fit, which matches a zero coefficient. When no column varies the
//! model predicts the training mean.

use crate::error::{ModelError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{
    LinearRegression as OlsEstimator, LinearRegressionParameters, LinearRegressionSolverName,
};

type Estimator = OlsEstimator<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Fitted linear regression estimator.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinearRegression {
    n_features: usize,
    /// Indices of the columns the estimator was fitted on
    active: Vec<usize>,
    /// Training mean of each active column
    center: Vec<f64>,
    /// Training mean, used when no column varies
    baseline: f64,
    estimator: Option<Estimator>,
}

impl LinearRegression {
    /// Fit to a design matrix (N x K) and targets (N).
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>) -> Result<Self> {
        let (n_samples, n_features) = x.dim();

        if n_samples != y.len() {
            return Err(ModelError::DimensionMismatch {
                expected: n_samples,
                actual: y.len(),
            });
        }

        let Some(baseline) = y.mean() else {
            return Err(ModelError::InsufficientData {
                required: 1,
                actual: 0,
            });
        };

        let active: Vec<usize> = x
            .axis_iter(Axis(1))
            .enumerate()
            .filter(|(_, column)| column.iter().any(|v| *v != column[0]))
            .map(|(j, _)| j)
            .collect();

        if n_samples <= active.len() {
            return Err(ModelError::InsufficientData {
                required: active.len() + 1,
                actual: n_samples,
            });
        }

        let center: Vec<f64> = active
            .iter()
            .map(|&j| x.column(j).mean().unwrap_or(0.0))
            .collect();

        let estimator = if active.is_empty() {
            None
        } else {
            let parameters =
                LinearRegressionParameters::default().with_solver(LinearRegressionSolverName::SVD);
            let matrix = dense(x, &active, &center)?;
            let fitted = Estimator::fit(&matrix, &y.to_vec(), parameters)
                .map_err(|e| ModelError::Estimator(e.to_string()))?;
            Some(fitted)
        };

        Ok(Self {
            n_features,
            active,
            center,
            baseline,
            estimator,
        })
    }

    /// Predict one value per row of `x`.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.n_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features,
                actual: x.ncols(),
            });
        }
        if x.nrows() == 0 {
            return Ok(Array1::zeros(0));
        }

        match &self.estimator {
            Some(estimator) => {
                let predicted = estimator
                    .predict(&dense(x, &self.active, &self.center)?)
                    .map_err(|e| ModelError::Estimator(e.to_string()))?;
                Ok(Array1::from(predicted))
            }
            None => Ok(Array1::from_elem(x.nrows(), self.baseline)),
        }
    }

    /// Predict a single feature row.
    pub fn predict_one(&self, row: &[f64]) -> Result<f64> {
        let x = ArrayView1::from(row).insert_axis(Axis(0)).to_owned();
        let predicted = self.predict(&x)?;
        predicted
            .first()
            .copied()
            .ok_or_else(|| ModelError::InvalidData("estimator returned no prediction".into()))
    }

    /// Number of input features.
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Check the column bookkeeping of a deserialized estimator.
    pub(crate) fn validate(&self) -> Result<()> {
        let in_range = self.active.iter().all(|&j| j < self.n_features);
        let fitted = self.estimator.is_some() == !self.active.is_empty();
        if in_range && fitted && self.center.len() == self.active.len() {
            Ok(())
        } else {
            Err(ModelError::InvalidData(format!(
                "inconsistent estimator layout: {} features, active columns {:?}",
                self.n_features, self.active
            )))
        }
    }
}

/// Copy the selected columns of `x`, shifted by `center`, into a smartcore matrix.
fn dense(x: &Array2<f64>, columns: &[usize], center: &[f64]) -> Result<DenseMatrix<f64>> {
    let rows: Vec<Vec<f64>> = x
        .outer_iter()
        .map(|row| {
            columns
                .iter()
                .zip(center)
                .map(|(&j, &m)| row[j] - m)
                .collect()
        })
        .collect();
    DenseMatrix::from_2d_vec(&rows).map_err(|e| ModelError::Estimator(e.to_string()))
}

/// Estimator fitted to exact samples of `intercept + coefficients . x`,
/// drawn a few units away from `origin`.
#[cfg(test)]
pub(crate) fn exact_fit(coefficients: &[f64], intercept: f64, origin: &[f64]) -> LinearRegression {
    let x = Array2::from_shape_fn((12, coefficients.len()), |(i, j)| {
        origin[j] + ((i + 1) as f64).powi(j as i32 + 1)
    });
    let y = x.map_axis(Axis(1), |row| {
        intercept + row.iter().zip(coefficients).map(|(v, c)| v * c).sum::<f64>()
    });
    LinearRegression::fit(&x, &y).expect("exact samples fit")
}
