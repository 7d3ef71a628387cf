//! Restock advisory
//!
//! Turns a demand outlook and the current stock level into a stockout
//! horizon, a recommended order quantity and a priority.

use crate::predictor::DemandOutlook;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reported stockout horizon when no demand is predicted.
pub const NO_STOCKOUT_DAYS: u32 = 999;

/// Safety margin applied to predicted demand when ordering.
pub const SAFETY_FACTOR: f64 = 1.2;

/// Urgency of a restock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RestockPriority {
    /// Stockout within a week
    #[serde(rename = "CRITICA")]
    Critical,
    /// Stockout within two weeks
    #[serde(rename = "ALTA")]
    High,
    /// Stockout within a month
    #[serde(rename = "MEDIA")]
    Medium,
    /// No stockout expected this month
    #[serde(rename = "BAJA")]
    Low,
}

impl RestockPriority {
    /// Priority for a stockout horizon in days.
    pub const fn from_days(days_until_stockout: u32) -> Self {
        match days_until_stockout {
            0..7 => Self::Critical,
            7..15 => Self::High,
            15..30 => Self::Medium,
            _ => Self::Low,
        }
    }

    /// Whether the priority warrants an alert.
    pub const fn is_alert(self) -> bool {
        matches!(self, Self::Critical | Self::High)
    }
}

impl fmt::Display for RestockPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Critical => "CRITICA",
            Self::High => "ALTA",
            Self::Medium => "MEDIA",
            Self::Low => "BAJA",
        };
        f.write_str(label)
    }
}

/// Restock recommendation for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestockAdvice {
    /// Product identifier
    #[serde(rename = "producto_id")]
    pub product_id: i64,
    /// Units on hand
    #[serde(rename = "stock_actual")]
    pub current_stock: i64,
    /// Mean predicted daily demand
    #[serde(rename = "promedio_diario")]
    pub average_daily: f64,
    /// Total predicted demand over the horizon
    #[serde(rename = "total_predicho")]
    pub total_predicted: f64,
    /// Whole days of stock left at the average rate
    #[serde(rename = "dias_hasta_agotamiento")]
    pub days_until_stockout: u32,
    /// Units to order
    #[serde(rename = "pedido_recomendado")]
    pub recommended_order: u64,
    /// Urgency
    #[serde(rename = "prioridad")]
    pub priority: RestockPriority,
    /// Critical or high priority
    #[serde(rename = "alerta")]
    pub alert: bool,
}

impl RestockAdvice {
    /// Assess an outlook against the current stock.
    pub fn assess(outlook: &DemandOutlook, current_stock: i64) -> Self {
        let stock = current_stock.max(0) as f64;

        let days_until_stockout = if outlook.average_daily > 0.0 {
            (stock / outlook.average_daily)
                .floor()
                .min(f64::from(NO_STOCKOUT_DAYS)) as u32
        } else {
            NO_STOCKOUT_DAYS
        };

        let recommended_order = (outlook.total * SAFETY_FACTOR - stock).ceil().max(0.0) as u64;
        let priority = RestockPriority::from_days(days_until_stockout);

        Self {
            product_id: outlook.product_id,
            current_stock,
            average_daily: outlook.average_daily,
            total_predicted: outlook.total,
            days_until_stockout,
            recommended_order,
            priority,
            alert: priority.is_alert(),
        }
    }
}
