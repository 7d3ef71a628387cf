//! Rendering of forecast results.
//!
//! JSON for machine consumers (the default), CSV for spreadsheets, and a
//! plain table for the outlook report.

use clap::ValueEnum;
use demand_model::{DemandOutlook, ForecastPoint, RestockAdvice};
use std::io::Write;

/// Forecast output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// JSON array of `{fecha, prediccion}` records
    Json,
    /// CSV with a `fecha,prediccion` header
    Csv,
}

/// Error type for output operations.
#[derive(Debug, thiserror::Error)]
pub(crate) enum OutputError {
    /// JSON encoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// CSV encoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// Writing failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write forecast points in the requested format.
pub(crate) fn write_forecast<W: Write>(
    mut out: W,
    points: &[ForecastPoint],
    format: OutputFormat,
) -> Result<(), OutputError> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, points)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            for point in points {
                writer.serialize(point)?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

/// Write a human-readable outlook with optional restock advice.
pub(crate) fn write_outlook_text<W: Write>(
    mut out: W,
    outlook: &DemandOutlook,
    product_name: Option<&str>,
    advice: Option<&RestockAdvice>,
) -> Result<(), OutputError> {
    let title = product_name.map_or_else(
        || format!("Product {}", outlook.product_id),
        |name| format!("{} (#{})", name, outlook.product_id),
    );

    writeln!(out, "\nDEMAND OUTLOOK: {}", title)?;
    writeln!(out, "─────────────────────────────────────────────")?;
    writeln!(out, "  Horizon:          {:>10} days", outlook.days)?;
    writeln!(out, "  Average per day:  {:>10.2}", outlook.average_daily)?;
    writeln!(out, "  Total predicted:  {:>10.2}", outlook.total)?;

    if let Some(advice) = advice {
        writeln!(out, "\nRESTOCK")?;
        writeln!(out, "─────────────────────────────────────────────")?;
        writeln!(out, "  Current stock:    {:>10}", advice.current_stock)?;
        writeln!(out, "  Days to stockout: {:>10}", advice.days_until_stockout)?;
        writeln!(out, "  Recommended order:{:>10}", advice.recommended_order)?;
        writeln!(out, "  Priority:         {:>10}", advice.priority)?;
    }

    writeln!(out)?;
    Ok(())
}
