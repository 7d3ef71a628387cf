//! Glue between the configuration, the sales store and the model crates.
//!
//! Opens the configured store, runs the training pipeline with progress
//! reporting, and renders forecasts for the terminal.

pub(crate) mod output;
pub(crate) mod store_manager;
pub(crate) mod training;
