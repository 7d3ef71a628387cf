//! Store manager for the sales database.
//!
//! Resolves the configured SQLite location and opens the store, creating
//! the parent directory on first use.

use demand::DatabaseConfig;
use demand_data::SalesStore;
use std::path::PathBuf;
use tracing::debug;

/// Error opening the configured store.
#[derive(Debug, thiserror::Error)]
pub(crate) enum StoreManagerError {
    /// Configuration does not describe a usable SQLite database.
    #[error(transparent)]
    Config(#[from] demand::ConfigError),
    /// Database could not be opened.
    #[error("Could not open database: {0}")]
    Open(#[from] demand_data::DataError),
    /// Parent directory could not be created.
    #[error("Could not create database directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Get the configured database path.
pub(crate) fn store_path(config: &DatabaseConfig) -> Result<PathBuf, StoreManagerError> {
    Ok(config.sqlite_path()?)
}

/// Open the store, creating the directory if needed.
pub(crate) fn open_store(config: &DatabaseConfig) -> Result<SalesStore, StoreManagerError> {
    let path = store_path(config)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    debug!(path = %path.display(), "Opening sales store");
    Ok(SalesStore::open(&path)?)
}
