#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/demand/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod seed;
pub mod store;

pub use error::{DataError, Result};
pub use seed::{HistorySeeder, SeedConfig, SeedProduct, SeedSummary};
pub use store::{DATE_FORMAT, NewProduct, SaleRecord, SalesStore, StoreStats, columns};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
