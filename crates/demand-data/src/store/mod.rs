//! Relational storage for products and demand history.

pub mod sqlite;

pub use sqlite::{DATE_FORMAT, NewProduct, SaleRecord, SalesStore, StoreStats, columns};
