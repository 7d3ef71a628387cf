//! SQLite storage for the product catalogue and demand history.

use crate::error::{DataError, Result};
use chrono::{NaiveDate, Utc};
use polars::prelude::*;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Date format used for the `sale_date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Column names of the frame returned by [`SalesStore::load_sales`].
pub mod columns {
    /// Product identifier (i64)
    pub const PRODUCT_ID: &str = "product_id";
    /// Product display name (str)
    pub const PRODUCT_NAME: &str = "product_name";
    /// Sale date as `YYYY-MM-DD` (str)
    pub const SALE_DATE: &str = "sale_date";
    /// Units sold (i64, non-negative)
    pub const QUANTITY_SOLD: &str = "quantity_sold";
}

/// A single historical sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    /// Product identifier
    pub product_id: i64,
    /// Calendar date of the sale
    pub sale_date: NaiveDate,
    /// Units sold
    pub quantity_sold: u32,
}

impl SaleRecord {
    /// Create a new sale record.
    pub const fn new(product_id: i64, sale_date: NaiveDate, quantity_sold: u32) -> Self {
        Self {
            product_id,
            sale_date,
            quantity_sold,
        }
    }
}

/// Product to insert into the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    /// Unique stock keeping unit
    pub sku: String,
    /// Display name
    pub name: String,
    /// Optional category
    pub category: Option<String>,
    /// Unit price
    pub price: f64,
    /// Units currently in stock
    pub stock: i64,
}

/// SQLite store holding products and their demand history.
#[derive(Debug)]
pub struct SalesStore {
    conn: Connection,
}

impl SalesStore {
    /// Open (or create) a store.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create the tables if they do not exist yet.
    fn initialize_schema(&self) -> Result<()> {
        self.conn.pragma_update(None, "foreign_keys", true)?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sku TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                category TEXT,
                price REAL NOT NULL DEFAULT 0,
                stock INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS demand_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
                sale_date TEXT NOT NULL,
                quantity_sold INTEGER NOT NULL,
                recorded_at TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_history_product_date
             ON demand_history(product_id, sale_date)",
            [],
        )?;

        Ok(())
    }

    /// Insert a product and return its identifier.
    pub fn insert_product(&self, product: &NewProduct) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO products (sku, name, category, price, stock, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                product.sku,
                product.name,
                product.category,
                product.price,
                product.stock,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Identifiers of every product in the catalogue, ascending.
    pub fn product_ids(&self) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare("SELECT id FROM products ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    /// Display name of a product, if it exists.
    pub fn product_name(&self, product_id: i64) -> Result<Option<String>> {
        let name = self
            .conn
            .query_row(
                "SELECT name FROM products WHERE id = ?1",
                params![product_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }

    /// Units currently in stock for a product.
    pub fn product_stock(&self, product_id: i64) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT stock FROM products WHERE id = ?1",
                params![product_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(DataError::ProductNotFound(product_id))
    }

    /// Append one sale to the demand history.
    pub fn record_sale(&self, record: &SaleRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO demand_history (product_id, sale_date, quantity_sold, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.product_id,
                record.sale_date.format(DATE_FORMAT).to_string(),
                record.quantity_sold,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Append many sales in a single transaction.
    pub fn record_sales_batch(&self, records: &[SaleRecord]) -> Result<usize> {
        let recorded_at = Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO demand_history (product_id, sale_date, quantity_sold, recorded_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.product_id,
                    record.sale_date.format(DATE_FORMAT).to_string(),
                    record.quantity_sold,
                    recorded_at
                ])?;
            }
        }

        tx.commit()?;
        Ok(records.len())
    }

    /// Load the full demand history joined with product metadata.
    ///
    /// Rows are ordered by product then date. An empty history yields an
    /// empty frame, not an error.
    pub fn load_sales(&self) -> Result<DataFrame> {
        let mut stmt = self.conn.prepare(
            "SELECT h.product_id, p.name, h.sale_date, h.quantity_sold
             FROM demand_history h
             JOIN products p ON h.product_id = p.id
             ORDER BY h.product_id ASC, h.sale_date ASC",
        )?;

        let mut product_ids = Vec::new();
        let mut names = Vec::new();
        let mut dates = Vec::new();
        let mut quantities = Vec::new();

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        for row in rows {
            let (product_id, name, date, quantity) = row?;
            let date = NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|e| {
                DataError::Parse(format!(
                    "Invalid sale date '{}' for product {}: {}",
                    date, product_id, e
                ))
            })?;
            if quantity < 0 {
                return Err(DataError::Parse(format!(
                    "Negative quantity {} for product {} on {}",
                    quantity, product_id, date
                )));
            }

            product_ids.push(product_id);
            names.push(name);
            dates.push(date.format(DATE_FORMAT).to_string());
            quantities.push(quantity);
        }

        debug!(rows = product_ids.len(), "Loaded demand history");

        let df = DataFrame::new(vec![
            Series::new(columns::PRODUCT_ID.into(), product_ids).into(),
            Series::new(columns::PRODUCT_NAME.into(), names).into(),
            Series::new(columns::SALE_DATE.into(), dates).into(),
            Series::new(columns::QUANTITY_SOLD.into(), quantities).into(),
        ])?;

        Ok(df)
    }

    /// Delete the demand history and the catalogue.
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM demand_history", [])?;
        self.conn.execute("DELETE FROM products", [])?;
        Ok(())
    }

    /// Get store statistics.
    pub fn stats(&self) -> Result<StoreStats> {
        let products: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;

        let history_rows: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM demand_history", [], |row| row.get(0))?;

        let (first, last): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(sale_date), MAX(sale_date) FROM demand_history",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(StoreStats {
            products: products as usize,
            history_rows: history_rows as usize,
            first_date: first.and_then(|d| NaiveDate::parse_from_str(&d, DATE_FORMAT).ok()),
            last_date: last.and_then(|d| NaiveDate::parse_from_str(&d, DATE_FORMAT).ok()),
        })
    }

    /// Close the underlying connection, reporting any error.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| DataError::Database(e))
    }
}

/// Store statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of products in the catalogue
    pub products: usize,
    /// Number of demand history rows
    pub history_rows: usize,
    /// Earliest sale date
    pub first_date: Option<NaiveDate>,
    /// Latest sale date
    pub last_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(sku: &str, stock: i64) -> NewProduct {
        NewProduct {
            sku: sku.to_string(),
            name: format!("Product {}", sku),
            category: Some("Cables".to_string()),
            price: 15.0,
            stock,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_store_initialization() {
        let store = SalesStore::in_memory();
        assert!(store.is_ok());
    }

    #[test]
    fn test_schema_creation_is_idempotent() {
        let store = SalesStore::in_memory().unwrap();
        store.initialize_schema().unwrap();
        store.initialize_schema().unwrap();
        assert_eq!(store.stats().unwrap().products, 0);
    }

    #[test]
    fn test_empty_history_loads_empty_frame() {
        let store = SalesStore::in_memory().unwrap();
        let df = store.load_sales().unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 4);
    }

    #[test]
    fn test_load_sales_orders_by_product_then_date() {
        let store = SalesStore::in_memory().unwrap();
        let a = store.insert_product(&product("SKU-001", 10)).unwrap();
        let b = store.insert_product(&product("SKU-002", 20)).unwrap();

        store.record_sale(&SaleRecord::new(b, date(2024, 1, 2), 4)).unwrap();
        store.record_sale(&SaleRecord::new(a, date(2024, 1, 3), 7)).unwrap();
        store.record_sale(&SaleRecord::new(a, date(2024, 1, 1), 5)).unwrap();

        let df = store.load_sales().unwrap();
        assert_eq!(df.height(), 3);

        let ids = df.column(columns::PRODUCT_ID).unwrap().i64().unwrap();
        let dates = df.column(columns::SALE_DATE).unwrap().str().unwrap();
        let quantities = df.column(columns::QUANTITY_SOLD).unwrap().i64().unwrap();

        assert_eq!(ids.get(0), Some(a));
        assert_eq!(dates.get(0), Some("2024-01-01"));
        assert_eq!(quantities.get(0), Some(5));
        assert_eq!(ids.get(1), Some(a));
        assert_eq!(dates.get(1), Some("2024-01-03"));
        assert_eq!(ids.get(2), Some(b));
    }

    #[test]
    fn test_negative_quantity_is_rejected() {
        let store = SalesStore::in_memory().unwrap();
        let id = store.insert_product(&product("SKU-001", 10)).unwrap();
        store
            .conn
            .execute(
                "INSERT INTO demand_history (product_id, sale_date, quantity_sold, recorded_at)
                 VALUES (?1, '2024-01-01', -3, '2024-01-01T00:00:00Z')",
                params![id],
            )
            .unwrap();

        assert!(matches!(store.load_sales(), Err(DataError::Parse(_))));
    }

    #[test]
    fn test_product_lookup() {
        let store = SalesStore::in_memory().unwrap();
        let id = store.insert_product(&product("SKU-001", 42)).unwrap();

        assert_eq!(store.product_ids().unwrap(), vec![id]);
        assert_eq!(store.product_stock(id).unwrap(), 42);
        assert_eq!(
            store.product_name(id).unwrap().as_deref(),
            Some("Product SKU-001")
        );
        assert!(store.product_name(id + 1).unwrap().is_none());
        assert!(matches!(
            store.product_stock(id + 1),
            Err(DataError::ProductNotFound(_))
        ));
    }

    #[test]
    fn test_batch_insert_and_stats() {
        let store = SalesStore::in_memory().unwrap();
        let id = store.insert_product(&product("SKU-001", 10)).unwrap();

        let records: Vec<_> = (1..=5)
            .map(|d| SaleRecord::new(id, date(2024, 3, d), d))
            .collect();
        assert_eq!(store.record_sales_batch(&records).unwrap(), 5);

        let stats = store.stats().unwrap();
        assert_eq!(stats.products, 1);
        assert_eq!(stats.history_rows, 5);
        assert_eq!(stats.first_date, Some(date(2024, 3, 1)));
        assert_eq!(stats.last_date, Some(date(2024, 3, 5)));
    }

    #[test]
    fn test_clear_all() {
        let store = SalesStore::in_memory().unwrap();
        let id = store.insert_product(&product("SKU-001", 10)).unwrap();
        store.record_sale(&SaleRecord::new(id, date(2024, 1, 1), 1)).unwrap();

        store.clear_all().unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.history_rows, 0);
        assert_eq!(stats.products, 0);
    }

    #[test]
    fn test_close() {
        let store = SalesStore::in_memory().unwrap();
        assert!(store.close().is_ok());
    }
}
