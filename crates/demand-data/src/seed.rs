//! Synthetic demand history.
//!
//! Fills a [`SalesStore`] with a reproducible daily history for a small
//! catalogue of products. Daily quantities are drawn uniformly from
//! `[5, 15)` and scaled by a coarse seasonal profile: tripled in March and
//! April, cut to 60% in July and August.

use crate::error::{DataError, Result};
use crate::store::{NewProduct, SaleRecord, SalesStore};
use chrono::{Datelike, Months, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

/// Product template used when seeding the catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedProduct {
    /// Display name
    pub name: &'static str,
    /// Category
    pub category: &'static str,
    /// Unit price
    pub price: f64,
    /// Initial stock
    pub stock: i64,
}

/// Default seeding catalogue.
pub const DEFAULT_CATALOGUE: &[SeedProduct] = &[
    SeedProduct { name: "HDMI Cable 1.5m", category: "Cables", price: 15.0, stock: 100 },
    SeedProduct { name: "HP 664 Ink", category: "Ink", price: 45.0, stock: 50 },
    SeedProduct { name: "Halion X15 Gaming Headset", category: "Headsets", price: 120.0, stock: 30 },
    SeedProduct { name: "Logitech M170 Wireless Mouse", category: "Mice", price: 65.0, stock: 40 },
    SeedProduct { name: "Logitech MK120 Keyboard", category: "Keyboards", price: 85.0, stock: 35 },
    SeedProduct { name: "Micronics S502 Speaker", category: "Speakers", price: 95.0, stock: 25 },
    SeedProduct { name: "Iceberg 6 Cooling Fan", category: "Accessories", price: 140.0, stock: 20 },
    SeedProduct { name: "Cat Ear AKZ 023 Headset", category: "Headsets", price: 90.0, stock: 15 },
    SeedProduct { name: "Cybertel M300 Gaming Mouse", category: "Mice", price: 70.0, stock: 25 },
    SeedProduct { name: "Enkore Fortis Speaker", category: "Speakers", price: 110.0, stock: 20 },
    SeedProduct { name: "Enkore Office Wired Keyboard", category: "Keyboards", price: 75.0, stock: 30 },
];

/// Configuration for synthetic history generation.
#[derive(Debug, Clone)]
pub struct SeedConfig {
    /// Months of history ending on the reference date (default: 6)
    pub months: u32,
    /// RNG seed (default: 42)
    pub seed: u64,
    /// Catalogue to insert
    pub catalogue: Vec<SeedProduct>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            months: 6,
            seed: 42,
            catalogue: DEFAULT_CATALOGUE.to_vec(),
        }
    }
}

/// Outcome of a seeding run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    /// Products inserted
    pub products: usize,
    /// History rows inserted
    pub records: usize,
    /// First seeded date
    pub start: NaiveDate,
    /// Last seeded date
    pub end: NaiveDate,
}

/// Generates and stores a synthetic demand history.
#[derive(Debug)]
pub struct HistorySeeder {
    config: SeedConfig,
}

impl Default for HistorySeeder {
    fn default() -> Self {
        Self::new(SeedConfig::default())
    }
}

impl HistorySeeder {
    /// Create a seeder.
    pub const fn new(config: SeedConfig) -> Self {
        Self { config }
    }

    /// Replace the store contents with a fresh synthetic history ending on `today`.
    pub fn seed(&self, store: &SalesStore, today: NaiveDate) -> Result<SeedSummary> {
        if self.config.months == 0 {
            return Err(DataError::InvalidSeed(
                "months must be at least 1".to_string(),
            ));
        }
        if self.config.catalogue.is_empty() {
            return Err(DataError::InvalidSeed("catalogue is empty".to_string()));
        }

        let start = today
            .checked_sub_months(Months::new(self.config.months))
            .ok_or_else(|| {
                DataError::InvalidSeed(format!(
                    "cannot go back {} months from {}",
                    self.config.months, today
                ))
            })?;

        store.clear_all()?;

        let mut product_ids = Vec::with_capacity(self.config.catalogue.len());
        for (i, template) in self.config.catalogue.iter().enumerate() {
            let id = store.insert_product(&NewProduct {
                sku: format!("SKU-{:03}", i + 1),
                name: template.name.to_string(),
                category: Some(template.category.to_string()),
                price: template.price,
                stock: template.stock,
            })?;
            product_ids.push(id);
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut records = Vec::new();
        for day in start.iter_days().take_while(|d| *d <= today) {
            for &product_id in &product_ids {
                let quantity = seasonal_quantity(day, &mut rng);
                if quantity > 0 {
                    records.push(SaleRecord::new(product_id, day, quantity));
                }
            }
        }

        let inserted = store.record_sales_batch(&records)?;
        info!(
            products = product_ids.len(),
            records = inserted,
            %start,
            end = %today,
            "Seeded demand history"
        );

        Ok(SeedSummary {
            products: product_ids.len(),
            records: inserted,
            start,
            end: today,
        })
    }
}

/// Draw one day's quantity for `date`.
pub fn seasonal_quantity<R: Rng + ?Sized>(date: NaiveDate, rng: &mut R) -> u32 {
    let mut base: f64 = rng.gen_range(5.0..15.0);
    match date.month() {
        3 | 4 => base *= 3.0,
        7 | 8 => base *= 0.6,
        _ => {}
    }
    base.round() as u32
}
