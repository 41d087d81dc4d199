//! Synthetic seed fixtures for the dbt project.
//!
//! Writes four CSV files:
//! - products.csv (`rows` products)
//! - warehouses.csv (always 20 warehouses)
//! - inventory_movements.csv (`rows` stock movements)
//! - customer_orders.csv (`rows` orders)
//!
//! Product and warehouse references in movements and orders are drawn from
//! the valid id ranges; nothing checks that the referenced row exists.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use csv::{Terminator, WriterBuilder};
use fake::faker::address::en::{CityName, CountryCode};
use fake::faker::lorem::en::Word;
use fake::faker::name::en::Name;
use fake::Fake;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SeedConfig;
use crate::errors::ScriptResult;

pub mod rows;

use rows::*;

const MAX_DAYS_BACK: i64 = 365;

/// One written fixture file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedFile {
    pub name: &'static str,
    pub path: PathBuf,
    pub rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub files: Vec<SeedFile>,
}

impl SeedSummary {
    pub fn file(&self, name: &str) -> Option<&SeedFile> {
        self.files.iter().find(|f| f.name == name)
    }
}

/// Generates the fixtures from a single random source.
///
/// Faker values and plain random draws share one RNG, so a fixed seed and a
/// fixed `today` reproduce identical files.
pub struct SeedGenerator {
    config: SeedConfig,
    today: NaiveDate,
    rng: StdRng,
}

impl SeedGenerator {
    pub fn new(config: SeedConfig, today: NaiveDate) -> Self {
        let rng = match config.random_seed {
            // Two's-complement reinterpretation keeps every signed seed distinct.
            Some(seed) => StdRng::seed_from_u64(u64::from_ne_bytes(seed.to_ne_bytes())),
            None => StdRng::from_entropy(),
        };
        Self { config, today, rng }
    }

    pub fn config(&self) -> &SeedConfig {
        &self.config
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Writes all four fixtures in order, reporting progress on `out`.
    pub fn generate_all(&mut self, out: &mut dyn Write) -> ScriptResult<SeedSummary> {
        fs::create_dir_all(&self.config.output_dir)?;

        let mut summary = SeedSummary::default();
        let steps: [(&'static str, fn(&mut Self) -> ScriptResult<SeedFile>); 4] = [
            ("products.csv", Self::write_products),
            ("warehouses.csv", Self::write_warehouses),
            ("inventory_movements.csv", Self::write_inventory_movements),
            ("customer_orders.csv", Self::write_customer_orders),
        ];

        for (name, step) in steps {
            writeln!(out, "Generating {}...", name)?;
            let file = step(self)?;
            info!(file = name, rows = file.rows, path = %file.path.display(), "Seed file written");
            writeln!(out, "{} generated successfully.", name)?;
            summary.files.push(file);
        }

        Ok(summary)
    }

    pub fn write_products(&mut self) -> ScriptResult<SeedFile> {
        let rows: Vec<ProductRow> = (1..=self.config.rows)
            .map(|n| self.product(n))
            .collect();
        self.write_csv("products.csv", &PRODUCT_HEADER, &rows)
    }

    pub fn write_warehouses(&mut self) -> ScriptResult<SeedFile> {
        let rows: Vec<WarehouseRow> = (1..=WAREHOUSE_COUNT)
            .map(|n| self.warehouse(n))
            .collect();
        self.write_csv("warehouses.csv", &WAREHOUSE_HEADER, &rows)
    }

    pub fn write_inventory_movements(&mut self) -> ScriptResult<SeedFile> {
        let rows: Vec<MovementRow> = (1..=self.config.rows)
            .map(|n| self.movement(n))
            .collect();
        self.write_csv("inventory_movements.csv", &MOVEMENT_HEADER, &rows)
    }

    pub fn write_customer_orders(&mut self) -> ScriptResult<SeedFile> {
        let rows: Vec<OrderRow> = (1..=self.config.rows)
            .map(|n| self.order(n))
            .collect();
        self.write_csv("customer_orders.csv", &ORDER_HEADER, &rows)
    }

    fn product(&mut self, n: usize) -> ProductRow {
        let word: String = Word().fake_with_rng(&mut self.rng);
        let tier = self.pick(&PRODUCT_TIERS);
        let category = self.pick(&CATEGORIES);
        let unit_cost = round2(self.rng.gen_range(10.0..=500.0));
        let weight_kg = round2(self.rng.gen_range(0.1..=20.0));
        let dimensions_cm = format!(
            "{}x{}x{}",
            self.rng.gen_range(5..=100),
            self.rng.gen_range(5..=100),
            self.rng.gen_range(5..=100)
        );

        ProductRow {
            product_id: product_id(n),
            product_name: format!("{} {}", title_case(&word), tier),
            category,
            unit_cost,
            weight_kg,
            dimensions_cm,
        }
    }

    fn warehouse(&mut self, n: u32) -> WarehouseRow {
        let name_city: String = CityName().fake_with_rng(&mut self.rng);
        let location_city: String = CityName().fake_with_rng(&mut self.rng);
        let country: String = CountryCode().fake_with_rng(&mut self.rng);
        let capacity_units = self.rng.gen_range(5_000..=100_000);
        let manager_name: String = Name().fake_with_rng(&mut self.rng);

        WarehouseRow {
            warehouse_id: warehouse_id(n),
            warehouse_name: format!("{} Warehouse", name_city),
            location: format!("{}, {}", location_city, country),
            capacity_units,
            manager_name,
        }
    }

    fn movement(&mut self, n: usize) -> MovementRow {
        MovementRow {
            movement_id: movement_id(n),
            product_id: self.product_ref(),
            warehouse_id: self.warehouse_ref(),
            movement_date: self.recent_date(),
            quantity: self.rng.gen_range(-500..=1000),
            movement_type: self.pick(&MOVEMENT_TYPES),
        }
    }

    fn order(&mut self, n: usize) -> OrderRow {
        OrderRow {
            order_id: order_id(n),
            product_id: self.product_ref(),
            warehouse_id: self.warehouse_ref(),
            order_date: self.recent_date(),
            quantity: self.rng.gen_range(1..=50),
            sales_channel: self.pick(&SALES_CHANNELS),
        }
    }

    // Only called while emitting rows, so `rows >= 1` holds.
    fn product_ref(&mut self) -> String {
        product_id(self.rng.gen_range(1..=self.config.rows))
    }

    fn warehouse_ref(&mut self) -> String {
        warehouse_id(self.rng.gen_range(1..=WAREHOUSE_COUNT))
    }

    fn recent_date(&mut self) -> NaiveDate {
        self.today - Duration::days(self.rng.gen_range(0..=MAX_DAYS_BACK))
    }

    fn pick(&mut self, choices: &[&'static str]) -> &'static str {
        choices
            .choose(&mut self.rng)
            .copied()
            .unwrap_or_default()
    }

    fn write_csv<T: Serialize>(
        &self,
        name: &'static str,
        header: &[&str],
        rows: &[T],
    ) -> ScriptResult<SeedFile> {
        let path = self.config.output_dir.join(name);
        debug!(path = %path.display(), rows = rows.len(), "Writing seed file");

        // The header is written by hand so it is present even with zero rows.
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::CRLF)
            .from_path(&path)?;
        writer.write_record(header)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        Ok(SeedFile {
            name,
            path,
            rows: rows.len(),
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
