//! End-to-end tests for the seed CSV generator.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use dataops_scripts::config::{EnvSource, SeedConfig};
use dataops_scripts::seeds::SeedGenerator;
use proptest::prelude::*;

const FILES: [&str; 4] = [
    "products.csv",
    "warehouses.csv",
    "inventory_movements.csv",
    "customer_orders.csv",
];

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

fn generate(dir: &Path, rows: usize, seed: i64) {
    let config = SeedConfig {
        rows,
        random_seed: Some(seed),
        output_dir: dir.to_path_buf(),
    };
    SeedGenerator::new(config, today())
        .generate_all(&mut Vec::new())
        .unwrap();
}

fn read_column(path: &Path, column: &str) -> Vec<String> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let index = reader
        .headers()
        .unwrap()
        .iter()
        .position(|h| h == column)
        .unwrap();
    reader
        .records()
        .map(|record| record.unwrap()[index].to_string())
        .collect()
}

#[test]
fn every_file_has_header_plus_rows() {
    let dir = tempfile::tempdir().unwrap();
    generate(dir.path(), 25, 42);

    for name in ["products.csv", "inventory_movements.csv", "customer_orders.csv"] {
        let text = std::fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(text.lines().count(), 26, "{name}");
    }
    let warehouses = std::fs::read_to_string(dir.path().join("warehouses.csv")).unwrap();
    assert_eq!(warehouses.lines().count(), 21);
}

#[test]
fn headers_are_fixed() {
    let dir = tempfile::tempdir().unwrap();
    generate(dir.path(), 1, 1);

    let first_line = |name: &str| {
        std::fs::read_to_string(dir.path().join(name))
            .unwrap()
            .lines()
            .next()
            .unwrap()
            .to_string()
    };
    assert_eq!(
        first_line("products.csv"),
        "product_id,product_name,category,unit_cost,weight_kg,dimensions_cm"
    );
    assert_eq!(
        first_line("warehouses.csv"),
        "warehouse_id,warehouse_name,location,capacity_units,manager_name"
    );
    assert_eq!(
        first_line("inventory_movements.csv"),
        "movement_id,product_id,warehouse_id,movement_date,quantity,movement_type"
    );
    assert_eq!(
        first_line("customer_orders.csv"),
        "order_id,product_id,warehouse_id,order_date,quantity,sales_channel"
    );
}

#[test]
fn fixed_seed_and_date_reproduce_identical_files() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    generate(first.path(), 40, 2024);
    generate(second.path(), 40, 2024);

    for name in FILES {
        let a = std::fs::read(first.path().join(name)).unwrap();
        let b = std::fs::read(second.path().join(name)).unwrap();
        assert_eq!(a, b, "{name} differs between runs");
    }
}

#[test]
fn negative_seed_from_environment_is_reproducible() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let positive = tempfile::tempdir().unwrap();

    for dir in [&first, &second] {
        let source = EnvSource::from_pairs([
            ("DBT_SEED_ROWS", "15"),
            ("SEED_RANDOM_SEED", "-7"),
            ("SEED_OUTPUT_DIR", dir.path().to_str().unwrap()),
        ]);
        let config = SeedConfig::from_env(&source).unwrap();
        assert_eq!(config.random_seed, Some(-7));
        SeedGenerator::new(config, today())
            .generate_all(&mut Vec::new())
            .unwrap();
    }
    generate(positive.path(), 15, 7);

    for name in FILES {
        let a = std::fs::read(first.path().join(name)).unwrap();
        let b = std::fs::read(second.path().join(name)).unwrap();
        assert_eq!(a, b, "{name} differs between runs");
    }
    let products = |dir: &tempfile::TempDir| std::fs::read(dir.path().join("products.csv")).unwrap();
    assert_ne!(products(&first), products(&positive));
}

#[test]
fn warehouse_ids_are_sequential() {
    let dir = tempfile::tempdir().unwrap();
    generate(dir.path(), 3, 9);

    let ids = read_column(&dir.path().join("warehouses.csv"), "warehouse_id");
    let expected: Vec<String> = (1..=20).map(|n| format!("WH{:03}", n)).collect();
    assert_eq!(ids, expected);
}

#[test]
fn dates_are_iso_formatted_within_last_year() {
    let dir = tempfile::tempdir().unwrap();
    generate(dir.path(), 200, 5);

    let earliest = today() - chrono::Duration::days(365);
    for date in read_column(&dir.path().join("customer_orders.csv"), "order_date") {
        let parsed = NaiveDate::parse_from_str(&date, "%Y-%m-%d").unwrap();
        assert!(parsed >= earliest && parsed <= today(), "{date}");
    }
}

#[test]
fn output_dir_comes_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("nested/seeds");
    let source = EnvSource::from_pairs([
        ("DBT_SEED_ROWS", "3"),
        ("SEED_RANDOM_SEED", "77"),
        ("SEED_OUTPUT_DIR", target.to_str().unwrap()),
    ]);
    let config = SeedConfig::from_env(&source).unwrap();
    assert_eq!(config.rows, 3);
    assert_eq!(config.random_seed, Some(77));

    let summary = SeedGenerator::new(config, today())
        .generate_all(&mut Vec::new())
        .unwrap();
    assert_eq!(summary.files.len(), 4);
    for name in FILES {
        assert!(target.join(name).is_file(), "{name} missing");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn ids_are_unique_padded_and_references_stay_in_range(rows in 1usize..60, seed in any::<i64>()) {
        let dir = tempfile::tempdir().unwrap();
        generate(dir.path(), rows, seed);

        let products = read_column(&dir.path().join("products.csv"), "product_id");
        let unique: HashSet<_> = products.iter().collect();
        prop_assert_eq!(unique.len(), rows);
        for (n, id) in products.iter().enumerate() {
            prop_assert_eq!(id, &format!("PRD{:05}", n + 1));
        }

        let orders = dir.path().join("customer_orders.csv");
        for id in read_column(&orders, "order_id") {
            prop_assert!(id.len() == 10 && id.starts_with("ORD"), "{}", id);
        }
        for product in read_column(&orders, "product_id") {
            prop_assert!(unique.contains(&product), "dangling product {}", product);
        }
        for warehouse in read_column(&orders, "warehouse_id") {
            let n: u32 = warehouse[2..].parse().unwrap();
            prop_assert!((1..=20).contains(&n));
        }
    }
}
