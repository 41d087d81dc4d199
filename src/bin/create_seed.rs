//! Writes the synthetic dbt seed CSVs.
//!
//! Run with: cargo run --bin create-seed
//!
//! Environment:
//! - DBT_SEED_ROWS (default 9999)
//! - SEED_RANDOM_SEED (optional, reproducible output)
//! - SEED_OUTPUT_DIR (default scripts/dbt/seeds)

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::error;

use dataops_scripts::config::{self, EnvSource, SeedConfig};
use dataops_scripts::seeds::SeedGenerator;

fn main() -> ExitCode {
    config::init_tracing_from_env();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run(&mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = ?err, "Seed generation failed");
            let _ = writeln!(out, "Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(out: &mut dyn Write) -> Result<()> {
    let config = SeedConfig::from_env(&EnvSource::seeds())?;

    writeln!(out, "[create_seed] Writing seeds to: {}", config.output_dir.display())?;
    let seed = config
        .random_seed
        .map(|s| s.to_string())
        .unwrap_or_else(|| "None".to_string());
    writeln!(out, "[create_seed] NUM_ROWS={}  RANDOM_SEED={}", config.rows, seed)?;

    let output_dir = config.output_dir.clone();
    let mut generator = SeedGenerator::new(config, Local::now().date_naive());
    generator
        .generate_all(out)
        .with_context(|| format!("failed to write seeds to {}", output_dir.display()))?;
    Ok(())
}
