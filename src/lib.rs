//! DataOps scripts
//!
//! Support programs for the dbt/Snowflake CI workflow: seed fixture
//! generation, per-issue schema cleanup and warehouse metrics reporting.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod ci;
pub mod config;
pub mod drop_schema;
pub mod errors;
pub mod metrics;
pub mod seeds;
pub mod snowflake;
pub mod template;

pub use errors::{ScriptError, ScriptResult};
