//! Drops the per-issue schema that the dbt naming macro creates.
//!
//! dbt appends `_issue_<github_issue_id>` to a custom schema, so the object
//! name `bronze` and issue `42` resolve to `bronze_issue_42`.

use std::io::Write;

use clap::Parser;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use crate::config::SnowflakeConfig;
use crate::errors::{ScriptError, ScriptResult};
use crate::snowflake::{close_quietly, BoxedExecutor, SnowflakeError, SqlExecutor};

pub const USAGE: &str = "Usage: drop-schema <object_name> <github_issue_id>";

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_$]+$").expect("identifier pattern is valid"));

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "drop-schema",
    about = "Drop the dbt schema created for a GitHub issue",
    version
)]
pub struct DropSchemaArgs {
    /// Custom schema name the dbt macro extends (e.g. bronze)
    pub object_name: String,
    /// GitHub issue number appended to the schema name
    pub github_issue_id: String,
}

impl DropSchemaArgs {
    /// Parses `argv` (program name first).
    ///
    /// Anything but exactly two positionals is a usage error; `--help` and
    /// `--version` are handed back to clap.
    pub fn parse_from_args<I, T>(args: I) -> Result<Self, ParseOutcome>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(args) => Ok(args),
            Err(err) => match err.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    Err(ParseOutcome::Informational(err))
                }
                _ => Err(ParseOutcome::Usage(ScriptError::Usage(USAGE.to_string()))),
            },
        }
    }

    pub fn schema_name(&self) -> ScriptResult<String> {
        check_identifier("object name", &self.object_name)?;
        check_identifier("issue id", &self.github_issue_id)?;
        Ok(schema_name(&self.object_name, &self.github_issue_id))
    }
}

#[derive(Debug)]
pub enum ParseOutcome {
    /// Help or version text; print it and exit successfully.
    Informational(clap::Error),
    Usage(ScriptError),
}

fn check_identifier(field: &'static str, value: &str) -> ScriptResult<()> {
    if IDENTIFIER.is_match(value) {
        Ok(())
    } else {
        Err(ScriptError::InvalidIdentifier {
            field,
            value: value.to_string(),
        })
    }
}

pub fn schema_name(object_name: &str, github_issue_id: &str) -> String {
    format!("{}_issue_{}", object_name, github_issue_id)
}

pub fn drop_statement(database: &str, schema: &str) -> String {
    format!("DROP SCHEMA IF EXISTS {}.{} CASCADE;", database, schema)
}

/// Runs the single drop statement and reports the outcome on `out`.
///
/// The executor is closed whether or not the statement succeeded.
pub async fn drop_schema(
    executor: &dyn SqlExecutor,
    database: &str,
    schema: &str,
    out: &mut dyn Write,
) -> ScriptResult<()> {
    writeln!(
        out,
        "🔄 Connected to Snowflake to drop schema and objects: {}",
        schema
    )?;

    let statement = drop_statement(database, schema);
    let outcome = executor.execute(&statement).await;
    close_quietly(executor).await;

    match outcome {
        Ok(_) => {
            writeln!(out, "✅ Successfully executed: {}", statement)?;
            info!(%schema, "Schema dropped");
            writeln!(out, "🧹 Dropped schema and objects for: {}", schema)?;
            Ok(())
        }
        Err(err) => {
            writeln!(out, "🚨 Error executing SQL: {}", statement)?;
            writeln!(out, "Error: {}", err)?;
            Err(err.into())
        }
    }
}

/// Full program flow after argument parsing: configuration is validated
/// before `connect` is ever called.
///
/// Remote failures (connect or drop) are reported on `out` here; the caller
/// only reports configuration and usage errors.
pub async fn run<F>(
    args: &DropSchemaArgs,
    config: ScriptResult<SnowflakeConfig>,
    connect: F,
    out: &mut dyn Write,
) -> ScriptResult<()>
where
    F: FnOnce(&SnowflakeConfig) -> Result<BoxedExecutor, SnowflakeError>,
{
    let schema = args.schema_name()?;
    let config = config?;
    let executor = match connect(&config) {
        Ok(executor) => executor,
        Err(err) => {
            writeln!(out, "🚨 Failed to connect to Snowflake: {}", err)?;
            return Err(err.into());
        }
    };
    drop_schema(executor.as_ref(), &config.database, &schema, out).await
}
