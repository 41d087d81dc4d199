//! Drops the dbt schema created for a GitHub issue.
//!
//! Usage: drop-schema <object_name> <github_issue_id>

use std::io::{self, Write};
use std::process::ExitCode;

use tracing::error;

use dataops_scripts::config::{self, EnvSource, SnowflakeConfig};
use dataops_scripts::drop_schema::{self, DropSchemaArgs, ParseOutcome, USAGE};
use dataops_scripts::errors::ErrorCategory;
use dataops_scripts::snowflake;

#[tokio::main]
async fn main() -> ExitCode {
    config::init_tracing_from_env();

    let args = match DropSchemaArgs::parse_from_args(std::env::args_os()) {
        Ok(args) => args,
        Err(ParseOutcome::Informational(err)) => err.exit(),
        Err(ParseOutcome::Usage(_)) => {
            println!("{}", USAGE);
            return ExitCode::FAILURE;
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let config = SnowflakeConfig::from_env(&EnvSource::snowflake());

    match drop_schema::run(&args, config, snowflake::connect, &mut out).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Schema cleanup failed");
            if err.category() != ErrorCategory::Remote {
                let _ = writeln!(out, "Error: {}", err);
            }
            err.exit_code()
        }
    }
}
