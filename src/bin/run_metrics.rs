//! CI step: runs the warehouse metrics query and exports step outputs.
//!
//! Any failure is reported as a GitHub `::error::` annotation and exits 1.

use std::io::{self, Write};
use std::process::ExitCode;

use tracing::error;

use dataops_scripts::config::{self, EnvSource, MetricsConfig};
use dataops_scripts::{ci, metrics, snowflake};

#[tokio::main]
async fn main() -> ExitCode {
    config::init_tracing_from_env();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let config = MetricsConfig::from_env(&EnvSource::metrics());

    let outcome = metrics::run(
        config,
        |c| snowflake::connect_tagged(c, metrics::QUERY_TAG),
        &mut out,
    )
    .await;

    match outcome {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Metrics step failed");
            let _ = ci::error(&mut out, &err.to_string());
            let _ = out.flush();
            err.exit_code()
        }
    }
}
