/*!
 * # Warehouse metrics step
 *
 * Runs the templated `INFORMATION_SCHEMA` metrics query for the CI workflow
 * and republishes the single result row as step outputs.
 *
 * Stages run strictly in order and every failure is terminal:
 *
 * 1. validate environment
 * 2. render the SQL template
 * 3. connect
 * 4. execute
 * 5. extract the five metrics
 * 6. report and export
 */

use std::io::Write;

use tracing::{info, warn};

use crate::ci::{self, StepOutputs};
use crate::config::{MetricsConfig, SnowflakeConfig};
use crate::errors::ScriptResult;
use crate::snowflake::{close_quietly, BoxedExecutor, SnowflakeError};
use crate::template::SqlTemplate;

mod extract;

pub use extract::{extract, MetricSpec, WarehouseMetrics, METRICS, REPORT_TITLE};

/// Session `QUERY_TAG` attached to the metrics query.
pub const QUERY_TAG: &str = "observability_metrics_workflow";

pub const MISSING_OUTPUT_WARNING: &str =
    "GITHUB_OUTPUT not set; step outputs will not be exported.";

/// Runs every stage and returns the extracted metrics.
///
/// `connect` is only called once the configuration is valid and the
/// template has been rendered.
pub async fn run<F>(
    config: ScriptResult<MetricsConfig>,
    connect: F,
    out: &mut dyn Write,
) -> ScriptResult<WarehouseMetrics>
where
    F: FnOnce(&SnowflakeConfig) -> Result<BoxedExecutor, SnowflakeError>,
{
    let config = config?;

    let template = SqlTemplate::load(config.template_path())?;
    let sql = template.render(config.database(), &config.schema_prefix);
    ci::group(
        out,
        &format!("Rendered SQL ({})", template.display_name()),
        sql.lines(),
    )?;
    info!(template = %template.path().display(), "Rendered metrics SQL");

    let executor = connect(&config.snowflake)?;
    let outcome = executor.execute(&sql).await;
    close_quietly(executor.as_ref()).await;
    let result = outcome?;
    info!(rows = result.rows.len(), "Metrics query finished");

    let metrics = extract(&result)?;
    metrics.write_report(out)?;
    export(&metrics, config.github_output.as_deref(), out)?;

    Ok(metrics)
}

/// Appends the step outputs, or warns when there is nowhere to put them.
pub fn export(
    metrics: &WarehouseMetrics,
    github_output: Option<&std::path::Path>,
    out: &mut dyn Write,
) -> ScriptResult<()> {
    match github_output {
        Some(path) => {
            StepOutputs::new(path).append(&metrics.outputs())?;
            info!(path = %path.display(), "Exported metrics step outputs");
        }
        None => {
            warn!("GITHUB_OUTPUT is not set");
            ci::warning(out, MISSING_OUTPUT_WARNING)?;
        }
    }
    Ok(())
}
