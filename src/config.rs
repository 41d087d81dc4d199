use config::{Config, Environment};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::env as std_env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::{ScriptError, ScriptResult};

/// Default values for configuration
pub const DEFAULT_AUTHENTICATOR: &str = "PROGRAMMATIC_ACCESS_TOKEN";
pub const DEFAULT_SEED_ROWS: usize = 9999;
pub const DEFAULT_SEED_DIR: &str = "scripts/dbt/seeds";
const DEFAULT_WORKSPACE: &str = ".";
const DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 600;
const DEFAULT_LOG_LEVEL: &str = "info";

const SNOWFLAKE_KEYS: &[&str] = &[
    "SNOWFLAKE_ACCOUNT",
    "SNOWFLAKE_USER",
    "SNOWFLAKE_TOKEN",
    "SNOWFLAKE_AUTHENTICATOR",
    "SNOWFLAKE_ROLE",
    "SNOWFLAKE_WAREHOUSE",
    "SNOWFLAKE_DATABASE",
    "SNOWFLAKE_HOST",
    "SNOWFLAKE_STATEMENT_TIMEOUT_SECS",
];

const METRICS_KEYS: &[&str] = &[
    "METRICS_DATABASE",
    "METRICS_SCHEMA_PREFIX",
    "METRICS_SQL_PATH",
    "GITHUB_OUTPUT",
    "GITHUB_WORKSPACE",
];

const SEED_KEYS: &[&str] = &["DBT_SEED_ROWS", "SEED_RANDOM_SEED", "SEED_OUTPUT_DIR"];

/// Snapshot of the environment variables a program cares about.
///
/// Programs never read `std::env` directly past start-up; everything flows
/// through one of these so tests can hand in an explicit map.
#[derive(Clone, Debug, Default)]
pub struct EnvSource {
    vars: config::Map<String, String>,
}

impl EnvSource {
    /// Captures the given keys from the process environment.
    pub fn from_process(keys: &[&str]) -> Self {
        let vars = keys
            .iter()
            .filter_map(|key| std_env::var(key).ok().map(|value| (key.to_string(), value)))
            .collect();
        Self { vars }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self { vars }
    }

    pub fn snowflake() -> Self {
        Self::from_process(SNOWFLAKE_KEYS)
    }

    pub fn metrics() -> Self {
        let keys: Vec<&str> = SNOWFLAKE_KEYS.iter().chain(METRICS_KEYS).copied().collect();
        Self::from_process(&keys)
    }

    pub fn seeds() -> Self {
        Self::from_process(SEED_KEYS)
    }

    /// Deserializes the snapshot through the `config` crate.
    ///
    /// Keys are lower-cased by the environment source, so `SNOWFLAKE_USER`
    /// lands in a field named `snowflake_user`.
    fn load<T: DeserializeOwned>(&self) -> ScriptResult<T> {
        let settings = Config::builder()
            .add_source(Environment::default().source(Some(self.vars.clone())))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

/// Collects required values and reports every absent key at once.
#[derive(Default)]
struct RequiredKeys {
    missing: Vec<String>,
}

impl RequiredKeys {
    fn take(&mut self, key: &str, value: Option<String>) -> String {
        match non_blank(value) {
            Some(value) => value,
            None => {
                self.missing.push(key.to_string());
                String::new()
            }
        }
    }

    fn finish(self) -> ScriptResult<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ScriptError::MissingEnv(self.missing))
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Default, Deserialize)]
struct RawSnowflakeEnv {
    snowflake_account: Option<String>,
    snowflake_user: Option<String>,
    snowflake_token: Option<String>,
    snowflake_authenticator: Option<String>,
    snowflake_role: Option<String>,
    snowflake_warehouse: Option<String>,
    snowflake_database: Option<String>,
    snowflake_host: Option<String>,
    snowflake_statement_timeout_secs: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMetricsEnv {
    metrics_database: Option<String>,
    metrics_schema_prefix: Option<String>,
    metrics_sql_path: Option<String>,
    github_output: Option<String>,
    github_workspace: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSeedEnv {
    dbt_seed_rows: Option<String>,
    seed_random_seed: Option<String>,
    seed_output_dir: Option<String>,
}

/// Connection settings for the Snowflake SQL API.
#[derive(Clone)]
pub struct SnowflakeConfig {
    pub account: String,
    pub user: String,
    pub token: String,
    /// Sent as the token type header; `PROGRAMMATIC_ACCESS_TOKEN` unless overridden.
    pub authenticator: String,
    pub role: String,
    pub warehouse: String,
    pub database: String,
    /// Overrides `<account>.snowflakecomputing.com`.
    pub host: Option<String>,
    pub statement_timeout: Duration,
}

impl fmt::Debug for SnowflakeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeConfig")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .field("authenticator", &self.authenticator)
            .field("role", &self.role)
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("host", &self.host)
            .field("statement_timeout", &self.statement_timeout)
            .finish()
    }
}

impl SnowflakeConfig {
    /// Settings for `drop-schema`. All six credential values are required.
    pub fn from_env(source: &EnvSource) -> ScriptResult<Self> {
        let raw: RawSnowflakeEnv = source.load()?;
        let mut required = RequiredKeys::default();
        let account = required.take("SNOWFLAKE_ACCOUNT", raw.snowflake_account);
        let user = required.take("SNOWFLAKE_USER", raw.snowflake_user);
        let token = required.take("SNOWFLAKE_TOKEN", raw.snowflake_token);
        let role = required.take("SNOWFLAKE_ROLE", raw.snowflake_role);
        let warehouse = required.take("SNOWFLAKE_WAREHOUSE", raw.snowflake_warehouse);
        let database = required.take("SNOWFLAKE_DATABASE", raw.snowflake_database);
        required.finish()?;

        Ok(Self {
            account,
            user,
            token,
            authenticator: authenticator_or_default(raw.snowflake_authenticator),
            role,
            warehouse,
            database,
            host: non_blank(raw.snowflake_host),
            statement_timeout: statement_timeout(raw.snowflake_statement_timeout_secs)?,
        })
    }
}

fn authenticator_or_default(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| DEFAULT_AUTHENTICATOR.to_string())
}

fn statement_timeout(value: Option<String>) -> ScriptResult<Duration> {
    match non_blank(value) {
        None => Ok(Duration::from_secs(DEFAULT_STATEMENT_TIMEOUT_SECS)),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(0) => Err(ScriptError::invalid_env(
                "SNOWFLAKE_STATEMENT_TIMEOUT_SECS",
                "must be greater than zero",
            )),
            Ok(secs) => Ok(Duration::from_secs(secs)),
            Err(e) => Err(ScriptError::invalid_env(
                "SNOWFLAKE_STATEMENT_TIMEOUT_SECS",
                e.to_string(),
            )),
        },
    }
}

/// Settings for `run-metrics`.
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    pub snowflake: SnowflakeConfig,
    pub schema_prefix: String,
    pub sql_path: PathBuf,
    pub github_output: Option<PathBuf>,
    pub workspace: PathBuf,
}

impl MetricsConfig {
    pub fn from_env(source: &EnvSource) -> ScriptResult<Self> {
        let sf: RawSnowflakeEnv = source.load()?;
        let RawMetricsEnv {
            metrics_database,
            metrics_schema_prefix,
            metrics_sql_path,
            github_output,
            github_workspace,
        } = source.load()?;

        let mut required = RequiredKeys::default();
        let account = required.take("SNOWFLAKE_ACCOUNT", sf.snowflake_account);
        let user = required.take("SNOWFLAKE_USER", sf.snowflake_user);
        let role = required.take("SNOWFLAKE_ROLE", sf.snowflake_role);
        let warehouse = required.take("SNOWFLAKE_WAREHOUSE", sf.snowflake_warehouse);
        let database = required.take("METRICS_DATABASE", metrics_database);
        let schema_prefix = required.take("METRICS_SCHEMA_PREFIX", metrics_schema_prefix);
        let sql_path = required.take("METRICS_SQL_PATH", metrics_sql_path);
        let token = required.take("SNOWFLAKE_TOKEN", sf.snowflake_token);
        required.finish()?;

        Ok(Self {
            snowflake: SnowflakeConfig {
                account,
                user,
                token,
                authenticator: authenticator_or_default(sf.snowflake_authenticator),
                role,
                warehouse,
                database,
                host: non_blank(sf.snowflake_host),
                statement_timeout: statement_timeout(sf.snowflake_statement_timeout_secs)?,
            },
            schema_prefix,
            sql_path: PathBuf::from(sql_path),
            github_output: non_blank(github_output).map(PathBuf::from),
            workspace: non_blank(github_workspace)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKSPACE)),
        })
    }

    pub fn database(&self) -> &str {
        &self.snowflake.database
    }

    /// Template location, resolved against the workspace root.
    pub fn template_path(&self) -> PathBuf {
        self.workspace.join(&self.sql_path)
    }
}

/// Settings for `create-seed`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedConfig {
    pub rows: usize,
    /// Any signed 64-bit integer; negative seeds are as reproducible as positive ones.
    pub random_seed: Option<i64>,
    pub output_dir: PathBuf,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_SEED_ROWS,
            random_seed: None,
            output_dir: PathBuf::from(DEFAULT_SEED_DIR),
        }
    }
}

impl SeedConfig {
    pub fn from_env(source: &EnvSource) -> ScriptResult<Self> {
        let raw: RawSeedEnv = source.load()?;

        let rows = match non_blank(raw.dbt_seed_rows) {
            None => DEFAULT_SEED_ROWS,
            Some(value) => value
                .trim()
                .parse::<usize>()
                .map_err(|e| ScriptError::invalid_env("DBT_SEED_ROWS", e.to_string()))?,
        };

        // An unparsable seed falls back to a random run rather than failing.
        let random_seed = non_blank(raw.seed_random_seed).and_then(|value| {
            match value.trim().parse::<i64>() {
                Ok(seed) => Some(seed),
                Err(e) => {
                    warn!(value = %value, error = %e, "Ignoring invalid SEED_RANDOM_SEED");
                    None
                }
            }
        });

        let output_dir = non_blank(raw.seed_output_dir)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SEED_DIR));

        debug!(rows, ?random_seed, output_dir = %output_dir.display(), "Seed configuration loaded");
        Ok(Self {
            rows,
            random_seed,
            output_dir,
        })
    }

    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }
}

/// Initializes the global tracing subscriber.
///
/// Logs go to stderr; stdout carries the program report and GitHub workflow commands.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("dataops_scripts={}", level);
    let filter_directive = std_env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);
    let filter = EnvFilter::new(filter_directive);

    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Reads `LOG_LEVEL` and `LOG_JSON` and installs the subscriber.
pub fn init_tracing_from_env() {
    let level = std_env::var("LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
    let json = std_env::var("LOG_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    init_tracing(&level, json);
}
