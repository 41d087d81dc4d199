/*!
 * # Snowflake access
 *
 * The programs only ever need to run one statement and read back its rows,
 * so warehouse access sits behind the narrow [`SqlExecutor`] trait. The
 * production implementation talks to the Snowflake SQL API over HTTPS.
 */

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

mod client;
pub mod value;

pub use client::SnowflakeClient;

use crate::config::SnowflakeConfig;

/// Errors raised while talking to Snowflake
#[derive(Error, Debug)]
pub enum SnowflakeError {
    #[error("HTTP error talking to Snowflake: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Snowflake returned HTTP {status}{}: {message}", .code.as_ref().map(|c| format!(" (code {c})")).unwrap_or_default())]
    Api {
        status: u16,
        code: Option<String>,
        sql_state: Option<String>,
        message: String,
    },

    #[error("Statement {handle} did not finish within {waited_secs}s")]
    Timeout { handle: String, waited_secs: u64 },

    #[error("Invalid response from Snowflake: {0}")]
    InvalidResponse(String),

    #[error("Invalid Snowflake endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Column metadata as reported by the warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub type_name: Option<String>,
}

impl Column {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
        }
    }
}

/// Rows come back as text (`None` for SQL NULL), exactly as the SQL API renders them.
pub type Row = Vec<Option<String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// Empty when the response carried no column metadata.
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub statement_handle: Option<String>,
}

impl QueryResult {
    pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            statement_handle: None,
        }
    }

    pub fn first_row(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn has_column_metadata(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Case-insensitive column lookup; with duplicate names the last one wins.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .rposition(|column| column.name.eq_ignore_ascii_case(name))
    }
}

/// Execute-a-statement capability.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(&self, statement: &str) -> Result<QueryResult, SnowflakeError>;
    async fn close(&self) -> Result<(), SnowflakeError>;
}

pub type BoxedExecutor = Box<dyn SqlExecutor>;

/// Closes the executor; a failure here is logged and never escalated.
pub async fn close_quietly(executor: &dyn SqlExecutor) {
    if let Err(err) = executor.close().await {
        warn!(error = %err, "Failed to close Snowflake connection");
    }
}

/// Opens the production executor for a validated configuration.
pub fn connect(config: &SnowflakeConfig) -> Result<BoxedExecutor, SnowflakeError> {
    Ok(Box::new(SnowflakeClient::connect(config)?))
}

/// Same as [`connect`], with every statement tagged with `QUERY_TAG`.
pub fn connect_tagged(
    config: &SnowflakeConfig,
    query_tag: &str,
) -> Result<BoxedExecutor, SnowflakeError> {
    Ok(Box::new(
        SnowflakeClient::connect(config)?.with_query_tag(query_tag),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_lookup_ignores_case() {
        let result = QueryResult::new(
            vec![Column::named("last_date"), Column::named("WK_TOTAL_QUERIES")],
            vec![vec![Some("2024-05-01".into()), Some("12".into())]],
        );
        assert_eq!(result.column_index("LAST_DATE"), Some(0));
        assert_eq!(result.column_index("wk_total_queries"), Some(1));
        assert_eq!(result.column_index("STORAGE_GB_ESTIMATE"), None);
        assert!(result.has_column_metadata());
    }

    #[test]
    fn duplicate_column_names_resolve_to_the_last() {
        let result = QueryResult::new(
            vec![
                Column::named("LAST_DATE"),
                Column::named("last_date"),
                Column::named("WK_TOTAL_QUERIES"),
            ],
            vec![],
        );
        assert_eq!(result.column_index("LAST_DATE"), Some(1));
    }

    #[test]
    fn api_error_message_includes_code_when_present() {
        let err = SnowflakeError::Api {
            status: 422,
            code: Some("002003".into()),
            sql_state: Some("02000".into()),
            message: "Schema 'X' does not exist".into(),
        };
        assert_eq!(
            err.to_string(),
            "Snowflake returned HTTP 422 (code 002003): Schema 'X' does not exist"
        );

        let err = SnowflakeError::Api {
            status: 503,
            code: None,
            sql_state: None,
            message: "unavailable".into(),
        };
        assert_eq!(err.to_string(), "Snowflake returned HTTP 503: unavailable");
    }
}
