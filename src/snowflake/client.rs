use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use super::{value, Column, QueryResult, SnowflakeError, SqlExecutor};
use crate::config::SnowflakeConfig;

const STATEMENTS_PATH: &str = "/api/v2/statements";
const TOKEN_TYPE_HEADER: &str = "X-Snowflake-Authorization-Token-Type";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Headroom on top of the server-side statement timeout for the HTTP round trip.
const HTTP_TIMEOUT_MARGIN: Duration = Duration::from_secs(30);

/// Snowflake SQL API client.
///
/// The SQL API is stateless: every statement carries its own database,
/// warehouse and role, so "connecting" only prepares the HTTP client and
/// closing has nothing to release on the server.
pub struct SnowflakeClient {
    http: Client,
    base_url: Url,
    database: String,
    warehouse: String,
    role: String,
    statement_timeout: Duration,
    poll_interval: Duration,
    parameters: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    timeout: u64,
    database: &'a str,
    warehouse: &'a str,
    role: &'a str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    parameters: &'a BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementResponse {
    code: Option<String>,
    message: Option<String>,
    sql_state: Option<String>,
    statement_handle: Option<String>,
    statement_status_url: Option<String>,
    result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    data: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetMetaData {
    #[serde(default)]
    row_type: Vec<RowType>,
}

#[derive(Debug, Deserialize)]
struct RowType {
    name: String,
    #[serde(rename = "type")]
    type_name: Option<String>,
}

impl SnowflakeClient {
    pub fn connect(config: &SnowflakeConfig) -> Result<Self, SnowflakeError> {
        let base_url = base_url(config)?;

        let http = Client::builder()
            .default_headers(default_headers(config)?)
            .timeout(config.statement_timeout + HTTP_TIMEOUT_MARGIN)
            .build()?;

        info!(
            endpoint = %base_url,
            user = %config.user,
            role = %config.role,
            warehouse = %config.warehouse,
            database = %config.database,
            "Prepared Snowflake SQL API client"
        );

        Ok(Self {
            http,
            base_url,
            database: config.database.clone(),
            warehouse: config.warehouse.clone(),
            role: config.role.clone(),
            statement_timeout: config.statement_timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
            parameters: BTreeMap::new(),
        })
    }

    /// Tags every statement sent by this client (session parameter `QUERY_TAG`).
    pub fn with_query_tag(mut self, tag: impl Into<String>) -> Self {
        self.parameters.insert("query_tag".to_string(), tag.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, SnowflakeError> {
        self.base_url
            .join(path)
            .map_err(|e| SnowflakeError::InvalidEndpoint(e.to_string()))
    }

    async fn submit(&self, statement: &str) -> Result<(StatusCode, StatementResponse), SnowflakeError> {
        let mut url = self.endpoint(STATEMENTS_PATH)?;
        url.query_pairs_mut()
            .append_pair("requestId", &Uuid::new_v4().to_string());

        let body = StatementRequest {
            statement,
            timeout: self.statement_timeout.as_secs(),
            database: &self.database,
            warehouse: &self.warehouse,
            role: &self.role,
            parameters: &self.parameters,
        };

        let response = self.http.post(url).json(&body).send().await?;
        read_response(response).await
    }

    /// Follows a statement that was accepted but is still running (HTTP 202).
    async fn wait_for(&self, pending: StatementResponse) -> Result<StatementResponse, SnowflakeError> {
        let handle = pending
            .statement_handle
            .clone()
            .ok_or_else(|| SnowflakeError::InvalidResponse("202 response without statementHandle".into()))?;
        let status_path = pending
            .statement_status_url
            .clone()
            .unwrap_or_else(|| format!("{}/{}", STATEMENTS_PATH, handle));
        let status_url = self.endpoint(&status_path)?;

        let started = Instant::now();
        loop {
            if started.elapsed() >= self.statement_timeout {
                return Err(SnowflakeError::Timeout {
                    handle,
                    waited_secs: started.elapsed().as_secs(),
                });
            }

            tokio::time::sleep(self.poll_interval).await;
            debug!(%handle, "Polling statement status");

            let response = self.http.get(status_url.clone()).send().await?;
            let (status, body) = read_response(response).await?;
            if status != StatusCode::ACCEPTED {
                return Ok(body);
            }
        }
    }
}

#[async_trait]
impl SqlExecutor for SnowflakeClient {
    #[instrument(skip_all, fields(database = %self.database))]
    async fn execute(&self, statement: &str) -> Result<QueryResult, SnowflakeError> {
        let (status, response) = self.submit(statement).await?;
        let response = if status == StatusCode::ACCEPTED {
            self.wait_for(response).await?
        } else {
            response
        };

        let result = into_query_result(response);
        debug!(
            rows = result.rows.len(),
            columns = result.columns.len(),
            handle = ?result.statement_handle,
            "Statement finished"
        );
        Ok(result)
    }

    async fn close(&self) -> Result<(), SnowflakeError> {
        debug!("Closing Snowflake client");
        Ok(())
    }
}

fn base_url(config: &SnowflakeConfig) -> Result<Url, SnowflakeError> {
    let raw = match &config.host {
        Some(host) if host.contains("://") => host.clone(),
        Some(host) => format!("https://{}", host),
        None => format!(
            "https://{}.snowflakecomputing.com",
            config.account.to_ascii_lowercase()
        ),
    };
    Url::parse(&raw).map_err(|e| SnowflakeError::InvalidEndpoint(format!("{raw}: {e}")))
}

fn default_headers(config: &SnowflakeConfig) -> Result<HeaderMap, SnowflakeError> {
    let invalid = |what: &str| SnowflakeError::InvalidEndpoint(format!("{what} is not a valid header value"));

    let mut headers = HeaderMap::with_capacity(5);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))),
    );

    let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.token))
        .map_err(|_| invalid("SNOWFLAKE_TOKEN"))?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(
        TOKEN_TYPE_HEADER,
        HeaderValue::from_str(&config.authenticator).map_err(|_| invalid("SNOWFLAKE_AUTHENTICATOR"))?,
    );
    Ok(headers)
}

async fn read_response(
    response: reqwest::Response,
) -> Result<(StatusCode, StatementResponse), SnowflakeError> {
    let status = response.status();
    let text = response.text().await?;

    if status.is_success() {
        let body = serde_json::from_str::<StatementResponse>(&text)
            .map_err(|e| SnowflakeError::InvalidResponse(e.to_string()))?;
        return Ok((status, body));
    }

    // Error bodies are JSON when Snowflake produced them, plain text from proxies.
    let body = serde_json::from_str::<StatementResponse>(&text).unwrap_or_default();
    let message = body
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| text.trim().to_string());
    warn!(status = status.as_u16(), code = ?body.code, "Snowflake rejected statement");
    Err(SnowflakeError::Api {
        status: status.as_u16(),
        code: body.code,
        sql_state: body.sql_state,
        message,
    })
}

/// Column metadata plus rows, with temporal cells rendered from their wire encoding.
fn into_query_result(response: StatementResponse) -> QueryResult {
    let columns: Vec<Column> = response
        .result_set_meta_data
        .map(|meta| {
            meta.row_type
                .into_iter()
                .map(|row_type| Column {
                    name: row_type.name,
                    type_name: row_type.type_name,
                })
                .collect()
        })
        .unwrap_or_default();

    let rows = response
        .data
        .into_iter()
        .map(|row| {
            row.into_iter()
                .enumerate()
                .map(|(index, cell)| {
                    let type_name = columns.get(index).and_then(|c| c.type_name.as_deref());
                    cell.map(|raw| value::render(type_name, &raw))
                })
                .collect()
        })
        .collect();

    QueryResult {
        columns,
        rows,
        statement_handle: response.statement_handle,
    }
}
