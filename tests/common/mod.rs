#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dataops_scripts::config::SnowflakeConfig;
use dataops_scripts::snowflake::{Column, QueryResult, SnowflakeError, SqlExecutor};

/// Configuration pointing the SQL API client at `host` (a mock server URI).
pub fn snowflake_config(host: Option<&str>) -> SnowflakeConfig {
    SnowflakeConfig {
        account: "xy12345".into(),
        user: "ci_bot".into(),
        token: "pat-secret".into(),
        authenticator: "PROGRAMMATIC_ACCESS_TOKEN".into(),
        role: "OBSERVER".into(),
        warehouse: "CI_WH".into(),
        database: "ANALYTICS".into(),
        host: host.map(str::to_string),
        statement_timeout: Duration::from_secs(5),
    }
}

/// Single metrics row as the SQL API renders it.
pub fn metrics_result() -> QueryResult {
    QueryResult::new(
        [
            "LAST_DATE",
            "WK_TOTAL_QUERIES",
            "WK_FAILED_QUERIES",
            "WK_AVG_QUERY_DURATION_SEC",
            "STORAGE_GB_ESTIMATE",
        ]
        .into_iter()
        .map(Column::named)
        .collect(),
        vec![["2024-06-30", "1532", "12", "0.842", "3.75"]
            .into_iter()
            .map(|v| Some(v.to_string()))
            .collect()],
    )
}

pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

/// Shared view of what a [`RecordingExecutor`] saw, kept after the executor is boxed.
#[derive(Clone, Default)]
pub struct Recorder {
    statements: Arc<Mutex<Vec<String>>>,
    closes: Arc<Mutex<usize>>,
}

impl Recorder {
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    pub fn closes(&self) -> usize {
        *self.closes.lock().unwrap()
    }
}

/// In-memory executor returning a canned outcome for every statement.
pub struct RecordingExecutor {
    recorder: Recorder,
    outcome: Box<dyn Fn() -> Result<QueryResult, SnowflakeError> + Send + Sync>,
}

impl RecordingExecutor {
    pub fn returning(result: QueryResult) -> (Self, Recorder) {
        Self::with(move || Ok(result.clone()))
    }

    pub fn failing(message: &'static str) -> (Self, Recorder) {
        Self::with(move || {
            Err(SnowflakeError::Api {
                status: 422,
                code: Some("002003".into()),
                sql_state: None,
                message: message.into(),
            })
        })
    }

    fn with(
        outcome: impl Fn() -> Result<QueryResult, SnowflakeError> + Send + Sync + 'static,
    ) -> (Self, Recorder) {
        let recorder = Recorder::default();
        let executor = Self {
            recorder: recorder.clone(),
            outcome: Box::new(outcome),
        };
        (executor, recorder)
    }
}

#[async_trait]
impl SqlExecutor for RecordingExecutor {
    async fn execute(&self, statement: &str) -> Result<QueryResult, SnowflakeError> {
        self.recorder
            .statements
            .lock()
            .unwrap()
            .push(statement.to_string());
        (self.outcome)()
    }

    async fn close(&self) -> Result<(), SnowflakeError> {
        *self.recorder.closes.lock().unwrap() += 1;
        Ok(())
    }
}
