use std::path::PathBuf;
use std::process::ExitCode;

use crate::snowflake::SnowflakeError;

/// Broad failure classes shared by every program in this crate.
///
/// Each class is terminal: nothing is retried, every one of them ends the
/// process with a non-zero exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Usage,
    Io,
    Remote,
}

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingEnv(Vec<String>),

    #[error("Invalid value for {key}: {message}")]
    InvalidEnv { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("{0}")]
    Usage(String),

    #[error("Invalid {field} '{value}': only ASCII letters, digits, '_' and '$' are allowed")]
    InvalidIdentifier { field: &'static str, value: String },

    #[error("SQL file not found at: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Snowflake(#[from] SnowflakeError),

    #[error("Metrics query returned no rows.")]
    NoRows,

    #[error("Unexpected result shape from metrics SQL. Expected 5 columns; error: {0}")]
    ResultShape(String),
}

impl ScriptError {
    pub fn missing_env<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptError::MissingEnv(keys.into_iter().map(Into::into).collect())
    }

    pub fn invalid_env(key: impl Into<String>, message: impl Into<String>) -> Self {
        ScriptError::InvalidEnv {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Single source of truth for error classification.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingEnv(_) | Self::InvalidEnv { .. } | Self::Config(_) => {
                ErrorCategory::Configuration
            }
            Self::Usage(_) | Self::InvalidIdentifier { .. } => ErrorCategory::Usage,
            Self::TemplateNotFound(_) | Self::Io(_) | Self::Csv(_) => ErrorCategory::Io,
            Self::Snowflake(_) | Self::NoRows | Self::ResultShape(_) => ErrorCategory::Remote,
        }
    }

    /// Every failure surfaces as a conventional exit status of 1.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::FAILURE
    }
}

pub type ScriptResult<T> = Result<T, ScriptError>;
