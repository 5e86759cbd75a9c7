use std::time::Duration;

use thiserror::Error;

/// unireport error types
#[derive(Error, Debug)]
pub enum ReportError {
    /// User input that must block the query (empty id, bad date range, bad period label)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Data source did not answer within the configured timeout
    #[error("data source timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Data source connectivity, auth or protocol failure
    #[error("data source error: {0}")]
    Source(String),

    /// Failed to parse JSON/JSONL/TOML
    #[error("parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Workbook export failed
    #[error("export error: {0}")]
    Export(String),
}

impl ReportError {
    /// Whether the error stems from user input rather than the environment
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Result type alias for unireport
pub type Result<T> = std::result::Result<T, ReportError>;
