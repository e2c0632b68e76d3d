//! Error handling for the netscanner engine and its plugins
//!
//! Connect and banner failures never show up here: the engine folds them into
//! a `Closed` port state or an empty banner. These errors cover bad
//! configuration and plugins that could not run at all.

use thiserror::Error;

/// Main error type for scanning operations
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Port range error: {0}")]
    PortRangeError(String),

    #[error("Timeout error")]
    TimeoutError,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    /// The peer answered, but not with the protocol the plugin expects
    #[error("Service mismatch: {0}")]
    ServiceMismatch(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Output error: {0}")]
    OutputError(String),
}

impl From<std::num::ParseIntError> for ScanError {
    fn from(err: std::num::ParseIntError) -> Self {
        ScanError::ParseError(err.to_string())
    }
}

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ScanError::TimeoutError
        } else {
            ScanError::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(err: serde_json::Error) -> Self {
        ScanError::OutputError(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for ScanError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        ScanError::TimeoutError
    }
}

impl ScanError {
    /// Configuration problems abort a run; everything else is per-target
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScanError::InvalidTarget(_) | ScanError::PortRangeError(_) | ScanError::ConfigError(_)
        )
    }
}
