//! Error types for pull-request orchestration.

use thiserror::Error;

/// Errors raised while talking to the pull-request host or staging files.
#[derive(Error, Debug)]
pub enum CiError {
    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success HTTP status
    #[error("{method} {url} returned {status}")]
    HttpStatus {
        method: &'static str,
        url: String,
        status: u16,
    },

    /// Event payload missing or malformed
    #[error("Invalid event payload: {0}")]
    Event(String),

    /// Configuration is incomplete for the requested operation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Raw content could not be fetched
    #[error("Download failed for {path}: {reason}")]
    Download { path: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for CiError {
    fn from(err: reqwest::Error) -> Self {
        CiError::Http(err.to_string())
    }
}

/// Result type for orchestration operations.
pub type Result<T> = std::result::Result<T, CiError>;
