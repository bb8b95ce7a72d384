//! Error taxonomy for the validation engine.
//!
//! Two families live here:
//! - [`ValidationError`] is a *finding*: a rule a submitted file violates.
//!   Findings are collected into an [`ErrorReport`](crate::report::ErrorReport)
//!   and never abort a batch.
//! - [`HubError`] is an infrastructure failure raised while locating or
//!   reading staged inputs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The rule family a validation finding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// File does not follow the repository naming convention.
    PathFormat,
    /// Missing, extra or mistyped columns or fields.
    Schema,
    /// Numeric or categorical value outside the allowed domain.
    ValueRange,
    /// Cross-field mismatch (filename vs content, duplicate identities).
    Consistency,
    /// File unreadable or not valid CSV / metadata text.
    Parse,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::PathFormat => "path_format",
            ErrorKind::Schema => "schema",
            ErrorKind::ValueRange => "value_range",
            ErrorKind::Consistency => "consistency",
            ErrorKind::Parse => "parse",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rule violation found in a submitted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// File name the finding is attributed to.
    pub file: String,
    /// Rule family.
    pub kind: ErrorKind,
    /// Human-readable explanation.
    pub message: String,
}

impl ValidationError {
    pub fn new(file: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Infrastructure errors raised while loading files.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("staging directory not found: {0}")]
    MissingDirectory(String),
}

/// Result type for engine operations that can fail on I/O.
pub type Result<T> = std::result::Result<T, HubError>;
