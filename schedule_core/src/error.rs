//! Error types for the schedule_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for schedule_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP transport error talking to the timetable API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A caller-supplied date could not be parsed
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// A lesson record was rejected at the payload boundary
    #[error("Invalid lesson record: {0}")]
    InvalidRecord(String),

    /// A local record does not exist
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    /// A local record with the same key already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The external timetable source failed or returned garbage
    #[error("Upstream unavailable: {0}")]
    Upstream(String),
}

impl Error {
    pub(crate) fn group_not_found(key: impl ToString) -> Self {
        Error::NotFound {
            kind: "Group",
            key: key.to_string(),
        }
    }

    pub(crate) fn schedule_not_found(key: impl ToString) -> Self {
        Error::NotFound {
            kind: "Schedule",
            key: key.to_string(),
        }
    }
}
