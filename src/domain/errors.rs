//! Domain error types
//!
//! This module defines the error hierarchy for resend. Retrieval failures are
//! fatal to a run, dispatch failures are recorded per record, and neither
//! exposes the HTTP client's own error types.

use thiserror::Error;

/// Main resend error type
#[derive(Debug, Error)]
pub enum ResendError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Search backend errors (always fatal to the run)
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Replay target errors
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Pre-run argument validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record transformation errors
    #[error("Transform error: {0}")]
    Transform(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Errors raised while paging through the search backend
#[derive(Debug, Error)]
pub enum SearchError {
    /// The backend answered with a structured error payload
    #[error("Backend rejected the query: {0}")]
    Backend(String),

    /// Failed to reach the search backend
    #[error("Failed to connect to search backend: {0}")]
    ConnectionFailed(String),

    /// Request timed out
    #[error("Search request timeout: {0}")]
    Timeout(String),

    /// Non-success status without a parseable error body
    #[error("Search backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Invalid search response: {0}")]
    InvalidResponse(String),
}

/// Errors raised by a single replay call
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Failed to reach the replay target
    #[error("Failed to connect to replay target: {0}")]
    ConnectionFailed(String),

    /// Request timed out
    #[error("Replay request timeout: {0}")]
    Timeout(String),

    /// The target answered with a non-success status
    #[error("Target rejected message: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// Header value could not be carried on the request
    #[error("Invalid request header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
}

impl From<std::io::Error> for ResendError {
    fn from(err: std::io::Error) -> Self {
        ResendError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ResendError {
    fn from(err: serde_json::Error) -> Self {
        ResendError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ResendError {
    fn from(err: toml::de::Error) -> Self {
        ResendError::Configuration(format!("TOML parse error: {err}"))
    }
}
