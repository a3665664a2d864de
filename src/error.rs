//! Error types for docgate.

use thiserror::Error;

/// Main error type for docgate operations.
#[derive(Error, Debug)]
pub enum DocgateError {
    /// Limiter constructed with a zero capacity, zero window, or outside a runtime
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A permit wait was interrupted or the limiter was stopped
    #[error("Permit acquisition cancelled")]
    Cancelled,

    /// The current window is exhausted and the limiter rejects instead of waiting
    #[error("Request limit of {capacity} reached for the current window")]
    LimitReached { capacity: u64 },

    /// Network failure while performing the guarded call
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document payload is not valid JSON
    #[error("Invalid document: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for DocgateError {
    fn from(err: config::ConfigError) -> Self {
        DocgateError::Config(err.to_string())
    }
}

/// Result type alias for docgate operations.
pub type Result<T> = std::result::Result<T, DocgateError>;
