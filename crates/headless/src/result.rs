//! Result and error types for the headless environment.

use thiserror::Error;

/// Result type for headless environment operations
pub type HeadlessResult<T> = Result<T, HeadlessError>;

/// Errors that can occur while building or driving the headless environment
#[derive(Debug, Error)]
pub enum HeadlessError {
    /// A wait gave up; the message matches [`crate::wait::TIMEOUT_MESSAGE`]
    #[error("Timeout waiting for async condition")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Fixture error (setup/teardown failed)
    #[error("Fixture error: {message}")]
    FixtureError {
        /// Error message
        message: String,
    },

    /// Location could not be parsed
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl {
        /// URL that failed to parse
        url: String,
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// A stubbed `fetch` rejected with a network failure
    #[error("Request to {url} failed: {reason}")]
    FetchFailed {
        /// URL of the failed request
        url: String,
        /// Chromium-style network error code
        reason: String,
    },

    /// A stubbed request or route could not be built
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl HeadlessError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create an invalid-request error
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
