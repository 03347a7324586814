//! Relay error types
//!
//! These never cross the [`crate::RelayQueryEngine::search`] boundary:
//! search is a non-critical enhancement and resolves to an empty result on
//! any failure. The variants exist for logging and for tests.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, RelayError>;

/// Relay errors
#[derive(Debug, Error)]
pub enum RelayError {
    /// Connection could not be established
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Subscription could not be opened
    #[error("Subscription failed: {0}")]
    Subscription(String),

    /// A wire frame did not follow the protocol
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Underlying transport error
    #[error("Network error: {0}")]
    Network(String),
}

impl From<std::io::Error> for RelayError {
    fn from(err: std::io::Error) -> Self {
        RelayError::Network(err.to_string())
    }
}
