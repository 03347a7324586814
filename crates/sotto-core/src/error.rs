//! Core error types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors from core types and codecs
#[derive(Clone, Debug, Error)]
pub enum CoreError {
    /// A human-readable key encoding could not be decoded, or carried the
    /// wrong type tag
    #[error("Invalid key encoding: {0}")]
    Codec(String),

    /// Serialization failed
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// An event's id or signature does not hold together
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// Underlying cryptographic failure
    #[error(transparent)]
    Crypto(#[from] sotto_crypto::CryptoError),
}
