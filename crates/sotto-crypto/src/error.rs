//! Crypto error types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Cryptographic errors
///
/// Variants carry owned strings so the type stays `Clone`; signer-level
/// errors wrap these and flow through shared futures.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Secret key bytes are not a valid scalar
    #[error("Invalid secret key: {0}")]
    InvalidSecretKey(String),

    /// Public key is not a valid curve point
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Signing failed
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Signature does not verify
    #[error("Invalid signature")]
    InvalidSignature,

    /// Plaintext length outside the allowed range
    #[error("Invalid plaintext length: {len}")]
    PlaintextLength {
        /// Offending length in bytes
        len: usize,
    },

    /// Payload is structurally malformed
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Payload claims a version this implementation does not speak
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),

    /// Authentication tag mismatch
    #[error("MAC verification failed")]
    MacMismatch,

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed
    #[error("Decryption failed: {0}")]
    Decryption(String),
}
