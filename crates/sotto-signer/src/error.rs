//! Signer error types

use sotto_crypto::CryptoError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, SignerError>;

/// Errors surfaced by signing backends
///
/// These gate user-visible, safety-relevant actions (a message must not
/// appear sent if signing or encryption failed), so every variant is
/// propagated to the caller. The type is `Clone` because results are
/// shared between coalesced concurrent callers.
#[derive(Clone, Debug, Error)]
pub enum SignerError {
    /// No signing backend is ready to serve the request
    ///
    /// Not a terminal condition: a backend may become available later.
    #[error("No signing backend available: {0}")]
    AuthenticationUnavailable(String),

    /// A key encoding could not be decoded or carried the wrong type tag
    #[error("Invalid key encoding: {0}")]
    InvalidKeyEncoding(String),

    /// A remote signer address could not be parsed
    #[error("Invalid remote signer address: {0}")]
    InvalidAddress(String),

    /// The backend declined to sign
    #[error("Signing rejected: {0}")]
    SigningRejected(String),

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(#[source] CryptoError),

    /// Both decryption schemes were exhausted
    ///
    /// Carries the modern scheme's error; the legacy fallback's failure is
    /// never what the caller sees.
    #[error("Decryption failed: {0}")]
    DecryptionFailed(#[source] CryptoError),

    /// The remote signer handshake has not completed
    #[error("Remote signer not connected")]
    NotConnected,

    /// The operation is not implemented by this backend
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),
}
