//! # sotto Cryptographic Library
//!
//! Cryptographic primitives for the sotto protocol client:
//!
//! - [`keys`]: secp256k1 key pairs, BIP-340 Schnorr signing, ECDH
//! - [`nip44`]: the modern authenticated payload encryption scheme
//! - [`nip04`]: the legacy unauthenticated scheme, decrypt-compatibility only
//! - [`hash`]: digest helpers
//!
//! Secret material held by this crate stays in process memory and is
//! zeroized on drop; nothing here persists or logs key bytes.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod error;
pub mod hash;
pub mod keys;
pub mod nip04;
pub mod nip44;

pub use error::{CryptoError, Result};
pub use keys::{KeyPair, SharedSecretX};
pub use nip44::ConversationKey;
