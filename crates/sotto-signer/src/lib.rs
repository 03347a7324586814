//! # sotto Signers
//!
//! The signing capability of the sotto client, with one implementation per
//! backend:
//!
//! - [`local`]: raw secret key in memory, local Schnorr signing and
//!   NIP-44/NIP-04 payload encryption
//! - [`extension`]: delegation to a runtime-supplied capability, with
//!   call-deduplicating caches to minimize approval prompts
//! - [`bunker`]: delegation to a remote signer over relays (explicit stub
//!   until the handshake protocol lands)
//!
//! Backends are chosen explicitly at construction; [`AnySigner`] gives
//! calling code one backend-agnostic value without hidden dynamic dispatch.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod bunker;
mod cache;
pub mod error;
pub mod extension;
pub mod local;

pub use bunker::{BunkerAddress, BunkerSigner, ConnectionState};
pub use error::{Result, SignerError};
pub use extension::{ExtensionCapability, ExtensionHost, ExtensionSigner};
pub use local::LocalSigner;

use sotto_core::event::{EventDraft, SignedEvent};

/// The uniform signing capability
///
/// Every backend answers the same four operations; failures are always
/// surfaced because they gate user-visible actions.
#[async_trait::async_trait]
pub trait Signer: Send + Sync {
    /// The user's public identity, x-only hex
    async fn public_key(&self) -> Result<String>;

    /// Sign a draft event, producing its immutable signed form
    async fn sign_event(&self, draft: EventDraft) -> Result<SignedEvent>;

    /// Encrypt a direct-message payload to `recipient`
    async fn encrypt(&self, recipient: &str, plaintext: &str) -> Result<String>;

    /// Decrypt a direct-message payload from `sender`
    async fn decrypt(&self, sender: &str, ciphertext: &str) -> Result<String>;
}

/// A signer of any backend, chosen at construction
pub enum AnySigner {
    /// Raw key in memory
    Local(LocalSigner),
    /// Runtime-supplied extension capability
    Extension(ExtensionSigner),
    /// Remote bunker delegation
    Bunker(BunkerSigner),
}

#[async_trait::async_trait]
impl Signer for AnySigner {
    async fn public_key(&self) -> Result<String> {
        match self {
            Self::Local(signer) => signer.public_key().await,
            Self::Extension(signer) => signer.public_key().await,
            Self::Bunker(signer) => signer.public_key().await,
        }
    }

    async fn sign_event(&self, draft: EventDraft) -> Result<SignedEvent> {
        match self {
            Self::Local(signer) => signer.sign_event(draft).await,
            Self::Extension(signer) => signer.sign_event(draft).await,
            Self::Bunker(signer) => signer.sign_event(draft).await,
        }
    }

    async fn encrypt(&self, recipient: &str, plaintext: &str) -> Result<String> {
        match self {
            Self::Local(signer) => signer.encrypt(recipient, plaintext).await,
            Self::Extension(signer) => signer.encrypt(recipient, plaintext).await,
            Self::Bunker(signer) => signer.encrypt(recipient, plaintext).await,
        }
    }

    async fn decrypt(&self, sender: &str, ciphertext: &str) -> Result<String> {
        match self {
            Self::Local(signer) => signer.decrypt(sender, ciphertext).await,
            Self::Extension(signer) => signer.decrypt(sender, ciphertext).await,
            Self::Bunker(signer) => signer.decrypt(sender, ciphertext).await,
        }
    }
}
