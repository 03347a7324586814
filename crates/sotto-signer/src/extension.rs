//! Extension-backed signer
//!
//! Delegates signing and payload encryption to a capability supplied by the
//! surrounding runtime (a browser extension or platform signer app). Each
//! underlying call may pop a user-facing approval prompt, so every
//! operation is memoized through a per-instance [`SingleFlight`] cache:
//! concurrent identical requests share one backend call, and repeated
//! identical requests are answered from the cache until [`clear_cache`]
//! (used at logout).
//!
//! [`clear_cache`]: ExtensionSigner::clear_cache

use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, warn};

use sotto_core::event::{EventDraft, SignedEvent};

use crate::cache::SingleFlight;
use crate::error::{Result, SignerError};
use crate::Signer;

/// Probe value used to surface encryption permission prompts
const PERMISSION_PROBE: &str = "sotto-permission-check";

/// The capability surface an extension must provide
#[async_trait::async_trait]
pub trait ExtensionCapability: Send + Sync {
    /// The user's public identity, x-only hex
    async fn get_public_key(&self) -> Result<String>;
    /// Sign a draft event
    async fn sign_event(&self, draft: EventDraft) -> Result<SignedEvent>;
    /// Encrypt with the modern scheme
    async fn nip44_encrypt(&self, recipient: &str, plaintext: &str) -> Result<String>;
    /// Decrypt with the modern scheme
    async fn nip44_decrypt(&self, sender: &str, ciphertext: &str) -> Result<String>;
}

/// Source of the (possibly absent) extension capability
///
/// Looked up on every operation: an extension that is missing now may be
/// installed or unlocked later, so absence is never cached.
pub trait ExtensionHost: Send + Sync {
    /// The current capability, if one is present
    fn capability(&self) -> Option<Arc<dyn ExtensionCapability>>;
}

/// Signer delegating to a runtime-supplied extension capability
pub struct ExtensionSigner {
    host: Arc<dyn ExtensionHost>,
    pubkey_flight: SingleFlight<(), String>,
    encrypt_flights: SingleFlight<(String, String), String>,
    decrypt_flights: SingleFlight<(String, String), String>,
}

impl ExtensionSigner {
    /// Create a signer over the given host
    pub fn new(host: Arc<dyn ExtensionHost>) -> Self {
        Self {
            host,
            pubkey_flight: SingleFlight::new(),
            encrypt_flights: SingleFlight::new(),
            decrypt_flights: SingleFlight::new(),
        }
    }

    /// Drop all memoized results (logout / test reset)
    ///
    /// The only eviction there is; entries never expire on their own.
    pub fn clear_cache(&self) {
        self.pubkey_flight.clear();
        self.encrypt_flights.clear();
        self.decrypt_flights.clear();
        debug!("extension signer caches cleared");
    }

    /// Proactively surface the encryption approval prompt
    ///
    /// Encrypts a short probe to the signer's own identity and decrypts it
    /// back, so the user sees the permission dialog at a convenient moment
    /// instead of mid-conversation later. The outcome is informational
    /// only.
    pub async fn request_nip44_permissions(&self) -> bool {
        match self.permission_probe().await {
            Ok(()) => true,
            Err(e) => {
                warn!("encryption permission probe failed: {e}");
                false
            }
        }
    }

    async fn permission_probe(&self) -> Result<()> {
        let own_key = self.public_key().await?;
        let ciphertext = self.encrypt(&own_key, PERMISSION_PROBE).await?;
        let plaintext = self.decrypt(&own_key, &ciphertext).await?;
        if plaintext == PERMISSION_PROBE {
            Ok(())
        } else {
            Err(SignerError::SigningRejected(
                "permission probe roundtrip mismatch".into(),
            ))
        }
    }

    fn capability(&self) -> Result<Arc<dyn ExtensionCapability>> {
        self.host.capability().ok_or_else(|| {
            SignerError::AuthenticationUnavailable("extension capability not present".into())
        })
    }
}

#[async_trait::async_trait]
impl Signer for ExtensionSigner {
    async fn public_key(&self) -> Result<String> {
        let capability = self.capability()?;
        self.pubkey_flight
            .get_or_call((), move || {
                async move {
                    debug!("requesting public key from extension");
                    capability.get_public_key().await
                }
                .boxed()
            })
            .await
    }

    async fn sign_event(&self, draft: EventDraft) -> Result<SignedEvent> {
        // every signature is individually user-approved; never cached
        self.capability()?.sign_event(draft).await
    }

    async fn encrypt(&self, recipient: &str, plaintext: &str) -> Result<String> {
        let capability = self.capability()?;
        let key = (recipient.to_string(), plaintext.to_string());
        let (recipient, plaintext) = key.clone();
        self.encrypt_flights
            .get_or_call(key, move || {
                async move {
                    debug!(recipient = %abbrev(&recipient), "delegating encryption to extension");
                    capability.nip44_encrypt(&recipient, &plaintext).await
                }
                .boxed()
            })
            .await
    }

    async fn decrypt(&self, sender: &str, ciphertext: &str) -> Result<String> {
        let capability = self.capability()?;
        let key = (sender.to_string(), ciphertext.to_string());
        let (sender, ciphertext) = key.clone();
        self.decrypt_flights
            .get_or_call(key, move || {
                async move {
                    debug!(sender = %abbrev(&sender), "delegating decryption to extension");
                    capability.nip44_decrypt(&sender, &ciphertext).await
                }
                .boxed()
            })
            .await
    }
}

fn abbrev(key: &str) -> &str {
    key.get(..8).unwrap_or(key)
}
