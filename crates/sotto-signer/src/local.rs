//! Local key signer
//!
//! Holds the user's secret key directly in process memory. The key comes in
//! as an `nsec` encoding and never leaves the signer; nothing here persists
//! or logs it.

use tracing::debug;
use zeroize::Zeroize;

use sotto_core::codec;
use sotto_core::event::{EventDraft, SignedEvent};
use sotto_crypto::{nip04, nip44, ConversationKey, CryptoError, KeyPair};

use crate::error::{Result, SignerError};
use crate::Signer;

/// Signer backed by a raw secret key in memory
pub struct LocalSigner {
    keys: KeyPair,
    public_key_hex: String,
}

impl LocalSigner {
    /// Construct from an `nsec` encoding
    ///
    /// Anything that is not a well-formed `nsec` fails with
    /// [`SignerError::InvalidKeyEncoding`] before any key derivation runs.
    pub fn new(nsec: &str) -> Result<Self> {
        let mut secret = codec::nsec_decode(nsec)
            .map_err(|e| SignerError::InvalidKeyEncoding(e.to_string()))?;
        let keys = KeyPair::from_secret_bytes(&secret)
            .map_err(|e| SignerError::InvalidKeyEncoding(e.to_string()));
        secret.zeroize();
        let keys = keys?;

        let public_key_hex = keys.public_key_hex();
        debug!(public_key = %public_key_hex, "local signer ready");
        Ok(Self {
            keys,
            public_key_hex,
        })
    }

    /// Generate a fresh identity
    ///
    /// Returns the signer and the `nsec` encoding of the new secret so the
    /// caller can hand it to the user for backup. This is the only moment
    /// the secret leaves the signer.
    pub fn generate() -> Result<(Self, String)> {
        let keys = KeyPair::generate();
        let mut secret = keys.secret_bytes();
        let nsec = codec::nsec_encode(&secret)
            .map_err(|e| SignerError::InvalidKeyEncoding(e.to_string()));
        secret.zeroize();

        let public_key_hex = keys.public_key_hex();
        Ok((
            Self {
                keys,
                public_key_hex,
            },
            nsec?,
        ))
    }
}

#[async_trait::async_trait]
impl Signer for LocalSigner {
    async fn public_key(&self) -> Result<String> {
        Ok(self.public_key_hex.clone())
    }

    async fn sign_event(&self, draft: EventDraft) -> Result<SignedEvent> {
        let id = draft
            .id(&self.public_key_hex)
            .map_err(|e| SignerError::SigningRejected(e.to_string()))?;
        let signature = self
            .keys
            .sign_digest(&id)
            .map_err(|e| SignerError::SigningRejected(e.to_string()))?;
        Ok(draft.into_signed(self.public_key_hex.clone(), id, signature))
    }

    async fn encrypt(&self, recipient: &str, plaintext: &str) -> Result<String> {
        let key = ConversationKey::derive(&self.keys, recipient).map_err(|e| match e {
            CryptoError::InvalidPublicKey(msg) => SignerError::InvalidKeyEncoding(msg),
            other => SignerError::EncryptionFailed(other),
        })?;
        nip44::encrypt(&key, plaintext).map_err(SignerError::EncryptionFailed)
    }

    async fn decrypt(&self, sender: &str, ciphertext: &str) -> Result<String> {
        // modern scheme first
        let modern = ConversationKey::derive(&self.keys, sender)
            .and_then(|key| nip44::decrypt(&key, ciphertext));
        let modern_err = match modern {
            Ok(plaintext) => return Ok(plaintext),
            Err(e) => e,
        };

        // transparent legacy fallback; if it also fails, the modern error
        // is what the caller sees
        let legacy = self
            .keys
            .shared_secret_x(sender)
            .and_then(|shared| nip04::decrypt(shared.as_bytes(), ciphertext));
        match legacy {
            Ok(plaintext) => {
                debug!("payload decrypted via legacy scheme fallback");
                Ok(plaintext)
            }
            Err(_) => Err(SignerError::DecryptionFailed(modern_err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sotto_core::event::KIND_PROFILE_METADATA;

    fn signer_pair() -> (LocalSigner, LocalSigner) {
        let (alice, _) = LocalSigner::generate().unwrap();
        let (bob, _) = LocalSigner::generate().unwrap();
        (alice, bob)
    }

    #[tokio::test]
    async fn generate_produces_working_signer() {
        let (signer, nsec) = LocalSigner::generate().unwrap();
        assert!(nsec.starts_with("nsec1"));

        let restored = LocalSigner::new(&nsec).unwrap();
        assert_eq!(
            signer.public_key().await.unwrap(),
            restored.public_key().await.unwrap()
        );
    }

    #[test]
    fn wrong_tag_rejected() {
        // an npub has a valid checksum but the wrong type tag
        let npub = codec::npub_encode(&[0x42u8; 32]).unwrap();
        assert!(matches!(
            LocalSigner::new(&npub),
            Err(SignerError::InvalidKeyEncoding(_))
        ));
    }

    #[test]
    fn malformed_encoding_rejected() {
        for bad in ["", "nsec1", "nsec1qqqq", "hello world", "npub"] {
            assert!(matches!(
                LocalSigner::new(bad),
                Err(SignerError::InvalidKeyEncoding(_))
            ));
        }
    }

    #[tokio::test]
    async fn sign_event_is_deterministic_and_verifies() {
        let (signer, _) = signer_pair();
        let draft = EventDraft {
            kind: KIND_PROFILE_METADATA,
            tags: Vec::new(),
            content: "{}".into(),
            created_at: 1_700_000_000,
        };

        let a = signer.sign_event(draft.clone()).await.unwrap();
        let b = signer.sign_event(draft).await.unwrap();

        assert_eq!(a, b);
        a.verify().unwrap();
        assert_eq!(a.pubkey, signer.public_key().await.unwrap());
    }

    #[tokio::test]
    async fn modern_scheme_roundtrip() {
        let (alice, bob) = signer_pair();
        let bob_pk = bob.public_key().await.unwrap();
        let alice_pk = alice.public_key().await.unwrap();

        let ciphertext = alice.encrypt(&bob_pk, "see you at 6").await.unwrap();
        assert_eq!(bob.decrypt(&alice_pk, &ciphertext).await.unwrap(), "see you at 6");
    }

    #[tokio::test]
    async fn legacy_ciphertext_decrypts_via_fallback() {
        let (alice, bob) = signer_pair();
        let alice_pk = alice.public_key().await.unwrap();

        // a counterpart still on the legacy scheme encrypts to us
        let shared = bob.keys.shared_secret_x(&alice_pk).unwrap();
        let legacy_payload = nip04::encrypt(shared.as_bytes(), "old history").unwrap();

        let bob_pk = bob.public_key().await.unwrap();
        assert_eq!(
            alice.decrypt(&bob_pk, &legacy_payload).await.unwrap(),
            "old history"
        );
    }

    #[tokio::test]
    async fn both_schemes_exhausted_surfaces_modern_error() {
        let (alice, bob) = signer_pair();
        let bob_pk = bob.public_key().await.unwrap();

        let result = alice.decrypt(&bob_pk, "neither scheme can open this").await;
        assert!(matches!(result, Err(SignerError::DecryptionFailed(_))));
    }

    #[tokio::test]
    async fn wrong_sender_key_fails_decryption() {
        let (alice, bob) = signer_pair();
        let (eve, _) = LocalSigner::generate().unwrap();

        let bob_pk = bob.public_key().await.unwrap();
        let eve_pk = eve.public_key().await.unwrap();
        let ciphertext = alice.encrypt(&bob_pk, "for bob only").await.unwrap();

        // bob decrypting with the wrong counterpart identity must fail
        let result = bob.decrypt(&eve_pk, &ciphertext).await;
        assert!(matches!(result, Err(SignerError::DecryptionFailed(_))));
    }

    #[tokio::test]
    async fn encrypting_to_malformed_recipient_rejected() {
        let (alice, _) = signer_pair();
        assert!(matches!(
            alice.encrypt("not a key", "hello").await,
            Err(SignerError::InvalidKeyEncoding(_))
        ));
    }
}
