//! Event types
//!
//! An [`EventDraft`] carries what the author controls: kind, tags, content
//! and creation time. Signing is a one-way transformation that derives the
//! id and signature over the canonical serialization; the resulting
//! [`SignedEvent`] is never mutated afterwards.

use serde::{Deserialize, Serialize};
use sotto_crypto::hash::sha256;
use sotto_crypto::keys;

use crate::error::{CoreError, Result};

/// Event kind for profile metadata records
pub const KIND_PROFILE_METADATA: u32 = 0;

/// A draft event, not yet signed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    /// Event kind
    pub kind: u32,
    /// Tags, each a list of strings
    #[serde(default)]
    pub tags: Vec<Vec<String>>,
    /// Free-form content
    pub content: String,
    /// Creation time, unix seconds
    pub created_at: i64,
}

impl EventDraft {
    /// Create a draft stamped with the current time
    pub fn new(kind: u32, content: impl Into<String>) -> Self {
        Self {
            kind,
            tags: Vec::new(),
            content: content.into(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Append a tag
    pub fn with_tag(mut self, tag: Vec<String>) -> Self {
        self.tags.push(tag);
        self
    }

    /// Canonical serialization: `[0, pubkey, created_at, kind, tags, content]`
    ///
    /// Minified JSON; this exact byte sequence is what the id and the
    /// signature commit to.
    pub fn canonical_json(&self, public_key_hex: &str) -> Result<String> {
        serde_json::to_string(&serde_json::json!([
            0,
            public_key_hex,
            self.created_at,
            self.kind,
            self.tags,
            self.content,
        ]))
        .map_err(|e| CoreError::Serialization(e.to_string()))
    }

    /// Event id: SHA-256 of the canonical serialization
    pub fn id(&self, public_key_hex: &str) -> Result<[u8; 32]> {
        Ok(sha256(self.canonical_json(public_key_hex)?.as_bytes()))
    }

    /// Assemble the immutable signed form
    pub fn into_signed(
        self,
        public_key_hex: impl Into<String>,
        id: [u8; 32],
        signature: [u8; 64],
    ) -> SignedEvent {
        SignedEvent {
            id: hex::encode(id),
            pubkey: public_key_hex.into(),
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags,
            content: self.content,
            sig: hex::encode(signature),
        }
    }
}

/// A signed, immutable event as it travels over the wire
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEvent {
    /// Event id, hex SHA-256 of the canonical serialization
    pub id: String,
    /// Author public key, x-only hex
    pub pubkey: String,
    /// Creation time, unix seconds
    pub created_at: i64,
    /// Event kind
    pub kind: u32,
    /// Tags
    #[serde(default)]
    pub tags: Vec<Vec<String>>,
    /// Content
    pub content: String,
    /// BIP-340 Schnorr signature over the id, hex
    pub sig: String,
}

impl SignedEvent {
    /// Check the id against the canonical serialization and verify the
    /// signature
    ///
    /// Remote events are untrusted input; this runs before anything derived
    /// from them is handed to callers.
    pub fn verify(&self) -> Result<()> {
        let draft = EventDraft {
            kind: self.kind,
            tags: self.tags.clone(),
            content: self.content.clone(),
            created_at: self.created_at,
        };
        let expected = draft.id(&self.pubkey)?;
        if hex::encode(expected) != self.id.to_lowercase() {
            return Err(CoreError::InvalidEvent("id mismatch".into()));
        }

        let sig_bytes = hex::decode(&self.sig)
            .map_err(|e| CoreError::InvalidEvent(format!("signature not hex: {e}")))?;
        let signature: [u8; 64] = sig_bytes
            .try_into()
            .map_err(|_| CoreError::InvalidEvent("signature length".into()))?;
        keys::verify_digest(&self.pubkey, &expected, &signature)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sotto_crypto::KeyPair;

    fn sign(draft: EventDraft, keys: &KeyPair) -> SignedEvent {
        let pubkey = keys.public_key_hex();
        let id = draft.id(&pubkey).unwrap();
        let sig = keys.sign_digest(&id).unwrap();
        draft.into_signed(pubkey, id, sig)
    }

    #[test]
    fn canonical_json_shape() {
        let draft = EventDraft {
            kind: 1,
            tags: vec![vec!["p".into(), "abc".into()]],
            content: "hi".into(),
            created_at: 1_700_000_000,
        };
        assert_eq!(
            draft.canonical_json("deadbeef").unwrap(),
            r#"[0,"deadbeef",1700000000,1,[["p","abc"]],"hi"]"#
        );
    }

    #[test]
    fn id_is_deterministic() {
        let draft = EventDraft {
            kind: 1,
            tags: Vec::new(),
            content: "same".into(),
            created_at: 1_700_000_000,
        };
        assert_eq!(draft.id("aa").unwrap(), draft.id("aa").unwrap());
        assert_ne!(draft.id("aa").unwrap(), draft.id("bb").unwrap());
    }

    #[test]
    fn signed_event_verifies() {
        let keys = KeyPair::generate();
        let event = sign(EventDraft::new(KIND_PROFILE_METADATA, "{}"), &keys);
        event.verify().unwrap();
    }

    #[test]
    fn tampered_content_fails_verification() {
        let keys = KeyPair::generate();
        let mut event = sign(EventDraft::new(1, "original"), &keys);
        event.content = "edited".into();
        assert!(event.verify().is_err());
    }

    #[test]
    fn forged_author_fails_verification() {
        let keys = KeyPair::generate();
        let other = KeyPair::generate();
        let mut event = sign(EventDraft::new(1, "note"), &keys);
        event.pubkey = other.public_key_hex();
        assert!(event.verify().is_err());
    }

    #[test]
    fn wire_shape_roundtrips() {
        let keys = KeyPair::generate();
        let event = sign(
            EventDraft::new(1, "serde me").with_tag(vec!["t".into(), "test".into()]),
            &keys,
        );

        let json = serde_json::to_string(&event).unwrap();
        let back: SignedEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        back.verify().unwrap();
    }
}
