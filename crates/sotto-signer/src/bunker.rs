//! Remote bunker signer
//!
//! Delegates signing to a remote party reachable only through
//! relay-mediated messages. The relay handshake protocol is open work;
//! this backend is a deliberate explicit-failure stub with a real state
//! machine so callers can tell "not yet connected" from "will never work".

use parking_lot::RwLock;
use tracing::debug;
use url::Url;

use sotto_core::event::{EventDraft, SignedEvent};
use sotto_crypto::KeyPair;

use crate::error::{Result, SignerError};
use crate::Signer;

/// Connection lifecycle of the remote signer channel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No channel
    Disconnected,
    /// Handshake in progress
    Connecting,
    /// Handshake complete; operations are live
    Connected,
}

/// A parsed `bunker://` address
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BunkerAddress {
    /// The remote signer's public key, x-only hex
    pub remote_signer_public_key: String,
    /// Relays mediating the channel
    pub relays: Vec<String>,
    /// Optional connection secret
    pub secret: Option<String>,
}

impl BunkerAddress {
    /// Parse `bunker://<remote-pubkey>?relay=wss://...&secret=...`
    pub fn parse(uri: &str) -> Result<Self> {
        let url =
            Url::parse(uri).map_err(|e| SignerError::InvalidAddress(format!("not a URI: {e}")))?;
        if url.scheme() != "bunker" {
            return Err(SignerError::InvalidAddress(format!(
                "expected bunker scheme, got '{}'",
                url.scheme()
            )));
        }

        let remote_signer_public_key = url
            .host_str()
            .ok_or_else(|| SignerError::InvalidAddress("missing remote signer key".into()))?
            .to_lowercase();
        let decoded = hex::decode(&remote_signer_public_key)
            .map_err(|e| SignerError::InvalidAddress(format!("remote key not hex: {e}")))?;
        if decoded.len() != 32 {
            return Err(SignerError::InvalidAddress(format!(
                "remote key is {} bytes, expected 32",
                decoded.len()
            )));
        }

        let mut relays = Vec::new();
        let mut secret = None;
        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                "relay" => relays.push(value.into_owned()),
                "secret" => secret = Some(value.into_owned()),
                _ => {}
            }
        }
        if relays.is_empty() {
            return Err(SignerError::InvalidAddress(
                "at least one relay is required".into(),
            ));
        }

        Ok(Self {
            remote_signer_public_key,
            relays,
            secret,
        })
    }
}

/// Signer delegating to a remote bunker over relays
pub struct BunkerSigner {
    address: BunkerAddress,
    // channel identity for the eventual handshake; distinct from the
    // end-user identity key, which never exists on this device
    transport_keys: KeyPair,
    state: RwLock<ConnectionState>,
}

impl BunkerSigner {
    /// Create a signer for the given address
    ///
    /// Generates a fresh transport key pair for the handshake channel.
    pub fn new(address: BunkerAddress) -> Self {
        let transport_keys = KeyPair::generate();
        debug!(
            remote = %address.remote_signer_public_key,
            transport = %transport_keys.public_key_hex(),
            "bunker signer created"
        );
        Self {
            address,
            transport_keys,
            state: RwLock::new(ConnectionState::Disconnected),
        }
    }

    /// Parse a `bunker://` URI and create a signer for it
    pub fn from_uri(uri: &str) -> Result<Self> {
        Ok(Self::new(BunkerAddress::parse(uri)?))
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// The address this signer talks to
    pub fn address(&self) -> &BunkerAddress {
        &self.address
    }

    /// Public half of the transport key pair
    pub fn transport_public_key(&self) -> String {
        self.transport_keys.public_key_hex()
    }

    /// Drive the connection handshake
    ///
    /// The relay-mediated handshake protocol is not implemented yet; this
    /// transitions through `Connecting` and fails explicitly.
    pub async fn connect(&self) -> Result<()> {
        {
            let mut state = self.state.write();
            if *state == ConnectionState::Connected {
                return Ok(());
            }
            *state = ConnectionState::Connecting;
        }
        debug!(relays = ?self.address.relays, "remote signer handshake requested");

        *self.state.write() = ConnectionState::Disconnected;
        Err(SignerError::NotImplemented("remote signer handshake"))
    }
}

#[async_trait::async_trait]
impl Signer for BunkerSigner {
    async fn public_key(&self) -> Result<String> {
        match self.state() {
            // the remote user key would be learned during the handshake
            ConnectionState::Connected => Err(SignerError::NotImplemented(
                "remote signer get_public_key",
            )),
            _ => Err(SignerError::NotConnected),
        }
    }

    async fn sign_event(&self, _draft: EventDraft) -> Result<SignedEvent> {
        Err(SignerError::NotImplemented("remote signer sign_event"))
    }

    async fn encrypt(&self, _recipient: &str, _plaintext: &str) -> Result<String> {
        Err(SignerError::NotImplemented("remote signer encrypt"))
    }

    async fn decrypt(&self, _sender: &str, _ciphertext: &str) -> Result<String> {
        Err(SignerError::NotImplemented("remote signer decrypt"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REMOTE_KEY: &str = "7f3b2c1d4e5f6a7b8c9d0e1f2a3b4c5d6e7f8a9b0c1d2e3f4a5b6c7d8e9f0a1b";

    fn valid_uri() -> String {
        format!("bunker://{REMOTE_KEY}?relay=wss://relay.example.com&relay=wss://backup.example.com&secret=s3cret")
    }

    #[test]
    fn parses_full_address() {
        let address = BunkerAddress::parse(&valid_uri()).unwrap();
        assert_eq!(address.remote_signer_public_key, REMOTE_KEY);
        assert_eq!(
            address.relays,
            vec![
                "wss://relay.example.com".to_string(),
                "wss://backup.example.com".to_string()
            ]
        );
        assert_eq!(address.secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in [
            "",
            "not a uri",
            "https://example.com",
            "bunker://nothex?relay=wss://r.example",
            "bunker://abcd?relay=wss://r.example",
            &format!("bunker://{REMOTE_KEY}"),
        ] {
            assert!(
                matches!(
                    BunkerAddress::parse(bad),
                    Err(SignerError::InvalidAddress(_))
                ),
                "accepted: {bad}"
            );
        }
    }

    #[test]
    fn starts_disconnected_with_fresh_transport_keys() {
        let a = BunkerSigner::from_uri(&valid_uri()).unwrap();
        let b = BunkerSigner::from_uri(&valid_uri()).unwrap();

        assert_eq!(a.state(), ConnectionState::Disconnected);
        // transport keys are generated per instance, never shared, and are
        // not the remote identity
        assert_ne!(a.transport_public_key(), b.transport_public_key());
        assert_ne!(a.transport_public_key(), REMOTE_KEY);
    }

    #[tokio::test]
    async fn public_key_requires_connection() {
        let signer = BunkerSigner::from_uri(&valid_uri()).unwrap();
        assert!(matches!(
            signer.public_key().await,
            Err(SignerError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn operations_fail_explicitly() {
        let signer = BunkerSigner::from_uri(&valid_uri()).unwrap();

        assert!(matches!(
            signer.sign_event(EventDraft::new(1, "note")).await,
            Err(SignerError::NotImplemented(_))
        ));
        assert!(matches!(
            signer.encrypt("pk", "m").await,
            Err(SignerError::NotImplemented(_))
        ));
        assert!(matches!(
            signer.decrypt("pk", "c").await,
            Err(SignerError::NotImplemented(_))
        ));
    }

    #[tokio::test]
    async fn connect_fails_and_returns_to_disconnected() {
        let signer = BunkerSigner::from_uri(&valid_uri()).unwrap();

        let result = signer.connect().await;
        assert!(matches!(result, Err(SignerError::NotImplemented(_))));
        assert_eq!(signer.state(), ConnectionState::Disconnected);
    }
}
