//! NIP-44 v2 payload encryption (the modern scheme)
//!
//! Conversation key = HKDF-SHA256 extract over the ECDH shared x-coordinate
//! with salt `"nip44-v2"`. Each payload uses a fresh random 32-byte nonce,
//! ChaCha20 for the body, and HMAC-SHA256 over nonce plus ciphertext.
//! Payloads are `base64(version || nonce || ciphertext || mac)` with
//! version byte `0x02`.
//!
//! Identical plaintexts produce different ciphertexts call to call; the
//! only invariant callers may rely on is `decrypt(encrypt(m)) == m`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, Result};
use crate::keys::KeyPair;

/// Version byte of payloads this module produces and accepts
pub const VERSION: u8 = 2;

/// Minimum plaintext length in bytes
pub const MIN_PLAINTEXT_LEN: usize = 1;

/// Maximum plaintext length in bytes
pub const MAX_PLAINTEXT_LEN: usize = 65535;

const CONVERSATION_KEY_SALT: &[u8] = b"nip44-v2";
const NONCE_SIZE: usize = 32;
const MAC_SIZE: usize = 32;
const CHACHA_KEY_SIZE: usize = 32;
const CHACHA_NONCE_SIZE: usize = 12;

// version + nonce + minimal padded block + mac
const MIN_PAYLOAD_SIZE: usize = 1 + NONCE_SIZE + 34 + MAC_SIZE;
const MAX_PAYLOAD_SIZE: usize = 1 + NONCE_SIZE + 2 + MAX_PADDED_LEN + MAC_SIZE;
const MAX_PADDED_LEN: usize = 65536;

type HmacSha256 = Hmac<Sha256>;

/// Symmetric key material shared by two identities
///
/// Derived on demand from one party's secret and the counterpart's public
/// identity; recomputed per call, zeroized on drop, never logged.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ConversationKey([u8; 32]);

impl ConversationKey {
    /// Derive the conversation key between `local` and a counterpart
    ///
    /// Symmetric: either side derives the same key against the other's
    /// public identity.
    pub fn derive(local: &KeyPair, counterpart_public_hex: &str) -> Result<Self> {
        let shared = local.shared_secret_x(counterpart_public_hex)?;
        let (prk, _) = Hkdf::<Sha256>::extract(Some(CONVERSATION_KEY_SALT), shared.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(prk.as_slice());
        Ok(Self(key))
    }

    /// Wrap existing key bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Per-message keys expanded from the conversation key and nonce
#[derive(Zeroize, ZeroizeOnDrop)]
struct MessageKeys {
    chacha_key: [u8; CHACHA_KEY_SIZE],
    chacha_nonce: [u8; CHACHA_NONCE_SIZE],
    hmac_key: [u8; 32],
}

fn message_keys(key: &ConversationKey, nonce: &[u8; NONCE_SIZE]) -> Result<MessageKeys> {
    let hkdf = Hkdf::<Sha256>::from_prk(key.as_bytes())
        .map_err(|e| CryptoError::Encryption(format!("bad conversation key: {e}")))?;
    let mut okm = [0u8; CHACHA_KEY_SIZE + CHACHA_NONCE_SIZE + 32];
    hkdf.expand(nonce, &mut okm)
        .map_err(|e| CryptoError::Encryption(format!("HKDF expansion failed: {e}")))?;

    let mut keys = MessageKeys {
        chacha_key: [0u8; CHACHA_KEY_SIZE],
        chacha_nonce: [0u8; CHACHA_NONCE_SIZE],
        hmac_key: [0u8; 32],
    };
    keys.chacha_key.copy_from_slice(&okm[..CHACHA_KEY_SIZE]);
    keys.chacha_nonce
        .copy_from_slice(&okm[CHACHA_KEY_SIZE..CHACHA_KEY_SIZE + CHACHA_NONCE_SIZE]);
    keys.hmac_key
        .copy_from_slice(&okm[CHACHA_KEY_SIZE + CHACHA_NONCE_SIZE..]);
    okm.zeroize();
    Ok(keys)
}

/// Encrypt a plaintext under a conversation key
///
/// A fresh random nonce is drawn per call.
pub fn encrypt(key: &ConversationKey, plaintext: &str) -> Result<String> {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    encrypt_with_nonce(key, plaintext, &nonce)
}

pub(crate) fn encrypt_with_nonce(
    key: &ConversationKey,
    plaintext: &str,
    nonce: &[u8; NONCE_SIZE],
) -> Result<String> {
    let keys = message_keys(key, nonce)?;

    let mut buffer = pad(plaintext.as_bytes())?;
    let mut cipher = ChaCha20::new((&keys.chacha_key).into(), (&keys.chacha_nonce).into());
    cipher.apply_keystream(&mut buffer);

    let mac = hmac_with_aad(&keys.hmac_key, nonce, &buffer);

    let mut payload = Vec::with_capacity(1 + NONCE_SIZE + buffer.len() + MAC_SIZE);
    payload.push(VERSION);
    payload.extend_from_slice(nonce);
    payload.extend_from_slice(&buffer);
    payload.extend_from_slice(&mac);
    Ok(BASE64.encode(payload))
}

/// Decrypt a payload under a conversation key
///
/// Rejects unknown versions, malformed payloads, and MAC mismatches; MAC
/// comparison is constant-time.
pub fn decrypt(key: &ConversationKey, payload: &str) -> Result<String> {
    if payload.starts_with('#') {
        return Err(CryptoError::UnsupportedVersion(
            "non-base64 version flag".into(),
        ));
    }
    let data = BASE64
        .decode(payload)
        .map_err(|e| CryptoError::InvalidPayload(format!("not base64: {e}")))?;
    if data.len() < MIN_PAYLOAD_SIZE || data.len() > MAX_PAYLOAD_SIZE {
        return Err(CryptoError::InvalidPayload(format!(
            "payload size {} out of range",
            data.len()
        )));
    }
    if data[0] != VERSION {
        return Err(CryptoError::UnsupportedVersion(data[0].to_string()));
    }

    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(&data[1..1 + NONCE_SIZE]);
    let ciphertext = &data[1 + NONCE_SIZE..data.len() - MAC_SIZE];
    let mac = &data[data.len() - MAC_SIZE..];

    let keys = message_keys(key, &nonce)?;

    let mut verifier = HmacSha256::new_from_slice(&keys.hmac_key)
        .map_err(|e| CryptoError::Decryption(e.to_string()))?;
    verifier.update(&nonce);
    verifier.update(ciphertext);
    verifier
        .verify_slice(mac)
        .map_err(|_| CryptoError::MacMismatch)?;

    let mut buffer = ciphertext.to_vec();
    let mut cipher = ChaCha20::new((&keys.chacha_key).into(), (&keys.chacha_nonce).into());
    cipher.apply_keystream(&mut buffer);

    unpad(&buffer)
}

fn hmac_with_aad(hmac_key: &[u8; 32], aad: &[u8; NONCE_SIZE], message: &[u8]) -> [u8; MAC_SIZE] {
    let mut mac = HmacSha256::new_from_slice(hmac_key).expect("HMAC accepts any key size");
    mac.update(aad);
    mac.update(message);
    let mut out = [0u8; MAC_SIZE];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// Padded length for a plaintext: 32-byte floor, then power-of-two chunks
fn calc_padded_len(unpadded_len: usize) -> usize {
    if unpadded_len <= 32 {
        return 32;
    }
    let n = unpadded_len - 1;
    let next_power = if n.is_power_of_two() {
        n << 1
    } else {
        n.next_power_of_two()
    };
    let chunk = if next_power <= 256 { 32 } else { next_power / 8 };
    chunk * (n / chunk + 1)
}

fn pad(plaintext: &[u8]) -> Result<Vec<u8>> {
    let len = plaintext.len();
    if !(MIN_PLAINTEXT_LEN..=MAX_PLAINTEXT_LEN).contains(&len) {
        return Err(CryptoError::PlaintextLength { len });
    }
    let mut padded = vec![0u8; 2 + calc_padded_len(len)];
    padded[..2].copy_from_slice(&(len as u16).to_be_bytes());
    padded[2..2 + len].copy_from_slice(plaintext);
    Ok(padded)
}

fn unpad(padded: &[u8]) -> Result<String> {
    if padded.len() < 2 {
        return Err(CryptoError::InvalidPayload("truncated padding".into()));
    }
    let len = u16::from_be_bytes([padded[0], padded[1]]) as usize;
    if len < MIN_PLAINTEXT_LEN || padded.len() != 2 + calc_padded_len(len) {
        return Err(CryptoError::InvalidPayload("invalid padding".into()));
    }
    String::from_utf8(padded[2..2 + len].to_vec())
        .map_err(|e| CryptoError::InvalidPayload(format!("not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agreed_key() -> (KeyPair, KeyPair, ConversationKey) {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let key = ConversationKey::derive(&alice, &bob.public_key_hex()).unwrap();
        (alice, bob, key)
    }

    #[test]
    fn conversation_key_is_symmetric() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();

        let ab = ConversationKey::derive(&alice, &bob.public_key_hex()).unwrap();
        let ba = ConversationKey::derive(&bob, &alice.public_key_hex()).unwrap();
        assert_eq!(ab.as_bytes(), ba.as_bytes());
    }

    #[test]
    fn roundtrip() {
        let (_, _, key) = agreed_key();
        let plaintext = "hello from sotto";

        let payload = encrypt(&key, plaintext).unwrap();
        assert_eq!(decrypt(&key, &payload).unwrap(), plaintext);
    }

    #[test]
    fn roundtrip_across_both_directions() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let alice_key = ConversationKey::derive(&alice, &bob.public_key_hex()).unwrap();
        let bob_key = ConversationKey::derive(&bob, &alice.public_key_hex()).unwrap();

        let payload = encrypt(&alice_key, "direct message").unwrap();
        assert_eq!(decrypt(&bob_key, &payload).unwrap(), "direct message");
    }

    #[test]
    fn fresh_nonce_per_call() {
        // same plaintext, two payloads; both must decrypt, and we assert
        // nothing about their ciphertexts beyond that
        let (_, _, key) = agreed_key();
        let a = encrypt(&key, "same message").unwrap();
        let b = encrypt(&key, "same message").unwrap();
        assert_eq!(decrypt(&key, &a).unwrap(), "same message");
        assert_eq!(decrypt(&key, &b).unwrap(), "same message");
    }

    #[test]
    fn tampered_payload_rejected() {
        let (_, _, key) = agreed_key();
        let payload = encrypt(&key, "integrity matters").unwrap();

        let mut raw = BASE64.decode(&payload).unwrap();
        let mid = raw.len() / 2;
        raw[mid] ^= 0x01;
        let tampered = BASE64.encode(raw);

        assert!(matches!(
            decrypt(&key, &tampered),
            Err(CryptoError::MacMismatch) | Err(CryptoError::InvalidPayload(_))
        ));
    }

    #[test]
    fn wrong_key_rejected() {
        let (_, _, key) = agreed_key();
        let (_, _, other) = agreed_key();
        let payload = encrypt(&key, "secret").unwrap();
        assert_eq!(decrypt(&other, &payload), Err(CryptoError::MacMismatch));
    }

    #[test]
    fn unknown_version_rejected() {
        let (_, _, key) = agreed_key();
        let payload = encrypt(&key, "versioned").unwrap();

        let mut raw = BASE64.decode(&payload).unwrap();
        raw[0] = 0x01;
        let downgraded = BASE64.encode(raw);

        assert!(matches!(
            decrypt(&key, &downgraded),
            Err(CryptoError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn future_format_flag_rejected() {
        let (_, _, key) = agreed_key();
        assert!(matches!(
            decrypt(&key, "#v3-payload"),
            Err(CryptoError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn garbage_payload_rejected() {
        let (_, _, key) = agreed_key();
        assert!(decrypt(&key, "not base64 at all!!").is_err());
        assert!(decrypt(&key, "").is_err());
        assert!(decrypt(&key, &BASE64.encode([2u8; 10])).is_err());
    }

    #[test]
    fn empty_and_oversized_plaintexts_rejected() {
        let (_, _, key) = agreed_key();
        assert_eq!(
            encrypt(&key, ""),
            Err(CryptoError::PlaintextLength { len: 0 })
        );
        let huge = "x".repeat(MAX_PLAINTEXT_LEN + 1);
        assert!(matches!(
            encrypt(&key, &huge),
            Err(CryptoError::PlaintextLength { .. })
        ));
    }

    #[test]
    fn boundary_plaintext_lengths_roundtrip() {
        let (_, _, key) = agreed_key();
        for len in [1usize, 31, 32, 33, 255, 256, 257, 65535] {
            let plaintext = "a".repeat(len);
            let payload = encrypt(&key, &plaintext).unwrap();
            assert_eq!(decrypt(&key, &payload).unwrap(), plaintext, "len {len}");
        }
    }

    #[test]
    fn padded_len_matches_reference_table() {
        // reference values from the NIP-44 specification
        for (unpadded, padded) in [
            (1usize, 32usize),
            (16, 32),
            (32, 32),
            (33, 64),
            (37, 64),
            (45, 64),
            (64, 64),
            (65, 96),
            (100, 128),
            (111, 128),
            (200, 224),
            (250, 256),
            (320, 320),
            (383, 384),
            (384, 384),
            (400, 448),
            (500, 512),
            (512, 512),
            (515, 640),
            (700, 768),
            (800, 896),
            (1020, 1024),
            (65536 - 255, 65536),
        ] {
            assert_eq!(calc_padded_len(unpadded), padded, "unpadded {unpadded}");
        }
    }

    #[test]
    fn deterministic_given_fixed_nonce() {
        let key = ConversationKey::from_bytes([7u8; 32]);
        let nonce = [9u8; NONCE_SIZE];
        let a = encrypt_with_nonce(&key, "stable", &nonce).unwrap();
        let b = encrypt_with_nonce(&key, "stable", &nonce).unwrap();
        assert_eq!(a, b);
        assert_eq!(decrypt(&key, &a).unwrap(), "stable");
    }
}
