//! Key types for the sotto protocol
//!
//! Identity and transport keys are secp256k1 key pairs. Public keys use the
//! x-only form (32 bytes, hex on the wire) and signatures are BIP-340
//! Schnorr. The same key pair also performs ECDH for payload encryption.

use k256::ecdh;
use k256::schnorr::signature::SignatureEncoding;
use k256::schnorr::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, Result};

/// Size of an x-only public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of a secret key in bytes
pub const SECRET_KEY_SIZE: usize = 32;

/// Size of a Schnorr signature in bytes
pub const SIGNATURE_SIZE: usize = 64;

/// A secp256k1 key pair
///
/// The secret scalar lives only in process memory; [`SigningKey`] zeroizes
/// it on drop. The x-only public key is derived once at construction.
pub struct KeyPair {
    signing: SigningKey,
    public_key: [u8; PUBLIC_KEY_SIZE],
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let signing = SigningKey::random(&mut OsRng);
        let public_key = x_only_bytes(signing.verifying_key());
        Self {
            signing,
            public_key,
        }
    }

    /// Create from existing secret key bytes
    ///
    /// Fails if the bytes are not a valid non-zero scalar.
    pub fn from_secret_bytes(bytes: &[u8; SECRET_KEY_SIZE]) -> Result<Self> {
        let signing = SigningKey::from_bytes(bytes)
            .map_err(|e| CryptoError::InvalidSecretKey(e.to_string()))?;
        let public_key = x_only_bytes(signing.verifying_key());
        Ok(Self {
            signing,
            public_key,
        })
    }

    /// Get the secret key bytes
    ///
    /// Only for handing the key back to its owner (e.g. re-encoding as an
    /// `nsec`); the result must never be persisted by this crate's callers.
    pub fn secret_bytes(&self) -> [u8; SECRET_KEY_SIZE] {
        self.signing.to_bytes().into()
    }

    /// Get the x-only public key bytes
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.public_key
    }

    /// Get the x-only public key as lowercase hex
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key)
    }

    /// Sign a 32-byte digest with BIP-340 Schnorr
    ///
    /// Aux randomness is fixed to zero, so the same digest and key always
    /// produce the same signature.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<[u8; SIGNATURE_SIZE]> {
        let signature = self
            .signing
            .sign_raw(digest, &[0u8; 32])
            .map_err(|e| CryptoError::Signing(e.to_string()))?;
        Ok(signature.to_bytes())
    }

    /// ECDH against a counterpart's x-only public key
    ///
    /// Returns only the x-coordinate of the shared point, which is what
    /// both payload encryption schemes key from.
    pub fn shared_secret_x(&self, counterpart_hex: &str) -> Result<SharedSecretX> {
        let point = lift_x_only(counterpart_hex)?;
        let secret_bytes = self.signing.to_bytes();
        let secret = k256::SecretKey::from_slice(secret_bytes.as_slice())
            .map_err(|e| CryptoError::InvalidSecretKey(e.to_string()))?;
        let shared = ecdh::diffie_hellman(secret.to_nonzero_scalar(), point.as_affine());
        let mut x = [0u8; 32];
        x.copy_from_slice(shared.raw_secret_bytes().as_slice());
        Ok(SharedSecretX(x))
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        Self {
            signing: self.signing.clone(),
            public_key: self.public_key,
        }
    }
}

impl std::fmt::Debug for KeyPair {
    // secret never appears in debug output
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// The x-coordinate of an ECDH shared point, zeroized on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecretX([u8; 32]);

impl SharedSecretX {
    /// Get the shared secret bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Verify a BIP-340 Schnorr signature over a 32-byte digest
pub fn verify_digest(
    public_key_hex: &str,
    digest: &[u8; 32],
    signature: &[u8; SIGNATURE_SIZE],
) -> Result<()> {
    let key_bytes = parse_x_only(public_key_hex)?;
    let verifying = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
    let signature =
        Signature::try_from(signature.as_slice()).map_err(|_| CryptoError::InvalidSignature)?;
    verifying
        .verify_raw(digest, &signature)
        .map_err(|_| CryptoError::InvalidSignature)
}

/// Parse a 64-char hex string into x-only public key bytes
pub fn parse_x_only(public_key_hex: &str) -> Result<[u8; PUBLIC_KEY_SIZE]> {
    let bytes = hex::decode(public_key_hex)
        .map_err(|e| CryptoError::InvalidPublicKey(format!("not hex: {e}")))?;
    if bytes.len() != PUBLIC_KEY_SIZE {
        return Err(CryptoError::InvalidPublicKey(format!(
            "expected {PUBLIC_KEY_SIZE} bytes, got {}",
            bytes.len()
        )));
    }
    let mut out = [0u8; PUBLIC_KEY_SIZE];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Lift an x-only public key to the curve point with even Y
fn lift_x_only(public_key_hex: &str) -> Result<k256::PublicKey> {
    let x = parse_x_only(public_key_hex)?;
    let mut sec1 = [0u8; 33];
    sec1[0] = 0x02;
    sec1[1..].copy_from_slice(&x);
    k256::PublicKey::from_sec1_bytes(&sec1)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

fn x_only_bytes(verifying: &VerifyingKey) -> [u8; PUBLIC_KEY_SIZE] {
    let mut out = [0u8; PUBLIC_KEY_SIZE];
    out.copy_from_slice(verifying.to_bytes().as_slice());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keypairs_differ() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        assert_ne!(a.public_key_bytes(), b.public_key_bytes());
    }

    #[test]
    fn secret_roundtrip_preserves_public_key() {
        let a = KeyPair::generate();
        let b = KeyPair::from_secret_bytes(&a.secret_bytes()).unwrap();
        assert_eq!(a.public_key_hex(), b.public_key_hex());
    }

    #[test]
    fn zero_secret_rejected() {
        let result = KeyPair::from_secret_bytes(&[0u8; 32]);
        assert!(matches!(result, Err(CryptoError::InvalidSecretKey(_))));
    }

    #[test]
    fn sign_and_verify() {
        let keys = KeyPair::generate();
        let digest = crate::hash::sha256(b"payload");

        let signature = keys.sign_digest(&digest).unwrap();
        verify_digest(&keys.public_key_hex(), &digest, &signature).unwrap();
    }

    #[test]
    fn signing_is_deterministic() {
        let keys = KeyPair::generate();
        let digest = crate::hash::sha256(b"payload");

        let a = keys.sign_digest(&digest).unwrap();
        let b = keys.sign_digest(&digest).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn tampered_digest_fails_verification() {
        let keys = KeyPair::generate();
        let digest = crate::hash::sha256(b"payload");
        let signature = keys.sign_digest(&digest).unwrap();

        let other = crate::hash::sha256(b"other payload");
        let result = verify_digest(&keys.public_key_hex(), &other, &signature);
        assert_eq!(result, Err(CryptoError::InvalidSignature));
    }

    #[test]
    fn ecdh_is_symmetric() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();

        let ab = alice.shared_secret_x(&bob.public_key_hex()).unwrap();
        let ba = bob.shared_secret_x(&alice.public_key_hex()).unwrap();
        assert_eq!(ab.as_bytes(), ba.as_bytes());
    }

    #[test]
    fn malformed_counterpart_key_rejected() {
        let keys = KeyPair::generate();
        assert!(keys.shared_secret_x("not-hex").is_err());
        assert!(keys.shared_secret_x("abcd").is_err());
    }
}
