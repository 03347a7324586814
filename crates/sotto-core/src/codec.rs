//! Bech32 key codec
//!
//! The protocol references participants by checksummed, human-readable
//! encodings of their keys: `npub` for public keys and `nsec` for secret
//! keys, both carrying a 32-byte payload. The type tag is load-bearing;
//! decoding enforces it so an `nsec` can never be mistaken for an `npub`.

use bech32::{FromBase32, ToBase32, Variant};

use crate::error::{CoreError, Result};

/// Human-readable prefix for public keys
pub const NPUB_HRP: &str = "npub";

/// Human-readable prefix for secret keys
pub const NSEC_HRP: &str = "nsec";

/// Encode a public key as an `npub` string
pub fn npub_encode(public_key: &[u8; 32]) -> Result<String> {
    encode_with_hrp(NPUB_HRP, public_key)
}

/// Decode an `npub` string into public key bytes
pub fn npub_decode(encoded: &str) -> Result<[u8; 32]> {
    decode_with_hrp(NPUB_HRP, encoded)
}

/// Encode a secret key as an `nsec` string
pub fn nsec_encode(secret_key: &[u8; 32]) -> Result<String> {
    encode_with_hrp(NSEC_HRP, secret_key)
}

/// Decode an `nsec` string into secret key bytes
pub fn nsec_decode(encoded: &str) -> Result<[u8; 32]> {
    decode_with_hrp(NSEC_HRP, encoded)
}

/// Shorten an `npub` for display: `npub1abcdefg...uvwxyz`
///
/// Strings of 20 characters or fewer come back unchanged.
pub fn shorten_npub(npub: &str) -> String {
    if npub.len() > 20 {
        format!("{}...{}", &npub[..12], &npub[npub.len() - 6..])
    } else {
        npub.to_string()
    }
}

fn encode_with_hrp(hrp: &str, payload: &[u8; 32]) -> Result<String> {
    bech32::encode(hrp, payload.to_base32(), Variant::Bech32)
        .map_err(|e| CoreError::Codec(format!("bech32 encoding failed: {e}")))
}

fn decode_with_hrp(expected_hrp: &str, encoded: &str) -> Result<[u8; 32]> {
    let (hrp, data, variant) = bech32::decode(encoded)
        .map_err(|e| CoreError::Codec(format!("bech32 decoding failed: {e}")))?;
    if variant != Variant::Bech32 {
        return Err(CoreError::Codec("wrong bech32 variant".into()));
    }
    if hrp != expected_hrp {
        return Err(CoreError::Codec(format!(
            "expected '{expected_hrp}' entity, got '{hrp}'"
        )));
    }

    let bytes = Vec::<u8>::from_base32(&data)
        .map_err(|e| CoreError::Codec(format!("bech32 payload conversion failed: {e}")))?;
    if bytes.len() != 32 {
        return Err(CoreError::Codec(format!(
            "expected 32-byte payload, got {}",
            bytes.len()
        )));
    }

    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}
