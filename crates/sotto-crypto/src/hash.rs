//! Hashing helpers

use sha2::{Digest, Sha256};

/// SHA-256 of the input bytes
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let digest = Sha256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        // SHA-256("abc")
        let digest = sha256(b"abc");
        assert_eq!(
            hex::encode(digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha256_is_deterministic() {
        assert_eq!(sha256(b"sotto"), sha256(b"sotto"));
        assert_ne!(sha256(b"sotto"), sha256(b"sotto "));
    }
}
