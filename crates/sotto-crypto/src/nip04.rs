//! NIP-04 payload encryption (the legacy scheme)
//!
//! AES-256-CBC keyed directly with the ECDH shared x-coordinate, random
//! 16-byte IV, payload `base64(ciphertext) + "?iv=" + base64(iv)`. Not
//! authenticated; kept only so old direct-message history stays readable.
//! New payloads should use [`crate::nip44`].

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;

use crate::error::{CryptoError, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const IV_SIZE: usize = 16;

/// Encrypt a plaintext under the raw shared secret
pub fn encrypt(shared_x: &[u8; 32], plaintext: &str) -> Result<String> {
    let mut iv = [0u8; IV_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let cipher = Aes256CbcEnc::new(shared_x.into(), (&iv).into());
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    Ok(format!(
        "{}?iv={}",
        BASE64.encode(ciphertext),
        BASE64.encode(iv)
    ))
}

/// Decrypt a `ciphertext?iv=...` payload under the raw shared secret
pub fn decrypt(shared_x: &[u8; 32], payload: &str) -> Result<String> {
    let (ciphertext_b64, iv_b64) = payload
        .split_once("?iv=")
        .ok_or_else(|| CryptoError::InvalidPayload("missing iv separator".into()))?;

    let ciphertext = BASE64
        .decode(ciphertext_b64)
        .map_err(|e| CryptoError::InvalidPayload(format!("ciphertext not base64: {e}")))?;
    let iv = BASE64
        .decode(iv_b64)
        .map_err(|e| CryptoError::InvalidPayload(format!("iv not base64: {e}")))?;
    if iv.len() != IV_SIZE {
        return Err(CryptoError::InvalidPayload(format!(
            "iv length {} != {IV_SIZE}",
            iv.len()
        )));
    }

    let iv_bytes: [u8; IV_SIZE] = iv.try_into().expect("length checked above");
    let cipher = Aes256CbcDec::new(shared_x.into(), (&iv_bytes).into());
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| CryptoError::Decryption("bad block padding".into()))?;

    String::from_utf8(plaintext)
        .map_err(|e| CryptoError::InvalidPayload(format!("not UTF-8: {e}")))
}
