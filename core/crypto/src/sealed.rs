//! Authenticated encryption using XChaCha20-Poly1305.
//!
//! XChaCha20-Poly1305 provides both confidentiality and authenticity,
//! with a 24-byte nonce that is safe for random generation. Envelopes are
//! `base64(nonce || ciphertext || tag)`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{
    aead::{generic_array::GenericArray, Aead, AeadCore, KeyInit, OsRng},
    XChaCha20Poly1305,
};

use crate::engine::{CipherEngine, CipherScheme};
use crate::keys::{SessionKey, KEY_LENGTH};
use strongbox_common::{Error, Plaintext, Result};

/// Nonce size for XChaCha20-Poly1305 (24 bytes).
pub const NONCE_SIZE: usize = 24;

/// Authentication tag size (16 bytes).
pub const TAG_SIZE: usize = 16;

fn cipher_for(key: &SessionKey) -> Result<XChaCha20Poly1305> {
    if key.len() != KEY_LENGTH {
        return Err(Error::Crypto(format!(
            "Invalid key length: expected {}, got {}",
            KEY_LENGTH,
            key.len()
        )));
    }
    Ok(XChaCha20Poly1305::new(GenericArray::from_slice(key.as_bytes())))
}

/// Encrypt plaintext, returning `nonce || ciphertext || tag`.
///
/// # Errors
/// - Returns error if key length is incorrect
/// - Returns error if encryption fails
pub fn seal(key: &SessionKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = cipher_for(key)?;
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| Error::Crypto(format!("Encryption failed: {}", e)))?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce);
    result.extend_from_slice(&ciphertext);

    Ok(result)
}

/// Authenticate and decrypt `nonce || ciphertext || tag`.
///
/// # Errors
/// - Returns error if key length is incorrect
/// - Returns `DecryptFailure` if the data is too short or fails authentication
pub fn open(key: &SessionKey, sealed: &[u8]) -> Result<Vec<u8>> {
    let cipher = cipher_for(key)?;

    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(Error::DecryptFailure("Ciphertext too short".to_string()));
    }

    let (nonce_bytes, encrypted) = sealed.split_at(NONCE_SIZE);
    let nonce = GenericArray::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, encrypted)
        .map_err(|_| Error::DecryptFailure("Authentication failed".to_string()))
}

/// Stateless authenticated cipher for sealed vaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct SealedCipher;

impl CipherEngine for SealedCipher {
    fn scheme(&self) -> CipherScheme {
        CipherScheme::Sealed
    }

    fn encrypt(&self, plaintext: &[u8], key: &SessionKey) -> Result<String> {
        Ok(STANDARD.encode(seal(key, plaintext)?))
    }

    fn decrypt(&self, envelope: &str, key: &SessionKey) -> Result<Plaintext> {
        let sealed = STANDARD
            .decode(envelope.as_bytes())
            .map_err(|e| Error::DecryptFailure(format!("Malformed envelope: {}", e)))?;
        Ok(Plaintext::new(open(key, &sealed)?))
    }
}
