//! Key types with secure memory handling.
//!
//! All key types automatically zeroize their memory on drop to prevent
//! sensitive data from persisting in memory.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::aead::{rand_core::RngCore, OsRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use strongbox_common::{Error, Passphrase, Result};

/// Length of derived encryption keys in bytes (256-bit).
pub const KEY_LENGTH: usize = 32;

/// Length of key derivation salts in bytes.
pub const SALT_LENGTH: usize = 32;

/// Key material for the active session.
///
/// For the legacy scheme this is the passphrase's own bytes, used as the
/// repeating keystream. For the sealed scheme it is the Argon2id output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    key: Vec<u8>,
}

impl SessionKey {
    /// Use the passphrase bytes directly as key material.
    ///
    /// # Errors
    /// - Returns error if the passphrase is empty
    pub fn from_passphrase(passphrase: &Passphrase) -> Result<Self> {
        if passphrase.is_empty() {
            return Err(Error::Crypto("Passphrase cannot be empty".to_string()));
        }
        Ok(Self {
            key: passphrase.as_bytes().to_vec(),
        })
    }

    /// Wrap a derived key.
    pub fn from_derived(key: [u8; KEY_LENGTH]) -> Self {
        let mut key = key;
        let session = Self { key: key.to_vec() };
        key.zeroize();
        session
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    /// Get the key length in bytes.
    pub fn len(&self) -> usize {
        self.key.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey([REDACTED])")
    }
}

/// Salt for key derivation. Serialized as base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Salt([u8; SALT_LENGTH]);

impl Salt {
    /// Generate a random salt.
    pub fn generate() -> Self {
        let mut salt = [0u8; SALT_LENGTH];
        OsRng.fill_bytes(&mut salt);
        Self(salt)
    }

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; SALT_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_LENGTH] {
        &self.0
    }
}

impl From<Salt> for String {
    fn from(salt: Salt) -> Self {
        STANDARD.encode(salt.0)
    }
}

impl TryFrom<String> for Salt {
    type Error = Error;

    fn try_from(encoded: String) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| Error::Serialization(format!("Invalid salt encoding: {}", e)))?;
        let bytes: [u8; SALT_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
            Error::Serialization(format!(
                "Invalid salt length: expected {}, got {}",
                SALT_LENGTH,
                b.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_from_passphrase() {
        let key = SessionKey::from_passphrase(&Passphrase::new("secret123")).unwrap();
        assert_eq!(key.as_bytes(), b"secret123");
    }

    #[test]
    fn test_session_key_empty_passphrase_fails() {
        assert!(SessionKey::from_passphrase(&Passphrase::new("")).is_err());
    }

    #[test]
    fn test_salt_generate() {
        let salt1 = Salt::generate();
        let salt2 = Salt::generate();

        // Random salts should be different
        assert_ne!(salt1.as_bytes(), salt2.as_bytes());
    }

    #[test]
    fn test_salt_serializes_as_base64() {
        let salt = Salt::from_bytes([7u8; SALT_LENGTH]);
        let json = serde_json::to_string(&salt).unwrap();
        assert!(json.starts_with('"'));

        let restored: Salt = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, salt);
    }

    #[test]
    fn test_salt_wrong_length_rejected() {
        let result: std::result::Result<Salt, _> = serde_json::from_str("\"AAAA\"");
        assert!(result.is_err());
    }
}
