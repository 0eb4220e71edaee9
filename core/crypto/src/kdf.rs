//! Key derivation using Argon2id.
//!
//! Only sealed vaults derive keys. Argon2id is memory-hard, which makes
//! offline guessing against a stolen record expensive.

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::keys::{Salt, SessionKey, KEY_LENGTH};
use strongbox_common::{Error, Passphrase, Result};

/// Parameters for Argon2id key derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KdfParams {
    /// Memory cost in KiB (e.g., 65536 = 64 MiB).
    pub memory_cost: u32,
    /// Number of iterations.
    pub time_cost: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl KdfParams {
    /// Create parameters suitable for interactive use.
    ///
    /// Targets roughly half a second of derivation time on a laptop.
    pub fn interactive() -> Self {
        Self {
            memory_cost: 65536, // 64 MiB
            time_cost: 3,
            parallelism: 4,
        }
    }

    /// Create moderate parameters for constrained devices.
    pub fn moderate() -> Self {
        Self {
            memory_cost: 32768, // 32 MiB
            time_cost: 3,
            parallelism: 2,
        }
    }

    /// Smallest parameters Argon2 accepts. Tests only.
    pub fn minimal() -> Self {
        Self {
            memory_cost: 8,
            time_cost: 1,
            parallelism: 1,
        }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::interactive()
    }
}

/// Derive a session key from a passphrase and salt using Argon2id.
///
/// # Postconditions
/// - The derived key is deterministic given the same inputs
///
/// # Errors
/// - Returns error if passphrase is empty
/// - Returns error if Argon2id parameters are invalid
pub fn derive_key(passphrase: &Passphrase, salt: &Salt, params: &KdfParams) -> Result<SessionKey> {
    if passphrase.is_empty() {
        return Err(Error::Crypto("Passphrase cannot be empty".to_string()));
    }

    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(KEY_LENGTH),
    )
    .map_err(|e| Error::Crypto(format!("Invalid KDF parameters: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key_bytes = [0u8; KEY_LENGTH];
    let derived = argon2.hash_password_into(passphrase.as_bytes(), salt.as_bytes(), &mut key_bytes);
    if let Err(e) = derived {
        key_bytes.zeroize();
        return Err(Error::Crypto(format!("Key derivation failed: {}", e)));
    }

    Ok(SessionKey::from_derived(key_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_deterministic() {
        let passphrase = Passphrase::new("test-password-123");
        let salt = Salt::from_bytes([42u8; 32]);
        let params = KdfParams::minimal();

        let key1 = derive_key(&passphrase, &salt, &params).unwrap();
        let key2 = derive_key(&passphrase, &salt, &params).unwrap();

        assert_eq!(key1.as_bytes(), key2.as_bytes());
        assert_eq!(key1.len(), KEY_LENGTH);
    }

    #[test]
    fn test_derive_key_different_salt() {
        let passphrase = Passphrase::new("test-password-123");
        let params = KdfParams::minimal();

        let key1 = derive_key(&passphrase, &Salt::from_bytes([1u8; 32]), &params).unwrap();
        let key2 = derive_key(&passphrase, &Salt::from_bytes([2u8; 32]), &params).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_password() {
        let salt = Salt::from_bytes([42u8; 32]);
        let params = KdfParams::minimal();

        let key1 = derive_key(&Passphrase::new("password1"), &salt, &params).unwrap();
        let key2 = derive_key(&Passphrase::new("password2"), &salt, &params).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_empty_password_fails() {
        let salt = Salt::generate();
        assert!(derive_key(&Passphrase::new(""), &salt, &KdfParams::minimal()).is_err());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = KdfParams {
            memory_cost: 0,
            time_cost: 0,
            parallelism: 0,
        };
        let result = derive_key(&Passphrase::new("password"), &Salt::generate(), &params);
        assert!(matches!(result, Err(Error::Crypto(_))));
    }
}
