//! Legacy passphrase-keyed stream cipher.
//!
//! The keystream is the passphrase's bytes repeated to the plaintext length,
//! XORed byte for byte, and wrapped in padded standard base64 so the
//! envelope embeds cleanly in the JSON record.
//!
//! There is no integrity tag. A wrong passphrase decrypts "successfully" to
//! bytes of the original length; only a malformed envelope is an error.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::engine::{CipherEngine, CipherScheme};
use crate::keys::SessionKey;
use strongbox_common::{Error, Plaintext, Result};

/// XOR the repeating key over `data` in place.
fn apply_keystream(data: &mut [u8], key: &[u8]) {
    for (byte, k) in data.iter_mut().zip(key.iter().cycle()) {
        *byte ^= k;
    }
}

/// Stateless legacy cipher.
#[derive(Debug, Default, Clone, Copy)]
pub struct XorCipher;

impl CipherEngine for XorCipher {
    fn scheme(&self) -> CipherScheme {
        CipherScheme::Legacy
    }

    fn encrypt(&self, plaintext: &[u8], key: &SessionKey) -> Result<String> {
        if key.is_empty() {
            return Err(Error::Crypto("Key cannot be empty".to_string()));
        }

        let mut buffer = plaintext.to_vec();
        apply_keystream(&mut buffer, key.as_bytes());
        Ok(STANDARD.encode(&buffer))
    }

    fn decrypt(&self, envelope: &str, key: &SessionKey) -> Result<Plaintext> {
        if key.is_empty() {
            return Err(Error::Crypto("Key cannot be empty".to_string()));
        }

        let mut buffer = STANDARD
            .decode(envelope.as_bytes())
            .map_err(|e| Error::DecryptFailure(format!("Malformed envelope: {}", e)))?;
        apply_keystream(&mut buffer, key.as_bytes());
        Ok(Plaintext::new(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use strongbox_common::Passphrase;

    fn key(passphrase: &str) -> SessionKey {
        SessionKey::from_passphrase(&Passphrase::new(passphrase)).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let k = key("secret123");
        let envelope = XorCipher.encrypt(b"ABC123", &k).unwrap();

        assert_ne!(envelope, "ABC123");
        assert_eq!(XorCipher.decrypt(&envelope, &k).unwrap().as_bytes(), b"ABC123");
    }

    #[test]
    fn test_known_vector() {
        // 'A' ^ 'k' = 0x2a, 'B' ^ 'k' = 0x29
        let envelope = XorCipher.encrypt(b"AB", &key("k")).unwrap();
        assert_eq!(envelope, STANDARD.encode([0x2a, 0x29]));
    }

    #[test]
    fn test_wrong_key_returns_same_length_garbage() {
        let envelope = XorCipher.encrypt(b"ABC123", &key("secret123")).unwrap();
        let revealed = XorCipher.decrypt(&envelope, &key("wrongpass")).unwrap();

        assert_eq!(revealed.len(), 6);
        assert_ne!(revealed.as_bytes(), b"ABC123");
    }

    #[test]
    fn test_malformed_envelope_fails() {
        let result = XorCipher.decrypt("not base64!!", &key("secret123"));
        assert!(matches!(result, Err(Error::DecryptFailure(_))));
    }

    #[test]
    fn test_empty_plaintext() {
        let k = key("secret123");
        let envelope = XorCipher.encrypt(b"", &k).unwrap();
        assert!(XorCipher.decrypt(&envelope, &k).unwrap().is_empty());
    }

    #[test]
    fn test_short_key_repeats() {
        let k = key("x");
        let envelope = XorCipher.encrypt(b"xxxx", &k).unwrap();
        assert_eq!(envelope, STANDARD.encode([0u8; 4]));
    }

    proptest! {
        #[test]
        fn prop_roundtrip(plaintext in ".*", passphrase in ".+") {
            let k = key(&passphrase);
            let envelope = XorCipher.encrypt(plaintext.as_bytes(), &k).unwrap();
            let revealed = XorCipher.decrypt(&envelope, &k).unwrap();
            prop_assert_eq!(revealed.as_bytes(), plaintext.as_bytes());
        }

        #[test]
        fn prop_wrong_key_never_errors(
            plaintext in "[a-zA-Z0-9]{1,64}",
            first in "[a-m][a-z]{7,15}",
            second in "[n-z][a-z]{7,15}",
        ) {
            let envelope = XorCipher.encrypt(plaintext.as_bytes(), &key(&first)).unwrap();
            let revealed = XorCipher.decrypt(&envelope, &key(&second)).unwrap();
            prop_assert_eq!(revealed.len(), plaintext.len());
            prop_assert_ne!(revealed.as_bytes(), plaintext.as_bytes());
        }
    }
}
