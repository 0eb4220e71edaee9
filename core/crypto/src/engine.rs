//! Cipher engine seam and scheme selection.
//!
//! A vault record without `keying` uses the legacy XOR scheme; one with
//! `keying` uses the sealed scheme and carries everything needed to
//! re-derive and verify the key.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::kdf::{derive_key, KdfParams};
use crate::keys::{Salt, SessionKey};
use crate::sealed::{self, SealedCipher};
use crate::xor::XorCipher;
use strongbox_common::{Error, Passphrase, Plaintext, Result};

/// Known plaintext sealed under the derived key to verify passphrases.
const VERIFICATION_PLAINTEXT: &[u8] = b"STRONGBOX_KEY_VERIFICATION_V1";

/// Which cipher protects a vault's item payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CipherScheme {
    /// Repeating-passphrase XOR, no integrity, no passphrase verification.
    #[default]
    Legacy,
    /// Argon2id-derived key with XChaCha20-Poly1305 and a stored verifier.
    Sealed,
}

/// Stateless passphrase-keyed transform over item content.
pub trait CipherEngine: Send + Sync {
    /// The scheme this engine implements.
    fn scheme(&self) -> CipherScheme;

    /// Encrypt content into a printable envelope.
    fn encrypt(&self, plaintext: &[u8], key: &SessionKey) -> Result<String>;

    /// Decode and decrypt an envelope.
    ///
    /// # Errors
    /// - `DecryptFailure` for a malformed envelope (and, for the sealed
    ///   scheme, a failed authentication)
    fn decrypt(&self, envelope: &str, key: &SessionKey) -> Result<Plaintext>;
}

/// Key derivation inputs and passphrase verifier for sealed vaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keying {
    /// Salt for key derivation.
    pub salt: Salt,
    /// KDF parameters.
    pub kdf_params: KdfParams,
    /// Base64 envelope of the verification constant.
    pub verifier: String,
}

impl Keying {
    /// Create keying material for a new sealed vault.
    ///
    /// Returns the keying to persist and the session key for the new session.
    pub fn create(passphrase: &Passphrase, kdf_params: KdfParams) -> Result<(Self, SessionKey)> {
        let salt = Salt::generate();
        let key = derive_key(passphrase, &salt, &kdf_params)?;
        let verifier = STANDARD.encode(sealed::seal(&key, VERIFICATION_PLAINTEXT)?);

        Ok((
            Self {
                salt,
                kdf_params,
                verifier,
            },
            key,
        ))
    }

    /// Derive the session key and check it against the verifier.
    ///
    /// # Errors
    /// - `WrongPassphrase` if the derived key does not open the verifier
    pub fn open(&self, passphrase: &Passphrase) -> Result<SessionKey> {
        let key = derive_key(passphrase, &self.salt, &self.kdf_params)?;
        let verifier = STANDARD
            .decode(self.verifier.as_bytes())
            .map_err(|e| Error::Serialization(format!("Invalid verifier encoding: {}", e)))?;

        match sealed::open(&key, &verifier) {
            Ok(plaintext) if bool::from(plaintext.ct_eq(VERIFICATION_PLAINTEXT)) => Ok(key),
            _ => Err(Error::WrongPassphrase),
        }
    }
}

static XOR: XorCipher = XorCipher;
static SEALED: SealedCipher = SealedCipher;

/// Pick the engine for a record's keying.
pub fn engine_for(keying: Option<&Keying>) -> &'static dyn CipherEngine {
    match keying {
        Some(_) => &SEALED,
        None => &XOR,
    }
}

/// Open the session key for a record's keying.
///
/// Legacy vaults accept any non-empty passphrase without verification.
pub fn open_session_key(keying: Option<&Keying>, passphrase: &Passphrase) -> Result<SessionKey> {
    match keying {
        Some(keying) => keying.open(passphrase),
        None => SessionKey::from_passphrase(passphrase),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_selection() {
        assert_eq!(engine_for(None).scheme(), CipherScheme::Legacy);

        let (keying, _) = Keying::create(&Passphrase::new("secret123"), KdfParams::minimal()).unwrap();
        assert_eq!(engine_for(Some(&keying)).scheme(), CipherScheme::Sealed);
    }

    #[test]
    fn test_keying_open_correct_passphrase() {
        let passphrase = Passphrase::new("secret123");
        let (keying, key) = Keying::create(&passphrase, KdfParams::minimal()).unwrap();

        let reopened = keying.open(&passphrase).unwrap();
        assert_eq!(reopened.as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_keying_open_wrong_passphrase() {
        let (keying, _) = Keying::create(&Passphrase::new("secret123"), KdfParams::minimal()).unwrap();
        let result = keying.open(&Passphrase::new("wrongpass"));

        assert!(matches!(result, Err(Error::WrongPassphrase)));
    }

    #[test]
    fn test_legacy_session_key_is_unverified() {
        let key = open_session_key(None, &Passphrase::new("anything")).unwrap();
        assert_eq!(key.as_bytes(), b"anything");
    }

    #[test]
    fn test_keying_serialization() {
        let (keying, _) = Keying::create(&Passphrase::new("secret123"), KdfParams::minimal()).unwrap();
        let json = serde_json::to_value(&keying).unwrap();

        assert!(json.get("kdfParams").is_some());
        assert!(json["verifier"].is_string());

        let restored: Keying = serde_json::from_value(json).unwrap();
        assert_eq!(restored, keying);
    }
}
