//! Cryptographic primitives for Strongbox.
//!
//! This module provides:
//! - The legacy passphrase-keyed XOR cipher used by existing vaults
//! - An opt-in sealed scheme: Argon2id key derivation plus XChaCha20-Poly1305
//! - Session key material with automatic zeroization
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext or key material is ever logged
//!
//! The legacy scheme carries no integrity tag and no passphrase verifier.
//! Decrypting with the wrong passphrase succeeds and returns garbage of the
//! original length. Only the sealed scheme can tell a wrong passphrase apart.

pub mod engine;
pub mod kdf;
pub mod keys;
pub mod sealed;
pub mod xor;

pub use engine::{engine_for, open_session_key, CipherEngine, CipherScheme, Keying};
pub use kdf::{derive_key, KdfParams};
pub use keys::{Salt, SessionKey, KEY_LENGTH};
pub use sealed::SealedCipher;
pub use xor::XorCipher;
