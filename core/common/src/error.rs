//! Common error types for Strongbox.

use thiserror::Error;

/// Top-level error type for Strongbox operations.
///
/// Validation and precondition variants never leave partial state behind.
/// `PersistenceFailure` is the exception: the in-memory change it reports
/// has already been applied.
#[derive(Debug, Error)]
pub enum Error {
    /// Passphrase and its confirmation differ.
    #[error("Passphrase and confirmation do not match")]
    PassphraseMismatch,

    /// Passphrase is shorter than the required minimum.
    #[error("Passphrase must be at least {min} characters")]
    PassphraseTooShort { min: usize },

    /// No vault record exists.
    #[error("No vault exists")]
    VaultNotFound,

    /// A vault record already exists.
    #[error("A vault already exists")]
    VaultAlreadyExists,

    /// Operation requires an unlocked vault.
    #[error("Vault is locked")]
    VaultLocked,

    /// Vault already has an active session.
    #[error("Vault is already unlocked")]
    AlreadyUnlocked,

    /// Passphrase failed verification (sealed vaults only).
    #[error("Wrong passphrase")]
    WrongPassphrase,

    /// No item with the given id.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Item fields failed validation.
    #[error("Invalid item: {0}")]
    InvalidItem(String),

    /// Settings failed validation.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Ciphertext envelope could not be decoded or authenticated.
    #[error("Decryption failed: {0}")]
    DecryptFailure(String),

    /// Cryptographic operation failed.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// The vault record could not be saved. In-memory state is kept.
    #[error("Vault record not saved: {0}")]
    PersistenceFailure(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Stored record is newer than the one being written.
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl Error {
    /// Whether this error left in-memory state changed but not yet durable.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(self, Self::PersistenceFailure(_))
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
