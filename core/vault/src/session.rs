//! Unlocked-session state.
//!
//! A session exists only while the vault is unlocked. It holds the
//! passphrase, the key material opened from it, and the last-activity
//! instant. Secrets are zeroized when the session is dropped, which the
//! controller does on every lock.

use std::time::Duration;
use tokio::time::Instant;

use strongbox_common::Passphrase;
use strongbox_crypto::SessionKey;

/// Active vault session.
pub struct Session {
    /// Passphrase the session was opened with (zeroized on drop).
    passphrase: Passphrase,
    /// Key material for the vault's cipher scheme (zeroized on drop).
    key: SessionKey,
    /// Last time an operation touched the vault.
    last_activity: Instant,
    /// Lock epoch this session belongs to.
    epoch: u64,
}

impl Session {
    /// Open a session. Activity starts now.
    pub fn open(passphrase: Passphrase, key: SessionKey, epoch: u64) -> Self {
        Self {
            passphrase,
            key,
            last_activity: Instant::now(),
            epoch,
        }
    }

    /// The passphrase this session was opened with.
    ///
    /// # Security
    /// Borrow for a single call; do not copy.
    pub fn passphrase(&self) -> &Passphrase {
        &self.passphrase
    }

    /// Key material for cipher calls.
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Record activity now.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// When the session was last touched.
    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    /// Time elapsed since the last activity, as of `now`.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    /// Lock epoch of this session.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("passphrase", &self.passphrase)
            .field("key", &self.key)
            .field("last_activity", &self.last_activity)
            .field("epoch", &self.epoch)
            .finish()
    }
}
