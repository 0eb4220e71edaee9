//! Vault lifecycle: create, unlock, lock, and gated item access.

use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::items::{NewItem, Revealed, VaultItemStore};
use crate::persistence::PersistenceAdapter;
use crate::record::{ItemMetadata, VaultRecord, VaultSettings};
use crate::session::Session;
use strongbox_common::{Error, ItemId, Passphrase, Result, MIN_PASSPHRASE_LEN};
use strongbox_crypto::{engine_for, open_session_key, CipherScheme, KdfParams, Keying, SessionKey};
use strongbox_storage::RecordStore;

/// Lock state of the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LockState {
    /// No vault record exists.
    Uninitialized,
    /// A record exists and no session is open.
    Locked,
    /// A session is open.
    Unlocked,
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
        };
        f.write_str(name)
    }
}

/// How a new vault protects item payloads.
#[derive(Debug, Clone, Default)]
pub enum NewVaultScheme {
    /// Repeating-passphrase XOR; unlock never verifies the passphrase.
    #[default]
    Legacy,
    /// Argon2id + XChaCha20-Poly1305 with a passphrase verifier.
    Sealed(KdfParams),
}

/// Controller shared between callers and the auto-lock monitor.
pub type VaultHandle = Arc<Mutex<VaultController>>;

/// Owns the vault record and the session, and gates every operation on
/// the lock state.
pub struct VaultController {
    persistence: PersistenceAdapter,
    record: Option<VaultRecord>,
    session: Option<Session>,
    state_tx: watch::Sender<LockState>,
    /// Bumped on every lock; tags revealed content.
    epoch: u64,
    /// In-memory changes not yet saved.
    dirty: bool,
}

impl VaultController {
    /// Open the controller over a store.
    ///
    /// # Postconditions
    /// - State is `Locked` if a record was found, else `Uninitialized`
    ///
    /// # Errors
    /// - Store I/O failure or malformed record
    pub async fn open(store: Arc<dyn RecordStore>) -> Result<Self> {
        let persistence = PersistenceAdapter::new(store);
        let record = persistence.load().await?;

        let state = if record.is_some() {
            LockState::Locked
        } else {
            LockState::Uninitialized
        };
        let (state_tx, _) = watch::channel(state);

        info!(store = persistence.store_name(), state = %state, "Vault opened");

        Ok(Self {
            persistence,
            record,
            session: None,
            state_tx,
            epoch: 0,
            dirty: false,
        })
    }

    /// Wrap in a shareable handle.
    pub fn into_handle(self) -> VaultHandle {
        Arc::new(Mutex::new(self))
    }

    /// Current lock state.
    pub fn state(&self) -> LockState {
        match (&self.record, &self.session) {
            (None, _) => LockState::Uninitialized,
            (Some(_), None) => LockState::Locked,
            (Some(_), Some(_)) => LockState::Unlocked,
        }
    }

    /// Receive lock-state changes, including auto-lock.
    pub fn subscribe(&self) -> watch::Receiver<LockState> {
        self.state_tx.subscribe()
    }

    fn publish_state(&self) {
        self.state_tx.send_replace(self.state());
    }

    /// Current settings, if a vault exists.
    pub fn settings(&self) -> Option<&VaultSettings> {
        self.record.as_ref().map(|r| &r.settings)
    }

    /// Cipher scheme of the vault, if one exists.
    pub fn scheme(&self) -> Option<CipherScheme> {
        self.record.as_ref().map(VaultRecord::scheme)
    }

    /// Whether an in-memory change has not been saved yet.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Current lock epoch.
    pub fn session_epoch(&self) -> u64 {
        self.epoch
    }

    /// Create a new legacy-scheme vault and unlock it.
    ///
    /// # Errors
    /// - `VaultAlreadyExists` unless `Uninitialized`
    /// - `PassphraseMismatch` if `confirm` differs
    /// - `PassphraseTooShort` below the minimum length
    /// - `InvalidSettings`
    /// - `PersistenceFailure` if the empty record could not be saved; the
    ///   vault is not created
    pub async fn create_vault(
        &mut self,
        passphrase: &Passphrase,
        confirm: &Passphrase,
        settings: VaultSettings,
    ) -> Result<()> {
        self.create_vault_with(passphrase, confirm, settings, NewVaultScheme::Legacy)
            .await
    }

    /// Create a new vault with an explicit cipher scheme and unlock it.
    pub async fn create_vault_with(
        &mut self,
        passphrase: &Passphrase,
        confirm: &Passphrase,
        settings: VaultSettings,
        scheme: NewVaultScheme,
    ) -> Result<()> {
        if self.record.is_some() {
            return Err(Error::VaultAlreadyExists);
        }
        if !passphrase.matches(confirm) {
            return Err(Error::PassphraseMismatch);
        }
        if passphrase.char_len() < MIN_PASSPHRASE_LEN {
            return Err(Error::PassphraseTooShort {
                min: MIN_PASSPHRASE_LEN,
            });
        }
        settings.validate()?;

        let (keying, key) = match scheme {
            NewVaultScheme::Legacy => (None, SessionKey::from_passphrase(passphrase)?),
            NewVaultScheme::Sealed(params) => {
                let (keying, key) = Keying::create(passphrase, params)?;
                (Some(keying), key)
            }
        };

        let mut record = VaultRecord::new(settings, keying);
        record.revision = 1;
        self.persistence
            .save(&record)
            .await
            .map_err(|e| Error::PersistenceFailure(e.to_string()))?;

        info!(scheme = ?record.scheme(), "Vault created");

        self.record = Some(record);
        self.session = Some(Session::open(passphrase.clone(), key, self.epoch));
        self.dirty = false;
        self.publish_state();
        Ok(())
    }

    /// Open a session.
    ///
    /// Legacy vaults do not verify the passphrase: any non-empty passphrase
    /// unlocks, and a wrong one only shows up as garbled revealed content.
    ///
    /// # Errors
    /// - `VaultNotFound` if no vault exists
    /// - `AlreadyUnlocked` if a session is open
    /// - `PassphraseTooShort` for an empty passphrase
    /// - `WrongPassphrase` (sealed vaults only)
    pub async fn unlock(&mut self, passphrase: &Passphrase) -> Result<()> {
        let record = self.record.as_ref().ok_or(Error::VaultNotFound)?;
        if self.session.is_some() {
            return Err(Error::AlreadyUnlocked);
        }
        if passphrase.is_empty() {
            return Err(Error::PassphraseTooShort { min: 1 });
        }

        let key = match open_session_key(record.keying.as_ref(), passphrase) {
            Ok(key) => key,
            Err(e) => {
                warn!("Unlock rejected: {}", e);
                return Err(e);
            }
        };

        self.session = Some(Session::open(passphrase.clone(), key, self.epoch));
        self.publish_state();
        info!(scheme = ?record.scheme(), "Vault unlocked");
        Ok(())
    }

    /// Close the session, zeroizing its secrets.
    ///
    /// Idempotent: does nothing unless unlocked.
    pub fn lock(&mut self) {
        if let Some(session) = self.session.take() {
            // Passphrase and key are zeroized on drop
            drop(session);
            self.epoch += 1;
            self.publish_state();
            info!("Vault locked");
        }
    }

    /// Record activity on the open session.
    ///
    /// # Errors
    /// - `VaultLocked` unless unlocked
    pub fn touch_activity(&mut self) -> Result<()> {
        let session = self.session.as_mut().ok_or(Error::VaultLocked)?;
        session.touch();
        Ok(())
    }

    /// Lock if auto-lock is enabled and the session has been idle for at
    /// least the configured timeout as of `now`.
    ///
    /// # Returns
    /// - `true` if this call locked the vault
    pub fn check_auto_lock(&mut self, now: Instant) -> bool {
        let (Some(record), Some(session)) = (&self.record, &self.session) else {
            return false;
        };
        if !record.settings.auto_lock_enabled {
            return false;
        }

        let idle = session.idle_for(now);
        if idle < record.settings.timeout() {
            return false;
        }

        info!(idle_secs = idle.as_secs(), "Auto-locking idle vault");
        self.lock();
        true
    }

    /// Replace the settings. Allowed in any state once a vault exists.
    ///
    /// # Errors
    /// - `VaultNotFound` if no vault exists
    /// - `InvalidSettings`
    /// - `PersistenceFailure`; the new settings stay in effect
    pub async fn update_settings(&mut self, settings: VaultSettings) -> Result<()> {
        settings.validate()?;
        let record = self.record.as_mut().ok_or(Error::VaultNotFound)?;
        record.settings = settings;

        if let Some(session) = self.session.as_mut() {
            session.touch();
        }
        debug!(settings = ?record.settings, "Settings updated");
        self.persist().await
    }

    /// Metadata for every item. Works in any state.
    pub fn list_items(&self) -> Vec<ItemMetadata> {
        self.record
            .as_ref()
            .map(VaultRecord::metadata)
            .unwrap_or_default()
    }

    /// Encrypt and store a new item.
    ///
    /// # Errors
    /// - `VaultLocked` unless unlocked
    /// - `InvalidItem` for a blank name
    /// - `PersistenceFailure`; the item is kept in memory
    pub async fn add_item(&mut self, item: NewItem) -> Result<ItemMetadata> {
        let metadata = self.item_store()?.add(item)?;
        self.persist().await?;
        Ok(metadata)
    }

    /// Remove an item. Removing an absent id succeeds without a save.
    ///
    /// # Returns
    /// - `true` if an item was removed
    ///
    /// # Errors
    /// - `VaultLocked` unless unlocked
    /// - `PersistenceFailure`; the removal is kept in memory
    pub async fn remove_item(&mut self, id: &ItemId) -> Result<bool> {
        if !self.item_store()?.remove(id) {
            return Ok(false);
        }
        self.persist().await?;
        Ok(true)
    }

    /// Decrypt an item's content.
    ///
    /// # Errors
    /// - `VaultLocked` unless unlocked
    /// - `ItemNotFound`
    /// - `DecryptFailure` for a malformed payload
    pub fn reveal_item(&mut self, id: &ItemId) -> Result<Revealed> {
        self.item_store()?.reveal(id)
    }

    /// Whether revealed content still belongs to the open session.
    pub fn is_current(&self, revealed: &Revealed) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.epoch() == revealed.epoch())
    }

    /// Retry saving after a persistence failure.
    ///
    /// # Errors
    /// - `VaultNotFound` if no vault exists
    /// - `PersistenceFailure`
    pub async fn flush(&mut self) -> Result<()> {
        if self.record.is_none() {
            return Err(Error::VaultNotFound);
        }
        if !self.dirty {
            return Ok(());
        }
        self.persist().await
    }

    fn item_store(&mut self) -> Result<VaultItemStore<'_>> {
        let (Some(record), Some(session)) = (self.record.as_mut(), self.session.as_mut()) else {
            return Err(Error::VaultLocked);
        };
        let engine = engine_for(record.keying.as_ref());
        Ok(VaultItemStore::new(&mut record.items, session, engine))
    }

    /// Save the whole record under the next revision.
    ///
    /// On failure the in-memory change is kept, the revision is rolled back
    /// and the controller is marked dirty.
    async fn persist(&mut self) -> Result<()> {
        let record = self.record.as_mut().ok_or(Error::VaultNotFound)?;
        let previous_modified = record.last_modified;
        record.revision += 1;
        record.last_modified = Utc::now();

        match self.persistence.save(record).await {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                record.revision -= 1;
                record.last_modified = previous_modified;
                self.dirty = true;
                warn!("Vault record not saved, changes held in memory: {}", e);
                Err(Error::PersistenceFailure(e.to_string()))
            }
        }
    }
}
