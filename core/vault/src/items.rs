//! Item operations over an unlocked session.

use chrono::Utc;
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::record::{ItemKind, ItemMetadata, VaultItem};
use crate::session::Session;
use strongbox_common::{Error, ItemId, Plaintext, Result};
use strongbox_crypto::CipherEngine;

/// Fields for a new item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub kind: ItemKind,
    pub description: String,
    pub tags: BTreeSet<String>,
    pub content: Plaintext,
}

impl NewItem {
    /// Start a new item with no description or tags.
    pub fn new(name: impl Into<String>, kind: ItemKind, content: impl Into<Plaintext>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: String::new(),
            tags: BTreeSet::new(),
            content: content.into(),
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the tags. Blank tags are dropped and the rest trimmed.
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = tags
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        self
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidItem("Item name cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Decrypted content of one item.
///
/// Tagged with the epoch of the session that revealed it. Once the vault
/// locks, the controller reports it as stale and callers should drop it.
#[derive(Debug)]
pub struct Revealed {
    pub id: ItemId,
    pub content: Plaintext,
    pub(crate) epoch: u64,
}

impl Revealed {
    /// Lock epoch the content was revealed in.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Item operations handler.
///
/// Borrows the record's items and the active session for the duration of
/// one operation. Persistence is left to the caller.
pub struct VaultItemStore<'a> {
    items: &'a mut Vec<VaultItem>,
    session: &'a mut Session,
    engine: &'a dyn CipherEngine,
}

impl<'a> VaultItemStore<'a> {
    /// Create an operations handler for an unlocked session.
    pub fn new(
        items: &'a mut Vec<VaultItem>,
        session: &'a mut Session,
        engine: &'a dyn CipherEngine,
    ) -> Self {
        Self {
            items,
            session,
            engine,
        }
    }

    /// Encrypt and append a new item.
    ///
    /// # Postconditions
    /// - Item has a fresh id and an encrypted payload
    /// - Session activity is refreshed
    ///
    /// # Errors
    /// - `InvalidItem` if the name is blank; nothing is changed
    /// - Encryption failure
    pub fn add(&mut self, item: NewItem) -> Result<ItemMetadata> {
        item.validate()?;
        self.session.touch();

        let encrypted_payload = self
            .engine
            .encrypt(item.content.as_bytes(), self.session.key())?;

        let NewItem {
            name,
            kind,
            description,
            tags,
            ..
        } = item;

        let stored = VaultItem {
            id: ItemId::generate(),
            name,
            kind,
            description,
            tags,
            created_at: Utc::now(),
            encrypted_payload,
        };
        let metadata = ItemMetadata::from(&stored);
        self.items.push(stored);

        info!(item_id = %metadata.id, kind = %metadata.kind, "Item added");
        Ok(metadata)
    }

    /// Remove an item.
    ///
    /// # Returns
    /// - `true` if an item was removed, `false` if the id was absent
    pub fn remove(&mut self, id: &ItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.id != id);

        if self.items.len() == before {
            debug!(item_id = %id, "Remove of absent item ignored");
            return false;
        }

        self.session.touch();
        info!(item_id = %id, "Item removed");
        true
    }

    /// Decrypt an item's content.
    ///
    /// With the legacy scheme a session opened with the wrong passphrase
    /// gets back garbage of the right length, not an error.
    ///
    /// # Errors
    /// - `ItemNotFound` if the id is absent
    /// - `DecryptFailure` for a malformed (or, sealed, tampered) payload
    pub fn reveal(&mut self, id: &ItemId) -> Result<Revealed> {
        let item = self
            .items
            .iter()
            .find(|item| &item.id == id)
            .ok_or_else(|| Error::ItemNotFound(id.to_string()))?;

        self.session.touch();
        let content = self
            .engine
            .decrypt(&item.encrypted_payload, self.session.key())?;

        debug!(item_id = %id, size = content.len(), "Item revealed");
        Ok(Revealed {
            id: id.clone(),
            content,
            epoch: self.session.epoch(),
        })
    }
}
