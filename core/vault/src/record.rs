//! Persisted vault record and its parts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use strongbox_common::{Error, ItemId, Result};
use strongbox_crypto::{CipherScheme, Keying};

/// Default inactivity span before auto-lock.
pub const DEFAULT_AUTO_LOCK_MINUTES: u32 = 5;

fn default_timeout_minutes() -> u32 {
    DEFAULT_AUTO_LOCK_MINUTES
}

fn default_auto_lock() -> bool {
    true
}

/// Kind of a stored item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Folder,
    Note,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::File => "file",
            Self::Folder => "folder",
            Self::Note => "note",
        };
        f.write_str(name)
    }
}

impl FromStr for ItemKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "folder" => Ok(Self::Folder),
            "note" => Ok(Self::Note),
            other => Err(Error::InvalidItem(format!("Unknown item type: {}", other))),
        }
    }
}

/// Auto-lock settings. Readable and writable in every lock state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultSettings {
    /// Whether the monitor locks the vault after inactivity.
    #[serde(default = "default_auto_lock")]
    pub auto_lock_enabled: bool,
    /// Minutes of inactivity before auto-lock. Must be positive.
    #[serde(default = "default_timeout_minutes")]
    pub auto_lock_timeout_minutes: u32,
}

impl VaultSettings {
    /// Settings with auto-lock turned off.
    pub fn without_auto_lock() -> Self {
        Self {
            auto_lock_enabled: false,
            ..Self::default()
        }
    }

    /// Settings that auto-lock after `minutes` of inactivity.
    pub fn auto_lock_after(minutes: u32) -> Self {
        Self {
            auto_lock_enabled: true,
            auto_lock_timeout_minutes: minutes,
        }
    }

    /// Check settings invariants.
    ///
    /// # Errors
    /// - `InvalidSettings` if the timeout is zero
    pub fn validate(&self) -> Result<()> {
        if self.auto_lock_timeout_minutes == 0 {
            return Err(Error::InvalidSettings(
                "Auto-lock timeout must be at least one minute".to_string(),
            ));
        }
        Ok(())
    }

    /// The inactivity span as a duration.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.auto_lock_timeout_minutes) * 60)
    }
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            auto_lock_enabled: default_auto_lock(),
            auto_lock_timeout_minutes: default_timeout_minutes(),
        }
    }
}

/// A stored item. Content exists only in `encrypted_payload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultItem {
    pub id: ItemId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub encrypted_payload: String,
}

/// Item fields safe to show while locked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    pub id: ItemId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub description: String,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&VaultItem> for ItemMetadata {
    fn from(item: &VaultItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            kind: item.kind,
            description: item.description.clone(),
            tags: item.tags.clone(),
            created_at: item.created_at,
        }
    }
}

/// The whole persisted vault. Overwritten in full on every save.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultRecord {
    pub items: Vec<VaultItem>,
    pub settings: VaultSettings,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    /// Save counter; a store rejects writes that do not advance it.
    #[serde(default)]
    pub revision: u64,
    /// Present only for sealed vaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keying: Option<Keying>,
}

impl VaultRecord {
    /// Create an empty record.
    pub fn new(settings: VaultSettings, keying: Option<Keying>) -> Self {
        let now = Utc::now();
        Self {
            items: Vec::new(),
            settings,
            created_at: now,
            last_modified: now,
            revision: 0,
            keying,
        }
    }

    /// The cipher scheme protecting this record's payloads.
    pub fn scheme(&self) -> CipherScheme {
        match self.keying {
            Some(_) => CipherScheme::Sealed,
            None => CipherScheme::Legacy,
        }
    }

    /// Find an item by id.
    pub fn item(&self, id: &ItemId) -> Option<&VaultItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Metadata for every item, in insertion order.
    pub fn metadata(&self) -> Vec<ItemMetadata> {
        self.items.iter().map(ItemMetadata::from).collect()
    }

    /// Serialize record to pretty JSON bytes for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::Serialization(e.to_string()))
    }
}
