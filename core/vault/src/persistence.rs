//! Typed load/save of the vault record over a record store.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::record::VaultRecord;
use strongbox_common::{Error, Result};
use strongbox_storage::RecordStore;

/// Just the revision of a stored record.
#[derive(Deserialize)]
struct StoredRevision {
    #[serde(default)]
    revision: u64,
}

/// Loads and saves the single vault record.
///
/// Saves are optimistic: a save whose revision does not advance past the
/// stored one is rejected, so a second instance writing an older view of
/// the vault cannot silently drop the first one's changes.
#[derive(Clone)]
pub struct PersistenceAdapter {
    store: Arc<dyn RecordStore>,
}

impl PersistenceAdapter {
    /// Wrap a record store.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Name of the underlying store.
    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Load the record, if one exists.
    ///
    /// # Errors
    /// - Store I/O errors
    /// - Malformed record
    /// - `InvalidSettings` if the stored settings break their invariants
    pub async fn load(&self) -> Result<Option<VaultRecord>> {
        match self.store.read().await? {
            Some(bytes) => {
                let record = VaultRecord::from_bytes(&bytes)?;
                record.settings.validate()?;
                debug!(
                    store = self.store.name(),
                    revision = record.revision,
                    items = record.items.len(),
                    "Vault record loaded"
                );
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Replace the stored record.
    ///
    /// # Errors
    /// - `Conflict` if the stored revision is not older than `record.revision`
    /// - Store I/O or serialization errors
    pub async fn save(&self, record: &VaultRecord) -> Result<()> {
        if let Some(bytes) = self.store.read().await? {
            let stored: StoredRevision = serde_json::from_slice(&bytes)
                .map_err(|e| Error::Serialization(e.to_string()))?;
            if stored.revision >= record.revision {
                warn!(
                    stored = stored.revision,
                    attempted = record.revision,
                    "Rejected stale vault write"
                );
                return Err(Error::Conflict(format!(
                    "stored revision {} is not older than {}",
                    stored.revision, record.revision
                )));
            }
        }

        self.store.write(record.to_bytes()?).await?;
        debug!(store = self.store.name(), revision = record.revision, "Vault record saved");
        Ok(())
    }
}
