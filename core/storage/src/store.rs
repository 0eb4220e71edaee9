//! Record store trait definition.

use async_trait::async_trait;

use strongbox_common::Result;

/// Storage backend holding a single vault record.
///
/// Implementations must make `write` all-or-nothing: a reader sees either
/// the previous record or the new one, never a mix.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Get the store name (e.g., "local", "memory").
    fn name(&self) -> &str;

    /// Read the stored record bytes.
    ///
    /// # Returns
    /// - `Ok(None)` if no record has ever been written
    ///
    /// # Errors
    /// - I/O errors other than absence
    async fn read(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the stored record with `data`.
    ///
    /// # Postconditions
    /// - A subsequent `read` returns exactly `data`
    ///
    /// # Errors
    /// - I/O errors; the previous record is left intact
    async fn write(&self, data: Vec<u8>) -> Result<()>;

    /// Check whether a record exists.
    async fn exists(&self) -> Result<bool> {
        Ok(self.read().await?.is_some())
    }
}
