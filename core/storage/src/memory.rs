//! In-memory record store for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::store::RecordStore;
use strongbox_common::{Error, Result};

/// In-memory record store.
///
/// Clones share the same record, so a test can keep a handle while the
/// vault owns another. Writes can be made to fail on demand.
#[derive(Clone, Default)]
pub struct MemoryStore {
    record: Arc<RwLock<Option<Vec<u8>>>>,
    fail_writes: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with record bytes.
    pub fn with_record(data: Vec<u8>) -> Self {
        Self {
            record: Arc::new(RwLock::new(Some(data))),
            ..Self::default()
        }
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Snapshot of the stored bytes.
    pub async fn snapshot(&self) -> Option<Vec<u8>> {
        self.record.read().await.clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn read(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.record.read().await.clone())
    }

    async fn write(&self, data: Vec<u8>) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::other("injected write failure")));
        }

        *self.record.write().await = Some(data);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_empty() {
        let store = MemoryStore::new();
        assert!(store.read().await.unwrap().is_none());
        assert!(!store.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_write_read() {
        let store = MemoryStore::new();
        store.write(b"record".to_vec()).await.unwrap();

        assert_eq!(store.read().await.unwrap(), Some(b"record".to_vec()));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_clones_share_record() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.write(b"shared".to_vec()).await.unwrap();

        assert_eq!(handle.snapshot().await, Some(b"shared".to_vec()));
    }

    #[tokio::test]
    async fn test_memory_injected_failure_keeps_previous() {
        let store = MemoryStore::with_record(b"old".to_vec());
        store.set_fail_writes(true);

        assert!(store.write(b"new".to_vec()).await.is_err());
        assert_eq!(store.read().await.unwrap(), Some(b"old".to_vec()));
        assert_eq!(store.write_count(), 0);

        store.set_fail_writes(false);
        store.write(b"new".to_vec()).await.unwrap();
        assert_eq!(store.read().await.unwrap(), Some(b"new".to_vec()));
    }
}
