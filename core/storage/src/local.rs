//! Local filesystem record store.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::store::RecordStore;
use strongbox_common::Result;

/// Default file name for the vault record.
pub const RECORD_FILENAME: &str = "vault.json";

/// Local filesystem record store.
///
/// Stores the record in one file. Writes go to a sibling temp file that is
/// then renamed over the record.
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    /// Create a store for the record file at `path`.
    ///
    /// The file and its parent directories are created on first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Platform default record location, e.g. `~/.local/share/strongbox/vault.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("strongbox").join(RECORD_FILENAME))
    }

    /// Path of the record file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| RECORD_FILENAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl RecordStore for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn read(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, data: Vec<u8>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp = self.temp_path();
        // A leftover temp file would keep its old mode on reopen
        let _ = fs::remove_file(&temp).await;

        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&temp).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = fs::rename(&temp, &self.path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        debug!(path = %self.path.display(), size = data.len(), "Record written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_missing_is_none() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::new(temp.path().join("vault.json"));

        assert!(store.read().await.unwrap().is_none());
        assert!(!store.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_local_write_read() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::new(temp.path().join("vault.json"));

        store.write(b"{\"items\":[]}".to_vec()).await.unwrap();
        assert_eq!(store.read().await.unwrap(), Some(b"{\"items\":[]}".to_vec()));
    }

    #[tokio::test]
    async fn test_local_creates_parents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("dir").join("vault.json");
        let store = LocalStore::new(&path);

        store.write(b"data".to_vec()).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_local_overwrite_leaves_no_temp() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::new(temp.path().join("vault.json"));

        store.write(b"first".to_vec()).await.unwrap();
        store.write(b"second".to_vec()).await.unwrap();

        assert_eq!(store.read().await.unwrap(), Some(b"second".to_vec()));
        assert!(!temp.path().join("vault.json.tmp").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_local_record_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vault.json");
        LocalStore::new(&path).write(b"x".to_vec()).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_local_stale_temp_does_not_leak_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vault.json");
        let stale = temp.path().join("vault.json.tmp");
        std::fs::write(&stale, b"old").unwrap();
        std::fs::set_permissions(&stale, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = LocalStore::new(&path);
        store.write(b"fresh".to_vec()).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.read().await.unwrap(), Some(b"fresh".to_vec()));
        assert!(!stale.exists());
    }
}
