//! JSON file-backed key-value storage.
//!
//! The whole store is a single JSON object on disk, rewritten on every
//! mutation. Concurrent writers from separate processes are not coordinated;
//! the last write wins.
//!
//! # Storage Location
//!
//! By default the file lives at `~/.local/share/reunion/storage.json` on Linux,
//! the matching application-data directory elsewhere.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::{KeyValueStore, STORE_FILE_NAME, StoreError};

/// Durable store backed by a JSON file.
///
/// # Thread Safety
///
/// An in-memory copy guarded by `RwLock` serves reads; every write updates
/// the copy and then saves it.
pub struct FileStore {
    /// Path to the JSON file.
    path: PathBuf,

    /// In-memory copy of the file contents.
    data: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Get the default storage path.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let dirs = directories::ProjectDirs::from("app", "reunion", "reunion")
            .ok_or(StoreError::DataDirUnavailable)?;

        Ok(dirs.data_dir().join(STORE_FILE_NAME))
    }

    /// Load the store from the default location.
    pub fn load() -> Result<Self, StoreError> {
        Self::load_from_path(Self::default_path()?)
    }

    /// Load the store from a specific path.
    ///
    /// Creates parent directories if they don't exist. A missing file is an
    /// empty store; the file is created on the first write.
    pub fn load_from_path(path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, data: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }

    /// Apply `f` to a copy of the map and keep it only once it is on disk.
    fn mutate(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), StoreError> {
        let mut data = self.data.write().map_err(|e| StoreError::BackendError {
            message: format!("write lock poisoned: {}", e),
        })?;
        let mut updated = data.clone();
        f(&mut updated);
        self.save(&updated)?;
        *data = updated;
        Ok(())
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .finish()
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let data = self.data.read().map_err(|e| StoreError::BackendError {
            message: format!("read lock poisoned: {}", e),
        })?;
        Ok(data.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.mutate(|data| {
            data.insert(key.to_string(), value.to_string());
        })
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.mutate(|data| {
            data.remove(key);
        })
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.mutate(BTreeMap::clear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(STORE_FILE_NAME);
        let store = FileStore::load_from_path(path).unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_file_store_creates_parent_dirs() {
        let (store, _temp) = test_store();
        assert!(store.path().parent().unwrap().is_dir());
        assert!(!store.path().exists());

        store.set("email", "\"a@b.com\"").await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_file_store_persists_across_loads() {
        let (store, _temp) = test_store();
        store.set("access_token", "\"abc123\"").await.unwrap();
        store.set("email", "\"a@b.com\"").await.unwrap();
        store.remove("email").await.unwrap();

        let reloaded = FileStore::load_from_path(store.path().to_path_buf()).unwrap();
        assert_eq!(
            reloaded.get("access_token").await.unwrap().as_deref(),
            Some("\"abc123\"")
        );
        assert!(reloaded.get("email").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_clear() {
        let (store, _temp) = test_store();
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();
        store.clear().await.unwrap();

        let reloaded = FileStore::load_from_path(store.path().to_path_buf()).unwrap();
        assert!(reloaded.get("a").await.unwrap().is_none());
        assert!(reloaded.get("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_save_leaves_memory_unchanged() {
        let (store, _temp) = test_store();
        store.set("email", "\"a@b.com\"").await.unwrap();

        // A directory in place of the file makes every write fail
        fs::remove_file(store.path()).unwrap();
        fs::create_dir(store.path()).unwrap();

        assert!(store.set("email", "\"c@d.com\"").await.is_err());
        assert!(store.remove("email").await.is_err());
        assert!(store.clear().await.is_err());
        assert_eq!(
            store.get("email").await.unwrap().as_deref(),
            Some("\"a@b.com\"")
        );
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(STORE_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();

        let result = FileStore::load_from_path(path);
        assert!(matches!(result, Err(StoreError::SerializationError(_))));
    }

    #[test]
    fn test_file_store_empty_file_is_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(STORE_FILE_NAME);
        fs::write(&path, "").unwrap();

        assert!(FileStore::load_from_path(path).is_ok());
    }
}
