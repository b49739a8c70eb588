//! OS keyring-backed key-value storage implementation.

use async_trait::async_trait;
use keyring::Entry;
use std::collections::BTreeSet;

use super::{KeyValueStore, StoreError};

/// Entry holding the JSON list of keys written through this store.
const INDEX_KEY: &str = "__keys__";

/// Store backed by the platform credential store (Keychain, Secret Service,
/// Credential Manager).
///
/// # Entry Layout
///
/// Entries are stored under the service `{service_name}/{key}`. Keyrings
/// cannot enumerate entries, so the store keeps its own key index in the
/// `{service_name}/__keys__` entry to support [`clear`](KeyValueStore::clear).
pub struct KeyringStore {
    service_name: String,
}

impl KeyringStore {
    /// Open the store, failing with [`StoreError::KeyringUnavailable`] when
    /// the platform has no usable credential store.
    pub fn try_new(service_name: &str) -> Result<Self, StoreError> {
        let index_service = format!("{}/{}", service_name, INDEX_KEY);
        match Entry::new(&index_service, "reunion") {
            Ok(_) => Ok(Self {
                service_name: service_name.to_string(),
            }),
            Err(e) => Err(StoreError::KeyringUnavailable {
                message: format!("keyring backend not available: {}", e),
            }),
        }
    }

    /// Create a keyring entry for the given key.
    fn create_entry(&self, key: &str) -> Result<Entry, StoreError> {
        let service = format!("{}/{}", self.service_name, key);
        Entry::new(&service, "reunion").map_err(|e| StoreError::BackendError {
            message: format!("failed to create keyring entry: {}", e),
        })
    }

    fn read_entry(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entry = self.create_entry(key)?;

        match entry.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(keyring::Error::Ambiguous(_)) => Err(StoreError::BackendError {
                message: format!("ambiguous keyring entry for key: {}", key),
            }),
            Err(keyring::Error::PlatformFailure(e)) => Err(StoreError::BackendError {
                message: format!("platform keyring failure: {}", e),
            }),
            Err(e) => Err(StoreError::BackendError {
                message: format!("keyring error: {}", e),
            }),
        }
    }

    fn delete_entry(&self, key: &str) -> Result<(), StoreError> {
        let entry = self.create_entry(key)?;

        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StoreError::BackendError {
                message: format!("failed to delete keyring entry: {}", e),
            }),
        }
    }

    fn load_index(&self) -> Result<BTreeSet<String>, StoreError> {
        match self.read_entry(INDEX_KEY)? {
            Some(text) => Ok(serde_json::from_str(&text)?),
            None => Ok(BTreeSet::new()),
        }
    }

    fn save_index(&self, index: &BTreeSet<String>) -> Result<(), StoreError> {
        if index.is_empty() {
            return self.delete_entry(INDEX_KEY);
        }
        let text = serde_json::to_string(index)?;
        self.create_entry(INDEX_KEY)?
            .set_password(&text)
            .map_err(|e| StoreError::BackendError {
                message: format!("failed to update keyring index: {}", e),
            })
    }
}

impl std::fmt::Debug for KeyringStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyringStore")
            .field("service_name", &self.service_name)
            .finish()
    }
}

#[async_trait]
impl KeyValueStore for KeyringStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.read_entry(key)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let entry = self.create_entry(key)?;

        entry
            .set_password(value)
            .map_err(|e| StoreError::BackendError {
                message: format!("failed to set keyring password: {}", e),
            })?;

        let mut index = self.load_index()?;
        if index.insert(key.to_string()) {
            self.save_index(&index)?;
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.delete_entry(key)?;

        let mut index = self.load_index()?;
        if index.remove(key) {
            self.save_index(&index)?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let index = self.load_index()?;
        for key in &index {
            self.delete_entry(key)?;
        }
        self.save_index(&BTreeSet::new())
    }
}
