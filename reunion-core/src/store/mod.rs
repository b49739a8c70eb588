//! Persistent key-value storage.
//!
//! This module provides:
//! - [`KeyValueStore`] - Trait for raw text storage backends
//! - [`StoreAdapter`] - Typed, total get/set/remove/clear over any backend
//! - [`Secret`] - Credential wrapper that hides its value when formatted
//! - [`MemoryStore`] - In-memory implementation for testing
//! - [`FileStore`] - JSON file implementation, durable across runs
//! - [`KeyringStore`] - OS keyring implementation (with `keyring-store` feature)
//! - [`create_store`] - Helper to select a backend based on availability
//!
//! # Value Encoding
//!
//! Every value is stored as JSON text, so a string token `abc` is stored as
//! `"abc"` including the quotes.
//!
//! # Example
//!
//! ```rust,ignore
//! use reunion_core::store::{MemoryStore, StoreAdapter};
//!
//! let store = StoreAdapter::new(MemoryStore::new());
//! store.set_item("access_token", "abc123").await;
//!
//! let token: Option<String> = store.get_item("access_token").await;
//! assert_eq!(token.as_deref(), Some("abc123"));
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

mod file;
#[cfg(feature = "keyring-store")]
mod keyring;
mod memory;

pub use file::FileStore;
#[cfg(feature = "keyring-store")]
pub use keyring::KeyringStore;
pub use memory::MemoryStore;

/// A credential read from the store, such as the bearer token.
///
/// Formatting never shows the value; use [`expose`](Secret::expose) at the
/// point where it goes on the wire.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret(<{} chars hidden>)", self.0.chars().count())
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<hidden>")
    }
}

/// Error type for storage backend operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend encountered an error.
    #[error("backend error: {message}")]
    BackendError { message: String },

    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The keyring backend is not available.
    #[error("keyring not available: {message}")]
    KeyringUnavailable { message: String },

    /// No platform data directory could be determined.
    #[error("data directory not available")]
    DataDirUnavailable,
}

/// Abstraction over raw text storage backends.
///
/// Backends may fail; [`StoreAdapter`] is the layer that turns those failures
/// into log lines so callers never branch on storage availability.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Retrieve the text stored under `key`.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, overwriting any existing value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`.
    ///
    /// Returns `Ok(())` even if the key didn't exist.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Delete every key.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Typed, total view over a [`KeyValueStore`].
///
/// None of the operations return errors. Serialization and backend failures
/// are logged and reported as an absent value (reads) or ignored (writes).
/// Cloning is cheap and clones share the backend.
#[derive(Clone)]
pub struct StoreAdapter {
    backend: Arc<dyn KeyValueStore>,
}

impl StoreAdapter {
    /// Wrap a backend.
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Wrap an already shared backend.
    pub fn from_shared(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Serialize `value` as JSON and store it under `key`.
    pub async fn set_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let text = match serde_json::to_string(value) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(key, error = %e, "failed to serialize stored item");
                return;
            }
        };

        if let Err(e) = self.backend.set(key, &text).await {
            tracing::error!(key, error = %e, "failed to set stored item");
        }
    }

    /// Read and deserialize the value under `key`.
    ///
    /// Returns `None` if the key is unset, the backend fails, or the stored
    /// text does not decode as `T`.
    pub async fn get_item<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let text = match self.backend.get(key).await {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!(key, error = %e, "failed to get stored item");
                return None;
            }
        };

        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(key, error = %e, "failed to decode stored item");
                None
            }
        }
    }

    /// Delete the value under `key`.
    pub async fn remove_item(&self, key: &str) {
        if let Err(e) = self.backend.remove(key).await {
            tracing::error!(key, error = %e, "failed to remove stored item");
        }
    }

    /// Delete every stored value.
    pub async fn clear(&self) {
        if let Err(e) = self.backend.clear().await {
            tracing::error!(error = %e, "failed to clear store");
        }
    }
}

impl std::fmt::Debug for StoreAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreAdapter").finish_non_exhaustive()
    }
}

/// Storage backend choice, as named in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    File,
    Keyring,
}

/// File name of the [`FileStore`] inside the data directory.
pub const STORE_FILE_NAME: &str = "storage.json";

/// Create a store with automatic backend fallback.
///
/// # Backend Selection Logic
///
/// - [`StoreBackend::File`]: opens `{data_dir}/storage.json`
/// - [`StoreBackend::Keyring`]: requires the `keyring-store` feature
/// - [`StoreBackend::Memory`]: always available
///
/// Any backend that cannot be opened falls back to [`MemoryStore`] with a
/// warning. Values written to the fallback do not persist across runs.
pub fn create_store(backend: StoreBackend, data_dir: &Path) -> Arc<dyn KeyValueStore> {
    match backend {
        StoreBackend::File => {
            let path = data_dir.join(STORE_FILE_NAME);
            match FileStore::load_from_path(path.clone()) {
                Ok(store) => {
                    tracing::debug!("Using file storage at {:?}", path);
                    return Arc::new(store);
                }
                Err(e) => {
                    tracing::warn!(
                        "File store unavailable ({}), falling back to memory store. \
                         Values will not persist across runs.",
                        e
                    );
                }
            }
        }
        StoreBackend::Keyring => {
            #[cfg(feature = "keyring-store")]
            match KeyringStore::try_new("reunion") {
                Ok(store) => {
                    tracing::info!("Using OS keyring for storage");
                    return Arc::new(store);
                }
                Err(e) => {
                    tracing::warn!(
                        "Keyring unavailable ({}), falling back to memory store. \
                         Values will not persist across runs.",
                        e
                    );
                }
            }

            #[cfg(not(feature = "keyring-store"))]
            tracing::warn!(
                "Keyring storage requested but keyring-store feature not enabled. \
                 Using memory store. Values will not persist across runs."
            );
        }
        StoreBackend::Memory => {}
    }

    tracing::debug!("Using in-memory storage");
    Arc::new(MemoryStore::new())
}
