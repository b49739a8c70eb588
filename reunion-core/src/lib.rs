//! # Reunion Core
//!
//! Core library for the alumni-reunion client.
//!
//! This crate provides:
//! - A total, typed key-value [`StoreAdapter`] over pluggable storage backends
//! - The underlying HTTP call function ([`ApiClient::call`])
//! - Read and write accessors built by a single [`DataAccess`] factory
//! - A [`QueryCache`] that de-duplicates in-flight reads per cache key
//! - Typed endpoints, DTOs and a [`Session`] view over the stored credentials
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reunion_core::{ApiClient, DataAccess, Endpoints, ReunionApi, StoreAdapter, MemoryStore};
//!
//! async fn list_events() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = StoreAdapter::new(MemoryStore::new());
//!     let access = DataAccess::new(ApiClient::new(store));
//!     let api = ReunionApi::new(access, Endpoints::parse("https://reunion.example.com")?);
//!
//!     let events = api.events();
//!     if let Some(events) = events.observe().await.data() {
//!         println!("{} events", events.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod accessor;
pub mod api;
pub mod cache;
pub mod config;
pub mod dto;
pub mod endpoints;
pub mod error;
pub mod model;
pub mod session;
pub mod store;
pub mod transport;

// Re-export commonly used types at crate root
pub use model::{
    CacheKey,
    RequestConfig,
    RequestDescriptor,
    Scalar,
    Verb,
    WriteVerb,
};

pub use store::{
    FileStore,
    KeyValueStore,
    MemoryStore,
    Secret,
    StoreAdapter,
    StoreBackend,
    StoreError,
    create_store,
};

#[cfg(feature = "keyring-store")]
pub use store::KeyringStore;

pub use accessor::{
    Accessor,
    Callbacks,
    DataAccess,
    ReadAccessor,
    ReadState,
    WriteAccessor,
    WriteState,
};

pub use api::ReunionApi;
pub use cache::QueryCache;
pub use config::{ClientConfig, ConfigError};
pub use endpoints::Endpoints;
pub use error::{ApiError, ErrorMessage, ReunionError};
pub use session::{ACCESS_TOKEN_KEY, EMAIL_KEY, Session};
pub use transport::ApiClient;
