//! Read and write accessors behind a single factory.
//!
//! This module provides:
//! - [`DataAccess`] - Factory that builds accessors over a shared client and cache
//! - [`Accessor`] - Tagged result of the factory: a read or a write accessor
//! - [`ReadAccessor`] / [`ReadState`] - Auto-triggering, cached reads
//! - [`WriteAccessor`] / [`WriteState`] / [`Callbacks`] - Explicitly triggered writes
//!
//! # Choosing Read or Write
//!
//! [`DataAccess::accessor`] dispatches on the verb: [`Verb::Read`] builds a
//! read accessor, every other verb a write accessor. The verb is captured in
//! the accessor's descriptor and cannot change afterwards; a call site that
//! needs a different verb builds a new accessor.
//!
//! # Example
//!
//! ```rust,ignore
//! use reunion_core::{Accessor, DataAccess, RequestConfig, Verb};
//!
//! match access.accessor::<(), Vec<Event>>(Verb::Read, true, "events", config) {
//!     Accessor::Read(events) => println!("{:?}", events.observe().await),
//!     Accessor::Write(_) => unreachable!("read verb"),
//! }
//! ```

use std::sync::Arc;

use crate::cache::QueryCache;
use crate::model::{CacheKey, RequestConfig, RequestDescriptor, Verb, WriteVerb};
use crate::transport::ApiClient;

mod read;
mod write;

pub use read::{ReadAccessor, ReadState};
pub use write::{Callbacks, WriteAccessor, WriteState};

/// Either kind of accessor, as returned by [`DataAccess::accessor`].
pub enum Accessor<Req, Resp> {
    Read(ReadAccessor<Resp>),
    Write(WriteAccessor<Req, Resp>),
}

impl<Req, Resp> Accessor<Req, Resp> {
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Read(_))
    }

    /// The read accessor, or `None` for a write.
    pub fn into_read(self) -> Option<ReadAccessor<Resp>> {
        match self {
            Self::Read(read) => Some(read),
            Self::Write(_) => None,
        }
    }

    /// The write accessor, or `None` for a read.
    pub fn into_write(self) -> Option<WriteAccessor<Req, Resp>> {
        match self {
            Self::Read(_) => None,
            Self::Write(write) => Some(write),
        }
    }
}

impl<Req, Resp> std::fmt::Debug for Accessor<Req, Resp> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(read) => f.debug_tuple("Read").field(read).finish(),
            Self::Write(write) => f.debug_tuple("Write").field(write).finish(),
        }
    }
}

/// Factory for accessors sharing one client and one query cache.
///
/// Cloning is cheap; clones share the cache, so reads built from any clone
/// de-duplicate against each other.
#[derive(Debug, Clone)]
pub struct DataAccess {
    client: ApiClient,
    cache: Arc<QueryCache>,
}

impl DataAccess {
    /// Create a factory with a fresh cache.
    pub fn new(client: ApiClient) -> Self {
        Self::with_cache(client, Arc::new(QueryCache::new()))
    }

    /// Create a factory over an existing cache.
    pub fn with_cache(client: ApiClient, cache: Arc<QueryCache>) -> Self {
        Self { client, cache }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Build the accessor for one call site.
    ///
    /// `key` is only used by reads; it is scoped with the request target and
    /// query so equal names for different targets do not share results.
    pub fn accessor<Req, Resp>(
        &self,
        verb: Verb,
        requires_auth: bool,
        key: impl Into<CacheKey>,
        config: RequestConfig,
    ) -> Accessor<Req, Resp> {
        match verb.as_write() {
            None => Accessor::Read(self.read(requires_auth, key, config)),
            Some(write) => Accessor::Write(self.write(write, requires_auth, config)),
        }
    }

    /// Build a read accessor.
    pub fn read<Resp>(
        &self,
        requires_auth: bool,
        key: impl Into<CacheKey>,
        config: RequestConfig,
    ) -> ReadAccessor<Resp> {
        let key = key.into().with_part(config.fingerprint());
        let descriptor = RequestDescriptor::from_config(Verb::Read, requires_auth, config);
        ReadAccessor::new(self.client.clone(), self.cache.clone(), key, descriptor)
    }

    /// Build a write accessor.
    pub fn write<Req, Resp>(
        &self,
        verb: WriteVerb,
        requires_auth: bool,
        config: RequestConfig,
    ) -> WriteAccessor<Req, Resp> {
        let descriptor = RequestDescriptor::from_config(verb.into(), requires_auth, config);
        WriteAccessor::new(self.client.clone(), descriptor)
    }
}
