//! Read accessors.

use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::cache::{Outcome, QueryCache};
use crate::error::ApiError;
use crate::model::{CacheKey, RequestDescriptor};
use crate::transport::ApiClient;

/// State of a read.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadState<T> {
    /// No settled result yet, or a fetch has not been observed.
    Pending,
    Failed(ApiError),
    Succeeded(T),
}

impl<T> ReadState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Succeeded(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Convert into a `Result`, treating `Pending` as `None`.
    pub fn into_result(self) -> Option<Result<T, ApiError>> {
        match self {
            Self::Pending => None,
            Self::Failed(err) => Some(Err(err)),
            Self::Succeeded(data) => Some(Ok(data)),
        }
    }
}

impl<T: DeserializeOwned> ReadState<T> {
    fn from_outcome(outcome: Outcome) -> Self {
        match outcome.and_then(|value| {
            serde_json::from_value(value).map_err(|e| ApiError::Decode {
                message: e.to_string(),
            })
        }) {
            Ok(data) => Self::Succeeded(data),
            Err(err) => Self::Failed(err),
        }
    }
}

/// Handle on a cached read.
///
/// The first [`observe`](Self::observe) fetches; later observations reuse the
/// settled result for the key. Every read of the same key, through any
/// accessor sharing the cache, waits on at most one in-flight call.
pub struct ReadAccessor<T> {
    client: ApiClient,
    cache: Arc<QueryCache>,
    key: CacheKey,
    descriptor: RequestDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ReadAccessor<T> {
    pub(crate) fn new(
        client: ApiClient,
        cache: Arc<QueryCache>,
        key: CacheKey,
        descriptor: RequestDescriptor,
    ) -> Self {
        Self {
            client,
            cache,
            key,
            descriptor,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    /// Whether a call for this accessor's key is in flight.
    pub fn is_fetching(&self) -> bool {
        self.cache.is_fetching(&self.key)
    }

    /// Point the accessor at a different cache key.
    ///
    /// The key is scoped with the request target and query, as
    /// [`DataAccess::read`](crate::DataAccess::read) does. The next
    /// [`observe`](Self::observe) fetches unless the scoped key already has
    /// a settled result.
    pub fn with_key(mut self, key: impl Into<CacheKey>) -> Self {
        self.key = key.into().with_part(self.descriptor.fingerprint());
        self
    }
}

impl<T: DeserializeOwned> ReadAccessor<T> {
    /// Current state without triggering a call.
    ///
    /// `Pending` while a call for the key is in flight, including a
    /// [`refetch`](Self::refetch) of a key that already settled. The
    /// previous result stays available through the cache until the new one
    /// settles.
    pub fn state(&self) -> ReadState<T> {
        if self.cache.is_fetching(&self.key) {
            return ReadState::Pending;
        }
        match self.cache.peek(&self.key) {
            Some(outcome) => ReadState::from_outcome(outcome),
            None => ReadState::Pending,
        }
    }

    /// Observe the read, fetching on first observation.
    ///
    /// Returns the settled state for the key, joining an in-flight call if
    /// one exists.
    pub async fn observe(&self) -> ReadState<T> {
        let outcome = self
            .cache
            .resolve(&self.key, || self.client.call(&self.descriptor, None))
            .await;
        ReadState::from_outcome(outcome)
    }

    /// Re-issue the read regardless of any settled result.
    pub async fn refetch(&self) -> ReadState<T> {
        let outcome = self
            .cache
            .fetch(&self.key, || self.client.call(&self.descriptor, None))
            .await;
        ReadState::from_outcome(outcome)
    }
}

impl<T> std::fmt::Debug for ReadAccessor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadAccessor")
            .field("key", &self.key)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_helpers() {
        let pending: ReadState<u32> = ReadState::Pending;
        assert!(pending.is_pending());
        assert!(pending.data().is_none());
        assert!(pending.clone().into_result().is_none());

        let ok = ReadState::Succeeded(7u32);
        assert!(ok.is_success());
        assert_eq!(ok.data(), Some(&7));

        let err: ReadState<u32> = ReadState::Failed(ApiError::Network {
            message: "down".to_string(),
        });
        assert!(err.is_error());
        assert!(err.error().unwrap().is_network());
    }

    #[test]
    fn test_from_outcome_decodes_or_fails() {
        let ok: ReadState<Vec<u32>> = ReadState::from_outcome(Ok(json!([1, 2])));
        assert_eq!(ok, ReadState::Succeeded(vec![1, 2]));

        let bad: ReadState<Vec<u32>> = ReadState::from_outcome(Ok(json!({ "not": "a list" })));
        assert!(matches!(bad, ReadState::Failed(ApiError::Decode { .. })));
    }
}
