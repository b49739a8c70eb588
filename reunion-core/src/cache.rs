//! Shared cache of read results.
//!
//! [`QueryCache`] is the layer read accessors delegate de-duplication to.
//! For each [`CacheKey`] it tracks the last settled outcome and at most one
//! in-flight call. Concurrent reads of a key wait on the in-flight call
//! instead of issuing their own.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::error::ApiError;
use crate::model::CacheKey;

/// Outcome of one read call, shared by every observer of its key.
pub type Outcome = Result<Value, ApiError>;

#[derive(Default)]
struct Slot {
    settled: Option<Settled>,
    in_flight: Option<watch::Receiver<Option<Outcome>>>,
}

struct Settled {
    outcome: Outcome,
    at: DateTime<Utc>,
}

enum Role {
    /// This caller runs the fetch and publishes the outcome.
    Lead(watch::Sender<Option<Outcome>>),
    /// Another caller is fetching; wait for its outcome.
    Follow(watch::Receiver<Option<Outcome>>),
}

/// Per-key store of read outcomes with in-flight de-duplication.
///
/// # Thread Safety
///
/// Bookkeeping is guarded by a `parking_lot::Mutex` that is never held
/// across an await point.
#[derive(Default)]
pub struct QueryCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last settled outcome for `key`.
    pub fn peek(&self, key: &CacheKey) -> Option<Outcome> {
        self.slots
            .lock()
            .get(key)
            .and_then(|slot| slot.settled.as_ref())
            .map(|settled| settled.outcome.clone())
    }

    /// When `key` last settled.
    pub fn fetched_at(&self, key: &CacheKey) -> Option<DateTime<Utc>> {
        self.slots
            .lock()
            .get(key)
            .and_then(|slot| slot.settled.as_ref())
            .map(|settled| settled.at)
    }

    /// Whether a call for `key` is currently in flight.
    pub fn is_fetching(&self, key: &CacheKey) -> bool {
        self.slots
            .lock()
            .get(key)
            .and_then(|slot| slot.in_flight.as_ref())
            .is_some_and(|rx| rx.has_changed().is_ok())
    }

    /// Return the settled outcome for `key`, fetching only if there is none
    /// or a call is already in flight.
    pub async fn resolve<F, Fut>(&self, key: &CacheKey, fetcher: F) -> Outcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome>,
    {
        if !self.is_fetching(key) {
            if let Some(outcome) = self.peek(key) {
                trace!(%key, "Serving settled read");
                return outcome;
            }
        }
        self.fetch(key, fetcher).await
    }

    /// Fetch `key`, joining an in-flight call if there is one.
    ///
    /// The outcome becomes the key's settled result. If the caller running
    /// the in-flight fetch is dropped before it settles, a waiting caller
    /// takes over and runs its own `fetcher`.
    pub async fn fetch<F, Fut>(&self, key: &CacheKey, fetcher: F) -> Outcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome>,
    {
        loop {
            let role = {
                let mut slots = self.slots.lock();
                let slot = slots.entry(key.clone()).or_default();
                match slot.in_flight.as_ref() {
                    Some(rx) if rx.has_changed().is_ok() => Role::Follow(rx.clone()),
                    _ => {
                        let (tx, rx) = watch::channel(None);
                        slot.in_flight = Some(rx);
                        Role::Lead(tx)
                    }
                }
            };

            match role {
                Role::Lead(tx) => {
                    debug!(%key, "Fetching read");
                    let outcome = fetcher().await;
                    self.settle(key, &outcome);
                    tx.send_replace(Some(outcome.clone()));
                    return outcome;
                }
                Role::Follow(mut rx) => {
                    trace!(%key, "Joining in-flight read");
                    if let Ok(published) = rx.wait_for(Option::is_some).await {
                        if let Some(outcome) = (*published).clone() {
                            return outcome;
                        }
                    }
                    debug!(%key, "In-flight read was abandoned; retrying");
                }
            }
        }
    }

    /// Forget the settled outcome for `key`.
    ///
    /// An in-flight call is left alone and will settle normally.
    pub fn invalidate(&self, key: &CacheKey) {
        if let Some(slot) = self.slots.lock().get_mut(key) {
            slot.settled = None;
        }
    }

    /// Forget every settled outcome.
    pub fn clear(&self) {
        for slot in self.slots.lock().values_mut() {
            slot.settled = None;
        }
    }

    fn settle(&self, key: &CacheKey, outcome: &Outcome) {
        let mut slots = self.slots.lock();
        let slot = slots.entry(key.clone()).or_default();
        slot.settled = Some(Settled {
            outcome: outcome.clone(),
            at: Utc::now(),
        });
        slot.in_flight = None;
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("keys_count", &self.slots.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counting_fetch(
        calls: &Arc<AtomicUsize>,
        value: Value,
    ) -> impl Future<Output = Outcome> + use<> {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(value)
        }
    }

    #[tokio::test]
    async fn test_fetch_settles_outcome() {
        let cache = QueryCache::new();
        let key = CacheKey::new("events");
        assert!(cache.peek(&key).is_none());
        assert!(cache.fetched_at(&key).is_none());

        let outcome = cache.fetch(&key, || async { Ok(json!([1, 2])) }).await;
        assert_eq!(outcome, Ok(json!([1, 2])));
        assert_eq!(cache.peek(&key), Some(Ok(json!([1, 2]))));
        assert!(cache.fetched_at(&key).is_some());
        assert!(!cache.is_fetching(&key));
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_one_call() {
        let cache = Arc::new(QueryCache::new());
        let key = CacheKey::new("events");
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b, c) = tokio::join!(
            cache.fetch(&key, || counting_fetch(&calls, json!("first"))),
            cache.fetch(&key, || counting_fetch(&calls, json!("second"))),
            cache.fetch(&key, || counting_fetch(&calls, json!("third"))),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a, Ok(json!("first")));
        assert_eq!(b, Ok(json!("first")));
        assert_eq!(c, Ok(json!("first")));
    }

    #[tokio::test]
    async fn test_distinct_keys_fetch_independently() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let events = CacheKey::new("events");
        let me = CacheKey::new("me");

        let (a, b) = tokio::join!(
            cache.fetch(&events, || counting_fetch(&calls, json!("e"))),
            cache.fetch(&me, || counting_fetch(&calls, json!("m"))),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(a, Ok(json!("e")));
        assert_eq!(b, Ok(json!("m")));
    }

    #[tokio::test]
    async fn test_resolve_serves_settled_outcome() {
        let cache = QueryCache::new();
        let key = CacheKey::new("me");
        let calls = Arc::new(AtomicUsize::new(0));

        cache.resolve(&key, || counting_fetch(&calls, json!(1))).await.unwrap();
        let second = cache.resolve(&key, || counting_fetch(&calls, json!(2))).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(second, Ok(json!(1)));

        // An explicit fetch always goes to the network
        let third = cache.fetch(&key, || counting_fetch(&calls, json!(3))).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(third, Ok(json!(3)));
    }

    #[tokio::test]
    async fn test_failures_are_settled_too() {
        let cache = QueryCache::new();
        let key = CacheKey::new("me");
        let err = ApiError::Status {
            status: 401,
            url: "http://localhost/auth/me".to_string(),
            body: None,
        };

        let outcome = cache.fetch(&key, || async { Err(err.clone()) }).await;
        assert_eq!(outcome, Err(err.clone()));
        assert_eq!(cache.peek(&key), Some(Err(err)));
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = QueryCache::new();
        let events = CacheKey::new("events");
        let me = CacheKey::new("me");

        cache.fetch(&events, || async { Ok(json!(1)) }).await.unwrap();
        cache.fetch(&me, || async { Ok(json!(2)) }).await.unwrap();

        cache.invalidate(&events);
        assert!(cache.peek(&events).is_none());
        assert!(cache.peek(&me).is_some());

        cache.clear();
        assert!(cache.peek(&me).is_none());
    }

    #[tokio::test]
    async fn test_follower_takes_over_abandoned_fetch() {
        let cache = Arc::new(QueryCache::new());
        let key = CacheKey::new("events");

        let leader = {
            let cache = cache.clone();
            let key = key.clone();
            tokio::spawn(async move {
                cache
                    .fetch(&key, || async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        Ok(json!("never"))
                    })
                    .await
            })
        };

        // Let the leader register its in-flight call
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cache.is_fetching(&key));

        let follower = {
            let cache = cache.clone();
            let key = key.clone();
            tokio::spawn(async move { cache.fetch(&key, || async { Ok(json!("takeover")) }).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        leader.abort();

        let outcome = follower.await.unwrap();
        assert_eq!(outcome, Ok(json!("takeover")));
        assert_eq!(cache.peek(&key), Some(Ok(json!("takeover"))));
    }
}
