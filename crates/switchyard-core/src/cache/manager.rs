//! TTL key-value cache with FIFO bounding and stampede protection.
//!
//! Freshness is decided on every read against the injected [`Clock`]: an
//! entry is expired once `now - inserted_at > ttl`. Each insert also
//! schedules a proactive removal task so memory stays bounded even for keys
//! nobody reads again. The task handle lives next to the entry and is
//! aborted on overwrite, delete and eviction; a generation number guards
//! against a task that fires late for an entry that has since been replaced.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::{join_all, BoxFuture, FutureExt, Shared};
use tokio::task::AbortHandle;
use tracing::debug;

use switchyard_types::error::GatewayError;
use switchyard_types::gateway::CacheStats;

use super::bounded::{BoundedMap, EvictionPolicy};
use crate::clock::Clock;

type SharedLoad<V> = Shared<BoxFuture<'static, Result<V, GatewayError>>>;

struct CacheEntry<V> {
    value: V,
    inserted_at: DateTime<Utc>,
    ttl: Duration,
    generation: u64,
    expiry: Option<AbortHandle>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let age = (now - self.inserted_at).to_std().unwrap_or(Duration::ZERO);
        age > self.ttl
    }

    fn cancel_expiry(&self) {
        if let Some(handle) = &self.expiry {
            handle.abort();
        }
    }
}

/// A loader currently running for a key. Everyone asking for the key while
/// it runs awaits the same shared future.
struct InFlight<V> {
    id: u64,
    future: SharedLoad<V>,
}

struct CacheState<V> {
    entries: BoundedMap<String, CacheEntry<V>>,
    in_flight: HashMap<String, InFlight<V>>,
    next_generation: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<V: Clone> CacheState<V> {
    /// Return a clone of the value if present and fresh. Drops the entry if
    /// it is present but stale.
    fn fresh(&mut self, key: &str, now: DateTime<Utc>) -> Option<V> {
        let key = key.to_string();
        let expired = self.entries.get(&key)?.is_expired(now);
        if expired {
            if let Some(stale) = self.entries.remove(&key) {
                stale.cancel_expiry();
                debug!(key = %key, "Dropped expired cache entry on read");
            }
            return None;
        }
        self.entries.touch(&key);
        self.entries.get(&key).map(|e| e.value.clone())
    }

    /// Freshness check that leaves recency order and stale entries alone.
    fn is_fresh(&self, key: &str, now: DateTime<Utc>) -> bool {
        self.entries
            .get(&key.to_string())
            .is_some_and(|e| !e.is_expired(now))
    }

    fn next_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

/// Generic memoization cache keyed by string.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct CacheManager<V> {
    state: Arc<Mutex<CacheState<V>>>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl<V> CacheManager<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a FIFO cache holding at most `capacity` entries.
    pub fn new(
        capacity: usize,
        default_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GatewayError> {
        Self::with_policy(capacity, default_ttl, EvictionPolicy::Fifo, clock)
    }

    pub fn with_policy(
        capacity: usize,
        default_ttl: Duration,
        policy: EvictionPolicy,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GatewayError> {
        let entries = BoundedMap::new(capacity, policy)?;
        Ok(Self {
            state: Arc::new(Mutex::new(CacheState {
                entries,
                in_flight: HashMap::new(),
                next_generation: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            })),
            clock,
            default_ttl,
        })
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Store `value` under `key` for `ttl` (or the default TTL).
    pub fn set(&self, key: &str, value: V, ttl: Option<Duration>) -> Result<(), GatewayError> {
        validate_key(key)?;
        let mut state = self.lock();
        self.insert_locked(&mut state, key, value, ttl.unwrap_or(self.default_ttl));
        Ok(())
    }

    /// Fetch a fresh value. Absent and expired keys both yield `None`.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut state = self.lock();
        match state.fresh(key, now) {
            Some(value) => {
                state.hits += 1;
                Some(value)
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.lock().is_fresh(key, now)
    }

    /// Remove `key`. Returns whether a fresh entry was removed.
    pub fn delete(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut state = self.lock();
        match state.entries.remove(&key.to_string()) {
            Some(entry) => {
                entry.cancel_expiry();
                !entry.is_expired(now)
            }
            None => false,
        }
    }

    /// Return the cached value for `key`, or run `loader` once and cache its
    /// result.
    ///
    /// Concurrent callers for the same uncached key share one outstanding
    /// computation: the loader is invoked at most once per key at a time and
    /// every caller receives its result. A failed load is returned to all of
    /// them and is not cached.
    ///
    /// `loader` is called while the cache lock is held; it must only build
    /// the future, not touch this cache synchronously.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        loader: F,
        ttl: Option<Duration>,
    ) -> Result<V, GatewayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, GatewayError>> + Send + 'static,
    {
        validate_key(key)?;
        let now = self.clock.now();

        let (flight_id, load) = {
            let mut state = self.lock();
            if let Some(value) = state.fresh(key, now) {
                state.hits += 1;
                debug!(key = %key, "Cache hit");
                return Ok(value);
            }

            if let Some(flight) = state.in_flight.get(key) {
                debug!(key = %key, "Joining in-flight load");
                (flight.id, flight.future.clone())
            } else {
                state.misses += 1;
                let id = state.next_generation();
                let load = loader().boxed().shared();
                state.in_flight.insert(
                    key.to_string(),
                    InFlight {
                        id,
                        future: load.clone(),
                    },
                );
                debug!(key = %key, "Cache miss, loading");
                (id, load)
            }
        };

        let mut waiter = FlightWaiter {
            state: &self.state,
            key,
            flight_id,
            load,
            finished: false,
        };
        let result = (&mut waiter.load).await;
        waiter.finished = true;
        drop(waiter);

        // Whichever waiter finishes first retires the flight and stores the value.
        let mut state = self.lock();
        if state.in_flight.get(key).is_some_and(|f| f.id == flight_id) {
            state.in_flight.remove(key);
            if let Ok(value) = &result {
                self.insert_locked(
                    &mut state,
                    key,
                    value.clone(),
                    ttl.unwrap_or(self.default_ttl),
                );
            }
        }

        result
    }

    /// Run a batch of `get_or_compute` calls concurrently.
    ///
    /// Every entry is awaited. If any fail, the successful ones stay cached
    /// and a single [`GatewayError::Preload`] lists each failure.
    pub async fn preload<F, Fut>(
        &self,
        entries: Vec<(String, F)>,
        ttl: Option<Duration>,
    ) -> Result<Vec<V>, GatewayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, GatewayError>> + Send + 'static,
    {
        let loads = entries.into_iter().map(|(key, loader)| async move {
            let result = self.get_or_compute(&key, loader, ttl).await;
            (key, result)
        });

        let mut values = Vec::new();
        let mut failures = Vec::new();
        for (key, result) in join_all(loads).await {
            match result {
                Ok(value) => values.push(value),
                Err(e) => failures.push(format!("{key}: {e}")),
            }
        }

        if failures.is_empty() {
            Ok(values)
        } else {
            Err(GatewayError::Preload(failures))
        }
    }

    /// Drop every entry and cancel all expiry tasks. In-flight loads are
    /// left to finish.
    pub fn clear(&self) {
        let mut state = self.lock();
        for (_, entry) in state.entries.drain() {
            entry.cancel_expiry();
        }
    }

    /// Number of stored entries, including expired ones not yet collected.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            entries: state.entries.len(),
            capacity: state.entries.capacity(),
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            in_flight: state.in_flight.len(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert_locked(&self, state: &mut CacheState<V>, key: &str, value: V, ttl: Duration) {
        let generation = state.next_generation();
        let expiry = schedule_expiry(Arc::downgrade(&self.state), key.to_string(), generation, ttl);

        let outcome = state.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: self.clock.now(),
                ttl,
                generation,
                expiry,
            },
        );

        if let Some(previous) = outcome.replaced {
            previous.cancel_expiry();
        }
        for (evicted_key, entry) in outcome.evicted {
            entry.cancel_expiry();
            state.evictions += 1;
            debug!(key = %evicted_key, "Evicted oldest cache entry");
        }
    }
}

/// One caller's stake in an in-flight load.
///
/// If the last caller is dropped before the load completes, the flight is
/// removed so the unpolled loader is released and the next caller starts a
/// fresh one.
struct FlightWaiter<'a, V: Clone> {
    state: &'a Mutex<CacheState<V>>,
    key: &'a str,
    flight_id: u64,
    load: SharedLoad<V>,
    finished: bool,
}

impl<V: Clone> Drop for FlightWaiter<'_, V> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        // Two handles left: the map's and ours.
        let abandoned = state
            .in_flight
            .get(self.key)
            .is_some_and(|f| f.id == self.flight_id && self.load.strong_count() == Some(2));
        if abandoned {
            state.in_flight.remove(self.key);
            debug!(key = %self.key, "Abandoned in-flight load dropped");
        }
    }
}

/// Spawn the proactive removal task on the ambient runtime, if any.
///
/// Without a runtime the cache still works; expiry is then purely lazy.
fn schedule_expiry<V: Send + Sync + 'static>(
    state: Weak<Mutex<CacheState<V>>>,
    key: String,
    generation: u64,
    ttl: Duration,
) -> Option<AbortHandle> {
    let handle = tokio::runtime::Handle::try_current().ok()?;
    let task = handle.spawn(async move {
        tokio::time::sleep(ttl).await;
        let Some(state) = state.upgrade() else {
            return;
        };
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        if state
            .entries
            .get(&key)
            .is_some_and(|e| e.generation == generation)
        {
            state.entries.remove(&key);
            debug!(key = %key, "Expired cache entry removed");
        }
    });
    Some(task.abort_handle())
}

fn validate_key(key: &str) -> Result<(), GatewayError> {
    if key.is_empty() {
        return Err(GatewayError::validation("cache key must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache_with_clock(capacity: usize) -> (CacheManager<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let cache =
            CacheManager::new(capacity, Duration::from_secs(60), clock.clone()).unwrap();
        (cache, clock)
    }

    #[test]
    fn test_set_then_get_within_ttl() {
        let (cache, clock) = cache_with_clock(10);
        cache
            .set("k", "v".to_string(), Some(Duration::from_millis(1000)))
            .unwrap();

        clock.advance(Duration::from_millis(999));
        assert_eq!(cache.get("k"), Some("v".to_string()));
    }

    #[test]
    fn test_get_after_ttl_is_absent() {
        let (cache, clock) = cache_with_clock(10);
        cache
            .set("k", "v".to_string(), Some(Duration::from_millis(1000)))
            .unwrap();

        clock.advance(Duration::from_millis(1001));
        assert_eq!(cache.get("k"), None);
        assert!(!cache.has("k"));
        // Stale entry was collected by the read.
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_fifo_eviction_on_capacity() {
        let (cache, _clock) = cache_with_clock(2);
        cache.set("a", "1".to_string(), None).unwrap();
        cache.set("b", "2".to_string(), None).unwrap();
        // Reading "a" does not save it under FIFO.
        assert!(cache.get("a").is_some());
        cache.set("c", "3".to_string(), None).unwrap();

        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some("2".to_string()));
        assert_eq!(cache.get("c"), Some("3".to_string()));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_empty_key_rejected() {
        let (cache, _clock) = cache_with_clock(2);
        let err = cache.set("", "v".to_string(), None).unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        assert_eq!(cache.get(""), None);
        assert!(!cache.has(""));
    }

    #[test]
    fn test_delete_reports_removal() {
        let (cache, clock) = cache_with_clock(4);
        cache.set("k", "v".to_string(), Some(Duration::from_millis(100))).unwrap();
        assert!(cache.delete("k"));
        assert!(!cache.delete("k"));

        cache.set("k", "v".to_string(), Some(Duration::from_millis(100))).unwrap();
        clock.advance(Duration::from_millis(200));
        // Present but stale counts as absent.
        assert!(!cache.delete("k"));
    }

    #[test]
    fn test_reset_refreshes_ttl() {
        let (cache, clock) = cache_with_clock(4);
        cache.set("k", "old".to_string(), Some(Duration::from_millis(100))).unwrap();
        clock.advance(Duration::from_millis(80));
        cache.set("k", "new".to_string(), Some(Duration::from_millis(100))).unwrap();
        clock.advance(Duration::from_millis(80));

        assert_eq!(cache.get("k"), Some("new".to_string()));
    }

    #[test]
    fn test_clear_and_stats() {
        let (cache, _clock) = cache_with_clock(4);
        cache.set("a", "1".to_string(), None).unwrap();
        cache.set("b", "2".to_string(), None).unwrap();
        let _ = cache.get("a");
        let _ = cache.get("zzz");

        let stats = cache.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.capacity, 4);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_get_or_compute_memoizes() {
        let (cache, _clock) = cache_with_clock(4);
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            let value = cache
                .get_or_compute(
                    "k",
                    move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, GatewayError>("computed".to_string())
                    },
                    None,
                )
                .await
                .unwrap();
            assert_eq!(value, "computed");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_compute_does_not_cache_errors() {
        let (cache, _clock) = cache_with_clock(4);

        let err = cache
            .get_or_compute(
                "k",
                || async { Err(GatewayError::Provider("503".to_string())) },
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::Provider("503".to_string()));
        assert!(!cache.has("k"));

        let value = cache
            .get_or_compute("k", || async { Ok::<_, GatewayError>("second".to_string()) }, None)
            .await
            .unwrap();
        assert_eq!(value, "second");
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_load() {
        let (cache, _clock) = cache_with_clock(4);
        let cache = Arc::new(cache);
        let calls = Arc::new(AtomicUsize::new(0));
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let release_rx = Arc::new(Mutex::new(Some(release_rx)));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let cache = cache.clone();
            let calls = calls.clone();
            let release_rx = release_rx.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute(
                        "shared",
                        move || {
                            let rx = release_rx.lock().unwrap().take();
                            async move {
                                calls.fetch_add(1, Ordering::SeqCst);
                                if let Some(rx) = rx {
                                    let _ = rx.await;
                                }
                                Ok::<_, GatewayError>("one".to_string())
                            }
                        },
                        None,
                    )
                    .await
            }));
        }

        // Let every task reach the cache before the loader completes.
        while cache.stats().misses == 0 {
            tokio::task::yield_now().await;
        }
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        release_tx.send(()).unwrap();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "one");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().in_flight, 0);
        assert!(cache.has("shared"));
    }

    #[tokio::test]
    async fn test_joined_callers_receive_the_same_error() {
        let (cache, _clock) = cache_with_clock(4);
        let cache = Arc::new(cache);
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let leader = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_compute(
                        "k",
                        move || async move {
                            let _ = release_rx.await;
                            Err::<String, _>(GatewayError::Provider("boom".to_string()))
                        },
                        None,
                    )
                    .await
            })
        };
        while cache.stats().in_flight == 0 {
            tokio::task::yield_now().await;
        }

        let follower = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_compute("k", || async { Ok::<_, GatewayError>("never".to_string()) }, None)
                    .await
            })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        release_tx.send(()).unwrap();

        let boom = GatewayError::Provider("boom".to_string());
        assert_eq!(leader.await.unwrap().unwrap_err(), boom);
        assert_eq!(follower.await.unwrap().unwrap_err(), boom);
        assert!(!cache.has("k"));
    }

    #[tokio::test]
    async fn test_cancelled_callers_release_in_flight_load() {
        let (cache, _clock) = cache_with_clock(4);
        let cache = Arc::new(cache);

        for key in ["k0", "k1", "k2"] {
            let task = {
                let cache = cache.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_compute(
                            key,
                            || futures_util::future::pending::<Result<String, GatewayError>>(),
                            None,
                        )
                        .await
                })
            };
            while cache.stats().in_flight == 0 {
                tokio::task::yield_now().await;
            }
            task.abort();
            assert!(task.await.unwrap_err().is_cancelled());
        }
        assert_eq!(cache.stats().in_flight, 0);

        let value = tokio::time::timeout(
            Duration::from_secs(1),
            cache.get_or_compute("k0", || async { Ok::<_, GatewayError>("fresh".to_string()) }, None),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(value, "fresh");
    }

    #[tokio::test]
    async fn test_cancelled_leader_keeps_load_for_remaining_waiter() {
        let (cache, _clock) = cache_with_clock(4);
        let cache = Arc::new(cache);
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let leader = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_compute(
                        "k",
                        move || async move {
                            let _ = release_rx.await;
                            Ok::<_, GatewayError>("shared".to_string())
                        },
                        None,
                    )
                    .await
            })
        };
        while cache.stats().in_flight == 0 {
            tokio::task::yield_now().await;
        }

        let follower = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_compute("k", || async { Ok::<_, GatewayError>("never".to_string()) }, None)
                    .await
            })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        leader.abort();
        assert!(leader.await.unwrap_err().is_cancelled());
        assert_eq!(cache.stats().in_flight, 1);

        release_tx.send(()).unwrap();
        assert_eq!(follower.await.unwrap().unwrap(), "shared");
        assert_eq!(cache.stats().in_flight, 0);
        assert!(cache.has("k"));
    }

    #[test]
    fn test_has_does_not_refresh_lru_order() {
        let clock = Arc::new(ManualClock::default());
        let cache = CacheManager::<String>::with_policy(
            2,
            Duration::from_secs(60),
            EvictionPolicy::Lru,
            clock,
        )
        .unwrap();
        cache.set("a", "1".to_string(), None).unwrap();
        cache.set("b", "2".to_string(), None).unwrap();
        assert!(cache.has("a"));
        cache.set("c", "3".to_string(), None).unwrap();

        assert!(!cache.has("a"));
        assert!(cache.has("b"));
        assert!(cache.has("c"));
    }

    #[tokio::test]
    async fn test_preload_aggregates_failures() {
        let (cache, _clock) = cache_with_clock(8);

        let entries: Vec<(String, Box<dyn FnOnce() -> BoxFuture<'static, Result<String, GatewayError>>>)> = vec![
            ("a".to_string(), Box::new(|| async { Ok("A".to_string()) }.boxed())),
            (
                "b".to_string(),
                Box::new(|| async { Err(GatewayError::Provider("down".to_string())) }.boxed()),
            ),
            ("c".to_string(), Box::new(|| async { Ok("C".to_string()) }.boxed())),
        ];

        let err = cache.preload(entries, None).await.unwrap_err();
        match err {
            GatewayError::Preload(failures) => {
                assert_eq!(failures.len(), 1);
                assert!(failures[0].starts_with("b:"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(cache.has("a"));
        assert!(cache.has("c"));
        assert!(!cache.has("b"));
    }

    #[tokio::test]
    async fn test_preload_all_succeed() {
        let (cache, _clock) = cache_with_clock(8);
        let entries = vec![
            ("x".to_string(), || async { Ok::<_, GatewayError>("1".to_string()) }),
        ];
        let values = cache.preload(entries, None).await.unwrap();
        assert_eq!(values, vec!["1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_task_removes_entry_without_reads() {
        let cache = CacheManager::new(
            4,
            Duration::from_secs(60),
            Arc::new(crate::clock::SystemClock),
        )
        .unwrap();
        cache
            .set("k", "v".to_string(), Some(Duration::from_millis(50)))
            .unwrap();
        assert_eq!(cache.len(), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_cancels_previous_expiry_task() {
        let cache = CacheManager::new(
            4,
            Duration::from_secs(60),
            Arc::new(crate::clock::SystemClock),
        )
        .unwrap();
        cache
            .set("k", "old".to_string(), Some(Duration::from_millis(50)))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        cache
            .set("k", "new".to_string(), Some(Duration::from_secs(10)))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k"), Some("new".to_string()));
    }
}
