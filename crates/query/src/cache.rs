//! Generic per-key query cache.
//!
//! Every key carries a monotonic generation counter that survives
//! invalidation. A fetch captures the generation it started at and its
//! result is written back only if that generation is still current, so a
//! slow response can never overwrite data requested after an invalidation.
//! Readers of the same key and generation share one spawned fetch task.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::debug;
use trialdesk_api::ServiceError;
use trialdesk_api_client::RetryConfig;
use trialdesk_api_client::retry::retry;

/// What a reader receives: shared data or the error that ended the fetch.
pub type Fetched<V> = Result<Arc<V>, ServiceError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueryStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Point-in-time view of one key, as published to subscribers.
#[derive(Debug)]
pub struct QuerySnapshot<V> {
    pub status: QueryStatus,
    /// Last successful result. Kept while a refetch is loading.
    pub data: Option<Arc<V>>,
    pub error: Option<ServiceError>,
    /// Invalidated since `data` was fetched.
    pub stale: bool,
    pub generation: u64,
}

impl<V> Clone for QuerySnapshot<V> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            stale: self.stale,
            generation: self.generation,
        }
    }
}

impl<V> Default for QuerySnapshot<V> {
    fn default() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            stale: false,
            generation: 0,
        }
    }
}

impl<V> QuerySnapshot<V> {
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryConfig {
    pub retry: RetryConfig,
    /// How long a successful result stays fresh. `None` keeps it fresh until
    /// the key is invalidated.
    pub stale_time: Option<Duration>,
}

/// Shared bookkeeping for one spawned fetch.
///
/// Mutated only while the cache lock is held, so joining, releasing and
/// completing a flight are totally ordered.
struct FlightHandle {
    generation: u64,
    waiters: AtomicUsize,
    done: AtomicBool,
    abort: OnceLock<AbortHandle>,
}

struct Flight<V> {
    handle: Arc<FlightHandle>,
    result: watch::Receiver<Option<Fetched<V>>>,
    /// Status to restore if every waiter leaves before the fetch finishes.
    prior: QueryStatus,
}

struct Entry<V> {
    status: QueryStatus,
    data: Option<Arc<V>>,
    error: Option<ServiceError>,
    generation: u64,
    stale: bool,
    fetched_at: Option<Instant>,
    in_flight: Option<Flight<V>>,
    notify: watch::Sender<QuerySnapshot<V>>,
}

impl<V> Entry<V> {
    fn new() -> Self {
        let (notify, _) = watch::channel(QuerySnapshot::default());
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            generation: 0,
            stale: false,
            fetched_at: None,
            in_flight: None,
            notify,
        }
    }

    fn snapshot(&self) -> QuerySnapshot<V> {
        QuerySnapshot {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            stale: self.stale,
            generation: self.generation,
        }
    }

    fn publish(&self) {
        self.notify.send_replace(self.snapshot());
    }

    fn is_fresh(&self, stale_time: Option<Duration>) -> bool {
        if self.status != QueryStatus::Success || self.stale {
            return false;
        }
        match (stale_time, self.fetched_at) {
            (None, _) => true,
            (Some(ttl), Some(at)) => at.elapsed() < ttl,
            (Some(_), None) => false,
        }
    }

    fn is_current(&self, flight: &Arc<FlightHandle>) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|f| Arc::ptr_eq(&f.handle, flight))
    }

    fn mark_stale(&mut self) {
        self.generation += 1;
        self.stale = true;
        self.publish();
    }
}

enum Lookup<V> {
    Fresh(Arc<V>),
    Wait(watch::Receiver<Option<Fetched<V>>>, Arc<FlightHandle>),
}

struct Inner<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    config: QueryConfig,
}

/// Single-flight cache of async query results.
///
/// Cheap to clone; clones share entries.
pub struct QueryCache<K, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for QueryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Default for QueryCache<K, V> {
    fn default() -> Self {
        Self::new(QueryConfig::default())
    }
}

impl<K, V> QueryCache<K, V> {
    pub fn new(config: QueryConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                config,
            }),
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.inner.config
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Read `key`, running `fetcher` only when no fresh data and no
    /// same-generation request exist.
    ///
    /// Dropping the returned future leaves the shared request running for
    /// other readers; the last reader to leave aborts it.
    pub async fn fetch<F, Fut>(&self, key: K, fetcher: F) -> Fetched<V>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, ServiceError>> + Send + 'static,
    {
        let (mut result, flight) = match self.lookup(&key, fetcher) {
            Lookup::Fresh(data) => return Ok(data),
            Lookup::Wait(result, flight) => (result, flight),
        };
        let _waiter = Waiter {
            cache: self,
            key: &key,
            flight,
        };

        let outcome = match result.wait_for(Option::is_some).await {
            Ok(done) => (*done).clone(),
            Err(_) => None,
        };
        outcome.unwrap_or_else(|| Err(ServiceError::Internal("query cancelled".into())))
    }

    fn lookup<F, Fut>(&self, key: &K, fetcher: F) -> Lookup<V>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, ServiceError>> + Send + 'static,
    {
        let mut entries = self.entries();
        let entry = entries.entry(key.clone()).or_insert_with(Entry::new);

        if entry.is_fresh(self.inner.config.stale_time) {
            if let Some(data) = &entry.data {
                debug!(?key, "query cache hit");
                return Lookup::Fresh(Arc::clone(data));
            }
        }

        if let Some(flight) = &entry.in_flight {
            if flight.handle.generation == entry.generation {
                flight.handle.waiters.fetch_add(1, Ordering::SeqCst);
                debug!(?key, generation = entry.generation, "joining in-flight query");
                return Lookup::Wait(flight.result.clone(), Arc::clone(&flight.handle));
            }
        }

        let generation = entry.generation;
        let handle = Arc::new(FlightHandle {
            generation,
            waiters: AtomicUsize::new(1),
            done: AtomicBool::new(false),
            abort: OnceLock::new(),
        });
        let (tx, rx) = watch::channel(None);
        // A superseded flight keeps running for its own waiters; the status
        // to fall back to is the one from before it started.
        let prior = entry
            .in_flight
            .as_ref()
            .map_or(entry.status, |old| old.prior);
        entry.in_flight = Some(Flight {
            handle: Arc::clone(&handle),
            result: rx.clone(),
            prior,
        });
        entry.status = QueryStatus::Loading;
        entry.publish();

        let task = tokio::spawn(self.clone().run(key.clone(), Arc::clone(&handle), tx, fetcher));
        let _ = handle.abort.set(task.abort_handle());
        debug!(?key, generation, "query started");

        Lookup::Wait(rx, handle)
    }

    async fn run<F, Fut>(
        self,
        key: K,
        flight: Arc<FlightHandle>,
        tx: watch::Sender<Option<Fetched<V>>>,
        fetcher: F,
    ) where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, ServiceError>> + Send + 'static,
    {
        let label = format!("query {key:?}");
        let result = retry(&self.inner.config.retry, &label, &fetcher)
            .await
            .map(Arc::new);
        self.complete(&key, &flight, &result);
        tx.send_replace(Some(result));
    }

    /// Apply a finished fetch if it is still the current one.
    fn complete(&self, key: &K, flight: &Arc<FlightHandle>, result: &Fetched<V>) {
        let mut entries = self.entries();
        flight.done.store(true, Ordering::SeqCst);
        let Some(entry) = entries.get_mut(key) else {
            debug!(?key, "query entry removed before fetch finished");
            return;
        };
        if !entry.is_current(flight) {
            debug!(?key, generation = flight.generation, "discarding superseded query result");
            return;
        }
        let prior = entry.in_flight.take().map(|f| f.prior);

        if flight.generation != entry.generation {
            debug!(
                ?key,
                fetched = flight.generation,
                current = entry.generation,
                "discarding stale query result"
            );
            if let Some(prior) = prior {
                entry.status = prior;
            }
            entry.publish();
            return;
        }

        match result {
            Ok(data) => {
                entry.data = Some(Arc::clone(data));
                entry.error = None;
                entry.status = QueryStatus::Success;
                entry.fetched_at = Some(Instant::now());
            }
            Err(e) => {
                entry.data = None;
                entry.error = Some(e.clone());
                entry.status = QueryStatus::Error;
                entry.fetched_at = None;
            }
        }
        entry.stale = false;
        debug!(?key, status = entry.status.as_str(), "query settled");
        entry.publish();
    }

    /// Drop one waiter; abort the fetch when nobody is left waiting for it.
    fn release(&self, key: &K, flight: &Arc<FlightHandle>) {
        let mut entries = self.entries();
        let remaining = flight.waiters.fetch_sub(1, Ordering::SeqCst) - 1;
        if remaining > 0 || flight.done.load(Ordering::SeqCst) {
            return;
        }
        flight.done.store(true, Ordering::SeqCst);
        if let Some(abort) = flight.abort.get() {
            abort.abort();
        }
        debug!(?key, generation = flight.generation, "last waiter left, query cancelled");

        if let Some(entry) = entries.get_mut(key) {
            if entry.is_current(flight) {
                if let Some(f) = entry.in_flight.take() {
                    entry.status = f.prior;
                }
                entry.publish();
            }
        }
    }

    // ── Invalidation ──────────────────────────────────────────────────────

    /// Mark `key` stale. Data stays visible until the next read refetches it.
    /// Returns whether the key was cached.
    pub fn invalidate(&self, key: &K) -> bool {
        let mut entries = self.entries();
        match entries.get_mut(key) {
            Some(entry) => {
                entry.mark_stale();
                debug!(?key, generation = entry.generation, "query invalidated");
                true
            }
            None => false,
        }
    }

    /// Mark every cached key matching `pred` stale; returns how many matched.
    pub fn invalidate_where(&self, mut pred: impl FnMut(&K) -> bool) -> usize {
        let mut entries = self.entries();
        let mut count = 0;
        for (key, entry) in entries.iter_mut() {
            if pred(key) {
                entry.mark_stale();
                debug!(?key, generation = entry.generation, "query invalidated");
                count += 1;
            }
        }
        count
    }

    pub fn invalidate_all(&self) -> usize {
        self.invalidate_where(|_| true)
    }

    // ── Observation ───────────────────────────────────────────────────────

    /// Watch `key`; the receiver sees every status transition.
    pub fn subscribe(&self, key: &K) -> watch::Receiver<QuerySnapshot<V>> {
        let mut entries = self.entries();
        entries
            .entry(key.clone())
            .or_insert_with(Entry::new)
            .notify
            .subscribe()
    }

    /// Live receivers handed out by [`subscribe`](Self::subscribe).
    pub fn subscriber_count(&self, key: &K) -> usize {
        self.entries()
            .get(key)
            .map_or(0, |e| e.notify.receiver_count())
    }

    /// Readers currently awaiting the key's in-flight request.
    pub fn waiter_count(&self, key: &K) -> usize {
        self.entries()
            .get(key)
            .and_then(|e| e.in_flight.as_ref())
            .map_or(0, |f| f.handle.waiters.load(Ordering::SeqCst))
    }

    pub fn snapshot(&self, key: &K) -> QuerySnapshot<V> {
        self.entries()
            .get(key)
            .map(Entry::snapshot)
            .unwrap_or_default()
    }

    /// Forget `key`. An in-flight request still answers its readers but is
    /// not cached.
    pub fn remove(&self, key: &K) -> Option<QuerySnapshot<V>> {
        self.entries().remove(key).map(|e| e.snapshot())
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

struct Waiter<'a, K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    cache: &'a QueryCache<K, V>,
    key: &'a K,
    flight: Arc<FlightHandle>,
}

impl<K, V> Drop for Waiter<'_, K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.cache.release(self.key, &self.flight);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use tokio::time::sleep;

    type BoxFut<T> = Pin<Box<dyn Future<Output = Result<T, ServiceError>> + Send>>;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Fetcher that counts its invocations and resolves `value` after `delay`.
    fn counting(
        calls: &Arc<AtomicUsize>,
        delay: Duration,
        value: &'static str,
    ) -> impl Fn() -> BoxFut<&'static str> + Send + Sync + 'static {
        let calls = Arc::clone(calls);
        move || -> BoxFut<&'static str> {
            let calls = Arc::clone(&calls);
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                sleep(delay).await;
                Ok(value)
            })
        }
    }

    fn failing(calls: &Arc<AtomicUsize>) -> impl Fn() -> BoxFut<&'static str> + Send + Sync + 'static {
        let calls = Arc::clone(calls);
        move || -> BoxFut<&'static str> {
            calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Err(ServiceError::NotFound("site not found: site_x".into())) })
        }
    }

    fn cache() -> QueryCache<&'static str, &'static str> {
        QueryCache::new(QueryConfig::default())
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn concurrent_reads_share_one_fetch() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let (a, b) = tokio::join!(
            cache.fetch("k", counting(&calls, ms(800), "v")),
            cache.fetch("k", counting(&calls, ms(800), "v")),
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(cache.snapshot(&"k").status, QueryStatus::Success);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn fresh_data_is_served_without_fetching() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        cache.fetch("k", counting(&calls, ms(800), "v")).await.unwrap();

        let start = Instant::now();
        let v = cache.fetch("k", counting(&calls, ms(800), "v")).await.unwrap();
        assert_eq!(*v, "v");
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn invalidated_data_stays_visible_until_refetch_resolves() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        cache.fetch("k", counting(&calls, ms(800), "v1")).await.unwrap();

        assert!(cache.invalidate(&"k"));
        let snap = cache.snapshot(&"k");
        assert!(snap.stale);
        assert_eq!(snap.data.as_deref(), Some(&"v1"));

        let reader = {
            let cache = cache.clone();
            let fetcher = counting(&calls, ms(800), "v2");
            tokio::spawn(async move { cache.fetch("k", fetcher).await })
        };
        sleep(ms(100)).await;
        let snap = cache.snapshot(&"k");
        assert!(snap.is_loading());
        assert_eq!(snap.data.as_deref(), Some(&"v1"));

        let v = reader.await.unwrap().unwrap();
        assert_eq!(*v, "v2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let snap = cache.snapshot(&"k");
        assert!(!snap.stale);
        assert_eq!(snap.data.as_deref(), Some(&"v2"));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn stale_flight_cannot_overwrite_newer_generation() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));

        let slow = {
            let cache = cache.clone();
            let fetcher = counting(&calls, ms(1000), "old");
            tokio::spawn(async move { cache.fetch("k", fetcher).await })
        };
        sleep(ms(10)).await;
        cache.invalidate(&"k");
        assert_eq!(cache.snapshot(&"k").generation, 1);

        let fast = {
            let cache = cache.clone();
            let fetcher = counting(&calls, ms(100), "new");
            tokio::spawn(async move { cache.fetch("k", fetcher).await })
        };

        assert_eq!(*fast.await.unwrap().unwrap(), "new");
        // The superseded request still answers the reader that started it.
        assert_eq!(*slow.await.unwrap().unwrap(), "old");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let snap = cache.snapshot(&"k");
        assert_eq!(snap.status, QueryStatus::Success);
        assert_eq!(snap.data.as_deref(), Some(&"new"));
        assert!(!snap.stale);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn result_from_before_invalidation_is_not_cached() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));

        let reader = {
            let cache = cache.clone();
            let fetcher = counting(&calls, ms(800), "old");
            tokio::spawn(async move { cache.fetch("k", fetcher).await })
        };
        sleep(ms(10)).await;
        cache.invalidate(&"k");
        assert_eq!(*reader.await.unwrap().unwrap(), "old");

        let snap = cache.snapshot(&"k");
        assert_eq!(snap.status, QueryStatus::Idle);
        assert!(snap.data.is_none());
        assert!(snap.stale);

        cache.fetch("k", counting(&calls, ms(800), "new")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn failure_is_retried_once_before_surfacing() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = {
            let calls = Arc::clone(&calls);
            move || -> BoxFut<&'static str> {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Box::pin(async move {
                    if n == 0 {
                        Err(ServiceError::Internal("flaky".into()))
                    } else {
                        Ok("v")
                    }
                })
            }
        };

        let start = Instant::now();
        assert_eq!(*cache.fetch("k", fetcher).await.unwrap(), "v");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn error_clears_data_and_is_refetched() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        cache.fetch("k", counting(&calls, ms(800), "v1")).await.unwrap();
        cache.invalidate(&"k");

        let err = cache.fetch("k", failing(&calls)).await.unwrap_err();
        assert!(err.is_not_found());
        // one success, then the failing attempt plus its retry
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let snap = cache.snapshot(&"k");
        assert_eq!(snap.status, QueryStatus::Error);
        assert!(snap.data.is_none());
        assert_eq!(snap.error, Some(err));

        cache.fetch("k", counting(&calls, ms(800), "v2")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn dropping_one_reader_keeps_the_shared_fetch() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let spawn_reader = |value| {
            let cache = cache.clone();
            let fetcher = counting(&calls, ms(800), value);
            tokio::spawn(async move { cache.fetch("k", fetcher).await })
        };
        let a = spawn_reader("v");
        let b = spawn_reader("v");
        sleep(ms(10)).await;
        assert_eq!(cache.waiter_count(&"k"), 2);

        a.abort();
        assert!(a.await.unwrap_err().is_cancelled());
        assert_eq!(cache.waiter_count(&"k"), 1);

        assert_eq!(*b.await.unwrap().unwrap(), "v");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn last_reader_leaving_aborts_and_restores_status() {
        let cache = cache();
        let started = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));
        let fetcher = {
            let started = Arc::clone(&started);
            let finished = Arc::clone(&finished);
            move || -> BoxFut<&'static str> {
                let started = Arc::clone(&started);
                let finished = Arc::clone(&finished);
                Box::pin(async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    sleep(ms(800)).await;
                    finished.fetch_add(1, Ordering::SeqCst);
                    Ok("v")
                })
            }
        };

        let timed_out = tokio::time::timeout(ms(100), cache.fetch("k", fetcher)).await;
        assert!(timed_out.is_err());
        assert_eq!(cache.snapshot(&"k").status, QueryStatus::Idle);
        assert_eq!(cache.waiter_count(&"k"), 0);

        sleep(ms(2000)).await;
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(finished.load(Ordering::SeqCst), 0);
        assert!(cache.snapshot(&"k").data.is_none());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn stale_time_expires_fresh_data() {
        let cache = QueryCache::new(QueryConfig {
            stale_time: Some(Duration::from_secs(5)),
            ..QueryConfig::default()
        });
        let calls = Arc::new(AtomicUsize::new(0));
        cache.fetch("k", counting(&calls, Duration::ZERO, "v")).await.unwrap();

        sleep(Duration::from_secs(4)).await;
        cache.fetch("k", counting(&calls, Duration::ZERO, "v")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        sleep(Duration::from_secs(2)).await;
        cache.fetch("k", counting(&calls, Duration::ZERO, "v")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn subscribers_see_each_transition() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut rx = cache.subscribe(&"k");
        assert_eq!(cache.subscriber_count(&"k"), 1);
        assert_eq!(rx.borrow().status, QueryStatus::Idle);

        let reader = {
            let cache = cache.clone();
            let fetcher = counting(&calls, ms(800), "v");
            tokio::spawn(async move { cache.fetch("k", fetcher).await })
        };

        rx.changed().await.unwrap();
        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.status, QueryStatus::Loading);

        rx.changed().await.unwrap();
        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.status, QueryStatus::Success);
        assert_eq!(snap.data.as_deref(), Some(&"v"));
        reader.await.unwrap().unwrap();

        drop(rx);
        assert_eq!(cache.subscriber_count(&"k"), 0);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn invalidate_where_only_touches_matching_keys() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        for key in ["a", "b", "c"] {
            cache.fetch(key, counting(&calls, ms(1), "v")).await.unwrap();
        }

        assert_eq!(cache.invalidate_where(|k| *k != "b"), 2);
        assert!(cache.snapshot(&"a").stale);
        assert!(!cache.snapshot(&"b").stale);
        assert!(cache.snapshot(&"c").stale);
        assert!(!cache.invalidate(&"missing"));

        assert_eq!(cache.invalidate_all(), 3);
        assert!(cache.snapshot(&"b").stale);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn removed_key_is_not_repopulated_by_its_flight() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let reader = {
            let cache = cache.clone();
            let fetcher = counting(&calls, ms(800), "v");
            tokio::spawn(async move { cache.fetch("k", fetcher).await })
        };
        sleep(ms(10)).await;
        assert!(cache.remove(&"k").is_some());

        assert_eq!(*reader.await.unwrap().unwrap(), "v");
        assert!(cache.is_empty());
    }
}
