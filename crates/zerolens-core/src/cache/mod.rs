// ── Query cache & invalidation registry ──
//
// A keyed, shared cache of in-flight/resolved query results with
// subscription-based re-delivery, per-key polling, and namespace-scoped
// invalidation. Entries are type-erased so one registry serves every
// resource kind; typed access goes through `QueryHandle<T>`.
//
// Concurrency discipline: per key at most one load is in flight (reload
// requests coalesce into it), completion handlers verify they are still
// the current generation before writing, and all entry state lives behind
// a short-critical-section mutex that is never held across an await.

mod key;
mod options;

pub use key::QueryKey;
pub use options::QueryOptions;

use std::any::Any;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::CoreError;

type ErasedValue = Arc<dyn Any + Send + Sync>;
type ErasedLoader =
    Arc<dyn Fn() -> BoxFuture<'static, Result<ErasedValue, CoreError>> + Send + Sync>;

// ── Observable state ─────────────────────────────────────────────────

/// Status of a cache entry as seen by subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Subscription exists but the query is not allowed to load (e.g.
    /// credential absent, invalid lookup input). Renders as a neutral
    /// idle state, never as an error.
    Disabled,
    /// First load has not completed yet.
    Pending,
    Success,
    Error,
}

/// Broadcast snapshot of one entry. The last known value is retained
/// through background reloads and even through errors.
#[derive(Clone)]
struct Snapshot {
    status: QueryStatus,
    value: Option<ErasedValue>,
    error: Option<Arc<CoreError>>,
    updated_at: Option<Instant>,
}

/// Typed projection of a snapshot, handed to consumers. Every consumer
/// must render three states: loading (including disabled), error, and
/// success.
#[derive(Debug, Clone)]
pub struct QueryResult<T> {
    pub status: QueryStatus,
    pub data: Option<Arc<T>>,
    pub error: Option<Arc<CoreError>>,
    pub updated_at: Option<Instant>,
}

impl<T> QueryResult<T> {
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Pending
    }

    pub fn is_disabled(&self) -> bool {
        self.status == QueryStatus::Disabled
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}

// ── Entry internals ──────────────────────────────────────────────────

struct Polling {
    interval: Duration,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Lifecycle {
    loader: Option<ErasedLoader>,
    refetch_interval: Option<Duration>,
    stale_time: Option<Duration>,
    cache_time: Option<Duration>,
    enabled: bool,
    subscribers: usize,
    in_flight: bool,
    /// Bumped when a load starts; a completion only writes if it still
    /// matches, so a superseded load can never clobber a newer result.
    generation: u64,
    /// Set by invalidation regardless of subscriber count.
    forced_stale: bool,
    /// An invalidation wanted a reload while one was already in flight;
    /// run one more load after the current one lands.
    reload_queued: bool,
    /// Bumped on every subscribe/unsubscribe so stale GC timers no-op.
    gc_epoch: u64,
    polling: Option<Polling>,
}

struct Entry {
    key: QueryKey,
    snapshot: watch::Sender<Snapshot>,
    lifecycle: Mutex<Lifecycle>,
}

fn lock(entry: &Entry) -> MutexGuard<'_, Lifecycle> {
    entry.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Cache registry ───────────────────────────────────────────────────

struct CacheInner {
    entries: DashMap<QueryKey, Arc<Entry>>,
    cancel: CancellationToken,
}

/// Process-wide shared query cache with an explicit lifecycle: construct
/// it at application start (usually via the engine) and tear it down with
/// [`shutdown`](QueryCache::shutdown). Cloning shares the same registry.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: DashMap::new(),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Cancel every polling timer and pending GC. Entries stay readable
    /// but nothing reloads afterwards.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    /// Number of live entries (for observability and tests).
    pub fn entry_count(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn contains_key(&self, key: &QueryKey) -> bool {
        self.inner.entries.contains_key(key)
    }

    // ── Subscription ─────────────────────────────────────────────────

    /// Register interest in `key`.
    ///
    /// The first subscription creates the entry and triggers `loader`;
    /// later subscriptions get the cached value synchronously. A stale
    /// entry still delivers its last value immediately while a background
    /// reload runs. Disabled subscriptions never load. The latest
    /// subscriber's loader and options win for the shared entry.
    pub fn subscribe<T, F, Fut>(
        &self,
        key: QueryKey,
        loader: F,
        options: QueryOptions,
    ) -> QueryHandle<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let erased: ErasedLoader = Arc::new(move || {
            let fut = loader();
            Box::pin(async move { fut.await.map(|value| Arc::new(value) as ErasedValue) })
        });

        let entry = {
            let entry_ref = self.inner.entries.entry(key.clone()).or_insert_with(|| {
                let initial = Snapshot {
                    status: if options.enabled {
                        QueryStatus::Pending
                    } else {
                        QueryStatus::Disabled
                    },
                    value: None,
                    error: None,
                    updated_at: None,
                };
                let (snapshot, _) = watch::channel(initial);
                Arc::new(Entry {
                    key,
                    snapshot,
                    lifecycle: Mutex::new(Lifecycle::default()),
                })
            });
            Arc::clone(&entry_ref)
        };

        let mut should_load = false;
        let mut restart_polling = false;
        let mut stop_polling = None;
        {
            let mut lc = lock(&entry);
            lc.subscribers += 1;
            lc.gc_epoch += 1;
            lc.loader = Some(erased);
            lc.refetch_interval = options.refetch_interval;
            lc.stale_time = options.stale_time;
            lc.cache_time = options.cache_time;
            lc.enabled = options.enabled;

            if options.enabled {
                let stale = {
                    let snap = entry.snapshot.borrow();
                    lc.forced_stale
                        || snap.status == QueryStatus::Error
                        || match (snap.updated_at, lc.stale_time) {
                            (None, _) => true,
                            (Some(_), None) => false,
                            (Some(at), Some(window)) => at.elapsed() > window,
                        }
                };
                if !lc.in_flight && stale {
                    should_load = true;
                }
                match (&lc.polling, lc.refetch_interval) {
                    (None, Some(_)) => restart_polling = true,
                    (Some(active), Some(wanted)) if active.interval != wanted => {
                        stop_polling = lc.polling.take().map(|p| p.cancel);
                        restart_polling = true;
                    }
                    (Some(_), None) => stop_polling = lc.polling.take().map(|p| p.cancel),
                    _ => {}
                }
            } else {
                stop_polling = lc.polling.take().map(|p| p.cancel);
            }
        }

        if let Some(cancel) = stop_polling {
            cancel.cancel();
        }
        if should_load {
            self.trigger_load(&entry);
        }
        if restart_polling {
            self.start_polling(&entry);
        }

        let rx = entry.snapshot.subscribe();
        QueryHandle {
            cache: self.clone(),
            entry,
            rx,
            _marker: PhantomData,
        }
    }

    // ── Invalidation ─────────────────────────────────────────────────

    /// Mark every entry under `prefix` stale; actively subscribed entries
    /// reload immediately.
    pub fn invalidate(&self, prefix: &QueryKey) {
        self.invalidate_inner(prefix, false);
    }

    /// Like [`invalidate`](Self::invalidate), but also reloads entries
    /// with zero subscribers so the next subscriber sees fresh data
    /// without waiting.
    pub fn invalidate_refetch_inactive(&self, prefix: &QueryKey) {
        self.invalidate_inner(prefix, true);
    }

    fn invalidate_inner(&self, prefix: &QueryKey, refetch_inactive: bool) {
        let matching: Vec<Arc<Entry>> = self
            .inner
            .entries
            .iter()
            .filter(|item| item.key().starts_with(prefix))
            .map(|item| Arc::clone(item.value()))
            .collect();

        let mut to_reload = Vec::new();
        for entry in &matching {
            let mut lc = lock(entry);
            // Stale marking is synchronous: done before this call returns.
            lc.forced_stale = true;
            let wants_reload =
                lc.enabled && lc.loader.is_some() && (lc.subscribers > 0 || refetch_inactive);
            if wants_reload {
                if lc.in_flight {
                    lc.reload_queued = true;
                } else {
                    drop(lc);
                    to_reload.push(Arc::clone(entry));
                }
            }
        }

        debug!(prefix = %prefix, matched = matching.len(), reloading = to_reload.len(), "cache invalidated");
        for entry in &to_reload {
            self.trigger_load(entry);
        }
    }

    // ── Loading ──────────────────────────────────────────────────────

    fn trigger_load(&self, entry: &Arc<Entry>) {
        let loader;
        let generation;
        {
            let mut lc = lock(entry);
            if !lc.enabled || lc.in_flight {
                return;
            }
            let Some(current) = lc.loader.clone() else {
                return;
            };
            loader = current;
            lc.in_flight = true;
            lc.generation += 1;
            generation = lc.generation;
        }

        // Only the very first load shows as Pending; background reloads
        // keep delivering the previous value.
        entry.snapshot.send_if_modified(|snap| {
            if snap.value.is_none() && snap.status != QueryStatus::Pending {
                snap.status = QueryStatus::Pending;
                true
            } else {
                false
            }
        });

        let cache = self.clone();
        let entry = Arc::clone(entry);
        tokio::spawn(async move {
            let result = loader().await;

            let rerun = {
                let mut lc = lock(&entry);
                if lc.generation != generation {
                    // Superseded; a newer load owns this entry now.
                    return;
                }
                lc.in_flight = false;
                lc.forced_stale = false;
                std::mem::take(&mut lc.reload_queued)
            };

            entry.snapshot.send_modify(|snap| match result {
                Ok(value) => {
                    snap.status = QueryStatus::Success;
                    snap.value = Some(value);
                    snap.error = None;
                    snap.updated_at = Some(Instant::now());
                }
                Err(e) => {
                    debug!(key = %entry.key, error = %e, "query load failed");
                    snap.status = QueryStatus::Error;
                    snap.error = Some(Arc::new(e));
                    // Keep the last value; `updated_at` is left untouched
                    // so an errored entry counts as stale and reloads on
                    // the next subscribe.
                }
            });

            if rerun {
                cache.trigger_load(&entry);
            }
        });
    }

    // ── Polling ──────────────────────────────────────────────────────

    fn start_polling(&self, entry: &Arc<Entry>) {
        let interval;
        let cancel;
        {
            let mut lc = lock(entry);
            if lc.polling.is_some() || !lc.enabled {
                return;
            }
            let Some(wanted) = lc.refetch_interval else {
                return;
            };
            interval = wanted;
            let token = self.inner.cancel.child_token();
            lc.polling = Some(Polling {
                interval,
                cancel: token.clone(),
            });
            cancel = token;
        }

        let cache = self.clone();
        let entry = Arc::clone(entry);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await; // consume the immediate first tick

            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => cache.trigger_load(&entry),
                }
            }
        });
    }

    // ── Teardown ─────────────────────────────────────────────────────

    fn unsubscribe(&self, entry: &Arc<Entry>) {
        let mut stop_polling = None;
        let mut schedule_gc = None;
        {
            let mut lc = lock(entry);
            lc.subscribers = lc.subscribers.saturating_sub(1);
            if lc.subscribers == 0 {
                // Unsubscribing cancels the polling timer; an in-flight
                // load is left to complete into the cache.
                stop_polling = lc.polling.take().map(|p| p.cancel);
                lc.gc_epoch += 1;
                if let Some(retention) = lc.cache_time {
                    schedule_gc = Some((retention, lc.gc_epoch));
                }
            }
        }

        if let Some(cancel) = stop_polling {
            cancel.cancel();
        }
        if let Some((retention, epoch)) = schedule_gc {
            let cache = self.clone();
            let entry = Arc::clone(entry);
            let cancel = self.inner.cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {}
                    () = tokio::time::sleep(retention) => cache.collect(&entry, epoch),
                }
            });
        }
    }

    fn collect(&self, entry: &Arc<Entry>, epoch: u64) {
        {
            let lc = lock(entry);
            if lc.subscribers != 0 || lc.gc_epoch != epoch {
                return;
            }
        }
        debug!(key = %entry.key, "cache entry collected");
        self.inner.entries.remove(&entry.key);
    }
}

// ── Typed handle ─────────────────────────────────────────────────────

/// Live, typed subscription to one cache entry. Dropping it unsubscribes;
/// cloning it counts as an additional subscriber.
pub struct QueryHandle<T> {
    cache: QueryCache,
    entry: Arc<Entry>,
    rx: watch::Receiver<Snapshot>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> QueryHandle<T> {
    pub fn key(&self) -> &QueryKey {
        &self.entry.key
    }

    /// The current result, without waiting.
    pub fn result(&self) -> QueryResult<T> {
        project(&self.rx.borrow())
    }

    /// Wait for the next snapshot change and return it.
    pub async fn changed(&mut self) -> QueryResult<T> {
        // The sender lives in the entry this handle keeps alive, so
        // `changed` only fails after cache teardown; degrade to the
        // current value then.
        let _ = self.rx.changed().await;
        self.result()
    }

    /// Wait until the entry has settled: success, error, or disabled.
    pub async fn ready(&mut self) -> QueryResult<T> {
        loop {
            let result = self.result();
            if result.status != QueryStatus::Pending {
                return result;
            }
            if self.rx.changed().await.is_err() {
                return self.result();
            }
        }
    }

    /// Request a reload now (coalesced with any in-flight load).
    pub fn refetch(&self) {
        self.cache.trigger_load(&self.entry);
    }
}

fn project<T: Send + Sync + 'static>(snap: &Snapshot) -> QueryResult<T> {
    QueryResult {
        status: snap.status,
        data: snap
            .value
            .clone()
            .and_then(|value| value.downcast::<T>().ok()),
        error: snap.error.clone(),
        updated_at: snap.updated_at,
    }
}

impl<T> Clone for QueryHandle<T> {
    fn clone(&self) -> Self {
        {
            let mut lc = lock(&self.entry);
            lc.subscribers += 1;
            lc.gc_epoch += 1;
        }
        Self {
            cache: self.cache.clone(),
            entry: Arc::clone(&self.entry),
            rx: self.entry.snapshot.subscribe(),
            _marker: PhantomData,
        }
    }
}

impl<T> Drop for QueryHandle<T> {
    fn drop(&mut self) {
        self.cache.unsubscribe(&self.entry);
    }
}
