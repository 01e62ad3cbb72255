// Behavioral tests for the query cache, run under paused tokio time so
// staleness windows, polling periods, and GC delays are deterministic.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use zerolens_core::{CoreError, QueryCache, QueryKey, QueryOptions, QueryStatus};

fn key(segments: &[&str]) -> QueryKey {
    QueryKey::new(segments.iter().copied())
}

/// Wait (in virtual time) until `predicate` holds, or panic.
async fn wait_until(predicate: impl Fn() -> bool) {
    for _ in 0..200 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test(start_paused = true)]
async fn subscribe_twice_issues_one_load() {
    let cache = QueryCache::new();
    let loads = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&loads);
    let mut first = cache.subscribe(
        key(&["zerotier", "node"]),
        move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, CoreError>(42u32)
            }
        },
        QueryOptions::default().stale_after(Duration::from_secs(60)),
    );
    let ready = first.ready().await;
    assert_eq!(ready.status, QueryStatus::Success);
    assert_eq!(*ready.data.unwrap(), 42);

    let counter = Arc::clone(&loads);
    let second = cache.subscribe(
        key(&["zerotier", "node"]),
        move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, CoreError>(42u32)
            }
        },
        QueryOptions::default().stale_after(Duration::from_secs(60)),
    );

    // Cached value delivered synchronously, before any network activity.
    let result = second.result();
    assert_eq!(result.status, QueryStatus::Success);
    assert_eq!(*result.data.unwrap(), 42);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn staleness_window_gates_reloads() {
    let cache = QueryCache::new();
    let loads = Arc::new(AtomicUsize::new(0));
    let options = || QueryOptions::default().stale_after(Duration::from_secs(5));
    let subscribe = |cache: &QueryCache, loads: &Arc<AtomicUsize>| {
        let counter = Arc::clone(loads);
        cache.subscribe(
            key(&["zerotier", "node"]),
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, CoreError>(1u32)
                }
            },
            options(),
        )
    };

    let mut first = subscribe(&cache, &loads);
    first.ready().await;
    drop(first);
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    // Within the window: no network call, value served from cache.
    let fresh = subscribe(&cache, &loads);
    assert_eq!(fresh.result().status, QueryStatus::Success);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    drop(fresh);

    // Past the window: the last value is still delivered immediately,
    // and a background reload fires.
    tokio::time::sleep(Duration::from_secs(6)).await;
    let stale = subscribe(&cache, &loads);
    assert_eq!(stale.result().status, QueryStatus::Success);
    wait_until(|| loads.load(Ordering::SeqCst) == 2).await;
}

#[tokio::test(start_paused = true)]
async fn invalidation_propagates_by_prefix_only() {
    let cache = QueryCache::new();
    let service_loads = Arc::new(AtomicUsize::new(0));
    let other_loads = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&service_loads);
    let mut service = cache.subscribe(
        key(&["zerotier", "network"]),
        move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, CoreError>("networks".to_owned())
            }
        },
        QueryOptions::default().stale_after(Duration::from_secs(60)),
    );
    let counter = Arc::clone(&other_loads);
    let mut other = cache.subscribe(
        key(&["dns", "lookup"]),
        move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, CoreError>("dns".to_owned())
            }
        },
        QueryOptions::default().stale_after(Duration::from_secs(60)),
    );
    service.ready().await;
    other.ready().await;

    cache.invalidate(&key(&["zerotier"]));

    wait_until(|| service_loads.load(Ordering::SeqCst) == 2).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(other_loads.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn plain_invalidation_skips_inactive_entries() {
    let cache = QueryCache::new();
    let loads = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&loads);
    let mut handle = cache.subscribe(
        key(&["zerotier", "node"]),
        move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, CoreError>(0u8)
            }
        },
        QueryOptions::default().stale_after(Duration::from_secs(60)),
    );
    handle.ready().await;
    drop(handle);

    cache.invalidate(&key(&["zerotier"]));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn refetch_inactive_reloads_subscriberless_entries() {
    let cache = QueryCache::new();
    let loads = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&loads);
    let mut handle = cache.subscribe(
        key(&["zerotier", "node"]),
        move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, CoreError>(0u8)
            }
        },
        QueryOptions::default().stale_after(Duration::from_secs(60)),
    );
    handle.ready().await;
    drop(handle);

    cache.invalidate_refetch_inactive(&key(&["zerotier"]));
    wait_until(|| loads.load(Ordering::SeqCst) == 2).await;
}

#[tokio::test(start_paused = true)]
async fn disabled_subscription_never_loads_and_never_errors() {
    let cache = QueryCache::new();
    let loads = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&loads);
    let handle = cache.subscribe(
        key(&["zerotier", "node"]),
        move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, CoreError>(0u8)
            }
        },
        QueryOptions::default()
            .poll_every(Duration::from_secs(1))
            .enabled(false),
    );

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(loads.load(Ordering::SeqCst), 0);
    let result = handle.result();
    assert_eq!(result.status, QueryStatus::Disabled);
    assert!(result.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn polling_reloads_until_last_unsubscribe() {
    let cache = QueryCache::new();
    let loads = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&loads);
    let mut handle = cache.subscribe(
        key(&["zerotier", "node"]),
        move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, CoreError>(0u8)
            }
        },
        QueryOptions::default().poll_every(Duration::from_secs(1)),
    );
    handle.ready().await;
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    wait_until(|| loads.load(Ordering::SeqCst) >= 2).await;
    tokio::time::sleep(Duration::from_millis(1100)).await;
    wait_until(|| loads.load(Ordering::SeqCst) >= 3).await;

    drop(handle);
    let after_drop = loads.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(loads.load(Ordering::SeqCst), after_drop);
}

#[tokio::test(start_paused = true)]
async fn entries_are_collected_after_cache_time() {
    let cache = QueryCache::new();
    let entry_key = key(&["zerotier", "network", "1c33c1ced015c144"]);

    let entry_key_clone = entry_key.clone();
    let mut handle = cache.subscribe(
        entry_key_clone,
        || async { Ok::<_, CoreError>(0u8) },
        QueryOptions::default().drop_after(Duration::from_secs(5)),
    );
    handle.ready().await;
    assert!(cache.contains_key(&entry_key));

    drop(handle);
    assert!(cache.contains_key(&entry_key));
    tokio::time::sleep(Duration::from_secs(6)).await;
    wait_until(|| !cache.contains_key(&entry_key)).await;
}

#[tokio::test(start_paused = true)]
async fn resubscribing_before_gc_keeps_the_entry() {
    let cache = QueryCache::new();
    let entry_key = key(&["zerotier", "peer", "992fcf1db7"]);

    let subscribe = |cache: &QueryCache| {
        cache.subscribe(
            entry_key.clone(),
            || async { Ok::<_, CoreError>(0u8) },
            QueryOptions::default().drop_after(Duration::from_secs(5)),
        )
    };

    let mut first = subscribe(&cache);
    first.ready().await;
    drop(first);

    tokio::time::sleep(Duration::from_secs(2)).await;
    let second = subscribe(&cache);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(cache.contains_key(&entry_key));
    drop(second);
}

#[tokio::test(start_paused = true)]
async fn concurrent_reload_requests_coalesce() {
    let cache = QueryCache::new();
    let loads = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&loads);
    let mut first = cache.subscribe(
        key(&["zerotier", "node"]),
        move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, CoreError>(7u32)
            }
        },
        QueryOptions::default().stale_after(Duration::from_secs(60)),
    );
    tokio::task::yield_now().await;

    // Reloads requested while the load is in flight join it.
    first.refetch();
    first.refetch();
    let counter = Arc::clone(&loads);
    let second = cache.subscribe(
        key(&["zerotier", "node"]),
        move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, CoreError>(7u32)
            }
        },
        QueryOptions::default().stale_after(Duration::from_secs(60)),
    );

    let ready = first.ready().await;
    assert_eq!(*ready.data.unwrap(), 7);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    drop(second);
}

#[tokio::test(start_paused = true)]
async fn first_load_is_pending_then_success() {
    let cache = QueryCache::new();
    let mut handle = cache.subscribe(
        key(&["zerotier", "api"]),
        || async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<_, CoreError>("up".to_owned())
        },
        QueryOptions::default(),
    );

    assert_eq!(handle.result().status, QueryStatus::Pending);
    let ready = handle.ready().await;
    assert_eq!(ready.status, QueryStatus::Success);
    assert_eq!(*ready.data.unwrap(), "up");
}

#[tokio::test(start_paused = true)]
async fn errored_entries_reload_on_next_subscribe() {
    let cache = QueryCache::new();
    let loads = Arc::new(AtomicUsize::new(0));

    let subscribe = |cache: &QueryCache, loads: &Arc<AtomicUsize>| {
        let counter = Arc::clone(loads);
        cache.subscribe(
            key(&["zerotier", "node"]),
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    // Fail the first load, succeed afterwards.
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(CoreError::ServiceUnreachable {
                            reason: "connection refused".into(),
                        })
                    } else {
                        Ok(9u32)
                    }
                }
            },
            QueryOptions::default().stale_after(Duration::from_secs(60)),
        )
    };

    let mut first = subscribe(&cache, &loads);
    let failed = first.ready().await;
    assert_eq!(failed.status, QueryStatus::Error);
    assert!(failed.error.unwrap().is_connection_failed());
    drop(first);

    let mut second = subscribe(&cache, &loads);
    let recovered = second.ready().await;
    // The errored entry counts as stale, so the new subscriber triggered
    // a reload even within what would otherwise be the staleness window.
    assert_eq!(recovered.status, QueryStatus::Success);
    assert_eq!(*recovered.data.unwrap(), 9);
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn invalidation_during_flight_runs_one_more_load() {
    let cache = QueryCache::new();
    let loads = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&loads);
    let mut handle = cache.subscribe(
        key(&["zerotier", "network"]),
        move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, CoreError>(1u8)
            }
        },
        QueryOptions::default().stale_after(Duration::from_secs(60)),
    );
    tokio::task::yield_now().await;

    // Arrives mid-flight: coalesces into a single follow-up reload.
    cache.invalidate(&key(&["zerotier"]));
    cache.invalidate(&key(&["zerotier"]));

    handle.ready().await;
    wait_until(|| loads.load(Ordering::SeqCst) == 2).await;
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}
