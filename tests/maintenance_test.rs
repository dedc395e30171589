//! Tests for metrics pruning and the recurring maintenance task.

use std::time::Duration;

use mimir::{CacheManager, ManagerConfig};

#[tokio::test(start_paused = true)]
async fn idle_metrics_are_pruned_but_live_entries_survive() {
    let cache = CacheManager::new(ManagerConfig::default());
    cache
        .set("long-lived", 1u32, Some(Duration::from_secs(3 * 3600)))
        .unwrap();
    assert_eq!(cache.get_cached("long-lived"), Some(1));
    assert_eq!(cache.analytics().tracked_keys, 1);

    tokio::time::advance(Duration::from_secs(3601)).await;
    let report = cache.maintenance_tick();

    assert_eq!(report.pruned_metrics, 1);
    assert_eq!(report.evicted_entries, 0);
    assert_eq!(cache.analytics().tracked_keys, 0);
    // The cache entry itself is still within TTL and retrievable.
    assert_eq!(cache.store().get("long-lived"), Some(1));
}

#[tokio::test(start_paused = true)]
async fn recently_accessed_metrics_are_kept() {
    let cache = CacheManager::new(ManagerConfig::default());
    cache.set("busy", 1u32, Some(Duration::from_secs(7200))).unwrap();

    tokio::time::advance(Duration::from_secs(3000)).await;
    assert_eq!(cache.get_cached("busy"), Some(1));

    tokio::time::advance(Duration::from_secs(3000)).await;
    // Last access was 3000s ago, still inside the 3600s idle window.
    let report = cache.maintenance_tick();
    assert_eq!(report.pruned_metrics, 0);
    assert_eq!(cache.analytics().tracked_keys, 1);
}

#[tokio::test(start_paused = true)]
async fn tick_sweeps_expired_entries_from_store() {
    let cache = CacheManager::new(ManagerConfig::default());
    cache.set("short", 1u32, Some(Duration::from_secs(10))).unwrap();
    cache.set("long", 2u32, Some(Duration::from_secs(600))).unwrap();

    tokio::time::advance(Duration::from_secs(30)).await;
    let report = cache.maintenance_tick();

    assert_eq!(report.evicted_entries, 1);
    assert_eq!(cache.store().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn recurring_task_sweeps_on_interval() {
    let config = ManagerConfig::new()
        .maintenance_interval(Duration::from_secs(60))
        .metrics_idle_timeout(Duration::from_secs(30));
    let cache: CacheManager<u32> = CacheManager::new(config);

    cache.get_cached("k");
    assert_eq!(cache.analytics().tracked_keys, 1);

    let handle = cache.start_maintenance();
    tokio::time::sleep(Duration::from_secs(61)).await;

    // The 60s tick ran and pruned the record idle for >30s.
    assert_eq!(cache.analytics().tracked_keys, 0);
    handle.stop();
}

#[tokio::test(start_paused = true)]
async fn stopped_task_sweeps_no_more() {
    let config = ManagerConfig::new()
        .maintenance_interval(Duration::from_secs(60))
        .metrics_idle_timeout(Duration::from_secs(30));
    let cache: CacheManager<u32> = CacheManager::new(config);

    let handle = cache.start_maintenance();
    handle.stop();
    tokio::task::yield_now().await;

    cache.get_cached("k");
    tokio::time::sleep(Duration::from_secs(300)).await;

    // Idle well past the timeout, but nothing is sweeping.
    assert_eq!(cache.analytics().tracked_keys, 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_the_task() {
    let config = ManagerConfig::new()
        .maintenance_interval(Duration::from_secs(60))
        .metrics_idle_timeout(Duration::from_secs(30));
    let cache: CacheManager<u32> = CacheManager::new(config);

    {
        let _handle = cache.start_maintenance();
    }
    tokio::task::yield_now().await;

    cache.get_cached("k");
    tokio::time::sleep(Duration::from_secs(300)).await;

    assert_eq!(cache.analytics().tracked_keys, 1);
}
