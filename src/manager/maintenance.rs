//! Periodic background maintenance.
//!
//! One sweep prunes idle metrics records and evicts TTL-expired store
//! entries. The recurring task only exists once
//! [`CacheManager::start_maintenance`] is called, and stops when the
//! returned [`MaintenanceHandle`] is stopped or dropped — nothing runs
//! at construction time.

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::telemetry;

use super::CacheManager;

/// What one maintenance sweep removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    /// Metrics records pruned for idleness.
    pub pruned_metrics: usize,
    /// Expired entries evicted from the store.
    pub evicted_entries: usize,
}

/// Handle to the recurring maintenance task.
///
/// Dropping the handle stops the task, so hold it for as long as the
/// cache should be maintained.
pub struct MaintenanceHandle {
    task: JoinHandle<()>,
}

impl MaintenanceHandle {
    /// Stop the maintenance task.
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for MaintenanceHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl<V> CacheManager<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Run one maintenance sweep now.
    ///
    /// Prunes metrics for keys idle past the configured timeout and
    /// sweeps expired entries from the store. Idempotent; the recurring
    /// task calls this on every tick, and embedders with their own
    /// scheduler can call it directly instead of
    /// [`start_maintenance`](Self::start_maintenance).
    pub fn maintenance_tick(&self) -> MaintenanceReport {
        let (pruned_metrics, tracked) = {
            let mut metrics = self.inner.metrics.lock().unwrap();
            let pruned = metrics.prune_idle(self.inner.config.metrics_idle_timeout);
            (pruned, metrics.len())
        };
        let evicted_entries = self.inner.store.cleanup();

        metrics::counter!(telemetry::MAINTENANCE_EVICTIONS_TOTAL)
            .increment(evicted_entries as u64);
        metrics::gauge!(telemetry::TRACKED_KEYS).set(tracked as f64);
        debug!(pruned_metrics, evicted_entries, tracked, "maintenance sweep");

        MaintenanceReport {
            pruned_metrics,
            evicted_entries,
        }
    }

    /// Spawn the recurring maintenance task.
    ///
    /// Ticks at the configured `maintenance_interval`, starting one
    /// interval after this call. Requires a tokio runtime context.
    pub fn start_maintenance(&self) -> MaintenanceHandle {
        let manager = self.clone();
        let period = self.inner.config.maintenance_interval;
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick of a tokio interval fires immediately;
            // skip it so sweeps begin one period from now.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                manager.maintenance_tick();
            }
        });
        MaintenanceHandle { task }
    }
}
