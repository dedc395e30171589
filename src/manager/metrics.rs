//! Per-key access metrics.
//!
//! A [`KeyMetrics`] record is created lazily on the first access to a
//! key and pruned by maintenance once the key has been idle past the
//! configured timeout. Records are process-lifetime state, never
//! persisted.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

/// Smoothing factor for the access-latency EWMA. With 0.5 each new
/// sample carries as much weight as the entire prior history.
const EWMA_ALPHA: f64 = 0.5;

/// Counters and timings for one cache key.
#[derive(Debug, Clone)]
pub(crate) struct KeyMetrics {
    pub hits: u64,
    pub misses: u64,
    pub refreshes: u64,
    /// Most recent access of any kind (hit, miss, refresh, or set).
    pub last_accessed: Instant,
    /// Exponentially-weighted moving average of access latency.
    pub avg_access_time: Duration,
    /// Creation sequence number; breaks ranking ties deterministically
    /// by first-access order.
    pub seq: u64,
}

impl KeyMetrics {
    /// Hit rate for this key alone. 0.0 before any request.
    pub fn hit_rate(&self) -> f64 {
        let requests = self.hits + self.misses;
        if requests == 0 {
            0.0
        } else {
            self.hits as f64 / requests as f64
        }
    }

    fn observe_latency(&mut self, sample: Duration) {
        let smoothed = self.avg_access_time.as_secs_f64() * (1.0 - EWMA_ALPHA)
            + sample.as_secs_f64() * EWMA_ALPHA;
        self.avg_access_time = Duration::from_secs_f64(smoothed);
    }
}

/// Lazily-populated map of per-key metrics.
pub(crate) struct MetricsMap {
    entries: HashMap<String, KeyMetrics>,
    next_seq: u64,
}

impl MetricsMap {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_seq: 0,
        }
    }

    fn entry_mut(&mut self, key: &str) -> &mut KeyMetrics {
        let next_seq = &mut self.next_seq;
        self.entries
            .entry(key.to_string())
            .or_insert_with(|| {
                let seq = *next_seq;
                *next_seq += 1;
                KeyMetrics {
                    hits: 0,
                    misses: 0,
                    refreshes: 0,
                    last_accessed: Instant::now(),
                    avg_access_time: Duration::ZERO,
                    seq,
                }
            })
    }

    pub fn record_hit(&mut self, key: &str, latency: Duration) {
        let m = self.entry_mut(key);
        m.hits += 1;
        m.last_accessed = Instant::now();
        m.observe_latency(latency);
    }

    pub fn record_miss(&mut self, key: &str, latency: Duration) {
        let m = self.entry_mut(key);
        m.misses += 1;
        m.last_accessed = Instant::now();
        m.observe_latency(latency);
    }

    pub fn record_refresh(&mut self, key: &str) {
        let m = self.entry_mut(key);
        m.refreshes += 1;
        m.last_accessed = Instant::now();
    }

    /// Touch a key without counting a hit or miss (used by `set`).
    pub fn touch(&mut self, key: &str) {
        self.entry_mut(key).last_accessed = Instant::now();
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// Drop records idle longer than `timeout`. Returns how many were
    /// pruned.
    pub fn prune_idle(&mut self, timeout: Duration) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, m| now.duration_since(m.last_accessed) <= timeout);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &KeyMetrics)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hit_rate_zero_before_any_request() {
        let mut map = MetricsMap::new();
        map.touch("k");
        let (_, m) = map.iter().next().unwrap();
        assert_eq!(m.hit_rate(), 0.0);
    }

    #[tokio::test]
    async fn ewma_weights_latest_sample_at_half() {
        let mut map = MetricsMap::new();
        map.record_hit("k", Duration::from_millis(100));
        map.record_hit("k", Duration::from_millis(200));
        let (_, m) = map.iter().next().unwrap();
        // 0 -> 50ms -> 125ms
        assert_eq!(m.avg_access_time, Duration::from_millis(125));
    }

    #[tokio::test(start_paused = true)]
    async fn prune_idle_removes_only_stale_records() {
        let mut map = MetricsMap::new();
        map.record_hit("old", Duration::ZERO);

        tokio::time::advance(Duration::from_secs(3601)).await;
        map.record_hit("fresh", Duration::ZERO);

        assert_eq!(map.prune_idle(Duration::from_secs(3600)), 1);
        assert_eq!(map.len(), 1);
        assert!(map.iter().any(|(k, _)| k == "fresh"));
    }

    #[tokio::test]
    async fn sequence_numbers_follow_first_access_order() {
        let mut map = MetricsMap::new();
        map.record_miss("first", Duration::ZERO);
        map.record_miss("second", Duration::ZERO);
        map.record_hit("first", Duration::ZERO);

        let seq_of = |key: &str| map.iter().find(|(k, _)| *k == key).unwrap().1.seq;
        assert!(seq_of("first") < seq_of("second"));
    }
}
