//! Aggregate cache analytics.
//!
//! Read models summarising the per-key metrics map. Serializable so
//! embedders can ship them to dashboards as JSON.

use std::time::Duration;

use serde::Serialize;

use super::CacheManager;

/// How many keys appear in each performer list.
const PERFORMER_LIST_LEN: usize = 5;

/// Hit/miss summary for a single key.
#[derive(Debug, Clone, Serialize)]
pub struct KeyPerformance {
    pub key: String,
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, 0.0 before any request.
    pub hit_rate: f64,
    /// Exponentially-weighted moving average of access latency.
    pub avg_access_time: Duration,
}

/// Aggregate view over every tracked key.
#[derive(Debug, Clone, Serialize)]
pub struct CacheAnalytics {
    /// Keys currently holding a metrics record.
    pub tracked_keys: usize,
    /// Live (non-expired) entries in the store.
    pub live_entries: usize,
    pub total_hits: u64,
    pub total_misses: u64,
    pub total_refreshes: u64,
    /// `total_hits / (total_hits + total_misses)`, 0.0 with no requests.
    pub hit_rate: f64,
    /// Registered strategy patterns.
    pub strategy_count: usize,
    /// Up to 5 keys with the highest individual hit rate.
    pub top_performers: Vec<KeyPerformance>,
    /// Up to 5 keys with the lowest individual hit rate.
    pub worst_performers: Vec<KeyPerformance>,
}

impl<V> CacheManager<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Snapshot aggregate analytics over all tracked keys.
    ///
    /// Performer lists rank keys by individual hit rate; ties break by
    /// first-access order, so the ranking is deterministic.
    pub fn analytics(&self) -> CacheAnalytics {
        let metrics = self.inner.metrics.lock().unwrap();

        let mut total_hits = 0;
        let mut total_misses = 0;
        let mut total_refreshes = 0;
        let mut ranked: Vec<(u64, KeyPerformance)> = Vec::with_capacity(metrics.len());
        for (key, m) in metrics.iter() {
            total_hits += m.hits;
            total_misses += m.misses;
            total_refreshes += m.refreshes;
            ranked.push((
                m.seq,
                KeyPerformance {
                    key: key.clone(),
                    hits: m.hits,
                    misses: m.misses,
                    hit_rate: m.hit_rate(),
                    avg_access_time: m.avg_access_time,
                },
            ));
        }
        let tracked_keys = ranked.len();
        drop(metrics);

        ranked.sort_by(|(seq_a, a), (seq_b, b)| {
            b.hit_rate
                .total_cmp(&a.hit_rate)
                .then_with(|| seq_a.cmp(seq_b))
        });
        let top_performers: Vec<KeyPerformance> = ranked
            .iter()
            .take(PERFORMER_LIST_LEN)
            .map(|(_, p)| p.clone())
            .collect();
        // Re-sort ascending rather than reversing, so ties still break
        // by first-access order.
        ranked.sort_by(|(seq_a, a), (seq_b, b)| {
            a.hit_rate
                .total_cmp(&b.hit_rate)
                .then_with(|| seq_a.cmp(seq_b))
        });
        let worst_performers: Vec<KeyPerformance> = ranked
            .iter()
            .take(PERFORMER_LIST_LEN)
            .map(|(_, p)| p.clone())
            .collect();

        let requests = total_hits + total_misses;
        let hit_rate = if requests == 0 {
            0.0
        } else {
            total_hits as f64 / requests as f64
        };

        CacheAnalytics {
            tracked_keys,
            live_entries: self.inner.store.len(),
            total_hits,
            total_misses,
            total_refreshes,
            hit_rate,
            strategy_count: self.inner.strategies.lock().unwrap().len(),
            top_performers,
            worst_performers,
        }
    }
}
