//! Telemetry metric name constants.
//!
//! Centralised metric names for mimir operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `mimir_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `trigger` — what caused an invalidation: "key" | "pattern" | "dependency"
//!
//! These aggregate counters complement the per-key analytics available
//! through [`CacheManager::analytics()`](crate::CacheManager::analytics) —
//! the facade carries process-wide totals for external recorders, the
//! analytics carry per-key detail for in-process inspection.

/// Total cache hits.
pub const CACHE_HITS_TOTAL: &str = "mimir_cache_hits_total";

/// Total cache misses.
pub const CACHE_MISSES_TOTAL: &str = "mimir_cache_misses_total";

/// Total completed background refreshes (stale-while-revalidate writes).
pub const CACHE_REFRESHES_TOTAL: &str = "mimir_cache_refreshes_total";

/// Total fetch failures swallowed at the deduplication boundary.
pub const FETCH_ERRORS_TOTAL: &str = "mimir_fetch_errors_total";

/// Total entries removed by invalidation.
///
/// Labels: `trigger` ("key" | "pattern" | "dependency").
pub const INVALIDATIONS_TOTAL: &str = "mimir_invalidations_total";

/// Total expired entries evicted by maintenance sweeps.
pub const MAINTENANCE_EVICTIONS_TOTAL: &str = "mimir_maintenance_evictions_total";

/// Number of keys currently holding a metrics record (gauge, updated
/// on each maintenance sweep).
pub const TRACKED_KEYS: &str = "mimir_tracked_keys";
