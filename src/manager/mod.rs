//! Strategy-aware cache manager.
//!
//! [`CacheManager`] sits above the primitive [`MemoryStore`] and adds:
//!
//! - a pattern → [`CacheStrategy`] registry consulted on every access,
//! - stale-while-revalidate: a hit whose age has passed
//!   `ttl * refresh_threshold` is served immediately while a background
//!   task fetches a replacement,
//! - in-flight request coalescing, so concurrent fetches for one key
//!   collapse to a single execution,
//! - dependency-based cascade invalidation
//!   ([`invalidate_dependencies`](CacheManager::invalidate_dependencies)),
//! - per-key metrics and aggregate [`analytics`](CacheManager::analytics),
//! - a periodic maintenance sweep
//!   ([`start_maintenance`](CacheManager::start_maintenance)).
//!
//! The manager is a cheap-to-clone handle over shared state; construct
//! one explicitly and pass clones to whatever needs it. There is no
//! module-level instance, and the maintenance loop only runs once
//! [`CacheManager::start_maintenance`] is called.
//!
//! # Concurrency
//!
//! All shared state lives behind plain mutexes that are never held
//! across an await, so the manager is safe under any tokio runtime
//! flavour. The coalescing guarantee comes from performing the
//! check-then-insert on the in-flight map under a single lock
//! acquisition; every caller then awaits the same
//! [`Shared`](futures_util::future::Shared) future.
//!
//! Writes race last-writer-wins: a background refresh completing after
//! a concurrent explicit `set` overwrites it, and vice versa. Nothing
//! cancels an in-flight fetch; timeouts belong inside the fetch
//! function itself.

mod analytics;
mod invalidation;
mod maintenance;
mod metrics;

pub use analytics::{CacheAnalytics, KeyPerformance};
pub use maintenance::{MaintenanceHandle, MaintenanceReport};

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::time::Instant;
use tracing::warn;

use crate::store::MemoryStore;
use crate::strategy::{CacheStrategy, StrategyRegistry};
use crate::telemetry;
use crate::{MimirError, Result};

use self::metrics::MetricsMap;

/// A pending fetch that concurrent callers can all await.
type InFlightFetch<V> = Shared<BoxFuture<'static, Option<V>>>;

/// Configuration for a [`CacheManager`].
///
/// ```rust
/// # use mimir::ManagerConfig;
/// # use std::time::Duration;
/// let config = ManagerConfig::new()
///     .default_ttl(Duration::from_secs(120))
///     .maintenance_interval(Duration::from_secs(60));
/// ```
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// TTL for keys matching no registered strategy. Default: 5 minutes.
    pub default_ttl: Duration,
    /// Tick interval of the maintenance task. Default: 5 minutes.
    pub maintenance_interval: Duration,
    /// Idle time after which a key's metrics record is pruned.
    /// Default: 1 hour.
    pub metrics_idle_timeout: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(300),
            maintenance_interval: Duration::from_secs(300),
            metrics_idle_timeout: Duration::from_secs(3600),
        }
    }
}

impl ManagerConfig {
    /// Create a config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback TTL for keys without a strategy.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set the maintenance tick interval.
    pub fn maintenance_interval(mut self, interval: Duration) -> Self {
        self.maintenance_interval = interval;
        self
    }

    /// Set the metrics idle-pruning timeout.
    pub fn metrics_idle_timeout(mut self, timeout: Duration) -> Self {
        self.metrics_idle_timeout = timeout;
        self
    }
}

pub(crate) struct Inner<V> {
    pub(crate) store: MemoryStore<V>,
    pub(crate) strategies: Mutex<StrategyRegistry>,
    pub(crate) metrics: Mutex<MetricsMap>,
    in_flight: Mutex<HashMap<String, InFlightFetch<V>>>,
    pub(crate) config: ManagerConfig,
}

/// Strategy-aware cache over an in-memory TTL store.
///
/// Cloning is cheap (shared handle). See the [module docs](self) for
/// the architecture.
pub struct CacheManager<V> {
    pub(crate) inner: Arc<Inner<V>>,
}

impl<V> Clone for CacheManager<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> CacheManager<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a manager with an empty strategy registry.
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: MemoryStore::new(),
                strategies: Mutex::new(StrategyRegistry::new()),
                metrics: Mutex::new(MetricsMap::new()),
                in_flight: Mutex::new(HashMap::new()),
                config,
            }),
        }
    }

    /// Create a manager seeded with the baseline strategy policy:
    ///
    /// | pattern           | ttl    | threshold | priority | depends on                    |
    /// |-------------------|--------|-----------|----------|-------------------------------|
    /// | `feed-*`          | 2 min  | 0.8       | high     | `user-behavior-*`, `entity-*` |
    /// | `search-*`        | 5 min  | 0.7       | medium   | `entity-*`                    |
    /// | `entity-*`        | 30 min | 0.5       | high     |                               |
    /// | `user-profile-*`  | 15 min | 0.6       | medium   | `user-behavior-*`             |
    /// | `user-behavior-*` | 60 min | 0.3       | low      |                               |
    pub fn with_defaults() -> Self {
        use crate::strategy::Priority;

        let manager = Self::new(ManagerConfig::default());
        let seeds = [
            (
                "feed-*",
                CacheStrategy::new(Duration::from_secs(120))
                    .refresh_threshold(0.8)
                    .priority(Priority::High)
                    .depends_on("user-behavior-*")
                    .depends_on("entity-*"),
            ),
            (
                "search-*",
                CacheStrategy::new(Duration::from_secs(300))
                    .refresh_threshold(0.7)
                    .depends_on("entity-*"),
            ),
            (
                "entity-*",
                CacheStrategy::new(Duration::from_secs(1800))
                    .refresh_threshold(0.5)
                    .priority(Priority::High),
            ),
            (
                "user-profile-*",
                CacheStrategy::new(Duration::from_secs(900)).refresh_threshold(0.6),
            ),
            (
                "user-behavior-*",
                CacheStrategy::new(Duration::from_secs(3600))
                    .refresh_threshold(0.3)
                    .priority(Priority::Low),
            ),
        ];
        for (pattern, strategy) in seeds {
            manager
                .set_strategy(pattern, strategy)
                .expect("baseline strategies are valid");
        }
        manager
    }

    /// Register (or replace) the strategy for a key pattern.
    ///
    /// Patterns are consulted in registration order and the first match
    /// wins; re-registering an existing pattern replaces it in place.
    pub fn set_strategy(&self, pattern: &str, strategy: CacheStrategy) -> Result<()> {
        self.inner.strategies.lock().unwrap().insert(pattern, strategy)
    }

    /// The strategy that would govern `key`, if any.
    pub fn strategy_for(&self, key: &str) -> Option<CacheStrategy> {
        let registry = self.inner.strategies.lock().unwrap();
        registry.resolve(key).map(|entry| entry.strategy.clone())
    }

    /// Look up a cached value without a fetch function.
    ///
    /// Records a hit or miss; never triggers a background refresh
    /// (refreshing needs a fetch function — see [`get_with`](Self::get_with)).
    pub fn get_cached(&self, key: &str) -> Option<V> {
        if key.is_empty() {
            return None;
        }
        let start = Instant::now();
        match self.inner.store.get(key) {
            Some(value) => {
                self.record_hit(key, start);
                Some(value)
            }
            None => {
                self.record_miss(key, start);
                None
            }
        }
    }

    /// Look up a cached value, fetching on a miss and refreshing in the
    /// background on a sufficiently old hit.
    ///
    /// - **Hit:** the cached value is returned immediately. If the
    ///   entry's age has reached `ttl * refresh_threshold` of its
    ///   governing strategy, `fetch` is started in a detached task; on
    ///   success the new value replaces the entry under the strategy
    ///   TTL, on failure the old value keeps serving.
    /// - **Miss:** `fetch` runs on the caller, coalesced with any other
    ///   in-flight fetch for the same key (including a background
    ///   refresh — both paths share one in-flight map, so a hit-side
    ///   refresh and a concurrent miss-side fetch never double-fetch).
    ///   The result is stored under the strategy TTL, or the default
    ///   when no strategy matches.
    ///
    /// Fetch errors never propagate: they are logged and the call
    /// resolves to `None`, indistinguishable from absent data.
    pub async fn get_with<F, Fut, E>(&self, key: &str, fetch: F) -> Option<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        if key.is_empty() {
            return None;
        }
        let start = Instant::now();
        let strategy = self.strategy_for(key);

        if let Some(value) = self.inner.store.get(key) {
            self.record_hit(key, start);
            if let Some(strategy) = strategy {
                if self.refresh_eligible(key, &strategy) {
                    self.spawn_refresh(key, strategy.ttl, fetch());
                }
            }
            return Some(value);
        }

        let ttl = strategy
            .map(|s| s.ttl)
            .unwrap_or(self.inner.config.default_ttl);
        let fetched = self.fetch_deduplicated(key, fetch()).await;
        self.record_miss(key, start);
        let value = fetched?;
        self.inner.store.set(key, value.clone(), ttl);
        Some(value)
    }

    /// Store a value.
    ///
    /// TTL precedence: `custom_ttl` > matching strategy TTL > the
    /// configured default. Touches the key's metrics record without
    /// counting a hit or miss.
    pub fn set(&self, key: &str, value: V, custom_ttl: Option<Duration>) -> Result<()> {
        if key.is_empty() {
            return Err(MimirError::EmptyKey);
        }
        let ttl = custom_ttl
            .or_else(|| self.strategy_for(key).map(|s| s.ttl))
            .unwrap_or(self.inner.config.default_ttl);
        self.inner.store.set(key, value, ttl);
        self.inner.metrics.lock().unwrap().touch(key);
        Ok(())
    }

    /// Run `fetch` for `key`, coalescing with any fetch already in
    /// flight for the same key.
    ///
    /// If another fetch is pending, `fetch` is dropped unexecuted and
    /// this caller awaits the pending one; all coalesced callers see
    /// the same outcome. A failing fetch is logged and resolves to
    /// `None` for every caller.
    pub async fn fetch_deduplicated<Fut, E>(&self, key: &str, fetch: Fut) -> Option<V>
    where
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let (shared, _registered) = self.join_or_register(key, fetch);
        shared.await
    }

    /// Check the in-flight map and either join the pending fetch or
    /// register a new one. Returns whether this caller registered.
    ///
    /// Synchronous; the check-then-insert happens under one lock
    /// acquisition.
    fn join_or_register<Fut, E>(&self, key: &str, fetch: Fut) -> (InFlightFetch<V>, bool)
    where
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let mut in_flight = self.inner.in_flight.lock().unwrap();
        if let Some(pending) = in_flight.get(key) {
            return (pending.clone(), false);
        }

        let inner = Arc::clone(&self.inner);
        let owned_key = key.to_string();
        let shared = async move {
            let result = match fetch.await {
                Ok(value) => Some(value),
                Err(e) => {
                    ::metrics::counter!(telemetry::FETCH_ERRORS_TOTAL).increment(1);
                    warn!(key = %owned_key, error = %e, "cache fetch failed");
                    None
                }
            };
            // Settle before handing out the value so a follow-up miss
            // starts a fresh fetch instead of joining this one.
            inner.in_flight.lock().unwrap().remove(&owned_key);
            result
        }
        .boxed()
        .shared();
        in_flight.insert(key.to_string(), shared.clone());
        (shared, true)
    }

    /// Whether a hit on `key` should kick off a background refresh.
    fn refresh_eligible(&self, key: &str, strategy: &CacheStrategy) -> bool {
        match self.inner.store.metadata(key) {
            Some(meta) => meta.age >= strategy.ttl.mul_f64(strategy.refresh_threshold),
            None => false,
        }
    }

    /// Start a fire-and-forget refresh for `key`.
    ///
    /// Registers in the in-flight map synchronously, so a second hit
    /// (or a concurrent miss) observed before this refresh settles
    /// joins it rather than fetching again. If a fetch for `key` is
    /// already pending, this is a no-op — that fetch's owner writes the
    /// store.
    fn spawn_refresh<Fut, E>(&self, key: &str, ttl: Duration, fetch: Fut)
    where
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let (shared, registered) = self.join_or_register(key, fetch);
        if !registered {
            return;
        }
        let manager = self.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            if let Some(value) = shared.await {
                manager.inner.store.set(&key, value, ttl);
                manager.inner.metrics.lock().unwrap().record_refresh(&key);
                ::metrics::counter!(telemetry::CACHE_REFRESHES_TOTAL).increment(1);
            }
            // On failure the old entry keeps serving until its TTL.
        });
    }

    fn record_hit(&self, key: &str, start: Instant) {
        self.inner
            .metrics
            .lock()
            .unwrap()
            .record_hit(key, start.elapsed());
        ::metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
    }

    fn record_miss(&self, key: &str, start: Instant) {
        self.inner
            .metrics
            .lock()
            .unwrap()
            .record_miss(key, start.elapsed());
        ::metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
    }

    /// Direct access to the underlying store.
    ///
    /// Reads and writes here bypass strategy resolution and metrics;
    /// intended for embedders that need raw TTL-store semantics.
    pub fn store(&self) -> &MemoryStore<V> {
        &self.inner.store
    }
}
