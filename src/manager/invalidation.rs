//! Pattern and dependency-based invalidation.
//!
//! Invalidation is caller-triggered: the manager never observes writes
//! to underlying data, so whatever mutates that data must report the
//! change (typically via [`CacheManager::invalidate_dependencies`])
//! for dependent entries to drop.

use tracing::debug;

use crate::pattern::KeyPattern;
use crate::telemetry;
use crate::Result;

use super::CacheManager;

impl<V> CacheManager<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Remove a single entry and its metrics record.
    ///
    /// Returns whether an entry was present.
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = self.inner.store.delete(key);
        self.inner.metrics.lock().unwrap().remove(key);
        if removed {
            metrics::counter!(telemetry::INVALIDATIONS_TOTAL, "trigger" => "key").increment(1);
        }
        removed
    }

    /// Remove every entry (and its metrics) whose key matches `pattern`.
    ///
    /// Returns the number of entries removed. Fails only on a malformed
    /// pattern.
    pub fn invalidate_by_pattern(&self, pattern: &str) -> Result<usize> {
        let pattern = KeyPattern::parse(pattern)?;
        let removed = self.invalidate_matching(&pattern);
        metrics::counter!(telemetry::INVALIDATIONS_TOTAL, "trigger" => "pattern")
            .increment(removed as u64);
        debug!(pattern = %pattern, removed, "invalidated by pattern");
        Ok(removed)
    }

    /// Cascade-invalidate everything that depends on `changed_key`.
    ///
    /// For each registered strategy with a dependency pattern matching
    /// `changed_key`, all keys matching that strategy's own pattern are
    /// removed. One level only — keys depending on the newly removed
    /// keys are not touched in turn.
    ///
    /// Returns the total number of entries removed.
    pub fn invalidate_dependencies(&self, changed_key: &str) -> usize {
        let cascades: Vec<KeyPattern> = {
            let registry = self.inner.strategies.lock().unwrap();
            registry
                .iter()
                .filter(|entry| entry.dependencies.iter().any(|dep| dep.matches(changed_key)))
                .map(|entry| entry.pattern.clone())
                .collect()
        };

        let mut removed = 0;
        for pattern in &cascades {
            let count = self.invalidate_matching(pattern);
            debug!(changed_key, pattern = %pattern, removed = count, "dependency cascade");
            removed += count;
        }
        metrics::counter!(telemetry::INVALIDATIONS_TOTAL, "trigger" => "dependency")
            .increment(removed as u64);
        removed
    }

    fn invalidate_matching(&self, pattern: &KeyPattern) -> usize {
        let mut removed = 0;
        let mut metrics = self.inner.metrics.lock().unwrap();
        for key in self.inner.store.keys() {
            if pattern.matches(&key) {
                self.inner.store.delete(&key);
                metrics.remove(&key);
                removed += 1;
            }
        }
        removed
    }
}
