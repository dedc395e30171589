//! Primitive TTL store.
//!
//! [`MemoryStore`] is the leaf layer of the cache: a single-process
//! in-memory map from string keys to values with a per-entry
//! time-to-live. [`CacheManager`](crate::CacheManager) layers strategy
//! resolution, background refresh, and invalidation on top of it.
//!
//! Expiry is lazy: an expired entry is dropped when observed by `get`,
//! `has`, `keys`, or `len`, and swept in bulk by [`MemoryStore::cleanup`]
//! (invoked from the manager's maintenance loop). Entry age is exposed
//! through [`MemoryStore::metadata`] so callers can inspect freshness
//! without depending on the store's internal representation.
//!
//! Timestamps use [`tokio::time::Instant`], so tests running under
//! tokio's paused clock (`start_paused`) control expiry deterministically.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

struct StoredEntry<V> {
    value: V,
    written_at: Instant,
    ttl: Duration,
}

impl<V> StoredEntry<V> {
    fn expired(&self, now: Instant) -> bool {
        now.duration_since(self.written_at) >= self.ttl
    }
}

/// Freshness metadata for a stored entry.
///
/// Returned by [`MemoryStore::metadata`]; reading it never evicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMetadata {
    /// Time elapsed since the entry was written.
    pub age: Duration,
    /// The TTL the entry was written under.
    pub ttl: Duration,
}

/// Thread-safe in-memory key/value store with per-entry TTL.
///
/// Values are cloned out on read, so `V` is typically cheap to clone or
/// wrapped in an `Arc`.
pub struct MemoryStore<V> {
    entries: Mutex<HashMap<String, StoredEntry<V>>>,
}

impl<V: Clone> MemoryStore<V> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a value. Returns `None` if the key is absent or expired;
    /// an expired entry is removed on observation.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if !entry.expired(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert (or overwrite) a value under the given TTL.
    pub fn set(&self, key: &str, value: V, ttl: Duration) {
        let entry = StoredEntry {
            value,
            written_at: Instant::now(),
            ttl,
        };
        self.entries.lock().unwrap().insert(key.to_string(), entry);
    }

    /// Whether a live (non-expired) entry exists for `key`.
    pub fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if !entry.expired(now) => true,
            Some(_) => {
                entries.remove(key);
                false
            }
            None => false,
        }
    }

    /// Remove an entry. Returns whether one was present (expired or not).
    pub fn delete(&self, key: &str) -> bool {
        self.entries.lock().unwrap().remove(key).is_some()
    }

    /// All live (non-expired) keys, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let entries = self.entries.lock().unwrap();
        entries
            .iter()
            .filter(|(_, entry)| !entry.expired(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Freshness metadata for a live entry. `None` if absent or expired.
    pub fn metadata(&self, key: &str) -> Option<EntryMetadata> {
        let now = Instant::now();
        let entries = self.entries.lock().unwrap();
        entries.get(key).and_then(|entry| {
            if entry.expired(now) {
                None
            } else {
                Some(EntryMetadata {
                    age: now.duration_since(entry.written_at),
                    ttl: entry.ttl,
                })
            }
        })
    }

    /// Sweep the store, removing every expired entry.
    ///
    /// Returns the number of entries evicted.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, entry| !entry.expired(now));
        before - entries.len()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.lock().unwrap();
        entries.values().filter(|entry| !entry.expired(now)).count()
    }

    /// Whether the store holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl<V: Clone> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn get_within_ttl_returns_value() {
        let store = MemoryStore::new();
        store.set("k", 42u32, Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(store.get("k"), Some(42));
        assert!(store.has("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn get_at_ttl_boundary_expires() {
        let store = MemoryStore::new();
        store.set("k", 42u32, Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(store.get("k"), None);
        assert!(!store.has("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn overwrite_resets_ttl() {
        let store = MemoryStore::new();
        store.set("k", 1u32, Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(8)).await;
        store.set("k", 2, Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(store.get("k"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn metadata_reports_age_without_evicting() {
        let store = MemoryStore::new();
        store.set("k", 1u32, Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(7)).await;
        let meta = store.metadata("k").unwrap();
        assert_eq!(meta.age, Duration::from_secs(7));
        assert_eq!(meta.ttl, Duration::from_secs(10));
        assert_eq!(store.get("k"), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn metadata_absent_for_expired_entry() {
        let store = MemoryStore::new();
        store.set("k", 1u32, Duration::from_secs(1));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.metadata("k"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_evicts_only_expired() {
        let store = MemoryStore::new();
        store.set("short", 1u32, Duration::from_secs(1));
        store.set("long", 2u32, Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(store.cleanup(), 1);
        assert_eq!(store.get("long"), Some(2));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_lists_only_live_entries() {
        let store = MemoryStore::new();
        store.set("a", 1u32, Duration::from_secs(1));
        store.set("b", 2u32, Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.keys(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let store = MemoryStore::new();
        store.set("k", 1u32, Duration::from_secs(60));
        assert!(store.delete("k"));
        assert!(!store.delete("k"));
        assert!(store.is_empty());
    }
}
