//! Mimir - Strategy-driven in-memory cache with stale-while-revalidate refresh
//!
//! This crate provides a [`CacheManager`] that layers caching policy on
//! top of a primitive TTL key/value store: key patterns map to
//! [`CacheStrategy`] configurations (TTL, background-refresh threshold,
//! dependency patterns), concurrent fetches for one key coalesce into a
//! single execution, and invalidating a key cascades to the entries
//! declared to depend on it.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use mimir::{CacheManager, CacheStrategy, ManagerConfig, Priority};
//!
//! #[tokio::main]
//! async fn main() -> mimir::Result<()> {
//!     let cache: CacheManager<String> = CacheManager::new(ManagerConfig::default());
//!     cache.set_strategy(
//!         "feed-*",
//!         CacheStrategy::new(Duration::from_secs(120))
//!             .refresh_threshold(0.8)
//!             .priority(Priority::High)
//!             .depends_on("user-behavior-*"),
//!     )?;
//!
//!     // Miss: the fetch runs, the result is cached for 120s. Later
//!     // hits past 96s (ttl * 0.8) serve the cached value immediately
//!     // and refresh in the background.
//!     let feed = cache
//!         .get_with("feed-home", || async {
//!             Ok::<_, std::convert::Infallible>("rendered feed".to_string())
//!         })
//!         .await;
//!     assert_eq!(feed.as_deref(), Some("rendered feed"));
//!
//!     // Behavioral data changed: drop everything that depends on it.
//!     let removed = cache.invalidate_dependencies("user-behavior-42");
//!     assert_eq!(removed, 1);
//!     Ok(())
//! }
//! ```
//!
//! # Maintenance
//!
//! Metrics pruning and expired-entry sweeps run on a recurring task
//! started explicitly via [`CacheManager::start_maintenance`]; drop (or
//! [`stop`](MaintenanceHandle::stop)) the returned handle to end it.

pub mod error;
pub mod manager;
pub mod pattern;
pub mod store;
pub mod strategy;
pub mod telemetry;

// Re-export main types at crate root
pub use error::{MimirError, Result};
pub use manager::{
    CacheAnalytics, CacheManager, KeyPerformance, MaintenanceHandle, MaintenanceReport,
    ManagerConfig,
};
pub use pattern::KeyPattern;
pub use store::{EntryMetadata, MemoryStore};
pub use strategy::{CacheStrategy, Priority};
