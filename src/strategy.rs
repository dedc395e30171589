//! Cache strategies and the pattern registry.
//!
//! A [`CacheStrategy`] attaches TTL, refresh, and dependency policy to a
//! key pattern. The registry resolves a key to the **first** registered
//! pattern that matches it, in insertion order, so more specific
//! patterns should be registered before broader ones.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pattern::KeyPattern;
use crate::{MimirError, Result};

/// Relative importance of a strategy's entries.
///
/// Informational only: carried through analytics and reserved for
/// future eviction-order decisions, not consulted by any scheduling
/// today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Caching policy for keys matching one pattern.
///
/// ```rust
/// # use mimir::{CacheStrategy, Priority};
/// # use std::time::Duration;
/// let strategy = CacheStrategy::new(Duration::from_secs(120))
///     .refresh_threshold(0.8)
///     .priority(Priority::High)
///     .depends_on("user-behavior-*");
/// ```
#[derive(Debug, Clone)]
pub struct CacheStrategy {
    /// How long an entry is served before expiring. Default: 5 minutes.
    pub ttl: Duration,
    /// Fraction of `ttl` in `(0, 1]` after which a hit becomes eligible
    /// for background refresh. Default: 0.75.
    pub refresh_threshold: f64,
    /// Informational priority. Default: [`Priority::Medium`].
    pub priority: Priority,
    /// Patterns this strategy's data is derived from. When a key
    /// matching one of these changes, every key matching this
    /// strategy's own pattern is cascade-invalidated.
    pub dependencies: Vec<String>,
}

impl Default for CacheStrategy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            refresh_threshold: 0.75,
            priority: Priority::Medium,
            dependencies: Vec::new(),
        }
    }
}

impl CacheStrategy {
    /// Create a strategy with the given TTL and default refresh policy.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            ..Self::default()
        }
    }

    /// Set the refresh threshold (fraction of TTL in `(0, 1]`).
    pub fn refresh_threshold(mut self, threshold: f64) -> Self {
        self.refresh_threshold = threshold;
        self
    }

    /// Set the informational priority.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Add a dependency pattern.
    pub fn depends_on(mut self, pattern: impl Into<String>) -> Self {
        self.dependencies.push(pattern.into());
        self
    }

    /// Replace the dependency list.
    pub fn dependencies(mut self, patterns: Vec<String>) -> Self {
        self.dependencies = patterns;
        self
    }

    fn validate(&self) -> Result<()> {
        let t = self.refresh_threshold;
        if !t.is_finite() || t <= 0.0 || t > 1.0 {
            return Err(MimirError::InvalidStrategy {
                field: "refresh_threshold",
                value: t,
            });
        }
        Ok(())
    }
}

/// A strategy registered under a parsed pattern.
pub(crate) struct Registered {
    pub pattern: KeyPattern,
    pub dependencies: Vec<KeyPattern>,
    pub strategy: CacheStrategy,
}

/// Insertion-ordered pattern → strategy registry.
///
/// Resolution is first-match-wins in registration order; re-registering
/// an existing pattern string replaces the strategy **in place** so the
/// relative order of patterns never changes meaning.
pub(crate) struct StrategyRegistry {
    entries: Vec<Registered>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register (or replace) a strategy for a pattern.
    ///
    /// Validates the pattern, the dependency patterns, and the strategy
    /// fields before touching the registry.
    pub fn insert(&mut self, pattern: &str, strategy: CacheStrategy) -> Result<()> {
        let pattern = KeyPattern::parse(pattern)?;
        strategy.validate()?;
        let dependencies = strategy
            .dependencies
            .iter()
            .map(|dep| KeyPattern::parse(dep))
            .collect::<Result<Vec<_>>>()?;
        let entry = Registered {
            pattern,
            dependencies,
            strategy,
        };
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.pattern == entry.pattern)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        Ok(())
    }

    /// First registered strategy whose pattern matches `key`.
    pub fn resolve(&self, key: &str) -> Option<&Registered> {
        self.entries.iter().find(|entry| entry.pattern.matches(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registered> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
