//! Single-wildcard key patterns.
//!
//! Strategy and invalidation patterns contain at most one `*`, which
//! matches any run of characters (including none). Matching is literal
//! segment comparison — prefix and suffix around the wildcard are
//! compared byte-for-byte — so regex metacharacters in keys and
//! patterns have no special meaning.

use crate::{MimirError, Result};

/// A parsed key pattern: either an exact key or `prefix*suffix`.
///
/// ```rust
/// # use mimir::KeyPattern;
/// let p = KeyPattern::parse("feed-*")?;
/// assert!(p.matches("feed-home"));
/// assert!(p.matches("feed-"));      // empty wildcard segment matches
/// assert!(!p.matches("search-rs"));
/// # Ok::<(), mimir::MimirError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern {
    raw: String,
    kind: PatternKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternKind {
    /// No wildcard — the pattern matches exactly one key.
    Exact,
    /// One wildcard at byte offset `star` in `raw`.
    Wildcard { star: usize },
}

impl KeyPattern {
    /// Parse a pattern string.
    ///
    /// Fails on an empty pattern or more than one `*`.
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(MimirError::EmptyPattern);
        }
        let mut stars = pattern.match_indices('*');
        let first = stars.next().map(|(i, _)| i);
        if stars.next().is_some() {
            return Err(MimirError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "at most one '*' wildcard is allowed".to_string(),
            });
        }
        let kind = match first {
            Some(star) => PatternKind::Wildcard { star },
            None => PatternKind::Exact,
        };
        Ok(Self {
            raw: pattern.to_string(),
            kind,
        })
    }

    /// The original pattern string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether `key` matches this pattern.
    ///
    /// The wildcard matches any run of characters, including the empty
    /// one: `"feed-*"` matches the bare `"feed-"`. Prefix and suffix
    /// never overlap — `"ab*ba"` does not match `"aba"`.
    pub fn matches(&self, key: &str) -> bool {
        match self.kind {
            PatternKind::Exact => key == self.raw,
            PatternKind::Wildcard { star } => {
                let prefix = &self.raw[..star];
                let suffix = &self.raw[star + 1..];
                key.len() >= prefix.len() + suffix.len()
                    && key.starts_with(prefix)
                    && key.ends_with(suffix)
            }
        }
    }
}

impl std::fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_pattern_matches_only_itself() {
        let p = KeyPattern::parse("entity-list").unwrap();
        assert!(p.matches("entity-list"));
        assert!(!p.matches("entity-list-2"));
        assert!(!p.matches("entity"));
    }

    #[test]
    fn trailing_wildcard_matches_any_suffix() {
        let p = KeyPattern::parse("user-profile-*").unwrap();
        assert!(p.matches("user-profile-abc123"));
        assert!(p.matches("user-profile-"));
        assert!(!p.matches("user-profile"));
        assert!(!p.matches("feed-home"));
    }

    #[test]
    fn leading_wildcard_matches_any_prefix() {
        let p = KeyPattern::parse("*-reviews").unwrap();
        assert!(p.matches("entity-42-reviews"));
        assert!(p.matches("-reviews"));
        assert!(!p.matches("reviews"));
    }

    #[test]
    fn interior_wildcard_requires_both_segments() {
        let p = KeyPattern::parse("feed-*-page").unwrap();
        assert!(p.matches("feed-home-page"));
        assert!(p.matches("feed--page"));
        assert!(!p.matches("feed-home"));
    }

    #[test]
    fn prefix_and_suffix_never_overlap() {
        let p = KeyPattern::parse("ab*ba").unwrap();
        assert!(!p.matches("aba"));
        assert!(p.matches("abba"));
        assert!(p.matches("abxba"));
    }

    #[test]
    fn regex_metacharacters_are_inert() {
        let p = KeyPattern::parse("search-(rs).*").unwrap();
        assert!(p.matches("search-(rs)."));
        assert!(p.matches("search-(rs).page-2"));
        assert!(!p.matches("search-Xrs)."));
    }

    #[test]
    fn bare_wildcard_matches_everything() {
        let p = KeyPattern::parse("*").unwrap();
        assert!(p.matches(""));
        assert!(p.matches("anything"));
    }

    #[test]
    fn empty_pattern_rejected() {
        assert!(matches!(KeyPattern::parse(""), Err(MimirError::EmptyPattern)));
    }

    #[test]
    fn multiple_wildcards_rejected() {
        let err = KeyPattern::parse("a*b*c").unwrap_err();
        assert!(matches!(err, MimirError::InvalidPattern { .. }));
    }
}
