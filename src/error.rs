//! Mimir error types

/// Mimir error types
#[derive(Debug, thiserror::Error)]
pub enum MimirError {
    // Pattern errors
    #[error("empty pattern")]
    EmptyPattern,

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // Strategy configuration errors
    /// A strategy field is outside its contract range (e.g.
    /// `refresh_threshold` outside `(0, 1]`). Raised at registration
    /// time so misconfiguration fails fast instead of silently skewing
    /// refresh behaviour later.
    #[error("invalid strategy configuration: {field} = {value}")]
    InvalidStrategy { field: &'static str, value: f64 },

    // Key errors
    #[error("cache key must not be empty")]
    EmptyKey,
}

/// Result type alias for Mimir operations
pub type Result<T> = std::result::Result<T, MimirError>;
