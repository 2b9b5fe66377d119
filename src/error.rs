//! Error types.
//!
//! The cache's public surface is a thin boundary: validation and
//! configuration errors propagate synchronously; everything else (remote
//! failures, codec failures, callback failures) is absorbed and recorded as
//! a metric instead. `CacheError` covers only the propagating kinds.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    /// Input violates a documented precondition: bad key, non-string text,
    /// non-positive TTL, malformed options.
    #[error("validation error: {0}")]
    Validation(String),

    /// Construction-time configuration problem: bad URL scheme, an
    /// out-of-range threshold, a malformed tier map.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Critical internal failure during composition (a required
    /// subcomponent could not be built).
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;
