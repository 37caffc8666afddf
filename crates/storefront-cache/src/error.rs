//! Cache-related error types

use thiserror::Error;

/// Cache construction errors
///
/// Fetch failures are not wrapped: `TtlCache::get_or_try_fetch` hands the
/// caller's own error type back untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Invalid cache configuration: {message}")]
    InvalidConfig { message: String },
}

/// Re-export commonly used Result type
pub type Result<T> = std::result::Result<T, CacheError>;
