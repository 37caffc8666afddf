//! # Storefront Cache
//!
//! In-memory caching infrastructure for the storefront backend.
//!
//! ## Features
//!
//! - **TTL staleness**: entries are valid while `now - created_at < ttl`, checked lazily on read
//! - **Single-flight refresh**: concurrent misses for one key share a single fetch
//! - **No negative caching**: failed fetches are never stored
//! - **Safe bulk clear**: fetches that started before a clear never repopulate the cache
//! - **Metrics**: hit/miss/coalesce/failure counters with snapshot statistics

pub mod cache;
pub mod error;
mod flight;
pub mod metrics;
pub mod storage;
pub mod strategy;

pub use cache::{CacheBuilder, CacheConfig, TtlCache};
pub use error::CacheError;
pub use metrics::{CacheMetrics, CacheStats};
pub use storage::{CacheEntry, MemoryStorage};
pub use strategy::{CacheStrategy, TtlStrategy};

/// Re-export commonly used types
pub type Result<T> = std::result::Result<T, CacheError>;
