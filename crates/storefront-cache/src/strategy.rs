//! Cache staleness strategies

use std::time::Duration;

use tokio::time::Instant;

/// Decides whether a cached entry may still be served
pub trait CacheStrategy: Send + Sync {
    /// Check if an entry created at `created_at` is stale at `now`
    fn is_stale(&self, created_at: Instant, now: Instant) -> bool;

    /// Get strategy name for debugging
    fn name(&self) -> &str;
}

/// Time-to-live (TTL) based staleness
///
/// An entry is fresh while `now - created_at < ttl`; at exactly `ttl` it is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlStrategy {
    ttl: Duration,
}

impl TtlStrategy {
    /// Create new TTL strategy
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// Configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl CacheStrategy for TtlStrategy {
    fn is_stale(&self, created_at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(created_at) >= self.ttl
    }

    fn name(&self) -> &str {
        "ttl"
    }
}
