//! TTL cache with single-flight refresh

use std::{future::Future, hash::Hash, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

use crate::{
    error::{CacheError, Result},
    flight::{Flight, FlightRegistry},
    metrics::CacheMetrics,
    storage::{CacheEntry, MemoryStorage},
    strategy::{CacheStrategy, TtlStrategy},
};

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live for cache entries
    pub ttl: Duration,
    /// Initial capacity of the backing map
    pub initial_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5 * 60),
            initial_capacity: 0,
        }
    }
}

/// Concurrent in-memory cache with lazy TTL staleness.
///
/// Misses are resolved through a caller-supplied fetch. Concurrent misses on
/// the same key share one fetch; failed fetches are returned to the caller and
/// never stored.
pub struct TtlCache<K, V>
where
    K: Eq + Hash,
{
    storage: MemoryStorage<K, V>,
    strategy: Arc<dyn CacheStrategy>,
    flights: FlightRegistry<K, V>,
    metrics: CacheMetrics,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Create a cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self::with_strategy(Arc::new(TtlStrategy::new(ttl)), 0)
    }

    /// Create a cache with a custom staleness strategy
    pub fn with_strategy(strategy: Arc<dyn CacheStrategy>, initial_capacity: usize) -> Self {
        Self {
            storage: MemoryStorage::with_capacity(initial_capacity),
            strategy,
            flights: FlightRegistry::new(),
            metrics: CacheMetrics::new(),
        }
    }

    /// Get cache metrics
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    /// Name of the staleness strategy in use
    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    fn fresh(&self, key: &K) -> Option<V> {
        let entry = self.storage.get(key)?;
        if self.strategy.is_stale(entry.created_at, Instant::now()) {
            None
        } else {
            Some(entry.value)
        }
    }

    fn store(&self, key: K, value: V) {
        self.storage.insert(key, CacheEntry::new(value));
        self.metrics.set_entry_count(self.storage.len());
    }

    /// Return the fresh cached value for `key`, if any
    pub fn get(&self, key: &K) -> Option<V> {
        match self.fresh(key) {
            Some(value) => {
                self.metrics.record_hit();
                Some(value)
            }
            None => {
                self.metrics.record_miss();
                None
            }
        }
    }

    /// Store a value, overwriting any previous entry
    pub fn insert(&self, key: K, value: V) {
        let generation = self.flights.generation();
        self.flights
            .commit_if_current(generation, || self.store(key, value));
    }

    /// Return the cached value for `key`, or run `fetch` to refresh it.
    ///
    /// A fresh entry is returned without calling `fetch`. On a miss or a stale
    /// entry, `fetch` runs at most once per concurrent wave of callers; its
    /// `Ok` value is stored with the current instant and returned, its `Err`
    /// is returned as-is and nothing is stored.
    pub async fn get_or_try_fetch<F, Fut, E>(&self, key: K, fetch: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        if let Some(value) = self.fresh(&key) {
            self.metrics.record_hit();
            return Ok(value);
        }
        self.metrics.record_miss();

        match self.flights.join(&key) {
            Flight::Leader(leader) => match fetch().await {
                Ok(value) => {
                    leader.complete(&value, || self.store(key, value.clone()));
                    Ok(value)
                }
                Err(err) => {
                    self.metrics.record_fetch_failure();
                    drop(leader);
                    Err(err)
                }
            },
            Flight::Follower(rx) => {
                self.metrics.record_coalesced();
                if let Ok(value) = rx.await {
                    return Ok(value);
                }

                debug!("in-flight fetch failed or was detached, fetching directly");
                let generation = self.flights.generation();
                match fetch().await {
                    Ok(value) => {
                        self.flights
                            .commit_if_current(generation, || self.store(key, value.clone()));
                        Ok(value)
                    }
                    Err(err) => {
                        self.metrics.record_fetch_failure();
                        Err(err)
                    }
                }
            }
        }
    }

    /// Remove the entry for `key`
    pub fn invalidate(&self, key: &K) -> bool {
        let removed = self.storage.remove(key);
        if removed {
            self.metrics.record_invalidation();
            self.metrics.set_entry_count(self.storage.len());
        }
        removed
    }

    /// Remove every entry and detach in-flight fetches so none of them can
    /// repopulate the cache afterwards
    pub fn clear(&self) {
        let detached = self.flights.reset(|| self.storage.clear());
        self.metrics.record_invalidation();
        self.metrics.set_entry_count(0);
        debug!(detached, "cache cleared");
    }

    /// Number of stored entries, fresh or stale
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Number of fetches currently in flight
    pub fn in_flight(&self) -> usize {
        self.flights.in_flight()
    }
}

/// Cache builder for convenient construction
pub struct CacheBuilder {
    config: CacheConfig,
    strategy: Option<Arc<dyn CacheStrategy>>,
}

impl CacheBuilder {
    /// Create a new cache builder
    pub fn new() -> Self {
        Self {
            config: CacheConfig::default(),
            strategy: None,
        }
    }

    /// Set cache configuration
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the time-to-live
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl = ttl;
        self
    }

    /// Set a custom staleness strategy (overrides the TTL)
    pub fn strategy(mut self, strategy: Arc<dyn CacheStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Build the cache
    pub fn build<K, V>(self) -> Result<TtlCache<K, V>>
    where
        K: Eq + Hash + Clone + Send + Sync,
        V: Clone + Send + Sync,
    {
        let strategy = match self.strategy {
            Some(strategy) => strategy,
            None => {
                if self.config.ttl.is_zero() {
                    return Err(CacheError::InvalidConfig {
                        message: "TTL must be greater than zero".to_string(),
                    });
                }
                Arc::new(TtlStrategy::new(self.config.ttl))
            }
        };

        Ok(TtlCache::with_strategy(strategy, self.config.initial_capacity))
    }
}

impl Default for CacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}
