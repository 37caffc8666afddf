//! Cache storage backend

use std::hash::Hash;

use dashmap::DashMap;
use tokio::time::Instant;

/// A cached value and the instant it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached data
    pub value: V,
    /// When the entry was created
    pub created_at: Instant,
}

impl<V> CacheEntry<V> {
    /// Create a new cache entry stamped with the current instant
    pub fn new(value: V) -> Self {
        Self {
            value,
            created_at: Instant::now(),
        }
    }

    /// Time elapsed since the entry was stored
    pub fn age(&self) -> std::time::Duration {
        Instant::now().saturating_duration_since(self.created_at)
    }
}

/// In-memory cache storage
///
/// A thin wrapper over a sharded concurrent map. Reads clone the entry out so
/// no shard lock is held by the caller.
#[derive(Debug)]
pub struct MemoryStorage<K, V>
where
    K: Eq + Hash,
{
    data: DashMap<K, CacheEntry<V>>,
}

impl<K, V> MemoryStorage<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create new in-memory storage
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    /// Create with initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: DashMap::with_capacity(capacity),
        }
    }

    /// Retrieve a copy of the entry for `key`
    pub fn get(&self, key: &K) -> Option<CacheEntry<V>> {
        self.data.get(key).map(|entry| entry.value().clone())
    }

    /// Store an entry, overwriting any previous one
    pub fn insert(&self, key: K, entry: CacheEntry<V>) {
        self.data.insert(key, entry);
    }

    /// Remove an entry
    pub fn remove(&self, key: &K) -> bool {
        self.data.remove(key).is_some()
    }

    /// Check if key exists (fresh or not)
    pub fn contains(&self, key: &K) -> bool {
        self.data.contains_key(key)
    }

    /// Clear all entries
    pub fn clear(&self) {
        self.data.clear();
    }

    /// Get number of entries
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if storage is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<K, V> Default for MemoryStorage<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
