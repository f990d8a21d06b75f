//! Read-through vertex cache.
//!
//! An optional LRU cache the adapter consults before hitting the storage
//! engine. Records are held behind `Arc` so hits never copy vector data.
//! `IndexMap` preserves insertion order (front = LRU, back = MRU), which
//! gives O(1) lookup and O(1) amortized recency updates.

use crate::graph::{VertexId, VertexRecord};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of evictions.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculates the hit rate (0.0 to 1.0).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Thread-safe LRU cache of vertex records keyed by identity.
pub struct VertexCache {
    capacity: usize,
    inner: RwLock<IndexMap<VertexId, Arc<VertexRecord>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl VertexCache {
    /// Creates a cache holding up to `capacity` records.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be at least 1");
        Self {
            capacity,
            inner: RwLock::new(IndexMap::with_capacity(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Returns the configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the current number of cached records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns true if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts a record, evicting the LRU entry at capacity.
    pub fn insert(&self, key: VertexId, value: Arc<VertexRecord>) {
        let mut inner = self.inner.write();

        if inner.shift_remove(&key).is_some() {
            inner.insert(key, value);
            return;
        }

        if inner.len() >= self.capacity && inner.shift_remove_index(0).is_some() {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }

        inner.insert(key, value);
    }

    /// Looks up a record, updating recency on a hit.
    #[must_use]
    pub fn get(&self, key: VertexId) -> Option<Arc<VertexRecord>> {
        let value = {
            let inner = self.inner.read();
            inner.get(&key).cloned()
        };

        match value {
            Some(v) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                let mut inner = self.inner.write();
                if inner.shift_remove(&key).is_some() {
                    inner.insert(key, Arc::clone(&v));
                }
                Some(v)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Drops a record, e.g. after a property write or vertex deletion.
    pub fn invalidate(&self, key: VertexId) {
        self.inner.write().shift_remove(&key);
    }

    /// Clears all entries.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Returns a snapshot of the cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
