//! Entry-count-bounded cache with FIFO batch eviction.
//!
//! Eviction is by **insertion order**, not recency of use: reading an entry
//! never protects it.  When the cache is full, the oldest `max_entries / 5`
//! entries (at least one) are dropped in one batch before the new entry goes
//! in, so the cache never holds more than `max_entries` items.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

// ---------------------------------------------------------------------------
// Weighted
// ---------------------------------------------------------------------------

/// Payload size reporting for [`BoundedCacheStats::total_size_bytes`].
pub trait Weighted {
    fn weight(&self) -> usize;
}

impl Weighted for Vec<u8> {
    fn weight(&self) -> usize {
        self.len()
    }
}

impl Weighted for String {
    fn weight(&self) -> usize {
        self.len()
    }
}

// ---------------------------------------------------------------------------
// BoundedCacheStats
// ---------------------------------------------------------------------------

/// Snapshot returned by [`BoundedCache::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundedCacheStats {
    pub entries: usize,
    pub max_entries: usize,
    pub total_size_bytes: usize,
}

impl BoundedCacheStats {
    /// Total payload size in MiB, rounded to two decimals.
    pub fn total_size_mb(&self) -> f64 {
        let mb = self.total_size_bytes as f64 / (1024.0 * 1024.0);
        (mb * 100.0).round() / 100.0
    }
}

// ---------------------------------------------------------------------------
// BoundedCache
// ---------------------------------------------------------------------------

struct Inner<V> {
    map: HashMap<String, V>,
    /// Keys in insertion order, oldest at the front.
    order: VecDeque<String>,
}

/// A key → value map holding at most `max_entries` items.
pub struct BoundedCache<V> {
    inner: Mutex<Inner<V>>,
    max_entries: usize,
}

impl<V: Clone + Weighted> BoundedCache<V> {
    /// # Panics
    ///
    /// Panics if `max_entries == 0`.
    pub fn new(max_entries: usize) -> Self {
        assert!(max_entries > 0, "BoundedCache max_entries must be > 0");
        Self {
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            max_entries,
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.lock().map.get(key).cloned()
    }

    /// Insert `value` under `key`.
    ///
    /// Replacing an existing key keeps its original insertion position and
    /// never triggers eviction.
    pub fn put(&self, key: String, value: V) {
        let mut inner = self.lock();

        if let Some(slot) = inner.map.get_mut(&key) {
            *slot = value;
            return;
        }

        if inner.map.len() >= self.max_entries {
            let batch = (self.max_entries / 5).max(1);
            let mut evicted = 0;
            while evicted < batch {
                let Some(oldest) = inner.order.pop_front() else {
                    break;
                };
                if inner.map.remove(&oldest).is_some() {
                    evicted += 1;
                }
            }
            log::debug!("cache: evicted {evicted} oldest entries (max {})", self.max_entries);
        }

        inner.order.push_back(key.clone());
        inner.map.insert(key, value);
    }

    /// Remove `key`.  Returns `true` if it was present.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut inner = self.lock();
        let removed = inner.map.remove(key).is_some();
        if removed {
            inner.order.retain(|k| k != key);
        }
        removed
    }

    /// Remove every entry.  Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut inner = self.lock();
        let count = inner.map.len();
        inner.map.clear();
        inner.order.clear();
        count
    }

    pub fn stats(&self) -> BoundedCacheStats {
        let inner = self.lock();
        BoundedCacheStats {
            entries: inner.map.len(),
            max_entries: self.max_entries,
            total_size_bytes: inner.map.values().map(Weighted::weight).sum(),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().map.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
