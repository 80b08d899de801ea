//! Time-to-live cache.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;

// ---------------------------------------------------------------------------
// TtlCacheStats
// ---------------------------------------------------------------------------

/// Snapshot returned by [`TtlCache::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TtlCacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
}

// ---------------------------------------------------------------------------
// TtlCache
// ---------------------------------------------------------------------------

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// A key → value map whose entries are valid for `ttl` after insertion.
///
/// Expired entries are never returned.  They are removed when a lookup hits
/// them, or in bulk by [`purge_expired`](Self::purge_expired).
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the value for `key` if present and not expired.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub(crate) fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            None => return None,
            Some(entry) => !self.is_valid(entry, now),
        };
        if expired {
            entries.remove(key);
            log::debug!("cache: evicted expired entry {key:?}");
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }

    /// Insert or replace `key`, stamping it with the current time.
    pub fn put(&self, key: String, value: V) {
        self.put_at(key, value, Instant::now());
    }

    pub(crate) fn put_at(&self, key: String, value: V, now: Instant) {
        self.lock().insert(
            key,
            Entry {
                value,
                inserted_at: now,
            },
        );
    }

    /// Remove `key` regardless of its age.  Returns `true` if it was present.
    pub fn invalidate(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Remove every entry.  Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let count = entries.len();
        entries.clear();
        count
    }

    /// Drop all expired entries now.  Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub(crate) fn purge_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| self.is_valid(entry, now));
        before - entries.len()
    }

    pub fn stats(&self) -> TtlCacheStats {
        self.stats_at(Instant::now())
    }

    pub(crate) fn stats_at(&self, now: Instant) -> TtlCacheStats {
        let entries = self.lock();
        let total = entries.len();
        let valid = entries.values().filter(|e| self.is_valid(e, now)).count();
        TtlCacheStats {
            total_entries: total,
            valid_entries: valid,
            expired_entries: total - valid,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    fn is_valid(&self, entry: &Entry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.inserted_at) < self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn get_returns_fresh_value() {
        let cache = TtlCache::new(HOUR);
        cache.put("bonjour:bété".into(), "Akwaba".to_string());
        assert_eq!(cache.get("bonjour:bété").as_deref(), Some("Akwaba"));
        assert_eq!(cache.get("merci:bété"), None);
    }

    #[test]
    fn entry_absent_at_exactly_ttl() {
        let cache = TtlCache::new(HOUR);
        let t0 = Instant::now();
        cache.put_at("k".into(), "v".to_string(), t0);

        assert!(cache.get_at("k", t0 + HOUR - Duration::from_secs(1)).is_some());
        assert_eq!(cache.get_at("k", t0 + HOUR), None);
    }

    #[test]
    fn expired_lookup_evicts_entry() {
        let cache = TtlCache::new(HOUR);
        let t0 = Instant::now();
        cache.put_at("k".into(), "v".to_string(), t0);

        assert_eq!(cache.get_at("k", t0 + HOUR * 2), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn stats_split_valid_and_expired() {
        let cache = TtlCache::new(HOUR);
        let t0 = Instant::now();
        cache.put_at("old".into(), 1u32, t0);
        cache.put_at("new".into(), 2u32, t0 + HOUR);

        let stats = cache.stats_at(t0 + HOUR + Duration::from_secs(1));
        assert_eq!(
            stats,
            TtlCacheStats {
                total_entries: 2,
                valid_entries: 1,
                expired_entries: 1,
            }
        );
    }

    #[test]
    fn purge_drops_only_expired() {
        let cache = TtlCache::new(HOUR);
        let t0 = Instant::now();
        cache.put_at("old".into(), 1u32, t0);
        cache.put_at("new".into(), 2u32, t0 + HOUR);

        assert_eq!(cache.purge_expired_at(t0 + HOUR + Duration::from_secs(1)), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_at("new", t0 + HOUR + Duration::from_secs(1)), Some(2));
        assert_eq!(cache.purge_expired_at(t0 + HOUR + Duration::from_secs(1)), 0);
    }

    #[test]
    fn put_refreshes_timestamp() {
        let cache = TtlCache::new(HOUR);
        let t0 = Instant::now();
        cache.put_at("k".into(), "first".to_string(), t0);
        cache.put_at("k".into(), "second".to_string(), t0 + HOUR);

        assert_eq!(
            cache.get_at("k", t0 + HOUR + Duration::from_secs(10)).as_deref(),
            Some("second")
        );
    }

    #[test]
    fn invalidate_and_clear() {
        let cache = TtlCache::new(HOUR);
        cache.put("a".into(), 1u8);
        cache.put("b".into(), 2u8);

        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.clear(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_ttl_never_serves() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.put("k".into(), 1u8);
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn cache_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TtlCache<String>>();
    }
}
