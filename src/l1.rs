//! L1 Store — bounded in-process cache with TTL expiry and FIFO eviction.
//!
//! `DashMap<String, Entry>` with lazy TTL expiry, bounded by a single
//! insertion-order queue as the sole source of truth for eviction order
//! (one queue, not two structures that could drift out of sync).

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::value::Value;

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Instant,
}

impl Entry {
    fn new(value: Value, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Bounded in-process key-value store with TTL expiry and FIFO eviction.
///
/// All operations are total: malformed keys never panic, they just miss.
pub struct L1Store {
    map: DashMap<String, Entry>,
    order: Mutex<VecDeque<String>>,
    max_size: usize,
}

impl L1Store {
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            map: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            max_size,
        }
    }

    /// Get the value for `key` if present and not expired. Expired entries
    /// are removed as a side effect.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let expired = match self.map.get(key) {
            Some(entry) if entry.is_expired() => true,
            Some(entry) => return Some(entry.value.clone()),
            None => return None,
        };
        if expired {
            self.remove_tracked(key);
        }
        None
    }

    /// Insert or overwrite `key`. Evicts the oldest entry first if this
    /// insertion would exceed `max_size` and `key` isn't already present.
    pub fn set(&self, key: &str, value: Value, ttl: Duration) {
        if self.max_size == 0 {
            return;
        }

        let is_new_key = !self.map.contains_key(key);
        if is_new_key && self.map.len() >= self.max_size {
            self.evict_one();
        }

        self.map.insert(key.to_string(), Entry::new(value, ttl));

        let mut order = self.order.lock();
        if is_new_key {
            order.push_back(key.to_string());
        } else {
            // Overwrite: move to the tail of the insertion order.
            if let Some(pos) = order.iter().position(|k| k == key) {
                order.remove(pos);
            }
            order.push_back(key.to_string());
        }
    }

    fn evict_one(&self) {
        let oldest = self.order.lock().pop_front();
        if let Some(key) = oldest {
            self.map.remove(&key);
        }
    }

    fn remove_tracked(&self, key: &str) {
        self.map.remove(key);
        let mut order = self.order.lock();
        if let Some(pos) = order.iter().position(|k| k == key) {
            order.remove(pos);
        }
    }

    /// Remove `key`. Returns whether it existed.
    pub fn delete(&self, key: &str) -> bool {
        let existed = self.map.remove(key).is_some();
        if existed {
            let mut order = self.order.lock();
            if let Some(pos) = order.iter().position(|k| k == key) {
                order.remove(pos);
            }
        }
        existed
    }

    /// Check whether `key` exists and is not expired.
    #[must_use]
    pub fn exists(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.map.clear();
        self.order.lock().clear();
    }

    /// Snapshot of all live keys (expired entries are lazily dropped as
    /// they're touched elsewhere; this returns whatever is currently
    /// stored, expired or not, matching the lazy-expiry contract).
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.map.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Current number of stored entries (including not-yet-expired-but-stale
    /// ones that haven't been touched).
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let store = L1Store::new(10);
        store.set("k1", Value::from("v1"), Duration::from_secs(60));
        assert_eq!(store.get("k1"), Some(Value::from("v1")));
    }

    #[test]
    fn overwrite_replaces_value() {
        let store = L1Store::new(10);
        store.set("k", Value::from("v1"), Duration::from_secs(60));
        store.set("k", Value::from("v2"), Duration::from_secs(60));
        assert_eq!(store.get("k"), Some(Value::from("v2")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn delete_then_get_is_absent() {
        let store = L1Store::new(10);
        store.set("k", Value::from("v"), Duration::from_secs(60));
        assert!(store.delete("k"));
        assert_eq!(store.get("k"), None);
        assert!(!store.delete("k"));
    }

    #[test]
    fn fifo_eviction_drops_oldest_first() {
        let store = L1Store::new(2);
        store.set("a", Value::Number(1.0), Duration::from_secs(60));
        store.set("b", Value::Number(2.0), Duration::from_secs(60));
        store.set("c", Value::Number(3.0), Duration::from_secs(60));

        assert_eq!(store.get("a"), None);
        assert_eq!(store.get("b"), Some(Value::Number(2.0)));
        assert_eq!(store.get("c"), Some(Value::Number(3.0)));
        assert!(store.len() <= 2);
    }

    #[test]
    fn overwrite_does_not_trigger_eviction_or_move_others() {
        let store = L1Store::new(2);
        store.set("a", Value::Number(1.0), Duration::from_secs(60));
        store.set("b", Value::Number(2.0), Duration::from_secs(60));
        store.set("a", Value::Number(10.0), Duration::from_secs(60));
        // "a" was refreshed to the tail; "b" is now the oldest.
        store.set("c", Value::Number(3.0), Duration::from_secs(60));
        assert_eq!(store.get("b"), None);
        assert_eq!(store.get("a"), Some(Value::Number(10.0)));
        assert_eq!(store.get("c"), Some(Value::Number(3.0)));
    }

    #[test]
    fn expired_entry_is_absent_and_removed() {
        let store = L1Store::new(10);
        store.set("k", Value::from("v"), Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(store.get("k"), None);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn zero_max_size_never_stores_anything() {
        let store = L1Store::new(0);
        store.set("k", Value::from("v"), Duration::from_secs(60));
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn exists_honors_ttl() {
        let store = L1Store::new(10);
        store.set("k", Value::from("v"), Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(20));
        assert!(!store.exists("k"));
    }
}
