//! Generic Tiered Cache (C4) — the primary cache surface composing L1,
//! a remote store, the codec, and the performance monitor.
//!
//! `Arc<Inner>`-wrapped for cheap cloning, with a stampede guard
//! (`in_flight: DashMap<String, Arc<Mutex<()>>>` plus an RAII
//! `CleanupGuard`) around the double-checked-locking `get()` flow.
//! Post-operation hooks are a generic per-event callback list rather than
//! a single subscriber, so more than one caller can observe cache events.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

use crate::codec::Codec;
use crate::config::CacheConfig;
use crate::l1::L1Store;
use crate::monitor::PerformanceMonitor;
use crate::remote::RemoteStore;
use crate::value::Value;

type InFlightMap = DashMap<String, Arc<AsyncMutex<()>>>;

struct CleanupGuard<'a> {
    map: &'a InFlightMap,
    key: String,
}

impl Drop for CleanupGuard<'_> {
    fn drop(&mut self) {
        self.map.remove(&self.key);
    }
}

/// Post-operation hook events (spec §4.4's `register_callback`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent {
    GetSuccess,
    GetMiss,
    SetSuccess,
    DeleteSuccess,
}

pub type Callback = Box<dyn Fn(&str, Option<&Value>) + Send + Sync>;

struct CallbackRegistry {
    get_success: Vec<Callback>,
    get_miss: Vec<Callback>,
    set_success: Vec<Callback>,
    delete_success: Vec<Callback>,
}

impl CallbackRegistry {
    fn new() -> Self {
        Self {
            get_success: Vec::new(),
            get_miss: Vec::new(),
            set_success: Vec::new(),
            delete_success: Vec::new(),
        }
    }

    fn fire(&self, event: CacheEvent, key: &str, value: Option<&Value>) {
        let handlers = match event {
            CacheEvent::GetSuccess => &self.get_success,
            CacheEvent::GetMiss => &self.get_miss,
            CacheEvent::SetSuccess => &self.set_success,
            CacheEvent::DeleteSuccess => &self.delete_success,
        };
        for handler in handlers {
            handler(key, value);
        }
    }
}

struct Inner<R: RemoteStore> {
    l1: L1Store,
    remote: std::sync::RwLock<Option<Arc<R>>>,
    remote_url: String,
    codec: Codec,
    monitor: Arc<PerformanceMonitor>,
    default_ttl: Duration,
    in_flight: InFlightMap,
    callbacks: std::sync::RwLock<CallbackRegistry>,
}

/// The two-tier cache surface: L1 in-process + an optional remote store.
///
/// Cheap to clone — internally `Arc`-wrapped.
pub struct TieredCache<R: RemoteStore> {
    inner: Arc<Inner<R>>,
}

impl<R: RemoteStore> Clone for TieredCache<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: RemoteStore> TieredCache<R> {
    #[must_use]
    pub fn new(config: &CacheConfig, monitor: Arc<PerformanceMonitor>) -> Self {
        let l1_size = if config.l1_enabled { config.l1_max_size } else { 0 };
        Self {
            inner: Arc::new(Inner {
                l1: L1Store::new(l1_size),
                remote: std::sync::RwLock::new(None),
                remote_url: config.remote_url.clone(),
                codec: Codec::new(config.compression_threshold, config.compression_level),
                monitor,
                default_ttl: config.default_ttl,
                in_flight: DashMap::new(),
                callbacks: std::sync::RwLock::new(CallbackRegistry::new()),
            }),
        }
    }

    /// Register a post-operation callback. Panics are not caught here —
    /// callers are expected to keep handlers infallible; any `Result`-style
    /// failure inside a handler should be logged by the handler itself,
    /// matching spec §4.4's "exceptions are logged and swallowed" rule at
    /// the call site rather than inside this registry.
    pub fn register_callback(&self, event: CacheEvent, callback: Callback) {
        let mut registry = self.inner.callbacks.write().unwrap_or_else(|e| e.into_inner());
        match event {
            CacheEvent::GetSuccess => registry.get_success.push(callback),
            CacheEvent::GetMiss => registry.get_miss.push(callback),
            CacheEvent::SetSuccess => registry.set_success.push(callback),
            CacheEvent::DeleteSuccess => registry.delete_success.push(callback),
        }
    }

    fn fire(&self, event: CacheEvent, key: &str, value: Option<&Value>) {
        let registry = self.inner.callbacks.read().unwrap_or_else(|e| e.into_inner());
        registry.fire(event, key, value);
    }

    fn remote(&self) -> Option<Arc<R>> {
        self.inner
            .remote
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn monitor(&self) -> &PerformanceMonitor {
        &self.inner.monitor
    }

    pub fn l1(&self) -> &L1Store {
        &self.inner.l1
    }

    /// The configured remote connection string, for callers that manage
    /// connecting the store themselves (see [`TieredCache::connect`]).
    pub fn remote_url(&self) -> &str {
        &self.inner.remote_url
    }
}

impl<R: RemoteStore + 'static> TieredCache<R> {
    /// Attach an already-constructed remote store (skips the `connect()`
    /// handshake, useful when the caller manages the store's lifecycle
    /// itself — e.g. a shared `RedisStore` or a test double).
    pub fn attach_remote(&self, remote: Arc<R>) {
        *self.inner.remote.write().unwrap_or_else(|e| e.into_inner()) = Some(remote);
    }

    /// Attempt to (re)connect the remote store. Returns `false` on failure
    /// and leaves the cache in memory-only (degraded) mode — never an
    /// error, per spec §4.4.
    pub async fn connect(&self, remote: Arc<R>) -> bool {
        match remote.ping().await {
            Ok(()) => {
                self.attach_remote(remote);
                true
            }
            Err(err) => {
                warn!(error = %err, "remote connect failed, operating in memory-only mode");
                false
            }
        }
    }

    pub fn disconnect(&self) {
        *self.inner.remote.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// `get(key)`: L1 first; on miss, fall through to remote with
    /// stampede protection, promoting a remote hit back into L1.
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.get_with(key, |_| true).await
    }

    /// Like [`TieredCache::get`], but `should_promote` decides whether a
    /// remote hit is copied into L1. Lets callers (e.g. `AiCache`) apply a
    /// tier-aware promotion policy instead of always promoting.
    pub async fn get_with(&self, key: &str, should_promote: impl Fn(&Value) -> bool) -> Option<Value> {
        let start = Instant::now();

        if let Some(value) = self.inner.l1.get(key) {
            self.monitor().record_operation_time(
                "get",
                start.elapsed(),
                true,
                value.approx_size(),
                BTreeMap::from([("cache_tier".to_string(), "l1".to_string())]),
            );
            self.fire(CacheEvent::GetSuccess, key, Some(&value));
            return Some(value);
        }

        let Some(remote) = self.remote() else {
            self.monitor().record_operation_time(
                "get",
                start.elapsed(),
                false,
                0,
                BTreeMap::from([("reason".to_string(), "connection_failed".to_string())]),
            );
            self.fire(CacheEvent::GetMiss, key, None);
            return None;
        };

        let key_owned = key.to_string();
        let lock = self
            .inner
            .in_flight
            .entry(key_owned.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        let _guard = lock.lock().await;
        let _cleanup = CleanupGuard {
            map: &self.inner.in_flight,
            key: key_owned,
        };

        // Re-check L1: another caller may have populated it while we waited.
        if let Some(value) = self.inner.l1.get(key) {
            self.monitor().record_operation_time(
                "get",
                start.elapsed(),
                true,
                value.approx_size(),
                BTreeMap::from([("cache_tier".to_string(), "l1".to_string())]),
            );
            self.fire(CacheEvent::GetSuccess, key, Some(&value));
            return Some(value);
        }

        match remote.get(key).await {
            Ok(Some(bytes)) => match self.inner.codec.decode(&bytes) {
                Ok(value) => {
                    if should_promote(&value) {
                        self.inner.l1.set(key, value.clone(), self.inner.default_ttl);
                    }
                    self.monitor().record_operation_time(
                        "get",
                        start.elapsed(),
                        true,
                        value.approx_size(),
                        BTreeMap::from([("cache_tier".to_string(), "remote".to_string())]),
                    );
                    self.fire(CacheEvent::GetSuccess, key, Some(&value));
                    Some(value)
                }
                Err(err) => {
                    warn!(key = %key, error = %err, "failed to decode remote value");
                    self.monitor().record_operation_time(
                        "get",
                        start.elapsed(),
                        false,
                        0,
                        BTreeMap::from([
                            ("reason".to_string(), "error".to_string()),
                            ("error".to_string(), err.to_string()),
                        ]),
                    );
                    self.fire(CacheEvent::GetMiss, key, None);
                    None
                }
            },
            Ok(None) => {
                self.monitor().record_operation_time(
                    "get",
                    start.elapsed(),
                    false,
                    0,
                    BTreeMap::from([("reason".to_string(), "key_not_found".to_string())]),
                );
                self.fire(CacheEvent::GetMiss, key, None);
                None
            }
            Err(err) => {
                warn!(key = %key, error = %err, "remote get failed");
                self.monitor().record_operation_time(
                    "get",
                    start.elapsed(),
                    false,
                    0,
                    BTreeMap::from([
                        ("reason".to_string(), "error".to_string()),
                        ("error".to_string(), err.to_string()),
                    ]),
                );
                self.fire(CacheEvent::GetMiss, key, None);
                None
            }
        }
    }

    /// `set(key, value, ttl)`: L1 write always happens first and is never
    /// undone by a remote failure.
    pub async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) {
        self.set_with(key, value, ttl, true).await;
    }

    /// Like [`TieredCache::set`], but `promote_l1` decides whether the
    /// value is also written into L1 (the remote write always happens
    /// regardless, so a later `get` on another instance can still promote
    /// it per its own policy).
    pub async fn set_with(&self, key: &str, value: Value, ttl: Option<Duration>, promote_l1: bool) {
        let start = Instant::now();
        let ttl = ttl.unwrap_or(self.inner.default_ttl);

        if promote_l1 {
            self.inner.l1.set(key, value.clone(), ttl);
        }

        if let Some(remote) = self.remote() {
            match self.inner.codec.encode(&value) {
                Ok(outcome) => {
                    if let Some(event) = outcome.compression {
                        self.monitor().record_compression(
                            event.original_size,
                            event.compressed_size,
                            event.elapsed,
                            "set",
                        );
                    }
                    if let Err(err) = remote.setex(key, &outcome.bytes, ttl).await {
                        warn!(key = %key, error = %err, "remote set failed, L1 write retained");
                    }
                }
                Err(err) => {
                    warn!(key = %key, error = %err, "failed to encode value for remote write");
                }
            }
        }

        self.monitor().record_operation_time(
            "set",
            start.elapsed(),
            true,
            value.approx_size(),
            BTreeMap::new(),
        );
        self.fire(CacheEvent::SetSuccess, key, Some(&value));
    }

    /// `delete(key)`: removes from both tiers; true if either held it.
    pub async fn delete(&self, key: &str) -> bool {
        let l1_existed = self.inner.l1.delete(key);

        let remote_existed = if let Some(remote) = self.remote() {
            match remote.delete(&[key.to_string()]).await {
                Ok(count) => count > 0,
                Err(err) => {
                    warn!(key = %key, error = %err, "remote delete failed");
                    false
                }
            }
        } else {
            false
        };

        let existed = l1_existed || remote_existed;
        if existed {
            self.fire(CacheEvent::DeleteSuccess, key, None);
        }
        existed
    }

    /// `exists(key)`: L1 first, then remote.
    pub async fn exists(&self, key: &str) -> bool {
        if self.inner.l1.exists(key) {
            return true;
        }
        match self.remote() {
            Some(remote) => remote.exists(key).await.unwrap_or(false),
            None => false,
        }
    }

    /// Remove every L1 key containing `pattern` as a substring, then (if
    /// remote is reachable) every remote key matching `<namespace>:*<pattern>*`.
    /// Returns the count of distinct keys removed from either tier (a key
    /// present in both only counts once); records an invalidation metric
    /// regardless of remote availability.
    pub async fn invalidate_pattern(&self, namespace: &str, pattern: &str, context: &str) -> u64 {
        let start = Instant::now();

        let l1_keys: std::collections::HashSet<String> = self
            .inner
            .l1
            .keys()
            .into_iter()
            .filter(|k| k.contains(pattern))
            .collect();
        for key in &l1_keys {
            self.inner.l1.delete(key);
        }

        let remote_keys: std::collections::HashSet<String> = if let Some(remote) = self.remote() {
            let glob = format!("{namespace}:*{pattern}*");
            match remote.keys(&glob).await {
                Ok(keys) => {
                    if !keys.is_empty() {
                        if let Err(err) = remote.delete(&keys).await {
                            warn!(pattern = %pattern, error = %err, "remote bulk delete failed");
                        }
                    }
                    keys.into_iter().collect()
                }
                Err(err) => {
                    warn!(pattern = %pattern, error = %err, "remote pattern scan failed");
                    std::collections::HashSet::new()
                }
            }
        } else {
            std::collections::HashSet::new()
        };

        let total = l1_keys.union(&remote_keys).count() as u64;
        debug!(pattern = %pattern, total, "invalidated pattern");
        self.monitor().record_invalidation(
            pattern,
            total,
            start.elapsed(),
            "pattern",
            BTreeMap::from([("context".to_string(), context.to_string())]),
            BTreeMap::new(),
        );
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::Thresholds;
    use crate::remote::testing::FakeRemoteStore;

    fn cache() -> TieredCache<FakeRemoteStore> {
        let config = CacheConfig::default();
        let monitor = Arc::new(PerformanceMonitor::new(Thresholds::default()));
        TieredCache::new(&config, monitor)
    }

    #[tokio::test]
    async fn get_after_set_reads_through_l1() {
        let cache = cache();
        cache.set("k", Value::from("v"), None).await;
        assert_eq!(cache.get("k").await, Some(Value::from("v")));
    }

    #[tokio::test]
    async fn get_without_remote_records_connection_failed_miss() {
        let cache = cache();
        assert_eq!(cache.get("missing").await, None);
    }

    #[tokio::test]
    async fn remote_hit_promotes_into_l1() {
        let cache = cache();
        let remote = Arc::new(FakeRemoteStore::new());
        cache.attach_remote(Arc::clone(&remote));

        // Write directly to the remote, bypassing L1.
        let encoded = Codec::new(1_024, 6).encode(&Value::from("remote-value")).unwrap();
        remote
            .setex("k", &encoded.bytes, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.get("k").await, Some(Value::from("remote-value")));
        // Second read should now be served purely from L1.
        assert_eq!(cache.get("k").await, Some(Value::from("remote-value")));
    }

    #[tokio::test]
    async fn remote_set_failure_does_not_undo_l1_write() {
        let cache = cache();
        let remote = Arc::new(FakeRemoteStore::new());
        cache.attach_remote(Arc::clone(&remote));
        remote
            .fail_next
            .store(true, std::sync::atomic::Ordering::SeqCst);

        cache.set("k", Value::from("v"), None).await;
        assert_eq!(cache.get("k").await, Some(Value::from("v")));
    }

    #[tokio::test]
    async fn delete_removes_from_both_tiers() {
        let cache = cache();
        let remote = Arc::new(FakeRemoteStore::new());
        cache.attach_remote(Arc::clone(&remote));
        cache.set("k", Value::from("v"), None).await;

        assert!(cache.delete("k").await);
        assert!(!cache.exists("k").await);
        assert!(!cache.delete("k").await);
    }

    #[tokio::test]
    async fn invalidate_pattern_removes_matching_keys_from_both_tiers() {
        let cache = cache();
        let remote = Arc::new(FakeRemoteStore::new());
        cache.attach_remote(Arc::clone(&remote));

        cache.set("ai_cache:op:summarize|a", Value::from("1"), None).await;
        cache.set("ai_cache:op:sentiment|b", Value::from("2"), None).await;

        let count = cache
            .invalidate_pattern("ai_cache", "summarize", "test")
            .await;
        assert_eq!(count, 1);
        assert!(!cache.exists("ai_cache:op:summarize|a").await);
        assert!(cache.exists("ai_cache:op:sentiment|b").await);
    }

    #[tokio::test]
    async fn callbacks_fire_on_get_success_and_miss() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let cache = cache();
        let hits = Arc::new(AtomicUsize::new(0));
        let misses = Arc::new(AtomicUsize::new(0));

        let hits_clone = Arc::clone(&hits);
        cache.register_callback(
            CacheEvent::GetSuccess,
            Box::new(move |_key, _value| {
                hits_clone.fetch_add(1, Ordering::Relaxed);
            }),
        );
        let misses_clone = Arc::clone(&misses);
        cache.register_callback(
            CacheEvent::GetMiss,
            Box::new(move |_key, _value| {
                misses_clone.fetch_add(1, Ordering::Relaxed);
            }),
        );

        cache.set("k", Value::from("v"), None).await;
        cache.get("k").await;
        cache.get("missing").await;

        assert_eq!(hits.load(Ordering::Relaxed), 1);
        assert_eq!(misses.load(Ordering::Relaxed), 1);
    }
}
