//! Remote store contract (spec §6.1) and its Redis-compatible implementation.
//!
//! `RedisStore` is grounded on `backends::redis_cache::RedisCache` nearly
//! verbatim (`ConnectionManager` construction with a `PING` health check,
//! `SCAN`-cursor key enumeration, bulk `DEL`). Extended with `keys`/`info`
//! at the trait level since §6.1 requires them there, whereas the teacher's
//! generic `CacheBackend`/`L2CacheBackend` traits don't carry them (the
//! teacher reaches them only on the concrete `RedisCache` type).

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::{debug, info};

/// A Redis-compatible key-value store. All methods are fallible; callers
/// (`TieredCache`) decide how to degrade on failure — this trait never
/// hides an error as a plain `None`/`false`.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn ping(&self) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn setex(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;
    async fn delete(&self, keys: &[String]) -> Result<u64>;
    async fn exists(&self, key: &str) -> Result<bool>;
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;
    async fn info(&self) -> Result<RemoteInfo>;
}

/// Subset of Redis `INFO` fields §6.1 requires for memory telemetry.
#[derive(Debug, Clone, Default)]
pub struct RemoteInfo {
    pub used_memory: Option<u64>,
    pub used_memory_human: Option<String>,
    pub connected_clients: Option<u64>,
}

/// Redis-backed [`RemoteStore`], built on `ConnectionManager` for automatic
/// reconnection.
pub struct RedisStore {
    conn_manager: ConnectionManager,
}

impl RedisStore {
    /// # Errors
    ///
    /// Returns an error if the client cannot be constructed, the connection
    /// manager cannot be established, or the initial `PING` fails.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        info!(redis_url = %redis_url, "connecting to remote store");

        let client = Client::open(redis_url)
            .with_context(|| format!("failed to create redis client for {redis_url}"))?;
        let conn_manager = ConnectionManager::new(client)
            .await
            .context("failed to establish redis connection manager")?;

        let mut store = Self { conn_manager };
        store.ping().await.context("initial redis PING failed")?;
        info!(redis_url = %redis_url, "remote store connected");
        Ok(store)
    }
}

#[async_trait]
impl RemoteStore for RedisStore {
    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn_manager.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value.filter(|v| !v.is_empty()))
    }

    async fn setex(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;
        debug!(key = %key, ttl_secs = ttl.as_secs(), "remote store write");
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn_manager.clone();
        let count: u64 = conn.del(keys).await?;
        Ok(count)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn_manager.clone();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn_manager.clone();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            cursor = next_cursor;
            keys.extend(batch);

            if cursor == 0 {
                break;
            }
        }

        debug!(pattern = %pattern, count = keys.len(), "remote store scan");
        Ok(keys)
    }

    async fn info(&self) -> Result<RemoteInfo> {
        let mut conn = self.conn_manager.clone();
        let raw: String = redis::cmd("INFO")
            .arg("memory")
            .query_async(&mut conn)
            .await?;

        let fields = parse_info_fields(&raw);
        Ok(RemoteInfo {
            used_memory: fields.get("used_memory").and_then(|v| v.parse().ok()),
            used_memory_human: fields.get("used_memory_human").cloned(),
            connected_clients: fields
                .get("connected_clients")
                .and_then(|v| v.parse().ok()),
        })
    }
}

fn parse_info_fields(raw: &str) -> HashMap<String, String> {
    raw.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let (key, value) = line.split_once(':')?;
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// In-memory [`RemoteStore`] double used by integration tests so they run
/// without a live Redis instance, unlike the teacher's `tests/common`
/// fixtures which require `REDIS_URL`.
#[cfg(any(test, feature = "test-util"))]
pub mod testing {
    use super::{RemoteInfo, RemoteStore};
    use anyhow::Result;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::time::Duration;

    #[derive(Default)]
    pub struct FakeRemoteStore {
        data: Mutex<HashMap<String, Vec<u8>>>,
        pub fail_next: std::sync::atomic::AtomicBool,
    }

    impl FakeRemoteStore {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        fn maybe_fail(&self) -> Result<()> {
            if self
                .fail_next
                .swap(false, std::sync::atomic::Ordering::SeqCst)
            {
                anyhow::bail!("simulated remote failure");
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RemoteStore for FakeRemoteStore {
        async fn ping(&self) -> Result<()> {
            self.maybe_fail()
        }

        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            self.maybe_fail()?;
            Ok(self.data.lock().get(key).cloned())
        }

        async fn setex(&self, key: &str, value: &[u8], _ttl: Duration) -> Result<()> {
            self.maybe_fail()?;
            self.data.lock().insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn delete(&self, keys: &[String]) -> Result<u64> {
            self.maybe_fail()?;
            let mut data = self.data.lock();
            let mut count = 0;
            for key in keys {
                if data.remove(key).is_some() {
                    count += 1;
                }
            }
            Ok(count)
        }

        async fn exists(&self, key: &str) -> Result<bool> {
            self.maybe_fail()?;
            Ok(self.data.lock().contains_key(key))
        }

        async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
            self.maybe_fail()?;
            let data = self.data.lock();
            Ok(data
                .keys()
                .filter(|k| glob_match(pattern, k))
                .cloned()
                .collect())
        }

        async fn info(&self) -> Result<RemoteInfo> {
            self.maybe_fail()?;
            Ok(RemoteInfo {
                used_memory: Some(self.data.lock().values().map(Vec::len).sum::<usize>() as u64),
                used_memory_human: None,
                connected_clients: Some(1),
            })
        }
    }

    /// Glob matcher supporting `*` wildcards anywhere in the pattern
    /// (`prefix*`, `*substring*`, `prefix*mid*suffix`, ...), enough for the
    /// `<namespace>:*<pattern>*` invalidation patterns this crate generates.
    /// Does not support `?` or character classes — Redis `SCAN MATCH`
    /// handles those for the real `RedisStore`; this double only needs what
    /// this crate itself emits.
    fn glob_match(pattern: &str, candidate: &str) -> bool {
        let segments: Vec<&str> = pattern.split('*').collect();
        if segments.len() == 1 {
            return pattern == candidate;
        }

        let mut pos = 0;
        let first = segments[0];
        if !candidate[pos..].starts_with(first) {
            return false;
        }
        pos += first.len();

        for segment in &segments[1..segments.len() - 1] {
            if segment.is_empty() {
                continue;
            }
            match candidate[pos..].find(segment) {
                Some(idx) => pos += idx + segment.len(),
                None => return false,
            }
        }

        let last = segments[segments.len() - 1];
        candidate[pos..].ends_with(last)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeRemoteStore;
    use super::*;

    #[tokio::test]
    async fn fake_store_round_trips_set_and_get() {
        let store = FakeRemoteStore::new();
        store
            .setex("k", b"v", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn fake_store_delete_reports_count() {
        let store = FakeRemoteStore::new();
        store
            .setex("a", b"1", Duration::from_secs(60))
            .await
            .unwrap();
        store
            .setex("b", b"2", Duration::from_secs(60))
            .await
            .unwrap();
        let deleted = store
            .delete(&["a".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(deleted, 1);
    }

    #[tokio::test]
    async fn fake_store_keys_matches_prefix_glob() {
        let store = FakeRemoteStore::new();
        store
            .setex("ai_cache:summarize:1", b"x", Duration::from_secs(60))
            .await
            .unwrap();
        store
            .setex("ai_cache:sentiment:1", b"y", Duration::from_secs(60))
            .await
            .unwrap();
        store
            .setex("other:1", b"z", Duration::from_secs(60))
            .await
            .unwrap();
        let mut keys = store.keys("ai_cache:*").await.unwrap();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "ai_cache:sentiment:1".to_string(),
                "ai_cache:summarize:1".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn fake_store_keys_matches_embedded_wildcard_pattern() {
        // Exercises the `<namespace>:*<pattern>*` shape TieredCache::invalidate_pattern
        // actually generates (wildcard before AND after the literal substring).
        let store = FakeRemoteStore::new();
        store
            .setex("ai_cache:op:summarize|txt:A", b"x", Duration::from_secs(60))
            .await
            .unwrap();
        store
            .setex("ai_cache:op:sentiment|txt:B", b"y", Duration::from_secs(60))
            .await
            .unwrap();
        let keys = store.keys("ai_cache:*summarize*").await.unwrap();
        assert_eq!(keys, vec!["ai_cache:op:summarize|txt:A".to_string()]);
    }

    #[tokio::test]
    async fn fake_store_can_simulate_a_single_failure() {
        let store = FakeRemoteStore::new();
        store
            .fail_next
            .store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(store.ping().await.is_err());
        assert!(store.ping().await.is_ok());
    }
}
