//! AI-aware, two-level cache: in-process L1 + Redis-compatible remote L2.
//!
//! - **L1 Store**: bounded in-process map with TTL expiry and FIFO eviction.
//! - **Codec**: JSON fast path for small values, `bincode` + zlib for large
//!   ones, with legacy unprefixed payloads still decoding.
//! - **Performance Monitor**: bounded-memory telemetry — rolling stats,
//!   slow-operation detection, invalidation-rate alerting, recommendations.
//! - **Tiered Cache**: composes L1 + a remote store + the codec + the
//!   monitor behind `get`/`set`/`delete`/`exists`/`invalidate_pattern`,
//!   degrading to memory-only mode when the remote is unreachable.
//! - **AI Cache**: content-addressed keys, per-operation TTLs, tier-aware
//!   promotion, and AI-specific metrics on top of the tiered cache.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use ai_tiered_cache::{AiCache, CacheConfig, PerformanceMonitor, Thresholds, Value};
//! use ai_tiered_cache::remote::RedisStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = CacheConfig::default();
//!     config.validate()?;
//!
//!     let monitor = Arc::new(PerformanceMonitor::new(Thresholds::from(&config)));
//!     let cache = AiCache::new(&config, monitor);
//!
//!     if let Ok(remote) = RedisStore::connect(&config.remote_url).await {
//!         cache.attach_remote(Arc::new(remote));
//!     }
//!
//!     cache.set("summarize this", "summarize", &Value::Null, Value::from("a summary")).await;
//!     let cached = cache.get("summarize this", "summarize", &Value::Null).await;
//!     println!("cached: {cached:?}");
//!
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod key;
pub mod l1;
pub mod monitor;
pub mod remote;
pub mod value;

pub use ai::{AiCache, AiCacheThresholds, AiRecommendation, PerformanceSummary, RecentOperation};
pub use cache::{CacheEvent, TieredCache};
pub use codec::Codec;
pub use config::{CacheConfig, TextSizeTiers};
pub use error::{CacheError, Result};
pub use key::{KeyGenerator, TextTier};
pub use l1::L1Store;
pub use monitor::{PerformanceMonitor, Thresholds};
pub use remote::{RedisStore, RemoteStore};
pub use value::Value;
