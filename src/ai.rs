//! AI Cache — `TieredCache` extended with operation-specific TTLs,
//! tier-aware promotion, content-addressed key construction, and an
//! AI-specific metrics overlay.
//!
//! Composes over [`crate::cache::TieredCache`] rather than extending it,
//! so the generic cache surface stays reusable on its own.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;

use crate::cache::{CacheEvent, TieredCache};
use crate::config::CacheConfig;
use crate::key::{operation_from_key, KeyGenerator, KEY_NAMESPACE};
use crate::monitor::{PerformanceMonitor, Severity};
use crate::remote::RemoteStore;
use crate::value::Value;

/// Operations whose outputs are stable enough that medium-tier text is
/// still worth promoting to L1 (spec §4.6 promotion policy, rule 2).
pub const STABLE_OPERATIONS: &[&str] = &["sentiment", "summarize", "key_points", "classify"];

/// Heuristic constants behind `performance_summary`'s recommendations and
/// the promotion policy's "recent hit count" rule. Spec §9 calls these out
/// as defaults that should be tunable rather than hard-coded.
#[derive(Debug, Clone, Copy)]
pub struct AiCacheThresholds {
    /// Hit rate below which an operation gets a "tune TTL up" recommendation.
    pub low_hit_rate: f64,
    /// Hit rate above which an operation gets a "consider raising TTL further" note.
    pub excellent_hit_rate: f64,
    /// Share of recent operations in the `xlarge` tier above which thresholds get flagged.
    pub high_xlarge_share: f64,
    /// L1 utilization above which growing `l1_max_size` is recommended.
    pub l1_near_capacity: f64,
    /// L1 utilization below which shrinking `l1_max_size` is recommended.
    pub l1_underused: f64,
    /// Compression ratio above which raising `compression_threshold` is recommended
    /// (a ratio close to 1.0 means compression barely shrinks the payload).
    pub poor_compression_ratio: f64,
    /// Recent hit count at/above which promotion is forced regardless of tier rules
    /// (spec §4.6 promotion policy, rule 4).
    pub promotion_hit_count: u64,
}

impl Default for AiCacheThresholds {
    fn default() -> Self {
        Self {
            low_hit_rate: 0.3,
            excellent_hit_rate: 0.8,
            high_xlarge_share: 0.3,
            l1_near_capacity: 0.9,
            l1_underused: 0.1,
            poor_compression_ratio: 0.9,
            promotion_hit_count: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentOperation {
    pub operation: String,
    pub cache_op: String,
    pub tier: String,
    pub timestamp: f64,
    pub duration: Duration,
    pub success: bool,
}

const MAX_RECENT_OPERATIONS: usize = 1_000;

struct AiMetrics {
    hits_by_operation: DashMap<String, u64>,
    misses_by_operation: DashMap<String, u64>,
    tier_distribution: DashMap<String, u64>,
    recent_operations: Mutex<std::collections::VecDeque<RecentOperation>>,
}

impl AiMetrics {
    fn new() -> Self {
        Self {
            hits_by_operation: DashMap::new(),
            misses_by_operation: DashMap::new(),
            tier_distribution: DashMap::new(),
            recent_operations: Mutex::new(std::collections::VecDeque::new()),
        }
    }

    fn record(&self, operation: &str, cache_op: &str, tier: &str, duration: Duration, success: bool) {
        if cache_op == "get" {
            let table = if success {
                &self.hits_by_operation
            } else {
                &self.misses_by_operation
            };
            *table.entry(operation.to_string()).or_insert(0) += 1;
        }
        *self.tier_distribution.entry(tier.to_string()).or_insert(0) += 1;

        let mut recent = self.recent_operations.lock();
        recent.push_back(RecentOperation {
            operation: operation.to_string(),
            cache_op: cache_op.to_string(),
            tier: tier.to_string(),
            timestamp: crate::monitor::now_secs(),
            duration,
            success,
        });
        while recent.len() > MAX_RECENT_OPERATIONS {
            recent.pop_front();
        }
    }

    fn hit_count(&self, operation: &str) -> u64 {
        self.hits_by_operation.get(operation).map_or(0, |v| *v)
    }
}

/// Priority-ordered actionable recommendation from [`AiCache::performance_summary`].
#[derive(Debug, Clone, Serialize)]
pub struct AiRecommendation {
    pub severity: Severity,
    pub issue: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    pub hit_rate_by_operation: BTreeMap<String, f64>,
    pub tier_distribution: BTreeMap<String, u64>,
    pub stable_operations: Vec<&'static str>,
    pub recommendations: Vec<AiRecommendation>,
}

/// AI response cache: `TieredCache` plus content-addressed key construction,
/// per-operation TTLs, tier-aware promotion, and an AI-specific metrics
/// overlay (spec §4.6).
pub struct AiCache<R: RemoteStore> {
    cache: TieredCache<R>,
    key_gen: KeyGenerator,
    operation_ttls: BTreeMap<String, Duration>,
    default_ttl: Duration,
    metrics: Arc<AiMetrics>,
    monitor: Arc<PerformanceMonitor>,
    thresholds: AiCacheThresholds,
    l1_max_size: usize,
}

impl<R: RemoteStore + 'static> AiCache<R> {
    #[must_use]
    pub fn new(config: &CacheConfig, monitor: Arc<PerformanceMonitor>) -> Self {
        Self::with_thresholds(config, monitor, AiCacheThresholds::default())
    }

    #[must_use]
    pub fn with_thresholds(
        config: &CacheConfig,
        monitor: Arc<PerformanceMonitor>,
        thresholds: AiCacheThresholds,
    ) -> Self {
        let cache = TieredCache::new(config, Arc::clone(&monitor));
        let metrics = Arc::new(AiMetrics::new());
        let key_gen = KeyGenerator::new(config.text_hash_threshold, config.text_size_tiers);

        // Register operation/tier-aware callbacks at construction time,
        // mirroring `_register_ai_callbacks` in the original source (spec
        // §9's redesign note: a fixed set of hooks the AI layer owns,
        // registered into TieredCache's generic callback list). Every
        // generated key embeds `|tier:<tier>|` (src/key.rs), so the real
        // tier is recovered from the key itself rather than hardcoded.
        let on_get_success = Arc::clone(&metrics);
        let key_gen_for_get_success = key_gen.clone();
        cache.register_callback(
            CacheEvent::GetSuccess,
            Box::new(move |key, _value| {
                let operation = operation_from_key(key);
                let tier = key_gen_for_get_success.tier_from_key(key);
                on_get_success.record(&operation, "get", &tier, Duration::ZERO, true);
            }),
        );
        let on_get_miss = Arc::clone(&metrics);
        let key_gen_for_get_miss = key_gen.clone();
        cache.register_callback(
            CacheEvent::GetMiss,
            Box::new(move |key, _value| {
                let operation = operation_from_key(key);
                let tier = key_gen_for_get_miss.tier_from_key(key);
                on_get_miss.record(&operation, "get", &tier, Duration::ZERO, false);
            }),
        );
        let on_set_success = Arc::clone(&metrics);
        let key_gen_for_set_success = key_gen.clone();
        cache.register_callback(
            CacheEvent::SetSuccess,
            Box::new(move |key, _value| {
                let operation = operation_from_key(key);
                let tier = key_gen_for_set_success.tier_from_key(key);
                on_set_success.record(&operation, "set", &tier, Duration::ZERO, true);
            }),
        );

        Self {
            cache,
            key_gen,
            operation_ttls: config.operation_ttls.clone(),
            default_ttl: config.default_ttl,
            metrics,
            monitor,
            thresholds,
            l1_max_size: if config.l1_enabled { config.l1_max_size } else { 0 },
        }
    }

    /// Attempt to (re)connect the remote store. See [`TieredCache::connect`].
    pub async fn connect(&self, remote: Arc<R>) -> bool {
        self.cache.connect(remote).await
    }

    pub fn disconnect(&self) {
        self.cache.disconnect();
    }

    pub fn attach_remote(&self, remote: Arc<R>) {
        self.cache.attach_remote(remote);
    }

    /// Delegates to [`KeyGenerator::generate_cache_key`] (spec §4.5/§4.6).
    #[must_use]
    pub fn build_key(&self, text: &str, operation: &str, options: &Value) -> String {
        self.key_gen.generate_cache_key(text, operation, options)
    }

    fn ttl_for(&self, operation: &str) -> Duration {
        self.operation_ttls
            .get(operation)
            .copied()
            .unwrap_or(self.default_ttl)
    }

    /// `should_promote_to_memory(tier, operation)` — spec §4.6's five-rule
    /// policy, in order.
    #[must_use]
    pub fn should_promote_to_memory(&self, tier: &str, operation: &str) -> bool {
        match tier {
            "small" => return true,
            "medium" if STABLE_OPERATIONS.contains(&operation) => return true,
            "large" if operation == "sentiment" => return true,
            _ => {}
        }
        if matches!(tier, "small" | "medium")
            && self.metrics.hit_count(operation) >= self.thresholds.promotion_hit_count
        {
            return true;
        }
        false
    }

    /// Build the cache key for `(text, operation, options)` and fetch it,
    /// applying the tier-aware promotion policy to any remote hit.
    pub async fn get(&self, text: &str, operation: &str, options: &Value) -> Option<Value> {
        let key = self.build_key(text, operation, options);
        let tier = self.key_gen.tier_from_key(&key);
        self.cache
            .get_with(&key, |_value| self.should_promote_to_memory(&tier, operation))
            .await
    }

    /// Build the cache key for `(text, operation, options)` and store
    /// `value` under the operation's configured TTL (falling back to the
    /// cache's default), applying the tier-aware promotion policy to the L1
    /// write itself.
    pub async fn set(&self, text: &str, operation: &str, options: &Value, value: Value) -> String {
        let key = self.build_key(text, operation, options);
        let tier = self.key_gen.tier_from_key(&key);
        let promote = self.should_promote_to_memory(&tier, operation);
        let ttl = self.ttl_for(operation);
        self.cache.set_with(&key, value, Some(ttl), promote).await;
        key
    }

    pub async fn delete(&self, text: &str, operation: &str, options: &Value) -> bool {
        let key = self.build_key(text, operation, options);
        self.cache.delete(&key).await
    }

    pub async fn exists(&self, text: &str, operation: &str, options: &Value) -> bool {
        let key = self.build_key(text, operation, options);
        self.cache.exists(&key).await
    }

    /// Invalidate every key whose `op:<operation>` segment appears in it.
    /// Delegates to [`TieredCache::invalidate_pattern`], which already
    /// de-duplicates across L1 and remote (spec §4.6: "combines L1 and
    /// remote results, de-duplicating across tiers").
    pub async fn invalidate_by_operation(&self, operation: &str, context: &str) -> u64 {
        self.cache
            .invalidate_pattern(KEY_NAMESPACE, &format!("op:{operation}"), context)
            .await
    }

    /// Remove every key under the `ai_cache:` namespace from both tiers.
    /// An empty substring pattern matches every key `invalidate_pattern`
    /// can see, which for an `AiCache`-owned `TieredCache` are exactly the
    /// `ai_cache:`-prefixed keys this cache itself ever writes.
    pub async fn clear(&self, context: &str) -> u64 {
        self.cache.invalidate_pattern(KEY_NAMESPACE, "", context).await
    }

    #[must_use]
    pub fn l1_len(&self) -> usize {
        self.cache.l1().len()
    }

    /// Snapshot of the AI metrics overlay's bounded recent-operations
    /// sequence (spec §3, capped at 1,000 entries).
    #[must_use]
    pub fn recent_operations(&self) -> Vec<RecentOperation> {
        self.metrics.recent_operations.lock().iter().cloned().collect()
    }

    /// Per-operation hit rates, tier distribution, and a priority-ordered
    /// list of actionable recommendations (spec §4.6).
    #[must_use]
    pub fn performance_summary(&self) -> PerformanceSummary {
        let mut hit_rate_by_operation = BTreeMap::new();
        for entry in self.metrics.hits_by_operation.iter() {
            let operation = entry.key().clone();
            let hits = *entry.value();
            let misses = self
                .metrics
                .misses_by_operation
                .get(&operation)
                .map_or(0, |v| *v);
            let total = hits + misses;
            if total > 0 {
                #[allow(clippy::cast_precision_loss)]
                let rate = hits as f64 / total as f64;
                hit_rate_by_operation.insert(operation, rate);
            }
        }
        for entry in self.metrics.misses_by_operation.iter() {
            hit_rate_by_operation
                .entry(entry.key().clone())
                .or_insert(0.0);
        }

        let tier_distribution: BTreeMap<String, u64> = self
            .metrics
            .tier_distribution
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();

        let mut recommendations = Vec::new();
        for (operation, rate) in &hit_rate_by_operation {
            if *rate < self.thresholds.low_hit_rate {
                recommendations.push(AiRecommendation {
                    severity: Severity::Warning,
                    issue: format!("low_hit_rate:{operation}"),
                    message: format!(
                        "operation '{operation}' has a {:.0}% hit rate; consider raising its TTL",
                        rate * 100.0
                    ),
                });
            } else if *rate > self.thresholds.excellent_hit_rate {
                recommendations.push(AiRecommendation {
                    severity: Severity::Info,
                    issue: format!("excellent_hit_rate:{operation}"),
                    message: format!(
                        "operation '{operation}' has a {:.0}% hit rate; TTL could be increased further",
                        rate * 100.0
                    ),
                });
            }
        }

        let total_tier_samples: u64 = tier_distribution.values().sum();
        if total_tier_samples > 0 {
            #[allow(clippy::cast_precision_loss)]
            let xlarge_share = tier_distribution.get("xlarge").copied().unwrap_or(0) as f64
                / total_tier_samples as f64;
            if xlarge_share > self.thresholds.high_xlarge_share {
                recommendations.push(AiRecommendation {
                    severity: Severity::Warning,
                    issue: "high_xlarge_share".to_string(),
                    message: format!(
                        "{:.0}% of recent requests fall in the xlarge text tier; consider raising text_size_tiers",
                        xlarge_share * 100.0
                    ),
                });
            }
        }

        if self.l1_max_size > 0 {
            #[allow(clippy::cast_precision_loss)]
            let utilization = self.l1_len() as f64 / self.l1_max_size as f64;
            if utilization >= self.thresholds.l1_near_capacity {
                recommendations.push(AiRecommendation {
                    severity: Severity::Warning,
                    issue: "l1_near_capacity".to_string(),
                    message: format!(
                        "L1 is at {:.0}% of its configured capacity; consider growing l1_max_size",
                        utilization * 100.0
                    ),
                });
            } else if utilization <= self.thresholds.l1_underused {
                recommendations.push(AiRecommendation {
                    severity: Severity::Info,
                    issue: "l1_underused".to_string(),
                    message: format!(
                        "L1 is at only {:.0}% of its configured capacity; consider shrinking l1_max_size",
                        utilization * 100.0
                    ),
                });
            }
        }

        if let Some(compression) = self.monitor.performance_stats().compression {
            if compression.avg_ratio > self.thresholds.poor_compression_ratio {
                recommendations.push(AiRecommendation {
                    severity: Severity::Info,
                    issue: "poor_compression_ratio".to_string(),
                    message: format!(
                        "average compression ratio is {:.2}; consider raising compression_threshold",
                        compression.avg_ratio
                    ),
                });
            }
        }

        recommendations.sort_by_key(|r| r.severity);

        PerformanceSummary {
            hit_rate_by_operation,
            tier_distribution,
            stable_operations: STABLE_OPERATIONS.to_vec(),
            recommendations,
        }
    }
}
