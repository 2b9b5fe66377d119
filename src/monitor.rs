//! Performance Monitor — bounded-memory telemetry for cache operations.
//!
//! No teacher Rust file implements anything like this; the shape (atomics
//! for running counters, a `parking_lot::Mutex`-guarded `VecDeque` per
//! metric kind) follows `invalidation::AtomicInvalidationStats` /
//! `InvalidationStats` from the teacher crate. The numeric semantics
//! (cleanup order, alert-level thresholds, slow-operation multiplier,
//! recommendation wording) follow
//! `original_source/.../monitoring.py`'s `CachePerformanceMonitor` exactly,
//! since the spec is ambiguous about exact formulas and the original is
//! authoritative there.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::warn;

/// Wall-clock timestamp, seconds since the Unix epoch. Grounded on the
/// `timestamp: float` fields throughout `monitoring.py`.
pub(crate) fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationMetric {
    pub op_tag: String,
    pub duration: Duration,
    pub hit: bool,
    pub payload_length: usize,
    pub extra: BTreeMap<String, String>,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompressionMetric {
    pub original_size: usize,
    pub compressed_size: usize,
    pub ratio: f64,
    pub elapsed: Duration,
    pub op_tag: String,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryMetric {
    pub l1_entry_count: usize,
    pub l1_bytes: u64,
    pub remote_bytes: Option<u64>,
    pub total_bytes: u64,
    pub utilization_percent: f64,
    pub warning_reached: bool,
    pub extra: BTreeMap<String, String>,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvalidationMetric {
    pub pattern: String,
    pub keys_invalidated: u64,
    pub duration: Duration,
    pub kind: String,
    pub context: BTreeMap<String, String>,
    pub extra: BTreeMap<String, String>,
    pub timestamp: f64,
}

/// Tunable alert/slow-operation thresholds (spec §4.3's table).
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub memory_warning_bytes: u64,
    pub memory_critical_bytes: u64,
    pub slow_key_generation: Duration,
    pub slow_cache_operation: Duration,
    pub invalidation_warning_per_hour: u64,
    pub invalidation_critical_per_hour: u64,
    pub retention: Duration,
    pub max_measurements: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            memory_warning_bytes: 50 * 1024 * 1024,
            memory_critical_bytes: 100 * 1024 * 1024,
            slow_key_generation: Duration::from_millis(100),
            slow_cache_operation: Duration::from_millis(50),
            invalidation_warning_per_hour: 50,
            invalidation_critical_per_hour: 100,
            retention: Duration::from_secs(3600),
            max_measurements: 1_000,
        }
    }
}

impl From<&crate::config::CacheConfig> for Thresholds {
    /// Takes the four monitor-relevant fields spec §6.4's configuration
    /// shape exposes (`retention_hours`, `max_measurements`,
    /// `memory_warning_bytes`, `memory_critical_bytes`); everything else
    /// (slow-operation and invalidation-rate thresholds) stays at the
    /// §4.3 defaults since the configuration shape doesn't carry them.
    fn from(config: &crate::config::CacheConfig) -> Self {
        Self {
            memory_warning_bytes: config.memory_warning_bytes,
            memory_critical_bytes: config.memory_critical_bytes,
            retention: config.retention,
            max_measurements: config.max_measurements,
            ..Self::default()
        }
    }
}

struct Sequence<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> Sequence<T> {
    fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    fn push(&self, item: T) {
        self.items.lock().push_back(item);
    }
}

impl<T: Clone> Sequence<T> {
    fn snapshot(&self) -> Vec<T> {
        self.items.lock().iter().cloned().collect()
    }

    fn len(&self) -> usize {
        self.items.lock().len()
    }

    fn clear(&self) {
        self.items.lock().clear();
    }
}

fn cleanup<T>(seq: &Mutex<VecDeque<T>>, timestamp_of: impl Fn(&T) -> f64, thresholds: &Thresholds) {
    let cutoff = now_secs() - thresholds.retention.as_secs_f64();
    let mut items = seq.lock();
    while let Some(front) = items.front() {
        if timestamp_of(front) < cutoff {
            items.pop_front();
        } else {
            break;
        }
    }
    while items.len() > thresholds.max_measurements {
        items.pop_front();
    }
}

/// Bounded-memory telemetry for cache operations (spec §4.3).
///
/// Every recording method is O(1) amortized and never touches the remote
/// store or blocks.
pub struct PerformanceMonitor {
    thresholds: Thresholds,

    hits: AtomicU64,
    misses: AtomicU64,
    total_ops: AtomicU64,
    total_invalidations: AtomicU64,
    total_keys_invalidated: AtomicU64,

    key_generation: Sequence<OperationMetric>,
    cache_operations: Sequence<OperationMetric>,
    compression: Sequence<CompressionMetric>,
    memory: Sequence<MemoryMetric>,
    invalidations: Sequence<InvalidationMetric>,
}

impl PerformanceMonitor {
    #[must_use]
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            total_ops: AtomicU64::new(0),
            total_invalidations: AtomicU64::new(0),
            total_keys_invalidated: AtomicU64::new(0),
            key_generation: Sequence::new(),
            cache_operations: Sequence::new(),
            compression: Sequence::new(),
            memory: Sequence::new(),
            invalidations: Sequence::new(),
        }
    }

    // ---- recording -------------------------------------------------

    /// Record a timed operation. `op_tag` of `"key_generation"` routes to
    /// the key-generation sequence; everything else routes to the cache
    /// operations sequence, matching `record_key_generation_time` /
    /// `record_cache_operation_time` in the original source.
    pub fn record_operation_time(
        &self,
        op_tag: &str,
        duration: Duration,
        hit: bool,
        payload_length: usize,
        extra: BTreeMap<String, String>,
    ) {
        let metric = OperationMetric {
            op_tag: op_tag.to_string(),
            duration,
            hit,
            payload_length,
            extra,
            timestamp: now_secs(),
        };

        self.total_ops.fetch_add(1, Ordering::Relaxed);
        if op_tag == "get" {
            if hit {
                self.hits.fetch_add(1, Ordering::Relaxed);
            } else {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
        }

        if op_tag == "key_generation" {
            if duration > self.thresholds.slow_key_generation {
                warn!(op_tag, ?duration, "slow key generation");
            }
            self.key_generation.push(metric);
        } else {
            if duration > self.thresholds.slow_cache_operation {
                warn!(op_tag, ?duration, "slow cache operation");
            }
            self.cache_operations.push(metric);
        }
    }

    pub fn record_compression(
        &self,
        original_size: usize,
        compressed_size: usize,
        elapsed: Duration,
        op_tag: &str,
    ) {
        #[allow(clippy::cast_precision_loss)]
        let ratio = if original_size == 0 {
            1.0
        } else {
            compressed_size as f64 / original_size as f64
        };
        self.compression.push(CompressionMetric {
            original_size,
            compressed_size,
            ratio,
            elapsed,
            op_tag: op_tag.to_string(),
            timestamp: now_secs(),
        });
    }

    pub fn record_memory(
        &self,
        l1_entry_count: usize,
        l1_bytes: u64,
        remote_bytes: Option<u64>,
        extra: BTreeMap<String, String>,
    ) {
        let total_bytes = l1_bytes + remote_bytes.unwrap_or(0);
        #[allow(clippy::cast_precision_loss)]
        let utilization_percent =
            total_bytes as f64 / self.thresholds.memory_warning_bytes as f64 * 100.0;
        let warning_reached = total_bytes >= self.thresholds.memory_warning_bytes;

        if total_bytes >= self.thresholds.memory_critical_bytes {
            warn!(total_bytes, "memory usage at critical threshold");
        }

        self.memory.push(MemoryMetric {
            l1_entry_count,
            l1_bytes,
            remote_bytes,
            total_bytes,
            utilization_percent,
            warning_reached,
            extra,
            timestamp: now_secs(),
        });
    }

    pub fn record_invalidation(
        &self,
        pattern: &str,
        keys_invalidated: u64,
        duration: Duration,
        kind: &str,
        context: BTreeMap<String, String>,
        extra: BTreeMap<String, String>,
    ) {
        self.total_invalidations.fetch_add(1, Ordering::Relaxed);
        self.total_keys_invalidated
            .fetch_add(keys_invalidated, Ordering::Relaxed);
        self.invalidations.push(InvalidationMetric {
            pattern: pattern.to_string(),
            keys_invalidated,
            duration,
            kind: kind.to_string(),
            context,
            extra,
            timestamp: now_secs(),
        });
    }

    // ---- cleanup -----------------------------------------------------

    /// Trim every sequence per the retention window and count ceiling.
    /// Idempotent: a second call with no new measurements is a no-op.
    fn cleanup_all(&self) {
        cleanup(&self.key_generation.items, |m| m.timestamp, &self.thresholds);
        cleanup(&self.cache_operations.items, |m| m.timestamp, &self.thresholds);
        cleanup(&self.compression.items, |m| m.timestamp, &self.thresholds);
        cleanup(&self.memory.items, |m| m.timestamp, &self.thresholds);
        cleanup(&self.invalidations.items, |m| m.timestamp, &self.thresholds);
    }

    // ---- queries -------------------------------------------------------

    #[must_use]
    pub fn performance_stats(&self) -> PerformanceStats {
        self.cleanup_all();

        let key_gen = self.key_generation.snapshot();
        let cache_ops = self.cache_operations.snapshot();
        let compression = self.compression.snapshot();
        let memory = self.memory.snapshot();
        let invalidations = self.invalidations.snapshot();

        PerformanceStats {
            timestamp: now_secs(),
            cache_hit_rate: self.hit_rate(),
            total_cache_operations: self.total_ops.load(Ordering::Relaxed),
            cache_hits: self.hits.load(Ordering::Relaxed),
            cache_misses: self.misses.load(Ordering::Relaxed),
            key_generation: category_stats(
                &key_gen,
                |m| m.duration,
                self.thresholds.slow_key_generation,
            ),
            cache_operations: cache_operation_stats(&cache_ops, self.thresholds.slow_cache_operation),
            compression: compression_stats(&compression),
            memory_usage: memory.last().cloned(),
            invalidation: invalidation_category_stats(&invalidations),
        }
    }

    /// Hit rate as a percentage in `[0, 100]` (spec §4.3/§8).
    fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let rate = hits as f64 / total as f64 * 100.0;
            rate
        }
    }

    #[must_use]
    pub fn memory_usage_stats(&self) -> MemoryUsageStats {
        self.cleanup_all();
        let samples = self.memory.snapshot();

        let Some(latest) = samples.last() else {
            return MemoryUsageStats {
                current: None,
                growth_rate_mb_per_hour: None,
            };
        };

        let growth_rate_mb_per_hour = if samples.len() >= 2 {
            let first = &samples[0];
            let time_span = latest.timestamp - first.timestamp;
            if time_span > 0.0 {
                #[allow(clippy::cast_precision_loss)]
                let size_change = latest.total_bytes as f64 - first.total_bytes as f64;
                Some(size_change / time_span * 3600.0 / 1024.0 / 1024.0)
            } else {
                None
            }
        } else {
            None
        };

        MemoryUsageStats {
            current: Some(latest.clone()),
            growth_rate_mb_per_hour,
        }
    }

    #[must_use]
    pub fn memory_warnings(&self) -> Vec<Warning> {
        self.cleanup_all();
        let samples = self.memory.snapshot();
        let Some(latest) = samples.last() else {
            return Vec::new();
        };

        let mut warnings = Vec::new();
        if latest.total_bytes >= self.thresholds.memory_critical_bytes {
            warnings.push(Warning {
                severity: Severity::Critical,
                message: format!(
                    "memory usage {} bytes at or above critical threshold {} bytes",
                    latest.total_bytes, self.thresholds.memory_critical_bytes
                ),
                recommendations: vec![
                    "reduce l1_max_size".to_string(),
                    "lower compression_threshold".to_string(),
                ],
            });
        } else if latest.total_bytes >= self.thresholds.memory_warning_bytes {
            warnings.push(Warning {
                severity: Severity::Warning,
                message: format!(
                    "memory usage {} bytes at or above warning threshold {} bytes",
                    latest.total_bytes, self.thresholds.memory_warning_bytes
                ),
                recommendations: vec!["monitor memory trend".to_string()],
            });
        }
        warnings
    }

    #[must_use]
    pub fn invalidation_frequency_stats(&self) -> InvalidationFrequencyStats {
        self.cleanup_all();
        let events = self.invalidations.snapshot();

        let now = now_secs();
        let last_hour: Vec<&InvalidationMetric> = events
            .iter()
            .filter(|e| now - e.timestamp <= 3600.0)
            .collect();
        let last_24h: Vec<&InvalidationMetric> = events
            .iter()
            .filter(|e| now - e.timestamp <= 86_400.0)
            .collect();

        let last_hour_count = last_hour.len() as u64;
        #[allow(clippy::cast_precision_loss)]
        let rate_per_hour_24h = last_24h.len() as f64 / 24.0;

        let mut pattern_counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut kind_counts: BTreeMap<String, u64> = BTreeMap::new();
        for event in &events {
            *pattern_counts.entry(event.pattern.clone()).or_insert(0) += 1;
            *kind_counts.entry(event.kind.clone()).or_insert(0) += 1;
        }

        let total_invalidations = self.total_invalidations.load(Ordering::Relaxed);
        let total_keys_invalidated = self.total_keys_invalidated.load(Ordering::Relaxed);
        #[allow(clippy::cast_precision_loss)]
        let avg_keys_per_invalidation = if total_invalidations == 0 {
            0.0
        } else {
            total_keys_invalidated as f64 / total_invalidations as f64
        };

        let (avg_duration, max_duration) = if events.is_empty() {
            (Duration::ZERO, Duration::ZERO)
        } else {
            let total: Duration = events.iter().map(|e| e.duration).sum();
            #[allow(clippy::cast_possible_truncation)]
            let avg = total / events.len() as u32;
            let max = events.iter().map(|e| e.duration).max().unwrap_or_default();
            (avg, max)
        };

        let alert_level = if last_hour_count >= self.thresholds.invalidation_critical_per_hour {
            AlertLevel::Critical
        } else if last_hour_count >= self.thresholds.invalidation_warning_per_hour {
            AlertLevel::Warning
        } else {
            AlertLevel::Normal
        };

        InvalidationFrequencyStats {
            total_invalidations,
            total_keys_invalidated,
            last_hour_count,
            last_24h_count: last_24h.len() as u64,
            rate_per_hour_24h,
            pattern_counts,
            kind_counts,
            avg_keys_per_invalidation,
            avg_duration,
            max_duration,
            warning_per_hour: self.thresholds.invalidation_warning_per_hour,
            critical_per_hour: self.thresholds.invalidation_critical_per_hour,
            current_alert_level: alert_level,
        }
    }

    #[must_use]
    pub fn invalidation_recommendations(&self) -> Vec<Recommendation> {
        let stats = self.invalidation_frequency_stats();
        let mut recommendations = Vec::new();

        match stats.current_alert_level {
            AlertLevel::Critical => recommendations.push(Recommendation {
                severity: Severity::Critical,
                issue: "invalidation_rate".to_string(),
                message: format!(
                    "{} invalidations in the last hour exceeds the critical threshold of {}",
                    stats.last_hour_count, stats.critical_per_hour
                ),
                suggestions: vec![
                    "investigate what's triggering repeated invalidation".to_string(),
                    "widen invalidation patterns to reduce event count".to_string(),
                ],
            }),
            AlertLevel::Warning => recommendations.push(Recommendation {
                severity: Severity::Warning,
                issue: "invalidation_rate".to_string(),
                message: format!(
                    "{} invalidations in the last hour exceeds the warning threshold of {}",
                    stats.last_hour_count, stats.warning_per_hour
                ),
                suggestions: vec!["monitor invalidation triggers".to_string()],
            }),
            AlertLevel::Normal => {}
        }

        if let Some((pattern, count)) = stats
            .pattern_counts
            .iter()
            .max_by_key(|(_, count)| **count)
        {
            #[allow(clippy::cast_precision_loss)]
            let share = *count as f64 / stats.total_invalidations.max(1) as f64;
            if share > 0.5 {
                recommendations.push(Recommendation {
                    severity: Severity::Info,
                    issue: "dominant_pattern".to_string(),
                    message: format!(
                        "pattern '{pattern}' accounts for {:.0}% of recent invalidations",
                        share * 100.0
                    ),
                    suggestions: vec!["consider a more targeted invalidation pattern".to_string()],
                });
            }
        }

        if stats.avg_keys_per_invalidation < 1.0 && stats.total_invalidations > 0 {
            recommendations.push(Recommendation {
                severity: Severity::Info,
                issue: "low_efficiency".to_string(),
                message: "average keys invalidated per event is below 1.0".to_string(),
                suggestions: vec!["check whether patterns are matching the intended keys".to_string()],
            });
        }

        if stats.avg_keys_per_invalidation > 100.0 {
            recommendations.push(Recommendation {
                severity: Severity::Warning,
                issue: "broad_invalidation".to_string(),
                message: "average keys invalidated per event exceeds 100".to_string(),
                suggestions: vec!["narrow invalidation patterns to reduce cache churn".to_string()],
            });
        }

        recommendations.sort_by_key(|r| r.severity);
        recommendations
    }

    #[must_use]
    pub fn recent_slow_operations(&self, multiplier: f64) -> SlowOperations {
        self.cleanup_all();
        let key_gen = self.key_generation.snapshot();
        let cache_ops = self.cache_operations.snapshot();
        let compression = self.compression.snapshot();

        SlowOperations {
            key_generation: slow_entries(&key_gen, |m| m.duration, multiplier),
            cache_operations: slow_entries(&cache_ops, |m| m.duration, multiplier),
            compression: slow_entries(&compression, |m| m.elapsed, multiplier),
        }
    }

    #[must_use]
    pub fn export(&self) -> ExportSnapshot {
        self.cleanup_all();
        ExportSnapshot {
            exported_at: now_secs(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            total_ops: self.total_ops.load(Ordering::Relaxed),
            total_invalidations: self.total_invalidations.load(Ordering::Relaxed),
            total_keys_invalidated: self.total_keys_invalidated.load(Ordering::Relaxed),
            key_generation: self.key_generation.snapshot(),
            cache_operations: self.cache_operations.snapshot(),
            compression: self.compression.snapshot(),
            memory: self.memory.snapshot(),
            invalidations: self.invalidations.snapshot(),
        }
    }

    /// Zero counters and clear every sequence. Thresholds are untouched.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.total_ops.store(0, Ordering::Relaxed);
        self.total_invalidations.store(0, Ordering::Relaxed);
        self.total_keys_invalidated.store(0, Ordering::Relaxed);
        self.key_generation.clear();
        self.cache_operations.clear();
        self.compression.clear();
        self.memory.clear();
        self.invalidations.clear();
    }
}

fn slow_entries<T: Clone>(
    items: &[T],
    duration_of: impl Fn(&T) -> Duration,
    multiplier: f64,
) -> Vec<SlowEntry<T>> {
    if items.len() < 2 {
        return Vec::new();
    }
    let total: Duration = items.iter().map(&duration_of).sum();
    #[allow(clippy::cast_possible_truncation)]
    let mean = total.as_secs_f64() / items.len() as f64;
    if mean <= 0.0 {
        return Vec::new();
    }
    items
        .iter()
        .filter_map(|item| {
            let duration = duration_of(item).as_secs_f64();
            if duration > mean * multiplier {
                Some(SlowEntry {
                    times_slower: duration / mean,
                    metric: item.clone(),
                })
            } else {
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct SlowEntry<T> {
    pub times_slower: f64,
    pub metric: T,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlowOperations {
    pub key_generation: Vec<SlowEntry<OperationMetric>>,
    pub cache_operations: Vec<SlowEntry<OperationMetric>>,
    pub compression: Vec<SlowEntry<CompressionMetric>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub slow_count: usize,
}

fn category_stats<T>(
    items: &[T],
    duration_of: impl Fn(&T) -> Duration,
    slow_threshold: Duration,
) -> Option<CategoryStats> {
    if items.is_empty() {
        return None;
    }
    let mut durations: Vec<f64> = items.iter().map(|i| duration_of(i).as_secs_f64()).collect();
    durations.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    #[allow(clippy::cast_precision_loss)]
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;
    let median = median_of(&durations);
    let min = durations.first().copied().unwrap_or(0.0);
    let max = durations.last().copied().unwrap_or(0.0);
    let slow_count = items
        .iter()
        .filter(|i| duration_of(i) > slow_threshold)
        .count();

    Some(CategoryStats {
        count: items.len(),
        mean,
        median,
        min,
        max,
        slow_count,
    })
}

fn median_of(sorted: &[f64]) -> f64 {
    let len = sorted.len();
    if len == 0 {
        return 0.0;
    }
    if len % 2 == 1 {
        sorted[len / 2]
    } else {
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheOperationStats {
    pub overall: CategoryStats,
    pub by_operation_type: BTreeMap<String, CategoryStats>,
}

fn cache_operation_stats(
    items: &[OperationMetric],
    slow_threshold: Duration,
) -> Option<CacheOperationStats> {
    let overall = category_stats(items, |m| m.duration, slow_threshold)?;

    let mut by_tag: BTreeMap<String, Vec<OperationMetric>> = BTreeMap::new();
    for item in items {
        by_tag
            .entry(item.op_tag.clone())
            .or_default()
            .push(item.clone());
    }
    let by_operation_type = by_tag
        .into_iter()
        .filter_map(|(tag, metrics)| {
            category_stats(&metrics, |m| m.duration, slow_threshold).map(|s| (tag, s))
        })
        .collect();

    Some(CacheOperationStats {
        overall,
        by_operation_type,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct CompressionStats {
    pub count: usize,
    pub avg_ratio: f64,
    pub median_ratio: f64,
    pub avg_elapsed: f64,
}

fn compression_stats(items: &[CompressionMetric]) -> Option<CompressionStats> {
    if items.is_empty() {
        return None;
    }
    let mut ratios: Vec<f64> = items.iter().map(|m| m.ratio).collect();
    ratios.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    #[allow(clippy::cast_precision_loss)]
    let avg_ratio = ratios.iter().sum::<f64>() / ratios.len() as f64;
    let median_ratio = median_of(&ratios);
    #[allow(clippy::cast_precision_loss)]
    let avg_elapsed = items.iter().map(|m| m.elapsed.as_secs_f64()).sum::<f64>() / items.len() as f64;

    Some(CompressionStats {
        count: items.len(),
        avg_ratio,
        median_ratio,
        avg_elapsed,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct InvalidationCategoryStats {
    pub count: usize,
    pub avg_duration: f64,
}

fn invalidation_category_stats(items: &[InvalidationMetric]) -> Option<InvalidationCategoryStats> {
    if items.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let avg_duration =
        items.iter().map(|m| m.duration.as_secs_f64()).sum::<f64>() / items.len() as f64;
    Some(InvalidationCategoryStats {
        count: items.len(),
        avg_duration,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceStats {
    pub timestamp: f64,
    pub cache_hit_rate: f64,
    pub total_cache_operations: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub key_generation: Option<CategoryStats>,
    pub cache_operations: Option<CacheOperationStats>,
    pub compression: Option<CompressionStats>,
    pub memory_usage: Option<MemoryMetric>,
    pub invalidation: Option<InvalidationCategoryStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryUsageStats {
    pub current: Option<MemoryMetric>,
    pub growth_rate_mb_per_hour: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize)]
pub struct Warning {
    pub severity: Severity,
    pub message: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub severity: Severity,
    pub issue: String,
    pub message: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertLevel {
    Normal,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvalidationFrequencyStats {
    pub total_invalidations: u64,
    pub total_keys_invalidated: u64,
    pub last_hour_count: u64,
    pub last_24h_count: u64,
    pub rate_per_hour_24h: f64,
    pub pattern_counts: BTreeMap<String, u64>,
    pub kind_counts: BTreeMap<String, u64>,
    pub avg_keys_per_invalidation: f64,
    pub avg_duration: Duration,
    pub max_duration: Duration,
    pub warning_per_hour: u64,
    pub critical_per_hour: u64,
    pub current_alert_level: AlertLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportSnapshot {
    pub exported_at: f64,
    pub hits: u64,
    pub misses: u64,
    pub total_ops: u64,
    pub total_invalidations: u64,
    pub total_keys_invalidated: u64,
    pub key_generation: Vec<OperationMetric>,
    pub cache_operations: Vec<OperationMetric>,
    pub compression: Vec<CompressionMetric>,
    pub memory: Vec<MemoryMetric>,
    pub invalidations: Vec<InvalidationMetric>,
}
