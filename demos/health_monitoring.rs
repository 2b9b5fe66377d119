//! Health Monitoring Example
//!
//! Demonstrates the performance monitor's memory warnings, invalidation-rate
//! alerting, and actionable recommendations.
//!
//! Run with: cargo run --example `health_monitoring`

use ai_tiered_cache::remote::testing::FakeRemoteStore;
use ai_tiered_cache::{AiCache, CacheConfig, PerformanceMonitor, Thresholds, Value};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    println!("=== AI Tiered Cache: Health Monitoring ===\n");

    let config = CacheConfig::default();
    let monitor = Arc::new(PerformanceMonitor::new(Thresholds::from(&config)));
    let cache = AiCache::new(&config, monitor.clone());
    cache.attach_remote(Arc::new(FakeRemoteStore::new()));

    println!("Simulating traffic across a few operations...\n");
    for i in 0..20 {
        cache
            .set(
                &format!("document body {i}"),
                "summarize",
                &Value::Null,
                Value::from("a summary"),
            )
            .await;
        cache.get(&format!("document body {i}"), "summarize", &Value::Null).await;
        cache.get(&format!("document body {}", i + 1000), "qa", &Value::Null).await;
    }

    println!("Simulating a burst of pattern invalidations...");
    for _ in 0..60 {
        cache.invalidate_by_operation("summarize", "cache-health-demo").await;
    }

    let stats = monitor.performance_stats();
    println!("\n=== Performance Stats ===");
    println!("hit rate: {:.1}%", stats.cache_hit_rate);
    println!("total operations: {}", stats.total_cache_operations);

    println!("\n=== Memory Warnings ===");
    monitor.record_memory(cache.l1_len(), 200 * 1024 * 1024, None, std::collections::BTreeMap::new());
    for warning in monitor.memory_warnings() {
        println!("[{:?}] {}", warning.severity, warning.message);
    }

    println!("\n=== Invalidation Rate ===");
    let freq = monitor.invalidation_frequency_stats();
    println!(
        "{} invalidations in the last hour (alert level: {:?})",
        freq.last_hour_count, freq.current_alert_level
    );
    for recommendation in monitor.invalidation_recommendations() {
        println!(
            "[{:?}] {}: {}",
            recommendation.severity, recommendation.issue, recommendation.message
        );
    }

    println!("\n=== AI-Specific Recommendations ===");
    for recommendation in cache.performance_summary().recommendations {
        println!(
            "[{:?}] {}: {}",
            recommendation.severity, recommendation.issue, recommendation.message
        );
    }

    tokio::time::sleep(Duration::from_millis(1)).await;
    Ok(())
}
