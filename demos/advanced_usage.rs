//! Advanced Usage Example
//!
//! Demonstrates remote-to-L1 promotion, the tier-aware promotion policy,
//! and concurrent cache operations sharing a stampede guard.
//!
//! Run with: cargo run --example `advanced_usage`

use ai_tiered_cache::remote::testing::FakeRemoteStore;
use ai_tiered_cache::{AiCache, CacheConfig, PerformanceMonitor, Thresholds, Value};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    println!("=== AI Tiered Cache: Advanced Usage ===\n");

    let config = CacheConfig::default();
    let monitor = Arc::new(PerformanceMonitor::new(Thresholds::from(&config)));
    let cache = AiCache::new(&config, monitor.clone());
    // A FakeRemoteStore stands in for Redis here so this runs without one.
    let remote = Arc::new(FakeRemoteStore::new());
    cache.attach_remote(Arc::clone(&remote));
    println!("attached an in-process remote store\n");

    println!("=== Scenario 1: Tier-Aware Promotion ===\n");
    let short_text = "short question";
    let long_text = "x".repeat(60_000);

    println!("'small' tier text always promotes to L1 for any operation:");
    println!(
        "   should_promote(small, qa) = {}",
        cache.should_promote_to_memory("small", "qa")
    );

    println!("'xlarge' tier text only promotes for operations with a strong locality signal:");
    println!(
        "   should_promote(xlarge, qa) = {}",
        cache.should_promote_to_memory("xlarge", "qa")
    );
    println!(
        "   should_promote(xlarge, sentiment) = {}\n",
        cache.should_promote_to_memory("xlarge", "sentiment")
    );

    cache
        .set(short_text, "qa", &Value::Null, Value::from("a short answer"))
        .await;
    cache
        .set(&long_text, "summarize", &Value::Null, Value::from("a summary"))
        .await;
    println!("L1 now holds {} entries\n", cache.l1_len());

    println!("=== Scenario 2: Concurrent Cache Operations ===\n");
    let cache = Arc::new(cache);
    let mut handles = Vec::new();
    for i in 1..=5 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            cache
                .set(
                    &format!("concurrent request {i}"),
                    "summarize",
                    &Value::Null,
                    Value::from(format!("summary for worker {i}")),
                )
                .await
        }));
    }
    for handle in handles {
        handle.await?;
    }
    println!("5 concurrent set() calls completed\n");

    println!("=== Final Performance Summary ===");
    let summary = cache.performance_summary();
    for (operation, rate) in &summary.hit_rate_by_operation {
        println!("{operation}: {:.0}% hit rate", rate * 100.0);
    }
    for recommendation in &summary.recommendations {
        println!(
            "[{:?}] {}: {}",
            recommendation.severity, recommendation.issue, recommendation.message
        );
    }
    println!("total cache operations: {}", monitor.performance_stats().total_cache_operations);

    Ok(())
}
