//! Basic Usage Example
//!
//! Demonstrates simple cache operations: connect, set, get, and a
//! performance snapshot.
//!
//! Run with: cargo run --example basic_usage

use ai_tiered_cache::remote::RedisStore;
use ai_tiered_cache::{AiCache, CacheConfig, PerformanceMonitor, Thresholds, Value};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    println!("=== AI Tiered Cache: Basic Usage ===\n");

    let config = CacheConfig::default();
    config.validate()?;

    let monitor = Arc::new(PerformanceMonitor::new(Thresholds::from(&config)));
    let cache = AiCache::new(&config, monitor.clone());

    match RedisStore::connect(&config.remote_url).await {
        Ok(remote) => {
            cache.attach_remote(Arc::new(remote));
            println!("connected to {}", config.remote_url);
        }
        Err(err) => println!("remote unavailable ({err}), running memory-only"),
    }

    let options = Value::Null;
    println!("Caching a summarize result...");
    let key = cache
        .set(
            "The quick brown fox jumps over the lazy dog.",
            "summarize",
            &options,
            Value::from("A fox jumps over a dog."),
        )
        .await;
    println!("stored under key: {key}");

    println!("\nFetching it back...");
    if let Some(cached) = cache
        .get(
            "The quick brown fox jumps over the lazy dog.",
            "summarize",
            &options,
        )
        .await
    {
        println!("cache hit: {cached:?}");
    }

    let stats = monitor.performance_stats();
    println!("\n=== Performance Snapshot ===");
    println!("hit rate: {:.2}%", stats.cache_hit_rate);
    println!("total operations: {}", stats.total_cache_operations);

    Ok(())
}
