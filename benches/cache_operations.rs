//! Benchmarks for basic tiered-cache operations
//!
//! Measures L1-only vs. L1+remote round trips, cache hit vs. miss latency,
//! and set() cost across a few payload sizes, all against the in-process
//! `FakeRemoteStore` so this runs without a live Redis instance.

use ai_tiered_cache::remote::testing::FakeRemoteStore;
use ai_tiered_cache::{CacheConfig, PerformanceMonitor, TieredCache, Thresholds, Value};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use tokio::runtime::Runtime;

fn setup() -> (TieredCache<FakeRemoteStore>, Runtime) {
    let rt = Runtime::new().unwrap_or_else(|_| panic!("failed to create runtime"));
    let config = CacheConfig::default();
    let monitor = Arc::new(PerformanceMonitor::new(Thresholds::default()));
    let cache = TieredCache::new(&config, monitor);
    cache.attach_remote(Arc::new(FakeRemoteStore::new()));
    (cache, rt)
}

fn test_value(size_bytes: usize) -> Value {
    Value::String("x".repeat(size_bytes))
}

fn bench_cache_set(c: &mut Criterion) {
    let (cache, rt) = setup();
    let mut group = c.benchmark_group("cache_set");

    for size in &[100, 1024, 10_240, 102_400] {
        let value = test_value(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                rt.block_on(async {
                    let key = format!("bench:set:{}", rand::random::<u32>());
                    cache.set(&key, black_box(value.clone()), None).await;
                });
            });
        });
    }

    group.finish();
}

fn bench_l1_hit(c: &mut Criterion) {
    let (cache, rt) = setup();

    rt.block_on(async {
        for i in 0..100 {
            let key = format!("bench:l1:{i}");
            cache.set(&key, test_value(1024), None).await;
        }
    });

    c.bench_function("l1_cache_hit", |b| {
        b.iter(|| {
            rt.block_on(async {
                let key = format!("bench:l1:{}", rand::random::<u8>() % 100);
                black_box(cache.get(&key).await);
            });
        });
    });
}

fn bench_remote_hit(c: &mut Criterion) {
    let (cache, rt) = setup();

    // Populate the remote directly and leave L1 empty, so each `get` takes
    // the remote path (cache.l1() is crate-visible only; emptying it here
    // means relying on a fresh L1Store at construction plus never calling
    // `set`, which would also populate L1 — so write through a second
    // cache handle that shares the same remote but not the same L1).
    let remote = Arc::new(FakeRemoteStore::new());
    let config = CacheConfig::default();
    let monitor = Arc::new(PerformanceMonitor::new(Thresholds::default()));
    let writer: TieredCache<FakeRemoteStore> = TieredCache::new(&config, Arc::clone(&monitor));
    writer.attach_remote(Arc::clone(&remote));
    rt.block_on(async {
        for i in 0..100 {
            let key = format!("bench:remote:{i}");
            writer.set(&key, test_value(1024), None).await;
        }
    });

    let reader: TieredCache<FakeRemoteStore> = TieredCache::new(&config, monitor);
    reader.attach_remote(remote);

    let _ = cache; // unused in this benchmark; kept for symmetry with the others
    c.bench_function("remote_cache_hit", |b| {
        b.iter(|| {
            rt.block_on(async {
                let key = format!("bench:remote:{}", rand::random::<u8>() % 100);
                black_box(reader.get(&key).await);
            });
        });
    });
}

fn bench_cache_miss(c: &mut Criterion) {
    let (cache, rt) = setup();

    c.bench_function("cache_miss", |b| {
        b.iter(|| {
            rt.block_on(async {
                let key = format!("bench:miss:{}", rand::random::<u32>());
                black_box(cache.get(&key).await);
            });
        });
    });
}

criterion_group!(
    benches,
    bench_cache_set,
    bench_l1_hit,
    bench_remote_hit,
    bench_cache_miss
);
criterion_main!(benches);
