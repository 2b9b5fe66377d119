//! Benchmarks for the wire codec: encode/decode cost across the
//! `rawj:`/`raw:`/`compressed:` paths and a few payload sizes.

use ai_tiered_cache::{Codec, Value};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn text_value(size_bytes: usize) -> Value {
    Value::String("x".repeat(size_bytes))
}

fn bench_encode_decode_by_size(c: &mut Criterion) {
    let codec = Codec::new(1_024, 6);
    let mut group = c.benchmark_group("codec_round_trip");

    for size in &[100, 1_024, 10_240, 102_400] {
        let value = text_value(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let encoded = codec.encode(black_box(&value)).unwrap_or_else(|_| panic!("encode failed"));
                black_box(
                    codec
                        .decode(&encoded.bytes)
                        .unwrap_or_else(|_| panic!("decode failed")),
                );
            });
        });
    }

    group.finish();
}

fn bench_json_fast_path_vs_compressed(c: &mut Criterion) {
    let codec = Codec::new(1_024, 6);
    let mut group = c.benchmark_group("codec_path");

    let small = text_value(200);
    group.bench_function("rawj_fast_path", |b| {
        b.iter(|| {
            black_box(codec.encode(&small).unwrap_or_else(|_| panic!("encode failed")));
        });
    });

    let large = text_value(64 * 1024);
    group.bench_function("compressed_path", |b| {
        b.iter(|| {
            black_box(codec.encode(&large).unwrap_or_else(|_| panic!("encode failed")));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_encode_decode_by_size,
    bench_json_fast_path_vs_compressed
);
criterion_main!(benches);
