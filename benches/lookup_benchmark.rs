//! Microbenchmarks for the hot lookup path: key derivation and cache
//! probes.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mapper::cache::DetectorMappingCache;
use mapper::cache_key::derive_key;
use mapper::types::{Detector, MetricTags};
use uuid::Uuid;

fn sample_tags(cardinality: usize) -> MetricTags {
    let mut tags = MetricTags::new();
    tags.insert("service".to_string(), "checkout".to_string());
    tags.insert("env".to_string(), "prod".to_string());
    for i in 0..cardinality {
        tags.insert(format!("dim-{}", i), format!("value-{}", i));
    }
    tags
}

fn bench_derive_key(c: &mut Criterion) {
    let small = sample_tags(2);
    let large = sample_tags(14);

    c.bench_function("derive_key/4_tags", |b| {
        b.iter(|| derive_key(black_box(&small)))
    });
    c.bench_function("derive_key/16_tags", |b| {
        b.iter(|| derive_key(black_box(&large)))
    });
}

fn bench_cache_probe(c: &mut Criterion) {
    let cache = DetectorMappingCache::new();
    for i in 0..10_000 {
        let detector = Detector::new(Uuid::new_v4(), format!("m-{}", i % 100));
        cache.put(format!("k-{}", i), vec![detector]);
    }

    c.bench_function("cache_get/hit", |b| {
        b.iter(|| cache.get(black_box("k-5000")))
    });
    c.bench_function("cache_get/miss", |b| {
        b.iter(|| cache.get(black_box("k-absent")))
    });
}

criterion_group!(benches, bench_derive_key, bench_cache_probe);
criterion_main!(benches);
