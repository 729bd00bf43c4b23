//! Criterion benchmarks for lapse-cache: set, get hit/miss, concurrent reads.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lapse_cache::TtlCache;

const TTL: Duration = Duration::from_secs(3600);

fn populated(n: u64) -> TtlCache<u64, u64> {
    let cache = TtlCache::new(TTL, Duration::ZERO);
    for i in 0..n {
        cache.set(i, i);
    }
    cache
}

fn bench_set(c: &mut Criterion) {
    let cache = populated(0);
    let mut g = c.benchmark_group("set");
    g.throughput(Throughput::Elements(1));
    let mut i = 0u64;
    g.bench_function("set_overwrite_1k", |b| {
        b.iter(|| {
            cache.set(black_box(i % 1024), i);
            i = i.wrapping_add(1);
        });
    });
    g.finish();
}

fn bench_get(c: &mut Criterion) {
    let cache = populated(10_000);
    let mut g = c.benchmark_group("get");
    g.throughput(Throughput::Elements(1));
    g.bench_function("hit", |b| {
        b.iter(|| black_box(cache.get(black_box(&4_242u64))));
    });
    g.bench_function("miss", |b| {
        b.iter(|| black_box(cache.get(black_box(&99_999u64))));
    });
    g.finish();
}

fn bench_concurrent_get(c: &mut Criterion) {
    let cache = Arc::new(populated(10_000));
    let readers = 4;
    let per_reader = 1_000u64;
    let mut g = c.benchmark_group("concurrent_get");
    g.throughput(Throughput::Elements(readers * per_reader));
    g.bench_function("4_readers", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..readers)
                .map(|_| {
                    let cache = Arc::clone(&cache);
                    thread::spawn(move || {
                        for k in 0..per_reader {
                            black_box(cache.get(&k));
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        });
    });
    g.finish();
}

fn bench_purge(c: &mut Criterion) {
    let mut g = c.benchmark_group("purge_expired");
    g.throughput(Throughput::Elements(10_000));
    g.bench_function("10k_live", |b| {
        let cache = populated(10_000);
        b.iter(|| black_box(cache.purge_expired()));
    });
    g.finish();
}

criterion_group!(benches, bench_set, bench_get, bench_concurrent_get, bench_purge);
criterion_main!(benches);
