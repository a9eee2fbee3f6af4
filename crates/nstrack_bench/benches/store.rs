//! History store benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nstrack_bench::restarted_segments;
use nstrack_core::{merge, HistoryStore};
use tempfile::TempDir;

/// Benchmark storing a merged run in memory and on disk.
fn bench_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");
    group.sample_size(30);

    for stars in [100, 1_000] {
        let histories = merge(restarted_segments(3, stars, 10)).unwrap().into_histories();
        group.throughput(Throughput::Elements(histories.len() as u64));

        group.bench_with_input(BenchmarkId::new("memory", stars), &histories, |b, histories| {
            let store = HistoryStore::in_memory();
            b.iter(|| black_box(store.store("bench", histories).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("file", stars), &histories, |b, histories| {
            let temp_dir = TempDir::new().unwrap();
            let store = HistoryStore::open_dir(temp_dir.path()).unwrap();
            b.iter(|| black_box(store.store("bench", histories).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark loading a stored run.
fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");

    for stars in [100, 1_000] {
        let histories = merge(restarted_segments(3, stars, 10)).unwrap().into_histories();
        let store = HistoryStore::in_memory();
        store.store("bench", &histories).unwrap();

        group.throughput(Throughput::Elements(histories.len() as u64));
        group.bench_function(BenchmarkId::from_parameter(stars), |b| {
            b.iter(|| black_box(store.load(&["bench"]).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_store, bench_load);
criterion_main!(benches);
