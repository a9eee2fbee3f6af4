//! Run merge benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use nstrack_bench::restarted_segments;
use nstrack_core::merge;

/// Benchmark merging with a growing number of restarts.
fn bench_merge_segments(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_segments");

    for segments in [2, 8, 32] {
        let input = restarted_segments(segments, 500, 20);
        let observations: usize = input
            .iter()
            .flat_map(|segment| &segment.histories)
            .map(|history| history.observations.len())
            .sum();

        group.throughput(Throughput::Elements(observations as u64));
        group.bench_with_input(BenchmarkId::from_parameter(segments), &input, |b, input| {
            b.iter_batched(
                || input.clone(),
                |segments| black_box(merge(segments).unwrap()),
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

/// Benchmark merging with a growing number of stars.
fn bench_merge_stars(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_stars");

    for stars in [100, 1_000, 10_000] {
        let input = restarted_segments(4, stars, 10);
        group.throughput(Throughput::Elements(stars as u64));
        group.bench_with_input(BenchmarkId::from_parameter(stars), &input, |b, input| {
            b.iter_batched(
                || input.clone(),
                |segments| black_box(merge(segments).unwrap()),
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_merge_segments, bench_merge_stars);
criterion_main!(benches);
