//! End-to-end reconstruction benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nstrack_bench::write_run;
use nstrack_core::{reconstruct_run, PipelineConfig};

/// Benchmark sequential against parallel segment assembly.
fn bench_reconstruct(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruct");
    group.sample_size(20);

    let run = write_run(6, 2_000, 10);
    let configs = [
        ("sequential", PipelineConfig::new().parallel_assembly(false)),
        ("parallel", PipelineConfig::new()),
    ];

    for (name, config) in &configs {
        group.bench_with_input(BenchmarkId::from_parameter(name), config, |b, config| {
            b.iter(|| black_box(reconstruct_run(run.path(), config).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reconstruct);
criterion_main!(benches);
