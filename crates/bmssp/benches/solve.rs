use std::hint::black_box;
use std::time::Duration;

use bmssp::Solver;
use bmssp::dijkstra;
use bmssp::generator::GraphCase;
use bmssp::generator::generate_case;
use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::SamplingMode;
use criterion::criterion_group;
use criterion::criterion_main;

const CASES: [GraphCase; 5] = [
    GraphCase::SparseRandom,
    GraphCase::DenseRandom,
    GraphCase::ZeroClusters,
    GraphCase::ChainShortcuts,
    GraphCase::ParallelHeavy,
];

const SIZES: [usize; 3] = [1_024, 4_096, 16_384];

fn apply_runtime(
    group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>,
    size: usize,
) {
    group.sample_size(10);
    group.warm_up_time(Duration::from_millis(120));
    if size <= 4_096 {
        group.sampling_mode(SamplingMode::Auto);
        group.measurement_time(Duration::from_millis(250));
    } else {
        group.sampling_mode(SamplingMode::Flat);
        group.measurement_time(Duration::from_millis(400));
    }
}

fn bench_solve(c: &mut Criterion) {
    for case in CASES {
        let mut group = c.benchmark_group(format!("solve/{}", case.label()));

        for &size in &SIZES {
            apply_runtime(&mut group, size);
            let seed = 0x5EED_2026 ^ ((size as u64) << 7) ^ (case as u64);
            let input = generate_case(case, size, seed);

            group.bench_function(BenchmarkId::new("bmssp", size), |bencher| {
                bencher.iter(|| {
                    let mut solver = Solver::new(&input.graph);
                    solver.force_bmssp = true;
                    black_box(solver.solve(input.source, input.target));
                });
            });

            group.bench_function(BenchmarkId::new("dijkstra", size), |bencher| {
                bencher.iter(|| {
                    black_box(dijkstra(&input.graph, input.source, input.target));
                });
            });
        }

        group.finish();
    }
}

criterion_group!(benches, bench_solve);
criterion_main!(benches);
