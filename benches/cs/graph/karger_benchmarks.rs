use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mincut::graph::{random_min_cut, Graph, MinCutEstimator, VertexId};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

// Ring of `n` vertices where each vertex also links to the one `n / 2` steps ahead.
fn ring_with_chords(n: usize) -> Graph {
    let records: Vec<(VertexId, Vec<VertexId>)> = (0..n)
        .map(|i| (i, vec![(i + 1) % n, (i + n / 2) % n]))
        .collect();
    Graph::from_adjacency(records).unwrap()
}

fn bench_trial(c: &mut Criterion) {
    let mut group = c.benchmark_group("karger_trial");
    for &n in &[16, 64, 200] {
        let mut graph = ring_with_chords(n);
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| random_min_cut(black_box(&mut graph), &mut rng).unwrap())
        });
    }
    group.finish();
}

fn bench_estimate(c: &mut Criterion) {
    let mut graph = ring_with_chords(16);
    let estimator = MinCutEstimator::new().seed(7);
    c.bench_function("karger_estimate_16", |b| {
        b.iter(|| estimator.estimate_size(black_box(&mut graph)).unwrap())
    });
}

criterion_group!(benches, bench_trial, bench_estimate);
criterion_main!(benches);
