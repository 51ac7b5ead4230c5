use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use timing_attack_sim::comparator::evaluate;
use timing_attack_sim::{ComparatorConfig, Histogram, TimeUnit};

fn bench_cost_model(c: &mut Criterion) {
    let secret = [b'a'; 64];
    let mut half = secret;
    half[32] = b'b';

    let mut group = c.benchmark_group("cost_model");
    // Only the cost model is measured; simulated delays are never awaited.
    let vulnerable = ComparatorConfig::vulnerable().noise_range_ms(5.0);
    let secure = ComparatorConfig::secure(64).noise_range_ms(5.0);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);

    group.bench_function("vulnerable_half_match", |b| {
        b.iter(|| black_box(evaluate(black_box(&half), &secret, &vulnerable, &mut rng).elapsed_ms()));
    });
    group.bench_function("secure_half_match", |b| {
        b.iter(|| black_box(evaluate(black_box(&half), &secret, &secure, &mut rng).elapsed_ms()));
    });
    group.finish();
}

fn bench_histogram(c: &mut Criterion) {
    let samples: Vec<f64> = (0..10_000).map(|i| (i % 1_500) as f64 / 100.0).collect();
    c.bench_function("histogram_10k", |b| {
        b.iter(|| black_box(Histogram::build(black_box(&samples), 10, 15.0, TimeUnit::Millis)));
    });
}

criterion_group!(benches, bench_cost_model, bench_histogram);
criterion_main!(benches);
