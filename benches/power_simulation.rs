//! Power simulation benchmark
//!
//! The Monte Carlo Wilcoxon power estimate dominates report assembly time:
//! every computed paired test asks for one (n, d) cell at
//! `power_simulations` iterations. This benchmark tracks the raw simulation,
//! the memoised estimator, and the analytic t-test power next to it.
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench power_simulation
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use entropy_compare::effect::{
    minimum_detectable_effect, power_paired_ttest, power_wilcoxon_paired, PowerEstimator,
};
use entropy_compare::AnalysisConfig;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Benchmark: one Wilcoxon power cell at varying sample sizes
fn bench_wilcoxon_power(c: &mut Criterion) {
    let mut group = c.benchmark_group("wilcoxon_power_1000_sims");
    group.sample_size(20);

    for n in [10usize, 30, 60] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut rng = ChaCha8Rng::seed_from_u64(42);
                black_box(power_wilcoxon_paired(black_box(0.5), n, 0.05, 1000, &mut rng))
            });
        });
    }

    group.finish();
}

/// Benchmark: memoised estimator lookups after the first simulation
fn bench_estimator_memo(c: &mut Criterion) {
    let config = AnalysisConfig {
        power_simulations: 1000,
        ..AnalysisConfig::default()
    };
    let mut estimator = PowerEstimator::new(&config);
    estimator.wilcoxon(0.5, 30);

    c.bench_function("power_estimator_cached_cell", |b| {
        b.iter(|| black_box(estimator.wilcoxon(black_box(0.5), 30)));
    });
}

/// Benchmark: analytic power and MDE bisection
fn bench_analytic_power(c: &mut Criterion) {
    c.bench_function("ttest_power_noncentral_t", |b| {
        b.iter(|| black_box(power_paired_ttest(black_box(0.5), 30, 0.05)));
    });

    c.bench_function("minimum_detectable_effect", |b| {
        b.iter(|| black_box(minimum_detectable_effect(black_box(30), 0.05, 0.80)));
    });
}

criterion_group!(
    benches,
    bench_wilcoxon_power,
    bench_estimator_memo,
    bench_analytic_power
);
criterion_main!(benches);
