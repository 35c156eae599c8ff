//! Benchmark for effect chains: construction, evaluation and short-circuiting.
//!
//! Chains up to eight nodes stay in the inline arena; the `map_16` cases
//! measure the spill to the heap.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use effectum::effect::Effect;
use effectum::store::Store;
use std::hint::black_box;

fn map_chain(length: usize) -> Effect<u64> {
    let mut effect = Effect::pure(1_u64);
    for _ in 0..length {
        effect = effect.map(|value| value.wrapping_mul(3).wrapping_add(1));
    }
    effect
}

// =============================================================================
// Sources
// =============================================================================

fn benchmark_sources(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("effect_source");

    group.bench_function("pure", |bencher| {
        bencher.iter(|| black_box(Effect::pure(black_box(42)).run()));
    });

    group.bench_function("lazy", |bencher| {
        bencher.iter(|| black_box(Effect::lazy(|| black_box(42)).run()));
    });

    group.bench_function("attempt", |bencher| {
        bencher.iter(|| black_box(Effect::attempt(|| "42".parse::<i32>()).run()));
    });

    group.finish();
}

// =============================================================================
// Chains
// =============================================================================

fn benchmark_map_chain(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("effect_map_chain");

    for length in [1, 4, 7, 16] {
        group.bench_with_input(BenchmarkId::new("map", length), &length, |bencher, &length| {
            bencher.iter(|| black_box(map_chain(length).run()));
        });
    }

    group.bench_function("build_only_16", |bencher| {
        bencher.iter(|| black_box(map_chain(16).node_count()));
    });

    group.finish();
}

fn benchmark_flat_map_chain(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("effect_flat_map_chain");

    group.bench_function("flat_map_5", |bencher| {
        bencher.iter(|| {
            let effect = Effect::pure(1)
                .flat_map(|x| Effect::pure(x + 1))
                .flat_map(|x| Effect::pure(x * 2))
                .flat_map(|x| Effect::pure(x + 3))
                .flat_map(|x| Effect::pure(x * 4))
                .flat_map(|x| Effect::pure(x + 5));
            black_box(effect.run())
        });
    });

    group.bench_function("pipe_2", |bencher| {
        bencher.iter(|| {
            let mut store = Store::new();
            store.set("offset", 10_i64);
            let effect = Effect::pure(black_box(32_i64)).pipe(|x: i64, offset: i64| Effect::pure(x + offset));
            black_box(effect.run_in(&mut store))
        });
    });

    group.finish();
}

// =============================================================================
// Short-circuit
// =============================================================================

fn benchmark_short_circuit(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("effect_short_circuit");

    group.bench_function("failure_through_8", |bencher| {
        bencher.iter(|| {
            let mut effect = Effect::<u64>::fail("boom");
            for _ in 0..7 {
                effect = effect.map(|value| value + 1);
            }
            black_box(effect.run())
        });
    });

    group.bench_function("recover", |bencher| {
        bencher.iter(|| {
            let effect = Effect::<u64>::fail("boom").map(|value| value + 1).recover(|_| 0);
            black_box(effect.run())
        });
    });

    group.finish();
}

// =============================================================================
// Slices
// =============================================================================

fn benchmark_slices(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("effect_slice");
    let values: Vec<u32> = (0..1_000).collect();

    group.bench_function("map_filter_fold_1000", |bencher| {
        bencher.iter(|| {
            let effect = Effect::pure(values.clone())
                .slice_map(|value| value * 2)
                .slice_filter(|value| value % 3 == 0)
                .slice_fold(0_u64, |total, value| total + u64::from(value));
            black_box(effect.run())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_sources,
    benchmark_map_chain,
    benchmark_flat_map_chain,
    benchmark_short_circuit,
    benchmark_slices
);

criterion_main!(benches);
