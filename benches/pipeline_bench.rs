//! Benchmark for store lookups, the reflective pipeline and the runtime.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use effectum::effect::Effect;
use effectum::error::BoxError;
use effectum::pipeline::Pipeline;
use effectum::runtime::{Resource, Runtime};
use effectum::store::Store;
use std::hint::black_box;

// =============================================================================
// Store
// =============================================================================

fn benchmark_store_lookup(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("store_lookup");

    for size in [4_u64, 32, 256] {
        let mut store = Store::new();
        store.set("target", 7_u8);
        for index in 0..size {
            store.insert(index);
        }

        group.bench_with_input(BenchmarkId::new("by_type_oldest", size), &store, |bencher, store| {
            bencher.iter(|| black_box(store.lookup::<u8>()));
        });

        group.bench_with_input(BenchmarkId::new("by_name", size), &store, |bencher, store| {
            bencher.iter(|| black_box(store.get::<u8>(black_box("target")).is_ok()));
        });

        group.bench_with_input(BenchmarkId::new("copy", size), &store, |bencher, store| {
            bencher.iter(|| black_box(store.copy().len()));
        });
    }

    group.finish();
}

// =============================================================================
// Pipeline
// =============================================================================

fn benchmark_pipeline(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("pipeline");

    group.bench_function("three_steps", |bencher| {
        bencher.iter(|| {
            let pipeline = Pipeline::<i32>::new()
                .next(|| black_box(5))
                .next(|| black_box(2))
                .next(|x: i32, y: i32| x + y);
            black_box(pipeline.into_outcome())
        });
    });

    group.bench_function("try_steps", |bencher| {
        bencher.iter(|| {
            let pipeline = Pipeline::<u16>::new()
                .next(|| "512".to_string())
                .try_next(|text: String| text.parse::<u16>())
                .try_next(|value: u16| value.checked_mul(2));
            black_box(pipeline.into_outcome())
        });
    });

    group.finish();
}

// =============================================================================
// Runtime
// =============================================================================

fn benchmark_runtime(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("runtime");

    group.bench_function("two_chains", |bencher| {
        bencher.iter(|| {
            let runtime = Runtime::<i32>::new()
                .named_chain("x", Effect::pure(5))
                .named_chain("y", Effect::pure(2))
                .chain(Effect::attempt_auto(|x: i32, y: i32| Some(x + y)));
            black_box(runtime.into_outcome())
        });
    });

    group.bench_function("bracketed", |bencher| {
        bencher.iter(|| {
            let runtime = Runtime::<usize>::new()
                .resource(Resource::new(
                    "buffer",
                    || Ok::<_, BoxError>(vec![0_u8; 64]),
                    |_: Vec<u8>| Ok::<_, BoxError>(()),
                ))
                .chain(Effect::attempt_auto(|buffer: Vec<u8>| Some(buffer.len())));
            black_box(runtime.into_outcome())
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_store_lookup, benchmark_pipeline, benchmark_runtime);

criterion_main!(benches);
