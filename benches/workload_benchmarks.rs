use concurrency_lab::core::Operation;
use concurrency_lab::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use std::time::Duration;

fn benchmark_fib(c: &mut Criterion) {
    let mut group = c.benchmark_group("fib");
    for n in [10i64, 15, 20] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| fib(black_box(n)).expect("fib failed"));
        });
    }
    group.finish();
}

fn benchmark_counters(c: &mut Criterion) {
    let mut group = c.benchmark_group("counters_4x10000");
    group.sample_size(20);

    group.bench_function("locked", |b| {
        b.iter(|| safe_increment(4, black_box(10_000)).expect("safe_increment failed"));
    });

    group.bench_function("racy", |b| {
        b.iter(|| unsafe_increment(4, black_box(10_000)).expect("unsafe_increment failed"));
    });

    group.finish();
}

fn benchmark_handoff(c: &mut Criterion) {
    c.bench_function("producer_consumer_1000", |b| {
        b.iter(|| producer_consumer(black_box(1_000)).expect("producer_consumer failed"));
    });
}

fn benchmark_thread_pool_cpu(c: &mut Criterion) {
    let mut group = c.benchmark_group("thread_pool_fib");
    group.sample_size(20);

    group.bench_function("serial_fib_20_x8", |b| {
        b.iter(|| {
            for _ in 0..8 {
                black_box(fib(20).expect("fib failed"));
            }
        });
    });

    group.bench_function("pool_fib_20_x8", |b| {
        b.iter_batched(
            || {
                let pool = ThreadPool::with_threads(4).expect("Failed to create pool");
                pool.start().expect("Failed to start pool");
                pool
            },
            |pool| {
                let results = pool
                    .map_completed(vec![20i64; 8], |n: &i64| Operation::Fib.apply(*n))
                    .expect("map_completed failed");
                pool.shutdown().expect("Failed to shutdown pool");
                black_box(results);
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn benchmark_parallel_sleep(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_sleep");
    group.sample_size(10);
    group.bench_function("4x10ms", |b| {
        b.iter(|| {
            parallel_sleep(4, Duration::from_millis(10)).expect("parallel_sleep failed")
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_fib,
    benchmark_counters,
    benchmark_handoff,
    benchmark_thread_pool_cpu,
    benchmark_parallel_sleep
);
criterion_main!(benches);
