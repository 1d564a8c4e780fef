//! Integration tests for the process pool, driving the real `lab-worker` binary

use concurrency_lab::core::partition_successes;
use concurrency_lab::prelude::*;
use concurrency_lab::pool::run_process_pool_with;

fn config(workers: usize) -> ProcessPoolConfig {
    ProcessPoolConfig::new(workers).with_worker_program(env!("CARGO_BIN_EXE_lab-worker"))
}

#[test]
fn test_fib_batch_matches_local() {
    let workers = num_cpus::get().clamp(2, 4);
    let mut results = run_process_pool_with(config(workers), &[20, 21, 22]).unwrap();
    results.sort_unstable();

    assert_eq!(
        results,
        vec![
            (20, fib(20).unwrap()),
            (21, fib(21).unwrap()),
            (22, fib(22).unwrap()),
        ]
    );
    assert_eq!(results[0].1, 6765);
}

#[test]
fn test_failed_task_is_excluded() {
    let mut results = run_process_pool_with(config(2), &[10, -1, 12]).unwrap();
    results.sort_unstable();
    assert_eq!(results, vec![(10, 55), (12, 144)]);
}

#[test]
fn test_failure_carries_kind() {
    let pool = ProcessPool::with_config(config(2)).unwrap();
    let results = pool.map_completed(Operation::Fib, &[-3]).unwrap();

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.input, -3);
    match &result.outcome {
        Err(LabError::TaskFailed { message, .. }) => {
            assert!(message.contains("NegativeInput"), "message was {message}");
        }
        other => panic!("expected TaskFailed, got {other:?}"),
    }
}

#[test]
fn test_sum_range_on_processes() {
    let pool = ProcessPool::with_config(config(3)).unwrap();
    let inputs: Vec<i64> = (0..12).map(|i| i * 1_000).collect();
    let results = pool.map_completed(Operation::SumRange, &inputs).unwrap();
    assert_eq!(results.len(), inputs.len());

    let mut ok = partition_successes(results, |n, e| panic!("sum_range({n}) failed: {e}"));
    ok.sort_unstable();
    for (n, total) in ok {
        assert_eq!(total, sum_range(n).unwrap());
    }
}

#[test]
fn test_more_workers_than_tasks() {
    let pool = ProcessPool::with_config(config(8)).unwrap();
    let results = pool.map_completed(Operation::Fib, &[5]).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].outcome.as_ref().ok(), Some(&5));
}

#[test]
fn test_pool_is_reusable_across_batches() {
    let pool = ProcessPool::with_config(config(2)).unwrap();
    for _ in 0..3 {
        let results = pool.map_completed(Operation::Fib, &[1, 2, 3]).unwrap();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 3);
    }
}

#[test]
fn test_missing_worker_program_fails_batch() {
    let pool = ProcessPool::with_config(
        ProcessPoolConfig::new(2).with_worker_program("/nonexistent/lab-worker"),
    );
    // Either resolution or the batch spawn must fail; never a silent success.
    match pool {
        Err(_) => {}
        Ok(pool) => assert!(pool.map_completed(Operation::Fib, &[1]).is_err()),
    }
}
