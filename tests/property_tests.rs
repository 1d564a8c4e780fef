//! Property-based tests for concurrency_lab using proptest

use concurrency_lab::prelude::*;
use concurrency_lab::workload::FIB_MAX_INPUT;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// CPU Workload Properties
// ============================================================================

proptest! {
    /// fib satisfies the recurrence
    #[test]
    fn test_fib_recurrence(k in 2i64..25) {
        prop_assert_eq!(fib(k).unwrap(), fib(k - 1).unwrap() + fib(k - 2).unwrap());
    }

    /// fib is a pure function
    #[test]
    fn test_fib_idempotent(n in 0i64..22) {
        let first = fib(n).unwrap();
        let second = fib(n).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Every negative input is rejected
    #[test]
    fn test_negative_inputs_rejected(n in i64::MIN..0) {
        let fib_rejected = matches!(fib(n), Err(LabError::NegativeInput { .. }));
        let sum_rejected = matches!(sum_range(n), Err(LabError::NegativeInput { .. }));
        prop_assert!(fib_rejected);
        prop_assert!(sum_rejected);
    }

    /// Inputs whose Fibonacci number exceeds u64 are rejected, not computed
    #[test]
    fn test_fib_rejects_overflowing_inputs(n in (FIB_MAX_INPUT + 1)..i64::MAX) {
        let rejected = matches!(fib(n), Err(LabError::Overflow { .. }));
        prop_assert!(rejected);
    }

    /// sum_range matches the closed form
    #[test]
    fn test_sum_range_closed_form(n in 0i64..5_000) {
        let n_u = n as u64;
        let expected = if n_u == 0 { 0 } else { n_u * (n_u - 1) / 2 };
        prop_assert_eq!(sum_range(n).unwrap(), expected);
    }

    /// safe_fib substitutes the default only on failure
    #[test]
    fn test_safe_fib_default(n in -20i64..20, default in any::<u64>()) {
        let got = safe_fib(n, Some(default)).unwrap();
        if n < 0 {
            prop_assert_eq!(got, default);
        } else {
            prop_assert_eq!(got, fib(n).unwrap());
        }
    }
}

// ============================================================================
// Counter and Handoff Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// The locked counter never loses an update
    #[test]
    fn test_safe_increment_exact(workers in 1usize..6, loops in 1u64..2_000) {
        prop_assert_eq!(safe_increment(workers, loops).unwrap(), workers as u64 * loops);
    }

    /// The racy counter can lose updates but never invents them
    #[test]
    fn test_unsafe_increment_bounded(workers in 1usize..6, loops in 1u64..2_000) {
        let total = unsafe_increment(workers, loops).unwrap();
        prop_assert!(total <= workers as u64 * loops);
    }

    /// Every produced item is consumed exactly once, in order
    #[test]
    fn test_producer_consumer_complete(count in 0u64..200) {
        let results = producer_consumer(count).unwrap();
        let expected: Vec<u64> = (0..count).map(|i| i * 2).collect();
        prop_assert_eq!(results, expected);
    }
}

// ============================================================================
// Thread Pool Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Every submitted input comes back exactly once
    #[test]
    fn test_map_completed_one_result_per_input(
        threads in 1usize..6,
        inputs in prop::collection::vec(any::<u16>(), 0..40)
    ) {
        let pool = ThreadPool::with_threads(threads).unwrap();
        pool.start().unwrap();
        let results = pool.map_completed(inputs.clone(), |n: &u16| Ok(u32::from(*n) * 3)).unwrap();
        pool.shutdown().unwrap();

        let mut got: Vec<(u16, u32)> = results
            .into_iter()
            .map(|r| (r.input, r.outcome.unwrap()))
            .collect();
        got.sort_unstable();
        let mut expected: Vec<(u16, u32)> = inputs.iter().map(|n| (*n, u32::from(*n) * 3)).collect();
        expected.sort_unstable();
        prop_assert_eq!(got, expected);
    }

    /// Shutdown drains every queued job
    #[test]
    fn test_shutdown_drains(threads in 1usize..5, jobs in 0usize..60) {
        let pool = ThreadPool::with_threads(threads).unwrap();
        pool.start().unwrap();

        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..jobs {
            let counter_clone = Arc::clone(&counter);
            pool.execute(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }).unwrap();
        }
        pool.shutdown().unwrap();

        prop_assert_eq!(counter.load(Ordering::SeqCst), jobs);
    }
}
