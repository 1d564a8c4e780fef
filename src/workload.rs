//! CPU-bound workloads.
//!
//! [`fib`] is deliberately the naive exponential recursion: its job is to
//! burn CPU, not to be fast.

use crate::core::{LabError, Result};
use crate::logging::get_logger;

/// Largest `n` whose Fibonacci number fits in a `u64`
pub const FIB_MAX_INPUT: i64 = 93;

/// Naive recursive Fibonacci.
///
/// # Errors
///
/// [`LabError::NegativeInput`] for `n < 0`, [`LabError::Overflow`] for
/// `n > FIB_MAX_INPUT`. The bound also keeps the recursion depth small.
pub fn fib(n: i64) -> Result<u64> {
    if n < 0 {
        return Err(LabError::negative_input("fib", n));
    }
    if n > FIB_MAX_INPUT {
        return Err(LabError::overflow("fib", n));
    }
    Ok(fib_unchecked(n as u64))
}

fn fib_unchecked(n: u64) -> u64 {
    if n <= 1 {
        return n;
    }
    fib_unchecked(n - 1) + fib_unchecked(n - 2)
}

/// Sum of the integers in `0..n`.
///
/// # Errors
///
/// [`LabError::NegativeInput`] for `n < 0`, [`LabError::Overflow`] when the
/// sum does not fit in a `u64`.
pub fn sum_range(n: i64) -> Result<u64> {
    if n < 0 {
        return Err(LabError::negative_input("sum_range", n));
    }
    (0..n as u64).try_fold(0u64, |acc, i| {
        acc.checked_add(i)
            .ok_or_else(|| LabError::overflow("sum_range", n))
    })
}

/// [`fib`] for pipeline stages that should not abort on bad input.
///
/// Failures are logged as `safe_fib_error n=<n> err=<kind>`; `default` is
/// returned when given, otherwise the original error is.
pub fn safe_fib(n: i64, default: Option<u64>) -> Result<u64> {
    match fib(n) {
        Ok(value) => Ok(value),
        Err(e) => {
            get_logger("cpu").error(format!("safe_fib_error n={} err={}", n, e.kind()));
            match default {
                Some(value) => Ok(value),
                None => Err(e),
            }
        }
    }
}
