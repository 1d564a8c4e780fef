//! Task results and the serializable operation descriptor

use crate::core::error::{LabError, Result};
use crate::workload;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output of one task: the input it ran on and what came out.
#[derive(Debug)]
pub struct TaskResult<I, T> {
    /// Input the task was submitted with
    pub input: I,
    /// Success value or the failure description
    pub outcome: Result<T>,
}

impl<I, T> TaskResult<I, T> {
    /// Create a result
    pub fn new(input: I, outcome: Result<T>) -> Self {
        Self { input, outcome }
    }

    /// Whether the task succeeded
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Split into `(input, outcome)`
    pub fn into_parts(self) -> (I, Result<T>) {
        (self.input, self.outcome)
    }
}

/// Keep the successful `(input, value)` pairs, handing each failure to `on_error`.
pub fn partition_successes<I, T>(
    results: impl IntoIterator<Item = TaskResult<I, T>>,
    mut on_error: impl FnMut(&I, &LabError),
) -> Vec<(I, T)> {
    let mut ok = Vec::new();
    for result in results {
        match result.outcome {
            Ok(value) => ok.push((result.input, value)),
            Err(e) => on_error(&result.input, &e),
        }
    }
    ok
}

/// CPU workload operations that can cross a process boundary.
///
/// Worker processes only ever receive one of these identifiers plus an
/// integer input, never code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Naive recursive Fibonacci
    Fib,
    /// Sum of `0..n`
    SumRange,
}

impl Operation {
    /// Run the operation in the current process
    pub fn apply(self, n: i64) -> Result<u64> {
        match self {
            Operation::Fib => workload::fib(n),
            Operation::SumRange => workload::sum_range(n),
        }
    }

    /// Wire name of the operation
    pub fn name(self) -> &'static str {
        match self {
            Operation::Fib => "fib",
            Operation::SumRange => "sum_range",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
