//! Job trait and the job shapes the pools run

use crate::core::error::{panic_message, LabError, Result};
use crate::core::task::TaskResult;
use crossbeam::channel::Sender;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// A unit of work executed once by a pool worker
pub trait Job: Send {
    /// Execute the job, consuming it
    ///
    /// # Errors
    ///
    /// Returns an error if the job execution fails
    fn execute(self: Box<Self>) -> Result<()>;

    /// Get the job's type name for debugging and statistics
    fn job_type(&self) -> &str {
        "Job"
    }
}

impl fmt::Debug for dyn Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job({})", self.job_type())
    }
}

/// A boxed job that can be sent across threads
pub type BoxedJob = Box<dyn Job>;

/// Fire-and-forget job built from a closure
pub struct ClosureJob<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    closure: F,
    name: String,
}

impl<F> ClosureJob<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    /// Create a new closure job
    pub fn new(closure: F) -> Self {
        Self::with_name(closure, "ClosureJob")
    }

    /// Create a new closure job with a custom name
    pub fn with_name<S: Into<String>>(closure: F, name: S) -> Self {
        Self {
            closure,
            name: name.into(),
        }
    }
}

impl<F> Job for ClosureJob<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    fn execute(self: Box<Self>) -> Result<()> {
        (self.closure)()
    }

    fn job_type(&self) -> &str {
        &self.name
    }
}

/// Job that applies a function to one input and reports the outcome on a
/// completion channel.
///
/// Panics in the function are caught and reported as
/// [`LabError::TaskPanicked`], so the collecting side always hears back
/// from every job that ran.
pub struct ReportingJob<I, T, F>
where
    F: FnOnce(&I) -> Result<T> + Send,
{
    input: I,
    task: F,
    results: Sender<TaskResult<I, T>>,
}

impl<I, T, F> ReportingJob<I, T, F>
where
    I: fmt::Debug + Send,
    T: Send,
    F: FnOnce(&I) -> Result<T> + Send,
{
    /// Create a job reporting to `results`
    pub fn new(input: I, task: F, results: Sender<TaskResult<I, T>>) -> Self {
        Self {
            input,
            task,
            results,
        }
    }
}

impl<I, T, F> Job for ReportingJob<I, T, F>
where
    I: fmt::Debug + Send,
    T: Send,
    F: FnOnce(&I) -> Result<T> + Send,
{
    fn execute(self: Box<Self>) -> Result<()> {
        let ReportingJob {
            input,
            task,
            results,
        } = *self;

        let outcome = match catch_unwind(AssertUnwindSafe(|| task(&input))) {
            Ok(outcome) => outcome,
            Err(payload) => Err(LabError::task_panicked(
                &input,
                panic_message(payload.as_ref()),
            )),
        };
        // Mirror the outcome for the worker's stats; a panic stays a panic.
        let status = match &outcome {
            Ok(_) => Ok(()),
            Err(LabError::TaskPanicked { input, message }) => Err(LabError::TaskPanicked {
                input: input.clone(),
                message: message.clone(),
            }),
            Err(e) => Err(LabError::task_failed(&input, e.kind())),
        };

        // The collector may have given up; nothing left to report to then.
        let _ = results.send(TaskResult::new(input, outcome));
        status
    }

    fn job_type(&self) -> &str {
        "ReportingJob"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel;

    #[test]
    fn test_closure_job() {
        let job: BoxedJob = Box::new(ClosureJob::new(|| Ok(())));
        assert_eq!(job.job_type(), "ClosureJob");
        assert!(job.execute().is_ok());
    }

    #[test]
    fn test_closure_job_with_name() {
        let job = ClosureJob::with_name(|| Ok(()), "TestJob");
        assert_eq!(job.job_type(), "TestJob");
    }

    #[test]
    fn test_reporting_job_sends_result() {
        let (tx, rx) = channel::unbounded();
        let job: BoxedJob = Box::new(ReportingJob::new(21u64, |n: &u64| Ok(n * 2), tx));
        job.execute().expect("job should succeed");

        let result = rx.recv().unwrap();
        assert_eq!(result.input, 21);
        assert_eq!(result.outcome.unwrap(), 42);
    }

    #[test]
    fn test_reporting_job_failure_status() {
        let (tx, rx) = channel::unbounded();
        let job: BoxedJob = Box::new(ReportingJob::new(-1i64, |n: &i64| crate::workload::fib(*n), tx));
        match job.execute() {
            Err(LabError::TaskFailed { message, .. }) => assert_eq!(message, "NegativeInput"),
            other => panic!("expected TaskFailed, got {:?}", other),
        }
        assert!(matches!(
            rx.recv().unwrap().outcome,
            Err(LabError::NegativeInput { .. })
        ));
    }

    #[test]
    fn test_reporting_job_catches_panic() {
        let (tx, rx) = channel::unbounded::<TaskResult<u64, u64>>();
        let job: BoxedJob = Box::new(ReportingJob::new(
            3u64,
            |_: &u64| -> Result<u64> { panic!("bad input") },
            tx,
        ));
        assert!(matches!(job.execute(), Err(LabError::TaskPanicked { .. })));

        let result = rx.recv().unwrap();
        assert_eq!(result.input, 3);
        match result.outcome {
            Err(LabError::TaskPanicked { message, .. }) => assert_eq!(message, "bad input"),
            other => panic!("expected TaskPanicked, got {:?}", other),
        }
    }
}
