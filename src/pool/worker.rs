//! Worker thread implementation

use crate::core::{error::panic_message, BoxedJob, LabError, Result};
use crate::logging::Logger;
use crossbeam::channel::Receiver;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::{debug, span, Level};

/// Statistics for a worker thread
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Total number of jobs that completed successfully
    pub jobs_processed: AtomicU64,
    /// Total number of jobs that returned an error
    pub jobs_failed: AtomicU64,
    /// Total number of jobs that panicked
    pub jobs_panicked: AtomicU64,
    /// Total time spent processing jobs (microseconds)
    pub total_processing_time_us: AtomicU64,
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, outcome: JobOutcome, elapsed_us: u64) {
        let counter = match outcome {
            JobOutcome::Completed => &self.jobs_processed,
            JobOutcome::Failed => &self.jobs_failed,
            JobOutcome::Panicked => &self.jobs_panicked,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.total_processing_time_us
            .fetch_add(elapsed_us, Ordering::Relaxed);
    }

    /// Get total jobs processed
    pub fn get_jobs_processed(&self) -> u64 {
        self.jobs_processed.load(Ordering::Relaxed)
    }

    /// Get total jobs failed
    pub fn get_jobs_failed(&self) -> u64 {
        self.jobs_failed.load(Ordering::Relaxed)
    }

    /// Get total jobs panicked
    pub fn get_jobs_panicked(&self) -> u64 {
        self.jobs_panicked.load(Ordering::Relaxed)
    }

    /// Average time per job, whatever its outcome, in microseconds
    pub fn get_average_processing_time_us(&self) -> f64 {
        let total = self.total_processing_time_us.load(Ordering::Relaxed);
        let count = self.get_jobs_processed() + self.get_jobs_failed() + self.get_jobs_panicked();
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum JobOutcome {
    Completed,
    Failed,
    Panicked,
}

/// A worker thread draining jobs from the pool's channel
#[derive(Debug)]
pub struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a worker named `<prefix>-<id>`.
    ///
    /// The worker exits once every sender of `jobs` is gone and the channel
    /// is empty, so dropping the pool's sender drains the queue first.
    pub fn new(
        id: usize,
        prefix: &str,
        jobs: Receiver<BoxedJob>,
        logger: Logger,
    ) -> Result<Self> {
        let stats = Arc::new(WorkerStats::new());
        let stats_clone = Arc::clone(&stats);

        let thread = thread::Builder::new()
            .name(format!("{}-{}", prefix, id))
            .spawn(move || Self::run(id, jobs, stats_clone, logger))
            .map_err(|e| LabError::spawn_with_source(id, "cannot start pool worker", e))?;

        Ok(Self {
            id,
            thread: Some(thread),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Join the worker thread
    pub fn join(mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|payload| LabError::join(self.id, panic_message(payload.as_ref())))?;
        }
        Ok(())
    }

    fn run(id: usize, jobs: Receiver<BoxedJob>, stats: Arc<WorkerStats>, logger: Logger) {
        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", id = id);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        for job in jobs.iter() {
            Self::execute_job(id, job, &stats, &logger);
        }

        #[cfg(feature = "tracing")]
        debug!(
            jobs_processed = stats.get_jobs_processed(),
            jobs_failed = stats.get_jobs_failed(),
            "worker shutting down"
        );
    }

    /// Execute a single job with panic protection
    fn execute_job(id: usize, job: BoxedJob, stats: &WorkerStats, logger: &Logger) {
        let job_type = job.job_type().to_string();
        let start = Instant::now();

        let outcome = match catch_unwind(AssertUnwindSafe(move || job.execute())) {
            Ok(Ok(())) => JobOutcome::Completed,
            // Caught inside the job itself, e.g. by a reporting job.
            Ok(Err(LabError::TaskPanicked { input, message })) => {
                logger.error(format!(
                    "worker={} job={} panicked input={} msg={}",
                    id, job_type, input, message
                ));
                JobOutcome::Panicked
            }
            Ok(Err(e)) => {
                logger.debug(format!(
                    "worker={} job={} failed err={}",
                    id,
                    job_type,
                    e.kind()
                ));
                JobOutcome::Failed
            }
            Err(payload) => {
                logger.error(format!(
                    "worker={} job={} panicked msg={}",
                    id,
                    job_type,
                    panic_message(payload.as_ref())
                ));
                JobOutcome::Panicked
            }
        };

        let elapsed = start.elapsed();

        #[cfg(feature = "tracing")]
        match outcome {
            JobOutcome::Panicked => crate::tracing::metrics::record_panic(elapsed),
            JobOutcome::Completed => crate::tracing::metrics::record_completion(elapsed, true),
            JobOutcome::Failed => crate::tracing::metrics::record_completion(elapsed, false),
        }

        stats.record(outcome, elapsed.as_micros() as u64);
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            if let Err(payload) = thread.join() {
                eprintln!(
                    "[WORKER ERROR] Worker {} panicked during shutdown: {}",
                    self.id,
                    panic_message(payload.as_ref())
                );
            }
        }
    }
}
