//! Bounded thread pool for I/O-style fan-out

use crate::core::{BoxedJob, ClosureJob, Job, LabError, ReportingJob, Result, TaskResult};
use crate::logging::get_logger;
use crate::pool::worker::{Worker, WorkerStats};
use crossbeam::channel::{self, Sender};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Configuration for thread pool
#[derive(Debug, Clone)]
pub struct ThreadPoolConfig {
    /// Number of worker threads (0 = number of CPUs)
    pub num_threads: usize,
    /// Thread name prefix
    pub thread_name_prefix: String,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            thread_name_prefix: "worker".to_string(),
        }
    }
}

impl ThreadPoolConfig {
    /// Create a new configuration with specified number of threads
    #[must_use]
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads: if num_threads == 0 {
                num_cpus::get()
            } else {
                num_threads
            },
            ..Default::default()
        }
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.num_threads == 0 {
            return Err(LabError::invalid_config(
                "num_threads",
                "Number of threads must be greater than 0",
            ));
        }
        if self.thread_name_prefix.is_empty() {
            return Err(LabError::invalid_config(
                "thread_name_prefix",
                "Thread name prefix must not be empty",
            ));
        }
        Ok(())
    }
}

/// A fixed-size pool of worker threads sharing one FIFO job channel.
///
/// # Shutdown Mechanism
///
/// Shutdown drops the pool's sending half of the channel. Workers keep
/// draining until the channel is empty and then exit, so every job accepted
/// before shutdown still runs.
pub struct ThreadPool {
    config: ThreadPoolConfig,
    workers: RwLock<Vec<Worker>>,
    sender: RwLock<Option<Sender<BoxedJob>>>,
    running: AtomicBool,
    total_jobs_submitted: AtomicU64,
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPool")
            .field("config", &self.config)
            .field("running", &self.running.load(Ordering::Relaxed))
            .field(
                "total_jobs_submitted",
                &self.total_jobs_submitted.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl ThreadPool {
    /// Create a new thread pool with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ThreadPoolConfig::default())
    }

    /// Create a thread pool with specified number of threads
    pub fn with_threads(num_threads: usize) -> Result<Self> {
        Self::with_config(ThreadPoolConfig::new(num_threads))
    }

    /// Create a thread pool with custom configuration
    pub fn with_config(config: ThreadPoolConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            workers: RwLock::new(Vec::new()),
            sender: RwLock::new(None),
            running: AtomicBool::new(false),
            total_jobs_submitted: AtomicU64::new(0),
        })
    }

    /// Start the worker threads.
    ///
    /// A stopped pool can be started again; it gets fresh workers and a
    /// fresh channel.
    pub fn start(&self) -> Result<()> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(LabError::already_running(
                &self.config.thread_name_prefix,
                self.config.num_threads,
            ));
        }

        let (sender, receiver) = channel::unbounded::<BoxedJob>();
        let logger = get_logger("threading");

        let mut workers = Vec::with_capacity(self.config.num_threads);
        for id in 0..self.config.num_threads {
            match Worker::new(
                id,
                &self.config.thread_name_prefix,
                receiver.clone(),
                logger.clone(),
            ) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    // Workers already spawned exit once the sender drops.
                    drop(sender);
                    drop(workers);
                    self.running.store(false, Ordering::Release);
                    return Err(e);
                }
            }
        }

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_start(workers.len(), "thread");

        *self.workers.write() = workers;
        *self.sender.write() = Some(sender);
        Ok(())
    }

    /// Submit a job to the pool
    pub fn submit<J: Job + 'static>(&self, job: J) -> Result<()> {
        if !self.running.load(Ordering::Acquire) {
            return Err(LabError::not_running(&self.config.thread_name_prefix));
        }

        let sender_guard = self.sender.read();
        let sender = sender_guard
            .as_ref()
            .ok_or_else(|| LabError::not_running(&self.config.thread_name_prefix))?;

        sender
            .send(Box::new(job))
            .map_err(|_| LabError::ShuttingDown)?;

        self.total_jobs_submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Submit a closure as a job
    pub fn execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.submit(ClosureJob::new(f))
    }

    /// Submit `f(&input)`; its [`TaskResult`] is sent on `results` when it
    /// finishes, in completion order.
    pub fn execute_to<I, T, F>(
        &self,
        results: &Sender<TaskResult<I, T>>,
        input: I,
        f: F,
    ) -> Result<()>
    where
        I: fmt::Debug + Send + 'static,
        T: Send + 'static,
        F: FnOnce(&I) -> Result<T> + Send + 'static,
    {
        self.submit(ReportingJob::new(input, f, results.clone()))
    }

    /// Apply `f` to every input on the pool and collect the results as they
    /// complete.
    ///
    /// Every input yields exactly one [`TaskResult`]; failures and panics
    /// are reported in the result, never propagated.
    pub fn map_completed<I, T, F>(
        &self,
        inputs: impl IntoIterator<Item = I>,
        f: F,
    ) -> Result<Vec<TaskResult<I, T>>>
    where
        I: fmt::Debug + Send + 'static,
        T: Send + 'static,
        F: Fn(&I) -> Result<T> + Send + Sync + 'static,
    {
        let (tx, rx) = channel::unbounded();
        let f = Arc::new(f);
        for input in inputs {
            let f = Arc::clone(&f);
            self.execute_to(&tx, input, move |i: &I| (*f)(i))?;
        }
        drop(tx);

        // Ends once every job has run and dropped its sender clone.
        Ok(rx.iter().collect())
    }

    /// Get the number of worker threads
    pub fn num_threads(&self) -> usize {
        self.config.num_threads
    }

    /// Check if the pool is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Get total number of jobs submitted
    pub fn total_jobs_submitted(&self) -> u64 {
        self.total_jobs_submitted.load(Ordering::Relaxed)
    }

    /// Jobs waiting in the channel (approximate)
    pub fn queue_size(&self) -> usize {
        self.sender.read().as_ref().map(|s| s.len()).unwrap_or(0)
    }

    /// Get statistics for all workers
    pub fn get_stats(&self) -> Vec<Arc<WorkerStats>> {
        self.workers.read().iter().map(|w| w.stats()).collect()
    }

    /// Get total jobs processed across all workers
    pub fn total_jobs_processed(&self) -> u64 {
        self.get_stats().iter().map(|s| s.get_jobs_processed()).sum()
    }

    /// Get total jobs failed across all workers
    pub fn total_jobs_failed(&self) -> u64 {
        self.get_stats().iter().map(|s| s.get_jobs_failed()).sum()
    }

    /// Get total jobs panicked across all workers
    pub fn total_jobs_panicked(&self) -> u64 {
        self.get_stats().iter().map(|s| s.get_jobs_panicked()).sum()
    }

    /// Stop accepting jobs, let workers drain the queue, and join them all.
    pub fn shutdown(&self) -> Result<()> {
        if self
            .running
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        // Dropping the only sender disconnects the channel once it is empty.
        self.sender.write().take();

        #[cfg(feature = "tracing")]
        let (processed, failed) = (self.total_jobs_processed(), self.total_jobs_failed());

        let workers = std::mem::take(&mut *self.workers.write());
        let mut first_error = None;
        for worker in workers {
            if let Err(e) = worker.join() {
                first_error.get_or_insert(e);
            }
        }

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_shutdown(processed, failed);

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        if self.running.load(Ordering::Acquire) {
            if let Err(e) = self.shutdown() {
                eprintln!(
                    "[THREAD_POOL ERROR] Failed to shutdown thread pool '{}' during drop: {}",
                    self.config.thread_name_prefix, e
                );
            }
        }
    }
}
