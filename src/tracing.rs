//! Tracing integration for pool observability.
//!
//! With the `tracing` feature enabled, pool workers run inside a `worker`
//! span and the functions in [`metrics`] emit events that a subscriber can
//! turn into counters and histograms.
//!
//! ```rust,ignore
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::new("concurrency_lab=trace"))
//!     .init();
//!
//! let durations = concurrency_lab::pool::parallel_sleep(4, std::time::Duration::from_millis(50))?;
//! ```

/// Metrics recording functions for observability.
pub mod metrics {
    use std::time::Duration;

    /// Records job completion with timing.
    #[inline]
    pub fn record_completion(duration: Duration, success: bool) {
        let duration_ms = duration.as_millis() as u64;
        if success {
            tracing::trace!(
                counter.jobs_completed = 1,
                histogram.job_duration_ms = duration_ms,
                "job completed successfully"
            );
        } else {
            tracing::trace!(
                counter.jobs_failed = 1,
                histogram.job_duration_ms = duration_ms,
                "job failed"
            );
        }
    }

    /// Records a job panic event.
    #[inline]
    pub fn record_panic(duration: Duration) {
        tracing::trace!(
            counter.jobs_panicked = 1,
            histogram.job_duration_ms = duration.as_millis() as u64,
            "job panicked"
        );
    }

    /// Records pool startup; `kind` is `thread` or `process`.
    #[inline]
    pub fn record_pool_start(num_workers: usize, kind: &str) {
        tracing::info!(workers = num_workers, kind = kind, "pool started");
    }

    /// Records pool shutdown.
    #[inline]
    pub fn record_pool_shutdown(jobs_processed: u64, jobs_failed: u64) {
        tracing::info!(
            jobs_processed = jobs_processed,
            jobs_failed = jobs_failed,
            "pool shutdown complete"
        );
    }
}
