//! I/O-bound fan-out on the thread pool

use crate::core::{partition_successes, Result};
use crate::logging::get_logger;
use crate::pool::thread_pool::{ThreadPool, ThreadPoolConfig};
use std::thread;
use std::time::{Duration, Instant};

/// Run `worker_count` sleeps of `per_task` on a pool of `worker_count`
/// threads and report each task's own elapsed time.
///
/// Results come back in completion order as `(task index, elapsed)`.
/// Failed tasks are logged and left out. Because the sleeps overlap, every
/// reading stays close to `per_task` rather than growing towards
/// `worker_count * per_task`.
pub fn parallel_sleep(worker_count: usize, per_task: Duration) -> Result<Vec<(usize, Duration)>> {
    if worker_count == 0 {
        return Ok(Vec::new());
    }

    let pool = ThreadPool::with_config(
        ThreadPoolConfig::new(worker_count).with_thread_name_prefix("sleeper"),
    )?;
    pool.start()?;

    let results = pool.map_completed(0..worker_count, move |_: &usize| {
        let start = Instant::now();
        thread::sleep(per_task);
        Ok(start.elapsed())
    });
    pool.shutdown()?;

    let logger = get_logger("threading");
    Ok(partition_successes(results?, |index, e| {
        logger.error(format!("parallel_sleep_error task={} err={}", index, e));
    }))
}
