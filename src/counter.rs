//! Shared counter demos: lost updates without a lock, exact counts with one.
//!
//! Both demos spawn `worker_count` threads that each bump one shared integer
//! `loops_per_worker` times, then join them all and read the total.
//!
//! ```rust
//! use concurrency_lab::counter::{safe_increment, unsafe_increment};
//!
//! # fn main() -> concurrency_lab::Result<()> {
//! let right = safe_increment(4, 10_000)?;
//! let wrong = unsafe_increment(4, 10_000)?;
//! assert_eq!(right, 40_000);
//! assert!(wrong <= right);
//! # Ok(())
//! # }
//! ```

use crate::core::{error::panic_message, LabError, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

/// Counter shared by the workers of one demo run without any guard.
///
/// Reads and writes are separate steps, so an increment is a plain
/// read-modify-write that other workers can interleave with. The cell is
/// atomic only so that each individual load or store is well defined;
/// there is deliberately no fused `fetch_add`.
#[derive(Debug, Default)]
pub struct RacyCounter {
    value: AtomicU64,
}

impl RacyCounter {
    /// New counter at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the current value
    pub fn read(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Overwrite the value
    pub fn write(&self, value: u64) {
        self.value.store(value, Ordering::Relaxed);
    }

    /// Read, optionally yield to the scheduler, write back `read + 1`
    pub fn increment(&self, yield_between: bool) {
        let tmp = self.read();
        if yield_between {
            thread::yield_now();
        }
        self.write(tmp + 1);
    }
}

/// Counter whose every increment runs under one mutex.
#[derive(Debug, Default)]
pub struct LockedCounter {
    value: Mutex<u64>,
}

impl LockedCounter {
    /// New counter at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment while holding the lock
    pub fn increment(&self) {
        let mut guard = self.value.lock();
        *guard += 1;
    }

    /// Read the current value
    pub fn get(&self) -> u64 {
        *self.value.lock()
    }
}

/// Increment a shared counter from `worker_count` threads with no lock.
///
/// Yields between the read and the write to widen the race window. The
/// result is non-deterministic and usually below
/// `worker_count * loops_per_worker`.
pub fn unsafe_increment(worker_count: usize, loops_per_worker: u64) -> Result<u64> {
    unsafe_increment_with(worker_count, loops_per_worker, true)
}

/// [`unsafe_increment`] with the yield between read and write made optional
pub fn unsafe_increment_with(
    worker_count: usize,
    loops_per_worker: u64,
    yield_between: bool,
) -> Result<u64> {
    let counter = Arc::new(RacyCounter::new());
    run_workers("racy", worker_count, {
        let counter = Arc::clone(&counter);
        move || {
            for _ in 0..loops_per_worker {
                counter.increment(yield_between);
            }
        }
    })?;
    Ok(counter.read())
}

/// Increment a shared counter from `worker_count` threads under a mutex.
///
/// Always returns exactly `worker_count * loops_per_worker`.
pub fn safe_increment(worker_count: usize, loops_per_worker: u64) -> Result<u64> {
    let counter = Arc::new(LockedCounter::new());
    run_workers("locked", worker_count, {
        let counter = Arc::clone(&counter);
        move || {
            for _ in 0..loops_per_worker {
                counter.increment();
            }
        }
    })?;
    Ok(counter.get())
}

/// Start `worker_count` named threads running `body` and join them all.
fn run_workers<F>(prefix: &str, worker_count: usize, body: F) -> Result<()>
where
    F: Fn() + Clone + Send + 'static,
{
    run_workers_with(prefix, worker_count, body, spawn_worker)
}

fn run_workers_with<F, S>(prefix: &str, worker_count: usize, body: F, mut spawn: S) -> Result<()>
where
    F: Fn() + Clone + Send + 'static,
    S: FnMut(&str, usize, F) -> Result<thread::JoinHandle<()>>,
{
    let mut handles = Vec::with_capacity(worker_count);
    let mut spawn_error = None;
    for id in 0..worker_count {
        match spawn(prefix, id, body.clone()) {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                spawn_error = Some(e);
                break;
            }
        }
    }

    // Join whatever started, even when a later spawn failed.
    let mut first_error = spawn_error;
    for (id, handle) in handles.into_iter().enumerate() {
        if let Err(payload) = handle.join() {
            first_error.get_or_insert_with(|| LabError::join(id, panic_message(payload.as_ref())));
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn spawn_worker<F>(prefix: &str, id: usize, body: F) -> Result<thread::JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(format!("{}-counter-{}", prefix, id))
        .spawn(body)
        .map_err(|e| LabError::spawn_with_source(id, "cannot start counter worker", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_racy_counter_single_thread_is_exact() {
        let counter = RacyCounter::new();
        for _ in 0..100 {
            counter.increment(true);
        }
        assert_eq!(counter.read(), 100);
    }

    #[test]
    fn test_unsafe_increment_single_worker_is_exact() {
        assert_eq!(unsafe_increment(1, 1_000).unwrap(), 1_000);
    }

    #[test]
    fn test_unsafe_increment_never_exceeds_total() {
        let total = unsafe_increment_with(4, 5_000, false).unwrap();
        assert!(total <= 20_000);
        assert!(total > 0);
    }

    #[test]
    fn test_safe_increment_is_exact() {
        assert_eq!(safe_increment(4, 10_000).unwrap(), 40_000);
    }

    #[test]
    fn test_spawn_failure_joins_started_workers() {
        let finished = Arc::new(AtomicU64::new(0));
        let body = {
            let finished = Arc::clone(&finished);
            move || {
                thread::sleep(std::time::Duration::from_millis(50));
                finished.fetch_add(1, Ordering::SeqCst);
            }
        };

        let result = run_workers_with("flaky", 4, body, |prefix, id, body| {
            if id == 2 {
                let e = std::io::Error::new(std::io::ErrorKind::Other, "no more threads");
                return Err(LabError::spawn_with_source(id, "cannot start counter worker", e));
            }
            spawn_worker(prefix, id, body)
        });

        assert!(matches!(result, Err(LabError::SpawnError { thread_id: 2, .. })));
        // Workers 0 and 1 were joined before the error came back.
        assert_eq!(finished.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_zero_workers() {
        assert_eq!(safe_increment(0, 10).unwrap(), 0);
        assert_eq!(unsafe_increment(0, 10).unwrap(), 0);
    }
}
