//! # Concurrency Lab
//!
//! Small, reproducible demonstrations of core concurrency phenomena.
//!
//! ## Features
//!
//! - **Races**: [`counter::unsafe_increment`] loses updates on a shared integer
//! - **Locks**: [`counter::safe_increment`] serializes the same work behind a mutex
//! - **Handoff**: [`handoff::producer_consumer`] passes items over a blocking FIFO
//!   terminated by an explicit sentinel
//! - **Thread pool**: [`pool::parallel_sleep`] overlaps blocking waits on a fixed
//!   set of worker threads
//! - **Process pool**: [`pool::run_process_pool`] spreads CPU work across isolated
//!   worker processes
//! - **Support**: environment [`config`], key-value [`logging`], scoped
//!   [`timing`] and the CPU [`workload`] functions
//!
//! ## Quick Start
//!
//! ```rust
//! use concurrency_lab::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> Result<()> {
//! assert_eq!(safe_increment(4, 10_000)?, 40_000);
//!
//! let mut doubled = producer_consumer(5)?;
//! doubled.sort_unstable();
//! assert_eq!(doubled, vec![0, 2, 4, 6, 8]);
//!
//! let sleeps = parallel_sleep(4, Duration::from_millis(50))?;
//! assert_eq!(sleeps.len(), 4);
//! # Ok(())
//! # }
//! ```
//!
//! ## Threads vs processes
//!
//! Rust threads have no global interpreter lock, so CPU-bound work already
//! runs in parallel on a [`ThreadPool`]. The [`ProcessPool`] exists to show
//! the other isolation model: workers with their own address space that
//! receive only a serializable task descriptor. Its children run the
//! `lab-worker` binary built from this crate.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod counter;
pub mod handoff;
pub mod io_tasks;
pub mod logging;
pub mod pool;
pub mod prelude;
pub mod timing;
#[cfg(feature = "tracing")]
pub mod tracing;
pub mod workload;

pub use crate::core::{Job, LabError, Operation, Result, TaskResult};
pub use pool::{ProcessPool, ProcessPoolConfig, ThreadPool, ThreadPoolConfig, WorkerStats};
