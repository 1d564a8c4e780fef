//! Convenient re-exports for common types and functions

pub use crate::core::{Job, LabError, Operation, Result, TaskResult};
pub use crate::counter::{safe_increment, unsafe_increment};
pub use crate::handoff::{producer_consumer, HandoffQueue, Message};
pub use crate::logging::get_logger;
pub use crate::pool::{
    parallel_sleep, run_process_pool, ProcessPool, ProcessPoolConfig, ThreadPool,
    ThreadPoolConfig,
};
pub use crate::timing::{timer, Timer};
pub use crate::workload::{fib, safe_fib, sum_range};
