//! Worker pools: threads for I/O fan-out, processes for CPU work

pub mod io;
pub mod process;
pub mod protocol;
pub mod thread_pool;
pub mod worker;

pub use io::parallel_sleep;
pub use process::{
    run_process_pool, run_process_pool_with, ProcessPool, ProcessPoolConfig, WORKER_ENV,
};
pub use thread_pool::{ThreadPool, ThreadPoolConfig};
pub use worker::{Worker, WorkerStats};
