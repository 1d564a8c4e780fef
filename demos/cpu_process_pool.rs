//! CPU process pool example
//!
//! Computes Fibonacci numbers on isolated `lab-worker` processes and
//! compares the wall time with a serial run. Build the worker first
//! (`cargo build --bin lab-worker`) or point `LAB_WORKER_BIN` at it.
//!
//! Tunables: `LAB_TASKS`, `LAB_FIB_N`, `LAB_MAX_WORKERS`, `LOG_LEVEL`.
//!
//! Run with: cargo run --release --example cpu_process_pool

use concurrency_lab::config::LabSettings;
use concurrency_lab::logging;
use concurrency_lab::prelude::*;

fn main() -> Result<()> {
    logging::init();
    let settings = LabSettings::from_env();
    let workers = settings.effective_max_workers();
    let inputs: Vec<i64> = vec![settings.fib_n; settings.tasks];

    println!(
        "=== {} x fib({}) on {} worker processes ===",
        inputs.len(),
        settings.fib_n,
        workers
    );

    let serial = timer(Some("cpu serial"), || -> Result<Vec<u64>> {
        inputs.iter().map(|&n| fib(n)).collect()
    })?;

    let mut parallel = timer(Some("cpu processes"), || {
        run_process_pool(&inputs, Some(workers))
    })?;
    parallel.sort_unstable();

    for (n, value) in &parallel {
        println!("  fib({}) = {}", n, value);
    }

    let failed = inputs.len() - parallel.len();
    if failed > 0 {
        println!("  {} task(s) failed; see log output", failed);
    }
    assert!(parallel.iter().all(|(_, v)| serial.contains(v)));

    Ok(())
}
