//! I/O vs CPU timing harness
//!
//! Runs the same batch of simulated waits and Fibonacci computations
//! serially, on a thread pool and (for CPU work) on worker processes,
//! printing one timing line per scenario. Waits overlap on threads; CPU
//! work also speeds up on threads because Rust threads run in parallel on
//! every core, with processes paying extra for spawn and serialization.
//!
//! Tunables: `LAB_TASKS`, `LAB_IO_DURATION_S`, `LAB_FIB_N`,
//! `LAB_MAX_WORKERS`, `LAB_UNSAFE_YIELD`, `LOG_LEVEL`. The process scenario
//! needs the `lab-worker` binary (`cargo build --bin lab-worker` or
//! `LAB_WORKER_BIN`).
//!
//! Run with: cargo run --release --example io_vs_cpu_timing

use concurrency_lab::config::LabSettings;
use concurrency_lab::core::Operation;
use concurrency_lab::counter::unsafe_increment_with;
use concurrency_lab::io_tasks::{pretend_io, serial_pretend_io};
use concurrency_lab::logging;
use concurrency_lab::prelude::*;

const COUNTER_WORKERS: usize = 4;
const COUNTER_LOOPS: u64 = 10_000;

fn main() -> Result<()> {
    logging::init();
    let settings = LabSettings::from_env();
    let log = get_logger("harness");
    log.info(format!("settings={}", serde_json::to_string(&settings)?));

    let tasks = settings.tasks;
    let delay = settings.io_duration;
    let n = settings.fib_n;

    println!("=== Shared counter: {} x {} ===", COUNTER_WORKERS, COUNTER_LOOPS);
    let expected = COUNTER_WORKERS as u64 * COUNTER_LOOPS;
    let racy = unsafe_increment_with(COUNTER_WORKERS, COUNTER_LOOPS, settings.unsafe_yield)?;
    let locked = safe_increment(COUNTER_WORKERS, COUNTER_LOOPS)?;
    println!("  unsafe: {} (expected {}, lost {})", racy, expected, expected - racy);
    println!("  safe:   {}", locked);

    println!("\n=== I/O-bound: {} waits of {:?} ===", tasks, delay);

    timer(Some("io serial"), || -> Result<()> {
        serial_pretend_io(tasks, delay);
        Ok(())
    })?;

    timer(Some("io threaded"), || -> Result<()> {
        let pool = ThreadPool::with_config(
            ThreadPoolConfig::new(tasks.max(1)).with_thread_name_prefix("io"),
        )?;
        pool.start()?;
        let results = pool.map_completed(0..tasks, move |_: &usize| Ok(pretend_io(delay)));
        pool.shutdown()?;
        log.debug(format!("io threaded completed={}", results?.len()));
        Ok(())
    })?;

    println!("\n=== CPU-bound: {} x fib({}) ===", tasks, n);

    timer(Some("cpu serial"), || -> Result<()> {
        for _ in 0..tasks {
            fib(n)?;
        }
        Ok(())
    })?;

    timer(Some("cpu threaded"), || -> Result<()> {
        let pool = ThreadPool::with_threads(tasks.max(1))?;
        pool.start()?;
        let results = pool.map_completed(vec![n; tasks], |n: &i64| Operation::Fib.apply(*n));
        pool.shutdown()?;
        for result in results? {
            result.outcome?;
        }
        Ok(())
    })?;

    let inputs = vec![n; tasks];
    let processes = timer(Some("cpu processes"), || {
        run_process_pool(&inputs, Some(settings.effective_max_workers()))
    });
    if let Err(e) = processes {
        log.warning(format!("process scenario skipped err={}", e));
    }

    Ok(())
}
