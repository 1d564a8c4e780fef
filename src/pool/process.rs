//! Process pool for CPU-bound work.
//!
//! Each batch starts up to `max_workers` child processes running the
//! `lab-worker` binary. Every child gets a driver thread in the parent that
//! pulls task descriptors from a shared channel, sends them over the child's
//! stdin and forwards the answer to the batch's completion channel. Children
//! share nothing with the parent except these pipes, so the work runs truly
//! in parallel and cannot touch the caller's memory.
//!
//! The batch returns only after every driver is joined and every child has
//! been reaped.

use crate::core::{
    error::panic_message, partition_successes, LabError, Operation, Result, TaskResult,
};
use crate::logging::{get_logger, Logger};
use crate::pool::protocol::{read_message, write_message, TaskRequest, TaskResponse};
use crossbeam::channel::{self, Receiver, Sender};
use std::env;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread;
use uuid::Uuid;

/// Environment variable naming the worker executable
pub const WORKER_ENV: &str = "LAB_WORKER_BIN";

/// File stem of the worker executable
pub const WORKER_BIN_NAME: &str = "lab-worker";

/// Configuration for [`ProcessPool`]
#[derive(Debug, Clone)]
pub struct ProcessPoolConfig {
    /// Maximum number of worker processes per batch
    pub max_workers: usize,
    /// Worker executable; discovered when `None`
    pub worker_program: Option<PathBuf>,
    /// Name prefix for the parent-side driver threads
    pub thread_name_prefix: String,
}

impl Default for ProcessPoolConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            worker_program: None,
            thread_name_prefix: "proc-driver".to_string(),
        }
    }
}

fn default_max_workers() -> usize {
    num_cpus::get().max(2)
}

impl ProcessPoolConfig {
    /// Create a configuration; 0 workers means the core count, minimum 2
    #[must_use]
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: if max_workers == 0 {
                default_max_workers()
            } else {
                max_workers
            },
            ..Default::default()
        }
    }

    /// Use an explicit worker executable
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_worker_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.worker_program = Some(program.into());
        self
    }

    /// Set the driver thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(LabError::invalid_config(
                "max_workers",
                "Number of worker processes must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Resolve the worker executable.
    ///
    /// Order: explicit program, then `LAB_WORKER_BIN`, then `lab-worker`
    /// next to the current executable or one directory up (test binaries
    /// live in `target/<profile>/deps`).
    pub fn resolve_worker_program(&self) -> Result<PathBuf> {
        if let Some(program) = &self.worker_program {
            return Ok(program.clone());
        }
        if let Some(program) = env::var_os(WORKER_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(program));
        }

        let exe = env::current_exe()?;
        let file_name = format!("{}{}", WORKER_BIN_NAME, env::consts::EXE_SUFFIX);
        let mut searched = Vec::new();
        let dirs = exe.parent().into_iter().chain(exe.parent().and_then(Path::parent));
        for dir in dirs {
            let candidate = dir.join(&file_name);
            if candidate.is_file() {
                return Ok(candidate);
            }
            searched.push(candidate.display().to_string());
        }
        Err(LabError::WorkerNotFound {
            searched: searched.join(", "),
        })
    }
}

/// Pool of isolated worker processes, spawned fresh for every batch.
#[derive(Debug)]
pub struct ProcessPool {
    config: ProcessPoolConfig,
    program: PathBuf,
    logger: Logger,
}

impl ProcessPool {
    /// Create a pool with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ProcessPoolConfig::default())
    }

    /// Create a pool with custom configuration
    pub fn with_config(config: ProcessPoolConfig) -> Result<Self> {
        config.validate()?;
        let program = config.resolve_worker_program()?;
        Ok(Self {
            config,
            program,
            logger: get_logger("process"),
        })
    }

    /// Maximum worker processes per batch
    pub fn max_workers(&self) -> usize {
        self.config.max_workers
    }

    /// Worker executable in use
    pub fn worker_program(&self) -> &Path {
        &self.program
    }

    /// Run `op` on every input across worker processes and collect results
    /// in completion order.
    ///
    /// Every input yields exactly one [`TaskResult`]. Task errors, worker
    /// crashes and tasks left over after all workers died are reported as
    /// failed results. Only failing to start the batch is an `Err`.
    pub fn map_completed(&self, op: Operation, inputs: &[i64]) -> Result<Vec<TaskResult<i64, u64>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let batch = Uuid::new_v4();
        let worker_count = self.config.max_workers.min(inputs.len());
        self.logger.info(format!(
            "batch={} op={} tasks={} workers={}",
            batch,
            op,
            inputs.len(),
            worker_count
        ));

        let (task_tx, task_rx) = channel::unbounded::<TaskRequest>();
        for (id, &input) in inputs.iter().enumerate() {
            task_tx
                .send(TaskRequest {
                    id: id as u64,
                    op,
                    input,
                })
                .map_err(|_| LabError::other("task channel closed"))?;
        }
        drop(task_tx);

        // Spawn every child before any driver starts pulling tasks, so a
        // spawn failure leaves no half-run batch behind.
        let mut workers = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            workers.push(ProcessWorker::spawn(id, &self.program)?);
        }

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_start(workers.len(), "process");

        let (result_tx, result_rx) = channel::unbounded();
        for worker in &mut workers {
            worker.start(
                &self.config.thread_name_prefix,
                task_rx.clone(),
                result_tx.clone(),
                self.logger.clone(),
            )?;
        }
        drop(result_tx);

        let mut results: Vec<TaskResult<i64, u64>> = result_rx.iter().collect();

        for worker in workers {
            let id = worker.id;
            match worker.reap() {
                Ok(status) if status.success() => {}
                Ok(status) => self
                    .logger
                    .warning(format!("batch={} worker={} exited with {}", batch, id, status)),
                Err(e) => self
                    .logger
                    .warning(format!("batch={} worker={} reap failed: {}", batch, id, e)),
            }
        }

        for orphan in task_rx.try_iter() {
            results.push(TaskResult::new(
                orphan.input,
                Err(LabError::task_failed(
                    orphan.input,
                    "no live worker process left to run it",
                )),
            ));
        }

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_shutdown(
            results.iter().filter(|r| r.is_ok()).count() as u64,
            results.iter().filter(|r| !r.is_ok()).count() as u64,
        );

        Ok(results)
    }
}

/// One child process plus the parent-side thread driving it
struct ProcessWorker {
    id: usize,
    child: Child,
    driver: Option<thread::JoinHandle<()>>,
}

impl ProcessWorker {
    fn spawn(id: usize, program: &Path) -> Result<Self> {
        let child = Command::new(program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                LabError::worker_process_io(id, format!("cannot start {}", program.display()), e)
            })?;
        Ok(Self {
            id,
            child,
            driver: None,
        })
    }

    fn start(
        &mut self,
        prefix: &str,
        tasks: Receiver<TaskRequest>,
        results: Sender<TaskResult<i64, u64>>,
        logger: Logger,
    ) -> Result<()> {
        let id = self.id;
        let stdin = self
            .child
            .stdin
            .take()
            .ok_or_else(|| LabError::worker_process(id, "stdin not captured"))?;
        let stdout = self
            .child
            .stdout
            .take()
            .ok_or_else(|| LabError::worker_process(id, "stdout not captured"))?;

        let driver = thread::Builder::new()
            .name(format!("{}-{}", prefix, id))
            .spawn(move || Self::drive(id, stdin, stdout, tasks, results, logger))
            .map_err(|e| LabError::spawn_with_source(id, "cannot start process driver", e))?;
        self.driver = Some(driver);
        Ok(())
    }

    /// Feed tasks to the child one at a time until the task channel is
    /// empty or the child stops answering.
    fn drive(
        id: usize,
        stdin: ChildStdin,
        stdout: ChildStdout,
        tasks: Receiver<TaskRequest>,
        results: Sender<TaskResult<i64, u64>>,
        logger: Logger,
    ) {
        let mut writer = BufWriter::new(stdin);
        let mut reader = BufReader::new(stdout);

        for request in tasks.iter() {
            let outcome = Self::round_trip(id, &mut writer, &mut reader, &request);
            let worker_lost = matches!(outcome, Err(LabError::WorkerProcess { .. }));
            if worker_lost {
                if let Err(e) = &outcome {
                    logger.error(format!("worker={} lost input={} err={}", id, request.input, e));
                }
            }
            let _ = results.send(TaskResult::new(request.input, outcome));
            if worker_lost {
                break;
            }
        }
        // Dropping the writer closes the child's stdin; it exits on EOF.
    }

    fn round_trip(
        id: usize,
        writer: &mut BufWriter<ChildStdin>,
        reader: &mut BufReader<ChildStdout>,
        request: &TaskRequest,
    ) -> Result<u64> {
        write_message(writer, request)
            .map_err(|e| LabError::worker_process(id, format!("send failed: {}", e)))?;

        let response: TaskResponse = read_message(reader)
            .map_err(|e| LabError::worker_process(id, format!("receive failed: {}", e)))?
            .ok_or_else(|| LabError::worker_process(id, "exited before answering"))?;

        if response.id != request.id {
            return Err(LabError::worker_process(
                id,
                format!("answered task {} while {} was pending", response.id, request.id),
            ));
        }
        response.into_result()
    }

    /// Join the driver and wait for the child to exit
    fn reap(mut self) -> Result<std::process::ExitStatus> {
        if let Some(driver) = self.driver.take() {
            driver
                .join()
                .map_err(|payload| LabError::join(self.id, panic_message(payload.as_ref())))?;
        }
        // Never started: close stdin so the child sees EOF.
        drop(self.child.stdin.take());
        Ok(self.child.wait()?)
    }
}

impl Drop for ProcessWorker {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
        if let Some(driver) = self.driver.take() {
            let _ = driver.join();
        }
    }
}

/// Compute `fib(n)` for every input on a process pool with the given config.
///
/// Returns `(n, fib(n))` pairs in completion order; failed tasks are logged
/// as `fib(<n>) generated an exception: <err>` and left out.
pub fn run_process_pool_with(config: ProcessPoolConfig, inputs: &[i64]) -> Result<Vec<(i64, u64)>> {
    let pool = ProcessPool::with_config(config)?;
    let results = pool.map_completed(Operation::Fib, inputs)?;
    let logger = get_logger("process");
    Ok(partition_successes(results, |n, e| {
        logger.error(format!("fib({}) generated an exception: {}", n, e));
    }))
}

/// [`run_process_pool_with`] using `max_workers` processes (default: core
/// count, minimum 2) and the discovered worker executable.
pub fn run_process_pool(inputs: &[i64], max_workers: Option<usize>) -> Result<Vec<(i64, u64)>> {
    run_process_pool_with(ProcessPoolConfig::new(max_workers.unwrap_or(0)), inputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ProcessPoolConfig::new(0);
        assert!(config.max_workers >= 2);
        assert_eq!(ProcessPoolConfig::new(3).max_workers, 3);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ProcessPoolConfig::new(2);
        config.max_workers = 0;
        assert!(matches!(
            config.validate(),
            Err(LabError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_explicit_program_wins() {
        let config = ProcessPoolConfig::new(2).with_worker_program("/opt/lab/worker");
        assert_eq!(
            config.resolve_worker_program().unwrap(),
            PathBuf::from("/opt/lab/worker")
        );
    }

    #[test]
    fn test_missing_program_fails_to_spawn() {
        let config =
            ProcessPoolConfig::new(2).with_worker_program("/nonexistent/concurrency-lab-worker");
        let pool = ProcessPool::with_config(config).unwrap();
        let result = pool.map_completed(Operation::Fib, &[1, 2]);
        assert!(matches!(result, Err(LabError::WorkerProcess { .. })));
    }

    #[test]
    fn test_empty_batch_spawns_nothing() {
        let config =
            ProcessPoolConfig::new(2).with_worker_program("/nonexistent/concurrency-lab-worker");
        let pool = ProcessPool::with_config(config).unwrap();
        assert!(pool.map_completed(Operation::Fib, &[]).unwrap().is_empty());
    }
}
