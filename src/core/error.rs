//! Error types for the lab

/// Result type for lab operations
pub type Result<T> = std::result::Result<T, LabError>;

/// Errors that can occur while running a demo or a pool batch
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LabError {
    /// A workload received an input outside its domain
    #[error("{operation}: n must be >= 0 (got {value})")]
    NegativeInput {
        /// Name of the rejecting operation
        operation: &'static str,
        /// The rejected input
        value: i64,
    },

    /// Arithmetic result does not fit the output type
    #[error("{operation}({value}) overflows u64")]
    Overflow {
        /// Name of the operation
        operation: &'static str,
        /// The input that overflowed
        value: i64,
    },

    /// Pool is not running
    #[error("Pool '{pool_name}' is not running")]
    NotRunning {
        /// Name of the pool
        pool_name: String,
    },

    /// Pool is already running
    #[error("Pool '{pool_name}' is already running with {worker_count} workers")]
    AlreadyRunning {
        /// Name of the pool
        pool_name: String,
        /// Number of workers
        worker_count: usize,
    },

    /// Pool stopped accepting work
    #[error("Pool is shutting down")]
    ShuttingDown,

    /// Failed to spawn a worker thread
    #[error("Failed to spawn worker thread #{thread_id}: {message}")]
    SpawnError {
        /// Index of the thread that failed to spawn
        thread_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to join a worker thread
    #[error("Failed to join worker thread #{thread_id}: {message}")]
    JoinError {
        /// Index of the thread that failed to join
        thread_id: usize,
        /// Error message
        message: String,
    },

    /// A task returned an error
    #[error("Task failed (input: {input}): {message}")]
    TaskFailed {
        /// Debug rendering of the task input
        input: String,
        /// Error message
        message: String,
    },

    /// A task panicked
    #[error("Task panicked (input: {input}): {message}")]
    TaskPanicked {
        /// Debug rendering of the task input
        input: String,
        /// Panic message
        message: String,
    },

    /// A worker process misbehaved or could not be driven
    #[error("Worker process #{worker_id}: {message}")]
    WorkerProcess {
        /// Index of the worker process
        worker_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// The worker executable could not be located
    #[error("Worker executable not found (looked for {searched})")]
    WorkerNotFound {
        /// Paths that were tried
        searched: String,
    },

    /// Malformed message on the process pool wire
    #[error("Protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },

    /// Plain I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// General error
    #[error("{0}")]
    Other(String),
}

impl LabError {
    /// Create a negative input error
    pub fn negative_input(operation: &'static str, value: i64) -> Self {
        LabError::NegativeInput { operation, value }
    }

    /// Create an overflow error
    pub fn overflow(operation: &'static str, value: i64) -> Self {
        LabError::Overflow { operation, value }
    }

    /// Create a not running error
    pub fn not_running(pool_name: impl Into<String>) -> Self {
        LabError::NotRunning {
            pool_name: pool_name.into(),
        }
    }

    /// Create an already running error
    pub fn already_running(pool_name: impl Into<String>, worker_count: usize) -> Self {
        LabError::AlreadyRunning {
            pool_name: pool_name.into(),
            worker_count,
        }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        thread_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LabError::SpawnError {
            thread_id,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(thread_id: usize, message: impl Into<String>) -> Self {
        LabError::JoinError {
            thread_id,
            message: message.into(),
        }
    }

    /// Create a task failure
    pub fn task_failed(input: impl std::fmt::Debug, message: impl Into<String>) -> Self {
        LabError::TaskFailed {
            input: format!("{:?}", input),
            message: message.into(),
        }
    }

    /// Create a task panic error
    pub fn task_panicked(input: impl std::fmt::Debug, message: impl Into<String>) -> Self {
        LabError::TaskPanicked {
            input: format!("{:?}", input),
            message: message.into(),
        }
    }

    /// Create a worker process error
    pub fn worker_process(worker_id: usize, message: impl Into<String>) -> Self {
        LabError::WorkerProcess {
            worker_id,
            message: message.into(),
            source: None,
        }
    }

    /// Create a worker process error with an IO source
    pub fn worker_process_io(
        worker_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LabError::WorkerProcess {
            worker_id,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        LabError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LabError::Other(msg.into())
    }

    /// Short name of the error variant, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            LabError::NegativeInput { .. } => "NegativeInput",
            LabError::Overflow { .. } => "Overflow",
            LabError::NotRunning { .. } => "NotRunning",
            LabError::AlreadyRunning { .. } => "AlreadyRunning",
            LabError::ShuttingDown => "ShuttingDown",
            LabError::SpawnError { .. } => "SpawnError",
            LabError::JoinError { .. } => "JoinError",
            LabError::TaskFailed { .. } => "TaskFailed",
            LabError::TaskPanicked { .. } => "TaskPanicked",
            LabError::WorkerProcess { .. } => "WorkerProcess",
            LabError::WorkerNotFound { .. } => "WorkerNotFound",
            LabError::Protocol(_) => "Protocol",
            LabError::InvalidConfig { .. } => "InvalidConfig",
            LabError::Io(_) => "Io",
            LabError::Other(_) => "Other",
        }
    }
}

/// Extract a readable message from a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LabError::negative_input("fib", -3);
        assert_eq!(err.to_string(), "fib: n must be >= 0 (got -3)");

        let err = LabError::already_running("io", 4);
        assert_eq!(
            err.to_string(),
            "Pool 'io' is already running with 4 workers"
        );

        let err = LabError::task_failed(7usize, "boom");
        assert_eq!(err.to_string(), "Task failed (input: 7): boom");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(LabError::negative_input("fib", -1).kind(), "NegativeInput");
        assert_eq!(LabError::ShuttingDown.kind(), "ShuttingDown");
        assert_eq!(LabError::worker_process(2, "gone").kind(), "WorkerProcess");
    }

    #[test]
    fn test_spawn_error_with_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LabError::spawn_with_source(5, "Cannot create thread", io_err);

        assert!(matches!(err, LabError::SpawnError { .. }));
        assert!(err.to_string().contains("worker thread #5"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static str");
        assert_eq!(panic_message(payload.as_ref()), "static str");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn std::any::Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "Unknown panic");
    }
}
