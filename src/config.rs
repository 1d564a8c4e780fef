//! Environment-driven runtime settings.
//!
//! Getters never fail: a missing or malformed variable yields the default.

use serde::Serialize;
use std::env;
use std::time::Duration;

/// Read a boolean variable; `1`, `true`, `yes`, `on` (any case) are true,
/// anything else set is false.
pub fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(val) => matches!(
            val.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}

/// Read a float variable
pub fn env_float(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

/// Read an integer variable
pub fn env_int(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<i64>().ok())
        .unwrap_or(default)
}

/// Read a string variable
pub fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Tunables for the timing harnesses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabSettings {
    /// Number of tasks per batch (`LAB_TASKS`)
    pub tasks: usize,
    /// Per-task simulated I/O delay (`LAB_IO_DURATION_S`)
    pub io_duration: Duration,
    /// Fibonacci input per CPU task (`LAB_FIB_N`)
    pub fib_n: i64,
    /// Worker processes for the CPU pool, 0 = core count (`LAB_MAX_WORKERS`)
    pub max_workers: usize,
    /// Yield between read and write in the unsafe counter (`LAB_UNSAFE_YIELD`)
    pub unsafe_yield: bool,
    /// Log threshold (`LOG_LEVEL`)
    pub log_level: String,
}

impl Default for LabSettings {
    fn default() -> Self {
        Self {
            tasks: 4,
            io_duration: Duration::from_millis(200),
            fib_n: 30,
            max_workers: 0,
            unsafe_yield: true,
            log_level: "INFO".to_string(),
        }
    }
}

impl LabSettings {
    /// Build settings from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let io_secs = env_float("LAB_IO_DURATION_S", defaults.io_duration.as_secs_f64());
        Self {
            tasks: non_negative(env_int("LAB_TASKS", defaults.tasks as i64), defaults.tasks),
            io_duration: if io_secs >= 0.0 {
                Duration::from_secs_f64(io_secs)
            } else {
                defaults.io_duration
            },
            fib_n: env_int("LAB_FIB_N", defaults.fib_n),
            max_workers: non_negative(
                env_int("LAB_MAX_WORKERS", defaults.max_workers as i64),
                defaults.max_workers,
            ),
            unsafe_yield: env_bool("LAB_UNSAFE_YIELD", defaults.unsafe_yield),
            log_level: env_string("LOG_LEVEL", &defaults.log_level),
        }
    }

    /// Worker process count with 0 resolved to the core count
    pub fn effective_max_workers(&self) -> usize {
        if self.max_workers == 0 {
            num_cpus::get().max(2)
        } else {
            self.max_workers
        }
    }
}

fn non_negative(value: i64, default: usize) -> usize {
    usize::try_from(value).unwrap_or(default)
}
