//! Scoped wall-clock timing.
//!
//! On success the timer prints `<label> <secs>s` to stdout. On failure it
//! logs `label=<label> error=<kind> duration_s=<secs>` and hands the error
//! back untouched.
//!
//! ```rust
//! use concurrency_lab::timing::timer;
//!
//! let sum: Result<u64, std::num::ParseIntError> = timer(Some("parse"), || {
//!     Ok("41".parse::<u64>()? + 1)
//! });
//! assert_eq!(sum.unwrap(), 42);
//! ```

use crate::logging::{get_logger, Logger};
use std::thread;
use std::time::{Duration, Instant};

/// Guard measuring the time since it was started.
///
/// Dropping the guard without calling [`Timer::finish`] or [`Timer::fail`]
/// counts as a normal exit, unless the thread is unwinding from a panic, in
/// which case the failure is logged with `error=panic`.
#[derive(Debug)]
pub struct Timer {
    label: Option<String>,
    start: Instant,
    reported: bool,
    logger: Logger,
}

impl Timer {
    /// Start timing
    pub fn start(label: Option<&str>) -> Self {
        Self {
            label: label.map(str::to_string),
            start: Instant::now(),
            reported: false,
            logger: get_logger("timing"),
        }
    }

    /// Time elapsed so far
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop and print the success line; returns the printed line
    pub fn finish(mut self) -> String {
        self.report_success()
    }

    /// Stop and log a failure of the given kind; returns the logged message
    pub fn fail(mut self, kind: &str) -> String {
        self.report_failure(kind)
    }

    fn report_success(&mut self) -> String {
        self.reported = true;
        let line = success_line(self.label.as_deref(), self.elapsed());
        println!("{}", line);
        line
    }

    fn report_failure(&mut self, kind: &str) -> String {
        self.reported = true;
        let msg = failure_line(self.label.as_deref(), kind, self.elapsed());
        self.logger.error(&msg);
        msg
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if self.reported {
            return;
        }
        if thread::panicking() {
            self.report_failure("panic");
        } else {
            self.report_success();
        }
    }
}

/// Success line: `<label or 'block'> <secs:.4>s`
pub fn success_line(label: Option<&str>, elapsed: Duration) -> String {
    format!("{} {:.4}s", label.unwrap_or("block"), elapsed.as_secs_f64())
}

/// Failure message: `label=<label or 'n/a'> error=<kind> duration_s=<secs:.4>`
pub fn failure_line(label: Option<&str>, kind: &str, elapsed: Duration) -> String {
    format!(
        "label={} error={} duration_s={:.4}",
        label.unwrap_or("n/a"),
        kind,
        elapsed.as_secs_f64()
    )
}

/// Short type name of `E`, e.g. `LabError` or `ParseIntError`
pub fn error_kind<E>() -> &'static str {
    let full = std::any::type_name::<E>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Run `f` inside a [`Timer`] scope and return its result unchanged.
pub fn timer<T, E, F>(label: Option<&str>, f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
{
    let guard = Timer::start(label);
    match f() {
        Ok(value) => {
            guard.finish();
            Ok(value)
        }
        Err(e) => {
            guard.fail(error_kind::<E>());
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LabError;
    use crate::workload::fib;

    #[test]
    fn test_success_line_format() {
        let line = success_line(Some("unit-test"), Duration::from_millis(1500));
        assert_eq!(line, "unit-test 1.5000s");
        assert_eq!(success_line(None, Duration::ZERO), "block 0.0000s");
    }

    #[test]
    fn test_failure_line_format() {
        let line = failure_line(None, "NegativeInput", Duration::from_millis(20));
        assert_eq!(line, "label=n/a error=NegativeInput duration_s=0.0200");
    }

    #[test]
    fn test_finish_reports_label() {
        let t = Timer::start(Some("unit-test"));
        let line = t.finish();
        assert!(line.starts_with("unit-test "));
        assert!(line.ends_with('s'));
    }

    #[test]
    fn test_timer_passes_error_through() {
        let result = timer(Some("bad-fib"), || fib(-1));
        match result {
            Err(LabError::NegativeInput { value, .. }) => assert_eq!(value, -1),
            other => panic!("expected NegativeInput, got {:?}", other),
        }
    }

    #[test]
    fn test_timer_returns_value() {
        let result: Result<u64, LabError> = timer(None, || fib(10));
        assert_eq!(result.unwrap(), 55);
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(error_kind::<LabError>(), "LabError");
        assert_eq!(error_kind::<std::num::ParseIntError>(), "ParseIntError");
    }

    #[test]
    fn test_timer_logs_on_panic() {
        let outcome = std::panic::catch_unwind(|| {
            let _t = Timer::start(Some("explodes"));
            panic!("boom");
        });
        assert!(outcome.is_err());
    }
}
