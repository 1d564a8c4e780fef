//! Key-value structured logging on top of the `log` facade.
//!
//! Every line has the shape
//! `ts=2024-01-01T12:00:00 lvl=INFO logger=threading msg=producing 3`.
//! The threshold comes from `LOG_LEVEL` (default `INFO`).
//!
//! ```rust
//! use concurrency_lab::logging::get_logger;
//!
//! let logger = get_logger("cpu");
//! logger.info("warming up");
//! ```

use crate::config;
use chrono::{DateTime, Local};
use env_logger::{Builder, Target};
use log::{Level, LevelFilter};
use std::io::Write;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Render one log line
pub fn format_line(ts: DateTime<Local>, level: Level, logger: &str, msg: &str) -> String {
    format!(
        "ts={} lvl={} logger={} msg={}",
        ts.format(TIMESTAMP_FORMAT),
        level_name(level),
        logger,
        msg
    )
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARNING",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

/// Normalize a level name into an `env_logger` filter directive, accepting
/// `WARNING` for `warn`. Unknown names fall back to `info`.
pub fn filter_directive(name: &str) -> String {
    let name = name.trim();
    if name.eq_ignore_ascii_case("warning") {
        return "warn".to_string();
    }
    match name.parse::<LevelFilter>() {
        Ok(level) => level.to_string().to_ascii_lowercase(),
        Err(_) => "info".to_string(),
    }
}

/// `env_logger` builder writing key-value lines to stderr at `level`
pub fn builder(level: &str) -> Builder {
    let mut builder = Builder::new();
    builder
        .parse_filters(&filter_directive(level))
        .target(Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "{}",
                format_line(
                    Local::now(),
                    record.level(),
                    record.target(),
                    &record.args().to_string(),
                )
            )
        });
    builder
}

/// Install the key-value logger as the global logger, threshold from
/// `LOG_LEVEL` (default `INFO`).
///
/// Safe to call any number of times. If a logger is already installed,
/// ours or the application's, that one stays in place.
pub fn init() {
    let _ = builder(&config::env_string("LOG_LEVEL", "INFO")).try_init();
}

/// A named logger handle; the name becomes the `logger=` field.
#[derive(Debug, Clone)]
pub struct Logger {
    name: String,
}

/// Get a logger for `name`, installing the global logger on first use
pub fn get_logger(name: impl Into<String>) -> Logger {
    init();
    Logger { name: name.into() }
}

impl Logger {
    /// Logger name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Log at debug level
    pub fn debug(&self, msg: impl AsRef<str>) {
        log::debug!(target: self.name.as_str(), "{}", msg.as_ref());
    }

    /// Log at info level
    pub fn info(&self, msg: impl AsRef<str>) {
        log::info!(target: self.name.as_str(), "{}", msg.as_ref());
    }

    /// Log at warning level
    pub fn warning(&self, msg: impl AsRef<str>) {
        log::warn!(target: self.name.as_str(), "{}", msg.as_ref());
    }

    /// Log at error level
    pub fn error(&self, msg: impl AsRef<str>) {
        log::error!(target: self.name.as_str(), "{}", msg.as_ref());
    }
}
