//! Line-delimited JSON protocol between the process pool and its workers.
//!
//! The parent writes one [`TaskRequest`] per line to a worker's stdin; the
//! worker answers each with exactly one [`TaskResponse`] line on stdout and
//! exits when stdin reaches EOF.
//!
//! ```text
//! -> {"id":0,"op":"fib","input":20}
//! <- {"id":0,"input":20,"outcome":{"ok":6765}}
//! -> {"id":1,"op":"fib","input":-1}
//! <- {"id":1,"input":-1,"outcome":{"err":{"kind":"NegativeInput","message":"fib: n must be >= 0 (got -1)"}}}
//! ```

use crate::core::{LabError, Operation, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

/// One task sent to a worker process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Batch-unique task id
    pub id: u64,
    /// Operation to run
    pub op: Operation,
    /// Operation input
    pub input: i64,
}

/// Failure reported by a worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    /// Error kind, e.g. `NegativeInput`
    pub kind: String,
    /// Human readable description
    pub message: String,
}

impl From<&LabError> for WireError {
    fn from(e: &LabError) -> Self {
        Self {
            kind: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

/// Result of one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Computed value
    Ok(u64),
    /// Failure description
    Err(WireError),
}

/// A worker's answer to one [`TaskRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResponse {
    /// Id of the request being answered
    pub id: u64,
    /// Echo of the request input
    pub input: i64,
    /// What happened
    pub outcome: Outcome,
}

impl TaskResponse {
    /// Run `request` in this process and build the answer
    pub fn execute(request: &TaskRequest) -> Self {
        let outcome = match request.op.apply(request.input) {
            Ok(value) => Outcome::Ok(value),
            Err(e) => Outcome::Err(WireError::from(&e)),
        };
        Self {
            id: request.id,
            input: request.input,
            outcome,
        }
    }

    /// Convert the outcome into a crate result
    pub fn into_result(self) -> Result<u64> {
        match self.outcome {
            Outcome::Ok(value) => Ok(value),
            Outcome::Err(err) => Err(LabError::task_failed(
                self.input,
                format!("{}: {}", err.kind, err.message),
            )),
        }
    }
}

/// Write `message` as one JSON line and flush
pub fn write_message<W: Write, M: Serialize>(writer: &mut W, message: &M) -> Result<()> {
    serde_json::to_writer(&mut *writer, message)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Read the next JSON line; `None` at EOF. Blank lines are skipped.
pub fn read_message<R: BufRead, M: DeserializeOwned>(reader: &mut R) -> Result<Option<M>> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if !line.trim().is_empty() {
            return Ok(Some(serde_json::from_str(line.trim_end())?));
        }
    }
}

/// Worker-side loop: answer every request until EOF.
///
/// Returns the number of requests served. A line that is not a valid
/// request ends the loop with [`LabError::Protocol`].
pub fn serve<R: BufRead, W: Write>(mut reader: R, mut writer: W) -> Result<usize> {
    let mut served = 0;
    while let Some(request) = read_message::<_, TaskRequest>(&mut reader)? {
        let response = TaskResponse::execute(&request);
        write_message(&mut writer, &response)?;
        served += 1;
    }
    Ok(served)
}
