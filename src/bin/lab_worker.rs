//! Process pool worker.
//!
//! Reads task requests line by line from stdin and answers each on stdout
//! until stdin is closed. Started by `ProcessPool`; not meant to be run by
//! hand, though piping JSON into it works:
//!
//! ```text
//! echo '{"id":0,"op":"fib","input":20}' | lab-worker
//! ```

use concurrency_lab::pool::protocol::serve;
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let stdin = io::stdin();
    let stdout = io::stdout();
    match serve(stdin.lock(), stdout.lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("lab-worker: {}", e);
            ExitCode::FAILURE
        }
    }
}
