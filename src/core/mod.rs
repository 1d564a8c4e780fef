//! Core types shared by the demos and pools

pub mod error;
pub mod job;
pub mod task;

pub use error::{LabError, Result};
pub use job::{BoxedJob, ClosureJob, Job, ReportingJob};
pub use task::{partition_successes, Operation, TaskResult};
