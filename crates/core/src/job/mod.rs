//! Retrieval jobs.
//!
//! A job is one URL-to-output unit of work. It is executed by exactly one
//! worker; retries happen inside that execution and never re-queue the job.

mod config;
mod runner;
mod types;

pub use config::RetryPolicy;
pub use runner::{fixed_path, JobContext, JobRunner, MAX_RETRIES_REASON};
pub use types::{JobId, JobOptions, JobOutcome, JobResult, JobState, RetrievalJob};
