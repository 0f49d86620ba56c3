//! Types for the scheduler module.

use serde::{Deserialize, Serialize};

use crate::job::JobResult;

/// Cap applied to the host-derived default worker count.
pub const DEFAULT_WORKER_CAP: usize = 6;

/// Largest accepted configured worker count.
pub const MAX_WORKERS: usize = 16;

/// Default worker count: logical cores, capped at [`DEFAULT_WORKER_CAP`].
pub fn default_workers() -> usize {
    num_cpus::get().clamp(1, DEFAULT_WORKER_CAP)
}

/// Configuration for the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Number of worker tasks.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

impl SchedulerConfig {
    pub fn with_workers(workers: usize) -> Self {
        Self { workers }
    }
}

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Nothing was executed.
    Empty,
    AllSucceeded,
    PartialFailure,
    AllFailed,
}

/// Results of a run, in completion order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub results: Vec<JobResult>,
    pub succeeded: usize,
    pub failed: usize,
    /// Jobs left in the queue because of shutdown.
    pub not_dispatched: usize,
}

impl RunReport {
    pub fn new(results: Vec<JobResult>, not_dispatched: usize) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - succeeded;
        Self {
            results,
            succeeded,
            failed,
            not_dispatched,
        }
    }

    /// Number of executed jobs.
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn status(&self) -> RunStatus {
        match (self.succeeded, self.failed) {
            (0, 0) => RunStatus::Empty,
            (_, 0) => RunStatus::AllSucceeded,
            (0, _) => RunStatus::AllFailed,
            _ => RunStatus::PartialFailure,
        }
    }
}
