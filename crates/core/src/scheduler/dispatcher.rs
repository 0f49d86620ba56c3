//! Scheduler facade combining expansion and the worker pool.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;

use super::expand::QueueExpander;
use super::pool::WorkerPool;
use super::types::{RunReport, SchedulerConfig};
use crate::directive::Directive;
use crate::job::{JobContext, JobRunner, RetrievalJob};
use crate::prompt::Prompt;

/// Expands inputs into jobs and runs them on a bounded worker pool.
pub struct Scheduler {
    expander: QueueExpander,
    pool: WorkerPool,
}

impl Scheduler {
    /// Creates a scheduler with no shutdown signal.
    pub fn new(ctx: Arc<JobContext>, prompt: Arc<dyn Prompt>, config: SchedulerConfig) -> Self {
        let (_tx, rx) = watch::channel(false);
        Self::with_shutdown(ctx, prompt, config, rx)
    }

    /// Creates a scheduler that stops dispatching once `shutdown` turns `true`.
    pub fn with_shutdown(
        ctx: Arc<JobContext>,
        prompt: Arc<dyn Prompt>,
        config: SchedulerConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let expander = QueueExpander::new(Arc::clone(&ctx.extractor), prompt);
        let pool = WorkerPool::new(JobRunner::new(ctx), config.workers, shutdown);
        Self { expander, pool }
    }

    pub fn workers(&self) -> usize {
        self.pool.workers()
    }

    /// Expands raw inputs into jobs, creating output directories.
    pub async fn expand(
        &self,
        inputs: &[String],
        output_root: &Path,
        directive: &Directive,
    ) -> Vec<RetrievalJob> {
        self.expander.expand(inputs, output_root, directive).await
    }

    /// Runs `jobs` to completion.
    pub async fn run(&self, jobs: Vec<RetrievalJob>) -> RunReport {
        self.pool.run(jobs).await
    }

    /// Expands `inputs` and runs the resulting jobs.
    pub async fn run_inputs(
        &self,
        inputs: &[String],
        output_root: &Path,
        directive: &Directive,
    ) -> RunReport {
        let jobs = self.expand(inputs, output_root, directive).await;
        if jobs.is_empty() {
            tracing::warn!("Nothing to download");
        }
        self.run(jobs).await
    }
}
