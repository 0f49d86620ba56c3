//! Fixed-size worker pool.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{mpsc, watch, Mutex};

use super::types::RunReport;
use crate::job::{JobRunner, RetrievalJob};

/// Runs jobs on a fixed number of worker tasks sharing one queue.
///
/// Each job is dequeued exactly once. Once the shutdown signal flips to
/// `true`, workers stop dequeuing; jobs already running finish normally.
pub struct WorkerPool {
    runner: JobRunner,
    workers: usize,
    shutdown: watch::Receiver<bool>,
}

impl WorkerPool {
    pub fn new(runner: JobRunner, workers: usize, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            runner,
            workers: workers.max(1),
            shutdown,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs every job and collects results in completion order.
    pub async fn run(&self, jobs: Vec<RetrievalJob>) -> RunReport {
        let total = jobs.len();
        if total == 0 {
            return RunReport::default();
        }

        let queue = Arc::new(Mutex::new(VecDeque::from(jobs)));
        let (tx, mut rx) = mpsc::channel(total);
        let workers = self.workers.min(total);

        tracing::info!(jobs = total, workers, "Dispatching jobs");

        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let queue = Arc::clone(&queue);
                let tx = tx.clone();
                let runner = self.runner.clone();
                let shutdown = self.shutdown.clone();

                tokio::spawn(async move {
                    loop {
                        if *shutdown.borrow() {
                            tracing::debug!(worker, "Shutdown requested, worker stopping");
                            break;
                        }

                        let next = queue.lock().await.pop_front();
                        let Some(job) = next else {
                            break;
                        };

                        tracing::debug!(worker, job_id = %job.id, "Worker picked up job");
                        let result = runner.run(job).await;
                        if tx.send(result).await.is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();
        drop(tx);

        let mut results = Vec::with_capacity(total);
        while let Some(result) = rx.recv().await {
            tracing::debug!(
                job_id = %result.job_id,
                success = result.is_success(),
                completed = results.len() + 1,
                total,
                "Job finished"
            );
            results.push(result);
        }

        for joined in join_all(handles).await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        let not_dispatched = queue.lock().await.len();
        if not_dispatched > 0 {
            tracing::warn!(not_dispatched, "Jobs left undispatched after shutdown");
        }

        RunReport::new(results, not_dispatched)
    }
}
