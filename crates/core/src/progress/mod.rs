//! Progress reporting shared by all workers.
//!
//! Every event carries the id of the job that produced it, so a single sink
//! can serve the whole worker pool. Reporting never blocks the caller: the
//! channel-backed sink drops updates when its buffer is full.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::job::JobId;

/// Transfer status carried by a [`ProgressEvent`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProgressStatus {
    Downloading {
        percent: f32,
        #[serde(skip_serializing_if = "Option::is_none")]
        speed: Option<String>,
    },
    Finished,
}

/// A single progress update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub job_id: JobId,
    #[serde(flatten)]
    pub status: ProgressStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Receiver of progress updates.
pub trait ProgressSink: Send + Sync {
    /// Reports one update. Must return quickly.
    fn report(&self, event: ProgressEvent);
}

/// Sink that discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
    fn report(&self, _event: ProgressEvent) {}
}

/// Sink forwarding updates over a bounded channel.
#[derive(Debug, Clone)]
pub struct ChannelProgressSink {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx }
    }

    /// Creates a sink and the receiving end of its channel.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx), rx)
    }
}

impl ProgressSink for ChannelProgressSink {
    fn report(&self, event: ProgressEvent) {
        if let Err(e) = self.tx.try_send(event) {
            tracing::trace!("Dropped progress update: {}", e);
        }
    }
}

/// Per-job handle onto the shared sink.
///
/// Passed explicitly into each job so updates are always keyed by the job
/// that produced them.
#[derive(Clone)]
pub struct JobProgress {
    job_id: JobId,
    sink: Arc<dyn ProgressSink>,
}

impl JobProgress {
    pub fn new(job_id: JobId, sink: Arc<dyn ProgressSink>) -> Self {
        Self { job_id, sink }
    }

    /// A handle that discards every update.
    pub fn noop(job_id: JobId) -> Self {
        Self::new(job_id, Arc::new(NoopProgressSink))
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn downloading(&self, percent: f32, speed: Option<String>, filename: Option<String>) {
        self.sink.report(ProgressEvent {
            job_id: self.job_id,
            status: ProgressStatus::Downloading {
                percent: percent.clamp(0.0, 100.0),
                speed,
            },
            filename,
        });
    }

    pub fn finished(&self, filename: Option<String>) {
        self.sink.report(ProgressEvent {
            job_id: self.job_id,
            status: ProgressStatus::Finished,
            filename,
        });
    }
}

impl std::fmt::Debug for JobProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobProgress")
            .field("job_id", &self.job_id)
            .finish_non_exhaustive()
    }
}
