//! Executes a single retrieval job.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::config::RetryPolicy;
use super::types::{JobOutcome, JobResult, JobState, RetrievalJob};
use crate::converter::{TranscodeRequest, Transcoder};
use crate::extractor::{DownloadRequest, DownloadedMedia, ExtractionOptions, Extractor};
use crate::history::HistoryHandle;
use crate::pipeline::{compile, CompiledPipeline};
use crate::progress::{JobProgress, NoopProgressSink, ProgressSink};

/// Reason reported when every fetch attempt failed.
pub const MAX_RETRIES_REASON: &str = "Max retries exceeded";

/// Collaborators shared by every job.
#[derive(Clone)]
pub struct JobContext {
    pub extractor: Arc<dyn Extractor>,
    pub transcoder: Arc<dyn Transcoder>,
    pub progress: Arc<dyn ProgressSink>,
    pub history: Option<HistoryHandle>,
    pub retry: RetryPolicy,
}

impl JobContext {
    pub fn new(extractor: Arc<dyn Extractor>, transcoder: Arc<dyn Transcoder>) -> Self {
        Self {
            extractor,
            transcoder,
            progress: Arc::new(NoopProgressSink),
            history: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_history(mut self, history: HistoryHandle) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Path of the post-processing output next to `path`: `<stem>_fixed.<ext>`.
pub fn fixed_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_fixed.{}", stem, ext.to_string_lossy()),
        None => format!("{}_fixed", stem),
    };
    path.with_file_name(name)
}

/// Drives jobs through fetch, optional post-processing and history logging.
#[derive(Clone)]
pub struct JobRunner {
    ctx: Arc<JobContext>,
}

impl JobRunner {
    pub fn new(ctx: Arc<JobContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &JobContext {
        &self.ctx
    }

    /// Runs `job` to a terminal state and returns its result.
    ///
    /// Fetch and post-processing errors never escape; they become the
    /// returned result.
    pub async fn run(&self, mut job: RetrievalJob) -> JobResult {
        let mut state = JobState::Pending;
        let pipeline = compile(&job.directive);
        let progress = JobProgress::new(job.id, Arc::clone(&self.ctx.progress));

        tracing::info!(
            job_id = %job.id,
            url = %job.url,
            directive = %job.directive.summary(),
            "Starting job"
        );

        let downloaded = match self.fetch(&mut job, &mut state, &pipeline, &progress).await {
            Some(downloaded) => downloaded,
            None => {
                transition(&job, &mut state, JobState::Failed);
                return JobResult {
                    job_id: job.id,
                    url: job.url,
                    attempts: job.attempts,
                    outcome: JobOutcome::Failed {
                        reason: MAX_RETRIES_REASON.to_string(),
                    },
                };
            }
        };

        let mut post_processed = false;
        if job.directive.needs_post_processing() {
            transition(&job, &mut state, JobState::PostProcessing);
            post_processed = self.post_process(&job, &pipeline, &downloaded.path).await;
        }

        if let Some(history) = &self.ctx.history {
            history.record(&downloaded.title, &job.url, &downloaded.path);
        }

        transition(&job, &mut state, JobState::Succeeded);
        tracing::info!(
            job_id = %job.id,
            path = %downloaded.path.display(),
            post_processed,
            "Job succeeded"
        );

        JobResult {
            job_id: job.id,
            url: job.url,
            attempts: job.attempts,
            outcome: JobOutcome::Succeeded {
                output_path: downloaded.path,
                title: downloaded.title,
                post_processed,
            },
        }
    }

    /// Fetch loop. Returns `None` once the retry budget is spent.
    async fn fetch(
        &self,
        job: &mut RetrievalJob,
        state: &mut JobState,
        pipeline: &CompiledPipeline,
        progress: &JobProgress,
    ) -> Option<DownloadedMedia> {
        let request = DownloadRequest {
            url: job.url.clone(),
            output_dir: job.output_dir.clone(),
            template: job.output_template(),
            options: ExtractionOptions::from_pipeline(pipeline)
                .with_no_playlist(job.options.skip_playlist)
                .with_ignore_errors(job.options.from_batch),
        };

        loop {
            transition(job, state, JobState::Fetching);
            job.attempts += 1;

            match self
                .ctx
                .extractor
                .download(request.clone(), progress.clone())
                .await
            {
                Ok(downloaded) => return Some(downloaded),
                Err(e) => {
                    tracing::warn!(
                        job_id = %job.id,
                        attempt = job.attempts,
                        max_attempts = self.ctx.retry.max_attempts,
                        error = %e,
                        "Fetch failed"
                    );

                    if self.ctx.retry.is_exhausted(job.attempts) {
                        return None;
                    }

                    transition(job, state, JobState::Retrying);
                    tokio::time::sleep(self.ctx.retry.backoff()).await;
                }
            }
        }
    }

    /// Best-effort post-processing. Returns whether the processed file
    /// replaced the original.
    async fn post_process(
        &self,
        job: &RetrievalJob,
        pipeline: &CompiledPipeline,
        original: &Path,
    ) -> bool {
        let temp = fixed_path(original);
        let request = TranscodeRequest {
            job_id: job.id,
            inputs: vec![original.to_path_buf()],
            output: temp.clone(),
            pipeline: pipeline.clone(),
        };

        match self.ctx.transcoder.transcode(request).await {
            Ok(outcome) => {
                tracing::debug!(
                    job_id = %job.id,
                    duration_ms = outcome.duration_ms,
                    output_size_bytes = outcome.output_size_bytes,
                    "Post-processing finished"
                );
                match replace_file(original, &temp).await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(
                            job_id = %job.id,
                            error = %e,
                            "Failed to swap post-processed file, keeping original"
                        );
                        remove_if_exists(&temp).await;
                        false
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    job_id = %job.id,
                    error = %e,
                    stderr = e.stderr().unwrap_or(""),
                    "Post-processing failed, keeping original"
                );
                remove_if_exists(&temp).await;
                false
            }
        }
    }
}

fn transition(job: &RetrievalJob, state: &mut JobState, next: JobState) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal job transition {} -> {}",
        state,
        next
    );
    tracing::debug!(job_id = %job.id, from = %state, to = %next, "Job state changed");
    *state = next;
}

/// Remove-then-rename swap of `temp` over `original`.
async fn replace_file(original: &Path, temp: &Path) -> std::io::Result<()> {
    if tokio::fs::try_exists(original).await? {
        tokio::fs::remove_file(original).await?;
    }
    tokio::fs::rename(temp, original).await
}

async fn remove_if_exists(path: &Path) {
    if let Ok(true) = tokio::fs::try_exists(path).await {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove temporary file");
        }
    }
}
