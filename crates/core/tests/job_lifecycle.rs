//! Job lifecycle integration tests.
//!
//! These tests drive the job runner with mock extractor and transcoder:
//! - Fetch retries and exhaustion
//! - Post-processing swap and its best-effort failure path
//! - History and progress side channels

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;

use mediafetch_core::{
    directive::parse,
    history::{HistoryEntry, HistoryHandle},
    job::{fixed_path, JobContext, JobOptions, JobOutcome, JobRunner, RetrievalJob, RetryPolicy, MAX_RETRIES_REASON},
    progress::{ChannelProgressSink, ProgressEvent, ProgressStatus},
    testing::{MockExtractor, MockTranscoder},
};

const URL: &str = "https://media.example/watch?v=clip1";

/// Test helper wiring a runner to mocks.
struct TestHarness {
    runner: JobRunner,
    extractor: MockExtractor,
    transcoder: MockTranscoder,
    history_rx: mpsc::Receiver<HistoryEntry>,
    progress_rx: mpsc::Receiver<ProgressEvent>,
    output_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_max_attempts(3)
    }

    fn with_max_attempts(max_attempts: u32) -> Self {
        let extractor = MockExtractor::new();
        let transcoder = MockTranscoder::new();
        let (history_tx, history_rx) = mpsc::channel(16);
        let (progress, progress_rx) = ChannelProgressSink::channel(64);

        let ctx = JobContext::new(Arc::new(extractor.clone()), Arc::new(transcoder.clone()))
            .with_progress(Arc::new(progress))
            .with_history(HistoryHandle::new(history_tx))
            .with_retry(RetryPolicy::new(max_attempts, Duration::from_millis(1)));

        Self {
            runner: JobRunner::new(Arc::new(ctx)),
            extractor,
            transcoder,
            history_rx,
            progress_rx,
            output_dir: TempDir::new().expect("Failed to create output dir"),
        }
    }

    fn job(&self, directive: &str) -> RetrievalJob {
        RetrievalJob::new(URL, self.output_dir.path(), parse(directive))
    }

    fn expected_output(&self, ext: &str) -> PathBuf {
        self.output_dir.path().join(format!("clip1.{}", ext))
    }
}

#[tokio::test]
async fn test_job_succeeds_without_post_processing() {
    let mut harness = TestHarness::new();
    let job = harness.job("720p");
    let job_id = job.id;

    let result = harness.runner.run(job).await;

    assert!(result.is_success());
    assert_eq!(result.job_id, job_id);
    assert_eq!(result.attempts, 1);
    match &result.outcome {
        JobOutcome::Succeeded {
            output_path,
            title,
            post_processed,
        } => {
            assert_eq!(output_path, &harness.expected_output("mp4"));
            assert_eq!(title, "clip1");
            assert!(!post_processed);
            assert!(output_path.exists());
        }
        other => panic!("Expected success, got {:?}", other),
    }

    assert_eq!(harness.transcoder.transcode_count().await, 0);

    let entry = harness.history_rx.try_recv().expect("History should be recorded");
    assert_eq!(entry.url, URL);
    assert_eq!(entry.title, "clip1");
    assert_eq!(entry.filepath, harness.expected_output("mp4"));
}

#[tokio::test]
async fn test_fetch_retries_then_succeeds() {
    let harness = TestHarness::new();
    harness.extractor.set_failures(URL, 2).await;

    let result = harness.runner.run(harness.job("")).await;

    assert!(result.is_success());
    assert_eq!(result.attempts, 3);
    assert_eq!(harness.extractor.download_count(URL).await, 3);
}

#[tokio::test]
async fn test_fetch_exhaustion_fails_without_extra_attempt() {
    let mut harness = TestHarness::new();
    harness.extractor.set_failures(URL, u32::MAX).await;

    let result = harness.runner.run(harness.job("enhance")).await;

    assert!(!result.is_success());
    assert_eq!(result.attempts, 3);
    assert_eq!(
        result.outcome,
        JobOutcome::Failed {
            reason: MAX_RETRIES_REASON.to_string()
        }
    );
    assert_eq!(harness.extractor.download_count(URL).await, 3);
    assert_eq!(harness.transcoder.transcode_count().await, 0);
    assert!(harness.history_rx.try_recv().is_err(), "Failures are not recorded");
}

#[tokio::test]
async fn test_single_attempt_policy() {
    let harness = TestHarness::with_max_attempts(1);
    harness.extractor.set_failures(URL, 1).await;

    let result = harness.runner.run(harness.job("")).await;

    assert!(!result.is_success());
    assert_eq!(harness.extractor.download_count(URL).await, 1);
}

#[tokio::test]
async fn test_post_processing_replaces_original() {
    let harness = TestHarness::new();

    let result = harness.runner.run(harness.job("1080p upscale enhance stereo")).await;

    let original = harness.expected_output("mp4");
    match &result.outcome {
        JobOutcome::Succeeded {
            output_path,
            post_processed,
            ..
        } => {
            assert_eq!(output_path, &original);
            assert!(post_processed);
        }
        other => panic!("Expected success, got {:?}", other),
    }

    let requests = harness.transcoder.recorded_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].inputs, vec![original.clone()]);
    assert_eq!(requests[0].output, fixed_path(&original));
    assert_eq!(requests[0].pipeline.video_filters, vec!["scale=-2:1080:flags=lanczos"]);

    let contents = tokio::fs::read(&original).await.unwrap();
    assert_eq!(contents, b"processed media");
    assert!(!fixed_path(&original).exists(), "Temp file should be renamed away");
}

#[tokio::test]
async fn test_post_processing_failure_keeps_original() {
    let mut harness = TestHarness::new();
    harness.transcoder.set_fail(true).await;
    harness.transcoder.set_leave_partial_output(true).await;

    let result = harness.runner.run(harness.job("mono")).await;

    let original = harness.expected_output("mp4");
    match &result.outcome {
        JobOutcome::Succeeded {
            output_path,
            post_processed,
            ..
        } => {
            assert_eq!(output_path, &original);
            assert!(!post_processed);
        }
        other => panic!("Expected success, got {:?}", other),
    }

    assert_eq!(tokio::fs::read(&original).await.unwrap(), b"mock media");
    assert!(!fixed_path(&original).exists(), "Partial output should be removed");
    assert!(harness.history_rx.try_recv().is_ok(), "Success is still recorded");
}

#[tokio::test]
async fn test_audio_extraction_job() {
    let harness = TestHarness::new();

    let result = harness.runner.run(harness.job("flac sr_96k")).await;

    assert!(result.is_success());
    let requests = harness.extractor.recorded_downloads().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].options.format_selector, "bestaudio/best");
    assert!(requests[0].options.audio_extraction.is_some());
    assert!(harness.expected_output("flac").exists());
    // Sample rate alone does not trigger a second pass.
    assert_eq!(harness.transcoder.transcode_count().await, 0);
}

#[tokio::test]
async fn test_job_options_reach_extractor() {
    let harness = TestHarness::new();
    let job = harness.job("").with_options(JobOptions {
        skip_playlist: true,
        from_batch: true,
    });

    harness.runner.run(job).await;

    let requests = harness.extractor.recorded_downloads().await;
    assert!(requests[0].options.no_playlist);
    assert!(requests[0].options.ignore_errors);
    assert_eq!(
        requests[0].template,
        harness
            .output_dir
            .path()
            .join("%(title)s.%(ext)s")
            .to_string_lossy()
    );
}

#[tokio::test]
async fn test_progress_events_carry_job_id() {
    let mut harness = TestHarness::new();
    let job = harness.job("");
    let job_id = job.id;

    harness.runner.run(job).await;

    let mut events = Vec::new();
    while let Ok(event) = harness.progress_rx.try_recv() {
        events.push(event);
    }
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.job_id == job_id));
    assert!(matches!(events[0].status, ProgressStatus::Downloading { .. }));
    assert_eq!(events[1].status, ProgressStatus::Finished);
}
