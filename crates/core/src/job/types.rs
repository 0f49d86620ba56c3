//! Core job data types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::directive::Directive;

/// Output template handed to the extraction service, relative to the job's
/// output directory.
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Stable identifier of a job, used to key progress and log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hints threaded from queue expansion through to the extraction call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOptions {
    /// Download only the addressed item even when the URL names a playlist.
    #[serde(default)]
    pub skip_playlist: bool,
    /// The job came from a batch file; per-item extraction errors are ignored.
    #[serde(default)]
    pub from_batch: bool,
}

/// One unit of work: a URL, where to put it and how to process it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalJob {
    pub id: JobId,
    pub url: String,
    pub output_dir: PathBuf,
    pub directive: Directive,
    #[serde(default)]
    pub options: JobOptions,
    /// Fetch attempts made so far.
    #[serde(default)]
    pub attempts: u32,
}

impl RetrievalJob {
    pub fn new(url: impl Into<String>, output_dir: impl Into<PathBuf>, directive: Directive) -> Self {
        Self {
            id: JobId::new(),
            url: url.into(),
            output_dir: output_dir.into(),
            directive,
            options: JobOptions::default(),
            attempts: 0,
        }
    }

    pub fn with_options(mut self, options: JobOptions) -> Self {
        self.options = options;
        self
    }

    /// Full output template (`<output_dir>/%(title)s.%(ext)s`).
    pub fn output_template(&self) -> String {
        self.output_dir
            .join(OUTPUT_TEMPLATE)
            .to_string_lossy()
            .to_string()
    }
}

/// State of a job during execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Fetching,
    Retrying,
    PostProcessing,
    Succeeded,
    Failed,
}

impl JobState {
    /// Terminal states never transition further.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Pending, Fetching)
                | (Fetching, Retrying)
                | (Fetching, PostProcessing)
                | (Fetching, Succeeded)
                | (Fetching, Failed)
                | (Retrying, Fetching)
                | (PostProcessing, Succeeded)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Fetching => "fetching",
            JobState::Retrying => "retrying",
            JobState::PostProcessing => "post_processing",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome {
    Succeeded {
        output_path: PathBuf,
        title: String,
        /// Whether the post-processing pass ran and replaced the file.
        post_processed: bool,
    },
    Failed {
        reason: String,
    },
}

/// Result produced exactly once per executed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: JobId,
    pub url: String,
    pub attempts: u32,
    #[serde(flatten)]
    pub outcome: JobOutcome,
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, JobOutcome::Succeeded { .. })
    }

    pub fn state(&self) -> JobState {
        match self.outcome {
            JobOutcome::Succeeded { .. } => JobState::Succeeded,
            JobOutcome::Failed { .. } => JobState::Failed,
        }
    }
}
