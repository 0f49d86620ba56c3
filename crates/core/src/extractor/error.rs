//! Error types for the extractor module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the extraction service. All of them are retried by the job.
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// The extraction binary could not be started.
    #[error("yt-dlp not found at path: {path}")]
    NotFound { path: PathBuf },

    /// The extraction process reported failure.
    #[error("Extraction failed: {reason}")]
    Failed {
        reason: String,
        stderr: Option<String>,
    },

    /// The process succeeded but its output could not be understood.
    #[error("Invalid extractor output: {reason}")]
    InvalidOutput { reason: String },

    #[error("Extraction timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractorError {
    pub fn failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            stderr,
        }
    }

    pub fn invalid_output(reason: impl Into<String>) -> Self {
        Self::InvalidOutput {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        Self::invalid_output(e.to_string())
    }
}
