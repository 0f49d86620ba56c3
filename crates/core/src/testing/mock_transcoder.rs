//! Mock transcoder for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::converter::{ConverterError, TranscodeOutcome, TranscodeRequest, Transcoder};

/// Bytes written to every successful output.
pub const PROCESSED_CONTENTS: &[u8] = b"processed media";

/// Mock implementation of the Transcoder trait.
///
/// Successful passes write [`PROCESSED_CONTENTS`] to the requested output.
/// Failing passes can optionally leave a partial output behind, to check
/// that callers clean up after themselves.
#[derive(Debug, Clone, Default)]
pub struct MockTranscoder {
    requests: Arc<RwLock<Vec<TranscodeRequest>>>,
    fail: Arc<RwLock<bool>>,
    leave_partial_output: Arc<RwLock<bool>>,
}

impl MockTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every pass fail.
    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    /// Write a partial output before failing.
    pub async fn set_leave_partial_output(&self, leave: bool) {
        *self.leave_partial_output.write().await = leave;
    }

    /// Every request received.
    pub async fn recorded_requests(&self) -> Vec<TranscodeRequest> {
        self.requests.read().await.clone()
    }

    pub async fn transcode_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcode(&self, request: TranscodeRequest) -> Result<TranscodeOutcome, ConverterError> {
        self.requests.write().await.push(request.clone());

        if request.inputs.is_empty() {
            return Err(ConverterError::NoInputs);
        }

        if *self.fail.read().await {
            if *self.leave_partial_output.read().await {
                tokio::fs::write(&request.output, b"partial").await?;
            }
            return Err(ConverterError::transcode_failed(
                "FFmpeg exited with code: Some(1)",
                Some("mock failure".to_string()),
            ));
        }

        tokio::fs::write(&request.output, PROCESSED_CONTENTS).await?;

        Ok(TranscodeOutcome {
            job_id: request.job_id,
            output_path: request.output,
            output_size_bytes: PROCESSED_CONTENTS.len() as u64,
            duration_ms: 1,
        })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        Ok(())
    }
}
