//! Types for the converter module.

use serde::Serialize;
use std::path::PathBuf;

use crate::job::JobId;
use crate::pipeline::CompiledPipeline;

/// One transcoding pass.
#[derive(Debug, Clone)]
pub struct TranscodeRequest {
    /// Job this pass belongs to.
    pub job_id: JobId,
    /// Input files, in order.
    pub inputs: Vec<PathBuf>,
    /// Output file.
    pub output: PathBuf,
    /// Pipeline the arguments are built from.
    pub pipeline: CompiledPipeline,
}

/// Result of a successful transcoding pass.
#[derive(Debug, Clone, Serialize)]
pub struct TranscodeOutcome {
    pub job_id: JobId,
    pub output_path: PathBuf,
    pub output_size_bytes: u64,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}
