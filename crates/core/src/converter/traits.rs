//! Trait definitions for the converter module.

use async_trait::async_trait;

use super::error::ConverterError;
use super::types::{TranscodeOutcome, TranscodeRequest};

/// A transcoding engine invoked once per pass.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Runs one transcoding pass.
    ///
    /// Implementations never retry and never rename files; the caller owns
    /// any temporary output it asked for.
    async fn transcode(&self, request: TranscodeRequest) -> Result<TranscodeOutcome, ConverterError>;

    /// Validates that the engine is available.
    async fn validate(&self) -> Result<(), ConverterError>;
}
