//! Trait definitions for the extractor module.

use async_trait::async_trait;

use super::error::ExtractorError;
use super::types::{DownloadRequest, DownloadedMedia, MediaMetadata, PlaylistEntry};
use crate::progress::JobProgress;

/// Extraction service used by the queue (metadata) and by jobs (download).
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Returns the name of this extractor implementation.
    fn name(&self) -> &str;

    /// Fetches metadata for `url`, including whether it names a playlist.
    async fn fetch_metadata(&self, url: &str) -> Result<MediaMetadata, ExtractorError>;

    /// Enumerates the member URLs of a playlist.
    async fn flatten_playlist(&self, url: &str) -> Result<Vec<PlaylistEntry>, ExtractorError>;

    /// Downloads one item, reporting transfer progress to `progress`.
    async fn download(
        &self,
        request: DownloadRequest,
        progress: JobProgress,
    ) -> Result<DownloadedMedia, ExtractorError>;
}
