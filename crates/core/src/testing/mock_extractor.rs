//! Mock extractor for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::extractor::{
    DownloadRequest, DownloadedMedia, Extractor, ExtractorError, MediaMetadata, PlaylistEntry,
};
use crate::progress::JobProgress;

/// Mock implementation of the Extractor trait.
///
/// - Metadata and playlist members are configured per URL; unknown URLs
///   resolve to a single item.
/// - Downloads fail a configured number of times per URL, then succeed.
/// - Successful downloads write a small file into the request's output
///   directory so post-processing can work on real paths.
#[derive(Debug, Clone)]
pub struct MockExtractor {
    metadata: Arc<RwLock<HashMap<String, MediaMetadata>>>,
    metadata_failures: Arc<RwLock<Vec<String>>>,
    playlists: Arc<RwLock<HashMap<String, Vec<PlaylistEntry>>>>,
    /// Remaining download failures by URL.
    failures: Arc<RwLock<HashMap<String, u32>>>,
    downloads: Arc<RwLock<Vec<DownloadRequest>>>,
    download_delay_ms: Arc<RwLock<u64>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExtractor {
    pub fn new() -> Self {
        Self {
            metadata: Arc::new(RwLock::new(HashMap::new())),
            metadata_failures: Arc::new(RwLock::new(Vec::new())),
            playlists: Arc::new(RwLock::new(HashMap::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            downloads: Arc::new(RwLock::new(Vec::new())),
            download_delay_ms: Arc::new(RwLock::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set the metadata returned for `url`.
    pub async fn set_metadata(&self, url: &str, metadata: MediaMetadata) {
        self.metadata.write().await.insert(url.to_string(), metadata);
    }

    /// Make metadata lookups for `url` fail.
    pub async fn fail_metadata(&self, url: &str) {
        self.metadata_failures.write().await.push(url.to_string());
    }

    /// Set the members returned when flattening `url`.
    pub async fn set_playlist(&self, url: &str, entries: Vec<PlaylistEntry>) {
        self.playlists.write().await.insert(url.to_string(), entries);
    }

    /// Make the next `count` downloads of `url` fail. `u32::MAX` fails forever.
    pub async fn set_failures(&self, url: &str, count: u32) {
        self.failures.write().await.insert(url.to_string(), count);
    }

    /// Simulated duration of each download.
    pub async fn set_download_delay(&self, delay: Duration) {
        *self.download_delay_ms.write().await = delay.as_millis() as u64;
    }

    /// Every download request received, in arrival order.
    pub async fn recorded_downloads(&self) -> Vec<DownloadRequest> {
        self.downloads.read().await.clone()
    }

    /// Number of download attempts made for `url`.
    pub async fn download_count(&self, url: &str) -> usize {
        self.downloads
            .read()
            .await
            .iter()
            .filter(|r| r.url == url)
            .count()
    }

    /// Highest number of downloads observed running at once.
    pub fn max_concurrent_downloads(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn title_for(&self, url: &str) -> String {
        if let Some(meta) = self.metadata.read().await.get(url) {
            return meta.title.clone();
        }
        url.rsplit(['/', '=', '?'])
            .find(|s| !s.is_empty())
            .unwrap_or("media")
            .to_string()
    }

    /// Consumes one pending failure for `url`, returning whether this
    /// attempt should fail.
    async fn take_failure(&self, url: &str) -> bool {
        let mut failures = self.failures.write().await;
        match failures.get_mut(url) {
            Some(0) | None => false,
            Some(&mut u32::MAX) => true,
            Some(remaining) => {
                *remaining -= 1;
                true
            }
        }
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_metadata(&self, url: &str) -> Result<MediaMetadata, ExtractorError> {
        if self.metadata_failures.read().await.iter().any(|u| u == url) {
            return Err(ExtractorError::failed("mock metadata failure", None));
        }

        if let Some(meta) = self.metadata.read().await.get(url) {
            return Ok(meta.clone());
        }
        Ok(super::fixtures::single_metadata(&self.title_for(url).await))
    }

    async fn flatten_playlist(&self, url: &str) -> Result<Vec<PlaylistEntry>, ExtractorError> {
        self.playlists
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| ExtractorError::failed("mock playlist not configured", None))
    }

    async fn download(
        &self,
        request: DownloadRequest,
        progress: JobProgress,
    ) -> Result<DownloadedMedia, ExtractorError> {
        self.downloads.write().await.push(request.clone());

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = *self.download_delay_ms.read().await;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let result = if self.take_failure(&request.url).await {
            Err(ExtractorError::failed(
                "mock download failure",
                Some("ERROR: mock".to_string()),
            ))
        } else {
            let title = self.title_for(&request.url).await;
            let ext = request
                .options
                .audio_extraction
                .as_ref()
                .map(|stage| stage.codec.extension())
                .or_else(|| request.options.merge_container.map(|c| c.extension()))
                .unwrap_or("webm");
            let path: PathBuf = request.output_dir.join(format!("{}.{}", title, ext));

            progress.downloading(50.0, Some("1.00MiB/s".to_string()), Some(title.clone()));
            match tokio::fs::write(&path, b"mock media").await {
                Ok(()) => {
                    progress.finished(Some(path.to_string_lossy().to_string()));
                    Ok(DownloadedMedia { path, title })
                }
                Err(e) => Err(ExtractorError::Io(e)),
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
