//! Testing utilities and mock implementations.
//!
//! Mocks for every external collaborator, so the job runner and scheduler
//! can be exercised end to end without yt-dlp, ffmpeg or a terminal.
//!
//! # Example
//!
//! ```rust,ignore
//! use mediafetch_core::testing::{fixtures, MockExtractor, MockPrompt, MockTranscoder};
//!
//! let extractor = MockExtractor::new();
//! extractor.set_metadata("https://x/list", fixtures::playlist_metadata("Mix", 3)).await;
//! extractor.set_playlist("https://x/list", fixtures::playlist_entries(3)).await;
//! extractor.set_failures("https://x/broken", u32::MAX).await;
//!
//! let prompt = MockPrompt::new();
//! prompt.push_confirm(Some(true)).await;
//! ```

mod mock_extractor;
mod mock_prompt;
mod mock_transcoder;

pub use mock_extractor::MockExtractor;
pub use mock_prompt::{MockPrompt, PromptCall};
pub use mock_transcoder::MockTranscoder;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::extractor::{FormatCatalog, MediaKind, MediaMetadata, PlaylistEntry};

    /// Metadata for a single video.
    pub fn single_metadata(title: &str) -> MediaMetadata {
        MediaMetadata {
            id: Some(format!("id-{}", title.to_lowercase().replace(' ', "-"))),
            title: title.to_string(),
            kind: MediaKind::Single,
            duration_secs: Some(180.0),
            thumbnail: None,
            entry_count: None,
            formats: FormatCatalog::default(),
        }
    }

    /// Metadata for a playlist with `count` members.
    pub fn playlist_metadata(title: &str, count: usize) -> MediaMetadata {
        MediaMetadata {
            kind: MediaKind::Playlist,
            duration_secs: None,
            entry_count: Some(count),
            ..single_metadata(title)
        }
    }

    /// `count` playlist members with distinct URLs.
    pub fn playlist_entries(count: usize) -> Vec<PlaylistEntry> {
        (1..=count)
            .map(|i| PlaylistEntry {
                url: format!("https://media.example/watch?v=item{}", i),
                title: Some(format!("Item {}", i)),
            })
            .collect()
    }
}
