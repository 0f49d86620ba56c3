//! Extraction service.
//!
//! Resolves URLs into metadata, enumerates playlists and downloads media.
//! [`YtDlpExtractor`] shells out to `yt-dlp`; tests use the mock in
//! `crate::testing`.

mod config;
mod error;
mod traits;
mod types;
mod ytdlp;

pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use traits::Extractor;
pub use types::{
    AudioFormatInfo, DownloadRequest, DownloadedMedia, ExtractionOptions, FormatCatalog,
    MediaKind, MediaMetadata, PlaylistEntry, VideoFormatInfo, SUBTITLE_LANGUAGES,
};
pub use ytdlp::{normalize_playlist_url, parse_progress_line, ProgressLine, YtDlpExtractor};
