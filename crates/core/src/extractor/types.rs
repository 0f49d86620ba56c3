//! Types for the extractor module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::directive::Container;
use crate::pipeline::{AudioExtraction, CompiledPipeline, EmbedOptions};

/// Subtitle languages embedded when subtitles are requested.
pub const SUBTITLE_LANGUAGES: [&str; 2] = ["ko", "en"];

/// Whether a URL names a single item or a playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Single,
    Playlist,
}

/// A video-bearing format offered by the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFormatInfo {
    pub format_id: String,
    pub ext: String,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    pub vcodec: Option<String>,
}

/// An audio-only format offered by the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFormatInfo {
    pub format_id: String,
    pub ext: String,
    /// Average bitrate in kbps.
    pub abr: Option<f64>,
    pub acodec: Option<String>,
}

/// Formats offered by the source, split by stream kind.
///
/// Video formats are ordered by height then frame rate, audio formats by
/// bitrate, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatCatalog {
    pub video: Vec<VideoFormatInfo>,
    pub audio: Vec<AudioFormatInfo>,
}

impl FormatCatalog {
    pub fn new(mut video: Vec<VideoFormatInfo>, mut audio: Vec<AudioFormatInfo>) -> Self {
        video.sort_by(|a, b| {
            b.height
                .unwrap_or(0)
                .cmp(&a.height.unwrap_or(0))
                .then_with(|| b.fps.unwrap_or(0.0).total_cmp(&a.fps.unwrap_or(0.0)))
        });
        audio.sort_by(|a, b| b.abr.unwrap_or(0.0).total_cmp(&a.abr.unwrap_or(0.0)));
        Self { video, audio }
    }

    pub fn is_empty(&self) -> bool {
        self.video.is_empty() && self.audio.is_empty()
    }

    /// Distinct video heights, highest first.
    pub fn available_heights(&self) -> Vec<u32> {
        let mut heights: Vec<u32> = self.video.iter().filter_map(|f| f.height).collect();
        heights.dedup();
        heights
    }

    pub fn best_video(&self) -> Option<&VideoFormatInfo> {
        self.video.first()
    }

    pub fn best_audio(&self) -> Option<&AudioFormatInfo> {
        self.audio.first()
    }
}

/// Metadata describing what a URL resolves to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub id: Option<String>,
    pub title: String,
    pub kind: MediaKind,
    pub duration_secs: Option<f64>,
    pub thumbnail: Option<String>,
    /// Number of playlist members, when the source reports it.
    pub entry_count: Option<usize>,
    #[serde(default)]
    pub formats: FormatCatalog,
}

impl MediaMetadata {
    pub fn is_playlist(&self) -> bool {
        self.kind == MediaKind::Playlist
    }
}

/// One member of a flattened playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub url: String,
    pub title: Option<String>,
}

/// Selection constraints and post-process stages for a download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionOptions {
    pub format_selector: String,
    pub merge_container: Option<Container>,
    pub audio_extraction: Option<AudioExtraction>,
    pub embed: EmbedOptions,
    pub subtitle_languages: Vec<String>,
    /// Download only the addressed item of a playlist URL.
    pub no_playlist: bool,
    /// Continue past per-item errors.
    pub ignore_errors: bool,
}

impl ExtractionOptions {
    /// Builds the options for `pipeline`.
    pub fn from_pipeline(pipeline: &CompiledPipeline) -> Self {
        Self {
            format_selector: pipeline.format_selector.clone(),
            merge_container: pipeline.merge_container,
            audio_extraction: pipeline.audio_extraction.clone(),
            embed: pipeline.embed,
            subtitle_languages: SUBTITLE_LANGUAGES.iter().map(|s| s.to_string()).collect(),
            no_playlist: false,
            ignore_errors: false,
        }
    }

    pub fn with_no_playlist(mut self, no_playlist: bool) -> Self {
        self.no_playlist = no_playlist;
        self
    }

    pub fn with_ignore_errors(mut self, ignore_errors: bool) -> Self {
        self.ignore_errors = ignore_errors;
        self
    }
}

/// A single download call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadRequest {
    pub url: String,
    pub output_dir: PathBuf,
    /// Destination template, e.g. `/out/%(title)s.%(ext)s`.
    pub template: String,
    pub options: ExtractionOptions,
}

/// What a download produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadedMedia {
    pub path: PathBuf,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::parse;
    use crate::pipeline::compile;

    fn video(id: &str, height: u32, fps: f64) -> VideoFormatInfo {
        VideoFormatInfo {
            format_id: id.to_string(),
            ext: "mp4".to_string(),
            height: Some(height),
            fps: Some(fps),
            vcodec: Some("avc1".to_string()),
        }
    }

    fn audio(id: &str, abr: f64) -> AudioFormatInfo {
        AudioFormatInfo {
            format_id: id.to_string(),
            ext: "m4a".to_string(),
            abr: Some(abr),
            acodec: Some("mp4a.40.2".to_string()),
        }
    }

    #[test]
    fn test_catalog_ordering() {
        let catalog = FormatCatalog::new(
            vec![
                video("a", 720, 30.0),
                video("b", 1080, 30.0),
                video("c", 1080, 60.0),
                video("d", 480, 30.0),
            ],
            vec![audio("x", 128.0), audio("y", 160.0), audio("z", 48.0)],
        );

        let ids: Vec<_> = catalog.video.iter().map(|f| f.format_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a", "d"]);
        assert_eq!(catalog.available_heights(), vec![1080, 720, 480]);
        assert_eq!(catalog.best_audio().map(|f| f.format_id.as_str()), Some("y"));
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = FormatCatalog::default();
        assert!(catalog.is_empty());
        assert!(catalog.best_video().is_none());
        assert!(catalog.available_heights().is_empty());
    }

    #[test]
    fn test_options_from_video_pipeline() {
        let pipeline = compile(&parse("1080p mkv sub thumb"));
        let options = ExtractionOptions::from_pipeline(&pipeline).with_ignore_errors(true);

        assert_eq!(options.format_selector, "bestvideo[height<=1080]+bestaudio/best");
        assert_eq!(options.merge_container, Some(Container::Mkv));
        assert!(options.audio_extraction.is_none());
        assert!(options.embed.subtitles);
        assert!(options.embed.thumbnail);
        assert!(!options.embed.metadata);
        assert_eq!(options.subtitle_languages, vec!["ko", "en"]);
        assert!(options.ignore_errors);
        assert!(!options.no_playlist);
    }

    #[test]
    fn test_options_from_audio_pipeline() {
        let pipeline = compile(&parse("flac"));
        let options = ExtractionOptions::from_pipeline(&pipeline).with_no_playlist(true);

        assert_eq!(options.format_selector, "bestaudio/best");
        assert_eq!(options.merge_container, None);
        assert_eq!(
            options.audio_extraction.as_ref().map(|a| a.codec),
            Some(Container::Flac)
        );
        assert!(options.no_playlist);
    }
}
