//! yt-dlp-based extractor implementation.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use super::config::ExtractorConfig;
use super::error::ExtractorError;
use super::traits::Extractor;
use super::types::{
    AudioFormatInfo, DownloadRequest, DownloadedMedia, FormatCatalog, MediaKind, MediaMetadata,
    PlaylistEntry, VideoFormatInfo,
};
use crate::progress::JobProgress;

/// Prefix identifying our progress lines among yt-dlp's output.
const PROGRESS_MARKER: &str = "[mediafetch]";

/// Fields: status, percent, speed, filename.
const PROGRESS_TEMPLATE: &str = "download:[mediafetch] %(progress.status)s|%(progress._percent_str)s|%(progress._speed_str)s|%(progress.filename)s";

/// Printed once the file reached its final location.
const FINAL_PATH_TEMPLATE: &str = "after_move:%(.{title,filepath})j";

/// Maximum stderr lines kept for diagnostics.
const MAX_DIAGNOSTIC_LINES: usize = 20;

/// Watch URL built for flat playlist entries that only carry a video id.
const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

static LIST_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]list=([A-Za-z0-9_-]+)").expect("valid list regex"));

static ANSI_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("valid ansi regex"));

/// Rewrites a URL carrying a `list=` parameter into the canonical playlist URL.
///
/// Watch URLs inside a playlist otherwise flatten to the single video.
pub fn normalize_playlist_url(url: &str) -> String {
    match LIST_PARAM.captures(url) {
        Some(caps) => format!("https://www.youtube.com/playlist?list={}", &caps[1]),
        None => url.to_string(),
    }
}

/// A parsed progress line.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressLine {
    Downloading {
        percent: f32,
        speed: Option<String>,
        filename: Option<String>,
    },
    Finished {
        filename: Option<String>,
    },
}

/// Parses one line produced by the progress template. Returns `None` for any
/// other output.
pub fn parse_progress_line(line: &str) -> Option<ProgressLine> {
    let clean = ANSI_ESCAPE.replace_all(line, "");
    let rest = clean.trim().strip_prefix(PROGRESS_MARKER)?;

    let mut fields = rest.trim_start().splitn(4, '|');
    let status = fields.next()?.trim();
    let percent = fields.next().and_then(known).and_then(|p| {
        p.trim_end_matches('%').trim().parse::<f32>().ok()
    });
    let speed = fields.next().and_then(known).map(str::to_string);
    let filename = fields.next().and_then(known).map(str::to_string);

    match status {
        "downloading" => Some(ProgressLine::Downloading {
            percent: percent.unwrap_or(0.0),
            speed,
            filename,
        }),
        "finished" => Some(ProgressLine::Finished { filename }),
        _ => None,
    }
}

/// Filters out yt-dlp's placeholders for unavailable fields.
fn known(field: &str) -> Option<&str> {
    let field = field.trim();
    match field {
        "" | "NA" | "N/A" | "Unknown" | "Unknown B/s" => None,
        other => Some(other),
    }
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    #[serde(rename = "_type", default)]
    kind: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    playlist_count: Option<usize>,
    #[serde(default)]
    formats: Option<Vec<RawFormat>>,
    #[serde(default)]
    entries: Option<Vec<Option<RawEntry>>>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    #[serde(default)]
    format_id: Option<String>,
    #[serde(default)]
    ext: Option<String>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    fps: Option<f64>,
    #[serde(default)]
    vcodec: Option<String>,
    #[serde(default)]
    acodec: Option<String>,
    #[serde(default)]
    abr: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    webpage_url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    formats: Option<Vec<RawFormat>>,
}

#[derive(Debug, Deserialize)]
struct PrintedMedia {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    filepath: Option<String>,
}

fn has_codec(codec: &Option<String>) -> Option<bool> {
    codec.as_deref().map(|c| c != "none")
}

fn build_catalog(formats: Vec<RawFormat>) -> FormatCatalog {
    let mut video = Vec::new();
    let mut audio = Vec::new();

    for f in formats {
        let format_id = f.format_id.unwrap_or_default();
        let ext = f.ext.unwrap_or_default();
        let is_video = has_codec(&f.vcodec).unwrap_or(f.height.is_some());
        let is_audio = has_codec(&f.acodec).unwrap_or(false);

        if is_video {
            video.push(VideoFormatInfo {
                format_id,
                ext,
                height: f.height,
                fps: f.fps,
                vcodec: f.vcodec,
            });
        } else if is_audio {
            audio.push(AudioFormatInfo {
                format_id,
                ext,
                abr: f.abr,
                acodec: f.acodec,
            });
        }
    }

    FormatCatalog::new(video, audio)
}

/// Parses the `-J` dump of a URL.
pub(crate) fn parse_metadata(json: &str) -> Result<MediaMetadata, ExtractorError> {
    let raw: RawInfo = serde_json::from_str(json)?;

    let kind = match raw.kind.as_deref() {
        Some("playlist") | Some("multi_video") => MediaKind::Playlist,
        _ => MediaKind::Single,
    };
    let entry_count = raw
        .playlist_count
        .or_else(|| raw.entries.as_ref().map(|e| e.len()))
        .filter(|_| kind == MediaKind::Playlist);

    let mut formats = raw.formats.unwrap_or_default();
    let mut duration = raw.duration;
    let mut thumbnail = raw.thumbnail;

    // Playlist dumps leave these empty at the top level; take them from the
    // first member that resolved its formats.
    if formats.is_empty() {
        let first = raw.entries.unwrap_or_default().into_iter().flatten().find(|entry| {
            entry.formats.as_ref().is_some_and(|f| !f.is_empty())
        });
        if let Some(entry) = first {
            formats = entry.formats.unwrap_or_default();
            duration = duration.or(entry.duration);
            thumbnail = thumbnail.or(entry.thumbnail);
        }
    }

    Ok(MediaMetadata {
        id: raw.id,
        title: raw.title.unwrap_or_default(),
        kind,
        duration_secs: duration,
        thumbnail,
        entry_count,
        formats: build_catalog(formats),
    })
}

/// Parses the `--flat-playlist -J` dump of a playlist.
pub(crate) fn parse_playlist(json: &str) -> Result<Vec<PlaylistEntry>, ExtractorError> {
    let raw: RawInfo = serde_json::from_str(json)?;

    let entries = raw
        .entries
        .ok_or_else(|| ExtractorError::invalid_output("playlist dump has no entries"))?;

    Ok(entries
        .into_iter()
        .flatten()
        .filter_map(|entry| {
            let url = entry
                .url
                .or(entry.webpage_url)
                .or_else(|| entry.id.map(|id| format!("{}{}", WATCH_URL_PREFIX, id)))?;
            Some(PlaylistEntry {
                url,
                title: entry.title,
            })
        })
        .collect())
}

/// Picks the most useful line out of captured stderr.
fn error_summary(diagnostics: &[String]) -> Option<String> {
    diagnostics
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| diagnostics.iter().rev().find(|l| !l.trim().is_empty()))
        .map(|l| l.trim().to_string())
}

/// yt-dlp-based extractor implementation.
pub struct YtDlpExtractor {
    config: ExtractorConfig,
}

impl YtDlpExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ExtractorConfig::default())
    }

    pub fn metadata_args(&self, url: &str) -> Vec<String> {
        let mut args: Vec<String> = ["-J", "--playlist-items", "1", "--no-warnings"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.extend(self.config.extra_args.iter().cloned());
        args.extend(["--".to_string(), url.to_string()]);
        args
    }

    pub fn flatten_args(&self, url: &str) -> Vec<String> {
        let mut args: Vec<String> = ["--flat-playlist", "-J", "--no-warnings"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.extend(self.config.extra_args.iter().cloned());
        args.extend(["--".to_string(), normalize_playlist_url(url)]);
        args
    }

    /// Builds the full download argument vector.
    pub fn download_args(&self, request: &DownloadRequest) -> Vec<String> {
        let options = &request.options;
        let mut args: Vec<String> = vec![
            "--no-simulate".into(),
            "--newline".into(),
            "--progress".into(),
            "--progress-template".into(),
            PROGRESS_TEMPLATE.into(),
            "--print".into(),
            FINAL_PATH_TEMPLATE.into(),
            "-f".into(),
            options.format_selector.clone(),
        ];

        if let Some(container) = options.merge_container {
            args.extend(["--merge-output-format".to_string(), container.extension().to_string()]);
        }

        if let Some(stage) = &options.audio_extraction {
            args.extend([
                "-x".to_string(),
                "--audio-format".to_string(),
                stage.codec.extension().to_string(),
                "--audio-quality".to_string(),
                format!("{}K", stage.quality_kbps),
            ]);
        }

        if options.embed.subtitles {
            args.extend([
                "--embed-subs".to_string(),
                "--sub-langs".to_string(),
                options.subtitle_languages.join(","),
            ]);
        }
        if options.embed.thumbnail {
            args.push("--embed-thumbnail".into());
        }
        if options.embed.metadata {
            args.push("--embed-metadata".into());
        }
        if options.no_playlist {
            args.push("--no-playlist".into());
        }
        if options.ignore_errors {
            args.push("--ignore-errors".into());
        }

        if let Some(ffmpeg) = &self.config.ffmpeg_location {
            args.extend([
                "--ffmpeg-location".to_string(),
                ffmpeg.to_string_lossy().to_string(),
            ]);
        }

        args.extend(self.config.extra_args.iter().cloned());
        args.extend(["-o".to_string(), request.template.clone()]);
        args.extend(["--".to_string(), request.url.clone()]);

        args
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.config.ytdlp_path);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, e: std::io::Error) -> ExtractorError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ExtractorError::NotFound {
                path: self.config.ytdlp_path.clone(),
            }
        } else {
            ExtractorError::Io(e)
        }
    }

    /// Runs yt-dlp to completion and returns its stdout.
    async fn run_to_string(&self, args: &[String]) -> Result<String, ExtractorError> {
        tracing::debug!(?args, "Running yt-dlp");

        let child = self.command(args).spawn().map_err(|e| self.spawn_error(e))?;
        let timeout_secs = self.config.metadata_timeout_secs;

        let output = timeout(Duration::from_secs(timeout_secs), child.wait_with_output())
            .await
            .map_err(|_| ExtractorError::Timeout { timeout_secs })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let lines: Vec<String> = stderr.lines().map(String::from).collect();
            let reason = error_summary(&lines)
                .unwrap_or_else(|| format!("yt-dlp exited with code: {:?}", output.status.code()));
            return Err(ExtractorError::failed(reason, Some(stderr)));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn run_download(
        &self,
        request: &DownloadRequest,
        progress: &JobProgress,
    ) -> Result<DownloadedMedia, ExtractorError> {
        let args = self.download_args(request);
        tracing::debug!(job_id = %progress.job_id(), ?args, "Running yt-dlp download");

        let mut child = self.command(&args).spawn().map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExtractorError::failed("stdout was not captured", None))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ExtractorError::failed("stderr was not captured", None))?;
        let mut out_lines = BufReader::new(stdout).split(b'\n');
        let mut err_lines = BufReader::new(stderr).split(b'\n');

        let timeout_secs = self.config.download_timeout_secs;
        let result = timeout(Duration::from_secs(timeout_secs), async {
            let mut printed: Option<PrintedMedia> = None;
            let mut diagnostics: VecDeque<String> = VecDeque::with_capacity(MAX_DIAGNOSTIC_LINES);
            let mut out_done = false;
            let mut err_done = false;

            while !(out_done && err_done) {
                tokio::select! {
                    line = out_lines.next_segment(), if !out_done => match line? {
                        Some(bytes) => {
                            let line = decode_line(&bytes);
                            if !forward_progress(&line, progress) {
                                if let Ok(media) = serde_json::from_str::<PrintedMedia>(line.trim()) {
                                    printed = Some(media);
                                }
                            }
                        }
                        None => out_done = true,
                    },
                    line = err_lines.next_segment(), if !err_done => match line? {
                        Some(bytes) => {
                            let line = decode_line(&bytes);
                            if !forward_progress(&line, progress) {
                                if diagnostics.len() == MAX_DIAGNOSTIC_LINES {
                                    diagnostics.pop_front();
                                }
                                diagnostics.push_back(line);
                            }
                        }
                        None => err_done = true,
                    },
                }
            }

            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, printed, Vec::from(diagnostics)))
        })
        .await;

        let (status, printed, diagnostics) = match result {
            Ok(inner) => inner?,
            Err(_) => {
                let _ = child.kill().await;
                return Err(ExtractorError::Timeout { timeout_secs });
            }
        };

        // With --ignore-errors a non-zero exit can still leave a finished file.
        if !status.success() && !(request.options.ignore_errors && printed.is_some()) {
            let reason = error_summary(&diagnostics)
                .unwrap_or_else(|| format!("yt-dlp exited with code: {:?}", status.code()));
            return Err(ExtractorError::failed(
                reason,
                Some(diagnostics.join("\n")).filter(|s| !s.is_empty()),
            ));
        }

        let printed = printed
            .ok_or_else(|| ExtractorError::invalid_output("yt-dlp did not report a final path"))?;
        let path = printed
            .filepath
            .map(PathBuf::from)
            .ok_or_else(|| ExtractorError::invalid_output("final path missing from output"))?;
        let title = printed.title.unwrap_or_else(|| title_from_path(&path));

        Ok(DownloadedMedia { path, title })
    }
}

fn forward_progress(line: &str, progress: &JobProgress) -> bool {
    match parse_progress_line(line) {
        Some(ProgressLine::Downloading {
            percent,
            speed,
            filename,
        }) => {
            progress.downloading(percent, speed, filename);
            true
        }
        Some(ProgressLine::Finished { filename }) => {
            progress.finished(filename);
            true
        }
        None => false,
    }
}

/// Decodes one output line, tolerating non-UTF-8 bytes.
fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end_matches('\r').to_string()
}

fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch_metadata(&self, url: &str) -> Result<MediaMetadata, ExtractorError> {
        let json = self.run_to_string(&self.metadata_args(url)).await?;
        parse_metadata(&json)
    }

    async fn flatten_playlist(&self, url: &str) -> Result<Vec<PlaylistEntry>, ExtractorError> {
        let json = self.run_to_string(&self.flatten_args(url)).await?;
        parse_playlist(&json)
    }

    async fn download(
        &self,
        request: DownloadRequest,
        progress: JobProgress,
    ) -> Result<DownloadedMedia, ExtractorError> {
        self.run_download(&request, &progress).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::parse;
    use crate::extractor::ExtractionOptions;
    use crate::job::JobId;
    use crate::pipeline::compile;
    use crate::progress::{ChannelProgressSink, ProgressStatus};
    use std::sync::Arc;

    fn request(directive: &str) -> DownloadRequest {
        let pipeline = compile(&parse(directive));
        DownloadRequest {
            url: "https://www.youtube.com/watch?v=abc".to_string(),
            output_dir: PathBuf::from("/out"),
            template: "/out/%(title)s.%(ext)s".to_string(),
            options: ExtractionOptions::from_pipeline(&pipeline),
        }
    }

    fn pair(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find(|w| w[0] == flag).map(|w| w[1].clone())
    }

    #[test]
    fn test_normalize_playlist_url() {
        assert_eq!(
            normalize_playlist_url("https://www.youtube.com/watch?v=abc&list=PL123_x-Y"),
            "https://www.youtube.com/playlist?list=PL123_x-Y"
        );
        assert_eq!(
            normalize_playlist_url("https://www.youtube.com/playlist?list=PL9"),
            "https://www.youtube.com/playlist?list=PL9"
        );
        assert_eq!(
            normalize_playlist_url("https://example.com/video/1"),
            "https://example.com/video/1"
        );
    }

    #[test]
    fn test_parse_progress_downloading() {
        let line = "[mediafetch] downloading|  45.2%|  1.20MiB/s|/out/clip.f137.mp4";
        assert_eq!(
            parse_progress_line(line),
            Some(ProgressLine::Downloading {
                percent: 45.2,
                speed: Some("1.20MiB/s".to_string()),
                filename: Some("/out/clip.f137.mp4".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_progress_placeholders_and_colors() {
        let line = "[mediafetch] downloading|\x1b[0;94m  3.0%\x1b[0m|Unknown B/s|NA";
        assert_eq!(
            parse_progress_line(line),
            Some(ProgressLine::Downloading {
                percent: 3.0,
                speed: None,
                filename: None,
            })
        );
    }

    #[test]
    fn test_parse_progress_finished_and_other_lines() {
        assert_eq!(
            parse_progress_line("[mediafetch] finished|100%|NA|/out/a.mp4"),
            Some(ProgressLine::Finished {
                filename: Some("/out/a.mp4".to_string())
            })
        );
        assert_eq!(parse_progress_line("[mediafetch] error|NA|NA|NA"), None);
        assert_eq!(parse_progress_line("[youtube] abc: Downloading webpage"), None);
        assert_eq!(parse_progress_line(""), None);
    }

    #[test]
    fn test_parse_metadata_single() {
        let json = r#"{
            "_type": "video",
            "id": "abc",
            "title": "Some Clip",
            "duration": 212,
            "thumbnail": "https://i.ytimg.com/vi/abc/hq.jpg",
            "formats": [
                {"format_id": "sb0", "ext": "mhtml", "vcodec": "none", "acodec": "none"},
                {"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a.40.2", "abr": 129.5},
                {"format_id": "251", "ext": "webm", "vcodec": "none", "acodec": "opus", "abr": 135.1},
                {"format_id": "137", "ext": "mp4", "vcodec": "avc1.640028", "acodec": "none", "height": 1080, "fps": 30},
                {"format_id": "299", "ext": "mp4", "vcodec": "avc1.64002a", "acodec": "none", "height": 1080, "fps": 60},
                {"format_id": "136", "ext": "mp4", "vcodec": "avc1.4d401f", "acodec": "none", "height": 720, "fps": null}
            ]
        }"#;

        let meta = parse_metadata(json).unwrap();
        assert_eq!(meta.kind, MediaKind::Single);
        assert_eq!(meta.title, "Some Clip");
        assert_eq!(meta.duration_secs, Some(212.0));
        assert_eq!(meta.entry_count, None);
        assert_eq!(meta.formats.video.len(), 3);
        assert_eq!(meta.formats.audio.len(), 2);
        assert_eq!(meta.formats.best_video().unwrap().format_id, "299");
        assert_eq!(meta.formats.best_audio().unwrap().format_id, "251");
        assert_eq!(meta.formats.available_heights(), vec![1080, 720]);
    }

    #[test]
    fn test_parse_metadata_playlist() {
        let json = r#"{
            "_type": "playlist",
            "id": "PL123",
            "title": "Mix: Best/Of?",
            "playlist_count": 12,
            "entries": [
                null,
                {"id": "a", "title": "first", "formats": []},
                {
                    "id": "b",
                    "title": "second",
                    "duration": 100,
                    "thumbnail": "t.jpg",
                    "formats": [
                        {"format_id": "137", "ext": "mp4", "vcodec": "avc1", "acodec": "none", "height": 1080, "fps": 30},
                        {"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a.40.2", "abr": 129.5}
                    ]
                }
            ]
        }"#;

        let meta = parse_metadata(json).unwrap();
        assert!(meta.is_playlist());
        assert_eq!(meta.entry_count, Some(12));
        assert_eq!(meta.formats.available_heights(), vec![1080]);
        assert_eq!(meta.formats.audio.len(), 1);
        assert_eq!(meta.duration_secs, Some(100.0));
        assert_eq!(meta.thumbnail.as_deref(), Some("t.jpg"));
    }

    #[test]
    fn test_parse_metadata_playlist_without_resolved_entries() {
        let json = r#"{"_type": "playlist", "title": "Flat", "entries": [{"id": "a"}]}"#;

        let meta = parse_metadata(json).unwrap();
        assert!(meta.formats.is_empty());
        assert_eq!(meta.duration_secs, None);
        assert_eq!(meta.entry_count, Some(1));
    }

    #[test]
    fn test_parse_metadata_rejects_garbage() {
        assert!(matches!(
            parse_metadata("not json"),
            Err(ExtractorError::InvalidOutput { .. })
        ));
    }

    #[test]
    fn test_parse_playlist_entries() {
        let json = r#"{
            "_type": "playlist",
            "title": "List",
            "entries": [
                {"url": "https://www.youtube.com/watch?v=a", "title": "A"},
                null,
                {"webpage_url": "https://www.youtube.com/watch?v=b"},
                {"id": "abc123", "title": "C"},
                {"title": "nothing to fetch"}
            ]
        }"#;

        let entries = parse_playlist(json).unwrap();
        assert_eq!(
            entries,
            vec![
                PlaylistEntry {
                    url: "https://www.youtube.com/watch?v=a".to_string(),
                    title: Some("A".to_string()),
                },
                PlaylistEntry {
                    url: "https://www.youtube.com/watch?v=b".to_string(),
                    title: None,
                },
                PlaylistEntry {
                    url: "https://www.youtube.com/watch?v=abc123".to_string(),
                    title: Some("C".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_metadata_and_flatten_args() {
        let extractor = YtDlpExtractor::with_defaults();
        let args = extractor.metadata_args("https://x/y");
        assert_eq!(pair(&args, "--playlist-items").as_deref(), Some("1"));
        assert_eq!(args.last().map(String::as_str), Some("https://x/y"));

        let args = extractor.flatten_args("https://www.youtube.com/watch?v=a&list=PL1");
        assert!(args.contains(&"--flat-playlist".to_string()));
        assert_eq!(
            args.last().map(String::as_str),
            Some("https://www.youtube.com/playlist?list=PL1")
        );
    }

    #[test]
    fn test_download_args_video() {
        let extractor = YtDlpExtractor::new(
            ExtractorConfig::default().with_ffmpeg_location(PathBuf::from("/opt/ffmpeg")),
        );
        let args = extractor.download_args(&request("720p sub meta"));

        assert_eq!(pair(&args, "-f").as_deref(), Some("bestvideo[height<=720]+bestaudio/best"));
        assert_eq!(pair(&args, "--merge-output-format").as_deref(), Some("mp4"));
        assert_eq!(pair(&args, "--sub-langs").as_deref(), Some("ko,en"));
        assert_eq!(pair(&args, "--ffmpeg-location").as_deref(), Some("/opt/ffmpeg"));
        assert_eq!(pair(&args, "-o").as_deref(), Some("/out/%(title)s.%(ext)s"));
        assert!(args.contains(&"--embed-metadata".to_string()));
        assert!(!args.contains(&"--embed-thumbnail".to_string()));
        assert!(!args.contains(&"-x".to_string()));
        let n = args.len();
        assert_eq!(&args[n - 2..], &["--", "https://www.youtube.com/watch?v=abc"]);
    }

    #[test]
    fn test_download_args_audio_extraction() {
        let extractor = YtDlpExtractor::with_defaults();
        let mut req = request("mp3 br_320k");
        req.options = req.options.with_no_playlist(true).with_ignore_errors(true);
        let args = extractor.download_args(&req);

        assert_eq!(pair(&args, "-f").as_deref(), Some("bestaudio/best"));
        assert_eq!(pair(&args, "--audio-format").as_deref(), Some("mp3"));
        assert_eq!(pair(&args, "--audio-quality").as_deref(), Some("320K"));
        assert!(args.contains(&"--no-playlist".to_string()));
        assert!(args.contains(&"--ignore-errors".to_string()));
        assert!(!args.contains(&"--merge-output-format".to_string()));
    }

    #[test]
    fn test_download_args_keep_original() {
        let extractor = YtDlpExtractor::with_defaults();
        let args = extractor.download_args(&request("original"));
        assert!(!args.contains(&"--merge-output-format".to_string()));
    }

    #[test]
    fn test_forward_progress_reports_to_sink() {
        let (sink, mut rx) = ChannelProgressSink::channel(4);
        let job_id = JobId::new();
        let progress = JobProgress::new(job_id, Arc::new(sink));

        assert!(forward_progress("[mediafetch] downloading|50.0%|1MiB/s|a.mp4", &progress));
        assert!(!forward_progress("{\"title\": \"x\"}", &progress));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.job_id, job_id);
        assert!(matches!(event.status, ProgressStatus::Downloading { percent, .. } if percent == 50.0));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_error_summary_prefers_error_line() {
        let lines = vec![
            "WARNING: something".to_string(),
            "ERROR: [youtube] abc: Video unavailable".to_string(),
            "".to_string(),
        ];
        assert_eq!(
            error_summary(&lines).as_deref(),
            Some("ERROR: [youtube] abc: Video unavailable")
        );
        assert_eq!(error_summary(&[]), None);
    }

    #[tokio::test]
    async fn test_missing_binary_is_reported() {
        let extractor =
            YtDlpExtractor::new(ExtractorConfig::with_path(PathBuf::from("/nonexistent/yt-dlp")));
        let result = extractor.fetch_metadata("https://x/y").await;
        assert!(matches!(result, Err(ExtractorError::NotFound { .. })));
    }

    #[cfg(unix)]
    fn fake_ytdlp(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("yt-dlp");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_download_reads_final_path_and_progress() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_ytdlp(
            dir.path(),
            r#"echo '[mediafetch] downloading|  50.0%|1.00MiB/s|/out/Clip.f137.mp4'
echo '[youtube] abc: Downloading webpage' >&2
echo '{"title": "Clip", "filepath": "/out/Clip.mp4"}'"#,
        );
        let extractor = YtDlpExtractor::new(ExtractorConfig::with_path(script));
        let (sink, mut rx) = ChannelProgressSink::channel(8);
        let job_id = JobId::new();

        let media = extractor
            .download(request("720p"), JobProgress::new(job_id, Arc::new(sink)))
            .await
            .unwrap();

        assert_eq!(media.path, PathBuf::from("/out/Clip.mp4"));
        assert_eq!(media.title, "Clip");
        let event = rx.try_recv().unwrap();
        assert_eq!(event.job_id, job_id);
        assert!(matches!(event.status, ProgressStatus::Downloading { percent, .. } if percent == 50.0));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_download_failure_carries_error_line() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_ytdlp(
            dir.path(),
            "echo 'WARNING: slow' >&2\nprintf '\\377 junk\\n' >&2\necho 'ERROR: [youtube] abc: Video unavailable' >&2\nexit 1",
        );
        let extractor = YtDlpExtractor::new(ExtractorConfig::with_path(script));

        let err = extractor
            .download(request("720p"), JobProgress::noop(JobId::new()))
            .await
            .unwrap_err();

        match err {
            ExtractorError::Failed { reason, stderr } => {
                assert_eq!(reason, "ERROR: [youtube] abc: Video unavailable");
                let stderr = stderr.unwrap();
                assert!(stderr.contains("WARNING: slow"));
                assert!(stderr.contains("\u{FFFD} junk"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ignore_errors_accepts_printed_path() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_ytdlp(
            dir.path(),
            r#"echo '{"title": "Kept", "filepath": "/out/batch/Kept.mp4"}'
echo 'ERROR: one member failed' >&2
exit 1"#,
        );
        let extractor = YtDlpExtractor::new(ExtractorConfig::with_path(script));

        let mut strict = request("720p");
        strict.options = strict.options.with_ignore_errors(false);
        assert!(extractor
            .download(strict, JobProgress::noop(JobId::new()))
            .await
            .is_err());

        let mut lenient = request("720p");
        lenient.options = lenient.options.with_ignore_errors(true);
        let media = extractor
            .download(lenient, JobProgress::noop(JobId::new()))
            .await
            .unwrap();
        assert_eq!(media.path, PathBuf::from("/out/batch/Kept.mp4"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_download_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_ytdlp(dir.path(), "exec sleep 10");
        let mut config = ExtractorConfig::with_path(script);
        config.download_timeout_secs = 1;
        let extractor = YtDlpExtractor::new(config);

        let err = extractor
            .download(request("720p"), JobProgress::noop(JobId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractorError::Timeout { timeout_secs: 1 }));
    }
}
