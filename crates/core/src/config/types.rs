use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::converter::ConverterConfig;
use crate::extractor::ExtractorConfig;
use crate::job::RetryPolicy;
use crate::scheduler::{default_workers, SchedulerConfig};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory downloads are written under.
    #[serde(default = "default_output_dir")]
    pub default_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_dir: default_output_dir(),
        }
    }
}

/// The user's download directory, or `./downloads` when it cannot be found.
fn default_output_dir() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("downloads"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Total fetch attempts per job.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Pause between fetch attempts in seconds.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_secs: u64,

    /// Number of concurrent jobs.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Directive used when none is given and prompting is disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_quality: Option<String>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_backoff_secs: default_retry_backoff(),
            workers: default_workers(),
            default_quality: None,
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Explicit ffmpeg location. Looked up when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg_path: Option<PathBuf>,

    /// Explicit yt-dlp location. Looked up when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ytdlp_path: Option<PathBuf>,

    /// Timeout for one post-processing pass in seconds.
    #[serde(default = "default_transcode_timeout")]
    pub transcode_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ytdlp_path: None,
            transcode_timeout_secs: default_transcode_timeout(),
        }
    }
}

fn default_transcode_timeout() -> u64 {
    3600 // 1 hour
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_history_enabled")]
    pub enabled: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            db_path: default_history_db_path(),
            enabled: default_history_enabled(),
        }
    }
}

fn default_history_db_path() -> PathBuf {
    PathBuf::from("mediafetch-history.db")
}

fn default_history_enabled() -> bool {
    true
}

impl Config {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.download.max_retries,
            Duration::from_secs(self.download.retry_backoff_secs),
        )
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::with_workers(self.download.workers)
    }

    /// Transcoder settings for the resolved ffmpeg binary.
    pub fn converter_config(&self, ffmpeg: &Path) -> ConverterConfig {
        ConverterConfig::with_path(ffmpeg.to_path_buf())
            .with_timeout(self.tools.transcode_timeout_secs)
    }

    /// Extractor settings for the resolved binaries.
    pub fn extractor_config(&self, ytdlp: &Path, ffmpeg: &Path) -> ExtractorConfig {
        ExtractorConfig::with_path(ytdlp.to_path_buf()).with_ffmpeg_location(ffmpeg.to_path_buf())
    }
}
