//! Core library of the `mediafetch` downloader.
//!
//! Directive strings are parsed into a [`Directive`], compiled into a
//! [`CompiledPipeline`] and executed as [`RetrievalJob`]s on a bounded
//! worker pool driven by the [`Scheduler`].

pub mod config;
pub mod converter;
pub mod directive;
pub mod extractor;
pub mod history;
pub mod job;
pub mod pipeline;
pub mod progress;
pub mod prompt;
pub mod scheduler;
pub mod testing;
pub mod tools;

pub use config::{
    load_config, load_config_from_str, save_config, validate_config, Config, ConfigError,
};
pub use converter::{ConverterConfig, ConverterError, FfmpegTranscoder, Transcoder};
pub use directive::{parse, Directive};
pub use extractor::{Extractor, ExtractorConfig, ExtractorError, YtDlpExtractor};
pub use history::{create_history_system, HistoryHandle, HistoryStore, SqliteHistoryStore};
pub use job::{JobContext, JobId, JobOutcome, JobResult, JobRunner, RetrievalJob, RetryPolicy};
pub use pipeline::{compile, CompiledPipeline};
pub use progress::{ChannelProgressSink, JobProgress, ProgressEvent, ProgressSink};
pub use prompt::{AutoConfirmPrompt, Prompt};
pub use scheduler::{QueueError, RunReport, RunStatus, Scheduler, SchedulerConfig};
pub use tools::{resolve_binary, resolve_tools, ResolvedTools, ToolError};
