//! Transcode invoker.
//!
//! This module provides the [`Transcoder`] trait and its FFmpeg implementation.
//! One call builds one argument vector from a
//! [`CompiledPipeline`](crate::pipeline::CompiledPipeline) and runs exactly
//! one external process. Retries belong to the caller.
//!
//! # Example
//!
//! ```ignore
//! use mediafetch_core::converter::{FfmpegTranscoder, Transcoder, TranscodeRequest};
//! use mediafetch_core::directive::parse;
//! use mediafetch_core::pipeline::compile;
//!
//! let transcoder = FfmpegTranscoder::with_defaults();
//! transcoder.validate().await?;
//!
//! let request = TranscodeRequest {
//!     job_id,
//!     inputs: vec![PathBuf::from("/downloads/clip.mp4")],
//!     output: PathBuf::from("/downloads/clip_fixed.mp4"),
//!     pipeline: compile(&parse("1080p upscale enhance")),
//! };
//! let outcome = transcoder.transcode(request).await?;
//! println!("Transcoded in {} ms", outcome.duration_ms);
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::ConverterConfig;
pub use error::ConverterError;
pub use ffmpeg::FfmpegTranscoder;
pub use traits::Transcoder;
pub use types::{TranscodeOutcome, TranscodeRequest};
