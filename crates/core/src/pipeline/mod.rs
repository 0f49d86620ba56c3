//! Directive-to-pipeline compiler.
//!
//! [`compile`] resolves the overlapping options of a [`Directive`](crate::directive::Directive)
//! into one deterministic [`CompiledPipeline`]: the extraction format selector, the
//! merge container or audio-extraction stage, the video filter chain with its codec
//! selection, and the audio arguments chosen by codec family.
//!
//! # Example
//!
//! ```
//! use mediafetch_core::directive::parse;
//! use mediafetch_core::pipeline::{compile, ProcessingMode};
//!
//! let pipeline = compile(&parse("720p av1"));
//! assert_eq!(pipeline.mode, ProcessingMode::Video);
//! assert_eq!(pipeline.format_selector, "bestvideo[height<=720]+bestaudio/best");
//! ```

mod audio;
mod compiler;
mod types;

pub use audio::{is_lossless_codec, AudioFamily, LOSSLESS_CODECS};
pub use compiler::{
    compile, COMPAT_PIXEL_FORMAT, DEFAULT_CONTAINER, DEFAULT_EXTRACT_QUALITY_KBPS,
    DEFAULT_REENCODE_CODEC, ENHANCE_FILTER,
};
pub use types::{AudioArgs, AudioExtraction, CompiledPipeline, EmbedOptions, ProcessingMode};
