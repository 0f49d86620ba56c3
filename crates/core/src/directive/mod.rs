//! Quality directive grammar.
//!
//! A directive is a compact, whitespace-delimited string such as
//! `"1080p 60fps br_192k surround5.1 enhance"` describing the desired output.
//! Parsing is total: unknown tokens are dropped and every field has an explicit
//! default, so a [`Directive`] is never in a partially-initialized state.
//!
//! # Example
//!
//! ```
//! use mediafetch_core::directive::{parse, Container};
//!
//! let directive = parse("720p av1 mkv");
//! assert_eq!(directive.height, Some(720));
//! assert_eq!(directive.container, Some(Container::Mkv));
//! assert!(!directive.is_audio_only());
//! ```

mod parser;
mod types;

pub use parser::parse;
pub use types::{AudioCodec, BitDepth, ChannelLayout, Container, Directive, VideoCodec};
