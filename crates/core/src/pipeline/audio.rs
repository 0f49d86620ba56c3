//! Audio argument synthesis.
//!
//! Bitrate and bit depth are competing targets: lossless codecs take sample
//! rate and bit depth, lossy codecs take bitrate. The branch is chosen by
//! codec family, never by which directive fields happen to be set.

use crate::directive::{Container, Directive};

use super::compiler::ENHANCE_FILTER;
use super::types::AudioArgs;

/// Codecs treated as lossless.
pub const LOSSLESS_CODECS: [&str; 4] = ["wav", "flac", "alac", "aiff"];

/// Whether `codec` belongs to the lossless set.
pub fn is_lossless_codec(codec: &str) -> bool {
    LOSSLESS_CODECS.contains(&codec)
}

/// Codec family of an output target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFamily {
    Lossless,
    Lossy,
}

impl AudioFamily {
    /// Family of the given output container. An unset container is lossy.
    pub fn of(container: Option<Container>) -> Self {
        match container {
            Some(c) if is_lossless_codec(c.extension()) => Self::Lossless,
            _ => Self::Lossy,
        }
    }
}

/// Builds the audio arguments for `directive`.
///
/// An explicit audio codec token only applies in video mode; in audio-only
/// mode the container extension decides the codec.
pub(super) fn synthesize(directive: &Directive) -> AudioArgs {
    let mut audio = AudioArgs::default();

    if directive.enhance {
        audio.filters.push(ENHANCE_FILTER.to_string());
    }

    audio.channels = directive.channels.map(|layout| layout.channel_count());

    match AudioFamily::of(directive.container) {
        AudioFamily::Lossless => {
            audio.sample_rate_hz = directive.sample_rate_hz;
            if directive.container == Some(Container::Wav) {
                audio.codec = directive.bit_depth.map(|depth| depth.pcm_codec());
            }
        }
        AudioFamily::Lossy => {
            if !directive.is_audio_only() {
                audio.codec = directive.audio_codec.map(|codec| codec.ffmpeg_encoder());
            }
            audio.bitrate_kbps = directive.audio_bitrate_kbps;
            audio.sample_rate_hz = directive.sample_rate_hz;
        }
    }

    audio
}
