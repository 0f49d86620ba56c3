//! Compiles a directive into a processing pipeline.

use crate::directive::{Container, Directive, VideoCodec};

use super::audio;
use super::types::{AudioArgs, AudioExtraction, CompiledPipeline, EmbedOptions, ProcessingMode};

/// Container used when no extension was requested and the original is not kept.
pub const DEFAULT_CONTAINER: Container = Container::Mp4;

/// Codec used when a video filter forces re-encoding without an explicit codec.
pub const DEFAULT_REENCODE_CODEC: VideoCodec = VideoCodec::H264;

/// Pixel format forced on H.264/H.265 output.
pub const COMPAT_PIXEL_FORMAT: &str = "yuv420p";

/// Extraction quality when no bitrate was requested.
pub const DEFAULT_EXTRACT_QUALITY_KBPS: u32 = 192;

/// DSP enhancement filter.
pub const ENHANCE_FILTER: &str = "crystalizer=i=2.0";

const AUDIO_SELECTOR: &str = "bestaudio/best";

/// Compiles `directive` into a [`CompiledPipeline`].
///
/// The mode is decided first from the container, then each mode's rules are
/// applied. Audio arguments are synthesized the same way in both modes.
pub fn compile(directive: &Directive) -> CompiledPipeline {
    let embed = EmbedOptions {
        subtitles: directive.embed_subtitles,
        thumbnail: directive.embed_thumbnail,
        metadata: directive.embed_metadata,
    };
    let audio = audio::synthesize(directive);

    if directive.is_audio_only() {
        return compile_audio_extraction(directive, audio, embed);
    }

    let video = match directive.height {
        Some(height) => format!("bestvideo[height<={}]", height),
        None => "bestvideo".to_string(),
    };
    let format_selector = format!("{}+{}", video, AUDIO_SELECTOR);

    // Explicit extension wins over keep-original.
    let merge_container = match directive.container {
        Some(container) => Some(container),
        None if directive.keep_original => None,
        None => Some(DEFAULT_CONTAINER),
    };

    let mut video_filters = Vec::new();
    if directive.upscale {
        if let Some(height) = directive.height {
            video_filters.push(format!("scale=-2:{}:flags=lanczos", height));
        }
    }

    let requires_reencode = !video_filters.is_empty();
    let (video_codec, pixel_format) = if requires_reencode {
        let codec = directive.video_codec.unwrap_or(DEFAULT_REENCODE_CODEC);
        let pix_fmt = codec.is_mpeg_family().then_some(COMPAT_PIXEL_FORMAT);
        (Some(codec), pix_fmt)
    } else {
        (directive.video_codec, None)
    };

    CompiledPipeline {
        mode: ProcessingMode::Video,
        format_selector,
        merge_container,
        audio_extraction: None,
        video_filters,
        video_codec,
        pixel_format,
        requires_reencode,
        audio,
        embed,
    }
}

fn compile_audio_extraction(
    directive: &Directive,
    audio: AudioArgs,
    embed: EmbedOptions,
) -> CompiledPipeline {
    let codec = directive.container.unwrap_or(Container::Mp3);

    CompiledPipeline {
        mode: ProcessingMode::AudioExtraction,
        format_selector: AUDIO_SELECTOR.to_string(),
        merge_container: None,
        audio_extraction: Some(AudioExtraction {
            codec,
            quality_kbps: directive
                .audio_bitrate_kbps
                .unwrap_or(DEFAULT_EXTRACT_QUALITY_KBPS),
        }),
        video_filters: Vec::new(),
        video_codec: None,
        pixel_format: None,
        requires_reencode: false,
        audio,
        embed,
    }
}
