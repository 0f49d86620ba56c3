//! Types for the pipeline module.

use serde::Serialize;

use crate::directive::{Container, VideoCodec};

/// Processing mode, derived from the directive's container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    /// Video with a merged audio track.
    Video,
    /// Audio extracted into an audio-only container.
    AudioExtraction,
}

/// Audio-extraction stage performed by the extraction service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioExtraction {
    /// Target codec (the requested container extension).
    pub codec: Container,
    /// Target quality in kbps.
    pub quality_kbps: u32,
}

/// Extra artifacts embedded into the output by the extraction service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EmbedOptions {
    pub subtitles: bool,
    pub thumbnail: bool,
    pub metadata: bool,
}

/// Audio arguments for the transcoding pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AudioArgs {
    /// Output channel count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u8>,
    /// Audio filter chain, in application order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<String>,
    /// Output codec (PCM sub-format for WAV, or an explicit lossy encoder).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<&'static str>,
    /// Bitrate in kbps. Only ever set for lossy targets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate_kbps: Option<u32>,
    /// Sample rate in Hz.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate_hz: Option<u32>,
}

impl AudioArgs {
    /// Renders the arguments in canonical order: channels, filters, codec,
    /// bitrate, sample rate.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(channels) = self.channels {
            args.extend(["-ac".to_string(), channels.to_string()]);
        }
        if !self.filters.is_empty() {
            args.extend(["-af".to_string(), self.filters.join(",")]);
        }
        if let Some(codec) = self.codec {
            args.extend(["-c:a".to_string(), codec.to_string()]);
        }
        if let Some(bitrate) = self.bitrate_kbps {
            args.extend(["-b:a".to_string(), format!("{}k", bitrate)]);
        }
        if let Some(rate) = self.sample_rate_hz {
            args.extend(["-ar".to_string(), rate.to_string()]);
        }

        args
    }

    /// Whether the codec is a raw PCM sub-format.
    pub fn is_pcm(&self) -> bool {
        self.codec.is_some_and(|c| c.starts_with("pcm_"))
    }
}

/// Concrete processing plan derived from a directive.
///
/// Built fresh for every job and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledPipeline {
    pub mode: ProcessingMode,
    /// Format selector handed to the extraction service.
    pub format_selector: String,
    /// Container the extraction service merges streams into. `None` keeps the
    /// source container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_container: Option<Container>,
    /// Audio-extraction stage, present only in audio-extraction mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_extraction: Option<AudioExtraction>,
    /// Video filter chain, in application order.
    pub video_filters: Vec<String>,
    /// Video codec to encode with, when one is chosen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<VideoCodec>,
    /// Pixel format forced for player compatibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_format: Option<&'static str>,
    /// Whether video filters force re-encoding.
    pub requires_reencode: bool,
    pub audio: AudioArgs,
    pub embed: EmbedOptions,
}

impl CompiledPipeline {
    /// Video codec arguments for a transcoding pass over `input_count` inputs.
    ///
    /// Without re-encoding, merging several inputs copies the video stream
    /// unless a codec was requested; a single input with no codec defers to
    /// the engine's default.
    pub fn video_codec_args(&self, input_count: usize) -> Vec<String> {
        let mut args = Vec::new();

        match self.video_codec {
            Some(codec) => {
                args.extend(["-c:v".to_string(), codec.ffmpeg_encoder().to_string()]);
                if let Some(pix_fmt) = self.pixel_format {
                    args.extend(["-pix_fmt".to_string(), pix_fmt.to_string()]);
                }
            }
            None if !self.requires_reencode && input_count > 1 => {
                args.extend(["-c:v".to_string(), "copy".to_string()]);
            }
            None => {}
        }

        args
    }

    /// Video filter arguments (`-vf a,b`), empty when no filter applies.
    pub fn video_filter_args(&self) -> Vec<String> {
        if self.video_filters.is_empty() {
            Vec::new()
        } else {
            vec!["-vf".to_string(), self.video_filters.join(",")]
        }
    }

    /// Output extension the extraction service is expected to produce, if known.
    pub fn expected_extension(&self) -> Option<&'static str> {
        self.audio_extraction
            .as_ref()
            .map(|a| a.codec.extension())
            .or_else(|| self.merge_container.map(|c| c.extension()))
    }
}
