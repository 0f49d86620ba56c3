//! Types for the directive module.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Output container, selected by an extension token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Container {
    Mp4,
    Mkv,
    Webm,
    Mp3,
    Flac,
    Wav,
    Aac,
    M4a,
}

impl Container {
    /// All known containers.
    pub const ALL: [Container; 8] = [
        Self::Mp4,
        Self::Mkv,
        Self::Webm,
        Self::Mp3,
        Self::Flac,
        Self::Wav,
        Self::Aac,
        Self::M4a,
    ];

    /// Returns the file extension for this container.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mkv => "mkv",
            Self::Webm => "webm",
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Aac => "aac",
            Self::M4a => "m4a",
        }
    }

    /// Whether selecting this container means audio-only processing.
    pub fn is_audio(&self) -> bool {
        matches!(
            self,
            Self::Mp3 | Self::Flac | Self::Wav | Self::Aac | Self::M4a
        )
    }

    pub(crate) fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.extension() == token)
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Requested video codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoCodec {
    Av1,
    Vp9,
    H264,
    Hevc,
}

impl VideoCodec {
    /// Returns the ffmpeg encoder name for this codec.
    pub fn ffmpeg_encoder(&self) -> &'static str {
        match self {
            Self::Av1 => "libaom-av1",
            Self::Vp9 => "libvpx-vp9",
            Self::H264 => "libx264",
            Self::Hevc => "libx265",
        }
    }

    /// Whether this codec belongs to the H.264/H.265 family.
    pub fn is_mpeg_family(&self) -> bool {
        matches!(self, Self::H264 | Self::Hevc)
    }

    pub(crate) fn from_token(token: &str) -> Option<Self> {
        match token {
            "av1" => Some(Self::Av1),
            "vp9" => Some(Self::Vp9),
            "h264" => Some(Self::H264),
            "hevc" => Some(Self::Hevc),
            _ => None,
        }
    }
}

/// Requested audio codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCodec {
    Opus,
    Vorbis,
}

impl AudioCodec {
    /// Returns the ffmpeg encoder name for this codec.
    pub fn ffmpeg_encoder(&self) -> &'static str {
        match self {
            Self::Opus => "libopus",
            Self::Vorbis => "libvorbis",
        }
    }

    pub(crate) fn from_token(token: &str) -> Option<Self> {
        match token {
            "opus" => Some(Self::Opus),
            "vorbis" => Some(Self::Vorbis),
            _ => None,
        }
    }
}

/// PCM bit depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BitDepth {
    Sixteen,
    TwentyFour,
    ThirtyTwo,
}

impl BitDepth {
    /// Maps a bit count to a supported depth.
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            16 => Some(Self::Sixteen),
            24 => Some(Self::TwentyFour),
            32 => Some(Self::ThirtyTwo),
            _ => None,
        }
    }

    pub fn bits(&self) -> u32 {
        match self {
            Self::Sixteen => 16,
            Self::TwentyFour => 24,
            Self::ThirtyTwo => 32,
        }
    }

    /// Returns the little-endian signed PCM codec for this depth.
    pub fn pcm_codec(&self) -> &'static str {
        match self {
            Self::Sixteen => "pcm_s16le",
            Self::TwentyFour => "pcm_s24le",
            Self::ThirtyTwo => "pcm_s32le",
        }
    }
}

/// Audio channel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelLayout {
    Mono,
    Stereo,
    Surround51,
    Surround71,
}

impl ChannelLayout {
    /// Number of output channels for this layout.
    pub fn channel_count(&self) -> u8 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
            Self::Surround51 => 6,
            Self::Surround71 => 8,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mono => "mono",
            Self::Stereo => "stereo",
            Self::Surround51 => "5.1",
            Self::Surround71 => "7.1",
        }
    }
}

/// Structured, fully-defaulted description of the desired output.
///
/// Built once by [`parse`](super::parse) and passed by reference afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    // Video
    /// Target height in pixels.
    pub height: Option<u32>,
    /// Target frame rate.
    pub fps: Option<u32>,
    pub video_codec: Option<VideoCodec>,
    pub hdr: bool,
    /// Chroma subsampling, e.g. `4:4:4`.
    pub chroma_subsampling: Option<String>,

    // Audio
    /// Target audio bitrate in kbps.
    pub audio_bitrate_kbps: Option<u32>,
    /// Target sample rate in Hz.
    pub sample_rate_hz: Option<u32>,
    pub bit_depth: Option<BitDepth>,
    pub channels: Option<ChannelLayout>,
    pub audio_codec: Option<AudioCodec>,
    /// Apply the DSP enhancement filter.
    pub enhance: bool,

    // Container
    /// Output container. `None` means infer.
    pub container: Option<Container>,

    // Flags
    pub keep_original: bool,
    pub best_quality: bool,
    pub upscale: bool,
    pub embed_subtitles: bool,
    pub embed_thumbnail: bool,
    pub embed_metadata: bool,
}

impl Directive {
    /// Whether the directive selects audio-only processing.
    ///
    /// The container extension is the only input to this decision.
    pub fn is_audio_only(&self) -> bool {
        self.container.is_some_and(|c| c.is_audio())
    }

    /// Whether a fetched file needs a second transcoding pass.
    pub fn needs_post_processing(&self) -> bool {
        self.enhance || self.channels.is_some() || self.upscale
    }

    /// Short human-readable summary for logs.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if let Some(h) = self.height {
            parts.push(format!("{}p", h));
        }
        if let Some(fps) = self.fps {
            parts.push(format!("{}fps", fps));
        }
        if let Some(codec) = self.video_codec {
            parts.push(format!("{:?}", codec).to_lowercase());
        }
        if self.hdr {
            parts.push("hdr".to_string());
        }
        if let Some(ref chroma) = self.chroma_subsampling {
            parts.push(chroma.clone());
        }
        if let Some(br) = self.audio_bitrate_kbps {
            parts.push(format!("{}kbps", br));
        }
        if let Some(sr) = self.sample_rate_hz {
            parts.push(format!("{}Hz", sr));
        }
        if let Some(depth) = self.bit_depth {
            parts.push(format!("{}bit", depth.bits()));
        }
        if let Some(layout) = self.channels {
            parts.push(layout.as_str().to_string());
        }
        if let Some(codec) = self.audio_codec {
            parts.push(format!("{:?}", codec).to_lowercase());
        }
        if let Some(container) = self.container {
            parts.push(container.extension().to_string());
        }
        for (enabled, name) in [
            (self.enhance, "enhance"),
            (self.keep_original, "original"),
            (self.best_quality, "bestquality"),
            (self.upscale, "upscale"),
            (self.embed_subtitles, "sub"),
            (self.embed_thumbnail, "thumb"),
            (self.embed_metadata, "meta"),
        ] {
            if enabled {
                parts.push(name.to_string());
            }
        }

        if parts.is_empty() {
            "defaults".to_string()
        } else {
            parts.join(" ")
        }
    }
}
