//! Tokenizer and recognizers for quality directives.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::types::{AudioCodec, BitDepth, ChannelLayout, Container, Directive, VideoCodec};

static HEIGHT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)p$").unwrap());
static FPS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)fps$").unwrap());
static BITRATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^br_(\d+)k$").unwrap());
static SAMPLE_RATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^sr_(\d+(?:\.\d+)?)k$").unwrap());
static BIT_DEPTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)bit$").unwrap());

const CHROMA_444: &str = "4:4:4";

/// Parses a directive string into a [`Directive`].
///
/// Tokens are case-insensitive and whitespace-delimited. Unknown tokens are
/// ignored. When several tokens target the same field, the largest value wins
/// (numbers by magnitude, enums by declaration order), which keeps the result
/// independent of token order.
pub fn parse(input: &str) -> Directive {
    let mut directive = Directive::default();

    for token in input.to_lowercase().split_whitespace() {
        if !apply_numeric(&mut directive, token)
            && !apply_keyword(&mut directive, token)
            && !apply_closed_set(&mut directive, token)
        {
            tracing::debug!(token, "Ignoring unrecognized directive token");
        }
    }

    directive
}

impl std::str::FromStr for Directive {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse(s))
    }
}

fn keep_max<T: Ord>(slot: &mut Option<T>, value: T) {
    match slot {
        Some(current) if *current >= value => {}
        _ => *slot = Some(value),
    }
}

fn capture_u32(re: &Regex, token: &str) -> Option<u32> {
    re.captures(token)?.get(1)?.as_str().parse().ok()
}

/// Numeric-suffixed patterns. Returns true if the token matched a pattern,
/// even when the captured value is out of range.
fn apply_numeric(directive: &mut Directive, token: &str) -> bool {
    if HEIGHT.is_match(token) {
        if let Some(height) = capture_u32(&HEIGHT, token).filter(|h| *h > 0) {
            keep_max(&mut directive.height, height);
        }
        return true;
    }

    if FPS.is_match(token) {
        if let Some(fps) = capture_u32(&FPS, token).filter(|f| *f > 0) {
            keep_max(&mut directive.fps, fps);
        }
        return true;
    }

    if BITRATE.is_match(token) {
        if let Some(kbps) = capture_u32(&BITRATE, token).filter(|b| *b > 0) {
            keep_max(&mut directive.audio_bitrate_kbps, kbps);
        }
        return true;
    }

    if let Some(caps) = SAMPLE_RATE.captures(token) {
        let hz = caps
            .get(1)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .map(|khz| khz * 1000.0)
            .filter(|hz| hz.is_finite() && *hz >= 1.0 && *hz <= u32::MAX as f64)
            .map(|hz| hz as u32);
        if let Some(hz) = hz {
            keep_max(&mut directive.sample_rate_hz, hz);
        }
        return true;
    }

    if BIT_DEPTH.is_match(token) {
        if let Some(depth) = capture_u32(&BIT_DEPTH, token).and_then(BitDepth::from_bits) {
            keep_max(&mut directive.bit_depth, depth);
        }
        return true;
    }

    false
}

/// Fixed keyword-to-field mappings.
fn apply_keyword(directive: &mut Directive, token: &str) -> bool {
    match token {
        "hdr" => directive.hdr = true,
        "444" => directive.chroma_subsampling = Some(CHROMA_444.to_string()),
        "mono" => keep_max(&mut directive.channels, ChannelLayout::Mono),
        "stereo" => keep_max(&mut directive.channels, ChannelLayout::Stereo),
        "surround5.1" => keep_max(&mut directive.channels, ChannelLayout::Surround51),
        "surround7.1" => keep_max(&mut directive.channels, ChannelLayout::Surround71),
        "original" => directive.keep_original = true,
        "bestquality" => directive.best_quality = true,
        "upscale" => directive.upscale = true,
        "enhance" => directive.enhance = true,
        "sub" => directive.embed_subtitles = true,
        "thumb" => directive.embed_thumbnail = true,
        "meta" => directive.embed_metadata = true,
        _ => return false,
    }
    true
}

/// Closed-set membership: containers, then video codecs, then audio codecs.
fn apply_closed_set(directive: &mut Directive, token: &str) -> bool {
    if let Some(container) = Container::from_token(token) {
        keep_max(&mut directive.container, container);
        return true;
    }
    if let Some(codec) = VideoCodec::from_token(token) {
        keep_max(&mut directive.video_codec, codec);
        return true;
    }
    if let Some(codec) = AudioCodec::from_token(token) {
        keep_max(&mut directive.audio_codec, codec);
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_defaults() {
        assert_eq!(parse(""), Directive::default());
        assert_eq!(parse("   \t "), Directive::default());
    }

    #[test]
    fn test_parses_full_example() {
        let d = parse("1080p 60fps BR_192k surround5.1 enhance");
        assert_eq!(d.height, Some(1080));
        assert_eq!(d.fps, Some(60));
        assert_eq!(d.audio_bitrate_kbps, Some(192));
        assert_eq!(d.channels, Some(ChannelLayout::Surround51));
        assert!(d.enhance);
        assert_eq!(d.container, None);
    }

    #[test]
    fn test_unknown_tokens_are_dropped() {
        let d = parse("1080p bogus enhance");
        let expected = Directive {
            height: Some(1080),
            enhance: true,
            ..Default::default()
        };
        assert_eq!(d, expected);
    }

    #[test]
    fn test_sample_rate_in_khz() {
        assert_eq!(parse("sr_48k").sample_rate_hz, Some(48000));
        assert_eq!(parse("sr_44.1k").sample_rate_hz, Some(44100));
        assert_eq!(parse("sr_22.05k").sample_rate_hz, Some(22050));
        assert_eq!(parse("sr_44.1.2k").sample_rate_hz, None);
    }

    #[test]
    fn test_bit_depth_outside_supported_set_ignored() {
        assert_eq!(parse("24bit").bit_depth, Some(BitDepth::TwentyFour));
        assert_eq!(parse("8bit").bit_depth, None);
    }

    #[test]
    fn test_case_insensitive() {
        let d = parse("720P HEVC MKV Thumb");
        assert_eq!(d.height, Some(720));
        assert_eq!(d.video_codec, Some(VideoCodec::Hevc));
        assert_eq!(d.container, Some(Container::Mkv));
        assert!(d.embed_thumbnail);
    }

    #[test]
    fn test_keywords() {
        let d = parse("hdr 444 original bestquality upscale sub meta opus");
        assert!(d.hdr);
        assert_eq!(d.chroma_subsampling.as_deref(), Some("4:4:4"));
        assert!(d.keep_original);
        assert!(d.best_quality);
        assert!(d.upscale);
        assert!(d.embed_subtitles);
        assert!(d.embed_metadata);
        assert_eq!(d.audio_codec, Some(AudioCodec::Opus));
    }

    #[test]
    fn test_audio_extension_selects_audio_mode() {
        assert!(parse("flac").is_audio_only());
        assert!(parse("mp3 br_320k").is_audio_only());
        assert!(!parse("webm").is_audio_only());
    }

    #[test]
    fn test_order_independent() {
        let tokens = ["1080p", "60fps", "br_192k", "wav", "24bit", "stereo", "hevc", "enhance"];
        let forward = parse(&tokens.join(" "));
        let mut reversed = tokens;
        reversed.reverse();
        assert_eq!(forward, parse(&reversed.join(" ")));

        let rotated: Vec<_> = tokens[3..].iter().chain(tokens[..3].iter()).copied().collect();
        assert_eq!(forward, parse(&rotated.join(" ")));
    }

    #[test]
    fn test_repeated_field_is_order_independent() {
        assert_eq!(parse("720p 1080p"), parse("1080p 720p"));
        assert_eq!(parse("720p 1080p").height, Some(1080));
        assert_eq!(parse("mono stereo"), parse("stereo mono"));
        assert_eq!(parse("mp4 mkv"), parse("mkv mp4"));
    }

    #[test]
    fn test_from_str() {
        let d: Directive = "480p".parse().unwrap();
        assert_eq!(d.height, Some(480));
    }

    #[test]
    fn test_zero_values_ignored() {
        let d = parse("0p 0fps br_0k");
        assert_eq!(d, Directive::default());
    }
}
