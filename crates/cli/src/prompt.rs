//! Terminal prompt and the interactive directive chooser.

use async_trait::async_trait;
use inquire::{Confirm, InquireError, Select, Text};
use mediafetch_core::extractor::MediaMetadata;
use mediafetch_core::Prompt;

/// Token summary shown when the user asks for help at the custom prompt.
pub const DIRECTIVE_HELP: &str = "\
Resolution   480p 720p 1080p 2160p (any <N>p)
Frame rate   30fps 60fps (any <N>fps)
Video codec  h264 hevc av1 vp9, plus hdr and 444
Container    mp4 mkv webm mp3 aac m4a flac wav
Audio        br_<N>k sr_<N>k 16bit 24bit 32bit opus vorbis
Channels     mono stereo surround5.1 surround7.1
Filters      enhance upscale
Embedding    sub thumb meta
Other        bestquality original";

/// Prompt backed by `inquire`.
///
/// Each question runs on the blocking pool since `inquire` owns the terminal
/// while it waits. Esc and Ctrl-C both count as cancellation.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }
}

/// Maps an `inquire` result onto the prompt contract: cancelling yields
/// `None`, other failures are logged and also yield `None`.
pub fn answer<T>(result: Result<T, InquireError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Prompt failed");
            None
        }
    }
}

async fn blocking<T, F>(ask: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, InquireError> + Send + 'static,
{
    match tokio::task::spawn_blocking(ask).await {
        Ok(result) => answer(result),
        Err(e) => {
            tracing::warn!(error = %e, "Prompt task failed");
            None
        }
    }
}

#[async_trait]
impl Prompt for TerminalPrompt {
    async fn confirm(&self, message: &str, default: bool) -> Option<bool> {
        let message = message.to_string();
        blocking(move || Confirm::new(&message).with_default(default).prompt()).await
    }

    async fn select(&self, message: &str, choices: &[String]) -> Option<usize> {
        if choices.is_empty() {
            return None;
        }
        let message = message.to_string();
        let choices = choices.to_vec();
        blocking(move || {
            Select::new(&message, choices)
                .raw_prompt()
                .map(|choice| choice.index)
        })
        .await
    }

    async fn input(&self, message: &str, default: Option<&str>) -> Option<String> {
        let message = message.to_string();
        let default = default.map(str::to_string);
        blocking(move || {
            let mut text = Text::new(&message);
            if let Some(default) = default.as_deref().filter(|d| !d.is_empty()) {
                text = text.with_default(default);
            }
            text.prompt()
        })
        .await
    }
}

/// Walks the user through picking a directive.
///
/// When metadata for the first input is available, the video menu offers
/// the heights the source actually has. Returns `None` if the user cancels
/// or chooses to exit.
pub async fn choose_directive(
    prompt: &dyn Prompt,
    metadata: Option<&MediaMetadata>,
) -> Option<String> {
    let modes = vec![
        "Video".to_string(),
        "Audio only".to_string(),
        "Custom directive".to_string(),
        "Exit".to_string(),
    ];

    match prompt.select("What do you want to download?", &modes).await? {
        0 => choose_video(prompt, metadata).await,
        1 => choose_audio(prompt).await,
        2 => custom_directive(prompt).await,
        _ => None,
    }
}

async fn choose_video(prompt: &dyn Prompt, metadata: Option<&MediaMetadata>) -> Option<String> {
    let mut heights: Vec<u32> = metadata
        .map(|m| m.formats.available_heights())
        .unwrap_or_default();
    if heights.is_empty() {
        heights = vec![1080, 720];
    }
    heights.truncate(4);

    let mut presets: Vec<(String, Option<String>)> =
        vec![("Best quality".to_string(), Some("bestquality".to_string()))];
    presets.extend(
        heights
            .iter()
            .map(|h| (format!("{}p", h), Some(format!("{}p", h)))),
    );
    presets.push(("Custom".to_string(), None));

    let labels: Vec<String> = presets.iter().map(|(label, _)| label.clone()).collect();
    let index = prompt.select("Video quality", &labels).await?;

    match presets.into_iter().nth(index)?.1 {
        Some(directive) => Some(directive),
        None => custom_directive(prompt).await,
    }
}

async fn choose_audio(prompt: &dyn Prompt) -> Option<String> {
    let presets = vec![
        "MP3 192 kbps".to_string(),
        "M4A (source audio)".to_string(),
        "Custom".to_string(),
    ];

    match prompt.select("Audio format", &presets).await? {
        0 => Some("mp3 br_192k".to_string()),
        1 => Some("m4a".to_string()),
        _ => custom_directive(prompt).await,
    }
}

async fn custom_directive(prompt: &dyn Prompt) -> Option<String> {
    loop {
        let answer = prompt
            .input("Directive (e.g. 1080p 60fps av1 sub, ? for help)", None)
            .await?;
        if answer.trim() == "?" {
            eprintln!("{}", DIRECTIVE_HELP);
            continue;
        }
        return Some(answer.trim().to_string());
    }
}
