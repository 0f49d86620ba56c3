//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Transcoder;
use super::types::{TranscodeOutcome, TranscodeRequest};

/// Maximum stderr lines kept for diagnostics.
const MAX_DIAGNOSTIC_LINES: usize = 50;

/// FFmpeg-based transcoder implementation.
pub struct FfmpegTranscoder {
    config: ConverterConfig,
}

impl FfmpegTranscoder {
    /// Creates a new FFmpeg transcoder with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    /// Builds the full ffmpeg argument vector.
    ///
    /// Order: inputs, video filters, video codec, audio arguments, log
    /// level, extra arguments, output.
    pub fn build_args(&self, request: &TranscodeRequest) -> Vec<String> {
        let mut args = vec!["-y".to_string()];

        for input in &request.inputs {
            args.extend(["-i".to_string(), input.to_string_lossy().to_string()]);
        }

        let pipeline = &request.pipeline;
        args.extend(pipeline.video_filter_args());
        args.extend(pipeline.video_codec_args(request.inputs.len()));
        args.extend(pipeline.audio.to_args());

        args.extend([
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ]);

        args.extend(self.config.extra_ffmpeg_args.iter().cloned());

        args.push(request.output.to_string_lossy().to_string());

        args
    }

    async fn run(&self, request: &TranscodeRequest) -> Result<TranscodeOutcome, ConverterError> {
        let start = Instant::now();

        if request.inputs.is_empty() {
            return Err(ConverterError::NoInputs);
        }
        if let Some(missing) = request.inputs.iter().find(|p| !p.exists()) {
            return Err(ConverterError::InputNotFound {
                path: missing.clone(),
            });
        }

        let args = self.build_args(request);
        tracing::debug!(job_id = %request.job_id, ?args, "Running ffmpeg");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    ConverterError::Io(e)
                }
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ConverterError::transcode_failed("stderr was not captured", None))?;
        let mut reader = BufReader::new(stderr).split(b'\n');

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut diagnostics: VecDeque<String> = VecDeque::with_capacity(MAX_DIAGNOSTIC_LINES);

            // ffmpeg echoes container metadata verbatim, which need not be UTF-8.
            while let Some(bytes) = reader.next_segment().await? {
                if diagnostics.len() == MAX_DIAGNOSTIC_LINES {
                    diagnostics.pop_front();
                }
                diagnostics.push_back(
                    String::from_utf8_lossy(&bytes)
                        .trim_end_matches('\r')
                        .to_string(),
                );
            }

            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, VecDeque<String>), std::io::Error>((status, diagnostics))
        })
        .await;

        match result {
            Ok(Ok((status, diagnostics))) => {
                if !status.success() {
                    return Err(ConverterError::transcode_failed(
                        format!("FFmpeg exited with code: {:?}", status.code()),
                        if diagnostics.is_empty() {
                            None
                        } else {
                            Some(Vec::from(diagnostics).join("\n"))
                        },
                    ));
                }
            }
            Ok(Err(e)) => return Err(ConverterError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                return Err(ConverterError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        }

        let output_meta = tokio::fs::metadata(&request.output)
            .await
            .map_err(|_| ConverterError::transcode_failed("Output file not created", None))?;

        Ok(TranscodeOutcome {
            job_id: request.job_id,
            output_path: request.output.clone(),
            output_size_bytes: output_meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn transcode(&self, request: TranscodeRequest) -> Result<TranscodeOutcome, ConverterError> {
        self.run(&request).await
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        let result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => Ok(()),
            Ok(output) => Err(ConverterError::transcode_failed(
                "ffmpeg -version failed",
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ConverterError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                })
            }
            Err(e) => Err(ConverterError::Io(e)),
        }
    }
}
