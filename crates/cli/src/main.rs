//! `mediafetch` command line entry point.

mod prompt;
mod report;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mediafetch_core::progress::ProgressStatus;
use mediafetch_core::{
    create_history_system, load_config, parse, resolve_tools, save_config, validate_config,
    AutoConfirmPrompt, ChannelProgressSink, Extractor, FfmpegTranscoder, HistoryStore, JobContext,
    JobId, ProgressEvent, Prompt, Scheduler, SqliteHistoryStore, YtDlpExtractor,
};

use crate::prompt::{choose_directive, TerminalPrompt};

const HISTORY_BUFFER: usize = 256;
const PROGRESS_BUFFER: usize = 1024;
const HISTORY_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Download media with a compact quality directive.
#[derive(Debug, Parser)]
#[command(name = "mediafetch", version, about)]
struct Args {
    /// URLs, or text files listing one URL per line
    #[arg(required = true, value_name = "INPUT")]
    inputs: Vec<String>,

    /// Output directory; remembered for later runs
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Quality directive, e.g. "1080p 60fps av1 sub" or "mp3 br_320k"
    #[arg(short, long, value_name = "DIRECTIVE")]
    quality: Option<String>,

    /// Number of concurrent downloads
    #[arg(short, long)]
    workers: Option<usize>,

    /// Fetch attempts per job
    #[arg(long)]
    retries: Option<u32>,

    /// Answer every question with its default
    #[arg(short, long)]
    yes: bool,

    /// Skip writing the download history
    #[arg(long)]
    no_history: bool,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,

    /// Configuration file
    #[arg(
        short,
        long,
        env = "MEDIAFETCH_CONFIG",
        default_value = "mediafetch.toml",
        value_name = "PATH"
    )]
    config: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = load_config(&args.config).context("Failed to load configuration")?;

    if let Some(output) = &args.output {
        if *output != config.output.default_dir {
            config.output.default_dir = output.clone();
            match save_config(&config, &args.config) {
                Ok(()) => info!(path = %args.config.display(), "Saved new default output directory"),
                Err(e) => warn!(error = %e, "Could not remember output directory"),
            }
        }
    }

    if let Some(workers) = args.workers {
        config.download.workers = workers;
    }
    if let Some(retries) = args.retries {
        config.download.max_retries = retries;
    }
    validate_config(&config).context("Invalid configuration")?;

    let tools = resolve_tools(
        config.tools.ffmpeg_path.as_deref(),
        config.tools.ytdlp_path.as_deref(),
    )
    .context("Required tool missing")?;
    info!(
        ffmpeg = %tools.ffmpeg.display(),
        ytdlp = %tools.ytdlp.display(),
        "Tools resolved"
    );

    let extractor: Arc<dyn Extractor> = Arc::new(YtDlpExtractor::new(
        config.extractor_config(&tools.ytdlp, &tools.ffmpeg),
    ));
    let transcoder = Arc::new(FfmpegTranscoder::new(config.converter_config(&tools.ffmpeg)));

    let prompt: Arc<dyn Prompt> = if args.yes {
        Arc::new(AutoConfirmPrompt)
    } else {
        Arc::new(TerminalPrompt::new())
    };

    let directive_text = match args.quality.clone().or_else(|| config.download.default_quality.clone()) {
        Some(text) => text,
        None if args.yes => String::new(),
        None => {
            let metadata = match first_url(&args.inputs).await {
                Some(url) => match extractor.fetch_metadata(&url).await {
                    Ok(metadata) => {
                        print_formats(&metadata);
                        Some(metadata)
                    }
                    Err(e) => {
                        warn!(url = %url, error = %e, "Could not fetch format list");
                        None
                    }
                },
                None => None,
            };
            match choose_directive(prompt.as_ref(), metadata.as_ref()).await {
                Some(text) => text,
                None => {
                    info!("Cancelled");
                    return Ok(0);
                }
            }
        }
    };
    let directive = parse(&directive_text);
    info!(directive = %directive.summary(), "Using directive");

    let (progress_sink, progress_rx) = ChannelProgressSink::channel(PROGRESS_BUFFER);
    let progress_task = tokio::spawn(log_progress(progress_rx));

    let mut ctx = JobContext::new(extractor, transcoder)
        .with_progress(Arc::new(progress_sink))
        .with_retry(config.retry_policy());

    let mut history_task = None;
    if config.history.enabled && !args.no_history {
        match SqliteHistoryStore::new(&config.history.db_path) {
            Ok(store) => {
                let store: Arc<dyn HistoryStore> = Arc::new(store);
                let (handle, writer) = create_history_system(store, HISTORY_BUFFER);
                history_task = Some(tokio::spawn(writer.run()));
                ctx = ctx.with_history(handle);
            }
            Err(e) => warn!(error = %e, "History disabled for this run"),
        }
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Interrupt received, finishing running jobs");
        let _ = shutdown_tx.send(true);
    });

    let scheduler = Scheduler::with_shutdown(
        Arc::new(ctx),
        prompt,
        config.scheduler_config(),
        shutdown_rx,
    );
    info!(workers = scheduler.workers(), inputs = args.inputs.len(), "Starting");

    let report = scheduler
        .run_inputs(&args.inputs, &config.output.default_dir, &directive)
        .await;

    // Releases the last history handle and progress sink.
    drop(scheduler);
    if let Some(task) = history_task {
        if tokio::time::timeout(HISTORY_DRAIN_TIMEOUT, task).await.is_err() {
            warn!("History writer did not finish in time");
        }
    }
    let _ = progress_task.await;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else {
        print!("{}", report::render(&report));
    }

    Ok(report::exit_code(&report))
}

/// First URL the run will fetch: the first input itself, or the first line
/// of it when it is a batch file.
async fn first_url(inputs: &[String]) -> Option<String> {
    let input = inputs.first()?;
    if Path::new(input).is_file() {
        let contents = tokio::fs::read_to_string(input).await.ok()?;
        return contents
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string);
    }
    input.contains("://").then(|| input.clone())
}

/// Prints the formats the first input offers before asking for a directive.
fn print_formats(metadata: &mediafetch_core::extractor::MediaMetadata) {
    eprintln!("{}", metadata.title);
    if let Some(count) = metadata.entry_count {
        eprintln!("  playlist with {} entries", count);
    }
    for format in metadata.formats.video.iter().take(8) {
        eprintln!(
            "  video {:>6} {:>5}p {:>4}fps {}",
            format.format_id,
            format.height.unwrap_or(0),
            format.fps.unwrap_or(0.0).round(),
            format.vcodec.as_deref().unwrap_or("?"),
        );
    }
    for format in metadata.formats.audio.iter().take(4) {
        eprintln!(
            "  audio {:>6} {:>5}k {}",
            format.format_id,
            format.abr.unwrap_or(0.0).round(),
            format.acodec.as_deref().unwrap_or("?"),
        );
    }
}

/// Logs progress events, one line per quarter of each transfer.
async fn log_progress(mut rx: mpsc::Receiver<ProgressEvent>) {
    let mut reported: HashMap<JobId, u8> = HashMap::new();

    while let Some(event) = rx.recv().await {
        match event.status {
            ProgressStatus::Downloading { percent, speed } => {
                let quarter = (percent.clamp(0.0, 100.0) / 25.0) as u8;
                let last = reported.entry(event.job_id).or_insert(0);
                if quarter > *last {
                    *last = quarter;
                    info!(
                        job_id = %event.job_id,
                        percent = %format!("{:.0}", percent),
                        speed = speed.as_deref().unwrap_or("-"),
                        "Downloading"
                    );
                } else {
                    debug!(job_id = %event.job_id, percent, "Downloading");
                }
            }
            ProgressStatus::Finished => {
                reported.remove(&event.job_id);
                info!(
                    job_id = %event.job_id,
                    file = event.filename.as_deref().unwrap_or("-"),
                    "Download finished"
                );
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_url_from_plain_input() {
        let inputs = vec!["https://x/watch?v=1".to_string(), "https://x/2".to_string()];
        assert_eq!(first_url(&inputs).await.as_deref(), Some("https://x/watch?v=1"));
        assert_eq!(first_url(&["missing.txt".to_string()]).await, None);
        assert_eq!(first_url(&[]).await, None);
    }

    #[tokio::test]
    async fn test_first_url_from_batch_file() {
        let dir = tempfile::tempdir().unwrap();
        let batch = dir.path().join("list.txt");
        std::fs::write(&batch, "\n   \n  https://x/first  \nhttps://x/second\n").unwrap();

        let inputs = vec![batch.to_string_lossy().to_string()];
        assert_eq!(first_url(&inputs).await.as_deref(), Some("https://x/first"));
    }
}
