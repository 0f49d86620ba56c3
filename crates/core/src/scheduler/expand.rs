//! Expansion of raw inputs into jobs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::QueueError;
use crate::directive::Directive;
use crate::extractor::Extractor;
use crate::job::{JobOptions, RetrievalJob};
use crate::prompt::Prompt;

/// Directory name used when a playlist title sanitizes to nothing.
pub const PLAYLIST_FALLBACK_TITLE: &str = "Playlist";

/// Keeps alphanumerics, spaces, underscores and hyphens, then trims.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        PLAYLIST_FALLBACK_TITLE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Inputs without a scheme that end in `.txt` are meant as batch files.
fn looks_like_batch_file(input: &str) -> bool {
    !input.contains("://")
        && Path::new(input)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}

async fn ensure_dir(path: &Path) -> Result<(), QueueError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| QueueError::OutputDir {
            path: path.to_path_buf(),
            source,
        })
}

/// Turns raw inputs into jobs, consulting the extraction service for
/// playlist detection and the prompt for playlist confirmation.
#[derive(Clone)]
pub struct QueueExpander {
    extractor: Arc<dyn Extractor>,
    prompt: Arc<dyn Prompt>,
}

impl QueueExpander {
    pub fn new(extractor: Arc<dyn Extractor>, prompt: Arc<dyn Prompt>) -> Self {
        Self { extractor, prompt }
    }

    /// Expands every input in order. Failed groups are logged and skipped.
    pub async fn expand(
        &self,
        inputs: &[String],
        output_root: &Path,
        directive: &Directive,
    ) -> Vec<RetrievalJob> {
        let mut jobs = Vec::new();

        for input in inputs {
            match self.expand_input(input, output_root, directive).await {
                Ok(group) => {
                    tracing::debug!(input = %input, jobs = group.len(), "Expanded input");
                    jobs.extend(group);
                }
                Err(e) => tracing::error!(input = %input, error = %e, "Skipping input"),
            }
        }

        jobs
    }

    /// Expands one input into zero or more jobs.
    pub async fn expand_input(
        &self,
        input: &str,
        output_root: &Path,
        directive: &Directive,
    ) -> Result<Vec<RetrievalJob>, QueueError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let path = Path::new(input);
        if path.is_file() {
            return self.expand_batch(path, output_root, directive).await;
        }
        if looks_like_batch_file(input) {
            return Err(QueueError::BatchFile {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }

        self.expand_url(input, output_root, directive).await
    }

    async fn expand_batch(
        &self,
        path: &Path,
        output_root: &Path,
        directive: &Directive,
    ) -> Result<Vec<RetrievalJob>, QueueError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| QueueError::BatchFile {
                    path: path.to_path_buf(),
                    source,
                })?;

        let group = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let dir = output_root.join(group);

        let options = JobOptions {
            from_batch: true,
            ..Default::default()
        };
        let jobs: Vec<RetrievalJob> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|url| RetrievalJob::new(url, dir.clone(), directive.clone()).with_options(options))
            .collect();

        if jobs.is_empty() {
            tracing::warn!(path = %path.display(), "Batch file has no entries");
            return Ok(jobs);
        }

        ensure_dir(&dir).await?;
        tracing::info!(
            path = %path.display(),
            jobs = jobs.len(),
            dir = %dir.display(),
            "Queued batch file"
        );
        Ok(jobs)
    }

    async fn expand_url(
        &self,
        url: &str,
        output_root: &Path,
        directive: &Directive,
    ) -> Result<Vec<RetrievalJob>, QueueError> {
        let metadata = match self.extractor.fetch_metadata(url).await {
            Ok(metadata) => metadata,
            Err(e) => {
                // The job's own fetch attempts will surface the failure.
                tracing::warn!(url = %url, error = %e, "Metadata lookup failed, queueing as single item");
                return self.single(url, output_root, directive, JobOptions::default()).await;
            }
        };

        if !metadata.is_playlist() {
            return self.single(url, output_root, directive, JobOptions::default()).await;
        }

        let message = match metadata.entry_count {
            Some(count) => format!("Download the whole playlist '{}' ({} items)?", metadata.title, count),
            None => format!("Download the whole playlist '{}'?", metadata.title),
        };

        match self.prompt.confirm(&message, true).await {
            Some(true) => {
                let entries = self
                    .extractor
                    .flatten_playlist(url)
                    .await
                    .map_err(|source| QueueError::Playlist {
                        url: url.to_string(),
                        source,
                    })?;

                let dir = output_root.join(sanitize_title(&metadata.title));
                ensure_dir(&dir).await?;

                tracing::info!(
                    url = %url,
                    jobs = entries.len(),
                    dir = %dir.display(),
                    "Queued playlist"
                );
                Ok(entries
                    .into_iter()
                    .map(|entry| RetrievalJob::new(entry.url, dir.clone(), directive.clone()))
                    .collect())
            }
            Some(false) => {
                let options = JobOptions {
                    skip_playlist: true,
                    ..Default::default()
                };
                self.single(url, output_root, directive, options).await
            }
            None => {
                tracing::info!(url = %url, "Playlist prompt cancelled, skipping input");
                Ok(Vec::new())
            }
        }
    }

    async fn single(
        &self,
        url: &str,
        output_root: &Path,
        directive: &Directive,
        options: JobOptions,
    ) -> Result<Vec<RetrievalJob>, QueueError> {
        ensure_dir(output_root).await?;
        Ok(vec![RetrievalJob::new(
            url,
            PathBuf::from(output_root),
            directive.clone(),
        )
        .with_options(options)])
    }
}
