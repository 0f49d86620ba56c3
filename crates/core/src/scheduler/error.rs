//! Error types for the scheduler module.

use std::path::PathBuf;
use thiserror::Error;

use crate::extractor::ExtractorError;

/// Failure to turn one raw input into jobs. The input group is skipped and
/// the rest of the run proceeds.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Cannot read batch file {path}: {source}")]
    BatchFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot enumerate playlist {url}: {source}")]
    Playlist {
        url: String,
        #[source]
        source: ExtractorError,
    },
}
