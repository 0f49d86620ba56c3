//! Location of the external binaries the downloader drives.
//!
//! Resolution order: an explicitly configured path, then a `bin/` directory
//! next to the running executable, then a `PATH` lookup.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{name} is not installed or not on PATH")]
    NotFound { name: String },

    #[error("Configured {name} path does not exist: {path}")]
    ConfiguredPathMissing { name: String, path: PathBuf },
}

/// Resolved locations of every required tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTools {
    pub ffmpeg: PathBuf,
    pub ytdlp: PathBuf,
}

/// Resolves both required tools. Either one missing is fatal.
pub fn resolve_tools(
    ffmpeg: Option<&Path>,
    ytdlp: Option<&Path>,
) -> Result<ResolvedTools, ToolError> {
    Ok(ResolvedTools {
        ffmpeg: resolve_binary("ffmpeg", ffmpeg)?,
        ytdlp: resolve_binary("yt-dlp", ytdlp)?,
    })
}

/// Finds `name`, preferring `configured` when given.
pub fn resolve_binary(name: &str, configured: Option<&Path>) -> Result<PathBuf, ToolError> {
    if let Some(path) = configured {
        if path.is_file() {
            tracing::debug!(tool = name, path = %path.display(), "Using configured binary");
            return Ok(path.to_path_buf());
        }
        return Err(ToolError::ConfiguredPathMissing {
            name: name.to_string(),
            path: path.to_path_buf(),
        });
    }

    if let Some(bundled) = bundled_binary(name) {
        tracing::debug!(tool = name, path = %bundled.display(), "Using bundled binary");
        return Ok(bundled);
    }

    which::which(name).map_err(|_| ToolError::NotFound {
        name: name.to_string(),
    })
}

fn bundled_binary(name: &str) -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let candidate = exe.parent()?.join("bin").join(executable_name(name));
    candidate.is_file().then_some(candidate)
}

fn executable_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_configured_path_wins() {
        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("ffmpeg");
        std::fs::write(&bin, b"").unwrap();

        assert_eq!(resolve_binary("ffmpeg", Some(&bin)).unwrap(), bin);
    }

    #[test]
    fn test_configured_path_missing_is_error() {
        let result = resolve_binary("ffmpeg", Some(Path::new("/nonexistent/ffmpeg")));
        assert!(matches!(result, Err(ToolError::ConfiguredPathMissing { .. })));
    }

    #[test]
    fn test_unknown_binary_not_found() {
        let result = resolve_binary("mediafetch-no-such-tool-xyz", None);
        assert!(matches!(result, Err(ToolError::NotFound { .. })));
    }
}
