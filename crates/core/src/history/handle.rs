use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// A completed download waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub recorded_at: DateTime<Utc>,
    pub title: String,
    pub url: String,
    pub filepath: PathBuf,
}

/// Handle for recording completed downloads.
///
/// Cheaply cloneable and shared by every worker.
#[derive(Debug, Clone)]
pub struct HistoryHandle {
    tx: mpsc::Sender<HistoryEntry>,
}

impl HistoryHandle {
    pub fn new(tx: mpsc::Sender<HistoryEntry>) -> Self {
        Self { tx }
    }

    /// Records a completed download without waiting.
    ///
    /// Returns whether the entry was queued. A full or closed channel is
    /// logged and otherwise ignored.
    pub fn record(&self, title: &str, url: &str, filepath: &Path) -> bool {
        let entry = HistoryEntry {
            recorded_at: Utc::now(),
            title: title.to_string(),
            url: url.to_string(),
            filepath: filepath.to_path_buf(),
        };
        match self.tx.try_send(entry) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to record history entry: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = HistoryHandle::new(tx);

        assert!(handle.record("Clip", "https://x/1", Path::new("/out/Clip.mp4")));

        let entry = rx.try_recv().expect("Should receive entry");
        assert_eq!(entry.title, "Clip");
        assert_eq!(entry.url, "https://x/1");
        assert_eq!(entry.filepath, PathBuf::from("/out/Clip.mp4"));
    }

    #[test]
    fn test_record_full_channel() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = HistoryHandle::new(tx);

        assert!(handle.record("a", "u", Path::new("/a")));
        assert!(!handle.record("b", "u", Path::new("/b")));
    }

    #[test]
    fn test_record_closed_channel() {
        let (tx, rx) = mpsc::channel(4);
        let handle = HistoryHandle::new(tx);
        drop(rx);

        // Must not panic.
        assert!(!handle.record("a", "u", Path::new("/a")));
    }

    #[test]
    fn test_entry_has_timestamp() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = HistoryHandle::new(tx);

        let before = Utc::now();
        handle.record("a", "u", Path::new("/a"));
        let after = Utc::now();

        let entry = rx.try_recv().unwrap();
        assert!(entry.recorded_at >= before);
        assert!(entry.recorded_at <= after);
    }
}
