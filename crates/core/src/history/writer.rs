use std::sync::Arc;

use tokio::sync::mpsc;

use super::{HistoryEntry, HistoryHandle, HistoryRecord, HistoryStore};

/// Background task that writes history entries to storage.
pub struct HistoryWriter {
    rx: mpsc::Receiver<HistoryEntry>,
    store: Arc<dyn HistoryStore>,
}

impl HistoryWriter {
    pub fn new(rx: mpsc::Receiver<HistoryEntry>, store: Arc<dyn HistoryStore>) -> Self {
        Self { rx, store }
    }

    /// Consumes entries until every handle is dropped.
    pub async fn run(mut self) {
        tracing::debug!("History writer started");

        while let Some(entry) = self.rx.recv().await {
            let record = HistoryRecord {
                id: 0, // Set by the store
                recorded_at: entry.recorded_at,
                title: entry.title,
                url: entry.url,
                filepath: entry.filepath,
            };

            if let Err(e) = self.store.insert(&record) {
                tracing::warn!("Failed to write history entry: {}", e);
            }
        }

        tracing::debug!("History writer shutting down");
    }
}

/// Creates a handle and the writer draining it.
///
/// Spawn the writer with `tokio::spawn(writer.run())`; it exits once every
/// clone of the handle has been dropped.
pub fn create_history_system(
    store: Arc<dyn HistoryStore>,
    buffer_size: usize,
) -> (HistoryHandle, HistoryWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (HistoryHandle::new(tx), HistoryWriter::new(rx, store))
}
