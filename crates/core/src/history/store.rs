use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Database error: {0}")]
    Database(String),
}

/// A stored history row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub id: i64,
    pub recorded_at: DateTime<Utc>,
    pub title: String,
    pub url: String,
    pub filepath: PathBuf,
}

/// Append-only storage for completed downloads.
pub trait HistoryStore: Send + Sync {
    /// Appends a record, returning the assigned id.
    fn insert(&self, record: &HistoryRecord) -> Result<i64, HistoryError>;

    /// Most recent records, newest first.
    fn recent(&self, limit: i64) -> Result<Vec<HistoryRecord>, HistoryError>;

    fn count(&self) -> Result<i64, HistoryError>;
}
