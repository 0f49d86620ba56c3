//! Append-only download history.
//!
//! Jobs record successful completions through a [`HistoryHandle`]. The
//! handle never blocks and never fails the caller; a background
//! [`HistoryWriter`] drains the channel into a [`HistoryStore`].

mod handle;
mod sqlite;
mod store;
mod writer;

pub use handle::{HistoryEntry, HistoryHandle};
pub use sqlite::SqliteHistoryStore;
pub use store::{HistoryError, HistoryRecord, HistoryStore};
pub use writer::{create_history_system, HistoryWriter};
