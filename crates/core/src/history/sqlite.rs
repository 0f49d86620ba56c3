use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{HistoryError, HistoryRecord, HistoryStore};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        recorded_at TEXT NOT NULL,
        title TEXT NOT NULL,
        url TEXT NOT NULL,
        filepath TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_history_recorded_at ON history(recorded_at);
"#;

/// SQLite-backed history store.
pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    /// Opens the database file, creating it and its table if needed.
    pub fn new(path: &Path) -> Result<Self, HistoryError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| HistoryError::Database(e.to_string()))?;
        }
        let conn = Connection::open(path).map_err(|e| HistoryError::Database(e.to_string()))?;
        Self::init(conn)
    }

    /// In-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, HistoryError> {
        let conn = Connection::open_in_memory().map_err(|e| HistoryError::Database(e.to_string()))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, HistoryError> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| HistoryError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, HistoryError> {
        self.conn
            .lock()
            .map_err(|_| HistoryError::Database("connection lock poisoned".to_string()))
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn insert(&self, record: &HistoryRecord) -> Result<i64, HistoryError> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO history (recorded_at, title, url, filepath) VALUES (?, ?, ?, ?)",
            params![
                record.recorded_at.to_rfc3339(),
                record.title,
                record.url,
                record.filepath.to_string_lossy(),
            ],
        )
        .map_err(|e| HistoryError::Database(e.to_string()))?;

        Ok(conn.last_insert_rowid())
    }

    fn recent(&self, limit: i64) -> Result<Vec<HistoryRecord>, HistoryError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, recorded_at, title, url, filepath FROM history ORDER BY id DESC LIMIT ?",
            )
            .map_err(|e| HistoryError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![limit], |row| {
                let id: i64 = row.get(0)?;
                let recorded_at: String = row.get(1)?;
                let title: String = row.get(2)?;
                let url: String = row.get(3)?;
                let filepath: String = row.get(4)?;
                Ok((id, recorded_at, title, url, filepath))
            })
            .map_err(|e| HistoryError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            let (id, recorded_at, title, url, filepath) =
                row.map_err(|e| HistoryError::Database(e.to_string()))?;

            let recorded_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&recorded_at)
                .map_err(|e| HistoryError::Database(format!("Invalid timestamp: {}", e)))?
                .into();

            records.push(HistoryRecord {
                id,
                recorded_at,
                title,
                url,
                filepath: PathBuf::from(filepath),
            });
        }

        Ok(records)
    }

    fn count(&self) -> Result<i64, HistoryError> {
        let conn = self.conn()?;
        conn.query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))
            .map_err(|e| HistoryError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(title: &str) -> HistoryRecord {
        HistoryRecord {
            id: 0,
            recorded_at: Utc::now(),
            title: title.to_string(),
            url: format!("https://x/{}", title),
            filepath: PathBuf::from(format!("/out/{}.mp4", title)),
        }
    }

    #[test]
    fn test_insert_and_recent() {
        let store = SqliteHistoryStore::in_memory().unwrap();

        let id1 = store.insert(&record("one")).unwrap();
        let id2 = store.insert(&record("two")).unwrap();
        assert!(id2 > id1);

        let recent = store.recent(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].title, "two");
        assert_eq!(recent[1].filepath, PathBuf::from("/out/one.mp4"));
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_recent_respects_limit() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        for i in 0..5 {
            store.insert(&record(&format!("t{}", i))).unwrap();
        }

        let recent = store.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].title, "t4");
        assert_eq!(recent[1].title, "t3");
    }

    #[test]
    fn test_file_store_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("history.db");

        {
            let store = SqliteHistoryStore::new(&path).unwrap();
            store.insert(&record("kept")).unwrap();
        }

        let reopened = SqliteHistoryStore::new(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
        assert_eq!(reopened.recent(1).unwrap()[0].title, "kept");
    }
}
