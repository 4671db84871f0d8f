//! File-backed store of completed research sessions.
//!
//! The pipeline hands the store a finished (task, draft, evidence) triple once
//! a session terminates; the store owns the record schema from there. Evidence
//! is kept as raw JSON values so the store stays decoupled from the pipeline's
//! evidence type.
//!
//! The JSON file keeps records newest-first and is capped at [`MAX_RECORDS`].
//! A missing or unreadable file loads as an empty history rather than an
//! error.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

/// Maximum number of records retained in the file.
pub const MAX_RECORDS: usize = 50;

/// Error type for history store operations.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for history store operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// One stored session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub task: String,
    pub draft: String,
    #[serde(default)]
    pub evidence: Vec<Value>,
    #[serde(default)]
    pub search_mode: String,
    #[serde(default)]
    pub citation_style: String,
}

/// A finished session about to be appended.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub task: String,
    pub draft: String,
    pub evidence: Vec<Value>,
    pub search_mode: String,
    pub citation_style: String,
}

/// Abstraction over session persistence backends.
///
/// `JsonHistoryStore` implements this for the JSON file on disk.
/// Tests can provide an in-memory implementation.
pub trait HistoryStore: Send + Sync {
    /// Append a finished session, returning the stored record.
    fn append(&self, session: NewSession) -> HistoryResult<SessionRecord>;

    /// List stored sessions, newest first.
    fn list(&self) -> HistoryResult<Vec<SessionRecord>>;

    /// Delete a session by id. Returns whether a record was removed.
    fn delete(&self, id: &str) -> HistoryResult<bool>;
}

/// JSON-file-backed history store.
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn load(&self) -> Vec<SessionRecord> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "history file unreadable — starting empty");
                Vec::new()
            }
        }
    }

    fn write(&self, records: &[SessionRecord]) -> HistoryResult<()> {
        let content = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl HistoryStore for JsonHistoryStore {
    fn append(&self, session: NewSession) -> HistoryResult<SessionRecord> {
        let mut records = self.load();
        let record = SessionRecord {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            task: session.task,
            draft: session.draft,
            evidence: session.evidence,
            search_mode: session.search_mode,
            citation_style: session.citation_style,
        };
        records.insert(0, record.clone());
        records.truncate(MAX_RECORDS);
        self.write(&records)?;
        Ok(record)
    }

    fn list(&self) -> HistoryResult<Vec<SessionRecord>> {
        Ok(self.load())
    }

    fn delete(&self, id: &str) -> HistoryResult<bool> {
        let mut records = self.load();
        let before = records.len();
        records.retain(|record| record.id != id);
        let removed = records.len() != before;
        if removed {
            self.write(&records)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, JsonHistoryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path().join("history.json"));
        (dir, store)
    }

    fn session(task: &str) -> NewSession {
        NewSession {
            task: task.to_string(),
            draft: format!("report on {task}"),
            evidence: vec![serde_json::json!({"title": "t", "source": "s"})],
            search_mode: "general".to_string(),
            citation_style: "IEEE".to_string(),
        }
    }

    #[test]
    fn test_missing_file_lists_empty() {
        let (_dir, store) = store();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_append_then_list_round_trip() {
        let (_dir, store) = store();
        let record = store.append(session("batteries")).unwrap();
        assert!(!record.id.is_empty());

        let records = store.list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].task, "batteries");
        assert_eq!(records[0].evidence.len(), 1);
        assert_eq!(records[0].citation_style, "IEEE");
    }

    #[test]
    fn test_list_is_newest_first() {
        let (_dir, store) = store();
        store.append(session("first")).unwrap();
        store.append(session("second")).unwrap();

        let records = store.list().unwrap();
        assert_eq!(records[0].task, "second");
        assert_eq!(records[1].task, "first");
    }

    #[test]
    fn test_capped_at_max_records() {
        let (_dir, store) = store();
        for i in 0..(MAX_RECORDS + 5) {
            store.append(session(&format!("task {i}"))).unwrap();
        }
        let records = store.list().unwrap();
        assert_eq!(records.len(), MAX_RECORDS);
        // Newest survives, oldest were dropped.
        assert_eq!(records[0].task, format!("task {}", MAX_RECORDS + 4));
    }

    #[test]
    fn test_delete_by_id() {
        let (_dir, store) = store();
        let keep = store.append(session("keep")).unwrap();
        let drop = store.append(session("drop")).unwrap();

        assert!(store.delete(&drop.id).unwrap());
        let records = store.list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, keep.id);
    }

    #[test]
    fn test_delete_unknown_id_is_noop() {
        let (_dir, store) = store();
        store.append(session("only")).unwrap();
        assert!(!store.delete("no-such-id").unwrap());
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let (_dir, store) = store();
        fs::write(store.path(), "not json at all").unwrap();
        assert!(store.list().unwrap().is_empty());

        // Appending over a corrupt file recovers.
        store.append(session("fresh")).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
    }
}
