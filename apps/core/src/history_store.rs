use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::config::Config;
use crate::model::{display_name_for_path, HistoryEntry};
use crate::path_key::normalize;

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(error) => write!(f, "sqlite error: {error}"),
            Self::Unavailable(error) => write!(f, "store unavailable: {error}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Backend store contract. The backend owns `use_count`: `add_use` both
/// increments the count and stamps `last_used`, and `list_all_history` is
/// the authoritative snapshot reconciliation replaces the mirror with.
pub trait HistoryStore: Send + Sync {
    fn add_use(&self, path: &str) -> Result<(), StoreError>;
    fn delete_history(&self, path: &str) -> Result<(), StoreError>;
    fn list_all_history(&self) -> Result<Vec<HistoryEntry>, StoreError>;
    fn remove_from_index(&self, path: &str) -> Result<(), StoreError>;
}

/// Default collaborator: a rusqlite database holding the history table and
/// the application index table.
pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    pub fn open_file(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|error| StoreError::Unavailable(format!("create store dir: {error}")))?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_from_config(cfg: &Config) -> Result<Self, StoreError> {
        Self::open_file(&cfg.history_db_path)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS history (
                 path TEXT PRIMARY KEY,
                 display_name TEXT NOT NULL,
                 last_used INTEGER NOT NULL,
                 use_count INTEGER NOT NULL DEFAULT 0,
                 is_folder INTEGER
             );
             CREATE TABLE IF NOT EXISTS app_index (
                 path TEXT PRIMARY KEY,
                 title TEXT NOT NULL
             );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Index rows feed self-healing: a pruned application disappears from
    /// here as well as from history.
    pub fn upsert_index_entry(&self, path: &str, title: &str) -> Result<(), StoreError> {
        let key = normalize(path);
        let conn = self.lock_conn();
        conn.execute(
            "INSERT INTO app_index (path, title) VALUES (?1, ?2)
             ON CONFLICT(path) DO UPDATE SET title=excluded.title",
            params![key, title],
        )?;
        Ok(())
    }

    pub fn index_title(&self, path: &str) -> Result<Option<String>, StoreError> {
        let key = normalize(path);
        let conn = self.lock_conn();
        let title = conn
            .query_row("SELECT title FROM app_index WHERE path = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(title)
    }

    fn lock_conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn add_use(&self, path: &str) -> Result<(), StoreError> {
        let key = normalize(path);
        let display_name = display_name_for_path(&key);
        let now = crate::model::now_epoch_secs();

        let conn = self.lock_conn();
        conn.execute(
            "INSERT INTO history (path, display_name, last_used, use_count)
             VALUES (?1, ?2, ?3, 1)
             ON CONFLICT(path) DO UPDATE SET
                 last_used = excluded.last_used,
                 use_count = history.use_count + 1",
            params![key, display_name, now],
        )?;
        Ok(())
    }

    fn delete_history(&self, path: &str) -> Result<(), StoreError> {
        let key = normalize(path);
        let conn = self.lock_conn();
        conn.execute("DELETE FROM history WHERE path = ?1", params![key])?;
        Ok(())
    }

    fn list_all_history(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(
            "SELECT path, display_name, last_used, use_count, is_folder
             FROM history ORDER BY last_used DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            let is_folder: Option<i64> = row.get(4)?;
            Ok(HistoryEntry::from_store_row(
                &row.get::<_, String>(0)?,
                &row.get::<_, String>(1)?,
                row.get(2)?,
                row.get::<_, i64>(3)?.max(0) as u32,
                is_folder.map(|v| v != 0),
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    fn remove_from_index(&self, path: &str) -> Result<(), StoreError> {
        let key = normalize(path);
        let conn = self.lock_conn();
        conn.execute("DELETE FROM app_index WHERE path = ?1", params![key])?;
        Ok(())
    }
}
