//! Embedded SQLite persistence for batches, documents and findings.
//!
//! The store keeps a single writer connection behind a mutex so all
//! mutations are serialized in-process, while every read opens its own
//! short-lived connection. With WAL journaling readers never block on
//! the writer. A lock wait longer than five seconds surfaces as
//! [`RepositoryError::Busy`].
//!
//! Split into submodules:
//! - `schema`: table definitions, seed data, forward-only migrations
//! - `batches`: batch CRUD and lifecycle updates
//! - `documents`: document rows, result recording, paginated queries
//! - `findings`: finding queries
//! - `stats`: global aggregates for the dashboard

mod batches;
mod documents;
mod findings;
mod schema;
mod stats;

pub use documents::DocumentFilter;
pub use findings::FindingFilter;
pub use stats::{GlobalStats, PiiTypeStat};

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use thiserror::Error;

/// How long an operation waits on the SQLite lock before giving up.
const LOCK_WAIT: Duration = Duration::from_secs(5);

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The database lock could not be obtained within the wait budget.
    #[error("database is busy")]
    Busy,

    #[error("not found")]
    NotFound,

    #[error("constraint violated: {0}")]
    Constraint(&'static str),

    #[error("database error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(e, _) = &err {
            if matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ) {
                return Self::Busy;
            }
        }
        Self::Sqlite(err)
    }
}

/// A page of query results plus the unpaginated total.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// SQLite-backed store. Cheap to share behind an `Arc`.
pub struct Store {
    db_path: PathBuf,
    writer: Mutex<Connection>,
}

impl Store {
    /// Open (creating if necessary) the database at `db_path` and bring
    /// the schema up to date.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = connect(db_path)?;
        schema::initialize(&conn)?;

        Ok(Self {
            db_path: db_path.to_path_buf(),
            writer: Mutex::new(conn),
        })
    }

    /// Path of the backing database file.
    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a fresh read connection. Readers see a consistent snapshot
    /// and do not block the writer.
    pub fn reader(&self) -> Result<Connection> {
        connect(&self.db_path)
    }

    /// Lock the serialized writer connection.
    pub(crate) fn writer(&self) -> Result<MutexGuard<'_, Connection>> {
        // A poisoned mutex means a writer panicked mid-operation; the
        // transaction it held has rolled back, so the connection is
        // still usable.
        Ok(self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()))
    }
}

fn connect(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(LOCK_WAIT)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(conn)
}

/// Parse a stored RFC 3339 timestamp, defaulting to the Unix epoch.
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Parse an optional stored timestamp.
pub(crate) fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("nested").join("redactqc.db");
        let store = Store::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.database_path(), path);
    }

    #[test]
    fn parse_datetime_falls_back_to_epoch() {
        assert_eq!(parse_datetime("garbage"), DateTime::UNIX_EPOCH);
        let ts = parse_datetime("2026-03-01T12:00:00Z");
        assert_eq!(ts.to_rfc3339(), "2026-03-01T12:00:00+00:00");
    }

    #[test]
    fn parse_datetime_opt_handles_none() {
        assert_eq!(parse_datetime_opt(None), None);
        assert!(parse_datetime_opt(Some("2026-03-01T12:00:00Z".into())).is_some());
        assert_eq!(parse_datetime_opt(Some("bad".into())), None);
    }
}
