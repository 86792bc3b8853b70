//! Catalog store for taggart
//!
//! Provides the relational access layer for files, categories, tags and the
//! file-tag associations, using an embedded `SQLite` database.
//!
//! The store is single-writer: one connection is shared behind a mutex and
//! every multi-statement write runs inside one `IMMEDIATE` transaction, so a
//! concurrent reader never observes a half-applied change. Statement-level
//! helpers take a `&Connection` so they compose inside a caller's
//! transaction (see [`Database::write`]).

use chrono::Local;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

pub mod error;
pub(crate) mod files;
mod schema;
pub(crate) mod tags;
pub mod types;

pub use error::DbError;
pub use files::MAX_DESCRIPTION_LEN;
pub use types::{
    CategoryId, File, FileDetail, FileId, FilePage, Pagination, TagCount, TagId, TagIndex, TagMap,
};

/// Database wrapper that owns the catalog connection
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Opens or creates a catalog database at the specified path
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the database cannot be opened or the schema cannot be created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        debug!(path = %path.display(), journal_mode = %mode, "opened catalog database");
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Opens a private in-memory catalog (used by tests and dry runs)
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self, DbError> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(schema::SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Path of the database file, `None` for in-memory catalogs
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Lock the shared connection.
    ///
    /// A panic while holding the lock cannot leave `SQLite` mid-transaction
    /// (an open `Transaction` rolls back on drop), so a poisoned lock is
    /// recovered rather than propagated.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run statements against the shared connection outside an explicit transaction
    pub(crate) fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, DbError>,
    ) -> Result<T, DbError> {
        let conn = self.lock();
        f(&conn)
    }

    /// Run a write sequence inside one immediate transaction.
    ///
    /// The transaction commits only if `f` returns `Ok`; any error rolls the
    /// whole sequence back before it reaches the caller.
    pub(crate) fn write<T, E>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let mut conn = self.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(DbError::from)?;
        let value = f(&tx)?;
        tx.commit().map_err(DbError::from)?;
        Ok(value)
    }

    /// Number of catalogued files
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the query fails.
    pub fn count(&self) -> Result<usize, DbError> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
            Ok(usize::try_from(count).unwrap_or_default())
        })
    }

    /// Copy the catalog to `<stem>_backup_<timestamp>.db` next to the database file
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidInput` for in-memory catalogs, or a store
    /// error if the copy fails.
    pub fn backup(&self) -> Result<PathBuf, DbError> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| DbError::InvalidInput("database path not configured".to_string()))?;
        let stem = path.with_extension("");
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let backup_path = PathBuf::from(format!("{}_backup_{timestamp}.db", stem.display()));

        self.with_conn(|conn| {
            conn.execute(
                "VACUUM INTO ?1",
                [backup_path.to_string_lossy().as_ref()],
            )?;
            Ok(())
        })?;
        info!(backup = %backup_path.display(), "catalog backup created");
        Ok(backup_path)
    }

    /// Rebuild the database file to reclaim free pages
    ///
    /// # Errors
    ///
    /// Returns `DbError` if `VACUUM` fails.
    pub fn vacuum(&self) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute_batch("VACUUM;")?;
            Ok(())
        })?;
        info!("catalog vacuum completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_database() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.count().unwrap(), 0);
        assert!(db.path().is_none());
    }

    #[test]
    fn test_reopen_existing_database() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("catalog.db");

        {
            let db = Database::open(&db_path).unwrap();
            db.insert_file("persistent.jpg", Path::new("uploads/persistent.jpg"))
                .unwrap();
        }

        let db = Database::open(&db_path).unwrap();
        assert_eq!(db.count().unwrap(), 1);
        assert!(db.find_file_by_name("persistent.jpg").unwrap().is_some());
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("nested").join("catalog.db");
        let _db = Database::open(&db_path).unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn test_write_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();
        let result: Result<(), DbError> = db.write(|tx| {
            tx.execute(
                "INSERT INTO files (filename, path) VALUES ('a.jpg', 'a.jpg')",
                [],
            )?;
            Err(DbError::InvalidInput("abort".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(db.count().unwrap(), 0);
    }

    #[test]
    fn test_backup_and_vacuum() {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path().join("catalog.db")).unwrap();
        db.insert_file("a.jpg", Path::new("a.jpg")).unwrap();

        let backup = db.backup().unwrap();
        assert!(backup.exists());
        assert!(
            backup
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("catalog_backup_")
        );
        let restored = Database::open(&backup).unwrap();
        assert_eq!(restored.count().unwrap(), 1);

        db.vacuum().unwrap();
    }

    #[test]
    fn test_backup_requires_file_database() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.backup(), Err(DbError::InvalidInput(_))));
    }
}
