//! File rows: insert, lookup, listing and deletion

use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::DbError;
use super::tags::tags_for_file;
use super::types::{File, FileDetail, FileId, FilePage, page_offset};
use super::Database;
use crate::filter::{Predicate, compile};

/// Descriptions longer than this many bytes are truncated on save
pub const MAX_DESCRIPTION_LEN: usize = 2048;

const FILE_COLUMNS: &str = "f.id, f.filename, f.path, f.description";

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<File> {
    Ok(File {
        id: row.get(0)?,
        filename: row.get(1)?,
        path: PathBuf::from(row.get::<_, String>(2)?),
        description: row.get(3)?,
    })
}

fn to_sql_int(n: usize) -> Value {
    Value::Integer(i64::try_from(n).unwrap_or(i64::MAX))
}

fn truncate_description(text: &str) -> &str {
    if text.len() <= MAX_DESCRIPTION_LEN {
        return text;
    }
    let mut end = MAX_DESCRIPTION_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

pub(crate) fn fetch_file(conn: &Connection, id: FileId) -> Result<Option<File>, DbError> {
    Ok(conn
        .query_row(
            &format!("SELECT {FILE_COLUMNS} FROM files f WHERE f.id = ?1"),
            [id],
            file_from_row,
        )
        .optional()?)
}

/// Fetch a file or fail with `DbError::NotFound`
pub(crate) fn require_file(conn: &Connection, id: FileId) -> Result<File, DbError> {
    fetch_file(conn, id)?.ok_or_else(|| DbError::NotFound(format!("file {id}")))
}

/// Ids from `ids` that have no file row, in input order
pub(crate) fn missing_ids(conn: &Connection, ids: &[FileId]) -> Result<Vec<FileId>, DbError> {
    let mut stmt = conn.prepare_cached("SELECT 1 FROM files WHERE id = ?1")?;
    let mut missing = Vec::new();
    for &id in ids {
        if !stmt.exists([id])? {
            missing.push(id);
        }
    }
    Ok(missing)
}

impl Database {
    /// Record a new file row and return its id
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidInput` for an empty filename, or a store
    /// error (including a unique-constraint violation on a duplicate name).
    pub fn insert_file(&self, filename: &str, path: &Path) -> Result<FileId, DbError> {
        if filename.trim().is_empty() {
            return Err(DbError::InvalidInput("filename cannot be empty".to_string()));
        }
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO files (filename, path) VALUES (?1, ?2)",
                params![filename, path.to_string_lossy()],
            )?;
            let id = conn.last_insert_rowid();
            debug!(id, filename, "inserted file row");
            Ok(id)
        })
    }

    /// Fetch one file by id
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if no such file exists.
    pub fn get_file(&self, id: FileId) -> Result<File, DbError> {
        self.with_conn(|conn| require_file(conn, id))
    }

    /// Fetch one file by id together with its tags
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if no such file exists.
    pub fn file_detail(&self, id: FileId) -> Result<FileDetail, DbError> {
        self.with_conn(|conn| {
            let file = require_file(conn, id)?;
            let tags = tags_for_file(conn, id)?;
            Ok(FileDetail { file, tags })
        })
    }

    /// Look up a file by its unique filename
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the query fails.
    pub fn find_file_by_name(&self, filename: &str) -> Result<Option<File>, DbError> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {FILE_COLUMNS} FROM files f WHERE f.filename = ?1"),
                    [filename],
                    file_from_row,
                )
                .optional()?)
        })
    }

    /// Point a file row at a new filename and storage path
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the file does not exist, or a store
    /// error if the update is rejected.
    pub fn update_file_location(
        &self,
        id: FileId,
        filename: &str,
        path: &Path,
    ) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE files SET filename = ?1, path = ?2 WHERE id = ?3",
                params![filename, path.to_string_lossy(), id],
            )?;
            if updated == 0 {
                return Err(DbError::NotFound(format!("file {id}")));
            }
            Ok(())
        })
    }

    /// Replace a file's description, truncated to [`MAX_DESCRIPTION_LEN`] bytes.
    ///
    /// Returns the description as stored.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the file does not exist.
    pub fn update_description(&self, id: FileId, description: &str) -> Result<String, DbError> {
        let stored = truncate_description(description);
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE files SET description = ?1 WHERE id = ?2",
                params![stored, id],
            )?;
            if updated == 0 {
                return Err(DbError::NotFound(format!("file {id}")));
            }
            Ok(stored.to_string())
        })
    }

    /// Delete a file row and all of its associations in one transaction.
    ///
    /// Returns the deleted row so the caller can clean up the physical file.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the file does not exist; nothing is
    /// deleted in that case.
    pub fn delete_file(&self, id: FileId) -> Result<File, DbError> {
        self.write(|tx| {
            let file = require_file(tx, id)?;
            let links = tx.execute("DELETE FROM file_tags WHERE file_id = ?1", [id])?;
            tx.execute("DELETE FROM files WHERE id = ?1", [id])?;
            debug!(id, links, "deleted file row");
            Ok(file)
        })
    }

    /// One page of files matching `predicate`, newest first.
    ///
    /// The total is counted with the same predicate before the bounded read.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if either query fails.
    pub fn list_files(
        &self,
        predicate: &Predicate,
        page: usize,
        per_page: usize,
    ) -> Result<FilePage, DbError> {
        let filter = compile(predicate);
        let per_page = per_page.max(1);
        self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM files f WHERE {}", filter.clause),
                params_from_iter(filter.params.iter()),
                |row| row.get(0),
            )?;

            let mut params = filter.params.clone();
            params.push(to_sql_int(per_page));
            params.push(to_sql_int(page_offset(page, per_page)));
            let mut stmt = conn.prepare(&format!(
                "SELECT {FILE_COLUMNS} FROM files f WHERE {} \
                 ORDER BY f.id DESC LIMIT ? OFFSET ?",
                filter.clause
            ))?;
            let files = stmt
                .query_map(params_from_iter(params.iter()), file_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(FilePage {
                files,
                total: usize::try_from(total).unwrap_or_default(),
            })
        })
    }

    /// Ids of every file matching `predicate`, ascending
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the query fails.
    pub fn matching_ids(&self, predicate: &Predicate) -> Result<Vec<FileId>, DbError> {
        let filter = compile(predicate);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT f.id FROM files f WHERE {} ORDER BY f.id",
                filter.clause
            ))?;
            let ids = stmt
                .query_map(params_from_iter(filter.params.iter()), |row| row.get(0))?
                .collect::<Result<Vec<FileId>, _>>()?;
            Ok(ids)
        })
    }

    /// Ids from `ids` that do not resolve to a file
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the query fails.
    pub fn missing_file_ids(&self, ids: &[FileId]) -> Result<Vec<FileId>, DbError> {
        self.with_conn(|conn| missing_ids(conn, ids))
    }

    /// Fetch the files for `ids`, ascending by id; unknown ids are skipped
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the query fails.
    pub fn files_by_ids(&self, ids: &[FileId]) -> Result<Vec<File>, DbError> {
        self.with_conn(|conn| {
            let mut files = Vec::with_capacity(ids.len());
            for &id in ids {
                if let Some(file) = fetch_file(conn, id)? {
                    files.push(file);
                }
            }
            files.sort_by_key(|f| f.id);
            Ok(files)
        })
    }

    /// Every catalogued filename
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the query fails.
    pub fn all_filenames(&self) -> Result<HashSet<String>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT filename FROM files")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<HashSet<String>, _>>()?;
            Ok(names)
        })
    }

    /// Every file, ordered by filename
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the query fails.
    pub fn all_files(&self) -> Result<Vec<File>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {FILE_COLUMNS} FROM files f ORDER BY f.filename"
            ))?;
            let files = stmt
                .query_map([], file_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(files)
        })
    }

    /// The `limit` most recently added files
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the query fails.
    pub fn recent_files(&self, limit: usize) -> Result<Vec<File>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {FILE_COLUMNS} FROM files f ORDER BY f.id DESC LIMIT ?1"
            ))?;
            let files = stmt
                .query_map([to_sql_int(limit)], file_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(files)
        })
    }

    /// Case-insensitive substring search over filename, description and tag values.
    ///
    /// `*` matches any run of characters and `?` a single character. An empty
    /// query yields no results. Matches are ordered by filename and carry all
    /// of their tags.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the query fails.
    pub fn search(&self, query: &str) -> Result<Vec<FileDetail>, DbError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = format!(
            "%{}%",
            query.to_lowercase().replace('*', "%").replace('?', "_")
        );

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT DISTINCT {FILE_COLUMNS} FROM files f \
                 LEFT JOIN file_tags ft ON ft.file_id = f.id \
                 LEFT JOIN tags t ON t.id = ft.tag_id \
                 WHERE LOWER(f.filename) LIKE ?1 \
                    OR LOWER(f.description) LIKE ?1 \
                    OR LOWER(t.value) LIKE ?1 \
                 ORDER BY f.filename"
            ))?;
            let files = stmt
                .query_map([&pattern], file_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            files
                .into_iter()
                .map(|file| {
                    let tags = tags_for_file(conn, file.id)?;
                    Ok(FileDetail { file, tags })
                })
                .collect()
        })
    }
}
