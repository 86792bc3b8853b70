//! Categories, tags and file-tag associations

use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use super::error::DbError;
use super::files::require_file;
use super::types::{CategoryId, FileId, TagCount, TagId, TagIndex, TagMap};
use super::Database;

fn normalize<'a>(kind: &str, input: &'a str) -> Result<&'a str, DbError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DbError::InvalidInput(format!("{kind} cannot be empty")));
    }
    Ok(trimmed)
}

pub(crate) fn find_category(conn: &Connection, name: &str) -> Result<Option<CategoryId>, DbError> {
    Ok(conn
        .query_row(
            "SELECT id FROM categories WHERE name = ?1",
            [name.trim()],
            |row| row.get(0),
        )
        .optional()?)
}

pub(crate) fn find_tag(
    conn: &Connection,
    category_id: CategoryId,
    value: &str,
) -> Result<Option<TagId>, DbError> {
    Ok(conn
        .query_row(
            "SELECT id FROM tags WHERE category_id = ?1 AND value = ?2",
            params![category_id, value.trim()],
            |row| row.get(0),
        )
        .optional()?)
}

/// Look up a category by name, creating it on first use.
///
/// A unique-constraint collision on insert means another writer created the
/// row in between; the row is re-read instead of failing.
pub(crate) fn get_or_create_category(conn: &Connection, name: &str) -> Result<CategoryId, DbError> {
    let name = normalize("category", name)?;
    if let Some(id) = find_category(conn, name)? {
        return Ok(id);
    }
    match conn.execute("INSERT INTO categories (name) VALUES (?1)", [name]) {
        Ok(_) => {
            debug!(category = name, "created category");
            Ok(conn.last_insert_rowid())
        }
        Err(err) => {
            let err = DbError::from(err);
            if err.is_constraint_violation() {
                find_category(conn, name)?
                    .ok_or_else(|| DbError::NotFound(format!("category '{name}'")))
            } else {
                Err(err)
            }
        }
    }
}

/// Look up a `(category, value)` tag, creating it on first use
pub(crate) fn get_or_create_tag(
    conn: &Connection,
    category_id: CategoryId,
    value: &str,
) -> Result<TagId, DbError> {
    let value = normalize("value", value)?;
    if let Some(id) = find_tag(conn, category_id, value)? {
        return Ok(id);
    }
    match conn.execute(
        "INSERT INTO tags (category_id, value) VALUES (?1, ?2)",
        params![category_id, value],
    ) {
        Ok(_) => {
            debug!(category_id, value, "created tag");
            Ok(conn.last_insert_rowid())
        }
        Err(err) => {
            let err = DbError::from(err);
            if err.is_constraint_violation() {
                find_tag(conn, category_id, value)?
                    .ok_or_else(|| DbError::NotFound(format!("tag '{value}'")))
            } else {
                Err(err)
            }
        }
    }
}

/// Associate a tag with a file; returns `false` if the pair already existed
pub(crate) fn link_file_tag(conn: &Connection, file_id: FileId, tag_id: TagId) -> Result<bool, DbError> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO file_tags (file_id, tag_id) VALUES (?1, ?2)",
        params![file_id, tag_id],
    )?;
    Ok(inserted > 0)
}

pub(crate) fn unlink_file_tag(conn: &Connection, file_id: FileId, tag_id: TagId) -> Result<usize, DbError> {
    Ok(conn.execute(
        "DELETE FROM file_tags WHERE file_id = ?1 AND tag_id = ?2",
        params![file_id, tag_id],
    )?)
}

pub(crate) fn unlink_category(
    conn: &Connection,
    file_id: FileId,
    category_id: CategoryId,
) -> Result<usize, DbError> {
    Ok(conn.execute(
        "DELETE FROM file_tags WHERE file_id = ?1 \
         AND tag_id IN (SELECT id FROM tags WHERE category_id = ?2)",
        params![file_id, category_id],
    )?)
}

pub(crate) fn tags_for_file(conn: &Connection, file_id: FileId) -> Result<TagMap, DbError> {
    let mut stmt = conn.prepare_cached(
        "SELECT c.name, t.value FROM file_tags ft \
         JOIN tags t ON ft.tag_id = t.id \
         JOIN categories c ON c.id = t.category_id \
         WHERE ft.file_id = ?1 \
         ORDER BY c.name, t.value",
    )?;
    let rows = stmt.query_map([file_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut tags = TagMap::new();
    for row in rows {
        let (category, value) = row?;
        tags.entry(category).or_default().push(value);
    }
    Ok(tags)
}

impl Database {
    /// Look up a category by name, creating it if absent
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidInput` for an empty name, or a store error.
    pub fn get_or_create_category(&self, name: &str) -> Result<CategoryId, DbError> {
        self.write(|tx| get_or_create_category(tx, name))
    }

    /// Look up a tag by `(category, value)`, creating it if absent
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidInput` for an empty value, or a store error.
    pub fn get_or_create_tag(&self, category_id: CategoryId, value: &str) -> Result<TagId, DbError> {
        self.write(|tx| get_or_create_tag(tx, category_id, value))
    }

    /// Idempotently associate a tag with a file
    ///
    /// # Errors
    ///
    /// Returns `DbError` if either row does not exist or the insert fails.
    pub fn link_file_tag(&self, file_id: FileId, tag_id: TagId) -> Result<bool, DbError> {
        self.write(|tx| link_file_tag(tx, file_id, tag_id))
    }

    /// Remove one association; returns the number of rows removed (0 or 1)
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the delete fails.
    pub fn unlink_file_tag(&self, file_id: FileId, tag_id: TagId) -> Result<usize, DbError> {
        self.write(|tx| unlink_file_tag(tx, file_id, tag_id))
    }

    /// Remove every association of a file within one category
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the delete fails.
    pub fn unlink_category(&self, file_id: FileId, category_id: CategoryId) -> Result<usize, DbError> {
        self.write(|tx| unlink_category(tx, file_id, category_id))
    }

    /// Tag a file with `category:value`, creating the category and tag lazily.
    ///
    /// The lookups, inserts and the association run in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the file does not exist,
    /// `DbError::InvalidInput` for an empty category or value.
    pub fn add_tag(&self, file_id: FileId, category: &str, value: &str) -> Result<TagId, DbError> {
        self.write(|tx| {
            require_file(tx, file_id)?;
            let category_id = get_or_create_category(tx, category)?;
            let tag_id = get_or_create_tag(tx, category_id, value)?;
            link_file_tag(tx, file_id, tag_id)?;
            Ok(tag_id)
        })
    }

    /// Remove `category:value` from a file.
    ///
    /// Returns `false` when the file did not carry the tag (including when
    /// the category or tag was never created).
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the delete fails.
    pub fn remove_tag(&self, file_id: FileId, category: &str, value: &str) -> Result<bool, DbError> {
        self.write(|tx| {
            let Some(category_id) = find_category(tx, category)? else {
                return Ok(false);
            };
            let Some(tag_id) = find_tag(tx, category_id, value)? else {
                return Ok(false);
            };
            Ok(unlink_file_tag(tx, file_id, tag_id)? > 0)
        })
    }

    /// Remove every tag of `category` from a file; returns the number removed
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the delete fails.
    pub fn remove_category(&self, file_id: FileId, category: &str) -> Result<usize, DbError> {
        self.write(|tx| match find_category(tx, category)? {
            Some(category_id) => unlink_category(tx, file_id, category_id),
            None => Ok(0),
        })
    }

    /// Tags of one file grouped by category
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the query fails.
    pub fn file_tags(&self, file_id: FileId) -> Result<TagMap, DbError> {
        self.with_conn(|conn| tags_for_file(conn, file_id))
    }

    /// Every tag in use with the number of files carrying it.
    ///
    /// Tags with no associated files are left out.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the query fails.
    pub fn tag_counts(&self) -> Result<TagIndex, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.name, t.value, COUNT(ft.file_id) \
                 FROM categories c \
                 JOIN tags t ON t.category_id = c.id \
                 LEFT JOIN file_tags ft ON ft.tag_id = t.id \
                 GROUP BY c.id, t.id \
                 HAVING COUNT(ft.file_id) > 0 \
                 ORDER BY c.name, t.value",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?;

            let mut index = TagIndex::new();
            for row in rows {
                let (category, value, count) = row?;
                index.entry(category).or_default().push(TagCount {
                    value,
                    count: usize::try_from(count).unwrap_or_default(),
                });
            }
            Ok(index)
        })
    }

    /// Most recently assigned value of `category` on any file other than `exclude`
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the query fails.
    pub fn previous_tag_value(
        &self,
        category: &str,
        exclude: FileId,
    ) -> Result<Option<String>, DbError> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT t.value FROM file_tags ft \
                     JOIN tags t ON ft.tag_id = t.id \
                     JOIN categories c ON c.id = t.category_id \
                     WHERE c.name = ?1 AND ft.file_id != ?2 \
                     ORDER BY ft.rowid DESC LIMIT 1",
                    params![category.trim(), exclude],
                    |row| row.get(0),
                )
                .optional()?)
        })
    }

    /// All category names, sorted
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the query fails.
    pub fn category_names(&self) -> Result<Vec<String>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM categories ORDER BY name")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(names)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn db_with_file(name: &str) -> (Database, FileId) {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_file(name, Path::new(name)).unwrap();
        (db, id)
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let first = db.get_or_create_category("colour").unwrap();
        let second = db.get_or_create_category("  colour ").unwrap();
        assert_eq!(first, second);

        let tag = db.get_or_create_tag(first, "red").unwrap();
        assert_eq!(db.get_or_create_tag(first, "red").unwrap(), tag);
        assert_eq!(db.category_names().unwrap(), vec!["colour".to_string()]);
    }

    #[test]
    fn test_same_value_in_different_categories_are_distinct_tags() {
        let db = Database::open_in_memory().unwrap();
        let colour = db.get_or_create_category("colour").unwrap();
        let mood = db.get_or_create_category("mood").unwrap();
        let a = db.get_or_create_tag(colour, "blue").unwrap();
        let b = db.get_or_create_tag(mood, "blue").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_names_rejected() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.get_or_create_category("   "),
            Err(DbError::InvalidInput(msg)) if msg.contains("category")
        ));
        let colour = db.get_or_create_category("colour").unwrap();
        assert!(matches!(
            db.get_or_create_tag(colour, ""),
            Err(DbError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_collision_on_insert_rereads_existing_row() {
        let db = Database::open_in_memory().unwrap();
        let id = db.get_or_create_category("colour").unwrap();
        let conn = db.lock();
        let err = DbError::from(
            conn.execute("INSERT INTO categories (name) VALUES ('colour')", [])
                .unwrap_err(),
        );
        assert!(err.is_constraint_violation());
        assert_eq!(get_or_create_category(&conn, "colour").unwrap(), id);
    }

    #[test]
    fn test_link_is_idempotent() {
        let (db, file) = db_with_file("a.jpg");
        let colour = db.get_or_create_category("colour").unwrap();
        let red = db.get_or_create_tag(colour, "red").unwrap();
        assert!(db.link_file_tag(file, red).unwrap());
        assert!(!db.link_file_tag(file, red).unwrap());
        assert_eq!(db.file_tags(file).unwrap()["colour"], vec!["red"]);
    }

    #[test]
    fn test_link_to_missing_file_fails() {
        let db = Database::open_in_memory().unwrap();
        let colour = db.get_or_create_category("colour").unwrap();
        let red = db.get_or_create_tag(colour, "red").unwrap();
        assert!(db.link_file_tag(999, red).is_err());
    }

    #[test]
    fn test_add_tag_to_missing_file_creates_nothing() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.add_tag(42, "colour", "red"), Err(DbError::NotFound(_))));
        assert!(db.category_names().unwrap().is_empty());
    }

    #[test]
    fn test_multi_valued_category_and_unlink_category() {
        let (db, file) = db_with_file("a.jpg");
        db.add_tag(file, "colour", "red").unwrap();
        db.add_tag(file, "colour", "blue").unwrap();
        db.add_tag(file, "size", "large").unwrap();
        assert_eq!(db.file_tags(file).unwrap()["colour"], vec!["blue", "red"]);

        let colour = db.get_or_create_category("colour").unwrap();
        assert_eq!(db.unlink_category(file, colour).unwrap(), 2);
        let tags = db.file_tags(file).unwrap();
        assert!(!tags.contains_key("colour"));
        assert_eq!(tags["size"], vec!["large"]);
    }

    #[test]
    fn test_remove_tag() {
        let (db, file) = db_with_file("a.jpg");
        db.add_tag(file, "colour", "red").unwrap();
        assert!(db.remove_tag(file, "colour", "red").unwrap());
        assert!(!db.remove_tag(file, "colour", "red").unwrap());
        assert!(!db.remove_tag(file, "nope", "red").unwrap());
        assert!(db.file_tags(file).unwrap().is_empty());
    }

    #[test]
    fn test_tag_counts_skip_unused_tags() {
        let db = Database::open_in_memory().unwrap();
        let a = db.insert_file("a.jpg", Path::new("a.jpg")).unwrap();
        let b = db.insert_file("b.jpg", Path::new("b.jpg")).unwrap();
        db.add_tag(a, "colour", "red").unwrap();
        db.add_tag(b, "colour", "red").unwrap();
        db.add_tag(b, "colour", "blue").unwrap();
        db.remove_tag(b, "colour", "blue").unwrap();

        let index = db.tag_counts().unwrap();
        assert_eq!(
            index["colour"],
            vec![TagCount {
                value: "red".into(),
                count: 2
            }]
        );
    }

    #[test]
    fn test_previous_tag_value_excludes_current_file() {
        let db = Database::open_in_memory().unwrap();
        let a = db.insert_file("a.jpg", Path::new("a.jpg")).unwrap();
        let b = db.insert_file("b.jpg", Path::new("b.jpg")).unwrap();
        db.add_tag(a, "artist", "alice").unwrap();
        db.add_tag(a, "artist", "bob").unwrap();
        db.add_tag(b, "artist", "carol").unwrap();

        assert_eq!(db.previous_tag_value("artist", b).unwrap().as_deref(), Some("bob"));
        assert_eq!(db.previous_tag_value("artist", a).unwrap().as_deref(), Some("carol"));
        assert_eq!(db.previous_tag_value("missing", a).unwrap(), None);
    }
}
