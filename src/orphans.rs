//! Drift detection between the upload directory and the catalog
//!
//! Nothing here repairs anything; callers decide what to do with the
//! reports. Each call scans the directory afresh.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::db::{Database, DbError, File};
use crate::lifecycle::{StorageLayout, is_video};

#[derive(Debug, Error)]
pub enum OrphanError {
    #[error("Failed to scan {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Database(#[from] DbError),
}

/// Filenames of regular files directly under `upload_dir` that the catalog
/// does not know, sorted.
///
/// Subdirectories (the thumbnail directory among them) are skipped.
///
/// # Errors
///
/// Returns `OrphanError::Scan` if the directory cannot be read.
pub fn list_orphans(db: &Database, upload_dir: &Path) -> Result<Vec<String>, OrphanError> {
    let scan_err = |source| OrphanError::Scan {
        path: upload_dir.to_path_buf(),
        source,
    };

    let mut on_disk = BTreeSet::new();
    for entry in fs::read_dir(upload_dir).map_err(scan_err)? {
        let entry = entry.map_err(scan_err)?;
        if !entry.file_type().map_err(scan_err)?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            on_disk.insert(name.to_string());
        }
    }

    let known = db.all_filenames()?;
    let orphans: Vec<String> = on_disk
        .into_iter()
        .filter(|name| !known.contains(name))
        .collect();
    debug!(dir = %upload_dir.display(), orphans = orphans.len(), "scanned for orphans");
    Ok(orphans)
}

/// Catalogued files whose stored path no longer exists
///
/// # Errors
///
/// Returns `DbError` if the catalog cannot be read.
pub fn missing_on_disk(db: &Database) -> Result<Vec<File>, DbError> {
    Ok(db
        .all_files()?
        .into_iter()
        .filter(|file| !file.path.exists())
        .collect())
}

/// Catalogued videos without a thumbnail, ordered by filename
///
/// # Errors
///
/// Returns `DbError` if the catalog cannot be read.
pub fn missing_thumbnails(db: &Database, layout: &StorageLayout) -> Result<Vec<File>, DbError> {
    Ok(db
        .all_files()?
        .into_iter()
        .filter(|file| is_video(&file.filename))
        .filter(|file| !layout.thumbnail_path(&file.filename).exists())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        (dir, db)
    }

    #[test]
    fn test_lists_uncatalogued_files() {
        let (dir, db) = setup();
        fs::write(dir.path().join("a.jpg"), "a").unwrap();
        fs::write(dir.path().join("b.jpg"), "b").unwrap();
        db.insert_file("a.jpg", &dir.path().join("a.jpg")).unwrap();

        assert_eq!(list_orphans(&db, dir.path()).unwrap(), vec!["b.jpg".to_string()]);
    }

    #[test]
    fn test_skips_directories() {
        let (dir, db) = setup();
        fs::create_dir(dir.path().join("thumbnails")).unwrap();
        fs::write(dir.path().join("thumbnails").join("x.mp4.jpg"), "t").unwrap();

        assert!(list_orphans(&db, dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_orphans_are_sorted() {
        let (dir, db) = setup();
        for name in ["c.png", "a.png", "b.png"] {
            fs::write(dir.path().join(name), name).unwrap();
        }
        assert_eq!(list_orphans(&db, dir.path()).unwrap(), vec!["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn test_missing_directory_is_scan_error() {
        let (dir, db) = setup();
        let err = list_orphans(&db, &dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, OrphanError::Scan { .. }));
    }

    #[test]
    fn test_missing_on_disk() {
        let (dir, db) = setup();
        fs::write(dir.path().join("here.jpg"), "x").unwrap();
        db.insert_file("here.jpg", &dir.path().join("here.jpg")).unwrap();
        let gone = db.insert_file("gone.jpg", &dir.path().join("gone.jpg")).unwrap();

        let missing = missing_on_disk(&db).unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].id, gone);
    }

    #[test]
    fn test_missing_thumbnails_only_reports_videos() {
        let (dir, db) = setup();
        let layout = StorageLayout::new(dir.path());
        fs::create_dir_all(layout.thumbnail_dir()).unwrap();
        db.insert_file("photo.jpg", &layout.final_path("photo.jpg")).unwrap();
        db.insert_file("with.mp4", &layout.final_path("with.mp4")).unwrap();
        db.insert_file("without.webm", &layout.final_path("without.webm")).unwrap();
        fs::write(layout.thumbnail_path("with.mp4"), "jpg").unwrap();

        let missing = missing_thumbnails(&db, &layout).unwrap();
        let names: Vec<_> = missing.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["without.webm"]);
    }
}
