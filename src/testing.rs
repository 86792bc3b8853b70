//! Testing utilities for taggart
//!
//! `TestCatalog` bundles a temporary upload root, a file-backed catalog and
//! mock media collaborators, and can simulate catalog failures with
//! triggers. Only available when compiled with `cfg(test)`.

use rusqlite::params;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tempfile::TempDir;

use crate::db::{Database, FileId};
use crate::lifecycle::media::HEVC_WARNING;
use crate::lifecycle::{LifecycleManager, MediaError, MediaOutcome, MediaProcessor, StorageLayout, ThumbnailRenderer};
use crate::orphans;

/// Scripted media processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockMedia {
    /// Move the temp file into place
    Passthrough,
    /// Pretend to re-encode and return the HEVC warning
    Transcode,
    /// Fail as if the codec could not be probed
    Fail,
}

impl MediaProcessor for MockMedia {
    fn process(&self, temp: &Path, final_path: &Path) -> Result<MediaOutcome, MediaError> {
        match self {
            Self::Passthrough => {
                fs::rename(temp, final_path)?;
                Ok(MediaOutcome::unchanged(final_path.to_path_buf()))
            }
            Self::Transcode => {
                fs::copy(temp, final_path)?;
                fs::remove_file(temp)?;
                Ok(MediaOutcome {
                    path: final_path.to_path_buf(),
                    warning: Some(HEVC_WARNING.to_string()),
                })
            }
            Self::Fail => Err(MediaError::Probe("mock probe failure".to_string())),
        }
    }
}

/// Thumbnail renderer that writes a placeholder and records each key
#[derive(Debug, Clone, Default)]
pub struct RecordingThumbnailer {
    rendered: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingThumbnailer {
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Keys rendered so far, in call order
    #[must_use]
    pub fn rendered(&self) -> Vec<String> {
        self.rendered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ThumbnailRenderer for RecordingThumbnailer {
    fn render(&self, _source: &Path, dest_dir: &Path, key: &str) -> Result<PathBuf, MediaError> {
        if self.fail {
            return Err(MediaError::Thumbnail("mock render failure".to_string()));
        }
        fs::create_dir_all(dest_dir)?;
        let dest = dest_dir.join(format!("{key}.jpg"));
        fs::write(&dest, b"jpeg")?;
        self.rendered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(key.to_string());
        Ok(dest)
    }
}

/// Temporary catalog plus upload root, removed on drop
pub struct TestCatalog {
    dir: TempDir,
    db: Database,
    layout: StorageLayout,
    media: MockMedia,
    thumbnailer: RecordingThumbnailer,
}

impl TestCatalog {
    /// # Panics
    /// Panics if the temporary directory or database cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self::with_media(MockMedia::Passthrough)
    }

    /// # Panics
    /// Panics if the temporary directory or database cannot be created.
    #[must_use]
    pub fn with_media(media: MockMedia) -> Self {
        Self::build(media, RecordingThumbnailer::default())
    }

    /// # Panics
    /// Panics if the temporary directory or database cannot be created.
    #[must_use]
    pub fn with_failing_thumbnails() -> Self {
        Self::build(MockMedia::Passthrough, RecordingThumbnailer::failing())
    }

    fn build(media: MockMedia, thumbnailer: RecordingThumbnailer) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::open(dir.path().join("catalog.db")).expect("Failed to open test database");
        let layout = StorageLayout::new(dir.path().join("uploads"));
        fs::create_dir_all(layout.thumbnail_dir()).expect("Failed to create upload dir");
        Self {
            dir,
            db,
            layout,
            media,
            thumbnailer,
        }
    }

    #[must_use]
    pub const fn db(&self) -> &Database {
        &self.db
    }

    #[must_use]
    pub fn upload_dir(&self) -> &Path {
        self.layout.root()
    }

    #[must_use]
    pub const fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    #[must_use]
    pub const fn thumbnailer(&self) -> &RecordingThumbnailer {
        &self.thumbnailer
    }

    /// A manager over this catalog using the mock collaborators
    ///
    /// # Panics
    /// Panics if the manager cannot be created.
    #[must_use]
    pub fn manager(&self) -> LifecycleManager<'_> {
        LifecycleManager::new(&self.db, self.layout.root())
            .expect("Failed to create lifecycle manager")
            .with_collaborators(self.media, self.thumbnailer.clone())
    }

    /// Make every subsequent file insert fail
    pub fn fail_inserts(&self) {
        self.db
            .lock()
            .execute_batch(
                "CREATE TRIGGER fail_insert BEFORE INSERT ON files
                 BEGIN SELECT RAISE(ABORT, 'simulated insert failure'); END;",
            )
            .expect("Failed to install trigger");
    }

    /// Make every subsequent file update fail
    pub fn fail_renames(&self) {
        self.db
            .lock()
            .execute_batch(
                "CREATE TRIGGER fail_update BEFORE UPDATE ON files
                 BEGIN SELECT RAISE(ABORT, 'simulated update failure'); END;",
            )
            .expect("Failed to install trigger");
    }

    /// Make every subsequent rename collide with a row that takes the new
    /// name first
    pub fn steal_renamed_names(&self) {
        self.db
            .lock()
            .execute_batch(
                "CREATE TRIGGER steal_name BEFORE UPDATE OF filename ON files
                 BEGIN INSERT INTO files (filename, path) VALUES (NEW.filename, 'elsewhere'); END;",
            )
            .expect("Failed to install trigger");
    }

    /// Point a row at a path that does not exist, so removing it fails
    pub fn point_row_elsewhere(&self, id: FileId) {
        let elsewhere = self.dir.path().join("missing").join("file");
        self.db
            .lock()
            .execute(
                "UPDATE files SET path = ?1 WHERE id = ?2",
                params![elsewhere.to_string_lossy(), id],
            )
            .expect("Failed to repoint row");
    }

    /// Orphans under the upload root
    ///
    /// # Panics
    /// Panics if the scan fails.
    #[must_use]
    pub fn orphans(&self) -> Vec<String> {
        orphans::list_orphans(&self.db, self.upload_dir()).expect("Failed to list orphans")
    }

    /// Every path under the upload root, relative and sorted
    #[must_use]
    pub fn snapshot_dir(&self) -> Vec<PathBuf> {
        fn walk(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) {
            for entry in fs::read_dir(dir).expect("Failed to read dir") {
                let path = entry.expect("Failed to read entry").path();
                if path.is_dir() {
                    walk(root, &path, out);
                }
                out.push(path.strip_prefix(root).expect("path under root").to_path_buf());
            }
        }
        let mut paths = Vec::new();
        walk(self.upload_dir(), self.upload_dir(), &mut paths);
        paths.sort();
        paths
    }
}

impl Default for TestCatalog {
    fn default() -> Self {
        Self::new()
    }
}
