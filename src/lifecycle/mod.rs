//! File lifecycle: upload, rename and delete
//!
//! Each operation moves the catalog row, the stored file and its thumbnail
//! together. Filesystem steps run through a [`StagedOperation`] so they can
//! be reversed if a later step fails:
//!
//! - **upload**: conflict check, write `<final>.tmp`, optional media
//!   processing, promote to the final name, insert the catalog row
//! - **rename**: conflict check, rename the file, rename the thumbnail,
//!   update the catalog row
//! - **delete**: remove the catalog row and its associations in one
//!   transaction, then remove the file and thumbnail best-effort
//!
//! Competing claims on one filename within the process are serialized by a
//! reservation set, so two uploads of the same name cannot both pass the
//! conflict check.

pub mod error;
pub mod layout;
pub mod media;
pub mod staged;

pub use error::LifecycleError;
pub use layout::{StorageLayout, is_video, sanitize_filename};
pub use media::{
    FfmpegProcessor, FfmpegThumbnailer, MediaError, MediaOutcome, MediaProcessor,
    ThumbnailRenderer,
};
pub use staged::StagedOperation;

use serde::Serialize;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};

use crate::db::{Database, DbError, File, FileId};

type Result<T> = std::result::Result<T, LifecycleError>;

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    pub id: FileId,
    pub filename: String,
    pub path: PathBuf,
    /// Non-fatal notice from media processing (e.g. the video was re-encoded)
    pub warning: Option<String>,
}

/// Result of a delete: the removed row plus any cleanup that did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub file: File,
    pub warnings: Vec<String>,
}

/// Result of generating thumbnails for several videos
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThumbnailReport {
    pub generated: Vec<String>,
    /// `(filename, error)` for each video that failed
    pub failures: Vec<(String, String)>,
}

/// Exclusive in-process claim on a filename, released on drop
struct NameClaim<'m> {
    names: &'m Mutex<HashSet<String>>,
    name: String,
}

impl Drop for NameClaim<'_> {
    fn drop(&mut self) {
        self.names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.name);
    }
}

fn catalog_error(err: DbError, id: FileId) -> LifecycleError {
    match err {
        DbError::NotFound(_) => LifecycleError::NotFound(id),
        other => LifecycleError::Catalog(other),
    }
}

/// Coordinates the catalog and the upload directory
pub struct LifecycleManager<'a> {
    db: &'a Database,
    layout: StorageLayout,
    media: Box<dyn MediaProcessor + 'a>,
    thumbnails: Box<dyn ThumbnailRenderer + 'a>,
    claimed: Mutex<HashSet<String>>,
}

impl<'a> LifecycleManager<'a> {
    /// Create a manager over `upload_root` using the ffmpeg collaborators.
    ///
    /// The upload root and its thumbnail directory are created if missing.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::Io` if the directories cannot be created.
    pub fn new(db: &'a Database, upload_root: impl Into<PathBuf>) -> Result<Self> {
        let layout = StorageLayout::new(upload_root);
        fs::create_dir_all(layout.thumbnail_dir())
            .map_err(|e| LifecycleError::io("create upload directory", e))?;
        Ok(Self {
            db,
            layout,
            media: Box::new(FfmpegProcessor::default()),
            thumbnails: Box::new(FfmpegThumbnailer::default()),
            claimed: Mutex::new(HashSet::new()),
        })
    }

    /// Replace the media collaborators
    #[must_use]
    pub fn with_collaborators(
        mut self,
        media: impl MediaProcessor + 'a,
        thumbnails: impl ThumbnailRenderer + 'a,
    ) -> Self {
        self.media = Box::new(media);
        self.thumbnails = Box::new(thumbnails);
        self
    }

    #[must_use]
    pub const fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    fn claim(&self, name: &str) -> Result<NameClaim<'_>> {
        let mut names = self.claimed.lock().unwrap_or_else(PoisonError::into_inner);
        if !names.insert(name.to_string()) {
            return Err(LifecycleError::Conflict(name.to_string()));
        }
        Ok(NameClaim {
            names: &self.claimed,
            name: name.to_string(),
        })
    }

    /// Fail with `Conflict` if `name` is taken on disk or in the catalog
    fn ensure_available(&self, name: &str, path: &Path) -> Result<()> {
        match fs::symlink_metadata(path) {
            Ok(_) => return Err(LifecycleError::Conflict(name.to_string())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(LifecycleError::io("check for existing file", err)),
        }
        if self.db.find_file_by_name(name)?.is_some() {
            return Err(LifecycleError::Conflict(name.to_string()));
        }
        Ok(())
    }

    /// Store `content` under `filename` and record it in the catalog.
    ///
    /// The name is sanitized first. An existing file of the same name is a
    /// conflict; nothing is written in that case.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::Conflict` for a taken name, or
    /// `LifecycleError::RolledBack` wrapping the failing step once the
    /// written content has been removed again.
    pub fn upload(&self, filename: &str, content: &mut dyn Read) -> Result<UploadOutcome> {
        let name = sanitize_filename(filename.trim());
        let _claim = self.claim(&name)?;
        let final_path = self.layout.final_path(&name);
        self.ensure_available(&name, &final_path)?;

        let temp_path = self.layout.temp_path(&name);
        let mut staged = StagedOperation::new("upload");

        // A temp file left by an interrupted upload is overwritten; the name
        // claim keeps this process from writing it twice.
        let mut temp = match OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
        {
            Ok(file) => file,
            Err(err) => return Err(LifecycleError::io("create temp file", err)),
        };
        staged.track_created(&temp_path);

        if let Err(err) = io::copy(content, &mut temp).and_then(|_| temp.sync_all()) {
            drop(temp);
            return Err(staged.abort(LifecycleError::io("write upload data", err)));
        }
        drop(temp);
        debug!(path = %temp_path.display(), "upload written to temp file");

        let video = is_video(&name);
        let mut warning = None;
        if video {
            staged.track_created(&final_path);
            match self.media.process(&temp_path, &final_path) {
                Ok(outcome) => warning = outcome.warning,
                Err(err) => return Err(staged.abort(err.into())),
            }
        } else if let Err(err) = staged.rename(&temp_path, &final_path) {
            return Err(staged.abort(LifecycleError::io("move upload into place", err)));
        }

        if video {
            // A thumbnail under this name belongs to some earlier file.
            let thumbnail = self.layout.thumbnail_path(&name);
            if let Err(err) = staged.set_aside(&thumbnail) {
                return Err(staged.abort(LifecycleError::io("move stale thumbnail aside", err)));
            }
            if warning.is_none() {
                staged.track_created(&thumbnail);
                if let Err(err) = self.thumbnails.render(&final_path, &self.layout.thumbnail_dir(), &name) {
                    warn!(file = %name, error = %err, "could not generate thumbnail");
                }
            }
        }

        let id = match self.db.insert_file(&name, &final_path) {
            Ok(id) => id,
            Err(err) if err.is_unique_violation() => {
                return Err(staged.abort(LifecycleError::Conflict(name)));
            }
            Err(err) => return Err(staged.abort(err.into())),
        };
        staged.commit();

        info!(id, file = %name, transcoded = warning.is_some(), "upload stored");
        Ok(UploadOutcome {
            id,
            filename: name,
            path: final_path,
            warning,
        })
    }

    /// Rename a file, its thumbnail and its catalog row.
    ///
    /// Renaming to the current name is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty name, `NotFound`, `Conflict` if the
    /// new name is taken, or `RolledBack` wrapping the failing step after the
    /// file and thumbnail were moved back.
    pub fn rename(&self, id: FileId, new_name: &str) -> Result<File> {
        let trimmed = new_name.trim();
        if trimmed.is_empty() {
            return Err(LifecycleError::Validation(
                "new filename cannot be empty".to_string(),
            ));
        }
        let new_name = sanitize_filename(trimmed);
        let current = self.db.get_file(id).map_err(|e| catalog_error(e, id))?;
        if current.filename == new_name {
            return Ok(current);
        }

        let _claim = self.claim(&new_name)?;
        let new_path = self.layout.final_path(&new_name);
        self.ensure_available(&new_name, &new_path)?;

        let mut staged = StagedOperation::new("rename");
        if let Err(err) = staged.rename(&current.path, &new_path) {
            return Err(staged.abort(LifecycleError::io("rename file", err)));
        }

        // A thumbnail already under the new name belongs to some earlier file.
        let new_thumb = self.layout.thumbnail_path(&new_name);
        if let Err(err) = staged.set_aside(&new_thumb) {
            return Err(staged.abort(LifecycleError::io("move stale thumbnail aside", err)));
        }

        let old_thumb = self.layout.thumbnail_path(&current.filename);
        if old_thumb.is_file() {
            if let Err(err) = staged.rename(&old_thumb, &new_thumb) {
                return Err(staged.abort(LifecycleError::io("rename thumbnail", err)));
            }
        }

        match self.db.update_file_location(id, &new_name, &new_path) {
            Ok(()) => {}
            Err(err) if err.is_unique_violation() => {
                return Err(staged.abort(LifecycleError::Conflict(new_name)));
            }
            Err(err) => return Err(staged.abort(catalog_error(err, id))),
        }
        staged.commit();

        info!(id, from = %current.filename, to = %new_name, "file renamed");
        Ok(File {
            filename: new_name,
            path: new_path,
            ..current
        })
    }

    /// Delete a file from the catalog, then remove its content and thumbnail.
    ///
    /// The catalog delete is authoritative: once it commits the operation
    /// succeeds, and cleanup failures come back as warnings.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file does not exist, or `Catalog` if the
    /// delete transaction fails (nothing is removed from disk then).
    pub fn delete(&self, id: FileId) -> Result<DeleteOutcome> {
        let file = self.db.delete_file(id).map_err(|e| catalog_error(e, id))?;
        let mut warnings = Vec::new();

        if let Err(err) = fs::remove_file(&file.path) {
            let message = format!("failed to delete file {}: {err}", file.path.display());
            warn!(id, "{message}");
            warnings.push(message);
        }

        let thumbnail = self.layout.thumbnail_path(&file.filename);
        if thumbnail.exists() {
            if let Err(err) = fs::remove_file(&thumbnail) {
                let message = format!("failed to delete thumbnail {}: {err}", thumbnail.display());
                warn!(id, "{message}");
                warnings.push(message);
            }
        }

        info!(id, file = %file.filename, warnings = warnings.len(), "file deleted");
        Ok(DeleteOutcome { file, warnings })
    }

    /// Render the thumbnail of one video, optionally at an `HH:MM:SS` offset
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Validation` for a non-video file, or `Media`.
    pub fn generate_thumbnail(&self, id: FileId, offset: Option<&str>) -> Result<PathBuf> {
        let file = self.db.get_file(id).map_err(|e| catalog_error(e, id))?;
        if !is_video(&file.filename) {
            return Err(LifecycleError::Validation(format!(
                "'{}' is not a video",
                file.filename
            )));
        }
        let dir = self.layout.thumbnail_dir();
        let path = match offset {
            Some(offset) => self.thumbnails.render_at(&file.path, &dir, &file.filename, offset)?,
            None => self.thumbnails.render(&file.path, &dir, &file.filename)?,
        };
        info!(id, thumbnail = %path.display(), "thumbnail generated");
        Ok(path)
    }

    /// Render thumbnails for every catalogued video that lacks one
    ///
    /// # Errors
    ///
    /// Returns `Catalog` if the video list cannot be read; per-video
    /// failures are collected in the report.
    pub fn generate_missing_thumbnails(&self) -> Result<ThumbnailReport> {
        let mut report = ThumbnailReport::default();
        for file in crate::orphans::missing_thumbnails(self.db, &self.layout)? {
            match self
                .thumbnails
                .render(&file.path, &self.layout.thumbnail_dir(), &file.filename)
            {
                Ok(_) => report.generated.push(file.filename),
                Err(err) => report.failures.push((file.filename, err.to_string())),
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockMedia, TestCatalog};
    use std::io::Cursor;

    fn upload(catalog: &TestCatalog, name: &str) -> UploadOutcome {
        catalog
            .manager()
            .upload(name, &mut Cursor::new(b"content".to_vec()))
            .unwrap()
    }

    #[test]
    fn test_upload_stores_file_and_row() {
        let catalog = TestCatalog::new();
        let outcome = upload(&catalog, "photo.jpg");

        assert_eq!(outcome.filename, "photo.jpg");
        assert_eq!(fs::read(&outcome.path).unwrap(), b"content");
        assert!(!catalog.layout().temp_path("photo.jpg").exists());
        assert_eq!(catalog.db().get_file(outcome.id).unwrap().path, outcome.path);
        assert!(outcome.warning.is_none());
    }

    #[test]
    fn test_upload_sanitizes_name() {
        let catalog = TestCatalog::new();
        let outcome = upload(&catalog, "../evil.jpg");
        assert_eq!(outcome.filename, "__evil.jpg");
        assert!(outcome.path.starts_with(catalog.upload_dir()));
    }

    #[test]
    fn test_upload_conflict_writes_nothing() {
        let catalog = TestCatalog::new();
        let existing = catalog.upload_dir().join("taken.jpg");
        fs::write(&existing, b"original").unwrap();

        let err = catalog
            .manager()
            .upload("taken.jpg", &mut Cursor::new(b"new".to_vec()))
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Conflict(ref n) if n == "taken.jpg"));
        assert_eq!(fs::read(&existing).unwrap(), b"original");
        assert!(!catalog.layout().temp_path("taken.jpg").exists());
        assert_eq!(catalog.db().count().unwrap(), 0);
    }

    #[test]
    fn test_upload_conflict_with_catalog_row() {
        let catalog = TestCatalog::new();
        catalog
            .db()
            .insert_file("ghost.jpg", &catalog.upload_dir().join("ghost.jpg"))
            .unwrap();
        let err = catalog
            .manager()
            .upload("ghost.jpg", &mut Cursor::new(b"x".to_vec()))
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Conflict(_)));
        assert!(!catalog.upload_dir().join("ghost.jpg").exists());
    }

    #[test]
    fn test_video_upload_renders_thumbnail() {
        let catalog = TestCatalog::new();
        let outcome = upload(&catalog, "clip.mp4");
        assert!(catalog.layout().thumbnail_path("clip.mp4").exists());
        assert!(outcome.warning.is_none());
        assert_eq!(catalog.thumbnailer().rendered(), vec!["clip.mp4".to_string()]);
    }

    #[test]
    fn test_transcoded_upload_returns_warning_without_thumbnail() {
        let catalog = TestCatalog::with_media(MockMedia::Transcode);
        let outcome = upload(&catalog, "clip.mov");
        assert_eq!(outcome.warning.as_deref(), Some(media::HEVC_WARNING));
        assert!(outcome.path.exists());
        assert!(!catalog.layout().temp_path("clip.mov").exists());
        assert!(catalog.thumbnailer().rendered().is_empty());
    }

    #[test]
    fn test_thumbnail_failure_does_not_fail_upload() {
        let catalog = TestCatalog::with_failing_thumbnails();
        let outcome = upload(&catalog, "clip.mp4");
        assert!(outcome.path.exists());
        assert!(!catalog.layout().thumbnail_path("clip.mp4").exists());
        assert_eq!(catalog.db().count().unwrap(), 1);
    }

    #[test]
    fn test_media_failure_leaves_nothing_behind() {
        let catalog = TestCatalog::with_media(MockMedia::Fail);
        let err = catalog
            .manager()
            .upload("clip.mp4", &mut Cursor::new(b"x".to_vec()))
            .unwrap_err();
        assert!(matches!(err.cause(), LifecycleError::Media(_)));
        assert!(!err.left_inconsistent());
        assert!(!catalog.layout().temp_path("clip.mp4").exists());
        assert!(!catalog.layout().final_path("clip.mp4").exists());
        assert_eq!(catalog.db().count().unwrap(), 0);
    }

    #[test]
    fn test_catalog_insert_failure_removes_stored_file() {
        let catalog = TestCatalog::new();
        catalog.fail_inserts();
        let err = catalog
            .manager()
            .upload("clip.mp4", &mut Cursor::new(b"x".to_vec()))
            .unwrap_err();
        assert!(matches!(err.cause(), LifecycleError::Catalog(_)));
        assert!(!catalog.layout().final_path("clip.mp4").exists());
        assert!(!catalog.layout().thumbnail_path("clip.mp4").exists());
        assert!(catalog.orphans().is_empty());
    }

    #[test]
    fn test_upload_overwrites_leftover_temp_file() {
        let catalog = TestCatalog::new();
        let temp = catalog.layout().temp_path("a.jpg");
        fs::write(&temp, b"partial from an interrupted upload").unwrap();

        let outcome = upload(&catalog, "a.jpg");
        assert_eq!(fs::read(&outcome.path).unwrap(), b"content");
        assert!(!temp.exists());
        assert!(catalog.orphans().is_empty());
    }

    #[test]
    fn test_video_upload_replaces_stale_thumbnail() {
        let catalog = TestCatalog::new();
        let thumb = catalog.layout().thumbnail_path("clip.mp4");
        fs::write(&thumb, b"stale").unwrap();

        upload(&catalog, "clip.mp4");
        assert_ne!(fs::read(&thumb).unwrap(), b"stale");
        assert!(!staged::aside_path(&thumb).exists());

        let transcoded = TestCatalog::with_media(MockMedia::Transcode);
        let thumb = transcoded.layout().thumbnail_path("clip.mov");
        fs::write(&thumb, b"stale").unwrap();
        upload(&transcoded, "clip.mov");
        assert!(!thumb.exists());
        assert!(!staged::aside_path(&thumb).exists());
    }

    #[test]
    fn test_failed_upload_keeps_preexisting_thumbnail() {
        let catalog = TestCatalog::new();
        let thumb = catalog.layout().thumbnail_path("clip.mp4");
        fs::write(&thumb, b"stale").unwrap();
        catalog.fail_inserts();

        let err = catalog
            .manager()
            .upload("clip.mp4", &mut Cursor::new(b"x".to_vec()))
            .unwrap_err();
        assert!(matches!(err.cause(), LifecycleError::Catalog(_)));
        assert_eq!(fs::read(&thumb).unwrap(), b"stale");
        assert!(!staged::aside_path(&thumb).exists());
    }

    #[test]
    fn test_concurrent_claim_on_same_name_conflicts() {
        let catalog = TestCatalog::new();
        let manager = catalog.manager();
        let _held = manager.claim("busy.jpg").unwrap();
        let err = manager
            .upload("busy.jpg", &mut Cursor::new(b"x".to_vec()))
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Conflict(_)));
    }

    #[test]
    fn test_rename_moves_file_thumbnail_and_row() {
        let catalog = TestCatalog::new();
        let outcome = upload(&catalog, "clip.mp4");

        let renamed = catalog.manager().rename(outcome.id, "holiday.mp4").unwrap();
        assert_eq!(renamed.filename, "holiday.mp4");
        assert!(renamed.path.exists());
        assert!(!outcome.path.exists());
        assert!(catalog.layout().thumbnail_path("holiday.mp4").exists());
        assert!(!catalog.layout().thumbnail_path("clip.mp4").exists());
        assert_eq!(catalog.db().get_file(outcome.id).unwrap(), renamed);
    }

    #[test]
    fn test_rename_to_same_name_is_noop() {
        let catalog = TestCatalog::new();
        let outcome = upload(&catalog, "a.jpg");
        let file = catalog.manager().rename(outcome.id, " a.jpg ").unwrap();
        assert_eq!(file.filename, "a.jpg");
        assert!(outcome.path.exists());
    }

    #[test]
    fn test_rename_validation_and_conflicts() {
        let catalog = TestCatalog::new();
        let a = upload(&catalog, "a.jpg");
        upload(&catalog, "b.jpg");
        let manager = catalog.manager();

        assert!(matches!(manager.rename(a.id, "   "), Err(LifecycleError::Validation(_))));
        assert!(matches!(manager.rename(999, "c.jpg"), Err(LifecycleError::NotFound(999))));
        assert!(matches!(manager.rename(a.id, "b.jpg"), Err(LifecycleError::Conflict(_))));
        assert!(a.path.exists());
    }

    #[test]
    fn test_rename_catalog_failure_restores_disk_state() {
        let catalog = TestCatalog::new();
        let outcome = upload(&catalog, "clip.mp4");
        let before = catalog.snapshot_dir();
        catalog.fail_renames();

        let err = catalog.manager().rename(outcome.id, "other.mp4").unwrap_err();
        assert!(matches!(err.cause(), LifecycleError::Catalog(_)));
        assert!(!err.left_inconsistent());
        assert_eq!(catalog.snapshot_dir(), before);
        assert_eq!(catalog.db().get_file(outcome.id).unwrap().filename, "clip.mp4");
    }

    #[test]
    fn test_rename_thumbnail_failure_restores_file() {
        let catalog = TestCatalog::new();
        let outcome = upload(&catalog, "clip.mp4");
        // A non-empty directory where the new thumbnail would go blocks the rename.
        let blocker = catalog.layout().thumbnail_path("other.mp4");
        fs::create_dir_all(blocker.join("inner")).unwrap();

        let err = catalog.manager().rename(outcome.id, "other.mp4").unwrap_err();
        assert!(matches!(err.cause(), LifecycleError::Io { .. }));
        assert!(outcome.path.exists());
        assert!(!catalog.layout().final_path("other.mp4").exists());
        assert!(catalog.layout().thumbnail_path("clip.mp4").is_file());
    }

    #[test]
    fn test_rename_drops_stale_thumbnail_of_target_name() {
        let catalog = TestCatalog::new();
        let outcome = upload(&catalog, "a.jpg");
        let stale = catalog.layout().thumbnail_path("b.mp4");
        fs::write(&stale, b"thumb of a deleted b.mp4").unwrap();

        catalog.manager().rename(outcome.id, "b.mp4").unwrap();
        assert!(!stale.exists());
        assert!(!staged::aside_path(&stale).exists());
    }

    #[test]
    fn test_rename_over_stale_thumbnail_uses_own_thumbnail() {
        let catalog = TestCatalog::new();
        let outcome = upload(&catalog, "clip.mp4");
        let own = fs::read(catalog.layout().thumbnail_path("clip.mp4")).unwrap();
        let stale = catalog.layout().thumbnail_path("b.mp4");
        fs::write(&stale, b"thumb of a deleted b.mp4").unwrap();

        catalog.manager().rename(outcome.id, "b.mp4").unwrap();
        assert_eq!(fs::read(&stale).unwrap(), own);
        assert!(!staged::aside_path(&stale).exists());
    }

    #[test]
    fn test_failed_rename_restores_stale_thumbnail() {
        let catalog = TestCatalog::new();
        let outcome = upload(&catalog, "clip.mp4");
        let stale = catalog.layout().thumbnail_path("b.mp4");
        fs::write(&stale, b"thumb of a deleted b.mp4").unwrap();
        let before = catalog.snapshot_dir();
        catalog.fail_renames();

        assert!(catalog.manager().rename(outcome.id, "b.mp4").is_err());
        assert_eq!(catalog.snapshot_dir(), before);
        assert_eq!(fs::read(&stale).unwrap(), b"thumb of a deleted b.mp4");
    }

    #[test]
    fn test_rename_unique_violation_is_a_conflict() {
        let catalog = TestCatalog::new();
        let outcome = upload(&catalog, "a.jpg");
        catalog.steal_renamed_names();

        let err = catalog.manager().rename(outcome.id, "b.jpg").unwrap_err();
        assert!(matches!(err.cause(), LifecycleError::Conflict(n) if n == "b.jpg"));
        assert!(outcome.path.exists());
        assert!(!catalog.layout().final_path("b.jpg").exists());
    }

    #[test]
    fn test_delete_removes_row_file_and_thumbnail() {
        let catalog = TestCatalog::new();
        let outcome = upload(&catalog, "clip.mp4");
        catalog.db().add_tag(outcome.id, "colour", "blue").unwrap();

        let deleted = catalog.manager().delete(outcome.id).unwrap();
        assert!(deleted.warnings.is_empty());
        assert!(!outcome.path.exists());
        assert!(!catalog.layout().thumbnail_path("clip.mp4").exists());
        assert!(catalog.db().tag_counts().unwrap().is_empty());
        assert!(matches!(
            catalog.manager().delete(outcome.id),
            Err(LifecycleError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_cleanup_failure_is_a_warning() {
        let catalog = TestCatalog::new();
        let outcome = upload(&catalog, "a.jpg");
        catalog.point_row_elsewhere(outcome.id);

        let deleted = catalog.manager().delete(outcome.id).unwrap();
        assert_eq!(deleted.warnings.len(), 1);
        assert!(catalog.db().get_file(outcome.id).is_err());
        assert_eq!(catalog.orphans(), vec!["a.jpg".to_string()]);
    }

    #[test]
    fn test_generate_missing_thumbnails() {
        let catalog = TestCatalog::new();
        let outcome = upload(&catalog, "clip.mp4");
        upload(&catalog, "photo.jpg");
        fs::remove_file(catalog.layout().thumbnail_path("clip.mp4")).unwrap();

        let report = catalog.manager().generate_missing_thumbnails().unwrap();
        assert_eq!(report.generated, vec!["clip.mp4".to_string()]);
        assert!(report.failures.is_empty());

        let path = catalog.manager().generate_thumbnail(outcome.id, Some("00:00:01")).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_generate_thumbnail_rejects_non_video() {
        let catalog = TestCatalog::new();
        let outcome = upload(&catalog, "photo.jpg");
        assert!(matches!(
            catalog.manager().generate_thumbnail(outcome.id, None),
            Err(LifecycleError::Validation(_))
        ));
    }
}
