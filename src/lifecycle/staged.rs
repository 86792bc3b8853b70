//! Compensating actions for filesystem steps
//!
//! The filesystem and the catalog share no transaction. A [`StagedOperation`]
//! records how to undo every filesystem step as it completes; on failure the
//! recorded steps are reversed newest first. An operation dropped without
//! [`commit`](StagedOperation::commit) is rolled back as well.
//!
//! A path that is in the way can be [set aside](StagedOperation::set_aside):
//! rollback puts it back, commit removes it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

use super::error::LifecycleError;

#[derive(Debug)]
enum Compensation {
    /// Move `from` back to `to`
    Rename { from: PathBuf, to: PathBuf },
    /// Remove a path this operation created; a missing path is fine
    Remove(PathBuf),
}

impl Compensation {
    fn undo(&self) -> io::Result<()> {
        match self {
            Self::Rename { from, to } => fs::rename(from, to),
            Self::Remove(path) => match fs::remove_file(path) {
                Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
                _ => Ok(()),
            },
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Rename { from, to } => {
                format!("rename {} back to {}", from.display(), to.display())
            }
            Self::Remove(path) => format!("remove {}", path.display()),
        }
    }
}

/// A multi-step filesystem change that can be reversed
#[derive(Debug)]
pub struct StagedOperation {
    name: &'static str,
    steps: Vec<Compensation>,
    /// Set-aside copies to remove once the operation commits
    discard: Vec<PathBuf>,
}

/// Where [`StagedOperation::set_aside`] parks `path`
#[must_use]
pub fn aside_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".aside");
    PathBuf::from(name)
}

impl StagedOperation {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
            discard: Vec::new(),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Number of steps that would be reversed on rollback
    #[must_use]
    pub fn pending(&self) -> usize {
        self.steps.len()
    }

    /// Rename `from` to `to` and record the reverse rename
    ///
    /// # Errors
    ///
    /// Returns the I/O error of the rename; nothing is recorded in that case.
    pub fn rename(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)?;
        debug!(operation = self.name, from = %from.display(), to = %to.display(), "staged rename");
        self.steps.push(Compensation::Rename {
            from: to.to_path_buf(),
            to: from.to_path_buf(),
        });
        Ok(())
    }

    /// Record that `path` belongs to this operation and must be removed on rollback
    pub fn track_created(&mut self, path: &Path) {
        self.steps.push(Compensation::Remove(path.to_path_buf()));
    }

    /// Move an existing file at `path` out of the way.
    ///
    /// Rollback moves it back; commit deletes it. Returns whether a file was
    /// there to set aside. Directories are left alone.
    ///
    /// # Errors
    ///
    /// Returns the I/O error of the move; nothing is recorded in that case.
    pub fn set_aside(&mut self, path: &Path) -> io::Result<bool> {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => return Ok(false),
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(err) => return Err(err),
        }
        let aside = aside_path(path);
        self.rename(path, &aside)?;
        self.discard.push(aside);
        Ok(true)
    }

    /// Keep every step; nothing will be reversed
    pub fn commit(mut self) {
        debug!(operation = self.name, steps = self.steps.len(), "staged operation committed");
        self.steps.clear();
        for path in self.discard.drain(..) {
            if let Err(err) = fs::remove_file(&path) {
                warn!(operation = self.name, path = %path.display(), error = %err, "could not remove set-aside file");
            }
        }
    }

    /// Reverse every recorded step, newest first, and return the failures
    pub fn rollback(mut self) -> Vec<String> {
        self.unwind()
    }

    /// Roll back and wrap `cause` with the rollback outcome
    #[must_use]
    pub fn abort(mut self, cause: LifecycleError) -> LifecycleError {
        warn!(operation = self.name, error = %cause, "operation failed, rolling back");
        let rollback_failures = self.unwind();
        LifecycleError::RolledBack {
            operation: self.name,
            source: Box::new(cause),
            rollback_failures,
        }
    }

    fn unwind(&mut self) -> Vec<String> {
        self.discard.clear();
        let mut failures = Vec::new();
        while let Some(step) = self.steps.pop() {
            if let Err(err) = step.undo() {
                let message = format!("failed to {}: {err}", step.describe());
                error!(operation = self.name, "{message}");
                failures.push(message);
            }
        }
        failures
    }
}

impl Drop for StagedOperation {
    fn drop(&mut self) {
        if !self.steps.is_empty() {
            warn!(operation = self.name, steps = self.steps.len(), "staged operation dropped, rolling back");
            self.unwind();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rollback_reverses_in_order() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        let c = dir.path().join("c");
        fs::write(&a, "content").unwrap();

        let mut op = StagedOperation::new("test");
        op.rename(&a, &b).unwrap();
        op.rename(&b, &c).unwrap();
        assert_eq!(op.pending(), 2);

        assert!(op.rollback().is_empty());
        assert!(a.exists());
        assert!(!b.exists());
        assert!(!c.exists());
    }

    #[test]
    fn test_commit_keeps_changes() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, "content").unwrap();

        let mut op = StagedOperation::new("test");
        op.rename(&a, &b).unwrap();
        op.commit();
        assert!(b.exists());
        assert!(!a.exists());
    }

    #[test]
    fn test_drop_without_commit_rolls_back() {
        let dir = TempDir::new().unwrap();
        let created = dir.path().join("new.tmp");
        {
            let mut op = StagedOperation::new("test");
            fs::write(&created, "partial").unwrap();
            op.track_created(&created);
        }
        assert!(!created.exists());
    }

    #[test]
    fn test_removing_missing_path_is_not_a_failure() {
        let dir = TempDir::new().unwrap();
        let mut op = StagedOperation::new("test");
        op.track_created(&dir.path().join("never-written"));
        assert!(op.rollback().is_empty());
    }

    #[test]
    fn test_abort_keeps_cause_and_reports_rollback_failures() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, "content").unwrap();

        let mut op = StagedOperation::new("rename");
        op.rename(&a, &b).unwrap();
        // Make the reverse rename impossible.
        fs::remove_file(&b).unwrap();

        let err = op.abort(LifecycleError::Validation("boom".into()));
        match err {
            LifecycleError::RolledBack {
                operation,
                source,
                rollback_failures,
            } => {
                assert_eq!(operation, "rename");
                assert!(matches!(*source, LifecycleError::Validation(_)));
                assert_eq!(rollback_failures.len(), 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_set_aside_is_restored_on_rollback() {
        let dir = TempDir::new().unwrap();
        let thumb = dir.path().join("b.mp4.jpg");
        fs::write(&thumb, "old").unwrap();

        let mut op = StagedOperation::new("test");
        assert!(op.set_aside(&thumb).unwrap());
        assert!(!thumb.exists());
        fs::write(&thumb, "new").unwrap();
        op.track_created(&thumb);

        assert!(op.rollback().is_empty());
        assert_eq!(fs::read_to_string(&thumb).unwrap(), "old");
        assert!(!aside_path(&thumb).exists());
    }

    #[test]
    fn test_set_aside_is_removed_on_commit() {
        let dir = TempDir::new().unwrap();
        let thumb = dir.path().join("b.mp4.jpg");
        fs::write(&thumb, "old").unwrap();

        let mut op = StagedOperation::new("test");
        assert!(op.set_aside(&thumb).unwrap());
        op.commit();
        assert!(!thumb.exists());
        assert!(!aside_path(&thumb).exists());
    }

    #[test]
    fn test_set_aside_skips_missing_paths_and_directories() {
        let dir = TempDir::new().unwrap();
        let mut op = StagedOperation::new("test");
        assert!(!op.set_aside(&dir.path().join("absent")).unwrap());
        assert!(!op.set_aside(dir.path()).unwrap());
        assert_eq!(op.pending(), 0);
    }

    #[test]
    fn test_failed_rename_records_nothing() {
        let dir = TempDir::new().unwrap();
        let mut op = StagedOperation::new("test");
        assert!(op.rename(&dir.path().join("missing"), &dir.path().join("x")).is_err());
        assert_eq!(op.pending(), 0);
    }
}
