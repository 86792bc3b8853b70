//! On-disk layout of the upload directory
//!
//! `<root>/<filename>` holds the content, `<root>/thumbnails/<filename>.jpg`
//! its derived thumbnail. Thumbnails are keyed by filename only, so renaming
//! a file must rename its thumbnail too.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Subdirectory of the upload root holding thumbnails
pub const THUMBNAIL_DIR: &str = "thumbnails";

/// Extensions (lowercase, without dot) handled as video
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm", "m4v"];

/// Paths derived from a filename under one upload root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn final_path(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// `<final>.tmp`, where content is written before it is promoted
    #[must_use]
    pub fn temp_path(&self, filename: &str) -> PathBuf {
        let mut name = OsString::from(filename);
        name.push(".tmp");
        self.root.join(name)
    }

    #[must_use]
    pub fn thumbnail_dir(&self) -> PathBuf {
        self.root.join(THUMBNAIL_DIR)
    }

    #[must_use]
    pub fn thumbnail_path(&self, filename: &str) -> PathBuf {
        self.thumbnail_dir().join(format!("{filename}.jpg"))
    }
}

/// Make a user supplied name safe to use as a single path component.
///
/// Path separators and `..` become `_`; an empty name becomes `file`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let cleaned = name.replace(['/', '\\'], "_").replace("..", "_");
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Whether the filename has a video extension (case-insensitive)
#[must_use]
pub fn is_video(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|video| ext.eq_ignore_ascii_case(video))
        })
}
