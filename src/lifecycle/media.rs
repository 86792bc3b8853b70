//! External media collaborators
//!
//! Uploads classified as video go through a [`MediaProcessor`], which may
//! re-encode them for browser playback, and get a preview frame from a
//! [`ThumbnailRenderer`]. The default implementations shell out to
//! `ffprobe` / `ffmpeg`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use thiserror::Error;
use tracing::{debug, info};

/// Warning returned when an upload was re-encoded
pub const HEVC_WARNING: &str =
    "The video uses HEVC and has been re-encoded to H.264 for browser compatibility.";

/// Thumbnail width in pixels (height keeps the aspect ratio)
pub const THUMBNAIL_WIDTH: u32 = 400;

/// Default frame offset for thumbnails
pub const THUMBNAIL_OFFSET: &str = "00:00:05";

/// Errors from media collaborators
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to probe video codec: {0}")]
    Probe(String),

    #[error("failed to re-encode HEVC video: {0}")]
    Transcode(String),

    #[error("failed to generate thumbnail: {0}")]
    Thumbnail(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// What the processor did with an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaOutcome {
    /// Where the processed content now lives
    pub path: PathBuf,
    /// Set when the content was altered
    pub warning: Option<String>,
}

impl MediaOutcome {
    #[must_use]
    pub const fn unchanged(path: PathBuf) -> Self {
        Self {
            path,
            warning: None,
        }
    }

    /// Whether the content was rewritten rather than moved
    #[must_use]
    pub const fn transcoded(&self) -> bool {
        self.warning.is_some()
    }
}

/// Prepares an uploaded video for storage
pub trait MediaProcessor: Send + Sync {
    /// Move or transcode `temp` into `final_path`.
    ///
    /// On success `temp` no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `MediaError` if inspection or transcoding fails.
    fn process(&self, temp: &Path, final_path: &Path) -> Result<MediaOutcome, MediaError>;
}

/// Renders a preview image for a stored video
pub trait ThumbnailRenderer: Send + Sync {
    /// Write `<dest_dir>/<key>.jpg` from `source` and return its path
    ///
    /// # Errors
    ///
    /// Returns `MediaError` if no frame could be rendered.
    fn render(&self, source: &Path, dest_dir: &Path, key: &str) -> Result<PathBuf, MediaError>;

    /// Like [`render`](Self::render) but at a given `HH:MM:SS` offset
    ///
    /// # Errors
    ///
    /// Returns `MediaError` if no frame could be rendered.
    fn render_at(
        &self,
        source: &Path,
        dest_dir: &Path,
        key: &str,
        _offset: &str,
    ) -> Result<PathBuf, MediaError> {
        self.render(source, dest_dir, key)
    }
}

fn stderr_tail(output: &Output) -> String {
    let text = String::from_utf8_lossy(&output.stderr);
    text.lines()
        .last()
        .map_or_else(|| format!("exit status {}", output.status), str::to_string)
}

/// `ffprobe` + `ffmpeg` media processor
#[derive(Debug, Clone)]
pub struct FfmpegProcessor {
    ffprobe: PathBuf,
    ffmpeg: PathBuf,
}

impl Default for FfmpegProcessor {
    fn default() -> Self {
        Self {
            ffprobe: PathBuf::from("ffprobe"),
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

impl FfmpegProcessor {
    #[must_use]
    pub fn new(ffprobe: impl Into<PathBuf>, ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
            ffmpeg: ffmpeg.into(),
        }
    }

    /// Codec name of the first video stream
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Probe` if `ffprobe` cannot run or fails.
    pub fn probe_codec(&self, path: &Path) -> Result<String, MediaError> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-select_streams", "v:0"])
            .args(["-show_entries", "stream=codec_name"])
            .args(["-of", "default=nokey=1:noprint_wrappers=1"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| MediaError::Probe(e.to_string()))?;
        if !output.status.success() {
            return Err(MediaError::Probe(stderr_tail(&output)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn reencode(&self, input: &Path, output_path: &Path) -> Result<(), MediaError> {
        let output = Command::new(&self.ffmpeg)
            .arg("-i")
            .arg(input)
            .args(["-c:v", "libx264", "-profile:v", "baseline", "-preset", "fast"])
            .args(["-crf", "23", "-c:a", "aac", "-movflags", "+faststart"])
            .arg(output_path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| MediaError::Transcode(e.to_string()))?;
        if !output.status.success() {
            return Err(MediaError::Transcode(stderr_tail(&output)));
        }
        Ok(())
    }
}

impl MediaProcessor for FfmpegProcessor {
    fn process(&self, temp: &Path, final_path: &Path) -> Result<MediaOutcome, MediaError> {
        let codec = self.probe_codec(temp)?;
        debug!(codec = %codec, path = %temp.display(), "probed upload");

        if codec == "hevc" || codec == "h265" {
            self.reencode(temp, final_path)?;
            fs::remove_file(temp)?;
            info!(path = %final_path.display(), "re-encoded HEVC upload to H.264");
            return Ok(MediaOutcome {
                path: final_path.to_path_buf(),
                warning: Some(HEVC_WARNING.to_string()),
            });
        }

        fs::rename(temp, final_path)?;
        Ok(MediaOutcome::unchanged(final_path.to_path_buf()))
    }
}

/// `ffmpeg` single-frame thumbnail renderer
#[derive(Debug, Clone)]
pub struct FfmpegThumbnailer {
    ffmpeg: PathBuf,
    width: u32,
}

impl Default for FfmpegThumbnailer {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            width: THUMBNAIL_WIDTH,
        }
    }
}

impl FfmpegThumbnailer {
    #[must_use]
    pub fn new(ffmpeg: impl Into<PathBuf>, width: u32) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            width,
        }
    }

    fn grab_frame(&self, source: &Path, dest: &Path, offset: Option<&str>) -> Result<(), MediaError> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-y");
        if let Some(offset) = offset {
            cmd.args(["-ss", offset]);
        }
        let output = cmd
            .arg("-i")
            .arg(source)
            .args(["-vframes", "1", "-vf"])
            .arg(format!("scale={}:-1", self.width))
            .arg(dest)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| MediaError::Thumbnail(e.to_string()))?;
        if !output.status.success() {
            return Err(MediaError::Thumbnail(stderr_tail(&output)));
        }
        Ok(())
    }
}

impl ThumbnailRenderer for FfmpegThumbnailer {
    /// Grab a frame at five seconds, falling back to the first frame for
    /// shorter clips
    fn render(&self, source: &Path, dest_dir: &Path, key: &str) -> Result<PathBuf, MediaError> {
        fs::create_dir_all(dest_dir)?;
        let dest = dest_dir.join(format!("{key}.jpg"));
        if let Err(err) = self.grab_frame(source, &dest, Some(THUMBNAIL_OFFSET)) {
            debug!(error = %err, "thumbnail at default offset failed, using first frame");
            self.grab_frame(source, &dest, None)?;
        }
        Ok(dest)
    }

    fn render_at(
        &self,
        source: &Path,
        dest_dir: &Path,
        key: &str,
        offset: &str,
    ) -> Result<PathBuf, MediaError> {
        fs::create_dir_all(dest_dir)?;
        let dest = dest_dir.join(format!("{key}.jpg"));
        self.grab_frame(source, &dest, Some(offset))?;
        Ok(dest)
    }
}
