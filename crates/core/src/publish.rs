//! Atomic hand-off of the "current" artwork to the renderer.
//!
//! Every write goes to a fresh temporary file in the target's directory, is
//! flushed and fsynced, then renamed over the target. The rename is the only
//! synchronization point with the reader: it observes either the old file or
//! the new one, never a partial write. Writers sharing a [`Publisher`] (and
//! its clones) are serialized so an image and its metadata land as a pair.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::Error;
use crate::config::PathsConfig;
use crate::metadata::TrackMetadata;
use crate::status::DisplayStatus;

/// Write `bytes` to `target` with write-temp-then-rename semantics.
pub fn atomic_write(target: &Path, bytes: &[u8]) -> Result<(), Error> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".coverframe-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(target)?;

    Ok(())
}

/// Publishes the current image, metadata, and status files.
#[derive(Debug, Clone)]
pub struct Publisher {
    image_path: PathBuf,
    metadata_path: PathBuf,
    status_path: PathBuf,
    content_lock: Arc<Mutex<()>>,
}

impl Publisher {
    pub fn new(image_path: impl Into<PathBuf>, metadata_path: impl Into<PathBuf>, status_path: impl Into<PathBuf>) -> Self {
        Self {
            image_path: image_path.into(),
            metadata_path: metadata_path.into(),
            status_path: status_path.into(),
            content_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn from_paths(paths: &PathsConfig) -> Self {
        Self::new(&paths.image, &paths.metadata, &paths.status)
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    pub fn status_path(&self) -> &Path {
        &self.status_path
    }

    /// Replace the current image with already-encoded JPEG bytes.
    pub fn publish_image(&self, bytes: &[u8]) -> Result<(), Error> {
        let _guard = self.content_lock.lock();
        self.write_image(bytes)
    }

    /// Replace the current metadata record.
    pub fn publish_metadata(&self, metadata: &TrackMetadata) -> Result<(), Error> {
        let _guard = self.content_lock.lock();
        self.write_metadata(metadata)
    }

    /// Publish an image and its metadata as one update.
    ///
    /// Metadata is renamed into place first: the renderer keys on the image
    /// mtime, so by the time it notices the new image the matching metadata
    /// is already visible.
    pub fn publish_content(&self, image: &[u8], metadata: &TrackMetadata) -> Result<(), Error> {
        let _guard = self.content_lock.lock();
        self.write_metadata(metadata)?;
        self.write_image(image)
    }

    fn write_image(&self, bytes: &[u8]) -> Result<(), Error> {
        atomic_write(&self.image_path, bytes)?;
        tracing::info!(path = %self.image_path.display(), bytes = bytes.len(), "published image");
        Ok(())
    }

    fn write_metadata(&self, metadata: &TrackMetadata) -> Result<(), Error> {
        let json = serde_json::to_vec_pretty(metadata).map_err(|e| Error::Decode(e.to_string()))?;
        atomic_write(&self.metadata_path, &json)?;
        tracing::debug!(path = %self.metadata_path.display(), title = %metadata.title, "published metadata");
        Ok(())
    }

    pub fn publish_status(&self, status: DisplayStatus) -> Result<(), Error> {
        atomic_write(&self.status_path, status.as_str().as_bytes())?;
        tracing::info!(status = %status, "published display status");
        Ok(())
    }

    /// Read back the published metadata, `None` when nothing was published yet.
    pub fn read_metadata(&self) -> Result<Option<TrackMetadata>, Error> {
        match std::fs::read(&self.metadata_path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| Error::Decode(format!("current metadata: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn read_status(&self) -> DisplayStatus {
        DisplayStatus::read_from(&self.status_path)
    }
}
