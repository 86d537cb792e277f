//! Change-detecting loader.
//!
//! Polls the published image's modification time on a fixed interval. When
//! it advances, the image is decoded and scaled to the display size off the
//! async workers, paired with the published metadata, and dropped into the
//! latest-wins slot for the render loop. The display status file is read on
//! the same tick and mirrored into an atomic the renderer checks per frame.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::{Duration, SystemTime};

use image::imageops::FilterType;
use image::{ImageReader, Rgb, RgbImage};
use tokio::time::MissedTickBehavior;

use coverframe_core::{AppConfig, DisplayStatus, Publisher, TrackMetadata};

use crate::colors::dominant_colors;
use crate::error::DisplayError;
use crate::slot::Slot;

/// How many dominant colors to keep per artwork.
const DOMINANT_COLORS: usize = 5;

/// Decoded content ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Artwork {
    pub image: RgbImage,
    pub metadata: TrackMetadata,
    /// Most frequent colors first; empty when not computed.
    pub colors: Vec<Rgb<u8>>,
}

impl Artwork {
    /// The color the ambient glow uses.
    pub fn glow_color(&self) -> Rgb<u8> {
        self.colors.first().copied().unwrap_or(Rgb([0, 0, 0]))
    }
}

/// Shared display status, stored as [`DisplayStatus::as_u8`].
#[derive(Debug, Default)]
pub struct StatusCell(AtomicU8);

impl StatusCell {
    pub fn new(status: DisplayStatus) -> Self {
        Self(AtomicU8::new(status.as_u8()))
    }

    pub fn get(&self) -> DisplayStatus {
        DisplayStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, status: DisplayStatus) {
        self.0.store(status.as_u8(), Ordering::Release);
    }
}

/// Decode and scale an image file to exactly `width`x`height`.
///
/// The format is sniffed from the content, not the file extension.
pub fn load_scaled(path: &Path, width: u32, height: u32) -> Result<RgbImage, DisplayError> {
    let decoded = ImageReader::open(path)?.with_guessed_format()?.decode()?.to_rgb8();
    if decoded.dimensions() == (width, height) {
        return Ok(decoded);
    }
    Ok(image::imageops::resize(&decoded, width, height, FilterType::Triangle))
}

/// Published metadata, or the "Ready" placeholder when missing or unreadable.
pub fn read_metadata_or_placeholder(publisher: &Publisher) -> TrackMetadata {
    match publisher.read_metadata() {
        Ok(Some(metadata)) => metadata,
        Ok(None) => TrackMetadata::placeholder(),
        Err(e) => {
            tracing::warn!(error = %e, "unreadable metadata, showing placeholder");
            TrackMetadata::placeholder()
        }
    }
}

/// Vertical grey gradient from 20 at the top to 60 at the bottom.
pub fn gradient(width: u32, height: u32) -> RgbImage {
    let h = height.max(1);
    RgbImage::from_fn(width, height, |_, y| {
        let v = (20 + y * 40 / h) as u8;
        Rgb([v, v, v])
    })
}

/// Content shown before anything is published: the configured fallback
/// image if it decodes, else a gradient.
pub fn fallback_artwork(path: &Path, width: u32, height: u32) -> Artwork {
    let image = match load_scaled(path, width, height) {
        Ok(image) => image,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "no fallback image, using gradient");
            gradient(width, height)
        }
    };
    Artwork { image, metadata: TrackMetadata::placeholder(), colors: Vec::new() }
}

/// Polls published files and feeds the render loop.
pub struct Loader {
    publisher: Publisher,
    size: (u32, u32),
    interval: Duration,
    with_colors: bool,
    slot: Arc<Slot<Arc<Artwork>>>,
    status: Arc<StatusCell>,
    last_mtime: Option<SystemTime>,
}

impl Loader {
    pub fn new(
        publisher: Publisher, size: (u32, u32), interval: Duration, with_colors: bool, slot: Arc<Slot<Arc<Artwork>>>,
        status: Arc<StatusCell>,
    ) -> Self {
        Self { publisher, size, interval, with_colors, slot, status, last_mtime: None }
    }

    pub fn from_config(config: &AppConfig, slot: Arc<Slot<Arc<Artwork>>>, status: Arc<StatusCell>) -> Self {
        Self::new(
            Publisher::from_paths(&config.paths),
            config.display_size(),
            config.file_check_interval(),
            config.effects.ambient_light.enabled,
            slot,
            status,
        )
    }

    /// One poll: refresh the status and load new content if the image
    /// changed. Returns whether new content was handed to the slot.
    pub async fn poll_once(&mut self) -> Result<bool, DisplayError> {
        let status_path = self.publisher.status_path().to_path_buf();
        let status = tokio::task::spawn_blocking(move || DisplayStatus::read_from(&status_path)).await?;
        if self.status.get() != status {
            tracing::info!(%status, "display status changed");
            self.status.set(status);
        }

        let mtime = match tokio::fs::metadata(self.publisher.image_path()).await {
            Ok(meta) => meta.modified()?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        if self.last_mtime.is_some_and(|last| mtime <= last) {
            return Ok(false);
        }
        // Recorded before decoding so a broken file is not retried every tick.
        self.last_mtime = Some(mtime);

        let publisher = self.publisher.clone();
        let (width, height) = self.size;
        let with_colors = self.with_colors;
        let artwork = tokio::task::spawn_blocking(move || -> Result<Artwork, DisplayError> {
            let image = load_scaled(publisher.image_path(), width, height)?;
            let metadata = read_metadata_or_placeholder(&publisher);
            let colors = if with_colors { dominant_colors(&image, DOMINANT_COLORS) } else { Vec::new() };
            Ok(Artwork { image, metadata, colors })
        })
        .await??;

        tracing::info!(title = %artwork.metadata.title, artist = %artwork.metadata.artist, "loaded new artwork");
        if self.slot.put(Arc::new(artwork)) {
            tracing::debug!("replaced artwork the renderer had not picked up yet");
        }
        Ok(true)
    }

    /// Poll until `shutdown` is set.
    pub async fn run(mut self, shutdown: Arc<AtomicBool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let image_path: PathBuf = self.publisher.image_path().to_path_buf();
        tracing::info!(path = %image_path.display(), interval_ms = self.interval.as_millis() as u64, "loader started");

        while !shutdown.load(Ordering::Acquire) {
            ticker.tick().await;
            if let Err(e) = self.poll_once().await {
                tracing::warn!(path = %image_path.display(), error = %e, "failed to load published artwork");
            }
        }
    }
}
