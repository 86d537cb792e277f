//! Frame sinks: where rendered frames end up.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use image::RgbImage;

use coverframe_core::config::{OutputKind, Platform};

use crate::error::DisplayError;

/// Destination for finished frames.
pub trait FrameSink: Send {
    fn name(&self) -> &'static str;

    fn present(&mut self, frame: &RgbImage) -> Result<(), DisplayError>;
}

/// Convert an RGB frame to 32-bit BGRA, reusing `out`.
pub fn to_bgra(frame: &RgbImage, out: &mut Vec<u8>) {
    out.clear();
    out.reserve(frame.width() as usize * frame.height() as usize * 4);
    for pixel in frame.pixels() {
        let [r, g, b] = pixel.0;
        out.extend_from_slice(&[b, g, r, 0xff]);
    }
}

/// Linux framebuffer device (e.g. `/dev/fb0`) in 32-bit BGRA.
#[derive(Debug)]
pub struct FramebufferSink {
    path: PathBuf,
    device: File,
    buffer: Vec<u8>,
}

impl FramebufferSink {
    pub fn open(path: &Path) -> Result<Self, DisplayError> {
        let device = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| DisplayError::Sink(format!("{}: {e}", path.display())))?;
        Ok(Self { path: path.to_path_buf(), device, buffer: Vec::new() })
    }
}

impl FrameSink for FramebufferSink {
    fn name(&self) -> &'static str {
        "framebuffer"
    }

    fn present(&mut self, frame: &RgbImage) -> Result<(), DisplayError> {
        to_bgra(frame, &mut self.buffer);
        self.device
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.device.write_all(&self.buffer))
            .map_err(|e| DisplayError::Sink(format!("{}: {e}", self.path.display())))
    }
}

/// Discards frames, keeping a count. Used without a display attached.
#[derive(Debug, Default)]
pub struct HeadlessSink {
    frames: u64,
}

impl HeadlessSink {
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl FrameSink for HeadlessSink {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn present(&mut self, _frame: &RgbImage) -> Result<(), DisplayError> {
        self.frames += 1;
        if self.frames % 600 == 0 {
            tracing::debug!(frames = self.frames, "headless sink");
        }
        Ok(())
    }
}

/// Pick the sink for the configured output.
///
/// `Auto` uses the framebuffer on platforms that have one when the device
/// exists and falls back to headless otherwise; an explicit `Framebuffer`
/// fails if the device cannot be opened.
pub fn open_sink(output: OutputKind, platform: Platform, device: &Path) -> Result<Box<dyn FrameSink>, DisplayError> {
    match output {
        OutputKind::Headless => Ok(Box::new(HeadlessSink::default())),
        OutputKind::Framebuffer => Ok(Box::new(FramebufferSink::open(device)?)),
        OutputKind::Auto if platform.has_framebuffer() && device.exists() => match FramebufferSink::open(device) {
            Ok(sink) => Ok(Box::new(sink)),
            Err(e) => {
                tracing::warn!(error = %e, "framebuffer unavailable, rendering headless");
                Ok(Box::new(HeadlessSink::default()))
            }
        },
        OutputKind::Auto => Ok(Box::new(HeadlessSink::default())),
    }
}
