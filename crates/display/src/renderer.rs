//! Fixed frame-rate render loop.
//!
//! Each frame: read the status cell; when paused or stopped, present the
//! matching placeholder and do nothing else. When running, pick up new
//! content from the slot, advance the transition, composite, decorate, and
//! present. The loop only touches memory and the sink.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use image::RgbImage;

use coverframe_core::config::{AmbientLightConfig, MetadataOverlayConfig, TransitionEffect};
use coverframe_core::{AppConfig, DisplayStatus};

use crate::compositor::compose;
use crate::error::DisplayError;
use crate::loader::{Artwork, StatusCell};
use crate::overlay::{ambient_glow, metadata_band, paused_frame};
use crate::sink::FrameSink;
use crate::slot::Slot;
use crate::transition::{Frame, Transitions};

/// Render settings taken from configuration.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub size: (u32, u32),
    pub fps: u32,
    pub effect: TransitionEffect,
    pub duration: Duration,
    pub ambient: AmbientLightConfig,
    pub overlay: MetadataOverlayConfig,
}

impl RenderSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            size: config.display_size(),
            fps: config.display.fps.max(1),
            effect: config.transitions.effect,
            duration: config.transition_duration(),
            ambient: config.effects.ambient_light.clone(),
            overlay: config.overlays.metadata.clone(),
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}

pub struct Renderer {
    settings: RenderSettings,
    transitions: Transitions<Arc<Artwork>>,
    slot: Arc<Slot<Arc<Artwork>>>,
    status: Arc<StatusCell>,
    sink: Box<dyn FrameSink>,
    paused: RgbImage,
    stopped: RgbImage,
    last_status: DisplayStatus,
}

impl Renderer {
    pub fn new(
        settings: RenderSettings, initial: Artwork, slot: Arc<Slot<Arc<Artwork>>>, status: Arc<StatusCell>,
        sink: Box<dyn FrameSink>,
    ) -> Self {
        let (width, height) = settings.size;
        Self {
            transitions: Transitions::new(Arc::new(initial), settings.duration),
            paused: paused_frame(width, height),
            stopped: RgbImage::new(width, height),
            settings,
            slot,
            status,
            sink,
            last_status: DisplayStatus::Running,
        }
    }

    /// Content currently on screen when idle.
    pub fn current(&self) -> &Artwork {
        self.transitions.current()
    }

    pub fn is_transitioning(&self) -> bool {
        !self.transitions.is_idle()
    }

    /// Build the frame for `now` without presenting it.
    pub fn frame(&mut self, now: Instant) -> RgbImage {
        let status = self.status.get();
        if status != self.last_status {
            tracing::debug!(%status, "renderer status");
            self.last_status = status;
        }
        match status {
            DisplayStatus::Paused => return self.paused.clone(),
            DisplayStatus::Stopped => return self.stopped.clone(),
            DisplayStatus::Running => {}
        }

        if let Some(next) = self.slot.take() {
            tracing::info!(title = %next.metadata.title, queued = self.is_transitioning(), "new artwork");
            self.transitions.offer(next, now);
        }

        let effect = self.settings.effect;
        let (mut frame, glow) = match self.transitions.tick(now) {
            Frame::Still(art) => (art.image.clone(), art.glow_color()),
            Frame::Blend { from, to, progress } => (compose(effect, &from.image, &to.image, progress), to.glow_color()),
        };

        if self.settings.ambient.enabled {
            ambient_glow(&mut frame, glow, self.settings.ambient.intensity);
        }
        if self.settings.overlay.enabled {
            metadata_band(&mut frame, self.settings.overlay.position, self.settings.overlay.height);
        }
        frame
    }

    /// Build and present one frame.
    pub fn render_frame(&mut self, now: Instant) -> Result<(), DisplayError> {
        let frame = self.frame(now);
        self.sink.present(&frame)
    }

    /// Render at the configured rate until `shutdown` is set. Returns the
    /// number of frames presented.
    pub fn run(mut self, shutdown: &AtomicBool) -> Result<u64, DisplayError> {
        let interval = self.settings.frame_interval();
        tracing::info!(sink = self.sink.name(), fps = self.settings.fps, size = ?self.settings.size, "render loop started");

        let mut frames = 0u64;
        let mut deadline = Instant::now();
        while !shutdown.load(Ordering::Acquire) {
            let now = Instant::now();
            self.render_frame(now)?;
            frames += 1;

            deadline += interval;
            let after = Instant::now();
            if deadline > after {
                std::thread::sleep(deadline - after);
            } else {
                // Running behind; drop the backlog instead of bursting.
                deadline = after;
            }
        }

        tracing::info!(frames, "render loop stopped");
        Ok(frames)
    }
}
