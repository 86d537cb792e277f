//! Frame decorations drawn after compositing.

use image::{Rgb, RgbImage};

use coverframe_core::config::OverlayPosition;

use crate::colors::brighten;

/// Opacity of the metadata band, out of 255.
pub const BAND_ALPHA: u16 = 120;

/// Width of the ambient glow as a fraction of the shorter frame edge.
const GLOW_FRACTION: u32 = 12;

/// Tint the outer border towards the brightened dominant color.
///
/// Strength falls off linearly from `intensity` at the edge to zero at the
/// inner border of the glow.
pub fn ambient_glow(frame: &mut RgbImage, color: Rgb<u8>, intensity: f32) {
    let intensity = intensity.clamp(0.0, 1.0);
    let (width, height) = frame.dimensions();
    if intensity == 0.0 || width == 0 || height == 0 {
        return;
    }
    let border = (width.min(height) / GLOW_FRACTION).max(1);

    let glow = brighten(color, 1.5);
    for (x, y, pixel) in frame.enumerate_pixels_mut() {
        let edge = x.min(y).min(width - 1 - x).min(height - 1 - y);
        if edge >= border {
            continue;
        }
        let t = intensity * (1.0 - edge as f32 / border as f32);
        for (channel, target) in pixel.0.iter_mut().zip(glow.0) {
            let (a, b) = (f32::from(*channel), f32::from(target));
            *channel = (a + (b - a) * t).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Darken a full-width band of `height` rows for metadata text.
pub fn metadata_band(frame: &mut RgbImage, position: OverlayPosition, height: u32) {
    let band = height.min(frame.height());
    let rows = match position {
        OverlayPosition::Top => 0..band,
        OverlayPosition::Bottom => frame.height() - band..frame.height(),
    };

    for y in rows {
        for x in 0..frame.width() {
            for channel in frame.get_pixel_mut(x, y).0.iter_mut() {
                *channel = (u16::from(*channel) * (255 - BAND_ALPHA) / 255) as u8;
            }
        }
    }
}

/// Black frame with a centered two-bar pause glyph.
pub fn paused_frame(width: u32, height: u32) -> RgbImage {
    let mut frame = RgbImage::new(width, height);
    let bar_w = (width / 24).max(1);
    let bar_h = (height / 4).max(1);
    let gap = bar_w;
    let left = (width / 2).saturating_sub(bar_w + gap / 2);
    let top = (height.saturating_sub(bar_h)) / 2;
    let grey = Rgb([200, 200, 200]);

    for start in [left, left + bar_w + gap] {
        for y in top..(top + bar_h).min(height) {
            for x in start..(start + bar_w).min(width) {
                frame.put_pixel(x, y, grey);
            }
        }
    }
    frame
}
