//! Blending two equally sized frames at an eased progress.
//!
//! Every function expects `from` and `to` to share dimensions (the loader
//! scales all content to the display size). On a mismatch the target frame
//! is returned as-is.

use image::{Rgb, RgbImage};

use coverframe_core::config::TransitionEffect;

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round().clamp(0.0, 255.0) as u8
}

fn mix(a: &Rgb<u8>, b: &Rgb<u8>, t: f32) -> Rgb<u8> {
    Rgb([lerp(a[0], b[0], t), lerp(a[1], b[1], t), lerp(a[2], b[2], t)])
}

/// Cross-fade: `from` fades out while `to` fades in.
pub fn fade(from: &RgbImage, to: &RgbImage, progress: f64) -> RgbImage {
    if from.dimensions() != to.dimensions() {
        return to.clone();
    }
    let t = progress.clamp(0.0, 1.0) as f32;
    RgbImage::from_fn(to.width(), to.height(), |x, y| mix(from.get_pixel(x, y), to.get_pixel(x, y), t))
}

/// `to` slides in from the right edge, pushing `from` out to the left.
pub fn slide(from: &RgbImage, to: &RgbImage, progress: f64) -> RgbImage {
    if from.dimensions() != to.dimensions() {
        return to.clone();
    }
    let width = to.width();
    let offset = ((f64::from(width) * progress.clamp(0.0, 1.0)).round() as u32).min(width);
    let split = width - offset;

    RgbImage::from_fn(width, to.height(), |x, y| {
        if x < split { *from.get_pixel(x + offset, y) } else { *to.get_pixel(x - split, y) }
    })
}

/// How far past full size the outgoing frame grows by the end of a zoom.
const ZOOM_OUT_GROWTH: f64 = 0.2;

/// Size the incoming frame starts at, as a fraction of full size.
const ZOOM_IN_START: f64 = 0.8;

/// Nearest-neighbour sample of `img` scaled by `scale` about its center.
/// `None` when `(x, y)` falls outside the scaled image.
fn sample_scaled(img: &RgbImage, x: u32, y: u32, scale: f64) -> Option<&Rgb<u8>> {
    let (width, height) = img.dimensions();
    let (cx, cy) = (f64::from(width) / 2.0, f64::from(height) / 2.0);
    let sx = ((f64::from(x) + 0.5 - cx) / scale + cx).floor();
    let sy = ((f64::from(y) + 0.5 - cy) / scale + cy).floor();
    if sx < 0.0 || sy < 0.0 || sx >= f64::from(width) || sy >= f64::from(height) {
        return None;
    }
    Some(img.get_pixel(sx as u32, sy as u32))
}

/// `from` grows and fades out while `to` scales up to full size and fades in.
///
/// Both layers are blended over black; where the shrunken `to` does not
/// reach, only the fading `from` shows.
pub fn zoom(from: &RgbImage, to: &RgbImage, progress: f64) -> RgbImage {
    if from.dimensions() != to.dimensions() {
        return to.clone();
    }
    let p = progress.clamp(0.0, 1.0);
    let out_scale = 1.0 + ZOOM_OUT_GROWTH * p;
    let in_scale = 1.0 - (1.0 - ZOOM_IN_START) * (1.0 - p);
    let black = Rgb([0, 0, 0]);

    RgbImage::from_fn(to.width(), to.height(), |x, y| {
        let old = sample_scaled(from, x, y, out_scale).unwrap_or(&black);
        let new = sample_scaled(to, x, y, in_scale).unwrap_or(&black);
        let mut px = [0u8; 3];
        for ((out, a), b) in px.iter_mut().zip(old.0).zip(new.0) {
            let v = f64::from(a) * (1.0 - p) + f64::from(b) * p;
            *out = v.round().clamp(0.0, 255.0) as u8;
        }
        Rgb(px)
    })
}

/// Dispatch on the configured effect.
pub fn compose(effect: TransitionEffect, from: &RgbImage, to: &RgbImage, progress: f64) -> RgbImage {
    match effect {
        TransitionEffect::Fade => fade(from, to, progress),
        TransitionEffect::Slide => slide(from, to, progress),
        TransitionEffect::Zoom => zoom(from, to, progress),
    }
}
