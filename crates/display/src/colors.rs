//! Dominant color extraction for the ambient glow.

use std::collections::HashMap;

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

/// Longest edge of the thumbnail colors are counted on.
const THUMBNAIL_EDGE: u32 = 150;

/// Channel quantization step.
const BUCKET: u8 = 32;

/// Scale `(width, height)` so the longer edge is at most `max_edge`.
fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (1, 1);
    }
    if width.max(height) <= max_edge {
        return (width, height);
    }
    if width >= height {
        let h = (u64::from(height) * u64::from(max_edge) / u64::from(width)).max(1);
        (max_edge, h as u32)
    } else {
        let w = (u64::from(width) * u64::from(max_edge) / u64::from(height)).max(1);
        (w as u32, max_edge)
    }
}

fn quantize(pixel: &Rgb<u8>) -> Rgb<u8> {
    Rgb(pixel.0.map(|c| c / BUCKET * BUCKET))
}

/// The `count` most frequent colors after quantizing each channel down to a
/// multiple of 32. Ties are broken by color value so results are stable.
///
/// An empty image yields a single black entry.
pub fn dominant_colors(image: &RgbImage, count: usize) -> Vec<Rgb<u8>> {
    if image.width() == 0 || image.height() == 0 || count == 0 {
        return vec![Rgb([0, 0, 0])];
    }

    let (w, h) = fit_within(image.width(), image.height(), THUMBNAIL_EDGE);
    let thumb = if (w, h) == image.dimensions() { image.clone() } else { imageops::resize(image, w, h, FilterType::Triangle) };

    let mut counts: HashMap<[u8; 3], usize> = HashMap::new();
    for pixel in thumb.pixels() {
        *counts.entry(quantize(pixel).0).or_default() += 1;
    }

    let mut ranked: Vec<([u8; 3], usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().take(count).map(|(rgb, _)| Rgb(rgb)).collect()
}

/// Multiply each channel by `factor`, saturating at 255.
pub fn brighten(color: Rgb<u8>, factor: f32) -> Rgb<u8> {
    Rgb(color.0.map(|c| (f32::from(c) * factor).round().clamp(0.0, 255.0) as u8))
}
