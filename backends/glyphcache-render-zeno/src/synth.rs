//! Coverage post-processing: synthetic emboldening and packing into
//! cache bitmaps

use glyphcache_core::{Bitmap, BitmapFormat, Result};

/// Coverage at or above this becomes an "on" pixel in mono bitmaps
pub const MONO_THRESHOLD: u8 = 128;

/// Emboldening radius in pixels for a given pixel size
///
/// Roughly 1/24 em, at least one pixel.
pub fn embolden_radius(px_size: f32) -> u32 {
    ((px_size / 24.0).round() as u32).max(1)
}

/// Dilates a `width` x `height` coverage mask by `radius` pixels to the
/// right and downward
///
/// The mask must already have `radius` spare columns and rows on those
/// sides; the caller pads the canvas accordingly.
pub fn embolden(mask: &mut [u8], width: usize, height: usize, radius: usize) {
    if radius == 0 || width == 0 || height == 0 {
        return;
    }
    // Horizontal pass, right to left so each pixel reads undilated sources
    for row in mask.chunks_exact_mut(width).take(height) {
        for x in (0..width).rev() {
            let from = x.saturating_sub(radius);
            let max = row[from..=x].iter().copied().max().unwrap_or(0);
            row[x] = max;
        }
    }
    // Vertical pass, bottom to top for the same reason
    for y in (0..height).rev() {
        for x in 0..width {
            let mut max = mask[y * width + x];
            for dy in 1..=radius.min(y) {
                max = max.max(mask[(y - dy) * width + x]);
            }
            mask[y * width + x] = max;
        }
    }
}

/// Copies a dense coverage mask into a row-aligned cache bitmap
pub fn pack(mask: &[u8], width: u32, height: u32, antialias: bool) -> Result<Bitmap> {
    let format = if antialias {
        BitmapFormat::Alpha8
    } else {
        BitmapFormat::Mono1
    };
    let mut bitmap = Bitmap::try_new(format, width, height)?;
    let w = width as usize;
    for (y, src) in mask.chunks_exact(w.max(1)).take(height as usize).enumerate() {
        match format {
            BitmapFormat::Alpha8 => bitmap.row_mut(y as u32)[..w].copy_from_slice(src),
            BitmapFormat::Mono1 => {
                for (x, &coverage) in src.iter().enumerate() {
                    if coverage >= MONO_THRESHOLD {
                        bitmap.set_mono(x as u32, y as u32, true);
                    }
                }
            },
        }
    }
    Ok(bitmap)
}
