//! Render command implementation
//!
//! Lays out one line of text left to right using cached glyphs and writes a
//! binary PGM (P5), black ink on white.

use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use glyphcache_core::{FaceHandle, Glyph, GlyphCacheError};

use crate::cli::RenderArgs;
use crate::commands::open_face;

pub fn run(args: &RenderArgs) -> Result<()> {
    let (manager, face) = open_face(&args.sources, &args.face)?;
    let glyphs = collect_glyphs(&face, &args.text)?;
    let canvas = compose(&face, &glyphs);

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let mut out = BufWriter::new(file);
    canvas.write_pgm(&mut out)?;
    out.flush()?;

    println!(
        "Wrote {}x{} image to {} ({} glyphs cached, {} bytes)",
        canvas.width,
        canvas.height,
        args.output.display(),
        manager.glyph_count(),
        manager.running_total()
    );
    Ok(())
}

/// Looks up every character, skipping ones the font cannot draw
fn collect_glyphs(face: &FaceHandle, text: &str) -> Result<Vec<Glyph>> {
    let mut glyphs = Vec::with_capacity(text.len());
    for ch in text.chars() {
        match face.glyph(ch as u32) {
            Ok(glyph) => glyphs.push(glyph),
            Err(GlyphCacheError::GlyphNotFound { codepoint, .. }) => {
                log::warn!("No glyph for U+{:04X}, skipping", codepoint)
            },
            Err(e) => return Err(e).with_context(|| format!("Failed to rasterize {:?}", ch)),
        }
    }
    Ok(glyphs)
}

/// 8-bit ink coverage, row-major without padding
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub ink: Vec<u8>,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ink: vec![0; width as usize * height as usize],
        }
    }

    /// Adds a glyph's coverage with its top-left corner at `(left, top)`
    fn blit(&mut self, glyph: &Glyph, left: i32, top: i32) {
        let bitmap = glyph.bitmap();
        for y in 0..bitmap.height() {
            let cy = top + y as i32;
            if cy < 0 || cy >= self.height as i32 {
                continue;
            }
            for x in 0..bitmap.width() {
                let cx = left + x as i32;
                if cx < 0 || cx >= self.width as i32 {
                    continue;
                }
                let idx = cy as usize * self.width as usize + cx as usize;
                self.ink[idx] = self.ink[idx].saturating_add(bitmap.coverage(x, y));
            }
        }
    }

    pub fn write_pgm(&self, out: &mut impl Write) -> std::io::Result<()> {
        write!(out, "P5\n{} {}\n255\n", self.width, self.height)?;
        let pixels: Vec<u8> = self.ink.iter().map(|&ink| 255 - ink).collect();
        out.write_all(&pixels)
    }
}

/// Places glyphs on a baseline one line-height tall
pub fn compose(face: &FaceHandle, glyphs: &[Glyph]) -> Canvas {
    let metrics = face.metrics();
    let ascent = metrics.ascender.ceil().max(0);
    let descent = (-metrics.descender.floor()).max(0);

    // Ink may poke out above the ascender or past the last advance
    let mut pen = 0i32;
    let (mut min_x, mut max_x) = (0i32, 0i32);
    let (mut top, mut bottom) = (-ascent, descent);
    for glyph in glyphs {
        let m = glyph.metrics();
        let bitmap = glyph.bitmap();
        let left = pen + m.bearing_x;
        min_x = min_x.min(left);
        max_x = max_x.max(left + bitmap.width() as i32);
        top = top.min(-m.bearing_y);
        bottom = bottom.max(bitmap.height() as i32 - m.bearing_y);
        pen += m.advance.round();
        max_x = max_x.max(pen);
    }

    let width = (max_x - min_x).max(1) as u32;
    let height = (bottom - top).max(1) as u32;
    let mut canvas = Canvas::new(width, height);

    let mut pen = -min_x;
    for glyph in glyphs {
        let m = glyph.metrics();
        canvas.blit(glyph, pen + m.bearing_x, -top - m.bearing_y);
        pen += m.advance.round();
    }
    canvas
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glyphcache_core::{CacheManager, FaceKey, Fixed, FontData, FontRegistry, StyleFlags};
    use glyphcache_render_zeno::ZenoEngine;

    use super::*;

    fn vazirmatn() -> (CacheManager, FaceHandle) {
        let registry = Arc::new(FontRegistry::new());
        let font = FontData::new(font_test_data::VAZIRMATN_VAR.to_vec(), 0, "Vazirmatn", "Regular");
        registry.register_font("Vazirmatn", font.into_shared()).unwrap();
        let manager = CacheManager::new(Arc::new(ZenoEngine::new()), registry);
        let key = FaceKey::unnamed(Fixed::from_int(24), StyleFlags::ANTIALIAS);
        let face = manager.acquire_face(&key).unwrap();
        (manager, face)
    }

    #[test]
    fn test_compose_lays_glyphs_side_by_side() {
        let (manager, face) = vazirmatn();
        let glyphs = collect_glyphs(&face, "ABA").unwrap();
        // 'B' is not in the font and is skipped
        assert_eq!(glyphs.len(), 2);
        assert!(glyphs[0].ptr_eq(&glyphs[1]));
        assert_eq!(manager.glyph_count(), 1);

        let advance = glyphs[0].metrics().advance.round();
        assert!(advance > 0);
        let canvas = compose(&face, &glyphs);
        assert!(canvas.width >= 2 * advance as u32);
        assert!(canvas.height >= glyphs[0].bitmap().height());
        assert_eq!(canvas.ink.len(), (canvas.width * canvas.height) as usize);

        // Both copies put ink on their own half of the line
        let half = canvas.width as usize / 2;
        let inked = |range: std::ops::Range<usize>| {
            canvas
                .ink
                .chunks(canvas.width as usize)
                .any(|row| row[range.clone()].iter().any(|&ink| ink > 0))
        };
        assert!(inked(0..half));
        assert!(inked(half..canvas.width as usize));
    }

    #[test]
    fn test_compose_nothing_is_one_line_tall() {
        let (_manager, face) = vazirmatn();
        let canvas = compose(&face, &[]);
        assert_eq!(canvas.width, 1);
        assert!(canvas.height > 1);
        assert!(canvas.ink.iter().all(|&ink| ink == 0));
    }

    #[test]
    fn test_pgm_header_and_inversion() {
        let canvas = Canvas {
            width: 2,
            height: 1,
            ink: vec![0, 255],
        };
        let mut out = Vec::new();
        canvas.write_pgm(&mut out).unwrap();
        assert_eq!(&out[..11], b"P5\n2 1\n255\n");
        assert_eq!(&out[11..], &[255, 0]);
    }
}
