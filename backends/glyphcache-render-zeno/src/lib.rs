//! Zeno Engine - pure Rust rasterizing for the glyph cache
//!
//! Outlines come from skrifa, coverage from zeno, bounds from kurbo. No
//! system libraries are involved, so the same font renders the same bitmap
//! on every platform.
//!
//! ## Per Glyph
//!
//! 1. Map the code point through the font's `cmap`
//! 2. Draw the unhinted outline at the face's pixel size into a pen that
//!    builds an SVG path (for zeno) and a kurbo path (for exact bounds),
//!    shearing it when synthetic oblique is on
//! 3. Rasterize into a dense coverage mask, dilate it for synthetic bold
//! 4. Pack into a row-aligned Alpha8 bitmap, or threshold into Mono1 when
//!    antialiasing is off
//!
//! Synthetic styles only kick in when the key asks for bold or italic and
//! the font's own style name does not already provide it.

mod pen;
mod synth;

use read_fonts::types::Tag;
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::DrawSettings;
use skrifa::{FontRef, GlyphId, MetadataProvider};
use zeno::Mask;

use glyphcache_core::{
    Bitmap, BitmapFormat, EngineError, FaceMetrics, Fixed, FontData, FontEngine,
    GlyphCacheError, GlyphMetrics, RasterizedGlyph, Result, ScaledFace, StyleFlags,
};

pub use pen::{ZenoPen, OBLIQUE_SHEAR};
pub use synth::{embolden_radius, MONO_THRESHOLD};

/// Largest pixel size a face may be instantiated at
pub const MAX_PIXEL_SIZE: f32 = 4096.0;

/// Scalable-outline font engine backed by skrifa and zeno
pub struct ZenoEngine {
    /// Largest glyph bitmap edge in pixels
    max_bitmap_size: u32,
}

impl ZenoEngine {
    pub fn new() -> Self {
        Self {
            max_bitmap_size: 8192,
        }
    }
}

impl Default for ZenoEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn parse(font: &FontData) -> Result<FontRef<'_>> {
    FontRef::from_index(font.data(), font.face_index()).map_err(|e| {
        EngineError::InvalidFont(format!("{}: {}", font.full_name(), e)).into()
    })
}

fn has_outlines(font: &FontRef<'_>) -> bool {
    [b"glyf", b"CFF ", b"CFF2"]
        .iter()
        .any(|tag| font.table_data(Tag::new(tag)).is_some())
}

impl FontEngine for ZenoEngine {
    fn name(&self) -> &'static str {
        "zeno"
    }

    fn instantiate(
        &self,
        font: &FontData,
        size: Fixed,
        flags: StyleFlags,
    ) -> Result<Box<dyn ScaledFace>> {
        let px = size.to_f32();
        if !size.is_positive() || px > MAX_PIXEL_SIZE {
            return Err(EngineError::UnsupportedSize { size: px }.into());
        }

        let font_ref = parse(font)?;
        if !has_outlines(&font_ref) {
            // Bitmap-only fonts have no scalable outlines to draw
            return Err(EngineError::UnsupportedSize { size: px }.into());
        }

        let metrics = font_ref.metrics(Size::new(px), LocationRef::default());
        let face_metrics = FaceMetrics {
            height: Fixed::from_f32(metrics.ascent - metrics.descent + metrics.leading),
            ascender: Fixed::from_f32(metrics.ascent),
            descender: Fixed::from_f32(metrics.descent),
        };

        let embolden = flags.wants_synthetic_bold()
            || (flags.contains(StyleFlags::BOLD) && !font.is_bold());
        let oblique = flags.wants_synthetic_italic()
            || (flags.contains(StyleFlags::ITALIC) && !font.is_italic());
        log::debug!(
            "Zeno face for {} at {}px (embolden: {}, oblique: {}, antialias: {})",
            font.full_name(),
            px,
            embolden,
            oblique,
            flags.antialias()
        );

        Ok(Box::new(ZenoFace {
            px,
            metrics: face_metrics,
            embolden: embolden.then(|| embolden_radius(px)),
            shear: if oblique { OBLIQUE_SHEAR } else { 0.0 },
            antialias: flags.antialias(),
            max_bitmap_size: self.max_bitmap_size,
        }))
    }
}

/// One font at one pixel size with its synthetic style settings
pub struct ZenoFace {
    px: f32,
    metrics: FaceMetrics,
    embolden: Option<u32>,
    shear: f32,
    antialias: bool,
    max_bitmap_size: u32,
}

impl ZenoFace {
    fn format(&self) -> BitmapFormat {
        if self.antialias {
            BitmapFormat::Alpha8
        } else {
            BitmapFormat::Mono1
        }
    }
}

impl ScaledFace for ZenoFace {
    fn metrics(&self) -> FaceMetrics {
        self.metrics
    }

    fn rasterize(&mut self, font: &FontData, codepoint: u32) -> Result<RasterizedGlyph> {
        let font_ref = parse(font)?;
        let gid: GlyphId = font_ref
            .charmap()
            .map(codepoint)
            .ok_or_else(|| GlyphCacheError::glyph_not_found(codepoint, font.full_name()))?;
        let outline = font_ref
            .outline_glyphs()
            .get(gid)
            .ok_or_else(|| GlyphCacheError::glyph_not_found(codepoint, font.full_name()))?;

        let size = Size::new(self.px);
        let mut pen = ZenoPen::new(self.shear);
        outline
            .draw(DrawSettings::unhinted(size, LocationRef::default()), &mut pen)
            .map_err(|_| EngineError::OutlineExtractionFailed(codepoint))?;

        let radius = self.embolden.unwrap_or(0);
        let advance = font_ref
            .glyph_metrics(size, LocationRef::default())
            .advance_width(gid)
            .unwrap_or(0.0)
            + radius as f32;

        let (path_data, bounds) = pen.finish();
        let Some((x0, y0, x1, y1)) = bounds else {
            // Blank glyphs such as spaces still advance the pen
            return Ok(RasterizedGlyph {
                bitmap: Bitmap::empty(self.format()),
                metrics: GlyphMetrics {
                    advance: Fixed::from_f32(advance),
                    bearing_x: 0,
                    bearing_y: 0,
                },
            });
        };

        let left = x0.floor() as i32;
        let top = y0.floor() as i32;
        let width = (x1.ceil() as i32 - left).max(1) as u32 + radius;
        let height = (y1.ceil() as i32 - top).max(1) as u32 + radius;
        if width > self.max_bitmap_size || height > self.max_bitmap_size {
            return Err(EngineError::InvalidDimensions { width, height }.into());
        }

        let len = width as usize * height as usize;
        let mut mask = Vec::new();
        mask.try_reserve_exact(len)
            .map_err(|_| GlyphCacheError::OutOfMemory("coverage mask"))?;
        mask.resize(len, 0u8);

        let _placement = Mask::new(path_data.as_str())
            .size(width, height)
            .offset((-left, -top))
            .render_into(&mut mask, None);

        if radius > 0 {
            synth::embolden(&mut mask, width as usize, height as usize, radius as usize);
        }
        let bitmap = synth::pack(&mask, width, height, self.antialias)?;

        log::trace!(
            "Rasterized U+{:04X} (gid {}) at {}px into {}x{}",
            codepoint,
            gid.to_u32(),
            self.px,
            width,
            height
        );
        Ok(RasterizedGlyph {
            bitmap,
            metrics: GlyphMetrics {
                advance: Fixed::from_f32(advance),
                bearing_x: left,
                // y is flipped: the bitmap top sits -top pixels above the baseline
                bearing_y: -top,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn junk_font() -> FontData {
        FontData::new(vec![0u8; 128], 0, "Junk", "Regular")
    }

    #[test]
    fn test_engine_name() {
        assert_eq!(ZenoEngine::new().name(), "zeno");
        assert_eq!(ZenoEngine::default().name(), "zeno");
    }

    #[test]
    fn test_rejects_non_positive_size() {
        let result = ZenoEngine::new().instantiate(&junk_font(), Fixed::ZERO, StyleFlags::empty());
        assert!(matches!(
            result,
            Err(GlyphCacheError::Engine(EngineError::UnsupportedSize { .. }))
        ));
    }

    #[test]
    fn test_rejects_huge_size() {
        let result = ZenoEngine::new().instantiate(
            &junk_font(),
            Fixed::from_int(100_000),
            StyleFlags::empty(),
        );
        assert!(matches!(
            result,
            Err(GlyphCacheError::Engine(EngineError::UnsupportedSize { .. }))
        ));
    }

    #[test]
    fn test_invalid_font_data() {
        let result =
            ZenoEngine::new().instantiate(&junk_font(), Fixed::from_int(16), StyleFlags::ANTIALIAS);
        assert!(matches!(
            result,
            Err(GlyphCacheError::Engine(EngineError::InvalidFont(_)))
        ));
    }

    #[test]
    fn test_face_format_follows_antialias() {
        let face = ZenoFace {
            px: 16.0,
            metrics: FaceMetrics::default(),
            embolden: None,
            shear: 0.0,
            antialias: false,
            max_bitmap_size: 64,
        };
        assert_eq!(face.format(), BitmapFormat::Mono1);
    }
}
