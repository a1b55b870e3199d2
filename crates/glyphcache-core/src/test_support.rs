//! Deterministic engine for unit tests

use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::{FontEngine, ScaledFace};
use crate::error::{EngineError, GlyphCacheError, Result};
use crate::face::FaceMetrics;
use crate::fixed::Fixed;
use crate::font_data::FontData;
use crate::glyph::{Bitmap, BitmapFormat, GlyphMetrics, RasterizedGlyph};
use crate::registry::FontRegistry;
use crate::style::StyleFlags;

/// Renders every glyph as a 4-pixel-wide Alpha8 bitmap of `bytes` bytes
///
/// Code point 0 has no outline. Sizes at or below zero are rejected.
pub struct MockEngine {
    bytes: usize,
    overrides: HashMap<u32, usize>,
}

impl MockEngine {
    pub fn new(bytes: usize) -> Self {
        Self {
            bytes,
            overrides: HashMap::new(),
        }
    }

    /// A different bitmap size for one code point
    pub fn with_size(mut self, codepoint: u32, bytes: usize) -> Self {
        self.overrides.insert(codepoint, bytes);
        self
    }
}

impl FontEngine for MockEngine {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn instantiate(
        &self,
        _font: &FontData,
        size: Fixed,
        _flags: StyleFlags,
    ) -> Result<Box<dyn ScaledFace>> {
        if !size.is_positive() {
            return Err(EngineError::UnsupportedSize {
                size: size.to_f32(),
            }
            .into());
        }
        Ok(Box::new(MockFace {
            bytes: self.bytes,
            overrides: self.overrides.clone(),
            size,
        }))
    }
}

struct MockFace {
    bytes: usize,
    overrides: HashMap<u32, usize>,
    size: Fixed,
}

impl ScaledFace for MockFace {
    fn metrics(&self) -> FaceMetrics {
        FaceMetrics {
            height: self.size,
            ascender: self.size,
            descender: Fixed::ZERO,
        }
    }

    fn rasterize(&mut self, font: &FontData, codepoint: u32) -> Result<RasterizedGlyph> {
        if codepoint == 0 {
            return Err(GlyphCacheError::glyph_not_found(codepoint, font.family()));
        }
        let bytes = self.overrides.get(&codepoint).copied().unwrap_or(self.bytes);
        let bitmap = Bitmap::try_new(BitmapFormat::Alpha8, 4, (bytes / 4) as u32)?;
        Ok(RasterizedGlyph {
            bitmap,
            metrics: GlyphMetrics {
                advance: Fixed::from_int(4),
                bearing_x: 0,
                bearing_y: 0,
            },
        })
    }
}

/// A registry holding one empty font per family name
pub fn registry_with(families: &[&str]) -> Arc<FontRegistry> {
    let registry = FontRegistry::new();
    for family in families {
        let font = FontData::new(Vec::new(), 0, *family, "Regular").into_shared();
        registry
            .register_font(family, font)
            .expect("fresh registry accepts fonts");
    }
    Arc::new(registry)
}
