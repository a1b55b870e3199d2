//! The contracts a font engine fulfils for the cache
//!
//! The cache never parses fonts itself. It asks a [`FontEngine`] for a
//! [`ScaledFace`] when a face is first requested, then asks that scaled
//! face to rasterize code points on cache misses.
//!
//! ```ignore
//! struct MyEngine;
//!
//! impl FontEngine for MyEngine {
//!     fn name(&self) -> &'static str {
//!         "my-engine"
//!     }
//!
//!     fn instantiate(
//!         &self,
//!         font: &FontData,
//!         size: Fixed,
//!         flags: StyleFlags,
//!     ) -> Result<Box<dyn ScaledFace>> {
//!         // Parse `font.data()`, set the character size, build metrics
//!         Ok(Box::new(MyFace::new(font, size, flags)?))
//!     }
//! }
//! ```

use crate::error::Result;
use crate::face::FaceMetrics;
use crate::fixed::Fixed;
use crate::font_data::FontData;
use crate::glyph::RasterizedGlyph;
use crate::style::StyleFlags;

/// Creates sized faces from font bytes
pub trait FontEngine: Send + Sync {
    /// Used in logs and error messages
    fn name(&self) -> &'static str;

    /// Sets up a face at `size` pixels per em with the given style flags
    ///
    /// Return `EngineError::UnsupportedSize` when the font cannot be used at
    /// that size (for example a bitmap-only font without that strike).
    fn instantiate(
        &self,
        font: &FontData,
        size: Fixed,
        flags: StyleFlags,
    ) -> Result<Box<dyn ScaledFace>>;
}

/// One font at one size and style, ready to rasterize
///
/// The face receives the same `FontData` it was created from on every call,
/// so implementations need not keep borrowed views into the bytes.
pub trait ScaledFace: Send {
    /// Height, ascender and descender at the active size
    fn metrics(&self) -> FaceMetrics;

    /// Renders one code point
    ///
    /// Return `GlyphCacheError::GlyphNotFound` when the font has no outline
    /// for it and `OutOfMemory` when the bitmap cannot be allocated (see
    /// [`Bitmap::try_new`](crate::Bitmap::try_new)).
    fn rasterize(&mut self, font: &FontData, codepoint: u32) -> Result<RasterizedGlyph>;
}
