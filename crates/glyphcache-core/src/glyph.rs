//! Rasterized glyphs and their bitmaps

use std::sync::Arc;

use crate::error::{GlyphCacheError, Result};
use crate::fixed::Fixed;

/// Pixel layout of a glyph bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitmapFormat {
    /// 8-bit coverage per pixel
    Alpha8,
    /// 1 bit per pixel, most significant bit first
    Mono1,
}

impl BitmapFormat {
    /// Row length in bytes, padded so every row starts 4-byte aligned
    pub fn stride_for(self, width: u32) -> usize {
        match self {
            BitmapFormat::Alpha8 => (width as usize + 3) & !3,
            BitmapFormat::Mono1 => (width as usize).div_ceil(32) * 4,
        }
    }
}

/// Glyph pixels plus their layout
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    format: BitmapFormat,
    width: u32,
    height: u32,
    stride: usize,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Allocates a zeroed bitmap, reporting allocation failure instead of aborting
    pub fn try_new(format: BitmapFormat, width: u32, height: u32) -> Result<Self> {
        let stride = format.stride_for(width);
        let size = stride
            .checked_mul(height as usize)
            .ok_or(GlyphCacheError::OutOfMemory("glyph bitmap"))?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(size)
            .map_err(|_| GlyphCacheError::OutOfMemory("glyph bitmap"))?;
        pixels.resize(size, 0);
        Ok(Self {
            format,
            width,
            height,
            stride,
            pixels,
        })
    }

    /// A zero-sized bitmap, used for blank glyphs such as spaces
    pub fn empty(format: BitmapFormat) -> Self {
        Self {
            format,
            width: 0,
            height: 0,
            stride: 0,
            pixels: Vec::new(),
        }
    }

    pub fn format(&self) -> BitmapFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Bytes charged against the cache budget
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.pixels[start..start + self.stride]
    }

    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        &mut self.pixels[start..start + self.stride]
    }

    /// Coverage at (x, y) as 0..=255, mono pixels map to 0 or 255
    pub fn coverage(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        let row = self.row(y);
        match self.format {
            BitmapFormat::Alpha8 => row[x as usize],
            BitmapFormat::Mono1 => {
                let byte = row[(x / 8) as usize];
                if byte & (0x80 >> (x % 8)) != 0 {
                    255
                } else {
                    0
                }
            },
        }
    }

    /// Sets one mono pixel; ignored for alpha bitmaps
    pub fn set_mono(&mut self, x: u32, y: u32, on: bool) {
        if self.format != BitmapFormat::Mono1 || x >= self.width || y >= self.height {
            return;
        }
        let mask = 0x80u8 >> (x % 8);
        let byte = &mut self.row_mut(y)[(x / 8) as usize];
        if on {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Placement of a glyph relative to the pen position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlyphMetrics {
    /// Horizontal pen advance in pixels
    pub advance: Fixed,
    /// Offset from the pen to the bitmap's left edge
    pub bearing_x: i32,
    /// Offset from the baseline up to the bitmap's top edge
    pub bearing_y: i32,
}

/// What a font engine hands back for one code point
#[derive(Debug, Clone)]
pub struct RasterizedGlyph {
    pub bitmap: Bitmap,
    pub metrics: GlyphMetrics,
}

/// A cached glyph as seen by callers
///
/// The bitmap is shared, so a `Glyph` stays valid after the cache evicts
/// its entry.
#[derive(Debug, Clone)]
pub struct Glyph {
    codepoint: u32,
    metrics: GlyphMetrics,
    bitmap: Arc<Bitmap>,
}

impl Glyph {
    pub fn new(codepoint: u32, rasterized: RasterizedGlyph) -> Self {
        Self {
            codepoint,
            metrics: rasterized.metrics,
            bitmap: Arc::new(rasterized.bitmap),
        }
    }

    pub fn codepoint(&self) -> u32 {
        self.codepoint
    }

    pub fn metrics(&self) -> GlyphMetrics {
        self.metrics
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    pub fn byte_size(&self) -> usize {
        self.bitmap.byte_size()
    }

    /// Whether two handles share the same cached bitmap
    pub fn ptr_eq(&self, other: &Glyph) -> bool {
        Arc::ptr_eq(&self.bitmap, &other.bitmap)
    }
}
