//! Error types for glyphcache

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GlyphCacheError>;

/// Main error type for glyphcache
///
/// Every failure is returned to the caller; nothing in the cache is fatal.
/// A failed lookup leaves the cache exactly as it was before the call.
#[derive(Debug, Error)]
pub enum GlyphCacheError {
    #[error("Font not found: {0}")]
    NotFound(String),

    #[error("Font engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("No glyph for U+{codepoint:04X} in face '{face}'")]
    GlyphNotFound { codepoint: u32, face: String },

    #[error("Out of memory while allocating {0}")]
    OutOfMemory(&'static str),

    #[error("Name already registered: {0}")]
    AlreadyExists(String),

    #[error("Invalid cache budget: min={min} bytes, max={max} bytes")]
    InvalidBudget { min: usize, max: usize },

    #[error("Font loading failed: {0}")]
    FontLoad(#[from] FontLoadError),
}

impl GlyphCacheError {
    /// Shorthand used by engines when the font has no outline for a code point
    pub fn glyph_not_found(codepoint: u32, face: impl Into<String>) -> Self {
        Self::GlyphNotFound {
            codepoint,
            face: face.into(),
        }
    }
}

/// Errors raised by a font engine while instantiating faces or rasterizing
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unsupported size {size} for a non-scalable font")]
    UnsupportedSize { size: f32 },

    #[error("Invalid font data: {0}")]
    InvalidFont(String),

    #[error("Outline extraction failed for U+{0:04X}")]
    OutlineExtractionFailed(u32),

    #[error("Bitmap too large: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Font loading errors
#[derive(Debug, Error)]
pub enum FontLoadError {
    #[error("Font file not found: {0}")]
    FileNotFound(String),

    #[error("Font file too large: {size} bytes (max: {max} bytes) at {path}")]
    TooLarge { path: String, size: u64, max: u64 },

    #[error("Invalid font data: {0}")]
    InvalidData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
