//! Glyphcache Core: fonts in, cached glyph bitmaps out
//!
//! Rasterizing a glyph is expensive and a text renderer asks for the same
//! handful of glyphs over and over. This crate keeps them: a logical font
//! request (family, size, style) becomes a reference-counted [`FaceHandle`],
//! and each code point drawn through that face is rasterized once and then
//! served from memory until the byte budget forces it out.
//!
//! ## The Pieces
//!
//! - [`FontRegistry`] - Family names and aliases resolved to shared [`FontData`]
//! - [`FaceKey`] - Family, fixed-point size and [`StyleFlags`], hashed deterministically
//! - [`CacheManager`] - The face map, per-face glyph tables and one LRU across all faces
//! - [`FontEngine`] / [`ScaledFace`] - The font engine the cache delegates rasterizing to
//!
//! ## The Budget
//!
//! The cache tracks the bitmap bytes it holds. Once an insertion pushes the
//! total past `max_bytes`, the least recently used glyphs of any face are
//! evicted until the total is back at or below `min_bytes`. Faces themselves
//! are never evicted: they live exactly as long as somebody holds a handle.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use glyphcache_core::{CacheConfig, CacheManager, FaceKey, Fixed, FontRegistry, StyleFlags};
//!
//! let registry = Arc::new(FontRegistry::new());
//! registry.register_font("Inter", load_inter())?;
//!
//! let cache = CacheManager::with_config(engine, registry, CacheConfig::from_env())?;
//! let face = cache.acquire_face(&FaceKey::new("Inter", Fixed::from_int(16), StyleFlags::ANTIALIAS))?;
//! for ch in "Hello".chars() {
//!     let glyph = cache.get_glyph(&face, ch as u32)?;
//!     blit(glyph.bitmap(), glyph.metrics());
//! }
//! ```
//!
//! ## Threads
//!
//! One mutex guards the whole cache, so a manager can be cloned into other
//! threads and handles can move freely. Statistics are atomics in a
//! [`Stats`] value that callers may share between managers.

pub mod cache_config;
pub mod engine;
pub mod error;
pub mod face;
pub mod fixed;
pub mod font_data;
pub mod glyph;
pub mod key;
pub mod lru;
pub mod manager;
pub mod registry;
pub mod stats;
pub mod style;
pub mod table;

pub use cache_config::CacheConfig;
pub use engine::{FontEngine, ScaledFace};
pub use error::{EngineError, FontLoadError, GlyphCacheError, Result};
pub use face::{FaceHandle, FaceId, FaceMetrics, FaceSummary};
pub use fixed::Fixed;
pub use font_data::FontData;
pub use glyph::{Bitmap, BitmapFormat, Glyph, GlyphMetrics, RasterizedGlyph};
pub use key::FaceKey;
pub use manager::CacheManager;
pub use registry::FontRegistry;
pub use stats::{CacheStats, Stats};
pub use style::StyleFlags;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod proptests;
