//! Faces: one font at one size and style, plus their glyph tables

use std::fmt;
use std::sync::Arc;

use crate::error::{GlyphCacheError, Result};
use crate::engine::ScaledFace;
use crate::fixed::Fixed;
use crate::font_data::FontData;
use crate::glyph::Glyph;
use crate::key::FaceKey;
use crate::lru::SlotIndex;
use crate::manager::Shared;
use crate::style::StyleFlags;
use crate::table::BucketTable;

/// Vertical metrics of a face at its active size, in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaceMetrics {
    /// Baseline-to-baseline distance
    pub height: Fixed,
    /// Distance from the baseline up to the top of the tallest glyphs
    pub ascender: Fixed,
    /// Distance from the baseline down to the bottom, negative below
    pub descender: Fixed,
}

/// Stable identifier of a live face inside one cache manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FaceId(pub(crate) u32);

impl FaceId {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Per-face glyph table: code point → glyph slot in the manager's LRU arena
pub(crate) type GlyphTable = BucketTable<u32, SlotIndex>;

pub(crate) struct Face {
    pub key: FaceKey<'static>,
    pub font: Arc<FontData>,
    pub engine_face: Box<dyn ScaledFace>,
    pub metrics: FaceMetrics,
    pub glyphs: GlyphTable,
    /// Sum of the bitmap sizes of every glyph in `glyphs`
    pub cache_size: usize,
    pub ref_count: usize,
}

impl Face {
    pub fn label(&self) -> String {
        format!(
            "{}@{}",
            self.key.name().unwrap_or(self.font.family()),
            self.key.size()
        )
    }
}

/// Slab of faces addressed by [`FaceId`]
#[derive(Default)]
pub(crate) struct FaceArena {
    slots: Vec<Option<Face>>,
    free: Vec<u32>,
    len: usize,
}

impl FaceArena {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn get(&self, id: FaceId) -> Option<&Face> {
        self.slots.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: FaceId) -> Option<&mut Face> {
        self.slots.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    /// Stores a face, failing with `OutOfMemory` before anything changes
    pub fn try_insert(&mut self, face: Face) -> Result<FaceId> {
        // The free list must hold every slot so `remove` never allocates
        self.free
            .try_reserve(self.slots.len() + 1 - self.free.len())
            .map_err(|_| GlyphCacheError::OutOfMemory("face slot"))?;
        if self.free.is_empty() {
            self.slots
                .try_reserve(1)
                .map_err(|_| GlyphCacheError::OutOfMemory("face slot"))?;
        }
        let id = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize] = Some(face);
                index
            },
            None => {
                self.slots.push(Some(face));
                (self.slots.len() - 1) as u32
            },
        };
        self.len += 1;
        Ok(FaceId(id))
    }

    /// Takes a face out; its slot is reused by later insertions
    pub fn remove(&mut self, id: FaceId) -> Option<Face> {
        let face = self.slots.get_mut(id.0 as usize)?.take()?;
        // Capacity for every slot was reserved by `try_insert`
        self.free.push(id.0);
        self.len -= 1;
        Some(face)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FaceId, &Face)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|face| (FaceId(i as u32), face)))
    }
}

/// Counted reference to a cached face
///
/// Cloning takes another reference; dropping gives one back. When the last
/// handle goes, the face, all of its glyphs and its hold on the font data
/// are released. Release therefore happens on every exit path, including
/// early returns and `?`.
pub struct FaceHandle {
    id: FaceId,
    key: FaceKey<'static>,
    metrics: FaceMetrics,
    shared: Arc<Shared>,
}

impl FaceHandle {
    /// Wraps a reference the caller already counted
    pub(crate) fn adopt(
        id: FaceId,
        key: FaceKey<'static>,
        metrics: FaceMetrics,
        shared: Arc<Shared>,
    ) -> Self {
        Self {
            id,
            key,
            metrics,
            shared,
        }
    }

    pub fn id(&self) -> FaceId {
        self.id
    }

    pub fn key(&self) -> &FaceKey<'static> {
        &self.key
    }

    pub fn flags(&self) -> StyleFlags {
        self.key.flags()
    }

    pub fn size(&self) -> Fixed {
        self.key.size()
    }

    pub fn metrics(&self) -> FaceMetrics {
        self.metrics
    }

    /// Looks up or rasterizes one code point in this face
    pub fn glyph(&self, codepoint: u32) -> Result<Glyph> {
        self.shared.get_glyph(self.id, codepoint)
    }

    /// Bytes of glyph bitmaps currently cached for this face
    pub fn cache_size(&self) -> usize {
        self.shared
            .with_face(self.id, |face| face.cache_size)
            .unwrap_or_default()
    }

    pub fn glyph_count(&self) -> usize {
        self.shared
            .with_face(self.id, |face| face.glyphs.len())
            .unwrap_or_default()
    }

    pub fn ref_count(&self) -> usize {
        self.shared
            .with_face(self.id, |face| face.ref_count)
            .unwrap_or_default()
    }

    pub fn font(&self) -> Option<Arc<FontData>> {
        self.shared.with_face(self.id, |face| Arc::clone(&face.font))
    }

    /// Whether both handles refer to the same face of the same cache
    pub fn same_face(&self, other: &FaceHandle) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.shared, &other.shared)
    }

    pub(crate) fn belongs_to(&self, shared: &Arc<Shared>) -> bool {
        Arc::ptr_eq(&self.shared, shared)
    }
}

impl Clone for FaceHandle {
    fn clone(&self) -> Self {
        self.shared.retain(self.id);
        Self {
            id: self.id,
            key: self.key.clone(),
            metrics: self.metrics,
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for FaceHandle {
    fn drop(&mut self) {
        self.shared.release(self.id);
    }
}

impl fmt::Debug for FaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaceHandle")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("metrics", &self.metrics)
            .finish()
    }
}

/// Read-only view of one face, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceSummary {
    pub id: FaceId,
    pub key: FaceKey<'static>,
    pub family: String,
    pub style: String,
    pub ref_count: usize,
    pub glyphs: usize,
    pub cache_size: usize,
}
