//! The cache manager: face map, glyph arena, LRU and byte budget
//!
//! All mutable state sits behind one `parking_lot::Mutex`, so a lookup, the
//! LRU touch on a hit, an insertion and the eviction it may trigger happen
//! as one atomic step. Face handles take the same lock when they are cloned
//! or dropped.
//!
//! Lock order is manager state first, then the font registry. Nothing that
//! runs under the state lock drops a [`FaceHandle`].

use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache_config::{validate_budget, CacheConfig};
use crate::engine::FontEngine;
use crate::error::{GlyphCacheError, Result};
use crate::face::{Face, FaceArena, FaceHandle, FaceId, FaceSummary};
use crate::glyph::Glyph;
use crate::key::FaceKey;
use crate::lru::LruList;
use crate::registry::FontRegistry;
use crate::stats::{CacheStats, Stats, Usage};
use crate::style::StyleFlags;
use crate::table::BucketTable;

/// One LRU entry: a glyph and the face whose table indexes it
pub(crate) struct CachedGlyph {
    face: FaceId,
    glyph: Glyph,
}

pub(crate) struct CacheState {
    faces: FaceArena,
    face_map: BucketTable<FaceKey<'static>, FaceId>,
    lru: LruList<CachedGlyph>,
    running_total: usize,
    min_budget: usize,
    max_budget: usize,
    initial_buckets: usize,
    budget_exceeded: bool,
}

impl CacheState {
    fn new(config: &CacheConfig) -> Self {
        Self {
            faces: FaceArena::default(),
            face_map: BucketTable::new(),
            lru: LruList::new(),
            running_total: 0,
            min_budget: config.min_bytes,
            max_budget: config.max_bytes,
            initial_buckets: config.initial_buckets,
            budget_exceeded: false,
        }
    }

    fn find_face(&self, key: &FaceKey<'_>) -> Option<FaceId> {
        self.face_map
            .get_with(key.hash_value(), |stored| stored.compare(key))
            .copied()
    }

    /// Evicts from the LRU tail until the total is at or below `min_budget`
    /// or the list is empty
    ///
    /// The glyph that triggered the pass may go too; callers already hold
    /// their own reference to its bitmap.
    fn evict(&mut self, stats: &Stats) {
        let before = self.running_total;
        let mut count = 0usize;
        while self.running_total > self.min_budget && self.evict_lru_tail(stats) {
            count += 1;
        }

        self.budget_exceeded = self.running_total > self.min_budget;
        if self.budget_exceeded {
            stats.record_soft_budget_exceeded();
            log::warn!(
                "Glyph cache still at {} bytes with an empty LRU (min budget {})",
                self.running_total,
                self.min_budget
            );
        }
        log::debug!(
            "Evicted {} glyphs ({} -> {} bytes)",
            count,
            before,
            self.running_total
        );
    }

    /// Drops the least recently used glyph from the LRU and its face's table;
    /// false when the LRU is empty
    fn evict_lru_tail(&mut self, stats: &Stats) -> bool {
        let Some((_, cached)) = self.lru.pop_back() else {
            return false;
        };
        let bytes = cached.glyph.byte_size();
        if let Some(face) = self.faces.get_mut(cached.face) {
            face.glyphs.remove(&cached.glyph.codepoint());
            face.cache_size -= bytes;
        }
        self.running_total -= bytes;
        stats.record_eviction(bytes);
        true
    }

    /// Removes a face whose count reached zero, with all of its glyphs
    fn destroy_face(&mut self, id: FaceId, stats: &Stats) {
        let Some(face) = self.faces.remove(id) else {
            return;
        };
        for &slot in face.glyphs.values() {
            self.lru.remove(slot);
        }
        self.running_total -= face.cache_size;
        self.face_map
            .remove_with(face.key.hash_value(), |stored| stored.compare(&face.key));
        stats.record_face_destroyed();
        log::debug!(
            "Destroyed face {} ({} glyphs, {} bytes released)",
            face.label(),
            face.glyphs.len(),
            face.cache_size
        );
        // Engine face and font data reference go with `face` here
    }

    fn usage(&self) -> Usage {
        Usage {
            faces: self.faces.len(),
            glyphs: self.lru.len(),
            running_total: self.running_total,
            min_budget: self.min_budget,
            max_budget: self.max_budget,
            budget_exceeded: self.budget_exceeded,
        }
    }
}

/// State shared by a manager, its clones and every face handle
pub(crate) struct Shared {
    state: Mutex<CacheState>,
    engine: Arc<dyn FontEngine>,
    registry: Arc<FontRegistry>,
    stats: Arc<Stats>,
}

impl Shared {
    fn acquire(self: &Arc<Self>, key: &FaceKey<'_>) -> Result<FaceHandle> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if let Some(id) = state.find_face(key) {
            if let Some(face) = state.faces.get_mut(id) {
                face.ref_count += 1;
                return Ok(FaceHandle::adopt(
                    id,
                    face.key.clone(),
                    face.metrics,
                    Arc::clone(self),
                ));
            }
        }

        let font = self.registry.resolve_or_default(key.name())?;
        let engine_face = self.engine.instantiate(&font, key.size(), key.flags())?;
        let metrics = engine_face.metrics();
        let owned = key.to_owned_key();

        state.face_map.try_reserve_for(&owned)?;
        let face = Face {
            key: owned.clone(),
            font,
            engine_face,
            metrics,
            glyphs: BucketTable::with_initial_buckets(state.initial_buckets),
            cache_size: 0,
            ref_count: 1,
        };
        let label = face.label();
        let id = state.faces.try_insert(face)?;
        state.face_map.insert_reserved(owned.clone(), id);

        self.stats.record_face_created();
        log::debug!(
            "Created face {} with {} (flags {:?})",
            label,
            self.engine.name(),
            owned.flags()
        );
        Ok(FaceHandle::adopt(id, owned, metrics, Arc::clone(self)))
    }

    pub(crate) fn retain(&self, id: FaceId) {
        if let Some(face) = self.state.lock().faces.get_mut(id) {
            face.ref_count += 1;
        }
    }

    pub(crate) fn release(&self, id: FaceId) {
        let mut state = self.state.lock();
        let Some(face) = state.faces.get_mut(id) else {
            log::warn!("Released face {:?} that is not live", id);
            return;
        };
        face.ref_count -= 1;
        if face.ref_count == 0 {
            state.destroy_face(id, &self.stats);
        }
    }

    pub(crate) fn with_face<R>(&self, id: FaceId, f: impl FnOnce(&Face) -> R) -> Option<R> {
        self.state.lock().faces.get(id).map(f)
    }

    pub(crate) fn get_glyph(&self, id: FaceId, codepoint: u32) -> Result<Glyph> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let face = state
            .faces
            .get_mut(id)
            .ok_or_else(|| GlyphCacheError::NotFound(format!("face {:?}", id)))?;

        if let Some(&slot) = face.glyphs.get(&codepoint) {
            state.lru.touch(slot);
            if let Some(cached) = state.lru.get(slot) {
                self.stats.record_hit();
                return Ok(cached.glyph.clone());
            }
        }

        self.stats.record_miss();
        let rasterized = face.engine_face.rasterize(&face.font, codepoint)?;
        let glyph = Glyph::new(codepoint, rasterized);
        let bytes = glyph.byte_size();

        face.glyphs.try_reserve_for(&codepoint)?;
        let slot = state.lru.try_push_front(CachedGlyph {
            face: id,
            glyph: glyph.clone(),
        })?;
        face.glyphs.insert_reserved(codepoint, slot);
        face.cache_size += bytes;
        state.running_total += bytes;
        self.stats.record_insertion();
        log::trace!(
            "Cached U+{:04X} in face {} ({} bytes, total {})",
            codepoint,
            face.label(),
            bytes,
            state.running_total
        );

        if state.running_total > state.max_budget {
            state.evict(&self.stats);
        }
        Ok(glyph)
    }
}

/// Glyph and face cache with a byte budget
///
/// Cloning the manager is cheap and yields another handle to the same cache.
///
/// ```ignore
/// let manager = CacheManager::new(engine, registry);
/// let face = manager.acquire_face(&FaceKey::new("Inter", Fixed::from_int(16), StyleFlags::ANTIALIAS))?;
/// let glyph = manager.get_glyph(&face, 'A' as u32)?;
/// manager.release_face(face);
/// ```
#[derive(Clone)]
pub struct CacheManager {
    shared: Arc<Shared>,
}

impl CacheManager {
    /// A manager with the default 8 MiB / 16 MiB budget
    pub fn new(engine: Arc<dyn FontEngine>, registry: Arc<FontRegistry>) -> Self {
        Self::build(engine, registry, &CacheConfig::default(), Arc::new(Stats::new()))
    }

    pub fn with_config(
        engine: Arc<dyn FontEngine>,
        registry: Arc<FontRegistry>,
        config: CacheConfig,
    ) -> Result<Self> {
        Self::with_stats(engine, registry, config, Arc::new(Stats::new()))
    }

    /// Like [`with_config`](Self::with_config), counting into `stats`
    pub fn with_stats(
        engine: Arc<dyn FontEngine>,
        registry: Arc<FontRegistry>,
        config: CacheConfig,
        stats: Arc<Stats>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(engine, registry, &config, stats))
    }

    fn build(
        engine: Arc<dyn FontEngine>,
        registry: Arc<FontRegistry>,
        config: &CacheConfig,
        stats: Arc<Stats>,
    ) -> Self {
        log::debug!(
            "Glyph cache using {} with budget {}..{} bytes",
            engine.name(),
            config.min_bytes,
            config.max_bytes
        );
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(CacheState::new(config)),
                engine,
                registry,
                stats,
            }),
        }
    }

    /// Returns the face for `key`, creating it on first use
    ///
    /// Every successful call adds one reference; give it back with
    /// [`release_face`](Self::release_face) or by dropping the handle.
    pub fn acquire_face(&self, key: &FaceKey<'_>) -> Result<FaceHandle> {
        self.shared.acquire(key)
    }

    /// Drops one reference; the last one destroys the face and its glyphs
    pub fn release_face(&self, face: FaceHandle) {
        if !face.belongs_to(&self.shared) {
            log::warn!("Releasing {:?} through a different cache manager", face.id());
        }
        drop(face);
    }

    /// Same family and size with other style flags
    pub fn clone_face_variant(&self, face: &FaceHandle, flags: StyleFlags) -> Result<FaceHandle> {
        self.acquire_face(&face.key().with_flags(flags))
    }

    /// Looks up a glyph, rasterizing and caching it on a miss
    pub fn get_glyph(&self, face: &FaceHandle, codepoint: u32) -> Result<Glyph> {
        if !face.belongs_to(&self.shared) {
            return Err(GlyphCacheError::NotFound(format!(
                "face {:?} belongs to another cache",
                face.id()
            )));
        }
        self.shared.get_glyph(face.id(), codepoint)
    }

    /// Replaces the budget; the new thresholds apply from the next insertion
    pub fn configure_budget(&self, min_bytes: usize, max_bytes: usize) -> Result<()> {
        validate_budget(min_bytes, max_bytes)?;
        let mut state = self.shared.state.lock();
        state.min_budget = min_bytes;
        state.max_budget = max_bytes;
        log::debug!("Glyph cache budget set to {}..{} bytes", min_bytes, max_bytes);
        Ok(())
    }

    /// Current `(min, max)` thresholds in bytes
    pub fn budget(&self) -> (usize, usize) {
        let state = self.shared.state.lock();
        (state.min_budget, state.max_budget)
    }

    /// Evicts every glyph; faces stay registered
    pub fn flush(&self) {
        let mut state = self.shared.state.lock();
        let mut count = 0usize;
        while state.evict_lru_tail(&self.shared.stats) {
            count += 1;
        }
        state.budget_exceeded = false;
        log::debug!("Flushed {} glyphs", count);
    }

    pub fn running_total(&self) -> usize {
        self.shared.state.lock().running_total
    }

    pub fn face_count(&self) -> usize {
        self.shared.state.lock().faces.len()
    }

    pub fn glyph_count(&self) -> usize {
        self.shared.state.lock().lru.len()
    }

    /// Code points in recency order, most recent first
    pub fn lru_codepoints(&self) -> Vec<u32> {
        self.shared
            .state
            .lock()
            .lru
            .iter()
            .map(|(_, cached)| cached.glyph.codepoint())
            .collect()
    }

    /// Live faces ordered by key
    pub fn faces(&self) -> Vec<FaceSummary> {
        let state = self.shared.state.lock();
        let mut faces: Vec<FaceSummary> = state
            .faces
            .iter()
            .map(|(id, face)| FaceSummary {
                id,
                key: face.key.clone(),
                family: face.font.family().to_string(),
                style: face.font.style().to_string(),
                ref_count: face.ref_count,
                glyphs: face.glyphs.len(),
                cache_size: face.cache_size,
            })
            .collect();
        faces.sort_by(|a, b| a.key.compare(&b.key));
        faces
    }

    pub fn stats(&self) -> CacheStats {
        let usage = self.shared.state.lock().usage();
        self.shared.stats.snapshot(usage)
    }

    /// The counters this manager writes to
    pub fn stats_handle(&self) -> &Arc<Stats> {
        &self.shared.stats
    }

    pub fn registry(&self) -> &Arc<FontRegistry> {
        &self.shared.registry
    }

    pub fn engine_name(&self) -> &'static str {
        self.shared.engine.name()
    }

    /// Checks the accounting and LRU/table bijection invariants
    ///
    /// Meant for tests and debugging; walks every face and glyph.
    pub fn verify_consistency(&self) -> std::result::Result<(), String> {
        let state = self.shared.state.lock();

        let mut total = 0usize;
        let mut table_glyphs = 0usize;
        for (id, face) in state.faces.iter() {
            if face.ref_count == 0 {
                return Err(format!("face {:?} is live with no references", id));
            }
            match state.find_face(&face.key) {
                Some(mapped) if mapped == id => {},
                other => {
                    return Err(format!(
                        "face {:?} maps to {:?} under its own key",
                        id, other
                    ))
                },
            }
            let mut face_bytes = 0usize;
            for (&codepoint, &slot) in face.glyphs.iter() {
                let cached = state
                    .lru
                    .get(slot)
                    .ok_or_else(|| format!("U+{:04X} points at empty slot {}", codepoint, slot))?;
                if cached.face != id || cached.glyph.codepoint() != codepoint {
                    return Err(format!(
                        "slot {} holds U+{:04X} of {:?}, table says U+{:04X} of {:?}",
                        slot,
                        cached.glyph.codepoint(),
                        cached.face,
                        codepoint,
                        id
                    ));
                }
                face_bytes += cached.glyph.byte_size();
            }
            if face_bytes != face.cache_size {
                return Err(format!(
                    "face {:?} caches {} bytes, glyphs sum to {}",
                    id, face.cache_size, face_bytes
                ));
            }
            table_glyphs += face.glyphs.len();
            total += face.cache_size;
        }

        if state.face_map.len() != state.faces.len() {
            return Err(format!(
                "{} map entries for {} faces",
                state.face_map.len(),
                state.faces.len()
            ));
        }
        if table_glyphs != state.lru.len() {
            return Err(format!(
                "{} glyphs in tables, {} in the LRU",
                table_glyphs,
                state.lru.len()
            ));
        }
        for (slot, cached) in state.lru.iter() {
            let indexed = state
                .faces
                .get(cached.face)
                .and_then(|face| face.glyphs.get(&cached.glyph.codepoint()))
                .copied();
            if indexed != Some(slot) {
                return Err(format!("LRU slot {} is not indexed by its face", slot));
            }
        }
        if total != state.running_total {
            return Err(format!(
                "running total {} but faces sum to {}",
                state.running_total, total
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("CacheManager")
            .field("engine", &self.shared.engine.name())
            .field("faces", &state.faces.len())
            .field("glyphs", &state.lru.len())
            .field("running_total", &state.running_total)
            .field("budget", &(state.min_budget, state.max_budget))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Fixed;
    use crate::test_support::{registry_with, MockEngine};

    fn manager(min: usize, max: usize) -> CacheManager {
        CacheManager::with_config(
            Arc::new(MockEngine::new(500)),
            registry_with(&["Mock Sans"]),
            CacheConfig::with_budget(min, max),
        )
        .unwrap()
    }

    fn key(size: i32) -> FaceKey<'static> {
        FaceKey::new("Mock Sans", Fixed::from_int(size), StyleFlags::ANTIALIAS)
    }

    #[test]
    fn test_hit_returns_shared_bitmap() {
        let cache = manager(1024, 2048);
        let face = cache.acquire_face(&key(12)).unwrap();
        let first = cache.get_glyph(&face, 65).unwrap();
        let second = cache.get_glyph(&face, 65).unwrap();
        assert!(first.ptr_eq(&second));

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.insertions), (1, 1, 1));
        assert_eq!(cache.running_total(), 500);
    }

    #[test]
    fn test_handle_drop_destroys_face() {
        let cache = manager(1024, 2048);
        {
            let face = cache.acquire_face(&key(12)).unwrap();
            face.glyph(1).unwrap();
            face.glyph(2).unwrap();
            assert_eq!(cache.glyph_count(), 2);
        }
        assert_eq!(cache.face_count(), 0);
        assert_eq!(cache.glyph_count(), 0);
        assert_eq!(cache.running_total(), 0);
        assert_eq!(cache.stats().faces_destroyed, 1);
        cache.verify_consistency().unwrap();
    }

    #[test]
    fn test_clone_handle_counts_reference() {
        let cache = manager(1024, 2048);
        let face = cache.acquire_face(&key(12)).unwrap();
        let other = face.clone();
        assert_eq!(face.ref_count(), 2);
        assert!(face.same_face(&other));
        drop(other);
        assert_eq!(face.ref_count(), 1);
        assert_eq!(cache.face_count(), 1);
    }

    #[test]
    fn test_flush_keeps_faces() {
        let cache = manager(4096, 8192);
        let face = cache.acquire_face(&key(12)).unwrap();
        for cp in 1..=4 {
            face.glyph(cp).unwrap();
        }
        cache.flush();
        assert_eq!(cache.glyph_count(), 0);
        assert_eq!(cache.running_total(), 0);
        assert_eq!(face.cache_size(), 0);
        assert_eq!(cache.face_count(), 1);
        assert_eq!(cache.stats().evictions, 4);
        cache.verify_consistency().unwrap();
    }

    #[test]
    fn test_refill_after_flush() {
        let cache = manager(4096, 8192);
        let face = cache.acquire_face(&key(12)).unwrap();
        for cp in 1..=3 {
            face.glyph(cp).unwrap();
        }
        cache.flush();
        for cp in [3, 1] {
            face.glyph(cp).unwrap();
        }
        assert_eq!(cache.lru_codepoints(), vec![1, 3]);
        assert_eq!(cache.stats().misses, 5);
        assert_eq!(face.glyph_count(), 2);
        cache.verify_consistency().unwrap();
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let a = manager(1024, 2048);
        let b = manager(1024, 2048);
        let face = a.acquire_face(&key(12)).unwrap();
        assert!(matches!(
            b.get_glyph(&face, 1),
            Err(GlyphCacheError::NotFound(_))
        ));
        assert_eq!(b.glyph_count(), 0);
    }

    #[test]
    fn test_faces_summary_sorted() {
        let cache = manager(1024, 2048);
        let big = cache.acquire_face(&key(24)).unwrap();
        let small = cache.acquire_face(&key(10)).unwrap();
        small.glyph(7).unwrap();

        let faces = cache.faces();
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].key, *small.key());
        assert_eq!(faces[0].glyphs, 1);
        assert_eq!(faces[0].family, "Mock Sans");
        assert_eq!(faces[1].id, big.id());
    }
}
