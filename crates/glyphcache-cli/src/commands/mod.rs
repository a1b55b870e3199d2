//! Subcommand implementations and the font loading they share

pub mod info;
pub mod render;
pub mod stats;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use glyphcache_core::{CacheManager, FaceHandle, FaceKey, FontRegistry};
use glyphcache_fontdb::{FontLoader, LoadedFace};
use glyphcache_render_zeno::ZenoEngine;

use crate::cli::{FaceArgs, FontSources};

/// Loads every requested file and directory into a fresh registry
pub fn load_fonts(sources: &FontSources) -> Result<(FontLoader, Vec<LoadedFace>)> {
    if sources.fonts.is_empty() && sources.dirs.is_empty() {
        bail!("No fonts given; pass --font <FILE> or --dir <DIR>");
    }

    let loader = FontLoader::new(Arc::new(FontRegistry::new()));
    let mut loaded = Vec::new();
    for path in &sources.fonts {
        let faces = loader
            .load_file(path)
            .with_context(|| format!("Failed to load font {}", path.display()))?;
        loaded.extend(faces);
    }
    for dir in &sources.dirs {
        let summary = loader
            .load_dir(dir)
            .with_context(|| format!("Failed to scan {}", dir.display()))?;
        for (path, reason) in &summary.skipped {
            eprintln!("warning: skipped {}: {}", path.display(), reason);
        }
        loaded.extend(summary.loaded);
    }

    if loaded.is_empty() {
        bail!("No usable fonts found");
    }
    Ok((loader, loaded))
}

/// Builds a zeno-backed cache over the loaded fonts and acquires the face
pub fn open_face(sources: &FontSources, face: &FaceArgs) -> Result<(CacheManager, FaceHandle)> {
    let (loader, _) = load_fonts(sources)?;
    let config = face.cache_config();
    let manager = CacheManager::with_config(
        Arc::new(ZenoEngine::new()),
        Arc::clone(loader.registry()),
        config,
    )
    .context("Invalid cache budget")?;

    let key = match face.family.as_deref() {
        Some(family) => FaceKey::new(family, face.size(), face.flags()),
        None => FaceKey::unnamed(face.size(), face.flags()),
    };
    let handle = manager
        .acquire_face(&key)
        .with_context(|| format!("Cannot open face {:?}", key))?;
    log::info!("Using {:?} with budget {:?}", handle, manager.budget());
    Ok((manager, handle))
}
