//! Where fonts come from: file loading and name registration for glyphcache
//!
//! The cache only ever sees [`FontData`] resolved through a
//! [`FontRegistry`]. This crate fills that registry: it memory-maps font
//! files (refusing anything over [`MAX_FONT_SIZE`]), reads each face's names
//! and registers it under the names people actually type.
//!
//! ## What Gets Registered
//!
//! For a face with family "Noto Sans" and style "Bold":
//!
//! - `Noto Sans Bold` - the full name, always
//! - `Noto Sans` - the family, unless a Regular face of that family already holds it
//! - `NotoSans-Bold` - the PostScript name, as an alias of the full name
//!
//! Every face of a TTC/OTC collection is registered on its own, sharing one
//! memory map.

mod names;

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::Mmap;
use walkdir::WalkDir;

use glyphcache_core::{FontData, FontLoadError, FontRegistry, GlyphCacheError, Result};

pub use names::{face_count, read_face_info, FaceInfo};

/// Maximum font file size (50MB) to prevent resource exhaustion
pub const MAX_FONT_SIZE: u64 = 50 * 1024 * 1024;

/// File extensions picked up by directory scans, compared case-insensitively
pub const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc", "otc"];

/// A read-only memory map shared by every face of one file
struct MappedFile(Arc<Mmap>);

impl AsRef<[u8]> for MappedFile {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// One face that made it into the registry
#[derive(Debug, Clone)]
pub struct LoadedFace {
    pub info: FaceInfo,
    pub font: Arc<FontData>,
    pub path: Option<PathBuf>,
}

/// Outcome of a directory scan
#[derive(Debug, Default)]
pub struct LoadSummary {
    pub loaded: Vec<LoadedFace>,
    /// Files that looked like fonts but failed to load, with the reason
    pub skipped: Vec<(PathBuf, String)>,
}

impl LoadSummary {
    pub fn face_count(&self) -> usize {
        self.loaded.len()
    }
}

/// Loads fonts and registers them in a [`FontRegistry`]
pub struct FontLoader {
    registry: Arc<FontRegistry>,
    max_file_size: u64,
}

impl FontLoader {
    pub fn new(registry: Arc<FontRegistry>) -> Self {
        Self {
            registry,
            max_file_size: MAX_FONT_SIZE,
        }
    }

    /// Lowers or raises the per-file size limit
    pub fn with_max_file_size(mut self, max: u64) -> Self {
        self.max_file_size = max;
        self
    }

    pub fn registry(&self) -> &Arc<FontRegistry> {
        &self.registry
    }

    /// Maps a font file and registers every face in it
    ///
    /// # Errors
    /// - `FileNotFound` when the path does not exist
    /// - `TooLarge` when the file exceeds the size limit
    /// - `Io` when the file cannot be opened or mapped
    /// - `InvalidData` when no face in it can be parsed
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Vec<LoadedFace>> {
        let path = path.as_ref();
        let mmap = Arc::new(self.map_file(path)?);
        let count = face_count(&mmap)?;

        let mut loaded = Vec::with_capacity(count as usize);
        for index in 0..count {
            match read_face_info(&mmap, index) {
                Ok(info) => {
                    let font = FontData::from_source(
                        MappedFile(Arc::clone(&mmap)),
                        index,
                        info.family.clone(),
                        info.style.clone(),
                    )
                    .into_shared();
                    self.register_face(&info, &font)?;
                    loaded.push(LoadedFace {
                        info,
                        font,
                        path: Some(path.to_path_buf()),
                    });
                },
                Err(e) => log::warn!("Skipping face {} of {}: {}", index, path.display(), e),
            }
        }

        if loaded.is_empty() {
            return Err(FontLoadError::InvalidData(format!(
                "{}: no readable faces",
                path.display()
            ))
            .into());
        }
        log::debug!("Loaded {} face(s) from {}", loaded.len(), path.display());
        Ok(loaded)
    }

    /// Registers every face of an in-memory font file
    pub fn load_bytes(&self, data: Vec<u8>) -> Result<Vec<LoadedFace>> {
        let data: Arc<[u8]> = data.into();
        let count = face_count(&data)?;
        let mut loaded = Vec::with_capacity(count as usize);
        for index in 0..count {
            let info = read_face_info(&data, index)?;
            let font = FontData::from_source(
                Arc::clone(&data),
                index,
                info.family.clone(),
                info.style.clone(),
            )
            .into_shared();
            self.register_face(&info, &font)?;
            loaded.push(LoadedFace {
                info,
                font,
                path: None,
            });
        }
        Ok(loaded)
    }

    /// Loads every font file below `dir`, skipping (and reporting) failures
    pub fn load_dir(&self, dir: impl AsRef<Path>) -> Result<LoadSummary> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(FontLoadError::FileNotFound(dir.display().to_string()).into());
        }

        let mut summary = LoadSummary::default();
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping unreadable entry under {}: {}", dir.display(), e);
                    None
                },
            })
            .filter(|entry| entry.file_type().is_file() && is_font_file(entry.path()))
            .map(|entry| entry.into_path())
            .collect();
        // Deterministic registration order, so "first font wins" is stable
        files.sort();

        for path in files {
            match self.load_file(&path) {
                Ok(faces) => summary.loaded.extend(faces),
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    summary.skipped.push((path, e.to_string()));
                },
            }
        }
        log::info!(
            "Loaded {} face(s) from {} ({} file(s) skipped)",
            summary.loaded.len(),
            dir.display(),
            summary.skipped.len()
        );
        Ok(summary)
    }

    /// Registers one face under its full name, family and PostScript name
    pub fn register_face(&self, info: &FaceInfo, font: &Arc<FontData>) -> Result<()> {
        let full_name = info.full_name();
        self.registry.register_font(&full_name, Arc::clone(font))?;

        let is_regular = full_name == info.family;
        if !is_regular {
            let family_taken = self
                .registry
                .resolve(&info.family)
                .is_ok_and(|existing| existing.style().eq_ignore_ascii_case("regular"));
            if !family_taken {
                match self.registry.register_font(&info.family, Arc::clone(font)) {
                    Ok(_) => {},
                    Err(GlyphCacheError::AlreadyExists(_)) => {
                        log::debug!("Family name '{}' is an alias; not replacing it", info.family)
                    },
                    Err(e) => return Err(e),
                }
            }
        }

        if let Some(postscript) = info.postscript_name.as_deref() {
            if !postscript.eq_ignore_ascii_case(&full_name) {
                match self.registry.register_alias(postscript, &full_name) {
                    Ok(()) | Err(GlyphCacheError::AlreadyExists(_)) => {},
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    }

    fn map_file(&self, path: &Path) -> Result<Mmap> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FontLoadError::FileNotFound(path.display().to_string()),
            _ => FontLoadError::Io(e),
        })?;

        let size = file.metadata().map_err(FontLoadError::Io)?.len();
        if size > self.max_file_size {
            return Err(FontLoadError::TooLarge {
                path: path.display().to_string(),
                size,
                max: self.max_file_size,
            }
            .into());
        }

        // SAFETY: the map is read-only and font files are not expected to
        // change while loaded; the bytes are only ever read through `&[u8]`.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file) }.map_err(FontLoadError::Io)?;
        Ok(mmap)
    }
}

/// Whether the path has one of [`FONT_EXTENSIONS`]
pub fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            FONT_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(family: &str, style: &str, postscript: Option<&str>) -> FaceInfo {
        FaceInfo {
            family: family.to_string(),
            style: style.to_string(),
            postscript_name: postscript.map(str::to_string),
            face_index: 0,
            weight: 400.0,
            italic: false,
            units_per_em: 1000,
            glyph_count: 0,
        }
    }

    fn font(info: &FaceInfo) -> Arc<FontData> {
        FontData::new(Vec::new(), 0, info.family.clone(), info.style.clone()).into_shared()
    }

    #[test]
    fn test_is_font_file() {
        assert!(is_font_file(Path::new("a/Inter.ttf")));
        assert!(is_font_file(Path::new("Inter.OTF")));
        assert!(is_font_file(Path::new("Noto.ttc")));
        assert!(!is_font_file(Path::new("README.md")));
        assert!(!is_font_file(Path::new("ttf")));
    }

    #[test]
    fn test_register_regular_face() {
        let loader = FontLoader::new(Arc::new(FontRegistry::new()));
        let regular = info("Noto Sans", "Regular", Some("NotoSans-Regular"));
        loader.register_face(&regular, &font(&regular)).unwrap();

        let registry = loader.registry();
        assert_eq!(registry.font_names(), vec!["noto sans"]);
        assert_eq!(registry.resolve("NotoSans-Regular").unwrap().style(), "Regular");
    }

    #[test]
    fn test_regular_keeps_family_name() {
        let loader = FontLoader::new(Arc::new(FontRegistry::new()));
        let regular = info("Noto Sans", "Regular", None);
        let bold = info("Noto Sans", "Bold", Some("NotoSans-Bold"));
        loader.register_face(&regular, &font(&regular)).unwrap();
        loader.register_face(&bold, &font(&bold)).unwrap();

        let registry = loader.registry();
        assert_eq!(registry.resolve("noto sans").unwrap().style(), "Regular");
        assert_eq!(registry.resolve("Noto Sans Bold").unwrap().style(), "Bold");
        assert_eq!(registry.resolve("notosans-bold").unwrap().style(), "Bold");
    }

    #[test]
    fn test_bold_takes_family_until_regular_arrives() {
        let loader = FontLoader::new(Arc::new(FontRegistry::new()));
        let bold = info("Mono", "Bold", None);
        let regular = info("Mono", "Regular", None);

        loader.register_face(&bold, &font(&bold)).unwrap();
        assert_eq!(loader.registry().resolve("Mono").unwrap().style(), "Bold");

        loader.register_face(&regular, &font(&regular)).unwrap();
        assert_eq!(loader.registry().resolve("Mono").unwrap().style(), "Regular");
    }

    #[test]
    fn test_missing_file() {
        let loader = FontLoader::new(Arc::new(FontRegistry::new()));
        let err = loader.load_file("/definitely/not/here.ttf").unwrap_err();
        assert!(matches!(
            err,
            GlyphCacheError::FontLoad(FontLoadError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_load_bytes_rejects_garbage() {
        let loader = FontLoader::new(Arc::new(FontRegistry::new()));
        assert!(loader.load_bytes(b"not a font".to_vec()).is_err());
        assert!(loader.registry().is_empty());
    }
}
