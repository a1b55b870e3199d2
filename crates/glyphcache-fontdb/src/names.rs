//! What a font calls itself: names and style attributes from the `name`,
//! `OS/2`, `head` and `maxp` tables

use read_fonts::{FileRef, TableProvider};
use skrifa::{attribute::Style, string::StringId, FontRef, MetadataProvider};

use glyphcache_core::{FontLoadError, Result};

/// Names and basic facts about one face of a font file
#[derive(Debug, Clone, PartialEq)]
pub struct FaceInfo {
    pub family: String,
    pub style: String,
    pub postscript_name: Option<String>,
    pub face_index: u32,
    /// `OS/2` weight class, 400 for regular
    pub weight: f32,
    pub italic: bool,
    pub units_per_em: u16,
    pub glyph_count: u32,
}

impl FaceInfo {
    /// "Family Style", or just the family for the regular style
    pub fn full_name(&self) -> String {
        if self.style.eq_ignore_ascii_case("regular") || self.style.is_empty() {
            self.family.clone()
        } else {
            format!("{} {}", self.family, self.style)
        }
    }
}

/// Number of faces in a font file: the collection size for TTC/OTC, else 1
pub fn face_count(data: &[u8]) -> Result<u32> {
    match FileRef::new(data) {
        Ok(FileRef::Font(_)) => Ok(1),
        Ok(FileRef::Collection(collection)) => Ok(collection.len()),
        Err(e) => Err(FontLoadError::InvalidData(format!("Failed to parse font file: {}", e)).into()),
    }
}

/// Reads the names of the face at `face_index`
///
/// Typographic family and subfamily names win over the legacy ones. English
/// entries win over other languages.
pub fn read_face_info(data: &[u8], face_index: u32) -> Result<FaceInfo> {
    let font = FontRef::from_index(data, face_index).map_err(|e| {
        FontLoadError::InvalidData(format!("Failed to read face {}: {}", face_index, e))
    })?;

    let family = english_or_first(&font, StringId::TYPOGRAPHIC_FAMILY_NAME)
        .or_else(|| english_or_first(&font, StringId::FAMILY_NAME))
        .ok_or_else(|| FontLoadError::InvalidData("Font has no family name".to_string()))?;
    let style = english_or_first(&font, StringId::TYPOGRAPHIC_SUBFAMILY_NAME)
        .or_else(|| english_or_first(&font, StringId::SUBFAMILY_NAME))
        .unwrap_or_else(|| "Regular".to_string());
    let postscript_name = english_or_first(&font, StringId::POSTSCRIPT_NAME);

    let attributes = font.attributes();
    let units_per_em = font.head().map(|head| head.units_per_em()).unwrap_or(1000);
    let glyph_count = font
        .maxp()
        .map(|maxp| u32::from(maxp.num_glyphs()))
        .unwrap_or(0);

    Ok(FaceInfo {
        family,
        style,
        postscript_name,
        face_index,
        weight: attributes.weight.value(),
        italic: !matches!(attributes.style, Style::Normal),
        units_per_em,
        glyph_count,
    })
}

fn english_or_first(font: &FontRef, id: StringId) -> Option<String> {
    let mut first = None;
    for entry in font.localized_strings(id) {
        let name: String = entry.chars().collect();
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        if entry.language().is_some_and(|lang| lang.starts_with("en")) {
            return Some(name.to_string());
        }
        if first.is_none() {
            first = Some(name.to_string());
        }
    }
    first
}
