//! Raw font bytes shared by every face derived from them

use std::fmt;
use std::sync::Arc;

/// Immutable font-file bytes plus the names extracted from them once
///
/// Always handled as `Arc<FontData>`: the registry holds one reference and
/// every live face holds another, so the bytes outlive all of their users.
pub struct FontData {
    bytes: Box<dyn AsRef<[u8]> + Send + Sync>,
    face_index: u32,
    family: String,
    style: String,
}

impl FontData {
    /// Wraps owned bytes
    pub fn new(
        bytes: Vec<u8>,
        face_index: u32,
        family: impl Into<String>,
        style: impl Into<String>,
    ) -> Self {
        Self::from_source(bytes, face_index, family, style)
    }

    /// Wraps any byte source, such as a memory map
    pub fn from_source(
        source: impl AsRef<[u8]> + Send + Sync + 'static,
        face_index: u32,
        family: impl Into<String>,
        style: impl Into<String>,
    ) -> Self {
        Self {
            bytes: Box::new(source),
            face_index,
            family: family.into(),
            style: style.into(),
        }
    }

    pub fn into_shared(self) -> Arc<FontData> {
        Arc::new(self)
    }

    pub fn data(&self) -> &[u8] {
        AsRef::<[u8]>::as_ref(&*self.bytes)
    }

    pub fn len(&self) -> usize {
        self.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    /// Face index inside a collection (0 for single-face files)
    pub fn face_index(&self) -> u32 {
        self.face_index
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    /// "Family Style", or just the family for regular faces
    pub fn full_name(&self) -> String {
        if self.style.is_empty() || self.style.eq_ignore_ascii_case("regular") {
            self.family.clone()
        } else {
            format!("{} {}", self.family, self.style)
        }
    }

    /// Whether the font is natively bold, judged from its style name
    pub fn is_bold(&self) -> bool {
        let style = self.style.to_ascii_lowercase();
        ["bold", "black", "heavy", "extrabold", "semibold"]
            .iter()
            .any(|w| style.contains(w))
    }

    /// Whether the font is natively italic or oblique
    pub fn is_italic(&self) -> bool {
        let style = self.style.to_ascii_lowercase();
        style.contains("italic") || style.contains("oblique")
    }
}

impl fmt::Debug for FontData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontData")
            .field("family", &self.family)
            .field("style", &self.style)
            .field("face_index", &self.face_index)
            .field("bytes", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_detection() {
        let bold = FontData::new(vec![1, 2, 3], 0, "Inter", "Bold Italic");
        assert!(bold.is_bold());
        assert!(bold.is_italic());
        assert_eq!(bold.full_name(), "Inter Bold Italic");

        let regular = FontData::new(Vec::new(), 0, "Inter", "Regular");
        assert!(!regular.is_bold());
        assert!(!regular.is_italic());
        assert_eq!(regular.full_name(), "Inter");
        assert!(regular.is_empty());
    }

    #[test]
    fn test_shared_ownership() {
        let data = FontData::new(vec![0; 16], 2, "Mono", "Regular").into_shared();
        let face_ref = Arc::clone(&data);
        assert_eq!(Arc::strong_count(&data), 2);
        drop(face_ref);
        assert_eq!(Arc::strong_count(&data), 1);
        assert_eq!(data.len(), 16);
        assert_eq!(data.face_index(), 2);
    }
}
