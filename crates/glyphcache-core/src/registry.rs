//! Font names and aliases mapped to shared font data
//!
//! The registry sits above the cache: by the time a [`FaceKey`](crate::FaceKey)
//! reaches the cache manager its family name is resolved here, following
//! alias chains down to a concrete [`FontData`]. Names are matched
//! case-insensitively.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{GlyphCacheError, Result};
use crate::font_data::FontData;

enum Entry {
    Font(Arc<FontData>),
    Alias(String),
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    default_font: Option<Arc<FontData>>,
}

/// Thread-safe name → font lookup with alias chains
#[derive(Default)]
pub struct FontRegistry {
    inner: RwLock<Inner>,
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a font under `name`, replacing any font previously there
    ///
    /// The first font ever registered becomes the default font, and
    /// replacing the default font's entry moves the default along with it.
    /// Fails with `AlreadyExists` if `name` is taken by an alias.
    pub fn register_font(&self, name: &str, font: Arc<FontData>) -> Result<Option<Arc<FontData>>> {
        let key = normalize(name);
        let mut inner = self.inner.write();
        if let Some(Entry::Alias(_)) = inner.entries.get(&key) {
            return Err(GlyphCacheError::AlreadyExists(name.to_string()));
        }
        if inner.default_font.is_none() {
            inner.default_font = Some(Arc::clone(&font));
        }
        log::debug!("Registered font '{}' ({:?})", name, font);
        match inner.entries.insert(key, Entry::Font(Arc::clone(&font))) {
            Some(Entry::Font(previous)) => {
                // A replaced default follows its name to the new font
                let was_default = inner
                    .default_font
                    .as_ref()
                    .is_some_and(|d| Arc::ptr_eq(d, &previous));
                if was_default {
                    inner.default_font = Some(font);
                }
                Ok(Some(previous))
            },
            _ => Ok(None),
        }
    }

    /// Makes `alias` resolve to whatever `target` resolves to
    ///
    /// Fails with `AlreadyExists` when `alias` is already a font or alias.
    /// The target need not exist yet; resolution is checked on lookup.
    pub fn register_alias(&self, alias: &str, target: &str) -> Result<()> {
        let key = normalize(alias);
        let mut inner = self.inner.write();
        if inner.entries.contains_key(&key) {
            return Err(GlyphCacheError::AlreadyExists(alias.to_string()));
        }
        log::debug!("Registered alias '{}' -> '{}'", alias, target);
        inner.entries.insert(key, Entry::Alias(normalize(target)));
        Ok(())
    }

    /// Removes a font or alias; faces already created keep their data alive
    pub fn unregister(&self, name: &str) -> bool {
        let key = normalize(name);
        let mut inner = self.inner.write();
        match inner.entries.remove(&key) {
            Some(Entry::Font(font)) => {
                let was_default = inner
                    .default_font
                    .as_ref()
                    .is_some_and(|d| Arc::ptr_eq(d, &font));
                if was_default {
                    inner.default_font = None;
                }
                true
            },
            Some(Entry::Alias(_)) => true,
            None => false,
        }
    }

    /// Follows aliases to a font; `NotFound` for unknown names and cycles
    pub fn resolve(&self, name: &str) -> Result<Arc<FontData>> {
        let inner = self.inner.read();
        let mut current = normalize(name);
        let mut visited = HashSet::new();
        loop {
            if !visited.insert(current.clone()) {
                log::warn!("Alias cycle while resolving '{}'", name);
                return Err(GlyphCacheError::NotFound(format!(
                    "{} (alias cycle at '{}')",
                    name, current
                )));
            }
            match inner.entries.get(&current) {
                Some(Entry::Font(font)) => return Ok(Arc::clone(font)),
                Some(Entry::Alias(target)) => current = target.clone(),
                None => return Err(GlyphCacheError::NotFound(name.to_string())),
            }
        }
    }

    /// Resolves a family name, or the default font when there is none
    pub fn resolve_or_default(&self, name: Option<&str>) -> Result<Arc<FontData>> {
        match name {
            Some(name) => self.resolve(name),
            None => self
                .default_font()
                .ok_or_else(|| GlyphCacheError::NotFound("<default font>".to_string())),
        }
    }

    pub fn default_font(&self) -> Option<Arc<FontData>> {
        self.inner.read().default_font.clone()
    }

    /// Makes a registered name the default font
    pub fn set_default(&self, name: &str) -> Result<()> {
        let font = self.resolve(name)?;
        self.inner.write().default_font = Some(font);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().entries.contains_key(&normalize(name))
    }

    /// Registered font names (not aliases), sorted
    pub fn font_names(&self) -> Vec<String> {
        let inner = self.inner.read();
        let mut names: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| matches!(entry, Entry::Font(_)))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Registered aliases with their direct targets, sorted by alias
    pub fn aliases(&self) -> Vec<(String, String)> {
        let inner = self.inner.read();
        let mut aliases: Vec<(String, String)> = inner
            .entries
            .iter()
            .filter_map(|(name, entry)| match entry {
                Entry::Alias(target) => Some((name.clone(), target.clone())),
                Entry::Font(_) => None,
            })
            .collect();
        aliases.sort();
        aliases
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry and the default font
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.default_font = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font(family: &str) -> Arc<FontData> {
        FontData::new(vec![0; 4], 0, family, "Regular").into_shared()
    }

    #[test]
    fn test_resolve_direct_and_case_insensitive() {
        let registry = FontRegistry::new();
        let inter = font("Inter");
        registry.register_font("Inter", Arc::clone(&inter)).unwrap();

        let resolved = registry.resolve("  INTER ").unwrap();
        assert!(Arc::ptr_eq(&resolved, &inter));
    }

    #[test]
    fn test_alias_chain() {
        let registry = FontRegistry::new();
        registry.register_font("Noto Sans", font("Noto Sans")).unwrap();
        registry.register_alias("sans-serif", "ui").unwrap();
        registry.register_alias("ui", "Noto Sans").unwrap();

        let resolved = registry.resolve("sans-serif").unwrap();
        assert_eq!(resolved.family(), "Noto Sans");
        assert_eq!(
            registry.aliases(),
            vec![
                ("sans-serif".to_string(), "ui".to_string()),
                ("ui".to_string(), "noto sans".to_string()),
            ]
        );
    }

    #[test]
    fn test_cycle_is_not_found() {
        let registry = FontRegistry::new();
        registry.register_alias("a", "b").unwrap();
        registry.register_alias("b", "a").unwrap();
        assert!(matches!(
            registry.resolve("a"),
            Err(GlyphCacheError::NotFound(_))
        ));
    }

    #[test]
    fn test_dangling_alias_is_not_found() {
        let registry = FontRegistry::new();
        registry.register_alias("serif", "Missing").unwrap();
        assert!(matches!(
            registry.resolve("serif"),
            Err(GlyphCacheError::NotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_alias_already_exists() {
        let registry = FontRegistry::new();
        registry.register_font("Inter", font("Inter")).unwrap();
        registry.register_alias("ui", "Inter").unwrap();
        assert!(matches!(
            registry.register_alias("UI", "Inter"),
            Err(GlyphCacheError::AlreadyExists(_))
        ));
        assert!(matches!(
            registry.register_alias("inter", "ui"),
            Err(GlyphCacheError::AlreadyExists(_))
        ));
        assert!(matches!(
            registry.register_font("ui", font("Other")),
            Err(GlyphCacheError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_register_font_replaces() {
        let registry = FontRegistry::new();
        let first = font("A");
        registry.register_font("A", Arc::clone(&first)).unwrap();
        let previous = registry.register_font("A", font("A2")).unwrap();
        assert!(previous.is_some_and(|p| Arc::ptr_eq(&p, &first)));
        assert_eq!(registry.resolve("a").unwrap().family(), "A2");
    }

    #[test]
    fn test_replacing_default_moves_default() {
        let registry = FontRegistry::new();
        let first = font("A");
        registry.register_font("A", Arc::clone(&first)).unwrap();
        registry.register_font("B", font("B")).unwrap();
        let second = font("A2");
        registry.register_font("a", Arc::clone(&second)).unwrap();

        let default = registry.default_font().unwrap();
        assert!(Arc::ptr_eq(&default, &second));
        drop(default);
        // Nothing in the registry holds the replaced font any more
        assert_eq!(Arc::strong_count(&first), 1);

        assert!(registry.unregister("A"));
        assert!(registry.default_font().is_none());
        assert_eq!(registry.resolve("b").unwrap().family(), "B");
    }

    #[test]
    fn test_default_font() {
        let registry = FontRegistry::new();
        assert!(registry.resolve_or_default(None).is_err());

        registry.register_font("First", font("First")).unwrap();
        registry.register_font("Second", font("Second")).unwrap();
        assert_eq!(registry.resolve_or_default(None).unwrap().family(), "First");

        registry.set_default("second").unwrap();
        assert_eq!(registry.resolve_or_default(None).unwrap().family(), "Second");

        assert!(registry.unregister("Second"));
        assert!(registry.default_font().is_none());
        assert!(!registry.unregister("Second"));
    }

    #[test]
    fn test_unregister_drops_registry_reference() {
        let registry = FontRegistry::new();
        let data = font("Mono");
        registry.register_font("Mono", Arc::clone(&data)).unwrap();
        assert_eq!(Arc::strong_count(&data), 3); // ours, entry, default
        registry.unregister("mono");
        assert_eq!(Arc::strong_count(&data), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_font_names_sorted() {
        let registry = FontRegistry::new();
        registry.register_font("Zed", font("Zed")).unwrap();
        registry.register_font("Alpha", font("Alpha")).unwrap();
        registry.register_alias("mono", "Zed").unwrap();
        assert_eq!(registry.font_names(), vec!["alpha", "zed"]);
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("MONO"));
        registry.clear();
        assert!(registry.is_empty());
    }
}
