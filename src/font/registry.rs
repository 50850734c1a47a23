//! Family + style lookup over the fonts a document has registered.

use indexmap::IndexMap;

use super::standard::{FontStyle, StandardFont};
use crate::error::{FolioError, Result};
use crate::pdf::font::{FontResource, Type1Font};
use crate::pdf::object::{IdAllocator, ObjectId};

/// Registry key: the family name lowercased, plus the style.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontKey {
    pub family: String,
    pub style: FontStyle,
}

impl FontKey {
    pub fn new(family: &str, style: FontStyle) -> Self {
        Self {
            family: family.trim().to_lowercase(),
            style,
        }
    }
}

/// How a text run's font request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedFont {
    pub id: ObjectId,
    /// The regular face stands in for a missing italic, slanted with a text
    /// matrix skew.
    pub synthetic_italic: bool,
    /// The default font stands in for an unknown family.
    pub substituted: bool,
}

/// All fonts of one document, in registration order.
#[derive(Debug, Clone, Default)]
pub struct FontRegistry {
    fonts: IndexMap<FontKey, FontResource>,
}

impl FontRegistry {
    /// A registry holding the 14 standard fonts, so Helvetica is always
    /// available as a fallback.
    pub fn with_standard_fonts(ids: &mut IdAllocator) -> Self {
        let mut registry = Self::default();
        for font in StandardFont::ALL {
            registry.insert(
                FontKey::new(font.family(), font.style()),
                FontResource::Type1(Type1Font {
                    id: ids.next_id(),
                    font,
                }),
            );
        }
        registry
    }

    /// Register `font` under `key`. An existing entry wins; its id is
    /// returned and `font` is dropped.
    pub fn insert(&mut self, key: FontKey, font: FontResource) -> ObjectId {
        if let Some(existing) = self.fonts.get(&key) {
            return existing.id();
        }
        let id = font.id();
        self.fonts.insert(key, font);
        id
    }

    pub fn contains(&self, key: &FontKey) -> bool {
        self.fonts.contains_key(key)
    }

    pub fn id_of(&self, key: &FontKey) -> Option<ObjectId> {
        self.fonts.get(key).map(FontResource::id)
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn get(&self, id: ObjectId) -> Option<&FontResource> {
        self.fonts.values().find(|f| f.id() == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut FontResource> {
        self.fonts.values_mut().find(|f| f.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FontKey, &FontResource)> {
        self.fonts.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut FontResource> {
        self.fonts.values_mut()
    }

    /// Resolve a family and style.
    ///
    /// Lookup order: the exact face; the family's regular face (slanted when
    /// italic was asked for); a standard font by name. Only when `fallback`
    /// is set: the standard font closest to a common family such as `Arial`
    /// or `serif`, else Helvetica.
    pub fn resolve(&self, family: &str, style: FontStyle, fallback: bool) -> Result<ResolvedFont> {
        let exact = FontKey::new(family, style);
        if let Some(font) = self.fonts.get(&exact) {
            return Ok(ResolvedFont {
                id: font.id(),
                synthetic_italic: false,
                substituted: false,
            });
        }

        let regular = FontKey::new(family, FontStyle::Normal);
        if let Some(font) = self.fonts.get(&regular) {
            if !matches!(font, FontResource::Type1(_)) {
                return Ok(ResolvedFont {
                    id: font.id(),
                    synthetic_italic: style.is_italic(),
                    substituted: false,
                });
            }
        }

        if let Some(id) = StandardFont::resolve(family, style).and_then(|f| self.standard(f)) {
            return Ok(ResolvedFont {
                id,
                synthetic_italic: false,
                substituted: false,
            });
        }

        if fallback {
            let substitute = StandardFont::resolve_alias(family, style)
                .or_else(|| StandardFont::resolve("helvetica", style))
                .unwrap_or(StandardFont::Helvetica);
            if let Some(id) = self.standard(substitute) {
                return Ok(ResolvedFont {
                    id,
                    synthetic_italic: false,
                    substituted: true,
                });
            }
        }

        Err(FolioError::MissingResource(format!(
            "font family '{}' ({:?})",
            family, style
        )))
    }

    fn standard(&self, font: StandardFont) -> Option<ObjectId> {
        self.fonts
            .get(&FontKey::new(font.family(), font.style()))
            .map(FontResource::id)
    }
}
