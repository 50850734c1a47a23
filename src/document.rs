//! # Document
//!
//! Owns every object of one PDF and drives generation:
//!
//! ```text
//! collect   page resources + characters per Type0 font
//! subset    Type0::update_font_data, once, after all text is known
//! build     pages (Resources, Contents, Page), Pages, fonts, images,
//!           Info, Catalog
//! renumber  1..n in that order
//! write     header, objects, xref, trailer, startxref/%%EOF
//! ```
//!
//! Object ids come from one allocator per document and are handed out when
//! objects are created. Generation never allocates, so calling
//! [`Document::generate`] twice yields identical bytes.

use chrono::{DateTime, FixedOffset, Local};
use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::color::ColorMode;
use crate::element::{Element, RenderContext, ResourceKey};
use crate::error::{FolioError, Result};
use crate::font::{FontKey, FontRegistry, FontStyle, ParsedFont};
use crate::pdf::blocks::{Catalog, Eof, Header, Info, Metadata, PageLayout, PageMode, Pages, Trailer, Xref};
use crate::pdf::content::ContentStream;
use crate::pdf::font::{sanitize_font_name, FontResource, TrueTypeFont, Type0Font};
use crate::pdf::image::XObjectImage;
use crate::pdf::object::{IdAllocator, IndirectObject, ObjectId};
use crate::pdf::page::{Page, PageGeometry};
use crate::pdf::writer::{renumber, Writer};

/// How an embedded font is exposed to PDF readers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontEmbedding {
    /// Type0 over a CIDFontType2, 2-byte glyph ids, subset on write.
    #[default]
    Composite,
    /// TrueType over WinAnsiEncoding, full program embedded.
    Simple,
}

/// Document-wide settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentOptions {
    pub color_mode: ColorMode,
    pub compress_contents: bool,
    /// Substitute Helvetica for font families that are not registered
    /// instead of failing.
    pub font_fallback: bool,
    pub subset_fonts: bool,
    pub metadata: Metadata,
    pub page_layout: Option<PageLayout>,
    pub page_mode: Option<PageMode>,
    /// Hex document id for the trailer `/ID`.
    pub id: Option<String>,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            color_mode: ColorMode::Rgb,
            compress_contents: true,
            font_fallback: false,
            subset_fonts: true,
            metadata: Metadata::default(),
            page_layout: None,
            page_mode: None,
            id: None,
        }
    }
}

impl DocumentOptions {
    pub fn color_mode(mut self, mode: ColorMode) -> Self {
        self.color_mode = mode;
        self
    }

    pub fn compress_contents(mut self, compress: bool) -> Self {
        self.compress_contents = compress;
        self
    }

    pub fn font_fallback(mut self, fallback: bool) -> Self {
        self.font_fallback = fallback;
        self
    }

    pub fn subset_fonts(mut self, subset: bool) -> Self {
        self.subset_fonts = subset;
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn page_layout(mut self, layout: PageLayout) -> Self {
        self.page_layout = Some(layout);
        self
    }

    pub fn page_mode(mut self, mode: PageMode) -> Self {
        self.page_mode = Some(mode);
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

struct PageEntry {
    page: Page,
    elements: Vec<Element>,
}

pub struct Document {
    options: DocumentOptions,
    ids: IdAllocator,
    catalog: Catalog,
    pages_root: Pages,
    info: Info,
    fonts: FontRegistry,
    images: IndexMap<String, XObjectImage>,
    pages: Vec<PageEntry>,
}

impl Document {
    pub fn new(options: DocumentOptions) -> Self {
        Self::with_now(options, Local::now().fixed_offset())
    }

    /// A document whose unset Info dates are `now`.
    pub fn with_now(options: DocumentOptions, now: DateTime<FixedOffset>) -> Self {
        let mut ids = IdAllocator::new();
        let catalog = Catalog {
            id: ids.next_id(),
            page_layout: options.page_layout,
            page_mode: options.page_mode,
        };
        let pages_root = Pages { id: ids.next_id() };
        let info = Info { id: ids.next_id(), now };
        let fonts = FontRegistry::with_standard_fonts(&mut ids);
        Self {
            options,
            ids,
            catalog,
            pages_root,
            info,
            fonts,
            images: IndexMap::new(),
            pages: Vec::new(),
        }
    }

    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Parse and register a font file under `family` and `style`. A face
    /// that is already registered keeps its first font.
    pub fn register_font(
        &mut self,
        family: &str,
        style: FontStyle,
        data: &[u8],
        embedding: FontEmbedding,
    ) -> Result<ObjectId> {
        let key = FontKey::new(family, style);
        if let Some(id) = self.fonts.id_of(&key) {
            return Ok(id);
        }
        let parsed = ParsedFont::parse(data)?;
        let name = sanitize_font_name(family, style);
        let font = match embedding {
            FontEmbedding::Composite => FontResource::Type0(Type0Font::new(&mut self.ids, name, parsed)),
            FontEmbedding::Simple => FontResource::TrueType(TrueTypeFont::new(&mut self.ids, name, parsed)),
        };
        debug!("registered font {} as {:?}", font.base_font(), embedding);
        Ok(self.fonts.insert(key, font))
    }

    /// Register RGBA8 pixels under `key`. Images are split into color and
    /// soft-mask streams now, in the document's color mode.
    pub fn register_image(&mut self, key: &str, width: u32, height: u32, rgba: &[u8]) -> Result<ObjectId> {
        if let Some(image) = self.images.get(key) {
            return Ok(image.id);
        }
        let image = XObjectImage::from_rgba(&mut self.ids, width, height, rgba, self.options.color_mode)?;
        let id = image.id;
        self.images.insert(key.to_string(), image);
        Ok(id)
    }

    /// Make pixels of one exact color transparent in a registered image.
    /// Components are in the document's color mode.
    pub fn set_image_color_key(&mut self, key: &str, color_key: &[u8]) -> Result<()> {
        let image = self
            .images
            .get_mut(key)
            .ok_or_else(|| FolioError::MissingResource(format!("image '{}'", key)))?;
        image.set_color_key(color_key)
    }

    pub fn has_image(&self, key: &str) -> bool {
        self.images.contains_key(key)
    }

    /// Start a new page; following elements land on it.
    pub fn add_page(&mut self, geometry: PageGeometry) -> usize {
        let page = Page::new(&mut self.ids, geometry);
        self.pages.push(PageEntry {
            page,
            elements: Vec::new(),
        });
        self.pages.len() - 1
    }

    /// Append to the last page, starting an A4 page if there is none.
    pub fn add_element(&mut self, element: Element) {
        if self.pages.is_empty() {
            self.add_page(PageGeometry::default());
        }
        if let Some(entry) = self.pages.last_mut() {
            entry.elements.push(element);
        }
    }

    /// Serialize the whole document. Any error aborts generation; no
    /// partial output is returned.
    pub fn generate(&mut self) -> Result<Vec<u8>> {
        let (used_fonts, used_images) = self.collect_resources()?;

        for id in &used_fonts {
            if let Some(FontResource::Type0(font)) = self.fonts.get_mut(*id) {
                font.update_font_data(self.options.subset_fonts);
            }
        }

        let mut objects = self.build_objects(&used_fonts, &used_images)?;
        let numbers = renumber(&mut objects)?;
        let lookup = |id: ObjectId| numbers.get(&id).copied().ok_or(FolioError::DanglingReference(id.number()));
        let root = lookup(self.catalog.id)?;
        let info = lookup(self.info.id)?;

        let mut writer = Writer::new();
        Header.write_to(&mut writer);
        for object in &objects {
            writer.write_object(object)?;
        }
        let xref_offset = Xref.write_to(&mut writer)?;
        Trailer {
            root,
            info,
            id: self.options.id.as_deref().map(document_id),
        }
        .write_to(&mut writer)?;
        Eof { xref_offset }.write_to(&mut writer);

        info!(
            "generated {} pages, {} objects, {} bytes",
            self.pages.len(),
            writer.object_count(),
            writer.len()
        );
        Ok(writer.into_bytes())
    }

    /// Fill each page's resources and each Type0 font's character set.
    /// Returns fonts and images in first-use order.
    fn collect_resources(&mut self) -> Result<(IndexSet<ObjectId>, IndexSet<String>)> {
        for font in self.fonts.iter_mut() {
            if let FontResource::Type0(font) = font {
                font.reset_subset();
            }
        }

        let mut used_fonts = IndexSet::new();
        let mut used_images = IndexSet::new();
        for entry in &mut self.pages {
            entry.page.resources.clear();
            for element in &entry.elements {
                for key in element.resource_keys() {
                    match key {
                        ResourceKey::Font { family, style } => {
                            let resolved = self.fonts.resolve(&family, style, self.options.font_fallback)?;
                            if resolved.substituted {
                                let substitute = self.fonts.get(resolved.id).map_or("Helvetica", |f| f.base_font());
                                warn!("font family '{}' is not registered; substituting {}", family, substitute);
                            }
                            entry.page.resources.add_font(resolved.id);
                            used_fonts.insert(resolved.id);
                            if let (Some(FontResource::Type0(font)), Some(text)) =
                                (self.fonts.get_mut(resolved.id), element.text())
                            {
                                font.add_chars(text);
                            }
                        }
                        ResourceKey::Image(src) => {
                            let image = self
                                .images
                                .get(&src)
                                .ok_or_else(|| FolioError::MissingResource(format!("image '{}'", src)))?;
                            entry.page.resources.add_image(image.id);
                            used_images.insert(src);
                        }
                    }
                }
            }
        }

        let unused = self.fonts.len() - used_fonts.len();
        if unused > 0 {
            debug!("{} registered fonts are unused and will not be written", unused);
        }
        Ok((used_fonts, used_images))
    }

    fn build_objects(&self, used_fonts: &IndexSet<ObjectId>, used_images: &IndexSet<String>) -> Result<Vec<IndirectObject>> {
        let mut objects = Vec::new();
        let mut kids = Vec::with_capacity(self.pages.len());
        for entry in &self.pages {
            let ctx = RenderContext {
                page_height: entry.page.geometry.height,
                color_mode: self.options.color_mode,
                font_fallback: self.options.font_fallback,
                fonts: &self.fonts,
                images: &self.images,
            };
            let mut content = ContentStream::new();
            for element in &entry.elements {
                element.write_to(&mut content, &ctx)?;
            }
            objects.extend(
                entry
                    .page
                    .objects(self.pages_root.id, content.as_bytes(), self.options.compress_contents),
            );
            kids.push(entry.page.id);
        }
        if kids.is_empty() {
            warn!("document has no pages");
        }
        objects.push(self.pages_root.to_object(&kids));

        for id in used_fonts {
            let font = self
                .fonts
                .get(*id)
                .ok_or_else(|| FolioError::MissingResource(format!("font object {}", id.number())))?;
            objects.extend(font.objects());
        }
        for key in used_images {
            if let Some(image) = self.images.get(key) {
                objects.extend(image.objects());
            }
        }

        objects.push(self.info.to_object(&self.options.metadata));
        objects.push(self.catalog.to_object(self.pages_root.id));
        Ok(objects)
    }
}

/// Hex ids pass through; anything else is hex-encoded byte by byte.
fn document_id(id: &str) -> String {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_hexdigit()) {
        id.to_ascii_uppercase()
    } else {
        id.bytes().map(|b| format!("{:02X}", b)).collect()
    }
}
