//! # Document Model
//!
//! JSON input for the `folio` binary and [`crate::render_json`]. A document
//! lists the fonts to embed and the pages to draw; each page carries
//! elements already positioned by whatever laid it out.
//!
//! ```json
//! {
//!   "metadata": { "title": "Hello" },
//!   "colorMode": "rgb",
//!   "fonts": [{ "family": "Inter", "style": "bold", "src": "./Inter-Bold.ttf" }],
//!   "pages": [{
//!     "size": "Letter",
//!     "elements": [{ "type": "Text", "content": "Hi", "x": 72, "y": 72, "fontFamily": "Inter", "fontStyle": "bold" }]
//!   }]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::color::ColorMode;
use crate::document::{Document as PdfDocument, DocumentOptions, FontEmbedding};
use crate::element::{Element, ResourceKey};
use crate::error::Result;
use crate::font::FontStyle;
use crate::loader::Loader;
use crate::pdf::blocks::{Metadata, PageLayout, PageMode};
use crate::pdf::page::{PageBox, PageGeometry};

/// A complete document ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default)]
    pub color_mode: ColorMode,

    #[serde(default = "default_true")]
    pub compress: bool,

    #[serde(default = "default_true")]
    pub subset_fonts: bool,

    /// Draw text in Helvetica when its family is not registered.
    #[serde(default)]
    pub font_fallback: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_layout: Option<PageLayout>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_mode: Option<PageMode>,

    /// Hex document id for the trailer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Fonts to embed, in addition to the 14 standard fonts.
    #[serde(default)]
    pub fonts: Vec<FontEntry>,

    pub pages: Vec<PageConfig>,
}

fn default_true() -> bool {
    true
}

/// A font file to register with the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontEntry {
    /// Family name elements refer to (e.g. "Inter", "Roboto").
    pub family: String,
    #[serde(default)]
    pub style: FontStyle,
    /// File path, data URI or base64 of a TTF, OTF or WOFF file.
    pub src: String,
    #[serde(default)]
    pub embedding: FontEmbedding,
}

/// One page and what is drawn on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageConfig {
    #[serde(default)]
    pub size: PageSize,

    #[serde(default)]
    pub landscape: bool,

    #[serde(default)]
    pub rotate: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_box: Option<PageBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bleed_box: Option<PageBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim_box: Option<PageBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art_box: Option<PageBox>,

    #[serde(default = "default_user_unit")]
    pub user_unit: f64,

    #[serde(default)]
    pub elements: Vec<Element>,
}

fn default_user_unit() -> f64 {
    1.0
}

impl PageConfig {
    pub fn geometry(&self) -> PageGeometry {
        let (mut width, mut height) = self.size.dimensions();
        if self.landscape {
            std::mem::swap(&mut width, &mut height);
        }
        PageGeometry {
            crop_box: self.crop_box,
            bleed_box: self.bleed_box,
            trim_box: self.trim_box,
            art_box: self.art_box,
            user_unit: self.user_unit,
            ..PageGeometry::new(width, height).rotated(self.rotate)
        }
    }
}

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A3 => (841.89, 1190.55),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Tabloid => (792.0, 1224.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

impl Document {
    pub fn options(&self) -> DocumentOptions {
        DocumentOptions {
            color_mode: self.color_mode,
            compress_contents: self.compress,
            font_fallback: self.font_fallback,
            subset_fonts: self.subset_fonts,
            metadata: self.metadata.clone(),
            page_layout: self.page_layout,
            page_mode: self.page_mode,
            id: self.id.clone(),
        }
    }

    /// Load every font and image the document refers to through `loader`,
    /// then lay the pages out into a [`PdfDocument`].
    pub fn build(&self, loader: &Loader) -> Result<PdfDocument> {
        let mut doc = PdfDocument::new(self.options());

        for font in &self.fonts {
            let data = loader.load_font(&font.src)?;
            doc.register_font(&font.family, font.style, &data, font.embedding)?;
        }

        for page in &self.pages {
            doc.add_page(page.geometry());
            for element in &page.elements {
                for key in element.resource_keys() {
                    if let ResourceKey::Image(src) = key {
                        if !doc.has_image(&src) {
                            let image = loader.load_image(&src)?;
                            doc.register_image(&src, image.width, image.height, &image.rgba)?;
                        }
                    }
                }
                doc.add_element(element.clone());
            }
        }
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_document_defaults() {
        let doc: Document = serde_json::from_str(r#"{ "pages": [{}] }"#).unwrap();
        assert!(doc.compress);
        assert!(doc.subset_fonts);
        assert!(!doc.font_fallback);
        assert_eq!(doc.color_mode, ColorMode::Rgb);
        let geometry = doc.pages[0].geometry();
        assert_eq!((geometry.width, geometry.height), (595.28, 841.89));
        assert_eq!(geometry.user_unit, 1.0);
    }

    #[test]
    fn test_page_options() {
        let json = r#"{
            "colorMode": "cmyk",
            "pageLayout": "OneColumn",
            "pageMode": "UseOC",
            "pages": [{
                "size": { "Custom": { "width": 300, "height": 400 } },
                "landscape": true,
                "rotate": 180,
                "bleedBox": [0, 0, 410, 310],
                "userUnit": 1.5
            }]
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        let options = doc.options();
        assert_eq!(options.color_mode, ColorMode::Cmyk);
        assert_eq!(options.page_layout, Some(PageLayout::OneColumn));
        assert_eq!(options.page_mode, Some(PageMode::UseOc));

        let geometry = doc.pages[0].geometry();
        assert_eq!((geometry.width, geometry.height), (400.0, 300.0));
        assert_eq!(geometry.rotate, 180);
        assert_eq!(geometry.bleed_box, Some([0.0, 0.0, 410.0, 310.0]));
        assert_eq!(geometry.user_unit, 1.5);
    }

    #[test]
    fn test_font_entries() {
        let json = r#"{
            "fonts": [
                { "family": "Inter", "src": "AAEAAA==" },
                { "family": "Inter", "style": "bolditalic", "src": "AAEAAA==", "embedding": "simple" }
            ],
            "pages": []
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.fonts[0].style, FontStyle::Normal);
        assert_eq!(doc.fonts[0].embedding, FontEmbedding::Composite);
        assert_eq!(doc.fonts[1].style, FontStyle::BoldItalic);
        assert_eq!(doc.fonts[1].embedding, FontEmbedding::Simple);
    }

    #[test]
    fn test_metadata_dates() {
        let json = r#"{
            "metadata": { "title": "Report", "creationDate": "2024-05-01T09:30:00+02:00" },
            "pages": []
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.metadata.title.as_deref(), Some("Report"));
        let date = doc.metadata.creation_date.unwrap();
        assert_eq!(date.offset().local_minus_utc(), 7200);
    }

    #[test]
    fn test_unloadable_font_aborts_build() {
        let json = r#"{ "fonts": [{ "family": "X", "src": "!!!" }], "pages": [] }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert!(doc.build(&Loader::new()).is_err());
    }
}
