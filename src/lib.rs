//! # Folio
//!
//! An in-memory PDF writer with TrueType, OpenType and WOFF font embedding.
//!
//! Folio takes pages of pre-positioned text runs and images and serializes
//! them to PDF bytes. Embedded fonts are subset to the characters a
//! document actually draws; images are split into color and soft-mask
//! streams in RGB or CMYK.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]    : JSON document: fonts, pages, elements
//!       ↓
//!   [loader]   : source bytes → fonts, RGBA images (cached)
//!       ↓
//!   [document] : object ids, resource collection, subsetting
//!       ↓                ↘
//!   [pdf]                [font]
//!   object graph,        sfnt parse, cmap, subset,
//!   writer, xref         re-encode
//! ```

pub mod asset;
pub mod color;
pub mod document;
pub mod element;
pub mod error;
pub mod font;
pub mod loader;
pub mod model;
pub mod pdf;

pub use color::{Color, ColorMode};
pub use document::{Document, DocumentOptions, FontEmbedding};
pub use element::{Element, ImagePlacement, TextDecoration, TextRun};
pub use error::{FolioError, Result};
pub use font::FontStyle;
pub use loader::Loader;
pub use pdf::{Metadata, PageGeometry};

/// Render a JSON-model document to PDF bytes.
pub fn render(document: &model::Document) -> Result<Vec<u8>> {
    render_with(document, &Loader::new())
}

/// Like [`render`], reusing fonts and images `loader` has already decoded.
pub fn render_with(document: &model::Document, loader: &Loader) -> Result<Vec<u8>> {
    document.build(loader)?.generate()
}

/// Render a document described as JSON to PDF bytes.
pub fn render_json(json: &str) -> Result<Vec<u8>> {
    let document: model::Document = serde_json::from_str(json)?;
    render(&document)
}
