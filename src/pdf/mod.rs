//! # PDF Object Graph
//!
//! In-memory PDF objects and the serializer that lays them out as bytes.
//!
//! ## File structure
//!
//! ```text
//! %PDF-1.3            <- header + binary marker comment
//! 1 0 obj ... endobj  <- indirect objects, numbered in write order
//! 2 0 obj ... endobj
//! ...
//! xref                <- byte offset of every object
//! trailer             <- /Size /Root /Info [/ID]
//! startxref
//! %%EOF
//! ```
//!
//! Objects get an id from the document's [`IdAllocator`] when they are
//! created. Before writing, the document renumbers them 1..n in write order
//! (see [`writer::renumber`]) so the xref table is always a dense, ascending
//! list whose offsets match what was emitted.

pub mod blocks;
pub mod content;
pub mod font;
pub mod image;
pub mod object;
pub mod page;
pub mod resources;
pub mod to_unicode;
pub mod writer;

pub use blocks::{Catalog, Contents, Eof, Header, Info, Metadata, PageLayout, PageMode, Pages, Trailer, Xref};
pub use content::ContentStream;
pub use font::{FontResource, TrueTypeFont, Type0Font, Type1Font};
pub use image::{ColorSpace, XObjectImage};
pub use object::{Dictionary, Filter, IdAllocator, IndirectObject, ObjectId, Stream, Value};
pub use page::{Page, PageGeometry};
pub use resources::Resources;
pub use writer::Writer;
