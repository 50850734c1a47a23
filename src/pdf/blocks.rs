//! Structural blocks: the fixed-role objects and sections that frame
//! every document.
//!
//! ```text
//! %PDF-1.3            <- Header
//! N 0 obj ... endobj  <- pages, resources, fonts, images, Info, Catalog
//! xref                <- Xref
//! trailer             <- Trailer
//! startxref ... %%EOF <- Eof
//! ```

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::object::{Dictionary, IndirectObject, ObjectId, Stream, Value};
use super::writer::Writer;
use crate::error::Result;

pub const PDF_VERSION: &str = "1.3";

/// `%PDF-1.3` plus a comment of high bytes marking the file as binary.
pub struct Header;

impl Header {
    pub fn write_to(&self, writer: &mut Writer) {
        writer.write(format!("%PDF-{}", PDF_VERSION));
        writer.write(b"%\xBA\xDF\xAC\xE0");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageLayout {
    SinglePage,
    OneColumn,
    TwoColumnLeft,
    TwoColumnRight,
    TwoPageLeft,
    TwoPageRight,
}

impl PageLayout {
    fn pdf_name(self) -> &'static str {
        match self {
            PageLayout::SinglePage => "SinglePage",
            PageLayout::OneColumn => "OneColumn",
            PageLayout::TwoColumnLeft => "TwoColumnLeft",
            PageLayout::TwoColumnRight => "TwoColumnRight",
            PageLayout::TwoPageLeft => "TwoPageLeft",
            PageLayout::TwoPageRight => "TwoPageRight",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageMode {
    UseNone,
    UseOutlines,
    UseThumbs,
    FullScreen,
    #[serde(rename = "UseOC")]
    UseOc,
    UseAttachments,
}

impl PageMode {
    fn pdf_name(self) -> &'static str {
        match self {
            PageMode::UseNone => "UseNone",
            PageMode::UseOutlines => "UseOutlines",
            PageMode::UseThumbs => "UseThumbs",
            PageMode::FullScreen => "FullScreen",
            PageMode::UseOc => "UseOC",
            PageMode::UseAttachments => "UseAttachments",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    pub id: ObjectId,
    pub page_layout: Option<PageLayout>,
    pub page_mode: Option<PageMode>,
}

impl Catalog {
    pub fn to_object(&self, pages: ObjectId) -> IndirectObject {
        let mut dict = Dictionary::typed("Catalog");
        dict.set("Pages", pages)
            .set_opt("PageLayout", self.page_layout.map(|l| Value::name(l.pdf_name())))
            .set_opt("PageMode", self.page_mode.map(|m| Value::name(m.pdf_name())));
        IndirectObject::new(self.id, dict)
    }
}

/// The page tree root. All pages hang directly off it.
#[derive(Debug, Clone)]
pub struct Pages {
    pub id: ObjectId,
}

impl Pages {
    pub fn to_object(&self, kids: &[ObjectId]) -> IndirectObject {
        let mut dict = Dictionary::typed("Pages");
        dict.set("Count", kids.len()).set("Kids", kids.to_vec());
        IndirectObject::new(self.id, dict)
    }
}

/// Document information dictionary fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Metadata {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<DateTime<FixedOffset>>,
    pub mod_date: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone)]
pub struct Info {
    pub id: ObjectId,
    /// Fallback for unset dates, fixed when the document is created.
    pub now: DateTime<FixedOffset>,
}

impl Info {
    pub fn to_object(&self, metadata: &Metadata) -> IndirectObject {
        let producer = format!("folio {}", env!("CARGO_PKG_VERSION"));
        let mut dict = Dictionary::new();
        dict.set_opt("Title", metadata.title.clone())
            .set_opt("Subject", metadata.subject.clone())
            .set_opt("Keywords", metadata.keywords.clone())
            .set_opt("Author", metadata.author.clone())
            .set("CreationDate", metadata.creation_date.unwrap_or(self.now))
            .set("ModDate", metadata.mod_date.unwrap_or(self.now))
            .set("Creator", metadata.creator.clone().unwrap_or_else(|| producer.clone()))
            .set("Producer", metadata.producer.clone().unwrap_or(producer));
        IndirectObject::new(self.id, dict)
    }
}

/// A page content stream.
#[derive(Debug, Clone)]
pub struct Contents {
    pub id: ObjectId,
}

impl Contents {
    /// Default line width and stroke color precede the page operators.
    pub const PROLOGUE: &'static [u8] = b"1 w\n0 G\n";

    pub fn to_object(&self, operators: &[u8], compress: bool) -> IndirectObject {
        let mut data = Vec::with_capacity(Self::PROLOGUE.len() + operators.len());
        data.extend_from_slice(Self::PROLOGUE);
        data.extend_from_slice(operators);
        let stream = if compress {
            Stream::deflated(&data)
        } else {
            Stream::raw(data)
        };
        IndirectObject::with_stream(self.id, Dictionary::new(), stream)
    }
}

/// The cross-reference table over everything the writer has emitted.
pub struct Xref;

impl Xref {
    /// Returns the byte offset of the `xref` keyword for [`Eof`]. Fails if
    /// any written object references one that was never written.
    pub fn write_to(&self, writer: &mut Writer) -> Result<usize> {
        writer.check_references()?;
        writer.mark_xref();
        let offset = writer.len();
        let offsets: Vec<usize> = writer.offsets().iter().map(|(_, at)| *at).collect();

        writer.write("xref");
        writer.write(format!("0 {}", offsets.len() + 2));
        writer.write("0000000000 65535 f ");
        for at in offsets {
            writer.write(format!("{:010} 00000 n ", at));
        }
        Ok(offset)
    }
}

#[derive(Debug, Clone)]
pub struct Trailer {
    pub root: ObjectId,
    pub info: ObjectId,
    /// Hex document id, written twice as `/ID [<id> <id>]`.
    pub id: Option<String>,
}

impl Trailer {
    pub fn write_to(&self, writer: &mut Writer) -> Result<()> {
        writer.note_reference(self.root);
        writer.note_reference(self.info);
        writer.check_references()?;

        let mut dict = Dictionary::new();
        dict.set("Size", writer.object_count() + 2)
            .set("Root", self.root)
            .set("Info", self.info)
            .set_opt(
                "ID",
                self.id.as_ref().map(|id| {
                    let token = format!("<{}>", id);
                    Value::Array(vec![Value::string(token.clone()), Value::string(token)])
                }),
            );
        writer.write("trailer");
        writer.write(dict.to_pdf());
        Ok(())
    }
}

pub struct Eof {
    pub xref_offset: usize,
}

impl Eof {
    pub fn write_to(&self, writer: &mut Writer) {
        writer.write("startxref");
        writer.write(self.xref_offset.to_string());
        writer.write("%%EOF");
    }
}
