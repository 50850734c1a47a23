//! # Font Resources
//!
//! The PDF side of fonts. Standard fonts are simple Type1 references.
//! Embedded fonts come in two shapes:
//!
//! - `TrueType`: a simple font over WinAnsiEncoding with a `/Widths` array,
//!   embedding the whole font program.
//! - `Type0`: a composite font with Identity-H encoding over one
//!   CIDFontType2 descendant. Text is written as 2-byte glyph ids and the
//!   font program is subset to the characters the document uses.
//!
//! Embedded fonts write their children before themselves:
//! ToUnicode, FontFile2, FontDescriptor, [CIDFont,] font.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};

use super::object::{Dictionary, IdAllocator, IndirectObject, ObjectId, Stream, Value};
use super::to_unicode::{CodeSpace, ToUnicode};
use crate::font::standard::{encode_winansi_literal, winansi_to_unicode};
use crate::font::{FontMetrics, FontStyle, ParsedFont, StandardFont};

const FIRST_CHAR: u8 = 32;
const LAST_CHAR: u8 = 255;

/// PostScript-safe font name: alphanumerics, `-` and `_`, plus a style
/// suffix.
pub fn sanitize_font_name(family: &str, style: FontStyle) -> String {
    let mut name: String = family
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    if name.is_empty() {
        name = "CustomFont".to_string();
    }

    match style {
        FontStyle::Normal => {}
        FontStyle::Bold => name.push_str("-Bold"),
        FontStyle::Italic => name.push_str("-Italic"),
        FontStyle::BoldItalic => name.push_str("-BoldItalic"),
    }
    name
}

/// A font as it appears in a page's `/Font` resources.
#[derive(Debug, Clone)]
pub enum FontResource {
    Type1(Type1Font),
    TrueType(TrueTypeFont),
    Type0(Type0Font),
}

impl FontResource {
    pub fn id(&self) -> ObjectId {
        match self {
            FontResource::Type1(f) => f.id,
            FontResource::TrueType(f) => f.id,
            FontResource::Type0(f) => f.id,
        }
    }

    pub fn resource_name(&self) -> String {
        self.id().resource_name()
    }

    pub fn base_font(&self) -> &str {
        match self {
            FontResource::Type1(f) => f.font.pdf_name(),
            FontResource::TrueType(f) => &f.name,
            FontResource::Type0(f) => &f.name,
        }
    }

    /// Text as a `Tj` operand in this font's encoding.
    pub fn encode_text(&self, text: &str) -> String {
        match self {
            FontResource::Type1(_) | FontResource::TrueType(_) => {
                format!("({})", encode_winansi_literal(text))
            }
            FontResource::Type0(f) => f.encode_text(text),
        }
    }

    /// Width of `text` in points, when the font carries metrics. Standard
    /// fonts ship none.
    pub fn measure(&self, text: &str, font_size: f64, letter_spacing: f64) -> Option<f64> {
        match self {
            FontResource::Type1(_) => None,
            FontResource::TrueType(f) => Some(f.font.metrics().measure_string(text, font_size, letter_spacing)),
            FontResource::Type0(f) => Some(f.source.metrics().measure_string(text, font_size, letter_spacing)),
        }
    }

    pub fn objects(&self) -> Vec<IndirectObject> {
        match self {
            FontResource::Type1(f) => vec![f.to_object()],
            FontResource::TrueType(f) => f.objects(),
            FontResource::Type0(f) => f.objects(),
        }
    }
}

/// `/Type /Font /Subtype /<subtype> /BaseFont /<name>`
fn font_dictionary(subtype: &str, base_font: &str) -> Dictionary {
    let mut dict = Dictionary::typed("Font");
    dict.set("Subtype", Value::name(subtype))
        .set("BaseFont", Value::name(base_font));
    dict
}

#[derive(Debug, Clone)]
pub struct Type1Font {
    pub id: ObjectId,
    pub font: StandardFont,
}

impl Type1Font {
    pub fn to_object(&self) -> IndirectObject {
        let mut dict = font_dictionary("Type1", self.font.pdf_name());
        if self.font.uses_winansi() {
            dict.set("Encoding", Value::name("WinAnsiEncoding"));
        }
        dict.set("FirstChar", FIRST_CHAR as u32)
            .set("LastChar", LAST_CHAR as u32);
        IndirectObject::new(self.id, dict)
    }
}

/// Metrics plus the embedded program (`/FontFile2`, deflated, with
/// `/Length1` holding the unfiltered size).
#[derive(Debug, Clone)]
pub struct FontDescriptor {
    pub id: ObjectId,
    pub font_file: ObjectId,
}

impl FontDescriptor {
    fn new(ids: &mut IdAllocator) -> Self {
        Self {
            font_file: ids.next_id(),
            id: ids.next_id(),
        }
    }

    fn objects(&self, font_name: &str, metrics: &FontMetrics, program: &[u8]) -> Vec<IndirectObject> {
        let stream = Stream::deflated(program);
        let mut file_dict = Dictionary::new();
        file_dict.set("Length1", stream.raw_len());
        let font_file = IndirectObject::with_stream(self.font_file, file_dict, stream);

        let mut dict = Dictionary::typed("FontDescriptor");
        dict.set("FontName", Value::name(font_name))
            .set("Flags", metrics.flags)
            .set("FontBBox", Value::numbers(metrics.bbox))
            .set("ItalicAngle", metrics.italic_angle)
            .set("Ascent", metrics.ascent)
            .set("Descent", metrics.descent)
            .set("CapHeight", metrics.cap_height)
            .set("StemV", 0)
            .set("FontFile2", self.font_file);
        vec![font_file, IndirectObject::new(self.id, dict)]
    }
}

/// A simple embedded TrueType font addressed through WinAnsiEncoding.
#[derive(Debug, Clone)]
pub struct TrueTypeFont {
    pub id: ObjectId,
    pub name: String,
    pub font: ParsedFont,
    descriptor: FontDescriptor,
    to_unicode: ToUnicode,
}

impl TrueTypeFont {
    pub fn new(ids: &mut IdAllocator, name: String, font: ParsedFont) -> Self {
        let to_unicode = ToUnicode { id: ids.next_id() };
        let descriptor = FontDescriptor::new(ids);
        Self {
            id: ids.next_id(),
            name,
            font,
            descriptor,
            to_unicode,
        }
    }

    /// Advance widths for codes 32..=255, reached through WinAnsi and the
    /// font's cmap. Codes with no glyph get 0.
    fn widths(&self) -> Vec<Value> {
        let metrics = self.font.metrics();
        (FIRST_CHAR..=LAST_CHAR)
            .map(|code| {
                let width = winansi_to_unicode(code)
                    .and_then(|ch| metrics.glyph_id(ch))
                    .map_or(0, |gid| metrics.advance_width(gid));
                Value::from(width)
            })
            .collect()
    }

    pub fn objects(&self) -> Vec<IndirectObject> {
        let metrics = self.font.metrics();
        let codes: BTreeMap<u16, u32> = (FIRST_CHAR..=LAST_CHAR)
            .filter_map(|code| winansi_to_unicode(code).map(|ch| (code as u16, ch as u32)))
            .collect();
        let mut objects = vec![self.to_unicode.to_object(&codes, &self.name, CodeSpace::OneByte)];
        objects.extend(self.descriptor.objects(&self.name, metrics, &self.font.embeddable()));

        let mut dict = font_dictionary("TrueType", &self.name);
        dict.set("Encoding", Value::name("WinAnsiEncoding"))
            .set("FirstChar", FIRST_CHAR as u32)
            .set("LastChar", LAST_CHAR as u32)
            .set("Widths", Value::Array(self.widths()))
            .set("FontDescriptor", self.descriptor.id)
            .set("ToUnicode", self.to_unicode.id);
        objects.push(IndirectObject::new(self.id, dict));
        objects
    }
}

/// The CIDFontType2 descendant of a Type0 font. CIDs equal glyph ids.
#[derive(Debug, Clone)]
pub struct CidFontType2 {
    pub id: ObjectId,
    pub descriptor: FontDescriptor,
}

impl CidFontType2 {
    /// `/W` lists every glyph individually: `[0 [500] 1 [667] ...]`.
    fn width_array(metrics: &FontMetrics) -> Value {
        let mut w = Vec::with_capacity(metrics.glyphs.len() * 2);
        for (gid, glyph) in metrics.glyphs.iter().enumerate() {
            w.push(Value::from(gid));
            w.push(Value::Array(vec![Value::from(glyph.advance_width)]));
        }
        Value::Array(w)
    }

    fn to_object(&self, name: &str, metrics: &FontMetrics) -> IndirectObject {
        let mut system_info = Dictionary::new();
        system_info
            .set("Registry", "Adobe")
            .set("Ordering", "Identity")
            .set("Supplement", 0);

        let mut dict = font_dictionary("CIDFontType2", name);
        dict.set("CIDSystemInfo", system_info)
            .set("FontDescriptor", self.descriptor.id)
            .set("DW", 1000)
            .set("W", Self::width_array(metrics))
            .set("CIDToGIDMap", Value::name("Identity"));
        IndirectObject::new(self.id, dict)
    }
}

/// A composite font over an embedded TrueType program.
///
/// Characters drawn with the font accumulate in a per-document subset.
/// [`Type0Font::update_font_data`] runs once per generation, after all
/// characters are known and before any page content is encoded: it
/// subsets the program and rederives metrics, `/W` and ToUnicode from the
/// result.
#[derive(Debug, Clone)]
pub struct Type0Font {
    pub id: ObjectId,
    pub name: String,
    source: ParsedFont,
    /// The program actually embedded: a subset of `source`, or `source`
    /// itself when subsetting is off or failed.
    active: ParsedFont,
    descendant: CidFontType2,
    to_unicode: ToUnicode,
    subset: BTreeSet<char>,
}

impl Type0Font {
    pub fn new(ids: &mut IdAllocator, name: String, font: ParsedFont) -> Self {
        let to_unicode = ToUnicode { id: ids.next_id() };
        let descriptor = FontDescriptor::new(ids);
        let descendant = CidFontType2 {
            id: ids.next_id(),
            descriptor,
        };
        Self {
            id: ids.next_id(),
            name,
            active: font.clone(),
            source: font,
            descendant,
            to_unicode,
            subset: BTreeSet::new(),
        }
    }

    pub fn source(&self) -> &ParsedFont {
        &self.source
    }

    /// The font whose glyph ids content streams use.
    pub fn active(&self) -> &ParsedFont {
        &self.active
    }

    pub fn subset_chars(&self) -> &BTreeSet<char> {
        &self.subset
    }

    pub fn reset_subset(&mut self) {
        self.subset.clear();
    }

    pub fn add_chars(&mut self, text: &str) {
        self.subset.extend(text.chars());
    }

    /// Rebuild the embedded program for the accumulated characters. A
    /// subsetting failure is logged and the full font embedded instead.
    pub fn update_font_data(&mut self, subset_enabled: bool) {
        if !subset_enabled {
            self.active = self.source.clone();
            return;
        }
        match self.source.subset(&self.subset) {
            Ok(reduced) => {
                debug!(
                    "subset {} to {} glyphs for {} characters",
                    self.name,
                    reduced.metrics().num_glyphs,
                    self.subset.len()
                );
                self.active = reduced;
            }
            Err(e) => {
                warn!("{}; embedding the full font for {}", e, self.name);
                self.active = self.source.clone();
            }
        }
    }

    /// `<gid gid ...>` as 4-hex-digit glyph ids. Characters the font cannot
    /// map are skipped.
    pub fn encode_text(&self, text: &str) -> String {
        let metrics = self.active.metrics();
        let mut out = String::with_capacity(text.len() * 4 + 2);
        out.push('<');
        for gid in text.chars().filter_map(|ch| metrics.glyph_id(ch)) {
            out.push_str(&format!("{:04X}", gid));
        }
        out.push('>');
        out
    }

    pub fn objects(&self) -> Vec<IndirectObject> {
        let metrics = self.active.metrics();
        let mut objects = vec![self.to_unicode.to_object(
            &metrics.cmap.glyph_to_unicode(),
            &self.name,
            CodeSpace::TwoByte,
        )];
        objects.extend(
            self.descendant
                .descriptor
                .objects(&self.name, metrics, &self.active.embeddable()),
        );
        objects.push(self.descendant.to_object(&self.name, metrics));

        let mut dict = font_dictionary("Type0", &self.name);
        dict.set("Encoding", Value::name("Identity-H"))
            .set("DescendantFonts", vec![self.descendant.id])
            .set("ToUnicode", self.to_unicode.id);
        objects.push(IndirectObject::new(self.id, dict));
        objects
    }
}
