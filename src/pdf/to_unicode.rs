//! ToUnicode CMaps, so text drawn with glyph ids can be extracted and
//! copied as Unicode.

use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;

use super::object::{Dictionary, IndirectObject, ObjectId, Stream};

/// `beginbfchar` blocks hold at most this many entries.
const BFCHAR_LIMIT: usize = 100;

/// Width of the character codes a CMap maps from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeSpace {
    /// Single-byte codes of a simple font, `<00> <FF>`.
    OneByte,
    /// Glyph ids of an Identity-H composite font, `<0000> <FFFF>`.
    TwoByte,
}

impl CodeSpace {
    fn code(self, code: u16) -> String {
        match self {
            CodeSpace::OneByte => format!("<{:02X}>", code),
            CodeSpace::TwoByte => format!("<{:04X}>", code),
        }
    }

    fn max(self) -> u16 {
        match self {
            CodeSpace::OneByte => 0xFF,
            CodeSpace::TwoByte => 0xFFFF,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToUnicode {
    pub id: ObjectId,
}

impl ToUnicode {
    /// `codes` maps each code to one representative code point; for
    /// composite fonts see [`crate::font::Cmap::glyph_to_unicode`].
    pub fn to_object(&self, codes: &BTreeMap<u16, u32>, font_name: &str, space: CodeSpace) -> IndirectObject {
        let cmap = build_cmap(codes, font_name, space);
        IndirectObject::with_stream(self.id, Dictionary::new(), Stream::deflated(cmap.as_bytes()))
    }
}

/// CMap program text. Destinations are UTF-16BE.
pub fn build_cmap(codes: &BTreeMap<u16, u32>, font_name: &str, space: CodeSpace) -> String {
    let mut cmap = String::new();
    cmap.push_str("/CIDInit /ProcSet findresource begin\n");
    cmap.push_str("12 dict begin\n");
    cmap.push_str("begincmap\n");
    cmap.push_str("/CIDSystemInfo\n");
    cmap.push_str("<< /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
    let _ = writeln!(cmap, "/CMapName /{}-UTF16 def", font_name);
    cmap.push_str("/CMapType 2 def\n");
    cmap.push_str("1 begincodespacerange\n");
    let _ = writeln!(cmap, "{} {}", space.code(0), space.code(space.max()));
    cmap.push_str("endcodespacerange\n");

    let entries: Vec<(u16, u32)> = codes
        .iter()
        .map(|(&c, &u)| (c, u))
        .filter(|&(code, _)| code <= space.max())
        .collect();
    for chunk in entries.chunks(BFCHAR_LIMIT) {
        let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
        for &(code, unicode) in chunk {
            let _ = writeln!(cmap, "{} <{}>", space.code(code), utf16_hex(unicode));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str("endcmap\n");
    cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
    cmap.push_str("end\n");
    cmap.push_str("end\n");
    cmap
}

/// Supplementary-plane code points become a surrogate pair.
fn utf16_hex(code_point: u32) -> String {
    match char::from_u32(code_point) {
        Some(ch) => {
            let mut units = [0u16; 2];
            ch.encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{:04X}", u))
                .collect()
        }
        None => format!("{:04X}", code_point & 0xFFFF),
    }
}
