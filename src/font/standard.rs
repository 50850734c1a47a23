//! The 14 standard PDF fonts and the WinAnsi encoding simple fonts use.

use serde::{Deserialize, Serialize};

/// Weight/slant variant of a font family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Bold,
    Italic,
    #[serde(alias = "bold-italic", alias = "boldItalic")]
    BoldItalic,
}

impl FontStyle {
    pub fn is_bold(self) -> bool {
        matches!(self, FontStyle::Bold | FontStyle::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, FontStyle::Italic | FontStyle::BoldItalic)
    }

    pub fn from_parts(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => FontStyle::Normal,
            (true, false) => FontStyle::Bold,
            (false, true) => FontStyle::Italic,
            (true, true) => FontStyle::BoldItalic,
        }
    }
}

/// The 14 standard PDF fonts. No embedding needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
    Symbol,
    ZapfDingbats,
}

impl StandardFont {
    pub const ALL: [StandardFont; 14] = [
        Self::Helvetica,
        Self::HelveticaBold,
        Self::HelveticaOblique,
        Self::HelveticaBoldOblique,
        Self::TimesRoman,
        Self::TimesBold,
        Self::TimesItalic,
        Self::TimesBoldItalic,
        Self::Courier,
        Self::CourierBold,
        Self::CourierOblique,
        Self::CourierBoldOblique,
        Self::Symbol,
        Self::ZapfDingbats,
    ];

    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::TimesItalic => "Times-Italic",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
            Self::Symbol => "Symbol",
            Self::ZapfDingbats => "ZapfDingbats",
        }
    }

    /// The family name documents refer to this font by.
    pub fn family(&self) -> &'static str {
        match self {
            Self::Helvetica | Self::HelveticaBold | Self::HelveticaOblique | Self::HelveticaBoldOblique => {
                "Helvetica"
            }
            Self::TimesRoman | Self::TimesBold | Self::TimesItalic | Self::TimesBoldItalic => "Times",
            Self::Courier | Self::CourierBold | Self::CourierOblique | Self::CourierBoldOblique => "Courier",
            Self::Symbol => "Symbol",
            Self::ZapfDingbats => "ZapfDingbats",
        }
    }

    pub fn style(&self) -> FontStyle {
        match self {
            Self::HelveticaBold | Self::TimesBold | Self::CourierBold => FontStyle::Bold,
            Self::HelveticaOblique | Self::TimesItalic | Self::CourierOblique => FontStyle::Italic,
            Self::HelveticaBoldOblique | Self::TimesBoldItalic | Self::CourierBoldOblique => {
                FontStyle::BoldItalic
            }
            _ => FontStyle::Normal,
        }
    }

    /// Symbol and ZapfDingbats use their built-in encodings.
    pub fn uses_winansi(&self) -> bool {
        !matches!(self, Self::Symbol | Self::ZapfDingbats)
    }

    /// Resolve one of the standard family names (case-insensitive,
    /// `Times-Roman` accepted) and a style to a standard font.
    pub fn resolve(family: &str, style: FontStyle) -> Option<StandardFont> {
        let family = family.trim().to_ascii_lowercase();
        let base = match family.as_str() {
            "helvetica" => Self::Helvetica,
            "times" | "times-roman" => Self::TimesRoman,
            "courier" => Self::Courier,
            "symbol" => return Some(Self::Symbol),
            "zapfdingbats" => return Some(Self::ZapfDingbats),
            _ => return None,
        };
        Self::with_style(base, style)
    }

    /// The closest standard font for a common system or generic family
    /// (`Arial`, `serif`, `monospace`, ...). Only for substitution.
    pub fn resolve_alias(family: &str, style: FontStyle) -> Option<StandardFont> {
        let family = family.trim().to_ascii_lowercase();
        let base = match family.as_str() {
            "arial" | "sans-serif" => Self::Helvetica,
            "times new roman" | "serif" => Self::TimesRoman,
            "courier new" | "monospace" => Self::Courier,
            _ => return None,
        };
        Self::with_style(base, style)
    }

    fn with_style(base: StandardFont, style: FontStyle) -> Option<StandardFont> {
        Self::ALL
            .iter()
            .copied()
            .find(|font| font.family() == base.family() && font.style() == style)
    }
}

/// Map a Unicode codepoint to a WinAnsiEncoding byte value.
///
/// WinAnsiEncoding is based on Windows-1252. Most codepoints in
/// 0x20..=0x7E and 0xA0..=0xFF map directly. The 0x80..=0x9F range
/// contains special mappings for smart quotes, bullets, dashes, etc.
pub fn unicode_to_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    WINANSI_HIGH
        .iter()
        .find(|(_, unicode)| *unicode == cp)
        .map(|(byte, _)| *byte)
}

/// Inverse of [`unicode_to_winansi`], for building `/Widths`.
pub fn winansi_to_unicode(byte: u8) -> Option<char> {
    match byte {
        0x20..=0x7E | 0xA0..=0xFF => Some(byte as char),
        _ => WINANSI_HIGH
            .iter()
            .find(|(b, _)| *b == byte)
            .and_then(|(_, unicode)| char::from_u32(*unicode)),
    }
}

/// Windows-1252 special mappings in 0x80..=0x9F.
const WINANSI_HIGH: [(u8, u32); 27] = [
    (0x80, 0x20AC), // Euro sign
    (0x82, 0x201A), // Single low-9 quotation mark
    (0x83, 0x0192), // Latin small letter f with hook
    (0x84, 0x201E), // Double low-9 quotation mark
    (0x85, 0x2026), // Horizontal ellipsis
    (0x86, 0x2020), // Dagger
    (0x87, 0x2021), // Double dagger
    (0x88, 0x02C6), // Modifier letter circumflex accent
    (0x89, 0x2030), // Per mille sign
    (0x8A, 0x0160), // Latin capital letter S with caron
    (0x8B, 0x2039), // Single left-pointing angle quotation
    (0x8C, 0x0152), // Latin capital ligature OE
    (0x8E, 0x017D), // Latin capital letter Z with caron
    (0x91, 0x2018), // Left single quotation mark
    (0x92, 0x2019), // Right single quotation mark
    (0x93, 0x201C), // Left double quotation mark
    (0x94, 0x201D), // Right double quotation mark
    (0x95, 0x2022), // Bullet
    (0x96, 0x2013), // En dash
    (0x97, 0x2014), // Em dash
    (0x98, 0x02DC), // Small tilde
    (0x99, 0x2122), // Trade mark sign
    (0x9A, 0x0161), // Latin small letter s with caron
    (0x9B, 0x203A), // Single right-pointing angle quotation
    (0x9C, 0x0153), // Latin small ligature oe
    (0x9E, 0x017E), // Latin small letter z with caron
    (0x9F, 0x0178), // Latin capital letter Y with diaeresis
];

/// Encode text as a WinAnsi PDF literal string body: `\`, `(` and `)` are
/// escaped, bytes outside printable ASCII become octal escapes, and
/// characters WinAnsi cannot represent are dropped.
pub fn encode_winansi_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.chars().filter_map(unicode_to_winansi) {
        match byte {
            b'\\' | b'(' | b')' => {
                out.push('\\');
                out.push(byte as char);
            }
            0x20..=0x7E => out.push(byte as char),
            _ => out.push_str(&format!("\\{:03o}", byte)),
        }
    }
    out
}
