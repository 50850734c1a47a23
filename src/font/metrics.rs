//! # Font Metrics
//!
//! Decodes `head`, `hhea`, `maxp`, `OS/2`, `post` and `hmtx` into the
//! numbers a PDF font descriptor needs. Linear metrics are scaled into the
//! 1000-unit glyph space PDF uses, whatever the font's own units-per-em.

use log::debug;

use super::cmap::Cmap;
use super::reader::ByteReader;
use super::sfnt::Sfnt;
use crate::error::{FolioError, Result};

/// FontDescriptor `/Flags` bits.
pub const FLAG_FIXED_PITCH: u32 = 1 << 0;
pub const FLAG_SERIF: u32 = 1 << 1;
pub const FLAG_SCRIPT: u32 = 1 << 3;
pub const FLAG_NONSYMBOLIC: u32 = 1 << 5;
pub const FLAG_ITALIC: u32 = 1 << 6;

/// Horizontal metrics of one glyph, in 1000-unit glyph space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphMetrics {
    pub advance_width: i32,
    pub left_side_bearing: i32,
}

/// Everything the PDF side needs from a parsed font.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    pub units_per_em: u16,
    pub num_glyphs: u16,
    pub ascent: i32,
    pub descent: i32,
    /// `[xMin, yMin, xMax, yMax]`
    pub bbox: [i32; 4],
    pub cap_height: i32,
    pub italic_angle: f64,
    pub is_fixed_pitch: bool,
    /// High byte of `OS/2.sFamilyClass`.
    pub family_class: u8,
    pub flags: u32,
    /// Indexed by glyph id.
    pub glyphs: Vec<GlyphMetrics>,
    pub cmap: Cmap,
}

impl FontMetrics {
    pub fn from_sfnt(sfnt: &Sfnt) -> Result<Self> {
        let head = ByteReader::for_table("head", sfnt.require(b"head")?);
        let units_per_em = head.u16_at(18)?;
        if units_per_em == 0 {
            return Err(FolioError::font("head", "unitsPerEm is zero"));
        }
        let scale = |v: i16| scale_to_1000(v as i32, units_per_em);
        let bbox = [
            scale(head.i16_at(36)?),
            scale(head.i16_at(38)?),
            scale(head.i16_at(40)?),
            scale(head.i16_at(42)?),
        ];

        let maxp = ByteReader::for_table("maxp", sfnt.require(b"maxp")?);
        let num_glyphs = maxp.u16_at(4)?;

        let hhea = ByteReader::for_table("hhea", sfnt.require(b"hhea")?);
        let ascent = scale(hhea.i16_at(4)?);
        let descent = scale(hhea.i16_at(6)?);
        let num_h_metrics = hhea.u16_at(34)?;

        let (family_class, cap_height) = match sfnt.table(b"OS/2") {
            Some(data) => {
                let os2 = ByteReader::for_table("OS/2", data);
                let version = os2.u16_at(0)?;
                let family_class = (os2.u16_at(30)? >> 8) as u8;
                let cap_height = if version > 1 { scale(os2.i16_at(88)?) } else { ascent };
                (family_class, cap_height)
            }
            None => (0, ascent),
        };

        let (italic_angle, is_fixed_pitch) = match sfnt.table(b"post") {
            Some(data) => {
                let mut post = ByteReader::for_table("post", data);
                post.seek(4)?;
                let italic_angle = post.read_fixed()?;
                post.seek(12)?;
                (italic_angle, post.read_u32()? != 0)
            }
            None => (0.0, false),
        };

        let glyphs = read_hmtx(sfnt.require(b"hmtx")?, num_glyphs, num_h_metrics, units_per_em)?;
        let cmap = Cmap::parse(sfnt.require(b"cmap")?, num_glyphs)?;

        debug!(
            "font metrics: upem {}, {} glyphs, {} mapped code points",
            units_per_em,
            num_glyphs,
            cmap.len()
        );

        Ok(Self {
            units_per_em,
            num_glyphs,
            ascent,
            descent,
            bbox,
            cap_height,
            italic_angle,
            is_fixed_pitch,
            family_class,
            flags: descriptor_flags(is_fixed_pitch, family_class, italic_angle),
            glyphs,
            cmap,
        })
    }

    pub fn glyph_id(&self, ch: char) -> Option<u16> {
        self.cmap.glyph_id(ch as u32)
    }

    /// Advance width in 1000-unit glyph space; unknown glyphs measure as
    /// `.notdef`.
    pub fn advance_width(&self, glyph_id: u16) -> i32 {
        self.glyphs
            .get(glyph_id as usize)
            .or_else(|| self.glyphs.first())
            .map_or(0, |g| g.advance_width)
    }

    /// Width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let gid = self.glyph_id(ch).unwrap_or(0);
        self.advance_width(gid) as f64 * font_size / 1000.0
    }

    pub fn measure_string(&self, text: &str, font_size: f64, letter_spacing: f64) -> f64 {
        text.chars()
            .map(|ch| self.char_width(ch, font_size) + letter_spacing)
            .sum()
    }
}

/// Round `value` from font units into 1000-unit glyph space.
pub fn scale_to_1000(value: i32, units_per_em: u16) -> i32 {
    (value as f64 * 1000.0 / units_per_em as f64).round() as i32
}

pub fn descriptor_flags(is_fixed_pitch: bool, family_class: u8, italic_angle: f64) -> u32 {
    let mut flags = FLAG_NONSYMBOLIC;
    if is_fixed_pitch {
        flags |= FLAG_FIXED_PITCH;
    }
    if matches!(family_class, 1 | 2 | 3 | 4 | 5 | 7) {
        flags |= FLAG_SERIF;
    }
    if family_class == 10 {
        flags |= FLAG_SCRIPT;
    }
    if italic_angle != 0.0 {
        flags |= FLAG_ITALIC;
    }
    flags
}

fn read_hmtx(
    data: &[u8],
    num_glyphs: u16,
    num_h_metrics: u16,
    units_per_em: u16,
) -> Result<Vec<GlyphMetrics>> {
    if num_h_metrics == 0 && num_glyphs > 0 {
        return Err(FolioError::font("hhea", "numberOfHMetrics is zero"));
    }
    let hmtx = ByteReader::for_table("hmtx", data);
    let long = num_h_metrics.min(num_glyphs) as usize;

    let mut glyphs = Vec::with_capacity(num_glyphs as usize);
    let mut last_advance = 0u16;
    for gid in 0..num_glyphs as usize {
        let (advance, lsb) = if gid < long {
            last_advance = hmtx.u16_at(4 * gid)?;
            (last_advance, hmtx.i16_at(4 * gid + 2)?)
        } else {
            // Past the long metrics only the bearing is stored.
            (last_advance, hmtx.i16_at(4 * long + 2 * (gid - long))?)
        };
        glyphs.push(GlyphMetrics {
            advance_width: scale_to_1000(advance as i32, units_per_em),
            left_side_bearing: scale_to_1000(lsb as i32, units_per_em),
        });
    }
    Ok(glyphs)
}
