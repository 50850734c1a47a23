//! # TrueType Font Subsetter
//!
//! Strips a TrueType font to the glyphs a document actually draws. A typical
//! font is 50-200KB, while a subset with ~100 glyphs is usually 5-15KB.
//!
//! Glyph ids are renumbered contiguously from 0, so the subset's own cmap,
//! `/W` array and ToUnicode map must all be derived from the subset font,
//! never from the original.
//!
//! ## Approach
//!
//! 1. Map the used characters to glyphs and close over composite components
//! 2. Remap old GIDs to new contiguous GIDs
//! 3. Rebuild `glyf`, `loca`, `hmtx`, `cmap`, `maxp`, `post`; patch `head`/`hhea`
//! 4. Hand the table set back; the sfnt encoder writes it with fresh checksums
//!
//! CFF-flavoured fonts have no `glyf` table to cut and are reported as
//! [`FolioError::Subset`], which callers treat as "embed the full font".

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use super::cmap::{self, Cmap};
use super::sfnt::{Flavor, Sfnt};
use crate::error::{FolioError, Result};

/// Result of subsetting a font.
pub struct SubsetFont {
    pub sfnt: Sfnt,
    /// Maps original glyph IDs to new contiguous glyph IDs.
    pub gid_remap: BTreeMap<u16, u16>,
}

/// Subset a TrueType font to the glyphs needed for `chars`.
pub fn subset(source: &Sfnt, source_cmap: &Cmap, chars: &BTreeSet<char>) -> Result<SubsetFont> {
    if source.flavor() == Flavor::Cff {
        return Err(FolioError::Subset("CFF outlines are embedded whole".to_string()));
    }
    let table = |tag: &[u8; 4]| {
        source
            .table(tag)
            .ok_or_else(|| FolioError::Subset(format!("missing {} table", String::from_utf8_lossy(tag))))
    };

    let raw_glyf = table(b"glyf")?;
    let raw_loca = table(b"loca")?;
    let head = table(b"head")?;
    let raw_hhea = table(b"hhea")?;
    let raw_hmtx = table(b"hmtx")?;
    let raw_maxp = table(b"maxp")?;
    if head.len() < 54 || raw_hhea.len() < 36 || raw_maxp.len() < 6 {
        return Err(FolioError::Subset("truncated head, hhea or maxp table".to_string()));
    }

    // Always include glyph 0 (.notdef)
    let mut char_to_old_gid: BTreeMap<u32, u16> = BTreeMap::new();
    let mut needed_gids: BTreeSet<u16> = BTreeSet::new();
    needed_gids.insert(0);
    for &ch in chars {
        if let Some(gid) = source_cmap.glyph_id(ch as u32) {
            char_to_old_gid.insert(ch as u32, gid);
            needed_gids.insert(gid);
        }
    }

    let num_glyphs = read_u16(raw_maxp, 4);
    let loca_format = read_i16(head, 50);
    let loca_offsets = parse_loca(raw_loca, loca_format, num_glyphs);

    // Recursively collect composite glyph component GIDs
    let initial_gids: Vec<u16> = needed_gids.iter().copied().collect();
    for gid in initial_gids {
        collect_composite_deps(raw_glyf, &loca_offsets, gid, &mut needed_gids);
    }
    needed_gids.retain(|&gid| gid < num_glyphs);

    // Build remap: old GID → new contiguous GID
    let gid_remap: BTreeMap<u16, u16> = needed_gids
        .iter()
        .enumerate()
        .map(|(new_gid, &old_gid)| (old_gid, new_gid as u16))
        .collect();
    let new_num_glyphs = needed_gids.len() as u16;

    let (new_glyf, new_loca_offsets) = rebuild_glyf(raw_glyf, &loca_offsets, &needed_gids, &gid_remap);

    // Short loca offsets are halved u16s
    let new_loca_format: i16 = if new_glyf.len() > 0x1FFFE { 1 } else { 0 };
    let new_loca = build_loca(&new_loca_offsets, new_loca_format);

    let num_h_metrics = read_u16(raw_hhea, 34) as usize;
    let new_hmtx = rebuild_hmtx(raw_hmtx, &needed_gids, num_h_metrics);

    let char_to_new_gid: BTreeMap<u32, u16> = char_to_old_gid
        .iter()
        .filter_map(|(&code, old_gid)| gid_remap.get(old_gid).map(|&new_gid| (code, new_gid)))
        .collect();

    let mut sfnt = Sfnt::new(Flavor::TrueType);
    sfnt.insert_table(*b"cmap", cmap::build(&char_to_new_gid));
    sfnt.insert_table(*b"glyf", new_glyf);
    sfnt.insert_table(*b"head", rebuild_head(head, new_loca_format));
    sfnt.insert_table(*b"hhea", rebuild_hhea(raw_hhea, new_num_glyphs));
    sfnt.insert_table(*b"hmtx", new_hmtx);
    sfnt.insert_table(*b"loca", new_loca);
    sfnt.insert_table(*b"maxp", rebuild_maxp(raw_maxp, new_num_glyphs));
    sfnt.insert_table(*b"post", build_post_format3(source.table(b"post")));

    // Copied verbatim when present
    for tag in [b"OS/2", b"name", b"cvt ", b"fpgm", b"prep"] {
        if let Some(data) = source.table(tag) {
            sfnt.insert_table(*tag, data.to_vec());
        }
    }

    debug!(
        "subset: {} chars → {} of {} glyphs",
        chars.len(),
        new_num_glyphs,
        num_glyphs
    );

    Ok(SubsetFont { sfnt, gid_remap })
}

// ─── Loca Table Parsing ─────────────────────────────────────────

fn parse_loca(data: &[u8], format: i16, num_glyphs: u16) -> Vec<u32> {
    let count = num_glyphs as usize + 1; // loca has numGlyphs + 1 entries
    let mut offsets = Vec::with_capacity(count);

    for i in 0..count {
        let (pos, width) = if format == 0 { (i * 2, 2) } else { (i * 4, 4) };
        if pos + width > data.len() {
            // Truncated loca: the remaining glyphs are empty
            offsets.push(*offsets.last().unwrap_or(&0));
        } else if format == 0 {
            offsets.push(read_u16(data, pos) as u32 * 2);
        } else {
            offsets.push(read_u32(data, pos));
        }
    }

    offsets
}

// ─── Composite Glyph Dependency Collection ──────────────────────

/// Component records of a composite glyph: `(offset of glyphIndex, glyphIndex)`.
fn composite_components(glyph: &[u8]) -> Vec<(usize, u16)> {
    let mut components = Vec::new();
    let mut pos = 10; // skip header (numContours + bbox)

    loop {
        if pos + 4 > glyph.len() {
            break;
        }
        let flags = read_u16(glyph, pos);
        components.push((pos + 2, read_u16(glyph, pos + 2)));
        pos += 4;

        // ARG_1_AND_2_ARE_WORDS: 2 × i16, else 2 × i8
        pos += if flags & 0x0001 != 0 { 4 } else { 2 };

        if flags & 0x0008 != 0 {
            // WE_HAVE_A_SCALE
            pos += 2;
        } else if flags & 0x0040 != 0 {
            // WE_HAVE_AN_X_AND_Y_SCALE
            pos += 4;
        } else if flags & 0x0080 != 0 {
            // WE_HAVE_A_TWO_BY_TWO
            pos += 8;
        }

        if flags & 0x0020 == 0 {
            // MORE_COMPONENTS
            break;
        }
    }
    components
}

fn glyph_bytes<'a>(glyf: &'a [u8], loca_offsets: &[u32], gid: u16) -> Option<&'a [u8]> {
    let idx = gid as usize;
    if idx + 1 >= loca_offsets.len() {
        return None;
    }
    let start = loca_offsets[idx] as usize;
    let end = (loca_offsets[idx + 1] as usize).min(glyf.len());
    if start >= end {
        return None;
    }
    Some(&glyf[start..end])
}

fn is_composite(glyph: &[u8]) -> bool {
    glyph.len() >= 10 && read_i16(glyph, 0) < 0
}

fn collect_composite_deps(glyf: &[u8], loca_offsets: &[u32], gid: u16, needed: &mut BTreeSet<u16>) {
    let Some(glyph) = glyph_bytes(glyf, loca_offsets, gid) else {
        return;
    };
    if !is_composite(glyph) {
        return;
    }
    for (_, component_gid) in composite_components(glyph) {
        if needed.insert(component_gid) {
            collect_composite_deps(glyf, loca_offsets, component_gid, needed);
        }
    }
}

// ─── Table Rebuilding ───────────────────────────────────────────

fn rebuild_glyf(
    glyf: &[u8],
    loca_offsets: &[u32],
    needed_gids: &BTreeSet<u16>,
    gid_remap: &BTreeMap<u16, u16>,
) -> (Vec<u8>, Vec<u32>) {
    let mut new_glyf: Vec<u8> = Vec::new();
    let mut new_offsets: Vec<u32> = Vec::new();

    for &old_gid in needed_gids {
        new_offsets.push(new_glyf.len() as u32);

        let Some(glyph) = glyph_bytes(glyf, loca_offsets, old_gid) else {
            // Empty glyph
            continue;
        };
        let mut new_glyph = glyph.to_vec();
        if is_composite(glyph) {
            for (at, component_gid) in composite_components(glyph) {
                if let Some(&new_gid) = gid_remap.get(&component_gid) {
                    write_u16(&mut new_glyph, at, new_gid);
                }
            }
        }
        new_glyf.extend_from_slice(&new_glyph);

        // Short loca can only address even offsets; pad to 4 like most tools
        while new_glyf.len() % 4 != 0 {
            new_glyf.push(0);
        }
    }

    // Final offset (marks end of last glyph)
    new_offsets.push(new_glyf.len() as u32);

    (new_glyf, new_offsets)
}

fn build_loca(offsets: &[u32], format: i16) -> Vec<u8> {
    let mut data = Vec::new();
    if format == 0 {
        for &offset in offsets {
            let short = (offset / 2) as u16;
            data.extend_from_slice(&short.to_be_bytes());
        }
    } else {
        for &offset in offsets {
            data.extend_from_slice(&offset.to_be_bytes());
        }
    }
    data
}

/// Every kept glyph gets a full (advance, lsb) record.
fn rebuild_hmtx(hmtx: &[u8], needed_gids: &BTreeSet<u16>, num_h_metrics: usize) -> Vec<u8> {
    let mut data = Vec::new();
    let last_long = num_h_metrics.saturating_sub(1);

    for &old_gid in needed_gids {
        let idx = old_gid as usize;
        if idx < num_h_metrics {
            let offset = idx * 4;
            match hmtx.get(offset..offset + 4) {
                Some(metric) => data.extend_from_slice(metric),
                None => data.extend_from_slice(&[0, 0, 0, 0]),
            }
        } else {
            let advance = hmtx.get(last_long * 4..last_long * 4 + 2).unwrap_or(&[0, 0]);
            let lsb_offset = num_h_metrics * 4 + (idx - num_h_metrics) * 2;
            let lsb = hmtx.get(lsb_offset..lsb_offset + 2).unwrap_or(&[0, 0]);
            data.extend_from_slice(advance);
            data.extend_from_slice(lsb);
        }
    }

    data
}

fn rebuild_head(head: &[u8], new_loca_format: i16) -> Vec<u8> {
    let mut new_head = head.to_vec();
    // checkSumAdjustment is recomputed by the encoder
    write_u32(&mut new_head, 8, 0);
    write_i16(&mut new_head, 50, new_loca_format);
    new_head
}

fn rebuild_hhea(hhea: &[u8], new_num_glyphs: u16) -> Vec<u8> {
    let mut new_hhea = hhea.to_vec();
    write_u16(&mut new_hhea, 34, new_num_glyphs);
    new_hhea
}

/// Keep the original profile limits; only the glyph count changes.
fn rebuild_maxp(maxp: &[u8], new_num_glyphs: u16) -> Vec<u8> {
    let mut new_maxp = maxp.to_vec();
    write_u16(&mut new_maxp, 4, new_num_glyphs);
    new_maxp
}

/// Format 3.0 has no glyph names; italicAngle, underline metrics and
/// isFixedPitch carry over from the source table.
fn build_post_format3(source: Option<&[u8]>) -> Vec<u8> {
    let mut data = vec![0u8; 32];
    if let Some(header) = source.and_then(|post| post.get(..16)) {
        data[..16].copy_from_slice(header);
    }
    write_u32(&mut data, 0, 0x0003_0000);
    data
}

// ─── Byte Helpers ───────────────────────────────────────────────

fn read_u16(data: &[u8], offset: usize) -> u16 {
    data.get(offset..offset + 2)
        .map_or(0, |b| u16::from_be_bytes([b[0], b[1]]))
}

fn read_i16(data: &[u8], offset: usize) -> i16 {
    read_u16(data, offset) as i16
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    data.get(offset..offset + 4)
        .map_or(0, |b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

fn write_u16(data: &mut [u8], offset: usize, val: u16) {
    if let Some(slot) = data.get_mut(offset..offset + 2) {
        slot.copy_from_slice(&val.to_be_bytes());
    }
}

fn write_i16(data: &mut [u8], offset: usize, val: i16) {
    write_u16(data, offset, val as u16);
}

fn write_u32(data: &mut [u8], offset: usize, val: u32) {
    if let Some(slot) = data.get_mut(offset..offset + 4) {
        slot.copy_from_slice(&val.to_be_bytes());
    }
}

// ─── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::metrics::FontMetrics;
    use crate::font::test_font;

    fn source() -> (Sfnt, FontMetrics) {
        let sfnt = Sfnt::from_bytes(&test_font::build()).unwrap();
        let metrics = FontMetrics::from_sfnt(&sfnt).unwrap();
        (sfnt, metrics)
    }

    fn chars(s: &str) -> BTreeSet<char> {
        s.chars().collect()
    }

    #[test]
    fn test_remap_is_contiguous() {
        let (sfnt, metrics) = source();
        let result = subset(&sfnt, &metrics.cmap, &chars("AC")).unwrap();
        let remap: Vec<(u16, u16)> = result.gid_remap.into_iter().collect();
        assert_eq!(remap, vec![(0, 0), (1, 1), (3, 2)]);
    }

    #[test]
    fn test_composite_pulls_in_components() {
        let (sfnt, metrics) = source();
        let result = subset(&sfnt, &metrics.cmap, &chars("Á")).unwrap();
        let kept: Vec<u16> = result.gid_remap.keys().copied().collect();
        assert_eq!(kept, vec![0, 1, 4, 5]);

        // The composite's component references now use the new ids.
        let sub = FontMetrics::from_sfnt(&result.sfnt).unwrap();
        assert_eq!(sub.num_glyphs, 4);
        assert_eq!(sub.glyph_id('Á'), Some(2));
        let loca = result.sfnt.table(b"loca").unwrap();
        let glyf = result.sfnt.table(b"glyf").unwrap();
        let offsets = parse_loca(loca, 0, 4);
        let composite = glyph_bytes(glyf, &offsets, 2).unwrap();
        let components: Vec<u16> = composite_components(composite).into_iter().map(|(_, g)| g).collect();
        assert_eq!(components, vec![1, 3]);
    }

    #[test]
    fn test_subset_metrics_follow_renumbering() {
        let (sfnt, metrics) = source();
        let result = subset(&sfnt, &metrics.cmap, &chars("C\u{1F600}")).unwrap();
        let sub = FontMetrics::from_sfnt(&result.sfnt).unwrap();

        assert_eq!(sub.glyph_id('C'), Some(1));
        assert_eq!(sub.glyph_id('\u{1F600}'), Some(2));
        assert_eq!(sub.glyph_id('A'), None);
        assert_eq!(sub.advance_width(1), metrics.advance_width(3));
        // Glyph 6 was past numberOfHMetrics in the source.
        assert_eq!(sub.advance_width(2), metrics.advance_width(6));
        assert_eq!(sub.ascent, metrics.ascent);
        assert_eq!(sub.bbox, metrics.bbox);
    }

    #[test]
    fn test_post_keeps_style_fields() {
        let font = test_font::TestFont {
            italic_angle: -10.5,
            fixed_pitch: true,
            ..Default::default()
        }
        .build();
        let sfnt = Sfnt::from_bytes(&font).unwrap();
        let metrics = FontMetrics::from_sfnt(&sfnt).unwrap();
        let result = subset(&sfnt, &metrics.cmap, &chars("A")).unwrap();
        let post = result.sfnt.table(b"post").unwrap();
        assert_eq!(read_u32(post, 0), 0x0003_0000);
        let sub = FontMetrics::from_sfnt(&result.sfnt).unwrap();
        assert_eq!(sub.italic_angle, -10.5);
        assert!(sub.is_fixed_pitch);
    }

    #[test]
    fn test_cff_reports_subset_error() {
        let mut sfnt = Sfnt::new(Flavor::Cff);
        sfnt.insert_table(*b"CFF ", vec![1, 0, 4, 2]);
        let err = subset(&sfnt, &Cmap::default(), &chars("A")).err().unwrap();
        assert!(matches!(err, FolioError::Subset(_)));
    }

    #[test]
    fn test_build_loca_short() {
        let offsets = vec![0, 100, 200, 300];
        let data = build_loca(&offsets, 0);
        assert_eq!(data.len(), 8);
        assert_eq!(read_u16(&data, 2), 50);
        assert_eq!(read_u16(&data, 6), 150);
    }

    #[test]
    fn test_build_loca_long() {
        let offsets = vec![0, 100, 200, 300];
        let data = build_loca(&offsets, 1);
        assert_eq!(data.len(), 16);
        assert_eq!(read_u32(&data, 4), 100);
        assert_eq!(read_u32(&data, 12), 300);
    }

    #[test]
    fn test_out_of_bounds_reads_are_zero() {
        assert_eq!(read_u16(&[1], 0), 0);
        assert_eq!(read_u32(&[1, 2, 3], 0), 0);
        let mut short = [0u8; 1];
        write_u16(&mut short, 0, 0xFFFF);
        assert_eq!(short, [0]);
    }
}
