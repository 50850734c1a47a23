//! # Character Maps
//!
//! Decodes the `cmap` subtables a PDF writer can use (formats 0, 2, 4, 6, 12
//! and 14) into a single Unicode code point → glyph id map, and builds the
//! small cmap written into subset fonts.
//!
//! Merge order, lowest priority first:
//!
//! 1. the byte-oriented tables, format 0 then format 6;
//! 2. non-default glyphs from the format 14 variation table;
//! 3. exactly one of format 12, format 4 or format 2, in that preference.
//!
//! Glyph 0 is never recorded, so `.notdef` can't shadow a real mapping, and
//! ids at or beyond `numGlyphs` are dropped.

use std::collections::BTreeMap;

use log::{debug, trace};

use super::encode::search_params;
use super::reader::ByteReader;
use crate::error::Result;

const TAG: &str = "cmap";
const MAX_CODE_POINT: u32 = 0x10FFFF;

#[derive(Debug, Clone, Copy)]
struct EncodingRecord {
    platform_id: u16,
    encoding_id: u16,
    offset: usize,
    format: u16,
}

/// One selector from a format 14 subtable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariationSelector {
    pub selector: u32,
    /// Inclusive ranges whose variant is the default glyph.
    pub default_ranges: Vec<(u32, u32)>,
    pub non_default: Vec<(u32, u16)>,
}

/// The merged character map of a font.
#[derive(Debug, Clone, Default)]
pub struct Cmap {
    map: BTreeMap<u32, u16>,
    variations: Vec<VariationSelector>,
}

impl Cmap {
    pub fn parse(data: &[u8], num_glyphs: u16) -> Result<Self> {
        let mut r = ByteReader::for_table(TAG, data);
        let _version = r.read_u16()?;
        let num_tables = r.read_u16()?;

        let mut records = Vec::with_capacity(num_tables as usize);
        for _ in 0..num_tables {
            let platform_id = r.read_u16()?;
            let encoding_id = r.read_u16()?;
            let offset = r.read_u32()? as usize;
            let format = r.u16_at(offset)?;
            records.push(EncodingRecord {
                platform_id,
                encoding_id,
                offset,
                format,
            });
        }

        let pick = |format: u16| {
            records
                .iter()
                .filter(|rec| rec.format == format)
                .filter_map(|rec| preference(rec).map(|rank| (rank, *rec)))
                .min_by_key(|(rank, _)| *rank)
                .map(|(_, rec)| rec)
        };

        let mut cmap = Cmap::default();
        let merge = |map: &mut BTreeMap<u32, u16>, pairs: Vec<(u32, u16)>| {
            for (code, glyph) in pairs {
                if glyph != 0 && glyph < num_glyphs {
                    map.insert(code, glyph);
                }
            }
        };

        for format in [0, 6] {
            if let Some(rec) = pick(format) {
                let sub = &data[rec.offset..];
                let pairs = if format == 0 { decode_format0(sub)? } else { decode_format6(sub)? };
                trace!("cmap: format {} ({},{}) gave {} entries", format, rec.platform_id, rec.encoding_id, pairs.len());
                merge(&mut cmap.map, pairs);
            }
        }

        if let Some(rec) = pick(14) {
            cmap.variations = decode_format14(&data[rec.offset..])?;
            let overlay = cmap
                .variations
                .iter()
                .flat_map(|v| v.non_default.iter().copied())
                .collect();
            merge(&mut cmap.map, overlay);
        }

        let primary = [12, 4, 2].into_iter().find_map(pick);
        if let Some(rec) = primary {
            let sub = &data[rec.offset..];
            let pairs = match rec.format {
                12 => decode_format12(sub)?,
                4 => decode_format4(sub)?,
                _ => decode_format2(sub)?,
            };
            debug!(
                "cmap: primary subtable format {} ({},{}) with {} entries",
                rec.format,
                rec.platform_id,
                rec.encoding_id,
                pairs.len()
            );
            merge(&mut cmap.map, pairs);
        }

        Ok(cmap)
    }

    /// Build directly from a code point map, e.g. for a subset font.
    pub fn from_map(map: BTreeMap<u32, u16>) -> Self {
        Self {
            map,
            variations: Vec::new(),
        }
    }

    pub fn glyph_id(&self, code_point: u32) -> Option<u16> {
        self.map.get(&code_point).copied()
    }

    /// Glyph for a base character followed by a variation selector, if the
    /// font declares that sequence.
    pub fn variation_glyph(&self, code_point: u32, selector: u32) -> Option<u16> {
        let record = self.variations.iter().find(|v| v.selector == selector)?;
        if let Some(&(_, glyph)) = record.non_default.iter().find(|(c, _)| *c == code_point) {
            return Some(glyph);
        }
        record
            .default_ranges
            .iter()
            .any(|&(start, end)| (start..=end).contains(&code_point))
            .then(|| self.glyph_id(code_point))
            .flatten()
    }

    pub fn mappings(&self) -> &BTreeMap<u32, u16> {
        &self.map
    }

    pub fn variations(&self) -> &[VariationSelector] {
        &self.variations
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Glyph → code point, keeping the lowest code point for glyphs that
    /// several characters share.
    pub fn glyph_to_unicode(&self) -> BTreeMap<u16, u32> {
        let mut inverse = BTreeMap::new();
        for (&code, &glyph) in &self.map {
            inverse.entry(glyph).or_insert(code);
        }
        inverse
    }
}

/// Rank of an encoding record for its format; `None` means unusable.
fn preference(rec: &EncodingRecord) -> Option<u8> {
    match (rec.format, rec.platform_id, rec.encoding_id) {
        (12, 3, 10) => Some(0),
        (12, 0, 4) => Some(1),
        (12, 0, 6) => Some(2),
        (12, 0, _) => Some(3),
        (12, _, _) => None,

        (4, 3, 1) => Some(0),
        (4, 0, 3) => Some(1),
        (4, 0, _) => Some(2),
        (4, 3, 0) => Some(3),
        (4, _, _) => None,

        (2, 3, 3) => Some(0),
        (2, 3, _) => Some(1),
        (2, _, _) => None,

        (14, 0, 5) => Some(0),
        (14, _, _) => None,

        (0 | 6, 3, _) => Some(0),
        (0 | 6, 0, _) => Some(1),
        (0 | 6, 1, _) => Some(2),
        _ => None,
    }
}

fn decode_format0(data: &[u8]) -> Result<Vec<(u32, u16)>> {
    let mut r = ByteReader::for_table(TAG, data);
    r.seek(6)?;
    let glyphs = r.read_bytes(256)?;
    Ok(glyphs
        .iter()
        .enumerate()
        .map(|(code, &glyph)| (code as u32, glyph as u16))
        .collect())
}

fn decode_format2(data: &[u8]) -> Result<Vec<(u32, u16)>> {
    const SUBHEADERS: usize = 6 + 512;

    let r = ByteReader::for_table(TAG, data);
    let mut pairs = Vec::new();
    for high in 0..256u32 {
        let key = (r.u16_at(6 + 2 * high as usize)? / 8) as usize;
        let header = SUBHEADERS + key * 8;
        let first_code = r.u16_at(header)? as u32;
        let entry_count = r.u16_at(header + 2)? as u32;
        let id_delta = r.u16_at(header + 4)?;
        let range_pos = header + 6;
        let glyph_base = range_pos + r.u16_at(range_pos)? as usize;

        let glyph_at = |index: u32| -> Result<u16> {
            let raw = r.u16_at(glyph_base + 2 * index as usize)?;
            Ok(if raw == 0 { 0 } else { raw.wrapping_add(id_delta) })
        };

        if key == 0 {
            // One-byte code.
            if high >= first_code && high < first_code + entry_count {
                pairs.push((high, glyph_at(high - first_code)?));
            }
        } else {
            for j in 0..entry_count {
                let code = (high << 8) | ((first_code + j) & 0xFF);
                pairs.push((code, glyph_at(j)?));
            }
        }
    }
    Ok(pairs)
}

fn decode_format4(data: &[u8]) -> Result<Vec<(u32, u16)>> {
    let r = ByteReader::for_table(TAG, data);
    let seg_count = (r.u16_at(6)? / 2) as usize;
    let ends = 14;
    let starts = ends + 2 * seg_count + 2;
    let deltas = starts + 2 * seg_count;
    let ranges = deltas + 2 * seg_count;

    let mut pairs = Vec::new();
    for i in 0..seg_count {
        let end = r.u16_at(ends + 2 * i)?;
        let start = r.u16_at(starts + 2 * i)?;
        let delta = r.u16_at(deltas + 2 * i)?;
        let range_offset = r.u16_at(ranges + 2 * i)? as usize;
        if start > end {
            continue;
        }
        for code in start..=end {
            if code == 0xFFFF {
                continue;
            }
            let glyph = if range_offset == 0 {
                code.wrapping_add(delta)
            } else {
                let at = ranges + 2 * i + range_offset + 2 * (code - start) as usize;
                match r.u16_at(at)? {
                    0 => 0,
                    raw => raw.wrapping_add(delta),
                }
            };
            pairs.push((code as u32, glyph));
        }
    }
    Ok(pairs)
}

fn decode_format6(data: &[u8]) -> Result<Vec<(u32, u16)>> {
    let r = ByteReader::for_table(TAG, data);
    let first_code = r.u16_at(6)? as u32;
    let count = r.u16_at(8)? as usize;
    (0..count)
        .map(|i| Ok((first_code + i as u32, r.u16_at(10 + 2 * i)?)))
        .collect()
}

fn decode_format12(data: &[u8]) -> Result<Vec<(u32, u16)>> {
    let r = ByteReader::for_table(TAG, data);
    let num_groups = r.u32_at(12)? as usize;
    let mut pairs = Vec::new();
    for k in 0..num_groups {
        let at = 16 + 12 * k;
        let start = r.u32_at(at)?;
        let end = r.u32_at(at + 4)?.min(MAX_CODE_POINT);
        let start_glyph = r.u32_at(at + 8)?;
        if start > end {
            continue;
        }
        for code in start..=end {
            let glyph = start_glyph + (code - start);
            if glyph > u16::MAX as u32 {
                break;
            }
            pairs.push((code, glyph as u16));
        }
    }
    Ok(pairs)
}

fn decode_format14(data: &[u8]) -> Result<Vec<VariationSelector>> {
    let mut r = ByteReader::for_table(TAG, data);
    r.seek(6)?;
    let num_records = r.read_u32()?;

    let mut selectors = Vec::new();
    for _ in 0..num_records {
        let selector = r.read_u24()?;
        let default_offset = r.read_u32()? as usize;
        let non_default_offset = r.read_u32()? as usize;

        let mut record = VariationSelector {
            selector,
            default_ranges: Vec::new(),
            non_default: Vec::new(),
        };

        if default_offset != 0 {
            let mut sub = ByteReader::for_table(TAG, data);
            sub.seek(default_offset)?;
            for _ in 0..sub.read_u32()? {
                let start = sub.read_u24()?;
                let additional = sub.read_u8()? as u32;
                record.default_ranges.push((start, start + additional));
            }
        }
        if non_default_offset != 0 {
            let mut sub = ByteReader::for_table(TAG, data);
            sub.seek(non_default_offset)?;
            for _ in 0..sub.read_u32()? {
                let code = sub.read_u24()?;
                let glyph = sub.read_u16()?;
                record.non_default.push((code, glyph));
            }
        }
        selectors.push(record);
    }
    Ok(selectors)
}

// ─── Building ───────────────────────────────────────────────────

/// A cmap table for `map`: a (3,1) format 4 subtable for the BMP, plus a
/// (3,10) format 12 subtable when any mapped code point lies above it.
pub fn build(map: &BTreeMap<u32, u16>) -> Vec<u8> {
    let bmp: Vec<(u16, u16)> = map
        .iter()
        .filter(|(&code, _)| code < 0xFFFF)
        .map(|(&code, &glyph)| (code as u16, glyph))
        .collect();

    let mut subtables = vec![(3u16, 1u16, build_format4(&bmp))];
    if map.keys().any(|&code| code > 0xFFFF) {
        subtables.push((3, 10, build_format12(map)));
    }

    let mut cmap: Vec<u8> = Vec::new();
    cmap.extend_from_slice(&0u16.to_be_bytes()); // version
    cmap.extend_from_slice(&(subtables.len() as u16).to_be_bytes());
    let mut offset = 4 + 8 * subtables.len();
    for (platform, encoding, data) in &subtables {
        cmap.extend_from_slice(&platform.to_be_bytes());
        cmap.extend_from_slice(&encoding.to_be_bytes());
        cmap.extend_from_slice(&(offset as u32).to_be_bytes());
        offset += data.len();
    }
    for (_, _, data) in &subtables {
        cmap.extend_from_slice(data);
    }
    cmap
}

fn build_format4(sorted: &[(u16, u16)]) -> Vec<u8> {
    // (start, end, glyphs) for each run of consecutive code points
    let mut segments: Vec<(u16, u16, Vec<u16>)> = Vec::new();
    for &(ch, gid) in sorted {
        if let Some(last) = segments.last_mut() {
            if ch == last.1 + 1 {
                last.1 = ch;
                last.2.push(gid);
                continue;
            }
        }
        segments.push((ch, ch, vec![gid]));
    }
    segments.push((0xFFFF, 0xFFFF, vec![0]));

    let seg_count = segments.len() as u16;
    let (search_range, entry_selector, range_shift) = search_params(seg_count, 2);

    let mut glyph_id_array: Vec<u16> = Vec::new();
    let mut id_deltas: Vec<i16> = Vec::new();
    let mut id_range_offsets: Vec<u16> = Vec::new();

    for (i, (start, _, gids)) in segments.iter().enumerate() {
        if *start == 0xFFFF {
            id_deltas.push(1);
            id_range_offsets.push(0);
        } else if gids.len() == 1 {
            id_deltas.push((gids[0] as i32 - *start as i32) as i16);
            id_range_offsets.push(0);
        } else {
            id_deltas.push(0);
            // From this idRangeOffset slot to the segment's first glyph id.
            let remaining = segments.len() - i;
            id_range_offsets.push(((remaining + glyph_id_array.len()) * 2) as u16);
            glyph_id_array.extend_from_slice(gids);
        }
    }

    let length = 16 + seg_count as usize * 8 + glyph_id_array.len() * 2;
    let mut subtable: Vec<u8> = Vec::with_capacity(length);
    subtable.extend_from_slice(&4u16.to_be_bytes());
    subtable.extend_from_slice(&(length as u16).to_be_bytes());
    subtable.extend_from_slice(&0u16.to_be_bytes()); // language
    subtable.extend_from_slice(&(seg_count * 2).to_be_bytes());
    subtable.extend_from_slice(&search_range.to_be_bytes());
    subtable.extend_from_slice(&entry_selector.to_be_bytes());
    subtable.extend_from_slice(&range_shift.to_be_bytes());
    for (_, end, _) in &segments {
        subtable.extend_from_slice(&end.to_be_bytes());
    }
    subtable.extend_from_slice(&0u16.to_be_bytes()); // reservedPad
    for (start, _, _) in &segments {
        subtable.extend_from_slice(&start.to_be_bytes());
    }
    for d in &id_deltas {
        subtable.extend_from_slice(&d.to_be_bytes());
    }
    for r in &id_range_offsets {
        subtable.extend_from_slice(&r.to_be_bytes());
    }
    for g in &glyph_id_array {
        subtable.extend_from_slice(&g.to_be_bytes());
    }
    subtable
}

fn build_format12(map: &BTreeMap<u32, u16>) -> Vec<u8> {
    // (start code, end code, start glyph)
    let mut groups: Vec<(u32, u32, u32)> = Vec::new();
    for (&code, &glyph) in map {
        if let Some(last) = groups.last_mut() {
            if code == last.1 + 1 && glyph as u32 == last.2 + (code - last.0) {
                last.1 = code;
                continue;
            }
        }
        groups.push((code, code, glyph as u32));
    }

    let mut subtable = Vec::with_capacity(16 + 12 * groups.len());
    subtable.extend_from_slice(&12u16.to_be_bytes());
    subtable.extend_from_slice(&0u16.to_be_bytes());
    subtable.extend_from_slice(&((16 + 12 * groups.len()) as u32).to_be_bytes());
    subtable.extend_from_slice(&0u32.to_be_bytes()); // language
    subtable.extend_from_slice(&(groups.len() as u32).to_be_bytes());
    for (start, end, glyph) in groups {
        subtable.extend_from_slice(&start.to_be_bytes());
        subtable.extend_from_slice(&end.to_be_bytes());
        subtable.extend_from_slice(&glyph.to_be_bytes());
    }
    subtable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::test_font::{self, UvsRecord};

    const GLYPHS: u16 = 100;

    fn parse(subtables: &[(u16, u16, Vec<u8>)]) -> Cmap {
        Cmap::parse(&test_font::cmap_table(subtables), GLYPHS).unwrap()
    }

    #[test]
    fn test_format4_through_glyph_id_array() {
        let cmap = parse(&[(3, 1, test_font::format4(&[(0x41, 10), (0x42, 11), (0x61, 40)]))]);
        assert_eq!(cmap.glyph_id(0x41), Some(10));
        assert_eq!(cmap.glyph_id(0x42), Some(11));
        assert_eq!(cmap.glyph_id(0x61), Some(40));
        assert_eq!(cmap.glyph_id(0x43), None);
        assert_eq!(cmap.len(), 3);
    }

    #[test]
    fn test_format4_never_maps_ffff() {
        let cmap = parse(&[(3, 1, test_font::format4(&[(0x41, 10), (0xFFFF, 12)]))]);
        assert_eq!(cmap.glyph_id(0xFFFF), None);
        assert_eq!(cmap.glyph_id(0x41), Some(10));
    }

    #[test]
    fn test_format12_wins_over_format4() {
        let cmap = parse(&[
            (3, 1, test_font::format4(&[(0x41, 10), (0x42, 11)])),
            (3, 10, test_font::format12(&[(0x41, 0x41, 20), (0x1F600, 0x1F601, 30)])),
        ]);
        assert_eq!(cmap.glyph_id(0x41), Some(20));
        // Only one of the primary subtables is read.
        assert_eq!(cmap.glyph_id(0x42), None);
        assert_eq!(cmap.glyph_id(0x1F601), Some(31));
    }

    #[test]
    fn test_format4_prefers_windows_unicode() {
        let cmap = parse(&[
            (0, 3, test_font::format4(&[(0x41, 5)])),
            (3, 1, test_font::format4(&[(0x41, 6)])),
        ]);
        assert_eq!(cmap.glyph_id(0x41), Some(6));
    }

    #[test]
    fn test_byte_tables_seed_the_map() {
        let cmap = parse(&[
            (1, 0, test_font::format0(&[(0x20, 3), (0x41, 4)])),
            (3, 1, test_font::format4(&[(0x41, 9)])),
        ]);
        assert_eq!(cmap.glyph_id(0x20), Some(3));
        // The primary subtable overrides the seed.
        assert_eq!(cmap.glyph_id(0x41), Some(9));
    }

    #[test]
    fn test_format6_trimmed_table() {
        let cmap = parse(&[(3, 0, test_font::format6(0x30, &[7, 0, 9]))]);
        assert_eq!(cmap.glyph_id(0x30), Some(7));
        assert_eq!(cmap.glyph_id(0x31), None);
        assert_eq!(cmap.glyph_id(0x32), Some(9));
    }

    #[test]
    fn test_format2_one_and_two_byte_codes() {
        let cmap = parse(&[(3, 3, test_font::format2(&[(0x41, 12)], 0x81, 0x40, &[21, 22]))]);
        assert_eq!(cmap.glyph_id(0x41), Some(12));
        assert_eq!(cmap.glyph_id(0x8140), Some(21));
        assert_eq!(cmap.glyph_id(0x8141), Some(22));
        assert_eq!(cmap.glyph_id(0x81), None);
    }

    #[test]
    fn test_out_of_range_glyphs_dropped() {
        let cmap = parse(&[(3, 10, test_font::format12(&[(0x41, 0x41, GLYPHS as u32)]))]);
        assert!(cmap.is_empty());
    }

    #[test]
    fn test_variation_sequences() {
        let cmap = parse(&[
            (0, 5, test_font::format14(&[UvsRecord {
                selector: 0xFE0F,
                default_ranges: vec![(0x2600, 1)],
                non_default: vec![(0x2764, 50)],
            }])),
            (3, 1, test_font::format4(&[(0x2600, 40), (0x2764, 41)])),
        ]);
        assert_eq!(cmap.variation_glyph(0x2764, 0xFE0F), Some(50));
        assert_eq!(cmap.variation_glyph(0x2600, 0xFE0F), Some(40));
        assert_eq!(cmap.variation_glyph(0x2603, 0xFE0F), None);
        assert_eq!(cmap.variation_glyph(0x2764, 0xFE0E), None);
        // The primary table replaces the overlaid variant for the base character.
        assert_eq!(cmap.glyph_id(0x2764), Some(41));
    }

    #[test]
    fn test_non_default_variant_fills_gap() {
        let cmap = parse(&[(0, 5, test_font::format14(&[UvsRecord {
            selector: 0xE0100,
            default_ranges: vec![],
            non_default: vec![(0x8FBB, 60)],
        }]))]);
        assert_eq!(cmap.glyph_id(0x8FBB), Some(60));
    }

    #[test]
    fn test_truncated_subtable_is_an_error() {
        let mut table = test_font::cmap_table(&[(3, 1, test_font::format4(&[(0x41, 10), (0x50, 11)]))]);
        table.truncate(table.len() - 6);
        assert!(Cmap::parse(&table, GLYPHS).is_err());
    }

    #[test]
    fn test_lowest_code_point_wins_inverse() {
        let cmap = parse(&[(3, 1, test_font::format4(&[(0x20, 3), (0xA0, 3), (0x41, 4)]))]);
        let inverse = cmap.glyph_to_unicode();
        assert_eq!(inverse.get(&3), Some(&0x20));
        assert_eq!(inverse.get(&4), Some(&0x41));
    }

    #[test]
    fn test_built_table_decodes_to_same_map() {
        let mut map = BTreeMap::new();
        for (code, glyph) in [(0x41, 1), (0x42, 2), (0x43, 3), (0x61, 9), (0xE9, 4), (0x1F600, 5), (0x1F601, 6)] {
            map.insert(code, glyph);
        }
        let table = build(&map);
        let cmap = Cmap::parse(&table, GLYPHS).unwrap();
        assert_eq!(cmap.mappings(), &map);

        let bmp_only: BTreeMap<u32, u16> = map.iter().filter(|(c, _)| **c <= 0xFFFF).map(|(c, g)| (*c, *g)).collect();
        let table = build(&bmp_only);
        assert_eq!(u16::from_be_bytes([table[2], table[3]]), 1);
        assert_eq!(Cmap::parse(&table, GLYPHS).unwrap().mappings(), &bmp_only);
    }
}
