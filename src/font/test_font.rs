//! Synthetic TrueType fonts for tests.
//!
//! Builds small but complete fonts byte by byte so tests never depend on a
//! font file being installed. Shared by the unit tests and, through a
//! `#[path]` include, by `tests/integration.rs`; it therefore only uses std.
//!
//! The default font has upem 2048 and seven glyphs:
//!
//! | gid | char    | advance | notes                        |
//! |-----|---------|---------|------------------------------|
//! | 0   | .notdef | 1024    |                              |
//! | 1   | A       | 1366    |                              |
//! | 2   | B       | 1300    |                              |
//! | 3   | C       | 1400    |                              |
//! | 4   | Á       | 1366    | composite of glyphs 1 and 5  |
//! | 5   | ´       | 1366    | past numberOfHMetrics        |
//! | 6   | U+1F600 | 1366    | reachable through format 12  |

#![allow(dead_code)]

pub type Tag = [u8; 4];

pub const UNITS_PER_EM: u16 = 2048;
pub const NUM_GLYPHS: u16 = 7;
pub const NUM_H_METRICS: u16 = 5;
pub const ADVANCES: [u16; 5] = [1024, 1366, 1300, 1400, 1366];
pub const TRAILING_LSB: [i16; 2] = [100, 50];
pub const ASCENT: i16 = 1638;
pub const DESCENT: i16 = -410;
pub const CAP_HEIGHT: i16 = 1434;
pub const BBOX: [i16; 4] = [-100, -400, 2000, 1800];
pub const SMILEY: u32 = 0x1F600;

/// Character map of the default font.
pub const DEFAULT_MAP: &[(u32, u16)] = &[
    (0x41, 1),
    (0x42, 2),
    (0x43, 3),
    (0xB4, 5),
    (0xC1, 4),
    (SMILEY, 6),
];

/// Knobs for the tables that feed font metrics and flags.
#[derive(Clone)]
pub struct TestFont {
    pub units_per_em: u16,
    pub os2_version: u16,
    /// Full sFamilyClass word: class in the high byte.
    pub family_class: i16,
    pub italic_angle: f64,
    pub fixed_pitch: bool,
    pub cmap: Vec<u8>,
    pub omit: Vec<Tag>,
}

impl Default for TestFont {
    fn default() -> Self {
        Self {
            units_per_em: UNITS_PER_EM,
            os2_version: 2,
            family_class: 0,
            italic_angle: 0.0,
            fixed_pitch: false,
            cmap: default_cmap(),
            omit: Vec::new(),
        }
    }
}

impl TestFont {
    pub fn build(&self) -> Vec<u8> {
        let (glyf, loca) = glyf_and_loca();
        let mut tables: Vec<(Tag, Vec<u8>)> = vec![
            (*b"OS/2", self.os2()),
            (*b"cmap", self.cmap.clone()),
            (*b"glyf", glyf),
            (*b"head", self.head()),
            (*b"hhea", hhea()),
            (*b"hmtx", hmtx()),
            (*b"loca", loca),
            (*b"maxp", maxp()),
            (*b"name", name("Folio Test")),
            (*b"post", self.post()),
        ];
        tables.retain(|(tag, _)| !self.omit.contains(tag));
        assemble(0x0001_0000, &tables)
    }

    fn head(&self) -> Vec<u8> {
        let mut t = Vec::new();
        put_u32(&mut t, 0x0001_0000);
        put_u32(&mut t, 0x0001_0000);
        put_u32(&mut t, 0); // checkSumAdjustment
        put_u32(&mut t, 0x5F0F_3CF5);
        put_u16(&mut t, 0x000B);
        put_u16(&mut t, self.units_per_em);
        t.extend_from_slice(&[0; 16]); // created, modified
        for v in BBOX {
            put_i16(&mut t, v);
        }
        put_u16(&mut t, 0); // macStyle
        put_u16(&mut t, 8); // lowestRecPPEM
        put_i16(&mut t, 2); // fontDirectionHint
        put_i16(&mut t, 1); // indexToLocFormat: long
        put_i16(&mut t, 0);
        assert_eq!(t.len(), 54);
        t
    }

    fn os2(&self) -> Vec<u8> {
        let mut t = vec![0u8; if self.os2_version >= 2 { 96 } else { 78 }];
        t[0..2].copy_from_slice(&self.os2_version.to_be_bytes());
        t[4..6].copy_from_slice(&400u16.to_be_bytes());
        t[6..8].copy_from_slice(&5u16.to_be_bytes());
        t[30..32].copy_from_slice(&self.family_class.to_be_bytes());
        t[68..70].copy_from_slice(&ASCENT.to_be_bytes()); // sTypoAscender
        t[70..72].copy_from_slice(&DESCENT.to_be_bytes());
        if self.os2_version >= 2 {
            t[88..90].copy_from_slice(&CAP_HEIGHT.to_be_bytes());
        }
        t
    }

    fn post(&self) -> Vec<u8> {
        let mut t = Vec::new();
        put_u32(&mut t, 0x0003_0000);
        put_u32(&mut t, (self.italic_angle * 65536.0) as i32 as u32);
        put_i16(&mut t, -100);
        put_i16(&mut t, 50);
        put_u32(&mut t, self.fixed_pitch as u32);
        t.extend_from_slice(&[0; 16]);
        t
    }
}

pub fn build() -> Vec<u8> {
    TestFont::default().build()
}

/// A font whose cmap is replaced by `cmap`.
pub fn with_cmap(cmap: Vec<u8>) -> Vec<u8> {
    TestFont {
        cmap,
        ..TestFont::default()
    }
    .build()
}

pub fn default_cmap() -> Vec<u8> {
    let bmp: Vec<(u16, u16)> = DEFAULT_MAP
        .iter()
        .filter(|(c, _)| *c <= 0xFFFF)
        .map(|&(c, g)| (c as u16, g))
        .collect();
    cmap_table(&[
        (3, 1, format4(&bmp)),
        (3, 10, format12(&[(0x41, 0x43, 1), (0xB4, 0xB4, 5), (0xC1, 0xC1, 4), (SMILEY, SMILEY, 6)])),
    ])
}

fn hhea() -> Vec<u8> {
    let mut t = Vec::new();
    put_u32(&mut t, 0x0001_0000);
    put_i16(&mut t, ASCENT);
    put_i16(&mut t, DESCENT);
    put_i16(&mut t, 0); // lineGap
    put_u16(&mut t, 1400); // advanceWidthMax
    put_i16(&mut t, -100);
    put_i16(&mut t, 0);
    put_i16(&mut t, 2000);
    put_i16(&mut t, 1); // caretSlopeRise
    put_i16(&mut t, 0);
    put_i16(&mut t, 0);
    t.extend_from_slice(&[0; 8]);
    put_i16(&mut t, 0); // metricDataFormat
    put_u16(&mut t, NUM_H_METRICS);
    assert_eq!(t.len(), 36);
    t
}

fn hmtx() -> Vec<u8> {
    let mut t = Vec::new();
    for adv in ADVANCES {
        put_u16(&mut t, adv);
        put_i16(&mut t, 0);
    }
    for lsb in TRAILING_LSB {
        put_i16(&mut t, lsb);
    }
    t
}

fn maxp() -> Vec<u8> {
    let mut t = Vec::new();
    put_u32(&mut t, 0x0001_0000);
    put_u16(&mut t, NUM_GLYPHS);
    for v in [4u16, 1, 8, 2, 2, 0, 0, 0, 0, 0, 0, 2, 1] {
        put_u16(&mut t, v);
    }
    assert_eq!(t.len(), 32);
    t
}

pub fn name(full_name: &str) -> Vec<u8> {
    let text: Vec<u8> = full_name.encode_utf16().flat_map(|c| c.to_be_bytes()).collect();
    let mut t = Vec::new();
    put_u16(&mut t, 0);
    put_u16(&mut t, 1);
    put_u16(&mut t, 18);
    for v in [3u16, 1, 0x0409, 4, text.len() as u16, 0] {
        put_u16(&mut t, v);
    }
    t.extend_from_slice(&text);
    t
}

fn square(width: i16, height: i16) -> Vec<u8> {
    let mut g = Vec::new();
    put_i16(&mut g, 1);
    for v in [0, 0, width, height] {
        put_i16(&mut g, v);
    }
    put_u16(&mut g, 3); // endPtsOfContours
    put_u16(&mut g, 0); // instructionLength
    g.extend_from_slice(&[0x01; 4]);
    for dx in [0, 0, width, 0] {
        put_i16(&mut g, dx);
    }
    for dy in [0, height, 0, -height] {
        put_i16(&mut g, dy);
    }
    g
}

fn composite(base: u16, mark: u16) -> Vec<u8> {
    let mut g = Vec::new();
    put_i16(&mut g, -1);
    for v in [0, 0, 1200, 1800] {
        put_i16(&mut g, v);
    }
    // ARG_1_AND_2_ARE_WORDS | ARGS_ARE_XY_VALUES | MORE_COMPONENTS
    put_u16(&mut g, 0x0023);
    put_u16(&mut g, base);
    put_i16(&mut g, 0);
    put_i16(&mut g, 0);
    put_u16(&mut g, 0x0003);
    put_u16(&mut g, mark);
    put_i16(&mut g, 300);
    put_i16(&mut g, 1500);
    g
}

/// Glyph outlines and a long-format loca.
fn glyf_and_loca() -> (Vec<u8>, Vec<u8>) {
    let glyphs = [
        square(900, 1400),
        square(1200, 1400),
        square(1100, 1400),
        square(1300, 1400),
        composite(1, 5),
        square(400, 300),
        square(1800, 1800),
    ];
    let mut glyf = Vec::new();
    let mut loca = Vec::new();
    for g in &glyphs {
        put_u32(&mut loca, glyf.len() as u32);
        glyf.extend_from_slice(g);
        while glyf.len() % 4 != 0 {
            glyf.push(0);
        }
    }
    put_u32(&mut loca, glyf.len() as u32);
    (glyf, loca)
}

// ─── cmap subtables ─────────────────────────────────────────────

pub fn cmap_table(subtables: &[(u16, u16, Vec<u8>)]) -> Vec<u8> {
    let mut t = Vec::new();
    put_u16(&mut t, 0);
    put_u16(&mut t, subtables.len() as u16);
    let mut offset = 4 + subtables.len() * 8;
    for (platform, encoding, data) in subtables {
        put_u16(&mut t, *platform);
        put_u16(&mut t, *encoding);
        put_u32(&mut t, offset as u32);
        offset += data.len();
    }
    for (_, _, data) in subtables {
        t.extend_from_slice(data);
    }
    t
}

pub fn format0(map: &[(u8, u8)]) -> Vec<u8> {
    let mut glyphs = [0u8; 256];
    for &(c, g) in map {
        glyphs[c as usize] = g;
    }
    let mut t = Vec::new();
    put_u16(&mut t, 0);
    put_u16(&mut t, 262);
    put_u16(&mut t, 0);
    t.extend_from_slice(&glyphs);
    t
}

/// High-byte mapping: one-byte codes through subheader 0, plus a run of
/// two-byte codes `lead << 8 | (first + i)`.
pub fn format2(single: &[(u8, u16)], lead: u8, first: u16, glyphs: &[u16]) -> Vec<u8> {
    let mut t = Vec::new();
    put_u16(&mut t, 2);
    put_u16(&mut t, 0); // length, patched below
    put_u16(&mut t, 0);
    for high in 0..256usize {
        put_u16(&mut t, if high == lead as usize { 8 } else { 0 });
    }
    // Subheaders start at 518, glyph arrays at 534 and 534 + 512.
    for v in [0u16, 256, 0, 10] {
        put_u16(&mut t, v);
    }
    for v in [first, glyphs.len() as u16, 0, 514] {
        put_u16(&mut t, v);
    }
    let mut one_byte = [0u16; 256];
    for &(c, g) in single {
        one_byte[c as usize] = g;
    }
    for g in one_byte {
        put_u16(&mut t, g);
    }
    for &g in glyphs {
        put_u16(&mut t, g);
    }
    let len = t.len() as u16;
    t[2..4].copy_from_slice(&len.to_be_bytes());
    t
}

/// Format 4 with every mapped segment going through glyphIdArray. A
/// mapping for U+FFFF lands in the terminating segment.
pub fn format4(map: &[(u16, u16)]) -> Vec<u8> {
    let mut sorted: Vec<(u16, u16)> = map.iter().copied().filter(|&(c, _)| c != 0xFFFF).collect();
    sorted.sort();
    let last_glyph = map
        .iter()
        .find(|&&(c, _)| c == 0xFFFF)
        .map(|&(_, g)| g)
        .unwrap_or(0);

    let mut segments: Vec<(u16, u16, Vec<u16>)> = Vec::new();
    for (c, g) in sorted {
        if let Some(seg) = segments.last_mut() {
            if c == seg.1 + 1 {
                seg.1 = c;
                seg.2.push(g);
                continue;
            }
        }
        segments.push((c, c, vec![g]));
    }

    let seg_count = segments.len() + 1;
    let (mut ends, mut starts, mut deltas, mut ranges, mut glyph_ids) =
        (Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new());
    for (i, (start, end, gids)) in segments.iter().enumerate() {
        starts.push(*start);
        ends.push(*end);
        deltas.push(0u16);
        ranges.push(((seg_count - i + glyph_ids.len()) * 2) as u16);
        glyph_ids.extend_from_slice(gids);
    }
    starts.push(0xFFFF);
    ends.push(0xFFFF);
    deltas.push(last_glyph.wrapping_sub(0xFFFF));
    ranges.push(0);

    let entry_selector = (seg_count as f64).log2().floor() as u16;
    let search_range = (1u16 << entry_selector) * 2;
    let mut t = Vec::new();
    put_u16(&mut t, 4);
    put_u16(&mut t, (16 + 8 * seg_count + 2 * glyph_ids.len()) as u16);
    put_u16(&mut t, 0);
    put_u16(&mut t, (seg_count * 2) as u16);
    put_u16(&mut t, search_range);
    put_u16(&mut t, entry_selector);
    put_u16(&mut t, (seg_count * 2) as u16 - search_range);
    for v in &ends {
        put_u16(&mut t, *v);
    }
    put_u16(&mut t, 0);
    for list in [&starts, &deltas, &ranges, &glyph_ids] {
        for v in list.iter() {
            put_u16(&mut t, *v);
        }
    }
    t
}

pub fn format6(first: u16, glyphs: &[u16]) -> Vec<u8> {
    let mut t = Vec::new();
    put_u16(&mut t, 6);
    put_u16(&mut t, (10 + 2 * glyphs.len()) as u16);
    put_u16(&mut t, 0);
    put_u16(&mut t, first);
    put_u16(&mut t, glyphs.len() as u16);
    for &g in glyphs {
        put_u16(&mut t, g);
    }
    t
}

/// Sequential map groups `(start, end, start_glyph)`.
pub fn format12(groups: &[(u32, u32, u32)]) -> Vec<u8> {
    let mut t = Vec::new();
    put_u16(&mut t, 12);
    put_u16(&mut t, 0);
    put_u32(&mut t, (16 + 12 * groups.len()) as u32);
    put_u32(&mut t, 0);
    put_u32(&mut t, groups.len() as u32);
    for &(start, end, glyph) in groups {
        put_u32(&mut t, start);
        put_u32(&mut t, end);
        put_u32(&mut t, glyph);
    }
    t
}

/// One variation selector record: default ranges `(start, additional)` and
/// non-default mappings `(unicode, glyph)`.
pub struct UvsRecord {
    pub selector: u32,
    pub default_ranges: Vec<(u32, u8)>,
    pub non_default: Vec<(u32, u16)>,
}

pub fn format14(records: &[UvsRecord]) -> Vec<u8> {
    let header_len = 10 + 11 * records.len();
    let mut body = Vec::new();
    let mut offsets = Vec::new();
    for rec in records {
        let default_offset = if rec.default_ranges.is_empty() {
            0
        } else {
            let at = header_len + body.len();
            put_u32(&mut body, rec.default_ranges.len() as u32);
            for &(start, additional) in &rec.default_ranges {
                put_u24(&mut body, start);
                body.push(additional);
            }
            at
        };
        let non_default_offset = if rec.non_default.is_empty() {
            0
        } else {
            let at = header_len + body.len();
            put_u32(&mut body, rec.non_default.len() as u32);
            for &(unicode, glyph) in &rec.non_default {
                put_u24(&mut body, unicode);
                put_u16(&mut body, glyph);
            }
            at
        };
        offsets.push((default_offset, non_default_offset));
    }

    let mut t = Vec::new();
    put_u16(&mut t, 14);
    put_u32(&mut t, (header_len + body.len()) as u32);
    put_u32(&mut t, records.len() as u32);
    for (rec, (default_offset, non_default_offset)) in records.iter().zip(offsets) {
        put_u24(&mut t, rec.selector);
        put_u32(&mut t, default_offset as u32);
        put_u32(&mut t, non_default_offset as u32);
    }
    t.extend_from_slice(&body);
    t
}

// ─── Containers ─────────────────────────────────────────────────

/// A plain sfnt file from unsorted tables, with directory checksums.
pub fn assemble(version: u32, tables: &[(Tag, Vec<u8>)]) -> Vec<u8> {
    let mut tables = tables.to_vec();
    tables.sort_by_key(|(tag, _)| *tag);
    let n = tables.len();
    let entry_selector = if n > 0 { (n as f64).log2().floor() as u16 } else { 0 };
    let search_range = (1u16 << entry_selector) * 16;

    let mut out = Vec::new();
    put_u32(&mut out, version);
    put_u16(&mut out, n as u16);
    put_u16(&mut out, search_range);
    put_u16(&mut out, entry_selector);
    put_u16(&mut out, (n as u16 * 16).saturating_sub(search_range));

    let mut offset = 12 + 16 * n;
    for (tag, data) in &tables {
        out.extend_from_slice(tag);
        put_u32(&mut out, checksum(data));
        put_u32(&mut out, offset as u32);
        put_u32(&mut out, data.len() as u32);
        offset += (data.len() + 3) & !3;
    }
    for (_, data) in &tables {
        out.extend_from_slice(data);
        while out.len() % 4 != 0 {
            out.push(0);
        }
    }
    out
}

/// The tables of a plain sfnt file, in directory order.
pub fn tables_of(font: &[u8]) -> Vec<(Tag, Vec<u8>)> {
    let n = u16::from_be_bytes([font[4], font[5]]) as usize;
    (0..n)
        .map(|i| {
            let rec = 12 + 16 * i;
            let tag = [font[rec], font[rec + 1], font[rec + 2], font[rec + 3]];
            let offset = get_u32(font, rec + 8) as usize;
            let length = get_u32(font, rec + 12) as usize;
            (tag, font[offset..offset + length].to_vec())
        })
        .collect()
}

/// Rewrap a plain sfnt file as WOFF 1.0, passing each table through `pack`.
/// Packed data that does not shrink is stored as-is.
pub fn wrap_woff(font: &[u8], pack: impl Fn(&[u8]) -> Vec<u8>) -> Vec<u8> {
    let tables = tables_of(font);
    let n = tables.len();
    let mut dir = Vec::new();
    let mut data = Vec::new();
    let data_start = 44 + 20 * n;
    for (tag, table) in &tables {
        let packed = pack(table);
        let stored = if packed.len() < table.len() { packed } else { table.clone() };
        dir.extend_from_slice(tag);
        put_u32(&mut dir, (data_start + data.len()) as u32);
        put_u32(&mut dir, stored.len() as u32);
        put_u32(&mut dir, table.len() as u32);
        put_u32(&mut dir, checksum(table));
        data.extend_from_slice(&stored);
        while data.len() % 4 != 0 {
            data.push(0);
        }
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"wOFF");
    out.extend_from_slice(&font[0..4]);
    put_u32(&mut out, (data_start + data.len()) as u32);
    put_u16(&mut out, n as u16);
    put_u16(&mut out, 0);
    put_u32(&mut out, font.len() as u32);
    put_u16(&mut out, 1);
    put_u16(&mut out, 0);
    out.extend_from_slice(&[0; 20]); // metadata and private blocks
    out.extend_from_slice(&dir);
    out.extend_from_slice(&data);
    out
}

pub fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

pub fn get_u16(data: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([data[at], data[at + 1]])
}

pub fn get_u32(data: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn put_i16(out: &mut Vec<u8>, v: i16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn put_u24(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes()[1..]);
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}
