//! # sfnt Encoder
//!
//! Writes a table set back out as a plain sfnt binary: offset table, a
//! tag-sorted directory with per-table checksums, 4-byte aligned table data,
//! and finally the `head.checkSumAdjustment` that makes the whole file sum to
//! `0xB1B0AFBA`.

use super::sfnt::Tag;

/// Whole-file checksum target defined by the sfnt format.
pub const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;

/// Byte offset of `checkSumAdjustment` inside the `head` table.
const HEAD_ADJUSTMENT_OFFSET: usize = 8;

/// Encode tables (already in ascending tag order) under the given sfnt version.
pub fn encode_sfnt<'a>(sfnt_version: u32, tables: impl Iterator<Item = (&'a Tag, &'a [u8])>) -> Vec<u8> {
    let tables: Vec<(&Tag, &[u8])> = tables.collect();
    let num_tables = tables.len() as u16;
    let (search_range, entry_selector, range_shift) = search_params(num_tables, 16);

    let mut output: Vec<u8> = Vec::new();
    output.extend_from_slice(&sfnt_version.to_be_bytes());
    output.extend_from_slice(&num_tables.to_be_bytes());
    output.extend_from_slice(&search_range.to_be_bytes());
    output.extend_from_slice(&entry_selector.to_be_bytes());
    output.extend_from_slice(&range_shift.to_be_bytes());

    let dir_size = 12 + tables.len() * 16;
    let mut table_offset = dir_size;
    let mut head_offset = None;

    for (tag, data) in &tables {
        let checksum = if *tag == b"head" {
            head_offset = Some(table_offset);
            head_checksum(data)
        } else {
            table_checksum(data)
        };
        output.extend_from_slice(*tag);
        output.extend_from_slice(&checksum.to_be_bytes());
        output.extend_from_slice(&(table_offset as u32).to_be_bytes());
        output.extend_from_slice(&(data.len() as u32).to_be_bytes());
        table_offset += padded_len(data.len());
    }

    for (tag, data) in &tables {
        let start = output.len();
        output.extend_from_slice(data);
        if *tag == b"head" && data.len() >= HEAD_ADJUSTMENT_OFFSET + 4 {
            // Zeroed while summing; filled in below.
            output[start + HEAD_ADJUSTMENT_OFFSET..start + HEAD_ADJUSTMENT_OFFSET + 4]
                .copy_from_slice(&[0; 4]);
        }
        output.resize(start + padded_len(data.len()), 0);
    }

    if let Some(offset) = head_offset {
        let at = offset + HEAD_ADJUSTMENT_OFFSET;
        if at + 4 <= output.len() {
            let adjustment = CHECKSUM_MAGIC.wrapping_sub(table_checksum(&output));
            output[at..at + 4].copy_from_slice(&adjustment.to_be_bytes());
        }
    }

    output
}

/// `(searchRange, entrySelector, rangeShift)` for `count` records of `unit` bytes.
pub(crate) fn search_params(count: u16, unit: u16) -> (u16, u16, u16) {
    if count == 0 {
        return (0, 0, 0);
    }
    let entry_selector = 15 - count.leading_zeros() as u16;
    let search_range = (1u32 << entry_selector) * unit as u32;
    let range_shift = (count as u32 * unit as u32).saturating_sub(search_range);
    // Large directories overflow the u16 fields; clamp rather than wrap.
    let clamp = |v: u32| v.min(u16::MAX as u32) as u16;
    (clamp(search_range), entry_selector, clamp(range_shift))
}

/// Sum of big-endian u32 words, the final partial word zero-padded.
pub fn table_checksum(data: &[u8]) -> u32 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(4);
    for word in &mut chunks {
        sum = sum.wrapping_add(u32::from_be_bytes([word[0], word[1], word[2], word[3]]));
    }
    let rest = chunks.remainder();
    if !rest.is_empty() {
        let mut last = [0u8; 4];
        last[..rest.len()].copy_from_slice(rest);
        sum = sum.wrapping_add(u32::from_be_bytes(last));
    }
    sum
}

/// Checksum of a `head` table with `checkSumAdjustment` treated as zero.
fn head_checksum(data: &[u8]) -> u32 {
    let mut sum = table_checksum(data);
    if data.len() >= HEAD_ADJUSTMENT_OFFSET + 4 {
        let a = &data[HEAD_ADJUSTMENT_OFFSET..HEAD_ADJUSTMENT_OFFSET + 4];
        sum = sum.wrapping_sub(u32::from_be_bytes([a[0], a[1], a[2], a[3]]));
    }
    sum
}

fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::sfnt::{Flavor, Sfnt};
    use crate::font::test_font;

    fn u32_at(data: &[u8], at: usize) -> u32 {
        u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
    }

    #[test]
    fn test_table_checksum() {
        assert_eq!(table_checksum(b"ABCD"), 0x41424344);
        // Trailing bytes are padded with zeros.
        assert_eq!(table_checksum(b"ABCDE"), 0x41424344 + 0x45000000);
        assert_eq!(table_checksum(&[]), 0);
    }

    #[test]
    fn test_search_params() {
        assert_eq!(search_params(1, 16), (16, 0, 0));
        assert_eq!(search_params(9, 16), (128, 3, 16));
        assert_eq!(search_params(16, 16), (256, 4, 0));
        assert_eq!(search_params(5, 2), (8, 2, 2));
    }

    #[test]
    fn test_search_params_clamp_large_directories() {
        assert_eq!(search_params(4096, 16), (u16::MAX, 12, 0));
        assert_eq!(search_params(5000, 16), (u16::MAX, 12, 14464));
        assert_eq!(search_params(u16::MAX, 16), (u16::MAX, 15, u16::MAX));
    }

    #[test]
    fn test_whole_file_sums_to_magic() {
        let sfnt = Sfnt::from_bytes(&test_font::build()).unwrap();
        let out = sfnt.encode();
        assert_eq!(table_checksum(&out), CHECKSUM_MAGIC);
    }

    #[test]
    fn test_directory_is_sorted_and_aligned() {
        let sfnt = Sfnt::from_bytes(&test_font::build()).unwrap();
        let out = sfnt.encode();
        let n = u16::from_be_bytes([out[4], out[5]]) as usize;
        assert_eq!(n, sfnt.num_tables());

        let mut last_tag = 0u32;
        for i in 0..n {
            let rec = 12 + i * 16;
            let tag = u32_at(&out, rec);
            let offset = u32_at(&out, rec + 8) as usize;
            let length = u32_at(&out, rec + 12) as usize;
            assert!(tag > last_tag);
            last_tag = tag;
            assert_eq!(offset % 4, 0);
            assert!(offset + length <= out.len());

            // Directory checksums match the data (head with its adjustment zeroed).
            let mut data = out[offset..offset + length].to_vec();
            if &tag.to_be_bytes() == b"head" {
                data[8..12].copy_from_slice(&[0; 4]);
            }
            assert_eq!(u32_at(&out, rec + 4), table_checksum(&data));
        }
    }

    #[test]
    fn test_preserves_cff_flavor() {
        let mut sfnt = Sfnt::new(Flavor::Cff);
        sfnt.insert_table(*b"CFF ", vec![1, 0, 4, 2]);
        let out = sfnt.encode();
        assert_eq!(&out[0..4], b"OTTO");
        assert_eq!(u16::from_be_bytes([out[4], out[5]]), 1);
    }

    #[test]
    fn test_re_encoding_is_stable() {
        let sfnt = Sfnt::from_bytes(&test_font::build()).unwrap();
        let once = sfnt.encode();
        let twice = Sfnt::from_bytes(&once).unwrap().encode();
        assert_eq!(once, twice);
    }
}
