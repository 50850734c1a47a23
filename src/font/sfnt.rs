//! # sfnt Container
//!
//! Locates the table directory of a TrueType (`0x00010000` / `true`),
//! OpenType-CFF (`OTTO`) or WOFF (`wOFF`) font and copies every table out
//! into an owned, tag-sorted map. WOFF tables are inflated on the way in, so
//! everything downstream (metrics, cmap, the encoder, the subsetter) only
//! ever sees plain sfnt table bytes.

use std::collections::BTreeMap;

use log::debug;
use miniz_oxide::inflate::decompress_to_vec_zlib;

use super::encode;
use super::reader::ByteReader;
use crate::error::{FolioError, Result};

/// A four-byte table tag, e.g. `*b"head"`.
pub type Tag = [u8; 4];

const SIG_TRUETYPE: u32 = 0x0001_0000;
const SIG_APPLE_TRUE: u32 = 0x7472_7565; // 'true'
const SIG_OTTO: u32 = 0x4F54_544F; // 'OTTO'
const SIG_WOFF: u32 = 0x774F_4646; // 'wOFF'
const SIG_COLLECTION: u32 = 0x7474_6366; // 'ttcf'

/// The container the font arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    TrueType,
    OpenType,
    Woff,
}

/// Outline technology, which decides the sfnt version written on re-encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    TrueType,
    Cff,
}

impl Flavor {
    pub fn sfnt_version(self) -> u32 {
        match self {
            Flavor::TrueType => SIG_TRUETYPE,
            Flavor::Cff => SIG_OTTO,
        }
    }

    fn from_version(version: u32) -> Option<Self> {
        match version {
            SIG_TRUETYPE | SIG_APPLE_TRUE => Some(Flavor::TrueType),
            SIG_OTTO => Some(Flavor::Cff),
            _ => None,
        }
    }
}

/// An owned set of decoded sfnt tables.
#[derive(Debug, Clone)]
pub struct Sfnt {
    signature: Signature,
    flavor: Flavor,
    tables: BTreeMap<Tag, Vec<u8>>,
}

impl Sfnt {
    /// An empty table set, used when building fonts from scratch.
    pub fn new(flavor: Flavor) -> Self {
        let signature = match flavor {
            Flavor::TrueType => Signature::TrueType,
            Flavor::Cff => Signature::OpenType,
        };
        Self {
            signature,
            flavor,
            tables: BTreeMap::new(),
        }
    }

    /// Read the table directory of a font file.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(data);
        let signature = reader.read_u32()?;

        match signature {
            SIG_WOFF => Self::read_woff(data),
            SIG_COLLECTION => Err(FolioError::font(
                "sfnt",
                "font collections (ttcf) are not supported",
            )),
            other => match Flavor::from_version(other) {
                Some(flavor) => Self::read_sfnt(data, flavor),
                None => Err(FolioError::font(
                    "sfnt",
                    format!("unrecognized signature 0x{:08X}", other),
                )),
            },
        }
    }

    fn read_sfnt(data: &[u8], flavor: Flavor) -> Result<Self> {
        let mut reader = ByteReader::new(data);
        reader.seek(4)?;
        let num_tables = reader.read_u16()? as usize;
        reader.skip(6)?; // searchRange, entrySelector, rangeShift

        let mut tables = BTreeMap::new();
        for _ in 0..num_tables {
            let tag = read_tag(&mut reader)?;
            let _checksum = reader.read_u32()?;
            let offset = reader.read_u32()? as usize;
            let length = reader.read_u32()? as usize;
            let bytes = slice_table(data, &tag, offset, length)?;
            tables.insert(tag, bytes.to_vec());
        }

        debug!("sfnt: read {} tables", tables.len());
        let signature = match flavor {
            Flavor::TrueType => Signature::TrueType,
            Flavor::Cff => Signature::OpenType,
        };
        Ok(Self {
            signature,
            flavor,
            tables,
        })
    }

    fn read_woff(data: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(data);
        reader.seek(4)?;
        let flavor_version = reader.read_u32()?;
        let flavor = Flavor::from_version(flavor_version).ok_or_else(|| {
            FolioError::font("wOFF", format!("unknown flavor 0x{:08X}", flavor_version))
        })?;
        reader.skip(4)?; // length
        let num_tables = reader.read_u16()? as usize;
        reader.seek(44)?;

        let mut tables = BTreeMap::new();
        for _ in 0..num_tables {
            let tag = read_tag(&mut reader)?;
            let offset = reader.read_u32()? as usize;
            let comp_length = reader.read_u32()? as usize;
            let orig_length = reader.read_u32()? as usize;
            let _orig_checksum = reader.read_u32()?;

            let packed = slice_table(data, &tag, offset, comp_length)?;
            let bytes = if comp_length < orig_length {
                let inflated = decompress_to_vec_zlib(packed).map_err(|e| {
                    FolioError::font(tag_name(&tag), format!("WOFF inflate failed: {:?}", e.status))
                })?;
                if inflated.len() != orig_length {
                    return Err(FolioError::font(
                        tag_name(&tag),
                        format!(
                            "WOFF table inflated to {} bytes, expected {}",
                            inflated.len(),
                            orig_length
                        ),
                    ));
                }
                inflated
            } else {
                packed.to_vec()
            };
            tables.insert(tag, bytes);
        }

        debug!("wOFF: read {} tables", tables.len());
        Ok(Self {
            signature: Signature::Woff,
            flavor,
            tables,
        })
    }

    pub fn signature(&self) -> Signature {
        self.signature
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn table(&self, tag: &Tag) -> Option<&[u8]> {
        self.tables.get(tag).map(Vec::as_slice)
    }

    /// A table that must exist for the font to be usable.
    pub fn require(&self, tag: &Tag) -> Result<&[u8]> {
        self.table(tag)
            .ok_or_else(|| FolioError::font(tag_name(tag), "missing required table"))
    }

    pub fn insert_table(&mut self, tag: Tag, data: Vec<u8>) {
        self.tables.insert(tag, data);
    }

    pub fn remove_table(&mut self, tag: &Tag) -> Option<Vec<u8>> {
        self.tables.remove(tag)
    }

    /// Tables in ascending tag order, the order the directory is written in.
    pub fn tables(&self) -> impl Iterator<Item = (&Tag, &[u8])> {
        self.tables.iter().map(|(tag, data)| (tag, data.as_slice()))
    }

    pub fn num_tables(&self) -> usize {
        self.tables.len()
    }

    /// Reassemble a plain sfnt binary from the held tables.
    pub fn encode(&self) -> Vec<u8> {
        encode::encode_sfnt(self.flavor.sfnt_version(), self.tables())
    }
}

fn read_tag(reader: &mut ByteReader<'_>) -> Result<Tag> {
    let bytes = reader.read_bytes(4)?;
    Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn slice_table<'a>(data: &'a [u8], tag: &Tag, offset: usize, length: usize) -> Result<&'a [u8]> {
    offset
        .checked_add(length)
        .filter(|&end| end <= data.len())
        .map(|end| &data[offset..end])
        .ok_or_else(|| {
            FolioError::font(
                tag_name(tag),
                format!(
                    "table data at {}..{} lies outside the {}-byte file",
                    offset,
                    offset.saturating_add(length),
                    data.len()
                ),
            )
        })
}

/// Printable form of a tag for error messages.
pub fn tag_name(tag: &Tag) -> String {
    tag.iter().map(|&b| b as char).collect()
}
