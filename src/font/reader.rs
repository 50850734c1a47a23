//! Cursor-based big-endian reader over a font table.
//!
//! Every read is bounds-checked; running off the end of the buffer yields a
//! `FontParse` error naming the table being decoded.

use crate::error::{FolioError, Result};

pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    tag: &'a str,
}

impl<'a> ByteReader<'a> {
    /// A reader over a whole font file.
    pub fn new(data: &'a [u8]) -> Self {
        Self::for_table("sfnt", data)
    }

    /// A reader over one table; errors are reported against `tag`.
    pub fn for_table(tag: &'a str, data: &'a [u8]) -> Self {
        Self { data, pos: 0, tag }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(self.out_of_bounds(pos, 0));
        }
        self.pos = pos;
        Ok(())
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.seek(self.pos + count)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| self.out_of_bounds(self.pos, len))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Read `len` bytes as a Latin-1 string (table tags, signatures).
    pub fn read_string(&mut self, len: usize) -> Result<String> {
        Ok(self.read_bytes(len)?.iter().map(|&b| b as char).collect())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        let b = self.read_bytes(3)?;
        Ok(((b[0] as u32) << 16) | ((b[1] as u32) << 8) | b[2] as u32)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    /// 16.16 signed fixed-point.
    pub fn read_fixed(&mut self) -> Result<f64> {
        Ok(self.read_i32()? as f64 / 65536.0)
    }

    /// LONGDATETIME: signed seconds since 1904-01-01 00:00 UTC.
    pub fn read_long_datetime(&mut self) -> Result<i64> {
        let b = self.read_bytes(8)?;
        Ok(i64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }

    /// Positioned reads that leave the cursor untouched.
    pub fn u16_at(&self, offset: usize) -> Result<u16> {
        let mut r = ByteReader { data: self.data, pos: 0, tag: self.tag };
        r.seek(offset)?;
        r.read_u16()
    }

    pub fn i16_at(&self, offset: usize) -> Result<i16> {
        Ok(self.u16_at(offset)? as i16)
    }

    pub fn u32_at(&self, offset: usize) -> Result<u32> {
        let mut r = ByteReader { data: self.data, pos: 0, tag: self.tag };
        r.seek(offset)?;
        r.read_u32()
    }

    fn out_of_bounds(&self, at: usize, len: usize) -> FolioError {
        FolioError::font(
            self.tag,
            format!(
                "read of {} byte(s) at offset {} exceeds table length {}",
                len,
                at,
                self.data.len()
            ),
        )
    }
}
