//! MFT record header and attribute list.
//!
//! Attribute headers are variable length and fully controlled by the medium. The walker
//! decodes each one at an explicit offset and stops at the first header that does not fit
//! inside the record.

use binread::{BinRead, BinReaderExt};
use getset::{CopyGetters, Getters};
use log::trace;
use std::io;

use super::ntfs_error::NtfsError;
use crate::utils::{u8_at, u16_at, u32_at};

/// Magic tag at the start of every in-use MFT record.
pub const MFT_RECORD_MAGIC: &[u8; 4] = b"FILE";

/// Attribute type codes.
pub const ATTR_VOLUME_NAME: u32 = 0x60;
pub const ATTR_VOLUME_INFORMATION: u32 = 0x70;
/// Marks the end of the attribute list.
pub const ATTR_END: u32 = 0xFFFF_FFFF;

/// Bytes of an attribute header the walker decodes (up to and including the value offset).
const ATTR_HEADER_LEN: usize = 0x16;

/// Fixed header of an MFT record.
#[derive(BinRead, Debug, Getters)]
#[br(little)]
pub struct MftRecordHeader {
    /// "FILE"
    #[get = "pub"]
    magic: [u8; 4],
    /// Offset of the update sequence array
    #[get = "pub"]
    usa_offset: u16,
    /// Number of entries in the update sequence array
    #[get = "pub"]
    usa_count: u16,
    /// $LogFile sequence number
    #[get = "pub"]
    lsn: u64,
    #[get = "pub"]
    sequence_number: u16,
    #[get = "pub"]
    link_count: u16,
    /// Offset of the first attribute, relative to the record start
    #[get = "pub"]
    attrs_offset: u16,
    #[get = "pub"]
    flags: u16,
    /// Bytes of the record actually used
    #[get = "pub"]
    bytes_in_use: u32,
    /// Bytes allocated for the record
    #[get = "pub"]
    bytes_allocated: u32,
}

/// A validated MFT record borrowing the buffer it was read into.
pub struct MftRecord<'a> {
    header: MftRecordHeader,
    buf: &'a [u8],
}

impl<'a> MftRecord<'a> {
    /// Decodes the record header and checks its magic.
    ///
    /// # Parameters
    /// - `buf`: The whole record, exactly one MFT record size long
    ///
    /// # Errors
    /// - `NtfsError::BinReadError` if the buffer is too short for the header
    /// - `NtfsError::InvalidMagic` if the record does not start with "FILE"
    pub fn from_slice(buf: &'a [u8]) -> Result<Self, NtfsError> {
        let mut reader = io::Cursor::new(buf);
        let header: MftRecordHeader = reader.read_le()?;

        if &header.magic != MFT_RECORD_MAGIC {
            return Err(NtfsError::InvalidMagic(
                String::from_utf8_lossy(&header.magic).into_owned(),
            ));
        }

        Ok(Self { header, buf })
    }

    /// The decoded record header.
    pub fn header(&self) -> &MftRecordHeader {
        &self.header
    }

    /// Iterates the attribute list, starting at the header's attribute offset.
    pub fn attributes(&self) -> Attributes<'a> {
        Attributes {
            buf: self.buf,
            cursor: usize::from(self.header.attrs_offset),
        }
    }
}

/// One attribute of an MFT record.
///
/// Value accessors are bounds checked against the whole record, not against the
/// attribute's declared length.
#[derive(Debug, Clone, Copy, CopyGetters)]
pub struct Attribute<'a> {
    /// Type code
    #[get_copy = "pub"]
    attr_type: u32,
    /// Offset of the attribute header within the record
    #[get_copy = "pub"]
    offset: usize,
    /// Declared length of the attribute, header included
    #[get_copy = "pub"]
    attr_len: usize,
    non_resident: bool,
    /// Offset of the value, relative to the attribute header
    #[get_copy = "pub"]
    value_offset: u16,
    /// Declared length of the value
    #[get_copy = "pub"]
    value_len: u32,
    /// The record the attribute was read from
    #[get_copy = "pub"]
    record: &'a [u8],
}

impl<'a> Attribute<'a> {
    /// Whether the value is stored inside the record.
    pub fn is_resident(&self) -> bool {
        !self.non_resident
    }

    /// The whole attribute, header included.
    pub fn bytes(&self) -> &'a [u8] {
        // The walker only yields attributes that end inside the record.
        &self.record[self.offset..self.offset + self.attr_len]
    }

    /// The resident value, if it lies entirely inside the record.
    pub fn value(&self) -> Option<&'a [u8]> {
        self.value_up_to(usize::MAX)
    }

    /// The first `min(value_len, limit)` bytes of the resident value, if they lie
    /// entirely inside the record.
    pub fn value_up_to(&self, limit: usize) -> Option<&'a [u8]> {
        let start = self.value_start()?;
        let len = usize::try_from(self.value_len).ok()?.min(limit);
        self.record.get(start..start.checked_add(len)?)
    }

    /// The byte at `index` into the resident value, whatever the declared value length.
    pub fn value_byte(&self, index: usize) -> Option<u8> {
        u8_at(self.record, self.value_start()?.checked_add(index)?)
    }

    /// Offset of the resident value within the record.
    fn value_start(&self) -> Option<usize> {
        if self.non_resident {
            return None;
        }

        self.offset.checked_add(usize::from(self.value_offset))
    }
}

/// Iterator over the attributes of an MFT record.
///
/// Iteration stops, for good, at the first attribute whose header does not fit in the
/// record, whose length is zero, which would end at or past the record end, or which is
/// the end marker. The cursor strictly increases and never exceeds the record size.
pub struct Attributes<'a> {
    buf: &'a [u8],
    cursor: usize,
}

impl Attributes<'_> {
    fn stop<T>(&mut self) -> Option<T> {
        self.cursor = self.buf.len();
        None
    }
}

impl<'a> Iterator for Attributes<'a> {
    type Item = Attribute<'a>;

    fn next(&mut self) -> Option<Attribute<'a>> {
        let start = self.cursor;
        let record_size = self.buf.len();

        let header = start
            .checked_add(ATTR_HEADER_LEN)
            .and_then(|end| self.buf.get(start..end));
        let Some(header) = header else {
            return self.stop();
        };

        // The header slice is ATTR_HEADER_LEN bytes long, so none of these can miss.
        let (Some(attr_type), Some(attr_len), Some(non_resident), Some(value_len), Some(value_offset)) = (
            u32_at(header, 0x00),
            u32_at(header, 0x04),
            u8_at(header, 0x08),
            u32_at(header, 0x10),
            u16_at(header, 0x14),
        ) else {
            return self.stop();
        };

        if attr_len == 0 {
            return self.stop();
        }

        let end = match usize::try_from(attr_len)
            .ok()
            .and_then(|len| start.checked_add(len))
        {
            Some(end) if end < record_size => end,
            _ => return self.stop(),
        };

        if attr_type == ATTR_END {
            return self.stop();
        }

        trace!("found attribute type 0x{attr_type:x}, len {attr_len}, at offset {start}");

        self.cursor = end;
        Some(Attribute {
            attr_type,
            offset: start,
            attr_len: end - start,
            non_resident: non_resident != 0,
            value_offset,
            value_len,
            record: self.buf,
        })
    }
}

impl std::iter::FusedIterator for Attributes<'_> {}
