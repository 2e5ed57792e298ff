//! Probe result: what a filesystem probe found on a volume.
//!
//! A probe only fills the fields it managed to decode; everything else keeps its default.

use getset::Getters;
use std::fmt;

use crate::utils;

/// Capacity in bytes of the raw and decoded label.
pub const LABEL_SIZE: usize = 64;

/// What a volume is used for.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    /// Nothing identified yet.
    #[default]
    None,
    /// The volume holds a mountable filesystem.
    Filesystem,
    /// The volume holds something else (swap, RAID member, ...).
    Other,
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Usage::None => "",
            Usage::Filesystem => "filesystem",
            Usage::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// On-disk encoding of a volume's unique identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UuidFormat {
    /// 64-bit little-endian serial number, printed as 16 uppercase hex digits.
    Le64,
}

impl UuidFormat {
    /// Number of raw bytes consumed by this format.
    pub fn byte_len(&self) -> usize {
        match self {
            UuidFormat::Le64 => 8,
        }
    }
}

/// Everything a probe extracted from one volume.
#[derive(Debug, Default, Clone, PartialEq, Eq, Getters)]
#[get = "pub"]
pub struct VolumeId {
    /// Usage classification.
    usage: Usage,
    /// Filesystem type tag, e.g. "ntfs".
    fs_type: Option<&'static str>,
    /// Filesystem format version, e.g. "3.1".
    type_version: String,
    /// Label bytes as stored on disk, at most [`LABEL_SIZE`] bytes.
    label_raw: Vec<u8>,
    /// Decoded, human readable label.
    label: String,
    /// Unique identifier bytes as stored on disk.
    uuid_raw: Vec<u8>,
    /// Unique identifier in its printable form.
    uuid: String,
    /// Encoding of `uuid_raw`.
    uuid_format: Option<UuidFormat>,
}

impl VolumeId {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_usage(&mut self, usage: Usage) {
        self.usage = usage;
    }

    pub fn set_fs_type(&mut self, fs_type: &'static str) {
        self.fs_type = Some(fs_type);
    }

    pub fn set_type_version(&mut self, version: String) {
        self.type_version = version;
    }

    /// Stores the on-disk label bytes, truncated to [`LABEL_SIZE`].
    pub fn set_label_raw(&mut self, buf: &[u8]) {
        let len = buf.len().min(LABEL_SIZE);
        self.label_raw = buf[..len].to_vec();
    }

    /// Decodes a UTF-16LE label.
    ///
    /// Decoding stops at the first NUL code unit. The result is cut on a character
    /// boundary so that it never exceeds [`LABEL_SIZE`] bytes of UTF-8.
    pub fn set_label_unicode16(&mut self, buf: &[u8]) {
        let end = buf
            .chunks_exact(2)
            .position(|unit| unit == [0, 0])
            .map_or(buf.len(), |units| units * 2);

        let mut label = utils::decode_utf16le(&buf[..end]);
        if label.len() > LABEL_SIZE {
            let mut cut = LABEL_SIZE;
            while !label.is_char_boundary(cut) {
                cut -= 1;
            }
            label.truncate(cut);
        }
        self.label = label;
    }

    /// Stores a unique identifier and its printable form.
    ///
    /// An identifier made only of zero bytes, or shorter than the format requires, is not
    /// set.
    pub fn set_uuid(&mut self, buf: &[u8], format: UuidFormat) {
        let Some(raw) = buf.get(..format.byte_len()) else {
            return;
        };

        self.uuid = match format {
            UuidFormat::Le64 => match utils::u64_at(raw, 0) {
                Some(0) | None => return,
                Some(serial) => format!("{serial:016X}"),
            },
        };
        self.uuid_raw = raw.to_vec();
        self.uuid_format = Some(format);
    }
}

/// Prints the result as `KEY=value` lines, one per field.
impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ID_FS_USAGE={}", self.usage)?;
        writeln!(f, "ID_FS_TYPE={}", self.fs_type.unwrap_or_default())?;
        writeln!(f, "ID_FS_VERSION={}", self.type_version)?;
        writeln!(f, "ID_FS_UUID={}", self.uuid)?;
        write!(f, "ID_FS_LABEL={}", self.label)
    }
}
