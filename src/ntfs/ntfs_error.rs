//! Error types for NTFS structure decoding.
//!
//! Boot sector errors mean the medium does not hold an NTFS volume at the probed offset.
//! MFT record errors only mean the volume's label and version are unavailable.

use thiserror::Error;

/// Errors that can occur while decoding NTFS on-disk structures.
#[derive(Error, Debug)]
pub enum NtfsError {
    /// The reader could not provide the requested byte range.
    #[error("Unreadable range: {len} bytes at offset 0x{offset:x}")]
    Unreadable { offset: u64, len: u32 },

    /// The boot sector's OEM identifier does not start with "NTFS".
    #[error("Invalid OEM identifier `{0}`")]
    InvalidOemId(String),

    /// The MFT record does not start with "FILE".
    #[error("Invalid MFT record magic `{0}`")]
    InvalidMagic(String),

    /// The geometry derived from the boot sector overflows.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Parsing error occured during structure initialization
    #[error("BinRead Error: `{0}`")]
    BinReadError(binread::Error),
}

/// Converts BinRead errors into NtfsError.
impl From<binread::Error> for NtfsError {
    fn from(err: binread::Error) -> Self {
        NtfsError::BinReadError(err)
    }
}
