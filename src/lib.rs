//!
//! ntfs_volume_id: identification of NTFS volumes in disk images and block devices.
//!
//! This crate provides tools for:
//! - Recognizing an NTFS volume from its boot sector
//! - Reading the volume serial number, label and NTFS version without mounting
//! - Walking MFT record attribute lists under strict bounds checks
//! - Printing the boot sector fields and the volume layout
//!
//! All access to the medium goes through [`ByteRangeReader`], so the probe works the same
//! over in-memory buffers and over images opened with [`ImageReader`].
//!
//! # Re-exports
//! - [`probe_ntfs`]: NTFS probe entry point
//! - [`VolumeId`]: Probe result
//! - [`ByteRangeReader`]: Read-only byte-range access to a medium
//! - [`ImageReader`]: Byte-range access to a seekable image

pub mod image;
pub mod ntfs;
pub mod traits;
pub mod utils;
pub mod volume_id;

/// Byte-range access to a seekable image (see [`image::ImageReader`]).
pub use crate::image::ImageReader;
/// NTFS probe entry point (see [`ntfs::probe::probe_ntfs`]).
pub use crate::ntfs::probe::probe_ntfs;
/// Read-only byte-range access to a medium (see [`traits::ByteRangeReader`]).
pub use crate::traits::ByteRangeReader;
/// Probe result (see [`volume_id::VolumeId`]).
pub use crate::volume_id::VolumeId;
