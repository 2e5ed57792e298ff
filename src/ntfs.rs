//! NTFS on-disk structures and the NTFS probe.

pub mod boot_sector;
pub mod mft_record;
pub mod ntfs_error;
pub mod probe;
