//! NTFS boot sector structure.
//!
//! This module implements:
//! - Boot sector decoding and OEM identifier validation
//! - Geometry derivation (cluster size, MFT location, MFT record size)
//! - Field dump and layout display for diagnostics

use binread::{BinRead, BinReaderExt};
use getset::{CopyGetters, Getters};
use std::fmt::{self, Write};
use std::io;

use super::ntfs_error::NtfsError;
use crate::traits::{ByteRangeReader, LayoutDisplay};

/// Size in bytes of the boot sector.
pub const BOOT_SECTOR_SIZE: u32 = 512;

/// Leading bytes of the OEM identifier of an NTFS volume ("NTFS    " on disk).
pub const NTFS_OEM_ID: &[u8; 4] = b"NTFS";

/// Index of the `$Volume` system file in the MFT.
pub const MFT_RECORD_VOLUME: u64 = 3;

/// NTFS boot sector.
///
/// Only the BIOS Parameter Block and the extended BPB are decoded; the bootstrap code is
/// skipped.
#[derive(BinRead, Debug, Getters)]
#[br(little)]
pub struct BootSector {
    /// Jump instruction to boot code
    jump: [u8; 3],
    /// OEM identifier ("NTFS    ")
    #[get = "pub"]
    oem_id: [u8; 8],
    /// Number of bytes per sector
    #[get = "pub"]
    bytes_per_sector: u16,
    /// Number of sectors per cluster
    #[get = "pub"]
    sectors_per_cluster: u8,
    /// Reserved sectors (unused by NTFS, 0)
    reserved_sectors: u16,
    /// Number of FATs (unused by NTFS, 0)
    fats: u8,
    /// Root directory entries (unused by NTFS, 0)
    root_entries: u16,
    /// 16-bit sector count (unused by NTFS, 0)
    sectors: u16,
    /// Media descriptor (0xF8 for fixed disk)
    media_type: u8,
    /// Sectors per FAT (unused by NTFS, 0)
    sectors_per_fat: u16,
    /// Sectors per track
    sectors_per_track: u16,
    /// Number of heads
    heads: u16,
    /// Number of hidden sectors preceding the partition
    hidden_sectors: u32,
    /// 32-bit sector count (unused by NTFS, 0)
    large_sectors: u32,
    /// Unused
    unused: [u8; 4],
    /// Total number of sectors on the volume
    #[get = "pub"]
    number_of_sectors: u64,
    /// First cluster of the MFT
    #[get = "pub"]
    mft_cluster: u64,
    /// First cluster of the MFT mirror
    #[get = "pub"]
    mft_mirror_cluster: u64,
    /// Clusters per MFT record, or -log2(record size in bytes) when negative
    #[get = "pub"]
    clusters_per_mft_record: i8,
    /// Reserved
    reserved_1: [u8; 3],
    /// Clusters per index record, same encoding as `clusters_per_mft_record`
    clusters_per_index_record: i8,
    /// Reserved
    reserved_2: [u8; 3],
    /// Volume serial number
    #[get = "pub"]
    volume_serial: [u8; 8],
    /// Boot sector checksum
    checksum: u32,
    /// End of sector marker (0x55 0xAA)
    #[br(pad_before = 426)]
    end_marker: u16,
}

/// Volume geometry derived from the boot sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[get_copy = "pub"]
pub struct Geometry {
    /// Bytes per sector
    sector_size: u32,
    /// Bytes per cluster
    cluster_size: u32,
    /// First cluster of the MFT
    mft_cluster: u64,
    /// Byte offset of the MFT, relative to the volume start
    mft_offset: u64,
    /// Bytes per MFT record
    mft_record_size: u32,
}

impl Geometry {
    /// Byte offset of the MFT record `index`, relative to the volume start.
    pub fn mft_record_offset(&self, index: u64) -> Option<u64> {
        index
            .checked_mul(u64::from(self.mft_record_size))?
            .checked_add(self.mft_offset)
    }
}

impl BootSector {
    /// Reads and validates the boot sector of the volume starting at `offset`.
    ///
    /// # Parameters
    /// - `reader`: The medium holding the volume
    /// - `offset`: Byte offset of the volume on the medium
    ///
    /// # Returns
    /// - `Ok(BootSector)`: The decoded boot sector of an NTFS volume
    /// - `Err(NtfsError)`: If the sector is unreadable or is not an NTFS boot sector
    pub fn from_reader<R: ByteRangeReader + ?Sized>(
        reader: &R,
        offset: u64,
    ) -> Result<BootSector, NtfsError> {
        let buf = reader
            .read_range(offset, BOOT_SECTOR_SIZE)
            .ok_or(NtfsError::Unreadable {
                offset,
                len: BOOT_SECTOR_SIZE,
            })?;

        Self::from_slice(&buf)
    }

    /// Decodes and validates a boot sector from a byte slice of at least 512 bytes.
    pub fn from_slice(buf: &[u8]) -> Result<BootSector, NtfsError> {
        let mut reader = io::Cursor::new(buf);
        let boot_sector: BootSector = reader.read_le()?;

        boot_sector.validate()
    }

    /// Checks the OEM identifier. Nothing else is required for a match.
    fn validate(self) -> Result<Self, NtfsError> {
        if !self.oem_id.starts_with(NTFS_OEM_ID) {
            return Err(NtfsError::InvalidOemId(
                String::from_utf8_lossy(&self.oem_id).into_owned(),
            ));
        }

        Ok(self)
    }

    /// Bytes per sector.
    pub fn sector_size(&self) -> u32 {
        self.bytes_per_sector.into()
    }

    /// Bytes per cluster. Cannot overflow: at most 255 * 65535.
    pub fn cluster_size(&self) -> u32 {
        u32::from(self.sectors_per_cluster) * self.sector_size()
    }

    /// Byte offset of the MFT, relative to the volume start.
    pub fn mft_offset(&self) -> Result<u64, NtfsError> {
        self.mft_cluster
            .checked_mul(self.cluster_size().into())
            .ok_or_else(|| {
                NtfsError::InvalidGeometry(format!(
                    "MFT cluster {} with {}-byte clusters",
                    self.mft_cluster,
                    self.cluster_size()
                ))
            })
    }

    /// Bytes per MFT record.
    ///
    /// A negative `clusters_per_mft_record` encodes the size as `2^-value` bytes (-10 is
    /// 1024 bytes); a positive one is a count of clusters.
    pub fn mft_record_size(&self) -> Result<u32, NtfsError> {
        let value = self.clusters_per_mft_record;

        let size = if value < 0 {
            1u32.checked_shl(value.unsigned_abs().into())
        } else {
            u32::from(value.unsigned_abs()).checked_mul(self.cluster_size())
        };

        size.ok_or_else(|| {
            NtfsError::InvalidGeometry(format!(
                "{} clusters per MFT record with {}-byte clusters",
                value,
                self.cluster_size()
            ))
        })
    }

    /// Derives the volume geometry.
    pub fn geometry(&self) -> Result<Geometry, NtfsError> {
        Ok(Geometry {
            sector_size: self.sector_size(),
            cluster_size: self.cluster_size(),
            mft_cluster: self.mft_cluster,
            mft_offset: self.mft_offset()?,
            mft_record_size: self.mft_record_size()?,
        })
    }
}

/// Implements the Display trait for BootSector
impl fmt::Display for BootSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut offset = 0;

        macro_rules! field {
            ($name:expr, $val:expr, $size:expr) => {{
                writeln!(f, "  {:<26} 0x{:>04X}: {}", $name, offset, $val)?;
                offset += $size;
            }};
        }

        writeln!(f, "NTFS Boot Sector:")?;

        field!("jump", format!("{:02X?}", self.jump), 3);
        field!("oem_id", String::from_utf8_lossy(&self.oem_id), 8);
        field!("bytes_per_sector", self.bytes_per_sector, 2);
        field!("sectors_per_cluster", self.sectors_per_cluster, 1);
        field!("reserved_sectors", self.reserved_sectors, 2);
        field!("fats", self.fats, 1);
        field!("root_entries", self.root_entries, 2);
        field!("sectors", self.sectors, 2);
        field!("media_type", format!("0x{:X}", self.media_type), 1);
        field!("sectors_per_fat", self.sectors_per_fat, 2);
        field!("sectors_per_track", self.sectors_per_track, 2);
        field!("heads", self.heads, 2);
        field!("hidden_sectors", self.hidden_sectors, 4);
        field!("large_sectors", self.large_sectors, 4);
        field!("unused", format!("{:02X?}", self.unused), 4);
        field!("number_of_sectors", self.number_of_sectors, 8);
        field!("mft_cluster", self.mft_cluster, 8);
        field!("mft_mirror_cluster", self.mft_mirror_cluster, 8);
        field!("clusters_per_mft_record", self.clusters_per_mft_record, 1);
        field!("reserved_1", format!("{:02X?}", self.reserved_1), 3);
        field!("clusters_per_index_record", self.clusters_per_index_record, 1);
        field!("reserved_2", format!("{:02X?}", self.reserved_2), 3);
        field!("volume_serial", format!("{:02X?}", self.volume_serial), 8);
        field!("checksum", format!("0x{:X}", self.checksum), 4);

        offset += 426;
        write!(f, "\nEnd marker 0x{:04X}: 0x{:04X}", offset, self.end_marker)
    }
}

/// Draws the regions of the volume reachable from the boot sector.
impl LayoutDisplay for BootSector {
    fn display_layout(&self, indent: u8) -> String {
        let mut out = String::new();
        let indent = " ".repeat(indent.into());

        // Writing to a String cannot fail.
        let _ = writeln!(out, "{}┌{:─^55}┐", indent, " NTFS Volume Layout ");
        let _ = writeln!(out, "{}├{:<40}{:>15}┤", indent, "Sector size", self.sector_size());
        let _ = writeln!(out, "{}├{:<40}{:>15}┤", indent, "Cluster size", self.cluster_size());
        let _ = writeln!(
            out,
            "{}├{:<40}{:>15}┤",
            indent, "Total sectors", self.number_of_sectors
        );

        let geometry = match self.geometry() {
            Ok(geometry) => geometry,
            Err(err) => {
                let _ = writeln!(out, "{}├{:<55}┤", indent, err.to_string());
                let _ = writeln!(out, "{}└{:─<55}┘", indent, "");
                return out;
            }
        };

        let _ = writeln!(
            out,
            "{}├{:<40}{:>15}┤",
            indent,
            "MFT record size",
            geometry.mft_record_size()
        );
        let _ = writeln!(out, "{}├{:─^55}┤", indent, "");
        let _ = writeln!(
            out,
            "{}├{:^17}┬{:^18}┬{:^18}┤",
            indent, "Region", "Start", "End"
        );
        let _ = writeln!(out, "{}├{:─<17}┼{:─<18}┼{:─<18}┤", indent, "", "", "");

        let mut region = |name: &str, start: Option<u64>, len: u64| {
            let start_str = start.map_or(String::from("overflow"), |s| format!("0x{s:X}"));
            let end_str = start
                .and_then(|s| s.checked_add(len))
                .map_or(String::from("overflow"), |e| format!("0x{e:X}"));
            let _ = writeln!(
                out,
                "{}│{:^17}│{:>18}│{:>18}│",
                indent, name, start_str, end_str
            );
        };

        let record_size = u64::from(geometry.mft_record_size());
        region("Boot sector", Some(0), BOOT_SECTOR_SIZE.into());
        region("$MFT record", geometry.mft_record_offset(0), record_size);
        region(
            "$Volume record",
            geometry.mft_record_offset(MFT_RECORD_VOLUME),
            record_size,
        );

        let _ = writeln!(out, "{}└{:─<17}┴{:─<18}┴{:─<18}┘", indent, "", "", "");

        out
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a boot sector with the given geometry fields.
    pub(crate) fn boot_sector_bytes(
        bytes_per_sector: u16,
        sectors_per_cluster: u8,
        mft_cluster: u64,
        clusters_per_mft_record: i8,
    ) -> Vec<u8> {
        let mut buf = vec![0u8; BOOT_SECTOR_SIZE as usize];
        buf[0..3].copy_from_slice(&[0xEB, 0x52, 0x90]);
        buf[3..11].copy_from_slice(b"NTFS    ");
        buf[0x0B..0x0D].copy_from_slice(&bytes_per_sector.to_le_bytes());
        buf[0x0D] = sectors_per_cluster;
        buf[0x15] = 0xF8;
        buf[0x28..0x30].copy_from_slice(&0x0010_0000u64.to_le_bytes());
        buf[0x30..0x38].copy_from_slice(&mft_cluster.to_le_bytes());
        buf[0x38..0x40].copy_from_slice(&2u64.to_le_bytes());
        buf[0x40] = clusters_per_mft_record as u8;
        buf[0x44] = 1;
        buf[0x48..0x50].copy_from_slice(&[0xEF, 0xCD, 0xAB, 0x89, 0x67, 0x45, 0x23, 0x01]);
        buf[0x1FE..0x200].copy_from_slice(&[0x55, 0xAA]);
        buf
    }

    #[test]
    fn decodes_fields() {
        let bs = BootSector::from_slice(&boot_sector_bytes(512, 8, 4, -10)).unwrap();

        assert_eq!(bs.oem_id(), b"NTFS    ");
        assert_eq!(*bs.bytes_per_sector(), 512);
        assert_eq!(*bs.sectors_per_cluster(), 8);
        assert_eq!(*bs.number_of_sectors(), 0x0010_0000);
        assert_eq!(*bs.mft_cluster(), 4);
        assert_eq!(*bs.mft_mirror_cluster(), 2);
        assert_eq!(*bs.clusters_per_mft_record(), -10);
        assert_eq!(
            bs.volume_serial(),
            &[0xEF, 0xCD, 0xAB, 0x89, 0x67, 0x45, 0x23, 0x01]
        );
        assert_eq!(bs.end_marker, 0xAA55);
    }

    #[test]
    fn negative_record_size_is_a_power_of_two() {
        let bs = BootSector::from_slice(&boot_sector_bytes(512, 8, 4, -10)).unwrap();

        assert_eq!(bs.mft_record_size().unwrap(), 1024);
    }

    #[test]
    fn positive_record_size_counts_clusters() {
        let bs = BootSector::from_slice(&boot_sector_bytes(512, 8, 4, 2)).unwrap();

        assert_eq!(bs.cluster_size(), 4096);
        assert_eq!(bs.mft_record_size().unwrap(), 8192);
    }

    #[test]
    fn derives_geometry() {
        let bs = BootSector::from_slice(&boot_sector_bytes(512, 8, 4, -10)).unwrap();
        let geometry = bs.geometry().unwrap();

        assert_eq!(geometry.sector_size(), 512);
        assert_eq!(geometry.cluster_size(), 4096);
        assert_eq!(geometry.mft_cluster(), 4);
        assert_eq!(geometry.mft_offset(), 16384);
        assert_eq!(geometry.mft_record_size(), 1024);
        assert_eq!(
            geometry.mft_record_offset(MFT_RECORD_VOLUME),
            Some(16384 + 3 * 1024)
        );
    }

    #[test]
    fn oversized_record_shift_is_rejected() {
        let bs = BootSector::from_slice(&boot_sector_bytes(512, 8, 4, -128)).unwrap();

        assert!(matches!(
            bs.mft_record_size(),
            Err(NtfsError::InvalidGeometry(_))
        ));
        assert!(bs.geometry().is_err());
    }

    #[test]
    fn overflowing_mft_offset_is_rejected() {
        let bs = BootSector::from_slice(&boot_sector_bytes(4096, 128, u64::MAX / 2, -10)).unwrap();

        assert!(matches!(bs.mft_offset(), Err(NtfsError::InvalidGeometry(_))));
    }

    #[test]
    fn rejects_other_oem_ids() {
        let mut buf = boot_sector_bytes(512, 8, 4, -10);
        buf[3..11].copy_from_slice(b"MSDOS5.0");

        assert!(matches!(
            BootSector::from_slice(&buf),
            Err(NtfsError::InvalidOemId(oem)) if oem == "MSDOS5.0"
        ));
    }

    #[test]
    fn rejects_short_buffers() {
        let buf = boot_sector_bytes(512, 8, 4, -10);

        assert!(matches!(
            BootSector::from_slice(&buf[..100]),
            Err(NtfsError::BinReadError(_))
        ));
    }

    #[test]
    fn reads_through_a_byte_range_reader() {
        let mut medium = vec![0u8; 1024];
        medium.extend_from_slice(&boot_sector_bytes(512, 8, 4, -10));

        assert!(BootSector::from_reader(medium.as_slice(), 1024).is_ok());
        assert!(matches!(
            BootSector::from_reader(medium.as_slice(), 1025),
            Err(NtfsError::Unreadable { offset: 1025, len: 512 })
        ));
    }

    #[test]
    fn display_dumps_fields_with_offsets() {
        let bs = BootSector::from_slice(&boot_sector_bytes(512, 8, 4, -10)).unwrap();
        let dump = bs.to_string();

        assert!(dump.contains("oem_id"));
        assert!(dump.contains("0x0040: -10"));
        assert!(dump.contains("End marker 0x01FE: 0xAA55"));
    }

    #[test]
    fn layout_shows_volume_record() {
        let bs = BootSector::from_slice(&boot_sector_bytes(512, 8, 4, -10)).unwrap();
        let layout = bs.display_layout(2);

        assert!(layout.contains("$Volume record"));
        assert!(layout.contains("0x4C00"));
        assert!(layout.lines().all(|line| line.starts_with("  ")));
    }
}
