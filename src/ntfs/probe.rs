//! NTFS probe.
//!
//! Identification rests on the boot sector alone. The `$Volume` MFT record is then read to
//! enrich the result with the volume label and NTFS version; any problem with that record
//! leaves those fields unset without failing the probe.

use log::{debug, info};

use super::boot_sector::{BootSector, Geometry, MFT_RECORD_VOLUME};
use super::mft_record::{ATTR_VOLUME_INFORMATION, ATTR_VOLUME_NAME, Attribute, MftRecord};
use super::ntfs_error::NtfsError;
use crate::traits::ByteRangeReader;
use crate::volume_id::{LABEL_SIZE, Usage, UuidFormat, VolumeId};

/// Filesystem type tag reported for NTFS volumes.
pub const NTFS_TYPE: &str = "ntfs";

/// Position of the major version in the `$VOLUME_INFORMATION` value, after 8 reserved bytes.
const VOLUME_INFORMATION_MAJOR: usize = 8;

/// Probes for an NTFS volume starting at byte `offset` of `reader`.
///
/// # Returns
/// - `Ok(())`: The volume is NTFS. `id` carries usage, type and uuid, plus label and
///   version when the `$Volume` record could be decoded.
/// - `Err(NtfsError)`: Not an NTFS volume. `id` is left untouched.
pub fn probe_ntfs<R: ByteRangeReader + ?Sized>(
    reader: &R,
    offset: u64,
    id: &mut VolumeId,
) -> Result<(), NtfsError> {
    info!("probing at offset 0x{offset:x}");

    let boot_sector = BootSector::from_reader(reader, offset)?;

    id.set_uuid(boot_sector.volume_serial(), UuidFormat::Le64);

    debug!("sectorsize  0x{:x}", boot_sector.sector_size());
    debug!("clustersize 0x{:x}", boot_sector.cluster_size());
    debug!("mftcluster  {}", boot_sector.mft_cluster());
    debug!(
        "cluster per mft_record  {}",
        boot_sector.clusters_per_mft_record()
    );

    match boot_sector.geometry() {
        Ok(geometry) => {
            debug!("mftoffset  0x{:x}", geometry.mft_offset());
            debug!("mft record size  {}", geometry.mft_record_size());

            if let Err(err) = read_volume_record(reader, offset, &geometry, id) {
                debug!("no label or version: {err}");
            }
        }
        Err(err) => debug!("no label or version: {err}"),
    }

    id.set_usage(Usage::Filesystem);
    id.set_fs_type(NTFS_TYPE);

    Ok(())
}

/// Reads the `$Volume` record and applies its attributes to `id`.
fn read_volume_record<R: ByteRangeReader + ?Sized>(
    reader: &R,
    volume_offset: u64,
    geometry: &Geometry,
    id: &mut VolumeId,
) -> Result<(), NtfsError> {
    let record_size = geometry.mft_record_size();
    let record_offset = geometry
        .mft_record_offset(MFT_RECORD_VOLUME)
        .and_then(|relative| volume_offset.checked_add(relative))
        .ok_or_else(|| {
            NtfsError::InvalidGeometry(String::from("$Volume record offset overflows"))
        })?;

    let buf = reader
        .read_range(record_offset, record_size)
        .ok_or(NtfsError::Unreadable {
            offset: record_offset,
            len: record_size,
        })?;

    let record = MftRecord::from_slice(&buf)?;
    debug!(
        "file $Volume's attributes are at offset {}",
        record.header().attrs_offset()
    );

    for attr in record.attributes() {
        apply_volume_attribute(&attr, id);
    }

    Ok(())
}

/// Copies the label or version carried by `attr` into `id`. Other attributes are ignored.
pub fn apply_volume_attribute(attr: &Attribute, id: &mut VolumeId) {
    match attr.attr_type() {
        ATTR_VOLUME_INFORMATION => {
            debug!("found info, len {}", attr.value_len());

            // Read regardless of the declared value length.
            let major = attr.value_byte(VOLUME_INFORMATION_MAJOR);
            let minor = attr.value_byte(VOLUME_INFORMATION_MAJOR + 1);
            match (major, minor) {
                (Some(major), Some(minor)) => id.set_type_version(format!("{major}.{minor}")),
                _ => debug!("volume information value out of bounds"),
            }
        }
        ATTR_VOLUME_NAME => {
            debug!("found label, len {}", attr.value_len());

            match attr.value_up_to(LABEL_SIZE) {
                Some(label) => {
                    id.set_label_raw(label);
                    id.set_label_unicode16(label);
                }
                None => debug!("volume name value out of bounds"),
            }
        }
        _ => {}
    }
}
