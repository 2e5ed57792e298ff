//! Byte-range access to disk images and block devices.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

use log::debug;

use crate::traits::ByteRangeReader;

/// A seekable image exposed as a [`ByteRangeReader`].
///
/// Seeks on the inner stream are serialized, so a single reader can serve probes running
/// on several threads.
pub struct ImageReader<T> {
    inner: Mutex<T>,
    len: u64,
}

impl ImageReader<File> {
    /// Opens a disk image or block device read-only.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if the file cannot be opened or its size cannot be determined.
    pub fn open(path: &Path) -> io::Result<Self> {
        Self::new(File::open(path)?)
    }
}

impl<T: Read + Seek> ImageReader<T> {
    /// Wraps a seekable stream. Its length is determined once, up front.
    pub fn new(mut inner: T) -> io::Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;

        Ok(Self {
            inner: Mutex::new(inner),
            len,
        })
    }

    /// The size in bytes of the underlying image.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn read_exact_at(&self, offset: u64, buffer: &mut [u8]) -> io::Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("image reader lock poisoned"))?;

        inner.seek(SeekFrom::Start(offset))?;
        inner.read_exact(buffer).map_err(|err| {
            io::Error::new(
                err.kind(),
                format!("Failed to read {} bytes at {}: {}", buffer.len(), offset, err),
            )
        })
    }
}

impl<T: Read + Seek> ByteRangeReader for ImageReader<T> {
    fn read_range(&self, offset: u64, len: u32) -> Option<Cow<'_, [u8]>> {
        // Refuse before allocating: `len` usually comes from on-disk fields.
        let end = offset.checked_add(u64::from(len))?;
        if end > self.len {
            debug!(
                "range 0x{:x}+{} lies past the end of the image ({} bytes)",
                offset, len, self.len
            );
            return None;
        }

        let mut buffer = vec![0; usize::try_from(len).ok()?];
        match self.read_exact_at(offset, &mut buffer) {
            Ok(()) => Some(Cow::Owned(buffer)),
            Err(err) => {
                debug!("{err}");
                None
            }
        }
    }
}
