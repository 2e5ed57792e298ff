//! Declaration of traits reused across the code.

use std::borrow::Cow;

/// Implementation of the LayoutDisplay trait.
/// It is used to display the layout of a given structure such as a volume's boot sector.
pub trait LayoutDisplay {
    fn display_layout(&self, indent: u8) -> String;
}

/// Read-only access to byte ranges of a medium.
///
/// A reader either returns exactly `len` bytes starting at `offset`, or `None` when the
/// range is unreadable or out of range. A short read is never returned.
pub trait ByteRangeReader {
    fn read_range(&self, offset: u64, len: u32) -> Option<Cow<'_, [u8]>>;
}

/// In-memory media: the range is borrowed straight from the slice.
impl ByteRangeReader for [u8] {
    fn read_range(&self, offset: u64, len: u32) -> Option<Cow<'_, [u8]>> {
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(usize::try_from(len).ok()?)?;
        self.get(start..end).map(Cow::Borrowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_reader_returns_exact_ranges() {
        let medium: Vec<u8> = (0..=15).collect();
        let medium = medium.as_slice();

        assert_eq!(medium.read_range(4, 4).as_deref(), Some(&[4u8, 5, 6, 7][..]));
        assert_eq!(medium.read_range(12, 4).as_deref(), Some(&[12u8, 13, 14, 15][..]));
        assert_eq!(medium.read_range(16, 0).as_deref(), Some(&[][..]));
    }

    #[test]
    fn slice_reader_refuses_short_ranges() {
        let medium = [0u8; 16];
        let medium = &medium[..];

        assert!(medium.read_range(13, 4).is_none());
        assert!(medium.read_range(17, 0).is_none());
        assert!(medium.read_range(u64::MAX, 1).is_none());
    }
}
