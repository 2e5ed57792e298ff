//! Little-endian field decoding over untrusted byte slices.
//!
//! Every accessor checks `offset + width` against the slice length and returns `None`
//! instead of reading out of range.

use std::char::REPLACEMENT_CHARACTER;

/// Returns the `N` bytes starting at `offset`, if they all lie inside `buffer`.
fn array_at<const N: usize>(buffer: &[u8], offset: usize) -> Option<[u8; N]> {
    let end = offset.checked_add(N)?;
    buffer.get(offset..end)?.try_into().ok()
}

/// Extracts a 64-bit unsigned integer from a buffer at a given offset.
///
/// # Arguments
///
/// - `buffer`: A slice of bytes from which the value will be extracted.
/// - `offset`: The offset within the buffer where the 64-bit value starts.
///
/// # Returns
///
/// `None` if the slice does not contain enough bytes starting from the offset.
pub fn u64_at(buffer: &[u8], offset: usize) -> Option<u64> {
    array_at(buffer, offset).map(u64::from_le_bytes)
}

/// Extracts a 32-bit unsigned integer from a buffer at a given offset.
///
/// # Arguments
///
/// - `buffer`: A slice of bytes from which the value will be extracted.
/// - `offset`: The offset within the buffer where the 32-bit value starts.
///
/// # Returns
///
/// `None` if the slice does not contain enough bytes starting from the offset.
pub fn u32_at(buffer: &[u8], offset: usize) -> Option<u32> {
    array_at(buffer, offset).map(u32::from_le_bytes)
}

/// Extracts a 16-bit unsigned integer from a buffer at a given offset.
///
/// # Arguments
///
/// - `buffer`: A slice of bytes from which the value will be extracted.
/// - `offset`: The offset within the buffer where the 16-bit value starts.
///
/// # Returns
///
/// `None` if the slice does not contain enough bytes starting from the offset.
pub fn u16_at(buffer: &[u8], offset: usize) -> Option<u16> {
    array_at(buffer, offset).map(u16::from_le_bytes)
}

/// Extracts a 8-bit unsigned integer from a buffer at a given offset.
pub fn u8_at(buffer: &[u8], offset: usize) -> Option<u8> {
    buffer.get(offset).copied()
}

/// Decodes a run of UTF-16LE code units.
///
/// An odd trailing byte is ignored. Unpaired surrogates decode to U+FFFD instead of
/// failing the whole string.
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));

    char::decode_utf16(units)
        .map(|c| c.unwrap_or(REPLACEMENT_CHARACTER))
        .collect()
}

/// Encodes a string as UTF-16LE bytes.
#[cfg(test)]
pub(crate) fn encode_utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_fields() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09];

        assert_eq!(u8_at(&buf, 8), Some(0x09));
        assert_eq!(u16_at(&buf, 0), Some(0x0201));
        assert_eq!(u32_at(&buf, 1), Some(0x0504_0302));
        assert_eq!(u64_at(&buf, 1), Some(0x0908_0706_0504_0302));
    }

    #[test]
    fn rejects_reads_past_the_end() {
        let buf = [0u8; 8];

        assert_eq!(u8_at(&buf, 8), None);
        assert_eq!(u16_at(&buf, 7), None);
        assert_eq!(u32_at(&buf, 5), None);
        assert_eq!(u64_at(&buf, 1), None);
        assert_eq!(u64_at(&buf, usize::MAX), None);
        assert_eq!(u64_at(&buf, 0), Some(0));
    }

    #[test]
    fn decodes_utf16le() {
        assert_eq!(decode_utf16le(&encode_utf16le("TestVol")), "TestVol");
        assert_eq!(decode_utf16le(&encode_utf16le("Données")), "Données");
        assert_eq!(decode_utf16le(&[]), "");
    }

    #[test]
    fn ignores_odd_trailing_byte() {
        let mut bytes = encode_utf16le("AB");
        bytes.push(0x43);

        assert_eq!(decode_utf16le(&bytes), "AB");
    }

    #[test]
    fn replaces_unpaired_surrogates() {
        // 'A', lone high surrogate, 'B'
        let bytes = [0x41, 0x00, 0x3D, 0xD8, 0x42, 0x00];

        assert_eq!(decode_utf16le(&bytes), "A\u{FFFD}B");
    }

    #[test]
    fn decodes_surrogate_pairs() {
        assert_eq!(decode_utf16le(&encode_utf16le("vol🦀")), "vol🦀");
    }
}
