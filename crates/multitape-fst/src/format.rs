// Binary format: header parsing, validation

use crate::FstError;

/// Header magic constants (little-endian).
pub(crate) const COOKIE1: u32 = 0x4D54_4653;
pub(crate) const COOKIE2: u32 = 0x0002_7A11;

/// Current binary format version.
pub const FORMAT_VERSION: u8 = 1;

/// Size of the binary header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Parsed file header.
///
/// The header occupies the first 16 bytes of a binary automaton:
/// - bytes 0..4: cookie1 (magic number)
/// - bytes 4..8: cookie2 (magic number)
/// - byte 8: format version
/// - bytes 9..16: reserved (written as zero)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
}

/// Parses and validates the 16-byte binary header.
///
/// Only little-endian files are accepted; a byte-swapped file fails the
/// magic check.
pub fn parse_header(data: &[u8]) -> Result<Header, FstError> {
    if data.len() < HEADER_SIZE {
        return Err(FstError::TooShort {
            expected: HEADER_SIZE,
            actual: data.len(),
        });
    }

    let cookie1 = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let cookie2 = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);

    if cookie1 != COOKIE1 || cookie2 != COOKIE2 {
        return Err(FstError::InvalidMagic);
    }

    let version = data[8];
    if version != FORMAT_VERSION {
        return Err(FstError::UnsupportedVersion(version));
    }

    Ok(Header { version })
}

/// Serialize the header for the current version.
pub fn write_header(out: &mut Vec<u8>) {
    out.extend_from_slice(&COOKIE1.to_le_bytes());
    out.extend_from_slice(&COOKIE2.to_le_bytes());
    out.push(FORMAT_VERSION);
    out.extend_from_slice(&[0u8; HEADER_SIZE - 9]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_header() -> Vec<u8> {
        let mut buf = Vec::new();
        write_header(&mut buf);
        buf
    }

    #[test]
    fn header_is_sixteen_bytes() {
        assert_eq!(make_header().len(), HEADER_SIZE);
    }

    #[test]
    fn parse_current_header() {
        let header = parse_header(&make_header()).unwrap();
        assert_eq!(header.version, FORMAT_VERSION);
    }

    #[test]
    fn reject_too_short() {
        let data = [0u8; 8];
        let err = parse_header(&data).unwrap_err();
        assert!(matches!(
            err,
            FstError::TooShort {
                expected: 16,
                actual: 8
            }
        ));
    }

    #[test]
    fn reject_invalid_magic() {
        let mut data = make_header();
        data[0] = 0xFF;
        let err = parse_header(&data).unwrap_err();
        assert!(matches!(err, FstError::InvalidMagic));
    }

    #[test]
    fn reject_reversed_cookies() {
        let mut data = make_header();
        data[..4].copy_from_slice(&COOKIE1.to_be_bytes());
        data[4..8].copy_from_slice(&COOKIE2.to_be_bytes());
        let err = parse_header(&data).unwrap_err();
        assert!(matches!(err, FstError::InvalidMagic));
    }

    #[test]
    fn reject_unknown_version() {
        let mut data = make_header();
        data[8] = 9;
        let err = parse_header(&data).unwrap_err();
        assert!(matches!(err, FstError::UnsupportedVersion(9)));
    }

    #[test]
    fn header_with_trailing_data() {
        let mut data = make_header();
        data.extend_from_slice(&[0u8; 100]);
        assert!(parse_header(&data).is_ok());
    }
}
