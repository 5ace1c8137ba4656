//! Header parsing for TIFF-derived RAW containers.
//!
//! # Header structure (8 bytes)
//!
//! ```text
//! Bytes 0-1: Byte order (0x4949 = little-endian "II", 0x4D4D = big-endian "MM")
//! Bytes 2-3: Magic word (42 for classic TIFF; vendors substitute their own)
//! Bytes 4-7: Offset to first IFD (4 bytes)
//! ```
//!
//! Several RAW vendors keep the TIFF layout but change the magic word:
//! Olympus ORF files carry "MMOR"/"IIRO" (magic 0x4F52) and Panasonic RW2
//! files carry 0x0055. Their directory structure is otherwise navigable by
//! the generic walker, so the parser accepts all three magics and records
//! which one it saw.

use crate::error::TiffError;
use crate::io::{read_u16_be, read_u16_le, read_u32_be, read_u32_le};

// =============================================================================
// Constants
// =============================================================================

/// Magic bytes indicating little-endian byte order ("II" for Intel)
const BYTE_ORDER_LITTLE_ENDIAN: u16 = 0x4949;

/// Magic bytes indicating big-endian byte order ("MM" for Motorola)
const BYTE_ORDER_BIG_ENDIAN: u16 = 0x4D4D;

/// Magic word for classic TIFF
pub const MAGIC_TIFF: u16 = 42;

/// Magic word used by Olympus ORF headers ("OR"/"RO")
pub const MAGIC_OLYMPUS_RAW: u16 = 0x4F52;

/// Magic word used by Panasonic RW2 headers
pub const MAGIC_PANASONIC_RAW: u16 = 0x0055;

/// Size of the header in bytes
pub const TIFF_HEADER_SIZE: usize = 8;

/// Size of one IFD entry: 2 tag + 2 type + 4 count + 4 value/offset
pub const IFD_ENTRY_SIZE: usize = 12;

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order (endianness) of a TIFF-derived file.
///
/// Declared once in the first two bytes of the header; every subsequent
/// multi-byte read respects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian ("II" = Intel)
    LittleEndian,
    /// Big-endian ("MM" = Motorola)
    BigEndian,
}

impl ByteOrder {
    /// Read a u16 from a byte slice using this byte order.
    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        match self {
            ByteOrder::LittleEndian => read_u16_le(bytes),
            ByteOrder::BigEndian => read_u16_be(bytes),
        }
    }

    /// Read a u32 from a byte slice using this byte order.
    #[inline]
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        match self {
            ByteOrder::LittleEndian => read_u32_le(bytes),
            ByteOrder::BigEndian => read_u32_be(bytes),
        }
    }
}

// =============================================================================
// TiffHeader
// =============================================================================

/// Parsed file header: byte order, which magic variant, first IFD offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Byte order for all multi-byte values in the file
    pub byte_order: ByteOrder,

    /// The magic word found at bytes 2-3
    pub magic: u16,

    /// Offset to the first IFD
    pub first_ifd_offset: u32,
}

impl TiffHeader {
    /// Parse a header from raw bytes.
    ///
    /// # Errors
    /// - `FileTooSmall` if fewer than 8 bytes are given
    /// - `InvalidByteOrder` if the order marker is not II or MM
    /// - `UnrecognizedMagic` if the magic word is not TIFF, Olympus, or
    ///   Panasonic
    /// - `InvalidIfdOffset` if the first IFD offset lies outside `file_size`
    pub fn parse(bytes: &[u8], file_size: u64) -> Result<Self, TiffError> {
        if bytes.len() < TIFF_HEADER_SIZE {
            return Err(TiffError::FileTooSmall {
                required: TIFF_HEADER_SIZE as u64,
                actual: bytes.len() as u64,
            });
        }

        // The order marker is a byte pattern, so read it order-agnostically
        let marker = read_u16_le(&bytes[0..2]);
        let byte_order = match marker {
            BYTE_ORDER_LITTLE_ENDIAN => ByteOrder::LittleEndian,
            BYTE_ORDER_BIG_ENDIAN => ByteOrder::BigEndian,
            _ => return Err(TiffError::InvalidByteOrder(marker)),
        };

        let magic = byte_order.read_u16(&bytes[2..4]);
        if magic != MAGIC_TIFF && magic != MAGIC_OLYMPUS_RAW && magic != MAGIC_PANASONIC_RAW {
            return Err(TiffError::UnrecognizedMagic(magic));
        }

        let first_ifd_offset = byte_order.read_u32(&bytes[4..8]);
        if u64::from(first_ifd_offset) >= file_size {
            return Err(TiffError::InvalidIfdOffset(u64::from(first_ifd_offset)));
        }

        Ok(TiffHeader {
            byte_order,
            magic,
            first_ifd_offset,
        })
    }

    /// True for a standard TIFF header (magic 42).
    #[inline]
    pub const fn is_classic(&self) -> bool {
        self.magic == MAGIC_TIFF
    }

    /// True for an Olympus ORF vendor header.
    #[inline]
    pub const fn is_olympus_raw(&self) -> bool {
        self.magic == MAGIC_OLYMPUS_RAW
    }

    /// True for a Panasonic RW2 vendor header.
    #[inline]
    pub const fn is_panasonic_raw(&self) -> bool {
        self.magic == MAGIC_PANASONIC_RAW
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_order_read_u16() {
        let bytes = [0x01, 0x02];
        assert_eq!(ByteOrder::LittleEndian.read_u16(&bytes), 0x0201);
        assert_eq!(ByteOrder::BigEndian.read_u16(&bytes), 0x0102);
    }

    #[test]
    fn test_byte_order_read_u32() {
        let bytes = [0x01, 0x02, 0x03, 0x04];
        assert_eq!(ByteOrder::LittleEndian.read_u32(&bytes), 0x04030201);
        assert_eq!(ByteOrder::BigEndian.read_u32(&bytes), 0x01020304);
    }

    #[test]
    fn test_parse_little_endian() {
        let header = [
            0x49, 0x49, // II
            0x2A, 0x00, // 42
            0x08, 0x00, 0x00, 0x00, // first IFD at 8
        ];

        let result = TiffHeader::parse(&header, 1000).unwrap();
        assert_eq!(result.byte_order, ByteOrder::LittleEndian);
        assert!(result.is_classic());
        assert_eq!(result.first_ifd_offset, 8);
    }

    #[test]
    fn test_parse_big_endian() {
        let header = [
            0x4D, 0x4D, // MM
            0x00, 0x2A, // 42
            0x00, 0x00, 0x00, 0x08, // first IFD at 8
        ];

        let result = TiffHeader::parse(&header, 1000).unwrap();
        assert_eq!(result.byte_order, ByteOrder::BigEndian);
        assert!(result.is_classic());
        assert_eq!(result.first_ifd_offset, 8);
    }

    #[test]
    fn test_parse_olympus_header() {
        // "MMOR": big-endian order marker, Olympus magic
        let header = [
            0x4D, 0x4D, // MM
            0x4F, 0x52, // "OR"
            0x00, 0x00, 0x00, 0x08,
        ];
        let result = TiffHeader::parse(&header, 1000).unwrap();
        assert!(result.is_olympus_raw());
        assert_eq!(result.byte_order, ByteOrder::BigEndian);

        // "IIRO": little-endian order marker, Olympus magic
        let header = [
            0x49, 0x49, // II
            0x52, 0x4F, // "RO" -> 0x4F52 little-endian
            0x08, 0x00, 0x00, 0x00,
        ];
        let result = TiffHeader::parse(&header, 1000).unwrap();
        assert!(result.is_olympus_raw());
        assert_eq!(result.byte_order, ByteOrder::LittleEndian);
    }

    #[test]
    fn test_parse_panasonic_header() {
        let header = [
            0x49, 0x49, // II
            0x55, 0x00, // 0x0055
            0x18, 0x00, 0x00, 0x00, // first IFD at 0x18
        ];
        let result = TiffHeader::parse(&header, 1000).unwrap();
        assert!(result.is_panasonic_raw());
        assert_eq!(result.first_ifd_offset, 0x18);
    }

    #[test]
    fn test_parse_invalid_byte_order() {
        let header = [0x00, 0x00, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];
        let result = TiffHeader::parse(&header, 1000);
        assert!(matches!(result, Err(TiffError::InvalidByteOrder(0x0000))));
    }

    #[test]
    fn test_parse_unrecognized_magic() {
        let header = [0x49, 0x49, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00];
        let result = TiffHeader::parse(&header, 1000);
        assert!(matches!(result, Err(TiffError::UnrecognizedMagic(0))));
    }

    #[test]
    fn test_parse_too_small() {
        let header = [0x49, 0x49, 0x2A, 0x00];
        let result = TiffHeader::parse(&header, 1000);
        assert!(matches!(
            result,
            Err(TiffError::FileTooSmall {
                required: 8,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_parse_ifd_offset_beyond_file() {
        let header = [
            0x49, 0x49, 0x2A, 0x00, //
            0xE8, 0x03, 0x00, 0x00, // first IFD at 1000
        ];
        let result = TiffHeader::parse(&header, 500);
        assert!(matches!(result, Err(TiffError::InvalidIfdOffset(1000))));
    }
}
