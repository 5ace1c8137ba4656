//! Fujifilm RAF preview locator.
//!
//! RAF is not TIFF-derived. The file opens with a fixed ASCII header and
//! stores the embedded JPEG's offset and length at fixed positions, always
//! big-endian regardless of anything else:
//!
//! ```text
//! Bytes  0-15: "FUJIFILMCCD-RAW " signature
//! Bytes 84-87: JPEG offset (big-endian u32)
//! Bytes 88-91: JPEG length (big-endian u32)
//! ```

use crate::error::ExtractError;
use crate::extract::{BudgetGuard, PreviewCandidate};
use crate::io::{read_u32_be, RangeReader};
use crate::options::{DEFAULT_TARGET_MAX_SIZE, DEFAULT_TARGET_MIN_SIZE};

use super::jpeg;
use super::RawFormat;

/// Fixed ASCII signature at the start of every RAF file.
const RAF_MAGIC: &[u8; 15] = b"FUJIFILMCCD-RAW";

/// Position of the big-endian JPEG offset/length pair.
const POINTER_OFFSET: u64 = 84;

/// Enumerate the embedded preview of a RAF file.
pub fn locate_previews<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
) -> Result<Vec<PreviewCandidate>, ExtractError> {
    if reader.size() < 100 {
        return Ok(Vec::new());
    }

    guard.charge(16)?;
    let head = reader.read_at(0, 16)?;
    if &head[..RAF_MAGIC.len()] != RAF_MAGIC {
        return Ok(Vec::new());
    }

    guard.charge(8)?;
    let pointer = reader.read_at(POINTER_OFFSET, 8)?;
    let offset = u64::from(read_u32_be(&pointer[0..4]));
    let length = u64::from(read_u32_be(&pointer[4..8]));

    if offset == 0 || length == 0 || offset.saturating_add(length) > reader.size() {
        return Ok(Vec::new());
    }
    if !jpeg::probe_range(reader, guard, offset, length)? {
        return Ok(Vec::new());
    }

    let priority = if length >= DEFAULT_TARGET_MIN_SIZE && length <= DEFAULT_TARGET_MAX_SIZE {
        10
    } else {
        7
    };

    Ok(vec![PreviewCandidate {
        format: RawFormat::Raf,
        offset,
        length,
        width: 0,
        height: 0,
        quality: jpeg::classify_quality(0, 0, length),
        kind: "raf/fixed".to_owned(),
        priority,
        orientation: None,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::BufferReader;

    #[test]
    fn test_rejects_short_and_unsigned_input() {
        let guard = BudgetGuard::unbounded();

        let reader = BufferReader::new(vec![0u8; 50]);
        assert!(locate_previews(&reader, &guard).unwrap().is_empty());

        let reader = BufferReader::new(vec![0u8; 256]);
        assert!(locate_previews(&reader, &guard).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_out_of_range_pointer() {
        let mut data = Vec::from(&b"FUJIFILMCCD-RAW "[..]);
        data.resize(256, 0);
        // Offset 84: pointer far past the end
        data[84..88].copy_from_slice(&10_000u32.to_be_bytes());
        data[88..92].copy_from_slice(&500u32.to_be_bytes());

        let guard = BudgetGuard::unbounded();
        let reader = BufferReader::new(data);
        assert!(locate_previews(&reader, &guard).unwrap().is_empty());
    }
}
