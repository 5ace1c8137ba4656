//! JPEG stream validation and classification.
//!
//! Candidate previews are byte ranges claimed to hold a JPEG stream. This
//! module confirms the claim without decoding:
//!
//! - **Probe**: start-of-image at the head, end-of-image in the tail. Cheap
//!   enough to run on every discovered candidate.
//! - **Strict validation**: walk the marker chain segment by segment; every
//!   length must stay in bounds, and the entropy-coded data after SOS must
//!   terminate with EOI.
//!
//! Marker searches use a Boyer-Moore-Horspool skip table instead of a
//! byte-by-byte scan, which matters on multi-megabyte previews.

use bytes::Bytes;

use crate::error::ExtractError;
use crate::extract::BudgetGuard;
use crate::extract::QualityTier;
use crate::io::RangeReader;

// =============================================================================
// Markers
// =============================================================================

/// Start Of Image marker
pub const SOI: [u8; 2] = [0xFF, 0xD8];

/// End Of Image marker
pub const EOI: [u8; 2] = [0xFF, 0xD9];

/// Start Of Scan marker
pub const SOS: [u8; 2] = [0xFF, 0xDA];

/// Tail window searched for EOI during probing; embedded previews often
/// carry a little padding after the marker.
const EOI_TAIL_WINDOW: usize = 4096;

/// Chunk size for marker scans over a reader range.
const SCAN_CHUNK: usize = 64 * 1024;

// =============================================================================
// Horspool search
// =============================================================================

/// Find `needle` in `data` at or after `from`, using a Boyer-Moore-Horspool
/// shift on the byte under the window's last position.
pub fn find_bytes(data: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    let m = needle.len();
    if m == 0 || data.len() < m {
        return None;
    }

    let mut shift = [m; 256];
    for (i, &b) in needle[..m - 1].iter().enumerate() {
        shift[b as usize] = m - 1 - i;
    }

    let mut i = from;
    while i + m <= data.len() {
        let last = data[i + m - 1];
        if last == needle[m - 1] && &data[i..i + m] == needle {
            return Some(i);
        }
        i += shift[last as usize];
    }
    None
}

/// Find a two-byte marker in `data` at or after `from`.
#[inline]
pub fn find_pair(data: &[u8], needle: [u8; 2], from: usize) -> Option<usize> {
    find_bytes(data, &needle, from)
}

/// Find the last occurrence of a two-byte marker in `data`.
pub fn rfind_pair(data: &[u8], needle: [u8; 2]) -> Option<usize> {
    if data.len() < 2 {
        return None;
    }
    let mut i = data.len() - 2;
    loop {
        if data[i] == needle[0] && data[i + 1] == needle[1] {
            return Some(i);
        }
        if i == 0 {
            return None;
        }
        i -= 1;
    }
}

/// Scan `[start, end)` of a reader for a byte pattern, in bounded chunks.
///
/// Chunks overlap by `needle.len() - 1` bytes so a pattern straddling a
/// boundary is still found. Every chunk is charged against the budget.
pub fn scan_for_bytes<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
    start: u64,
    end: u64,
    needle: &[u8],
) -> Result<Option<u64>, ExtractError> {
    let m = needle.len() as u64;
    let end = end.min(reader.size());
    if m == 0 || start + m > end {
        return Ok(None);
    }

    let mut at = start;
    while at + m <= end {
        let len = ((end - at) as usize).min(SCAN_CHUNK);
        guard.charge(len as u64)?;
        let chunk = reader.read_at(at, len)?;
        if let Some(pos) = find_bytes(&chunk, needle, 0) {
            return Ok(Some(at + pos as u64));
        }
        if at + len as u64 >= end {
            break;
        }
        at += len as u64 - (m - 1); // re-check the boundary bytes
    }
    Ok(None)
}

/// Scan `[start, end)` of a reader for a two-byte marker.
#[inline]
pub fn scan_for_pair<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
    start: u64,
    end: u64,
    needle: [u8; 2],
) -> Result<Option<u64>, ExtractError> {
    scan_for_bytes(reader, guard, start, end, &needle)
}

// =============================================================================
// Validation
// =============================================================================

/// Validate an in-memory JPEG stream.
///
/// Non-strict mode checks only the boundary markers: SOI at the head and
/// EOI somewhere in the stream (searched from the tail, since padding after
/// EOI is common). Strict mode walks the marker chain and rejects
/// unterminated segments.
pub fn is_valid_jpeg(data: &[u8], strict: bool) -> bool {
    if data.len() < 4 || data[0..2] != SOI {
        return false;
    }

    if !strict {
        return rfind_pair(data, EOI).is_some();
    }

    walk_marker_chain(data)
}

/// Walk the segment chain of a JPEG stream.
///
/// Between SOI and SOS every marker segment declares its own length; the
/// walk fails if a length runs past the end of the data. After SOS the
/// entropy-coded data is skip-searched for EOI (restart markers and 0xFF00
/// stuffing never form 0xFFD9, so the first hit is the terminator).
fn walk_marker_chain(data: &[u8]) -> bool {
    let mut pos = 2;

    loop {
        if pos + 2 > data.len() {
            return false;
        }
        if data[pos] != 0xFF {
            return false; // garbage between segments
        }
        // Fill bytes (0xFF runs) before a marker are legal
        while pos + 2 < data.len() && data[pos + 1] == 0xFF {
            pos += 1;
        }

        let marker = data[pos + 1];
        match marker {
            0xD9 => return true, // EOI before any scan: tables-only stream
            0xDA => {
                // Start of scan: skip its header, then search for EOI
                if pos + 4 > data.len() {
                    return false;
                }
                let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
                if seg_len < 2 || pos + 2 + seg_len > data.len() {
                    return false;
                }
                return find_pair(data, EOI, pos + 2 + seg_len).is_some();
            }
            // Standalone markers: TEM, restart markers
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
            }
            0xD8 => {
                // A second SOI mid-chain is malformed
                return false;
            }
            _ => {
                if pos + 4 > data.len() {
                    return false;
                }
                let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
                if seg_len < 2 || pos + 2 + seg_len > data.len() {
                    return false; // unterminated segment
                }
                pos += 2 + seg_len;
            }
        }
    }
}

/// Validate a candidate byte range through the reader.
///
/// Non-strict mode reads only the head and a tail window. Strict mode pulls
/// the whole range (charged against the budget) and walks the chain.
pub fn validate_range<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
    offset: u64,
    length: u64,
    strict: bool,
) -> Result<bool, ExtractError> {
    if length < 4 || !range_in_bounds(reader, offset, length) {
        return Ok(false);
    }

    if strict {
        guard.charge(length)?;
        let data = reader.read_at(offset, length as usize)?;
        return Ok(is_valid_jpeg(&data, true));
    }

    probe_range(reader, guard, offset, length)
}

/// Boundary-marker probe of a candidate range: SOI at the head, EOI within
/// the tail window. Cheap enough for every discovered candidate.
pub fn probe_range<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
    offset: u64,
    length: u64,
) -> Result<bool, ExtractError> {
    if length < 4 || !range_in_bounds(reader, offset, length) {
        return Ok(false);
    }

    guard.charge(2)?;
    let head = reader.read_at(offset, 2)?;
    if head[..] != SOI {
        return Ok(false);
    }

    let tail_len = (length as usize).min(EOI_TAIL_WINDOW);
    guard.charge(tail_len as u64)?;
    let tail = reader.read_at(offset + length - tail_len as u64, tail_len)?;
    Ok(rfind_pair(&tail, EOI).is_some())
}

#[inline]
fn range_in_bounds<R: RangeReader>(reader: &R, offset: u64, length: u64) -> bool {
    offset
        .checked_add(length)
        .is_some_and(|end| end <= reader.size())
}

/// Slice a validated candidate range out of the reader.
pub fn slice_range<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
    offset: u64,
    length: u64,
) -> Result<Bytes, ExtractError> {
    guard.charge(length)?;
    Ok(reader.read_at(offset, length as usize)?)
}

// =============================================================================
// Classification
// =============================================================================

/// Classify a preview into a quality tier from its declared dimensions and
/// byte size. Dimensions are frequently absent (zero); size carries most of
/// the signal then.
pub fn classify_quality(width: u32, height: u32, len: u64) -> QualityTier {
    const THUMBNAIL_MAX_SIZE: u64 = 500 * 1024;
    const PREVIEW_MIN_SIZE: u64 = 200 * 1024;
    const PREVIEW_MAX_SIZE: u64 = 3 * 1024 * 1024;

    const THUMBNAIL_MAX_WIDTH: u32 = 320;
    const THUMBNAIL_MAX_HEIGHT: u32 = 240;
    const PREVIEW_MIN_WIDTH: u32 = 800;
    const PREVIEW_MIN_HEIGHT: u32 = 600;

    if len <= THUMBNAIL_MAX_SIZE
        || (width <= THUMBNAIL_MAX_WIDTH && height <= THUMBNAIL_MAX_HEIGHT && width > 0)
    {
        return QualityTier::Thumbnail;
    }

    if len >= PREVIEW_MIN_SIZE
        && len <= PREVIEW_MAX_SIZE
        && width >= PREVIEW_MIN_WIDTH
        && height >= PREVIEW_MIN_HEIGHT
    {
        return QualityTier::Preview;
    }

    if len > PREVIEW_MAX_SIZE || width > 2048 || height > 2048 {
        return QualityTier::Full;
    }

    QualityTier::Preview
}

// =============================================================================
// Tests
// =============================================================================
