//! Format detection by magic markers.
//!
//! Detection inspects leading bytes first (fixed vendor headers, the CR3
//! brand, the CR2 magic word) and falls back to inspecting the first
//! directory for vendor discriminators (DNGVersion tag, Make string). It
//! never fails: any unreadable, truncated, or unrecognized input is
//! classified `Unknown`, including the zero-length buffer.

use tracing::debug;

use crate::error::ExtractError;
use crate::extract::BudgetGuard;
use crate::io::RangeReader;

use super::tiff::{read_make_model, tag, Navigator, TiffHeader, TIFF_HEADER_SIZE};
use super::RawFormat;

/// Fujifilm RAF fixed ASCII header.
const RAF_MAGIC: &[u8; 15] = b"FUJIFILMCCD-RAW";

/// ISO-BMFF `ftyp` box type.
const FTYP: &[u8; 4] = b"ftyp";

/// CR3 major brands: "cr3 " and the newer "crx ".
const CR3_BRANDS: [&[u8; 4]; 2] = [b"cr3 ", b"crx "];

/// Minimum input size considered for detection.
const MIN_DETECT_BYTES: usize = 16;

/// Detect the RAW format of the input.
///
/// Infallible: returns [`RawFormat::Unknown`] on any input this engine does
/// not recognize, including truncated and zero-length data.
pub fn detect_format<R: RangeReader>(reader: &R) -> RawFormat {
    let guard = BudgetGuard::unbounded();
    detect_with_guard(reader, &guard).unwrap_or(RawFormat::Unknown)
}

/// Detection under the calling extraction's budget; governor aborts
/// propagate instead of being folded into `Unknown`.
pub(crate) fn detect_with_guard<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
) -> Result<RawFormat, ExtractError> {
    if reader.size() < MIN_DETECT_BYTES as u64 {
        return Ok(RawFormat::Unknown);
    }

    guard.charge(MIN_DETECT_BYTES as u64)?;
    let head = match reader.read_at(0, MIN_DETECT_BYTES) {
        Ok(head) => head,
        Err(_) => return Ok(RawFormat::Unknown),
    };

    // Fixed-layout signatures first
    if &head[..RAF_MAGIC.len()] == RAF_MAGIC {
        return Ok(RawFormat::Raf);
    }

    if &head[4..8] == FTYP && CR3_BRANDS.iter().any(|b| &head[8..12] == *b) {
        return Ok(RawFormat::Cr3);
    }

    // TIFF-derived headers, including the Olympus and Panasonic variants
    let header = match TiffHeader::parse(&head, reader.size()) {
        Ok(header) => header,
        Err(_) => return Ok(RawFormat::Unknown),
    };

    if header.is_olympus_raw() {
        return Ok(RawFormat::Orf);
    }
    if header.is_panasonic_raw() {
        return Ok(RawFormat::Rw2);
    }

    // CR2 carries "CR" right after the classic header
    if &head[8..10] == b"CR" {
        return Ok(RawFormat::Cr2);
    }

    detect_from_first_ifd(reader, guard, &header)
}

/// Distinguish the classic-TIFF formats by their first directory.
fn detect_from_first_ifd<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
    header: &TiffHeader,
) -> Result<RawFormat, ExtractError> {
    let nav = Navigator::new(reader, header.byte_order, guard);

    let ifd = match nav.open_directory(u64::from(header.first_ifd_offset)) {
        Ok(ifd) => ifd,
        Err(crate::error::TiffError::Budget(b)) => return Err(b.into()),
        Err(err) => {
            debug!(error = %err, "first directory unreadable during detection");
            return Ok(RawFormat::Unknown);
        }
    };

    // DNG announces itself with a version tag in IFD0
    if ifd.has(tag::DNG_VERSION) {
        return Ok(RawFormat::Dng);
    }

    // Sony private tags identify ARW even without a Make string
    if ifd.has(tag::SONY_SR2_PRIVATE) || ifd.has(tag::SONY_SR2_SUB_IFD) {
        return Ok(RawFormat::Arw);
    }

    let (make, _model) = match read_make_model(&nav, header) {
        Ok(pair) => pair,
        Err(crate::error::TiffError::Budget(b)) => return Err(b.into()),
        Err(_) => (None, None),
    };

    if let Some(make) = make {
        let make = make.to_ascii_uppercase();
        if make.starts_with("NIKON") {
            return Ok(RawFormat::Nef);
        }
        if make.starts_with("SONY") {
            return Ok(RawFormat::Arw);
        }
        if make.starts_with("OLYMPUS") {
            return Ok(RawFormat::Orf);
        }
        if make.starts_with("PANASONIC") {
            return Ok(RawFormat::Rw2);
        }
        if make.starts_with("CANON") {
            return Ok(RawFormat::Cr2);
        }
    }

    // DNGs written without the version tag still name Adobe as software
    if let Some(entry) = ifd.entry(tag::SOFTWARE) {
        if let Ok(software) = nav.entry_string(entry) {
            if software.starts_with("Adobe") {
                return Ok(RawFormat::Dng);
            }
        }
    }

    Ok(RawFormat::Unknown)
}

/// Quick check that a buffer starts like a classic TIFF header.
pub fn is_tiff_header(bytes: &[u8]) -> bool {
    if bytes.len() < TIFF_HEADER_SIZE {
        return false;
    }
    TiffHeader::parse(bytes, u64::MAX)
        .map(|h| h.is_classic())
        .unwrap_or(false)
}

// =============================================================================
// Tests
// =============================================================================
