//! Sony ARW preview locator.
//!
//! ARW files are classic TIFF, but preview placement changed across body
//! generations: older files mark the preview directory with NewSubfileType=1,
//! newer ones carry full-size previews in SubIFDs, and the SR2 private
//! sub-structure (tags 0x7200/0x7201) can hold further embedded JPEGs. The
//! locator branches on which of these vendor structures the file carries.

use tracing::debug;

use crate::error::{ExtractError, TiffError};
use crate::extract::{BudgetGuard, PreviewCandidate, QualityTier};
use crate::io::RangeReader;
use crate::options::{DEFAULT_TARGET_MAX_SIZE, DEFAULT_TARGET_MIN_SIZE};

use super::jpeg;
use super::tiff::{tag, Navigator, PreviewHit};
use super::{scan_tiff, RawFormat};

/// Chained directories inspected by the SR2 walk.
const MAX_CHAIN_IFDS: usize = 16;

/// Scan window after an SR2 pointer whose block length is undeclared.
const SR2_SCAN_WINDOW: u64 = 4 * 1024 * 1024;

fn in_default_window(len: u64) -> bool {
    (DEFAULT_TARGET_MIN_SIZE..=DEFAULT_TARGET_MAX_SIZE).contains(&len)
}

/// Enumerate every embedded preview in an ARW file.
pub fn locate_previews<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
) -> Result<Vec<PreviewCandidate>, ExtractError> {
    let Some(scan) = scan_tiff(reader, guard)? else {
        return Ok(Vec::new());
    };
    if !scan.header.is_classic() {
        return Ok(Vec::new());
    }

    let mut previews = Vec::new();
    for hit in &scan.hits {
        if !jpeg::probe_range(reader, guard, hit.offset, hit.length)? {
            continue;
        }

        let (quality, kind, priority) = classify(hit);
        previews.push(PreviewCandidate {
            format: RawFormat::Arw,
            offset: hit.offset,
            length: hit.length,
            width: hit.width,
            height: hit.height,
            quality,
            kind,
            priority,
            orientation: scan.orientation,
        });
    }

    locate_sr2_previews(reader, guard, &scan, &mut previews)?;

    Ok(previews)
}

fn classify(hit: &PreviewHit) -> (QualityTier, String, i32) {
    if hit.subfile_type == 1 {
        // Reduced-resolution image: the designated preview directory
        let quality = jpeg::classify_quality(hit.width, hit.height, hit.length);
        let priority = if in_default_window(hit.length) {
            10
        } else if quality == QualityTier::Preview {
            8
        } else {
            5
        };
        return (quality, "arw/preview".to_owned(), priority);
    }

    match hit.ifd_index {
        1 => (QualityTier::Thumbnail, "arw/ifd1".to_owned(), 2),
        n if n < 0 => {
            // Recent bodies put megabyte-class previews in SubIFDs
            let quality = jpeg::classify_quality(hit.width, hit.height, hit.length);
            let priority = if hit.length >= 1024 * 1024 { 9 } else { 6 };
            (quality, format!("arw/subifd{}", -n - 1), priority)
        }
        0 => (
            jpeg::classify_quality(hit.width, hit.height, hit.length),
            "arw/ifd0".to_owned(),
            7,
        ),
        n => (
            jpeg::classify_quality(hit.width, hit.height, hit.length),
            format!("arw/ifd{}", n),
            4,
        ),
    }
}

/// Walk the chain for SR2 private structures.
///
/// Tag 0x7201 points at sub-directories that use the plain strip
/// convention; tag 0x7200 covers an opaque byte range that is skip-searched
/// for an embedded JPEG stream.
fn locate_sr2_previews<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
    scan: &super::TiffScan,
    previews: &mut Vec<PreviewCandidate>,
) -> Result<(), ExtractError> {
    let nav = Navigator::new(reader, scan.header.byte_order, guard);

    let mut current = u64::from(scan.header.first_ifd_offset);
    for _ in 0..MAX_CHAIN_IFDS {
        if current == 0 || current >= reader.size() {
            break;
        }
        let ifd = match nav.open_directory(current) {
            Ok(ifd) => ifd,
            Err(TiffError::Budget(b)) => return Err(b.into()),
            Err(_) => break,
        };

        // SR2 sub-directories with standard strip semantics
        if let Some(entry) = ifd.entry(tag::SONY_SR2_SUB_IFD) {
            let offsets = match nav.subdirectories(entry) {
                Ok(offsets) => offsets,
                Err(TiffError::Budget(b)) => return Err(b.into()),
                Err(_) => Vec::new(),
            };
            for sub_offset in offsets {
                let sub = match nav.open_directory(u64::from(sub_offset)) {
                    Ok(sub) => sub,
                    Err(TiffError::Budget(b)) => return Err(b.into()),
                    Err(err) => {
                        debug!(offset = sub_offset, error = %err, "skipping unreadable SR2 SubIFD");
                        continue;
                    }
                };
                if let Some(hit) = match super::tiff::hit_from_ifd(&nav, &sub, -1) {
                    Ok(hit) => hit,
                    Err(TiffError::Budget(b)) => return Err(b.into()),
                    Err(_) => None,
                } {
                    push_unique(
                        reader,
                        guard,
                        previews,
                        hit.offset,
                        hit.length,
                        "arw/sr2subifd",
                        if in_default_window(hit.length) { 11 } else { 7 },
                        scan.orientation,
                    )?;
                }
            }
        }

        // Opaque SR2 private range: skip-search for a JPEG stream. The tag
        // either points at the block (count 1) or spans it (count = bytes)
        if let Some(entry) = ifd.entry(tag::SONY_SR2_PRIVATE) {
            let start = match nav.entry_u32(entry) {
                Ok(v) => u64::from(v),
                Err(TiffError::Budget(b)) => return Err(b.into()),
                Err(_) => u64::from(entry.value_offset(scan.header.byte_order)),
            };
            if start > 0 {
                let declared = u64::from(entry.count);
                let end = if declared > 1 {
                    start.saturating_add(declared)
                } else {
                    start.saturating_add(SR2_SCAN_WINDOW)
                };
                if let Some(soi) = jpeg::scan_for_pair(reader, guard, start, end, jpeg::SOI)? {
                    if let Some(eoi) =
                        jpeg::scan_for_pair(reader, guard, soi + 2, reader.size(), jpeg::EOI)?
                    {
                        let length = eoi + 2 - soi;
                        push_unique(
                            reader,
                            guard,
                            previews,
                            soi,
                            length,
                            "arw/sr2private",
                            if in_default_window(length) { 12 } else { 8 },
                            scan.orientation,
                        )?;
                    }
                }
            }
        }

        current = u64::from(ifd.next_ifd_offset);
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn push_unique<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
    previews: &mut Vec<PreviewCandidate>,
    offset: u64,
    length: u64,
    kind: &str,
    priority: i32,
    orientation: Option<u16>,
) -> Result<(), ExtractError> {
    if previews
        .iter()
        .any(|p| p.offset == offset && p.length == length)
    {
        return Ok(());
    }
    if !jpeg::probe_range(reader, guard, offset, length)? {
        return Ok(());
    }
    previews.push(PreviewCandidate {
        format: RawFormat::Arw,
        offset,
        length,
        width: 0,
        height: 0,
        quality: jpeg::classify_quality(0, 0, length),
        kind: kind.to_owned(),
        priority,
        orientation,
    });
    Ok(())
}
