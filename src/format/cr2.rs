//! Canon CR2 preview locator.
//!
//! CR2 files are classic TIFF with a fixed four-directory layout:
//!
//! - IFD0: full-size JPEG preview (the extraction target, ~2MB on most
//!   bodies, 2256x1504 on older ones)
//! - IFD1: 160x120 thumbnail
//! - IFD2: reduced-resolution RAW
//! - IFD3: full-resolution RAW
//!
//! The "CR" marker at offset 8 distinguishes CR2 from other TIFF RAW files.

use crate::error::ExtractError;
use crate::extract::{BudgetGuard, PreviewCandidate, QualityTier};
use crate::io::RangeReader;
use crate::options::{DEFAULT_TARGET_MAX_SIZE, DEFAULT_TARGET_MIN_SIZE};

use super::jpeg;
use super::{scan_tiff, RawFormat};

/// Enumerate every embedded preview in a CR2 file.
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

        let (quality, kind, priority) = match hit.ifd_index {
            0 => {
                // IFD0 holds the full-size preview; prefer it strongly when
                // it lands in the usual target window
                let priority = if hit.length >= DEFAULT_TARGET_MIN_SIZE
                    && hit.length <= DEFAULT_TARGET_MAX_SIZE
                {
                    10
                } else {
                    5
                };
                (QualityTier::Preview, "cr2/ifd0".to_owned(), priority)
            }
            1 => (QualityTier::Thumbnail, "cr2/ifd1".to_owned(), 1),
            n if n < 0 => (
                jpeg::classify_quality(hit.width, hit.height, hit.length),
                format!("cr2/subifd{}", -n - 1),
                3,
            ),
            n => (
                jpeg::classify_quality(hit.width, hit.height, hit.length),
                format!("cr2/ifd{}", n),
                3,
            ),
        };

        previews.push(PreviewCandidate {
            format: RawFormat::Cr2,
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

    Ok(previews)
}
