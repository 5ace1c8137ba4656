//! Adobe DNG preview locator.
//!
//! DNG is the standards-compliant case: IFD0 holds a low-resolution
//! thumbnail, SubIFDs hold the documented preview chain, and NewSubfileType=1
//! marks each reduced-resolution image. Multiple resolutions are routinely
//! present and all are surfaced as candidates.

use crate::error::ExtractError;
use crate::extract::{BudgetGuard, PreviewCandidate, QualityTier};
use crate::io::RangeReader;
use crate::options::{DEFAULT_TARGET_MAX_SIZE, DEFAULT_TARGET_MIN_SIZE};

use super::jpeg;
use super::{scan_tiff, RawFormat};

/// Enumerate every embedded preview in a DNG file.
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

        let (quality, kind, priority) = if hit.subfile_type == 1 {
            let quality = jpeg::classify_quality(hit.width, hit.height, hit.length);
            let priority = if hit.length >= DEFAULT_TARGET_MIN_SIZE
                && hit.length <= DEFAULT_TARGET_MAX_SIZE
            {
                10
            } else {
                8
            };
            (quality, "dng/preview".to_owned(), priority)
        } else {
            match hit.ifd_index {
                n if n < 0 => (
                    jpeg::classify_quality(hit.width, hit.height, hit.length),
                    format!("dng/subifd{}", -n - 1),
                    9,
                ),
                0 => (QualityTier::Thumbnail, "dng/ifd0".to_owned(), 2),
                n => (
                    jpeg::classify_quality(hit.width, hit.height, hit.length),
                    format!("dng/ifd{}", n),
                    5,
                ),
            }
        };

        previews.push(PreviewCandidate {
            format: RawFormat::Dng,
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
