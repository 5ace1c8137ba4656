//! Olympus ORF preview locator.
//!
//! ORF keeps the TIFF directory layout but signs the header with its own
//! magic ("MMOR" big-endian or "IIRO" little-endian) in place of the TIFF
//! version word. Once the header parser accepts that signature the generic
//! navigator applies unchanged; some bodies also write plain classic-TIFF
//! headers with an OLYMPUS Make tag.

use crate::error::ExtractError;
use crate::extract::{BudgetGuard, PreviewCandidate};
use crate::io::RangeReader;
use crate::options::{DEFAULT_TARGET_MAX_SIZE, DEFAULT_TARGET_MIN_SIZE};

use super::jpeg;
use super::{scan_tiff, RawFormat};

/// Enumerate every embedded preview in an ORF file.
pub fn locate_previews<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
) -> Result<Vec<PreviewCandidate>, ExtractError> {
    let Some(scan) = scan_tiff(reader, guard)? else {
        return Ok(Vec::new());
    };
    // Both the vendor signature and classic-TIFF-with-Olympus-make occur
    if scan.header.is_panasonic_raw() {
        return Ok(Vec::new());
    }

    let mut previews = Vec::new();
    for hit in &scan.hits {
        if !jpeg::probe_range(reader, guard, hit.offset, hit.length)? {
            continue;
        }

        let priority = if hit.length >= DEFAULT_TARGET_MIN_SIZE
            && hit.length <= DEFAULT_TARGET_MAX_SIZE
        {
            10
        } else {
            6
        };
        let kind = if hit.ifd_index < 0 {
            format!("orf/subifd{}", -hit.ifd_index - 1)
        } else {
            format!("orf/ifd{}", hit.ifd_index)
        };

        previews.push(PreviewCandidate {
            format: RawFormat::Orf,
            offset: hit.offset,
            length: hit.length,
            width: hit.width,
            height: hit.height,
            quality: jpeg::classify_quality(hit.width, hit.height, hit.length),
            kind,
            priority,
            orientation: scan.orientation,
        });
    }

    Ok(previews)
}
