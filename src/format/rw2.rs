//! Panasonic RW2 preview locator.
//!
//! RW2 is a modified TIFF: the header magic is 0x0055 and the embedded
//! JPEG lives behind the vendor-private JpgFromRaw tag (0x002E), whose
//! value *is* the JPEG bytes — the entry's offset and count map directly to
//! the standard offset/length semantics. The generic directory scan runs
//! afterwards for files that also use the strip convention.

use crate::error::{ExtractError, TiffError};
use crate::extract::{BudgetGuard, PreviewCandidate, QualityTier};
use crate::io::RangeReader;
use crate::options::{DEFAULT_TARGET_MAX_SIZE, DEFAULT_TARGET_MIN_SIZE};

use super::jpeg;
use super::tiff::{tag, Navigator};
use super::{scan_tiff, RawFormat};

fn in_default_window(len: u64) -> bool {
    (DEFAULT_TARGET_MIN_SIZE..=DEFAULT_TARGET_MAX_SIZE).contains(&len)
}

/// Enumerate every embedded preview in an RW2 file.
pub fn locate_previews<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
) -> Result<Vec<PreviewCandidate>, ExtractError> {
    let Some(scan) = scan_tiff(reader, guard)? else {
        return Ok(Vec::new());
    };
    if scan.header.is_olympus_raw() {
        return Ok(Vec::new());
    }

    let mut previews = Vec::new();

    // The vendor tag takes precedence: its value is the whole JPEG
    locate_jpg_from_raw(reader, guard, &scan, &mut previews)?;

    for hit in &scan.hits {
        if previews
            .iter()
            .any(|p| p.offset == hit.offset && p.length == hit.length)
        {
            continue;
        }
        if !jpeg::probe_range(reader, guard, hit.offset, hit.length)? {
            continue;
        }

        let quality = jpeg::classify_quality(hit.width, hit.height, hit.length);
        let priority = if in_default_window(hit.length) {
            10
        } else if quality == QualityTier::Preview {
            8
        } else {
            5
        };
        let kind = if hit.ifd_index < 0 {
            format!("rw2/subifd{}", -hit.ifd_index - 1)
        } else {
            format!("rw2/ifd{}", hit.ifd_index)
        };

        previews.push(PreviewCandidate {
            format: RawFormat::Rw2,
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

/// Map the JpgFromRaw entry to offset/length semantics.
fn locate_jpg_from_raw<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
    scan: &super::TiffScan,
    previews: &mut Vec<PreviewCandidate>,
) -> Result<(), ExtractError> {
    let nav = Navigator::new(reader, scan.header.byte_order, guard);

    let ifd = match nav.open_directory(u64::from(scan.header.first_ifd_offset)) {
        Ok(ifd) => ifd,
        Err(TiffError::Budget(b)) => return Err(b.into()),
        Err(_) => return Ok(()),
    };

    let Some(entry) = ifd.entry(tag::PANASONIC_JPG_FROM_RAW) else {
        return Ok(());
    };

    // The JPEG never fits inline; the value field is its file offset and
    // the count its byte length
    if entry.is_inline() {
        return Ok(());
    }
    let offset = u64::from(entry.value_offset(scan.header.byte_order));
    let length = u64::from(entry.count);

    if !jpeg::probe_range(reader, guard, offset, length)? {
        return Ok(());
    }

    previews.push(PreviewCandidate {
        format: RawFormat::Rw2,
        offset,
        length,
        width: 0,
        height: 0,
        quality: jpeg::classify_quality(0, 0, length),
        kind: "rw2/jpgfromraw".to_owned(),
        priority: if in_default_window(length) { 10 } else { 8 },
        orientation: scan.orientation,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::BufferReader;

    #[test]
    fn test_non_tiff_input_yields_nothing() {
        let guard = BudgetGuard::unbounded();
        let reader = BufferReader::new(vec![0x77; 64]);
        assert!(locate_previews(&reader, &guard).unwrap().is_empty());
    }
}
