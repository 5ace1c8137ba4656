//! Nikon NEF preview locator.
//!
//! NEF files are classic TIFF. The full-size JPEG preview lives in a
//! sub-directory and is addressed by the JpgFromRaw start/length tag pair;
//! the generic strip convention covers the thumbnail in IFD1 and anything
//! older bodies write. The dedicated tag-pair walk runs after the generic
//! scan and deduplicates against it.

use tracing::debug;

use crate::error::{ExtractError, TiffError};
use crate::extract::{BudgetGuard, PreviewCandidate, QualityTier};
use crate::io::RangeReader;
use crate::options::{DEFAULT_TARGET_MAX_SIZE, DEFAULT_TARGET_MIN_SIZE};

use super::jpeg;
use super::tiff::{tag, Navigator};
use super::{scan_tiff, RawFormat};

/// Nikon stores the preview pointer under the JPEGInterchangeFormat pair
/// inside SubIFDs.
const NIKON_JPEG_START: u16 = tag::JPEG_INTERCHANGE_FORMAT;
const NIKON_JPEG_LENGTH: u16 = tag::JPEG_INTERCHANGE_FORMAT_LENGTH;

/// Chained directories inspected by the dedicated tag-pair walk.
const MAX_CHAIN_IFDS: usize = 16;

fn in_default_window(len: u64) -> bool {
    (DEFAULT_TARGET_MIN_SIZE..=DEFAULT_TARGET_MAX_SIZE).contains(&len)
}

/// Enumerate every embedded preview in a NEF file.
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
            n if n < 0 => {
                // SubIFD previews are the full-size ones on Nikon bodies
                let quality = jpeg::classify_quality(hit.width, hit.height, hit.length);
                let priority = if in_default_window(hit.length) {
                    10
                } else if quality == QualityTier::Preview {
                    8
                } else {
                    5
                };
                (quality, format!("nef/subifd{}", -n - 1), priority)
            }
            1 => (QualityTier::Thumbnail, "nef/ifd1".to_owned(), 2),
            0 => (
                jpeg::classify_quality(hit.width, hit.height, hit.length),
                "nef/ifd0".to_owned(),
                7,
            ),
            n => (
                jpeg::classify_quality(hit.width, hit.height, hit.length),
                format!("nef/ifd{}", n),
                3,
            ),
        };

        previews.push(PreviewCandidate {
            format: RawFormat::Nef,
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

    locate_jpg_from_raw(reader, guard, &scan, &mut previews)?;

    Ok(previews)
}

/// Dedicated walk for the JpgFromRaw tag pair in SubIFDs.
///
/// Some bodies write the pair into a sub-directory the generic scan ranks
/// poorly or misses; anything it finds that is not already listed gets the
/// highest NEF priority.
fn locate_jpg_from_raw<R: RangeReader>(
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

        if let Some(sub_entry) = ifd.entry(tag::SUB_IFDS) {
            let sub_offsets = match nav.subdirectories(sub_entry) {
                Ok(offsets) => offsets,
                Err(TiffError::Budget(b)) => return Err(b.into()),
                Err(_) => Vec::new(),
            };

            for sub_offset in sub_offsets {
                let sub = match nav.open_directory(u64::from(sub_offset)) {
                    Ok(sub) => sub,
                    Err(TiffError::Budget(b)) => return Err(b.into()),
                    Err(err) => {
                        debug!(offset = sub_offset, error = %err, "skipping unreadable SubIFD");
                        continue;
                    }
                };

                let (Some(start_entry), Some(len_entry)) =
                    (sub.entry(NIKON_JPEG_START), sub.entry(NIKON_JPEG_LENGTH))
                else {
                    continue;
                };
                let (Ok(offset), Ok(length)) =
                    (nav.entry_u32(start_entry), nav.entry_u32(len_entry))
                else {
                    continue;
                };
                let (offset, length) = (u64::from(offset), u64::from(length));

                if previews
                    .iter()
                    .any(|p| p.offset == offset && p.length == length)
                {
                    continue;
                }
                if !jpeg::probe_range(reader, guard, offset, length)? {
                    continue;
                }

                previews.push(PreviewCandidate {
                    format: RawFormat::Nef,
                    offset,
                    length,
                    width: 0,
                    height: 0,
                    quality: jpeg::classify_quality(0, 0, length),
                    kind: "nef/jpgfromraw".to_owned(),
                    priority: if in_default_window(length) { 12 } else { 7 },
                    orientation: scan.orientation,
                });
            }
        }

        current = u64::from(ifd.next_ifd_offset);
    }

    Ok(())
}
