//! Canon CR3 preview locator.
//!
//! CR3 abandons TIFF for an ISO-BMFF box container (the MP4 family). Three
//! previews can be present:
//!
//! - a small THMB thumbnail inside the metadata region,
//! - the PRVW preview inside Canon's vendor UUID box,
//! - the full-resolution JPEG at the head of the `mdat` box.
//!
//! Box sizes and types are big-endian. Orientation lives in the CMT1
//! metadata record at a fixed offset, little-endian.

use crate::error::ExtractError;
use crate::extract::{BudgetGuard, PreviewCandidate, QualityTier};
use crate::io::{read_u32_be, RangeReader};

use super::jpeg;
use super::RawFormat;

/// Canon's UUID identifying the preview box.
const PREVIEW_UUID: [u8; 16] = [
    0xea, 0xf4, 0x2b, 0x5e, 0x1c, 0x98, 0x4b, 0x88, 0xb9, 0xfb, 0xb7, 0xdc, 0x40, 0x6e, 0x4d, 0x16,
];

/// CR3 major brands.
const CR3_BRANDS: [&[u8; 4]; 2] = [b"cr3 ", b"crx "];

/// The metadata region (THMB, CMT1) sits near the file start; signature
/// scans stop here.
const METADATA_SCAN_LIMIT: u64 = 4 * 1024 * 1024;

/// Window after a signature in which the JPEG stream must start.
const SOI_WINDOW: u64 = 64 * 1024;

/// Cap on the EOI search for the full-resolution preview in mdat.
const MDAT_JPEG_LIMIT: u64 = 48 * 1024 * 1024;

/// Upper bound on top-level boxes walked.
const MAX_BOXES: usize = 128;

/// A parsed box header: type, offset of the payload, total box size.
struct BoxHeader {
    box_type: [u8; 4],
    payload_offset: u64,
    size: u64,
}

fn parse_box<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
    offset: u64,
) -> Result<Option<BoxHeader>, ExtractError> {
    if offset + 8 > reader.size() {
        return Ok(None);
    }
    guard.charge(16)?;
    let head = reader.read_at(offset, 8)?;
    let mut size = u64::from(read_u32_be(&head[0..4]));
    let box_type = [head[4], head[5], head[6], head[7]];
    let mut payload_offset = offset + 8;

    if size == 1 {
        // 64-bit size follows the type
        if offset + 16 > reader.size() {
            return Ok(None);
        }
        let large = reader.read_at(offset + 8, 8)?;
        size = u64::from(read_u32_be(&large[0..4])) << 32 | u64::from(read_u32_be(&large[4..8]));
        payload_offset = offset + 16;
    } else if size == 0 {
        // Box extends to end of file
        size = reader.size() - offset;
    }

    if size < 8 {
        return Ok(None);
    }

    Ok(Some(BoxHeader {
        box_type,
        payload_offset,
        size,
    }))
}

/// Enumerate every embedded preview in a CR3 file.
pub fn locate_previews<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
) -> Result<Vec<PreviewCandidate>, ExtractError> {
    if reader.size() < 20 {
        return Ok(Vec::new());
    }
    guard.charge(12)?;
    let head = reader.read_at(0, 12)?;
    if &head[4..8] != b"ftyp" || !CR3_BRANDS.iter().any(|b| &head[8..12] == *b) {
        return Ok(Vec::new());
    }

    let orientation = extract_orientation(reader, guard)?;
    let mut previews = Vec::new();

    if let Some(thumb) = locate_thumbnail(reader, guard, orientation)? {
        previews.push(thumb);
    }
    if let Some(prvw) = locate_uuid_preview(reader, guard, orientation)? {
        previews.push(prvw);
    }
    if let Some(full) = locate_mdat_preview(reader, guard, orientation)? {
        previews.push(full);
    }

    Ok(previews)
}

/// THMB thumbnail: signature scan over the metadata region, then the JPEG
/// stream shortly after the box header.
fn locate_thumbnail<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
    orientation: Option<u16>,
) -> Result<Option<PreviewCandidate>, ExtractError> {
    let Some(thmb) = jpeg::scan_for_bytes(reader, guard, 0, METADATA_SCAN_LIMIT, b"THMB")? else {
        return Ok(None);
    };

    let search_from = thmb + 16; // skip the THMB header fields
    let Some(soi) =
        jpeg::scan_for_pair(reader, guard, search_from, search_from + SOI_WINDOW, jpeg::SOI)?
    else {
        return Ok(None);
    };
    let Some(eoi) =
        jpeg::scan_for_pair(reader, guard, soi + 2, soi + METADATA_SCAN_LIMIT, jpeg::EOI)?
    else {
        return Ok(None);
    };

    let length = eoi + 2 - soi;
    if !jpeg::probe_range(reader, guard, soi, length)? {
        return Ok(None);
    }

    Ok(Some(PreviewCandidate {
        format: RawFormat::Cr3,
        offset: soi,
        length,
        width: 160,
        height: 120,
        quality: QualityTier::Thumbnail,
        kind: "cr3/thmb".to_owned(),
        priority: 1,
        orientation,
    }))
}

/// PRVW preview inside Canon's vendor UUID box.
fn locate_uuid_preview<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
    orientation: Option<u16>,
) -> Result<Option<PreviewCandidate>, ExtractError> {
    let mut offset = 0u64;
    for _ in 0..MAX_BOXES {
        guard.check().map_err(ExtractError::from)?;
        let Some(current) = parse_box(reader, guard, offset)? else {
            break;
        };

        if &current.box_type == b"uuid" && current.size >= 32 {
            guard.charge(16)?;
            let uuid = reader.read_at(current.payload_offset, 16)?;
            if uuid[..] == PREVIEW_UUID {
                // Payload: 8 bytes of vendor header, then the PRVW box
                let prvw_offset = current.payload_offset + 24;
                if prvw_offset + 8 <= reader.size() {
                    guard.charge(8)?;
                    let prvw_head = reader.read_at(prvw_offset, 8)?;
                    let prvw_size = u64::from(read_u32_be(&prvw_head[0..4]));
                    if &prvw_head[4..8] == b"PRVW" && prvw_size > 20 {
                        let box_end = (prvw_offset + prvw_size).min(reader.size());
                        // 16 bytes of PRVW header precede the JPEG
                        let search_from = prvw_offset + 8 + 16;
                        if let Some(soi) =
                            jpeg::scan_for_pair(reader, guard, search_from, box_end, jpeg::SOI)?
                        {
                            if let Some(eoi) =
                                jpeg::scan_for_pair(reader, guard, soi + 2, box_end, jpeg::EOI)?
                            {
                                let length = eoi + 2 - soi;
                                if jpeg::probe_range(reader, guard, soi, length)? {
                                    return Ok(Some(PreviewCandidate {
                                        format: RawFormat::Cr3,
                                        offset: soi,
                                        length,
                                        width: 0,
                                        height: 0,
                                        quality: QualityTier::Preview,
                                        kind: "cr3/prvw".to_owned(),
                                        priority: 5,
                                        orientation,
                                    }));
                                }
                            }
                        }
                    }
                }
            }
        }

        offset += current.size;
        if offset >= reader.size() {
            break;
        }
    }
    Ok(None)
}

/// Full-resolution JPEG at the head of the mdat box. Only megabyte-class
/// streams qualify; smaller hits are codec headers, not previews.
fn locate_mdat_preview<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
    orientation: Option<u16>,
) -> Result<Option<PreviewCandidate>, ExtractError> {
    let mut offset = 0u64;
    for _ in 0..MAX_BOXES {
        guard.check().map_err(ExtractError::from)?;
        let Some(current) = parse_box(reader, guard, offset)? else {
            break;
        };

        if &current.box_type == b"mdat" {
            let box_end = (offset + current.size).min(reader.size());
            let Some(soi) = jpeg::scan_for_pair(
                reader,
                guard,
                current.payload_offset,
                (current.payload_offset + SOI_WINDOW).min(box_end),
                jpeg::SOI,
            )?
            else {
                return Ok(None);
            };
            let Some(eoi) = jpeg::scan_for_pair(
                reader,
                guard,
                soi + 2,
                (soi + MDAT_JPEG_LIMIT).min(box_end),
                jpeg::EOI,
            )?
            else {
                return Ok(None);
            };

            let length = eoi + 2 - soi;
            if length <= 1024 * 1024 {
                return Ok(None);
            }
            if !jpeg::probe_range(reader, guard, soi, length)? {
                return Ok(None);
            }

            return Ok(Some(PreviewCandidate {
                format: RawFormat::Cr3,
                offset: soi,
                length,
                width: 0,
                height: 0,
                quality: QualityTier::Full,
                kind: "cr3/mdat".to_owned(),
                priority: 10,
                orientation,
            }));
        }

        offset += current.size;
        if offset >= reader.size() {
            break;
        }
    }
    Ok(None)
}

/// Orientation from the CMT1 record: a little-endian u16 at +0x140.
fn extract_orientation<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
) -> Result<Option<u16>, ExtractError> {
    let Some(cmt1) = jpeg::scan_for_bytes(reader, guard, 0, METADATA_SCAN_LIMIT, b"CMT1")? else {
        return Ok(None);
    };

    let at = cmt1 + 0x140;
    if at + 2 > reader.size() {
        return Ok(None);
    }
    guard.charge(2)?;
    let bytes = reader.read_at(at, 2)?;
    let value = u16::from_le_bytes([bytes[0], bytes[1]]);
    Ok(((1..=8).contains(&value)).then_some(value))
}
