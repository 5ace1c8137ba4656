//! Directory navigation for TIFF-derived RAW containers.
//!
//! An IFD (Image File Directory) is a counted list of 12-byte tagged
//! entries followed by the offset of the next directory in the chain. Small
//! values live inline in the entry's 4-byte value field; larger values live
//! at the offset that field holds. The [`Navigator`] resolves both cases
//! through the [`RangeReader`], respecting the byte order fixed by the file
//! header and checking the resource budget on every entry visited and every
//! range read.
//!
//! A directory or entry that points outside the readable range fails only
//! that lookup; the format locators skip the bad candidate and keep going.

use bytes::Bytes;
use tracing::debug;

use crate::error::TiffError;
use crate::extract::BudgetGuard;
use crate::io::RangeReader;

use super::parser::{ByteOrder, TiffHeader, IFD_ENTRY_SIZE};
use super::tags::{is_jpeg_compression, tag, FieldType};

/// Upper bound on chained top-level directories. Real RAW files carry at
/// most a handful; the cap defends the walk against offset cycles.
const MAX_CHAIN_IFDS: usize = 16;

/// Upper bound on entries in one directory, matching the largest observed
/// vendor directories with generous headroom.
const MAX_IFD_ENTRIES: u16 = 1024;

// =============================================================================
// IfdEntry
// =============================================================================

/// One 12-byte directory entry: tag, field type, count, value-or-offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfdEntry {
    pub tag: u16,
    pub field_type_raw: u16,
    pub field_type: Option<FieldType>,
    pub count: u32,
    /// The raw 4-byte value/offset field, byte order untouched.
    pub value_bytes: [u8; 4],
}

impl IfdEntry {
    /// Total byte size of this entry's value, or `None` for unknown types.
    pub fn byte_len(&self) -> Option<u64> {
        self.field_type
            .map(|ft| ft.size_in_bytes() as u64 * u64::from(self.count))
    }

    /// True when the value is stored inline in the entry.
    pub fn is_inline(&self) -> bool {
        self.field_type
            .map(|ft| ft.fits_inline(self.count))
            .unwrap_or(false)
    }

    /// The value field interpreted as an offset.
    #[inline]
    pub fn value_offset(&self, byte_order: ByteOrder) -> u32 {
        byte_order.read_u32(&self.value_bytes)
    }
}

// =============================================================================
// Ifd
// =============================================================================

/// A parsed directory: its entries and the offset of the next one.
#[derive(Debug, Clone)]
pub struct Ifd {
    /// File offset this directory was read from
    pub offset: u64,
    pub entries: Vec<IfdEntry>,
    /// Offset of the next directory in the chain, 0 for none
    pub next_ifd_offset: u32,
}

impl Ifd {
    /// Look up an entry by tag.
    pub fn entry(&self, tag: u16) -> Option<&IfdEntry> {
        self.entries.iter().find(|e| e.tag == tag)
    }

    /// True when the directory carries the given tag.
    pub fn has(&self, tag: u16) -> bool {
        self.entry(tag).is_some()
    }
}

// =============================================================================
// Navigator
// =============================================================================

/// Directory walker: composes a reader, the file's byte order, and the
/// call's budget guard. Format locators share one navigator per call.
pub struct Navigator<'a, R: RangeReader> {
    reader: &'a R,
    byte_order: ByteOrder,
    guard: &'a BudgetGuard,
}

impl<'a, R: RangeReader> Navigator<'a, R> {
    pub fn new(reader: &'a R, byte_order: ByteOrder, guard: &'a BudgetGuard) -> Self {
        Self {
            reader,
            byte_order,
            guard,
        }
    }

    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    #[inline]
    pub fn reader(&self) -> &R {
        self.reader
    }

    /// Read and parse the directory at `offset`.
    ///
    /// Fails with `InvalidIfdOffset` when the directory does not fit inside
    /// the file; the caller decides whether that sinks one candidate or the
    /// whole parse.
    pub fn open_directory(&self, offset: u64) -> Result<Ifd, TiffError> {
        self.guard.check()?;

        if offset == 0 || offset + 2 > self.reader.size() {
            return Err(TiffError::InvalidIfdOffset(offset));
        }

        self.guard.charge(2)?;
        let count_bytes = self.reader.read_at(offset, 2)?;
        let entry_count = self.byte_order.read_u16(&count_bytes);
        if entry_count == 0 || entry_count > MAX_IFD_ENTRIES {
            return Err(TiffError::InvalidIfdOffset(offset));
        }

        // Entries plus the trailing next-IFD offset, read in one request
        let body_len = usize::from(entry_count) * IFD_ENTRY_SIZE + 4;
        self.guard.charge(body_len as u64)?;
        let body = self.reader.read_at(offset + 2, body_len)?;

        let mut entries = Vec::with_capacity(usize::from(entry_count));
        for i in 0..usize::from(entry_count) {
            self.guard.check()?;
            let at = i * IFD_ENTRY_SIZE;
            let field_type_raw = self.byte_order.read_u16(&body[at + 2..at + 4]);
            entries.push(IfdEntry {
                tag: self.byte_order.read_u16(&body[at..at + 2]),
                field_type_raw,
                field_type: FieldType::from_u16(field_type_raw),
                count: self.byte_order.read_u32(&body[at + 4..at + 8]),
                value_bytes: [
                    body[at + 8],
                    body[at + 9],
                    body[at + 10],
                    body[at + 11],
                ],
            });
        }

        let next_at = usize::from(entry_count) * IFD_ENTRY_SIZE;
        let next_ifd_offset = self.byte_order.read_u32(&body[next_at..next_at + 4]);

        Ok(Ifd {
            offset,
            entries,
            next_ifd_offset,
        })
    }

    /// Raw bytes of an entry's value, inline or fetched from its offset.
    pub fn entry_bytes(&self, entry: &IfdEntry) -> Result<Bytes, TiffError> {
        let len = entry
            .byte_len()
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if entry.is_inline() {
            return Ok(Bytes::copy_from_slice(&entry.value_bytes[..len as usize]));
        }

        let offset = u64::from(entry.value_offset(self.byte_order));
        self.guard.charge(len)?;
        Ok(self.reader.read_at(offset, len as usize)?)
    }

    /// A single numeric value, converting Byte/Short/Long as needed.
    pub fn entry_u32(&self, entry: &IfdEntry) -> Result<u32, TiffError> {
        if entry.count != 1 {
            return Err(TiffError::InvalidTagValue {
                tag: entry.tag,
                message: format!("expected count 1, got {}", entry.count),
            });
        }

        let bytes = self.entry_bytes(entry)?;
        match entry.field_type {
            Some(FieldType::Byte) => Ok(u32::from(bytes[0])),
            Some(FieldType::Short) => Ok(u32::from(self.byte_order.read_u16(&bytes))),
            Some(FieldType::Long) => Ok(self.byte_order.read_u32(&bytes)),
            _ => Err(TiffError::InvalidTagValue {
                tag: entry.tag,
                message: format!("expected Byte, Short, or Long, got {:?}", entry.field_type),
            }),
        }
    }

    /// All numeric values of an array entry, converted to u32.
    pub fn entry_u32s(&self, entry: &IfdEntry) -> Result<Vec<u32>, TiffError> {
        if entry.count == 0 {
            return Ok(Vec::new());
        }

        let bytes = self.entry_bytes(entry)?;
        let count = entry.count as usize;
        let mut values = Vec::with_capacity(count);

        match entry.field_type {
            Some(FieldType::Byte) => {
                for i in 0..count {
                    values.push(u32::from(bytes[i]));
                }
            }
            Some(FieldType::Short) => {
                for i in 0..count {
                    values.push(u32::from(self.byte_order.read_u16(&bytes[i * 2..])));
                }
            }
            Some(FieldType::Long) => {
                for i in 0..count {
                    values.push(self.byte_order.read_u32(&bytes[i * 4..]));
                }
            }
            _ => {
                return Err(TiffError::InvalidTagValue {
                    tag: entry.tag,
                    message: format!(
                        "expected Byte, Short, or Long array, got {:?}",
                        entry.field_type
                    ),
                });
            }
        }

        Ok(values)
    }

    /// A null-terminated ASCII string value, terminator stripped.
    pub fn entry_string(&self, entry: &IfdEntry) -> Result<String, TiffError> {
        if entry.field_type != Some(FieldType::Ascii) {
            return Err(TiffError::InvalidTagValue {
                tag: entry.tag,
                message: format!("expected Ascii, got {:?}", entry.field_type),
            });
        }

        let bytes = self.entry_bytes(entry)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end])
            .trim_end()
            .to_owned())
    }

    /// Child directory offsets from a SubIFDs-style entry.
    pub fn subdirectories(&self, entry: &IfdEntry) -> Result<Vec<u32>, TiffError> {
        self.entry_u32s(entry)
    }
}

// =============================================================================
// Shared preview scan
// =============================================================================

/// One raw preview hit from the directory walk, before any format-specific
/// classification. `ifd_index` is the position in the top-level chain, or
/// `-1 - n` for the n-th sub-directory hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewHit {
    pub ifd_index: i32,
    pub offset: u64,
    pub length: u64,
    pub width: u32,
    pub height: u32,
    pub is_jpeg: bool,
    pub subfile_type: u32,
}

/// Read an entry value, treating malformed values as absent but letting
/// budget aborts unwind.
fn tolerant_u32<R: RangeReader>(
    nav: &Navigator<R>,
    entry: Option<&IfdEntry>,
) -> Result<Option<u32>, TiffError> {
    match entry {
        None => Ok(None),
        Some(e) => match nav.entry_u32(e) {
            Ok(v) => Ok(Some(v)),
            Err(err @ TiffError::Budget(_)) => Err(err),
            Err(_) => Ok(None),
        },
    }
}

fn tolerant_u32s<R: RangeReader>(
    nav: &Navigator<R>,
    entry: Option<&IfdEntry>,
) -> Result<Vec<u32>, TiffError> {
    match entry {
        None => Ok(Vec::new()),
        Some(e) => match nav.entry_u32s(e) {
            Ok(v) => Ok(v),
            Err(err @ TiffError::Budget(_)) => Err(err),
            Err(_) => Ok(Vec::new()),
        },
    }
}

/// Extract a preview hit from one directory, if it references image data.
///
/// Two conventions are recognized: the strip-offset pair used by most
/// TIFF-based RAW files, and the JPEGInterchangeFormat pair used by Nikon
/// and by EXIF-style thumbnail directories. The latter wins when both are
/// present, matching how writers use it to point at the actual JPEG.
pub fn hit_from_ifd<R: RangeReader>(
    nav: &Navigator<R>,
    ifd: &Ifd,
    ifd_index: i32,
) -> Result<Option<PreviewHit>, TiffError> {
    let mut offset = 0u64;
    let mut length = 0u64;

    let strip_offsets = tolerant_u32s(nav, ifd.entry(tag::STRIP_OFFSETS))?;
    let strip_counts = tolerant_u32s(nav, ifd.entry(tag::STRIP_BYTE_COUNTS))?;
    if !strip_offsets.is_empty() && strip_offsets.len() == strip_counts.len() {
        offset = u64::from(strip_offsets[0]);
        length = u64::from(strip_counts[0]);
    }

    if let (Some(jif), Some(jif_len)) = (
        tolerant_u32(nav, ifd.entry(tag::JPEG_INTERCHANGE_FORMAT))?,
        tolerant_u32(nav, ifd.entry(tag::JPEG_INTERCHANGE_FORMAT_LENGTH))?,
    ) {
        offset = u64::from(jif);
        length = u64::from(jif_len);
    }

    if offset == 0 || length == 0 {
        return Ok(None);
    }

    let compression = tolerant_u32(nav, ifd.entry(tag::COMPRESSION))?;
    Ok(Some(PreviewHit {
        ifd_index,
        offset,
        length,
        width: tolerant_u32(nav, ifd.entry(tag::IMAGE_WIDTH))?.unwrap_or(0),
        height: tolerant_u32(nav, ifd.entry(tag::IMAGE_LENGTH))?.unwrap_or(0),
        is_jpeg: compression.map(is_jpeg_compression).unwrap_or(false),
        subfile_type: tolerant_u32(nav, ifd.entry(tag::NEW_SUBFILE_TYPE))?.unwrap_or(0),
    }))
}

/// Walk the whole directory chain plus sub-directories, collecting every
/// preview hit. A malformed directory ends the chain (or skips the
/// sub-directory) without failing the scan; only budget aborts propagate.
pub fn scan_previews<R: RangeReader>(
    nav: &Navigator<R>,
    header: &TiffHeader,
) -> Result<Vec<PreviewHit>, TiffError> {
    let mut hits = Vec::new();
    let mut sub_counter = 0i32;

    let mut current = u64::from(header.first_ifd_offset);
    for ifd_index in 0..MAX_CHAIN_IFDS {
        if current == 0 || current >= nav.reader().size() {
            break;
        }

        let ifd = match nav.open_directory(current) {
            Ok(ifd) => ifd,
            Err(err @ TiffError::Budget(_)) => return Err(err),
            Err(err) => {
                debug!(offset = current, error = %err, "directory unreadable, ending chain");
                break;
            }
        };

        if let Some(hit) = hit_from_ifd(nav, &ifd, ifd_index as i32)? {
            hits.push(hit);
        }

        if let Some(sub_entry) = ifd.entry(tag::SUB_IFDS) {
            for sub_offset in tolerant_u32s(nav, Some(sub_entry))? {
                let sub = match nav.open_directory(u64::from(sub_offset)) {
                    Ok(sub) => sub,
                    Err(err @ TiffError::Budget(_)) => return Err(err),
                    Err(err) => {
                        debug!(offset = sub_offset, error = %err, "sub-directory unreadable, skipping");
                        continue;
                    }
                };
                sub_counter += 1;
                if let Some(hit) = hit_from_ifd(nav, &sub, -sub_counter)? {
                    hits.push(hit);
                }
            }
        }

        current = u64::from(ifd.next_ifd_offset);
    }

    Ok(hits)
}

/// EXIF orientation from the first directory, when present and valid (1-8).
pub fn first_ifd_orientation<R: RangeReader>(
    nav: &Navigator<R>,
    header: &TiffHeader,
) -> Result<Option<u16>, TiffError> {
    let ifd = match nav.open_directory(u64::from(header.first_ifd_offset)) {
        Ok(ifd) => ifd,
        Err(err @ TiffError::Budget(_)) => return Err(err),
        Err(_) => return Ok(None),
    };

    let value = tolerant_u32(nav, ifd.entry(tag::ORIENTATION))?;
    Ok(value
        .filter(|v| (1..=8).contains(v))
        .map(|v| v as u16))
}

/// Camera make and model strings from the first directory.
pub fn read_make_model<R: RangeReader>(
    nav: &Navigator<R>,
    header: &TiffHeader,
) -> Result<(Option<String>, Option<String>), TiffError> {
    let ifd = match nav.open_directory(u64::from(header.first_ifd_offset)) {
        Ok(ifd) => ifd,
        Err(err @ TiffError::Budget(_)) => return Err(err),
        Err(_) => return Ok((None, None)),
    };

    let read = |entry: Option<&IfdEntry>| -> Result<Option<String>, TiffError> {
        match entry {
            None => Ok(None),
            Some(e) => match nav.entry_string(e) {
                Ok(s) if !s.is_empty() => Ok(Some(s)),
                Ok(_) => Ok(None),
                Err(err @ TiffError::Budget(_)) => Err(err),
                Err(_) => Ok(None),
            },
        }
    };

    Ok((
        read(ifd.entry(tag::MAKE))?,
        read(ifd.entry(tag::MODEL))?,
    ))
}

// =============================================================================
// Tests
// =============================================================================
