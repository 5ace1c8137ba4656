//! Concrete byte-range readers.
//!
//! Two implementations of [`RangeReader`]:
//!
//! - [`MmapReader`] maps a file read-only and serves ranges from the mapping.
//!   The mapping is owned by the reader and unmapped when the reader is
//!   dropped, which happens on every exit path of an extraction call.
//! - [`BufferReader`] wraps an in-memory buffer with the identical interface,
//!   so the parsers are unaffected by where the bytes come from.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use bytes::Bytes;
use memmap2::Mmap;

use crate::error::IoError;

use super::range_reader::RangeReader;

// =============================================================================
// MmapReader
// =============================================================================

/// Read-only memory-mapped file behind the [`RangeReader`] interface.
///
/// Mapping instead of buffering lets extraction work on multi-gigabyte RAW
/// files while only the pages actually touched (headers, directories, the
/// chosen preview) are ever paged in.
#[derive(Debug)]
pub struct MmapReader {
    map: Mmap,
    path: String,
}

impl MmapReader {
    /// Open and map the file at `path` read-only.
    ///
    /// # Errors
    /// - `IoError::NotFound` if the file does not exist
    /// - `IoError::AccessDenied` if it exists but cannot be read
    /// - `IoError::Read` for any other open or mapping failure
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path_str = path.as_ref().display().to_string();

        let file = File::open(path.as_ref()).map_err(|e| match e.kind() {
            ErrorKind::NotFound => IoError::NotFound(path_str.clone()),
            ErrorKind::PermissionDenied => IoError::AccessDenied(path_str.clone()),
            _ => IoError::Read(format!("{}: {}", path_str, e)),
        })?;

        // Safety: the map is read-only and private to this reader. A
        // concurrent truncation of the underlying file could still fault,
        // which is the documented caveat of mapping any file.
        let map = unsafe { Mmap::map(&file) }
            .map_err(|e| IoError::Read(format!("{}: mmap failed: {}", path_str, e)))?;

        Ok(Self {
            map,
            path: path_str,
        })
    }
}

impl RangeReader for MmapReader {
    fn read_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        let end = offset
            .checked_add(len as u64)
            .ok_or(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: self.size(),
            })?;
        if end > self.size() {
            return Err(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: self.size(),
            });
        }
        Ok(Bytes::copy_from_slice(
            &self.map[offset as usize..end as usize],
        ))
    }

    fn size(&self) -> u64 {
        self.map.len() as u64
    }

    fn identifier(&self) -> &str {
        &self.path
    }
}

// =============================================================================
// BufferReader
// =============================================================================

/// In-memory buffer behind the [`RangeReader`] interface.
pub struct BufferReader {
    data: Bytes,
}

impl BufferReader {
    /// Wrap a buffer. `Bytes` is reference-counted, so this is cheap.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

impl RangeReader for BufferReader {
    fn read_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        let end = offset
            .checked_add(len as u64)
            .ok_or(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: self.size(),
            })?;
        if end > self.size() {
            return Err(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: self.size(),
            });
        }
        Ok(self.data.slice(offset as usize..end as usize))
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn identifier(&self) -> &str {
        "buffer://in-memory"
    }
}

// =============================================================================
// Tests
// =============================================================================
