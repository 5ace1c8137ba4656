//! Format identification and the per-format preview locators.
//!
//! Every supported format gets its own locator module implementing the same
//! contract: enumerate every embedded preview with its offset, length, and
//! declared dimensions, skipping anything malformed. The TIFF-based formats
//! share the directory navigator in [`tiff`]; RAF and CR3 have their own
//! structure-specific logic.

use serde::Serialize;

use crate::error::ExtractError;
use crate::extract::{BudgetGuard, PreviewCandidate};
use crate::io::RangeReader;

pub mod arw;
pub mod cr2;
pub mod cr3;
pub mod detect;
pub mod dng;
pub mod jpeg;
pub mod nef;
pub mod orf;
pub mod raf;
pub mod rw2;
pub mod tiff;

pub use detect::detect_format;

use tiff::{TiffHeader, TIFF_HEADER_SIZE};

// =============================================================================
// RawFormat
// =============================================================================

/// Detected RAW format. Decides which preview locator applies.
///
/// `Pef` is declared for API completeness but currently has neither
/// detection nor a locator, mirroring the supported-format set of the
/// production extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RawFormat {
    /// Canon CR2 (TIFF-based)
    Cr2,
    /// Canon CR3 (ISO-BMFF box container)
    Cr3,
    /// Nikon NEF (TIFF-based)
    Nef,
    /// Sony ARW (TIFF-based)
    Arw,
    /// Adobe DNG (TIFF-based, standards-compliant)
    Dng,
    /// Fujifilm RAF (fixed-layout header)
    Raf,
    /// Olympus ORF (TIFF layout, vendor header magic)
    Orf,
    /// Pentax PEF (declared, no locator)
    Pef,
    /// Panasonic RW2 (TIFF layout, vendor header magic + private tags)
    Rw2,
    /// Not a recognized RAW format
    Unknown,
}

impl RawFormat {
    /// Stable upper-case name, matching the external contract.
    pub const fn name(self) -> &'static str {
        match self {
            RawFormat::Cr2 => "CR2",
            RawFormat::Cr3 => "CR3",
            RawFormat::Nef => "NEF",
            RawFormat::Arw => "ARW",
            RawFormat::Dng => "DNG",
            RawFormat::Raf => "RAF",
            RawFormat::Orf => "ORF",
            RawFormat::Pef => "PEF",
            RawFormat::Rw2 => "RW2",
            RawFormat::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for RawFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Locator dispatch
// =============================================================================

/// Run the matching locator strategy for `format`.
///
/// Formats without a locator (PEF, Unknown) yield an empty candidate list;
/// the orchestrator turns that into `NoPreviewsFound`. Locators fail only on
/// governor aborts; malformed structures cost individual candidates.
pub fn locate_candidates<R: RangeReader>(
    reader: &R,
    format: RawFormat,
    guard: &BudgetGuard,
) -> Result<Vec<PreviewCandidate>, ExtractError> {
    match format {
        RawFormat::Cr2 => cr2::locate_previews(reader, guard),
        RawFormat::Cr3 => cr3::locate_previews(reader, guard),
        RawFormat::Nef => nef::locate_previews(reader, guard),
        RawFormat::Arw => arw::locate_previews(reader, guard),
        RawFormat::Dng => dng::locate_previews(reader, guard),
        RawFormat::Raf => raf::locate_previews(reader, guard),
        RawFormat::Orf => orf::locate_previews(reader, guard),
        RawFormat::Rw2 => rw2::locate_previews(reader, guard),
        RawFormat::Pef | RawFormat::Unknown => Ok(Vec::new()),
    }
}

/// Read and parse the 8-byte header shared by the TIFF-family locators.
///
/// A malformed header yields `None` (the locator reports no candidates);
/// only I/O and budget failures are errors.
pub(crate) fn read_tiff_header<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
) -> Result<Option<TiffHeader>, ExtractError> {
    if reader.size() < TIFF_HEADER_SIZE as u64 {
        return Ok(None);
    }
    guard.charge(TIFF_HEADER_SIZE as u64)?;
    let bytes = reader.read_at(0, TIFF_HEADER_SIZE)?;
    Ok(TiffHeader::parse(&bytes, reader.size()).ok())
}

/// Result of the shared directory walk the TIFF-family locators build on.
pub(crate) struct TiffScan {
    pub header: TiffHeader,
    pub orientation: Option<u16>,
    pub hits: Vec<tiff::PreviewHit>,
}

/// Parse the header, read IFD0 orientation, and walk every directory for
/// preview hits. `None` when the input does not carry a parsable header.
pub(crate) fn scan_tiff<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
) -> Result<Option<TiffScan>, ExtractError> {
    let Some(header) = read_tiff_header(reader, guard)? else {
        return Ok(None);
    };
    let nav = tiff::Navigator::new(reader, header.byte_order, guard);
    let orientation = tiff::first_ifd_orientation(&nav, &header)?;
    let hits = tiff::scan_previews(&nav, &header)?;
    Ok(Some(TiffScan {
        header,
        orientation,
        hits,
    }))
}

// =============================================================================
// Tests
// =============================================================================
