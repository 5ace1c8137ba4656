//! Discovered preview candidates and their quality classification.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::format::RawFormat;

// =============================================================================
// QualityTier
// =============================================================================

/// Coarse classification of a preview's fidelity.
///
/// The derived ordering (`Thumbnail < Preview < Full`) is what the selector
/// uses to measure how far a candidate is from the caller's preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Small embedded thumbnail (typically 160x120 .. 320x240)
    Thumbnail,
    /// Screen-sized preview, the usual extraction target
    Preview,
    /// Full-resolution embedded JPEG
    Full,
}

impl QualityTier {
    /// Distance between two tiers in the thumbnail < preview < full ordering.
    #[inline]
    pub fn distance(self, other: QualityTier) -> u8 {
        (self as i8 - other as i8).unsigned_abs()
    }

    pub const fn name(self) -> &'static str {
        match self {
            QualityTier::Thumbnail => "thumbnail",
            QualityTier::Preview => "preview",
            QualityTier::Full => "full",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "thumbnail" => Ok(QualityTier::Thumbnail),
            "preview" => Ok(QualityTier::Preview),
            "full" => Ok(QualityTier::Full),
            other => Err(format!(
                "unknown quality tier '{}' (expected thumbnail, preview, or full)",
                other
            )),
        }
    }
}

// =============================================================================
// PreviewCandidate
// =============================================================================

/// One embedded preview discovered by a format locator.
///
/// Candidates are ephemeral: produced per extraction call, consumed by the
/// selector, never persisted. `offset`/`length` address the JPEG stream
/// inside the source file; `kind` records the format-specific location the
/// candidate came from (e.g. `"cr2/ifd0"`, `"cr3/prvw"`), and `priority` is
/// the locator's own ranking hint (higher wins).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewCandidate {
    pub format: RawFormat,
    pub offset: u64,
    pub length: u64,
    pub width: u32,
    pub height: u32,
    pub quality: QualityTier,
    pub kind: String,
    pub priority: i32,
    pub orientation: Option<u16>,
}

impl PreviewCandidate {
    /// True when the candidate's byte range lies entirely inside `size`.
    #[inline]
    pub fn in_bounds(&self, size: u64) -> bool {
        self.length > 0
            && self
                .offset
                .checked_add(self.length)
                .is_some_and(|end| end <= size)
    }
}

// =============================================================================
// Tests
// =============================================================================
