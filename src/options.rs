//! Extraction options.

use std::time::Duration;

use crate::extract::QualityTier;

/// Default lower bound of the target size window: 200 KiB.
pub const DEFAULT_TARGET_MIN_SIZE: u64 = 200 * 1024;

/// Default upper bound of the target size window: 3 MiB.
pub const DEFAULT_TARGET_MAX_SIZE: u64 = 3 * 1024 * 1024;

/// Default wall-clock budget per extraction call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default cumulative-allocation ceiling per extraction call: 100 MiB.
pub const DEFAULT_MAX_MEMORY: u64 = 100 * 1024 * 1024;

/// Caller-supplied configuration for one extraction call.
///
/// A plain value object: construct it (or take [`Default`]), hand it to the
/// extractor, and it is never mutated afterwards.
///
/// `timeout` and `max_memory` feed the resource governor; `target_min_size`,
/// `target_max_size` and `prefer_quality` drive candidate selection;
/// `strict_validation` chooses between the boundary-marker check and the
/// full marker-chain walk on the chosen candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOptions {
    /// Lower bound of the preferred preview byte size.
    pub target_min_size: u64,

    /// Upper bound of the preferred preview byte size.
    pub target_max_size: u64,

    /// Preferred quality tier when several candidates fit the window.
    pub prefer_quality: QualityTier,

    /// Reuse a previously computed result for an unchanged file.
    /// Off by default; only path-based extractions are cached.
    pub cache: bool,

    /// Wall-clock budget for the whole call.
    pub timeout: Duration,

    /// Cumulative-allocation ceiling for the whole call, in bytes.
    pub max_memory: u64,

    /// Also capture camera make/model from the first directory.
    pub include_metadata: bool,

    /// Walk the full JPEG marker chain on the chosen candidate instead of
    /// only checking the boundary markers.
    pub strict_validation: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            target_min_size: DEFAULT_TARGET_MIN_SIZE,
            target_max_size: DEFAULT_TARGET_MAX_SIZE,
            prefer_quality: QualityTier::Preview,
            cache: false,
            timeout: DEFAULT_TIMEOUT,
            max_memory: DEFAULT_MAX_MEMORY,
            include_metadata: false,
            strict_validation: true,
        }
    }
}

impl ExtractionOptions {
    /// Midpoint of the target window, used as the size tie-breaker.
    #[inline]
    pub fn target_midpoint(&self) -> u64 {
        self.target_min_size / 2 + self.target_max_size / 2
    }

    /// True when `len` falls inside the target window.
    #[inline]
    pub fn in_window(&self, len: u64) -> bool {
        len >= self.target_min_size && len <= self.target_max_size
    }
}
