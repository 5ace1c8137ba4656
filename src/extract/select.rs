//! Best-preview selection.
//!
//! Candidates are ranked against the caller's size window and quality
//! preference; the orchestrator validates down the resulting order so a
//! candidate that fails JPEG validation costs nothing but its slot.
//!
//! Ranking:
//! 1. Candidates inside `[target_min, target_max]`, ordered by exact
//!    quality-preference match, then tier distance (thumbnail < preview <
//!    full), then locator priority, then byte length closest to the window
//!    midpoint.
//! 2. Fallback: candidates under `target_max`, largest first.
//! 3. Last resort: everything else, smallest first.

use std::cmp::Ordering;

use crate::options::ExtractionOptions;

use super::candidate::PreviewCandidate;

/// Rank candidates into full preference order, best first.
///
/// An empty input yields an empty order; the caller maps that to
/// `NoPreviewsFound`.
pub fn rank_candidates<'a>(
    candidates: &'a [PreviewCandidate],
    options: &ExtractionOptions,
) -> Vec<&'a PreviewCandidate> {
    let midpoint = options.target_midpoint();

    let mut in_window: Vec<&PreviewCandidate> = candidates
        .iter()
        .filter(|c| options.in_window(c.length))
        .collect();
    in_window.sort_by(|a, b| {
        let a_exact = a.quality == options.prefer_quality;
        let b_exact = b.quality == options.prefer_quality;
        b_exact
            .cmp(&a_exact)
            .then_with(|| {
                a.quality
                    .distance(options.prefer_quality)
                    .cmp(&b.quality.distance(options.prefer_quality))
            })
            .then_with(|| b.priority.cmp(&a.priority))
            .then_with(|| {
                a.length
                    .abs_diff(midpoint)
                    .cmp(&b.length.abs_diff(midpoint))
            })
    });

    let mut under_max: Vec<&PreviewCandidate> = candidates
        .iter()
        .filter(|c| !options.in_window(c.length) && c.length <= options.target_max_size)
        .collect();
    under_max.sort_by(|a, b| b.length.cmp(&a.length)); // largest first

    let mut oversized: Vec<&PreviewCandidate> = candidates
        .iter()
        .filter(|c| c.length > options.target_max_size)
        .collect();
    oversized.sort_by(|a, b| match a.length.cmp(&b.length) {
        Ordering::Equal => b.priority.cmp(&a.priority),
        other => other, // smallest first
    });

    in_window.extend(under_max);
    in_window.extend(oversized);
    in_window
}

// =============================================================================
// Tests
// =============================================================================
