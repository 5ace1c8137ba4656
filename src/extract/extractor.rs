//! The extraction orchestrator.
//!
//! [`RawExtractor`] composes detection, the format locators, the selector,
//! the JPEG validator, and the resource governor into the public
//! operations. Each call is self-contained: it owns its reader (and mapped
//! view) for the duration and shares nothing with concurrent calls except
//! the opt-in cache.
//!
//! Synchronous operations do the work on the calling thread; the `_async`
//! variants dispatch the identical synchronous core onto the blocking pool
//! and return the same result shape.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::error::ExtractError;
use crate::format::{self, detect, jpeg, tiff, RawFormat};
use crate::io::{BufferReader, MmapReader, RangeReader};
use crate::options::ExtractionOptions;

use super::cache::{CacheKey, PreviewCache};
use super::candidate::{PreviewCandidate, QualityTier};
use super::governor::BudgetGuard;
use super::select::rank_candidates;

/// Camera identity captured when `include_metadata` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureMetadata {
    pub make: Option<String>,
    pub model: Option<String>,
}

/// A successfully extracted preview: the chosen candidate's properties plus
/// its JPEG bytes. The only data that outlives the extraction call.
#[derive(Debug, Clone)]
pub struct Preview {
    pub format: RawFormat,
    pub width: u32,
    pub height: u32,
    pub quality: QualityTier,
    /// Format-specific location tag, e.g. `"cr2/ifd0"`
    pub kind: String,
    /// EXIF orientation code, 1 when the file declares none
    pub orientation: u16,
    /// The extracted JPEG stream
    pub data: Bytes,
    pub metadata: Option<CaptureMetadata>,
}

impl Preview {
    /// Byte size of the extracted JPEG.
    #[inline]
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }
}

/// Result shape of every extraction operation.
pub type ExtractionResult = Result<Preview, ExtractError>;

// =============================================================================
// RawExtractor
// =============================================================================

/// Preview extraction engine.
///
/// Cheap to clone; clones share the cache. All operations are safe to call
/// concurrently.
#[derive(Clone, Default)]
pub struct RawExtractor {
    cache: Arc<PreviewCache>,
}

impl RawExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with an explicitly sized cache.
    pub fn with_cache(capacity: usize, ttl: std::time::Duration) -> Self {
        Self {
            cache: Arc::new(PreviewCache::with_capacity(capacity, ttl)),
        }
    }

    // =========================================================================
    // Synchronous operations
    // =========================================================================

    /// Extract the best embedded preview from the file at `path`.
    pub fn extract_preview(
        &self,
        path: impl AsRef<Path>,
        options: &ExtractionOptions,
    ) -> ExtractionResult {
        let path = path.as_ref();

        let cache_key = if options.cache {
            let key = cache_key_for(path, options);
            if let Some(key) = &key {
                if let Some(hit) = self.cache.get(key) {
                    debug!(path = %path.display(), "preview cache hit");
                    return Ok(hit);
                }
            }
            key
        } else {
            None
        };

        let reader = MmapReader::open(path)?;
        let result = extract_from_reader(&reader, options);

        if let (Ok(preview), Some(key)) = (&result, cache_key) {
            self.cache.put(key, preview.clone());
        }
        result
    }

    /// Extract the best embedded preview from an in-memory buffer.
    pub fn extract_preview_from_buffer(
        &self,
        data: &[u8],
        options: &ExtractionOptions,
    ) -> ExtractionResult {
        let reader = BufferReader::new(data.to_vec());
        extract_from_reader(&reader, options)
    }

    /// Every discovered candidate of the file, validated, no size
    /// filtering, each with its extracted bytes.
    pub fn extract_all_previews(&self, path: impl AsRef<Path>) -> Result<Vec<Preview>, ExtractError> {
        let reader = MmapReader::open(path.as_ref())?;
        extract_all_from_reader(&reader)
    }

    /// Every discovered candidate of an in-memory buffer.
    pub fn extract_all_previews_from_buffer(
        &self,
        data: &[u8],
    ) -> Result<Vec<Preview>, ExtractError> {
        let reader = BufferReader::new(data.to_vec());
        extract_all_from_reader(&reader)
    }

    /// Detect the format of the file at `path`. Never fails: unreadable
    /// files are `Unknown`.
    pub fn detect_format(&self, path: impl AsRef<Path>) -> RawFormat {
        match MmapReader::open(path.as_ref()) {
            Ok(reader) => detect::detect_format(&reader),
            Err(_) => RawFormat::Unknown,
        }
    }

    /// Detect the format of an in-memory buffer.
    pub fn detect_format_from_buffer(&self, data: &[u8]) -> RawFormat {
        detect::detect_format(&BufferReader::new(data.to_vec()))
    }

    // =========================================================================
    // Asynchronous-dispatch variants
    // =========================================================================

    /// [`Self::extract_preview`] on the blocking pool.
    pub async fn extract_preview_async(
        &self,
        path: impl Into<PathBuf>,
        options: ExtractionOptions,
    ) -> ExtractionResult {
        let this = self.clone();
        let path = path.into();
        spawn_blocking(move || this.extract_preview(&path, &options)).await
    }

    /// [`Self::extract_preview_from_buffer`] on the blocking pool.
    pub async fn extract_preview_from_buffer_async(
        &self,
        data: Bytes,
        options: ExtractionOptions,
    ) -> ExtractionResult {
        let this = self.clone();
        spawn_blocking(move || this.extract_preview_from_buffer(&data, &options)).await
    }

    /// [`Self::extract_all_previews`] on the blocking pool.
    pub async fn extract_all_previews_async(
        &self,
        path: impl Into<PathBuf>,
    ) -> Result<Vec<Preview>, ExtractError> {
        let this = self.clone();
        let path = path.into();
        spawn_blocking(move || this.extract_all_previews(&path)).await
    }

    /// [`Self::detect_format`] on the blocking pool.
    pub async fn detect_format_async(&self, path: impl Into<PathBuf>) -> RawFormat {
        let this = self.clone();
        let path = path.into();
        tokio::task::spawn_blocking(move || this.detect_format(&path))
            .await
            .unwrap_or(RawFormat::Unknown)
    }

    /// [`Self::detect_format_from_buffer`] on the blocking pool.
    pub async fn detect_format_from_buffer_async(&self, data: Bytes) -> RawFormat {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.detect_format_from_buffer(&data))
            .await
            .unwrap_or(RawFormat::Unknown)
    }
}

/// Run a fallible extraction closure on the blocking pool.
async fn spawn_blocking<T>(
    f: impl FnOnce() -> Result<T, ExtractError> + Send + 'static,
) -> Result<T, ExtractError>
where
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ExtractError::Unknown {
            reason: format!("blocking task failed: {}", e),
        })?
}

// =============================================================================
// Core extraction flow
// =============================================================================

/// Minimum input size considered parseable at all.
const MIN_INPUT_BYTES: u64 = 16;

fn extract_from_reader<R: RangeReader>(
    reader: &R,
    options: &ExtractionOptions,
) -> ExtractionResult {
    let guard = BudgetGuard::new(options.timeout, options.max_memory);

    if reader.size() < MIN_INPUT_BYTES {
        return Err(ExtractError::InvalidFormat {
            reason: format!("input of {} bytes is too small", reader.size()),
        });
    }

    let format = detect::detect_with_guard(reader, &guard)?;
    if format == RawFormat::Unknown {
        return Err(ExtractError::InvalidFormat {
            reason: "unsupported or unrecognized RAW format".to_owned(),
        });
    }
    debug!(source = reader.identifier(), %format, "detected format");

    let candidates = format::locate_candidates(reader, format, &guard)?;
    if candidates.is_empty() {
        return Err(ExtractError::NoPreviewsFound);
    }
    debug!(count = candidates.len(), "located preview candidates");

    let ranked = rank_candidates(&candidates, options);
    let mut failed = 0usize;
    for candidate in ranked {
        let valid = jpeg::validate_range(
            reader,
            &guard,
            candidate.offset,
            candidate.length,
            options.strict_validation,
        )?;
        if !valid {
            warn!(kind = %candidate.kind, offset = candidate.offset, "candidate failed validation, trying next");
            failed += 1;
            continue;
        }

        let data = jpeg::slice_range(reader, &guard, candidate.offset, candidate.length)?;
        let metadata = if options.include_metadata {
            capture_metadata(reader, &guard)?
        } else {
            None
        };
        info!(
            source = reader.identifier(),
            kind = %candidate.kind,
            bytes = data.len(),
            "extracted preview"
        );
        return Ok(preview_from_candidate(candidate, data, metadata));
    }

    Err(ExtractError::ValidationFailed {
        context: format!("all {} ranked candidates failed JPEG validation", failed),
    })
}

fn extract_all_from_reader<R: RangeReader>(reader: &R) -> Result<Vec<Preview>, ExtractError> {
    let options = ExtractionOptions::default();
    let guard = BudgetGuard::new(options.timeout, options.max_memory);

    if reader.size() < MIN_INPUT_BYTES {
        return Err(ExtractError::InvalidFormat {
            reason: format!("input of {} bytes is too small", reader.size()),
        });
    }

    let format = detect::detect_with_guard(reader, &guard)?;
    if format == RawFormat::Unknown {
        return Err(ExtractError::InvalidFormat {
            reason: "unsupported or unrecognized RAW format".to_owned(),
        });
    }

    let candidates = format::locate_candidates(reader, format, &guard)?;
    let mut previews = Vec::with_capacity(candidates.len());
    for candidate in &candidates {
        // Locators already probed the boundary markers; slice directly
        let data = jpeg::slice_range(reader, &guard, candidate.offset, candidate.length)?;
        previews.push(preview_from_candidate(candidate, data, None));
    }
    Ok(previews)
}

fn preview_from_candidate(
    candidate: &PreviewCandidate,
    data: Bytes,
    metadata: Option<CaptureMetadata>,
) -> Preview {
    Preview {
        format: candidate.format,
        width: candidate.width,
        height: candidate.height,
        quality: candidate.quality,
        kind: candidate.kind.clone(),
        orientation: candidate.orientation.unwrap_or(1),
        data,
        metadata,
    }
}

/// Camera make/model from the first directory of TIFF-derived inputs.
fn capture_metadata<R: RangeReader>(
    reader: &R,
    guard: &BudgetGuard,
) -> Result<Option<CaptureMetadata>, ExtractError> {
    let Some(header) = format::read_tiff_header(reader, guard)? else {
        return Ok(None);
    };
    let nav = tiff::Navigator::new(reader, header.byte_order, guard);
    let (make, model) = match tiff::read_make_model(&nav, &header) {
        Ok(pair) => pair,
        Err(crate::error::TiffError::Budget(b)) => return Err(b.into()),
        Err(_) => (None, None),
    };
    if make.is_none() && model.is_none() {
        return Ok(None);
    }
    Ok(Some(CaptureMetadata { make, model }))
}

/// Build the cache key: canonical path, mtime, options hash. `None` when
/// the file state cannot be observed (caching is skipped, not failed).
fn cache_key_for(path: &Path, options: &ExtractionOptions) -> Option<CacheKey> {
    let canonical = path
        .canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string();
    let metadata = std::fs::metadata(path).ok()?;
    let mtime_ms = metadata
        .modified()
        .ok()?
        .duration_since(UNIX_EPOCH)
        .ok()?
        .as_millis() as u64;

    let mut hasher = DefaultHasher::new();
    options.target_min_size.hash(&mut hasher);
    options.target_max_size.hash(&mut hasher);
    options.prefer_quality.hash(&mut hasher);
    options.strict_validation.hash(&mut hasher);

    Some(CacheKey {
        path: canonical,
        mtime_ms,
        options_hash: hasher.finish(),
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_nonexistent_path_is_file_not_found() {
        let extractor = RawExtractor::new();
        let err = extractor
            .extract_preview(
                "/nonexistent/rawpreview-missing.cr2",
                &ExtractionOptions::default(),
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::FileNotFound);
    }

    #[test]
    fn test_empty_buffer_fails_cleanly() {
        let extractor = RawExtractor::new();
        let err = extractor
            .extract_preview_from_buffer(&[], &ExtractionOptions::default())
            .unwrap_err();
        assert_ne!(err.code(), ErrorCode::Success);
        assert_eq!(err.code(), ErrorCode::InvalidFormat);
    }

    #[test]
    fn test_zeroed_buffer_is_invalid_format() {
        let extractor = RawExtractor::new();
        let err = extractor
            .extract_preview_from_buffer(&[0u8; 100], &ExtractionOptions::default())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidFormat);

        assert_eq!(
            extractor.detect_format_from_buffer(&[0u8; 100]),
            RawFormat::Unknown
        );
    }

    #[test]
    fn test_detect_format_on_missing_file_is_unknown() {
        let extractor = RawExtractor::new();
        assert_eq!(
            extractor.detect_format("/nonexistent/rawpreview-missing.nef"),
            RawFormat::Unknown
        );
    }

    #[test]
    fn test_cache_key_requires_existing_file() {
        assert!(cache_key_for(
            Path::new("/nonexistent/rawpreview-missing.cr2"),
            &ExtractionOptions::default()
        )
        .is_none());
    }
}
