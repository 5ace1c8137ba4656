//! # rawpreview
//!
//! Embedded JPEG preview extraction for camera RAW files.
//!
//! Camera RAW files embed one or more already-encoded JPEG previews next to
//! the sensor data. This library locates the best of them and returns its
//! bytes without decoding anything, which is how a photo manager gets
//! near-instant thumbnails for multi-gigabyte RAW files.
//!
//! ## Supported formats
//!
//! CR2, CR3, NEF, ARW, DNG, RAF, ORF, and RW2, each with its own locator
//! strategy; the TIFF-derived ones share a common directory walker.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rawpreview::{ExtractionOptions, RawExtractor};
//!
//! let extractor = RawExtractor::new();
//! let preview = extractor
//!     .extract_preview("shot.cr2", &ExtractionOptions::default())
//!     .expect("extraction failed");
//!
//! println!(
//!     "{} {}x{} ({} bytes)",
//!     preview.format, preview.width, preview.height, preview.byte_size()
//! );
//! std::fs::write("shot-preview.jpg", &preview.data).unwrap();
//! ```
//!
//! ## Architecture
//!
//! - [`io`] - byte-range readers (memory-mapped file, in-memory buffer)
//! - [`mod@format`] - format detection, directory navigation, the eight
//!   per-format preview locators, JPEG validation
//! - [`extract`] - candidate selection, resource governance, caching, and
//!   the [`RawExtractor`] orchestrator
//!
//! Every extraction call is bounded by a wall-clock timeout and a memory
//! ceiling ([`ExtractionOptions`]); exceeding either aborts the call with a
//! retryable error.

pub mod config;
pub mod error;
pub mod extract;
pub mod format;
pub mod io;
pub mod options;

// Re-export the public surface
pub use error::{ErrorCode, ExtractError, IoError, TiffError};
pub use extract::{
    CaptureMetadata, ExtractionResult, Preview, PreviewCache, PreviewCandidate, QualityTier,
    RawExtractor,
};
pub use format::{detect_format, RawFormat};
pub use io::{BufferReader, MmapReader, RangeReader};
pub use options::ExtractionOptions;
