//! Per-format locator coverage over synthetic files.
//!
//! One test per supported format: the file must detect as that format and
//! its locator must surface the embedded preview byte-exactly.

mod common;

use rawpreview::{ExtractionOptions, QualityTier, RawExtractor, RawFormat};

use common::{
    build_arw, build_cr2, build_cr3, build_dng, build_nef, build_orf, build_raf, build_rw2,
    synthetic_jpeg,
};

const KB: usize = 1024;

fn extract(data: &[u8]) -> rawpreview::Preview {
    RawExtractor::new()
        .extract_preview_from_buffer(data, &ExtractionOptions::default())
        .unwrap()
}

// =============================================================================
// CR2
// =============================================================================

#[test]
fn cr2_detects_and_extracts_first_directory_preview() {
    let preview = synthetic_jpeg(800 * KB);
    let cr2 = build_cr2(&preview, &synthetic_jpeg(16 * KB));

    let extractor = RawExtractor::new();
    assert_eq!(extractor.detect_format_from_buffer(&cr2), RawFormat::Cr2);

    let result = extract(&cr2);
    assert_eq!(result.format, RawFormat::Cr2);
    assert_eq!(result.kind, "cr2/ifd0");
    assert_eq!(&result.data[..], &preview[..]);
}

#[test]
fn cr2_surfaces_thumbnail_as_separate_candidate() {
    let cr2 = build_cr2(&synthetic_jpeg(800 * KB), &synthetic_jpeg(16 * KB));
    let all = RawExtractor::new()
        .extract_all_previews_from_buffer(&cr2)
        .unwrap();

    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|p| p.kind == "cr2/ifd0"));
    assert!(all.iter().any(|p| p.kind == "cr2/ifd1"));
    assert_eq!(
        all.iter().find(|p| p.kind == "cr2/ifd1").unwrap().quality,
        QualityTier::Thumbnail
    );
}

// =============================================================================
// NEF
// =============================================================================

#[test]
fn nef_extracts_sub_directory_preview_with_orientation() {
    let preview = synthetic_jpeg(900 * KB);
    let nef = build_nef(&preview, 6);

    let extractor = RawExtractor::new();
    assert_eq!(extractor.detect_format_from_buffer(&nef), RawFormat::Nef);

    let result = extract(&nef);
    assert_eq!(result.format, RawFormat::Nef);
    assert_eq!(&result.data[..], &preview[..]);
    assert_eq!(result.orientation, 6);
    assert_eq!((result.width, result.height), (4288, 2848));
}

#[test]
fn nef_tag_pair_candidates_are_deduplicated() {
    // The generic scan and the dedicated JpgFromRaw walk find the same
    // byte range; only one candidate may survive
    let nef = build_nef(&synthetic_jpeg(900 * KB), 1);
    let all = RawExtractor::new()
        .extract_all_previews_from_buffer(&nef)
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn nef_metadata_capture() {
    let nef = build_nef(&synthetic_jpeg(900 * KB), 1);
    let options = ExtractionOptions {
        include_metadata: true,
        ..Default::default()
    };
    let result = RawExtractor::new()
        .extract_preview_from_buffer(&nef, &options)
        .unwrap();

    let metadata = result.metadata.expect("metadata requested");
    assert_eq!(metadata.make.as_deref(), Some("NIKON CORPORATION"));
}

// =============================================================================
// ARW
// =============================================================================

#[test]
fn arw_extracts_reduced_resolution_preview() {
    let preview = synthetic_jpeg(700 * KB);
    let arw = build_arw(&preview);

    let extractor = RawExtractor::new();
    assert_eq!(extractor.detect_format_from_buffer(&arw), RawFormat::Arw);

    let result = extract(&arw);
    assert_eq!(result.format, RawFormat::Arw);
    assert_eq!(result.kind, "arw/preview");
    assert_eq!(&result.data[..], &preview[..]);
}

// =============================================================================
// DNG
// =============================================================================

#[test]
fn dng_surfaces_thumbnail_and_sub_directory_preview() {
    let preview = synthetic_jpeg(600 * KB);
    let thumb = synthetic_jpeg(24 * KB);
    let dng = build_dng(&preview, &thumb);

    let extractor = RawExtractor::new();
    assert_eq!(extractor.detect_format_from_buffer(&dng), RawFormat::Dng);

    let all = extractor.extract_all_previews_from_buffer(&dng).unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|p| p.kind == "dng/ifd0"));
    assert!(all.iter().any(|p| p.kind == "dng/preview"));

    // The reduced-resolution preview wins under default options
    let result = extract(&dng);
    assert_eq!(result.kind, "dng/preview");
    assert_eq!(&result.data[..], &preview[..]);
    assert_eq!((result.width, result.height), (1620, 1080));
}

// =============================================================================
// RAF
// =============================================================================

#[test]
fn raf_extracts_fixed_offset_preview() {
    let preview = synthetic_jpeg(500 * KB);
    let raf = build_raf(&preview);

    let extractor = RawExtractor::new();
    assert_eq!(extractor.detect_format_from_buffer(&raf), RawFormat::Raf);

    let result = extract(&raf);
    assert_eq!(result.format, RawFormat::Raf);
    assert_eq!(result.kind, "raf/fixed");
    assert_eq!(&result.data[..], &preview[..]);
}

// =============================================================================
// ORF
// =============================================================================

#[test]
fn orf_vendor_header_is_navigable() {
    let preview = synthetic_jpeg(400 * KB);
    let orf = build_orf(&preview);

    let extractor = RawExtractor::new();
    assert_eq!(extractor.detect_format_from_buffer(&orf), RawFormat::Orf);

    let result = extract(&orf);
    assert_eq!(result.format, RawFormat::Orf);
    assert_eq!(result.kind, "orf/ifd0");
    assert_eq!(&result.data[..], &preview[..]);
}

// =============================================================================
// RW2
// =============================================================================

#[test]
fn rw2_maps_vendor_tag_to_offset_length() {
    let preview = synthetic_jpeg(450 * KB);
    let rw2 = build_rw2(&preview);

    let extractor = RawExtractor::new();
    assert_eq!(extractor.detect_format_from_buffer(&rw2), RawFormat::Rw2);

    let result = extract(&rw2);
    assert_eq!(result.format, RawFormat::Rw2);
    assert_eq!(result.kind, "rw2/jpgfromraw");
    assert_eq!(&result.data[..], &preview[..]);
}

// =============================================================================
// CR3
// =============================================================================

#[test]
fn cr3_extracts_prvw_from_vendor_uuid_box() {
    let preview = synthetic_jpeg(350 * KB);
    let cr3 = build_cr3(&preview);

    let extractor = RawExtractor::new();
    assert_eq!(extractor.detect_format_from_buffer(&cr3), RawFormat::Cr3);

    let result = extract(&cr3);
    assert_eq!(result.format, RawFormat::Cr3);
    assert_eq!(result.kind, "cr3/prvw");
    assert_eq!(result.quality, QualityTier::Preview);
    assert_eq!(&result.data[..], &preview[..]);
}

// =============================================================================
// PEF (declared, unsupported)
// =============================================================================

#[test]
fn pentax_tiff_stays_unknown() {
    // PEF is a declared format value without detection or a locator; a
    // Pentax-flavored TIFF must not be claimed by another strategy
    let mut data = vec![
        0x49, 0x49, 0x2A, 0x00, //
        0x10, 0x00, 0x00, 0x00, // IFD0 at 16
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];
    data.extend_from_slice(&1u16.to_le_bytes());
    data.extend_from_slice(&0x010Fu16.to_le_bytes());
    data.extend_from_slice(&2u16.to_le_bytes());
    data.extend_from_slice(&7u32.to_le_bytes());
    data.extend_from_slice(&34u32.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(b"PENTAX\0");
    data.resize(128, 0);

    let extractor = RawExtractor::new();
    assert_eq!(extractor.detect_format_from_buffer(&data), RawFormat::Unknown);
}
