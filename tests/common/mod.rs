//! Synthetic RAW file builders for integration tests.
//!
//! Real RAW files are megabytes of camera firmware output; these builders
//! assemble the minimal structures each locator actually reads, with real
//! JPEG payloads, so tests are hermetic and byte-exact.

#![allow(dead_code)]

// =============================================================================
// JPEG payloads
// =============================================================================

/// A structurally complete JPEG of exactly `total_len` bytes: SOI, COM
/// segments of padding, a minimal SOS, entropy filler, EOI.
pub fn synthetic_jpeg(total_len: usize) -> Vec<u8> {
    assert!(total_len >= 16);
    let mut data = Vec::with_capacity(total_len);
    data.extend_from_slice(&[0xFF, 0xD8]);

    let reserve = 10; // SOS header (6) + entropy (2) + EOI (2)
    while total_len - data.len() > reserve + 4 {
        let room = total_len - data.len() - reserve;
        let payload = (room - 4).min(0xFFF0);
        data.extend_from_slice(&[0xFF, 0xFE]);
        data.extend_from_slice(&((payload + 2) as u16).to_be_bytes());
        data.extend(std::iter::repeat(0x20).take(payload));
    }
    while total_len - data.len() > reserve {
        data.push(0xFF);
    }

    data.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x04, 0x01, 0x00]);
    data.extend_from_slice(&[0x55, 0xAA]);
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

/// Bytes that pass a boundary-marker probe (SOI head, EOI tail) but carry
/// an unterminated segment, so strict validation rejects them.
pub fn broken_jpeg(total_len: usize) -> Vec<u8> {
    assert!(total_len >= 16);
    let mut data = vec![0xFF, 0xD8]; // SOI
    data.extend_from_slice(&[0xFF, 0xC0, 0xFF, 0xFF]); // segment claiming 64KB
    data.resize(total_len - 2, 0x00);
    data.extend_from_slice(&[0xFF, 0xD9]); // EOI
    data
}

// =============================================================================
// TIFF building blocks (little-endian)
// =============================================================================

fn entry(tag: u16, field_type: u16, count: u32, value: [u8; 4]) -> [u8; 12] {
    let mut e = [0u8; 12];
    e[0..2].copy_from_slice(&tag.to_le_bytes());
    e[2..4].copy_from_slice(&field_type.to_le_bytes());
    e[4..8].copy_from_slice(&count.to_le_bytes());
    e[8..12].copy_from_slice(&value);
    e
}

fn short(v: u16) -> [u8; 4] {
    [v.to_le_bytes()[0], v.to_le_bytes()[1], 0, 0]
}

fn long(v: u32) -> [u8; 4] {
    v.to_le_bytes()
}

fn ifd(entries: &[[u8; 12]], next: u32) -> Vec<u8> {
    let mut out = (entries.len() as u16).to_le_bytes().to_vec();
    for e in entries {
        out.extend_from_slice(e);
    }
    out.extend_from_slice(&next.to_le_bytes());
    out
}

/// Byte size of an IFD with `n` entries.
fn ifd_len(n: usize) -> usize {
    2 + n * 12 + 4
}

// =============================================================================
// Per-format files
// =============================================================================

/// Canon CR2: IFD0 with the full-size preview (declared 2256x1504), IFD1
/// with the thumbnail.
pub fn build_cr2(preview: &[u8], thumb: &[u8]) -> Vec<u8> {
    const IFD0_OFF: usize = 16;
    let ifd1_off = IFD0_OFF + ifd_len(6);
    let preview_off = ifd1_off + ifd_len(2);
    let thumb_off = preview_off + preview.len();

    let mut data = vec![0x49, 0x49, 0x2A, 0x00];
    data.extend_from_slice(&(IFD0_OFF as u32).to_le_bytes());
    data.extend_from_slice(b"CR\x02\x00"); // CR2 marker + version
    data.extend_from_slice(&[0u8; 4]); // pad to IFD0

    data.extend_from_slice(&ifd(
        &[
            entry(0x0100, 3, 1, short(2256)),
            entry(0x0101, 3, 1, short(1504)),
            entry(0x0103, 3, 1, short(6)),
            entry(0x0111, 4, 1, long(preview_off as u32)),
            entry(0x0112, 3, 1, short(1)),
            entry(0x0117, 4, 1, long(preview.len() as u32)),
        ],
        ifd1_off as u32,
    ));
    data.extend_from_slice(&ifd(
        &[
            entry(0x0111, 4, 1, long(thumb_off as u32)),
            entry(0x0117, 4, 1, long(thumb.len() as u32)),
        ],
        0,
    ));

    assert_eq!(data.len(), preview_off);
    data.extend_from_slice(preview);
    data.extend_from_slice(thumb);
    data
}

/// Nikon NEF: IFD0 with Make + SubIFDs pointer + orientation, the SubIFD
/// addressing the preview through the JpgFromRaw tag pair.
pub fn build_nef(preview: &[u8], orientation: u16) -> Vec<u8> {
    const IFD0_OFF: usize = 8;
    const MAKE: &[u8] = b"NIKON CORPORATION\0";
    let make_off = IFD0_OFF + ifd_len(3);
    let sub_off = make_off + MAKE.len();
    let preview_off = sub_off + ifd_len(4);

    let mut data = vec![0x49, 0x49, 0x2A, 0x00];
    data.extend_from_slice(&(IFD0_OFF as u32).to_le_bytes());

    data.extend_from_slice(&ifd(
        &[
            entry(0x010F, 2, MAKE.len() as u32, long(make_off as u32)),
            entry(0x0112, 3, 1, short(orientation)),
            entry(0x014A, 4, 1, long(sub_off as u32)),
        ],
        0,
    ));
    data.extend_from_slice(MAKE);
    data.extend_from_slice(&ifd(
        &[
            entry(0x0100, 4, 1, long(4288)),
            entry(0x0101, 4, 1, long(2848)),
            entry(0x0201, 4, 1, long(preview_off as u32)),
            entry(0x0202, 4, 1, long(preview.len() as u32)),
        ],
        0,
    ));

    assert_eq!(data.len(), preview_off);
    data.extend_from_slice(preview);
    data
}

/// Adobe DNG: IFD0 thumbnail + DNGVersion, SubIFD with the
/// reduced-resolution preview (NewSubfileType = 1).
pub fn build_dng(preview: &[u8], thumb: &[u8]) -> Vec<u8> {
    const IFD0_OFF: usize = 8;
    let sub_off = IFD0_OFF + ifd_len(7);
    let thumb_off = sub_off + ifd_len(6);
    let preview_off = thumb_off + thumb.len();

    let mut data = vec![0x49, 0x49, 0x2A, 0x00];
    data.extend_from_slice(&(IFD0_OFF as u32).to_le_bytes());

    data.extend_from_slice(&ifd(
        &[
            entry(0x0100, 3, 1, short(256)),
            entry(0x0101, 3, 1, short(192)),
            entry(0x0103, 3, 1, short(7)),
            entry(0x0111, 4, 1, long(thumb_off as u32)),
            entry(0x0117, 4, 1, long(thumb.len() as u32)),
            entry(0x014A, 4, 1, long(sub_off as u32)),
            entry(0xC612, 1, 4, [1, 4, 0, 0]), // DNGVersion 1.4
        ],
        0,
    ));
    data.extend_from_slice(&ifd(
        &[
            entry(0x00FE, 4, 1, long(1)),
            entry(0x0100, 4, 1, long(1620)),
            entry(0x0101, 4, 1, long(1080)),
            entry(0x0103, 3, 1, short(7)),
            entry(0x0111, 4, 1, long(preview_off as u32)),
            entry(0x0117, 4, 1, long(preview.len() as u32)),
        ],
        0,
    ));

    assert_eq!(data.len(), thumb_off);
    data.extend_from_slice(thumb);
    data.extend_from_slice(preview);
    data
}

/// Sony ARW: IFD0 marked NewSubfileType = 1 with the preview strips and a
/// SONY Make tag.
pub fn build_arw(preview: &[u8]) -> Vec<u8> {
    const IFD0_OFF: usize = 8;
    const MAKE: &[u8] = b"SONY\0";
    let make_off = IFD0_OFF + ifd_len(6);
    let preview_off = make_off + MAKE.len() + 3; // pad to a word boundary

    let mut data = vec![0x49, 0x49, 0x2A, 0x00];
    data.extend_from_slice(&(IFD0_OFF as u32).to_le_bytes());

    data.extend_from_slice(&ifd(
        &[
            entry(0x00FE, 4, 1, long(1)),
            entry(0x0100, 4, 1, long(1616)),
            entry(0x0101, 4, 1, long(1080)),
            entry(0x010F, 2, MAKE.len() as u32, long(make_off as u32)),
            entry(0x0111, 4, 1, long(preview_off as u32)),
            entry(0x0117, 4, 1, long(preview.len() as u32)),
        ],
        0,
    ));
    data.extend_from_slice(MAKE);
    data.extend_from_slice(&[0u8; 3]);

    assert_eq!(data.len(), preview_off);
    data.extend_from_slice(preview);
    data
}

/// Olympus ORF with the "IIRO" vendor header and a strip-addressed preview.
pub fn build_orf(preview: &[u8]) -> Vec<u8> {
    const IFD0_OFF: usize = 8;
    let preview_off = IFD0_OFF + ifd_len(4) + 2; // pad to a word boundary

    let mut data = vec![0x49, 0x49, 0x52, 0x4F]; // II + "RO"
    data.extend_from_slice(&(IFD0_OFF as u32).to_le_bytes());

    data.extend_from_slice(&ifd(
        &[
            entry(0x0100, 4, 1, long(1600)),
            entry(0x0101, 4, 1, long(1200)),
            entry(0x0111, 4, 1, long(preview_off as u32)),
            entry(0x0117, 4, 1, long(preview.len() as u32)),
        ],
        0,
    ));
    data.extend_from_slice(&[0u8; 2]);

    assert_eq!(data.len(), preview_off);
    data.extend_from_slice(preview);
    data
}

/// Panasonic RW2: 0x0055 header magic and the JpgFromRaw vendor tag whose
/// value is the entire embedded JPEG.
pub fn build_rw2(jpeg: &[u8]) -> Vec<u8> {
    const IFD0_OFF: usize = 8;
    let jpeg_off = IFD0_OFF + ifd_len(1) + 6; // pad to 32

    let mut data = vec![0x49, 0x49, 0x55, 0x00]; // II + Panasonic magic
    data.extend_from_slice(&(IFD0_OFF as u32).to_le_bytes());

    data.extend_from_slice(&ifd(
        &[entry(0x002E, 7, jpeg.len() as u32, long(jpeg_off as u32))],
        0,
    ));
    data.extend_from_slice(&[0u8; 6]);

    assert_eq!(data.len(), jpeg_off);
    data.extend_from_slice(jpeg);
    data
}

/// Fujifilm RAF: fixed ASCII header with the big-endian JPEG pointer pair
/// at bytes 84/88.
pub fn build_raf(jpeg: &[u8]) -> Vec<u8> {
    const JPEG_OFF: usize = 128;

    let mut data = Vec::from(&b"FUJIFILMCCD-RAW 0201FF393103"[..]);
    data.resize(84, 0);
    data.extend_from_slice(&(JPEG_OFF as u32).to_be_bytes());
    data.extend_from_slice(&(jpeg.len() as u32).to_be_bytes());
    data.resize(JPEG_OFF, 0);
    data.extend_from_slice(jpeg);
    data
}

/// Canon CR3: ftyp box, the vendor UUID box holding a PRVW preview, and an
/// empty mdat box.
pub fn build_cr3(prvw_jpeg: &[u8]) -> Vec<u8> {
    const PREVIEW_UUID: [u8; 16] = [
        0xea, 0xf4, 0x2b, 0x5e, 0x1c, 0x98, 0x4b, 0x88, 0xb9, 0xfb, 0xb7, 0xdc, 0x40, 0x6e, 0x4d,
        0x16,
    ];

    let mut data = Vec::new();

    // ftyp box
    data.extend_from_slice(&16u32.to_be_bytes());
    data.extend_from_slice(b"ftyp");
    data.extend_from_slice(b"cr3 ");
    data.extend_from_slice(&[0u8; 4]);

    // uuid box: 8 header + 16 uuid + 8 vendor header + PRVW box
    let prvw_size = 8 + 16 + prvw_jpeg.len();
    let uuid_size = 8 + 16 + 8 + prvw_size;
    data.extend_from_slice(&(uuid_size as u32).to_be_bytes());
    data.extend_from_slice(b"uuid");
    data.extend_from_slice(&PREVIEW_UUID);
    data.extend_from_slice(&[0u8; 8]); // vendor header

    data.extend_from_slice(&(prvw_size as u32).to_be_bytes());
    data.extend_from_slice(b"PRVW");
    data.extend_from_slice(&[0u8; 16]); // PRVW internal header
    data.extend_from_slice(prvw_jpeg);

    // empty mdat
    data.extend_from_slice(&16u32.to_be_bytes());
    data.extend_from_slice(b"mdat");
    data.extend_from_slice(&[0u8; 8]);

    data
}
