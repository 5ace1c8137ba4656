//! Parsing of the TIFF-derived directory structure shared by most RAW
//! formats.
//!
//! # Key concepts
//!
//! - **Byte order**: declared once by the order marker at file start
//!   (II = little-endian, MM = big-endian) and applied to every subsequent
//!   multi-byte read.
//! - **Vendor headers**: Olympus and Panasonic keep the TIFF layout but
//!   substitute their own magic word; [`parser::TiffHeader`] accepts both so
//!   their locators can reuse the generic walker.
//! - **IFD (Image File Directory)**: a counted list of tagged entries, some
//!   pointing at sub-directories or raw data blocks. Previews announce
//!   themselves through the strip-offset pair or the JPEGInterchangeFormat
//!   pair.

mod ifd;
mod parser;
mod tags;

pub use ifd::{
    first_ifd_orientation, hit_from_ifd, read_make_model, scan_previews, Ifd, IfdEntry, Navigator,
    PreviewHit,
};
pub use parser::{
    ByteOrder, TiffHeader, IFD_ENTRY_SIZE, MAGIC_OLYMPUS_RAW, MAGIC_PANASONIC_RAW, MAGIC_TIFF,
    TIFF_HEADER_SIZE,
};
pub use tags::{is_jpeg_compression, tag, FieldType};
