//! Raw raster format drivers.
//!
//! Each driver parses its header into a [`BandLayout`], and can produce a
//! header for a new file. Pixel I/O itself is format independent and lives
//! in [`crate::dataset`].
//!
//! # Format Detection
//!
//! Use [`detect::detect_format`] to identify the format of a file.
//! Currently supported formats:
//!
//! - **ELAS**: line interleaved, 256-byte aligned band rows
//! - **FITS**: primary image of a FITS file
//! - **GS7BG**: Surfer 7 binary grid
//! - **SRTMHGT**: SRTM height tile

pub mod detect;
pub mod elas;
pub mod fits;
pub mod gs7bg;
pub mod srtm;

use std::collections::BTreeMap;

use crate::error::FormatError;
use crate::io::RangeReader;
use crate::layout::BandLayout;
use crate::pixel::PixelType;

pub use detect::{detect_format, detect_from_bytes, RasterFormat};
pub use elas::ElasHeader;
pub use fits::FitsHeader;
pub use gs7bg::Gs7bgHeader;
pub use srtm::SrtmHeader;

/// Shape of a file to create.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOptions {
    pub width: usize,
    pub height: usize,
    pub band_count: usize,
    pub pixel_type: PixelType,
    /// Nodata sentinel, for formats that store one.
    pub nodata: Option<f64>,
}

impl CreateOptions {
    pub fn new(width: usize, height: usize, band_count: usize, pixel_type: PixelType) -> Self {
        Self {
            width,
            height,
            band_count,
            pixel_type,
            nodata: None,
        }
    }

    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }
}

/// Parsed header of any supported format.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatHeader {
    Elas(ElasHeader),
    Fits(FitsHeader),
    Gs7bg(Gs7bgHeader),
    SrtmHgt(SrtmHeader),
}

impl FormatHeader {
    /// Read the header of a file already known to be `format`.
    pub async fn read<R: RangeReader>(reader: &R, format: RasterFormat) -> Result<Self, FormatError> {
        Ok(match format {
            RasterFormat::Elas => FormatHeader::Elas(ElasHeader::read(reader).await?),
            RasterFormat::Fits => FormatHeader::Fits(FitsHeader::read(reader).await?),
            RasterFormat::Gs7bg => FormatHeader::Gs7bg(Gs7bgHeader::read(reader).await?),
            RasterFormat::SrtmHgt => FormatHeader::SrtmHgt(SrtmHeader::read(reader).await?),
        })
    }

    /// Build the header for a new file.
    ///
    /// `identifier` only matters for SRTM tiles, whose corner is encoded in
    /// the file name.
    pub fn create(
        format: RasterFormat,
        options: &CreateOptions,
        identifier: &str,
    ) -> Result<Self, FormatError> {
        Ok(match format {
            RasterFormat::Elas => FormatHeader::Elas(ElasHeader::create(options)?),
            RasterFormat::Fits => FormatHeader::Fits(FitsHeader::create(options)?),
            RasterFormat::Gs7bg => FormatHeader::Gs7bg(Gs7bgHeader::create(options)?),
            RasterFormat::SrtmHgt => FormatHeader::SrtmHgt(SrtmHeader::create(options, identifier)?),
        })
    }

    pub fn format(&self) -> RasterFormat {
        match self {
            FormatHeader::Elas(_) => RasterFormat::Elas,
            FormatHeader::Fits(_) => RasterFormat::Fits,
            FormatHeader::Gs7bg(_) => RasterFormat::Gs7bg,
            FormatHeader::SrtmHgt(_) => RasterFormat::SrtmHgt,
        }
    }

    pub fn layout(&self) -> &BandLayout {
        match self {
            FormatHeader::Elas(h) => h.layout(),
            FormatHeader::Fits(h) => h.layout(),
            FormatHeader::Gs7bg(h) => h.layout(),
            FormatHeader::SrtmHgt(h) => h.layout(),
        }
    }

    pub fn nodata(&self) -> Option<f64> {
        match self {
            FormatHeader::Elas(_) => None,
            FormatHeader::Fits(h) => h.nodata(),
            FormatHeader::Gs7bg(h) => h.nodata(),
            FormatHeader::SrtmHgt(_) => Some(srtm::NODATA),
        }
    }

    /// Encoded header bytes, written at offset 0. Empty for headerless formats.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            FormatHeader::Elas(h) => h.to_bytes(),
            FormatHeader::Fits(h) => h.to_bytes(),
            FormatHeader::Gs7bg(h) => h.to_bytes(),
            FormatHeader::SrtmHgt(_) => Vec::new(),
        }
    }

    /// Total file size for a complete image.
    pub fn file_size(&self) -> u64 {
        match self {
            FormatHeader::Elas(h) => h.file_size(),
            FormatHeader::Fits(h) => h.file_size(),
            FormatHeader::Gs7bg(h) => h.file_size(),
            FormatHeader::SrtmHgt(h) => h.file_size(),
        }
    }

    pub fn metadata(&self) -> BTreeMap<String, String> {
        match self {
            FormatHeader::Elas(h) => h.metadata(),
            FormatHeader::Fits(h) => h.metadata(),
            FormatHeader::Gs7bg(h) => h.metadata(),
            FormatHeader::SrtmHgt(h) => h.metadata(),
        }
    }

    /// Whether the header stores a value range refreshed when the file is
    /// closed, and can be rewritten in place.
    pub fn tracks_value_range(&self) -> bool {
        matches!(self, FormatHeader::Gs7bg(h) if h.is_rewritable())
    }

    /// Whether stored samples have their sign bit flipped relative to the
    /// reported pixel type.
    pub fn flips_sign_bit(&self) -> bool {
        matches!(self, FormatHeader::Fits(h) if h.is_unsigned())
    }

    /// Value range stored in the header, if the format stores one.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        match self {
            FormatHeader::Gs7bg(h) => Some((h.z_min, h.z_max)),
            _ => None,
        }
    }

    /// Record the value range; ignored by formats without one.
    pub fn set_value_range(&mut self, min: f64, max: f64) {
        if let FormatHeader::Gs7bg(h) = self {
            h.set_z_range(min, max);
        }
    }
}
