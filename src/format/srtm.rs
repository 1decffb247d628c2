//! SRTM height tiles (`.hgt`).
//!
//! Headerless squares of big-endian Int16 elevations, one band, top row
//! first. The tile is identified by its file name, which encodes the
//! south-west corner (`N45E006.hgt`), and by its size: 1201 or 3601 samples
//! per side, or 1801 x 3601 for the narrow high-latitude tiles.

use std::collections::BTreeMap;

use crate::error::FormatError;
use crate::io::RangeReader;
use crate::layout::BandLayout;
use crate::pixel::{ByteOrder, PixelType};

use super::CreateOptions;

pub const NAME: &str = "SRTMHGT";

/// Elevation marking a void.
pub const NODATA: f64 = -32768.0;

/// Accepted (width, height) pairs.
pub const TILE_SIZES: [(usize, usize); 3] = [(1201, 1201), (3601, 3601), (1801, 3601)];

/// South-west corner encoded in the tile name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCorner {
    pub latitude: i32,
    pub longitude: i32,
}

/// Parse `N45E006` style names; any directory and extension are ignored.
pub fn parse_tile_name(identifier: &str) -> Option<TileCorner> {
    let name = identifier
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(identifier);
    let bytes = name.as_bytes();
    if bytes.len() < 7 || !name.get(7..)?.to_ascii_lowercase().starts_with(".hgt") {
        return None;
    }
    let lat_sign = match bytes[0].to_ascii_uppercase() {
        b'N' => 1,
        b'S' => -1,
        _ => return None,
    };
    let lon_sign = match bytes[3].to_ascii_uppercase() {
        b'E' => 1,
        b'W' => -1,
        _ => return None,
    };
    let digits = |s: &str| -> Option<i32> {
        if s.bytes().all(|b| b.is_ascii_digit()) {
            s.parse().ok()
        } else {
            None
        }
    };
    let latitude = digits(name.get(1..3)?)?;
    let longitude = digits(name.get(4..7)?)?;
    if latitude > 90 || longitude > 180 {
        return None;
    }
    Some(TileCorner {
        latitude: lat_sign * latitude,
        longitude: lon_sign * longitude,
    })
}

/// Tile dimensions implied by a file size, if any.
pub fn dimensions_for_size(size: u64) -> Option<(usize, usize)> {
    TILE_SIZES
        .iter()
        .copied()
        .find(|&(w, h)| (w * h * 2) as u64 == size)
}

/// Whether `identifier` and `size` look like an SRTM tile.
pub fn is_srtm_tile(identifier: &str, size: u64) -> bool {
    parse_tile_name(identifier).is_some() && dimensions_for_size(size).is_some()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SrtmHeader {
    pub corner: Option<TileCorner>,
    layout: BandLayout,
}

fn build_layout(width: usize, height: usize) -> Result<BandLayout, FormatError> {
    Ok(BandLayout::builder(width, height, 1, PixelType::Int16)
        .byte_order(ByteOrder::BigEndian)
        .build()?)
}

impl SrtmHeader {
    /// Derive the layout from the reader's name and size.
    pub async fn read<R: RangeReader>(reader: &R) -> Result<Self, FormatError> {
        let (width, height) =
            dimensions_for_size(reader.size()).ok_or_else(|| FormatError::InvalidHeader {
                format: NAME,
                message: format!("{} bytes is not a known tile size", reader.size()),
            })?;
        Ok(Self {
            corner: parse_tile_name(reader.identifier()),
            layout: build_layout(width, height)?,
        })
    }

    pub fn create(options: &CreateOptions, identifier: &str) -> Result<Self, FormatError> {
        if options.pixel_type != PixelType::Int16 {
            return Err(FormatError::UnsupportedPixelType {
                format: NAME,
                pixel_type: options.pixel_type,
            });
        }
        if options.band_count != 1 || !TILE_SIZES.contains(&(options.width, options.height)) {
            return Err(FormatError::InvalidHeader {
                format: NAME,
                message: format!(
                    "tiles are one band of 1201x1201, 3601x3601 or 1801x3601, not {} band(s) of {}x{}",
                    options.band_count, options.width, options.height
                ),
            });
        }
        Ok(Self {
            corner: parse_tile_name(identifier),
            layout: build_layout(options.width, options.height)?,
        })
    }

    pub fn layout(&self) -> &BandLayout {
        &self.layout
    }

    pub fn file_size(&self) -> u64 {
        self.layout.data_end()
    }

    pub fn metadata(&self) -> BTreeMap<String, String> {
        match self.corner {
            Some(corner) => BTreeMap::from([
                ("latitude".to_string(), corner.latitude.to_string()),
                ("longitude".to_string(), corner.longitude.to_string()),
            ]),
            None => BTreeMap::new(),
        }
    }
}
