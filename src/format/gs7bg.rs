//! Golden Software Surfer 7 binary grids.
//!
//! A little-endian sequence of tagged sections, each a 4-byte tag and a
//! 4-byte length: a `DSRB` header, a `GRID` section describing the lattice,
//! then a `DATA` section of Float64 rows, the first row being the southern
//! edge. Unknown sections are skipped. The grid's blank value marks nodata.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::FormatError;
use crate::io::RangeReader;
use crate::layout::{BandLayout, RowOrder};
use crate::pixel::{ByteOrder, PixelType};

use super::CreateOptions;

pub const NAME: &str = "GS7BG";

pub const TAG_HEADER: u32 = 0x4252_5344; // "DSRB"
pub const TAG_GRID: u32 = 0x4449_5247; // "GRID"
pub const TAG_DATA: u32 = 0x4154_4144; // "DATA"
pub const TAG_FAULT: u32 = 0x4954_4c46; // "FLTI"

/// Blank value written when none is given.
pub const DEFAULT_BLANK: f64 = 1.701_410_009_187_828e38;

const GRID_SECTION_SIZE: usize = 72;
const SECTION_HEADER: usize = 8;
/// Offset of the first sample in files written here.
const DATA_OFFSET: u64 = 12 + (SECTION_HEADER + GRID_SECTION_SIZE) as u64 + SECTION_HEADER as u64;
const MAX_SECTIONS: usize = 32;

const LE: ByteOrder = ByteOrder::LittleEndian;

/// Parsed grid description.
#[derive(Debug, Clone, PartialEq)]
pub struct Gs7bgHeader {
    pub version: i32,
    pub rows: usize,
    pub columns: usize,
    pub x_min: f64,
    pub y_min: f64,
    pub x_size: f64,
    pub y_size: f64,
    pub z_min: f64,
    pub z_max: f64,
    pub rotation: f64,
    pub blank: f64,
    data_offset: u64,
    layout: BandLayout,
}

pub fn is_gs7bg_header(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && LE.read_u32(bytes) == TAG_HEADER
}

fn invalid(message: impl Into<String>) -> FormatError {
    FormatError::InvalidHeader {
        format: NAME,
        message: message.into(),
    }
}

fn build_layout(columns: usize, rows: usize, data_offset: u64) -> Result<BandLayout, FormatError> {
    Ok(BandLayout::builder(columns, rows, 1, PixelType::Float64)
        .byte_order(LE)
        .row_order(RowOrder::BottomUp)
        .image_offset(data_offset)
        .build()?)
}

impl Gs7bgHeader {
    /// Walk the tagged sections until the data section.
    pub async fn read<R: RangeReader>(reader: &R) -> Result<Self, FormatError> {
        let size = reader.size();
        if size < 12 {
            return Err(invalid("file shorter than the DSRB section"));
        }
        let head = reader.read_exact_at(0, 12).await?;
        if !is_gs7bg_header(&head) {
            return Err(invalid("missing DSRB tag"));
        }
        let version = LE.read_i32(&head[8..]);

        let mut grid: Option<[u8; GRID_SECTION_SIZE]> = None;
        let mut offset = SECTION_HEADER as u64 + u64::from(LE.read_u32(&head[4..]));
        for _ in 0..MAX_SECTIONS {
            if offset + SECTION_HEADER as u64 > size {
                break;
            }
            let section = reader.read_exact_at(offset, SECTION_HEADER).await?;
            let tag = LE.read_u32(&section);
            let len = u64::from(LE.read_u32(&section[4..]));
            let body = offset + SECTION_HEADER as u64;
            match tag {
                TAG_GRID => {
                    if (len as usize) < GRID_SECTION_SIZE {
                        return Err(invalid(format!("GRID section of {} bytes", len)));
                    }
                    let bytes = reader.read_exact_at(body, GRID_SECTION_SIZE).await?;
                    let mut raw = [0u8; GRID_SECTION_SIZE];
                    raw.copy_from_slice(&bytes);
                    grid = Some(raw);
                }
                TAG_DATA => {
                    let raw = grid.ok_or_else(|| invalid("DATA section before GRID"))?;
                    let header = Self::from_grid(version, &raw, body)?;
                    let expected = (header.rows as u64)
                        .checked_mul(header.columns as u64)
                        .and_then(|n| n.checked_mul(8))
                        .ok_or_else(|| invalid("grid size overflows"))?;
                    if len < expected {
                        return Err(invalid(format!(
                            "DATA section holds {} bytes, grid needs {}",
                            len, expected
                        )));
                    }
                    return Ok(header);
                }
                other => {
                    debug!(tag = other, len, "Skipping GS7BG section");
                }
            }
            offset = body + len;
        }
        Err(invalid("no DATA section"))
    }

    fn from_grid(version: i32, raw: &[u8], data_offset: u64) -> Result<Self, FormatError> {
        let rows = LE.read_i32(raw);
        let columns = LE.read_i32(&raw[4..]);
        if rows <= 0 || columns <= 0 {
            return Err(invalid(format!("grid of {} x {}", columns, rows)));
        }
        let f = |at: usize| LE.read_f64(&raw[at..]);
        let (rows, columns) = (rows as usize, columns as usize);
        Ok(Self {
            version,
            rows,
            columns,
            x_min: f(8),
            y_min: f(16),
            x_size: f(24),
            y_size: f(32),
            z_min: f(40),
            z_max: f(48),
            rotation: f(56),
            blank: f(64),
            data_offset,
            layout: build_layout(columns, rows, data_offset)?,
        })
    }

    /// Header for a new grid with unit spacing at the origin.
    pub fn create(options: &CreateOptions) -> Result<Self, FormatError> {
        if options.band_count != 1 {
            return Err(invalid(format!(
                "grids hold one band, {} requested",
                options.band_count
            )));
        }
        if options.pixel_type != PixelType::Float64 {
            return Err(FormatError::UnsupportedPixelType {
                format: NAME,
                pixel_type: options.pixel_type,
            });
        }
        if i32::try_from(options.width).is_err() || i32::try_from(options.height).is_err() {
            return Err(invalid("grid dimensions exceed 32 bits"));
        }
        Ok(Self {
            version: 1,
            rows: options.height,
            columns: options.width,
            x_min: 0.0,
            y_min: 0.0,
            x_size: 1.0,
            y_size: 1.0,
            z_min: 0.0,
            z_max: 0.0,
            rotation: 0.0,
            blank: options.nodata.unwrap_or(DEFAULT_BLANK),
            data_offset: DATA_OFFSET,
            layout: build_layout(options.width, options.height, DATA_OFFSET)?,
        })
    }

    pub fn layout(&self) -> &BandLayout {
        &self.layout
    }

    pub fn nodata(&self) -> Option<f64> {
        Some(self.blank)
    }

    /// Encode header, grid and data section headers.
    ///
    /// Only valid for headers whose data starts where this layout puts it,
    /// which holds for every header made by [`Gs7bgHeader::create`].
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; DATA_OFFSET as usize];
        LE.write_u32(&mut bytes[0..], TAG_HEADER);
        LE.write_u32(&mut bytes[4..], 4);
        LE.write_i32(&mut bytes[8..], self.version);
        LE.write_u32(&mut bytes[12..], TAG_GRID);
        LE.write_u32(&mut bytes[16..], GRID_SECTION_SIZE as u32);
        let grid = &mut bytes[20..20 + GRID_SECTION_SIZE];
        LE.write_i32(&mut grid[0..], self.rows as i32);
        LE.write_i32(&mut grid[4..], self.columns as i32);
        for (at, value) in [
            (8, self.x_min),
            (16, self.y_min),
            (24, self.x_size),
            (32, self.y_size),
            (40, self.z_min),
            (48, self.z_max),
            (56, self.rotation),
            (64, self.blank),
        ] {
            LE.write_f64(&mut grid[at..], value);
        }
        let data = 20 + GRID_SECTION_SIZE;
        LE.write_u32(&mut bytes[data..], TAG_DATA);
        let data_len = (self.rows as u64) * (self.columns as u64) * 8;
        LE.write_u32(&mut bytes[data + 4..], u32::try_from(data_len).unwrap_or(u32::MAX));
        bytes
    }

    /// Whether [`Gs7bgHeader::to_bytes`] reproduces this file's header.
    pub fn is_rewritable(&self) -> bool {
        self.data_offset == DATA_OFFSET
    }

    pub fn file_size(&self) -> u64 {
        self.data_offset + (self.rows * self.columns * 8) as u64
    }

    /// Record the value range of the grid.
    pub fn set_z_range(&mut self, z_min: f64, z_max: f64) {
        self.z_min = z_min;
        self.z_max = z_max;
    }

    pub fn metadata(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("x_min".to_string(), self.x_min.to_string()),
            ("y_min".to_string(), self.y_min.to_string()),
            ("x_size".to_string(), self.x_size.to_string()),
            ("y_size".to_string(), self.y_size.to_string()),
            ("z_min".to_string(), self.z_min.to_string()),
            ("z_max".to_string(), self.z_max.to_string()),
            ("rotation".to_string(), self.rotation.to_string()),
        ])
    }
}
