//! ELAS raster files.
//!
//! A 1024-byte big-endian header followed by line-interleaved samples: each
//! image row holds one row of every band in turn, and each band row is
//! padded to a multiple of 256 bytes.
//!
//! Header fields used here (byte offsets):
//!
//! | Offset | Field   | Meaning                                  |
//! |--------|---------|------------------------------------------|
//! | 0      | NBIH    | header bytes, always 1024                |
//! | 4      | NBPR    | bytes per record (one row of all bands)  |
//! | 8, 12  | IL, LL  | first and last line (1-based)            |
//! | 16, 20 | IE, LE  | first and last element (1-based)         |
//! | 24     | NC      | band count                               |
//! | 28     | H4321   | magic, always 4321                       |
//! | 36, 44 | Y/X off | northing/easting of the top-left pixel   |
//! | 48, 52 | Y/X pix | pixel height/width (f32)                 |
//! | 72     | IH19    | `[0x04, 0xd2, class << 2, sample bytes]` |

use std::collections::BTreeMap;

use crate::error::FormatError;
use crate::io::RangeReader;
use crate::layout::{BandLayout, Interleave, RowAlignment};
use crate::pixel::{ByteOrder, PixelType};

use super::CreateOptions;

pub const NAME: &str = "ELAS";

/// Header length in bytes.
pub const HEADER_SIZE: usize = 1024;

const MAGIC: i32 = 4321;
const BAND_ROW_ALIGNMENT: u64 = 256;

const OFF_NBIH: usize = 0;
const OFF_NBPR: usize = 4;
const OFF_IL: usize = 8;
const OFF_LL: usize = 12;
const OFF_IE: usize = 16;
const OFF_LE: usize = 20;
const OFF_NC: usize = 24;
const OFF_H4321: usize = 28;
const OFF_YLABEL: usize = 32;
const OFF_YOFFSET: usize = 36;
const OFF_XLABEL: usize = 40;
const OFF_XOFFSET: usize = 44;
const OFF_YPIXSIZE: usize = 48;
const OFF_XPIXSIZE: usize = 52;
const OFF_IH19: usize = 72;

const BE: ByteOrder = ByteOrder::BigEndian;

/// Parsed ELAS header.
#[derive(Debug, Clone, PartialEq)]
pub struct ElasHeader {
    pub bytes_per_record: u32,
    pub first_line: i32,
    pub last_line: i32,
    pub first_element: i32,
    pub last_element: i32,
    pub band_count: usize,
    pub pixel_type: PixelType,
    pub x_offset: i32,
    pub y_offset: i32,
    pub x_pixel_size: f32,
    pub y_pixel_size: f32,
    layout: BandLayout,
}

/// Quick check on the first 32 header bytes.
pub fn is_elas_header(bytes: &[u8]) -> bool {
    bytes.len() >= 32
        && BE.read_i32(&bytes[OFF_NBIH..]) == HEADER_SIZE as i32
        && BE.read_i32(&bytes[OFF_H4321..]) == MAGIC
}

fn invalid(message: impl Into<String>) -> FormatError {
    FormatError::InvalidHeader {
        format: NAME,
        message: message.into(),
    }
}

fn type_code(pixel_type: PixelType) -> Option<u8> {
    match pixel_type {
        PixelType::Byte => Some(1),
        PixelType::Float32 => Some(16),
        PixelType::Float64 => Some(17),
        _ => None,
    }
}

fn band_row_bytes(width: usize, pixel_type: PixelType) -> Option<u64> {
    let row = width.checked_mul(pixel_type.size_bytes())?;
    RowAlignment::new(BAND_ROW_ALIGNMENT).checked_apply(u64::try_from(row).ok()?)
}

impl ElasHeader {
    /// Read and parse the header from the start of `reader`.
    pub async fn read<R: RangeReader>(reader: &R) -> Result<Self, FormatError> {
        if reader.size() < HEADER_SIZE as u64 {
            return Err(invalid("file shorter than the 1024 byte header"));
        }
        let bytes = reader.read_exact_at(0, HEADER_SIZE).await?;
        Self::parse(&bytes)
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < HEADER_SIZE {
            return Err(invalid("header truncated"));
        }
        if !is_elas_header(bytes) {
            return Err(invalid("missing NBIH=1024 / H4321 signature"));
        }

        let first_line = BE.read_i32(&bytes[OFF_IL..]);
        let last_line = BE.read_i32(&bytes[OFF_LL..]);
        let first_element = BE.read_i32(&bytes[OFF_IE..]);
        let last_element = BE.read_i32(&bytes[OFF_LE..]);
        let band_count = BE.read_i32(&bytes[OFF_NC..]);
        if last_line < first_line || last_element < first_element {
            return Err(invalid(format!(
                "empty extent: lines {}..{}, elements {}..{}",
                first_line, last_line, first_element, last_element
            )));
        }
        if band_count <= 0 {
            return Err(invalid(format!("band count {}", band_count)));
        }

        let ih19 = &bytes[OFF_IH19..OFF_IH19 + 4];
        let class = (ih19[2] & 0x7e) >> 2;
        let pixel_type = match (class, ih19[3]) {
            (0 | 1, 1) => PixelType::Byte,
            (16, 4) => PixelType::Float32,
            (17, 8) => PixelType::Float64,
            (class, size) => {
                return Err(invalid(format!(
                    "unsupported sample class {} with {} byte(s)",
                    class, size
                )))
            }
        };

        // Extents are inclusive and may span the whole i32 range.
        let width = (i64::from(last_element) - i64::from(first_element) + 1) as usize;
        let height = (i64::from(last_line) - i64::from(first_line) + 1) as usize;
        let bands = band_count as usize;
        let bytes_per_record = BE.read_u32(&bytes[OFF_NBPR..]);
        let band_row = band_row_bytes(width, pixel_type)
            .ok_or_else(|| invalid(format!("{} elements per row overflows", width)))?;
        let needed = band_row.checked_mul(bands as u64);
        if needed.map_or(true, |needed| u64::from(bytes_per_record) < needed) {
            return Err(invalid(format!(
                "record length {} cannot hold {} band row(s) of {} bytes",
                bytes_per_record, bands, band_row
            )));
        }

        let layout = BandLayout::builder(width, height, bands, pixel_type)
            .byte_order(BE)
            .interleave(Interleave::Line)
            .image_offset(HEADER_SIZE as u64)
            .offsets(pixel_type.size_bytes(), bytes_per_record.into(), band_row)
            .build()?;

        Ok(Self {
            bytes_per_record,
            first_line,
            last_line,
            first_element,
            last_element,
            band_count: bands,
            pixel_type,
            x_offset: BE.read_i32(&bytes[OFF_XOFFSET..]),
            y_offset: BE.read_i32(&bytes[OFF_YOFFSET..]),
            x_pixel_size: f32::from_bits(BE.read_u32(&bytes[OFF_XPIXSIZE..])),
            y_pixel_size: f32::from_bits(BE.read_u32(&bytes[OFF_YPIXSIZE..])),
            layout,
        })
    }

    /// Header for a new file.
    pub fn create(options: &CreateOptions) -> Result<Self, FormatError> {
        if type_code(options.pixel_type).is_none() {
            return Err(FormatError::UnsupportedPixelType {
                format: NAME,
                pixel_type: options.pixel_type,
            });
        }
        let bytes_per_record = band_row_bytes(options.width, options.pixel_type)
            .and_then(|band_row| band_row.checked_mul(options.band_count as u64))
            .and_then(|record| u32::try_from(record).ok())
            .ok_or_else(|| invalid("record length exceeds 32 bits"))?;
        let last_line = i32::try_from(options.height)
            .map_err(|_| invalid("height exceeds 32 bits"))?;
        let last_element =
            i32::try_from(options.width).map_err(|_| invalid("width exceeds 32 bits"))?;

        let layout = BandLayout::builder(
            options.width,
            options.height,
            options.band_count,
            options.pixel_type,
        )
        .byte_order(BE)
        .interleave(Interleave::Line)
        .row_alignment(RowAlignment::new(BAND_ROW_ALIGNMENT))
        .image_offset(HEADER_SIZE as u64)
        .build()?;

        Ok(Self {
            bytes_per_record,
            first_line: 1,
            last_line,
            first_element: 1,
            last_element,
            band_count: options.band_count,
            pixel_type: options.pixel_type,
            x_offset: 0,
            y_offset: 0,
            x_pixel_size: 1.0,
            y_pixel_size: 1.0,
            layout,
        })
    }

    pub fn layout(&self) -> &BandLayout {
        &self.layout
    }

    /// Encode the full 1024-byte header.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_SIZE];
        BE.write_i32(&mut bytes[OFF_NBIH..], HEADER_SIZE as i32);
        BE.write_u32(&mut bytes[OFF_NBPR..], self.bytes_per_record);
        BE.write_i32(&mut bytes[OFF_IL..], self.first_line);
        BE.write_i32(&mut bytes[OFF_LL..], self.last_line);
        BE.write_i32(&mut bytes[OFF_IE..], self.first_element);
        BE.write_i32(&mut bytes[OFF_LE..], self.last_element);
        BE.write_i32(&mut bytes[OFF_NC..], self.band_count as i32);
        BE.write_i32(&mut bytes[OFF_H4321..], MAGIC);
        bytes[OFF_YLABEL..OFF_YLABEL + 4].copy_from_slice(b"NOR ");
        BE.write_i32(&mut bytes[OFF_YOFFSET..], self.y_offset);
        bytes[OFF_XLABEL..OFF_XLABEL + 4].copy_from_slice(b"EAS ");
        BE.write_i32(&mut bytes[OFF_XOFFSET..], self.x_offset);
        BE.write_u32(&mut bytes[OFF_YPIXSIZE..], self.y_pixel_size.to_bits());
        BE.write_u32(&mut bytes[OFF_XPIXSIZE..], self.x_pixel_size.to_bits());
        let code = type_code(self.pixel_type).unwrap_or(1);
        bytes[OFF_IH19..OFF_IH19 + 4].copy_from_slice(&[
            0x04,
            0xd2,
            code << 2,
            self.pixel_type.size_bytes() as u8,
        ]);
        bytes
    }

    /// Header plus every padded record.
    pub fn file_size(&self) -> u64 {
        HEADER_SIZE as u64 + self.layout.height as u64 * u64::from(self.bytes_per_record)
    }

    pub fn metadata(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("x_offset".to_string(), self.x_offset.to_string()),
            ("y_offset".to_string(), self.y_offset.to_string()),
            ("x_pixel_size".to_string(), self.x_pixel_size.to_string()),
            ("y_pixel_size".to_string(), self.y_pixel_size.to_string()),
        ])
    }
}
