//! FITS primary images.
//!
//! The header is a run of 80-character ASCII cards packed into 2880-byte
//! records and closed by an `END` card. Image data follows immediately,
//! big-endian, band sequential, with the first stored row at the bottom of
//! the image. The data area is padded to a whole record.
//!
//! Unsigned 16 and 32-bit images use the usual convention of signed
//! samples with `BZERO` set to 2^15 or 2^31. Such files are reported as
//! `UInt16`/`UInt32`; a stored sample becomes the unsigned value by
//! toggling its sign bit, which the dataset layer does on every block.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::FormatError;
use crate::io::RangeReader;
use crate::layout::{BandLayout, Interleave, RowOrder};
use crate::pixel::{ByteOrder, PixelType};

use super::CreateOptions;

pub const NAME: &str = "FITS";

/// Size of one header or data record.
pub const RECORD_SIZE: usize = 2880;

const CARD_SIZE: usize = 80;

/// Upper bound on header records scanned before giving up on `END`.
const MAX_HEADER_RECORDS: usize = 64;

const UINT16_BZERO: f64 = 32_768.0;
const UINT32_BZERO: f64 = 2_147_483_648.0;

/// Parsed primary header.
#[derive(Debug, Clone, PartialEq)]
pub struct FitsHeader {
    pub bitpix: i32,
    pub naxes: Vec<usize>,
    /// `BLANK` as stored, before any unsigned offset
    pub blank: Option<f64>,
    pub bzero: Option<f64>,
    pub bscale: Option<f64>,
    /// Cards other than the structural ones, in file order
    pub extra_cards: Vec<(String, String)>,
    header_records: usize,
    layout: BandLayout,
}

pub fn is_fits_header(bytes: &[u8]) -> bool {
    bytes.len() >= 30 && bytes.starts_with(b"SIMPLE  =") && {
        let value = &bytes[10..30];
        value.iter().any(|&b| b == b'T')
    }
}

fn invalid(message: impl Into<String>) -> FormatError {
    FormatError::InvalidHeader {
        format: NAME,
        message: message.into(),
    }
}

/// Pixel type of the samples once `BZERO` is applied, for the offsets that
/// mark unsigned data. Other scalings leave the stored type.
fn pixel_type_for_bitpix(bitpix: i32, bzero: Option<f64>, bscale: Option<f64>) -> Option<PixelType> {
    let unit_scale = bscale.map_or(true, |scale| scale == 1.0);
    match bitpix {
        8 => Some(PixelType::Byte),
        16 if unit_scale && bzero == Some(UINT16_BZERO) => Some(PixelType::UInt16),
        16 => Some(PixelType::Int16),
        32 if unit_scale && bzero == Some(UINT32_BZERO) => Some(PixelType::UInt32),
        32 => Some(PixelType::Int32),
        -32 => Some(PixelType::Float32),
        -64 => Some(PixelType::Float64),
        _ => None,
    }
}

/// `BITPIX` and `BZERO` for a new file of `pixel_type`.
fn bitpix_for_pixel_type(pixel_type: PixelType) -> Option<(i32, Option<f64>)> {
    match pixel_type {
        PixelType::Byte => Some((8, None)),
        PixelType::UInt16 => Some((16, Some(UINT16_BZERO))),
        PixelType::Int16 => Some((16, None)),
        PixelType::UInt32 => Some((32, Some(UINT32_BZERO))),
        PixelType::Int32 => Some((32, None)),
        PixelType::Float32 => Some((-32, None)),
        PixelType::Float64 => Some((-64, None)),
        _ => None,
    }
}

/// Split one card into keyword and value text (comment stripped).
fn split_card(card: &[u8]) -> Option<(String, String)> {
    let text = std::str::from_utf8(card).ok()?;
    let keyword = text.get(..8).unwrap_or(text).trim_end().to_string();
    if text.len() < 10 || &text[8..10] != "= " {
        return Some((keyword, String::new()));
    }
    let raw = text[10..].trim();
    let value = if let Some(rest) = raw.strip_prefix('\'') {
        match rest.find('\'') {
            Some(end) => rest[..end].trim_end().to_string(),
            None => rest.to_string(),
        }
    } else {
        raw.split('/').next().unwrap_or("").trim().to_string()
    };
    Some((keyword, value))
}

fn parse_number(keyword: &str, value: &str) -> Result<f64, FormatError> {
    value
        .replace(['D', 'd'], "E")
        .parse::<f64>()
        .map_err(|_| invalid(format!("{} has non-numeric value '{}'", keyword, value)))
}

/// Axis lengths are non-negative integers of at most 32 bits.
fn parse_count(keyword: &str, value: &str) -> Result<usize, FormatError> {
    let n = parse_number(keyword, value)?;
    if !(0.0..=u32::MAX as f64).contains(&n) || n.fract() != 0.0 {
        return Err(invalid(format!("{} = {} is not an axis length", keyword, value)));
    }
    Ok(n as usize)
}

fn card(keyword: &str, value: &str) -> [u8; CARD_SIZE] {
    let mut out = [b' '; CARD_SIZE];
    let text = format!("{:<8}= {:>20}", keyword, value);
    let len = text.len().min(CARD_SIZE);
    out[..len].copy_from_slice(&text.as_bytes()[..len]);
    out
}

impl FitsHeader {
    /// Read header records until the `END` card.
    pub async fn read<R: RangeReader>(reader: &R) -> Result<Self, FormatError> {
        let mut cards = Vec::new();
        for record in 0..MAX_HEADER_RECORDS {
            let offset = (record * RECORD_SIZE) as u64;
            if offset + RECORD_SIZE as u64 > reader.size() {
                return Err(invalid("header ends before the END card"));
            }
            let bytes = reader.read_exact_at(offset, RECORD_SIZE).await?;
            if record == 0 && !is_fits_header(&bytes) {
                return Err(invalid("first card is not SIMPLE = T"));
            }
            cards.extend_from_slice(&bytes);
            let has_end = bytes
                .chunks_exact(CARD_SIZE)
                .any(|c| c.starts_with(b"END") && c[3..].iter().all(|&b| b == b' '));
            if has_end {
                return Self::parse(&cards);
            }
        }
        Err(invalid(format!(
            "no END card in the first {} records",
            MAX_HEADER_RECORDS
        )))
    }

    /// Parse whole header records.
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut bitpix = None;
        let mut naxis = None;
        let mut naxes = [None; 3];
        let mut blank = None;
        let mut bzero = None;
        let mut bscale = None;
        let mut extra_cards = Vec::new();
        let mut end_card = None;

        for (index, chunk) in bytes.chunks_exact(CARD_SIZE).enumerate() {
            let Some((keyword, value)) = split_card(chunk) else {
                return Err(invalid(format!("card {} is not ASCII", index)));
            };
            match keyword.as_str() {
                "END" => {
                    end_card = Some(index);
                    break;
                }
                "SIMPLE" => {
                    if value != "T" {
                        return Err(invalid("SIMPLE is not T"));
                    }
                }
                "BITPIX" => bitpix = Some(parse_number(&keyword, &value)? as i32),
                "NAXIS" => naxis = Some(parse_count(&keyword, &value)?),
                "NAXIS1" => naxes[0] = Some(parse_count(&keyword, &value)?),
                "NAXIS2" => naxes[1] = Some(parse_count(&keyword, &value)?),
                "NAXIS3" => naxes[2] = Some(parse_count(&keyword, &value)?),
                "BLANK" => blank = Some(parse_number(&keyword, &value)?),
                "BZERO" => bzero = Some(parse_number(&keyword, &value)?),
                "BSCALE" => bscale = Some(parse_number(&keyword, &value)?),
                "" | "COMMENT" | "HISTORY" => {}
                _ => extra_cards.push((keyword, value)),
            }
        }

        let end_card = end_card.ok_or_else(|| invalid("missing END card"))?;
        let bitpix = bitpix.ok_or_else(|| invalid("missing BITPIX"))?;
        let pixel_type = pixel_type_for_bitpix(bitpix, bzero, bscale)
            .ok_or_else(|| invalid(format!("BITPIX {}", bitpix)))?;
        let naxis = naxis.ok_or_else(|| invalid("missing NAXIS"))?;
        if !(2..=3).contains(&naxis) {
            return Err(invalid(format!("NAXIS {} (only 2 or 3 axes are images)", naxis)));
        }
        let naxes: Vec<usize> = naxes[..naxis]
            .iter()
            .enumerate()
            .map(|(i, n)| n.ok_or_else(|| invalid(format!("missing NAXIS{}", i + 1))))
            .collect::<Result<_, _>>()?;

        let header_records = (end_card * CARD_SIZE) / RECORD_SIZE + 1;
        if bzero.is_some_and(|z| z != 0.0) && !is_unsigned(pixel_type) {
            debug!(bzero = ?bzero, "FITS BZERO kept as metadata; samples are read unscaled");
        }
        let layout = Self::build_layout(&naxes, pixel_type, header_records)?;

        Ok(Self {
            bitpix,
            naxes,
            blank,
            bzero,
            bscale,
            extra_cards,
            header_records,
            layout,
        })
    }

    fn build_layout(
        naxes: &[usize],
        pixel_type: PixelType,
        header_records: usize,
    ) -> Result<BandLayout, FormatError> {
        let bands = naxes.get(2).copied().unwrap_or(1);
        Ok(BandLayout::builder(naxes[0], naxes[1], bands, pixel_type)
            .byte_order(ByteOrder::BigEndian)
            .interleave(Interleave::Band)
            .row_order(RowOrder::BottomUp)
            .image_offset((header_records * RECORD_SIZE) as u64)
            .build()?)
    }

    /// Header for a new file.
    pub fn create(options: &CreateOptions) -> Result<Self, FormatError> {
        let (bitpix, bzero) =
            bitpix_for_pixel_type(options.pixel_type).ok_or(FormatError::UnsupportedPixelType {
                format: NAME,
                pixel_type: options.pixel_type,
            })?;
        let mut naxes = vec![options.width, options.height];
        if options.band_count > 1 {
            naxes.push(options.band_count);
        }
        // Integer BLANK only; float nodata is NaN by convention.
        let blank = match options.nodata {
            Some(nodata) if options.pixel_type.is_integer() => {
                blank_for(nodata, options.pixel_type).map(|blank| blank - bzero.unwrap_or(0.0))
            }
            _ => None,
        };
        let layout = Self::build_layout(&naxes, options.pixel_type, 1)?;
        Ok(Self {
            bitpix,
            naxes,
            blank,
            bzero,
            bscale: None,
            extra_cards: Vec::new(),
            header_records: 1,
            layout,
        })
    }

    pub fn layout(&self) -> &BandLayout {
        &self.layout
    }

    /// Nodata in sample units, with the unsigned offset applied.
    pub fn nodata(&self) -> Option<f64> {
        if self.is_unsigned() {
            self.blank.map(|blank| blank + self.bzero.unwrap_or(0.0))
        } else {
            self.blank
        }
    }

    /// Whether samples are unsigned values stored with a flipped sign bit.
    pub fn is_unsigned(&self) -> bool {
        is_unsigned(self.layout.pixel_type)
    }

    /// Encode the header, padded to whole records.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut cards: Vec<[u8; CARD_SIZE]> = vec![
            card("SIMPLE", "T"),
            card("BITPIX", &self.bitpix.to_string()),
            card("NAXIS", &self.naxes.len().to_string()),
        ];
        for (i, n) in self.naxes.iter().enumerate() {
            cards.push(card(&format!("NAXIS{}", i + 1), &n.to_string()));
        }
        if let Some(blank) = self.blank {
            cards.push(card("BLANK", &format!("{}", blank as i64)));
        }
        if let Some(bzero) = self.bzero {
            cards.push(card("BZERO", &format!("{:?}", bzero)));
        }
        if let Some(bscale) = self.bscale {
            cards.push(card("BSCALE", &format!("{:?}", bscale)));
        }
        for (keyword, value) in &self.extra_cards {
            cards.push(card(keyword, &format!("'{}'", value)));
        }
        let mut end = [b' '; CARD_SIZE];
        end[..3].copy_from_slice(b"END");
        cards.push(end);

        let mut bytes: Vec<u8> = cards.concat();
        bytes.resize(bytes.len().div_ceil(RECORD_SIZE) * RECORD_SIZE, b' ');
        bytes
    }

    /// Header plus data padded to a whole record.
    pub fn file_size(&self) -> u64 {
        let data = self.layout.data_end() - self.layout.image_offset;
        self.layout.image_offset + data.div_ceil(RECORD_SIZE as u64) * RECORD_SIZE as u64
    }

    pub fn metadata(&self) -> BTreeMap<String, String> {
        let mut metadata: BTreeMap<String, String> = self.extra_cards.iter().cloned().collect();
        metadata.insert("BITPIX".to_string(), self.bitpix.to_string());
        if let Some(bzero) = self.bzero {
            metadata.insert("BZERO".to_string(), bzero.to_string());
        }
        if let Some(bscale) = self.bscale {
            metadata.insert("BSCALE".to_string(), bscale.to_string());
        }
        metadata
    }
}

fn is_unsigned(pixel_type: PixelType) -> bool {
    matches!(pixel_type, PixelType::UInt16 | PixelType::UInt32)
}

/// The sentinel as the image type holds it, or `None` when it cannot be
/// held without clamping.
fn blank_for(nodata: f64, pixel_type: PixelType) -> Option<f64> {
    let adjusted = pixel_type.adjust_value(nodata);
    if !nodata.is_finite() || adjusted.clamped {
        warn!(
            nodata,
            pixel_type = %pixel_type,
            "Nodata value does not fit the image type; BLANK not written"
        );
        return None;
    }
    Some(adjusted.value)
}
