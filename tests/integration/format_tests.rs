//! Driver integration tests.
//!
//! Tests verify, against files built byte by byte:
//! - Format detection
//! - Header parsing into band layouts
//! - Block reads across interleavings, row orders and byte orders
//! - Nodata sentinels
//! - Header validation errors

use rasterblock::dataset::Dataset;
use rasterblock::error::{DatasetError, FormatError};
use rasterblock::format::{detect_format, CreateOptions, FormatHeader, RasterFormat};
use rasterblock::io::{MemoryFile, RangeReader};
use rasterblock::layout::{Interleave, RowOrder};
use rasterblock::pixel::{ByteOrder, PixelType};

use super::test_utils::{
    create_elas_byte, create_fits, create_fits_int16, create_gs7bg, create_srtm, decode_f32_ne,
    decode_f64_ne, decode_i16_ne,
};

// =============================================================================
// ELAS
// =============================================================================

#[tokio::test]
async fn test_elas_line_interleaved_bands() {
    let file = MemoryFile::new("scene.elas", create_elas_byte(5, 3, 3));
    let dataset = Dataset::open(file).await.unwrap();

    assert_eq!(dataset.format(), RasterFormat::Elas);
    let layout = dataset.layout();
    assert_eq!(layout.interleave, Interleave::Line);
    assert_eq!(layout.band_offset, 256);
    assert_eq!(layout.line_offset, 768);
    assert_eq!(layout.offset_of(2, 0, 1).unwrap(), 1024 + 768 + 512);

    let mut row = vec![0u8; 5];
    dataset
        .read_block(2, 0, 1, PixelType::Byte, &mut row)
        .await
        .unwrap();
    assert_eq!(row, vec![210, 211, 212, 213, 214]);

    // Padding never leaks into a band read.
    let band = dataset.read_band(1, PixelType::Byte).await.unwrap();
    assert_eq!(band.len(), 15);
    assert!(band.iter().all(|&b| b != 0xAB));
    assert_eq!(&band[10..15], &[120, 121, 122, 123, 124]);
}

#[tokio::test]
async fn test_elas_rejects_short_records() {
    let mut bytes = create_elas_byte(5, 2, 2);
    // Record length smaller than two padded band rows.
    bytes[4..8].copy_from_slice(&300i32.to_be_bytes());
    let file = MemoryFile::new("bad.elas", bytes);
    assert!(matches!(
        Dataset::open(file).await,
        Err(DatasetError::Format(FormatError::InvalidHeader { format: "ELAS", .. }))
    ));
}

#[tokio::test]
async fn test_elas_unknown_sample_class() {
    let mut bytes = create_elas_byte(4, 1, 1);
    bytes[74] = 5 << 2;
    bytes[75] = 2;
    let file = MemoryFile::new("bad.elas", bytes);
    assert!(Dataset::open(file).await.is_err());
}

// =============================================================================
// FITS
// =============================================================================

#[tokio::test]
async fn test_fits_bottom_up_rows_and_blank() {
    let rows = vec![vec![1, 2, 3], vec![4, -32768, 6]];
    let bytes = create_fits_int16(
        &rows,
        &[
            "BLANK   =               -32768 / null value",
            "OBJECT  = 'M31     '           / target",
        ],
    );
    let file = MemoryFile::new("m31.fits", bytes);
    let dataset = Dataset::open(file).await.unwrap();

    assert_eq!(dataset.format(), RasterFormat::Fits);
    assert_eq!(dataset.nodata(), Some(-32768.0));
    assert_eq!(dataset.layout().row_order, RowOrder::BottomUp);
    assert_eq!(dataset.layout().byte_order, ByteOrder::BigEndian);
    assert_eq!(dataset.info().metadata.get("OBJECT").map(String::as_str), Some("M31"));

    let band = dataset.read_band(0, PixelType::Int16).await.unwrap();
    assert_eq!(decode_i16_ne(&band), vec![1, 2, 3, 4, -32768, 6]);

    // Same rows as Float32, clamped on the way to Byte.
    let as_float = dataset.read_band(0, PixelType::Float32).await.unwrap();
    assert_eq!(decode_f32_ne(&as_float)[4], -32768.0);
    let as_byte = dataset.read_band(0, PixelType::Byte).await.unwrap();
    assert_eq!(as_byte, vec![1, 2, 3, 4, 0, 6]);
}

#[tokio::test]
async fn test_fits_cube_is_band_sequential() {
    // 2 x 1 x 3 cube of Float32, stored band after band.
    let data: Vec<u8> = [1.5f32, 2.5, 10.0, 20.0, -1.0, -2.0]
        .iter()
        .flat_map(|v| v.to_be_bytes())
        .collect();
    let bytes = create_fits(
        &[
            "SIMPLE  =                    T",
            "BITPIX  =                  -32",
            "NAXIS   =                    3",
            "NAXIS1  =                    2",
            "NAXIS2  =                    1",
            "NAXIS3  =                    3",
        ],
        &data,
    );
    let file = MemoryFile::new("cube.fits", bytes);
    let dataset = Dataset::open(file).await.unwrap();

    let layout = dataset.layout();
    assert_eq!(layout.band_count, 3);
    assert_eq!(layout.interleave, Interleave::Band);
    assert_eq!(layout.band_offset, 8);

    let mut buf = vec![0u8; 16];
    dataset
        .read_block(1, 0, 0, PixelType::Float64, &mut buf)
        .await
        .unwrap();
    assert_eq!(decode_f64_ne(&buf), vec![10.0, 20.0]);

    let mut ints = vec![0u8; 4];
    dataset
        .read_block(0, 0, 0, PixelType::Int16, &mut ints)
        .await
        .unwrap();
    // 1.5 and 2.5 round away from zero.
    assert_eq!(decode_i16_ne(&ints), vec![2, 3]);
}

#[tokio::test]
async fn test_fits_header_errors() {
    let no_end = {
        let mut bytes = create_fits_int16(&[vec![1, 2]], &[]);
        let end = bytes
            .chunks(80)
            .position(|c| c.starts_with(b"END "))
            .unwrap();
        bytes[end * 80..end * 80 + 3].copy_from_slice(b"   ");
        bytes
    };
    let file = MemoryFile::new("noend.fits", no_end);
    assert!(matches!(
        FormatHeader::read(&file, RasterFormat::Fits).await,
        Err(FormatError::InvalidHeader { format: "FITS", .. })
    ));

    let unsigned = create_fits(
        &[
            "SIMPLE  =                    T",
            "BITPIX  =                   64",
            "NAXIS   =                    2",
            "NAXIS1  =                    1",
            "NAXIS2  =                    1",
        ],
        &[0; 8],
    );
    let file = MemoryFile::new("int64.fits", unsigned);
    assert!(Dataset::open(file).await.is_err());
}

#[tokio::test]
async fn test_fits_unsigned_16bit_convention() {
    let rows = vec![vec![i16::MIN, -1], vec![0, i16::MAX]];
    let bytes = create_fits_int16(
        &rows,
        &[
            "BZERO   =                32768",
            "BSCALE  =                    1",
            "BLANK   =               -32768",
        ],
    );
    let dataset = Dataset::open(MemoryFile::new("unsigned.fits", bytes))
        .await
        .unwrap();

    assert_eq!(dataset.layout().pixel_type, PixelType::UInt16);
    assert_eq!(dataset.nodata(), Some(0.0));
    let band = dataset.read_band(0, PixelType::UInt16).await.unwrap();
    let values: Vec<u16> = band
        .chunks_exact(2)
        .map(|c| u16::from_ne_bytes([c[0], c[1]]))
        .collect();
    assert_eq!(values, vec![0, 32767, 32768, 65535]);

    // Any other offset keeps the signed type.
    let bytes = create_fits_int16(&rows, &["BZERO   =                  100"]);
    let dataset = Dataset::open(MemoryFile::new("offset.fits", bytes))
        .await
        .unwrap();
    assert_eq!(dataset.layout().pixel_type, PixelType::Int16);
}

#[tokio::test]
#[allow(overflowing_literals)] // 40000 - 32768 wraps to 7232 in i16
async fn test_fits_unsigned_write_round_trip() {
    let options = CreateOptions::new(4, 1, 1, PixelType::UInt16).with_nodata(0.0);
    let mut dataset = Dataset::create(MemoryFile::empty("u16.fits"), RasterFormat::Fits, &options)
        .await
        .unwrap();
    let values: Vec<u8> = [0u16, 1, 40000, 65535]
        .iter()
        .flat_map(|v| v.to_ne_bytes())
        .collect();
    dataset
        .write_block(0, 0, 0, PixelType::UInt16, &values)
        .await
        .unwrap();
    let file = dataset.close().await.unwrap();

    let header = file.read_exact_at(0, 2880).await.unwrap();
    let cards: Vec<String> = header
        .chunks(80)
        .map(|c| String::from_utf8_lossy(c).trim_end().to_string())
        .collect();
    assert!(cards.iter().any(|c| c.starts_with("BITPIX  =") && c.ends_with(" 16")));
    assert!(cards.iter().any(|c| c.starts_with("BZERO   =") && c.contains("32768")));
    assert!(cards.iter().any(|c| c.starts_with("BLANK   =") && c.ends_with("-32768")));

    let stored = file.read_exact_at(2880, 8).await.unwrap();
    let signed: Vec<i16> = stored
        .chunks_exact(2)
        .map(|c| i16::from_be_bytes([c[0], c[1]]))
        .collect();
    assert_eq!(signed, vec![-32768, -32767, 40000 - 32768, 32767]);

    let reopened = Dataset::open(file).await.unwrap();
    assert_eq!(reopened.layout().pixel_type, PixelType::UInt16);
    assert_eq!(reopened.nodata(), Some(0.0));
    let band = reopened.read_band(0, PixelType::Int32).await.unwrap();
    let read: Vec<i32> = band
        .chunks_exact(4)
        .map(|c| i32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    assert_eq!(read, vec![0, 1, 40000, 65535]);
}

#[tokio::test]
async fn test_fits_nodata_matches_blank_card() {
    let options = CreateOptions::new(2, 1, 1, PixelType::Int16).with_nodata(1.701_41e38);
    let dataset = Dataset::create(MemoryFile::empty("big.fits"), RasterFormat::Fits, &options)
        .await
        .unwrap();
    assert_eq!(dataset.nodata(), None);
    let reopened = Dataset::open(dataset.close().await.unwrap()).await.unwrap();
    assert_eq!(reopened.nodata(), None);

    let options = CreateOptions::new(2, 1, 1, PixelType::Int16).with_nodata(-99.4);
    let dataset = Dataset::create(MemoryFile::empty("frac.fits"), RasterFormat::Fits, &options)
        .await
        .unwrap();
    assert_eq!(dataset.nodata(), Some(-99.0));
    let reopened = Dataset::open(dataset.close().await.unwrap()).await.unwrap();
    assert_eq!(reopened.nodata(), Some(-99.0));
}

#[tokio::test]
async fn test_oversized_headers_are_errors() {
    let huge_axis = create_fits(
        &[
            "SIMPLE  =                    T",
            "BITPIX  =                  -64",
            "NAXIS   =                    2",
            "NAXIS1  =                 1E30",
            "NAXIS2  =                    1",
        ],
        &[0; 8],
    );
    let file = MemoryFile::new("axis.fits", huge_axis);
    assert!(matches!(
        Dataset::open(file).await,
        Err(DatasetError::Format(FormatError::InvalidHeader { .. }))
    ));

    let huge_image = create_fits(
        &[
            "SIMPLE  =                    T",
            "BITPIX  =                  -64",
            "NAXIS   =                    3",
            "NAXIS1  =           4294967295",
            "NAXIS2  =           4294967295",
            "NAXIS3  =           4294967295",
        ],
        &[0; 8],
    );
    let file = MemoryFile::new("image.fits", huge_image);
    assert!(matches!(
        Dataset::open(file).await,
        Err(DatasetError::Format(FormatError::Layout(_)))
    ));

    let mut grid = create_gs7bg(&[vec![1.0, 2.0]], -1.0);
    grid[20..24].copy_from_slice(&i32::MAX.to_le_bytes());
    grid[24..28].copy_from_slice(&i32::MAX.to_le_bytes());
    let file = MemoryFile::new("grid.grd", grid);
    assert!(matches!(
        Dataset::open(file).await,
        Err(DatasetError::Format(FormatError::Layout(_)))
    ));
}

// =============================================================================
// GS7BG
// =============================================================================

#[tokio::test]
async fn test_gs7bg_south_row_first() {
    let blank = 1.701_410_009_187_828e38;
    // Stored south row first.
    let stored = vec![vec![1.0, 2.0, 3.0], vec![4.0, blank, 6.0]];
    let file = MemoryFile::new("dem.grd", create_gs7bg(&stored, blank));
    let dataset = Dataset::open(file).await.unwrap();

    assert_eq!(dataset.format(), RasterFormat::Gs7bg);
    assert_eq!(dataset.nodata(), Some(blank));
    assert_eq!(dataset.header().value_range(), Some((1.0, 6.0)));

    // Block row 0 is the northern row.
    let mut north = vec![0u8; 24];
    dataset
        .read_block(0, 0, 0, PixelType::Float64, &mut north)
        .await
        .unwrap();
    assert_eq!(decode_f64_ne(&north), vec![4.0, blank, 6.0]);

    let as_int = dataset.read_band(0, PixelType::Int32).await.unwrap();
    let values: Vec<i32> = as_int
        .chunks_exact(4)
        .map(|c| i32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    assert_eq!(values, vec![4, i32::MAX, 6, 1, 2, 3]);
}

// =============================================================================
// SRTMHGT
// =============================================================================

#[tokio::test]
async fn test_srtm_tile() {
    let bytes = create_srtm(|column, row| (row as i16) * 2 - (column as i16));
    let file = MemoryFile::new("/dem/S34W071.hgt", bytes);
    assert_eq!(detect_format(&file).await.unwrap(), RasterFormat::SrtmHgt);

    let dataset = Dataset::open(file).await.unwrap();
    let layout = dataset.layout();
    assert_eq!((layout.width, layout.height), (1201, 1201));
    assert_eq!(layout.row_order, RowOrder::TopDown);
    assert_eq!(dataset.nodata(), Some(-32768.0));
    let metadata = dataset.info().metadata;
    assert_eq!(metadata.get("latitude").map(String::as_str), Some("-34"));
    assert_eq!(metadata.get("longitude").map(String::as_str), Some("-71"));

    let mut row = vec![0u8; dataset.block_buffer_len(PixelType::Int16)];
    dataset
        .read_block(0, 0, 600, PixelType::Int16, &mut row)
        .await
        .unwrap();
    let values = decode_i16_ne(&row);
    assert_eq!(values[0], 1200);
    assert_eq!(values[1200], 0);

    // Negative elevations clamp to zero when read as Byte.
    let mut bytes = vec![0u8; 1201];
    dataset
        .read_block(0, 0, 0, PixelType::Byte, &mut bytes)
        .await
        .unwrap();
    assert_eq!(bytes[0], 0);
    assert_eq!(bytes[1], 0);
}

#[tokio::test]
async fn test_srtm_wrong_size_is_not_detected() {
    let file = MemoryFile::new("N45E006.hgt", vec![0u8; 1000]);
    assert!(matches!(
        detect_format(&file).await,
        Err(FormatError::UnsupportedFormat { .. })
    ));
}
