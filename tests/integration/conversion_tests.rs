//! Conversion integration tests.
//!
//! Tests verify:
//! - Strided transcoding through the public API, padding untouched
//! - Interleaved layouts feeding the transcoder
//! - Format-to-format conversion through datasets
//! - Lossy writes clamp and round

use rasterblock::dataset::Dataset;
use rasterblock::format::{CreateOptions, RasterFormat};
use rasterblock::io::MemoryFile;
use rasterblock::layout::{BandLayout, Interleave};
use rasterblock::pixel::{
    convert, transcode, ByteOrder, ElementLayout, PixelType, StridedView, StridedViewMut,
    TypedValue,
};

use num_complex::Complex;

use super::test_utils::{
    create_elas_byte, create_fits_int16, decode_f32_ne, decode_i16_ne, f32_ne, f64_ne, i16_ne,
};

// =============================================================================
// Strided Transcoding
// =============================================================================

#[test]
fn test_int16_to_byte_at_stride_32() {
    let values: [i16; 6] = [-32000, -1, 0, 127, 255, 32000];
    let mut src = vec![0xEEu8; values.len() * 32];
    for (i, v) in values.iter().enumerate() {
        src[i * 32..i * 32 + 2].copy_from_slice(&v.to_le_bytes());
    }
    let mut dst = vec![0xEEu8; values.len() * 32];

    {
        let src_view = StridedView::new(
            &src,
            ElementLayout::new(PixelType::Int16, 32, ByteOrder::LittleEndian),
        );
        let mut dst_view = StridedViewMut::new(
            &mut dst,
            ElementLayout::new(PixelType::Byte, 32, ByteOrder::LittleEndian),
        );
        transcode(&src_view, &mut dst_view, values.len());
    }

    let converted: Vec<u8> = (0..values.len()).map(|i| dst[i * 32]).collect();
    assert_eq!(converted, vec![0, 0, 0, 127, 255, 255]);
    for i in 0..values.len() {
        assert!(dst[i * 32 + 1..(i + 1) * 32].iter().all(|&b| b == 0xEE));
    }
}

#[test]
fn test_pixel_interleaved_band_extraction() {
    // 4 x 2 RGB-style Int16 image, big-endian, sample = band * 1000 + index.
    let layout = BandLayout::builder(4, 2, 3, PixelType::Int16)
        .byte_order(ByteOrder::BigEndian)
        .interleave(Interleave::Pixel)
        .build()
        .unwrap();
    let mut raw = vec![0u8; layout.data_end() as usize];
    for band in 0..3 {
        for index in 0..8 {
            let at = band * 2 + index * 6;
            raw[at..at + 2].copy_from_slice(&((band * 1000 + index) as i16).to_be_bytes());
        }
    }

    let span = layout.block_span(2, 0, 1).unwrap();
    let src = StridedView::new(&raw[span.offset as usize..], span.element);
    let mut out = vec![0u8; 4 * 4];
    let mut dst = StridedViewMut::packed(&mut out, PixelType::Float32, ByteOrder::native());
    transcode(&src, &mut dst, span.columns);

    assert_eq!(decode_f32_ne(&out), vec![2004.0, 2005.0, 2006.0, 2007.0]);
}

#[test]
fn test_complex_through_views() {
    let mut raw = vec![0u8; 16];
    {
        let mut view = StridedViewMut::packed(&mut raw, PixelType::CInt16, ByteOrder::BigEndian);
        view.set(0, TypedValue::CInt16(Complex::new(-300, 40000i32 as i16)));
        view.set(1, TypedValue::CInt16(Complex::new(7, -8)));
    }
    let view = StridedView::packed(&raw, PixelType::CInt16, ByteOrder::BigEndian);

    let as_cfloat = convert(view.get(1), PixelType::CFloat64);
    assert_eq!(as_cfloat, TypedValue::CFloat64(Complex::new(7.0, -8.0)));

    // Real part only, clamped.
    assert_eq!(convert(view.get(0), PixelType::Byte), TypedValue::Byte(0));
    assert_eq!(convert(view.get(1), PixelType::UInt16), TypedValue::UInt16(7));
}

// =============================================================================
// Dataset Conversion
// =============================================================================

#[tokio::test]
async fn test_fits_to_elas_conversion() {
    let rows = vec![vec![-5, 0, 100], vec![255, 256, 30000]];
    let src = Dataset::open(MemoryFile::new("in.fits", create_fits_int16(&rows, &[])))
        .await
        .unwrap();
    let layout = src.layout().clone();

    let options = CreateOptions::new(layout.width, layout.height, 1, PixelType::Byte);
    let mut dst = Dataset::create(MemoryFile::empty("out.elas"), RasterFormat::Elas, &options)
        .await
        .unwrap();
    let data = src.read_band(0, PixelType::Int16).await.unwrap();
    dst.write_band(0, PixelType::Int16, &data).await.unwrap();
    let file = dst.close().await.unwrap();

    let reopened = Dataset::open(file).await.unwrap();
    assert_eq!(reopened.format(), RasterFormat::Elas);
    assert_eq!(reopened.layout().pixel_type, PixelType::Byte);
    let band = reopened.read_band(0, PixelType::Byte).await.unwrap();
    assert_eq!(band, vec![0, 0, 100, 255, 255, 255]);
}

#[tokio::test]
async fn test_elas_to_fits_float_conversion() {
    let src = Dataset::open(MemoryFile::new("in.elas", create_elas_byte(3, 2, 2)))
        .await
        .unwrap();

    let options = CreateOptions::new(3, 2, 2, PixelType::Float32);
    let mut dst = Dataset::create(MemoryFile::empty("out.fits"), RasterFormat::Fits, &options)
        .await
        .unwrap();
    for band in 0..2 {
        let data = src.read_band(band, PixelType::Byte).await.unwrap();
        dst.write_band(band, PixelType::Byte, &data).await.unwrap();
    }
    let file = dst.close().await.unwrap();

    let reopened = Dataset::open(file).await.unwrap();
    let band = reopened.read_band(1, PixelType::Float32).await.unwrap();
    assert_eq!(
        decode_f32_ne(&band),
        vec![100.0, 101.0, 102.0, 110.0, 111.0, 112.0]
    );
}

#[tokio::test]
async fn test_float_write_rounds_to_int16() {
    let options = CreateOptions::new(4, 1, 1, PixelType::Int16);
    let mut dataset = Dataset::create(MemoryFile::empty("r.fits"), RasterFormat::Fits, &options)
        .await
        .unwrap();
    dataset
        .write_block(0, 0, 0, PixelType::Float64, &f64_ne(&[127.1, 127.9, -2.5, 1e9]))
        .await
        .unwrap();

    let mut buf = vec![0u8; 8];
    dataset
        .read_block(0, 0, 0, PixelType::Int16, &mut buf)
        .await
        .unwrap();
    assert_eq!(decode_i16_ne(&buf), vec![127, 128, -3, i16::MAX]);
}

#[tokio::test]
async fn test_repeated_lossy_writes_succeed() {
    let options = CreateOptions::new(2, 2, 1, PixelType::Byte);
    let mut dataset = Dataset::create(MemoryFile::empty("w.elas"), RasterFormat::Elas, &options)
        .await
        .unwrap();
    for y in 0..2 {
        dataset
            .write_block(0, 0, y, PixelType::Float32, &f32_ne(&[1.4, 300.0]))
            .await
            .unwrap();
        dataset
            .write_block(0, 0, y, PixelType::Int16, &i16_ne(&[-1, 2]))
            .await
            .unwrap();
    }
    let band = dataset.read_band(0, PixelType::Byte).await.unwrap();
    assert_eq!(band, vec![0, 2, 0, 2]);
}
