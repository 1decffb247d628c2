//! Local file integration tests.
//!
//! Tests verify:
//! - Creating, writing, closing and reopening datasets on disk
//! - Read-write reopen preserves untouched blocks
//! - Block cache write-through on local files
//! - Registry over a directory

use rasterblock::dataset::{Access, Dataset, DatasetRegistry, LocalSource};
use rasterblock::error::{DatasetError, IoError};
use rasterblock::format::{CreateOptions, RasterFormat};
use rasterblock::io::{BlockCache, LocalFile, RangeReader};
use rasterblock::pixel::PixelType;

use super::test_utils::{decode_f64_ne, decode_i16_ne, f64_ne, i16_ne};

#[tokio::test]
async fn test_create_and_reopen_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grid.grd");

    let file = LocalFile::create(&path).await.unwrap();
    let options = CreateOptions::new(3, 2, 1, PixelType::Float64).with_nodata(-99.0);
    let mut dataset = Dataset::create(file, RasterFormat::Gs7bg, &options)
        .await
        .unwrap();
    dataset
        .write_block(0, 0, 0, PixelType::Float64, &f64_ne(&[1.0, -99.0, 3.0]))
        .await
        .unwrap();
    dataset
        .write_block(0, 0, 1, PixelType::Int16, &i16_ne(&[-4, 5, 6]))
        .await
        .unwrap();
    dataset.close().await.unwrap();

    let size = std::fs::metadata(&path).unwrap().len();
    assert_eq!(size, 100 + 6 * 8);

    let reopened = Dataset::open(LocalFile::open(&path).await.unwrap())
        .await
        .unwrap();
    assert_eq!(reopened.access(), Access::ReadOnly);
    assert_eq!(reopened.header().value_range(), Some((-4.0, 6.0)));
    let band = reopened.read_band(0, PixelType::Float64).await.unwrap();
    assert_eq!(decode_f64_ne(&band), vec![1.0, -99.0, 3.0, -4.0, 5.0, 6.0]);
}

#[tokio::test]
async fn test_read_write_reopen_keeps_other_blocks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("image.fits");

    let file = LocalFile::create(&path).await.unwrap();
    let mut dataset = Dataset::create(
        file,
        RasterFormat::Fits,
        &CreateOptions::new(2, 3, 1, PixelType::Int16),
    )
    .await
    .unwrap();
    for y in 0..3 {
        let row = i16_ne(&[y as i16 * 10, y as i16 * 10 + 1]);
        dataset
            .write_block(0, 0, y, PixelType::Int16, &row)
            .await
            .unwrap();
    }
    dataset.close().await.unwrap();

    let file = LocalFile::open_rw(&path).await.unwrap();
    let mut dataset = Dataset::open_rw(BlockCache::with_capacity(file, 1024, 8))
        .await
        .unwrap();
    assert_eq!(dataset.access(), Access::ReadWrite);

    // Prime the cache, then overwrite through it.
    let mut buf = vec![0u8; 4];
    dataset
        .read_block(0, 0, 1, PixelType::Int16, &mut buf)
        .await
        .unwrap();
    dataset
        .write_block(0, 0, 1, PixelType::Int16, &i16_ne(&[-7, 7]))
        .await
        .unwrap();
    dataset
        .read_block(0, 0, 1, PixelType::Int16, &mut buf)
        .await
        .unwrap();
    assert_eq!(decode_i16_ne(&buf), vec![-7, 7]);
    dataset.close().await.unwrap();

    let dataset = Dataset::open(LocalFile::open(&path).await.unwrap())
        .await
        .unwrap();
    let band = dataset.read_band(0, PixelType::Int16).await.unwrap();
    assert_eq!(decode_i16_ne(&band), vec![0, 1, -7, 7, 20, 21]);
}

#[tokio::test]
async fn test_read_only_local_file_rejects_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ro.elas");

    let file = LocalFile::create(&path).await.unwrap();
    Dataset::create(file, RasterFormat::Elas, &CreateOptions::new(2, 1, 1, PixelType::Byte))
        .await
        .unwrap()
        .close()
        .await
        .unwrap();
    let before = std::fs::read(&path).unwrap();

    let mut dataset = Dataset::open(LocalFile::open(&path).await.unwrap())
        .await
        .unwrap();
    assert!(matches!(
        dataset.write_block(0, 0, 0, PixelType::Byte, &[1, 2]).await,
        Err(DatasetError::ReadOnly { .. })
    ));
    drop(dataset);
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[tokio::test]
async fn test_registry_over_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("N12E034.hgt");

    let file = LocalFile::create(&path).await.unwrap();
    let mut dataset = Dataset::create(
        file,
        RasterFormat::SrtmHgt,
        &CreateOptions::new(1201, 1201, 1, PixelType::Int16),
    )
    .await
    .unwrap();
    let row: Vec<i16> = (0..1201).map(|x| x as i16).collect();
    dataset
        .write_block(0, 0, 3, PixelType::Int16, &i16_ne(&row))
        .await
        .unwrap();
    let file = dataset.close().await.unwrap();
    assert_eq!(file.size(), 1201 * 1201 * 2);

    let registry = DatasetRegistry::new(LocalSource::new(dir.path()));
    let tile = registry.get_dataset("N12E034.hgt").await.unwrap();
    assert_eq!(tile.format(), RasterFormat::SrtmHgt);

    let mut buf = vec![0u8; tile.block_buffer_len(PixelType::Int16)];
    tile.read_block(0, 0, 3, PixelType::Int16, &mut buf)
        .await
        .unwrap();
    assert_eq!(decode_i16_ne(&buf), row);

    assert!(registry.get_dataset("S00W000.hgt").await.is_err());
}

#[tokio::test]
async fn test_registry_rejects_paths_outside_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("data");
    std::fs::create_dir(&root).unwrap();

    let outside = dir.path().join("outside.elas");
    let file = LocalFile::create(&outside).await.unwrap();
    Dataset::create(file, RasterFormat::Elas, &CreateOptions::new(2, 1, 1, PixelType::Byte))
        .await
        .unwrap()
        .close()
        .await
        .unwrap();

    let registry = DatasetRegistry::new(LocalSource::new(&root));
    assert!(matches!(
        registry.get_dataset("../outside.elas").await,
        Err(DatasetError::Io(IoError::InvalidIdentifier(_)))
    ));
    let absolute = outside.to_string_lossy().into_owned();
    assert!(matches!(
        registry.get_dataset(&absolute).await,
        Err(DatasetError::Io(IoError::InvalidIdentifier(_)))
    ));
    assert_eq!(registry.cached_count().await, 0);
}
