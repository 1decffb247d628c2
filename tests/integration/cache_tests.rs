//! Cache effectiveness integration tests.
//!
//! Tests verify:
//! - The block cache turns repeated block reads into one backend request
//! - The registry opens each dataset once
//! - Concurrent opens don't cause duplicate work
//! - Missing datasets surface as I/O errors

use std::sync::Arc;

use rasterblock::dataset::{Dataset, DatasetRegistry};
use rasterblock::error::{DatasetError, IoError};
use rasterblock::io::BlockCache;
use rasterblock::pixel::PixelType;

use super::test_utils::{
    create_fits_int16, create_srtm, decode_i16_ne, MockDatasetSource, TrackingMockReader,
};

// =============================================================================
// Block Cache
// =============================================================================

#[tokio::test]
async fn test_block_cache_serves_repeated_reads() {
    let bytes = create_fits_int16(&[vec![1, 2, 3, 4], vec![5, 6, 7, 8]], &[]);
    let reader = TrackingMockReader::new(bytes, "tracked.fits");
    let tracker = reader.clone();
    let dataset = Dataset::open(BlockCache::with_capacity(reader, 4096, 8))
        .await
        .unwrap();
    let after_open = tracker.request_count();
    assert!(after_open >= 1);

    let mut buf = vec![0u8; 8];
    for _ in 0..5 {
        dataset
            .read_block(0, 0, 1, PixelType::Int16, &mut buf)
            .await
            .unwrap();
    }
    assert_eq!(decode_i16_ne(&buf), vec![5, 6, 7, 8]);

    // Header and data sit in the first two 4 KB blocks.
    assert!(tracker.request_count() <= 2);
    let requests = tracker.get_requests().await;
    assert!(requests.iter().all(|&(offset, _)| offset % 4096 == 0));
}

#[tokio::test]
async fn test_uncached_reader_sees_every_read() {
    let bytes = create_fits_int16(&[vec![1, 2], vec![3, 4]], &[]);
    let reader = TrackingMockReader::new(bytes, "plain.fits");
    let tracker = reader.clone();
    let dataset = Dataset::open(reader).await.unwrap();
    tracker.reset_tracking();

    let mut buf = vec![0u8; 4];
    for _ in 0..3 {
        dataset
            .read_block(0, 0, 0, PixelType::Int16, &mut buf)
            .await
            .unwrap();
    }
    assert_eq!(tracker.request_count(), 3);
}

// =============================================================================
// Dataset Registry
// =============================================================================

#[tokio::test]
async fn test_registry_opens_once() {
    let source = MockDatasetSource::new()
        .with_file("a.fits", create_fits_int16(&[vec![9, 8]], &[]))
        .with_file("N01E001.hgt", create_srtm(|_, _| 42));
    let registry = DatasetRegistry::with_capacity(source, 4, 64 * 1024, 16);

    let first = registry.get_dataset("a.fits").await.unwrap();
    let second = registry.get_dataset("a.fits").await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.source().get_request_count("a.fits").await, 1);

    let tile = registry.get_dataset("N01E001.hgt").await.unwrap();
    let mut row = vec![0u8; tile.block_buffer_len(PixelType::Int16)];
    tile.read_block(0, 0, 1200, PixelType::Int16, &mut row)
        .await
        .unwrap();
    assert!(decode_i16_ne(&row).iter().all(|&v| v == 42));
    assert_eq!(registry.cached_count().await, 2);
}

#[tokio::test]
async fn test_registry_missing_dataset() {
    let registry = DatasetRegistry::new(MockDatasetSource::new());
    assert!(matches!(
        registry.get_dataset("nope.fits").await,
        Err(DatasetError::Io(IoError::NotFound(_)))
    ));
    assert_eq!(registry.cached_count().await, 0);
}

#[tokio::test]
async fn test_registry_concurrent_opens() {
    let source =
        MockDatasetSource::new().with_file("shared.fits", create_fits_int16(&[vec![1]], &[]));
    let registry = Arc::new(DatasetRegistry::new(source));

    let mut handles = Vec::new();
    for _ in 0..10 {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            let dataset = registry.get_dataset("shared.fits").await.unwrap();
            let mut buf = vec![0u8; 2];
            dataset
                .read_block(0, 0, 0, PixelType::Int16, &mut buf)
                .await
                .unwrap();
            decode_i16_ne(&buf)[0]
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 1);
    }
    assert_eq!(registry.source().get_request_count("shared.fits").await, 1);
}
