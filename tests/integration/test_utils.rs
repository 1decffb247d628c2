//! Test utilities for integration tests.
//!
//! This module provides mock readers and sources, and helpers that build
//! small raster files byte by byte, independently of the crate's own header
//! writers.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use rasterblock::dataset::DatasetSource;
use rasterblock::error::IoError;
use rasterblock::io::RangeReader;

// =============================================================================
// Mock Range Reader with Request Tracking
// =============================================================================

/// A mock range reader that tracks all read requests.
///
/// This is useful for verifying cache behavior and request patterns.
pub struct TrackingMockReader {
    data: Bytes,
    identifier: String,
    request_count: Arc<AtomicUsize>,
    requests: Arc<RwLock<Vec<(u64, usize)>>>,
}

impl TrackingMockReader {
    pub fn new(data: Vec<u8>, identifier: impl Into<String>) -> Self {
        Self {
            data: Bytes::from(data),
            identifier: identifier.into(),
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    pub async fn get_requests(&self) -> Vec<(u64, usize)> {
        self.requests.read().await.clone()
    }

    pub fn reset_tracking(&self) {
        self.request_count.store(0, Ordering::SeqCst);
    }
}

impl Clone for TrackingMockReader {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            identifier: self.identifier.clone(),
            request_count: Arc::clone(&self.request_count),
            requests: Arc::clone(&self.requests),
        }
    }
}

#[async_trait]
impl RangeReader for TrackingMockReader {
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.write().await.push((offset, len));

        let start = offset as usize;
        let end = start + len;
        if end > self.data.len() {
            return Err(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: self.data.len() as u64,
            });
        }
        Ok(self.data.slice(start..end))
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

// =============================================================================
// Mock Dataset Source
// =============================================================================

/// A mock dataset source that serves pre-configured files.
pub struct MockDatasetSource {
    files: HashMap<String, Bytes>,
    request_counts: Arc<RwLock<HashMap<String, usize>>>,
}

impl MockDatasetSource {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
            request_counts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_file(mut self, dataset_id: impl Into<String>, data: Vec<u8>) -> Self {
        self.files.insert(dataset_id.into(), Bytes::from(data));
        self
    }

    pub async fn get_request_count(&self, dataset_id: &str) -> usize {
        self.request_counts
            .read()
            .await
            .get(dataset_id)
            .copied()
            .unwrap_or(0)
    }
}

impl Default for MockDatasetSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatasetSource for MockDatasetSource {
    type Reader = TrackingMockReader;

    async fn create_reader(&self, dataset_id: &str) -> Result<Self::Reader, IoError> {
        {
            let mut counts = self.request_counts.write().await;
            *counts.entry(dataset_id.to_string()).or_insert(0) += 1;
        }

        match self.files.get(dataset_id) {
            Some(data) => Ok(TrackingMockReader::new(data.to_vec(), dataset_id)),
            None => Err(IoError::NotFound(dataset_id.to_string())),
        }
    }
}

// =============================================================================
// Sample Encoding Helpers
// =============================================================================

pub fn i16_ne(values: &[i16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

pub fn f32_ne(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

pub fn f64_ne(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

pub fn decode_i16_ne(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|c| i16::from_ne_bytes([c[0], c[1]]))
        .collect()
}

pub fn decode_f32_ne(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

pub fn decode_f64_ne(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|c| f64::from_ne_bytes(c.try_into().unwrap()))
        .collect()
}

// =============================================================================
// Test File Creation
// =============================================================================

/// Pad a FITS card to 80 characters.
fn fits_card(text: &str) -> Vec<u8> {
    let mut card = text.as_bytes().to_vec();
    card.resize(80, b' ');
    card
}

/// Build a FITS file from header card texts (without END) and raw
/// big-endian data, padding both to 2880-byte records.
pub fn create_fits(cards: &[&str], data: &[u8]) -> Vec<u8> {
    let mut bytes: Vec<u8> = cards.iter().flat_map(|c| fits_card(c)).collect();
    bytes.extend(fits_card("END"));
    bytes.resize(bytes.len().div_ceil(2880) * 2880, b' ');
    bytes.extend_from_slice(data);
    bytes.resize(bytes.len().div_ceil(2880) * 2880, 0);
    bytes
}

/// Build a FITS Int16 image; `rows` are given top row first and stored
/// bottom row first.
pub fn create_fits_int16(rows: &[Vec<i16>], extra_cards: &[&str]) -> Vec<u8> {
    let width = rows[0].len();
    let naxis1 = format!("NAXIS1  = {:>20} / columns", width);
    let naxis2 = format!("NAXIS2  = {:>20} / rows", rows.len());
    let mut cards = vec![
        "SIMPLE  =                    T / conforms to FITS standard",
        "BITPIX  =                   16 / bits per pixel",
        "NAXIS   =                    2",
        naxis1.as_str(),
        naxis2.as_str(),
    ];
    cards.extend_from_slice(extra_cards);
    let data: Vec<u8> = rows
        .iter()
        .rev()
        .flat_map(|row| row.iter().flat_map(|v| v.to_be_bytes()))
        .collect();
    create_fits(&cards, &data)
}

/// Build an ELAS file with `bands` Byte bands; sample value is
/// `band * 100 + row * 10 + column`.
pub fn create_elas_byte(width: usize, height: usize, bands: usize) -> Vec<u8> {
    let band_row = width.div_ceil(256) * 256;
    let record = band_row * bands;
    let mut bytes = vec![0u8; 1024 + record * height];

    let be = |bytes: &mut [u8], at: usize, v: i32| bytes[at..at + 4].copy_from_slice(&v.to_be_bytes());
    be(&mut bytes, 0, 1024);
    be(&mut bytes, 4, record as i32);
    be(&mut bytes, 8, 1);
    be(&mut bytes, 12, height as i32);
    be(&mut bytes, 16, 1);
    be(&mut bytes, 20, width as i32);
    be(&mut bytes, 24, bands as i32);
    be(&mut bytes, 28, 4321);
    bytes[72..76].copy_from_slice(&[0x04, 0xd2, 1 << 2, 1]);

    for row in 0..height {
        for band in 0..bands {
            let start = 1024 + row * record + band * band_row;
            for column in 0..width {
                bytes[start + column] = (band * 100 + row * 10 + column) as u8;
            }
            // Padding bytes are marked so leaks into samples show up.
            for pad in width..band_row {
                bytes[start + pad] = 0xAB;
            }
        }
    }
    bytes
}

/// Build a Surfer 7 grid; `rows` are given bottom (south) row first, as
/// stored.
pub fn create_gs7bg(rows: &[Vec<f64>], blank: f64) -> Vec<u8> {
    let columns = rows[0].len();
    let mut bytes = Vec::new();
    let le32 = |bytes: &mut Vec<u8>, v: u32| bytes.extend_from_slice(&v.to_le_bytes());

    le32(&mut bytes, 0x4252_5344);
    le32(&mut bytes, 4);
    le32(&mut bytes, 1);

    le32(&mut bytes, 0x4449_5247);
    le32(&mut bytes, 72);
    bytes.extend_from_slice(&(rows.len() as i32).to_le_bytes());
    bytes.extend_from_slice(&(columns as i32).to_le_bytes());
    let values = rows.iter().flatten().copied().filter(|v| *v != blank);
    let (z_min, z_max) = values.fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
    for v in [100.0, 200.0, 0.5, 0.25, z_min, z_max, 0.0, blank] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }

    le32(&mut bytes, 0x4154_4144);
    le32(&mut bytes, (rows.len() * columns * 8) as u32);
    for v in rows.iter().flatten() {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Build a 1201 x 1201 SRTM tile with elevation `f(column, row)`.
pub fn create_srtm(f: impl Fn(usize, usize) -> i16) -> Vec<u8> {
    let side = 1201;
    let mut bytes = Vec::with_capacity(side * side * 2);
    for row in 0..side {
        for column in 0..side {
            bytes.extend_from_slice(&f(column, row).to_be_bytes());
        }
    }
    bytes
}
