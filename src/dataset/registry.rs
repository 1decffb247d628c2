//! Dataset Registry for sharing opened read-only datasets.
//!
//! The registry provides:
//! - LRU caching of opened datasets to avoid re-parsing headers
//! - Singleflight pattern to prevent duplicate opens for the same dataset
//! - Format auto-detection when opening datasets
//! - Block caching for efficient I/O
//!
//! # Example
//!
//! ```ignore
//! use rasterblock::dataset::{DatasetRegistry, LocalSource};
//! use rasterblock::PixelType;
//!
//! let registry = DatasetRegistry::new(LocalSource::new("/data/dem"));
//!
//! // Opens and caches on first access
//! let dataset = registry.get_dataset("N45E006.hgt").await?;
//!
//! let mut row = vec![0u8; dataset.block_buffer_len(PixelType::Float32)];
//! dataset.read_block(0, 0, 0, PixelType::Float32, &mut row).await?;
//! ```

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::{Mutex, Notify, RwLock};

use crate::error::{DatasetError, IoError};
use crate::io::{BlockCache, LocalFile, RangeReader, DEFAULT_BLOCK_SIZE};

use super::Dataset;

// =============================================================================
// Configuration
// =============================================================================

/// Default capacity for the dataset cache (number of datasets).
const DEFAULT_DATASET_CACHE_CAPACITY: usize = 64;

/// Default capacity for block cache per dataset (number of blocks).
const DEFAULT_BLOCK_CACHE_CAPACITY: usize = 100;

/// A dataset opened through the registry.
pub type CachedDataset<R> = Dataset<BlockCache<R>>;

// =============================================================================
// DatasetSource Trait
// =============================================================================

/// Trait for creating range readers from dataset identifiers.
///
/// This abstraction allows the registry to work with different storage
/// backends without being tied to a specific implementation.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// The type of range reader this source creates.
    type Reader: RangeReader + 'static;

    /// Create a range reader for the given dataset identifier.
    async fn create_reader(&self, dataset_id: &str) -> Result<Self::Reader, IoError>;
}

/// Datasets stored as files under a root directory.
///
/// The dataset ID is a path relative to the root. IDs that are absolute or
/// climb out of the root with `..` are rejected.
#[derive(Debug, Clone)]
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl DatasetSource for LocalSource {
    type Reader = LocalFile;

    async fn create_reader(&self, dataset_id: &str) -> Result<Self::Reader, IoError> {
        let relative = Path::new(dataset_id);
        let inside_root = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if dataset_id.is_empty() || !inside_root {
            return Err(IoError::InvalidIdentifier(dataset_id.to_string()));
        }
        LocalFile::open(self.root.join(relative)).await
    }
}

// =============================================================================
// DatasetRegistry
// =============================================================================

/// Registry for read-only datasets.
///
/// The registry:
/// - Caches opened datasets with LRU eviction
/// - Opens datasets on demand with format auto-detection
/// - Wraps readers in BlockCache for efficient I/O
/// - Uses singleflight to prevent duplicate opens for the same dataset
pub struct DatasetRegistry<S: DatasetSource> {
    /// The source for creating range readers
    source: S,

    /// Cached datasets indexed by ID
    cache: RwLock<LruCache<String, Arc<CachedDataset<S::Reader>>>>,

    /// In-flight opens for singleflight pattern
    in_flight: Mutex<HashMap<String, Arc<InFlightState<S::Reader>>>>,

    /// Block size for BlockCache
    block_size: usize,

    /// Block cache capacity per dataset
    block_cache_capacity: usize,
}

/// State for an in-flight open operation.
struct InFlightState<R: RangeReader + 'static> {
    /// Notification for waiters
    notify: Notify,
    /// Result of the open operation (set when complete)
    result: Mutex<Option<Result<Arc<CachedDataset<R>>, DatasetError>>>,
}

impl<S: DatasetSource> DatasetRegistry<S> {
    /// Create a new DatasetRegistry with default settings.
    pub fn new(source: S) -> Self {
        Self::with_capacity(
            source,
            DEFAULT_DATASET_CACHE_CAPACITY,
            DEFAULT_BLOCK_SIZE,
            DEFAULT_BLOCK_CACHE_CAPACITY,
        )
    }

    /// Create a new DatasetRegistry with custom capacity settings.
    ///
    /// # Arguments
    /// * `source` - The source for creating readers
    /// * `dataset_cache_capacity` - Maximum number of datasets to cache
    /// * `block_size` - Block size for the block cache (bytes)
    /// * `block_cache_capacity` - Number of blocks to cache per dataset
    pub fn with_capacity(
        source: S,
        dataset_cache_capacity: usize,
        block_size: usize,
        block_cache_capacity: usize,
    ) -> Self {
        Self {
            source,
            cache: RwLock::new(LruCache::new(
                NonZeroUsize::new(dataset_cache_capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            in_flight: Mutex::new(HashMap::new()),
            block_size,
            block_cache_capacity,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Get a dataset, opening it if not already cached.
    ///
    /// Concurrent requests for the same ID share one open.
    pub async fn get_dataset(
        &self,
        dataset_id: &str,
    ) -> Result<Arc<CachedDataset<S::Reader>>, DatasetError> {
        // Fast path: check cache
        {
            let mut cache = self.cache.write().await;
            if let Some(dataset) = cache.get(dataset_id) {
                return Ok(dataset.clone());
            }
        }

        // Slow path: check in_flight or become leader
        loop {
            let state = {
                let mut in_flight = self.in_flight.lock().await;

                if let Some(state) = in_flight.get(dataset_id) {
                    state.clone()
                } else {
                    let state = Arc::new(InFlightState {
                        notify: Notify::new(),
                        result: Mutex::new(None),
                    });
                    in_flight.insert(dataset_id.to_string(), state.clone());
                    drop(in_flight);

                    let result = self.open_dataset_internal(dataset_id).await;

                    {
                        let mut result_guard = state.result.lock().await;
                        *result_guard = Some(result.clone());
                    }

                    if let Ok(ref dataset) = result {
                        let mut cache = self.cache.write().await;
                        cache.put(dataset_id.to_string(), dataset.clone());
                    }

                    {
                        let mut in_flight = self.in_flight.lock().await;
                        in_flight.remove(dataset_id);
                    }
                    state.notify.notify_waiters();

                    return result;
                }
            };

            // Register interest before checking the result so a completion
            // between the check and the await is not missed.
            let notified = state.notify.notified();
            {
                let result_guard = state.result.lock().await;
                if let Some(ref result) = *result_guard {
                    return result.clone();
                }
            }
            notified.await;

            let result_guard = state.result.lock().await;
            if let Some(ref result) = *result_guard {
                return result.clone();
            }
        }
    }

    async fn open_dataset_internal(
        &self,
        dataset_id: &str,
    ) -> Result<Arc<CachedDataset<S::Reader>>, DatasetError> {
        let reader = self.source.create_reader(dataset_id).await?;
        let cached_reader =
            BlockCache::with_capacity(reader, self.block_size, self.block_cache_capacity);
        let dataset = Dataset::open(cached_reader).await?;
        Ok(Arc::new(dataset))
    }

    /// Remove a dataset from the cache.
    pub async fn invalidate(&self, dataset_id: &str) {
        let mut cache = self.cache.write().await;
        cache.pop(dataset_id);
    }

    /// Clear all cached datasets.
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
    }

    /// Get the number of cached datasets.
    pub async fn cached_count(&self) -> usize {
        let cache = self.cache.read().await;
        cache.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
