use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{check_range, RangeReader, RangeWriter};
use crate::error::IoError;

/// In-memory resource, readable and writable.
///
/// Used for scratch datasets and in tests in place of a real file.
pub struct MemoryFile {
    data: RwLock<Vec<u8>>,
    size: AtomicU64,
    identifier: String,
}

impl MemoryFile {
    pub fn new(identifier: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            size: AtomicU64::new(data.len() as u64),
            data: RwLock::new(data),
            identifier: identifier.into(),
        }
    }

    pub fn empty(identifier: impl Into<String>) -> Self {
        Self::new(identifier, Vec::new())
    }

    /// Copy of the current contents.
    pub async fn to_vec(&self) -> Vec<u8> {
        self.data.read().await.clone()
    }
}

#[async_trait]
impl RangeReader for MemoryFile {
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        let data = self.data.read().await;
        check_range(offset, len, data.len() as u64)?;
        let start = offset as usize;
        Ok(Bytes::copy_from_slice(&data[start..start + len]))
    }

    fn size(&self) -> u64 {
        self.size.load(Ordering::Acquire)
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[async_trait]
impl RangeWriter for MemoryFile {
    async fn write_all_at(&self, offset: u64, bytes: &[u8]) -> Result<(), IoError> {
        let mut data = self.data.write().await;
        let start = offset as usize;
        let end = start + bytes.len();
        if end > data.len() {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(bytes);
        self.size.store(data.len() as u64, Ordering::Release);
        Ok(())
    }

    async fn set_len(&self, len: u64) -> Result<(), IoError> {
        let mut data = self.data.write().await;
        data.resize(len as usize, 0);
        self.size.store(len, Ordering::Release);
        Ok(())
    }
}
