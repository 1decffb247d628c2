use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt, SeekFrom};
use tokio::sync::Mutex;

use super::{check_range, RangeReader, RangeWriter};
use crate::error::IoError;

/// Local file implementation of RangeReader and RangeWriter.
///
/// Seeks and reads share one file cursor, so every access holds the file
/// lock for the whole seek+read or seek+write.
pub struct LocalFile {
    file: Mutex<File>,
    path: PathBuf,
    identifier: String,
    size: AtomicU64,
}

impl LocalFile {
    /// Open an existing file for reading.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let file = File::open(path.as_ref()).await?;
        Self::from_file(file, path.as_ref()).await
    }

    /// Open an existing file for reading and writing.
    pub async fn open_rw(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path.as_ref())
            .await?;
        Self::from_file(file, path.as_ref()).await
    }

    /// Create (or truncate) a file for reading and writing.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())
            .await?;
        Self::from_file(file, path.as_ref()).await
    }

    async fn from_file(file: File, path: &Path) -> Result<Self, IoError> {
        let size = file.metadata().await?.len();
        Ok(Self {
            file: Mutex::new(file),
            path: path.to_path_buf(),
            identifier: path.display().to_string(),
            size: AtomicU64::new(size),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RangeReader for LocalFile {
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        check_range(offset, len, self.size())?;
        if len == 0 {
            return Ok(Bytes::new());
        }

        let mut buf = vec![0u8; len];
        let mut file = self.file.lock().await;
        file.seek(SeekFrom::Start(offset)).await?;
        file.read_exact(&mut buf).await?;
        Ok(Bytes::from(buf))
    }

    fn size(&self) -> u64 {
        self.size.load(Ordering::Acquire)
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[async_trait]
impl RangeWriter for LocalFile {
    async fn write_all_at(&self, offset: u64, data: &[u8]) -> Result<(), IoError> {
        if data.is_empty() {
            return Ok(());
        }
        let mut file = self.file.lock().await;
        file.seek(SeekFrom::Start(offset)).await?;
        file.write_all(data).await?;
        self.size
            .fetch_max(offset + data.len() as u64, Ordering::AcqRel);
        Ok(())
    }

    async fn set_len(&self, len: u64) -> Result<(), IoError> {
        let file = self.file.lock().await;
        file.set_len(len).await?;
        self.size.store(len, Ordering::Release);
        Ok(())
    }

    async fn flush(&self) -> Result<(), IoError> {
        let mut file = self.file.lock().await;
        file.flush().await?;
        file.sync_data().await?;
        Ok(())
    }
}
