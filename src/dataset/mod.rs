//! Dataset layer.
//!
//! A [`Dataset`] ties a parsed header to the file it came from and moves
//! blocks between the file and caller buffers through the transcoder:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            DatasetRegistry              │
//! │  (caches datasets, auto-detects format) │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │               Dataset                   │
//! │  (block offsets from the BandLayout,    │
//! │   conversion via pixel::transcode)      │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │     RangeReader / RangeWriter           │
//! │  (LocalFile, MemoryFile, BlockCache)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Handles move through `open`/`create` → read-only or read-write → `close`.

#[allow(clippy::module_inception)]
mod dataset;
mod registry;

pub use dataset::{Access, Dataset, DatasetInfo, WarnOnce};
pub use registry::{CachedDataset, DatasetRegistry, DatasetSource, LocalSource};
