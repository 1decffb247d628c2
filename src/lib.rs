//! # rasterblock
//!
//! Typed block transcoding for raw raster formats.
//!
//! Raster bands on disk come in many numeric encodings: 8 to 32 bit
//! integers, 32 and 64 bit floats and their complex variants, in either
//! byte order, interleaved by pixel, line or band, with rows sometimes
//! padded or stored bottom-up. This crate decodes such blocks into a
//! caller-chosen pixel type and encodes them back, with well-defined
//! clamping and rounding.
//!
//! ## Features
//!
//! - **Exhaustive conversions**: every pair of the eleven pixel types, with
//!   saturating integer narrowing and round-half-away-from-zero float to
//!   integer conversion
//! - **Strided views**: element access at any stride and byte order
//! - **Layout descriptors**: block offsets for pixel, line and band
//!   interleaving with row alignment
//! - **Drivers**: ELAS, FITS, Surfer 7 binary grids and SRTM height tiles
//! - **Caching**: block cache and a registry of opened datasets
//!
//! ## Architecture
//!
//! - [`pixel`] - Pixel types, values, conversion policy and the transcoder
//! - [`layout`] - Band layout descriptors
//! - [`io`] - Byte range readers and writers, block caching
//! - [`mod@format`] - Header parsers and format detection
//! - [`dataset`] - Block I/O on open files and the dataset registry
//! - [`config`] - CLI configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use rasterblock::{Dataset, LocalFile, PixelType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), rasterblock::DatasetError> {
//!     let file = LocalFile::open("N45E006.hgt").await?;
//!     let dataset = Dataset::open(file).await?;
//!
//!     // First row of elevations as Float32.
//!     let mut row = vec![0u8; dataset.block_buffer_len(PixelType::Float32)];
//!     dataset.read_block(0, 0, 0, PixelType::Float32, &mut row).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod format;
pub mod io;
pub mod layout;
pub mod pixel;

// Re-export commonly used types
pub use config::{CacheConfig, Cli, Command, ConvertConfig, InfoConfig};
pub use dataset::{Access, Dataset, DatasetInfo, DatasetRegistry, DatasetSource, LocalSource};
pub use error::{DatasetError, FormatError, IoError, LayoutError};
pub use format::{detect_format, CreateOptions, FormatHeader, RasterFormat};
pub use io::{BlockCache, LocalFile, MemoryFile, RangeReader, RangeWriter};
pub use layout::{BandLayout, BlockSpan, Interleave, RowAlignment, RowOrder};
pub use pixel::{
    convert, transcode, transcode_in_place, ByteOrder, ElementLayout, PixelType, StridedView,
    StridedViewMut, TypedValue,
};
