use thiserror::Error;

use crate::pixel::PixelType;

/// I/O errors raised by byte-stream collaborators.
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Error reported by the operating system or storage backend
    #[error("I/O error: {0}")]
    Io(String),

    /// Requested range exceeds resource bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Identifier does not name a resource inside the source
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => IoError::NotFound(err.to_string()),
            _ => IoError::Io(err.to_string()),
        }
    }
}

/// Errors raised when locating a block through a band layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Band index is not below the band count
    #[error("Band {band} out of range: dataset has {count} band(s)")]
    BandOutOfRange { band: usize, count: usize },

    /// Block column outside the blocks-per-row count
    #[error("Block x {block_x} out of range: layout has {count} block(s) per row")]
    BlockXOutOfRange { block_x: usize, count: usize },

    /// Block row outside the blocks-per-column count
    #[error("Block y {block_y} out of range: layout has {count} block row(s)")]
    BlockYOutOfRange { block_y: usize, count: usize },

    /// Raster or block dimensions are zero or inconsistent
    #[error("Invalid layout dimensions: {0}")]
    InvalidDimensions(String),
}

/// Errors related to format detection, header parsing and creation.
#[derive(Debug, Clone, Error)]
pub enum FormatError {
    /// I/O error while reading or writing the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Layout could not be built from the header fields
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    /// File format is not recognised
    #[error("Unsupported format: {reason}")]
    UnsupportedFormat { reason: String },

    /// Header is recognised but malformed
    #[error("Invalid {format} header: {message}")]
    InvalidHeader {
        format: &'static str,
        message: String,
    },

    /// Pixel type cannot be stored by this format
    #[error("{format} does not support pixel type {pixel_type}")]
    UnsupportedPixelType {
        format: &'static str,
        pixel_type: PixelType,
    },
}

/// Errors returned by dataset handles.
#[derive(Debug, Clone, Error)]
pub enum DatasetError {
    /// I/O error while reading or writing blocks
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Error while parsing or writing the header
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Block coordinates rejected by the layout
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    /// Write attempted on a dataset opened read-only
    #[error("Dataset {identifier} is opened read-only")]
    ReadOnly { identifier: String },

    /// Caller buffer cannot hold the requested block
    #[error("Buffer too small: need {required} bytes, got {actual}")]
    BufferTooSmall { required: usize, actual: usize },
}
