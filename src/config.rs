//! Command-line configuration for the `rasterblock` tool.
//!
//! Options are read from command-line arguments, with environment variable
//! fallbacks using the `RASTERBLOCK_` prefix:
//!
//! - `RASTERBLOCK_BLOCK_SIZE` - Block cache block size in bytes (default: 65536)
//! - `RASTERBLOCK_CACHE_BLOCKS` - Blocks kept by the block cache (default: 256)
//! - `RASTERBLOCK_FORMAT` - Output format of `convert`
//! - `RASTERBLOCK_TYPE` - Output pixel type of `convert`
//!
//! # Example
//!
//! ```text
//! rasterblock info N45E006.hgt --json
//! rasterblock convert scene.fits scene.elas --format elas --type Byte
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::format::RasterFormat;
use crate::io::{DEFAULT_BLOCK_SIZE, DEFAULT_CACHE_CAPACITY};
use crate::pixel::PixelType;

// =============================================================================
// Limits
// =============================================================================

/// Smallest accepted block cache block size.
pub const MIN_BLOCK_SIZE: usize = 512;

/// Largest accepted block cache block size.
pub const MAX_BLOCK_SIZE: usize = 16 * 1024 * 1024;

// =============================================================================
// CLI Arguments
// =============================================================================

/// rasterblock - Inspect and convert raw raster files.
///
/// Reads ELAS, FITS, Surfer 7 binary grids and SRTM height tiles, and
/// converts between them with well-defined clamping and rounding.
#[derive(Parser, Debug, Clone)]
#[command(name = "rasterblock")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub cache: CacheConfig,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Block cache geometry used when reading source files.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Block size in bytes for the block cache.
    #[arg(long, global = true, default_value_t = DEFAULT_BLOCK_SIZE, env = "RASTERBLOCK_BLOCK_SIZE")]
    pub block_size: usize,

    /// Maximum number of blocks to cache per file.
    #[arg(long, global = true, default_value_t = DEFAULT_CACHE_CAPACITY, env = "RASTERBLOCK_CACHE_BLOCKS")]
    pub cache_blocks: usize,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Detect a file's format and print its layout.
    Info(InfoConfig),

    /// Convert a file to another format and pixel type.
    Convert(ConvertConfig),
}

#[derive(Args, Debug, Clone)]
pub struct InfoConfig {
    /// File to inspect.
    pub path: PathBuf,

    /// Print the description as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ConvertConfig {
    /// Source file.
    pub src: PathBuf,

    /// Destination file, replaced if it exists.
    pub dst: PathBuf,

    /// Output format (elas, fits, gs7bg, srtmhgt).
    #[arg(short, long, env = "RASTERBLOCK_FORMAT")]
    pub format: RasterFormat,

    /// Output pixel type; defaults to the source type.
    #[arg(short = 't', long = "type", env = "RASTERBLOCK_TYPE")]
    pub pixel_type: Option<PixelType>,

    /// Nodata value for the output; defaults to the source's.
    #[arg(long)]
    pub nodata: Option<f64>,
}

impl Cli {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.cache.validate()?;
        match &self.command {
            Command::Info(_) => Ok(()),
            Command::Convert(config) => config.validate(),
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_blocks == 0 {
            return Err("cache_blocks must be greater than 0".to_string());
        }
        if self.block_size < MIN_BLOCK_SIZE || self.block_size > MAX_BLOCK_SIZE {
            return Err(format!(
                "block_size must be between {} bytes and {}MB",
                MIN_BLOCK_SIZE,
                MAX_BLOCK_SIZE / (1024 * 1024)
            ));
        }
        Ok(())
    }
}

impl ConvertConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.src == self.dst {
            return Err("source and destination must be different files".to_string());
        }
        if let Some(nodata) = self.nodata {
            if !nodata.is_finite() && !nodata.is_nan() {
                return Err("nodata must be a finite number or NaN".to_string());
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
