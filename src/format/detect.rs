//! Format detection for raster files.
//!
//! Formats are recognised by magic bytes at the start of the file, except
//! SRTM tiles, which have no header and are recognised by file name and
//! size. Supported formats:
//!
//! - **ELAS**: NBIH = 1024 and H4321 = 4321 in the big-endian header
//! - **FITS**: `SIMPLE  =` card with value `T`
//! - **GS7BG**: `DSRB` tag
//! - **SRTMHGT**: `N45E006.hgt` style name and a known tile size

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FormatError;
use crate::io::RangeReader;

use super::{elas, fits, gs7bg, srtm};

// =============================================================================
// RasterFormat
// =============================================================================

/// Detected raster format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    /// ELAS line-interleaved raster
    Elas,
    /// FITS primary image
    Fits,
    /// Golden Software Surfer 7 binary grid
    Gs7bg,
    /// SRTM height tile
    SrtmHgt,
}

impl RasterFormat {
    pub const ALL: [RasterFormat; 4] = [
        RasterFormat::Elas,
        RasterFormat::Fits,
        RasterFormat::Gs7bg,
        RasterFormat::SrtmHgt,
    ];

    /// Short driver name.
    pub const fn name(&self) -> &'static str {
        match self {
            RasterFormat::Elas => elas::NAME,
            RasterFormat::Fits => fits::NAME,
            RasterFormat::Gs7bg => gs7bg::NAME,
            RasterFormat::SrtmHgt => srtm::NAME,
        }
    }

    /// Conventional file extension.
    pub const fn extension(&self) -> &'static str {
        match self {
            RasterFormat::Elas => "elas",
            RasterFormat::Fits => "fits",
            RasterFormat::Gs7bg => "grd",
            RasterFormat::SrtmHgt => "hgt",
        }
    }
}

impl fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RasterFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RasterFormat::ALL
            .into_iter()
            .find(|format| {
                format.name().eq_ignore_ascii_case(s) || format.extension().eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| FormatError::UnsupportedFormat {
                reason: format!("unknown format name '{}'", s),
            })
    }
}

// =============================================================================
// Format Detection
// =============================================================================

/// Bytes read from the start of the file for magic detection.
const PROBE_BYTES: usize = 32;

/// Detect the format of a raster file.
///
/// # Returns
/// * `Ok(RasterFormat)` - The detected format
/// * `Err(FormatError::UnsupportedFormat)` - File is not a recognized format
/// * `Err(FormatError::Io)` - The probe read failed
pub async fn detect_format<R: RangeReader>(reader: &R) -> Result<RasterFormat, FormatError> {
    let size = reader.size();
    let probe_len = (size as usize).min(PROBE_BYTES);
    let probe = reader.read_exact_at(0, probe_len).await?;

    if let Some(format) = detect_from_bytes(&probe) {
        return Ok(format);
    }

    if srtm::is_srtm_tile(reader.identifier(), size) {
        return Ok(RasterFormat::SrtmHgt);
    }

    Err(FormatError::UnsupportedFormat {
        reason: format!(
            "{} is not an ELAS, FITS, GS7BG or SRTM file",
            reader.identifier()
        ),
    })
}

/// Detect a format from its leading bytes alone.
pub fn detect_from_bytes(bytes: &[u8]) -> Option<RasterFormat> {
    if elas::is_elas_header(bytes) {
        Some(RasterFormat::Elas)
    } else if fits::is_fits_header(bytes) {
        Some(RasterFormat::Fits)
    } else if gs7bg::is_gs7bg_header(bytes) {
        Some(RasterFormat::Gs7bg)
    } else {
        None
    }
}
