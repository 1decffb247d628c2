//! Open raster datasets: block I/O through the transcoder.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::error::DatasetError;
use crate::format::{detect_format, CreateOptions, FormatHeader, RasterFormat};
use crate::io::{RangeReader, RangeWriter};
use crate::layout::{BandLayout, BlockSpan};
use crate::pixel::{
    toggle_sign_bits, transcode, ByteOrder, ElementLayout, PixelType, StridedView, StridedViewMut,
};

// =============================================================================
// Access Mode
// =============================================================================

/// How a dataset handle was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

// =============================================================================
// WarnOnce
// =============================================================================

/// Remembers which (buffer type, disk type) pairs were already reported as
/// lossy, so each pair is logged once per dataset handle.
#[derive(Debug, Default)]
pub struct WarnOnce {
    seen: HashSet<(PixelType, PixelType)>,
}

impl WarnOnce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time a pair is seen.
    pub fn first(&mut self, from: PixelType, to: PixelType) -> bool {
        self.seen.insert((from, to))
    }
}

// =============================================================================
// DatasetInfo
// =============================================================================

/// Summary of an open dataset.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetInfo {
    pub identifier: String,
    pub format: RasterFormat,
    pub access: Access,
    pub width: usize,
    pub height: usize,
    pub band_count: usize,
    pub pixel_type: PixelType,
    pub byte_order: ByteOrder,
    pub block_width: usize,
    pub block_height: usize,
    pub nodata: Option<f64>,
    pub file_size: u64,
    pub layout: BandLayout,
    pub metadata: BTreeMap<String, String>,
}

// =============================================================================
// Dataset
// =============================================================================

/// An open raster file.
///
/// Blocks are read and written in a caller-chosen pixel type. The caller's
/// buffer holds one full block, packed row by row in native byte order;
/// for the short blocks at the right and bottom edges only the valid part of
/// each row is touched.
pub struct Dataset<R> {
    reader: R,
    header: FormatHeader,
    access: Access,
    warnings: WarnOnce,
    value_range: Option<(f64, f64)>,
}

impl<R: RangeReader> Dataset<R> {
    /// Open an existing file read-only, detecting its format.
    pub async fn open(reader: R) -> Result<Self, DatasetError> {
        Self::open_with(reader, Access::ReadOnly).await
    }

    async fn open_with(reader: R, access: Access) -> Result<Self, DatasetError> {
        let format = detect_format(&reader).await?;
        let header = FormatHeader::read(&reader, format).await?;
        let layout = header.layout();
        debug!(
            identifier = reader.identifier(),
            format = %format,
            width = layout.width,
            height = layout.height,
            bands = layout.band_count,
            pixel_type = %layout.pixel_type,
            "Opened dataset"
        );
        let value_range = header.value_range();
        Ok(Self {
            reader,
            header,
            access,
            warnings: WarnOnce::new(),
            value_range,
        })
    }

    pub fn identifier(&self) -> &str {
        self.reader.identifier()
    }

    pub fn format(&self) -> RasterFormat {
        self.header.format()
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn header(&self) -> &FormatHeader {
        &self.header
    }

    pub fn layout(&self) -> &BandLayout {
        self.header.layout()
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Nodata sentinel of the file, if it has one.
    pub fn nodata(&self) -> Option<f64> {
        self.header.nodata()
    }

    pub fn info(&self) -> DatasetInfo {
        let layout = self.layout();
        DatasetInfo {
            identifier: self.identifier().to_string(),
            format: self.format(),
            access: self.access,
            width: layout.width,
            height: layout.height,
            band_count: layout.band_count,
            pixel_type: layout.pixel_type,
            byte_order: layout.byte_order,
            block_width: layout.block_width,
            block_height: layout.block_height,
            nodata: self.nodata(),
            file_size: self.reader.size(),
            layout: layout.clone(),
            metadata: self.header.metadata(),
        }
    }

    /// Bytes a block buffer of `buf_type` must hold.
    pub fn block_buffer_len(&self, buf_type: PixelType) -> usize {
        self.layout().block_len() * buf_type.size_bytes()
    }

    /// Read block `(block_x, block_y)` of `band` into `buf` as `buf_type`.
    pub async fn read_block(
        &self,
        band: usize,
        block_x: usize,
        block_y: usize,
        buf_type: PixelType,
        buf: &mut [u8],
    ) -> Result<(), DatasetError> {
        let span = self.layout().block_span(band, block_x, block_y)?;
        self.check_buffer(buf_type, buf.len())?;

        let mut raw = self.reader.read_exact_at(span.offset, span.byte_len).await?.to_vec();
        if self.header.flips_sign_bit() {
            toggle_span_sign_bits(&mut raw, &span);
        }
        trace!(
            identifier = self.identifier(),
            band,
            block_x,
            block_y,
            offset = span.offset,
            len = span.byte_len,
            "Read block"
        );

        let row_bytes = self.layout().block_width * buf_type.size_bytes();
        let element = ElementLayout::packed(buf_type, ByteOrder::native());
        for row in 0..span.rows {
            let src = StridedView::new(&raw[span.row_start(row)..], span.element);
            let start = row * row_bytes;
            let mut dst = StridedViewMut::new(&mut buf[start..start + row_bytes], element);
            transcode(&src, &mut dst, span.columns);
        }
        Ok(())
    }

    /// Read a whole band as `buf_type`, packed row by row in native order.
    pub async fn read_band(&self, band: usize, buf_type: PixelType) -> Result<Vec<u8>, DatasetError> {
        let layout = self.layout();
        let size = buf_type.size_bytes();
        let band_row = layout.width * size;
        let block_row = layout.block_width * size;
        let mut out = vec![0u8; band_row * layout.height];
        let mut block = vec![0u8; self.block_buffer_len(buf_type)];

        for block_y in 0..layout.blocks_per_column() {
            for block_x in 0..layout.blocks_per_row() {
                self.read_block(band, block_x, block_y, buf_type, &mut block)
                    .await?;
                let span = layout.block_span(band, block_x, block_y)?;
                let valid = span.columns * size;
                for row in 0..span.rows {
                    let y = block_y * layout.block_height + row;
                    let at = y * band_row + block_x * block_row;
                    out[at..at + valid]
                        .copy_from_slice(&block[row * block_row..row * block_row + valid]);
                }
            }
        }
        Ok(out)
    }

    fn check_buffer(&self, buf_type: PixelType, actual: usize) -> Result<(), DatasetError> {
        let required = self.block_buffer_len(buf_type);
        if actual < required {
            return Err(DatasetError::BufferTooSmall { required, actual });
        }
        Ok(())
    }
}

impl<R: RangeWriter> Dataset<R> {
    /// Open an existing file for reading and writing.
    pub async fn open_rw(reader: R) -> Result<Self, DatasetError> {
        Self::open_with(reader, Access::ReadWrite).await
    }

    /// Create a new file of `format` on `writer`, replacing its contents.
    ///
    /// The header is written immediately and the file is sized to hold the
    /// whole image; unwritten samples read back as zero.
    pub async fn create(
        writer: R,
        format: RasterFormat,
        options: &CreateOptions,
    ) -> Result<Self, DatasetError> {
        let header = FormatHeader::create(format, options, writer.identifier())?;
        writer.set_len(0).await?;
        let bytes = header.to_bytes();
        if !bytes.is_empty() {
            writer.write_all_at(0, &bytes).await?;
        }
        writer.set_len(header.file_size()).await?;
        debug!(
            identifier = writer.identifier(),
            format = %format,
            width = options.width,
            height = options.height,
            bands = options.band_count,
            pixel_type = %options.pixel_type,
            "Created dataset"
        );
        Ok(Self {
            reader: writer,
            header,
            access: Access::ReadWrite,
            warnings: WarnOnce::new(),
            value_range: None,
        })
    }

    /// Write block `(block_x, block_y)` of `band` from `buf`, given as
    /// `buf_type`.
    ///
    /// Values are converted to the file's pixel type with clamping. On a
    /// read-only handle this fails without touching the file.
    pub async fn write_block(
        &mut self,
        band: usize,
        block_x: usize,
        block_y: usize,
        buf_type: PixelType,
        buf: &[u8],
    ) -> Result<(), DatasetError> {
        if self.access == Access::ReadOnly {
            return Err(DatasetError::ReadOnly {
                identifier: self.identifier().to_string(),
            });
        }
        let span = self.layout().block_span(band, block_x, block_y)?;
        self.check_buffer(buf_type, buf.len())?;

        let disk_type = self.layout().pixel_type;
        if buf_type.is_conversion_lossy(disk_type) && self.warnings.first(buf_type, disk_type) {
            warn!(
                identifier = self.identifier(),
                from = %buf_type,
                to = %disk_type,
                "Writing {} data to a {} file: values will be clamped or rounded",
                buf_type,
                disk_type
            );
        }

        // Spans interleaved with other bands or row padding are patched in place.
        let mut raw = if span.is_dense() {
            vec![0u8; span.byte_len]
        } else {
            self.reader
                .read_exact_at(span.offset, span.byte_len)
                .await?
                .to_vec()
        };

        let row_bytes = self.layout().block_width * buf_type.size_bytes();
        let element = ElementLayout::packed(buf_type, ByteOrder::native());
        for row in 0..span.rows {
            let start = row * row_bytes;
            let src = StridedView::new(&buf[start..start + row_bytes], element);
            let mut dst = StridedViewMut::new(&mut raw[span.row_start(row)..], span.element);
            transcode(&src, &mut dst, span.columns);
        }
        if self.header.flips_sign_bit() {
            toggle_span_sign_bits(&mut raw, &span);
        }

        if self.header.tracks_value_range() {
            self.track_range(&raw, &span);
        }

        self.reader.write_all_at(span.offset, &raw).await?;
        trace!(
            identifier = self.identifier(),
            band,
            block_x,
            block_y,
            offset = span.offset,
            len = span.byte_len,
            "Wrote block"
        );
        Ok(())
    }

    /// Write a whole band from `data`, packed row by row in native order.
    pub async fn write_band(
        &mut self,
        band: usize,
        buf_type: PixelType,
        data: &[u8],
    ) -> Result<(), DatasetError> {
        let layout = self.layout().clone();
        let size = buf_type.size_bytes();
        let band_row = layout.width * size;
        let block_row = layout.block_width * size;
        let required = band_row * layout.height;
        if data.len() < required {
            return Err(DatasetError::BufferTooSmall {
                required,
                actual: data.len(),
            });
        }
        let mut block = vec![0u8; self.block_buffer_len(buf_type)];

        for block_y in 0..layout.blocks_per_column() {
            for block_x in 0..layout.blocks_per_row() {
                let span = layout.block_span(band, block_x, block_y)?;
                let valid = span.columns * size;
                for row in 0..span.rows {
                    let y = block_y * layout.block_height + row;
                    let at = y * band_row + block_x * block_row;
                    block[row * block_row..row * block_row + valid]
                        .copy_from_slice(&data[at..at + valid]);
                }
                self.write_block(band, block_x, block_y, buf_type, &block)
                    .await?;
            }
        }
        Ok(())
    }

    /// Finish writing: refresh header statistics and flush.
    ///
    /// Returns the underlying writer. Closing a read-only handle only hands
    /// the reader back.
    pub async fn close(mut self) -> Result<R, DatasetError> {
        if self.access == Access::ReadWrite {
            if let Some((min, max)) = self.value_range {
                if self.header.tracks_value_range() {
                    self.header.set_value_range(min, max);
                    self.reader.write_all_at(0, &self.header.to_bytes()).await?;
                }
            }
            self.reader.flush().await?;
            debug!(identifier = self.identifier(), "Closed dataset");
        }
        Ok(self.reader)
    }

    fn track_range(&mut self, raw: &[u8], span: &BlockSpan) {
        let nodata = self.header.nodata();
        for row in 0..span.rows {
            let view = StridedView::new(&raw[span.row_start(row)..], span.element);
            for i in 0..span.columns {
                let value = view.get(i).real();
                if value.is_nan() || Some(value) == nodata {
                    continue;
                }
                self.value_range = Some(match self.value_range {
                    Some((min, max)) => (min.min(value), max.max(value)),
                    None => (value, value),
                });
            }
        }
    }
}

/// Toggle the sign bit of every sample of the block in `raw`; samples of
/// other bands and row padding are left alone.
fn toggle_span_sign_bits(raw: &mut [u8], span: &BlockSpan) {
    for row in 0..span.rows {
        toggle_sign_bits(&mut raw[span.row_start(row)..], span.element, span.columns);
    }
}
