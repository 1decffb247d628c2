use serde::Serialize;

use crate::error::LayoutError;
use crate::pixel::{ByteOrder, ElementLayout, PixelType};

/// How samples of different bands are arranged in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Interleave {
    /// All bands of one pixel are adjacent (BIP)
    Pixel,
    /// One row of each band in turn (BIL)
    Line,
    /// Each band stored whole before the next (BSQ)
    Band,
}

/// Padding applied to the byte length of one band row.
///
/// A row of `n` bytes occupies `ceil(n / multiple) * multiple` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowAlignment {
    pub multiple: u64,
}

impl RowAlignment {
    pub const NONE: RowAlignment = RowAlignment { multiple: 1 };

    pub const fn new(multiple: u64) -> Self {
        Self { multiple }
    }

    #[inline]
    pub fn apply(&self, row_bytes: u64) -> u64 {
        self.checked_apply(row_bytes).unwrap_or(u64::MAX)
    }

    /// Like [`RowAlignment::apply`], `None` when the padded length overflows.
    pub fn checked_apply(&self, row_bytes: u64) -> Option<u64> {
        match self.multiple {
            0 | 1 => Some(row_bytes),
            m => row_bytes.div_ceil(m).checked_mul(m),
        }
    }
}

impl Default for RowAlignment {
    fn default() -> Self {
        Self::NONE
    }
}

/// Order in which image rows are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOrder {
    /// First stored row is the top (north) row
    #[default]
    TopDown,
    /// First stored row is the bottom (south) row
    BottomUp,
}

/// Raw byte location of one block of one band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    /// File offset of the first sample of the block's first stored row
    pub offset: u64,
    /// Element layout of the samples within one row
    pub element: ElementLayout,
    /// Valid columns in this block (short for the last block column)
    pub columns: usize,
    /// Valid rows in this block (short for the last block row)
    pub rows: usize,
    /// Byte distance between consecutive block rows, from the first row
    pub line_stride: u64,
    /// Bytes from `offset` to the last byte of the block
    pub byte_len: usize,
}

impl BlockSpan {
    /// Offset of row `row` relative to `offset`.
    #[inline]
    pub fn row_start(&self, row: usize) -> usize {
        row * self.line_stride as usize
    }

    /// Whether the span holds only this band's samples with no gaps, so a
    /// write can replace it without reading it first.
    pub fn is_dense(&self) -> bool {
        self.element.is_packed()
            && (self.rows <= 1
                || self.line_stride == (self.columns * self.element.pixel_type.size_bytes()) as u64)
    }
}

/// Immutable description of how a dataset's bands sit in its file.
///
/// Computed once when a dataset is opened or created and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandLayout {
    pub width: usize,
    pub height: usize,
    pub band_count: usize,
    pub pixel_type: PixelType,
    pub byte_order: ByteOrder,
    pub block_width: usize,
    pub block_height: usize,
    pub interleave: Interleave,
    pub row_order: RowOrder,
    /// File offset of the first sample of band 0
    pub image_offset: u64,
    /// Bytes between horizontally adjacent samples of one band
    pub pixel_offset: usize,
    /// Bytes between vertically adjacent samples of one band
    pub line_offset: u64,
    /// Bytes between the first samples of consecutive bands
    pub band_offset: u64,
}

impl BandLayout {
    pub fn builder(
        width: usize,
        height: usize,
        band_count: usize,
        pixel_type: PixelType,
    ) -> BandLayoutBuilder {
        BandLayoutBuilder::new(width, height, band_count, pixel_type)
    }

    /// Number of block columns.
    pub fn blocks_per_row(&self) -> usize {
        self.width.div_ceil(self.block_width)
    }

    /// Number of block rows.
    pub fn blocks_per_column(&self) -> usize {
        self.height.div_ceil(self.block_height)
    }

    /// Total number of blocks over all bands.
    pub fn block_count(&self) -> usize {
        self.band_count * self.blocks_per_row() * self.blocks_per_column()
    }

    /// Elements in one full block.
    pub fn block_len(&self) -> usize {
        self.block_width * self.block_height
    }

    /// File offset of block `(block_x, block_y)` of band `band`.
    ///
    /// For bottom-up files the offset is that of the block's stored row,
    /// which is image row `height - 1 - block_y`.
    pub fn offset_of(&self, band: usize, block_x: usize, block_y: usize) -> Result<u64, LayoutError> {
        self.check(band, block_x, block_y)?;
        let first_row = block_y * self.block_height;
        let stored_row = match self.row_order {
            RowOrder::TopDown => first_row,
            RowOrder::BottomUp => self.height - 1 - first_row,
        };
        let first_column = block_x * self.block_width;
        Ok(self.image_offset
            + band as u64 * self.band_offset
            + stored_row as u64 * self.line_offset
            + (first_column * self.pixel_offset) as u64)
    }

    /// Raw span of block `(block_x, block_y)` of band `band`.
    pub fn block_span(&self, band: usize, block_x: usize, block_y: usize) -> Result<BlockSpan, LayoutError> {
        let offset = self.offset_of(band, block_x, block_y)?;
        let columns = self.block_width.min(self.width - block_x * self.block_width);
        let rows = self.block_height.min(self.height - block_y * self.block_height);
        let element = ElementLayout::new(self.pixel_type, self.pixel_offset, self.byte_order);
        let byte_len = (rows - 1) * self.line_offset as usize + element.span(columns);
        Ok(BlockSpan {
            offset,
            element,
            columns,
            rows,
            line_stride: self.line_offset,
            byte_len,
        })
    }

    /// One past the last byte any sample occupies, including row padding of
    /// the last stored row.
    pub fn data_end(&self) -> u64 {
        self.checked_data_end().unwrap_or(u64::MAX)
    }

    /// [`BandLayout::data_end`], `None` when it does not fit in a `u64`.
    /// Every layout returned by the builder has a finite end, so offsets
    /// inside it never overflow.
    fn checked_data_end(&self) -> Option<u64> {
        if self.width == 0 || self.height == 0 || self.band_count == 0 {
            return Some(self.image_offset);
        }
        let last_column = ((self.width - 1) as u64).checked_mul(self.pixel_offset as u64)?;
        let last_sample = self
            .image_offset
            .checked_add(((self.band_count - 1) as u64).checked_mul(self.band_offset)?)?
            .checked_add(((self.height - 1) as u64).checked_mul(self.line_offset)?)?
            .checked_add(last_column)?
            .checked_add(self.pixel_type.size_bytes() as u64)?;
        let padded = match self.interleave {
            Interleave::Band => (self.band_count as u64).checked_mul(self.band_offset)?,
            Interleave::Line | Interleave::Pixel => {
                (self.height as u64).checked_mul(self.line_offset)?
            }
        };
        Some(last_sample.max(self.image_offset.checked_add(padded)?))
    }

    /// Whether one full block fits in memory arithmetic: its raw span and a
    /// caller buffer of the widest pixel type.
    fn block_fits(&self) -> bool {
        let widest = PixelType::CFloat64.size_bytes();
        let raw = usize::try_from(self.line_offset)
            .ok()
            .and_then(|line| line.checked_mul(self.block_height - 1))
            .zip(
                (self.block_width - 1)
                    .checked_mul(self.pixel_offset)
                    .and_then(|c| c.checked_add(self.pixel_type.size_bytes())),
            )
            .and_then(|(rows, columns)| rows.checked_add(columns));
        let buffer = self
            .block_width
            .checked_mul(self.block_height)
            .and_then(|len| len.checked_mul(widest));
        raw.is_some() && buffer.is_some()
    }

    fn check(&self, band: usize, block_x: usize, block_y: usize) -> Result<(), LayoutError> {
        if band >= self.band_count {
            return Err(LayoutError::BandOutOfRange {
                band,
                count: self.band_count,
            });
        }
        let per_row = self.blocks_per_row();
        if block_x >= per_row {
            return Err(LayoutError::BlockXOutOfRange {
                block_x,
                count: per_row,
            });
        }
        let per_column = self.blocks_per_column();
        if block_y >= per_column {
            return Err(LayoutError::BlockYOutOfRange {
                block_y,
                count: per_column,
            });
        }
        Ok(())
    }
}

/// Builder for [`BandLayout`].
///
/// Strides follow from the interleave and alignment unless set explicitly
/// with [`BandLayoutBuilder::offsets`]. Blocks default to single full rows.
#[derive(Debug, Clone)]
pub struct BandLayoutBuilder {
    width: usize,
    height: usize,
    band_count: usize,
    pixel_type: PixelType,
    byte_order: ByteOrder,
    interleave: Interleave,
    alignment: RowAlignment,
    row_order: RowOrder,
    image_offset: u64,
    block_width: Option<usize>,
    block_height: usize,
    offsets: Option<(usize, u64, u64)>,
}

impl BandLayoutBuilder {
    pub fn new(width: usize, height: usize, band_count: usize, pixel_type: PixelType) -> Self {
        Self {
            width,
            height,
            band_count,
            pixel_type,
            byte_order: ByteOrder::native(),
            interleave: Interleave::Band,
            alignment: RowAlignment::NONE,
            row_order: RowOrder::TopDown,
            image_offset: 0,
            block_width: None,
            block_height: 1,
            offsets: None,
        }
    }

    pub fn byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn interleave(mut self, interleave: Interleave) -> Self {
        self.interleave = interleave;
        self
    }

    pub fn row_alignment(mut self, alignment: RowAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn row_order(mut self, row_order: RowOrder) -> Self {
        self.row_order = row_order;
        self
    }

    pub fn image_offset(mut self, offset: u64) -> Self {
        self.image_offset = offset;
        self
    }

    pub fn block_size(mut self, block_width: usize, block_height: usize) -> Self {
        self.block_width = Some(block_width);
        self.block_height = block_height;
        self
    }

    /// Set pixel, line and band offsets directly.
    pub fn offsets(mut self, pixel_offset: usize, line_offset: u64, band_offset: u64) -> Self {
        self.offsets = Some((pixel_offset, line_offset, band_offset));
        self
    }

    pub fn build(self) -> Result<BandLayout, LayoutError> {
        if self.width == 0 || self.height == 0 || self.band_count == 0 {
            return Err(LayoutError::InvalidDimensions(format!(
                "{}x{} with {} band(s)",
                self.width, self.height, self.band_count
            )));
        }
        let block_width = self.block_width.unwrap_or(self.width);
        if block_width == 0 || self.block_height == 0 {
            return Err(LayoutError::InvalidDimensions(format!(
                "block {}x{}",
                block_width, self.block_height
            )));
        }
        if self.row_order == RowOrder::BottomUp && self.block_height != 1 {
            return Err(LayoutError::InvalidDimensions(
                "bottom-up rows need single-row blocks".to_string(),
            ));
        }

        let size = self.pixel_type.size_bytes();
        let (pixel_offset, line_offset, band_offset) = match self.offsets {
            Some(offsets) => offsets,
            None => self.derived_offsets(size).ok_or_else(|| {
                LayoutError::InvalidDimensions(format!(
                    "{}x{} with {} band(s) overflows the addressable size",
                    self.width, self.height, self.band_count
                ))
            })?,
        };
        if pixel_offset < size {
            return Err(LayoutError::InvalidDimensions(format!(
                "pixel offset {} is smaller than the {} byte sample",
                pixel_offset, size
            )));
        }

        let layout = BandLayout {
            width: self.width,
            height: self.height,
            band_count: self.band_count,
            pixel_type: self.pixel_type,
            byte_order: self.byte_order,
            block_width,
            block_height: self.block_height,
            interleave: self.interleave,
            row_order: self.row_order,
            image_offset: self.image_offset,
            pixel_offset,
            line_offset,
            band_offset,
        };
        let block_count = layout
            .blocks_per_row()
            .checked_mul(layout.blocks_per_column())
            .and_then(|n| n.checked_mul(layout.band_count));
        if layout.checked_data_end().is_none() || !layout.block_fits() || block_count.is_none() {
            return Err(LayoutError::InvalidDimensions(format!(
                "{}x{} with {} band(s) overflows the addressable size",
                layout.width, layout.height, layout.band_count
            )));
        }
        Ok(layout)
    }

    /// Strides implied by the interleave and alignment.
    fn derived_offsets(&self, size: usize) -> Option<(usize, u64, u64)> {
        let bands = self.band_count as u64;
        let row_bytes = u64::try_from(self.width.checked_mul(size)?).ok()?;
        match self.interleave {
            Interleave::Pixel => {
                let line = self.alignment.checked_apply(row_bytes.checked_mul(bands)?)?;
                Some((size.checked_mul(self.band_count)?, line, size as u64))
            }
            Interleave::Line => {
                let band_row = self.alignment.checked_apply(row_bytes)?;
                Some((size, band_row.checked_mul(bands)?, band_row))
            }
            Interleave::Band => {
                let line = self.alignment.checked_apply(row_bytes)?;
                Some((size, line, line.checked_mul(self.height as u64)?))
            }
        }
    }
}
