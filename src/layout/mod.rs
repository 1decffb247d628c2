//! Band layout descriptors: where each block of each band lives in a file.

mod band_layout;

pub use band_layout::{
    BandLayout, BandLayoutBuilder, BlockSpan, Interleave, RowAlignment, RowOrder,
};
