//! Typed pixel values and the block transcoder.
//!
//! This module is pure computation: it never performs I/O and never
//! allocates buffers on behalf of callers.
//!
//! - [`PixelType`]: the eleven supported numeric encodings
//! - [`TypedValue`]: one decoded pixel, tagged with its type
//! - [`convert`]: the clamp/round policy for a single value
//! - [`StridedView`] / [`StridedViewMut`]: element access over raw bytes
//! - [`transcode`]: element-wise conversion between two views

mod bits;
mod byte_order;
mod convert;
mod nodata;
pub mod sample;
mod swap;
mod transcode;
mod types;
mod value;
mod view;

pub use bits::copy_bits;
pub use byte_order::ByteOrder;
pub use convert::{convert, convert_sample};
pub use nodata::has_only_nodata;
pub use swap::{swap_words, toggle_sign_bits};
pub use transcode::{replicate, transcode, transcode_in_place};
pub use types::{Adjusted, ParsePixelTypeError, PixelType};
pub use value::TypedValue;
pub use view::{ElementLayout, StridedView, StridedViewMut};
