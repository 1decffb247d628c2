//! Clamp/round policy and the pairwise dispatch tables.
//!
//! Every ordered pair of pixel types resolves to one monomorphised function
//! through a table indexed by [`PixelType::index`]. Adding a pixel type
//! without extending [`PixelType::index`] fails to compile; a row or column
//! missing from a table fails to compile because the table length is
//! [`PixelType::COUNT`].
//!
//! The rules, applied per component:
//!
//! - integer to integer: exact when representable, otherwise clamped
//! - integer to float: nearest representable float, never clamped
//! - float to integer: round to nearest, ties away from zero, then clamp;
//!   NaN becomes zero
//! - float to float: IEEE widening/narrowing
//! - complex to real keeps the real part, real to complex sets the
//!   imaginary part to zero, complex to complex converts both parts

use num_complex::Complex;

use super::sample::Sample;
use super::{ByteOrder, PixelType, TypedValue};

/// Convert one sample to another sample type.
#[inline(always)]
pub fn convert_sample<S: Sample, D: Sample>(value: S) -> D {
    let (re, im) = value.parts();
    D::from_parts(re, im)
}

type ScalarFn = fn(TypedValue) -> TypedValue;

fn convert_value<S: Sample, D: Sample>(value: TypedValue) -> TypedValue {
    match S::from_value(value) {
        Some(sample) => convert_sample::<S, D>(sample).into_value(),
        None => unreachable!(
            "dispatch row for {} received a {} value",
            S::PIXEL_TYPE,
            value.pixel_type()
        ),
    }
}

/// Raw element conversion between two strided byte spans.
pub(crate) type Kernel = fn(&[u8], Words, &mut [u8], Words, usize);

/// Conversion inside a single buffer, front to back.
pub(crate) type InPlaceKernel = fn(&mut [u8], Words, Words, usize);

/// Stride and byte order of one side of a kernel call.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Words {
    pub stride: usize,
    pub order: ByteOrder,
}

fn kernel<S: Sample, D: Sample>(src: &[u8], from: Words, dst: &mut [u8], to: Words, count: usize) {
    for i in 0..count {
        let value = S::decode(&src[i * from.stride..], from.order);
        convert_sample::<S, D>(value).encode(&mut dst[i * to.stride..], to.order);
    }
}

fn in_place_kernel<S: Sample, D: Sample>(buf: &mut [u8], from: Words, to: Words, count: usize) {
    for i in 0..count {
        let value = S::decode(&buf[i * from.stride..], from.order);
        convert_sample::<S, D>(value).encode(&mut buf[i * to.stride..], to.order);
    }
}

// Rows and columns follow `PixelType::ALL`.
macro_rules! dispatch_table {
    ($f:ident) => {
        [
            dispatch_table!(@row $f, u8),
            dispatch_table!(@row $f, u16),
            dispatch_table!(@row $f, i16),
            dispatch_table!(@row $f, u32),
            dispatch_table!(@row $f, i32),
            dispatch_table!(@row $f, f32),
            dispatch_table!(@row $f, f64),
            dispatch_table!(@row $f, Complex<i16>),
            dispatch_table!(@row $f, Complex<i32>),
            dispatch_table!(@row $f, Complex<f32>),
            dispatch_table!(@row $f, Complex<f64>),
        ]
    };
    (@row $f:ident, $s:ty) => {
        [
            $f::<$s, u8>,
            $f::<$s, u16>,
            $f::<$s, i16>,
            $f::<$s, u32>,
            $f::<$s, i32>,
            $f::<$s, f32>,
            $f::<$s, f64>,
            $f::<$s, Complex<i16>>,
            $f::<$s, Complex<i32>>,
            $f::<$s, Complex<f32>>,
            $f::<$s, Complex<f64>>,
        ]
    };
}

static SCALAR_TABLE: [[ScalarFn; PixelType::COUNT]; PixelType::COUNT] =
    dispatch_table!(convert_value);

static KERNEL_TABLE: [[Kernel; PixelType::COUNT]; PixelType::COUNT] = dispatch_table!(kernel);

static IN_PLACE_TABLE: [[InPlaceKernel; PixelType::COUNT]; PixelType::COUNT] =
    dispatch_table!(in_place_kernel);

/// Convert a single value to `to`.
///
/// This is the scalar form of the transcoder, for header fields and nodata
/// sentinels.
#[inline]
pub fn convert(value: TypedValue, to: PixelType) -> TypedValue {
    SCALAR_TABLE[value.pixel_type().index()][to.index()](value)
}

#[inline]
pub(crate) fn kernel_for(from: PixelType, to: PixelType) -> Kernel {
    KERNEL_TABLE[from.index()][to.index()]
}

#[inline]
pub(crate) fn in_place_kernel_for(from: PixelType, to: PixelType) -> InPlaceKernel {
    IN_PLACE_TABLE[from.index()][to.index()]
}
