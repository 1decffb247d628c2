use num_complex::Complex;

use super::sample::Sample;
use super::{ByteOrder, PixelType};

/// One pixel value tagged with its type.
///
/// Replaces reinterpreting raw buffer bytes through typed pointers: a value
/// is decoded once through a byte-order-aware accessor and then carried with
/// its discriminant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypedValue {
    Byte(u8),
    UInt16(u16),
    Int16(i16),
    UInt32(u32),
    Int32(i32),
    Float32(f32),
    Float64(f64),
    CInt16(Complex<i16>),
    CInt32(Complex<i32>),
    CFloat32(Complex<f32>),
    CFloat64(Complex<f64>),
}

impl TypedValue {
    /// The type tag of this value.
    pub const fn pixel_type(&self) -> PixelType {
        match self {
            TypedValue::Byte(_) => PixelType::Byte,
            TypedValue::UInt16(_) => PixelType::UInt16,
            TypedValue::Int16(_) => PixelType::Int16,
            TypedValue::UInt32(_) => PixelType::UInt32,
            TypedValue::Int32(_) => PixelType::Int32,
            TypedValue::Float32(_) => PixelType::Float32,
            TypedValue::Float64(_) => PixelType::Float64,
            TypedValue::CInt16(_) => PixelType::CInt16,
            TypedValue::CInt32(_) => PixelType::CInt32,
            TypedValue::CFloat32(_) => PixelType::CFloat32,
            TypedValue::CFloat64(_) => PixelType::CFloat64,
        }
    }

    /// Zero of the given type.
    pub fn zero(pixel_type: PixelType) -> Self {
        TypedValue::Byte(0).convert(pixel_type)
    }

    /// Decode one value of `pixel_type` from the start of `bytes`.
    ///
    /// # Panics
    /// Panics if `bytes` is shorter than the type's width.
    pub fn decode(pixel_type: PixelType, bytes: &[u8], order: ByteOrder) -> Self {
        match pixel_type {
            PixelType::Byte => u8::decode(bytes, order).into_value(),
            PixelType::UInt16 => u16::decode(bytes, order).into_value(),
            PixelType::Int16 => i16::decode(bytes, order).into_value(),
            PixelType::UInt32 => u32::decode(bytes, order).into_value(),
            PixelType::Int32 => i32::decode(bytes, order).into_value(),
            PixelType::Float32 => f32::decode(bytes, order).into_value(),
            PixelType::Float64 => f64::decode(bytes, order).into_value(),
            PixelType::CInt16 => Complex::<i16>::decode(bytes, order).into_value(),
            PixelType::CInt32 => Complex::<i32>::decode(bytes, order).into_value(),
            PixelType::CFloat32 => Complex::<f32>::decode(bytes, order).into_value(),
            PixelType::CFloat64 => Complex::<f64>::decode(bytes, order).into_value(),
        }
    }

    /// Encode this value at the start of `bytes`.
    ///
    /// # Panics
    /// Panics if `bytes` is shorter than the type's width.
    pub fn encode(self, bytes: &mut [u8], order: ByteOrder) {
        match self {
            TypedValue::Byte(v) => v.encode(bytes, order),
            TypedValue::UInt16(v) => v.encode(bytes, order),
            TypedValue::Int16(v) => v.encode(bytes, order),
            TypedValue::UInt32(v) => v.encode(bytes, order),
            TypedValue::Int32(v) => v.encode(bytes, order),
            TypedValue::Float32(v) => v.encode(bytes, order),
            TypedValue::Float64(v) => v.encode(bytes, order),
            TypedValue::CInt16(v) => v.encode(bytes, order),
            TypedValue::CInt32(v) => v.encode(bytes, order),
            TypedValue::CFloat32(v) => v.encode(bytes, order),
            TypedValue::CFloat64(v) => v.encode(bytes, order),
        }
    }

    /// Convert to `to` under the clamp/round policy.
    #[inline]
    pub fn convert(self, to: PixelType) -> TypedValue {
        super::convert(self, to)
    }

    /// Real part as `f64` (exact for every type).
    pub fn real(&self) -> f64 {
        match *self {
            TypedValue::Byte(v) => v.into(),
            TypedValue::UInt16(v) => v.into(),
            TypedValue::Int16(v) => v.into(),
            TypedValue::UInt32(v) => v.into(),
            TypedValue::Int32(v) => v.into(),
            TypedValue::Float32(v) => v.into(),
            TypedValue::Float64(v) => v,
            TypedValue::CInt16(v) => v.re.into(),
            TypedValue::CInt32(v) => v.re.into(),
            TypedValue::CFloat32(v) => v.re.into(),
            TypedValue::CFloat64(v) => v.re,
        }
    }

    /// Imaginary part as `f64`; zero for real types.
    pub fn imag(&self) -> f64 {
        match *self {
            TypedValue::CInt16(v) => v.im.into(),
            TypedValue::CInt32(v) => v.im.into(),
            TypedValue::CFloat32(v) => v.im.into(),
            TypedValue::CFloat64(v) => v.im,
            _ => 0.0,
        }
    }
}

macro_rules! from_primitive {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for TypedValue {
                fn from(value: $t) -> Self {
                    TypedValue::$variant(value)
                }
            }
        )*
    };
}

from_primitive! {
    u8 => Byte,
    u16 => UInt16,
    i16 => Int16,
    u32 => UInt32,
    i32 => Int32,
    f32 => Float32,
    f64 => Float64,
    Complex<i16> => CInt16,
    Complex<i32> => CInt32,
    Complex<f32> => CFloat32,
    Complex<f64> => CFloat64,
}
