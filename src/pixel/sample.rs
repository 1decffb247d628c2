//! Typed access to pixel components.
//!
//! [`Component`] covers the seven real scalar types; [`Sample`] covers every
//! pixel type, including complex pairs built from a component. The
//! conversion kernels are generic over a `(Sample, Sample)` pair and are
//! monomorphised once per pair, so no type tag is inspected per element.

use num_complex::Complex;
use num_traits::{AsPrimitive, Bounded};

use super::{ByteOrder, PixelType, TypedValue};

/// Intermediate form of one component during conversion.
///
/// `i64` holds every integer component exactly and `f64` holds every float
/// component exactly, so the intermediate never loses information.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
}

/// A real scalar component type.
pub trait Component: Copy + Send + Sync + 'static {
    /// Real pixel type made of exactly one of these components.
    const PIXEL_TYPE: PixelType;

    /// Size in bytes.
    const SIZE: usize;

    fn read(bytes: &[u8], order: ByteOrder) -> Self;

    fn write(self, bytes: &mut [u8], order: ByteOrder);

    fn to_scalar(self) -> Scalar;

    /// Convert an integer, clamping to this type's range.
    fn from_int(value: i64) -> Self;

    /// Convert a float, rounding to nearest (ties away from zero) and
    /// clamping for integer types; NaN becomes zero.
    fn from_float(value: f64) -> Self;

    #[inline]
    fn from_scalar(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Int(v) => Self::from_int(v),
            Scalar::Float(v) => Self::from_float(v),
        }
    }
}

/// A component that also has a complex pixel type.
pub trait ComplexComponent: Component {
    const COMPLEX_TYPE: PixelType;

    fn wrap(value: Complex<Self>) -> TypedValue;

    fn unwrap(value: TypedValue) -> Option<Complex<Self>>;
}

/// Any pixel: a real component or a complex pair.
pub trait Sample: Copy + Send + Sync + 'static {
    const PIXEL_TYPE: PixelType;

    fn decode(bytes: &[u8], order: ByteOrder) -> Self;

    fn encode(self, bytes: &mut [u8], order: ByteOrder);

    /// Real and imaginary parts; real samples report an integer zero
    /// imaginary part.
    fn parts(self) -> (Scalar, Scalar);

    /// Build from parts; real samples ignore the imaginary part.
    fn from_parts(re: Scalar, im: Scalar) -> Self;

    fn into_value(self) -> TypedValue;

    fn from_value(value: TypedValue) -> Option<Self>;
}

#[inline]
fn saturate<T>(value: i64) -> T
where
    T: Bounded + AsPrimitive<i64>,
    i64: AsPrimitive<T>,
{
    value
        .clamp(T::min_value().as_(), T::max_value().as_())
        .as_()
}

macro_rules! integer_component {
    ($t:ty, $variant:ident) => {
        impl Component for $t {
            const PIXEL_TYPE: PixelType = PixelType::$variant;
            const SIZE: usize = std::mem::size_of::<$t>();

            #[inline]
            fn read(bytes: &[u8], order: ByteOrder) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(&bytes[..Self::SIZE]);
                match order {
                    ByteOrder::LittleEndian => <$t>::from_le_bytes(raw),
                    ByteOrder::BigEndian => <$t>::from_be_bytes(raw),
                }
            }

            #[inline]
            fn write(self, bytes: &mut [u8], order: ByteOrder) {
                let raw = match order {
                    ByteOrder::LittleEndian => self.to_le_bytes(),
                    ByteOrder::BigEndian => self.to_be_bytes(),
                };
                bytes[..Self::SIZE].copy_from_slice(&raw);
            }

            #[inline]
            fn to_scalar(self) -> Scalar {
                Scalar::Int(i64::from(self))
            }

            #[inline]
            fn from_int(value: i64) -> Self {
                saturate::<$t>(value)
            }

            #[inline]
            fn from_float(value: f64) -> Self {
                // `as` from float to int saturates at the bounds and maps NaN to 0.
                value.round().as_()
            }
        }
    };
}

macro_rules! float_component {
    ($t:ty, $read:ident, $write:ident, $variant:ident) => {
        impl Component for $t {
            const PIXEL_TYPE: PixelType = PixelType::$variant;
            const SIZE: usize = std::mem::size_of::<$t>();

            #[inline]
            fn read(bytes: &[u8], order: ByteOrder) -> Self {
                <$t>::from_bits(order.$read(bytes))
            }

            #[inline]
            fn write(self, bytes: &mut [u8], order: ByteOrder) {
                order.$write(bytes, self.to_bits())
            }

            #[inline]
            fn to_scalar(self) -> Scalar {
                Scalar::Float(f64::from(self))
            }

            #[inline]
            fn from_int(value: i64) -> Self {
                value.as_()
            }

            #[inline]
            fn from_float(value: f64) -> Self {
                value.as_()
            }
        }
    };
}

integer_component!(u8, Byte);
integer_component!(u16, UInt16);
integer_component!(i16, Int16);
integer_component!(u32, UInt32);
integer_component!(i32, Int32);
float_component!(f32, read_u32, write_u32, Float32);
float_component!(f64, read_u64, write_u64, Float64);

macro_rules! real_sample {
    ($t:ty, $variant:ident) => {
        impl Sample for $t {
            const PIXEL_TYPE: PixelType = PixelType::$variant;

            #[inline]
            fn decode(bytes: &[u8], order: ByteOrder) -> Self {
                <$t as Component>::read(bytes, order)
            }

            #[inline]
            fn encode(self, bytes: &mut [u8], order: ByteOrder) {
                <$t as Component>::write(self, bytes, order)
            }

            #[inline]
            fn parts(self) -> (Scalar, Scalar) {
                (self.to_scalar(), Scalar::Int(0))
            }

            #[inline]
            fn from_parts(re: Scalar, _im: Scalar) -> Self {
                <$t as Component>::from_scalar(re)
            }

            #[inline]
            fn into_value(self) -> TypedValue {
                TypedValue::$variant(self)
            }

            #[inline]
            fn from_value(value: TypedValue) -> Option<Self> {
                match value {
                    TypedValue::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

real_sample!(u8, Byte);
real_sample!(u16, UInt16);
real_sample!(i16, Int16);
real_sample!(u32, UInt32);
real_sample!(i32, Int32);
real_sample!(f32, Float32);
real_sample!(f64, Float64);

macro_rules! complex_component {
    ($t:ty, $variant:ident) => {
        impl ComplexComponent for $t {
            const COMPLEX_TYPE: PixelType = PixelType::$variant;

            #[inline]
            fn wrap(value: Complex<Self>) -> TypedValue {
                TypedValue::$variant(value)
            }

            #[inline]
            fn unwrap(value: TypedValue) -> Option<Complex<Self>> {
                match value {
                    TypedValue::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

complex_component!(i16, CInt16);
complex_component!(i32, CInt32);
complex_component!(f32, CFloat32);
complex_component!(f64, CFloat64);

impl<T: ComplexComponent> Sample for Complex<T> {
    const PIXEL_TYPE: PixelType = T::COMPLEX_TYPE;

    #[inline]
    fn decode(bytes: &[u8], order: ByteOrder) -> Self {
        Complex::new(T::read(bytes, order), T::read(&bytes[T::SIZE..], order))
    }

    #[inline]
    fn encode(self, bytes: &mut [u8], order: ByteOrder) {
        self.re.write(bytes, order);
        self.im.write(&mut bytes[T::SIZE..], order);
    }

    #[inline]
    fn parts(self) -> (Scalar, Scalar) {
        (self.re.to_scalar(), self.im.to_scalar())
    }

    #[inline]
    fn from_parts(re: Scalar, im: Scalar) -> Self {
        Complex::new(T::from_scalar(re), T::from_scalar(im))
    }

    #[inline]
    fn into_value(self) -> TypedValue {
        T::wrap(self)
    }

    #[inline]
    fn from_value(value: TypedValue) -> Option<Self> {
        T::unwrap(value)
    }
}
