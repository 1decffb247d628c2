//! Pixel type vocabulary.
//!
//! [`PixelType`] enumerates the numeric encodings a raster band can use on
//! disk or in memory. Besides sizes and classification, this module answers
//! the type-algebra questions drivers ask when creating datasets: which type
//! can hold two others ([`PixelType::union`]), which type a value needs
//! ([`PixelType::for_value`]), and whether a conversion can lose information.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// PixelType
// =============================================================================

/// Numeric encoding of one pixel.
///
/// Complex types store two adjacent components (real, then imaginary) of
/// their base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelType {
    /// Unsigned 8-bit integer
    Byte,
    /// Unsigned 16-bit integer
    UInt16,
    /// Signed 16-bit integer
    Int16,
    /// Unsigned 32-bit integer
    UInt32,
    /// Signed 32-bit integer
    Int32,
    /// 32-bit IEEE float
    Float32,
    /// 64-bit IEEE float
    Float64,
    /// Complex of two signed 16-bit integers
    CInt16,
    /// Complex of two signed 32-bit integers
    CInt32,
    /// Complex of two 32-bit floats
    CFloat32,
    /// Complex of two 64-bit floats
    CFloat64,
}

/// Error returned when a pixel type name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown pixel type: {0}")]
pub struct ParsePixelTypeError(pub String);

impl PixelType {
    /// Number of pixel types.
    pub const COUNT: usize = 11;

    /// Every pixel type, ordered by [`PixelType::index`].
    pub const ALL: [PixelType; Self::COUNT] = [
        PixelType::Byte,
        PixelType::UInt16,
        PixelType::Int16,
        PixelType::UInt32,
        PixelType::Int32,
        PixelType::Float32,
        PixelType::Float64,
        PixelType::CInt16,
        PixelType::CInt32,
        PixelType::CFloat32,
        PixelType::CFloat64,
    ];

    /// Position of this type in [`PixelType::ALL`] and in the conversion
    /// dispatch tables.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            PixelType::Byte => 0,
            PixelType::UInt16 => 1,
            PixelType::Int16 => 2,
            PixelType::UInt32 => 3,
            PixelType::Int32 => 4,
            PixelType::Float32 => 5,
            PixelType::Float64 => 6,
            PixelType::CInt16 => 7,
            PixelType::CInt32 => 8,
            PixelType::CFloat32 => 9,
            PixelType::CFloat64 => 10,
        }
    }

    /// Size of one pixel in bytes (both components for complex types).
    #[inline]
    pub const fn size_bytes(self) -> usize {
        match self {
            PixelType::Byte => 1,
            PixelType::UInt16 | PixelType::Int16 => 2,
            PixelType::UInt32 | PixelType::Int32 | PixelType::Float32 | PixelType::CInt16 => 4,
            PixelType::Float64 | PixelType::CInt32 | PixelType::CFloat32 => 8,
            PixelType::CFloat64 => 16,
        }
    }

    /// Size of one pixel in bits.
    #[inline]
    pub const fn size_bits(self) -> usize {
        self.size_bytes() * 8
    }

    /// Size of one component in bytes. Equal to [`size_bytes`](Self::size_bytes)
    /// for real types.
    #[inline]
    pub const fn component_size_bytes(self) -> usize {
        self.component_type().size_bytes()
    }

    /// Whether the type carries an imaginary component.
    #[inline]
    pub const fn is_complex(self) -> bool {
        matches!(
            self,
            PixelType::CInt16 | PixelType::CInt32 | PixelType::CFloat32 | PixelType::CFloat64
        )
    }

    /// Whether the type is floating point (real or complex).
    #[inline]
    pub const fn is_floating(self) -> bool {
        matches!(
            self,
            PixelType::Float32 | PixelType::Float64 | PixelType::CFloat32 | PixelType::CFloat64
        )
    }

    /// Whether the type is an integer type (real or complex).
    #[inline]
    pub const fn is_integer(self) -> bool {
        !self.is_floating()
    }

    /// Whether the type can represent negative values.
    #[inline]
    pub const fn is_signed(self) -> bool {
        !matches!(self, PixelType::Byte | PixelType::UInt16 | PixelType::UInt32)
    }

    /// Base real type of a complex type; real types return themselves.
    #[inline]
    pub const fn component_type(self) -> PixelType {
        match self {
            PixelType::CInt16 => PixelType::Int16,
            PixelType::CInt32 => PixelType::Int32,
            PixelType::CFloat32 => PixelType::Float32,
            PixelType::CFloat64 => PixelType::Float64,
            other => other,
        }
    }

    /// Symbolic name, e.g. `"Byte"` or `"CFloat32"`.
    pub const fn name(self) -> &'static str {
        match self {
            PixelType::Byte => "Byte",
            PixelType::UInt16 => "UInt16",
            PixelType::Int16 => "Int16",
            PixelType::UInt32 => "UInt32",
            PixelType::Int32 => "Int32",
            PixelType::Float32 => "Float32",
            PixelType::Float64 => "Float64",
            PixelType::CInt16 => "CInt16",
            PixelType::CInt32 => "CInt32",
            PixelType::CFloat32 => "CFloat32",
            PixelType::CFloat64 => "CFloat64",
        }
    }

    /// Smallest type able to express every value of both `self` and `other`.
    pub fn union(self, other: PixelType) -> PixelType {
        let bits = [
            self.component_type().size_bits(),
            other.component_type().size_bits(),
        ];
        let signed = [self.is_signed(), other.is_signed()];
        let floating = [self.is_floating(), other.is_floating()];

        let min_bits = if floating[0] != floating[1] {
            // An integer needs twice its width to fit exactly in a float.
            let (float_idx, int_idx) = if floating[0] { (0, 1) } else { (1, 0) };
            bits[float_idx].max(2 * bits[int_idx])
        } else if signed[0] != signed[1] {
            let (signed_idx, unsigned_idx) = if signed[0] { (0, 1) } else { (1, 0) };
            bits[signed_idx].max(2 * bits[unsigned_idx])
        } else {
            bits[0].max(bits[1])
        };

        PixelType::find(
            min_bits,
            signed[0] || signed[1],
            floating[0] || floating[1],
            self.is_complex() || other.is_complex(),
        )
    }

    /// Smallest type meeting the given requirements.
    ///
    /// There are no unsigned complex types, so complex unsigned requirements
    /// are promoted to the next signed width.
    pub fn find(bits: usize, signed: bool, floating: bool, complex: bool) -> PixelType {
        let mut bits = bits;
        if signed {
            bits = bits.max(16);
        }
        if complex {
            bits = bits.max(if signed { 16 } else { 32 });
        }
        if floating {
            bits = bits.max(32);
        }

        if bits <= 8 {
            return PixelType::Byte;
        }

        if bits <= 16 {
            return match (complex, signed) {
                (true, _) => PixelType::CInt16,
                (false, true) => PixelType::Int16,
                (false, false) => PixelType::UInt16,
            };
        }

        if bits <= 32 {
            return match (floating, complex, signed) {
                (true, true, _) => PixelType::CFloat32,
                (true, false, _) => PixelType::Float32,
                (false, true, _) => PixelType::CInt32,
                (false, false, true) => PixelType::Int32,
                (false, false, false) => PixelType::UInt32,
            };
        }

        if complex {
            PixelType::CFloat64
        } else {
            PixelType::Float64
        }
    }

    /// Smallest type able to hold `value` exactly.
    pub fn for_value(value: f64, complex: bool) -> PixelType {
        let floating = value.round() != value;
        let signed = floating || value < 0.0;
        PixelType::find(min_bits_for_value(value), signed, floating, complex)
    }

    /// Whether converting from `self` to `to` can lose information.
    pub fn is_conversion_lossy(self, to: PixelType) -> bool {
        if self.is_complex() && !to.is_complex() {
            return true;
        }

        let from = self.component_type();
        let to = to.component_type();

        if to.is_integer() {
            if from.is_floating() {
                return true;
            }
            if from.is_signed() && !to.is_signed() {
                return true;
            }
            let (from_bits, to_bits) = (from.size_bits(), to.size_bits());
            if from_bits > to_bits {
                return true;
            }
            return from_bits == to_bits && !from.is_signed() && to.is_signed();
        }

        to == PixelType::Float32
            && matches!(
                from,
                PixelType::Int32 | PixelType::UInt32 | PixelType::Float64
            )
    }

    /// Adjust a value so it is representable in this type.
    ///
    /// Integer types clamp to their range and round to the nearest integer
    /// (ties away from zero, the same rule as pixel conversion). `Float32`
    /// clamps finite values to `±f32::MAX` and drops precision. `Float64`
    /// leaves the value untouched. Complex types adjust by their component
    /// type.
    pub fn adjust_value(self, value: f64) -> Adjusted {
        let ty = self.component_type();
        let mut adjusted = Adjusted {
            value,
            clamped: false,
            rounded: false,
        };

        let (min, max) = match ty {
            PixelType::Byte => (u8::MIN as f64, u8::MAX as f64),
            PixelType::UInt16 => (u16::MIN as f64, u16::MAX as f64),
            PixelType::Int16 => (i16::MIN as f64, i16::MAX as f64),
            PixelType::UInt32 => (u32::MIN as f64, u32::MAX as f64),
            PixelType::Int32 => (i32::MIN as f64, i32::MAX as f64),
            PixelType::Float32 => {
                if !value.is_finite() {
                    return adjusted;
                }
                let max = f32::MAX as f64;
                if value < -max {
                    adjusted.clamped = true;
                    adjusted.value = -max;
                } else if value > max {
                    adjusted.clamped = true;
                    adjusted.value = max;
                } else {
                    adjusted.value = value as f32 as f64;
                }
                return adjusted;
            }
            _ => return adjusted,
        };

        if value < min {
            adjusted.clamped = true;
            adjusted.value = min;
        } else if value > max {
            adjusted.clamped = true;
            adjusted.value = max;
        } else if value.round() != value {
            adjusted.rounded = true;
            adjusted.value = if value.is_nan() { 0.0 } else { value.round() };
        }

        adjusted
    }
}

/// Result of [`PixelType::adjust_value`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjusted {
    /// The representable value
    pub value: f64,
    /// Whether the input was outside the type's range
    pub clamped: bool,
    /// Whether the input had a fractional part that was rounded away
    pub rounded: bool,
}

fn min_bits_for_value(value: f64) -> usize {
    if value.round() == value {
        let fits = |min: f64, max: f64| value >= min && value <= max;
        if fits(u8::MIN as f64, u8::MAX as f64) {
            return 8;
        }
        if fits(i16::MIN as f64, i16::MAX as f64) || fits(u16::MIN as f64, u16::MAX as f64) {
            return 16;
        }
        if fits(i32::MIN as f64, i32::MAX as f64) || fits(u32::MIN as f64, u32::MAX as f64) {
            return 32;
        }
    } else if (value as f32) as f64 == value {
        return 32;
    }
    64
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelType {
    type Err = ParsePixelTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PixelType::ALL
            .iter()
            .copied()
            .find(|ty| ty.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParsePixelTypeError(s.to_string()))
    }
}
