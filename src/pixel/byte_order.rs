use serde::{Deserialize, Serialize};

use crate::io::{read_u16_be, read_u16_le, read_u32_be, read_u32_le, read_u64_be, read_u64_le};

/// Byte order (endianness) of multi-byte values in a file or buffer.
///
/// Fixed per dataset when it is opened. Every typed access goes through a
/// strided view parameterized by one of these, so drivers never swap bytes
/// by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Least significant byte first
    LittleEndian,
    /// Most significant byte first
    BigEndian,
}

impl ByteOrder {
    /// Byte order of the host CPU.
    #[inline]
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }

    /// Whether values in this order must be swapped to be used natively.
    #[inline]
    pub fn is_native(self) -> bool {
        self == Self::native()
    }

    /// Read a u16 from a byte slice using this byte order.
    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        match self {
            ByteOrder::LittleEndian => read_u16_le(bytes),
            ByteOrder::BigEndian => read_u16_be(bytes),
        }
    }

    /// Read a u32 from a byte slice using this byte order.
    #[inline]
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        match self {
            ByteOrder::LittleEndian => read_u32_le(bytes),
            ByteOrder::BigEndian => read_u32_be(bytes),
        }
    }

    /// Read a u64 from a byte slice using this byte order.
    #[inline]
    pub fn read_u64(self, bytes: &[u8]) -> u64 {
        match self {
            ByteOrder::LittleEndian => read_u64_le(bytes),
            ByteOrder::BigEndian => read_u64_be(bytes),
        }
    }

    #[inline]
    pub fn read_i32(self, bytes: &[u8]) -> i32 {
        self.read_u32(bytes) as i32
    }

    #[inline]
    pub fn read_f64(self, bytes: &[u8]) -> f64 {
        f64::from_bits(self.read_u64(bytes))
    }

    /// Write a u32 into the first four bytes of `bytes`.
    #[inline]
    pub fn write_u32(self, bytes: &mut [u8], value: u32) {
        let raw = match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        };
        bytes[..4].copy_from_slice(&raw);
    }

    #[inline]
    pub fn write_i32(self, bytes: &mut [u8], value: i32) {
        self.write_u32(bytes, value as u32);
    }

    /// Write a u64 into the first eight bytes of `bytes`.
    #[inline]
    pub fn write_u64(self, bytes: &mut [u8], value: u64) {
        let raw = match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        };
        bytes[..8].copy_from_slice(&raw);
    }

    #[inline]
    pub fn write_f64(self, bytes: &mut [u8], value: f64) {
        self.write_u64(bytes, value.to_bits());
    }
}
