use super::{ByteOrder, ElementLayout};

/// Reverse the bytes of `count` words of `word_size` bytes, in place.
///
/// Word `i` starts at byte `i * stride`. Single-byte words are left alone.
/// Words need no particular alignment.
///
/// # Panics
/// Panics if `stride < word_size` while more than one word is swapped, or if
/// the buffer is too short.
pub fn swap_words(buf: &mut [u8], word_size: usize, count: usize, stride: usize) {
    if word_size <= 1 || count == 0 {
        return;
    }
    assert!(
        stride >= word_size || count == 1,
        "word stride {} overlaps {} byte words",
        stride,
        word_size
    );
    for i in 0..count {
        let start = i * stride;
        buf[start..start + word_size].reverse();
    }
}

/// Toggle the most significant bit of `count` elements laid out as
/// `element`, in place.
///
/// Turns two's complement samples into offset-binary ones and back, which
/// maps `i16` onto `u16` (and `i32` onto `u32`) shifted by half the range.
pub fn toggle_sign_bits(buf: &mut [u8], element: ElementLayout, count: usize) {
    let size = element.pixel_type.size_bytes();
    let high = match element.byte_order {
        ByteOrder::BigEndian => 0,
        ByteOrder::LittleEndian => size - 1,
    };
    for i in 0..count {
        buf[i * element.stride + high] ^= 0x80;
    }
}
