/// Copy bit runs between packed bit buffers, most significant bit first.
///
/// For each of `step_count` steps, `bit_count` bits are copied starting at
/// bit offsets `src_offset` and `dst_offset`; the offsets then advance by
/// `src_step` and `dst_step` bits from the start of the run. Destination bits
/// outside the copied runs are preserved.
#[allow(clippy::too_many_arguments)]
pub fn copy_bits(
    src: &[u8],
    mut src_offset: usize,
    src_step: usize,
    dst: &mut [u8],
    mut dst_offset: usize,
    dst_step: usize,
    bit_count: usize,
    step_count: usize,
) {
    for _ in 0..step_count {
        for bit in 0..bit_count {
            let s = src_offset + bit;
            let d = dst_offset + bit;
            let mask = 0x80u8 >> (d & 7);
            if src[s >> 3] & (0x80 >> (s & 7)) != 0 {
                dst[d >> 3] |= mask;
            } else {
                dst[d >> 3] &= !mask;
            }
        }
        src_offset += src_step;
        dst_offset += dst_step;
    }
}
