//! Block transcoder: element-wise conversion between strided views.

use super::convert::{in_place_kernel_for, kernel_for};
use super::{swap_words, ElementLayout, StridedView, StridedViewMut, TypedValue};

/// Convert `count` elements from `src` into `dst`.
///
/// The (source, destination) pair is resolved once to a monomorphised
/// kernel. When both sides share a pixel type the bytes are copied instead,
/// with a byte swap per component when the byte orders differ. Destination
/// bytes between elements are never written.
///
/// # Panics
/// Panics if either buffer is too short for `count` elements.
pub fn transcode(src: &StridedView<'_>, dst: &mut StridedViewMut<'_>, count: usize) {
    if count == 0 {
        return;
    }
    let from = src.layout();
    let to = dst.layout();
    assert!(
        src.bytes().len() >= from.span(count),
        "source holds fewer than {} elements",
        count
    );
    assert!(
        dst.capacity() >= count,
        "destination holds fewer than {} elements",
        count
    );

    if from.pixel_type == to.pixel_type {
        copy_same_type(src.bytes(), &from, dst.bytes_mut(), &to, count);
        return;
    }

    kernel_for(from.pixel_type, to.pixel_type)(
        src.bytes(),
        from.words(),
        dst.bytes_mut(),
        to.words(),
        count,
    );
}

fn copy_same_type(
    src: &[u8],
    from: &ElementLayout,
    dst: &mut [u8],
    to: &ElementLayout,
    count: usize,
) {
    let width = from.pixel_type.size_bytes();
    if from.is_packed() && to.is_packed() {
        dst[..width * count].copy_from_slice(&src[..width * count]);
    } else {
        for i in 0..count {
            let s = i * from.stride;
            let d = i * to.stride;
            dst[d..d + width].copy_from_slice(&src[s..s + width]);
        }
    }
    if from.byte_order != to.byte_order {
        swap_components(dst, to, count);
    }
}

/// Swap every component of `count` elements laid out per `layout`.
fn swap_components(buf: &mut [u8], layout: &ElementLayout, count: usize) {
    let component = layout.pixel_type.component_size_bytes();
    if layout.pixel_type.is_complex() {
        swap_words(buf, component, count, layout.stride);
        swap_words(&mut buf[component..], component, count, layout.stride);
    } else {
        swap_words(buf, component, count, layout.stride);
    }
}

/// Convert `count` elements inside one buffer, front to back.
///
/// The source and destination sequences both start at byte 0. Each
/// destination element is written only after its source element is read,
/// and never over a source element still to be read.
///
/// # Panics
/// Panics unless the destination is no wider than the source and
/// `dst.stride <= src.stride`, or if the buffer is too short.
pub fn transcode_in_place(buf: &mut [u8], src: ElementLayout, dst: ElementLayout, count: usize) {
    assert!(
        dst.pixel_type.size_bytes() <= src.pixel_type.size_bytes() && dst.stride <= src.stride,
        "in-place transcode from {} (stride {}) to {} (stride {}) would overwrite unread input",
        src.pixel_type,
        src.stride,
        dst.pixel_type,
        dst.stride
    );
    if count == 0 {
        return;
    }
    assert!(
        buf.len() >= src.span(count),
        "buffer holds fewer than {} elements",
        count
    );

    if src.pixel_type == dst.pixel_type {
        let width = src.pixel_type.size_bytes();
        if src.stride != dst.stride {
            for i in 1..count {
                let s = i * src.stride;
                buf.copy_within(s..s + width, i * dst.stride);
            }
        }
        if src.byte_order != dst.byte_order {
            swap_components(buf, &dst, count);
        }
        return;
    }

    in_place_kernel_for(src.pixel_type, dst.pixel_type)(buf, src.words(), dst.words(), count);
}

/// Write `value`, converted to the destination type, into `count` slots.
pub fn replicate(value: TypedValue, dst: &mut StridedViewMut<'_>, count: usize) {
    let layout = dst.layout();
    let mut word = [0u8; 16];
    let width = layout.pixel_type.size_bytes();
    value
        .convert(layout.pixel_type)
        .encode(&mut word[..width], layout.byte_order);

    let bytes = dst.bytes_mut();
    for i in 0..count {
        let start = i * layout.stride;
        bytes[start..start + width].copy_from_slice(&word[..width]);
    }
}
