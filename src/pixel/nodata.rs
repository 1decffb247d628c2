use super::{PixelType, StridedView, TypedValue};

/// Whether the first `count` elements of `view` all equal `nodata`.
///
/// A sentinel the view's type cannot represent exactly never matches, and a
/// NaN sentinel matches NaN elements. Both parts of a complex element must
/// equal the sentinel.
pub fn has_only_nodata(view: &StridedView<'_>, count: usize, nodata: f64) -> bool {
    let pixel_type = view.pixel_type();
    if !representable(pixel_type, nodata) {
        return false;
    }
    let matches = |part: f64| {
        if nodata.is_nan() {
            part.is_nan()
        } else {
            part == nodata
        }
    };
    (0..count).all(|i| {
        let value = view.get(i);
        matches(value.real()) && (!pixel_type.is_complex() || matches(value.imag()))
    })
}

fn representable(pixel_type: PixelType, value: f64) -> bool {
    if value.is_nan() {
        return pixel_type.is_floating();
    }
    let component = pixel_type.component_type();
    TypedValue::Float64(value).convert(component).real() == value
}
