use super::{ByteOrder, PixelType, TypedValue};

/// Type, stride and byte order of one strided element sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementLayout {
    pub pixel_type: PixelType,
    /// Byte distance between consecutive elements.
    pub stride: usize,
    pub byte_order: ByteOrder,
}

impl ElementLayout {
    /// # Panics
    /// Panics if `stride` is smaller than the element width.
    pub fn new(pixel_type: PixelType, stride: usize, byte_order: ByteOrder) -> Self {
        assert!(
            stride >= pixel_type.size_bytes(),
            "stride {} is smaller than the {} byte width of {}",
            stride,
            pixel_type.size_bytes(),
            pixel_type
        );
        Self {
            pixel_type,
            stride,
            byte_order,
        }
    }

    /// Contiguous elements with no padding.
    pub fn packed(pixel_type: PixelType, byte_order: ByteOrder) -> Self {
        Self::new(pixel_type, pixel_type.size_bytes(), byte_order)
    }

    pub fn is_packed(&self) -> bool {
        self.stride == self.pixel_type.size_bytes()
    }

    /// Bytes spanned by `count` elements, from the first byte of element 0
    /// to the last byte of element `count - 1`.
    pub fn span(&self, count: usize) -> usize {
        match count {
            0 => 0,
            n => (n - 1) * self.stride + self.pixel_type.size_bytes(),
        }
    }

    #[inline]
    pub(crate) fn words(&self) -> super::convert::Words {
        super::convert::Words {
            stride: self.stride,
            order: self.byte_order,
        }
    }
}

/// Read-only strided view over a byte buffer.
///
/// Element `i` lives at `i * stride`. Indexing past the end of the buffer
/// panics through the slice bounds check; callers size buffers with
/// [`ElementLayout::span`].
#[derive(Debug, Clone, Copy)]
pub struct StridedView<'a> {
    bytes: &'a [u8],
    layout: ElementLayout,
}

impl<'a> StridedView<'a> {
    pub fn new(bytes: &'a [u8], layout: ElementLayout) -> Self {
        Self { bytes, layout }
    }

    pub fn packed(bytes: &'a [u8], pixel_type: PixelType, byte_order: ByteOrder) -> Self {
        Self::new(bytes, ElementLayout::packed(pixel_type, byte_order))
    }

    pub fn layout(&self) -> ElementLayout {
        self.layout
    }

    pub fn pixel_type(&self) -> PixelType {
        self.layout.pixel_type
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Number of whole elements the buffer holds.
    pub fn capacity(&self) -> usize {
        capacity(self.bytes.len(), &self.layout)
    }

    #[inline]
    pub fn get(&self, index: usize) -> TypedValue {
        let start = index * self.layout.stride;
        TypedValue::decode(
            self.layout.pixel_type,
            &self.bytes[start..],
            self.layout.byte_order,
        )
    }
}

/// Mutable strided view over a byte buffer.
#[derive(Debug)]
pub struct StridedViewMut<'a> {
    bytes: &'a mut [u8],
    layout: ElementLayout,
}

impl<'a> StridedViewMut<'a> {
    pub fn new(bytes: &'a mut [u8], layout: ElementLayout) -> Self {
        Self { bytes, layout }
    }

    pub fn packed(bytes: &'a mut [u8], pixel_type: PixelType, byte_order: ByteOrder) -> Self {
        Self::new(bytes, ElementLayout::packed(pixel_type, byte_order))
    }

    pub fn layout(&self) -> ElementLayout {
        self.layout
    }

    pub fn pixel_type(&self) -> PixelType {
        self.layout.pixel_type
    }

    pub fn capacity(&self) -> usize {
        capacity(self.bytes.len(), &self.layout)
    }

    pub fn as_view(&self) -> StridedView<'_> {
        StridedView::new(self.bytes, self.layout)
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        self.bytes
    }

    #[inline]
    pub fn get(&self, index: usize) -> TypedValue {
        self.as_view().get(index)
    }

    /// Store `value` at element `index`.
    ///
    /// # Panics
    /// Panics if `value` is not of this view's pixel type. Convert first.
    #[inline]
    pub fn set(&mut self, index: usize, value: TypedValue) {
        assert_eq!(
            value.pixel_type(),
            self.layout.pixel_type,
            "value type does not match view type"
        );
        let start = index * self.layout.stride;
        value.encode(&mut self.bytes[start..], self.layout.byte_order);
    }
}

fn capacity(len: usize, layout: &ElementLayout) -> usize {
    let width = layout.pixel_type.size_bytes();
    if len < width {
        0
    } else {
        (len - width) / layout.stride + 1
    }
}
