// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An owned floating-point image buffer that knows where it lives on screen.

use crate::extents::Extents;
use crate::pixel::RgbaF32;
use alloc::vec;
use alloc::vec::Vec;

/// A row-major buffer of [`RgbaF32`] pixels covering a screen-space rectangle.
///
/// The buffer always holds exactly `extents.area()` pixels. All coordinates passed to
/// its methods are global screen coordinates, not offsets into the buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    extents: Extents,
    buf: Vec<RgbaF32>,
}

impl ImageBuffer {
    /// Create a new buffer covering `extents`.
    ///
    /// All pixels are initialized to transparent black. Empty extents produce a buffer
    /// without pixels.
    pub fn new(extents: Extents) -> Self {
        Self::filled(extents, RgbaF32::TRANSPARENT)
    }

    /// Create a new buffer covering `extents` with every pixel set to `color`.
    pub fn filled(extents: Extents, color: RgbaF32) -> Self {
        let extents = Self::normalize(extents);
        Self {
            extents,
            buf: vec![color; extents.area()],
        }
    }

    /// Create a new buffer from existing pixel data.
    ///
    /// The pixels are in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if `data` doesn't hold exactly `extents.area()` pixels.
    pub fn from_parts(data: Vec<RgbaF32>, extents: Extents) -> Self {
        let extents = Self::normalize(extents);
        assert_eq!(
            data.len(),
            extents.area(),
            "Expected `data` to have length of exactly `width * height`"
        );

        Self { extents, buf: data }
    }

    // Keep a single representation for all empty buffers, so that equality and
    // placement never have to special-case inverted extents.
    fn normalize(extents: Extents) -> Extents {
        if extents.is_empty() {
            Extents::new(extents.x_min, extents.x_min, extents.y_min, extents.y_min)
        } else {
            extents
        }
    }

    /// The screen-space rectangle covered by the buffer.
    pub fn extents(&self) -> Extents {
        self.extents
    }

    /// The width of the buffer in pixels.
    pub fn width(&self) -> u32 {
        self.extents.width()
    }

    /// The height of the buffer in pixels.
    pub fn height(&self) -> u32 {
        self.extents.height()
    }

    /// Whether the buffer holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The pixels, in row-major order.
    pub fn data(&self) -> &[RgbaF32] {
        &self.buf
    }

    /// The pixels, in row-major order.
    pub fn data_mut(&mut self) -> &mut [RgbaF32] {
        &mut self.buf
    }

    /// The pixels as a flat slice of `f32`s, four per pixel.
    pub fn data_as_f32_slice(&self) -> &[f32] {
        bytemuck::cast_slice(&self.buf)
    }

    /// The size of the pixel data in bytes.
    pub fn byte_len(&self) -> usize {
        core::mem::size_of_val(self.buf.as_slice())
    }

    /// Consume the buffer, returning the pixels.
    pub fn take(self) -> Vec<RgbaF32> {
        self.buf
    }

    /// The index into [`data`](Self::data) of the pixel at `(x, y)`, if it lies inside the
    /// buffer.
    #[inline(always)]
    pub fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        if !self.extents.contains(x, y) {
            return None;
        }

        let dx = (x - self.extents.x_min) as usize;
        let dy = (y - self.extents.y_min) as usize;

        Some(dy * self.width() as usize + dx)
    }

    /// The pixel at `(x, y)`, if it lies inside the buffer.
    pub fn pixel(&self, x: i32, y: i32) -> Option<RgbaF32> {
        self.index_of(x, y).map(|idx| self.buf[idx])
    }

    /// Set the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the buffer.
    pub fn set_pixel(&mut self, x: i32, y: i32, pixel: RgbaF32) {
        let idx = self
            .index_of(x, y)
            .expect("attempted to set a pixel outside of the buffer");
        self.buf[idx] = pixel;
    }

    /// The pixels of row `y` in the columns `x_min..x_max`.
    ///
    /// # Panics
    ///
    /// Panics if the span isn't fully contained in the buffer.
    pub fn span(&self, y: i32, x_min: i32, x_max: i32) -> &[RgbaF32] {
        let range = self.span_range(y, x_min, x_max);
        &self.buf[range]
    }

    /// The pixels of row `y` in the columns `x_min..x_max`.
    ///
    /// # Panics
    ///
    /// Panics if the span isn't fully contained in the buffer.
    pub fn span_mut(&mut self, y: i32, x_min: i32, x_max: i32) -> &mut [RgbaF32] {
        let range = self.span_range(y, x_min, x_max);
        &mut self.buf[range]
    }

    fn span_range(&self, y: i32, x_min: i32, x_max: i32) -> core::ops::Range<usize> {
        assert!(
            x_min <= x_max && x_min >= self.extents.x_min && x_max <= self.extents.x_max,
            "columns {x_min}..{x_max} exceed the buffer extents {:?}",
            self.extents
        );
        assert!(
            y >= self.extents.y_min && y < self.extents.y_max,
            "row {y} exceeds the buffer extents {:?}",
            self.extents
        );

        let row_start = (y - self.extents.y_min) as usize * self.width() as usize;
        let start = row_start + (x_min - self.extents.x_min) as usize;
        let end = row_start + (x_max - self.extents.x_min) as usize;

        start..end
    }

    /// A full row of the buffer.
    ///
    /// # Panics
    ///
    /// Panics if the row lies outside the buffer.
    pub fn row(&self, y: i32) -> &[RgbaF32] {
        self.span(y, self.extents.x_min, self.extents.x_max)
    }

    /// Iterate over the rows of the buffer, top to bottom, with their `y` coordinate.
    pub fn rows(&self) -> impl Iterator<Item = (i32, &[RgbaF32])> {
        let width = (self.width() as usize).max(1);
        (self.extents.y_min..).zip(self.buf.chunks_exact(width))
    }

    /// Copy the part of the buffer inside `extents` into a new buffer.
    ///
    /// The result covers the intersection of `extents` and the buffer, which may be
    /// empty.
    pub fn crop(&self, extents: &Extents) -> Self {
        let overlap = self.extents.intersect(extents);
        if overlap.is_empty() {
            return Self::new(Extents::EMPTY);
        }

        let mut buf = Vec::with_capacity(overlap.area());
        for y in overlap.y_min..overlap.y_max {
            buf.extend_from_slice(self.span(y, overlap.x_min, overlap.x_max));
        }

        Self {
            extents: overlap,
            buf,
        }
    }

    /// Reset all pixels to transparent black.
    pub fn clear(&mut self) {
        self.buf.fill(RgbaF32::TRANSPARENT);
    }

    /// Move the buffer to new extents, clearing it.
    ///
    /// The allocation is reused where possible.
    pub fn reset(&mut self, extents: Extents) {
        self.extents = Self::normalize(extents);
        self.buf.clear();
        self.buf.resize(self.extents.area(), RgbaF32::TRANSPARENT);
    }
}
