// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The floating-point pixel type.

use bytemuck::{Pod, Zeroable};

/// The number of channels per pixel.
pub const COLOR_COMPONENTS: usize = 4;

/// An RGBA pixel with one `f32` per channel, nominally in `[0, 1]`.
///
/// Whether the color channels are premultiplied depends on the buffer: rendered
/// patches carry straight alpha, composited buffers carry premultiplied alpha.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct RgbaF32 {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl RgbaF32 {
    /// Transparent black, the contents of a freshly allocated buffer.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Create a new pixel.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create a pixel from `[r, g, b, a]`.
    pub const fn from_array(c: [f32; COLOR_COMPONENTS]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }

    /// Return the pixel as `[r, g, b, a]`.
    pub const fn to_array(self) -> [f32; COLOR_COMPONENTS] {
        [self.r, self.g, self.b, self.a]
    }

    /// Whether two pixels are bit-for-bit identical.
    ///
    /// Unlike `==`, this treats `NaN`s with the same payload as equal and
    /// distinguishes `0.0` from `-0.0`.
    #[inline(always)]
    pub fn bit_eq(&self, other: &Self) -> bool {
        bytemuck::bytes_of(self) == bytemuck::bytes_of(other)
    }
}
