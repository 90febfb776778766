// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lossless run-length encoding of image buffers.
//!
//! Partial images produced by volume rendering are dominated by long runs of
//! transparent pixels, so collapsing identical neighbours shrinks them considerably
//! before they are sent to the root rank.

use crate::buffer::ImageBuffer;
use crate::extents::Extents;
use crate::pixel::RgbaF32;
use alloc::vec::Vec;
use bytemuck::{Pod, Zeroable};

/// `len` repetitions of `color`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Run {
    /// The number of pixels in the run. Never zero.
    pub len: u32,
    /// The color of every pixel in the run.
    pub color: RgbaF32,
}

/// A run-length encoded [`ImageBuffer`].
///
/// Runs follow the row-major pixel order and may continue across row boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    extents: Extents,
    runs: Vec<Run>,
}

impl EncodedImage {
    /// Encode `image`.
    ///
    /// Pixels are merged only if they are bit-for-bit identical, so decoding reproduces
    /// the input exactly.
    pub fn encode(image: &ImageBuffer) -> Self {
        let mut runs: Vec<Run> = Vec::new();

        for pixel in image.data() {
            match runs.last_mut() {
                Some(run) if run.len < u32::MAX && run.color.bit_eq(pixel) => run.len += 1,
                _ => runs.push(Run {
                    len: 1,
                    color: *pixel,
                }),
            }
        }

        log::trace!(
            "encoded {} pixels of {:?} into {} runs",
            image.data().len(),
            image.extents(),
            runs.len()
        );

        Self {
            extents: image.extents(),
            runs,
        }
    }

    /// The extents of the encoded image.
    pub fn extents(&self) -> Extents {
        self.extents
    }

    /// The runs of the encoded image.
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// The size of the encoded data in bytes.
    pub fn byte_len(&self) -> usize {
        core::mem::size_of_val(self.runs.as_slice())
    }

    /// Decode into a new buffer.
    ///
    /// # Panics
    ///
    /// Panics if the runs don't add up to the area of the extents.
    pub fn decode(&self) -> ImageBuffer {
        let mut data = Vec::with_capacity(self.extents.area());
        for run in &self.runs {
            data.extend(core::iter::repeat(run.color).take(run.len as usize));
        }

        ImageBuffer::from_parts(data, self.extents)
    }

    /// Decode directly into `dst`, writing only the pixels that fall inside it.
    ///
    /// This behaves like [`place_in_image`](crate::placement::place_in_image) on the
    /// decoded image, without materializing it. Returns the area that was written.
    pub fn decode_into(&self, dst: &mut ImageBuffer) -> Extents {
        let overlap = self.extents.intersect(&dst.extents());
        if overlap.is_empty() {
            return overlap;
        }

        let width = self.extents.width() as usize;
        let mut offset = 0_usize;

        for run in &self.runs {
            let mut remaining = run.len as usize;

            while remaining > 0 {
                let row = offset / width;
                let col = offset % width;
                let len = remaining.min(width - col);

                let y = self.extents.y_min + row as i32;
                let x0 = self.extents.x_min + col as i32;
                let x1 = x0 + len as i32;

                if y >= overlap.y_min && y < overlap.y_max {
                    let x0 = x0.max(overlap.x_min);
                    let x1 = x1.min(overlap.x_max);
                    if x0 < x1 {
                        dst.span_mut(y, x0, x1).fill(run.color);
                    }
                }

                offset += len;
                remaining -= len;
            }
        }

        overlap
    }
}

#[cfg(test)]
mod tests {
    use crate::buffer::ImageBuffer;
    use crate::encode::EncodedImage;
    use crate::extents::Extents;
    use crate::pixel::RgbaF32;
    use crate::placement::place_in_image;

    const RED: RgbaF32 = RgbaF32::new(1.0, 0.0, 0.0, 1.0);
    const HALF_BLUE: RgbaF32 = RgbaF32::new(0.0, 0.0, 0.5, 0.5);

    fn sparse_image() -> ImageBuffer {
        let mut image = ImageBuffer::new(Extents::new(5, 15, 10, 16));
        for x in 7..12 {
            image.set_pixel(x, 11, RED);
        }
        image.set_pixel(14, 12, HALF_BLUE);
        image.set_pixel(5, 13, HALF_BLUE);
        image
    }

    #[test]
    fn encode_collapses_runs() {
        let image = sparse_image();
        let encoded = EncodedImage::encode(&image);

        // The two blue pixels on either side of the row break form a single run.
        assert_eq!(encoded.runs().len(), 5);
        assert!(encoded.byte_len() < image.byte_len());
        assert_eq!(encoded.decode(), image);
    }

    #[test]
    fn encode_keeps_distinct_zeros() {
        let mut image = ImageBuffer::new(Extents::new(0, 2, 0, 1));
        image.set_pixel(1, 0, RgbaF32::new(-0.0, 0.0, 0.0, 0.0));
        let encoded = EncodedImage::encode(&image);
        assert_eq!(encoded.runs().len(), 2);
    }

    #[test]
    fn decode_into_matches_placement() {
        let image = sparse_image();
        let encoded = EncodedImage::encode(&image);

        for dst_extents in [
            Extents::new(0, 20, 0, 20),
            Extents::new(8, 13, 11, 14),
            Extents::new(0, 6, 13, 14),
            Extents::new(20, 30, 0, 5),
        ] {
            let mut expected = ImageBuffer::filled(dst_extents, RgbaF32::new(0.3, 0.3, 0.3, 1.0));
            let mut actual = expected.clone();

            place_in_image(&image, &mut expected);
            encoded.decode_into(&mut actual);

            assert_eq!(actual, expected, "decoding into {dst_extents:?}");
        }
    }

    #[test]
    fn encode_empty() {
        let image = ImageBuffer::new(Extents::EMPTY);
        let encoded = EncodedImage::encode(&image);
        assert!(encoded.runs().is_empty());
        assert!(encoded.decode().is_empty());
    }
}
