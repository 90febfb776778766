// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placing one image buffer into another.

use crate::buffer::ImageBuffer;
use crate::extents::Extents;
use crate::pixel::RgbaF32;

/// Visit the overlap of `src` and `dst` row by row.
///
/// `func` is called once per overlapping row with the source span and the destination
/// span covering the same screen columns. Returns the overlap, which may be empty, in
/// which case `func` is never called.
pub fn for_each_overlapping_row(
    src: &ImageBuffer,
    dst: &mut ImageBuffer,
    mut func: impl FnMut(&[RgbaF32], &mut [RgbaF32]),
) -> Extents {
    let overlap = src.extents().intersect(&dst.extents());
    if overlap.is_empty() {
        return overlap;
    }

    for y in overlap.y_min..overlap.y_max {
        let src_span = src.span(y, overlap.x_min, overlap.x_max);
        let dst_span = dst.span_mut(y, overlap.x_min, overlap.x_max);
        func(src_span, dst_span);
    }

    overlap
}

/// Copy every pixel of `src` that falls inside `dst` to the same screen position in
/// `dst`.
///
/// Source pixels outside of `dst` are dropped and destination pixels outside of `src`
/// are left untouched. Returns the area that was written.
pub fn place_in_image(src: &ImageBuffer, dst: &mut ImageBuffer) -> Extents {
    for_each_overlapping_row(src, dst, |s, d| d.copy_from_slice(s))
}
