// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Alpha compositing of rendered patches.
//!
//! Patches carry straight alpha, while the buffers they are blended into accumulate
//! premultiplied color. See <https://www.w3.org/TR/compositing-1/#porterduffcompositingoperators_srcover>
//! for the "over" operator used here.

use crate::settings::BlendOrder;
use peniko::color::{AlphaColor, Srgb};
use sortlast_common::buffer::ImageBuffer;
use sortlast_common::extents::Extents;
use sortlast_common::patch::ImagePatch;
use sortlast_common::pixel::RgbaF32;
use sortlast_common::placement::for_each_overlapping_row;

/// Blend `src` over `dst`, where `src` is nearer to the camera than everything already
/// accumulated in `dst`.
///
/// `dst.rgb = src.rgb * src.a + dst.rgb * (1 - src.a)` and
/// `dst.a = src.a + dst.a * (1 - src.a)`. Only the overlap of both buffers is touched;
/// it is returned.
pub fn blend_back_to_front(src: &ImageBuffer, dst: &mut ImageBuffer) -> Extents {
    for_each_overlapping_row(src, dst, |src, dst| {
        for (s, d) in src.iter().zip(dst) {
            *d = over(*s, *d);
        }
    })
}

/// Blend `src` under `dst`, where `src` is farther from the camera than everything
/// already accumulated in `dst`.
///
/// `src` only contributes through the transparency that `dst` has left:
/// `dst.rgb += src.rgb * src.a * (1 - dst.a)` and `dst.a += src.a * (1 - dst.a)`.
/// Only the overlap of both buffers is touched; it is returned.
pub fn blend_front_to_back(src: &ImageBuffer, dst: &mut ImageBuffer) -> Extents {
    for_each_overlapping_row(src, dst, |src, dst| {
        for (s, d) in src.iter().zip(dst) {
            *d = under(*s, *d);
        }
    })
}

#[inline(always)]
fn over(src: RgbaF32, dst: RgbaF32) -> RgbaF32 {
    let inv_a = 1.0 - src.a;

    RgbaF32::new(
        src.r * src.a + dst.r * inv_a,
        src.g * src.a + dst.g * inv_a,
        src.b * src.a + dst.b * inv_a,
        src.a + dst.a * inv_a,
    )
}

#[inline(always)]
fn under(src: RgbaF32, dst: RgbaF32) -> RgbaF32 {
    let weight = src.a * (1.0 - dst.a);

    RgbaF32::new(
        dst.r + src.r * weight,
        dst.g + src.g * weight,
        dst.b + src.b * weight,
        dst.a + weight,
    )
}

/// Blend the accumulated (premultiplied) pixels of `buffer` over a solid background.
///
/// Every pixel is fully opaque afterwards. This is applied once, to the assembled final
/// image.
pub fn blend_with_background(buffer: &mut ImageBuffer, background: AlphaColor<Srgb>) {
    let [r, g, b, _] = background.components;

    for p in buffer.data_mut() {
        let remaining = 1.0 - p.a;
        *p = RgbaF32::new(
            p.r + r * remaining,
            p.g + g * remaining,
            p.b + b * remaining,
            1.0,
        );
    }
}

/// Blend `patches` into `dst` in depth order, regardless of the order they are given in.
///
/// The patches are sorted nearest first (ties broken by patch ID) and then traversed in
/// the direction that `order` requires.
pub fn composite_in_depth_order(
    patches: &mut [ImagePatch],
    dst: &mut ImageBuffer,
    order: BlendOrder,
) {
    patches.sort_by(ImagePatch::depth_cmp);

    match order {
        BlendOrder::FrontToBack => {
            for patch in patches.iter() {
                blend_front_to_back(patch.image(), dst);
            }
        }
        BlendOrder::BackToFront => {
            for patch in patches.iter().rev() {
                blend_back_to_front(patch.image(), dst);
            }
        }
    }
}
