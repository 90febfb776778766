// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use sortlast::common::buffer::ImageBuffer;
use sortlast::common::extents::Extents;
use sortlast::common::patch::{ImagePatch, PatchId};
use sortlast::common::pixel::RgbaF32;
use sortlast::{
    BlendOrder, CompositeSettings, Communicator, Compositor, OutputFormat, PassStats,
    ThreadWorld,
};

pub(crate) const RED: RgbaF32 = RgbaF32::new(1.0, 0.0, 0.0, 1.0);
pub(crate) const HALF_BLUE: RgbaF32 = RgbaF32::new(0.0, 0.0, 1.0, 0.5);

pub(crate) fn solid_patch(
    rank: usize,
    index: usize,
    extents: [i32; 4],
    depth: f32,
    color: RgbaF32,
) -> ImagePatch {
    ImagePatch::new(
        PatchId::new(rank, index),
        depth,
        ImageBuffer::filled(Extents::from(extents), color),
    )
}

/// A patch whose pixels vary with their position, so that misplaced rows or columns
/// show up in the output.
pub(crate) fn gradient_patch(rank: usize, index: usize, extents: [i32; 4], depth: f32) -> ImagePatch {
    let extents = Extents::from(extents);
    let mut image = ImageBuffer::new(extents);
    let seed = (rank * 7 + index * 3) as f32;

    for y in extents.y_min..extents.y_max {
        for x in extents.x_min..extents.x_max {
            let r = ((x as f32 + seed) * 0.037).rem_euclid(1.0);
            let g = ((y as f32 + seed) * 0.053).rem_euclid(1.0);
            let b = ((x + y) as f32 * 0.011 + seed * 0.1).rem_euclid(1.0);
            let a = 0.2 + 0.6 * ((x * y) as f32 * 0.007 + seed * 0.05).rem_euclid(1.0);
            image.set_pixel(x, y, RgbaF32::new(r, g, b, a));
        }
    }

    ImagePatch::new(PatchId::new(rank, index), depth, image)
}

/// The result of one rank running one pass.
#[derive(Debug)]
pub(crate) struct RankOutput {
    pub(crate) stats: PassStats,
    /// Only set on rank 0.
    pub(crate) image: Option<Vec<u8>>,
}

/// Composite one pass on a world of `num_ranks` ranks, where rank `r` contributes
/// `patches(r)`.
pub(crate) fn composite_world(
    num_ranks: usize,
    width: u32,
    height: u32,
    settings: &CompositeSettings,
    patches: impl Fn(usize) -> Vec<ImagePatch> + Sync,
) -> Vec<RankOutput> {
    let world = ThreadWorld::new(num_ranks).unwrap();

    world.run(|comm| {
        let mut compositor = Compositor::new(comm, *settings);
        compositor
            .region_allocation(num_ranks, width, height)
            .unwrap();

        let stats = compositor.composite(patches(comm.rank())).unwrap();
        let image = (comm.rank() == 0).then(|| {
            let len = width as usize * height as usize * settings.output_format.bytes_per_pixel();
            let mut out = vec![0; len];
            compositor
                .get_composited_image(width, height, &mut out)
                .unwrap();
            out
        });

        RankOutput { stats, image }
    })
}

/// The image of rank 0 from [`composite_world`].
pub(crate) fn composite_image(
    num_ranks: usize,
    width: u32,
    height: u32,
    settings: &CompositeSettings,
    patches: impl Fn(usize) -> Vec<ImagePatch> + Sync,
) -> Vec<u8> {
    composite_world(num_ranks, width, height, settings, patches)
        .swap_remove(0)
        .image
        .unwrap()
}

fn to_u8(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// Composite `patches` on a single thread, strictly back to front over the whole image.
pub(crate) fn reference_image(
    width: u32,
    height: u32,
    settings: &CompositeSettings,
    mut patches: Vec<ImagePatch>,
) -> Vec<u8> {
    patches.sort_by(ImagePatch::depth_cmp);

    let mut image = ImageBuffer::new(Extents::from_size(width, height));
    for patch in patches.iter().rev() {
        sortlast::blend::blend_back_to_front(patch.image(), &mut image);
    }
    sortlast::blend::blend_with_background(&mut image, settings.background);

    let mut out = vec![];
    for p in image.data() {
        out.extend_from_slice(&[to_u8(p.r), to_u8(p.g), to_u8(p.b)]);
        if settings.output_format == OutputFormat::Rgba8 {
            out.push(to_u8(p.a));
        }
    }

    out
}

/// Compare two 8-bit images, allowing the rounding of a single step.
#[track_caller]
pub(crate) fn assert_images_close(actual: &[u8], expected: &[u8]) {
    assert_eq!(actual.len(), expected.len(), "image sizes differ");

    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            a.abs_diff(*e) <= 1,
            "byte {i} differs: got {a}, expected {e}"
        );
    }
}

/// The pixel at `(x, y)` of an RGBA image of the given width.
pub(crate) fn rgba_at(image: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let start = (y as usize * width as usize + x as usize) * 4;
    image[start..start + 4].try_into().unwrap()
}

pub(crate) fn settings_with(order: BlendOrder, compress: bool) -> CompositeSettings {
    CompositeSettings {
        blend_order: order,
        compress_gather: compress,
        ..Default::default()
    }
}
