// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::util::{
    assert_images_close, composite_image, composite_world, gradient_patch, reference_image,
    settings_with, solid_patch, RED,
};
use sortlast::peniko::color::palette::css::WHITE;
use sortlast::{BlendOrder, CompositeSettings, OutputFormat};

fn patches(rank: usize) -> Vec<sortlast::common::patch::ImagePatch> {
    vec![
        solid_patch(rank, 0, [0, 32, rank as i32 * 8, rank as i32 * 8 + 4], 0.5, RED),
        gradient_patch(rank, 1, [10, 30, 0, 32], rank as f32),
    ]
}

#[test]
fn gather_compressed_matches_raw() {
    let compressed = composite_world(
        4,
        32,
        32,
        &settings_with(BlendOrder::FrontToBack, true),
        patches,
    );
    let raw = composite_world(
        4,
        32,
        32,
        &settings_with(BlendOrder::FrontToBack, false),
        patches,
    );

    assert_eq!(compressed[0].image, raw[0].image);

    // The runs of solid pixels outweigh the overhead of encoding the gradient.
    let compressed_bytes: usize = compressed[1..].iter().map(|o| o.stats.gathered_bytes).sum();
    let raw_bytes: usize = raw[1..].iter().map(|o| o.stats.gathered_bytes).sum();
    assert!(compressed_bytes < raw_bytes);
    assert_eq!(compressed[0].stats.gathered_bytes, compressed_bytes);
}

#[test]
fn gather_rgb_output() {
    let settings = CompositeSettings {
        output_format: OutputFormat::Rgb8,
        ..Default::default()
    };

    let image = composite_image(3, 32, 32, &settings, patches);
    assert_eq!(image.len(), 32 * 32 * 3);

    let reference = reference_image(32, 32, &settings, (0..3).flat_map(patches).collect());
    assert_images_close(&image, &reference);
}

#[test]
fn gather_background() {
    let settings = CompositeSettings {
        background: WHITE,
        ..Default::default()
    };

    let image = composite_image(2, 4, 4, &settings, |rank| match rank {
        1 => vec![solid_patch(1, 0, [0, 2, 0, 1], 0.5, RED)],
        _ => vec![],
    });

    assert_eq!(image[..8], [255, 0, 0, 255, 255, 0, 0, 255]);
    assert!(image[8..].iter().all(|&b| b == 255));
}

#[test]
fn gather_sequential_pack() {
    let parallel = CompositeSettings::default();
    let sequential = CompositeSettings {
        parallel_pack: false,
        ..parallel
    };

    assert_eq!(
        composite_image(4, 32, 32, &parallel, patches),
        composite_image(4, 32, 32, &sequential, patches)
    );
}
