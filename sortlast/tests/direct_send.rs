// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::util::{
    assert_images_close, composite_image, composite_world, gradient_patch, reference_image,
    rgba_at, solid_patch, HALF_BLUE, RED,
};
use sortlast::CompositeSettings;

fn red_and_blue(rank: usize) -> Vec<sortlast::common::patch::ImagePatch> {
    match rank {
        0 => vec![solid_patch(0, 0, [0, 50, 0, 30], 1.0, RED)],
        2 => vec![solid_patch(2, 0, [0, 50, 20, 60], 0.5, HALF_BLUE)],
        _ => vec![],
    }
}

#[test]
fn direct_send_red_and_blue() {
    let image = composite_image(4, 100, 100, &CompositeSettings::default(), red_and_blue);

    for y in 0..100 {
        for x in 0..100 {
            let expected = match (x, y) {
                (50.., _) | (_, 60..) => [0, 0, 0, 255],
                (_, 0..20) => [255, 0, 0, 255],
                (_, 20..30) => [128, 0, 128, 255],
                _ => [0, 0, 128, 255],
            };
            assert_eq!(rgba_at(&image, 100, x, y), expected, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn direct_send_stats() {
    let outputs = composite_world(4, 100, 100, &CompositeSettings::default(), red_and_blue);

    // Red covers rows 0..30, which belong to regions 0 and 1. Blue covers rows 20..60,
    // which belong to regions 0, 1 and 2.
    assert_eq!(outputs[0].stats.local_patches, 1);
    assert_eq!(outputs[0].stats.sent_patches, 1);
    assert_eq!(outputs[0].stats.received_patches, 1);
    assert_eq!(outputs[1].stats.received_patches, 2);
    assert_eq!(outputs[2].stats.local_patches, 1);
    assert_eq!(outputs[2].stats.sent_patches, 2);
    assert_eq!(outputs[3].stats.local_patches, 0);
    assert_eq!(outputs[3].stats.received_patches, 0);

    // 50x5 and 50x25 blue pixels leave rank 2.
    assert_eq!(outputs[2].stats.sent_bytes, (50 * 5 + 50 * 25) * 16);
}

#[test]
fn direct_send_without_patches() {
    let image = composite_image(3, 17, 9, &CompositeSettings::default(), |_| vec![]);
    assert_eq!(image, [0, 0, 0, 255].repeat(17 * 9));
}

#[test]
fn direct_send_matches_reference() {
    let settings = CompositeSettings::default();
    let patches = |rank: usize| {
        let offset = rank as i32 * 11;
        vec![
            gradient_patch(
                rank,
                0,
                [offset, offset + 40, offset, offset + 35],
                0.1 * rank as f32,
            ),
            gradient_patch(
                rank,
                1,
                [-10, 30, 50 - offset, 90 - offset],
                0.9 - 0.1 * rank as f32,
            ),
        ]
    };

    let image = composite_image(5, 64, 80, &settings, patches);
    let reference = reference_image(64, 80, &settings, (0..5).flat_map(patches).collect());

    assert_images_close(&image, &reference);
}

#[test]
fn direct_send_more_ranks_than_rows() {
    let settings = CompositeSettings::default();
    let patches = |rank: usize| vec![gradient_patch(rank, 0, [0, 6, 0, 3], rank as f32)];

    let image = composite_image(7, 6, 3, &settings, patches);
    let reference = reference_image(6, 3, &settings, (0..7).flat_map(patches).collect());

    assert_images_close(&image, &reference);
}

#[test]
fn direct_send_skips_patches_outside_image() {
    let settings = CompositeSettings::default();
    let outputs = composite_world(2, 10, 10, &settings, |rank| {
        vec![
            solid_patch(rank, 0, [0, 10, 10, 20], 0.5, RED),
            solid_patch(rank, 1, [-20, -10, 0, 10], 0.5, RED),
            solid_patch(rank, 2, [3, 3, 0, 10], 0.5, RED),
        ]
    });

    for output in &outputs {
        assert_eq!(output.stats.skipped_patches, 3);
        assert_eq!(output.stats.local_patches + output.stats.sent_patches, 0);
    }
    assert_eq!(
        outputs[0].image.as_deref(),
        Some([0, 0, 0, 255].repeat(100).as_slice())
    );
}
