// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Converting the assembled float image into 8-bit pixels.

use crate::region::{Band, Bands};
use crate::settings::OutputFormat;
use sortlast_common::buffer::ImageBuffer;
use sortlast_common::partition::RegionPartition;
use sortlast_common::pixel::RgbaF32;

/// Clamp a component to `[0, 1]` and round it to the nearest 8-bit value.
#[inline(always)]
fn to_u8(c: f32) -> u8 {
    // NaN saturates to 0.
    (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

fn pack_row(src: &[RgbaF32], dst: &mut [u8], format: OutputFormat) {
    let bpp = format.bytes_per_pixel();

    for (p, d) in src.iter().zip(dst.chunks_exact_mut(bpp)) {
        match format {
            OutputFormat::Rgba8 => {
                d.copy_from_slice(&[to_u8(p.r), to_u8(p.g), to_u8(p.b), to_u8(p.a)]);
            }
            OutputFormat::Rgb8 => d.copy_from_slice(&[to_u8(p.r), to_u8(p.g), to_u8(p.b)]),
        }
    }
}

/// Write `image`, which covers the whole screen, into `out`, one region per task.
pub(crate) fn pack_image(
    image: &ImageBuffer,
    partition: &RegionPartition,
    out: &mut [u8],
    format: OutputFormat,
    parallel: bool,
) {
    let y_min = image.extents().y_min;
    let mut bands = Bands::new(partition, image.width(), format.bytes_per_pixel(), out);

    let pack_band = |band: &mut Band<'_>| {
        for row in 0..band.height {
            let y = y_min + (band.start + row) as i32;
            pack_row(image.row(y), band.row_mut(row), format);
        }
    };

    run_bands(&mut bands, parallel, pack_band);
}

#[cfg(feature = "multithreading")]
fn run_bands(bands: &mut Bands<'_>, parallel: bool, func: impl Fn(&mut Band<'_>) + Send + Sync) {
    if parallel {
        bands.update_bands_par(func);
    } else {
        bands.update_bands(func);
    }
}

#[cfg(not(feature = "multithreading"))]
fn run_bands(bands: &mut Bands<'_>, _parallel: bool, func: impl Fn(&mut Band<'_>)) {
    bands.update_bands(func);
}
