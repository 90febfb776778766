// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless

#![allow(
    clippy::cast_possible_truncation,
    reason = "pixel coordinates are small"
)]

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, ValueEnum};
use sortlast::common::buffer::ImageBuffer;
use sortlast::common::extents::Extents;
use sortlast::common::patch::{ImagePatch, PatchId};
use sortlast::common::pixel::RgbaF32;
use sortlast::peniko::color::{AlphaColor, Srgb, parse_color};
use sortlast::{
    BlendOrder, CompositeSettings, Communicator, Compositor, OutputFormat, PassStats, ThreadWorld,
};

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.ranks == 0 {
        bail!("at least one rank is required");
    }
    if args.passes == 0 {
        bail!("at least one pass is required");
    }
    if args.width == 0 || args.height == 0 {
        bail!("invalid image size {}x{}", args.width, args.height);
    }

    let settings = CompositeSettings {
        background: parse_background(&args.background)?,
        blend_order: args.order.into(),
        compress_gather: !args.no_compress,
        output_format: if args.rgb {
            OutputFormat::Rgb8
        } else {
            OutputFormat::Rgba8
        },
        parallel_pack: true,
    };

    let world = ThreadWorld::new(args.ranks)?;
    let start = Instant::now();

    let results = world.run(|comm| render_rank(comm, &args, &settings));

    let mut image = None;
    let mut total = PassStats::default();
    for (rank, result) in results.into_iter().enumerate() {
        let (stats, rank_image) =
            result.with_context(|| format!("rank {rank} failed to composite"))?;
        total.local_patches += stats.local_patches;
        total.sent_patches += stats.sent_patches;
        total.skipped_patches += stats.skipped_patches;
        total.sent_bytes += stats.sent_bytes;
        image = image.or(rank_image);
    }
    let image = image.ok_or_else(|| anyhow!("rank 0 returned no image"))?;

    log::info!(
        "composited {} passes on {} ranks in {:?}; last pass: {} local, {} sent and {} \
         skipped patches, {} bytes sent",
        args.passes,
        args.ranks,
        start.elapsed(),
        total.local_patches,
        total.sent_patches,
        total.skipped_patches,
        total.sent_bytes
    );

    let out_path = args.out_directory.join("sortlast").with_extension("png");
    std::fs::create_dir_all(&args.out_directory)?;
    let mut file = File::create(&out_path)?;
    let mut png_encoder = png::Encoder::new(&mut file, args.width, args.height);
    png_encoder.set_color(match settings.output_format {
        OutputFormat::Rgba8 => png::ColorType::Rgba,
        OutputFormat::Rgb8 => png::ColorType::Rgb,
    });
    png_encoder.set_depth(png::BitDepth::Eight);
    let mut writer = png_encoder.write_header()?;
    writer.write_image_data(&image)?;
    writer.finish()?;
    println!("Wrote result ({}x{}) to {out_path:?}", args.width, args.height);

    Ok(())
}

/// Render and composite `args.passes` passes on one rank. Only rank 0 returns an image.
fn render_rank(
    comm: &impl Communicator,
    args: &Args,
    settings: &CompositeSettings,
) -> sortlast::Result<(PassStats, Option<Vec<u8>>)> {
    let mut compositor = Compositor::new(comm, *settings);
    compositor.region_allocation(comm.size(), args.width, args.height)?;

    let mut stats = PassStats::default();
    for pass in 0..args.passes {
        let patches = (0..args.patches)
            .map(|index| blob_patch(comm.rank(), index, comm.size(), pass, args))
            .collect();
        stats = compositor.composite(patches)?;
    }

    if comm.rank() != 0 {
        return Ok((stats, None));
    }

    let len =
        args.width as usize * args.height as usize * settings.output_format.bytes_per_pixel();
    let mut out = vec![0; len];
    compositor.get_composited_image(args.width, args.height, &mut out)?;

    Ok((stats, Some(out)))
}

/// A soft round blob standing in for the ray-cast image of one brick of a volume.
///
/// Ranks own slabs of the volume along the view direction, so the depth of a blob grows
/// with its rank.
fn blob_patch(rank: usize, index: usize, ranks: usize, pass: usize, args: &Args) -> ImagePatch {
    let (w, h) = (args.width as f32, args.height as f32);
    let slot = (rank * args.patches + index) as f32;
    let count = (ranks * args.patches) as f32;
    let angle = std::f32::consts::TAU * slot / count + pass as f32 * 0.1;

    let radius = 0.3 * w.min(h);
    let cx = 0.5 * w + 0.25 * w * angle.cos();
    let cy = 0.5 * h + 0.25 * h * angle.sin();
    let extents = Extents::new(
        (cx - radius) as i32,
        (cx + radius) as i32,
        (cy - radius) as i32,
        (cy + radius) as i32,
    );

    let hue = slot / count;
    let color = [
        0.5 + 0.5 * (std::f32::consts::TAU * hue).cos(),
        0.5 + 0.5 * (std::f32::consts::TAU * (hue + 1.0 / 3.0)).cos(),
        0.5 + 0.5 * (std::f32::consts::TAU * (hue + 2.0 / 3.0)).cos(),
    ];

    let mut image = ImageBuffer::new(extents);
    for y in extents.y_min..extents.y_max {
        for x in extents.x_min..extents.x_max {
            let dx = (x as f32 + 0.5 - cx) / radius;
            let dy = (y as f32 + 0.5 - cy) / radius;
            let density = (1.0 - (dx * dx + dy * dy)).max(0.0);
            image.set_pixel(
                x,
                y,
                RgbaF32::new(color[0], color[1], color[2], 0.8 * density),
            );
        }
    }

    let depth = rank as f32 + index as f32 / args.patches as f32;
    ImagePatch::new(PatchId::new(rank, index), depth, image)
}

fn parse_background(s: &str) -> Result<AlphaColor<Srgb>> {
    parse_color(s)
        .map(|c| c.to_alpha_color::<Srgb>())
        .map_err(|e| anyhow!("malformed color {s:?}: {e}"))
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Order {
    FrontToBack,
    BackToFront,
}

impl From<Order> for BlendOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::FrontToBack => Self::FrontToBack,
            Order::BackToFront => Self::BackToFront,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about, long_about = None, bin_name="cargo run -p headless --")]
struct Args {
    /// The number of simulated ranks
    #[arg(long, short, default_value_t = 4)]
    ranks: usize,
    #[arg(long, default_value_t = 512)]
    width: u32,
    #[arg(long, default_value_t = 512)]
    height: u32,
    /// The number of patches each rank renders
    #[arg(long, short, default_value_t = 2)]
    patches: usize,
    /// How many passes to composite; only the last one is written
    #[arg(long, default_value_t = 1)]
    passes: usize,
    #[arg(long, value_enum, default_value_t = Order::FrontToBack)]
    order: Order,
    /// The background color, as a CSS color such as "#102030" or "aliceblue"
    #[arg(long, default_value = "black")]
    background: String,
    /// Send regions to rank 0 without run-length encoding them
    #[arg(long)]
    no_compress: bool,
    /// Write an RGB image instead of RGBA
    #[arg(long)]
    rgb: bool,
    /// Directory to store the result into
    #[arg(long, default_value_os_t = default_directory())]
    out_directory: PathBuf,
}

fn default_directory() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("outputs")
}
