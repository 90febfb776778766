// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Blending the local region and assembling the final image on the root rank.

use crate::blend::{blend_with_background, composite_in_depth_order};
use crate::comm::{Communicator, RegionPayload, ResultMessage, ROOT};
use crate::context::{PassState, RenderPass};
use crate::error::{CompositeError, Result};
use crate::pack::pack_image;
use crate::settings::CompositeSettings;
use sortlast_common::buffer::ImageBuffer;
use sortlast_common::encode::EncodedImage;
use sortlast_common::extents::Extents;
use sortlast_common::placement::place_in_image;

/// Blend all pending patches of the local region into its partial image.
///
/// The partial image only covers the bounding box of the patches, clipped to the region.
pub(crate) fn composite_region(ctx: &mut RenderPass, settings: &CompositeSettings) -> Result<()> {
    ctx.expect_state("composite_region", PassState::Collecting)?;

    let region = ctx.region_extents();
    for patch in &ctx.pending {
        ctx.bbox.update(&patch.extents().intersect(&region));
    }

    ctx.partial.reset(ctx.bbox.extents().unwrap_or(Extents::EMPTY));
    composite_in_depth_order(&mut ctx.pending, &mut ctx.partial, settings.blend_order);
    ctx.pending.clear();

    ctx.compositing_done = true;
    ctx.state = PassState::RegionComplete;

    log::trace!(
        "rank {} composited region {:?} with bounding box {:?}",
        ctx.rank,
        region,
        ctx.bbox.extents()
    );

    Ok(())
}

fn payload(partial: ImageBuffer, compress: bool) -> RegionPayload {
    if partial.is_empty() {
        RegionPayload::Empty
    } else if compress {
        RegionPayload::Encoded(EncodedImage::encode(&partial))
    } else {
        RegionPayload::Raw(partial)
    }
}

/// Collect every region on the root rank.
///
/// Other ranks send their partial image and return to [`PassState::Idle`]. The root
/// assembles the full image in region order and blends it over the background.
pub(crate) fn gather_images<C: Communicator>(
    ctx: &mut RenderPass,
    comm: &C,
    settings: &CompositeSettings,
) -> Result<()> {
    ctx.expect_state("gather_images", PassState::RegionComplete)?;

    if ctx.rank != ROOT {
        let partial = core::mem::replace(&mut ctx.partial, ImageBuffer::new(Extents::EMPTY));
        let payload = payload(partial, settings.compress_gather);
        ctx.stats.gathered_bytes = payload.byte_len();

        comm.send_result(ResultMessage {
            pass: ctx.pass,
            region: ctx.rank,
            source: ctx.rank,
            payload,
        })?;

        ctx.state = PassState::Idle;
        return Ok(());
    }

    let mut image = ImageBuffer::new(ctx.screen());
    place_in_image(&ctx.partial, &mut image);

    let mut results = comm.gather_results()?;
    results.sort_by_key(|msg| msg.region);

    for msg in results {
        if msg.pass != ctx.pass {
            return Err(CompositeError::Protocol(format!(
                "rank {} sent region {} of pass {} during pass {}",
                msg.source, msg.region, msg.pass, ctx.pass
            )));
        }

        let region = match ctx.partition.region(msg.region) {
            Some(region) if msg.region == msg.source && msg.region != ROOT => region,
            _ => {
                return Err(CompositeError::Protocol(format!(
                    "rank {} sent region {}, which it doesn't own",
                    msg.source, msg.region
                )));
            }
        };

        let region_extents = region.extents(ctx.width);
        let extents = msg.payload.extents();
        if !extents.is_empty() && extents.intersect(&region_extents) != extents {
            return Err(CompositeError::Protocol(format!(
                "region {} sent pixels at {extents:?}, outside of {region_extents:?}",
                msg.region
            )));
        }

        ctx.stats.gathered_bytes += msg.payload.byte_len();
        msg.payload.place_into(&mut image);
    }

    blend_with_background(&mut image, settings.background);

    ctx.final_image = Some(image);
    ctx.state = PassState::Gathered;

    Ok(())
}

/// Convert the assembled image to 8-bit pixels, writing them into `out`.
pub(crate) fn get_composited_image(
    ctx: &RenderPass,
    settings: &CompositeSettings,
    width: u32,
    height: u32,
    out: &mut [u8],
) -> Result<()> {
    if ctx.rank != ROOT {
        return Err(CompositeError::NotRoot(ctx.rank));
    }
    ctx.expect_state("get_composited_image", PassState::Gathered)?;

    let image_height = ctx.partition.image_height();
    if width != ctx.width || height != image_height {
        return Err(CompositeError::SizeMismatch {
            requested_width: width,
            requested_height: height,
            width: ctx.width,
            height: image_height,
        });
    }

    let expected = width as usize * height as usize * settings.output_format.bytes_per_pixel();
    if out.len() < expected {
        return Err(CompositeError::OutputTooSmall {
            expected,
            actual: out.len(),
        });
    }

    let image = ctx.final_image.as_ref().ok_or(CompositeError::InvalidState {
        operation: "get_composited_image",
        state: ctx.state,
    })?;

    pack_image(
        image,
        &ctx.partition,
        &mut out[..expected],
        settings.output_format,
        settings.parallel_pack,
    );

    Ok(())
}
