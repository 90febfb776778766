// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::comm::Communicator;
use crate::context::{PassState, PassStats, RenderPass};
use crate::error::{CompositeError, Result};
use crate::settings::CompositeSettings;
use crate::{gather, router};
use sortlast_common::bbox::BoundingBox;
use sortlast_common::buffer::ImageBuffer;
use sortlast_common::partition::RegionPartition;
use sortlast_common::patch::ImagePatch;

/// The compositor of one rank.
///
/// All operations except [`get_composited_image`](Self::get_composited_image) are
/// collective: every rank of the world has to call them in the same sequence, whether or
/// not it has any patches to contribute. A render pass consists of
///
/// 1. [`begin_pass`](Self::begin_pass),
/// 2. one or more rounds of [`direct_send_many`](Self::direct_send_many) (or
///    [`direct_send`](Self::direct_send) for a single patch),
/// 3. [`composite_region`](Self::composite_region),
/// 4. [`gather_images`](Self::gather_images),
///
/// after which rank 0 can read the image. [`composite`](Self::composite) runs a whole
/// pass with a single round.
#[derive(Debug)]
pub struct Compositor<C: Communicator> {
    comm: C,
    settings: CompositeSettings,
    ctx: Option<RenderPass>,
    next_pass: u64,
}

impl<C: Communicator> Compositor<C> {
    /// Create a compositor for the rank `comm` represents.
    pub fn new(comm: C, settings: CompositeSettings) -> Self {
        Self {
            comm,
            settings,
            ctx: None,
            next_pass: 0,
        }
    }

    /// The communicator of this rank.
    pub fn communicator(&self) -> &C {
        &self.comm
    }

    /// The rank of this compositor.
    pub fn rank(&self) -> usize {
        self.comm.rank()
    }

    pub fn settings(&self) -> &CompositeSettings {
        &self.settings
    }

    /// Change the settings for subsequent operations.
    ///
    /// All ranks have to use the same blend order and compression.
    pub fn set_settings(&mut self, settings: CompositeSettings) {
        self.settings = settings;
    }

    /// Split an image of `width` by `height` pixels into one region per rank.
    ///
    /// `num_ranks` has to match the size of the communicator. Any pass in progress is
    /// abandoned.
    pub fn region_allocation(&mut self, num_ranks: usize, width: u32, height: u32) -> Result<()> {
        if num_ranks == 0 {
            return Err(CompositeError::NoRanks);
        }
        if num_ranks != self.comm.size() {
            return Err(CompositeError::RankCountMismatch {
                requested: num_ranks,
                actual: self.comm.size(),
            });
        }
        if width == 0 || height == 0 || i32::try_from(width.max(height)).is_err() {
            return Err(CompositeError::InvalidImageSize { width, height });
        }

        let partition = RegionPartition::new(num_ranks, height);
        self.ctx = Some(RenderPass::new(self.comm.rank(), width, partition));

        log::debug!(
            "rank {} allocated {num_ranks} regions for a {width}x{height} image",
            self.comm.rank()
        );

        Ok(())
    }

    /// The regions of the image, once allocated.
    pub fn partition(&self) -> Option<&RegionPartition> {
        self.ctx.as_ref().map(|ctx| &ctx.partition)
    }

    /// Where this rank is in the current pass.
    pub fn state(&self) -> PassState {
        self.ctx.as_ref().map_or(PassState::Idle, |ctx| ctx.state)
    }

    /// The area of the local region touched by patches in the current pass.
    pub fn bounding_box(&self) -> BoundingBox {
        self.ctx.as_ref().map_or(BoundingBox::EMPTY, |ctx| ctx.bbox)
    }

    /// The statistics of the current (or last) pass.
    pub fn stats(&self) -> PassStats {
        self.ctx.as_ref().map(|ctx| ctx.stats).unwrap_or_default()
    }

    /// Whether the local region of the current pass has been composited.
    pub fn compositing_done(&self) -> bool {
        self.ctx.as_ref().is_some_and(|ctx| ctx.compositing_done)
    }

    /// The assembled image with premultiplied floating point pixels.
    ///
    /// Only available on rank 0 after [`gather_images`](Self::gather_images).
    pub fn composited_image(&self) -> Option<&ImageBuffer> {
        self.ctx.as_ref().and_then(|ctx| ctx.final_image.as_ref())
    }

    fn ctx_mut(&mut self) -> Result<&mut RenderPass> {
        self.ctx.as_mut().ok_or(CompositeError::NotAllocated)
    }

    /// Start a new render pass, discarding everything left over from the previous one.
    ///
    /// This waits for all ranks, so that no message of the previous pass can be mistaken
    /// for one of the new pass.
    pub fn begin_pass(&mut self) -> Result<()> {
        if self.ctx.is_none() {
            return Err(CompositeError::NotAllocated);
        }

        self.comm.barrier()?;

        let pass = self.next_pass;
        self.next_pass += 1;
        self.ctx_mut()?.reset(pass);

        log::trace!("rank {} began pass {pass}", self.comm.rank());

        Ok(())
    }

    /// Send a single patch to the rank(s) owning the regions it covers.
    ///
    /// This is a collective round of its own; see [`direct_send_many`](Self::direct_send_many).
    pub fn direct_send(&mut self, patch: ImagePatch) -> Result<()> {
        self.direct_send_many(vec![patch])
    }

    /// Send `patches` to the ranks owning the regions they cover, and receive the patches
    /// of other ranks for the local region.
    ///
    /// Every rank has to take part in every round, with an empty `patches` if it has
    /// nothing to contribute. Patches outside of the image are skipped.
    pub fn direct_send_many(&mut self, patches: Vec<ImagePatch>) -> Result<()> {
        let ctx = self.ctx.as_mut().ok_or(CompositeError::NotAllocated)?;
        router::direct_send(ctx, &self.comm, patches)
    }

    /// Blend all patches received for the local region in depth order.
    pub fn composite_region(&mut self) -> Result<()> {
        let ctx = self.ctx.as_mut().ok_or(CompositeError::NotAllocated)?;
        gather::composite_region(ctx, &self.settings)
    }

    /// Send the local region to rank 0, which assembles the final image.
    pub fn gather_images(&mut self) -> Result<()> {
        let ctx = self.ctx.as_mut().ok_or(CompositeError::NotAllocated)?;
        gather::gather_images(ctx, &self.comm, &self.settings)?;

        let stats = ctx.stats;
        log::debug!(
            "rank {} finished pass {}: {} local, {} sent, {} received, {} skipped patches; \
             {} bytes sent, {} bytes gathered",
            ctx.rank,
            ctx.pass,
            stats.local_patches,
            stats.sent_patches,
            stats.received_patches,
            stats.skipped_patches,
            stats.sent_bytes,
            stats.gathered_bytes
        );

        Ok(())
    }

    /// Run a complete render pass with a single round of direct send.
    pub fn composite(&mut self, patches: Vec<ImagePatch>) -> Result<PassStats> {
        self.begin_pass()?;
        self.direct_send_many(patches)?;
        self.composite_region()?;
        self.gather_images()?;

        Ok(self.stats())
    }

    /// Write the final image of `width` by `height` pixels into `out`, top row first, in
    /// the configured output format.
    ///
    /// Only rank 0 holds the image, and only after [`gather_images`](Self::gather_images).
    pub fn get_composited_image(&self, width: u32, height: u32, out: &mut [u8]) -> Result<()> {
        let ctx = self.ctx.as_ref().ok_or(CompositeError::NotAllocated)?;
        gather::get_composited_image(ctx, &self.settings, width, height, out)
    }
}
