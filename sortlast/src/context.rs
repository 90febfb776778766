// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The state of one render pass on one rank.

use crate::error::{CompositeError, Result};
use sortlast_common::bbox::BoundingBox;
use sortlast_common::buffer::ImageBuffer;
use sortlast_common::extents::Extents;
use sortlast_common::partition::{Region, RegionPartition};
use sortlast_common::patch::ImagePatch;

/// Where a rank is in the compositing protocol of a render pass.
///
/// `Idle → Collecting → RegionComplete → Gathered → Idle`. Ranks other than the root go
/// straight from `RegionComplete` back to `Idle` once their region has been sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassState {
    /// No pass is running.
    Idle,
    /// Patches are being routed and received.
    Collecting,
    /// The patches of the local region have been blended.
    RegionComplete,
    /// The root rank holds the complete image.
    Gathered,
}

/// Counters describing one render pass on one rank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Patches (or parts of patches) that stayed on this rank.
    pub local_patches: usize,
    /// Patches (or parts of patches) sent to other ranks.
    pub sent_patches: usize,
    /// Patches received from other ranks.
    pub received_patches: usize,
    /// Patches skipped because they lie outside the image.
    pub skipped_patches: usize,
    /// Pixel bytes sent to other ranks as patches.
    pub sent_bytes: usize,
    /// Pixel bytes of the region result sent to, or received by, the root rank.
    pub gathered_bytes: usize,
}

/// The per-pass context of a rank.
///
/// The context is reset at the start of every pass, so nothing leaks from one render
/// into the next.
#[derive(Debug)]
pub(crate) struct RenderPass {
    pub(crate) pass: u64,
    pub(crate) state: PassState,
    pub(crate) rank: usize,
    pub(crate) width: u32,
    pub(crate) partition: RegionPartition,
    /// Patches of the local region, in arrival order.
    pub(crate) pending: Vec<ImagePatch>,
    /// The local region, sized to `bbox`.
    pub(crate) partial: ImageBuffer,
    pub(crate) bbox: BoundingBox,
    pub(crate) compositing_done: bool,
    /// The number of direct-send rounds run so far in this pass.
    pub(crate) rounds: usize,
    /// The assembled image, only ever present on the root rank.
    pub(crate) final_image: Option<ImageBuffer>,
    pub(crate) stats: PassStats,
}

impl RenderPass {
    pub(crate) fn new(rank: usize, width: u32, partition: RegionPartition) -> Self {
        Self {
            pass: 0,
            state: PassState::Idle,
            rank,
            width,
            partition,
            pending: Vec::new(),
            partial: ImageBuffer::new(Extents::EMPTY),
            bbox: BoundingBox::new(),
            compositing_done: false,
            rounds: 0,
            final_image: None,
            stats: PassStats::default(),
        }
    }

    /// Start pass `pass`, dropping everything left over from the previous one.
    pub(crate) fn reset(&mut self, pass: u64) {
        self.pass = pass;
        self.state = PassState::Collecting;
        self.pending.clear();
        self.partial.reset(Extents::EMPTY);
        self.bbox.reset();
        self.compositing_done = false;
        self.rounds = 0;
        self.final_image = None;
        self.stats = PassStats::default();
    }

    /// The extents of the whole image.
    pub(crate) fn screen(&self) -> Extents {
        Extents::from_size(self.width, self.partition.image_height())
    }

    /// The region owned by this rank.
    pub(crate) fn region(&self) -> Region {
        // The partition always has one region per rank.
        self.partition.regions()[self.rank]
    }

    /// The screen-space extents of the region owned by this rank.
    pub(crate) fn region_extents(&self) -> Extents {
        self.region().extents(self.width)
    }

    pub(crate) fn expect_state(&self, operation: &'static str, expected: PassState) -> Result<()> {
        if self.state != expected {
            return Err(CompositeError::InvalidState {
                operation,
                state: self.state,
            });
        }

        Ok(())
    }
}
