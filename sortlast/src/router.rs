// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Routing patches to the ranks owning the regions they cover.
//!
//! A round of direct send works in three steps: every rank splits its patches along
//! region boundaries, announces to each peer how many parts it is about to send, and then
//! issues all of its sends before receiving exactly the announced number of parts.

use crate::comm::{Communicator, DataMessage};
use crate::context::{PassState, RenderPass};
use crate::error::{CompositeError, Result};
use core::ops::RangeInclusive;
use smallvec::SmallVec;
use sortlast_common::extents::Extents;
use sortlast_common::partition::RegionPartition;
use sortlast_common::patch::ImagePatch;

/// A patch, or the part of it inside one region, together with the region it belongs to.
#[derive(Debug, Clone)]
pub struct RoutedPatch {
    /// The region, which is also the rank that composites it.
    pub region: usize,
    /// The pixels, cropped to the region.
    pub patch: ImagePatch,
}

/// The routing of all patches of one rank for one round.
#[derive(Debug, Default)]
pub struct RoutingPlan {
    /// The routed parts, ordered by region and then nearest first.
    pub parts: Vec<RoutedPatch>,
    /// Patches that don't overlap the image at all.
    pub skipped: usize,
}

impl RoutingPlan {
    /// The number of parts destined for each of `num_regions` regions.
    pub fn counts(&self, num_regions: usize) -> Vec<usize> {
        let mut counts = vec![0; num_regions];
        for part in &self.parts {
            counts[part.region] += 1;
        }

        counts
    }
}

/// The inclusive range of regions that `patch` overlaps, or `None` if it lies entirely
/// outside `screen`.
pub fn find_regions_for_patch(
    patch: &ImagePatch,
    screen: &Extents,
    partition: &RegionPartition,
) -> Option<RangeInclusive<usize>> {
    partition.find_regions(&patch.extents(), screen)
}

/// Split `patches` along region boundaries.
///
/// A patch that already lies within a single region is moved into the plan as is; all
/// others are cropped once per region they overlap, including horizontally to the image.
pub fn route_patches(
    patches: Vec<ImagePatch>,
    screen: &Extents,
    partition: &RegionPartition,
) -> RoutingPlan {
    let mut plan = RoutingPlan::default();
    let width = screen.width();

    for patch in patches {
        if patch.extents().is_empty() {
            log::warn!("skipping patch {:?} without pixels", patch.id());
            plan.skipped += 1;
            continue;
        }

        let Some(regions) = find_regions_for_patch(&patch, screen, partition) else {
            log::trace!(
                "skipping patch {:?} with extents {:?} outside of the image",
                patch.id(),
                patch.extents()
            );
            plan.skipped += 1;
            continue;
        };

        let first = *regions.start();
        let first_extents = partition.regions()[first].extents(width);
        if first == *regions.end() && patch.extents().intersect(&first_extents) == patch.extents()
        {
            plan.parts.push(RoutedPatch {
                region: first,
                patch,
            });
            continue;
        }

        let parts: SmallVec<[RoutedPatch; 4]> = regions
            .filter_map(|region| {
                let extents = partition.regions()[region].extents(width);
                patch
                    .crop(&extents)
                    .map(|patch| RoutedPatch { region, patch })
            })
            .collect();
        plan.parts.extend(parts);
    }

    plan.parts.sort_by(|a, b| {
        a.region
            .cmp(&b.region)
            .then_with(|| a.patch.depth_cmp(&b.patch))
    });

    plan
}

/// Run one round of direct send for the local `patches`.
///
/// Every rank of the world has to take part in every round, even with no patches to
/// contribute. Parts for the local region are kept in the pending list directly.
pub(crate) fn direct_send<C: Communicator>(
    ctx: &mut RenderPass,
    comm: &C,
    patches: Vec<ImagePatch>,
) -> Result<()> {
    ctx.expect_state("direct_send", PassState::Collecting)?;

    // `begin_pass` synchronizes the first round, later ones must not start until every
    // rank has drained the previous round.
    if ctx.rounds > 0 {
        comm.barrier()?;
    }
    ctx.rounds += 1;

    let plan = route_patches(patches, &ctx.screen(), &ctx.partition);
    ctx.stats.skipped_patches += plan.skipped;

    let mut outgoing = plan.counts(ctx.partition.num_regions());
    outgoing[ctx.rank] = 0;
    let expected = comm.exchange_counts(ctx.pass, &outgoing)?;

    for RoutedPatch { region, patch } in plan.parts {
        if region == ctx.rank {
            ctx.stats.local_patches += 1;
            ctx.pending.push(patch);
            continue;
        }

        ctx.stats.sent_patches += 1;
        ctx.stats.sent_bytes += patch.image().byte_len();
        comm.send_data(
            region,
            DataMessage {
                pass: ctx.pass,
                region,
                patch,
            },
        )?;
    }

    for msg in comm.recv_data(expected)? {
        if msg.pass != ctx.pass {
            return Err(CompositeError::Protocol(format!(
                "rank {} received a patch for pass {} during pass {}",
                ctx.rank, msg.pass, ctx.pass
            )));
        }
        if msg.region != ctx.rank {
            return Err(CompositeError::Protocol(format!(
                "rank {} received a patch for region {}",
                ctx.rank, msg.region
            )));
        }

        ctx.stats.received_patches += 1;
        ctx.pending.push(msg.patch);
    }

    log::trace!(
        "rank {} finished round {} of pass {} with {} pending patches",
        ctx.rank,
        ctx.rounds,
        ctx.pass,
        ctx.pending.len()
    );

    Ok(())
}
