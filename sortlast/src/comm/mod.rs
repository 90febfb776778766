// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Message passing between ranks.
//!
//! Every message kind travels on its own channel, so a receiver never has to inspect
//! tags to tell patch data from results. Receives are bounded: they take an [`Expected`]
//! count, which can only be obtained from the exchange that precedes the corresponding
//! sends.

#[cfg(feature = "multithreading")]
pub mod multi_threaded;
pub mod single_threaded;

use crate::error::Result;
use core::fmt::Debug;
use sortlast_common::encode::EncodedImage;
use sortlast_common::buffer::ImageBuffer;
use sortlast_common::extents::Extents;
use sortlast_common::patch::ImagePatch;

/// The rank that assembles the final image.
pub const ROOT: usize = 0;

/// The kinds of messages exchanged between ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// How many data messages a rank is about to send to another rank.
    Count,
    /// A (cropped) patch on its way to the rank owning its region.
    Data,
    /// A composited region on its way to the root rank.
    Result,
    /// Synchronization of all ranks.
    Barrier,
}

/// The number of messages a rank has been told to expect.
///
/// Only the crate can create these, from a count exchange or from the size of the
/// world, which ties every receive loop to an announced number of messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expected(usize);

impl Expected {
    pub(crate) fn new(count: usize) -> Self {
        Self(count)
    }

    /// The number of messages to receive.
    pub fn count(self) -> usize {
        self.0
    }
}

/// A patch (or the part of it inside one region) sent to the rank owning that region.
#[derive(Debug, Clone)]
pub struct DataMessage {
    /// The render pass the patch belongs to.
    pub pass: u64,
    /// The destination region.
    pub region: usize,
    /// The patch, already cropped to the region.
    pub patch: ImagePatch,
}

/// The pixels of a composited region.
#[derive(Debug, Clone)]
pub enum RegionPayload {
    /// The region received no patches.
    Empty,
    /// The touched area of the region.
    Raw(ImageBuffer),
    /// The touched area of the region, run-length encoded.
    Encoded(EncodedImage),
}

impl RegionPayload {
    /// The area covered by the payload.
    pub fn extents(&self) -> Extents {
        match self {
            Self::Empty => Extents::EMPTY,
            Self::Raw(image) => image.extents(),
            Self::Encoded(encoded) => encoded.extents(),
        }
    }

    /// The number of pixel bytes carried by the payload.
    pub fn byte_len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Raw(image) => image.byte_len(),
            Self::Encoded(encoded) => encoded.byte_len(),
        }
    }

    /// Write the payload into `dst`, cropping to its extents.
    pub fn place_into(&self, dst: &mut ImageBuffer) -> Extents {
        match self {
            Self::Empty => Extents::EMPTY,
            Self::Raw(image) => sortlast_common::placement::place_in_image(image, dst),
            Self::Encoded(encoded) => encoded.decode_into(dst),
        }
    }
}

/// A composited region sent to the root rank.
#[derive(Debug, Clone)]
pub struct ResultMessage {
    /// The render pass the region belongs to.
    pub pass: u64,
    /// The region that was composited.
    pub region: usize,
    /// The rank that composited it.
    pub source: usize,
    /// The pixels.
    pub payload: RegionPayload,
}

/// The transport connecting the ranks of one compositing world.
///
/// All operations except the sends are collective or bounded: every rank must call
/// [`exchange_counts`](Self::exchange_counts) and [`barrier`](Self::barrier) the same
/// number of times, and receives block until exactly the expected number of messages
/// has arrived. Sends never block.
pub trait Communicator: Debug + Send + Sync {
    /// The index of this rank.
    fn rank(&self) -> usize;
    /// The number of ranks.
    fn size(&self) -> usize;
    /// Tell every other rank how many data messages this rank will send it during
    /// `pass`, and learn how many this rank will receive.
    ///
    /// `outgoing[r]` is the number of messages for rank `r`; the entry for this rank is
    /// ignored.
    fn exchange_counts(&self, pass: u64, outgoing: &[usize]) -> Result<Expected>;
    /// Send a patch to `dest`.
    fn send_data(&self, dest: usize, msg: DataMessage) -> Result<()>;
    /// Receive exactly `expected` data messages, in arrival order.
    fn recv_data(&self, expected: Expected) -> Result<Vec<DataMessage>>;
    /// Send a composited region to the root rank.
    fn send_result(&self, msg: ResultMessage) -> Result<()>;
    /// On the root rank, receive one result from every other rank.
    fn gather_results(&self) -> Result<Vec<ResultMessage>>;
    /// Block until every rank has reached the barrier.
    fn barrier(&self) -> Result<()>;
}

impl<C: Communicator + ?Sized> Communicator for &C {
    fn rank(&self) -> usize {
        (**self).rank()
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn exchange_counts(&self, pass: u64, outgoing: &[usize]) -> Result<Expected> {
        (**self).exchange_counts(pass, outgoing)
    }

    fn send_data(&self, dest: usize, msg: DataMessage) -> Result<()> {
        (**self).send_data(dest, msg)
    }

    fn recv_data(&self, expected: Expected) -> Result<Vec<DataMessage>> {
        (**self).recv_data(expected)
    }

    fn send_result(&self, msg: ResultMessage) -> Result<()> {
        (**self).send_result(msg)
    }

    fn gather_results(&self) -> Result<Vec<ResultMessage>> {
        (**self).gather_results()
    }

    fn barrier(&self) -> Result<()> {
        (**self).barrier()
    }
}
