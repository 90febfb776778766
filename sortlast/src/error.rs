// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::comm::MessageKind;
use crate::context::PassState;
use thiserror::Error;

/// Errors that can occur while compositing.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CompositeError {
    /// A world needs at least one rank.
    #[error("At least one rank is required")]
    NoRanks,
    /// The image has a zero dimension, or one that doesn't fit into screen coordinates.
    #[error("Invalid image size {width}x{height}")]
    InvalidImageSize {
        /// The requested width.
        width: u32,
        /// The requested height.
        height: u32,
    },
    /// Regions were allocated for a different number of ranks than the communicator has.
    #[error("Regions allocated for {requested} ranks, but the communicator has {actual}")]
    RankCountMismatch {
        /// The rank count passed to the allocation.
        requested: usize,
        /// The size of the communicator.
        actual: usize,
    },
    /// A message was addressed to a rank that doesn't exist.
    #[error("Rank {rank} is out of range for {size} ranks")]
    RankOutOfRange {
        /// The offending rank.
        rank: usize,
        /// The number of ranks.
        size: usize,
    },
    /// An operation was used before [`region_allocation`](crate::Compositor::region_allocation).
    #[error("Regions have not been allocated")]
    NotAllocated,
    /// An operation was used in the wrong state of the render pass.
    #[error("`{operation}` is not valid while the pass is {state:?}")]
    InvalidState {
        /// The attempted operation.
        operation: &'static str,
        /// The state of the pass at the time.
        state: PassState,
    },
    /// The composited image only exists on rank 0.
    #[error("The composited image is only available on rank 0, not on rank {0}")]
    NotRoot(usize),
    /// The requested image size doesn't match the allocated one.
    #[error("Requested a {requested_width}x{requested_height} image, but regions were allocated for {width}x{height}")]
    SizeMismatch {
        /// The requested width.
        requested_width: u32,
        /// The requested height.
        requested_height: u32,
        /// The allocated width.
        width: u32,
        /// The allocated height.
        height: u32,
    },
    /// The output buffer can't hold the image.
    #[error("Output buffer holds {actual} bytes, but {expected} are required")]
    OutputTooSmall {
        /// The number of bytes required.
        expected: usize,
        /// The size of the provided buffer.
        actual: usize,
    },
    /// A peer broke the compositing protocol.
    #[error("Protocol violation: {0}")]
    Protocol(String),
    /// A peer rank hung up while a message was in flight.
    #[error("A peer disconnected while exchanging {0:?} messages")]
    Disconnected(MessageKind),
    /// The thread pool hosting the ranks couldn't be created.
    #[cfg(feature = "multithreading")]
    #[error("Couldn't create the rank thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// The result type used throughout Sortlast.
pub type Result<T, E = CompositeError> = std::result::Result<T, E>;
