// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sortlast is a distributed image compositor for ray-cast volume rendering.
//!
//! Every rank renders a handful of image patches, each with its own screen-space extents
//! and depth. Sortlast splits the final image into one horizontal region per rank, sends
//! every patch straight to the rank(s) owning the rows it covers ("direct send"), blends
//! the patches of each region in depth order and gathers the regions on rank 0.
//!
//! # Usage
//!
//! ```no_run
//! use sortlast::{CompositeSettings, Communicator, Compositor, ThreadWorld};
//! use sortlast::common::buffer::ImageBuffer;
//! use sortlast::common::extents::Extents;
//! use sortlast::common::patch::{ImagePatch, PatchId};
//! use sortlast::common::pixel::RgbaF32;
//!
//! let world = ThreadWorld::new(4).unwrap();
//! let images = world.run(|comm| -> sortlast::Result<Option<Vec<u8>>> {
//!     let mut compositor = Compositor::new(comm, CompositeSettings::default());
//!     compositor.region_allocation(4, 100, 100)?;
//!
//!     let rank = comm.rank();
//!     let extents = Extents::new(0, 50, 10 * rank as i32, 10 * rank as i32 + 30);
//!     let image = ImageBuffer::filled(extents, RgbaF32::new(1.0, 0.0, 0.0, 0.5));
//!     let patch = ImagePatch::new(PatchId::new(rank, 0), rank as f32, image);
//!
//!     compositor.composite(vec![patch])?;
//!
//!     if rank == 0 {
//!         let mut rgba = vec![0; 100 * 100 * 4];
//!         compositor.get_composited_image(100, 100, &mut rgba)?;
//!         Ok(Some(rgba))
//!     } else {
//!         Ok(None)
//!     }
//! });
//! ```
//!
//! # Features
//!
//! - `multithreading` (enabled by default): Run several ranks as threads of one
//!   process with [`ThreadWorld`], and convert the final image on the [rayon] pool.
//!
//! Without `multithreading`, only the single-rank [`LocalCommunicator`] is available and
//! every "send" degrades to local composition.
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![warn(clippy::print_stdout, clippy::print_stderr)]
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
#![forbid(unsafe_code)]

pub mod blend;
pub mod comm;
mod compositor;
mod context;
mod error;
mod gather;
mod pack;
mod region;
pub mod router;
mod settings;

pub use comm::single_threaded::LocalCommunicator;
#[cfg(feature = "multithreading")]
pub use comm::multi_threaded::{ThreadCommunicator, ThreadWorld};
pub use comm::{Communicator, Expected, MessageKind};
pub use compositor::Compositor;
pub use context::{PassState, PassStats};
pub use error::{CompositeError, Result};
pub use peniko;
pub use settings::{BlendOrder, CompositeSettings, OutputFormat};
pub use sortlast_common as common;
