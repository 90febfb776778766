// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This crate includes the data structures shared by the stages of the [Sortlast][sortlast]
//! compositor: integer screen-space extents, the partitioning of an image into horizontal
//! regions, owned floating-point image buffers and the routines that place one buffer
//! into another.
//!
//! # Usage
//!
//! This crate should not be used on its own. It does no communication and no blending;
//! you probably want [`sortlast`][sortlast], which builds the distributed compositor on
//! top of it.
//!
//! # Contents
//!
//! - [`Extents`][extents::Extents] and the running [`BoundingBox`][bbox::BoundingBox]
//! - [`RegionPartition`][partition::RegionPartition], one horizontal band per rank
//! - [`ImageBuffer`][buffer::ImageBuffer] and [`ImagePatch`][patch::ImagePatch]
//! - Bounds-safe [placement][placement] of a buffer into another
//! - Lossless run-length [encoding][encode] of partial images
//!
//! [sortlast]: https://crates.io/crates/sortlast
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![warn(clippy::print_stdout, clippy::print_stderr)]
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
#![forbid(unsafe_code)]
#![no_std]

extern crate alloc;

pub mod bbox;
pub mod buffer;
pub mod encode;
pub mod extents;
pub mod partition;
pub mod patch;
pub mod pixel;
pub mod placement;
