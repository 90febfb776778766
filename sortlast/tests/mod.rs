// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The integration tests of `sortlast`.
//! - The `util` module contains the helpers shared by all tests: running a world of ranks,
//!   building solid patches and compositing a reference image on a single thread.
//! - Every other module covers one topic. Put the topic at the start of a test name, e.g.
//!   `gather_compressed_matches_raw` rather than `compressed_gather_matches_raw`.

#![allow(missing_docs, reason = "we don't need docs for testing")]
#![allow(clippy::cast_possible_truncation, reason = "not critical for testing")]

mod direct_send;
mod gather;
mod util;
