// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositor configuration.

use peniko::color::palette::css::BLACK;
use peniko::color::{AlphaColor, Srgb};

/// The order in which the patches of a region are blended.
///
/// Both orders produce the same image; they only differ in traversal and in the
/// formula used to accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendOrder {
    /// Nearest patch first, tracking the remaining transparency.
    #[default]
    FrontToBack,
    /// Farthest patch first, applying the "over" operator.
    BackToFront,
}

/// The byte layout produced by [`get_composited_image`](crate::Compositor::get_composited_image).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// Four bytes per pixel, `[r, g, b, a]`.
    #[default]
    Rgba8,
    /// Three bytes per pixel, `[r, g, b]`.
    Rgb8,
}

impl OutputFormat {
    /// The number of bytes per pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 => 4,
            Self::Rgb8 => 3,
        }
    }
}

/// Settings that apply to every render pass of a [`Compositor`](crate::Compositor).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeSettings {
    /// The color the final image is blended onto.
    pub background: AlphaColor<Srgb>,
    /// The order in which overlapping patches are blended.
    pub blend_order: BlendOrder,
    /// Whether partial images are run-length encoded before being gathered.
    pub compress_gather: bool,
    /// The layout of the bytes returned for the final image.
    pub output_format: OutputFormat,
    /// Whether the final image is converted to bytes on the thread pool, one task per
    /// region. Only has an effect with the `multithreading` feature.
    pub parallel_pack: bool,
}

impl Default for CompositeSettings {
    fn default() -> Self {
        Self {
            background: BLACK,
            blend_order: BlendOrder::default(),
            compress_gather: true,
            output_format: OutputFormat::default(),
            parallel_pack: true,
        }
    }
}
