// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendered image patches.

use crate::buffer::ImageBuffer;
use crate::extents::Extents;
use core::cmp::Ordering;

/// Identifies a patch: the rank that rendered it and its index on that rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatchId {
    /// The rank that rendered the patch.
    pub rank: usize,
    /// The index of the patch among the patches of its rank.
    pub index: usize,
}

impl PatchId {
    /// Create a new patch ID.
    pub const fn new(rank: usize, index: usize) -> Self {
        Self { rank, index }
    }
}

/// A rendered sub-image with its screen-space position and depth.
///
/// The pixels carry straight (non-premultiplied) alpha. Smaller depths are nearer to
/// the camera.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePatch {
    id: PatchId,
    depth: f32,
    image: ImageBuffer,
}

impl ImagePatch {
    /// Create a new patch.
    pub fn new(id: PatchId, depth: f32, image: ImageBuffer) -> Self {
        Self { id, depth, image }
    }

    /// The ID of the patch.
    pub fn id(&self) -> PatchId {
        self.id
    }

    /// The depth of the patch.
    pub fn depth(&self) -> f32 {
        self.depth
    }

    /// The screen-space rectangle covered by the patch.
    pub fn extents(&self) -> Extents {
        self.image.extents()
    }

    /// The pixels of the patch.
    pub fn image(&self) -> &ImageBuffer {
        &self.image
    }

    /// Consume the patch, returning its pixels.
    pub fn into_image(self) -> ImageBuffer {
        self.image
    }

    /// The part of the patch inside `extents`, or `None` if they don't overlap.
    pub fn crop(&self, extents: &Extents) -> Option<Self> {
        let image = self.image.crop(extents);

        (!image.is_empty()).then(|| Self {
            id: self.id,
            depth: self.depth,
            image,
        })
    }

    /// Order patches nearest first.
    ///
    /// Ties are broken by ID, so that every rank sorts the same set of patches into the
    /// same sequence.
    pub fn depth_cmp(&self, other: &Self) -> Ordering {
        self.depth
            .total_cmp(&other.depth)
            .then_with(|| self.id.cmp(&other.id))
    }
}

#[cfg(test)]
mod tests {
    use crate::buffer::ImageBuffer;
    use crate::extents::Extents;
    use crate::patch::{ImagePatch, PatchId};
    use crate::pixel::RgbaF32;
    use alloc::vec::Vec;

    fn patch(rank: usize, index: usize, depth: f32) -> ImagePatch {
        let image = ImageBuffer::filled(Extents::new(0, 4, 0, 4), RgbaF32::new(1.0, 0.0, 0.0, 1.0));
        ImagePatch::new(PatchId::new(rank, index), depth, image)
    }

    #[test]
    fn patch_crop() {
        let p = patch(0, 0, 1.0);
        let cropped = p.crop(&Extents::new(2, 10, 3, 10)).unwrap();
        assert_eq!(cropped.extents(), Extents::new(2, 4, 3, 4));
        assert_eq!(cropped.id(), p.id());
        assert_eq!(cropped.depth(), p.depth());

        assert!(p.crop(&Extents::new(4, 10, 0, 4)).is_none());
    }

    #[test]
    fn patch_depth_order() {
        let mut patches = [patch(2, 0, 0.5), patch(0, 1, 1.0), patch(1, 0, 0.5), patch(0, 0, 0.1)];
        patches.sort_by(ImagePatch::depth_cmp);

        let ids: Vec<_> = patches.iter().map(|p| (p.id().rank, p.id().index)).collect();
        assert_eq!(ids, [(0, 0), (1, 0), (2, 0), (0, 1)]);
    }
}
