// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracking the area touched so far.

use crate::extents::Extents;

/// A running bounding box of all pixels touched so far.
///
/// The box starts out inverted (minimums at `i32::MAX`, maximums at `i32::MIN`), so the
/// first non-empty update always replaces it entirely. Once updated, it always satisfies
/// `x_min < x_max` and `y_min < y_max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    x_min: i32,
    x_max: i32,
    y_min: i32,
    y_max: i32,
}

impl BoundingBox {
    /// The "nothing touched" sentinel.
    pub const EMPTY: Self = Self {
        x_min: i32::MAX,
        x_max: i32::MIN,
        y_min: i32::MAX,
        y_max: i32::MIN,
    };

    /// Create a new, empty bounding box.
    pub const fn new() -> Self {
        Self::EMPTY
    }

    /// Expand the box to the union of itself and `extents`.
    ///
    /// Empty extents leave the box unchanged, and applying the same extents twice has
    /// the same effect as applying them once.
    pub fn update(&mut self, extents: &Extents) {
        if extents.is_empty() {
            return;
        }

        self.x_min = self.x_min.min(extents.x_min);
        self.x_max = self.x_max.max(extents.x_max);
        self.y_min = self.y_min.min(extents.y_min);
        self.y_max = self.y_max.max(extents.y_max);
    }

    /// Return a copy of the box, expanded by `extents`.
    #[must_use]
    pub fn updated(mut self, extents: &Extents) -> Self {
        self.update(extents);
        self
    }

    /// Whether no pixel has been touched yet.
    pub fn is_empty(&self) -> bool {
        self.x_min >= self.x_max || self.y_min >= self.y_max
    }

    /// The touched area, or `None` if nothing has been touched.
    pub fn extents(&self) -> Option<Extents> {
        (!self.is_empty()).then(|| Extents::new(self.x_min, self.x_max, self.y_min, self.y_max))
    }

    /// Go back to the "nothing touched" state.
    pub fn reset(&mut self) {
        *self = Self::EMPTY;
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}
