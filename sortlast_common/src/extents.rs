// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer rectangles in screen space.

/// An axis-aligned, half-open rectangle of pixels in screen space.
///
/// The rectangle covers the columns `x_min..x_max` and the rows `y_min..y_max`. Row 0 is
/// the top row of the image, and `y` grows downwards. A rectangle whose maximum is not
/// greater than its minimum along either axis is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extents {
    /// The first column (inclusive).
    pub x_min: i32,
    /// The last column (exclusive).
    pub x_max: i32,
    /// The first row (inclusive).
    pub y_min: i32,
    /// The last row (exclusive).
    pub y_max: i32,
}

impl Extents {
    /// The canonical empty rectangle.
    pub const EMPTY: Self = Self::new(0, 0, 0, 0);

    /// Create new extents from `[x_min, x_max, y_min, y_max]`.
    pub const fn new(x_min: i32, x_max: i32, y_min: i32, y_max: i32) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Create extents covering a whole `width` x `height` image anchored at the origin.
    ///
    /// # Panics
    ///
    /// Panics if either dimension doesn't fit into an `i32`.
    pub fn from_size(width: u32, height: u32) -> Self {
        let width = i32::try_from(width).expect("image width must fit into an i32");
        let height = i32::try_from(height).expect("image height must fit into an i32");

        Self::new(0, width, 0, height)
    }

    /// Create extents from the `[x_min, x_max, y_min, y_max]` array layout.
    pub const fn from_array(e: [i32; 4]) -> Self {
        Self::new(e[0], e[1], e[2], e[3])
    }

    /// Return the extents in the `[x_min, x_max, y_min, y_max]` array layout.
    pub const fn to_array(self) -> [i32; 4] {
        [self.x_min, self.x_max, self.y_min, self.y_max]
    }

    /// The number of columns covered, zero for empty extents.
    pub fn width(&self) -> u32 {
        self.x_max.saturating_sub(self.x_min).max(0).unsigned_abs()
    }

    /// The number of rows covered, zero for empty extents.
    pub fn height(&self) -> u32 {
        self.y_max.saturating_sub(self.y_min).max(0).unsigned_abs()
    }

    /// The number of pixels covered.
    pub fn area(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Whether the extents cover no pixel at all.
    pub fn is_empty(&self) -> bool {
        self.x_max <= self.x_min || self.y_max <= self.y_min
    }

    /// Whether the pixel at `(x, y)` lies inside the extents.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x_min && x < self.x_max && y >= self.y_min && y < self.y_max
    }

    /// The intersection of both rectangles. The result may be empty.
    pub fn intersect(&self, other: &Self) -> Self {
        Self::new(
            self.x_min.max(other.x_min),
            self.x_max.min(other.x_max),
            self.y_min.max(other.y_min),
            self.y_max.min(other.y_max),
        )
    }

    /// The smallest rectangle containing both rectangles.
    ///
    /// Empty rectangles don't contribute to the union.
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }

        Self::new(
            self.x_min.min(other.x_min),
            self.x_max.max(other.x_max),
            self.y_min.min(other.y_min),
            self.y_max.max(other.y_max),
        )
    }

    /// Restrict the rows to `y_min..y_max`, keeping the columns.
    pub fn with_rows(&self, y_min: i32, y_max: i32) -> Self {
        Self::new(self.x_min, self.x_max, y_min, y_max)
    }
}

impl From<[i32; 4]> for Extents {
    fn from(e: [i32; 4]) -> Self {
        Self::from_array(e)
    }
}
