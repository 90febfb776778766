// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Splitting the rows of an image into one horizontal region per rank.

use crate::extents::Extents;
use alloc::vec::Vec;
use core::ops::RangeInclusive;

/// A contiguous band of image rows, `start..start + size`.
///
/// Region `i` is owned by rank `i`. A region may have zero rows if there are more ranks
/// than image rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    /// The index of the region, which is also the rank that owns it.
    pub index: usize,
    /// The first row of the region.
    pub start: u32,
    /// The number of rows in the region.
    pub size: u32,
}

impl Region {
    /// The row after the last row of the region.
    pub fn end(&self) -> u32 {
        self.start + self.size
    }

    /// Whether the region has no rows.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The screen-space extents of the region for an image of the given width.
    pub fn extents(&self, width: u32) -> Extents {
        // Both values are bounded by the image height, which `RegionPartition` keeps
        // within `i32`.
        let start = self.start as i32;
        let end = self.end() as i32;

        Extents::new(0, width as i32, start, end)
    }
}

/// The partitioning of `0..image_height` into contiguous regions, ordered top to bottom.
///
/// Region sizes differ by at most one row: the first `image_height % num_regions`
/// regions get the extra rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionPartition {
    regions: Vec<Region>,
    image_height: u32,
    max_region_height: u32,
}

impl RegionPartition {
    /// Compute the region extents for `num_regions` ranks and an image of `image_height`
    /// rows.
    ///
    /// # Panics
    ///
    /// Panics if `num_regions` or `image_height` is zero, or if `image_height` doesn't
    /// fit into an `i32`.
    pub fn new(num_regions: usize, image_height: u32) -> Self {
        assert!(num_regions > 0, "at least one region is required");
        assert!(image_height > 0, "the image must have at least one row");
        assert!(
            i32::try_from(image_height).is_ok(),
            "the image height must fit into an i32"
        );

        let (base, remainder) = Self::split(num_regions, image_height);

        let mut regions = Vec::with_capacity(num_regions);
        let mut start = 0;

        for index in 0..num_regions {
            let size = if index < remainder { base + 1 } else { base };
            regions.push(Region { index, start, size });
            start += size;
        }

        debug_assert_eq!(start, image_height, "regions must cover the whole image");

        let max_region_height = if remainder > 0 { base + 1 } else { base };

        log::debug!(
            "partitioned {image_height} rows into {num_regions} regions (max height {max_region_height})"
        );

        Self {
            regions,
            image_height,
            max_region_height,
        }
    }

    /// The base region height and the number of regions that get one extra row.
    fn split(num_regions: usize, image_height: u32) -> (u32, usize) {
        // A `num_regions` beyond `u32::MAX` simply leaves every region at base 0.
        let n = u32::try_from(num_regions).unwrap_or(u32::MAX);
        let base = image_height / n;
        let remainder = (image_height % n) as usize;

        (base, remainder)
    }

    /// The number of regions.
    pub fn num_regions(&self) -> usize {
        self.regions.len()
    }

    /// The number of rows in the image.
    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    /// The height of the tallest region, used to size region buffers.
    pub fn max_region_height(&self) -> u32 {
        self.max_region_height
    }

    /// All regions, top to bottom.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// The region with the given index.
    pub fn region(&self, index: usize) -> Option<&Region> {
        self.regions.get(index)
    }

    /// The index of the region containing `row`, or `None` if the row lies outside the
    /// image.
    pub fn region_of_row(&self, row: u32) -> Option<usize> {
        if row >= self.image_height {
            return None;
        }

        let (base, remainder) = Self::split(self.regions.len(), self.image_height);
        // Rows covered by the taller regions at the top.
        let tall_rows = remainder as u32 * (base + 1);

        if row < tall_rows {
            Some((row / (base + 1)) as usize)
        } else {
            // `base` is non-zero here, since otherwise every row is below `tall_rows`.
            Some(remainder + ((row - tall_rows) / base) as usize)
        }
    }

    /// Compute the inclusive range of regions that the rows of `patch` overlap.
    ///
    /// The patch is first clamped to `screen`, the extents of the whole image; row
    /// `screen.y_min` is the first row of region 0. Returns `None` if nothing remains
    /// after clamping.
    pub fn find_regions(&self, patch: &Extents, screen: &Extents) -> Option<RangeInclusive<usize>> {
        let clamped = patch.intersect(screen);
        if clamped.is_empty() {
            return None;
        }

        let first_row = (clamped.y_min - screen.y_min).unsigned_abs();
        let last_row = (clamped.y_max - 1 - screen.y_min).unsigned_abs();

        let from = self.region_of_row(first_row)?;
        let to = self.region_of_row(last_row.min(self.image_height - 1))?;

        Some(from..=to)
    }
}

#[cfg(test)]
mod tests {
    use crate::extents::Extents;
    use crate::partition::RegionPartition;

    fn check_partition(num_regions: usize, image_height: u32) {
        let partition = RegionPartition::new(num_regions, image_height);
        let regions = partition.regions();
        assert_eq!(regions.len(), num_regions);

        let mut next = 0;
        let mut min = u32::MAX;
        let mut max = 0;

        for (i, region) in regions.iter().enumerate() {
            assert_eq!(region.index, i);
            assert_eq!(region.start, next, "regions must be contiguous");
            next = region.end();
            min = min.min(region.size);
            max = max.max(region.size);
        }

        assert_eq!(next, image_height, "regions must cover the image exactly");
        assert!(max - min <= 1, "region sizes must differ by at most one row");
        assert_eq!(partition.max_region_height(), max);
    }

    #[test]
    fn partition_completeness() {
        for num_regions in 1..=64 {
            for image_height in (1..=256).chain([511, 1000, 1023, 4095, 4096]) {
                check_partition(num_regions, image_height);
            }
        }
    }

    #[test]
    fn partition_remainder_goes_to_top() {
        let partition = RegionPartition::new(4, 10);
        let sizes: alloc::vec::Vec<_> = partition.regions().iter().map(|r| r.size).collect();
        assert_eq!(sizes, [3, 3, 2, 2]);
    }

    #[test]
    fn partition_more_regions_than_rows() {
        let partition = RegionPartition::new(5, 3);
        let sizes: alloc::vec::Vec<_> = partition.regions().iter().map(|r| r.size).collect();
        assert_eq!(sizes, [1, 1, 1, 0, 0]);
        assert_eq!(partition.region_of_row(2), Some(2));
        assert_eq!(partition.region_of_row(3), None);
    }

    #[test]
    #[should_panic(expected = "at least one region")]
    fn partition_zero_regions() {
        let _ = RegionPartition::new(0, 10);
    }

    #[test]
    #[should_panic(expected = "at least one row")]
    fn partition_zero_height() {
        let _ = RegionPartition::new(3, 0);
    }

    #[test]
    fn partition_region_of_row_matches_regions() {
        for (n, h) in [(1, 7), (3, 10), (4, 100), (7, 50), (64, 4096), (10, 4)] {
            let partition = RegionPartition::new(n, h);
            for region in partition.regions() {
                for row in region.start..region.end() {
                    assert_eq!(partition.region_of_row(row), Some(region.index));
                }
            }
        }
    }

    #[test]
    fn find_regions_straddling_boundary() {
        let partition = RegionPartition::new(4, 100);
        let screen = Extents::from_size(100, 100);

        assert_eq!(
            partition.find_regions(&Extents::new(0, 50, 0, 30), &screen),
            Some(0..=1)
        );
        assert_eq!(
            partition.find_regions(&Extents::new(0, 50, 20, 60), &screen),
            Some(0..=2)
        );
        assert_eq!(
            partition.find_regions(&Extents::new(0, 50, 25, 50), &screen),
            Some(1..=1)
        );
    }

    #[test]
    fn find_regions_clamps_to_screen() {
        let partition = RegionPartition::new(4, 100);
        let screen = Extents::from_size(100, 100);

        assert_eq!(
            partition.find_regions(&Extents::new(-10, 10, -40, 10), &screen),
            Some(0..=0)
        );
        assert_eq!(
            partition.find_regions(&Extents::new(0, 10, 90, 400), &screen),
            Some(3..=3)
        );
        assert_eq!(
            partition.find_regions(&Extents::new(0, 10, 100, 120), &screen),
            None
        );
        assert_eq!(
            partition.find_regions(&Extents::new(100, 120, 0, 10), &screen),
            None
        );
    }
}
