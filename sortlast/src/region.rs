// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Splitting a single mutable output buffer into the rows of each region, so that the
//! regions can be written concurrently.

use sortlast_common::partition::RegionPartition;

#[derive(Debug)]
pub(crate) struct Bands<'a> {
    bands: Vec<Band<'a>>,
}

impl<'a> Bands<'a> {
    /// Split `buffer`, which holds `width` pixels of `bytes_per_pixel` bytes per row, along
    /// the regions of `partition`.
    ///
    /// # Panics
    ///
    /// Panics if `buffer` doesn't hold exactly the rows of the partition.
    pub(crate) fn new(
        partition: &RegionPartition,
        width: u32,
        bytes_per_pixel: usize,
        mut buffer: &'a mut [u8],
    ) -> Self {
        let row_advance = width as usize * bytes_per_pixel;
        assert_eq!(
            buffer.len(),
            row_advance * partition.image_height() as usize,
            "Expected the buffer to hold exactly `image_height` rows"
        );

        let mut bands = Vec::with_capacity(partition.num_regions());

        for region in partition.regions() {
            let (head, tail) = buffer.split_at_mut(row_advance * region.size as usize);
            buffer = tail;

            bands.push(Band {
                start: region.start,
                height: region.size,
                row_advance,
                rows: head,
            });
        }

        Self { bands }
    }

    /// Apply the given function to each band. The functions will be applied
    /// in parallel in the current threadpool.
    #[cfg(feature = "multithreading")]
    pub(crate) fn update_bands_par(&mut self, func: impl Fn(&mut Band<'_>) + Send + Sync) {
        use rayon::iter::ParallelIterator;
        use rayon::prelude::IntoParallelRefMutIterator;

        self.bands.par_iter_mut().for_each(func);
    }

    /// Apply the given function to each band.
    pub(crate) fn update_bands(&mut self, func: impl FnMut(&mut Band<'_>)) {
        self.bands.iter_mut().for_each(func);
    }
}

/// The rows of one region inside the output buffer.
#[derive(Debug)]
pub(crate) struct Band<'a> {
    /// The first image row of the band.
    pub(crate) start: u32,
    pub(crate) height: u32,
    row_advance: usize,
    rows: &'a mut [u8],
}

impl Band<'_> {
    /// The bytes of row `row` of the band, counted from its first row.
    pub(crate) fn row_mut(&mut self, row: u32) -> &mut [u8] {
        let start = row as usize * self.row_advance;
        &mut self.rows[start..start + self.row_advance]
    }
}
