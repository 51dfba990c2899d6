//! Storage for per-(level, ROI) vectors whose length depends on the level.
//!
//! Every integration level has its own number of histogram bins (the
//! maximum synthesized count grows with the level), but all ROIs within a
//! level share it. [`RaggedHistograms`] packs everything into one flat
//! buffer and indexes it by `(level, roi)`.

use ndarray::ArrayView2;
use std::ops::{Index, IndexMut};

#[derive(Clone, Debug, PartialEq)]
pub struct RaggedHistograms {
    n_rois: usize,
    // entries per ROI at each level
    level_lens: Vec<usize>,
    // start of each level's block within `data`
    level_offsets: Vec<usize>,
    data: Vec<f64>,
}

impl RaggedHistograms {
    /// allocate zero-filled storage where every ROI at level `i` holds
    /// `level_lens[i]` entries
    pub fn zeros(level_lens: &[usize], n_rois: usize) -> Self {
        let mut level_offsets = Vec::with_capacity(level_lens.len());
        let mut total = 0;
        for len in level_lens {
            level_offsets.push(total);
            total += len * n_rois;
        }
        RaggedHistograms {
            n_rois,
            level_lens: level_lens.to_vec(),
            level_offsets,
            data: vec![0.0; total],
        }
    }

    pub fn n_levels(&self) -> usize {
        self.level_lens.len()
    }

    pub fn n_rois(&self) -> usize {
        self.n_rois
    }

    /// the number of entries held by each ROI at `level`
    pub fn level_len(&self, level: usize) -> usize {
        self.level_lens[level]
    }

    pub fn level_lens(&self) -> &[usize] {
        &self.level_lens
    }

    /// `true` when `other` has the same number of levels, ROIs and entries
    pub fn same_layout(&self, other: &RaggedHistograms) -> bool {
        self.n_rois == other.n_rois && self.level_lens == other.level_lens
    }

    fn range(&self, level: usize, roi: usize) -> std::ops::Range<usize> {
        assert!(
            roi < self.n_rois,
            "roi index {roi} is out of bounds ({} rois)",
            self.n_rois
        );
        let len = self.level_lens[level];
        let start = self.level_offsets[level] + roi * len;
        start..start + len
    }

    /// # Panics
    /// Panics if `level` or `roi` is out of bounds.
    pub fn get(&self, level: usize, roi: usize) -> &[f64] {
        &self.data[self.range(level, roi)]
    }

    /// # Panics
    /// Panics if `level` or `roi` is out of bounds.
    pub fn get_mut(&mut self, level: usize, roi: usize) -> &mut [f64] {
        let range = self.range(level, roi);
        &mut self.data[range]
    }

    /// view all of the ROIs at `level` as a `(n_rois, level_len)` array
    pub fn level(&self, level: usize) -> ArrayView2<'_, f64> {
        let len = self.level_lens[level];
        let start = self.level_offsets[level];
        let block = &self.data[start..start + len * self.n_rois];
        // the block length is n_rois * len by construction
        ArrayView2::from_shape((self.n_rois, len), block).expect("block has a consistent shape")
    }

    /// iterate over every `((level, roi), entries)` pair in level-major order
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &[f64])> + '_ {
        (0..self.n_levels())
            .flat_map(move |level| (0..self.n_rois).map(move |roi| (level, roi)))
            .map(move |(level, roi)| ((level, roi), self.get(level, roi)))
    }

    pub(crate) fn as_flat(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn as_flat_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

impl Index<(usize, usize)> for RaggedHistograms {
    type Output = [f64];

    fn index(&self, (level, roi): (usize, usize)) -> &[f64] {
        self.get(level, roi)
    }
}

impl IndexMut<(usize, usize)> for RaggedHistograms {
    fn index_mut(&mut self, (level, roi): (usize, usize)) -> &mut [f64] {
        self.get_mut(level, roi)
    }
}
