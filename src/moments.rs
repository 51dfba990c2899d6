//! The histogram engine.
//!
//! Whenever the cascade produces a frame at some level (a raw frame at level
//! 0, a synthesized frame above that), the engine computes the count
//! density of every ROI and folds it into that (level, ROI) cell's running
//! mean and running mean-of-squares.

use crate::schedule::level_bin_edges;
use crate::{Error, RaggedHistograms, RoiIndices};
use ndarray::{ArrayView1, ArrayViewMut1};
use std::num::NonZeroU64;
use xsvs_nostd_internal::{
    BinEdges, MeanOfSamples, MeanOfSquares, RegularBinEdges, fill_count_density,
};

/// The running moments of the count histogram of one (level, ROI) cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistogramMoments {
    mean: Vec<f64>,
    mean_sq: Vec<f64>,
}

impl HistogramMoments {
    pub fn zeros(n_bins: usize) -> Self {
        HistogramMoments {
            mean: vec![0.0; n_bins],
            mean_sq: vec![0.0; n_bins],
        }
    }

    pub fn n_bins(&self) -> usize {
        self.mean.len()
    }

    /// the running mean of the histograms
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// the running mean of the elementwise-squared histograms
    pub fn mean_sq(&self) -> &[f64] {
        &self.mean_sq
    }

    /// Returns the moments after folding in `histogram`, where `count` is the
    /// number of histograms represented by the result (it counts `histogram`).
    pub fn folded(mut self, histogram: &[f64], count: NonZeroU64) -> Result<Self, Error> {
        let sample = ArrayView1::from(histogram);
        MeanOfSamples::new()
            .fold(&mut ArrayViewMut1::from(&mut self.mean[..]), &sample, count)
            .map_err(Error::internal)?;
        MeanOfSquares::new()
            .fold(&mut ArrayViewMut1::from(&mut self.mean_sq[..]), &sample, count)
            .map_err(Error::internal)?;
        Ok(self)
    }
}

/// The completed statistics of a single image series.
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesStatistics {
    pub(crate) mean: RaggedHistograms,
    pub(crate) mean_sq: RaggedHistograms,
    pub(crate) frames_per_level: Vec<u64>,
}

impl SeriesStatistics {
    /// the mean count density for every (level, ROI)
    pub fn mean(&self) -> &RaggedHistograms {
        &self.mean
    }

    /// the mean of the squared count density for every (level, ROI)
    pub fn mean_sq(&self) -> &RaggedHistograms {
        &self.mean_sq
    }

    /// the number of (raw or synthesized) frames that each level received
    pub fn frames_per_level(&self) -> &[u64] {
        &self.frames_per_level
    }

    /// `true` if the series didn't contain a single frame
    pub fn is_empty(&self) -> bool {
        self.frames_per_level.first().is_none_or(|&n| n == 0)
    }
}

/// Computes count densities and tracks the per-(level, ROI) moments of one
/// series.
pub(crate) struct HistogramEngine {
    level_bins: Vec<RegularBinEdges>,
    n_rois: usize,
    // indexed by level * n_rois + roi
    cells: Vec<HistogramMoments>,
    frames_per_level: Vec<u64>,
    // one density per ROI, so a frame is validated before anything is folded
    scratch: Vec<f64>,
}

impl HistogramEngine {
    pub(crate) fn new(
        max_count: u64,
        base: u64,
        n_levels: usize,
        n_rois: usize,
    ) -> Result<Self, Error> {
        let level_bins = (0..n_levels)
            .map(|level| level_bin_edges(max_count, base, level))
            .collect::<Result<Vec<_>, Error>>()?;

        let mut cells = Vec::with_capacity(n_levels * n_rois);
        for bins in &level_bins {
            cells.extend((0..n_rois).map(|_| HistogramMoments::zeros(bins.n_bins())));
        }
        let max_bins = level_bins.iter().map(|b| b.n_bins()).max().unwrap_or(0);

        Ok(HistogramEngine {
            level_bins,
            n_rois,
            cells,
            frames_per_level: vec![0; n_levels],
            scratch: vec![0.0; max_bins * n_rois],
        })
    }

    pub(crate) fn frames_per_level(&self) -> &[u64] {
        &self.frames_per_level
    }

    /// fold the frame `values` (gathered in ROI order) into the moments of
    /// `level`
    ///
    /// Every value must land in one of the level's count bins. Otherwise an
    /// error is returned and the engine is left untouched.
    pub(crate) fn record(
        &mut self,
        level: usize,
        values: &[f64],
        rois: &RoiIndices,
    ) -> Result<(), Error> {
        let bins = &self.level_bins[level];
        let n_bins = bins.n_bins();
        let densities = &mut self.scratch[..n_bins * self.n_rois];

        for (roi, density) in densities.chunks_exact_mut(n_bins).enumerate() {
            let tally = fill_count_density(
                &values[rois.roi_range(roi)],
                bins,
                &mut ArrayViewMut1::from(density),
            )
            .map_err(Error::internal)?;
            if let Some(value) = tally.first_out_of_range {
                return Err(Error::count_range(
                    level,
                    roi,
                    value,
                    bins.rightmost_edge(),
                    tally.n_out_of_range,
                ));
            }
        }

        self.frames_per_level[level] += 1;
        let count = NonZeroU64::new(self.frames_per_level[level])
            .ok_or(Error::internal("frame counter overflowed"))?;

        for (roi, density) in densities.chunks_exact(n_bins).enumerate() {
            let cell = &mut self.cells[level * self.n_rois + roi];
            *cell = std::mem::take(cell).folded(density, count)?;
        }
        Ok(())
    }

    pub(crate) fn into_statistics(self) -> SeriesStatistics {
        let level_lens: Vec<usize> = self.level_bins.iter().map(|b| b.n_bins()).collect();
        let mut mean = RaggedHistograms::zeros(&level_lens, self.n_rois);
        let mut mean_sq = RaggedHistograms::zeros(&level_lens, self.n_rois);
        for (i, cell) in self.cells.iter().enumerate() {
            let (level, roi) = (i / self.n_rois, i % self.n_rois);
            mean[(level, roi)].copy_from_slice(cell.mean());
            mean_sq[(level, roi)].copy_from_slice(cell.mean_sq());
        }
        SeriesStatistics {
            mean,
            mean_sq,
            frames_per_level: self.frames_per_level,
        }
    }
}
