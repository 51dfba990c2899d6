//! Combines the statistics of independent image series.
//!
//! Each completed series contributes its mean count density (and mean of the
//! squared density) for every (level, ROI). The accumulator keeps the running
//! mean over series, using the same incremental update as the histogram
//! engine, and derives a standard error for every bin.
//!
//! # The standard error is approximate
//!
//! The standard error is `sqrt(max(0, p - p²))`, where `p` is the mean
//! probability of a bin. This treats every bin as a single Bernoulli trial
//! with success probability `p`, which bounds the variance by `p(1 - p)`.
//! It is the estimate commonly used in the XSVS literature, but it is not a
//! standard error of the mean over the folded series (in particular, it
//! doesn't shrink as more series are folded).

use crate::{Error, RaggedHistograms, SeriesStatistics};
use ndarray::{ArrayView1, ArrayViewMut1};
use std::num::NonZeroU64;
use xsvs_nostd_internal::MeanOfSamples;

pub struct CrossSeriesAccumulator {
    n_series: u64,
    mean: RaggedHistograms,
    mean_sq: RaggedHistograms,
    std_err: RaggedHistograms,
    frames_per_level: Vec<u64>,
}

impl CrossSeriesAccumulator {
    /// create an empty accumulator where every ROI at level `i` holds
    /// `bins_per_level[i]` bins
    pub fn new(bins_per_level: &[usize], n_rois: usize) -> Self {
        CrossSeriesAccumulator {
            n_series: 0,
            mean: RaggedHistograms::zeros(bins_per_level, n_rois),
            mean_sq: RaggedHistograms::zeros(bins_per_level, n_rois),
            std_err: RaggedHistograms::zeros(bins_per_level, n_rois),
            frames_per_level: vec![0; bins_per_level.len()],
        }
    }

    /// Fold the statistics of a completed series.
    ///
    /// On error (the layout of `series` doesn't match), the accumulator is
    /// left untouched.
    pub fn fold_series(&mut self, series: &SeriesStatistics) -> Result<(), Error> {
        if !self.mean.same_layout(series.mean()) {
            return Err(Error::layout_mismatch(
                "the series statistics don't match the accumulator",
            ));
        }
        let count = NonZeroU64::new(self.n_series + 1)
            .ok_or(Error::internal("series counter overflowed"))?;

        let reducer = MeanOfSamples::new();
        reducer
            .fold(
                &mut ArrayViewMut1::from(self.mean.as_flat_mut()),
                &ArrayView1::from(series.mean().as_flat()),
                count,
            )
            .map_err(Error::internal)?;
        reducer
            .fold(
                &mut ArrayViewMut1::from(self.mean_sq.as_flat_mut()),
                &ArrayView1::from(series.mean_sq().as_flat()),
                count,
            )
            .map_err(Error::internal)?;
        self.n_series = count.get();
        for (total, n) in self.frames_per_level.iter_mut().zip(series.frames_per_level()) {
            *total += n;
        }

        for (err, &p) in self
            .std_err
            .as_flat_mut()
            .iter_mut()
            .zip(self.mean.as_flat())
        {
            *err = (p - p * p).max(0.0).sqrt();
        }

        log::debug!("folded series {}", self.n_series);
        Ok(())
    }

    /// the number of series folded so far
    pub fn n_series(&self) -> u64 {
        self.n_series
    }

    /// the mean count density over all folded series
    pub fn mean(&self) -> &RaggedHistograms {
        &self.mean
    }

    /// the mean (over series) of each series' mean squared count density
    pub fn mean_sq(&self) -> &RaggedHistograms {
        &self.mean_sq
    }

    /// the approximate standard error of [`CrossSeriesAccumulator::mean`]
    pub fn std_err(&self) -> &RaggedHistograms {
        &self.std_err
    }

    /// the total number of frames each level received, over all folded series
    pub fn frames_per_level(&self) -> &[u64] {
        &self.frames_per_level
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        u64,
        RaggedHistograms,
        RaggedHistograms,
        RaggedHistograms,
        Vec<u64>,
    ) {
        (
            self.n_series,
            self.mean,
            self.mean_sq,
            self.std_err,
            self.frames_per_level,
        )
    }
}
