//! Configuration and the top-level driver.
//!
//! [`XsvsBuilder`] collects the configuration and validates it against a
//! label map, producing an [`Xsvs`] "plan". The plan is immutable and
//! lightweight; the statistics themselves live in the
//! [`MultiTauCascade`] (one per series) and the [`CrossSeriesAccumulator`]
//! (across series).
//!
//! For data that is already in memory, [`run`] does everything in one call.

use crate::schedule::{geometric_series, level_bin_edges, max_counts};
use crate::{
    CrossSeriesAccumulator, Error, MultiTauCascade, RaggedHistograms, RoiIndices,
    extract_label_indices,
};
use ndarray::{ArrayView2, ArrayView3};
use xsvs_nostd_internal::BinEdges;

/// Builds an [`Xsvs`] plan.
///
/// ```
/// use ndarray::array;
/// use xsvs::XsvsBuilder;
///
/// let label_map = array![[1, 1], [2, 2]];
/// let plan = XsvsBuilder::new()
///     .timebin_base(2)
///     .frames_per_series(8)
///     .max_count(3)
///     .build(label_map.view())
///     .unwrap();
/// assert_eq!(plan.n_levels(), 4);
/// ```
#[derive(Clone, Debug)]
pub struct XsvsBuilder {
    timebin_base: u64,
    frames_per_series: u64,
    max_count: Option<u64>,
    fold_empty_series: bool,
}

impl Default for XsvsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl XsvsBuilder {
    /// A builder with a timebin base of 2 and 50 frames per series.
    pub fn new() -> Self {
        XsvsBuilder {
            timebin_base: 2,
            frames_per_series: 50,
            max_count: None,
            fold_empty_series: false,
        }
    }

    /// the number of lower-level frames summed into one frame of the next
    /// level
    pub fn timebin_base(mut self, base: u64) -> Self {
        self.timebin_base = base;
        self
    }

    /// the expected number of frames per series. This only determines the
    /// number of integration levels.
    pub fn frames_per_series(mut self, n_frames: u64) -> Self {
        self.frames_per_series = n_frames;
        self
    }

    /// the largest raw pixel count (see [`crate::max_counts`])
    pub fn max_count(mut self, max_count: u64) -> Self {
        self.max_count = Some(max_count);
        self
    }

    /// whether [`Xsvs::run`] folds series without any frames (their
    /// statistics are all zeros). By default they are skipped.
    pub fn fold_empty_series(mut self, fold: bool) -> Self {
        self.fold_empty_series = fold;
        self
    }

    /// validate the configuration against `label_map` and build the plan
    pub fn build(&self, label_map: ArrayView2<i64>) -> Result<Xsvs, Error> {
        self.build_with_indices(extract_label_indices(label_map)?)
    }

    /// like [`XsvsBuilder::build`], for pixel index sets that were already
    /// extracted
    pub fn build_with_indices(&self, rois: RoiIndices) -> Result<Xsvs, Error> {
        let max_count = self.max_count.ok_or(Error::max_count_presence())?;
        let schedule = geometric_series(self.timebin_base, self.frames_per_series)?;
        let bins_per_level = (0..schedule.len())
            .map(|level| level_bin_edges(max_count, self.timebin_base, level).map(|b| b.n_bins()))
            .collect::<Result<Vec<_>, Error>>()?;

        log::debug!(
            "built XSVS plan: base {}, {} levels, max count {}, {} ROIs",
            self.timebin_base,
            schedule.len(),
            max_count,
            rois.n_rois()
        );

        Ok(Xsvs {
            rois,
            timebin_base: self.timebin_base,
            schedule,
            bins_per_level,
            max_count,
            fold_empty_series: self.fold_empty_series,
        })
    }
}

/// A validated XSVS configuration.
#[derive(Clone, Debug)]
pub struct Xsvs {
    rois: RoiIndices,
    timebin_base: u64,
    schedule: Vec<u64>,
    bins_per_level: Vec<usize>,
    max_count: u64,
    fold_empty_series: bool,
}

impl Xsvs {
    pub fn rois(&self) -> &RoiIndices {
        &self.rois
    }

    pub fn timebin_base(&self) -> u64 {
        self.timebin_base
    }

    /// the integration time (in raw frames) of each level
    pub fn schedule(&self) -> &[u64] {
        &self.schedule
    }

    pub fn n_levels(&self) -> usize {
        self.schedule.len()
    }

    pub fn max_count(&self) -> u64 {
        self.max_count
    }

    /// the number of count bins at each level
    pub fn bins_per_level(&self) -> &[usize] {
        &self.bins_per_level
    }

    /// a fresh cascade for streaming one series
    pub fn cascade(&self) -> Result<MultiTauCascade<'_>, Error> {
        MultiTauCascade::new(
            &self.rois,
            self.timebin_base,
            self.n_levels(),
            self.max_count,
        )
    }

    /// a fresh accumulator matching this plan's layout
    pub fn accumulator(&self) -> CrossSeriesAccumulator {
        CrossSeriesAccumulator::new(&self.bins_per_level, self.rois.n_rois())
    }

    /// Stream a single series through a fresh cascade and fold its
    /// statistics into `accum`.
    ///
    /// The series yields `(sequence_index, frame)` pairs and is read exactly
    /// once. Returns `false` when the series had no frames and was skipped
    /// (see [`XsvsBuilder::fold_empty_series`]).
    ///
    /// A failure is fatal to this series only: its partial statistics are
    /// discarded and `accum` is left untouched, so the series folded
    /// earlier are preserved.
    pub fn fold_series_into<'f, F>(
        &self,
        accum: &mut CrossSeriesAccumulator,
        frames: F,
    ) -> Result<bool, Error>
    where
        F: IntoIterator<Item = (usize, ArrayView2<'f, f64>)>,
    {
        let mut cascade = self.cascade()?;
        for (sequence_index, frame) in frames {
            cascade.push_frame(sequence_index, frame)?;
        }
        let stats = cascade.finish();

        if stats.is_empty() && !self.fold_empty_series {
            return Ok(false);
        }
        accum.fold_series(&stats)?;
        Ok(true)
    }

    /// Stream every series through its own cascade and combine the results.
    ///
    /// Each series yields `(sequence_index, frame)` pairs and is read exactly
    /// once. The first error aborts the whole run and the statistics of the
    /// series that already completed are dropped along with it. Callers that
    /// need to keep them should drive [`Xsvs::fold_series_into`] with their
    /// own [`Xsvs::accumulator`] and convert it into an [`XsvsOutput`].
    pub fn run<'f, S, F>(&self, series: S) -> Result<XsvsOutput, Error>
    where
        S: IntoIterator<Item = F>,
        F: IntoIterator<Item = (usize, ArrayView2<'f, f64>)>,
    {
        let mut accum = self.accumulator();
        for (series_idx, frames) in series.into_iter().enumerate() {
            let folded = self
                .fold_series_into(&mut accum, frames)
                .inspect_err(|err| {
                    log::warn!(
                        "series {series_idx} failed ({err}); discarding {} completed series",
                        accum.n_series()
                    )
                })?;
            if !folded {
                log::warn!("series {series_idx} has no frames; skipping it");
            }
        }
        Ok(XsvsOutput::from(accum))
    }
}

/// The combined result of an XSVS run.
#[derive(Clone, Debug, PartialEq)]
pub struct XsvsOutput {
    n_series: u64,
    mean: RaggedHistograms,
    mean_sq: RaggedHistograms,
    std_err: RaggedHistograms,
    frames_per_level: Vec<u64>,
}

impl From<CrossSeriesAccumulator> for XsvsOutput {
    fn from(accum: CrossSeriesAccumulator) -> Self {
        let (n_series, mean, mean_sq, std_err, frames_per_level) = accum.into_parts();
        XsvsOutput {
            n_series,
            mean,
            mean_sq,
            std_err,
            frames_per_level,
        }
    }
}

impl XsvsOutput {
    /// the number of series that contributed
    pub fn n_series(&self) -> u64 {
        self.n_series
    }

    /// the mean count density (the speckle count probability) for every
    /// (level, ROI)
    pub fn mean(&self) -> &RaggedHistograms {
        &self.mean
    }

    /// the mean squared count density for every (level, ROI)
    pub fn mean_sq(&self) -> &RaggedHistograms {
        &self.mean_sq
    }

    /// the approximate standard error of [`XsvsOutput::mean`] (see
    /// [`CrossSeriesAccumulator`] for why it is approximate)
    pub fn std_err(&self) -> &RaggedHistograms {
        &self.std_err
    }

    /// the total number of frames each level received, over all folded series
    pub fn frames_per_level(&self) -> &[u64] {
        &self.frames_per_level
    }
}

/// Compute XSVS statistics for series that are already in memory.
///
/// Each entry of `series` stacks the frames of one series along axis 0; a
/// frame's sequence index is its position in the stack. The maximum pixel
/// count is determined by a first pass over all of the series.
pub fn run(
    series: &[ArrayView3<f64>],
    label_map: ArrayView2<i64>,
    timebin_base: u64,
    frames_per_series: u64,
) -> Result<XsvsOutput, Error> {
    let rois = extract_label_indices(label_map)?;
    let max_count = max_counts(series, &rois)?;
    let plan = XsvsBuilder::new()
        .timebin_base(timebin_base)
        .frames_per_series(frames_per_series)
        .max_count(max_count)
        .build_with_indices(rois)?;
    plan.run(series.iter().map(|frames| frames.outer_iter().enumerate()))
}
