//! Histogram construction and running-mean machinery.
//!
//! # Running means
//!
//! The speckle statistics are means over many frames (and over many image
//! series). We never hold onto the individual samples. Instead we keep the
//! running mean and fold in the `n`th sample with
//!
//! ```text
//! mean ← mean + (sample − mean) / n
//! ```
//!
//! After `n` samples this is the arithmetic mean of all of them. Since every
//! histogram entry is a probability in `[0, 1]`, the update can't overflow.
//!
//! Like the reducers in the rest of the workspace, [`RunningMean`] doesn't
//! own its state. It is generic over a [`SampleOp`] that maps each sample
//! before it is folded, which is how the mean of the squared histogram is
//! tracked alongside the mean histogram.

use crate::bins::BinEdges;
use core::marker::PhantomData;
use core::num::NonZeroU64;
use ndarray::{ArrayView1, ArrayViewMut1};

/// How the values handed to [`fill_count_density`] fell relative to the bins.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DensityTally {
    /// the number of values that landed in a bin
    pub n_in_range: usize,
    /// the number of values below the first edge, at or above the last edge,
    /// or NaN
    pub n_out_of_range: usize,
    /// the first value that didn't land in a bin
    pub first_out_of_range: Option<f64>,
}

impl DensityTally {
    /// `true` when every value landed in a bin
    pub fn all_in_range(&self) -> bool {
        self.n_out_of_range == 0
    }
}

/// Fill `density` with the probability density of `values` over `bins`.
///
/// Values outside of the bins don't contribute to the density, but they are
/// reported in the returned [`DensityTally`] so that callers can decide
/// whether that is acceptable. The counts are normalized by the number of
/// in-range values (and the bin widths), so the density integrates to 1
/// whenever at least one value lands in a bin. When no value lands in a bin
/// (e.g. `values` is empty) the density is filled with zeros.
pub fn fill_count_density(
    values: &[f64],
    bins: &impl BinEdges,
    density: &mut ArrayViewMut1<f64>,
) -> Result<DensityTally, &'static str> {
    if density.len() != bins.n_bins() {
        return Err("the density buffer must have one entry per bin");
    }
    density.fill(0.0);

    let mut tally = DensityTally {
        n_in_range: 0,
        n_out_of_range: 0,
        first_out_of_range: None,
    };
    for &value in values {
        if let Some(bin_idx) = bins.bin_index(value) {
            density[bin_idx] += 1.0;
            tally.n_in_range += 1;
        } else {
            tally.n_out_of_range += 1;
            if tally.first_out_of_range.is_none() {
                tally.first_out_of_range = Some(value);
            }
        }
    }

    if tally.n_in_range > 0 {
        let total = tally.n_in_range as f64;
        for (i, d) in density.iter_mut().enumerate() {
            *d /= total * bins.bin_width(i);
        }
    }
    Ok(tally)
}

/// this encodes the logic to map a sample before it gets folded into a
/// [`RunningMean`].
pub trait SampleOp: Copy + Clone {
    fn mapped_value(sample: f64) -> f64;
}

#[derive(Clone, Copy)]
pub struct Identity;

impl SampleOp for Identity {
    #[inline(always)]
    fn mapped_value(sample: f64) -> f64 {
        sample
    }
}

#[derive(Clone, Copy)]
pub struct Square;

impl SampleOp for Square {
    #[inline(always)]
    fn mapped_value(sample: f64) -> f64 {
        sample * sample
    }
}

/// Folds vector-valued samples into an elementwise running mean.
#[derive(Clone, Copy)]
pub struct RunningMean<T: SampleOp>(PhantomData<T>);

impl<T: SampleOp> RunningMean<T> {
    #[inline(always)]
    pub fn new() -> Self {
        Self(PhantomData::<T>)
    }

    /// fold `sample` into `mean`, where `count` is the number of samples
    /// that `mean` will represent after the update (i.e. it counts `sample`)
    pub fn fold(
        &self,
        mean: &mut ArrayViewMut1<f64>,
        sample: &ArrayView1<f64>,
        count: NonZeroU64,
    ) -> Result<(), &'static str> {
        if mean.len() != sample.len() {
            return Err("the sample and the running mean must have the same length");
        }
        let n = count.get() as f64;
        mean.zip_mut_with(sample, |m, &s| {
            *m += (T::mapped_value(s) - *m) / n;
        });
        Ok(())
    }
}

// we are only implementing this to silence clippy::new_without_default
impl<T: SampleOp> Default for RunningMean<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub type MeanOfSamples = RunningMean<Identity>;
pub type MeanOfSquares = RunningMean<Square>;
