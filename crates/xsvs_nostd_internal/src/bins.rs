//! Implements types to represent "bin edges", used for the photon-count
//! histograms. The [`BinEdges`] trait provides a common interface; at the
//! moment [`RegularBinEdges`] is the only implementation.
//!
//! Photon counts are non-negative integers, so the histograms built by this
//! crate use unit-width bins `[k, k+1)`. Each bin then holds exactly one
//! count value and a probability density over the bins is also a
//! probability mass function over the counts.

/// Super simple. This can be expanded as needed.
pub trait BinEdges {
    /// Calculate the bin index for a given value. Values which are equal to
    /// boundary values are considered part of the higher bin, i.e. intervals
    /// do not include the right edge.
    fn bin_index(&self, value: f64) -> Option<usize>;

    fn n_bins(&self) -> usize;

    /// the width of the bin at `index`
    fn bin_width(&self, index: usize) -> f64;

    /// the `index`th edge. Valid indices run from `0` through `n_bins()`
    /// (inclusive).
    fn edge(&self, index: usize) -> f64;
}

/// Regular bins with uniform spacing
#[derive(Clone, Debug, PartialEq)]
pub struct RegularBinEdges {
    min: f64,
    max: f64,
    bin_size: f64,
    n_bins: usize,
}

impl RegularBinEdges {
    /// Note that we initialize with num_bins rather than bin_size
    pub fn new(min: f64, max: f64, n_bins: usize) -> Result<Self, &'static str> {
        if n_bins == 0 {
            Err("Number of bins must be greater than zero")
        } else if max <= min {
            Err("Maximum value must be greater than minimum value")
        } else if !min.is_finite() || !max.is_finite() {
            Err("Min and max values must be finite")
        } else {
            Ok(Self {
                min,
                max,
                bin_size: (max - min) / n_bins as f64,
                n_bins,
            })
        }
    }

    /// Unit-width bins covering every integer count from `0` through
    /// `max_count` (inclusive). The edges are `0, 1, ..., max_count + 1`.
    pub fn integer_counts(max_count: u64) -> Result<Self, &'static str> {
        let n_bins = max_count
            .checked_add(1)
            .ok_or("max_count is too large to build count bins")?;
        Self::new(0.0, n_bins as f64, n_bins as usize)
    }

    pub fn leftmost_edge(&self) -> f64 {
        self.min
    }

    pub fn rightmost_edge(&self) -> f64 {
        self.max
    }
}

impl BinEdges for RegularBinEdges {
    fn bin_index(&self, value: f64) -> Option<usize> {
        // written so that NaN falls through to None
        if !(value >= self.min && value < self.max) {
            return None;
        }

        // this cast handles the truncation. Rounding can push a value just
        // below `max` into a nonexistent bin, so we clamp.
        let index = ((value - self.min) / self.bin_size) as usize;

        Some(index.min(self.n_bins - 1))
    }

    fn n_bins(&self) -> usize {
        self.n_bins
    }

    fn bin_width(&self, _index: usize) -> f64 {
        self.bin_size
    }

    fn edge(&self, index: usize) -> f64 {
        if index == self.n_bins {
            self.max
        } else {
            self.min + (index as f64) * self.bin_size
        }
    }
}
