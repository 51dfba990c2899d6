/*!
Streaming X-ray Speckle Visibility Spectroscopy (XSVS) statistics.

<div class="warning">

This crate is still in early development.

</div>

# High-Level: XSVS

XSVS extracts dynamical information from the photon statistics of speckle
patterns. For every region of interest (ROI) of a detector, the quantity of
interest is the probability of detecting `k` photons in a pixel, measured at
several integration times. Longer integration times are synthesized by
summing consecutive detector frames.

The references for the method are:
- L. Li, P. Kwasniewski, D. Oris, L. Wiegart, L. Cristofolini, C. Carona and
  A. Fluerasu, "Photon statistics and speckle visibility spectroscopy with
  partially coherent x-rays", J. Synchrotron Rad. 21, 1288-1295 (2014).
- R. Bandyopadhyay, A. S. Gittings, S. S. Suh, P. K. Dixon and D. J. Durian,
  "Speckle-visibility spectroscopy: A tool to study time-varying dynamics",
  Rev. Sci. Instrum. 76, 093110 (2005).

# User Guide

The calculation is organized around single-pass streams of frames:
- [`extract_label_indices`] turns a label map into pixel index sets.
- [`XsvsBuilder`] produces an [`Xsvs`] plan.
- [`Xsvs::cascade`] creates a [`MultiTauCascade`] for one series. Frames are
  pushed one at a time; the cascade synthesizes longer integration times
  and updates the running count densities of every (level, ROI).
- [`CrossSeriesAccumulator`] combines the statistics of completed series.
- [`Xsvs::run`] and [`run`] wrap all of the above.

[`normalize_bin_edges`] rescales the count bins by the mean intensity of each
ROI, for presentation.

Results are reported in [`RaggedHistograms`], indexed by `(level, roi)`.

# Developer Guide

The pieces that work on caller-owned memory (bins, running means and the
cascade triggers) live in [`xsvs_nostd_internal`].

*/

#![deny(rustdoc::broken_intra_doc_links)]

// inform build-system of the crates in this package
mod cascade;
mod engine;
mod error;
mod labels;
mod moments;
mod normalize;
mod ragged;
mod schedule;
mod series;

// pull in symbols that visible outside of the package
pub use cascade::MultiTauCascade;
pub use engine::{Xsvs, XsvsBuilder, XsvsOutput, run};
pub use error::Error;
pub use labels::{RoiIndices, extract_label_indices};
pub use moments::{HistogramMoments, SeriesStatistics};
pub use normalize::{NormalizedBins, bin_edges_to_centers, normalize_bin_edges};
pub use ragged::RaggedHistograms;
pub use schedule::{geometric_series, level_bin_edges, level_max_count, max_counts};
pub use series::CrossSeriesAccumulator;
pub use xsvs_nostd_internal::{BinEdges, LevelTrigger, RegularBinEdges};
