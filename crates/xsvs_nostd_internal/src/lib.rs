/*!
Low-level machinery for the `xsvs` crate that doesn't require the standard
library.

This crate holds the pieces of the XSVS calculation that operate on
caller-owned memory:
- [`RegularBinEdges`] describes the photon-count bins,
- [`fill_count_density`] turns the pixel values of one region into a
  probability density over those bins,
- [`RunningMean`] folds a density (or its square) into a running mean,
- [`LevelTrigger`] and [`RingCursor`] encode the bookkeeping of the multi-tau
  cascade.

Errors are currently reported as `&'static str`. The `xsvs` crate wraps
them in its own error type.
*/

#![no_std]
mod bins;
mod histogram;
mod trigger;

pub use bins::{BinEdges, RegularBinEdges};
pub use histogram::{
    DensityTally, Identity, MeanOfSamples, MeanOfSquares, RunningMean, SampleOp, Square,
    fill_count_density,
};
pub use trigger::{LevelTrigger, RingCursor, TriggerAction};
