//! Helpers shared by the tests and benchmarks of the `xsvs` crate.
//!
//! Nothing in here is streaming: the reference calculation deliberately
//! materializes every synthesized frame, so that it can be compared against
//! the multi-tau cascade.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis, s};
use rand::distr::{Distribution, Uniform};
use rand_xoshiro::Xoshiro256PlusPlus;
use rand_xoshiro::rand_core::SeedableRng;

/// A stack of `shape[0]` frames with integer counts drawn uniformly from
/// `0..=max_value`
pub fn random_series(shape: [usize; 3], max_value: u64, seed: u64) -> Array3<f64> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let dist = Uniform::new_inclusive(0_u64, max_value).unwrap();
    Array3::from_shape_simple_fn(shape, || dist.sample(&mut rng) as f64)
}

/// A stack of `shape[0]` frames where every pixel holds `value`
pub fn constant_series(shape: [usize; 3], value: f64) -> Array3<f64> {
    Array3::from_elem(shape, value)
}

/// A label map that splits the rows into `n_rois` bands of equal height.
/// Rows that don't fit evenly are left as background.
pub fn banded_label_map(shape: [usize; 2], n_rois: usize) -> Array2<i64> {
    assert!(n_rois > 0 && n_rois <= shape[0]);
    let rows_per_roi = shape[0] / n_rois;
    Array2::from_shape_fn(shape, |(row, _col)| {
        let roi = row / rows_per_roi;
        if roi < n_rois { roi as i64 + 1 } else { 0 }
    })
}

/// Compute the mean count density of every (level, ROI) by brute force.
///
/// The synthesized frames of level `ℓ` are sums over consecutive,
/// non-overlapping blocks of `base^ℓ` raw frames. The result is indexed as
/// `[level][roi][bin]`. Pixel values must be non-negative integers.
pub fn reference_level_means(
    frames: ArrayView3<f64>,
    label_map: ArrayView2<i64>,
    base: usize,
    n_levels: usize,
    max_count: u64,
) -> Vec<Vec<Vec<f64>>> {
    let n_rois = *label_map.iter().max().unwrap() as usize;
    let n_frames = frames.len_of(Axis(0));

    let mut out = Vec::with_capacity(n_levels);
    for level in 0..n_levels {
        let block = base.pow(level as u32);
        let n_bins = (max_count as usize) * block + 1;
        let n_synth = n_frames / block;

        let mut level_means = vec![vec![0.0; n_bins]; n_rois];
        for k in 0..n_synth {
            let synth = frames
                .slice(s![k * block..(k + 1) * block, .., ..])
                .sum_axis(Axis(0));
            for roi in 0..n_rois {
                let values: Vec<f64> = synth
                    .iter()
                    .zip(label_map.iter())
                    .filter(|&(_, &label)| label == roi as i64 + 1)
                    .map(|(&v, _)| v)
                    .collect();
                for &v in &values {
                    level_means[roi][v as usize] += 1.0 / (values.len() as f64);
                }
            }
        }
        if n_synth > 0 {
            for hist in level_means.iter_mut() {
                for v in hist.iter_mut() {
                    *v /= n_synth as f64;
                }
            }
        }
        out.push(level_means);
    }
    out
}
