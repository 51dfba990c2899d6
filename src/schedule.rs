//! The integration-time schedule and the quantities that size the histograms.
//!
//! Level `ℓ` of the cascade integrates `base^ℓ` raw frames. The number of
//! levels comes from [`geometric_series`], and the count bins of each level
//! come from [`level_bin_edges`], which needs the maximum raw pixel count
//! (see [`max_counts`]).

use crate::{Error, RoiIndices};
use ndarray::ArrayView3;
use xsvs_nostd_internal::RegularBinEdges;

/// Returns the integration times `[1, base, base², ...]`, stopping before the
/// first value that exceeds `n_frames`.
///
/// The length of the result is the number of cascade levels.
pub fn geometric_series(base: u64, n_frames: u64) -> Result<Vec<u64>, Error> {
    if base < 2 {
        return Err(Error::integer_range("the timebin base", base, 2, u64::MAX));
    } else if n_frames == 0 {
        return Err(Error::integer_range(
            "the number of frames",
            n_frames,
            1,
            u64::MAX,
        ));
    }

    let mut out = vec![1_u64];
    let mut cur = 1_u64;
    while let Some(next) = cur.checked_mul(base) {
        if next > n_frames {
            break;
        }
        out.push(next);
        cur = next;
    }
    Ok(out)
}

/// The largest pixel value inside any ROI, over every frame of every series.
///
/// Each series is a stack of frames along axis 0. The maximum is rounded up
/// to an integer and negative values never contribute, so the result is at
/// least 0. An infinite or NaN value inside a ROI is an error.
pub fn max_counts(series: &[ArrayView3<f64>], rois: &RoiIndices) -> Result<u64, Error> {
    let mut max_val = 0.0_f64;
    for frames in series {
        for frame in frames.outer_iter() {
            rois.check_shape(&frame)?;
            let n_cols = rois.shape()[1];
            for &flat_index in rois.indices() {
                let value = frame[[flat_index / n_cols, flat_index % n_cols]];
                if !value.is_finite() {
                    return Err(Error::non_finite_pixel(value, flat_index));
                }
                max_val = max_val.max(value);
            }
        }
    }
    Ok(max_val.ceil() as u64)
}

/// The largest count that a synthesized frame at `level` can hold, i.e.
/// `max_count * base^level`.
pub fn level_max_count(max_count: u64, base: u64, level: usize) -> Result<u64, Error> {
    let level = u32::try_from(level)
        .map_err(|_| Error::integer_range("the level", level as u64, 0, u32::MAX as u64))?;
    base.checked_pow(level)
        .and_then(|factor| max_count.checked_mul(factor))
        .ok_or(Error::internal(
            "the maximum count at this level overflows a 64-bit integer",
        ))
}

/// The count bins for `level`: unit-width bins for every integer count from
/// 0 through `max_count * base^level`.
pub fn level_bin_edges(max_count: u64, base: u64, level: usize) -> Result<RegularBinEdges, Error> {
    let level_max = level_max_count(max_count, base, level)?;
    RegularBinEdges::integer_counts(level_max).map_err(Error::internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract_label_indices;
    use ndarray::{Array3, array, stack, Axis};
    use xsvs_nostd_internal::BinEdges;

    #[test]
    fn geometric_schedule() {
        assert_eq!(geometric_series(2, 50).unwrap(), vec![1, 2, 4, 8, 16, 32]);
        assert_eq!(geometric_series(2, 8).unwrap(), vec![1, 2, 4, 8]);
        assert_eq!(geometric_series(3, 10).unwrap(), vec![1, 3, 9]);
        assert_eq!(geometric_series(2, 1).unwrap(), vec![1]);
        assert_eq!(geometric_series(2, u64::MAX).unwrap().len(), 64);

        assert!(geometric_series(1, 10).is_err());
        assert!(geometric_series(2, 0).is_err());
    }

    #[test]
    fn level_bins() {
        let bins = level_bin_edges(3, 2, 0).unwrap();
        assert_eq!(bins.n_bins(), 4);
        let bins = level_bin_edges(3, 2, 2).unwrap();
        assert_eq!(bins.n_bins(), 13);
        let bins = level_bin_edges(1, 3, 2).unwrap();
        assert_eq!(bins.n_bins(), 10);

        assert!(level_bin_edges(u64::MAX, 2, 1).is_err());
    }

    #[test]
    fn max_over_labeled_pixels() {
        let label_map = array![[0, 1], [1, 2]];
        let rois = extract_label_indices(label_map.view()).unwrap();

        let frame_a = array![[100.0, 1.0], [2.0, 3.0]];
        let frame_b = array![[100.0, 4.5], [-2.0, 0.0]];
        let series_a = stack![Axis(0), frame_a, frame_b];
        let series_b = Array3::<f64>::zeros((0, 2, 2));

        let max = max_counts(&[series_a.view(), series_b.view()], &rois).unwrap();
        // the background pixel (100) is ignored and 4.5 is rounded up
        assert_eq!(max, 5);

        let wrong_shape = Array3::<f64>::zeros((1, 3, 2));
        assert!(max_counts(&[wrong_shape.view()], &rois).is_err());
    }

    #[test]
    fn max_rejects_non_finite_pixels() {
        let label_map = array![[0, 1], [1, 1]];
        let rois = extract_label_indices(label_map.view()).unwrap();

        for bad in [f64::NAN, f64::INFINITY] {
            let series = stack![Axis(0), array![[0.0, 1.0], [bad, 2.0]]];
            let err = max_counts(&[series.view()], &rois).unwrap_err();
            assert!(err.is_pixel_value());
        }

        // background pixels are never inspected
        let series = stack![Axis(0), array![[f64::NAN, 1.0], [0.0, 2.0]]];
        assert_eq!(max_counts(&[series.view()], &rois).unwrap(), 2);
    }
}
