//! Normalizes the count-bin edges by the mean intensity of each ROI.
//!
//! Plots of XSVS results usually show the count density against
//! `count / ⟨count⟩`, where `⟨count⟩` is the mean intensity of the ROI at
//! the given integration level (`mean_roi * base^level`). This is a pure
//! transformation of the bin edges used by the histogram engine.

use crate::schedule::level_bin_edges;
use crate::{Error, RaggedHistograms};
use xsvs_nostd_internal::BinEdges;

/// normalized bin edges and their centers for every (level, ROI)
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedBins {
    pub edges: RaggedHistograms,
    pub centers: RaggedHistograms,
}

/// Compute the midpoints between consecutive bin edges
pub fn bin_edges_to_centers(edges: &[f64]) -> Vec<f64> {
    edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
}

/// Normalize the count-bin edges of every (level, ROI).
///
/// `mean_roi[i]` is the mean raw-frame intensity of ROI `i`. The edges of
/// level `ℓ` are those of the histogram engine (`0, 1, ..., max_count *
/// base^ℓ + 1`) divided by `mean_roi[i] * base^ℓ`.
///
/// A ROI with a zero mean intensity produces an error rather than infinite
/// edges.
pub fn normalize_bin_edges(
    n_levels: usize,
    n_rois: usize,
    max_count: u64,
    mean_roi: &[f64],
    base: u64,
) -> Result<NormalizedBins, Error> {
    if mean_roi.len() != n_rois {
        return Err(Error::integer_range(
            "the number of ROI mean intensities",
            mean_roi.len() as u64,
            n_rois as u64,
            n_rois as u64,
        ));
    } else if base < 2 {
        return Err(Error::integer_range("the timebin base", base, 2, u64::MAX));
    }
    for (roi, &mean) in mean_roi.iter().enumerate() {
        if mean == 0.0 {
            return Err(Error::zero_mean_intensity(roi));
        } else if !mean.is_finite() || mean < 0.0 {
            return Err(Error::invalid_mean_intensity(roi, mean));
        }
    }

    let level_bins = (0..n_levels)
        .map(|level| level_bin_edges(max_count, base, level))
        .collect::<Result<Vec<_>, Error>>()?;
    let edge_lens: Vec<usize> = level_bins.iter().map(|b| b.n_bins() + 1).collect();
    let center_lens: Vec<usize> = level_bins.iter().map(|b| b.n_bins()).collect();

    let mut edges = RaggedHistograms::zeros(&edge_lens, n_rois);
    let mut centers = RaggedHistograms::zeros(&center_lens, n_rois);
    for (level, bins) in level_bins.iter().enumerate() {
        let level_factor = (base as f64).powi(level as i32);
        for (roi, &mean) in mean_roi.iter().enumerate() {
            let scale = mean * level_factor;
            let roi_edges = edges.get_mut(level, roi);
            for (i, e) in roi_edges.iter_mut().enumerate() {
                *e = bins.edge(i) / scale;
            }
            let roi_centers = bin_edges_to_centers(edges.get(level, roi));
            centers.get_mut(level, roi).copy_from_slice(&roi_centers);
        }
    }
    Ok(NormalizedBins { edges, centers })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centers() {
        assert_eq!(bin_edges_to_centers(&[0.0, 1.0, 3.0]), vec![0.5, 2.0]);
        assert!(bin_edges_to_centers(&[1.0]).is_empty());
    }

    #[test]
    fn normalized_edges() {
        let bins = normalize_bin_edges(2, 2, 2, &[0.5, 2.0], 2).unwrap();

        assert_eq!(bins.edges.level_lens(), &[4, 6]);
        assert_eq!(bins.centers.level_lens(), &[3, 5]);

        assert_eq!(bins.edges.get(0, 0), &[0.0, 2.0, 4.0, 6.0]);
        assert_eq!(bins.centers.get(0, 0), &[1.0, 3.0, 5.0]);
        assert_eq!(bins.edges.get(0, 1), &[0.0, 0.5, 1.0, 1.5]);
        // level 1 divides by mean * 2
        assert_eq!(bins.edges.get(1, 1), &[0.0, 0.25, 0.5, 0.75, 1.0, 1.25]);
        assert_eq!(bins.centers.get(1, 0)[0], 0.5);
    }

    #[test]
    fn zero_mean_intensity_is_reported() {
        let err = normalize_bin_edges(2, 2, 3, &[1.0, 0.0], 2).unwrap_err();
        assert!(err.is_zero_mean_intensity());
        assert!(err.to_string().contains("ROI 1"));
    }

    #[test]
    fn other_invalid_inputs() {
        let err = normalize_bin_edges(1, 1, 3, &[f64::NAN], 2).unwrap_err();
        assert!(!err.is_zero_mean_intensity());
        assert!(normalize_bin_edges(1, 1, 3, &[-1.0], 2).is_err());
        assert!(normalize_bin_edges(1, 2, 3, &[1.0], 2).is_err());
        assert!(normalize_bin_edges(1, 1, 3, &[1.0], 1).is_err());
    }
}
