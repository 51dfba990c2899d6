//! Converts a ROI label map into the pixel index sets used by the cascade.
//!
//! A label map has the same shape as an image. A label of 0 marks
//! background, while labels `1..=R` identify `R` disjoint regions of
//! interest. We refer to a ROI by its zero-based index (`label - 1`).
//!
//! The selected pixels are stored in "ROI order": all pixels of the first
//! ROI (in row-major order), then all pixels of the second ROI, etc. Frames
//! are gathered into this order once, so that every ROI is a contiguous
//! slice of the gathered buffer.

use crate::Error;
use ndarray::ArrayView2;
use std::ops::Range;

/// The pixel index sets derived from a label map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoiIndices {
    shape: [usize; 2],
    // the ROI label (1-based) of each selected pixel, in ROI order
    labels: Vec<usize>,
    // the flat (row-major) index of each selected pixel, in ROI order
    indices: Vec<usize>,
    // roi_offsets[i]..roi_offsets[i+1] is the range of ROI i
    roi_offsets: Vec<usize>,
}

/// Extract the pixel index sets from `label_map`.
///
/// The labels must form the dense range `1..=R` (with `R ≥ 1`), and negative
/// labels are rejected.
pub fn extract_label_indices(label_map: ArrayView2<i64>) -> Result<RoiIndices, Error> {
    let max_label = max_label(&label_map)?;
    if max_label == 0 {
        return Err(Error::no_rois());
    }
    let indices = RoiIndices::build(label_map, max_label)?;
    if let Some(roi) = (0..indices.n_rois()).find(|&roi| indices.n_pixels(roi) == 0) {
        return Err(Error::label_gap(roi + 1, max_label));
    }
    Ok(indices)
}

fn max_label(label_map: &ArrayView2<i64>) -> Result<usize, Error> {
    let mut max_label = 0_i64;
    for (flat_index, &label) in label_map.iter().enumerate() {
        if label < 0 {
            return Err(Error::negative_label(label, flat_index));
        }
        max_label = max_label.max(label);
    }
    Ok(max_label as usize)
}

impl RoiIndices {
    /// Like [`extract_label_indices`], but with a fixed ROI count.
    ///
    /// Labels may skip values in `1..=n_rois`; the corresponding ROIs simply
    /// select no pixels. This is useful when a fixed ROI layout is shared
    /// by several acquisitions and a region happens to be masked out. Labels
    /// larger than `n_rois` are rejected.
    pub fn with_roi_count(label_map: ArrayView2<i64>, n_rois: usize) -> Result<Self, Error> {
        if n_rois == 0 {
            return Err(Error::no_rois());
        }
        RoiIndices::build(label_map, n_rois)
    }

    fn build(label_map: ArrayView2<i64>, n_rois: usize) -> Result<Self, Error> {
        let (n_rows, n_cols) = label_map.dim();

        // ndarray iterates in logical (row-major) order, independent of the
        // memory layout of the view
        let mut counts = vec![0_usize; n_rois + 1];
        for (flat_index, &label) in label_map.iter().enumerate() {
            if label < 0 {
                return Err(Error::negative_label(label, flat_index));
            } else if label as usize > n_rois {
                return Err(Error::label_too_large(label, n_rois));
            }
            counts[label as usize] += 1;
        }

        let mut roi_offsets = Vec::with_capacity(n_rois + 1);
        roi_offsets.push(0);
        for count in &counts[1..] {
            let last = roi_offsets[roi_offsets.len() - 1];
            roi_offsets.push(last + count);
        }
        let n_selected = roi_offsets[n_rois];

        let mut labels = vec![0_usize; n_selected];
        let mut indices = vec![0_usize; n_selected];
        let mut next_slot = roi_offsets[..n_rois].to_vec();
        for (flat_index, &label) in label_map.iter().enumerate() {
            if label > 0 {
                let roi = label as usize - 1;
                let slot = next_slot[roi];
                labels[slot] = label as usize;
                indices[slot] = flat_index;
                next_slot[roi] += 1;
            }
        }

        log::debug!(
            "selected {n_selected} of {} pixels across {n_rois} ROIs",
            n_rows * n_cols
        );

        Ok(RoiIndices {
            shape: [n_rows, n_cols],
            labels,
            indices,
            roi_offsets,
        })
    }

    /// the shape of the label map (and of every frame)
    pub fn shape(&self) -> [usize; 2] {
        self.shape
    }

    pub fn n_rois(&self) -> usize {
        self.roi_offsets.len() - 1
    }

    /// the total number of selected pixels
    pub fn n_selected(&self) -> usize {
        self.indices.len()
    }

    /// the ROI label (1-based) of each selected pixel
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// the flat (row-major) index of each selected pixel
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// the range of ROI `roi` within the selected pixels
    pub fn roi_range(&self, roi: usize) -> Range<usize> {
        self.roi_offsets[roi]..self.roi_offsets[roi + 1]
    }

    pub fn n_pixels(&self, roi: usize) -> usize {
        self.roi_range(roi).len()
    }

    pub(crate) fn check_shape(&self, frame: &ArrayView2<f64>) -> Result<(), Error> {
        let (n_rows, n_cols) = frame.dim();
        if [n_rows, n_cols] != self.shape {
            Err(Error::frame_shape(self.shape, [n_rows, n_cols]))
        } else {
            Ok(())
        }
    }

    /// copy the selected pixels of `frame` into `out`, in ROI order
    pub fn gather(&self, frame: &ArrayView2<f64>, out: &mut [f64]) -> Result<(), Error> {
        self.check_shape(frame)?;
        if out.len() != self.n_selected() {
            return Err(Error::internal(
                "the gather buffer must hold one entry per selected pixel",
            ));
        }
        let n_cols = self.shape[1];
        for (dst, &flat_index) in out.iter_mut().zip(&self.indices) {
            *dst = frame[[flat_index / n_cols, flat_index % n_cols]];
        }
        Ok(())
    }
}
