//! The multi-tau cascade.
//!
//! The cascade consumes the raw frames of a single image series, one at a
//! time, and synthesizes frames with longer integration times on the fly.
//!
//! # How it works
//!
//! Every level owns a ring buffer with `base` slots (`base` is the timebin
//! base, usually 2). When a raw frame arrives:
//! 1. its ROI pixels are written into the next slot of level 0 and the
//!    histogram engine records it.
//! 2. level 1's [`LevelTrigger`] is fed one input. Unless this completes a
//!    group of `base` inputs, we are done. Otherwise the `base` most recent
//!    frames of level 0 are summed into the next slot of level 1, which is
//!    recorded, and we move on to feed level 2's trigger, and so on.
//!
//! After `N` raw frames, level `ℓ` has received `floor(N / base^ℓ)` frames.
//! Memory usage is `n_levels * base` gathered frames, independent of `N`.

use crate::moments::{HistogramEngine, SeriesStatistics};
use crate::{Error, RoiIndices};
use ndarray::ArrayView2;
use xsvs_nostd_internal::{LevelTrigger, RingCursor, TriggerAction};

/// One rung of the cascade
struct Level {
    // each slot holds a frame gathered in ROI order
    ring: Vec<Vec<f64>>,
    cursor: RingCursor,
    // unused at level 0
    trigger: LevelTrigger,
}

impl Level {
    fn new(base: usize, n_selected: usize) -> Result<Self, Error> {
        Ok(Level {
            ring: vec![vec![0.0; n_selected]; base],
            cursor: RingCursor::new(base).map_err(Error::internal)?,
            trigger: LevelTrigger::Idle,
        })
    }
}

/// Streams the frames of one image series through the cascade.
///
/// Instances are created with [`crate::Xsvs::cascade`] (or
/// [`MultiTauCascade::new`]). Once the series is exhausted, call
/// [`MultiTauCascade::finish`] to get the series' statistics. If the series
/// is abandoned part way through, just drop the cascade.
pub struct MultiTauCascade<'a> {
    rois: &'a RoiIndices,
    base: usize,
    levels: Vec<Level>,
    engine: HistogramEngine,
    n_raw_frames: u64,
}

impl<'a> MultiTauCascade<'a> {
    /// Creates a cascade with `n_levels` levels, where each level sums
    /// `base` frames of the level below it.
    ///
    /// `max_count` is the largest raw pixel count, which sizes the histogram
    /// bins of each level.
    pub fn new(
        rois: &'a RoiIndices,
        base: u64,
        n_levels: usize,
        max_count: u64,
    ) -> Result<Self, Error> {
        if base < 2 {
            return Err(Error::integer_range("the timebin base", base, 2, u64::MAX));
        } else if n_levels == 0 {
            return Err(Error::integer_range(
                "the number of levels",
                0,
                1,
                u32::MAX as u64,
            ));
        }
        let base_usize = usize::try_from(base).map_err(|_| {
            Error::integer_range("the timebin base", base, 2, usize::MAX as u64)
        })?;

        let engine = HistogramEngine::new(max_count, base, n_levels, rois.n_rois())?;
        let levels = (0..n_levels)
            .map(|_| Level::new(base_usize, rois.n_selected()))
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(MultiTauCascade {
            rois,
            base: base_usize,
            levels,
            engine,
            n_raw_frames: 0,
        })
    }

    pub fn n_levels(&self) -> usize {
        self.levels.len()
    }

    /// the number of raw frames consumed so far
    pub fn n_raw_frames(&self) -> u64 {
        self.n_raw_frames
    }

    /// the number of frames each level has received so far
    pub fn frames_per_level(&self) -> &[u64] {
        self.engine.frames_per_level()
    }

    /// the trigger state of `level` (level 0 is always idle)
    ///
    /// # Panics
    /// Panics if `level` is not less than [`MultiTauCascade::n_levels`].
    pub fn trigger(&self, level: usize) -> LevelTrigger {
        self.levels[level].trigger
    }

    /// Consume the next raw frame of the series.
    ///
    /// `sequence_index` is the frame's position within the series; it is
    /// only used for diagnostics. Returns the number of levels that received
    /// a frame (always at least 1).
    ///
    /// Every pixel count must land in a count bin of its level, i.e. lie in
    /// `[0, max_count * base^level + 1)`. Values outside of that range
    /// (including NaN) produce an error rather than a skewed histogram.
    ///
    /// An error leaves the cascade in an unspecified state; the series should
    /// be abandoned.
    pub fn push_frame(
        &mut self,
        sequence_index: usize,
        frame: ArrayView2<f64>,
    ) -> Result<usize, Error> {
        let level0 = &mut self.levels[0];
        self.rois.check_shape(&frame)?;
        let slot = level0.cursor.advance();
        self.rois.gather(&frame, &mut level0.ring[slot])?;
        self.engine.record(0, &level0.ring[slot], self.rois)?;
        self.n_raw_frames += 1;

        let mut n_updated = 1;
        for level in 1..self.levels.len() {
            let (lower, upper) = self.levels.split_at_mut(level);
            let below = &lower[level - 1];
            let this = &mut upper[0];

            let (trigger, action) = this.trigger.next(self.base);
            this.trigger = trigger;
            if action == TriggerAction::Hold {
                break;
            }

            let slot = this.cursor.advance();
            let dst = &mut this.ring[slot];
            dst.fill(0.0);
            for src_slot in below.cursor.recent(self.base) {
                for (d, s) in dst.iter_mut().zip(&below.ring[src_slot]) {
                    *d += s;
                }
            }
            log::trace!("frame {sequence_index}: promoted into level {level} (slot {slot})");

            self.engine.record(level, &this.ring[slot], self.rois)?;
            n_updated += 1;
        }
        Ok(n_updated)
    }

    /// Finish the series and return its statistics.
    pub fn finish(self) -> SeriesStatistics {
        log::debug!(
            "series finished after {} raw frames; frames per level: {:?}",
            self.n_raw_frames,
            self.engine.frames_per_level()
        );
        self.engine.into_statistics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract_label_indices;
    use ndarray::{Array2, array};

    #[test]
    fn invalid_construction() {
        let label_map = array![[1, 1]];
        let rois = extract_label_indices(label_map.view()).unwrap();
        assert!(MultiTauCascade::new(&rois, 1, 3, 4).is_err());
        assert!(MultiTauCascade::new(&rois, 2, 0, 4).is_err());
        assert!(MultiTauCascade::new(&rois, 2, 3, 4).is_ok());
    }

    #[test]
    fn levels_updated_per_frame() {
        let label_map = array![[1, 2]];
        let rois = extract_label_indices(label_map.view()).unwrap();
        let mut cascade = MultiTauCascade::new(&rois, 2, 3, 1).unwrap();
        let frame = Array2::<f64>::ones((1, 2));

        let updated: Vec<usize> = (0..8)
            .map(|i| cascade.push_frame(i, frame.view()).unwrap())
            .collect();
        assert_eq!(updated, vec![1, 2, 1, 3, 1, 2, 1, 3]);
        assert_eq!(cascade.frames_per_level(), &[8, 4, 2]);
        assert_eq!(cascade.n_raw_frames(), 8);
    }

    #[test]
    fn promotion_sums_recent_frames() {
        let label_map = array![[1]];
        let rois = extract_label_indices(label_map.view()).unwrap();
        let mut cascade = MultiTauCascade::new(&rois, 2, 2, 3).unwrap();

        cascade.push_frame(0, array![[1.0]].view()).unwrap();
        assert!(cascade.trigger(1).is_armed());
        cascade.push_frame(1, array![[2.0]].view()).unwrap();
        assert_eq!(cascade.trigger(1), LevelTrigger::Idle);

        let stats = cascade.finish();
        // level 1 saw a single synthesized frame with the value 1 + 2
        assert_eq!(stats.mean().get(1, 0)[3], 1.0);
        assert_eq!(stats.mean().get(0, 0), &[0.0, 0.5, 0.5, 0.0]);
    }

    #[test]
    fn rejects_wrong_frame_shape() {
        let label_map = array![[1, 2]];
        let rois = extract_label_indices(label_map.view()).unwrap();
        let mut cascade = MultiTauCascade::new(&rois, 2, 2, 1).unwrap();
        let frame = Array2::<f64>::ones((2, 1));
        let err = cascade.push_frame(0, frame.view()).unwrap_err();
        assert!(err.is_frame_shape());
        assert_eq!(cascade.n_raw_frames(), 0);
    }

    #[test]
    fn rejects_counts_above_max_count() {
        let label_map = array![[1, 1]];
        let rois = extract_label_indices(label_map.view()).unwrap();

        let mut cascade = MultiTauCascade::new(&rois, 2, 2, 1).unwrap();
        let err = cascade.push_frame(0, array![[2.0, 2.0]].view()).unwrap_err();
        assert!(err.is_pixel_value());

        // a single offending pixel is enough
        let mut cascade = MultiTauCascade::new(&rois, 2, 2, 1).unwrap();
        let err = cascade.push_frame(0, array![[0.0, 5.0]].view()).unwrap_err();
        assert!(err.is_pixel_value());
        assert_eq!(cascade.frames_per_level(), &[0, 0]);
    }

    #[test]
    #[should_panic]
    fn trigger_level_out_of_bounds() {
        let label_map = array![[1]];
        let rois = extract_label_indices(label_map.view()).unwrap();
        let cascade = MultiTauCascade::new(&rois, 2, 2, 1).unwrap();
        let _ = cascade.trigger(2);
    }
}
