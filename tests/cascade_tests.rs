mod common;

use common::{assert_allclose, point_mass};
use ndarray::{Array2, Array3, array};
use xsvs::{RoiIndices, XsvsBuilder, extract_label_indices, max_counts};
use xsvs_test::{banded_label_map, random_series, reference_level_means};

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn cascade_frame_counts() {
        let label_map = banded_label_map([4, 4], 2);
        let plan = XsvsBuilder::new()
            .frames_per_series(64)
            .max_count(3)
            .build(label_map.view())
            .unwrap();
        assert_eq!(plan.n_levels(), 7);

        for n_frames in [0_usize, 1, 2, 7, 37, 64, 100] {
            let frames = random_series([n_frames, 4, 4], 3, 1234 + n_frames as u64);
            let mut cascade = plan.cascade().unwrap();
            for (i, frame) in frames.outer_iter().enumerate() {
                cascade.push_frame(i, frame).unwrap();
            }
            let expected: Vec<u64> = (0..plan.n_levels())
                .map(|level| (n_frames / 2_usize.pow(level as u32)) as u64)
                .collect();
            assert_eq!(cascade.frames_per_level(), &expected, "{n_frames} frames");
            assert_eq!(cascade.finish().frames_per_level(), &expected);
        }
    }

    #[test]
    fn base_three_frame_counts() {
        let label_map = banded_label_map([2, 3], 1);
        let plan = XsvsBuilder::new()
            .timebin_base(3)
            .frames_per_series(30)
            .max_count(2)
            .build(label_map.view())
            .unwrap();
        assert_eq!(plan.schedule(), &[1, 3, 9, 27]);

        let frames = random_series([30, 2, 3], 2, 99);
        let mut cascade = plan.cascade().unwrap();
        for (i, frame) in frames.outer_iter().enumerate() {
            cascade.push_frame(i, frame).unwrap();
        }
        assert_eq!(cascade.frames_per_level(), &[30, 10, 3, 1]);
    }

    #[test]
    fn promotion_alternation() {
        let label_map = banded_label_map([2, 2], 1);
        let plan = XsvsBuilder::new()
            .frames_per_series(32)
            .max_count(1)
            .build(label_map.view())
            .unwrap();
        let frames = random_series([32, 2, 2], 1, 7);

        let mut cascade = plan.cascade().unwrap();
        let mut events = vec![0_u64; plan.n_levels()];
        for (i, frame) in frames.outer_iter().enumerate() {
            let n_updated = cascade.push_frame(i, frame).unwrap();
            for count in events.iter_mut().take(n_updated) {
                *count += 1;
            }

            for level in 1..plan.n_levels() {
                let lower_updated = level - 1 < n_updated;
                if !lower_updated {
                    // the level wasn't fed, so it can't have promoted
                    assert!(level >= n_updated);
                    continue;
                }
                let promoted = level < n_updated;
                let lower_is_even = events[level - 1] % 2 == 0;
                assert_eq!(
                    promoted, lower_is_even,
                    "frame {i}: level {level} after {} events below",
                    events[level - 1]
                );
                // an odd number of events below leaves the level armed
                assert_eq!(cascade.trigger(level).is_armed(), !lower_is_even);
            }
        }
        assert_eq!(events, vec![32, 16, 8, 4, 2, 1]);
    }

    #[test]
    fn streaming_matches_reference() {
        for (base, seed) in [(2_u64, 5_u64), (3, 6)] {
            let label_map = array![
                [1, 1, 2, 2, 0],
                [1, 1, 2, 2, 0],
                [3, 3, 3, 0, 0],
                [3, 3, 3, 2, 0]
            ];
            let frames = random_series([23, 4, 5], 4, seed);
            let rois = extract_label_indices(label_map.view()).unwrap();
            let max_count = max_counts(&[frames.view()], &rois).unwrap();

            let plan = XsvsBuilder::new()
                .timebin_base(base)
                .frames_per_series(23)
                .max_count(max_count)
                .build_with_indices(rois)
                .unwrap();
            let mut cascade = plan.cascade().unwrap();
            for (i, frame) in frames.outer_iter().enumerate() {
                cascade.push_frame(i, frame).unwrap();
            }
            let stats = cascade.finish();

            let reference = reference_level_means(
                frames.view(),
                label_map.view(),
                base as usize,
                plan.n_levels(),
                max_count,
            );
            for ((level, roi), mean) in stats.mean().iter() {
                assert_allclose(
                    mean,
                    &reference[level][roi],
                    1e-12,
                    1e-14,
                    &format!("base {base}, level {level}, roi {roi}"),
                );
                let total: f64 = mean.iter().sum();
                if stats.frames_per_level()[level] > 0 {
                    assert!((total - 1.0).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn single_pixel_roi_is_a_point_mass() {
        let label_map = array![[0, 1, 0], [2, 2, 2]];
        let rois = extract_label_indices(label_map.view()).unwrap();
        assert_eq!(rois.n_pixels(0), 1);

        let plan = XsvsBuilder::new()
            .frames_per_series(4)
            .max_count(5)
            .build_with_indices(rois)
            .unwrap();

        // after a single frame, the mean is that frame's histogram
        let frame = array![[0.0, 3.0, 0.0], [1.0, 2.0, 5.0]];
        let mut cascade = plan.cascade().unwrap();
        cascade.push_frame(0, frame.view()).unwrap();
        let stats = cascade.finish();
        assert_eq!(stats.mean().get(0, 0), point_mass(6, 3).as_slice());

        // a constant pixel stays a point mass at every level
        let frames = Array3::<f64>::from_elem((4, 2, 3), 2.0);
        let mut cascade = plan.cascade().unwrap();
        for (i, frame) in frames.outer_iter().enumerate() {
            cascade.push_frame(i, frame).unwrap();
        }
        let stats = cascade.finish();
        for level in 0..plan.n_levels() {
            let n_bins = plan.bins_per_level()[level];
            let value = 2 * 2_usize.pow(level as u32);
            assert_eq!(stats.mean().get(level, 0), point_mass(n_bins, value).as_slice());
            assert_eq!(stats.mean_sq().get(level, 0), point_mass(n_bins, value).as_slice());
        }
    }

    #[test]
    fn roi_without_pixels_yields_zeros() {
        let label_map = array![[1, 1], [3, 0]];
        let rois = RoiIndices::with_roi_count(label_map.view(), 3).unwrap();
        let plan = XsvsBuilder::new()
            .frames_per_series(4)
            .max_count(2)
            .build_with_indices(rois)
            .unwrap();

        let frames = random_series([4, 2, 2], 2, 11);
        let mut cascade = plan.cascade().unwrap();
        for (i, frame) in frames.outer_iter().enumerate() {
            cascade.push_frame(i, frame).unwrap();
        }
        let stats = cascade.finish();
        for level in 0..plan.n_levels() {
            assert!(stats.mean().get(level, 1).iter().all(|&v| v == 0.0));
            assert!(stats.mean_sq().get(level, 1).iter().all(|&v| v == 0.0));
            let total: f64 = stats.mean().get(level, 0).iter().sum();
            assert!((total - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn frames_with_other_layouts() {
        // a transposed (column-major) frame must be read in logical order
        let label_map = array![[1, 2], [2, 2]];
        let plan = XsvsBuilder::new()
            .frames_per_series(1)
            .max_count(9)
            .build(label_map.view())
            .unwrap();

        let frame = Array2::from_shape_vec((2, 2), vec![4.0, 1.0, 1.0, 1.0]).unwrap();
        let transposed = frame.t().to_owned();
        let mut cascade = plan.cascade().unwrap();
        cascade.push_frame(0, transposed.t()).unwrap();
        let stats = cascade.finish();
        assert_eq!(stats.mean().get(0, 0), point_mass(10, 4).as_slice());
    }

    #[test]
    fn determinism() {
        let label_map = banded_label_map([6, 5], 3);
        let series_a = random_series([20, 6, 5], 6, 2024);
        let series_b = random_series([17, 6, 5], 6, 2025);

        let first = xsvs::run(
            &[series_a.view(), series_b.view()],
            label_map.view(),
            2,
            20,
        )
        .unwrap();
        let second = xsvs::run(
            &[series_a.view(), series_b.view()],
            label_map.view(),
            2,
            20,
        )
        .unwrap();
        assert_eq!(first, second);
    }
}
