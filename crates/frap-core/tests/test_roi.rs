mod common;

use std::cell::Cell;

use ndarray::{Array2, Array3, Axis};

use frap_core::error::FrapError;
use frap_core::frame::PixelType;
use frap_core::io::{ExperimentMetadata, FrameSource, MemorySource};
use frap_core::progress::{AnalysisStage, NoOpReporter, ProgressReporter};
use frap_core::roi::{roi_footprint, sample_roi, PixelGeometry, Roi, RoiKind, RoiShape};

use common::metadata;

fn geometry(mpp: f64) -> PixelGeometry {
    PixelGeometry::new(mpp).unwrap()
}

// ---------------------------------------------------------------------------
// Circles
// ---------------------------------------------------------------------------

#[test]
fn test_circle_includes_exactly_pixels_within_radius() {
    let g = geometry(0.5);
    // center (10, 7) px, radius 4 px
    let roi = Roi::circle(RoiKind::Stimulation, [5.0, 3.5], 2.0);
    let mask = roi_footprint(Some(&roi), &g, (16, 20)).unwrap();

    for ((row, col), &inside) in mask.indexed_iter() {
        let dx = col as f64 - 10.0;
        let dy = row as f64 - 7.0;
        let within = (dx * dx + dy * dy).sqrt() <= 4.0;
        assert_eq!(inside, within, "pixel ({row}, {col})");
    }
    // (row 7, col 14) is exactly on the rim
    assert!(mask[[7, 14]]);
    assert!(!mask[[7, 15]]);
    assert!(!mask[[10, 13]]);
}

#[test]
fn test_circle_is_clipped_at_image_border() {
    let g = geometry(1.0);
    let roi = Roi::circle(RoiKind::Stimulation, [0.0, 0.0], 3.0);
    let mask = roi_footprint(Some(&roi), &g, (10, 10)).unwrap();
    // Quarter disc of radius 3 on the grid: 11 pixels
    assert_eq!(mask.iter().filter(|&&m| m).count(), 11);
    assert!(mask[[0, 3]]);
    assert!(mask[[3, 0]]);
    assert!(!mask[[3, 3]]);
}

#[test]
fn test_circle_center_rounds_half_pixels_outward() {
    let g = geometry(1.0);
    // 2.5 um rounds to pixel 3
    let roi = Roi::circle(RoiKind::Stimulation, [2.5, 2.5], 0.0);
    let mask = roi_footprint(Some(&roi), &g, (6, 6)).unwrap();
    assert!(mask[[3, 3]]);
    assert_eq!(mask.iter().filter(|&&m| m).count(), 1);
}

// ---------------------------------------------------------------------------
// Rectangles
// ---------------------------------------------------------------------------

#[test]
fn test_rectangle_bounds_are_inclusive() {
    let g = geometry(1.0);
    // x in [3, 7], y in [2, 4]
    let roi = Roi::rectangle(RoiKind::Reference, [5.0, 3.0], 4.0, 2.0);
    let mask = roi_footprint(Some(&roi), &g, (10, 12)).unwrap();

    for ((row, col), &inside) in mask.indexed_iter() {
        let expected = (3..=7).contains(&col) && (2..=4).contains(&row);
        assert_eq!(inside, expected, "pixel ({row}, {col})");
    }
}

#[test]
fn test_rectangle_x_is_columns_and_y_is_rows() {
    let g = geometry(1.0);
    let roi = Roi::rectangle(RoiKind::Reference, [8.0, 1.0], 0.0, 0.0);
    let mask = roi_footprint(Some(&roi), &g, (4, 10)).unwrap();
    assert!(mask[[1, 8]]);
    assert_eq!(mask.iter().filter(|&&m| m).count(), 1);
}

#[test]
fn test_rectangle_edges_at_half_pixels() {
    let g = geometry(0.5);
    // center 2.0 um = 4 px, half width 0.75 um -> [1.25, 2.75] um = [2.5, 5.5] px -> [3, 6]
    let roi = Roi::rectangle(RoiKind::Reference, [2.0, 2.0], 1.5, 1.5);
    let mask = roi_footprint(Some(&roi), &g, (10, 10)).unwrap();
    assert!(!mask[[4, 2]]);
    assert!(mask[[4, 3]]);
    assert!(mask[[4, 6]]);
    assert!(!mask[[4, 7]]);
    assert!(!mask[[2, 4]]);
    assert!(mask[[3, 4]]);
    assert!(mask[[6, 4]]);
    assert!(!mask[[7, 4]]);
}

#[test]
fn test_rectangle_clipped_and_outside_frame() {
    let g = geometry(1.0);
    let partial = Roi::rectangle(RoiKind::Reference, [0.0, 0.0], 4.0, 4.0);
    let mask = roi_footprint(Some(&partial), &g, (5, 5)).unwrap();
    assert_eq!(mask.iter().filter(|&&m| m).count(), 9);

    let outside = Roi::rectangle(RoiKind::Reference, [50.0, 50.0], 2.0, 2.0);
    let mask = roi_footprint(Some(&outside), &g, (5, 5)).unwrap();
    assert!(mask.iter().all(|&m| !m));
}

// ---------------------------------------------------------------------------
// Invalid ROIs
// ---------------------------------------------------------------------------

#[test]
fn test_unset_roi_is_invalid() {
    let g = geometry(1.0);
    assert!(matches!(
        roi_footprint(None, &g, (4, 4)),
        Err(FrapError::InvalidRoi(_))
    ));
}

#[test]
fn test_missing_shape_is_invalid() {
    let g = geometry(1.0);
    let roi = Roi {
        kind: RoiKind::Stimulation,
        shape: None,
        position: [1.0, 1.0],
        size: [1.0, 1.0],
    };
    assert!(matches!(
        roi_footprint(Some(&roi), &g, (4, 4)),
        Err(FrapError::InvalidRoi(_))
    ));
}

#[test]
fn test_unsupported_shape_is_invalid() {
    let g = geometry(1.0);
    let roi = Roi {
        kind: RoiKind::Stimulation,
        shape: Some(RoiShape::Unsupported("ellipse".into())),
        position: [1.0, 1.0],
        size: [1.0, 1.0],
    };
    let err = roi_footprint(Some(&roi), &g, (4, 4)).unwrap_err();
    assert!(err.to_string().contains("ellipse"), "got: {err}");
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

#[test]
fn test_sample_applies_mask_to_every_frame_in_order() {
    let frames = Array3::from_shape_fn((4, 6, 6), |(t, r, c)| (t * 1000 + r * 10 + c) as u16);
    let source = MemorySource::new(frames.view(), PixelType::U16, metadata(1.0, vec![], vec![]))
        .unwrap();
    let roi = Roi::circle(RoiKind::Stimulation, [2.0, 3.0], 1.0);
    let g = geometry(1.0);

    let stack = sample_roi(&source, Some(&roi), &g, &NoOpReporter).unwrap();
    let footprint = roi_footprint(Some(&roi), &g, (6, 6)).unwrap();

    // bounding box rows 2..=4, cols 1..=3
    assert_eq!(stack.origin, (2, 1));
    assert_eq!(stack.values.dim(), (4, 3, 3));
    let (r0, c0) = stack.origin;
    for t in 0..4 {
        for ((r, c), &inside) in stack.valid.index_axis(Axis(0), t).indexed_iter() {
            assert_eq!(inside, footprint[[r + r0, c + c0]]);
            if inside {
                let expected = (t * 1000 + (r + r0) * 10 + (c + c0)) as f64;
                assert_eq!(stack.values[[t, r, c]], expected);
            }
        }
    }
    // 5-pixel cross
    assert_eq!(stack.valid_count(), 4 * 5);
}

#[test]
fn test_sample_memory_is_bounded_by_roi() {
    let frames = Array3::<u16>::from_elem((3, 200, 300), 1);
    let source = MemorySource::new(frames.view(), PixelType::U16, metadata(1.0, vec![], vec![]))
        .unwrap();
    let roi = Roi::rectangle(RoiKind::Reference, [150.0, 100.0], 4.0, 2.0);
    let stack = sample_roi(&source, Some(&roi), &geometry(1.0), &NoOpReporter).unwrap();
    assert_eq!(stack.values.dim(), (3, 3, 5));
    assert_eq!(stack.origin, (99, 148));

    let outside = Roi::rectangle(RoiKind::Reference, [900.0, 900.0], 4.0, 2.0);
    let stack = sample_roi(&source, Some(&outside), &geometry(1.0), &NoOpReporter).unwrap();
    assert_eq!(stack.valid_count(), 0);
    assert!(stack.mean().is_nan());
    assert!(stack.frame_means().iter().all(|m| m.is_nan()));
}

/// Frame source whose reads fail from `fail_at` on.
struct BrokenSource {
    inner: MemorySource,
    fail_at: usize,
}

impl FrameSource for BrokenSource {
    fn metadata(&self) -> &ExperimentMetadata {
        self.inner.metadata()
    }

    fn pixel_type(&self) -> PixelType {
        self.inner.pixel_type()
    }

    fn dimensions(&self) -> (usize, usize) {
        self.inner.dimensions()
    }

    fn frame_count(&self) -> usize {
        self.inner.frame_count()
    }

    fn read_frame(&self, index: usize) -> frap_core::Result<Array2<f64>> {
        if index >= self.fail_at {
            return Err(FrapError::InvalidSer("truncated frame".into()));
        }
        self.inner.read_frame(index)
    }
}

#[derive(Default)]
struct StageCounter {
    begun: Cell<usize>,
    finished: Cell<usize>,
}

impl ProgressReporter for StageCounter {
    fn begin_stage(&self, _stage: AnalysisStage, _total_items: Option<usize>) {
        self.begun.set(self.begun.get() + 1);
    }

    fn finish_stage(&self) {
        self.finished.set(self.finished.get() + 1);
    }
}

#[test]
fn test_failed_read_still_finishes_stage() {
    let frames = Array3::<u16>::zeros((4, 4, 4));
    let source = BrokenSource {
        inner: MemorySource::new(frames.view(), PixelType::U16, metadata(1.0, vec![], vec![]))
            .unwrap(),
        fail_at: 2,
    };
    let roi = Roi::rectangle(RoiKind::Background, [1.0, 1.0], 2.0, 2.0);
    let counter = StageCounter::default();

    let result = sample_roi(&source, Some(&roi), &geometry(1.0), &counter);
    assert!(matches!(result, Err(FrapError::InvalidSer(_))));
    assert_eq!(counter.begun.get(), 1);
    assert_eq!(counter.finished.get(), 1);
}

#[test]
fn test_sample_keeps_dark_pixels_valid() {
    let frames = Array3::<u16>::zeros((2, 4, 4));
    let source = MemorySource::new(frames.view(), PixelType::U16, metadata(1.0, vec![], vec![]))
        .unwrap();
    let roi = Roi::rectangle(RoiKind::Background, [1.0, 1.0], 2.0, 2.0);
    let stack = sample_roi(&source, Some(&roi), &geometry(1.0), &NoOpReporter).unwrap();
    assert_eq!(stack.valid_count(), 2 * 9);
    assert_eq!(stack.mean(), 0.0);
}
