use ndarray::{s, Array2, Array3};

use crate::error::{FrapError, Result};
use crate::io::FrameSource;
use crate::masked::MaskedStack;
use crate::progress::{AnalysisStage, ProgressReporter};

use super::geometry::PixelGeometry;
use super::{Roi, RoiShape};

/// Clipped bounding box of an ROI footprint with the mask inside it.
struct Window {
    row0: usize,
    col0: usize,
    mask: Array2<bool>,
}

impl Window {
    fn empty() -> Self {
        Self {
            row0: 0,
            col0: 0,
            mask: Array2::from_elem((0, 0), false),
        }
    }

    fn rows(&self) -> std::ops::Range<usize> {
        self.row0..self.row0 + self.mask.nrows()
    }

    fn cols(&self) -> std::ops::Range<usize> {
        self.col0..self.col0 + self.mask.ncols()
    }
}

/// Pixel mask of an ROI on a `(height, width)` frame.
///
/// Rectangles use the inclusive pixel bounds
/// `[to_pixel(center - size / 2), to_pixel(center + size / 2)]` per axis,
/// x along columns and y along rows. Circles include a pixel when its
/// squared distance from the pixel-rounded center is at most the squared
/// pixel-rounded radius. Both are clipped to the frame.
pub fn roi_footprint(
    roi: Option<&Roi>,
    geometry: &PixelGeometry,
    dims: (usize, usize),
) -> Result<Array2<bool>> {
    let window = footprint_window(roi, geometry, dims)?;
    let mut mask = Array2::<bool>::from_elem(dims, false);
    mask.slice_mut(s![window.rows(), window.cols()])
        .assign(&window.mask);
    Ok(mask)
}

fn footprint_window(
    roi: Option<&Roi>,
    geometry: &PixelGeometry,
    dims: (usize, usize),
) -> Result<Window> {
    let roi = roi.ok_or_else(|| FrapError::InvalidRoi("ROI is not set".into()))?;
    let (height, width) = dims;

    match &roi.shape {
        Some(RoiShape::Rectangle) => {
            let [cx, cy] = roi.position;
            let [w, h] = roi.size;
            let left = geometry.to_pixel(cx - w / 2.0);
            let right = geometry.to_pixel(cx + w / 2.0);
            let bottom = geometry.to_pixel(cy - h / 2.0);
            let top = geometry.to_pixel(cy + h / 2.0);

            Ok(match (clip(left, right, width), clip(bottom, top, height)) {
                (Some(cols), Some(rows)) => Window {
                    row0: rows.0,
                    col0: cols.0,
                    mask: Array2::from_elem((rows.1 - rows.0 + 1, cols.1 - cols.0 + 1), true),
                },
                _ => Window::empty(),
            })
        }
        Some(RoiShape::Circle) => {
            let cx = geometry.to_pixel(roi.position[0]);
            let cy = geometry.to_pixel(roi.position[1]);
            let r = geometry.to_pixel(roi.size[0]);
            if r < 0 {
                return Err(FrapError::InvalidRoi(format!(
                    "circle radius must be non-negative, got {} um",
                    roi.size[0]
                )));
            }
            let r2 = r * r;

            Ok(
                match (clip(cx - r, cx + r, width), clip(cy - r, cy + r, height)) {
                    (Some(cols), Some(rows)) => {
                        let shape = (rows.1 - rows.0 + 1, cols.1 - cols.0 + 1);
                        let mask = Array2::from_shape_fn(shape, |(i, j)| {
                            let dy = (rows.0 + i) as i64 - cy;
                            let dx = (cols.0 + j) as i64 - cx;
                            dx * dx + dy * dy <= r2
                        });
                        Window {
                            row0: rows.0,
                            col0: cols.0,
                            mask,
                        }
                    }
                    _ => Window::empty(),
                },
            )
        }
        Some(RoiShape::Unsupported(shape)) => Err(FrapError::InvalidRoi(format!(
            "only circular and rectangular ROIs are supported, got '{shape}'"
        ))),
        None => Err(FrapError::InvalidRoi(format!(
            "{} ROI has no shape",
            roi.kind
        ))),
    }
}

/// Read every frame of `source` with pixels outside the ROI marked invalid.
///
/// Frames are read once each, in time order. The stack covers only the
/// footprint's clipped bounding box; its `origin` is the box's top-left
/// pixel in frame coordinates.
pub fn sample_roi<S: FrameSource + ?Sized>(
    source: &S,
    roi: Option<&Roi>,
    geometry: &PixelGeometry,
    reporter: &dyn ProgressReporter,
) -> Result<MaskedStack> {
    let dims = source.dimensions();
    let window = footprint_window(roi, geometry, dims)?;
    let n = source.frame_count();
    let (h, w) = window.mask.dim();

    if let Some(roi) = roi {
        reporter.begin_stage(AnalysisStage::Sampling(roi.kind.clone()), Some(n));
    }

    let mut values = Array3::<f64>::zeros((n, h, w));
    let mut valid = Array3::<bool>::from_elem((n, h, w), false);
    let filled = fill_window(source, &window, &mut values, &mut valid, reporter);
    reporter.finish_stage();
    filled?;

    Ok(MaskedStack::new(values, valid).with_origin((window.row0, window.col0)))
}

fn fill_window<S: FrameSource + ?Sized>(
    source: &S,
    window: &Window,
    values: &mut Array3<f64>,
    valid: &mut Array3<bool>,
    reporter: &dyn ProgressReporter,
) -> Result<()> {
    let dims = source.dimensions();
    for t in 0..values.len_of(ndarray::Axis(0)) {
        let frame = source.read_frame(t)?;
        if frame.dim() != dims {
            return Err(FrapError::InvalidDimensions {
                width: frame.ncols() as u32,
                height: frame.nrows() as u32,
            });
        }
        values
            .slice_mut(s![t, .., ..])
            .assign(&frame.slice(s![window.rows(), window.cols()]));
        valid.slice_mut(s![t, .., ..]).assign(&window.mask);
        reporter.advance(t + 1);
    }
    Ok(())
}

/// Inclusive `[lo, hi]` pixel range clipped to `0..len`, or `None` if empty.
fn clip(lo: i64, hi: i64, len: usize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let lo = lo.max(0);
    let hi = hi.min(len as i64 - 1);
    if lo > hi {
        None
    } else {
        Some((lo as usize, hi as usize))
    }
}
