use ndarray::{Array3, Axis};

/// A stack of frames with an explicit validity bit per pixel.
///
/// Pixels outside an ROI, or rejected by a validity policy, are marked
/// invalid and never contribute to a mean. Their stored value is
/// meaningless.
#[derive(Clone, Debug)]
pub struct MaskedStack {
    /// Pixel values, shape = (frames, height, width)
    pub values: Array3<f64>,
    /// `true` where the pixel takes part in aggregation
    pub valid: Array3<bool>,
    /// Frame coordinates `(row, col)` of the stack's top-left pixel
    pub origin: (usize, usize),
}

impl MaskedStack {
    pub fn new(values: Array3<f64>, valid: Array3<bool>) -> Self {
        debug_assert_eq!(values.dim(), valid.dim());
        Self {
            values,
            valid,
            origin: (0, 0),
        }
    }

    pub fn with_origin(mut self, origin: (usize, usize)) -> Self {
        self.origin = origin;
        self
    }

    pub fn frame_count(&self) -> usize {
        self.values.len_of(Axis(0))
    }

    /// Number of valid pixels across all frames.
    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|&&ok| ok).count()
    }

    /// Subtract a constant level from every valid pixel.
    pub fn subtract(&mut self, level: f64) {
        for (v, &ok) in self.values.iter_mut().zip(self.valid.iter()) {
            if ok {
                *v -= level;
            }
        }
    }

    /// Invalidate every pixel that is not a finite, strictly positive value.
    pub fn exclude_non_positive(&mut self) {
        for (&v, ok) in self.values.iter().zip(self.valid.iter_mut()) {
            if !v.is_finite() || v <= 0.0 {
                *ok = false;
            }
        }
    }

    /// Mean over all valid pixels of all frames; NaN when there are none.
    pub fn mean(&self) -> f64 {
        masked_mean(self.values.iter().copied(), self.valid.iter().copied())
    }

    /// Spatial mean of each frame over its valid pixels, in frame order.
    /// A frame without valid pixels yields NaN.
    pub fn frame_means(&self) -> Vec<f64> {
        self.values
            .axis_iter(Axis(0))
            .zip(self.valid.axis_iter(Axis(0)))
            .map(|(values, valid)| masked_mean(values.iter().copied(), valid.iter().copied()))
            .collect()
    }
}

fn masked_mean(values: impl Iterator<Item = f64>, valid: impl Iterator<Item = bool>) -> f64 {
    let mut sum = 0.0f64;
    let mut count = 0usize;
    for (v, ok) in values.zip(valid) {
        if ok {
            sum += v;
            count += 1;
        }
    }
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}
