use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FrapError, Result};
use crate::io::FrameSource;
use crate::masked::MaskedStack;
use crate::progress::ProgressReporter;
use crate::roi::{sample_roi, PixelGeometry, Roi};

/// Options for [`IntensityAggregator::mean_intensity`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntensityOptions {
    /// Return one mean per frame instead of a single scalar.
    #[serde(default)]
    pub keep_time: bool,
    /// Subtract the background ROI's mean level from every pixel.
    #[serde(default = "default_true")]
    pub subtract_background: bool,
    /// Exclude pixels that are `<= 0` after subtraction.
    #[serde(default = "default_true")]
    pub only_positive: bool,
}

fn default_true() -> bool {
    true
}

impl Default for IntensityOptions {
    fn default() -> Self {
        Self {
            keep_time: false,
            subtract_background: true,
            only_positive: true,
        }
    }
}

impl IntensityOptions {
    pub fn trace() -> Self {
        Self {
            keep_time: true,
            ..Self::default()
        }
    }
}

/// Result of an intensity aggregation.
#[derive(Clone, Debug, PartialEq)]
pub enum MeanIntensity {
    /// Mean over every valid pixel of every frame.
    Scalar(f64),
    /// Spatial mean per frame, in frame order.
    Trace(Vec<f64>),
}

impl MeanIntensity {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::Trace(_) => None,
        }
    }

    pub fn into_trace(self) -> Option<Vec<f64>> {
        match self {
            Self::Trace(v) => Some(v),
            Self::Scalar(_) => None,
        }
    }
}

/// Reduces ROI pixels of a frame source to mean intensities.
pub struct IntensityAggregator<'a, S: FrameSource + ?Sized> {
    source: &'a S,
    geometry: PixelGeometry,
    background: Option<&'a Roi>,
    reporter: &'a dyn ProgressReporter,
}

impl<'a, S: FrameSource + ?Sized> IntensityAggregator<'a, S> {
    pub fn new(
        source: &'a S,
        geometry: PixelGeometry,
        background: Option<&'a Roi>,
        reporter: &'a dyn ProgressReporter,
    ) -> Self {
        Self {
            source,
            geometry,
            background,
            reporter,
        }
    }

    /// Mean intensity of `roi` without any background correction.
    pub fn raw_aggregate(
        &self,
        roi: Option<&Roi>,
        keep_time: bool,
        only_positive: bool,
    ) -> Result<MeanIntensity> {
        let stack = self.corrected_stack(roi, None, only_positive)?;
        Ok(if keep_time {
            MeanIntensity::Trace(stack.frame_means())
        } else {
            MeanIntensity::Scalar(stack.mean())
        })
    }

    /// Scalar background level: the raw positive-only mean of the
    /// background ROI.
    pub fn background_level(&self) -> Result<f64> {
        let background = self.background.ok_or_else(|| {
            FrapError::InvalidRoi("background subtraction requested but no background ROI".into())
        })?;
        let level = self.corrected_stack(Some(background), None, true)?.mean();
        debug!(level, "Background level");
        Ok(level)
    }

    /// Mean intensity of `roi`, optionally background-corrected.
    ///
    /// The background level is always a raw aggregate, so correction is
    /// exactly one level deep whatever role `roi` plays.
    pub fn mean_intensity(
        &self,
        roi: Option<&Roi>,
        options: IntensityOptions,
    ) -> Result<MeanIntensity> {
        let stack = self.prepared_stack(roi, options.subtract_background, options.only_positive)?;
        Ok(if options.keep_time {
            MeanIntensity::Trace(stack.frame_means())
        } else {
            MeanIntensity::Scalar(stack.mean())
        })
    }

    /// Per-frame mean intensity of `roi` against an already measured
    /// background level. `None` skips subtraction.
    pub fn corrected_trace(
        &self,
        roi: Option<&Roi>,
        background: Option<f64>,
        only_positive: bool,
    ) -> Result<Vec<f64>> {
        Ok(self
            .corrected_stack(roi, background, only_positive)?
            .frame_means())
    }

    fn prepared_stack(
        &self,
        roi: Option<&Roi>,
        subtract_background: bool,
        only_positive: bool,
    ) -> Result<MaskedStack> {
        // Validate the target before touching the background ROI.
        if roi.is_none() {
            return Err(FrapError::InvalidRoi("ROI is not set".into()));
        }
        let background = if subtract_background {
            Some(self.background_level()?)
        } else {
            None
        };
        self.corrected_stack(roi, background, only_positive)
    }

    fn corrected_stack(
        &self,
        roi: Option<&Roi>,
        background: Option<f64>,
        only_positive: bool,
    ) -> Result<MaskedStack> {
        let mut stack = sample_roi(self.source, roi, &self.geometry, self.reporter)?;
        if let Some(level) = background {
            stack.subtract(level);
        }
        if only_positive {
            stack.exclude_non_positive();
        }
        Ok(stack)
    }
}
