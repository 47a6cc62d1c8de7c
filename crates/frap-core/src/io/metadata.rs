use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FrapError, Result};
use crate::roi::{find_roi, Roi, RoiKind};

/// Experiment metadata stored alongside the frames: pixel scale, ROIs and
/// the acquisition-loop timeline.
///
/// On disk this is a TOML sidecar:
///
/// ```toml
/// pixel_microns = 0.25
///
/// [[rois]]
/// type = "stimulation"
/// shape = "circle"
/// position = [12.0, 8.5]
/// size = [1.5, 1.5]
///
/// [[experiment.loops]]
/// duration = 10.0
/// sampling_interval = 1.0
/// stimulation = false
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentMetadata {
    /// Physical size of one pixel in microns.
    pub pixel_microns: f64,
    /// Number of frames the experiment was configured to record. The frame
    /// file may hold fewer if acquisition stopped early.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_frames: Option<usize>,
    #[serde(default)]
    pub rois: Vec<Roi>,
    #[serde(default)]
    pub experiment: Experiment,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    #[serde(default)]
    pub loops: Vec<AcquisitionLoop>,
}

/// One phase of the acquisition protocol, in seconds.
///
/// A stimulation loop is the bleach event: it records no frames.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionLoop {
    pub duration: f64,
    pub sampling_interval: f64,
    #[serde(default)]
    pub stimulation: bool,
}

impl AcquisitionLoop {
    pub fn imaging(duration: f64, sampling_interval: f64) -> Self {
        Self {
            duration,
            sampling_interval,
            stimulation: false,
        }
    }

    pub fn stimulation(duration: f64) -> Self {
        Self {
            duration,
            sampling_interval: duration,
            stimulation: true,
        }
    }

    /// Whether an imaging loop's timing can produce frames: a positive
    /// finite interval and a non-NaN duration.
    pub fn has_usable_timing(&self) -> bool {
        self.sampling_interval.is_finite()
            && self.sampling_interval > 0.0
            && !self.duration.is_nan()
    }

    /// Nominal number of frames recorded by this loop, as a float. Loops
    /// without usable timing record none.
    pub fn frame_span(&self) -> f64 {
        if self.stimulation || !self.has_usable_timing() {
            0.0
        } else {
            self.duration / self.sampling_interval
        }
    }
}

impl ExperimentMetadata {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let metadata: Self =
            toml::from_str(contents).map_err(|e| FrapError::Metadata(e.to_string()))?;
        metadata.validate()?;
        Ok(metadata)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| FrapError::Metadata(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Check the pixel scale and imaging loop timings.
    pub fn validate(&self) -> Result<()> {
        if !self.pixel_microns.is_finite() || self.pixel_microns <= 0.0 {
            return Err(FrapError::Metadata(format!(
                "pixel_microns must be positive, got {}",
                self.pixel_microns
            )));
        }
        for (i, lp) in self.experiment.loops.iter().enumerate() {
            if lp.stimulation {
                continue;
            }
            if !lp.sampling_interval.is_finite() || lp.sampling_interval <= 0.0 {
                return Err(FrapError::Metadata(format!(
                    "loop {i}: sampling_interval must be positive, got {}",
                    lp.sampling_interval
                )));
            }
            if !lp.duration.is_finite() || lp.duration < 0.0 {
                return Err(FrapError::Metadata(format!(
                    "loop {i}: duration must be non-negative, got {}",
                    lp.duration
                )));
            }
        }
        Ok(())
    }

    /// First ROI of the given kind.
    pub fn roi(&self, kind: &RoiKind) -> Option<&Roi> {
        find_roi(&self.rois, kind)
    }

    pub fn loops(&self) -> &[AcquisitionLoop] {
        &self.experiment.loops
    }
}
