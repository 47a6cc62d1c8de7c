use std::path::Path;

use tracing::info;

use crate::config::AnalysisConfig;
use crate::error::{FrapError, Result};
use crate::intensity::{IntensityAggregator, IntensityOptions, MeanIntensity};
use crate::io::{ExperimentMetadata, FrameSource, SerDataset};
use crate::progress::{AnalysisStage, NoOpReporter, ProgressReporter};
use crate::recovery::{fit_recovery, normalize_stimulation, RecoveryFit};
use crate::roi::{PixelGeometry, Roi, RoiKind};
use crate::timeline::Timeline;

/// FRAP analysis over one recording.
///
/// ROIs, the bleach index and timestamps are derived once when the analyzer
/// is built; every other operation reads frames afresh and keeps no state.
/// The source is owned exclusively and released on drop.
pub struct FrapAnalyzer<S: FrameSource = SerDataset> {
    source: S,
    geometry: PixelGeometry,
    background_roi: Option<Roi>,
    reference_roi: Option<Roi>,
    stimulation_roi: Option<Roi>,
    timeline: Timeline,
    config: AnalysisConfig,
    reporter: Box<dyn ProgressReporter>,
}

impl FrapAnalyzer<SerDataset> {
    /// Open a SER recording and its metadata sidecar.
    pub fn open(path: &Path) -> Result<Self> {
        Self::new(SerDataset::open(path)?)
    }
}

impl<S: FrameSource> FrapAnalyzer<S> {
    pub fn new(source: S) -> Result<Self> {
        let geometry = PixelGeometry::new(source.pixel_microns())?;
        let metadata = source.metadata();
        let background_roi = metadata.roi(&RoiKind::Background).cloned();
        let reference_roi = metadata.roi(&RoiKind::Reference).cloned();
        let stimulation_roi = metadata.roi(&RoiKind::Stimulation).cloned();
        let timeline = Timeline::from_loops(metadata.loops(), source.frame_count());

        info!(
            frames = source.frame_count(),
            bleach_index = timeline.bleach_index(),
            background = background_roi.is_some(),
            reference = reference_roi.is_some(),
            stimulation = stimulation_roi.is_some(),
            "Recording loaded"
        );

        Ok(Self {
            source,
            geometry,
            background_roi,
            reference_roi,
            stimulation_roi,
            timeline,
            config: AnalysisConfig::default(),
            reporter: Box::new(NoOpReporter),
        })
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_reporter(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn metadata(&self) -> &ExperimentMetadata {
        self.source.metadata()
    }

    pub fn geometry(&self) -> PixelGeometry {
        self.geometry
    }

    pub fn background_roi(&self) -> Option<&Roi> {
        self.background_roi.as_ref()
    }

    pub fn reference_roi(&self) -> Option<&Roi> {
        self.reference_roi.as_ref()
    }

    pub fn stimulation_roi(&self) -> Option<&Roi> {
        self.stimulation_roi.as_ref()
    }

    /// ROI of the given role, if the recording defines one.
    pub fn roi(&self, kind: &RoiKind) -> Option<&Roi> {
        match kind {
            RoiKind::Background => self.background_roi(),
            RoiKind::Reference => self.reference_roi(),
            RoiKind::Stimulation => self.stimulation_roi(),
            RoiKind::Other(_) => self.metadata().roi(kind),
        }
    }

    pub fn bleach_index(&self) -> usize {
        self.timeline.bleach_index()
    }

    pub fn timestamps(&self) -> &[f64] {
        self.timeline.timestamps()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    fn aggregator(&self) -> IntensityAggregator<'_, S> {
        IntensityAggregator::new(
            &self.source,
            self.geometry,
            self.background_roi.as_ref(),
            self.reporter.as_ref(),
        )
    }

    /// Mean intensity of `roi`, see [`IntensityAggregator::mean_intensity`].
    pub fn mean_intensity(
        &self,
        roi: Option<&Roi>,
        options: IntensityOptions,
    ) -> Result<MeanIntensity> {
        self.aggregator().mean_intensity(roi, options)
    }

    /// Mean intensity of `roi` with no background correction.
    pub fn raw_aggregate(
        &self,
        roi: Option<&Roi>,
        keep_time: bool,
        only_positive: bool,
    ) -> Result<MeanIntensity> {
        self.aggregator().raw_aggregate(roi, keep_time, only_positive)
    }

    /// Scalar background level subtracted by [`Self::mean_intensity`].
    pub fn background_level(&self) -> Result<f64> {
        self.aggregator().background_level()
    }

    /// Stimulated-region signal corrected for background and acquisition
    /// bleaching, one value per frame.
    ///
    /// The background level is measured once and shared by both traces.
    pub fn normalized_stimulation(&self) -> Result<Vec<f64>> {
        let reference_roi = required_roi(self.reference_roi(), RoiKind::Reference)?;
        let stimulation_roi = required_roi(self.stimulation_roi(), RoiKind::Stimulation)?;
        let intensity = &self.config.intensity;
        let aggregator = self.aggregator();

        let background = if intensity.subtract_background {
            Some(aggregator.background_level()?)
        } else {
            None
        };
        let reference =
            aggregator.corrected_trace(Some(reference_roi), background, intensity.only_positive)?;
        let stimulated =
            aggregator.corrected_trace(Some(stimulation_roi), background, intensity.only_positive)?;

        self.reporter.begin_stage(AnalysisStage::Normalizing, None);
        let corrected = normalize_stimulation(&reference, &stimulated, self.bleach_index());
        self.reporter.finish_stage();
        let corrected = corrected?;

        info!(
            frames = corrected.len(),
            bleach_index = self.bleach_index(),
            "Stimulation signal normalized"
        );
        Ok(corrected)
    }

    /// Fit `A * (1 - exp(ln(0.5) / tau * t))` to the post-bleach corrected
    /// signal.
    pub fn fit_exponential_recovery(&self) -> Result<RecoveryFit> {
        let corrected = self.normalized_stimulation()?;
        self.fit_curve(&corrected)
    }

    /// Fit the recovery model to an already normalized curve of this
    /// recording.
    pub fn fit_curve(&self, corrected: &[f64]) -> Result<RecoveryFit> {
        self.reporter.begin_stage(AnalysisStage::Fitting, None);
        let fit = fit_recovery(
            corrected,
            self.timestamps(),
            self.bleach_index(),
            &self.config.fit,
        );
        self.reporter.finish_stage();
        let fit = fit?;

        info!(
            mobile_fraction = fit.mobile_fraction,
            half_time = fit.half_time,
            "Recovery fit complete"
        );
        Ok(fit)
    }

    /// Release the underlying recording.
    pub fn close(self) {
        drop(self);
    }

    /// Release the analyzer and hand back the source.
    pub fn into_source(self) -> S {
        self.source
    }
}

fn required_roi(roi: Option<&Roi>, kind: RoiKind) -> Result<&Roi> {
    roi.ok_or_else(|| FrapError::InvalidRoi(format!("{kind} ROI is not set")))
}
