use crate::roi::RoiKind;

/// Analysis stage, used for progress reporting.
#[derive(Clone, Debug, PartialEq)]
pub enum AnalysisStage {
    /// Reading frames under an ROI footprint.
    Sampling(RoiKind),
    Normalizing,
    Fitting,
}

impl std::fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sampling(kind) => write!(f, "Sampling {kind} ROI"),
            Self::Normalizing => write!(f, "Normalizing"),
            Self::Fitting => write!(f, "Fitting recovery"),
        }
    }
}

/// Progress reporting for long-running analysis steps.
///
/// Implementors can use this to drive progress bars or logging. All methods
/// have default no-op implementations.
pub trait ProgressReporter {
    /// A new stage has started. `total_items` is the number of work items in
    /// this stage (e.g., frame count), if known.
    fn begin_stage(&self, _stage: AnalysisStage, _total_items: Option<usize>) {}

    /// Work items completed so far within the current stage.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// Reporter that ignores every event.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
