pub mod fit;
pub mod normalize;
pub mod solver;

pub use fit::{fit_recovery, initial_guess, post_bleach_samples, ExponentialRecovery, RecoveryFit};
pub use normalize::normalize_stimulation;
pub use solver::{levenberg_marquardt, CurveModel, LmOptions};
