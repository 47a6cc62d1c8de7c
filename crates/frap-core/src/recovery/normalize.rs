use crate::error::{FrapError, Result};

/// Bleach- and acquisition-corrected recovery curve.
///
/// Each trace is divided by the mean of its pre-bleach frames
/// (`[..bleach_index]`), then the stimulated trace is divided by the
/// reference trace to cancel photobleaching common to both regions.
/// Non-finite pre-bleach frames are left out of the pre-bleach means but
/// still propagate to their own output slots. A pre-bleach segment that is
/// empty, or has no finite frame, is an error.
pub fn normalize_stimulation(
    reference: &[f64],
    stimulated: &[f64],
    bleach_index: usize,
) -> Result<Vec<f64>> {
    if bleach_index == 0 || reference.is_empty() || stimulated.is_empty() {
        return Err(FrapError::EmptyPreBleach);
    }

    let ref_pre = finite_mean(&reference[..bleach_index.min(reference.len())])?;
    let stim_pre = finite_mean(&stimulated[..bleach_index.min(stimulated.len())])?;

    Ok(reference
        .iter()
        .zip(stimulated)
        .map(|(&r, &s)| (s / stim_pre) / (r / ref_pre))
        .collect())
}

fn finite_mean(values: &[f64]) -> Result<f64> {
    let (sum, n) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, n), &v| (sum + v, n + 1));
    if n == 0 {
        return Err(FrapError::EmptyPreBleach);
    }
    Ok(sum / n as f64)
}
