use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{FrapError, Result};

use super::solver::{levenberg_marquardt, CurveModel, LmOptions};

/// Fitted single-exponential recovery.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecoveryFit {
    /// Plateau of the corrected signal, `A`.
    pub mobile_fraction: f64,
    /// Time to reach half the plateau after the bleach, `tau`, in seconds.
    pub half_time: f64,
}

/// `y(t) = A * (1 - exp(ln(0.5) / tau * t))`, parameters `(A, tau)`.
pub struct ExponentialRecovery;

impl ExponentialRecovery {
    pub fn evaluate(mobile_fraction: f64, half_time: f64, t: f64) -> f64 {
        mobile_fraction * (1.0 - (0.5f64.ln() / half_time * t).exp())
    }
}

impl CurveModel for ExponentialRecovery {
    fn value_and_gradient(&self, params: &Vector2<f64>, t: f64) -> (f64, Vector2<f64>) {
        let (a, tau) = (params[0], params[1]);
        let ln_half = 0.5f64.ln();
        let e = (ln_half / tau * t).exp();
        let value = a * (1.0 - e);
        let d_a = 1.0 - e;
        let d_tau = a * e * t * ln_half / (tau * tau);
        (value, Vector2::new(d_a, d_tau))
    }
}

/// Post-bleach samples as `(t - t_bleach, y)`, skipping non-finite values.
pub fn post_bleach_samples(
    curve: &[f64],
    timestamps: &[f64],
    bleach_index: usize,
) -> Vec<(f64, f64)> {
    let Some(&t_bleach) = timestamps.get(bleach_index) else {
        return Vec::new();
    };
    curve
        .iter()
        .zip(timestamps)
        .skip(bleach_index)
        .map(|(&y, &t)| (t - t_bleach, y))
        .filter(|(t, y)| t.is_finite() && y.is_finite())
        .collect()
}

/// Closed-form starting point for the fit.
///
/// `A0` is the largest post-bleach value and `tau0` the relative time of the
/// sample closest to `A0 / 2`. When that sample is the bleach frame itself
/// (relative time 0) the absolute bleach timestamp is used instead.
pub fn initial_guess(
    samples: &[(f64, f64)],
    timestamps: &[f64],
    bleach_index: usize,
) -> Option<RecoveryFit> {
    let a0 = samples.iter().map(|&(_, y)| y).fold(f64::NEG_INFINITY, f64::max);
    if !a0.is_finite() {
        return None;
    }

    let half = a0 / 2.0;
    let nearest = samples
        .iter()
        .min_by(|a, b| (a.1 - half).abs().total_cmp(&(b.1 - half).abs()))
        .map(|&(t, _)| t)
        .filter(|&t| t > 0.0);

    let tau0 = match nearest {
        Some(t) => t,
        None => timestamps.get(bleach_index).copied().unwrap_or(f64::NAN),
    };

    Some(RecoveryFit {
        mobile_fraction: a0,
        half_time: tau0,
    })
}

/// Fit the single-exponential recovery to the post-bleach part of `curve`.
///
/// A solver failure is not an error: the initial guess is returned as is.
pub fn fit_recovery(
    curve: &[f64],
    timestamps: &[f64],
    bleach_index: usize,
    options: &LmOptions,
) -> Result<RecoveryFit> {
    let samples = post_bleach_samples(curve, timestamps, bleach_index);
    let guess =
        initial_guess(&samples, timestamps, bleach_index).ok_or(FrapError::EmptyPostBleach)?;
    debug!(
        a0 = guess.mobile_fraction,
        tau0 = guess.half_time,
        samples = samples.len(),
        "Initial recovery guess"
    );

    let init = Vector2::new(guess.mobile_fraction, guess.half_time);
    match levenberg_marquardt(&ExponentialRecovery, &samples, init, options) {
        Some(p) => Ok(RecoveryFit {
            mobile_fraction: p[0],
            half_time: p[1],
        }),
        None => {
            warn!("Recovery fit did not converge; returning the initial guess");
            Ok(guess)
        }
    }
}
