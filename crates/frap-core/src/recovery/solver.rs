use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

/// A two-parameter model `y = f(t; p)` with its gradient in `p`.
pub trait CurveModel {
    fn value_and_gradient(&self, params: &Vector2<f64>, t: f64) -> (f64, Vector2<f64>);
}

/// Levenberg–Marquardt settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmOptions {
    /// Maximum number of accepted or rejected outer iterations.
    pub max_iterations: usize,
    /// Relative step / cost-decrease threshold for convergence.
    pub tolerance: f64,
    /// Starting damping factor, scaled against the normal-matrix diagonal.
    pub initial_damping: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-12,
            initial_damping: 1e-3,
        }
    }
}

const MAX_DAMPING: f64 = 1e12;

/// Minimize `sum (f(t_i; p) - y_i)^2` starting from `init`.
///
/// Returns `None` when the problem is degenerate: fewer samples than
/// parameters, a non-finite start, or a numerically broken state. Running
/// out of iterations returns the best parameters found.
pub fn levenberg_marquardt<M: CurveModel>(
    model: &M,
    samples: &[(f64, f64)],
    init: Vector2<f64>,
    options: &LmOptions,
) -> Option<Vector2<f64>> {
    if samples.len() < 2 || !init.iter().all(|v| v.is_finite()) {
        return None;
    }

    let mut params = init;
    let mut cost = sum_of_squares(model, samples, &params)?;
    let mut damping = options.initial_damping.max(f64::EPSILON);

    for _ in 0..options.max_iterations {
        if cost == 0.0 {
            break;
        }

        // Normal equations J^T J and J^T r at the current parameters.
        let mut h = Matrix2::<f64>::zeros();
        let mut g = Vector2::<f64>::zeros();
        for &(t, y) in samples {
            let (value, grad) = model.value_and_gradient(&params, t);
            let r = value - y;
            h += grad * grad.transpose();
            g += grad * r;
        }
        if !h.iter().chain(g.iter()).all(|v| v.is_finite()) {
            return None;
        }

        let mut accepted = None;
        while damping < MAX_DAMPING {
            let mut a = h;
            for i in 0..2 {
                a[(i, i)] += damping * h[(i, i)].max(1e-12);
            }
            let Some(step) = a.lu().solve(&(-g)) else {
                damping *= 10.0;
                continue;
            };
            let trial = params + step;
            match sum_of_squares(model, samples, &trial) {
                Some(trial_cost) if trial_cost < cost => {
                    accepted = Some((step, trial, trial_cost));
                    damping = (damping / 10.0).max(f64::EPSILON);
                    break;
                }
                _ => damping *= 10.0,
            }
        }

        // No downhill step at any damping: already at a minimum.
        let Some((step, trial, trial_cost)) = accepted else {
            break;
        };

        let small_step = step.norm() <= options.tolerance * (params.norm() + options.tolerance);
        let small_gain = cost - trial_cost <= options.tolerance * cost;
        params = trial;
        cost = trial_cost;
        if small_step || small_gain {
            break;
        }
    }

    params.iter().all(|v| v.is_finite()).then_some(params)
}

fn sum_of_squares<M: CurveModel>(
    model: &M,
    samples: &[(f64, f64)],
    params: &Vector2<f64>,
) -> Option<f64> {
    let cost: f64 = samples
        .iter()
        .map(|&(t, y)| {
            let r = model.value_and_gradient(params, t).0 - y;
            r * r
        })
        .sum();
    cost.is_finite().then_some(cost)
}
