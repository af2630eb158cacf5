//! Arrhenius fitting: `D(T) = D0 · exp(-Q / (R·T))`.
//!
//! Two stages:
//!
//! 1. **Linear (always)**: ordinary least squares on `(1/T, ln D)`.
//!    `Q = -slope·R`, `D0 = exp(intercept)`,
//!    `σ(D0) = D0·σ(intercept)`, `σ(Q) = σ(slope)·R`.
//! 2. **Nonlinear refinement (optional)**: weighted least squares on the
//!    untransformed form, seeded with stage 1 and solved by Levenberg–Marquardt.
//!    Weights are `1/σ_i²` from the reported diffusivity uncertainties when every
//!    point carries one.
//!
//! If the refinement fails for any reason the stage-1 parameters are returned
//! and the result is tagged [`FitStrategy::LinearFallback`].

use nalgebra::{Matrix2, Vector2};
use tracing::{debug, info, warn};

use crate::config::{AnalysisConfig, ArrheniusConfig};
use crate::domain::{ArrheniusFit, ArrheniusParameters, ArrheniusPoint, FitStrategy};
use crate::error::EngineError;
use crate::math::fit_line;

/// Relative floor on σ_i; keeps noise-free inputs from producing infinite weights.
const SIGMA_REL_FLOOR: f64 = 1e-6;
const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MAX: f64 = 1e12;

/// Fit an Arrhenius law to `points`.
///
/// Points with missing/non-finite values are dropped. If `min_quality` is set,
/// points whose quality metric is below it (or missing-but-NaN) are dropped too.
/// Fewer than `arrhenius.min_points` survivors is an
/// [`EngineError::InsufficientData`].
pub fn fit_arrhenius(
    points: &[ArrheniusPoint],
    min_quality: Option<f64>,
    config: &AnalysisConfig,
) -> Result<ArrheniusFit, EngineError> {
    let gas_constant = config.constants.gas_constant;
    let opts = &config.arrhenius;

    let usable = usable_points(points, min_quality);
    if usable.len() < opts.min_points {
        return Err(EngineError::insufficient(
            "Arrhenius fit",
            usable.len(),
            opts.min_points,
        ));
    }

    let (linear, log_r_squared) = fit_linearized(&usable, gas_constant)?;
    debug!(
        d0 = linear.d0,
        q = linear.q,
        r2 = log_r_squared,
        "linearized Arrhenius fit"
    );

    let (params, strategy) = if opts.refine {
        match refine_nonlinear(&usable, &linear, gas_constant, opts) {
            Ok((params, iterations)) => (params, FitStrategy::Nonlinear { iterations }),
            Err(err) => {
                warn!(error = %err, "nonlinear Arrhenius refinement failed; using linear fit");
                (
                    linear,
                    FitStrategy::LinearFallback {
                        reason: err.to_string(),
                    },
                )
            }
        }
    } else {
        (linear, FitStrategy::Linear)
    };

    let t_min = usable.iter().map(|p| p.temperature).fold(f64::INFINITY, f64::min);
    let t_max = usable.iter().map(|p| p.temperature).fold(f64::NEG_INFINITY, f64::max);

    info!(
        d0 = params.d0,
        q_kj_mol = params.q_kj_per_mol(),
        q_ev = params.q_ev(config.constants.faraday),
        strategy = strategy.label(),
        n = usable.len(),
        "Arrhenius fit"
    );

    Ok(ArrheniusFit {
        params,
        linear,
        strategy,
        n_points: usable.len(),
        log_r_squared,
        t_min,
        t_max,
    })
}

fn usable_points(points: &[ArrheniusPoint], min_quality: Option<f64>) -> Vec<ArrheniusPoint> {
    points
        .iter()
        .filter(|p| p.temperature.is_finite() && p.temperature > 0.0 && p.d.is_finite())
        .filter(|p| match (min_quality, p.quality) {
            (Some(min), Some(q)) => q >= min,
            _ => true,
        })
        .filter(|p| {
            if p.d > 0.0 {
                true
            } else {
                warn!(
                    temperature = p.temperature,
                    d = p.d,
                    "dropping non-positive diffusivity from Arrhenius input"
                );
                false
            }
        })
        .copied()
        .collect()
}

/// Stage 1: OLS on `(1/T, ln D)`. Returns the parameters and the line's r².
pub fn fit_linearized(
    points: &[ArrheniusPoint],
    gas_constant: f64,
) -> Result<(ArrheniusParameters, f64), EngineError> {
    let inv_t: Vec<f64> = points.iter().map(|p| 1.0 / p.temperature).collect();
    let ln_d: Vec<f64> = points.iter().map(|p| p.d.ln()).collect();

    let line = fit_line(&inv_t, &ln_d).ok_or_else(|| {
        EngineError::InvalidInput(
            "Arrhenius fit needs at least two distinct temperatures".to_string(),
        )
    })?;

    let d0 = line.intercept.exp();
    let params = ArrheniusParameters {
        d0,
        d0_err: d0 * line.intercept_std_err,
        q: -line.slope * gas_constant,
        q_err: line.slope_std_err * gas_constant,
    };
    Ok((params, line.r_squared))
}

/// Stage 2: weighted Levenberg–Marquardt on `D = D0·exp(-Q/(R·T))`.
///
/// Parameters are scaled by the seed (`θ = (D0/D0_seed, Q/Q_scale)`) so both are
/// O(1). Returns the refined parameters and the iteration count, or
/// [`EngineError::Convergence`].
pub fn refine_nonlinear(
    points: &[ArrheniusPoint],
    seed: &ArrheniusParameters,
    gas_constant: f64,
    opts: &ArrheniusConfig,
) -> Result<(ArrheniusParameters, usize), EngineError> {
    let fail = |iterations: usize, reason: &str| EngineError::Convergence {
        iterations,
        reason: reason.to_string(),
    };

    if !(seed.d0.is_finite() && seed.d0 > 0.0 && seed.q.is_finite()) {
        return Err(fail(0, "invalid seed parameters"));
    }
    let n = points.len();
    if n < 3 {
        return Err(fail(0, "need more points than parameters"));
    }

    let s0 = seed.d0;
    let sq = if seed.q.abs() > 1.0 { seed.q.abs() } else { 1.0 };
    let sigma = weights(points);
    let rt: Vec<f64> = points.iter().map(|p| gas_constant * p.temperature).collect();

    let model = |theta: &Vector2<f64>, i: usize| -> f64 { s0 * theta[0] * (-(sq * theta[1]) / rt[i]).exp() };

    // Residuals r_i = (y_i - m_i)/σ_i and Jacobian J_i = ∂m_i/∂θ / σ_i.
    let evaluate = |theta: &Vector2<f64>| -> Option<(f64, Matrix2<f64>, Vector2<f64>)> {
        let mut cost = 0.0;
        let mut jtj = Matrix2::zeros();
        let mut jtr = Vector2::zeros();
        for (i, p) in points.iter().enumerate() {
            let m = model(theta, i);
            let e = (-(sq * theta[1]) / rt[i]).exp();
            let j = Vector2::new(s0 * e, -m * sq / rt[i]) / sigma[i];
            let r = (p.d - m) / sigma[i];
            if !(r.is_finite() && j.iter().all(|v| v.is_finite())) {
                return None;
            }
            cost += r * r;
            jtj += j * j.transpose();
            jtr += j * r;
        }
        Some((cost, jtj, jtr))
    };

    let mut theta = Vector2::new(1.0, seed.q / sq);
    let Some((mut cost, mut jtj, mut jtr)) = evaluate(&theta) else {
        return Err(fail(0, "non-finite residuals at seed"));
    };
    let mut lambda = LAMBDA_INIT;

    for iteration in 1..=opts.max_iterations {
        let mut damped = jtj;
        for k in 0..2 {
            damped[(k, k)] += lambda * jtj[(k, k)].max(f64::MIN_POSITIVE);
        }
        let Some(delta) = damped.try_inverse().map(|inv| inv * jtr) else {
            return Err(fail(iteration, "singular normal equations"));
        };

        let candidate = theta + delta;
        if delta.amax() <= opts.tolerance * (theta.amax() + opts.tolerance) {
            // Step below tolerance: keep whichever of the two is no worse.
            if let Some((new_cost, new_jtj, _)) = evaluate(&candidate)
                && new_cost <= cost
            {
                return finish(candidate, new_cost, &new_jtj, n, s0, sq, iteration);
            }
            return finish(theta, cost, &jtj, n, s0, sq, iteration);
        }
        match evaluate(&candidate) {
            Some((new_cost, new_jtj, new_jtr)) if new_cost <= cost => {
                let cost_flat = cost - new_cost <= opts.tolerance * cost;
                theta = candidate;
                cost = new_cost;
                jtj = new_jtj;
                jtr = new_jtr;
                lambda = (lambda / 10.0).max(1e-12);
                if cost_flat {
                    return finish(theta, cost, &jtj, n, s0, sq, iteration);
                }
            }
            _ => {
                lambda *= 10.0;
                if lambda > LAMBDA_MAX {
                    return Err(fail(iteration, "damping exceeded limit without improvement"));
                }
            }
        }
    }

    Err(fail(opts.max_iterations, "iteration limit reached"))
}

fn finish(
    theta: Vector2<f64>,
    cost: f64,
    jtj: &Matrix2<f64>,
    n: usize,
    s0: f64,
    sq: f64,
    iterations: usize,
) -> Result<(ArrheniusParameters, usize), EngineError> {
    let d0 = s0 * theta[0];
    if !(d0.is_finite() && d0 > 0.0) {
        return Err(EngineError::Convergence {
            iterations,
            reason: format!("non-physical D0 = {d0:e}"),
        });
    }
    let Some(cov) = jtj.try_inverse() else {
        return Err(EngineError::Convergence {
            iterations,
            reason: "singular covariance at solution".to_string(),
        });
    };
    // Residual variance scaling (σ_i treated as relative weights).
    let s2 = cost / (n as f64 - 2.0);
    let params = ArrheniusParameters {
        d0,
        d0_err: s0 * (cov[(0, 0)] * s2).max(0.0).sqrt(),
        q: sq * theta[1],
        q_err: sq * (cov[(1, 1)] * s2).max(0.0).sqrt(),
    };
    debug!(iterations, d0 = params.d0, q = params.q, "nonlinear refinement converged");
    Ok((params, iterations))
}

/// Per-point σ_i: reported uncertainties when every point has one, else uniform.
fn weights(points: &[ArrheniusPoint]) -> Vec<f64> {
    let all_reported = points
        .iter()
        .all(|p| p.d_err.is_some_and(|e| e.is_finite() && e > 0.0));
    if all_reported {
        points
            .iter()
            .map(|p| p.d_err.unwrap_or(0.0).max(SIGMA_REL_FLOOR * p.d.abs()))
            .collect()
    } else {
        // Uniform weights; the scale only keeps residuals O(1).
        let scale = points.iter().map(|p| p.d.abs()).sum::<f64>() / points.len() as f64;
        vec![scale; points.len()]
    }
}
