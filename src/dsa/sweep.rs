//! Timescale sweep over DSA scenarios.
//!
//! For each scenario `(ρ_m, L_c, L_t)` and each grid temperature:
//!
//! ```text
//! D_eff    = D_bulk(T) · (1 + pipe_factor)
//! tau_diff = L_c² / D_eff               (capture radius)
//! tau_wait = L_t / (ρ_m · b · ε̇)        (travel distance)
//! ratio    = tau_diff / tau_wait
//! ```
//!
//! `D_bulk(T)` comes from a piecewise-linear interpolant over the input curve.
//! Scenarios are independent and evaluated in parallel; the interpolant is the
//! only shared state and is read-only.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::domain::{CurvePoint, DsaScenario, Regime, ScenarioResult, TimescalePoint};
use crate::dsa::{generate_scenarios, validate_length_scales};
use crate::error::EngineError;
use crate::math::LinearInterpolant;

/// Classify a timescale ratio against the open window `(lower, upper)`.
pub fn classify(ratio: f64, window: (f64, f64)) -> Regime {
    let (lower, upper) = window;
    if ratio <= lower {
        Regime::DiffusionFast
    } else if ratio < upper {
        Regime::DsaPossible
    } else {
        // Includes NaN and +inf: no usable diffusion at this temperature.
        Regime::DiffusionSlow
    }
}

/// Dislocation waiting time `L_t / (ρ_m · b · ε̇)`.
pub fn waiting_time(scenario: &DsaScenario, config: &AnalysisConfig) -> f64 {
    let c = &config.constants;
    scenario.travel_distance / (scenario.mobile_density * c.burgers_vector * c.strain_rate)
}

/// Solute diffusion time `L_c² / D_eff`; infinite when `D_eff` is not positive.
pub fn diffusion_time(scenario: &DsaScenario, d_eff: f64) -> f64 {
    if d_eff > 0.0 {
        scenario.capture_radius.powi(2) / d_eff
    } else {
        f64::INFINITY
    }
}

/// Timescales for one scenario at one temperature.
pub fn timescale_point(
    scenario: &DsaScenario,
    temperature: f64,
    d_bulk: f64,
    config: &AnalysisConfig,
) -> TimescalePoint {
    let d_eff = d_bulk * (1.0 + config.dsa.pipe_factor);
    let tau_diff = diffusion_time(scenario, d_eff);
    let tau_wait = waiting_time(scenario, config);
    let ratio = tau_diff / tau_wait;
    TimescalePoint {
        temperature,
        d_bulk,
        d_eff,
        tau_diff,
        tau_wait,
        ratio,
        regime: classify(ratio, config.dsa.ratio_window),
    }
}

/// Evaluate one scenario over the grid.
pub fn sweep_scenario(
    scenario: DsaScenario,
    interpolant: &LinearInterpolant,
    temperatures: &[f64],
    config: &AnalysisConfig,
) -> ScenarioResult {
    let points = temperatures
        .iter()
        .map(|&t| timescale_point(&scenario, t, interpolant.eval(t), config))
        .collect();
    ScenarioResult { scenario, points }
}

/// Build the bulk-diffusivity interpolant; rows with non-finite values are
/// dropped, and fewer than two remaining temperatures is an error.
pub fn bulk_interpolant(curve: &[CurvePoint]) -> Result<LinearInterpolant, EngineError> {
    let table: Vec<(f64, f64)> = curve
        .iter()
        .filter(|p| p.temperature.is_finite() && p.d.is_finite())
        .map(|p| (p.temperature, p.d))
        .collect();
    if table.len() < curve.len() {
        warn!(
            dropped = curve.len() - table.len(),
            "dropping non-finite rows from diffusivity curve"
        );
    }
    if table.len() < 2 {
        return Err(EngineError::insufficient("DSA diffusivity curve", table.len(), 2));
    }
    LinearInterpolant::new(&table)
}

/// Sweep every configured scenario over `temperatures`.
///
/// Output order matches [`generate_scenarios`].
pub fn sweep(
    curve: &[CurvePoint],
    temperatures: &[f64],
    config: &AnalysisConfig,
) -> Result<Vec<ScenarioResult>, EngineError> {
    let interpolant = bulk_interpolant(curve)?;

    let scales = validate_length_scales(&config.dsa);
    for w in &scales.warnings {
        warn!("{w}");
    }

    if let Some(p) = curve.iter().find(|p| p.d.is_finite() && p.d <= 0.0) {
        warn!(temperature = p.temperature, d = p.d, "non-positive bulk diffusivity in curve");
    }

    let scenarios = generate_scenarios(&config.dsa);
    debug!(
        scenarios = scenarios.len(),
        temperatures = temperatures.len(),
        "running DSA sweep"
    );

    let results: Vec<ScenarioResult> = scenarios
        .into_par_iter()
        .map(|s| sweep_scenario(s, &interpolant, temperatures, config))
        .collect();

    for r in &results {
        match r.dsa_window() {
            Some((lo, hi)) => info!(scenario = %r.scenario, t_min = lo, t_max = hi, "DSA possible"),
            None => debug!(scenario = %r.scenario, "no DSA window"),
        }
    }
    Ok(results)
}
