//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory while estimating and fitting
//! - exported to CSV/JSON
//! - reloaded by downstream plotting/reporting tools

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Atomic species tracked in the MSD output.
///
/// The single-species MSD schema only carries the solute (`Mg`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Species {
    Mg,
    Al,
}

impl Species {
    pub const ALL: [Species; 2] = [Species::Mg, Species::Al];

    /// Column label used in tables (`D_Mg`, `R2_Al`, ...).
    pub fn label(self) -> &'static str {
        match self {
            Species::Mg => "Mg",
            Species::Al => "Al",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Species::Mg => 0,
            Species::Al => 1,
        }
    }
}

/// MSD component written by the simulator for each species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
    Total,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::X, Axis::Y, Axis::Z, Axis::Total];

    /// Spatial dimensionality spanned by this component.
    pub fn dimensionality(self) -> Dimensionality {
        match self {
            Axis::X | Axis::Y | Axis::Z => Dimensionality::One,
            Axis::Total => Dimensionality::Three,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
            Axis::Total => "total",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
            Axis::Total => 3,
        }
    }
}

/// Number of spatial dimensions `d` in the Einstein relation `D = slope / (2d)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimensionality {
    One,
    Three,
}

impl Dimensionality {
    pub fn d(self) -> f64 {
        match self {
            Dimensionality::One => 1.0,
            Dimensionality::Three => 3.0,
        }
    }

    /// Divisor `2d` converting an MSD slope into a diffusivity.
    pub fn einstein_divisor(self) -> f64 {
        2.0 * self.d()
    }
}

/// Linear MSD-vs-time regression converted to a diffusivity.
///
/// Invariant: `diffusivity = slope / (2d)` and
/// `diffusivity_err = std_err / (2d)`, in SI units (m², s).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Standard error of the slope.
    pub std_err: f64,
    pub intercept_std_err: f64,
    pub diffusivity: f64,
    pub diffusivity_err: f64,
    pub n_points_used: usize,
    pub dimensionality: Dimensionality,
}

/// Coarse fit-quality grade used by the MSD quality check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QualityGrade {
    Ok,
    Warn,
    Poor,
}

impl QualityGrade {
    pub fn from_r_squared(r_squared: f64, ok_threshold: f64, warn_threshold: f64) -> Self {
        if r_squared >= ok_threshold {
            QualityGrade::Ok
        } else if r_squared >= warn_threshold {
            QualityGrade::Warn
        } else {
            QualityGrade::Poor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QualityGrade::Ok => "OK",
            QualityGrade::Warn => "WARN",
            QualityGrade::Poor => "POOR",
        }
    }
}

/// Outcome of the validity gate for one (temperature, species) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Valid,
    /// Too few samples after the transient cut, or the species is absent.
    InsufficientData,
    /// The fitted slope gave `D <= 0`.
    NonPositive,
    /// `r² < threshold`.
    PoorFit,
}

/// Diffusivity of one species at one temperature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffusivityRecord {
    pub temperature: f64,
    pub species: Species,
    pub fit: Option<FitResult>,
    pub status: RecordStatus,
}

impl DiffusivityRecord {
    pub fn is_valid(&self) -> bool {
        self.status == RecordStatus::Valid
    }

    pub fn d(&self) -> Option<f64> {
        self.fit.map(|f| f.diffusivity)
    }

    pub fn d_err(&self) -> Option<f64> {
        self.fit.map(|f| f.diffusivity_err)
    }

    pub fn r_squared(&self) -> Option<f64> {
        self.fit.map(|f| f.r_squared)
    }
}

/// Darken-type interdiffusion coefficient for one temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterdiffRecord {
    pub d: f64,
    pub d_err: f64,
}

/// All diffusivities extracted at one temperature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRow {
    pub temperature: f64,
    pub mg: DiffusivityRecord,
    pub al: DiffusivityRecord,
    /// Present only when both species passed the validity gate.
    pub interdiff: Option<InterdiffRecord>,
}

impl TemperatureRow {
    pub fn record(&self, species: Species) -> &DiffusivityRecord {
        match species {
            Species::Mg => &self.mg,
            Species::Al => &self.al,
        }
    }
}

/// Which diffusivity series feeds the Arrhenius fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffusivitySource {
    Species(Species),
    Interdiff,
}

impl DiffusivitySource {
    pub fn label(self) -> &'static str {
        match self {
            DiffusivitySource::Species(s) => s.label(),
            DiffusivitySource::Interdiff => "interdiff",
        }
    }
}

/// Per-temperature diffusivity table (the unit of exchange with the fitter).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffusivityTable {
    pub rows: Vec<TemperatureRow>,
}

impl DiffusivityTable {
    /// Valid `(T, D)` points for the requested series.
    ///
    /// Invalid records never leave this table.
    pub fn arrhenius_points(&self, source: DiffusivitySource) -> Vec<ArrheniusPoint> {
        self.rows
            .iter()
            .filter_map(|row| match source {
                DiffusivitySource::Species(species) => {
                    let rec = row.record(species);
                    let fit = rec.fit.filter(|_| rec.is_valid())?;
                    Some(ArrheniusPoint {
                        temperature: row.temperature,
                        d: fit.diffusivity,
                        d_err: Some(fit.diffusivity_err),
                        quality: Some(fit.r_squared),
                    })
                }
                DiffusivitySource::Interdiff => row.interdiff.map(|inter| ArrheniusPoint {
                    temperature: row.temperature,
                    d: inter.d,
                    d_err: Some(inter.d_err),
                    quality: None,
                }),
            })
            .collect()
    }
}

/// One `(T, D)` observation for Arrhenius fitting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrheniusPoint {
    pub temperature: f64,
    pub d: f64,
    /// Reported uncertainty of `d`, used as a nonlinear-fit weight.
    pub d_err: Option<f64>,
    /// Optional quality metric (r² of the MSD fit) for threshold filtering.
    pub quality: Option<f64>,
}

/// Parameters of `D(T) = D0 * exp(-Q / (R*T))`.
///
/// `q` and `q_err` are in J/mol; `d0` and `d0_err` in m²/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrheniusParameters {
    pub d0: f64,
    pub d0_err: f64,
    pub q: f64,
    pub q_err: f64,
}

impl ArrheniusParameters {
    pub fn evaluate(&self, temperature: f64, gas_constant: f64) -> f64 {
        self.d0 * (-self.q / (gas_constant * temperature)).exp()
    }

    pub fn q_kj_per_mol(&self) -> f64 {
        self.q / 1e3
    }

    pub fn q_err_kj_per_mol(&self) -> f64 {
        self.q_err / 1e3
    }

    /// Activation energy in eV/atom (`Q / F`).
    pub fn q_ev(&self, faraday: f64) -> f64 {
        self.q / faraday
    }

    pub fn q_err_ev(&self, faraday: f64) -> f64 {
        self.q_err / faraday
    }
}

/// Which strategy produced the final Arrhenius parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FitStrategy {
    /// Log-space linear fit only (refinement disabled).
    Linear,
    /// Weighted nonlinear refinement converged.
    Nonlinear { iterations: usize },
    /// Refinement failed; the linear fit was kept.
    LinearFallback { reason: String },
}

impl FitStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            FitStrategy::Linear => "linear",
            FitStrategy::Nonlinear { .. } => "nonlinear",
            FitStrategy::LinearFallback { .. } => "linear-fallback",
        }
    }
}

/// Final Arrhenius fit with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrheniusFit {
    pub params: ArrheniusParameters,
    /// The log-space linear estimate (always computed; seeds the refinement).
    pub linear: ArrheniusParameters,
    pub strategy: FitStrategy,
    pub n_points: usize,
    /// r² of the `ln D` vs `1/T` line.
    pub log_r_squared: f64,
    /// Temperature span of the points actually fitted.
    pub t_min: f64,
    pub t_max: f64,
}

/// A diffusivity evaluated at one temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub temperature: f64,
    pub d: f64,
}

/// One combination of DSA sweep parameters.
///
/// `capture_radius` (nm scale) sets the diffusion time; `travel_distance`
/// (µm scale) sets the waiting time. They are never interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DsaScenario {
    /// Mobile dislocation density ρ_m (m⁻²).
    pub mobile_density: f64,
    /// Capture radius L_c (m).
    pub capture_radius: f64,
    /// Travel distance L_t (m).
    pub travel_distance: f64,
}

/// Classification of `tau_diff / tau_wait` against the DSA window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    /// Solutes arrive much faster than dislocations wait (`ratio <= lower`).
    DiffusionFast,
    DsaPossible,
    /// Solutes cannot reach the arrested dislocation in time (`ratio >= upper`).
    DiffusionSlow,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimescalePoint {
    pub temperature: f64,
    pub d_bulk: f64,
    pub d_eff: f64,
    pub tau_diff: f64,
    pub tau_wait: f64,
    pub ratio: f64,
    pub regime: Regime,
}

/// Timescale table for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: DsaScenario,
    pub points: Vec<TimescalePoint>,
}

impl ScenarioResult {
    pub fn dsa_temperatures(&self) -> Vec<f64> {
        self.points
            .iter()
            .filter(|p| p.regime == Regime::DsaPossible)
            .map(|p| p.temperature)
            .collect()
    }

    /// `(min, max)` temperature classified as DSA-possible, if any.
    pub fn dsa_window(&self) -> Option<(f64, f64)> {
        let temps = self.dsa_temperatures();
        let min = temps.iter().copied().reduce(f64::min)?;
        let max = temps.iter().copied().reduce(f64::max)?;
        Some((min, max))
    }
}
