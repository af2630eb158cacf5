//! Analysis configuration.
//!
//! Every physical constant, temperature grid and threshold the engine uses lives in
//! one immutable [`AnalysisConfig`] that is passed explicitly to each component.
//! Defaults reproduce the Al-5wt%Mg study; a TOML file may override any subset:
//!
//! ```toml
//! [dsa]
//! pipe_factor = 2.0
//! capture_radii = [1e-9, 3e-9]
//!
//! [msd]
//! discard_fraction = 0.2
//! axis = "z"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Axis;
use crate::error::EngineError;

mod defaults;

pub use defaults::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicalConstants {
    /// Gas constant R (J/(mol·K)).
    pub gas_constant: f64,
    /// Boltzmann constant k_B (eV/K).
    pub boltzmann_ev: f64,
    /// Faraday constant (C/mol); converts J/mol to eV/atom.
    pub faraday: f64,
    /// Burgers vector magnitude b (m).
    pub burgers_vector: f64,
    /// Applied strain rate ε̇ (s⁻¹).
    pub strain_rate: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            gas_constant: GAS_CONSTANT,
            boltzmann_ev: BOLTZMANN_EV,
            faraday: FARADAY,
            burgers_vector: BURGERS_VECTOR,
            strain_rate: STRAIN_RATE,
        }
    }
}

/// How MSD files are located, parsed and regressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MsdConfig {
    /// Duration of one simulation step (ps).
    pub timestep_ps: f64,
    /// Leading lines skipped before parsing.
    pub header_lines: usize,
    /// Lines starting with this marker are ignored.
    pub comment_marker: char,
    /// File name per temperature; `{T}` is replaced by the integer temperature.
    pub file_pattern: String,
    /// MSD component regressed for each species.
    pub axis: Axis,
    /// Fraction of the sample count discarded as transient.
    pub discard_fraction: f64,
    /// Minimum samples remaining after the cut.
    pub min_points: usize,
}

impl Default for MsdConfig {
    fn default() -> Self {
        Self {
            timestep_ps: TIMESTEP_PS,
            header_lines: MSD_HEADER_LINES,
            comment_marker: '#',
            file_pattern: "msd_T{T}.dat".to_string(),
            axis: Axis::Total,
            discard_fraction: DISCARD_FRACTION,
            min_points: MIN_MSD_POINTS,
        }
    }
}

impl MsdConfig {
    pub fn file_name(&self, temperature: f64) -> String {
        self.file_pattern
            .replace("{T}", &format!("{}", temperature.round() as i64))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualityConfig {
    /// Minimum r² for a diffusivity to be valid.
    pub r2_threshold: f64,
    /// Below `r2_threshold` but above this, the quality check reports WARN.
    pub r2_warn: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            r2_threshold: R2_THRESHOLD,
            r2_warn: R2_WARN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompositionConfig {
    /// Mole fraction of the solute (Mg); the solvent is `1 - solute_fraction`.
    pub solute_fraction: f64,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            solute_fraction: SOLUTE_FRACTION,
        }
    }
}

/// Evenly spaced temperature grid (inclusive endpoints).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemperatureGrid {
    pub start: f64,
    pub stop: f64,
    pub points: usize,
}

impl TemperatureGrid {
    pub fn values(&self) -> Vec<f64> {
        match self.points {
            0 => Vec::new(),
            1 => vec![self.start],
            n => {
                let step = (self.stop - self.start) / (n as f64 - 1.0);
                (0..n).map(|i| self.start + step * i as f64).collect()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemperatureConfig {
    /// Temperatures at which MD was run (K).
    pub md: Vec<f64>,
    /// DSA analysis grid (K).
    pub dsa: TemperatureGrid,
}

impl Default for TemperatureConfig {
    fn default() -> Self {
        Self {
            md: MD_TEMPERATURES.to_vec(),
            dsa: TemperatureGrid {
                start: DSA_T_START,
                stop: DSA_T_STOP,
                points: DSA_T_POINTS,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArrheniusConfig {
    /// Run the weighted nonlinear refinement after the log-space fit.
    pub refine: bool,
    pub max_iterations: usize,
    /// Relative step / cost tolerance for convergence.
    pub tolerance: f64,
    pub min_points: usize,
}

impl Default for ArrheniusConfig {
    fn default() -> Self {
        Self {
            refine: true,
            max_iterations: LM_MAX_ITERATIONS,
            tolerance: LM_TOLERANCE,
            min_points: MIN_ARRHENIUS_POINTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DsaConfig {
    /// Mobile dislocation densities ρ_m (m⁻²).
    pub mobile_densities: Vec<f64>,
    /// Capture radii L_c (m), nm scale.
    pub capture_radii: Vec<f64>,
    /// Travel distances L_t (m), µm scale.
    pub travel_distances: Vec<f64>,
    /// `D_eff = D_bulk * (1 + pipe_factor)`.
    pub pipe_factor: f64,
    /// Open interval of `tau_diff / tau_wait` classified as DSA-possible.
    pub ratio_window: (f64, f64),
}

impl Default for DsaConfig {
    fn default() -> Self {
        Self {
            mobile_densities: MOBILE_DENSITIES.to_vec(),
            capture_radii: CAPTURE_RADII.to_vec(),
            travel_distances: TRAVEL_DISTANCES.to_vec(),
            pipe_factor: PIPE_FACTOR,
            ratio_window: (RATIO_LOWER, RATIO_UPPER),
        }
    }
}

/// Complete, immutable configuration of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub constants: PhysicalConstants,
    pub msd: MsdConfig,
    pub quality: QualityConfig,
    pub composition: CompositionConfig,
    pub temperatures: TemperatureConfig,
    pub arrhenius: ArrheniusConfig,
    pub dsa: DsaConfig,
}

impl AnalysisConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, EngineError> {
        let config: AnalysisConfig =
            toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, EngineError> {
        debug!(path = %path.display(), "loading analysis config");
        let text = std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Reject settings that would make any stage meaningless.
    pub fn validate(&self) -> Result<(), EngineError> {
        let c = &self.constants;
        for (name, v) in [
            ("constants.gas_constant", c.gas_constant),
            ("constants.boltzmann_ev", c.boltzmann_ev),
            ("constants.faraday", c.faraday),
            ("constants.burgers_vector", c.burgers_vector),
            ("constants.strain_rate", c.strain_rate),
            ("msd.timestep_ps", self.msd.timestep_ps),
        ] {
            require_positive(name, v)?;
        }

        let f = self.msd.discard_fraction;
        if !(f.is_finite() && (0.0..1.0).contains(&f)) {
            return Err(EngineError::Config(format!(
                "msd.discard_fraction must be in [0, 1), got {f}"
            )));
        }
        if self.msd.min_points < 2 {
            return Err(EngineError::Config("msd.min_points must be >= 2".to_string()));
        }

        let x = self.composition.solute_fraction;
        if !(x.is_finite() && (0.0..=1.0).contains(&x)) {
            return Err(EngineError::Config(format!(
                "composition.solute_fraction must be in [0, 1], got {x}"
            )));
        }

        if self.temperatures.md.iter().any(|t| !(t.is_finite() && *t > 0.0)) {
            return Err(EngineError::Config(
                "temperatures.md must contain positive temperatures".to_string(),
            ));
        }
        let grid = &self.temperatures.dsa;
        if grid.points < 2 || !(grid.start > 0.0 && grid.stop > grid.start) {
            return Err(EngineError::Config(format!(
                "temperatures.dsa must span start < stop with >= 2 points, got {grid:?}"
            )));
        }

        if self.arrhenius.min_points < 3 {
            return Err(EngineError::Config("arrhenius.min_points must be >= 3".to_string()));
        }
        require_positive("arrhenius.tolerance", self.arrhenius.tolerance)?;

        let dsa = &self.dsa;
        for (name, set) in [
            ("dsa.mobile_densities", &dsa.mobile_densities),
            ("dsa.capture_radii", &dsa.capture_radii),
            ("dsa.travel_distances", &dsa.travel_distances),
        ] {
            if set.is_empty() {
                return Err(EngineError::Config(format!("{name} must not be empty")));
            }
            for &v in set {
                require_positive(name, v)?;
            }
        }
        if !(dsa.pipe_factor.is_finite() && dsa.pipe_factor >= 0.0) {
            return Err(EngineError::Config(format!(
                "dsa.pipe_factor must be >= 0, got {}",
                dsa.pipe_factor
            )));
        }
        let (lo, hi) = dsa.ratio_window;
        if !(lo > 0.0 && hi > lo && hi.is_finite()) {
            return Err(EngineError::Config(format!(
                "dsa.ratio_window must satisfy 0 < lower < upper, got ({lo}, {hi})"
            )));
        }

        Ok(())
    }
}

fn require_positive(name: &str, v: f64) -> Result<(), EngineError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(EngineError::Config(format!("{name} must be finite and > 0, got {v}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AnalysisConfig::default();
        config.validate().unwrap();
        assert_eq!(config.temperatures.dsa.values().len(), 16);
        assert_eq!(config.msd.file_name(500.0), "msd_T500.dat");
    }

    #[test]
    fn dsa_grid_matches_linspace() {
        let grid = TemperatureConfig::default().dsa.values();
        assert!((grid[0] - 300.0).abs() < 1e-12);
        assert!((grid[15] - 450.0).abs() < 1e-12);
        assert!((grid[1] - 310.0).abs() < 1e-12);
    }

    #[test]
    fn partial_toml_overrides_only_named_keys() {
        let config = AnalysisConfig::from_toml_str(
            r#"
            [msd]
            discard_fraction = 0.2
            axis = "z"

            [dsa]
            pipe_factor = 3.0
            "#,
        )
        .unwrap();
        assert_eq!(config.msd.discard_fraction, 0.2);
        assert_eq!(config.msd.axis, Axis::Z);
        assert_eq!(config.dsa.pipe_factor, 3.0);
        assert_eq!(config.msd.timestep_ps, TIMESTEP_PS);
        assert_eq!(config.dsa.capture_radii, CAPTURE_RADII.to_vec());
    }

    #[test]
    fn rejects_bad_discard_fraction() {
        let err = AnalysisConfig::from_toml_str("[msd]\ndiscard_fraction = 1.0\n").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(AnalysisConfig::from_toml_str("[dsa]\nlength = 1.0\n").is_err());
    }

    #[test]
    fn rejects_empty_scenario_set() {
        let mut config = AnalysisConfig::default();
        config.dsa.travel_distances.clear();
        assert!(config.validate().is_err());
    }
}
