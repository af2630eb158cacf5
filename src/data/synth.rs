//! Synthetic MSD generation.
//!
//! Writes `msd_T{T}.dat` files in the LAMMPS-style nine-column layout for every
//! MD temperature, with per-species diffusivities drawn from Arrhenius laws.
//! Each axis grows as `2·D·t` and the total as `6·D·t`; optional Gaussian noise
//! (Å²) is added per cell. Generation is deterministic for a given seed.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::domain::{ArrheniusParameters, Species};
use crate::error::EngineError;

/// Å² per m².
const ANG2_PER_M2: f64 = 1e20;
/// Seconds per picosecond.
const S_PER_PS: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct SynthSpec {
    /// Arrhenius law for the solute (Mg).
    pub solute: ArrheniusParameters,
    /// Arrhenius law for the solvent (Al).
    pub solvent: ArrheniusParameters,
    /// Number of data rows per file.
    pub steps: usize,
    /// Timestep increment between rows.
    pub stride: u64,
    /// Standard deviation of additive noise, Å².
    pub noise_ang2: f64,
    pub seed: u64,
}

impl SynthSpec {
    fn params(&self, species: Species) -> &ArrheniusParameters {
        match species {
            Species::Mg => &self.solute,
            Species::Al => &self.solvent,
        }
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.steps == 0 || self.stride == 0 {
            return Err(EngineError::InvalidInput(
                "synthetic MSD needs steps > 0 and stride > 0".to_string(),
            ));
        }
        if !(self.noise_ang2.is_finite() && self.noise_ang2 >= 0.0) {
            return Err(EngineError::InvalidInput(format!(
                "noise must be finite and >= 0 (got {})",
                self.noise_ang2
            )));
        }
        for p in [&self.solute, &self.solvent] {
            if !(p.d0.is_finite() && p.d0 > 0.0 && p.q.is_finite()) {
                return Err(EngineError::InvalidInput(format!(
                    "invalid Arrhenius parameters: D0={}, Q={}",
                    p.d0, p.q
                )));
            }
        }
        Ok(())
    }
}

/// Render one temperature's MSD file as text.
pub fn render_msd(temperature: f64, config: &AnalysisConfig, spec: &SynthSpec) -> Result<String, EngineError> {
    spec.validate()?;
    let normal = Normal::new(0.0, spec.noise_ang2)
        .map_err(|e| EngineError::InvalidInput(format!("noise distribution: {e}")))?;
    let mut rng = StdRng::seed_from_u64(spec.seed.wrapping_add(temperature.round() as u64));

    let r = config.constants.gas_constant;
    let d = Species::ALL.map(|s| spec.params(s).evaluate(temperature, r));

    let mut out = String::new();
    let header = [
        "# Time-averaged data for fix msd_out".to_string(),
        format!("# synthetic T={temperature} K seed={}", spec.seed),
        "# TimeStep c_msd_mg[1] c_msd_mg[2] c_msd_mg[3] c_msd_mg[4] c_msd_al[1] c_msd_al[2] c_msd_al[3] c_msd_al[4]"
            .to_string(),
    ];
    for i in 0..config.msd.header_lines {
        let line = header.get(i).map(String::as_str).unwrap_or("#");
        out.push_str(line);
        out.push('\n');
    }

    for i in 0..spec.steps {
        let step = i as u64 * spec.stride;
        let t = step as f64 * config.msd.timestep_ps * S_PER_PS;
        out.push_str(&step.to_string());
        for d_s in d {
            let axis = 2.0 * d_s * t * ANG2_PER_M2;
            for value in [axis, axis, axis, 3.0 * axis] {
                let noisy = if spec.noise_ang2 > 0.0 {
                    value + normal.sample(&mut rng)
                } else {
                    value
                };
                out.push_str(&format!(" {noisy}"));
            }
        }
        out.push('\n');
    }
    Ok(out)
}

/// Write one file per configured MD temperature into `dir`.
pub fn write_msd_files(dir: &Path, config: &AnalysisConfig, spec: &SynthSpec) -> Result<Vec<PathBuf>, EngineError> {
    std::fs::create_dir_all(dir).map_err(|e| EngineError::io(dir, e))?;
    let mut written = Vec::with_capacity(config.temperatures.md.len());
    for &temperature in &config.temperatures.md {
        let path = dir.join(config.msd.file_name(temperature));
        let text = render_msd(temperature, config, spec)?;
        std::fs::write(&path, text).map_err(|e| EngineError::io(&path, e))?;
        debug!(path = %path.display(), temperature, "wrote synthetic MSD");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::parse_msd_series;
    use crate::io::MsdSchema;

    fn spec(noise: f64) -> SynthSpec {
        let p = |d0, q| ArrheniusParameters {
            d0,
            d0_err: 0.0,
            q,
            q_err: 0.0,
        };
        SynthSpec {
            solute: p(1e-6, 80_000.0),
            solvent: p(5e-7, 90_000.0),
            steps: 20,
            stride: 500,
            noise_ang2: noise,
            seed: 42,
        }
    }

    #[test]
    fn rendered_file_parses_as_two_species() {
        let config = AnalysisConfig::default();
        let text = render_msd(600.0, &config, &spec(0.0)).unwrap();
        let series = parse_msd_series(&text, Path::new("s.dat"), &config.msd, None).unwrap();
        assert_eq!(series.schema, MsdSchema::TwoSpecies);
        assert_eq!(series.len(), 20);
        assert_eq!(series.steps()[3], 1500.0);
    }

    #[test]
    fn data_rows_have_step_and_eight_components() {
        let config = AnalysisConfig::default();
        let text = render_msd(500.0, &config, &spec(0.0)).unwrap();
        let rows: Vec<&str> = text.lines().skip(config.msd.header_lines).collect();
        assert_eq!(rows.len(), 20);
        for row in rows {
            assert_eq!(row.split(' ').count(), 9, "{row}");
        }
        assert!(text.lines().nth(config.msd.header_lines).unwrap().starts_with("0 "));
    }

    #[test]
    fn same_seed_same_output() {
        let config = AnalysisConfig::default();
        let a = render_msd(500.0, &config, &spec(0.01)).unwrap();
        let b = render_msd(500.0, &config, &spec(0.01)).unwrap();
        assert_eq!(a, b);
        let clean = render_msd(500.0, &config, &spec(0.0)).unwrap();
        assert_ne!(a, clean);
    }

    #[test]
    fn writes_one_file_per_temperature() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalysisConfig::default();
        let paths = write_msd_files(dir.path(), &config, &spec(0.0)).unwrap();
        assert_eq!(paths.len(), config.temperatures.md.len());
        assert!(dir.path().join("msd_T500.dat").exists());
    }

    #[test]
    fn rejects_zero_steps() {
        let mut s = spec(0.0);
        s.steps = 0;
        let err = render_msd(500.0, &AnalysisConfig::default(), &s).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }
}
