//! Shared end-to-end pipeline used by `dsa run`.
//!
//! MSD directory -> per-temperature diffusivities -> Arrhenius fit ->
//! extrapolation onto the DSA grid -> scenario sweep.
//!
//! Each stage consumes only the previous stage's output plus the immutable
//! [`AnalysisConfig`]; presentation and file writing stay in the caller.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use crate::config::AnalysisConfig;
use crate::diffusion::{BatchOutput, analyze_directory_strict};
use crate::domain::{ArrheniusFit, CurvePoint, DiffusivitySource, ScenarioResult};
use crate::dsa::{LengthScaleReport, sweep, validate_length_scales};
use crate::error::EngineError;
use crate::fit::{extrapolate, fit_arrhenius};
use crate::io::{
    RunSummary, ScenarioSummary, SkippedTemperature, write_curve_csv, write_diffusivity_csv,
    write_params_csv, write_scenario_csvs, write_summary_json,
};

/// All computed outputs of a single `dsa run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub batch: BatchOutput,
    pub source: DiffusivitySource,
    pub fit: ArrheniusFit,
    /// Extrapolated `D(T)` on the DSA grid.
    pub curve: Vec<CurvePoint>,
    pub scenarios: Vec<ScenarioResult>,
    pub length_scales: LengthScaleReport,
}

/// Paths written by [`write_outputs`].
#[derive(Debug, Clone)]
pub struct OutputFiles {
    pub diffusivities: PathBuf,
    pub params: PathBuf,
    pub extrapolated: PathBuf,
    pub scenarios: Vec<PathBuf>,
    pub summary: PathBuf,
}

pub fn run_pipeline(
    dir: &Path,
    source: DiffusivitySource,
    config: &AnalysisConfig,
) -> Result<RunOutput, EngineError> {
    // 1) Per-temperature diffusivities (bad files skipped, not fatal).
    let batch = analyze_directory_strict(dir, config)?;

    // 2) Arrhenius fit on the gated series.
    let points = batch.table.arrhenius_points(source);
    info!(source = source.label(), points = points.len(), "Arrhenius input");
    let fit = fit_arrhenius(&points, None, config)?;

    // 3) Extrapolate onto the DSA grid.
    let grid = config.temperatures.dsa.values();
    let curve = extrapolate(&fit.params, &grid, config.constants.gas_constant);

    // 4) Scenario sweep.
    let scenarios = sweep(&curve, &grid, config)?;
    let length_scales = validate_length_scales(&config.dsa);

    Ok(RunOutput {
        batch,
        source,
        fit,
        curve,
        scenarios,
        length_scales,
    })
}

/// Write every table of a run plus `summary.json` into `out_dir`.
pub fn write_outputs(
    run: &RunOutput,
    input_dir: &Path,
    out_dir: &Path,
    config: &AnalysisConfig,
) -> Result<OutputFiles, EngineError> {
    std::fs::create_dir_all(out_dir).map_err(|e| EngineError::io(out_dir, e))?;

    let diffusivities = out_dir.join("diffusion_coefficients.csv");
    write_diffusivity_csv(&diffusivities, &run.batch.table)?;

    let params = out_dir.join("arrhenius_params.csv");
    write_params_csv(&params, &run.fit, config.constants.faraday)?;

    let extrapolated = out_dir.join("diffusivity_extrapolated.csv");
    write_curve_csv(&extrapolated, &run.curve)?;

    let scenarios = write_scenario_csvs(&out_dir.join("dsa"), &run.scenarios)?;

    let summary_path = out_dir.join("summary.json");
    let summary = RunSummary {
        tool: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        generated_at: Utc::now(),
        input_dir: input_dir.display().to_string(),
        temperatures_analyzed: run.batch.table.rows.iter().map(|r| r.temperature).collect(),
        skipped: run
            .batch
            .skipped
            .iter()
            .map(|(temperature, reason)| SkippedTemperature {
                temperature: *temperature,
                reason: reason.clone(),
            })
            .collect(),
        fit_source: run.source.label().to_string(),
        arrhenius: run.fit.clone(),
        length_scales: run.length_scales.clone(),
        scenarios: run.scenarios.iter().map(ScenarioSummary::from_result).collect(),
    };
    write_summary_json(&summary_path, &summary)?;
    info!(dir = %out_dir.display(), "wrote run outputs");

    Ok(OutputFiles {
        diffusivities,
        params,
        extrapolated,
        scenarios,
        summary: summary_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SynthSpec, write_msd_files};
    use crate::domain::{ArrheniusParameters, FitStrategy, Species};

    fn params(d0: f64, q: f64) -> ArrheniusParameters {
        ArrheniusParameters {
            d0,
            d0_err: 0.0,
            q,
            q_err: 0.0,
        }
    }

    fn synth_dir(config: &AnalysisConfig) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let spec = SynthSpec {
            solute: params(1e-6, 80_000.0),
            solvent: params(5e-7, 90_000.0),
            steps: 200,
            stride: 1000,
            noise_ang2: 0.0,
            seed: 3,
        };
        write_msd_files(dir.path(), config, &spec).unwrap();
        dir
    }

    #[test]
    fn pipeline_recovers_solute_activation_energy() {
        let config = AnalysisConfig::default();
        let dir = synth_dir(&config);
        let run = run_pipeline(dir.path(), DiffusivitySource::Species(Species::Mg), &config).unwrap();

        assert_eq!(run.batch.table.rows.len(), 3);
        assert!(matches!(run.fit.strategy, FitStrategy::Nonlinear { .. }));
        assert!((run.fit.params.q - 80_000.0).abs() / 80_000.0 < 1e-4);
        assert!((run.fit.params.d0 - 1e-6).abs() / 1e-6 < 1e-3);

        assert_eq!(run.curve.len(), config.temperatures.dsa.points);
        assert_eq!(run.scenarios.len(), 27);
        assert!(run.scenarios.iter().all(|s| s.points.len() == 16));
        assert!(run.length_scales.is_ok());
    }

    #[test]
    fn outputs_are_written_and_summary_is_json() {
        let config = AnalysisConfig::default();
        let dir = synth_dir(&config);
        let run = run_pipeline(dir.path(), DiffusivitySource::Interdiff, &config).unwrap();
        // Interdiffusivity is a blend of the two laws, so Q falls between them.
        assert!(run.fit.params.q > 80_000.0 && run.fit.params.q < 90_000.0);

        let out = tempfile::tempdir().unwrap();
        let files = write_outputs(&run, dir.path(), out.path(), &config).unwrap();
        assert!(files.diffusivities.exists());
        assert!(files.params.exists());
        assert!(files.extrapolated.exists());
        assert_eq!(files.scenarios.len(), 27);

        let text = std::fs::read_to_string(&files.summary).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["fit_source"], "interdiff");
        assert!(json["generated_at"].is_string());
        assert_eq!(json["scenarios"].as_array().unwrap().len(), 27);
        assert!(json["arrhenius"]["strategy"]["kind"].is_string());
    }

    #[test]
    fn too_few_valid_temperatures_is_insufficient() {
        let config = AnalysisConfig::default();
        let dir = synth_dir(&config);
        std::fs::remove_file(dir.path().join("msd_T700.dat")).unwrap();
        let err = run_pipeline(dir.path(), DiffusivitySource::Interdiff, &config).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientData { found: 2, required: 3, .. }));
    }
}
