//! Per-temperature diffusivity extraction.
//!
//! For each MD temperature we load `msd_T{T}.dat`, estimate a diffusivity for
//! every species, gate it, and combine valid pairs into an interdiffusivity.
//! File-level failures are isolated: the temperature is skipped (and reported)
//! while the rest of the batch continues.

use std::path::Path;

use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::diffusion::{DiffusivityEstimator, ValidityGate, interdiffusivity};
use crate::domain::{DiffusivityTable, Species, TemperatureRow};
use crate::error::EngineError;
use crate::io::{MsdSeries, load_msd_series};

/// Output of a batch run.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub table: DiffusivityTable,
    /// Temperatures whose file could not be used, and why.
    pub skipped: Vec<(f64, String)>,
}

/// Estimate and gate every species of one parsed MSD series.
pub fn analyze_series(series: &MsdSeries, temperature: f64, config: &AnalysisConfig) -> TemperatureRow {
    let estimator = DiffusivityEstimator::from_config(&config.msd);
    let gate = ValidityGate::new(config.quality.r2_threshold);
    let axis = config.msd.axis;
    let steps = series.steps();

    let [mg, al] = Species::ALL.map(|species| {
        let fit = estimator.estimate(&steps, &series.column(species, axis), axis.dimensionality());
        let record = gate.record(temperature, species, fit);
        match record.fit {
            Some(f) => info!(
                temperature,
                species = species.label(),
                d = f.diffusivity,
                r2 = f.r_squared,
                valid = record.is_valid(),
                "diffusivity"
            ),
            None => info!(
                temperature,
                species = species.label(),
                "insufficient data for diffusivity fit"
            ),
        }
        record
    });

    let interdiff = interdiffusivity(&mg, &al, config.composition.solute_fraction);
    TemperatureRow {
        temperature,
        mg,
        al,
        interdiff,
    }
}

/// Analyze every configured MD temperature found in `dir`.
pub fn analyze_directory(dir: &Path, config: &AnalysisConfig) -> BatchOutput {
    let mut rows = Vec::new();
    let mut skipped = Vec::new();

    for &temperature in &config.temperatures.md {
        let path = dir.join(config.msd.file_name(temperature));
        match load_msd_series(&path, &config.msd, None) {
            Ok(series) => rows.push(analyze_series(&series, temperature, config)),
            Err(err) => {
                warn!(temperature, error = %err, "skipping temperature");
                skipped.push((temperature, err.to_string()));
            }
        }
    }

    BatchOutput {
        table: DiffusivityTable { rows },
        skipped,
    }
}

/// Like [`analyze_directory`], but an empty table is an error.
pub fn analyze_directory_strict(dir: &Path, config: &AnalysisConfig) -> Result<BatchOutput, EngineError> {
    let out = analyze_directory(dir, config);
    if out.table.rows.is_empty() {
        return Err(EngineError::insufficient(
            format!("MSD analysis of '{}'", dir.display()),
            0,
            1,
        ));
    }
    Ok(out)
}
