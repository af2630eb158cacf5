//! Quick MSD quality check.
//!
//! Regresses one component per species and grades linearity (OK / WARN / POOR)
//! without applying the validity gate. Useful for deciding whether a run is long
//! enough before feeding it to the full analysis.

use crate::config::AnalysisConfig;
use crate::diffusion::DiffusivityEstimator;
use crate::domain::{Axis, FitResult, QualityGrade, Species};
use crate::io::{MsdSchema, MsdSeries};

#[derive(Debug, Clone)]
pub struct SpeciesQuality {
    pub species: Species,
    /// `None` when too few samples remain after the transient cut.
    pub fit: Option<FitResult>,
    pub grade: Option<QualityGrade>,
}

#[derive(Debug, Clone)]
pub struct QualityReport {
    pub schema: MsdSchema,
    pub records: usize,
    /// Simulated time window (ns), relative to the first step.
    pub window_ns: Option<(f64, f64)>,
    pub axis: Axis,
    pub species: Vec<SpeciesQuality>,
}

pub fn check_series(series: &MsdSeries, axis: Axis, config: &AnalysisConfig) -> QualityReport {
    let estimator = DiffusivityEstimator::from_config(&config.msd);
    let steps = series.steps();

    let species = series
        .schema
        .species()
        .iter()
        .map(|&species| {
            let fit = estimator.estimate(&steps, &series.column(species, axis), axis.dimensionality());
            let grade = fit.map(|f| {
                QualityGrade::from_r_squared(f.r_squared, config.quality.r2_threshold, config.quality.r2_warn)
            });
            SpeciesQuality { species, fit, grade }
        })
        .collect();

    QualityReport {
        schema: series.schema,
        records: series.len(),
        window_ns: time_window_ns(&steps, config.msd.timestep_ps),
        axis,
        species,
    }
}

fn time_window_ns(steps: &[f64], timestep_ps: f64) -> Option<(f64, f64)> {
    let first = steps.iter().copied().find(|s| s.is_finite())?;
    let last = steps.iter().copied().rev().find(|s| s.is_finite())?;
    let to_ns = |s: f64| (s - first) * timestep_ps / 1000.0;
    Some((to_ns(first), to_ns(last)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::parse_msd_series;
    use std::path::Path;

    #[test]
    fn grades_linear_and_flat_components() {
        let mut text = String::from("#\n#\n#\n");
        for i in 0..100 {
            let t = i as f64;
            // Mg: linear; Al: oscillating around a constant (no diffusion).
            let al = 1.0 + 0.3 * (t * 1.7).sin();
            text.push_str(&format!(
                "{} 0 0 {} 0 0 0 {} 0\n",
                1000 + i * 100,
                0.01 * t,
                al
            ));
        }
        let config = AnalysisConfig::default();
        let series = parse_msd_series(&text, Path::new("q.dat"), &config.msd, None).unwrap();
        let report = check_series(&series, Axis::Z, &config);

        assert_eq!(report.schema, MsdSchema::TwoSpecies);
        assert_eq!(report.records, 100);
        let (t0, t1) = report.window_ns.unwrap();
        assert_eq!(t0, 0.0);
        assert!((t1 - 99.0 * 100.0 * 0.001 / 1000.0).abs() < 1e-12);

        assert_eq!(report.species[0].grade, Some(QualityGrade::Ok));
        assert_eq!(report.species[1].grade, Some(QualityGrade::Poor));
    }
}
