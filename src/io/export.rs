//! Result exports (CSV / JSON).
//!
//! Everything here is meant to be easy to consume from plotting/report scripts:
//! plain headers, one row per observation, empty cells for missing values.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::domain::{ArrheniusFit, CurvePoint, DiffusivityRecord, DiffusivityTable, DsaScenario, ScenarioResult};
use crate::dsa::LengthScaleReport;
use crate::error::EngineError;

fn create(path: &Path) -> Result<csv::Writer<File>, EngineError> {
    let file = File::create(path).map_err(|e| EngineError::io(path, e))?;
    Ok(csv::Writer::from_writer(file))
}

fn num(v: Option<f64>) -> String {
    v.filter(|x| x.is_finite()).map(|x| format!("{x:e}")).unwrap_or_default()
}

fn species_cells(rec: &DiffusivityRecord) -> [String; 4] {
    [
        num(rec.d()),
        num(rec.d_err()),
        num(rec.r_squared()),
        rec.is_valid().to_string(),
    ]
}

/// Per-temperature diffusivity table with validity flags.
pub fn write_diffusivity_csv(path: &Path, table: &DiffusivityTable) -> Result<(), EngineError> {
    let mut w = create(path)?;
    w.write_record([
        "T",
        "D_Mg",
        "D_Mg_err",
        "R2_Mg",
        "valid_Mg",
        "D_Al",
        "D_Al_err",
        "R2_Al",
        "valid_Al",
        "D_interdiff",
        "D_interdiff_err",
        "valid_interdiff",
    ])?;
    for row in &table.rows {
        let mut record = vec![row.temperature.to_string()];
        record.extend(species_cells(&row.mg));
        record.extend(species_cells(&row.al));
        record.push(num(row.interdiff.map(|i| i.d)));
        record.push(num(row.interdiff.map(|i| i.d_err)));
        record.push(row.interdiff.is_some().to_string());
        w.write_record(&record)?;
    }
    w.flush().map_err(|e| EngineError::io(path, e))?;
    debug!(path = %path.display(), rows = table.rows.len(), "wrote diffusivity table");
    Ok(())
}

/// Arrhenius parameters: `D0` (m²/s), `Q_kJmol`, `Q_eV`, each with its error.
pub fn write_params_csv(path: &Path, fit: &ArrheniusFit, faraday: f64) -> Result<(), EngineError> {
    let p = &fit.params;
    let strategy = fit.strategy.label();
    let mut w = create(path)?;
    w.write_record(["parameter", "value", "error", "strategy"])?;
    for (name, value, error) in [
        ("D0", p.d0, p.d0_err),
        ("Q_kJmol", p.q_kj_per_mol(), p.q_err_kj_per_mol()),
        ("Q_eV", p.q_ev(faraday), p.q_err_ev(faraday)),
    ] {
        w.write_record([name.to_string(), format!("{value:e}"), format!("{error:e}"), strategy.to_string()])?;
    }
    w.flush().map_err(|e| EngineError::io(path, e))?;
    Ok(())
}

/// Extrapolated `T,D` curve.
pub fn write_curve_csv(path: &Path, curve: &[CurvePoint]) -> Result<(), EngineError> {
    let mut w = create(path)?;
    w.write_record(["T", "D"])?;
    for p in curve {
        w.write_record([p.temperature.to_string(), format!("{:e}", p.d)])?;
    }
    w.flush().map_err(|e| EngineError::io(path, e))?;
    Ok(())
}

/// `dsa_rho1e12_Lc1.5nm_Lt0.1um.csv`
pub fn scenario_file_name(s: &DsaScenario) -> String {
    format!(
        "dsa_rho{:e}_Lc{}nm_Lt{}um.csv",
        s.mobile_density,
        s.capture_radius_nm(),
        s.travel_distance_um()
    )
}

/// One timescale CSV per scenario in `dir`; returns the written paths in order.
pub fn write_scenario_csvs(dir: &Path, results: &[ScenarioResult]) -> Result<Vec<PathBuf>, EngineError> {
    let mut names = HashSet::with_capacity(results.len());
    for r in results {
        let name = scenario_file_name(&r.scenario);
        if !names.insert(name.clone()) {
            return Err(EngineError::InvalidInput(format!(
                "scenarios map to the same file {name}; remove duplicate values from the DSA sets"
            )));
        }
    }

    std::fs::create_dir_all(dir).map_err(|e| EngineError::io(dir, e))?;
    let mut paths = Vec::with_capacity(results.len());
    for r in results {
        let path = dir.join(scenario_file_name(&r.scenario));
        let mut w = create(&path)?;
        w.write_record(["T", "D_bulk", "D_eff", "tau_diff", "tau_wait", "ratio", "dsa_possible"])?;
        for p in &r.points {
            w.write_record([
                p.temperature.to_string(),
                format!("{:e}", p.d_bulk),
                format!("{:e}", p.d_eff),
                format!("{:e}", p.tau_diff),
                format!("{:e}", p.tau_wait),
                format!("{:e}", p.ratio),
                (p.regime == crate::domain::Regime::DsaPossible).to_string(),
            ])?;
        }
        w.flush().map_err(|e| EngineError::io(&path, e))?;
        paths.push(path);
    }
    debug!(dir = %dir.display(), files = paths.len(), "wrote scenario tables");
    Ok(paths)
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedTemperature {
    pub temperature: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioSummary {
    pub scenario: DsaScenario,
    pub file: String,
    pub dsa_temperatures: Vec<f64>,
    pub dsa_window: Option<(f64, f64)>,
}

impl ScenarioSummary {
    pub fn from_result(result: &ScenarioResult) -> Self {
        Self {
            scenario: result.scenario,
            file: scenario_file_name(&result.scenario),
            dsa_temperatures: result.dsa_temperatures(),
            dsa_window: result.dsa_window(),
        }
    }
}

/// Machine-readable record of one full pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tool: String,
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub input_dir: String,
    pub temperatures_analyzed: Vec<f64>,
    pub skipped: Vec<SkippedTemperature>,
    /// Series used for the Arrhenius fit (`Mg`, `Al` or `interdiff`).
    pub fit_source: String,
    pub arrhenius: ArrheniusFit,
    pub length_scales: LengthScaleReport,
    pub scenarios: Vec<ScenarioSummary>,
}

pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<(), EngineError> {
    let file = File::create(path).map_err(|e| EngineError::io(path, e))?;
    serde_json::to_writer_pretty(file, summary)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArrheniusParameters, FitStrategy, Regime, TimescalePoint};
    use crate::io::{DiffusivityColumn, read_arrhenius_points, read_diffusivity_curve};

    #[test]
    fn scenario_names_use_natural_units() {
        let s = DsaScenario {
            mobile_density: 1e12,
            capture_radius: 5e-9,
            travel_distance: 0.1e-6,
        };
        assert_eq!(scenario_file_name(&s), "dsa_rho1e12_Lc5nm_Lt0.1um.csv");
    }

    fn flat_result(mobile_density: f64, capture_radius: f64) -> ScenarioResult {
        ScenarioResult {
            scenario: DsaScenario {
                mobile_density,
                capture_radius,
                travel_distance: 1e-6,
            },
            points: vec![TimescalePoint {
                temperature: 300.0,
                d_bulk: 1e-20,
                d_eff: 1e-20,
                tau_diff: 1.0,
                tau_wait: 1.0,
                ratio: 1.0,
                regime: Regime::DsaPossible,
            }],
        }
    }

    #[test]
    fn fractional_radii_and_densities_get_their_own_files() {
        let dir = tempfile::tempdir().unwrap();
        let results = [
            flat_result(1e13, 1.5e-9),
            flat_result(1e13, 2e-9),
            flat_result(1.5e12, 2e-9),
            flat_result(2e12, 2e-9),
        ];
        let paths = write_scenario_csvs(dir.path(), &results).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            [
                "dsa_rho1e13_Lc1.5nm_Lt1um.csv",
                "dsa_rho1e13_Lc2nm_Lt1um.csv",
                "dsa_rho1.5e12_Lc2nm_Lt1um.csv",
                "dsa_rho2e12_Lc2nm_Lt1um.csv",
            ]
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), results.len());
    }

    #[test]
    fn duplicate_scenarios_are_rejected_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("dsa");
        let results = [flat_result(1e13, 2e-9), flat_result(1e13, 2e-9)];
        let err = write_scenario_csvs(&out, &results).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
        assert!(!out.exists());
    }

    #[test]
    fn curve_csv_reads_back_as_curve() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extrap.csv");
        let curve = vec![
            CurvePoint { temperature: 300.0, d: 1.25e-25 },
            CurvePoint { temperature: 310.0, d: 3.5e-25 },
        ];
        write_curve_csv(&path, &curve).unwrap();
        assert_eq!(read_diffusivity_curve(&path).unwrap(), curve);
    }

    #[test]
    fn params_csv_has_three_rows_with_strategy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.csv");
        let params = ArrheniusParameters {
            d0: 1e-9,
            d0_err: 1e-11,
            q: 96_485.0,
            q_err: 964.85,
        };
        let fit = ArrheniusFit {
            params,
            linear: params,
            strategy: FitStrategy::Linear,
            n_points: 3,
            log_r_squared: 1.0,
            t_min: 500.0,
            t_max: 700.0,
        };
        write_params_csv(&path, &fit, 96_485.0).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "parameter,value,error,strategy");
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("Q_kJmol,9.6485e1,"));
        assert!(lines[3].starts_with("Q_eV,1e0,"));
        assert!(lines[3].ends_with(",linear"));
    }

    #[test]
    fn scenario_csv_flags_dsa_rows() {
        let dir = tempfile::tempdir().unwrap();
        let point = |temperature, ratio, regime| TimescalePoint {
            temperature,
            d_bulk: 1e-20,
            d_eff: 2e-20,
            tau_diff: ratio,
            tau_wait: 1.0,
            ratio,
            regime,
        };
        let result = ScenarioResult {
            scenario: DsaScenario {
                mobile_density: 1e13,
                capture_radius: 2e-9,
                travel_distance: 1e-6,
            },
            points: vec![
                point(300.0, 20.0, Regime::DiffusionSlow),
                point(350.0, 2.0, Regime::DsaPossible),
            ],
        };
        let paths = write_scenario_csvs(&dir.path().join("dsa"), &[result]).unwrap();
        assert_eq!(paths[0].file_name().unwrap(), "dsa_rho1e13_Lc2nm_Lt1um.csv");
        let text = std::fs::read_to_string(&paths[0]).unwrap();
        assert!(text.starts_with("T,D_bulk,D_eff,tau_diff,tau_wait,ratio,dsa_possible\n"));
        assert!(text.lines().nth(1).unwrap().ends_with(",false"));
        assert!(text.lines().nth(2).unwrap().ends_with(",true"));
    }

    #[test]
    fn diffusivity_csv_round_trips_through_reader() {
        use crate::domain::{Dimensionality, FitResult, InterdiffRecord, RecordStatus, Species, TemperatureRow};

        let fit = |d: f64, r2: f64| FitResult {
            slope: 6.0 * d,
            intercept: 0.0,
            r_squared: r2,
            std_err: 0.0,
            intercept_std_err: 0.0,
            diffusivity: d,
            diffusivity_err: d / 100.0,
            n_points_used: 90,
            dimensionality: Dimensionality::Three,
        };
        let rec = |species, d, r2, status| DiffusivityRecord {
            temperature: 500.0,
            species,
            fit: Some(fit(d, r2)),
            status,
        };
        let table = DiffusivityTable {
            rows: vec![TemperatureRow {
                temperature: 500.0,
                mg: rec(Species::Mg, 2e-12, 0.99, RecordStatus::Valid),
                al: rec(Species::Al, 1e-12, 0.5, RecordStatus::PoorFit),
                interdiff: None::<InterdiffRecord>,
            }],
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diffusion_coefficients.csv");
        write_diffusivity_csv(&path, &table).unwrap();

        let mg = read_arrhenius_points(&path, DiffusivityColumn::Mg).unwrap();
        assert_eq!(mg.points.len(), 1);
        assert_eq!(mg.points[0].d, 2e-12);
        assert_eq!(mg.points[0].quality, Some(0.99));

        let al = read_arrhenius_points(&path, DiffusivityColumn::Al).unwrap();
        assert_eq!(al.rows_flagged_invalid, 1);
        assert!(al.points.is_empty());

        // Auto falls through to the (empty) interdiffusivity column.
        let inter = read_arrhenius_points(&path, DiffusivityColumn::Auto).unwrap();
        assert_eq!(inter.column, "D_interdiff");
        assert!(inter.points.is_empty());
    }
}
