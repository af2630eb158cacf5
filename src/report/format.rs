//! Terminal formatting for analysis results.
//!
//! Formatting lives in one place so the numerical modules stay free of
//! presentation concerns, and output changes stay localized.

use std::path::Path;

use crate::diffusion::QualityReport;
use crate::domain::{ArrheniusFit, DiffusivityRecord, DiffusivityTable, FitStrategy, RecordStatus, ScenarioResult};
use crate::dsa::LengthScaleReport;

/// Per-temperature diffusivities with validity flags.
pub fn format_diffusivity_table(table: &DiffusivityTable, skipped: &[(f64, String)]) -> String {
    let mut out = String::new();
    out.push_str("=== Diffusion coefficients ===\n");
    push_line(
        &mut out,
        format!(
            "{:>7} {:>12} {:>8} {:>6} {:>12} {:>8} {:>6} {:>12}",
            "T(K)", "D_Mg", "R2_Mg", "ok", "D_Al", "R2_Al", "ok", "D_interdiff"
        ),
    );
    push_line(
        &mut out,
        format!(
            "{:-<7} {:-<12} {:-<8} {:-<6} {:-<12} {:-<8} {:-<6} {:-<12}",
            "", "", "", "", "", "", "", ""
        ),
    );

    for row in &table.rows {
        let [d_mg, r2_mg, ok_mg] = record_cells(&row.mg);
        let [d_al, r2_al, ok_al] = record_cells(&row.al);
        push_line(
            &mut out,
            format!(
                "{:>7.1} {:>12} {:>8} {:>6} {:>12} {:>8} {:>6} {:>12}",
                row.temperature,
                d_mg,
                r2_mg,
                ok_mg,
                d_al,
                r2_al,
                ok_al,
                fmt_sci(row.interdiff.map(|i| i.d)),
            ),
        );
    }

    for (t, reason) in skipped {
        out.push_str(&format!("  (skipped T={t}) {reason}\n"));
    }
    out
}

fn record_cells(rec: &DiffusivityRecord) -> [String; 3] {
    let ok = match rec.status {
        RecordStatus::Valid => "yes",
        RecordStatus::PoorFit => "r2",
        RecordStatus::NonPositive => "D<=0",
        RecordStatus::InsufficientData => "short",
    };
    [
        fmt_sci(rec.d()),
        rec.r_squared().map(|r| format!("{r:.4}")).unwrap_or_else(|| "-".to_string()),
        ok.to_string(),
    ]
}

/// Arrhenius parameters in m²/s, kJ/mol and eV, with the producing strategy.
pub fn format_arrhenius(fit: &ArrheniusFit, source: &str, faraday: f64) -> String {
    let p = &fit.params;
    let mut out = String::new();
    out.push_str(&format!("=== Arrhenius fit ({source}) ===\n"));
    out.push_str(&format!(
        "Points: n={} | T=[{:.1}, {:.1}] K | log-space r2={:.4}\n",
        fit.n_points, fit.t_min, fit.t_max, fit.log_r_squared
    ));
    out.push_str(&format!("D0 = {:.4e} +/- {:.4e} m^2/s\n", p.d0, p.d0_err));
    out.push_str(&format!(
        "Q  = {:.2} +/- {:.2} kJ/mol\n",
        p.q_kj_per_mol(),
        p.q_err_kj_per_mol()
    ));
    out.push_str(&format!(
        "Q  = {:.4} +/- {:.4} eV\n",
        p.q_ev(faraday),
        p.q_err_ev(faraday)
    ));
    match &fit.strategy {
        FitStrategy::Linear => out.push_str("Strategy: linear (log-space OLS)\n"),
        FitStrategy::Nonlinear { iterations } => {
            out.push_str(&format!("Strategy: nonlinear WLS ({iterations} iterations)\n"));
        }
        FitStrategy::LinearFallback { reason } => {
            out.push_str(&format!("Strategy: linear fallback ({reason})\n"));
        }
    }
    out
}

/// DSA-possible window per scenario.
pub fn format_dsa_windows(results: &[ScenarioResult]) -> String {
    let mut out = String::new();
    out.push_str("=== DSA regime windows ===\n");
    push_line(
        &mut out,
        format!("{:>8} {:>8} {:>8} {:<24}", "rho", "L_c(nm)", "L_t(um)", "DSA window (K)"),
    );
    push_line(&mut out, format!("{:-<8} {:-<8} {:-<8} {:-<24}", "", "", "", ""));
    for r in results {
        let s = &r.scenario;
        let window = match r.dsa_window() {
            Some((lo, hi)) => format!("{lo:.1} - {hi:.1} ({} pts)", r.dsa_temperatures().len()),
            None => "none".to_string(),
        };
        push_line(
            &mut out,
            format!(
                "{:>8.0e} {:>8} {:>8} {:<24}",
                s.mobile_density,
                s.capture_radius_nm(),
                s.travel_distance_um(),
                window
            ),
        );
    }
    let with_window = results.iter().filter(|r| r.dsa_window().is_some()).count();
    out.push_str(&format!(
        "{with_window}/{} scenario(s) admit DSA in the analysed range\n",
        results.len()
    ));
    out
}

/// Quick MSD quality check for one file.
pub fn format_quality_report(path: &Path, report: &QualityReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} ===\n", path.display()));
    out.push_str(&format!("Records: {} | schema: {:?}\n", report.records, report.schema));
    if let Some((t0, t1)) = report.window_ns {
        out.push_str(&format!("Time: {t0:.3} - {t1:.3} ns\n"));
    }
    for sq in &report.species {
        let label = format!("{} ({})", sq.species.label(), report.axis.label());
        match (sq.fit, sq.grade) {
            (Some(fit), Some(grade)) => out.push_str(&format!(
                "  {label:<14} D={:.4e} m^2/s  r2={:.4}  [{}]\n",
                fit.diffusivity,
                fit.r_squared,
                grade.label()
            )),
            _ => out.push_str(&format!("  {label:<14} insufficient data\n")),
        }
    }
    out
}

pub fn format_length_scales(report: &LengthScaleReport) -> String {
    let (lc_min, lc_max) = report.capture_radius;
    let (lt_min, lt_max) = report.travel_distance;
    let mut out = String::new();
    out.push_str("=== Length scales ===\n");
    out.push_str(&format!(
        "L_c (capture radius):   {:.3} - {:.3} nm\n",
        lc_min * 1e9,
        lc_max * 1e9
    ));
    out.push_str(&format!(
        "L_t (travel distance):  {:.3} - {:.3} um\n",
        lt_min * 1e6,
        lt_max * 1e6
    ));
    out.push_str(&format!("min(L_t) / max(L_c) = {:.1}\n", report.separation));
    if report.is_ok() {
        out.push_str("[OK] length scales are separated and within typical ranges\n");
    }
    for w in &report.warnings {
        out.push_str(&format!("[WARNING] {w}\n"));
    }
    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn fmt_sci(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{x:.3e}"),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DsaConfig;
    use crate::domain::{ArrheniusParameters, DsaScenario, Regime, TimescalePoint};
    use crate::dsa::validate_length_scales;

    #[test]
    fn arrhenius_block_names_strategy() {
        let params = ArrheniusParameters {
            d0: 1e-9,
            d0_err: 2e-11,
            q: 100_000.0,
            q_err: 1_000.0,
        };
        let fit = ArrheniusFit {
            params,
            linear: params,
            strategy: FitStrategy::LinearFallback {
                reason: "iteration limit reached".to_string(),
            },
            n_points: 3,
            log_r_squared: 0.999,
            t_min: 500.0,
            t_max: 700.0,
        };
        let text = format_arrhenius(&fit, "interdiff", 96_485.0);
        assert!(text.contains("Q  = 100.00 +/- 1.00 kJ/mol"));
        assert!(text.contains("linear fallback (iteration limit reached)"));
    }

    #[test]
    fn dsa_table_lists_every_scenario() {
        let point = |regime| TimescalePoint {
            temperature: 350.0,
            d_bulk: 1.0,
            d_eff: 2.0,
            tau_diff: 1.0,
            tau_wait: 1.0,
            ratio: 1.0,
            regime,
        };
        let scenario = DsaScenario {
            mobile_density: 1e12,
            capture_radius: 1e-9,
            travel_distance: 1e-7,
        };
        let results = vec![
            ScenarioResult {
                scenario,
                points: vec![point(Regime::DsaPossible)],
            },
            ScenarioResult {
                scenario,
                points: vec![point(Regime::DiffusionSlow)],
            },
        ];
        let text = format_dsa_windows(&results);
        assert!(text.contains("350.0 - 350.0 (1 pts)"));
        assert!(text.contains("none"));
        assert!(text.contains("1/2 scenario(s)"));
    }

    #[test]
    fn length_scale_report_prints_warnings() {
        let mut config = DsaConfig::default();
        config.capture_radii = vec![20e-9];
        let text = format_length_scales(&validate_length_scales(&config));
        assert!(text.contains("[WARNING]"));
        assert!(!text.contains("[OK]"));
    }
}
