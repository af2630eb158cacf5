//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - resolves the analysis config (file, environment, CLI overrides)
//! - dispatches to one handler per subcommand
//! - prints reports and writes optional exports

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{debug, info, warn};

use crate::cli::{CheckArgs, Cli, Command, DsaArgs, FitArgs, MsdArgs, MsdOverrides, RunArgs, SynthArgs};
use crate::config::AnalysisConfig;
use crate::config::{CHECK_AXIS, CHECK_DISCARD_FRACTION};
use crate::data::{SynthSpec, write_msd_files};
use crate::diffusion::{analyze_directory_strict, check_series};
use crate::domain::ArrheniusParameters;
use crate::dsa::{sweep, validate_length_scales};
use crate::error::{AppError, EngineError};
use crate::fit::{extrapolate, fit_arrhenius};
use crate::io::{
    load_msd_series, read_arrhenius_points, read_diffusivity_curve, write_curve_csv, write_diffusivity_csv,
    write_params_csv, write_scenario_csvs,
};
use crate::report;

pub mod pipeline;

/// Environment variable naming a TOML config when `--config` is absent.
pub const CONFIG_ENV: &str = "DSA_CONFIG";

/// Entry point for the `dsa` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    crate::logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;
    debug!(?cli, "parsed arguments");

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(|e| AppError::new(4, format!("Failed to build thread pool: {e}")))?;
        info!(threads, "configured worker pool");
    }

    dotenvy::dotenv().ok();
    let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let config = resolve_config(cli.config.as_deref(), env_path.as_deref())?;

    match cli.command {
        Command::Msd(args) => handle_msd(args, config),
        Command::Check(args) => handle_check(args, config),
        Command::Fit(args) => handle_fit(args, config),
        Command::Dsa(args) => handle_dsa(args, config),
        Command::Run(args) => handle_run(args, config),
        Command::Scales => {
            println!("{}", report::format_length_scales(&validate_length_scales(&config.dsa)));
            Ok(())
        }
        Command::Synth(args) => handle_synth(args, config),
    }
}

/// `--config` wins over the environment; with neither, defaults apply.
pub fn resolve_config(explicit: Option<&Path>, from_env: Option<&Path>) -> Result<AnalysisConfig, EngineError> {
    match explicit.or(from_env) {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            AnalysisConfig::load(path)
        }
        None => Ok(AnalysisConfig::default()),
    }
}

/// Apply MSD-related flags, then re-validate.
pub fn apply_msd_overrides(config: &mut AnalysisConfig, o: &MsdOverrides) -> Result<(), EngineError> {
    if let Some(axis) = o.axis {
        config.msd.axis = axis;
    }
    if let Some(f) = o.discard {
        config.msd.discard_fraction = f;
    }
    if let Some(dt) = o.timestep {
        config.msd.timestep_ps = dt;
    }
    config.validate()
}

fn handle_msd(args: MsdArgs, mut config: AnalysisConfig) -> Result<(), AppError> {
    if let Some(temps) = args.temperatures {
        config.temperatures.md = temps;
    }
    apply_msd_overrides(&mut config, &args.msd)?;

    let out = analyze_directory_strict(&args.dir, &config)?;
    println!("{}", report::format_diffusivity_table(&out.table, &out.skipped));

    if let Some(path) = &args.export {
        write_diffusivity_csv(path, &out.table)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

/// The quick check regresses z with a 20% cut unless told otherwise.
pub fn check_overrides(o: &MsdOverrides) -> MsdOverrides {
    MsdOverrides {
        axis: Some(o.axis.unwrap_or(CHECK_AXIS)),
        discard: Some(o.discard.unwrap_or(CHECK_DISCARD_FRACTION)),
        timestep: o.timestep,
    }
}

fn handle_check(args: CheckArgs, mut config: AnalysisConfig) -> Result<(), AppError> {
    apply_msd_overrides(&mut config, &check_overrides(&args.msd))?;

    let mut checked = 0;
    for path in &args.files {
        match load_msd_series(path, &config.msd, None) {
            Ok(series) => {
                let quality = check_series(&series, config.msd.axis, &config);
                println!("{}", report::format_quality_report(path, &quality));
                checked += 1;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping file");
                eprintln!("{}: {err}", path.display());
            }
        }
    }
    if checked == 0 {
        return Err(EngineError::insufficient("MSD quality check", 0, 1).into());
    }
    Ok(())
}

fn handle_fit(args: FitArgs, mut config: AnalysisConfig) -> Result<(), AppError> {
    if args.no_refine {
        config.arrhenius.refine = false;
    }

    let input = read_arrhenius_points(&args.input, args.column)?;
    let fit = fit_arrhenius(&input.points, args.min_r2, &config)?;
    println!(
        "{}",
        report::format_arrhenius(&fit, &input.column, config.constants.faraday)
    );

    if let Some(path) = &args.params {
        write_params_csv(path, &fit, config.constants.faraday)?;
        println!("Wrote {}", path.display());
    }
    if let Some(path) = &args.extrapolate {
        let grid = config.temperatures.dsa.values();
        let curve = extrapolate(&fit.params, &grid, config.constants.gas_constant);
        write_curve_csv(path, &curve)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn handle_dsa(args: DsaArgs, mut config: AnalysisConfig) -> Result<(), AppError> {
    if let Some(f) = args.pipe_factor {
        config.dsa.pipe_factor = f;
        config.validate()?;
    }

    let curve = read_diffusivity_curve(&args.input)?;
    let grid = config.temperatures.dsa.values();
    let results = sweep(&curve, &grid, &config)?;
    println!("{}", report::format_dsa_windows(&results));

    if let Some(dir) = &args.out_dir {
        let paths = write_scenario_csvs(dir, &results)?;
        println!("Wrote {} scenario table(s) to {}", paths.len(), dir.display());
    }
    Ok(())
}

fn handle_run(args: RunArgs, mut config: AnalysisConfig) -> Result<(), AppError> {
    if args.no_refine {
        config.arrhenius.refine = false;
    }
    if let Some(f) = args.pipe_factor {
        config.dsa.pipe_factor = f;
    }
    apply_msd_overrides(&mut config, &args.msd)?;

    let run = pipeline::run_pipeline(&args.dir, args.source.into(), &config)?;

    println!("{}", report::format_diffusivity_table(&run.batch.table, &run.batch.skipped));
    println!(
        "{}",
        report::format_arrhenius(&run.fit, run.source.label(), config.constants.faraday)
    );
    println!("{}", report::format_dsa_windows(&run.scenarios));
    if !run.length_scales.is_ok() {
        println!("{}", report::format_length_scales(&run.length_scales));
    }

    let files = pipeline::write_outputs(&run, &args.dir, &args.out_dir, &config)?;
    println!("Wrote results to {} (summary: {})", args.out_dir.display(), files.summary.display());
    Ok(())
}

fn handle_synth(args: SynthArgs, config: AnalysisConfig) -> Result<(), AppError> {
    let law = |d0, q| ArrheniusParameters {
        d0,
        d0_err: 0.0,
        q,
        q_err: 0.0,
    };
    let spec = SynthSpec {
        solute: law(args.d0_mg, args.q_mg),
        solvent: law(args.d0_al, args.q_al),
        steps: args.steps,
        stride: args.stride,
        noise_ang2: args.noise,
        seed: args.seed,
    };
    let paths = write_msd_files(&args.out_dir, &config, &spec)?;
    println!("Wrote {} MSD file(s) to {}", paths.len(), args.out_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Axis;

    #[test]
    fn explicit_config_wins_over_environment() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.toml");
        let b = dir.path().join("b.toml");
        std::fs::write(&a, "[dsa]\npipe_factor = 2.0\n").unwrap();
        std::fs::write(&b, "[dsa]\npipe_factor = 3.0\n").unwrap();

        let config = resolve_config(Some(&a), Some(&b)).unwrap();
        assert_eq!(config.dsa.pipe_factor, 2.0);
        let config = resolve_config(None, Some(&b)).unwrap();
        assert_eq!(config.dsa.pipe_factor, 3.0);
        assert_eq!(resolve_config(None, None).unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn check_defaults_to_z_with_stricter_cut() {
        let o = check_overrides(&MsdOverrides::default());
        assert_eq!(o.axis, Some(Axis::Z));
        assert_eq!(o.discard, Some(0.2));

        let explicit = MsdOverrides {
            axis: Some(Axis::Total),
            discard: Some(0.1),
            timestep: Some(0.002),
        };
        let o = check_overrides(&explicit);
        assert_eq!(o.axis, Some(Axis::Total));
        assert_eq!(o.discard, Some(0.1));
        assert_eq!(o.timestep, Some(0.002));
    }

    #[test]
    fn overrides_are_validated() {
        let mut config = AnalysisConfig::default();
        let ok = MsdOverrides {
            axis: Some(Axis::Z),
            discard: Some(0.2),
            timestep: None,
        };
        apply_msd_overrides(&mut config, &ok).unwrap();
        assert_eq!(config.msd.axis, Axis::Z);
        assert_eq!(config.msd.discard_fraction, 0.2);

        let bad = MsdOverrides {
            discard: Some(1.0),
            ..MsdOverrides::default()
        };
        assert!(matches!(
            apply_msd_overrides(&mut config, &bad),
            Err(EngineError::Config(_))
        ));
    }
}
