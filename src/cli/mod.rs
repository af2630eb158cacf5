//! Command-line parsing for the MSD → Arrhenius → DSA analysis engine.
//!
//! Argument parsing and command dispatch stay separate from the numerical code:
//! every subcommand maps onto one `app` handler, and every flag either selects
//! an input/output or overrides one [`crate::config::AnalysisConfig`] value.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::domain::{Axis, DiffusivitySource, Species};
use crate::io::DiffusivityColumn;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "dsa",
    version,
    about = "Diffusivity extraction, Arrhenius fitting and DSA regime analysis for Al-Mg"
)]
pub struct Cli {
    /// TOML analysis config (defaults to $DSA_CONFIG when set).
    #[arg(long, global = true, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Silence all log output.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Also write logs to this file.
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Worker threads for the scenario sweep (default: all cores).
    #[arg(short = 'j', long, global = true)]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract per-temperature diffusivities from MSD files in a directory.
    Msd(MsdArgs),
    /// Grade MSD linearity of individual files (OK / WARN / POOR).
    ///
    /// Defaults to the z component with the first 20% discarded; `--axis` and
    /// `--discard` override both.
    Check(CheckArgs),
    /// Fit an Arrhenius law to a diffusivity CSV.
    Fit(FitArgs),
    /// Sweep DSA scenarios over a T,D curve.
    Dsa(DsaArgs),
    /// Full pipeline: MSD directory to DSA windows, writing every table.
    Run(RunArgs),
    /// Check capture radius / travel distance sets against typical ranges.
    Scales,
    /// Write synthetic MSD files from known Arrhenius parameters.
    Synth(SynthArgs),
}

/// Overrides shared by commands that parse MSD files.
#[derive(Debug, Args, Clone, Default)]
pub struct MsdOverrides {
    /// MSD component to regress.
    #[arg(long, value_enum)]
    pub axis: Option<Axis>,

    /// Fraction of leading samples discarded as transient.
    #[arg(long)]
    pub discard: Option<f64>,

    /// Simulation timestep (ps).
    #[arg(long)]
    pub timestep: Option<f64>,
}

#[derive(Debug, Args)]
pub struct MsdArgs {
    /// Directory containing msd_T{T}.dat files.
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// MD temperatures to analyze (K), comma-separated.
    #[arg(long, value_delimiter = ',')]
    pub temperatures: Option<Vec<f64>>,

    #[command(flatten)]
    pub msd: MsdOverrides,

    /// Write the diffusivity table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// MSD files to check.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub msd: MsdOverrides,
}

#[derive(Debug, Args)]
pub struct FitArgs {
    /// CSV with a T column and diffusivity columns.
    pub input: PathBuf,

    /// Which diffusivity column to fit.
    #[arg(long, value_enum, default_value_t = DiffusivityColumn::Auto)]
    pub column: DiffusivityColumn,

    /// Drop points whose R2 column is below this value.
    #[arg(long)]
    pub min_r2: Option<f64>,

    /// Skip the nonlinear refinement.
    #[arg(long)]
    pub no_refine: bool,

    /// Write fitted parameters to CSV.
    #[arg(long, value_name = "CSV")]
    pub params: Option<PathBuf>,

    /// Write D(T) on the DSA temperature grid to CSV.
    #[arg(long, value_name = "CSV")]
    pub extrapolate: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DsaArgs {
    /// CSV with T and one of D / D_bulk / D_interdiff.
    pub input: PathBuf,

    /// Directory for per-scenario CSVs.
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Pipe-diffusion enhancement factor.
    #[arg(long)]
    pub pipe_factor: Option<f64>,
}

/// Series fed to the Arrhenius fit in the full pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FitSource {
    Interdiff,
    Mg,
    Al,
}

impl From<FitSource> for DiffusivitySource {
    fn from(source: FitSource) -> Self {
        match source {
            FitSource::Interdiff => DiffusivitySource::Interdiff,
            FitSource::Mg => DiffusivitySource::Species(Species::Mg),
            FitSource::Al => DiffusivitySource::Species(Species::Al),
        }
    }
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Directory containing msd_T{T}.dat files.
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Output directory for all tables and the JSON summary.
    #[arg(long, default_value = "results", value_name = "DIR")]
    pub out_dir: PathBuf,

    /// Diffusivity series to fit.
    #[arg(long, value_enum, default_value_t = FitSource::Interdiff)]
    pub source: FitSource,

    #[command(flatten)]
    pub msd: MsdOverrides,

    /// Skip the nonlinear refinement.
    #[arg(long)]
    pub no_refine: bool,

    /// Pipe-diffusion enhancement factor.
    #[arg(long)]
    pub pipe_factor: Option<f64>,
}

#[derive(Debug, Args)]
pub struct SynthArgs {
    /// Output directory.
    pub out_dir: PathBuf,

    /// Mg pre-exponential factor (m^2/s).
    #[arg(long, default_value_t = 1e-6)]
    pub d0_mg: f64,

    /// Mg activation energy (J/mol).
    #[arg(long, default_value_t = 80_000.0)]
    pub q_mg: f64,

    /// Al pre-exponential factor (m^2/s).
    #[arg(long, default_value_t = 5e-7)]
    pub d0_al: f64,

    /// Al activation energy (J/mol).
    #[arg(long, default_value_t = 90_000.0)]
    pub q_al: f64,

    /// Rows per file.
    #[arg(long, default_value_t = 500)]
    pub steps: usize,

    /// Timestep increment between rows.
    #[arg(long, default_value_t = 1000)]
    pub stride: u64,

    /// Gaussian noise standard deviation (A^2).
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
