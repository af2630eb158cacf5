//! Default physical constants and analysis settings for Al-5wt%Mg.

use crate::domain::Axis;

/// Gas constant R (J/(mol·K)).
pub const GAS_CONSTANT: f64 = 8.314;
/// Boltzmann constant (eV/K).
pub const BOLTZMANN_EV: f64 = 8.617e-5;
/// Faraday constant (C/mol); `Q[eV] = Q[J/mol] / FARADAY`.
pub const FARADAY: f64 = 96485.0;

/// Burgers vector of Al (m).
pub const BURGERS_VECTOR: f64 = 2.86e-10;
/// Strain rate (s⁻¹).
pub const STRAIN_RATE: f64 = 1e-3;

/// 5 wt% Mg ≈ 5.52 at% Mg.
pub const SOLUTE_FRACTION: f64 = 0.0552;

/// 1 fs in LAMMPS metal units (ps).
pub const TIMESTEP_PS: f64 = 0.001;
pub const MSD_HEADER_LINES: usize = 3;
pub const DISCARD_FRACTION: f64 = 0.1;
pub const MIN_MSD_POINTS: usize = 10;
/// Quick-check transient cut and component.
pub const CHECK_DISCARD_FRACTION: f64 = 0.2;
pub const CHECK_AXIS: Axis = Axis::Z;

pub const R2_THRESHOLD: f64 = 0.95;
pub const R2_WARN: f64 = 0.8;

pub const MD_TEMPERATURES: [f64; 3] = [500.0, 600.0, 700.0];
pub const DSA_T_START: f64 = 300.0;
pub const DSA_T_STOP: f64 = 450.0;
pub const DSA_T_POINTS: usize = 16;

pub const MIN_ARRHENIUS_POINTS: usize = 3;
pub const LM_MAX_ITERATIONS: usize = 200;
pub const LM_TOLERANCE: f64 = 1e-10;

/// Mobile dislocation densities (m⁻²).
pub const MOBILE_DENSITIES: [f64; 3] = [1e12, 1e13, 1e14];
/// Capture radii L_c (m): 1, 2, 5 nm.
pub const CAPTURE_RADII: [f64; 3] = [1.0e-9, 2.0e-9, 5.0e-9];
/// Travel distances L_t (m): 0.1, 1, 10 µm.
pub const TRAVEL_DISTANCES: [f64; 3] = [0.1e-6, 1.0e-6, 10.0e-6];
/// Pipe-diffusion enhancement; 1.0 doubles the bulk diffusivity.
pub const PIPE_FACTOR: f64 = 1.0;

pub const RATIO_LOWER: f64 = 0.1;
pub const RATIO_UPPER: f64 = 10.0;

/// Literature range of L_c for Al-Mg (m).
pub const CAPTURE_RADIUS_RANGE: (f64, f64) = (1.0e-9, 5.0e-9);
/// Literature range of L_t for Al-Mg (m).
pub const TRAVEL_DISTANCE_RANGE: (f64, f64) = (0.1e-6, 10.0e-6);
