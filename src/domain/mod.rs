//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - species / MSD component selectors (`Species`, `Axis`, `Dimensionality`)
//! - per-temperature diffusivity results (`FitResult`, `DiffusivityRecord`, `DiffusivityTable`)
//! - Arrhenius fit outputs (`ArrheniusParameters`, `ArrheniusFit`, `FitStrategy`)
//! - DSA sweep outputs (`DsaScenario`, `TimescalePoint`, `ScenarioResult`)

pub mod types;

pub use types::*;
