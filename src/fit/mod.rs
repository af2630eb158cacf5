//! Arrhenius fitting and extrapolation.
//!
//! Responsibilities:
//!
//! - fit `D0`, `Q` from per-temperature diffusivities (`arrhenius`)
//! - evaluate the fitted law on the DSA temperature grid (`extrapolate`)

pub mod arrhenius;
pub mod extrapolate;

pub use arrhenius::*;
pub use extrapolate::*;
