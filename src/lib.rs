//! `almg-dsa` library crate.
//!
//! Turns molecular-dynamics MSD time series of an Al-Mg alloy into diffusion
//! parameters and a prediction of where Dynamic Strain Aging can occur.
//!
//! The binary (`dsa`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - each stage (loader, estimator, combiner, fitter, extrapolator, sweeper) is
//!   usable on its own from other tools

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod diffusion;
pub mod domain;
pub mod dsa;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod report;
