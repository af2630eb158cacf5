//! Input/output helpers.
//!
//! - MSD time-series parsing with schema detection (`msd`)
//! - diffusivity / curve CSV ingest (`table`)
//! - result exports (CSV/JSON) (`export`)

pub mod export;
pub mod msd;
pub mod table;

pub use export::*;
pub use msd::*;
pub use table::*;
