//! DSA regime analysis.
//!
//! - scenario set generation (`scenario`)
//! - per-scenario timescale tables and classification (`sweep`)
//! - capture/travel length-scale sanity checks (`length_scales`)

pub mod length_scales;
pub mod scenario;
pub mod sweep;

pub use length_scales::*;
pub use scenario::*;
pub use sweep::*;
