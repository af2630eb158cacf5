//! Diffusivity extraction from MSD time series.
//!
//! Responsibilities:
//!
//! - regress MSD vs time and apply the Einstein relation (`estimator`)
//! - gate results on r² and sign (`gate`)
//! - combine per-species values into an interdiffusivity (`combine`)
//! - run the above over all MD temperatures (`batch`)
//! - grade MSD linearity for quick inspection (`quality`)

pub mod batch;
pub mod combine;
pub mod estimator;
pub mod gate;
pub mod quality;

pub use batch::*;
pub use combine::*;
pub use estimator::*;
pub use gate::*;
pub use quality::*;
