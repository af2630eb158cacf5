//! Mathematical utilities: least squares, line fits, interpolation.

pub mod interp;
pub mod ols;

pub use interp::*;
pub use ols::*;
