//! Data sources that are not read from disk.

pub mod synth;

pub use synth::*;
