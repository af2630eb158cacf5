//! Darken-type interdiffusion coefficient.
//!
//! ```text
//! D̃ = x_A · D_B + x_B · D_A,        x_A + x_B = 1
//! σ(D̃) = sqrt((x_A σ_B)² + (x_B σ_A)²)
//! ```
//!
//! The combination is an AND-gate: if either species is invalid there is no
//! interdiffusivity for that temperature.

use crate::domain::{DiffusivityRecord, InterdiffRecord};

/// Combine species `a` (mole fraction `x_a`) with species `b` (`1 - x_a`).
pub fn interdiffusivity(
    a: &DiffusivityRecord,
    b: &DiffusivityRecord,
    x_a: f64,
) -> Option<InterdiffRecord> {
    if !(a.is_valid() && b.is_valid()) {
        return None;
    }
    let (fa, fb) = (a.fit?, b.fit?);
    let x_b = 1.0 - x_a;

    let d = x_a * fb.diffusivity + x_b * fa.diffusivity;
    let d_err = ((x_a * fb.diffusivity_err).powi(2) + (x_b * fa.diffusivity_err).powi(2)).sqrt();
    Some(InterdiffRecord { d, d_err })
}
