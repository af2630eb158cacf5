//! Validity gate applied to estimator output.
//!
//! A diffusivity is valid only if `r² >= threshold` AND `D > 0`. Anything else is
//! kept in the table for inspection but marked invalid, with a log record.

use tracing::warn;

use crate::domain::{DiffusivityRecord, FitResult, RecordStatus, Species};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidityGate {
    pub r2_threshold: f64,
}

impl ValidityGate {
    pub fn new(r2_threshold: f64) -> Self {
        Self { r2_threshold }
    }

    pub fn status(&self, fit: Option<&FitResult>) -> RecordStatus {
        match fit {
            None => RecordStatus::InsufficientData,
            Some(f) if !(f.diffusivity > 0.0) => RecordStatus::NonPositive,
            Some(f) if !(f.r_squared >= self.r2_threshold) => RecordStatus::PoorFit,
            Some(_) => RecordStatus::Valid,
        }
    }

    /// Gate one estimator result into a record, logging rejections.
    pub fn record(&self, temperature: f64, species: Species, fit: Option<FitResult>) -> DiffusivityRecord {
        let status = self.status(fit.as_ref());
        match (status, fit.as_ref()) {
            (RecordStatus::NonPositive, Some(f)) => warn!(
                temperature,
                species = species.label(),
                d = f.diffusivity,
                "non-positive diffusivity; marking invalid"
            ),
            (RecordStatus::PoorFit, Some(f)) => warn!(
                temperature,
                species = species.label(),
                r2 = f.r_squared,
                threshold = self.r2_threshold,
                "MSD fit below r² threshold; marking invalid"
            ),
            _ => {}
        }
        DiffusivityRecord {
            temperature,
            species,
            fit,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Dimensionality;

    fn fit(d: f64, r2: f64) -> FitResult {
        FitResult {
            slope: 6.0 * d,
            intercept: 0.0,
            r_squared: r2,
            std_err: 0.0,
            intercept_std_err: 0.0,
            diffusivity: d,
            diffusivity_err: 0.0,
            n_points_used: 50,
            dimensionality: Dimensionality::Three,
        }
    }

    #[test]
    fn gate_requires_both_conditions() {
        let gate = ValidityGate::new(0.95);
        assert_eq!(gate.status(Some(&fit(1e-12, 0.99))), RecordStatus::Valid);
        assert_eq!(gate.status(Some(&fit(1e-12, 0.95))), RecordStatus::Valid);
        assert_eq!(gate.status(Some(&fit(1e-12, 0.94))), RecordStatus::PoorFit);
        assert_eq!(gate.status(Some(&fit(0.0, 0.99))), RecordStatus::NonPositive);
        assert_eq!(gate.status(Some(&fit(-1e-12, 0.99))), RecordStatus::NonPositive);
        assert_eq!(gate.status(None), RecordStatus::InsufficientData);
    }

    #[test]
    fn nan_values_never_pass() {
        let gate = ValidityGate::new(0.95);
        assert_ne!(gate.status(Some(&fit(f64::NAN, 0.99))), RecordStatus::Valid);
        assert_ne!(gate.status(Some(&fit(1e-12, f64::NAN))), RecordStatus::Valid);
    }

    #[test]
    fn rejected_records_keep_their_fit() {
        let gate = ValidityGate::new(0.95);
        let rec = gate.record(500.0, Species::Mg, Some(fit(-2e-12, 0.99)));
        assert!(!rec.is_valid());
        assert_eq!(rec.d(), Some(-2e-12));
    }
}
