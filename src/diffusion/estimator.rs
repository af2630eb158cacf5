//! Diffusion coefficient from an MSD time series (Einstein relation).
//!
//! ```text
//! MSD(t) ≈ 2 d D t + c     →     D = slope / (2d)
//! ```
//!
//! Steps:
//! 1. drop the first `floor(N * discard_fraction)` samples (count-based, not time-based)
//! 2. drop samples whose time or MSD is not finite
//! 3. require at least `min_points` samples
//! 4. convert to SI (Å² → m², ps → s) and regress MSD on time
//!
//! The estimator never applies the validity gate; see [`super::gate`].

use tracing::debug;

use crate::config::MsdConfig;
use crate::domain::{Dimensionality, FitResult};
use crate::math::fit_line;

const ANGSTROM2_TO_M2: f64 = 1e-20;
const PS_TO_S: f64 = 1e-12;

/// Estimator settings resolved from [`MsdConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffusivityEstimator {
    pub timestep_ps: f64,
    pub discard_fraction: f64,
    pub min_points: usize,
}

impl DiffusivityEstimator {
    pub fn new(timestep_ps: f64, discard_fraction: f64, min_points: usize) -> Self {
        Self {
            timestep_ps,
            discard_fraction,
            min_points,
        }
    }

    pub fn from_config(msd: &MsdConfig) -> Self {
        Self::new(msd.timestep_ps, msd.discard_fraction, msd.min_points)
    }

    /// Number of leading samples treated as transient.
    pub fn discard_count(&self, n: usize) -> usize {
        (n as f64 * self.discard_fraction).floor() as usize
    }

    /// Regress one MSD column (Å²) against simulation steps.
    ///
    /// Returns `None` ("insufficient data") when fewer than `min_points` usable
    /// samples remain, including the all-NaN column of an absent species.
    pub fn estimate(&self, steps: &[f64], msd_ang2: &[f64], dim: Dimensionality) -> Option<FitResult> {
        let n = steps.len().min(msd_ang2.len());
        let start = self.discard_count(n);

        let (time_s, msd_m2): (Vec<f64>, Vec<f64>) = steps[start..n]
            .iter()
            .zip(&msd_ang2[start..n])
            .filter(|(s, m)| s.is_finite() && m.is_finite())
            .map(|(&s, &m)| (s * self.timestep_ps * PS_TO_S, m * ANGSTROM2_TO_M2))
            .unzip();

        if time_s.len() < self.min_points {
            debug!(
                total = n,
                discarded = start,
                usable = time_s.len(),
                required = self.min_points,
                "insufficient MSD samples"
            );
            return None;
        }

        let line = fit_line(&time_s, &msd_m2)?;
        let divisor = dim.einstein_divisor();

        Some(FitResult {
            slope: line.slope,
            intercept: line.intercept,
            r_squared: line.r_squared,
            std_err: line.slope_std_err,
            intercept_std_err: line.intercept_std_err,
            diffusivity: line.slope / divisor,
            diffusivity_err: line.slope_std_err / divisor,
            n_points_used: time_s.len(),
            dimensionality: dim,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> DiffusivityEstimator {
        DiffusivityEstimator::new(0.001, 0.1, 10)
    }

    /// MSD (Å²) for diffusivity `d` (m²/s) at each step.
    fn synthetic(d: f64, dim: Dimensionality, n: usize, stride: f64) -> (Vec<f64>, Vec<f64>) {
        let steps: Vec<f64> = (0..n).map(|i| i as f64 * stride).collect();
        let msd = steps
            .iter()
            .map(|s| 2.0 * dim.d() * d * s * 0.001 * 1e-12 / 1e-20)
            .collect();
        (steps, msd)
    }

    #[test]
    fn recovers_exact_diffusivity_3d() {
        let d = 2.5e-10;
        let (steps, msd) = synthetic(d, Dimensionality::Three, 100, 1000.0);
        let fit = estimator().estimate(&steps, &msd, Dimensionality::Three).unwrap();
        assert!((fit.diffusivity - d).abs() / d < 1e-9);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert_eq!(fit.n_points_used, 90);
        assert!((fit.diffusivity - fit.slope / 6.0).abs() < 1e-30);
    }

    #[test]
    fn recovers_exact_diffusivity_1d() {
        let d = 7.0e-11;
        let (steps, msd) = synthetic(d, Dimensionality::One, 40, 500.0);
        let fit = estimator().estimate(&steps, &msd, Dimensionality::One).unwrap();
        assert!((fit.diffusivity - d).abs() / d < 1e-9);
        assert!((fit.diffusivity - fit.slope / 2.0).abs() < 1e-30);
    }

    #[test]
    fn discard_is_count_based() {
        let est = DiffusivityEstimator::new(0.001, 0.2, 10);
        assert_eq!(est.discard_count(11), 2);
        assert_eq!(est.discard_count(100), 20);
        assert_eq!(est.discard_count(4), 0);
    }

    #[test]
    fn short_series_is_insufficient() {
        // 11 samples, 10% discard → floor(1.1) = 1 dropped → 10 remain: enough.
        let (steps, msd) = synthetic(1e-10, Dimensionality::Three, 11, 100.0);
        assert!(estimator().estimate(&steps, &msd, Dimensionality::Three).is_some());

        // 10 samples → 1 dropped → 9 remain: insufficient.
        let (steps, msd) = synthetic(1e-10, Dimensionality::Three, 10, 100.0);
        assert!(estimator().estimate(&steps, &msd, Dimensionality::Three).is_none());
    }

    #[test]
    fn all_nan_column_is_insufficient() {
        let steps: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let msd = vec![f64::NAN; 50];
        assert!(estimator().estimate(&steps, &msd, Dimensionality::Three).is_none());
    }

    #[test]
    fn nan_cells_are_skipped_not_fatal() {
        let d = 1e-10;
        let (steps, mut msd) = synthetic(d, Dimensionality::Three, 40, 100.0);
        msd[20] = f64::NAN;
        msd[30] = f64::NAN;
        let fit = estimator().estimate(&steps, &msd, Dimensionality::Three).unwrap();
        assert_eq!(fit.n_points_used, 40 - 4 - 2);
        assert!((fit.diffusivity - d).abs() / d < 1e-9);
    }

    #[test]
    fn negative_slope_is_reported_not_rejected() {
        let steps: Vec<f64> = (0..30).map(|i| i as f64 * 100.0).collect();
        let msd: Vec<f64> = steps.iter().map(|s| 10.0 - s * 1e-4).collect();
        let fit = estimator().estimate(&steps, &msd, Dimensionality::Three).unwrap();
        assert!(fit.diffusivity < 0.0);
    }
}
