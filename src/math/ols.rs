//! Ordinary least squares for straight lines.
//!
//! Both regressions in the pipeline are straight-line fits:
//!
//! ```text
//! MSD(t)  = slope * t + intercept          (Einstein relation)
//! ln D(T) = ln D0 - (Q/R) * (1/T)          (linearized Arrhenius law)
//! ```
//!
//! Implementation choices:
//! - We center `x` before building the design matrix. MSD times are ~1e-10 s and
//!   inverse temperatures ~1e-3 K⁻¹, so the raw `[1, x]` columns are badly scaled.
//! - The solve goes through SVD (robust for tall systems); the parameter
//!   covariance is `σ² (XᵀX)⁻¹` with `σ² = SSR / (n - 2)`.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Straight-line fit with the usual regression statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    /// Squared Pearson correlation (coefficient of determination).
    pub r_squared: f64,
    pub slope_std_err: f64,
    pub intercept_std_err: f64,
    pub n: usize,
}

/// Fit `y = slope * x + intercept` by ordinary least squares.
///
/// Returns `None` for fewer than 2 points, non-finite input, or a degenerate
/// (constant) `x`.
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<LineFit> {
    let n = x.len();
    if n < 2 || y.len() != n {
        return None;
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return None;
    }

    let x_mean = x.iter().sum::<f64>() / n as f64;
    let x_scale = x
        .iter()
        .map(|v| (v - x_mean).abs())
        .fold(0.0_f64, f64::max);
    if !(x_scale > 0.0) {
        return None;
    }

    // Design matrix on the centered, scaled abscissa u = (x - x̄) / s.
    let mut design = DMatrix::<f64>::zeros(n, 2);
    for (i, &xi) in x.iter().enumerate() {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = (xi - x_mean) / x_scale;
    }
    let obs = DVector::from_column_slice(y);
    let beta = solve_least_squares(&design, &obs)?;
    let (a, b) = (beta[0], beta[1]);

    let slope = b / x_scale;
    let intercept = a - slope * x_mean;

    let y_mean = y.iter().sum::<f64>() / n as f64;
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let r = yi - (slope * xi + intercept);
        ss_res += r * r;
        ss_tot += (yi - y_mean) * (yi - y_mean);
    }
    let r_squared = if ss_tot > 0.0 {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    } else {
        // Constant y is perfectly described by a flat line.
        1.0
    };

    // Covariance of (a, b) is σ² (XᵀX)⁻¹; with centered u the matrix is diagonal.
    let (slope_std_err, intercept_std_err) = if n > 2 {
        let sigma2 = ss_res / (n as f64 - 2.0);
        let s_uu: f64 = (0..n).map(|i| design[(i, 1)] * design[(i, 1)]).sum();
        let var_a = sigma2 / n as f64;
        let var_b = sigma2 / s_uu;
        let var_slope = var_b / (x_scale * x_scale);
        let var_intercept = var_a + x_mean * x_mean * var_slope;
        (var_slope.sqrt(), var_intercept.sqrt())
    } else {
        (0.0, 0.0)
    };

    Some(LineFit {
        slope,
        intercept,
        r_squared,
        slope_std_err,
        intercept_std_err,
        n,
    })
}
