//! Piecewise-linear interpolation with linear extrapolation past both ends.

use crate::error::EngineError;

/// Read-only interpolant over sorted, distinct abscissae.
///
/// Safe to share across threads during the scenario sweep.
#[derive(Debug, Clone)]
pub struct LinearInterpolant {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl LinearInterpolant {
    /// Build from `(x, y)` pairs in any order.
    ///
    /// Rejects non-finite values, duplicate abscissae, and fewer than 2 points:
    /// a single point cannot define a slope to extrapolate with.
    pub fn new(points: &[(f64, f64)]) -> Result<Self, EngineError> {
        if points.iter().any(|(x, y)| !(x.is_finite() && y.is_finite())) {
            return Err(EngineError::InvalidInput(
                "interpolation table contains non-finite values".to_string(),
            ));
        }
        if points.len() < 2 {
            return Err(EngineError::insufficient("interpolation", points.len(), 2));
        }

        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
        if sorted.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(EngineError::InvalidInput(
                "interpolation table has duplicate abscissae".to_string(),
            ));
        }

        let (xs, ys) = sorted.into_iter().unzip();
        Ok(Self { xs, ys })
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        // Segment index: clamp to the first/last segment outside the table.
        let i = match self.xs.partition_point(|&xi| xi <= x) {
            0 => 0,
            k if k >= n => n - 2,
            k => k - 1,
        };
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}
