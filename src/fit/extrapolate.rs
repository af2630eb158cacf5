//! Evaluate a fitted Arrhenius law on a temperature grid.

use tracing::debug;

use crate::domain::{ArrheniusParameters, CurvePoint};

/// `D(T)` at every grid temperature, in grid order.
///
/// Temperatures outside the fitted range are allowed; callers that care can
/// compare against [`crate::domain::ArrheniusFit::t_min`] / `t_max`.
pub fn extrapolate(params: &ArrheniusParameters, temperatures: &[f64], gas_constant: f64) -> Vec<CurvePoint> {
    let curve: Vec<CurvePoint> = temperatures
        .iter()
        .map(|&temperature| CurvePoint {
            temperature,
            d: params.evaluate(temperature, gas_constant),
        })
        .collect();
    debug!(points = curve.len(), "extrapolated D(T)");
    curve
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemperatureGrid;

    #[test]
    fn curve_follows_grid_and_is_monotone() {
        let params = ArrheniusParameters {
            d0: 1e-5,
            d0_err: 0.0,
            q: 130_000.0,
            q_err: 0.0,
        };
        let grid = TemperatureGrid {
            start: 300.0,
            stop: 450.0,
            points: 16,
        }
        .values();
        let curve = extrapolate(&params, &grid, 8.314);
        assert_eq!(curve.len(), 16);
        assert_eq!(curve[0].temperature, 300.0);
        assert_eq!(curve[15].temperature, 450.0);
        assert!(curve.windows(2).all(|w| w[1].d > w[0].d));
        let expected = 1e-5 * (-130_000.0_f64 / (8.314 * 300.0)).exp();
        assert!((curve[0].d - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn empty_grid_gives_empty_curve() {
        let params = ArrheniusParameters {
            d0: 1.0,
            d0_err: 0.0,
            q: 1.0,
            q_err: 0.0,
        };
        assert!(extrapolate(&params, &[], 8.314).is_empty());
    }
}
