//! Sanity checks on the capture radius / travel distance sets.
//!
//! L_c (nm) should sit well below L_t (µm), and both should fall in the
//! ranges reported for Al-Mg. Violations are warnings only.

use serde::Serialize;

use crate::config::{CAPTURE_RADIUS_RANGE, DsaConfig, TRAVEL_DISTANCE_RANGE};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthScaleReport {
    /// `(min, max)` capture radius (m).
    pub capture_radius: (f64, f64),
    /// `(min, max)` travel distance (m).
    pub travel_distance: (f64, f64),
    /// `min(L_t) / max(L_c)`.
    pub separation: f64,
    pub capture_in_literature_range: bool,
    pub travel_in_literature_range: bool,
    pub warnings: Vec<String>,
}

impl LengthScaleReport {
    pub fn is_ok(&self) -> bool {
        self.warnings.is_empty()
    }
}

fn span(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

fn within((lo, hi): (f64, f64), (min, max): (f64, f64)) -> bool {
    lo >= min && hi <= max
}

pub fn validate_length_scales(config: &DsaConfig) -> LengthScaleReport {
    let capture = span(&config.capture_radii);
    let travel = span(&config.travel_distances);
    let separation = travel.0 / capture.1;
    let capture_ok = within(capture, CAPTURE_RADIUS_RANGE);
    let travel_ok = within(travel, TRAVEL_DISTANCE_RANGE);

    let mut warnings = Vec::new();
    if !(capture.1 < travel.0) {
        warnings.push(format!(
            "largest capture radius ({:.3e} m) is not below smallest travel distance ({:.3e} m)",
            capture.1, travel.0
        ));
    }
    if !capture_ok {
        warnings.push(format!(
            "capture radii {:.3}-{:.3} nm outside typical range {:.1}-{:.1} nm",
            capture.0 * 1e9,
            capture.1 * 1e9,
            CAPTURE_RADIUS_RANGE.0 * 1e9,
            CAPTURE_RADIUS_RANGE.1 * 1e9
        ));
    }
    if !travel_ok {
        warnings.push(format!(
            "travel distances {:.3}-{:.3} um outside typical range {:.1}-{:.1} um",
            travel.0 * 1e6,
            travel.1 * 1e6,
            TRAVEL_DISTANCE_RANGE.0 * 1e6,
            TRAVEL_DISTANCE_RANGE.1 * 1e6
        ));
    }

    LengthScaleReport {
        capture_radius: capture,
        travel_distance: travel,
        separation,
        capture_in_literature_range: capture_ok,
        travel_in_literature_range: travel_ok,
        warnings,
    }
}
