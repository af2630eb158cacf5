//! Scenario generation for the DSA sweep.

use std::fmt;

use crate::config::DsaConfig;
use crate::domain::DsaScenario;

/// Cartesian product of the configured sets.
///
/// Order is fixed: mobile density outermost, then capture radius, then travel
/// distance. Sweep output follows the same order.
pub fn generate_scenarios(config: &DsaConfig) -> Vec<DsaScenario> {
    let mut scenarios = Vec::with_capacity(
        config.mobile_densities.len() * config.capture_radii.len() * config.travel_distances.len(),
    );
    for &mobile_density in &config.mobile_densities {
        for &capture_radius in &config.capture_radii {
            for &travel_distance in &config.travel_distances {
                scenarios.push(DsaScenario {
                    mobile_density,
                    capture_radius,
                    travel_distance,
                });
            }
        }
    }
    scenarios
}

impl DsaScenario {
    /// Capture radius in nm, rounded to 1e-6 nm.
    pub fn capture_radius_nm(&self) -> f64 {
        round6(self.capture_radius * 1e9)
    }

    /// Travel distance in µm, rounded to 1e-6 µm.
    pub fn travel_distance_um(&self) -> f64 {
        round6(self.travel_distance * 1e6)
    }
}

fn round6(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}

impl fmt::Display for DsaScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rho={:.0e} m^-2, L_c={} nm, L_t={} um",
            self.mobile_density,
            self.capture_radius_nm(),
            self.travel_distance_um()
        )
    }
}
