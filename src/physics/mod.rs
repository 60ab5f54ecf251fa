//! Physical constants, unit conversions, and closed-form orbital quantities.
//!
//! Everything the fit and uncertainty stages need from physics is either a
//! fixed conversion constant or a field of [`PhysicsConfig`]. The config is
//! passed explicitly into each stage so tests can run with alternate star
//! masses, rest wavelengths, and minimizer seeds.

use crate::domain::{DerivedQuantities, Measurement, ModelParameters, RvPoint};

/// Speed of light in vacuum (m/s, exact).
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Rest wavelength of the observed spectral line, H-alpha (m).
pub const H_ALPHA_WAVELENGTH: f64 = 656.281e-9;

/// CODATA gravitational constant (N m^2 / kg^2).
pub const GRAVITATIONAL_CONSTANT: f64 = 6.674_30e-11;

/// Solar mass (kg).
pub const SOLAR_MASS: f64 = 1.989e30;

/// Mass of the observed star in solar masses.
pub const STAR_MASS_SOLAR: f64 = 2.78;

/// Mean year length used by the input tables (s).
pub const YEARS_TO_SECONDS: f64 = 3.154e7;

/// Nanometers to meters.
pub const NANOMETERS_TO_METERS: f64 = 1e-9;

/// Astronomical unit (m, IAU 2012 definition).
pub const ASTRONOMICAL_UNIT: f64 = 149_597_870_700.0;

/// Jovian mass (kg).
pub const JOVIAN_MASS: f64 = 1.8986e27;

/// Default minimizer seed: star velocity amplitude (m/s).
pub const SPEED_STAR_START: f64 = 50.0;

/// Default minimizer seed: orbital angular speed (rad/s).
pub const ANGULAR_SPEED_START: f64 = 3e-8;

/// Default minimizer seed: phase (rad).
pub const PHASE_START: f64 = 3.0;

/// Process-wide physical parameters and minimizer seeds.
///
/// Defaults reproduce the published analysis; the CLI can override the star
/// mass, rest wavelength, and seeds for other systems.
#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    pub speed_of_light: f64,
    /// Rest wavelength of the tracked line (m).
    pub rest_wavelength: f64,
    pub gravitational_constant: f64,
    /// Stellar mass (kg).
    pub star_mass: f64,
    pub speed_star_start: f64,
    pub angular_speed_start: f64,
    pub phase_start: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            speed_of_light: SPEED_OF_LIGHT,
            rest_wavelength: H_ALPHA_WAVELENGTH,
            gravitational_constant: GRAVITATIONAL_CONSTANT,
            star_mass: STAR_MASS_SOLAR * SOLAR_MASS,
            speed_star_start: SPEED_STAR_START,
            angular_speed_start: ANGULAR_SPEED_START,
            phase_start: PHASE_START,
        }
    }
}

impl PhysicsConfig {
    /// `G * M_star`, the gravitational parameter of the star.
    pub fn gravitational_parameter(&self) -> f64 {
        self.gravitational_constant * self.star_mass
    }

    /// Doppler gain `c / lambda_0`: velocity change per unit wavelength shift.
    pub fn doppler_gain(&self) -> f64 {
        self.speed_of_light / self.rest_wavelength
    }
}

/// Line-of-sight star velocity (m/s) from the observed wavelength (m).
///
/// Non-relativistic Doppler: `v = c * (lambda / lambda_0 - 1)`.
pub fn radial_velocity(config: &PhysicsConfig, observed_wavelength: f64) -> f64 {
    config.speed_of_light * (observed_wavelength / config.rest_wavelength - 1.0)
}

/// Velocity uncertainty (m/s) propagated from the wavelength uncertainty (m).
pub fn radial_velocity_sigma(config: &PhysicsConfig, wavelength_sigma: f64) -> f64 {
    (config.doppler_gain() * wavelength_sigma).abs()
}

/// Convert ingested measurements (years, nm) to radial-velocity points (s, m/s).
pub fn to_rv_points(config: &PhysicsConfig, measurements: &[Measurement]) -> Vec<RvPoint> {
    measurements
        .iter()
        .map(|m| RvPoint {
            time_s: m.time_years * YEARS_TO_SECONDS,
            velocity_ms: radial_velocity(config, m.wavelength_nm * NANOMETERS_TO_METERS),
            uncertainty_ms: radial_velocity_sigma(config, m.uncertainty_nm * NANOMETERS_TO_METERS),
        })
        .collect()
}

/// Planet orbital distance from Kepler's third law: `r = cbrt(G M / w^2)`.
///
/// Blows up as `w -> 0`; the degeneracy policy in the pipeline decides whether
/// that propagates or aborts.
pub fn orbital_distance(config: &PhysicsConfig, angular_speed: f64) -> f64 {
    (config.gravitational_parameter() / (angular_speed * angular_speed)).cbrt()
}

/// Circular orbital speed of the planet at distance `r`: `vp = sqrt(G M / r)`.
pub fn planet_velocity(config: &PhysicsConfig, orbital_distance: f64) -> f64 {
    (config.gravitational_parameter() / orbital_distance).sqrt()
}

/// Planet mass from momentum balance: `Mp = M_star * v0 / vp`.
pub fn planet_mass(config: &PhysicsConfig, speed_star: f64, planet_velocity: f64) -> f64 {
    config.star_mass * speed_star / planet_velocity
}

/// Compute all derived quantities from the final fitted parameters.
pub fn derive(config: &PhysicsConfig, parameters: &ModelParameters) -> DerivedQuantities {
    let distance = orbital_distance(config, parameters.angular_speed);
    let velocity = planet_velocity(config, distance);
    let mass = planet_mass(config, parameters.speed_star, velocity);
    DerivedQuantities {
        orbital_distance_m: distance,
        planet_velocity_ms: velocity,
        planet_mass_kg: mass,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbital_distance_matches_analytic_cube_root() {
        let config = PhysicsConfig::default();
        let w = 2e-8;
        let expected = (config.gravitational_parameter() / (w * w)).powf(1.0 / 3.0);
        let got = orbital_distance(&config, w);
        assert!((got - expected).abs() / expected < 1e-14);
        // Sanity: a few AU for a Jupiter-like orbit around a 2.78 M_sun star.
        assert!(got / ASTRONOMICAL_UNIT > 1.0 && got / ASTRONOMICAL_UNIT < 10.0);
    }

    #[test]
    fn planet_velocity_diverges_for_vanishing_distance() {
        let config = PhysicsConfig::default();
        // Large-but-finite sentinel for the r -> 0+ degeneracy.
        let vp = planet_velocity(&config, 1e-12);
        assert!(vp.is_finite());
        assert!(vp > 1e15);
    }

    #[test]
    fn radial_velocity_is_zero_at_rest_wavelength() {
        let config = PhysicsConfig::default();
        let v = radial_velocity(&config, config.rest_wavelength);
        assert!(v.abs() < 1e-9);
    }

    #[test]
    fn radial_velocity_sign_follows_shift_direction() {
        let config = PhysicsConfig::default();
        assert!(radial_velocity(&config, config.rest_wavelength * (1.0 + 1e-7)) > 0.0);
        assert!(radial_velocity(&config, config.rest_wavelength * (1.0 - 1e-7)) < 0.0);
    }

    #[test]
    fn derive_is_consistent_with_component_formulas() {
        let config = PhysicsConfig::default();
        let params = ModelParameters {
            speed_star: 50.0,
            angular_speed: 3e-8,
            phase: 3.0,
        };
        let d = derive(&config, &params);
        let r = orbital_distance(&config, params.angular_speed);
        assert_eq!(d.orbital_distance_m, r);
        assert_eq!(d.planet_velocity_ms, planet_velocity(&config, r));
        assert!(d.planet_mass_kg > 0.0);
    }
}
