//! Parameter uncertainties from the chi-squared surface, plus analytic
//! first-order propagation into the derived physical quantities.
//!
//! The surface is evaluated on a fixed 2D grid of (speed_star,
//! angular_speed) values centered on the final fit, with the phase pinned.
//! Parameter uncertainty is half the span of the `chi2_min + 1` contour
//! along each axis, independently. That axis-aligned bounding box is a
//! known approximation (the true joint-confidence region is a tilted
//! ellipse); it is reproduced as-is for parity with the published analysis.
//!
//! The +2.3 / +5.99 / +9.21 levels are evaluated for the contour plot only.

use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::domain::{FitResult, ModelParameters, RvPoint};
use crate::error::AppError;
use crate::fit::chi_squared;
use crate::physics::PhysicsConfig;

/// Chi-squared offsets defining the 1-sigma (single parameter), 1/2/3-sigma
/// (two parameter) joint confidence levels.
pub const LEVEL_OFFSETS: [f64; 4] = [1.0, 2.3, 5.99, 9.21];

/// Grid-evaluated chi-squared surface over (speed_star, angular_speed).
///
/// `values[(i, j)]` is the chi-squared at `angular_axis[i]`, `speed_axis[j]`.
#[derive(Debug, Clone)]
pub struct ChiSquaredSurface {
    pub speed_axis: Vec<f64>,
    pub angular_axis: Vec<f64>,
    pub values: DMatrix<f64>,
    pub min_chi_squared: f64,
}

/// Axis-aligned bounding box of one contour level.
#[derive(Debug, Clone, Copy)]
pub struct ContourBounds {
    pub speed_min: f64,
    pub speed_max: f64,
    pub angular_min: f64,
    pub angular_max: f64,
}

impl ContourBounds {
    pub fn speed_half_width(&self) -> f64 {
        (self.speed_max - self.speed_min) / 2.0
    }

    pub fn angular_half_width(&self) -> f64 {
        (self.angular_max - self.angular_min) / 2.0
    }
}

impl ChiSquaredSurface {
    /// Evaluate the surface around the final fit.
    ///
    /// The window is `fit.speed_star +/- speed_half_width` by
    /// `fit.angular_speed +/- angular_half_width`, sampled `points_per_axis`
    /// times per axis. Rows are evaluated in parallel.
    pub fn evaluate(
        points: &[RvPoint],
        fit: &FitResult,
        speed_half_width: f64,
        angular_half_width: f64,
        points_per_axis: usize,
    ) -> Result<Self, AppError> {
        if points_per_axis < 2 {
            return Err(AppError::input("Contour grid needs at least 2 points per axis."));
        }
        if !(speed_half_width.is_finite()
            && angular_half_width.is_finite()
            && speed_half_width > 0.0
            && angular_half_width > 0.0)
        {
            return Err(AppError::input("Contour window half-widths must be finite and > 0."));
        }

        let center = fit.parameters;
        let speed_axis = linspace(
            center.speed_star - speed_half_width,
            center.speed_star + speed_half_width,
            points_per_axis,
        );
        let angular_axis = linspace(
            center.angular_speed - angular_half_width,
            center.angular_speed + angular_half_width,
            points_per_axis,
        );

        let rows: Vec<Vec<f64>> = angular_axis
            .par_iter()
            .map(|&angular_speed| {
                speed_axis
                    .iter()
                    .map(|&speed_star| {
                        chi_squared(
                            points,
                            &ModelParameters {
                                speed_star,
                                angular_speed,
                                phase: center.phase,
                            },
                        )
                    })
                    .collect()
            })
            .collect();

        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let values = DMatrix::from_row_slice(points_per_axis, points_per_axis, &flat);

        Ok(Self {
            speed_axis,
            angular_axis,
            values,
            min_chi_squared: fit.min_chi_squared,
        })
    }

    /// Points where the surface crosses `level` along grid lines, linearly
    /// interpolated within each cell edge. Used for both the bounding box
    /// and the contour plot.
    pub fn level_crossings(&self, level: f64) -> Vec<(f64, f64)> {
        let mut crossings = Vec::new();
        let (nrows, ncols) = self.values.shape();

        // Horizontal edges: crossings along the speed axis.
        for i in 0..nrows {
            let y = self.angular_axis[i];
            for j in 1..ncols {
                let f0 = self.values[(i, j - 1)];
                let f1 = self.values[(i, j)];
                if let Some(t) = edge_crossing(f0, f1, level) {
                    let x0 = self.speed_axis[j - 1];
                    let x1 = self.speed_axis[j];
                    crossings.push((x0 + t * (x1 - x0), y));
                }
            }
        }

        // Vertical edges: crossings along the angular axis.
        for j in 0..ncols {
            let x = self.speed_axis[j];
            for i in 1..nrows {
                let f0 = self.values[(i - 1, j)];
                let f1 = self.values[(i, j)];
                if let Some(t) = edge_crossing(f0, f1, level) {
                    let y0 = self.angular_axis[i - 1];
                    let y1 = self.angular_axis[i];
                    crossings.push((x, y0 + t * (y1 - y0)));
                }
            }
        }

        crossings
    }

    /// Axis-aligned bounding box of the `level` contour.
    ///
    /// Interior grid nodes at or below the level are included so a level set
    /// saturating the window edge still yields finite bounds. Returns `None`
    /// when the level set is empty (level below the sampled minimum).
    pub fn level_bounds(&self, level: f64) -> Option<ContourBounds> {
        let mut speed_min = f64::INFINITY;
        let mut speed_max = f64::NEG_INFINITY;
        let mut angular_min = f64::INFINITY;
        let mut angular_max = f64::NEG_INFINITY;
        let mut seen = false;

        let mut include = |x: f64, y: f64| {
            speed_min = speed_min.min(x);
            speed_max = speed_max.max(x);
            angular_min = angular_min.min(y);
            angular_max = angular_max.max(y);
            seen = true;
        };

        for (x, y) in self.level_crossings(level) {
            include(x, y);
        }

        let (nrows, ncols) = self.values.shape();
        for i in 0..nrows {
            for j in 0..ncols {
                if self.values[(i, j)] <= level {
                    include(self.speed_axis[j], self.angular_axis[i]);
                }
            }
        }

        if !seen {
            return None;
        }
        Some(ContourBounds {
            speed_min,
            speed_max,
            angular_min,
            angular_max,
        })
    }
}

/// Interpolation parameter in `[0, 1]` where the edge `(f0, f1)` crosses
/// `level`, or `None` if both endpoints are on the same side.
fn edge_crossing(f0: f64, f1: f64, level: f64) -> Option<f64> {
    let below0 = f0 <= level;
    let below1 = f1 <= level;
    if below0 == below1 || f0 == f1 {
        return None;
    }
    Some((level - f0) / (f1 - f0))
}

fn linspace(min: f64, max: f64, n: usize) -> Vec<f64> {
    let step = (max - min) / (n as f64 - 1.0);
    (0..n).map(|i| min + step * i as f64).collect()
}

/// Tagged propagation formulas, one per derived quantity.
///
/// First-order error propagation: `sigma_f = |df/dx| * sigma_x`, combined in
/// quadrature when two uncertain inputs contribute (planet mass).
#[derive(Debug, Clone, Copy)]
pub enum Propagation {
    /// Doppler wavelength-to-velocity conversion.
    StarVelocity { wavelength_sigma: f64 },
    /// `r = cbrt(G M / w^2)` with uncertain `w`.
    OrbitalDistance {
        angular_speed: f64,
        angular_speed_sigma: f64,
    },
    /// `vp = sqrt(G M / r)` with uncertain `r`.
    PlanetVelocity {
        orbital_distance: f64,
        distance_sigma: f64,
    },
    /// `Mp = M v0 / vp` with uncertain `v0` and `vp`.
    PlanetMass {
        speed_star: f64,
        planet_velocity: f64,
        speed_star_sigma: f64,
        planet_velocity_sigma: f64,
    },
}

/// Propagate an input uncertainty through one derived-quantity formula.
pub fn propagate(config: &PhysicsConfig, propagation: Propagation) -> f64 {
    let gm = config.gravitational_parameter();
    match propagation {
        Propagation::StarVelocity { wavelength_sigma } => {
            crate::physics::radial_velocity_sigma(config, wavelength_sigma)
        }
        Propagation::OrbitalDistance {
            angular_speed,
            angular_speed_sigma,
        } => {
            // dr/dw = -(2/3) (G M)^(1/3) w^(-5/3)
            ((2.0 / 3.0) * gm.cbrt() * angular_speed.abs().powf(-5.0 / 3.0)
                * angular_speed_sigma)
                .abs()
        }
        Propagation::PlanetVelocity {
            orbital_distance,
            distance_sigma,
        } => {
            // dvp/dr = -(1/2) (G M / r)^(-1/2) * (G M / r^2)
            (0.5 * (gm / orbital_distance).powf(-0.5) * (gm / orbital_distance.powi(2))
                * distance_sigma)
                .abs()
        }
        Propagation::PlanetMass {
            speed_star,
            planet_velocity,
            speed_star_sigma,
            planet_velocity_sigma,
        } => {
            let m = config.star_mass;
            let dv0 = m / planet_velocity * speed_star_sigma;
            let dvp = m * speed_star / planet_velocity.powi(2) * planet_velocity_sigma;
            (dv0 * dv0 + dvp * dvp).sqrt()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a synthetic quadratic bowl surface directly.
    fn bowl(
        min_chi: f64,
        a: f64,
        b: f64,
        x0: f64,
        y0: f64,
        x_half: f64,
        y_half: f64,
        n: usize,
    ) -> ChiSquaredSurface {
        let speed_axis = linspace(x0 - x_half, x0 + x_half, n);
        let angular_axis = linspace(y0 - y_half, y0 + y_half, n);
        let values = DMatrix::from_fn(n, n, |i, j| {
            let dx = speed_axis[j] - x0;
            let dy = angular_axis[i] - y0;
            min_chi + a * dx * dx + b * dy * dy
        });
        ChiSquaredSurface {
            speed_axis,
            angular_axis,
            values,
            min_chi_squared: min_chi,
        }
    }

    #[test]
    fn bowl_plus_one_half_widths_match_analytic_values() {
        // chi2 = min + a dx^2 + b dy^2: the +1 contour spans sqrt(1/a) and
        // sqrt(1/b) from the center.
        let (a, b) = (0.25, 4.0);
        let surface = bowl(10.0, a, b, 50.0, 3e-8, 3.0, 1.0, 501);

        let bounds = surface.level_bounds(11.0).unwrap();
        let expect_x = (1.0 / a).sqrt();
        let expect_y = (1.0 / b).sqrt();
        assert!(
            (bounds.speed_half_width() - expect_x).abs() < 1e-3,
            "speed hw = {}",
            bounds.speed_half_width()
        );
        assert!(
            (bounds.angular_half_width() - expect_y).abs() < 1e-3,
            "angular hw = {}",
            bounds.angular_half_width()
        );
    }

    #[test]
    fn half_widths_are_nonnegative_and_monotone_in_level() {
        let surface = bowl(5.0, 1.0, 1.0, 0.0, 0.0, 4.0, 4.0, 301);
        let tight = surface.level_bounds(5.0 + 1.0).unwrap();
        let loose = surface.level_bounds(5.0 + 2.3).unwrap();
        assert!(tight.speed_half_width() >= 0.0);
        assert!(tight.angular_half_width() >= 0.0);
        assert!(loose.speed_half_width() > tight.speed_half_width());
        assert!(loose.angular_half_width() > tight.angular_half_width());
    }

    #[test]
    fn empty_level_set_yields_no_bounds() {
        let surface = bowl(5.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 51);
        assert!(surface.level_bounds(4.9).is_none());
    }

    #[test]
    fn orbital_distance_propagation_matches_finite_difference() {
        let config = PhysicsConfig::default();
        let w = 3e-8;
        let sigma_w = 1e-10;
        let analytic = propagate(
            &config,
            Propagation::OrbitalDistance {
                angular_speed: w,
                angular_speed_sigma: sigma_w,
            },
        );
        let h = 1e-13;
        let numeric = ((crate::physics::orbital_distance(&config, w + h)
            - crate::physics::orbital_distance(&config, w - h))
            / (2.0 * h)
            * sigma_w)
            .abs();
        assert!((analytic - numeric).abs() / numeric < 1e-4);
    }

    #[test]
    fn planet_velocity_propagation_matches_finite_difference() {
        let config = PhysicsConfig::default();
        let r = 4e11;
        let sigma_r = 1e9;
        let analytic = propagate(
            &config,
            Propagation::PlanetVelocity {
                orbital_distance: r,
                distance_sigma: sigma_r,
            },
        );
        let h = 1e4;
        let numeric = ((crate::physics::planet_velocity(&config, r + h)
            - crate::physics::planet_velocity(&config, r - h))
            / (2.0 * h)
            * sigma_r)
            .abs();
        assert!((analytic - numeric).abs() / numeric < 1e-4);
    }

    #[test]
    fn planet_mass_propagation_combines_in_quadrature() {
        let config = PhysicsConfig::default();
        let m = config.star_mass;
        let (v0, vp) = (50.0, 2e4);
        let (s0, sp) = (1.5, 300.0);
        let got = propagate(
            &config,
            Propagation::PlanetMass {
                speed_star: v0,
                planet_velocity: vp,
                speed_star_sigma: s0,
                planet_velocity_sigma: sp,
            },
        );
        let expect = ((m / vp * s0).powi(2) + (m * v0 / (vp * vp) * sp).powi(2)).sqrt();
        assert!((got - expect).abs() / expect < 1e-12);
    }

    #[test]
    fn star_velocity_propagation_scales_with_doppler_gain() {
        let config = PhysicsConfig::default();
        let sigma = propagate(
            &config,
            Propagation::StarVelocity {
                wavelength_sigma: 1e-13,
            },
        );
        assert!((sigma - config.doppler_gain() * 1e-13).abs() < 1e-12);
    }
}
