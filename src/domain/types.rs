//! Shared domain types.
//!
//! Data flows strictly forward through the pipeline; each stage consumes the
//! previous stage's values and produces fresh ones. Nothing here is mutated
//! in place after construction, and the output-side types are serializable
//! for the JSON export.

use std::path::PathBuf;

use clap::ValueEnum;
use serde::Serialize;

use crate::physics::PhysicsConfig;

/// One raw spectroscopy measurement as read from the input tables.
///
/// Ingest guarantees `uncertainty_nm > 0` for every retained row.
#[derive(Debug, Clone, Copy)]
pub struct Measurement {
    /// Observation time (years since the campaign start).
    pub time_years: f64,
    /// Observed line wavelength (nm).
    pub wavelength_nm: f64,
    /// Wavelength uncertainty (nm).
    pub uncertainty_nm: f64,
}

/// A measurement converted to radial-velocity space (SI units).
#[derive(Debug, Clone, Copy)]
pub struct RvPoint {
    /// Observation time (s).
    pub time_s: f64,
    /// Line-of-sight star velocity (m/s).
    pub velocity_ms: f64,
    /// Velocity uncertainty (m/s), always > 0.
    pub uncertainty_ms: f64,
}

/// Fitted parameters of the sinusoidal radial-velocity model.
///
/// `v(t) = speed_star * sin(angular_speed * t + phase)`. Produced only by the
/// fitter and immutable once returned. The phase is not wrapped into any
/// canonical range.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModelParameters {
    /// Star velocity amplitude (m/s).
    pub speed_star: f64,
    /// Orbital angular speed (rad/s).
    pub angular_speed: f64,
    /// Phase offset (rad).
    pub phase: f64,
}

impl ModelParameters {
    /// Model-predicted star velocity at time `t` (s).
    pub fn velocity_at(&self, t: f64) -> f64 {
        self.speed_star * (self.angular_speed * t + self.phase).sin()
    }
}

/// Result of one chi-squared minimization.
#[derive(Debug, Clone, Serialize)]
pub struct FitResult {
    pub parameters: ModelParameters,
    /// Objective value at the minimum, always >= 0.
    pub min_chi_squared: f64,
    /// Sample count minus free parameter count (2 or 3).
    pub dof: usize,
    /// Minimizer convergence status; non-convergence is a warning, not an error.
    pub converged: bool,
    pub iterations: usize,
}

impl FitResult {
    pub fn reduced_chi_squared(&self) -> f64 {
        self.min_chi_squared / self.dof as f64
    }
}

/// Output of one outlier-cleaning pass.
///
/// `removed == 0` is a valid, reportable outcome for the residual pass.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// Surviving points, original ordering preserved.
    pub points: Vec<RvPoint>,
    pub removed: usize,
}

/// Symmetric parameter uncertainties plus propagated derived-quantity
/// uncertainties.
///
/// Parameter entries are half-widths of the `chi2_min + 1` contour bounding
/// box along each axis, an axis-aligned approximation kept for parity with
/// the published analysis.
#[derive(Debug, Clone, Serialize)]
pub struct UncertaintyBundle {
    /// m/s
    pub speed_star: f64,
    /// rad/s
    pub angular_speed: f64,
    /// m
    pub orbital_distance: f64,
    /// m/s
    pub planet_velocity: f64,
    /// kg
    pub planet_mass: f64,
}

/// Closed-form quantities derived from the final fit.
#[derive(Debug, Clone, Serialize)]
pub struct DerivedQuantities {
    pub orbital_distance_m: f64,
    pub planet_velocity_ms: f64,
    pub planet_mass_kg: f64,
}

impl DerivedQuantities {
    pub fn orbital_distance_au(&self) -> f64 {
        self.orbital_distance_m / crate::physics::ASTRONOMICAL_UNIT
    }

    pub fn planet_mass_jovian(&self) -> f64 {
        self.planet_mass_kg / crate::physics::JOVIAN_MASS
    }
}

/// What to do when the fitted angular speed is degenerate (zero, negative,
/// or non-finite).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DegeneracyPolicy {
    /// Let NaN/Inf flow into the derived quantities and warn in the report.
    Propagate,
    /// Abort with a numerical error before computing derived quantities.
    Reject,
}

impl std::fmt::Display for DegeneracyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Propagate => "propagate",
            Self::Reject => "reject",
        })
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// Derived from CLI flags plus defaults.
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub data_path_1: PathBuf,
    pub data_path_2: PathBuf,

    /// Pass-1 tolerance in standard deviations from the velocity mean.
    pub pass1_sigma: f64,
    /// Pass-2 tolerance in standard deviations of the fit residuals.
    pub pass2_sigma: f64,

    pub physics: PhysicsConfig,

    /// Contour window half-width along the speed axis (m/s).
    pub contour_speed_half_width: f64,
    /// Contour window half-width along the angular-speed axis (rad/s).
    pub contour_angular_half_width: f64,
    /// Grid resolution per axis for the chi-squared surface.
    pub contour_points: usize,

    pub degeneracy: DegeneracyPolicy,

    pub plot: bool,
    pub out_dir: PathBuf,
    pub export: Option<PathBuf>,
}
