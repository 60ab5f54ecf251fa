//! The fixed analysis pipeline, ingest through derived quantities.
//!
//! Stage order is part of the contract:
//!
//! 1. ingest both tables and convert to radial-velocity points
//! 2. pass-1 cleaning against the velocity mean
//! 3. seed fit, 3 free parameters
//! 4. pass-2 cleaning against the seed fit's residuals
//! 5. refit, 3 free parameters, to extract the phase
//! 6. final fit, 2 free parameters with the phase pinned
//! 7. chi-squared surface and contour-derived parameter uncertainties
//! 8. closed-form derived quantities and their propagated uncertainties
//!
//! Everything a caller might print, plot, or export is collected into
//! [`RunOutput`]; this module does no terminal or file output itself.

use crate::clean;
use crate::domain::{
    DegeneracyPolicy, DerivedQuantities, FitConfig, FitResult, RvPoint, UncertaintyBundle,
};
use crate::error::AppError;
use crate::fit;
use crate::io::ingest::{self, IngestedData};
use crate::physics;
use crate::uncertainty::{self, ChiSquaredSurface, Propagation};

/// Everything produced by one pipeline run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    /// Radial-velocity points before any cleaning, for the raw-data report.
    pub points_all: Vec<RvPoint>,
    pub pass1_removed: usize,
    pub pass2_removed: usize,
    /// Points surviving both cleaning passes; the fitted sample.
    pub cleaned: Vec<RvPoint>,
    pub seed_fit: FitResult,
    pub refit: FitResult,
    pub final_fit: FitResult,
    pub surface: ChiSquaredSurface,
    pub uncertainties: UncertaintyBundle,
    pub derived: DerivedQuantities,
}

/// Run the full pipeline for one configuration.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let ingest = ingest::load_measurements(&config.data_path_1, &config.data_path_2)?;
    let points_all = physics::to_rv_points(&config.physics, &ingest.measurements);

    let pass1 = clean::pass1_mean(&points_all, config.pass1_sigma);

    let seed_fit = fit::fit_free(&pass1.points, &config.physics)?;
    let pass2 = clean::pass2_residual(&pass1.points, &seed_fit.parameters, config.pass2_sigma);

    let refit = fit::fit_free(&pass2.points, &config.physics)?;
    let final_fit = fit::fit_phase_fixed(&pass2.points, refit.parameters.phase, &config.physics)?;

    let angular_speed = final_fit.parameters.angular_speed;
    let degenerate = !angular_speed.is_finite() || angular_speed <= 0.0;
    if degenerate && config.degeneracy == DegeneracyPolicy::Reject {
        return Err(AppError::numerical(format!(
            "Fitted angular speed {angular_speed} is degenerate; derived quantities undefined.",
        )));
    }

    let surface = ChiSquaredSurface::evaluate(
        &pass2.points,
        &final_fit,
        config.contour_speed_half_width,
        config.contour_angular_half_width,
        config.contour_points,
    )?;
    let bounds = surface
        .level_bounds(surface.min_chi_squared + uncertainty::LEVEL_OFFSETS[0])
        .ok_or_else(|| {
            AppError::numerical(
                "The chi2_min + 1 contour was not captured by the grid window; \
                 widen the contour half-widths.",
            )
        })?;
    let speed_star_sigma = bounds.speed_half_width();
    let angular_speed_sigma = bounds.angular_half_width();

    let derived = physics::derive(&config.physics, &final_fit.parameters);

    let distance_sigma = uncertainty::propagate(
        &config.physics,
        Propagation::OrbitalDistance {
            angular_speed,
            angular_speed_sigma,
        },
    );
    let planet_velocity_sigma = uncertainty::propagate(
        &config.physics,
        Propagation::PlanetVelocity {
            orbital_distance: derived.orbital_distance_m,
            distance_sigma,
        },
    );
    let planet_mass_sigma = uncertainty::propagate(
        &config.physics,
        Propagation::PlanetMass {
            speed_star: final_fit.parameters.speed_star,
            planet_velocity: derived.planet_velocity_ms,
            speed_star_sigma,
            planet_velocity_sigma,
        },
    );

    Ok(RunOutput {
        ingest,
        points_all,
        pass1_removed: pass1.removed,
        pass2_removed: pass2.removed,
        cleaned: pass2.points,
        seed_fit,
        refit,
        final_fit,
        surface,
        uncertainties: UncertaintyBundle {
            speed_star: speed_star_sigma,
            angular_speed: angular_speed_sigma,
            orbital_distance: distance_sigma,
            planet_velocity: planet_velocity_sigma,
            planet_mass: planet_mass_sigma,
        },
        derived,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::data::{self, SynthSpec};
    use crate::domain::ModelParameters;
    use crate::physics::PhysicsConfig;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "doppler_rv_pipeline_{}_{name}.csv",
            std::process::id()
        ))
    }

    fn test_config(data1: PathBuf, data2: PathBuf) -> FitConfig {
        FitConfig {
            data_path_1: data1,
            data_path_2: data2,
            pass1_sigma: 3.0,
            // Loose residual cut so the fitted sample keeps its Gaussian
            // tails and the reduced chi-squared stays near 1.
            pass2_sigma: 3.0,
            physics: PhysicsConfig::default(),
            contour_speed_half_width: 6.0,
            contour_angular_half_width: 2e-9,
            contour_points: 201,
            degeneracy: DegeneracyPolicy::Propagate,
            plot: false,
            out_dir: PathBuf::from("."),
            export: None,
        }
    }

    #[test]
    fn end_to_end_recovers_generating_parameters() {
        let truth = ModelParameters {
            speed_star: 50.0,
            angular_speed: 3e-8,
            phase: 3.0,
        };
        let spec = SynthSpec {
            out1: temp_path("e2e1"),
            out2: temp_path("e2e2"),
            count: 60,
            seed: 42,
            truth,
            uncertainty_nm: 2e-5,
            span_years: 10.0,
            outlier_prob: 0.0,
            outlier_k: 5.0,
        };
        let config = test_config(spec.out1.clone(), spec.out2.clone());
        data::generate_tables(&spec, &config.physics).unwrap();

        let run = run_fit(&config).unwrap();

        assert_eq!(run.ingest.rows_read, 60);
        assert!(run.cleaned.len() > 20);

        let params = run.final_fit.parameters;
        assert!(
            (params.speed_star - truth.speed_star).abs() < 6.0,
            "speed_star = {}",
            params.speed_star
        );
        assert!(
            (params.angular_speed - truth.angular_speed).abs() < 3e-9,
            "angular_speed = {}",
            params.angular_speed
        );
        assert!(
            (params.phase - truth.phase).abs() < 0.5,
            "phase = {}",
            params.phase
        );

        let reduced = run.final_fit.reduced_chi_squared();
        assert!((0.3..2.0).contains(&reduced), "reduced chi2 = {reduced}");

        // Uncertainties are finite, positive, and small against the values.
        let u = &run.uncertainties;
        for sigma in [
            u.speed_star,
            u.angular_speed,
            u.orbital_distance,
            u.planet_velocity,
            u.planet_mass,
        ] {
            assert!(sigma.is_finite() && sigma > 0.0, "sigma = {sigma}");
        }
        assert!(u.speed_star < params.speed_star.abs());
        assert!(u.angular_speed < params.angular_speed);

        // Derived quantities land in the plausible planetary range.
        assert!(run.derived.orbital_distance_au() > 0.5);
        assert!(run.derived.orbital_distance_au() < 20.0);
        assert!(run.derived.planet_mass_jovian() > 0.1);
        assert!(run.derived.planet_mass_jovian() < 100.0);

        let _ = std::fs::remove_file(&spec.out1);
        let _ = std::fs::remove_file(&spec.out2);
    }

    #[test]
    fn missing_input_is_an_input_error() {
        let config = test_config(
            PathBuf::from("definitely_missing_1.csv"),
            PathBuf::from("definitely_missing_2.csv"),
        );
        assert_eq!(run_fit(&config).unwrap_err().exit_code(), 2);
    }
}
