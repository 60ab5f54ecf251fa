//! The sinusoidal radial-velocity objective and fit entry points.
//!
//! Model: `v(t) = speed_star * sin(angular_speed * t + phase)`.
//! Objective: `chi2 = sum(((observed - predicted) / uncertainty)^2)`.
//!
//! Two distinct operations instead of a parameter-count flag:
//! - [`fit_free`]: 3 free parameters, used for the seed fit and the
//!   post-cleaning refit that pins down the phase.
//! - [`fit_phase_fixed`]: 2 free parameters with the phase pinned; produces
//!   the final reported parameters.
//!
//! Both seed the minimizer from the fixed starting values in
//! [`PhysicsConfig`], not from the data.

use nalgebra::DVector;

use crate::domain::{FitResult, ModelParameters, RvPoint};
use crate::error::AppError;
use crate::fit::simplex::{self, SimplexOptions};
use crate::physics::PhysicsConfig;

/// Chi-squared of the model against the observed velocities.
pub fn chi_squared(points: &[RvPoint], parameters: &ModelParameters) -> f64 {
    points
        .iter()
        .map(|p| {
            let residual = p.velocity_ms - parameters.velocity_at(p.time_s);
            (residual / p.uncertainty_ms).powi(2)
        })
        .sum()
}

/// Fit all three parameters (speed, angular speed, phase).
pub fn fit_free(points: &[RvPoint], config: &PhysicsConfig) -> Result<FitResult, AppError> {
    let free_parameters = 3;
    ensure_enough_points(points.len(), free_parameters)?;

    let objective = |x: &DVector<f64>| {
        chi_squared(
            points,
            &ModelParameters {
                speed_star: x[0],
                angular_speed: x[1],
                phase: x[2],
            },
        )
    };

    let seed = [
        config.speed_star_start,
        config.angular_speed_start,
        config.phase_start,
    ];
    let result = simplex::minimize(objective, &seed, &SimplexOptions::for_dimension(3));

    Ok(FitResult {
        parameters: ModelParameters {
            speed_star: result.x[0],
            angular_speed: result.x[1],
            phase: result.x[2],
        },
        min_chi_squared: result.fmin,
        dof: points.len() - free_parameters,
        converged: result.converged,
        iterations: result.iterations,
    })
}

/// Fit speed and angular speed with the phase pinned to `phase`.
pub fn fit_phase_fixed(
    points: &[RvPoint],
    phase: f64,
    config: &PhysicsConfig,
) -> Result<FitResult, AppError> {
    let free_parameters = 2;
    ensure_enough_points(points.len(), free_parameters)?;

    let objective = |x: &DVector<f64>| {
        chi_squared(
            points,
            &ModelParameters {
                speed_star: x[0],
                angular_speed: x[1],
                phase,
            },
        )
    };

    let seed = [config.speed_star_start, config.angular_speed_start];
    let result = simplex::minimize(objective, &seed, &SimplexOptions::for_dimension(2));

    Ok(FitResult {
        parameters: ModelParameters {
            speed_star: result.x[0],
            angular_speed: result.x[1],
            phase,
        },
        min_chi_squared: result.fmin,
        dof: points.len() - free_parameters,
        converged: result.converged,
        iterations: result.iterations,
    })
}

fn ensure_enough_points(n: usize, free_parameters: usize) -> Result<(), AppError> {
    if n <= free_parameters {
        return Err(AppError::insufficient_data(format!(
            "Cannot fit {free_parameters} free parameters with only {n} data points.",
        )));
    }
    Ok(())
}
