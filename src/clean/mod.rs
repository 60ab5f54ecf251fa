//! Two-pass statistical outlier cleaning.
//!
//! Exactly two passes, order-dependent, not a loop to convergence:
//!
//! 1. `pass1_mean` runs on the raw velocity points, before any fit.
//! 2. `pass2_residual` runs only after a seed fit exists, measuring each
//!    point against the fitted curve.
//!
//! Both passes preserve the ordering of surviving points and report how many
//! points were dropped. Removing nothing in pass 2 is a valid outcome the
//! report surfaces, not an error.

use crate::domain::{FilterOutcome, ModelParameters, RvPoint};

/// Drop points whose velocity deviates from the sample mean by more than
/// `tolerance_sigma` population standard deviations (ddof = 0).
pub fn pass1_mean(points: &[RvPoint], tolerance_sigma: f64) -> FilterOutcome {
    let n = points.len();
    if n == 0 {
        return FilterOutcome {
            points: Vec::new(),
            removed: 0,
        };
    }

    let mean = points.iter().map(|p| p.velocity_ms).sum::<f64>() / n as f64;
    let variance = points
        .iter()
        .map(|p| (p.velocity_ms - mean).powi(2))
        .sum::<f64>()
        / n as f64;
    let sigma = variance.sqrt();

    let kept: Vec<RvPoint> = points
        .iter()
        .filter(|p| (p.velocity_ms - mean).abs() <= tolerance_sigma * sigma)
        .copied()
        .collect();

    FilterOutcome {
        removed: n - kept.len(),
        points: kept,
    }
}

/// Drop points whose absolute residual against the fitted model exceeds
/// `tolerance_sigma` sample standard deviations of the residuals (Bessel
/// corrected, ddof = 1).
///
/// With fewer than two points the residual spread is undefined and the set
/// is returned unchanged.
pub fn pass2_residual(
    points: &[RvPoint],
    parameters: &ModelParameters,
    tolerance_sigma: f64,
) -> FilterOutcome {
    let n = points.len();
    if n < 2 {
        return FilterOutcome {
            points: points.to_vec(),
            removed: 0,
        };
    }

    let residuals: Vec<f64> = points
        .iter()
        .map(|p| p.velocity_ms - parameters.velocity_at(p.time_s))
        .collect();

    let mean = residuals.iter().sum::<f64>() / n as f64;
    let variance = residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    let sigma = variance.sqrt();

    let kept: Vec<RvPoint> = points
        .iter()
        .zip(&residuals)
        .filter(|(_, r)| r.abs() <= tolerance_sigma * sigma)
        .map(|(p, _)| *p)
        .collect();

    FilterOutcome {
        removed: n - kept.len(),
        points: kept,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(t: f64, v: f64) -> RvPoint {
        RvPoint {
            time_s: t,
            velocity_ms: v,
            uncertainty_ms: 1.0,
        }
    }

    #[test]
    fn pass1_huge_tolerance_removes_nothing() {
        let points: Vec<RvPoint> = (0..10).map(|i| point(i as f64, i as f64 * 7.0)).collect();
        let out = pass1_mean(&points, 1e12);
        assert_eq!(out.removed, 0);
        assert_eq!(out.points.len(), points.len());
    }

    #[test]
    fn pass1_drops_gross_outlier_and_keeps_order() {
        let mut points: Vec<RvPoint> = (0..20).map(|i| point(i as f64, (i % 3) as f64)).collect();
        points.push(point(20.0, 1e6));
        let out = pass1_mean(&points, 3.0);
        assert_eq!(out.removed, 1);
        let times: Vec<f64> = out.points.iter().map(|p| p.time_s).collect();
        assert!(times.windows(2).all(|w| w[0] < w[1]));
        assert!(out.points.iter().all(|p| p.velocity_ms < 1e6));
    }

    #[test]
    fn pass2_signals_zero_removals_when_all_within_tolerance() {
        let params = ModelParameters {
            speed_star: 10.0,
            angular_speed: 1e-3,
            phase: 0.0,
        };
        // Small uniform-ish residual spread, nothing beyond 3 sigma.
        let points: Vec<RvPoint> = (0..12)
            .map(|i| {
                let t = i as f64 * 100.0;
                let eps = if i % 2 == 0 { 0.05 } else { -0.05 };
                point(t, params.velocity_at(t) + eps)
            })
            .collect();
        let out = pass2_residual(&points, &params, 3.0);
        assert_eq!(out.removed, 0);
        assert_eq!(out.points.len(), points.len());
    }

    #[test]
    fn pass2_never_grows_the_set_and_drops_far_residuals() {
        let params = ModelParameters {
            speed_star: 10.0,
            angular_speed: 1e-3,
            phase: 0.0,
        };
        let mut points: Vec<RvPoint> = (0..12)
            .map(|i| {
                let t = i as f64 * 100.0;
                let eps = if i % 2 == 0 { 0.1 } else { -0.1 };
                point(t, params.velocity_at(t) + eps)
            })
            .collect();
        points.push(point(1300.0, params.velocity_at(1300.0) + 50.0));

        let before = points.len();
        let out = pass2_residual(&points, &params, 1.0);
        assert!(out.points.len() <= before);
        assert_eq!(out.removed, 1);
    }

    #[test]
    fn pass2_leaves_tiny_sets_alone() {
        let params = ModelParameters {
            speed_star: 1.0,
            angular_speed: 1.0,
            phase: 0.0,
        };
        let points = vec![point(0.0, 5.0)];
        let out = pass2_residual(&points, &params, 1.0);
        assert_eq!(out.removed, 0);
        assert_eq!(out.points.len(), 1);
    }
}
