//! Nelder-Mead simplex minimization.
//!
//! Unconstrained, gradient-free, suitable for the low-dimensional (2-3
//! parameter) chi-squared objectives in this crate. Coefficients and
//! stopping rules follow the classic downhill-simplex formulation:
//! reflection 1, expansion 2, contraction 0.5, shrink 0.5; the initial
//! simplex perturbs each coordinate of the seed by 5% (or an absolute
//! 2.5e-4 for zero coordinates); convergence requires both the vertex
//! spread and the objective spread to fall below their tolerances.
//!
//! Non-convergence within the iteration cap is reported via the result's
//! `converged` flag; callers treat it as a diagnostic, not a failure.

use nalgebra::DVector;

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Relative perturbation applied to nonzero seed coordinates.
const NONZERO_STEP: f64 = 0.05;
/// Absolute perturbation applied to zero seed coordinates.
const ZERO_STEP: f64 = 0.00025;

/// Stopping rules for the simplex loop.
#[derive(Debug, Clone)]
pub struct SimplexOptions {
    /// Max infinity-norm distance between the best vertex and any other.
    pub x_tol: f64,
    /// Max absolute objective spread across the simplex.
    pub f_tol: f64,
    pub max_iterations: usize,
}

impl SimplexOptions {
    /// Defaults for an `n`-dimensional problem: 1e-4 tolerances, 200*n
    /// iteration cap.
    pub fn for_dimension(n: usize) -> Self {
        Self {
            x_tol: 1e-4,
            f_tol: 1e-4,
            max_iterations: 200 * n.max(1),
        }
    }
}

/// Minimization outcome.
#[derive(Debug, Clone)]
pub struct SimplexResult {
    /// Best vertex found.
    pub x: DVector<f64>,
    /// Objective value at `x`.
    pub fmin: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
}

/// Minimize `f` starting from `seed`.
pub fn minimize<F>(f: F, seed: &[f64], options: &SimplexOptions) -> SimplexResult
where
    F: Fn(&DVector<f64>) -> f64,
{
    let n = seed.len();
    debug_assert!(n > 0);

    // Initial simplex: the seed plus one perturbed vertex per coordinate.
    let x0 = DVector::from_column_slice(seed);
    let mut vertices: Vec<DVector<f64>> = Vec::with_capacity(n + 1);
    vertices.push(x0.clone());
    for k in 0..n {
        let mut v = x0.clone();
        if v[k] != 0.0 {
            v[k] *= 1.0 + NONZERO_STEP;
        } else {
            v[k] = ZERO_STEP;
        }
        vertices.push(v);
    }

    let mut values: Vec<f64> = vertices.iter().map(&f).collect();
    let mut evaluations = n + 1;
    let mut iterations = 0usize;
    let mut converged = false;

    while iterations < options.max_iterations {
        sort_simplex(&mut vertices, &mut values);

        if spread_converged(&vertices, &values, options) {
            converged = true;
            break;
        }
        iterations += 1;

        // Centroid of all vertices except the worst.
        let mut centroid = DVector::zeros(n);
        for v in &vertices[..n] {
            centroid += v;
        }
        centroid /= n as f64;

        let worst = vertices[n].clone();
        let f_best = values[0];
        let f_second_worst = values[n - 1];
        let f_worst = values[n];

        let reflected = &centroid + (&centroid - &worst) * REFLECTION;
        let f_reflected = f(&reflected);
        evaluations += 1;

        if f_reflected < f_best {
            let expanded = &centroid + (&centroid - &worst) * (REFLECTION * EXPANSION);
            let f_expanded = f(&expanded);
            evaluations += 1;
            if f_expanded < f_reflected {
                vertices[n] = expanded;
                values[n] = f_expanded;
            } else {
                vertices[n] = reflected;
                values[n] = f_reflected;
            }
            continue;
        }

        if f_reflected < f_second_worst {
            vertices[n] = reflected;
            values[n] = f_reflected;
            continue;
        }

        if f_reflected < f_worst {
            // Outside contraction.
            let contracted = &centroid + (&centroid - &worst) * (REFLECTION * CONTRACTION);
            let f_contracted = f(&contracted);
            evaluations += 1;
            if f_contracted <= f_reflected {
                vertices[n] = contracted;
                values[n] = f_contracted;
                continue;
            }
        } else {
            // Inside contraction.
            let contracted = &centroid - (&centroid - &worst) * CONTRACTION;
            let f_contracted = f(&contracted);
            evaluations += 1;
            if f_contracted < f_worst {
                vertices[n] = contracted;
                values[n] = f_contracted;
                continue;
            }
        }

        // Shrink toward the best vertex.
        let best = vertices[0].clone();
        for i in 1..=n {
            vertices[i] = &best + (&vertices[i] - &best) * SHRINK;
            values[i] = f(&vertices[i]);
            evaluations += 1;
        }
    }

    sort_simplex(&mut vertices, &mut values);
    SimplexResult {
        x: vertices[0].clone(),
        fmin: values[0],
        iterations,
        evaluations,
        converged,
    }
}

fn sort_simplex(vertices: &mut [DVector<f64>], values: &mut [f64]) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let sorted_vertices: Vec<DVector<f64>> = order.iter().map(|&i| vertices[i].clone()).collect();
    let sorted_values: Vec<f64> = order.iter().map(|&i| values[i]).collect();
    vertices.clone_from_slice(&sorted_vertices);
    values.copy_from_slice(&sorted_values);
}

fn spread_converged(vertices: &[DVector<f64>], values: &[f64], options: &SimplexOptions) -> bool {
    let x_spread = vertices[1..]
        .iter()
        .map(|v| (v - &vertices[0]).amax())
        .fold(0.0, f64::max);
    let f_spread = values[1..]
        .iter()
        .map(|&fv| (fv - values[0]).abs())
        .fold(0.0, f64::max);
    x_spread <= options.x_tol && f_spread <= options.f_tol
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimizes_shifted_quadratic() {
        let f = |x: &DVector<f64>| (x[0] - 1.0).powi(2) + (x[1] + 2.0).powi(2);
        let result = minimize(f, &[0.0, 0.0], &SimplexOptions::for_dimension(2));
        assert!(result.converged);
        assert!((result.x[0] - 1.0).abs() < 1e-3);
        assert!((result.x[1] + 2.0).abs() < 1e-3);
        assert!(result.fmin < 1e-6);
    }

    #[test]
    fn minimizes_one_dimensional_quartic() {
        let f = |x: &DVector<f64>| (x[0] - 3.0).powi(4) + 7.0;
        let result = minimize(f, &[10.0], &SimplexOptions::for_dimension(1));
        assert!(result.converged);
        assert!((result.x[0] - 3.0).abs() < 0.1);
        assert!((result.fmin - 7.0).abs() < 1e-4);
    }

    #[test]
    fn reports_non_convergence_at_iteration_cap() {
        let f = |x: &DVector<f64>| (x[0] - 1.0).powi(2) + (x[1] + 2.0).powi(2);
        let options = SimplexOptions {
            x_tol: 1e-12,
            f_tol: 1e-12,
            max_iterations: 3,
        };
        let result = minimize(f, &[100.0, 100.0], &options);
        assert!(!result.converged);
        assert_eq!(result.iterations, 3);
    }

    #[test]
    fn handles_zero_seed_coordinates() {
        let f = |x: &DVector<f64>| x[0] * x[0];
        let result = minimize(f, &[0.0], &SimplexOptions::for_dimension(1));
        assert!(result.fmin < 1e-6);
    }
}
