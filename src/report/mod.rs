//! Formatted terminal output for a full run.
//!
//! All formatting lives here so the numeric pipeline stays clean and the
//! output is localized for future snapshot tests. The result lines
//! reproduce the significant-figure precision of the published analysis,
//! which printed with C-style `%g`; [`fmt_sig`] emulates that rule.

use crate::app::pipeline::RunOutput;
use crate::domain::FitConfig;

/// Format `v` with `sig` significant figures, `%g` style.
///
/// Scientific notation when the decimal exponent is below -4 or at least
/// `sig`; fixed notation otherwise; trailing zeros stripped in both.
pub fn fmt_sig(v: f64, sig: usize) -> String {
    debug_assert!(sig >= 1);
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if v == 0.0 {
        return "0".to_string();
    }

    // Round to `sig` significant digits first; the exponent of the rounded
    // mantissa decides the notation (999.9 at 3 figures is 1e+03, not 1000).
    let rounded = format!("{:.*e}", sig - 1, v);
    let (mantissa, exponent) = rounded
        .split_once('e')
        .expect("float `e` formatting always contains an exponent");
    let exponent: i32 = exponent.parse().expect("float exponent is an integer");

    if exponent < -4 || exponent >= sig as i32 {
        let mantissa = strip_trailing_zeros(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    } else {
        let decimals = (sig as i32 - 1 - exponent).max(0) as usize;
        strip_trailing_zeros(&format!("{v:.decimals$}"))
    }
}

fn strip_trailing_zeros(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Format the full run summary: ingest/cleaning/fit diagnostics followed by
/// the physical results.
pub fn format_run_summary(run: &RunOutput, config: &FitConfig) -> String {
    let mut out = String::new();

    out.push_str("=== doppler - Radial-Velocity Planet Fit ===\n");
    out.push_str(&format!(
        "Data: '{}' + '{}'\n",
        config.data_path_1.display(),
        config.data_path_2.display()
    ));
    out.push_str(&format!(
        "Rows: read={} dropped={} (invalid or zero-uncertainty)\n",
        run.ingest.rows_read, run.ingest.rows_dropped
    ));
    out.push_str(&format!(
        "Cleaning: pass1 removed {} ({}-sigma from mean), pass2 removed {} ({}-sigma from fit)\n",
        run.pass1_removed, config.pass1_sigma, run.pass2_removed, config.pass2_sigma
    ));
    if run.pass2_removed == 0 {
        out.push_str("No data was removed\n");
    }
    out.push_str(&format!("Points fitted: n={}\n", run.cleaned.len()));

    out.push_str("\nFit diagnostics:\n");
    for (label, fit) in [
        ("seed fit (3 free)", &run.seed_fit),
        ("refit (3 free)", &run.refit),
        ("final fit (2 free, phase pinned)", &run.final_fit),
    ] {
        out.push_str(&format!(
            "- {label}: chi2={} dof={} iterations={}{}\n",
            fmt_sig(fit.min_chi_squared, 6),
            fit.dof,
            fit.iterations,
            if fit.converged {
                ""
            } else {
                " (warning: did not converge)"
            },
        ));
    }

    let params = run.final_fit.parameters;
    if !params.angular_speed.is_finite() || params.angular_speed <= 0.0 {
        out.push_str(
            "Warning: degenerate angular speed; derived quantities are unreliable.\n",
        );
    } else if !run.derived.planet_mass_kg.is_finite() {
        out.push_str("Warning: non-finite derived quantities.\n");
    }

    out.push('\n');
    out.push_str(&format_results(run));
    out
}

/// The physical result lines, with the original precision.
pub fn format_results(run: &RunOutput) -> String {
    let params = run.final_fit.parameters;
    let u = &run.uncertainties;
    let d = &run.derived;
    let mut out = String::new();

    out.push_str(&format!(
        "The reduced chi squared value is: {}\n",
        fmt_sig(run.final_fit.reduced_chi_squared(), 3)
    ));
    out.push_str(&format!("The phase is: {} rad\n", fmt_sig(params.phase, 4)));
    out.push_str(&format!(
        "The magnitude of the star velocity (V0) is: ({} +/- {:.2}) m/s\n",
        fmt_sig(params.speed_star, 4),
        u.speed_star
    ));
    out.push_str(&format!(
        "The angular speed (w) is: ({} +/- {}) rad/s\n",
        fmt_sig(params.angular_speed, 4),
        fmt_sig(u.angular_speed, 2)
    ));
    out.push_str(&format!(
        "The planets distance from the star (r) is: ({} +/- {}) AU\n",
        fmt_sig(d.orbital_distance_au(), 4),
        fmt_sig(u.orbital_distance / crate::physics::ASTRONOMICAL_UNIT, 3)
    ));
    out.push_str(&format!(
        "The velocity of the planet (Vp) is: ({} +/- {}) m/s\n",
        fmt_sig(d.planet_velocity_ms, 4),
        fmt_sig(u.planet_velocity, 4)
    ));
    out.push_str(&format!(
        "The mass of the planet (Mp) is: ({} +/- {}) Jovian masses\n",
        fmt_sig(d.planet_mass_jovian(), 4),
        fmt_sig(u.planet_mass / crate::physics::JOVIAN_MASS, 3)
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_sig_fixed_notation() {
        assert_eq!(fmt_sig(50.0, 4), "50");
        assert_eq!(fmt_sig(1.2345, 3), "1.23");
        assert_eq!(fmt_sig(0.000123456, 3), "0.000123");
        assert_eq!(fmt_sig(-2.5, 2), "-2.5");
        assert_eq!(fmt_sig(0.0, 3), "0");
    }

    #[test]
    fn fmt_sig_scientific_notation() {
        assert_eq!(fmt_sig(123456.0, 4), "1.235e+05");
        assert_eq!(fmt_sig(3e-8, 2), "3e-08");
        assert_eq!(fmt_sig(3.154e7, 4), "3.154e+07");
        assert_eq!(fmt_sig(0.00001234, 3), "1.23e-05");
    }

    #[test]
    fn fmt_sig_rounding_can_promote_to_scientific() {
        // 999.9 rounds to 1000 at 3 significant figures, which needs an
        // exponent of 3 and therefore scientific notation.
        assert_eq!(fmt_sig(999.9, 3), "1e+03");
        assert_eq!(fmt_sig(999.9, 4), "999.9");
    }

    #[test]
    fn fmt_sig_non_finite() {
        assert_eq!(fmt_sig(f64::NAN, 3), "nan");
        assert_eq!(fmt_sig(f64::INFINITY, 3), "inf");
        assert_eq!(fmt_sig(f64::NEG_INFINITY, 3), "-inf");
    }
}
