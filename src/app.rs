//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the analysis pipeline
//! - prints the report
//! - renders the PNG charts
//! - writes the optional JSON export
//! - generates synthetic tables

use clap::Parser;

use crate::cli::{Command, FitArgs, SynthArgs};
use crate::domain::{FitConfig, ModelParameters};
use crate::error::AppError;
use crate::physics::{self, PhysicsConfig};

pub mod pipeline;

/// Entry point for the `doppler` binary.
pub fn run() -> Result<(), AppError> {
    // We want a bare `doppler` (and `doppler --export out.json`) to behave
    // like `doppler fit ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Synth(args) => handle_synth(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args);
    let run = pipeline::run_fit(&config)?;

    println!("{}", crate::report::format_run_summary(&run, &config));

    if config.plot {
        std::fs::create_dir_all(&config.out_dir).map_err(|e| {
            AppError::input(format!(
                "Failed to create output directory '{}': {e}",
                config.out_dir.display()
            ))
        })?;

        let raw = config.out_dir.join(crate::plot::RAW_DATA_PLOT);
        crate::plot::render_raw_data(&raw, &run.ingest.measurements)?;

        let fitted = config.out_dir.join(crate::plot::FITTED_DATA_PLOT);
        crate::plot::render_fitted_curve(&fitted, &run.cleaned, &run.final_fit.parameters)?;

        let contours = config.out_dir.join(crate::plot::CONTOUR_PLOT);
        crate::plot::render_contours(
            &contours,
            &run.surface,
            &crate::uncertainty::LEVEL_OFFSETS,
            (
                run.final_fit.parameters.speed_star,
                run.final_fit.parameters.angular_speed,
            ),
        )?;

        println!(
            "Wrote {}, {}, {}",
            raw.display(),
            fitted.display(),
            contours.display()
        );
    }

    if let Some(path) = &config.export {
        crate::io::export::write_summary_json(path, &run)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let spec = crate::data::SynthSpec {
        out1: args.out1.clone(),
        out2: args.out2.clone(),
        count: args.count,
        seed: args.seed,
        truth: ModelParameters {
            speed_star: args.speed_star,
            angular_speed: args.angular_speed,
            phase: args.phase,
        },
        uncertainty_nm: args.uncertainty_nm,
        span_years: args.span_years,
        outlier_prob: args.outlier_prob,
        outlier_k: args.outlier_k,
    };
    crate::data::generate_tables(&spec, &PhysicsConfig::default())?;
    println!(
        "Wrote {} rows across {} and {}",
        args.count,
        args.out1.display(),
        args.out2.display()
    );
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        data_path_1: args.data1.clone(),
        data_path_2: args.data2.clone(),
        pass1_sigma: args.pass1_sigma,
        pass2_sigma: args.pass2_sigma,
        physics: PhysicsConfig {
            speed_of_light: physics::SPEED_OF_LIGHT,
            rest_wavelength: args.rest_wavelength_nm * physics::NANOMETERS_TO_METERS,
            gravitational_constant: physics::GRAVITATIONAL_CONSTANT,
            star_mass: args.star_mass_solar * physics::SOLAR_MASS,
            speed_star_start: args.v0_start,
            angular_speed_start: args.omega_start,
            phase_start: args.phase_start,
        },
        contour_speed_half_width: args.contour_v0_half_width,
        contour_angular_half_width: args.contour_omega_half_width,
        contour_points: args.contour_points,
        degeneracy: args.degeneracy,
        plot: !args.no_plot,
        out_dir: args.out_dir.clone(),
        export: args.export.clone(),
    }
}

/// Rewrite argv so `doppler` defaults to `doppler fit`.
///
/// Rules:
/// - `doppler`                      -> `doppler fit`
/// - `doppler --export out.json`    -> `doppler fit --export out.json`
/// - `doppler --help/--version/-h`  -> unchanged (top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("fit".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "fit" | "synth");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "fit flags".
    if arg1.starts_with('-') {
        argv.insert(1, "fit".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_fit() {
        assert_eq!(rewrite_args(args(&["doppler"])), args(&["doppler", "fit"]));
    }

    #[test]
    fn leading_flag_is_routed_to_fit() {
        assert_eq!(
            rewrite_args(args(&["doppler", "--no-plot"])),
            args(&["doppler", "fit", "--no-plot"])
        );
    }

    #[test]
    fn explicit_subcommands_and_help_pass_through() {
        assert_eq!(
            rewrite_args(args(&["doppler", "synth", "-n", "50"])),
            args(&["doppler", "synth", "-n", "50"])
        );
        assert_eq!(
            rewrite_args(args(&["doppler", "--help"])),
            args(&["doppler", "--help"])
        );
    }
}
