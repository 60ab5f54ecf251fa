//! Command-line parsing for the Doppler spectroscopy fitter.
//!
//! Argument parsing and command dispatch stay separate from the numeric
//! pipeline: this module only defines flags and defaults.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::DegeneracyPolicy;
use crate::physics;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "doppler",
    version,
    about = "Doppler-spectroscopy radial-velocity planet fit"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full pipeline: ingest, clean, fit, uncertainties, plots.
    Fit(FitArgs),
    /// Generate a pair of synthetic input tables from a known sinusoid.
    Synth(SynthArgs),
}

/// Options for a fit run.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// First input table (time,wavelength,uncertainty per row).
    #[arg(default_value = "doppler_data_1.csv")]
    pub data1: PathBuf,

    /// Second input table.
    #[arg(default_value = "doppler_data_2.csv")]
    pub data2: PathBuf,

    /// Pass-1 outlier tolerance (standard deviations from the mean).
    #[arg(long, default_value_t = 3.0)]
    pub pass1_sigma: f64,

    /// Pass-2 outlier tolerance (standard deviations of fit residuals).
    #[arg(long, default_value_t = 1.0)]
    pub pass2_sigma: f64,

    /// Stellar mass in solar masses.
    #[arg(long, default_value_t = physics::STAR_MASS_SOLAR)]
    pub star_mass_solar: f64,

    /// Rest wavelength of the tracked spectral line (nm).
    #[arg(long, default_value_t = physics::H_ALPHA_WAVELENGTH / physics::NANOMETERS_TO_METERS)]
    pub rest_wavelength_nm: f64,

    /// Minimizer seed: star velocity amplitude (m/s).
    #[arg(long, default_value_t = physics::SPEED_STAR_START)]
    pub v0_start: f64,

    /// Minimizer seed: angular speed (rad/s).
    #[arg(long, default_value_t = physics::ANGULAR_SPEED_START)]
    pub omega_start: f64,

    /// Minimizer seed: phase (rad).
    #[arg(long, default_value_t = physics::PHASE_START)]
    pub phase_start: f64,

    /// Contour window half-width along the speed axis (m/s).
    #[arg(long, default_value_t = 3.0)]
    pub contour_v0_half_width: f64,

    /// Contour window half-width along the angular-speed axis (rad/s).
    #[arg(long, default_value_t = 1e-9)]
    pub contour_omega_half_width: f64,

    /// Chi-squared grid resolution per axis.
    #[arg(long, default_value_t = 500)]
    pub contour_points: usize,

    /// Policy for a degenerate (zero/non-finite) fitted angular speed.
    #[arg(long, value_enum, default_value_t = DegeneracyPolicy::Propagate)]
    pub degeneracy: DegeneracyPolicy,

    /// Skip PNG rendering.
    #[arg(long)]
    pub no_plot: bool,

    /// Directory for the output PNGs.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Export the run summary as JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,
}

/// Options for synthetic table generation.
#[derive(Debug, Parser)]
pub struct SynthArgs {
    /// First output table.
    #[arg(long, default_value = "doppler_data_1.csv")]
    pub out1: PathBuf,

    /// Second output table.
    #[arg(long, default_value = "doppler_data_2.csv")]
    pub out2: PathBuf,

    /// Total row count across both tables.
    #[arg(short = 'n', long, default_value_t = 100)]
    pub count: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// True star velocity amplitude (m/s).
    #[arg(long, default_value_t = 50.0)]
    pub speed_star: f64,

    /// True angular speed (rad/s).
    #[arg(long, default_value_t = 3e-8)]
    pub angular_speed: f64,

    /// True phase (rad).
    #[arg(long, default_value_t = 3.0)]
    pub phase: f64,

    /// Quoted wavelength uncertainty per row (nm).
    #[arg(long, default_value_t = 2e-5)]
    pub uncertainty_nm: f64,

    /// Observation span (years).
    #[arg(long, default_value_t = 10.0)]
    pub span_years: f64,

    /// Probability of displacing a row by `outlier_k` noise scales.
    #[arg(long, default_value_t = 0.05)]
    pub outlier_prob: f64,

    /// Outlier displacement in noise scales.
    #[arg(long, default_value_t = 8.0)]
    pub outlier_k: f64,
}
