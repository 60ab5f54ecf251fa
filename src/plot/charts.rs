//! Plotters-powered PNG charts.
//!
//! The charts are data-driven: every series is computed by the numeric
//! pipeline and handed in as plain values, so this module contains drawing
//! code only. With Plotters' font-dependent features disabled (see
//! Cargo.toml) the charts carry mesh lines and series but no rendered text.
//!
//! Output filenames match the published analysis:
//! - `Raw_data_plot.png`
//! - `plot_of_velocity_against_time_without_outliers.png`
//! - `contour_plot.png`

use std::path::Path;

use plotters::prelude::*;

use crate::domain::{Measurement, ModelParameters, RvPoint};
use crate::error::AppError;
use crate::uncertainty::ChiSquaredSurface;

pub const RAW_DATA_PLOT: &str = "Raw_data_plot.png";
pub const FITTED_DATA_PLOT: &str = "plot_of_velocity_against_time_without_outliers.png";
pub const CONTOUR_PLOT: &str = "contour_plot.png";

const RAW_SIZE: (u32, u32) = (1000, 400);
const FITTED_SIZE: (u32, u32) = (1100, 400);
const CONTOUR_SIZE: (u32, u32) = (790, 720);

fn draw_error(path: &Path, e: impl std::fmt::Display) -> AppError {
    AppError::numerical(format!("Failed to render '{}': {e}", path.display()))
}

/// Raw wavelength-vs-time scatter with error bars (years, nm).
pub fn render_raw_data(path: &Path, measurements: &[Measurement]) -> Result<(), AppError> {
    let root = BitMapBackend::new(path, RAW_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| draw_error(path, e))?;

    let (t_range, w_range) = padded_ranges(
        measurements.iter().map(|m| m.time_years),
        measurements
            .iter()
            .flat_map(|m| [m.wavelength_nm - m.uncertainty_nm, m.wavelength_nm + m.uncertainty_nm]),
    );

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(t_range, w_range)
        .map_err(|e| draw_error(path, e))?;
    chart
        .configure_mesh()
        .draw()
        .map_err(|e| draw_error(path, e))?;

    chart
        .draw_series(measurements.iter().map(|m| {
            ErrorBar::new_vertical(
                m.time_years,
                m.wavelength_nm - m.uncertainty_nm,
                m.wavelength_nm,
                m.wavelength_nm + m.uncertainty_nm,
                BLUE.filled(),
                6,
            )
        }))
        .map_err(|e| draw_error(path, e))?;

    root.present().map_err(|e| draw_error(path, e))
}

/// Cleaned velocity data with error bars plus the fitted curve (s, m/s).
pub fn render_fitted_curve(
    path: &Path,
    points: &[RvPoint],
    parameters: &ModelParameters,
) -> Result<(), AppError> {
    let root = BitMapBackend::new(path, FITTED_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| draw_error(path, e))?;

    let (t_range, v_range) = padded_ranges(
        points.iter().map(|p| p.time_s),
        points
            .iter()
            .flat_map(|p| [p.velocity_ms - p.uncertainty_ms, p.velocity_ms + p.uncertainty_ms]),
    );

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(t_range.clone(), v_range)
        .map_err(|e| draw_error(path, e))?;
    chart
        .configure_mesh()
        .draw()
        .map_err(|e| draw_error(path, e))?;

    // Dense model curve across the observed time span.
    let n = 512;
    let t0 = t_range.start;
    let t1 = t_range.end;
    let curve = (0..n).map(|i| {
        let t = t0 + (t1 - t0) * i as f64 / (n as f64 - 1.0);
        (t, parameters.velocity_at(t))
    });
    chart
        .draw_series(LineSeries::new(curve, &RED))
        .map_err(|e| draw_error(path, e))?;

    chart
        .draw_series(points.iter().map(|p| {
            ErrorBar::new_vertical(
                p.time_s,
                p.velocity_ms - p.uncertainty_ms,
                p.velocity_ms,
                p.velocity_ms + p.uncertainty_ms,
                BLUE.filled(),
                6,
            )
        }))
        .map_err(|e| draw_error(path, e))?;

    root.present().map_err(|e| draw_error(path, e))
}

/// Two-panel confidence-contour chart.
///
/// Top panel: the `chi2_min + 1` contour alone. Bottom panel: every level in
/// `offsets` at once. The fit minimum is marked in both.
pub fn render_contours(
    path: &Path,
    surface: &ChiSquaredSurface,
    offsets: &[f64],
    minimum: (f64, f64),
) -> Result<(), AppError> {
    let root = BitMapBackend::new(path, CONTOUR_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| draw_error(path, e))?;
    let panels = root.split_evenly((2, 1));

    let first = offsets
        .first()
        .copied()
        .ok_or_else(|| AppError::input("Contour plot needs at least one level offset."))?;
    draw_contour_panel(&panels[0], path, surface, &[first], minimum)?;
    draw_contour_panel(&panels[1], path, surface, offsets, minimum)?;

    root.present().map_err(|e| draw_error(path, e))
}

fn draw_contour_panel(
    area: &DrawingArea<BitMapBackend, plotters::coord::Shift>,
    path: &Path,
    surface: &ChiSquaredSurface,
    offsets: &[f64],
    minimum: (f64, f64),
) -> Result<(), AppError> {
    let x0 = surface.speed_axis[0];
    let x1 = surface.speed_axis[surface.speed_axis.len() - 1];
    let y0 = surface.angular_axis[0];
    let y1 = surface.angular_axis[surface.angular_axis.len() - 1];

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(|e| draw_error(path, e))?;
    chart
        .configure_mesh()
        .draw()
        .map_err(|e| draw_error(path, e))?;

    let palette = [
        RGBColor(0, 0, 0),
        RGBColor(70, 130, 180),
        RGBColor(46, 139, 87),
        RGBColor(178, 34, 34),
    ];

    for (idx, &offset) in offsets.iter().enumerate() {
        let color = palette[idx % palette.len()];
        let level = surface.min_chi_squared + offset;
        chart
            .draw_series(
                surface
                    .level_crossings(level)
                    .into_iter()
                    .map(|(x, y)| Pixel::new((x, y), color)),
            )
            .map_err(|e| draw_error(path, e))?;
    }

    chart
        .draw_series(std::iter::once(Circle::new(minimum, 4, BLUE.filled())))
        .map_err(|e| draw_error(path, e))?;

    Ok(())
}

/// Min/max ranges padded by 5% so markers at the extremes stay visible.
fn padded_ranges(
    xs: impl Iterator<Item = f64>,
    ys: impl Iterator<Item = f64>,
) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    (padded(xs), padded(ys))
}

fn padded(values: impl Iterator<Item = f64>) -> std::ops::Range<f64> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if !(min.is_finite() && max.is_finite()) {
        return 0.0..1.0;
    }
    let pad = if max > min { (max - min) * 0.05 } else { 1.0 };
    (min - pad)..(max + pad)
}
