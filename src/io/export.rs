//! JSON run-summary export.
//!
//! The summary is the portable representation of a finished run: final
//! parameters, their uncertainties, the derived quantities in both SI and
//! presentation units, and the cleaning/fit bookkeeping.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::app::pipeline::RunOutput;
use crate::domain::{DerivedQuantities, ModelParameters, UncertaintyBundle};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct SummaryFile {
    pub tool: String,
    pub parameters: ModelParameters,
    pub uncertainties: UncertaintyBundle,
    pub derived: DerivedSummary,
    pub min_chi_squared: f64,
    pub degrees_of_freedom: usize,
    pub reduced_chi_squared: f64,
    pub converged: bool,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub pass1_removed: usize,
    pub pass2_removed: usize,
    pub points_fitted: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DerivedSummary {
    #[serde(flatten)]
    pub si: DerivedQuantities,
    pub orbital_distance_au: f64,
    pub planet_mass_jovian: f64,
}

/// Write the run summary as pretty-printed JSON.
pub fn write_summary_json(path: &Path, run: &RunOutput) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::input(format!(
            "Failed to create summary JSON '{}': {e}",
            path.display()
        ))
    })?;

    let summary = SummaryFile {
        tool: "doppler".to_string(),
        parameters: run.final_fit.parameters,
        uncertainties: run.uncertainties.clone(),
        derived: DerivedSummary {
            orbital_distance_au: run.derived.orbital_distance_au(),
            planet_mass_jovian: run.derived.planet_mass_jovian(),
            si: run.derived.clone(),
        },
        min_chi_squared: run.final_fit.min_chi_squared,
        degrees_of_freedom: run.final_fit.dof,
        reduced_chi_squared: run.final_fit.reduced_chi_squared(),
        converged: run.final_fit.converged,
        rows_read: run.ingest.rows_read,
        rows_dropped: run.ingest.rows_dropped,
        pass1_removed: run.pass1_removed,
        pass2_removed: run.pass2_removed,
        points_fitted: run.cleaned.len(),
    };

    serde_json::to_writer_pretty(file, &summary)
        .map_err(|e| AppError::numerical(format!("Failed to write summary JSON: {e}")))?;

    Ok(())
}
