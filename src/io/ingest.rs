//! CSV ingest and normalization.
//!
//! Each input file is a headerless comma-delimited table of
//! `time,wavelength,uncertainty` triples (years, nm, nm). Rows with missing
//! or non-numeric fields, or a zero uncertainty, are dropped without
//! per-row reporting (a deliberate limitation of the published analysis);
//! only aggregate counts are surfaced. The two tables are merged and sorted
//! ascending by time.

use std::fs::File;
use std::path::Path;

use crate::domain::Measurement;
use crate::error::AppError;

/// Ingest output: merged, time-sorted measurements plus aggregate counts.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub measurements: Vec<Measurement>,
    pub rows_read: usize,
    pub rows_dropped: usize,
}

/// Load, merge, and time-sort both measurement tables.
///
/// A missing file aborts with exit code 2 naming the path; an empty merged
/// set aborts with exit code 3 rather than flowing an empty set downstream.
pub fn load_measurements(path1: &Path, path2: &Path) -> Result<IngestedData, AppError> {
    let mut measurements = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_dropped = 0usize;

    for path in [path1, path2] {
        let (read, dropped) = read_table(path, &mut measurements)?;
        rows_read += read;
        rows_dropped += dropped;
    }

    if measurements.is_empty() {
        return Err(AppError::insufficient_data(
            "No valid rows remain after ingest validation.",
        ));
    }

    measurements.sort_by(|a, b| {
        a.time_years
            .partial_cmp(&b.time_years)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(IngestedData {
        measurements,
        rows_read,
        rows_dropped,
    })
}

/// Read one table, appending valid rows. Returns `(rows_read, rows_dropped)`.
fn read_table(path: &Path, out: &mut Vec<Measurement>) -> Result<(usize, usize), AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::input(format!(
            "Failed to open data file '{}': {e}. Please check the directory.",
            path.display()
        ))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut rows_read = 0usize;
    let mut rows_dropped = 0usize;

    for result in reader.records() {
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(_) => {
                rows_dropped += 1;
                continue;
            }
        };

        match parse_row(&record) {
            Some(m) => out.push(m),
            None => rows_dropped += 1,
        }
    }

    Ok((rows_read, rows_dropped))
}

/// Parse one record into a measurement; `None` means the row is invalid.
///
/// Invalid: fewer than three fields, any non-numeric/non-finite field, or
/// `uncertainty <= 0` (guards the chi-squared division downstream).
fn parse_row(record: &csv::StringRecord) -> Option<Measurement> {
    let time_years = parse_field(record.get(0))?;
    let wavelength_nm = parse_field(record.get(1))?;
    let uncertainty_nm = parse_field(record.get(2))?;

    if uncertainty_nm <= 0.0 {
        return None;
    }

    Some(Measurement {
        time_years,
        wavelength_nm,
        uncertainty_nm,
    })
}

fn parse_field(s: Option<&str>) -> Option<f64> {
    let s = s?;
    if s.is_empty() {
        return None;
    }
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
