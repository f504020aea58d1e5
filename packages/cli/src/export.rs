//! Report exports read by the CLI.
//!
//! An export is a JSON array of report objects. Only `id`, `latitude` and
//! `longitude` are read; everything else is ignored. Coordinates may be
//! numbers, numeric strings or `null`. Anything else leaves the report
//! unlocated.

use std::path::Path;

use sahaayak_priority::{Classification, Locatable, ProximityIndex, classify_all, classify_all_with};
use sahaayak_report_models::{Location, ReportId};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors from reading an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a JSON array of objects with an integer `id`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct RawReport {
    id: i64,
    #[serde(default)]
    latitude: Value,
    #[serde(default)]
    longitude: Value,
}

/// The slice of a report the classifier needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedReport {
    /// Report id.
    pub id: ReportId,
    /// Parsed location.
    pub location: Location,
}

impl Locatable for ExportedReport {
    fn report_id(&self) -> ReportId {
        self.id
    }

    fn location(&self) -> Location {
        self.location
    }
}

fn coordinate(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parses an export from JSON text.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if the text is not an array of report
/// objects.
pub fn parse(json: &str) -> Result<Vec<ExportedReport>, ExportError> {
    let raw: Vec<RawReport> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .map(|r| ExportedReport {
            id: ReportId(r.id),
            location: Location::from_parts(coordinate(&r.latitude), coordinate(&r.longitude)),
        })
        .collect())
}

/// Reads and parses an export file.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be read or parsed.
pub fn load(path: &Path) -> Result<Vec<ExportedReport>, ExportError> {
    let text = std::fs::read_to_string(path)?;
    let reports = parse(&text)?;
    let located = reports.iter().filter(|r| r.location.is_located()).count();
    log::info!(
        "Loaded {} reports ({located} located) from {}",
        reports.len(),
        path.display()
    );
    Ok(reports)
}

/// Classifies an export against itself.
#[must_use]
pub fn classify(reports: &[ExportedReport], use_index: bool) -> Classification {
    if use_index {
        classify_all_with(&ProximityIndex::new(reports), reports)
    } else {
        classify_all(reports)
    }
}
