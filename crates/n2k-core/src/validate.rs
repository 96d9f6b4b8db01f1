//! Post-hoc checks for log files: schema conformance and sampling cadence.
//!
//! Validators never fail with an error value. Every problem, including an
//! unreadable file, becomes a human-readable line in the returned report.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use n2k_common::schema::{is_version_line, UTC_INDEX, VERSION_MARKER};
use n2k_common::{serial_delta_seconds, COLUMN_COUNT, COLUMN_NAMES};
use serde::Serialize;

/// Nominal spacing between rows for the default 1 Hz check.
pub const NOMINAL_PERIOD_SECS: f64 = 1.0;

/// Default allowed deviation from the nominal period.
pub const DEFAULT_TIMING_TOLERANCE_SECS: f64 = 0.2;

/// Outcome of one validator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervals: Option<IntervalStats>,
}

/// Gap statistics collected by the timing check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IntervalStats {
    pub intervals: usize,
    pub outside_tolerance: usize,
    pub max_deviation_secs: f64,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            passed: errors.is_empty(),
            errors,
            intervals: None,
        }
    }
}

fn open_error(path: &Path, err: &io::Error) -> String {
    if err.kind() == io::ErrorKind::NotFound {
        format!("File not found: {}", path.display())
    } else {
        format!("Error reading file: {err}")
    }
}

/// Check the header row against the schema and the second line for the version tag.
pub fn validate_schema(path: impl AsRef<Path>) -> ValidationReport {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => return ValidationReport::from_errors(vec![open_error(path, &e)]),
    };
    let mut lines = BufReader::new(file).lines();
    let mut next_line = || lines.next().transpose().map(Option::unwrap_or_default);

    let mut errors = Vec::new();
    let header = match next_line() {
        Ok(line) => line,
        Err(e) => return ValidationReport::from_errors(vec![format!("Error reading file: {e}")]),
    };
    let columns: Vec<&str> = header.trim().split(',').collect();
    if columns.len() != COLUMN_COUNT {
        errors.push(format!(
            "Column count mismatch: expected {COLUMN_COUNT}, got {}",
            columns.len()
        ));
    }
    for (i, (expected, actual)) in COLUMN_NAMES.iter().zip(&columns).enumerate() {
        if expected != actual {
            errors.push(format!("Column {i} mismatch: expected '{expected}', got '{actual}'"));
        }
    }

    match next_line() {
        Ok(line) => {
            let version = line.trim();
            if !is_version_line(version) {
                errors.push(format!(
                    "Version line format error: expected '{VERSION_MARKER}...', got '{version}'"
                ));
            }
        }
        Err(e) => errors.push(format!("Error reading file: {e}")),
    }

    ValidationReport::from_errors(errors)
}

/// Check that consecutive rows are one second apart within `tolerance` seconds.
pub fn validate_timing(path: impl AsRef<Path>, tolerance: f64) -> ValidationReport {
    validate_timing_with_period(path, NOMINAL_PERIOD_SECS, tolerance)
}

/// Timing check against an arbitrary nominal period.
pub fn validate_timing_with_period(
    path: impl AsRef<Path>,
    period_secs: f64,
    tolerance: f64,
) -> ValidationReport {
    let path = path.as_ref();
    let timestamps = match read_timestamps(path) {
        Ok(ts) => ts,
        Err(message) => return ValidationReport::from_errors(vec![message]),
    };
    if timestamps.len() < 2 {
        return ValidationReport::from_errors(vec![
            "Insufficient data rows for timing validation".to_string(),
        ]);
    }

    let mut stats = IntervalStats {
        intervals: timestamps.len() - 1,
        ..IntervalStats::default()
    };
    for pair in timestamps.windows(2) {
        let deviation = (serial_delta_seconds(pair[0], pair[1]) - period_secs).abs();
        stats.max_deviation_secs = stats.max_deviation_secs.max(deviation);
        if deviation > tolerance {
            stats.outside_tolerance += 1;
        }
    }

    let mut errors = Vec::new();
    if stats.outside_tolerance > 0 {
        let pct = stats.outside_tolerance as f64 / stats.intervals as f64 * 100.0;
        let rate = if period_secs == NOMINAL_PERIOD_SECS {
            "1 Hz".to_string()
        } else {
            format!("{period_secs}s period")
        };
        errors.push(format!(
            "Timing validation failed: {} out of {} intervals ({pct:.1}%) \
             outside {rate} ± {tolerance}s tolerance",
            stats.outside_tolerance, stats.intervals
        ));
    }

    ValidationReport {
        intervals: Some(stats),
        ..ValidationReport::from_errors(errors)
    }
}

/// Serial timestamps of every data row that carries a parseable one.
pub(crate) fn read_timestamps(path: &Path) -> Result<Vec<f64>, String> {
    let file = File::open(path).map_err(|e| open_error(path, &e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let mut timestamps = Vec::new();
    // header and version lines
    for record in reader.records().skip(2) {
        let record = record.map_err(|e| format!("Error reading file: {e}"))?;
        let parsed = record
            .get(UTC_INDEX)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|ts| ts.is_finite());
        if let Some(ts) = parsed {
            timestamps.push(ts);
        }
    }
    Ok(timestamps)
}
