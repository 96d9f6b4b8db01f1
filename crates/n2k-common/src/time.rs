//! Serial timestamp encoding.
//!
//! The `Utc` column holds a spreadsheet-style serial day number: fractional
//! days elapsed since 1899-12-30T00:00:00, with no timezone offset applied.

use chrono::{DateTime, Utc};

/// Seconds in one serial day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

const MICROS_PER_DAY: f64 = SECONDS_PER_DAY * 1_000_000.0;

/// Unix timestamp (seconds) of the serial epoch, 1899-12-30T00:00:00.
pub const SERIAL_EPOCH_UNIX_SECS: i64 = -2_209_161_600;

const SERIAL_EPOCH_UNIX_MICROS: i64 = SERIAL_EPOCH_UNIX_SECS * 1_000_000;

/// Convert an instant to a serial day number.
pub fn to_serial_time(instant: DateTime<Utc>) -> f64 {
    let micros = instant.timestamp_micros() - SERIAL_EPOCH_UNIX_MICROS;
    micros as f64 / MICROS_PER_DAY
}

/// Convert a serial day number back to an instant.
///
/// Returns `None` for non-finite input or values outside chrono's range.
/// Precision is one microsecond.
pub fn from_serial_time(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() {
        return None;
    }
    let offset = (serial * MICROS_PER_DAY).round();
    if offset.abs() >= i64::MAX as f64 {
        return None;
    }
    let micros = (offset as i64).checked_add(SERIAL_EPOCH_UNIX_MICROS)?;
    DateTime::from_timestamp_micros(micros)
}

/// Serial day number for the current instant.
pub fn now_serial() -> f64 {
    to_serial_time(Utc::now())
}

/// Seconds between two serial timestamps (`later - earlier`).
pub fn serial_delta_seconds(earlier: f64, later: f64) -> f64 {
    (later - earlier) * SECONDS_PER_DAY
}
