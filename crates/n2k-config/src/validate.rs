//! Semantic validation of a loaded configuration.

use std::fmt;

use crate::logger::LoggerConfig;

/// A single invalid setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending key, e.g. `sampling.period_ms`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Outcome of [`validate`]: every problem found, not just the first.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Check value ranges that serde cannot express.
pub fn validate(config: &LoggerConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if config.logging.data_directory.as_os_str().is_empty() {
        errors.push(ValidationError::new("logging.data_directory", "must not be empty"));
    }
    if config.logging.csv_filename_format.trim().is_empty() {
        errors.push(ValidationError::new(
            "logging.csv_filename_format",
            "must not be empty",
        ));
    }
    if config.logging.csv_filename_format.contains('/') {
        errors.push(ValidationError::new(
            "logging.csv_filename_format",
            "must be a file name, not a path",
        ));
    }
    if config.logging.flush_interval_secs == 0 {
        errors.push(ValidationError::new("logging.flush_interval_secs", "must be at least 1"));
    }
    if config.sampling.period_ms == 0 {
        errors.push(ValidationError::new("sampling.period_ms", "must be at least 1"));
    }
    if config.sampling.error_backoff_ms == 0 {
        errors.push(ValidationError::new("sampling.error_backoff_ms", "must be at least 1"));
    }
    if config.sampling.boat_id.contains([',', '\n', '\r']) {
        errors.push(ValidationError::new(
            "sampling.boat_id",
            "must not contain commas or line breaks",
        ));
    }
    if config.sampling.rotate_interval_secs == Some(0) {
        errors.push(ValidationError::new(
            "sampling.rotate_interval_secs",
            "must be at least 1 when set",
        ));
    }
    if config.sampling.timing_warn_every == 0 {
        errors.push(ValidationError::new("sampling.timing_warn_every", "must be at least 1"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
