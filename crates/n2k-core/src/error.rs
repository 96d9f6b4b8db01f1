//! Error types for the logger.
//!
//! [`LoggerError`] is fatal and only returned while constructing or starting
//! a logger. [`TickError`] covers transient failures inside the emission
//! loop; those are logged and retried, never returned to callers.

use std::path::{Path, PathBuf};

use n2k_config::ValidationError;
use thiserror::Error;

/// Fatal logger construction/start errors.
#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Cannot create data directory {}: {source}\n{}", .path.display(), remediation(.path))]
    DataDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write to data directory {}: {source}\n{}", .path.display(), remediation(.path))]
    DataDirectoryNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {}", join_errors(.0))]
    InvalidConfig(Vec<ValidationError>),

    #[error("invalid csv_filename_format {0:?}: not a valid strftime pattern")]
    FilenameFormat(String),

    #[error("failed to spawn emission worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Result type alias for logger construction.
pub type Result<T> = std::result::Result<T, LoggerError>;

/// Transient failures inside one emission tick.
#[derive(Error, Debug)]
pub enum TickError {
    #[error("failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to flush {path}: {source}")]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no free file name for {0} after {1} attempts")]
    NameExhausted(PathBuf, u32),

    #[error("invalid csv_filename_format {0:?}")]
    FilenameFormat(String),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Actionable next steps for an unusable data directory.
fn remediation(path: &Path) -> String {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    format!(
        "Possible solutions:\n  \
         1. Set logging.data_directory in config.yaml to a writable location (e.g. ~/n2k_data)\n  \
         2. Create the directory with the right owner: \
         sudo mkdir -p {dir} && sudo chown $USER {dir}\n  \
         3. Run the logger as a user that can write to {parent}",
        dir = path.display(),
        parent = parent.display(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_data_directory_error_is_actionable() {
        let err = LoggerError::DataDirectory {
            path: PathBuf::from("/root/n2k_data"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("Cannot create data directory /root/n2k_data"));
        assert!(msg.contains("Permission denied"));
        assert!(msg.contains("Possible solutions"));
        assert!(msg.contains("config.yaml"));
        assert!(msg.contains("write to /root"));
    }

    #[test]
    fn test_invalid_config_lists_fields() {
        let err = LoggerError::InvalidConfig(vec![
            ValidationError {
                field: "sampling.period_ms".into(),
                message: "must be at least 1".into(),
            },
            ValidationError {
                field: "logging.flush_interval_secs".into(),
                message: "must be at least 1".into(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "invalid configuration: sampling.period_ms: must be at least 1; \
             logging.flush_interval_secs: must be at least 1"
        );
    }
}
