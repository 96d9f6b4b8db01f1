//! Error types shared by the logger crates.

use thiserror::Error;

/// Result type alias for common logger operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for schema, row, and ingestion operations.
#[derive(Error, Debug)]
pub enum Error {
    // Schema errors (20-29)
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    // Ingestion errors (30-39)
    #[error("message has no group identifier")]
    MissingGroupId,

    #[error("message is not a JSON object")]
    NotAnObject,

    // Serialization errors (60-69)
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    /// Used for detailed error reporting in JSON output.
    pub fn code(&self) -> u32 {
        match self {
            Error::UnknownColumn(_) => 20,
            Error::MissingGroupId => 30,
            Error::NotAnObject => 31,
            Error::Json(_) => 61,
        }
    }
}
