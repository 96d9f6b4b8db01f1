//! Fixed-rate NMEA 2000 sample logger.
//!
//! Decoded messages are mapped onto a fixed 181-column schema, held in a
//! latest-value buffer and written once per sampling period to CSV:
//!
//! - [`mapper`]: PGN/field → column translation
//! - [`buffer`]: lock-guarded latest-value row
//! - [`logger`]: lifecycle and the emission worker
//! - [`sink`]: CSV file creation, naming and row encoding
//! - [`stats`]: session maxima and counters
//! - [`validate`]: schema and timing checks for finished files

pub mod buffer;
pub mod cli;
pub mod error;
pub mod exit_codes;
pub mod logger;
pub mod logging;
pub mod mapper;
pub mod sink;
pub mod stats;
pub mod validate;

pub use buffer::SampleBuffer;
pub use error::{LoggerError, Result, TickError};
pub use exit_codes::ExitCode;
pub use logger::{DataLogger, LoggerState};
pub use mapper::{ColumnAssignment, MapperOptions, PgnMapper};
pub use sink::LogFile;
pub use stats::{Statistics, StatsTracker};
pub use validate::{
    validate_schema, validate_timing, validate_timing_with_period, IntervalStats, ValidationReport,
};
