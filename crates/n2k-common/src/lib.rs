//! NMEA 2000 logger common types.
//!
//! This crate provides foundational types shared by the logger crates:
//! - The fixed 181-column CSV schema and its version tag
//! - Serial (spreadsheet day-number) timestamp encoding
//! - The row model written once per sampling tick
//! - Decoded message types and the ingestion normalization step
//! - Common error types

pub mod error;
pub mod message;
pub mod row;
pub mod schema;
pub mod time;

pub use error::{Error, Result};
pub use message::{DecodedFrame, Field, FieldValue, InboundMessage, N2kMessage};
pub use row::{Row, Value};
pub use schema::{COLUMN_COUNT, COLUMN_NAMES, DEFAULT_BOAT_ID, FORMAT_VERSION, VERSION_MARKER};
pub use time::{from_serial_time, now_serial, serial_delta_seconds, to_serial_time};
