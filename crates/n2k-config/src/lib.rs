//! NMEA 2000 logger configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the logger configuration file
//! - Config resolution (CLI → env → working directory → defaults)
//! - Semantic validation of loaded values

pub mod logger;
pub mod resolve;
pub mod validate;

pub use logger::{LoggerConfig, LoggingSection, MappingSection, SamplingSection};
pub use resolve::{load_config, resolve_config, ConfigError, ConfigSource, ENV_CONFIG_PATH};
pub use validate::{validate, ValidationError, ValidationResult};

/// Default configuration file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
