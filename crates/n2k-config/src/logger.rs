//! Logger configuration types.
//!
//! Every field has a default so a partial file (or none at all) still yields
//! a complete configuration. Unknown top-level sections such as `can` or
//! `display` are ignored; they belong to other components.

use std::path::PathBuf;
use std::time::Duration;

use n2k_common::DEFAULT_BOAT_ID;
use serde::{Deserialize, Serialize};

/// Directory name used under the platform data directory.
const DATA_DIR_NAME: &str = "n2k_logger";

/// Fallback data directory when the platform has none.
const FALLBACK_DATA_DIR: &str = "n2k_data";

/// Complete logger configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggerConfig {
    #[serde(default)]
    pub logging: LoggingSection,

    #[serde(default)]
    pub sampling: SamplingSection,

    #[serde(default)]
    pub mapping: MappingSection,
}

/// Output file settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Directory that receives the CSV files.
    pub data_directory: PathBuf,

    /// strftime pattern for new file names (local time).
    pub csv_filename_format: String,

    /// Seconds between explicit flushes of the open file.
    #[serde(alias = "flush_interval")]
    pub flush_interval_secs: u64,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            data_directory: default_data_directory(),
            csv_filename_format: "%Y%b%d_%H%M%S.csv".to_string(),
            flush_interval_secs: 10,
        }
    }
}

/// Emission loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingSection {
    /// Tick period in milliseconds.
    pub period_ms: u64,

    /// Value written to the `Boat` column.
    pub boat_id: String,

    /// Start a new file after this many seconds. `None` keeps one file per session.
    pub rotate_interval_secs: Option<u64>,

    /// Upper bound on how long `stop()` waits for the worker.
    pub stop_timeout_ms: u64,

    /// Pause after a failed tick before the next attempt.
    pub error_backoff_ms: u64,

    /// Log every Nth timing overrun (the first is always logged).
    pub timing_warn_every: u64,
}

impl Default for SamplingSection {
    fn default() -> Self {
        Self {
            period_ms: 1000,
            boat_id: DEFAULT_BOAT_ID.to_string(),
            rotate_interval_secs: None,
            stop_timeout_ms: 5000,
            error_backoff_ms: 1000,
            timing_warn_every: 10,
        }
    }
}

/// PGN mapping options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingSection {
    /// Feed water-referenced speed into `SOG` until a ground-referenced
    /// source reports.
    pub water_speed_as_sog: bool,
}

impl LoggerConfig {
    /// Configuration writing to `data_directory` with every other value defaulted.
    pub fn with_data_directory(data_directory: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.logging.data_directory = data_directory.into();
        config
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.sampling.period_ms)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.logging.flush_interval_secs)
    }

    pub fn rotate_interval(&self) -> Option<Duration> {
        self.sampling.rotate_interval_secs.map(Duration::from_secs)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.sampling.stop_timeout_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.sampling.error_backoff_ms)
    }
}

fn default_data_directory() -> PathBuf {
    dirs::data_dir()
        .map(|base| base.join(DATA_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_DATA_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoggerConfig::default();
        assert_eq!(config.period(), Duration::from_secs(1));
        assert_eq!(config.flush_interval(), Duration::from_secs(10));
        assert_eq!(config.rotate_interval(), None);
        assert_eq!(config.sampling.boat_id, "0");
        assert_eq!(config.logging.csv_filename_format, "%Y%b%d_%H%M%S.csv");
        assert!(!config.mapping.water_speed_as_sog);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "logging:\n  data_directory: /tmp/boat\n  flush_interval: 3\n";
        let config: LoggerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.logging.data_directory, PathBuf::from("/tmp/boat"));
        assert_eq!(config.logging.flush_interval_secs, 3);
        assert_eq!(config.sampling.period_ms, 1000);
    }

    #[test]
    fn test_unknown_sections_ignored() {
        let yaml = "can:\n  bitrate: 250000\ndisplay:\n  color: red\nsampling:\n  period_ms: 500\n";
        let config: LoggerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.period(), Duration::from_millis(500));
    }

    #[test]
    fn test_with_data_directory() {
        let config = LoggerConfig::with_data_directory("/data/n2k");
        assert_eq!(config.logging.data_directory, PathBuf::from("/data/n2k"));
        assert_eq!(config.sampling, SamplingSection::default());
    }
}
