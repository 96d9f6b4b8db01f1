//! Configuration file resolution and loading.
//!
//! Lookup order: explicit path → `N2K_LOGGER_CONFIG` → `config.yaml` in the
//! working directory → built-in defaults. An explicitly requested file that
//! is missing is an error; a missing working-directory file is not.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::logger::LoggerConfig;
use crate::validate::{validate, ValidationError};
use crate::DEFAULT_CONFIG_FILE;

/// Environment variable naming a configuration file.
pub const ENV_CONFIG_PATH: &str = "N2K_LOGGER_CONFIG";

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to parse JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Where the resolved configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Environment(PathBuf),
    WorkingDirectory(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(p) => write!(f, "{} (--config)", p.display()),
            Self::Environment(p) => write!(f, "{} (${})", p.display(), ENV_CONFIG_PATH),
            Self::WorkingDirectory(p) => write!(f, "{}", p.display()),
            Self::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// Load and validate a configuration file. YAML unless the extension is `.json`.
pub fn load_config(path: &Path) -> Result<LoggerConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let config: LoggerConfig = if is_json {
        serde_json::from_str(&content).map_err(|e| ConfigError::Json {
            path: path.to_path_buf(),
            source: e,
        })?
    } else if content.trim().is_empty() {
        LoggerConfig::default()
    } else {
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Yaml {
            path: path.to_path_buf(),
            source: e,
        })?
    };

    validate(&config).map_err(ConfigError::Invalid)?;
    debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

/// Resolve the configuration following the documented lookup order.
pub fn resolve_config(
    explicit: Option<&Path>,
) -> Result<(LoggerConfig, ConfigSource), ConfigError> {
    let env = std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from);
    resolve_config_in(explicit, env, Path::new("."))
}

fn resolve_config_in(
    explicit: Option<&Path>,
    env_path: Option<PathBuf>,
    working_dir: &Path,
) -> Result<(LoggerConfig, ConfigSource), ConfigError> {
    if let Some(path) = explicit {
        let config = load_config(path)?;
        return Ok((config, ConfigSource::Explicit(path.to_path_buf())));
    }

    if let Some(path) = env_path.filter(|p| !p.as_os_str().is_empty()) {
        let config = load_config(&path)?;
        return Ok((config, ConfigSource::Environment(path)));
    }

    let local = working_dir.join(DEFAULT_CONFIG_FILE);
    if local.exists() {
        let config = load_config(&local)?;
        return Ok((config, ConfigSource::WorkingDirectory(local)));
    }

    warn!(path = %local.display(), "config file not found, using defaults");
    Ok((LoggerConfig::default(), ConfigSource::Defaults))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_yaml() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "config.yaml", "sampling:\n  boat_id: \"42\"\n");
        let config = load_config(&path).unwrap();
        assert_eq!(config.sampling.boat_id, "42");
    }

    #[test]
    fn test_load_json() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "config.json", r#"{"mapping": {"water_speed_as_sog": true}}"#);
        let config = load_config(&path).unwrap();
        assert!(config.mapping.water_speed_as_sog);
    }

    #[test]
    fn test_empty_yaml_is_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "config.yaml", "\n");
        assert_eq!(load_config(&path).unwrap(), LoggerConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "config.yaml", "sampling:\n  period_ms: 0\n");
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("sampling.period_ms"));
    }

    #[test]
    fn test_bad_yaml_names_file() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "config.yaml", "logging: [unclosed\n");
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
        assert!(err.to_string().contains("config.yaml"));
    }

    #[test]
    fn test_explicit_missing_is_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.yaml");
        let err = resolve_config_in(Some(&missing), None, tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_resolution_order() {
        let tmp = TempDir::new().unwrap();
        let explicit = write(&tmp, "explicit.yaml", "sampling:\n  boat_id: explicit\n");
        let env = write(&tmp, "env.yaml", "sampling:\n  boat_id: env\n");
        write(&tmp, DEFAULT_CONFIG_FILE, "sampling:\n  boat_id: local\n");

        let (config, source) =
            resolve_config_in(Some(&explicit), Some(env.clone()), tmp.path()).unwrap();
        assert_eq!(config.sampling.boat_id, "explicit");
        assert_eq!(source, ConfigSource::Explicit(explicit));

        let (config, source) = resolve_config_in(None, Some(env.clone()), tmp.path()).unwrap();
        assert_eq!(config.sampling.boat_id, "env");
        assert_eq!(source, ConfigSource::Environment(env));

        let (config, source) = resolve_config_in(None, None, tmp.path()).unwrap();
        assert_eq!(config.sampling.boat_id, "local");
        assert!(matches!(source, ConfigSource::WorkingDirectory(_)));
    }

    #[test]
    fn test_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let (config, source) = resolve_config_in(None, None, tmp.path()).unwrap();
        assert_eq!(source, ConfigSource::Defaults);
        assert_eq!(config, LoggerConfig::default());
    }
}
