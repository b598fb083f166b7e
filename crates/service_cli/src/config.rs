//! Run configuration management.
//!
//! Loaded from a TOML file with environment variable overrides; every
//! validation problem is collected and reported in one pass.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Run configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Path of the ledger extract (CSV)
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,

    /// Directory holding the reference tables (CSV)
    #[serde(default = "default_refs_dir")]
    pub refs_dir: PathBuf,

    /// Directory receiving the run archive and intermediate slices
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Worker pool size; defaults to the core count
    pub workers: Option<usize>,

    /// Canonical entity list used for per-entity reports and the
    /// occurrence summary's zero-fill
    #[serde(default)]
    pub entities: Vec<String>,
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("data/ledger.csv")
}

fn default_refs_dir() -> PathBuf {
    PathBuf::from("data/refs")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ledger_path: default_ledger_path(),
            refs_dir: default_refs_dir(),
            output_dir: default_output_dir(),
            log_level: default_log_level(),
            workers: None,
            entities: Vec::new(),
        }
    }
}

impl RunConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from the given path or fall back to defaults.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Apply environment variable overrides.
    pub fn with_env_override(mut self) -> Self {
        if let Ok(path) = std::env::var("INDICATOR_LEDGER_PATH") {
            self.ledger_path = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var("INDICATOR_REFS_DIR") {
            self.refs_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("INDICATOR_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Ok(level) = std::env::var("INDICATOR_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Ok(workers) = std::env::var("INDICATOR_WORKERS") {
            self.workers = workers.parse().ok();
        }
        self
    }

    /// Validate the configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.to_lowercase().as_str()) {
            errors.push(format!(
                "Invalid log_level '{}'. Valid values: {:?}",
                self.log_level, valid_log_levels
            ));
        }

        if let Some(workers) = self.workers {
            if workers == 0 {
                errors.push("workers must be greater than 0".to_string());
            }
        }

        if self.ledger_path.as_os_str().is_empty() {
            errors.push("ledger_path cannot be empty".to_string());
        }
        if self.refs_dir.as_os_str().is_empty() {
            errors.push("refs_dir cannot be empty".to_string());
        }
        if self.output_dir.as_os_str().is_empty() {
            errors.push("output_dir cannot be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load from file with environment overrides and validate.
    pub fn load_with_env_and_validate(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load_or_default(path).with_env_override();
        config.validate()?;
        Ok(config)
    }
}

/// Configuration error type.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading the config file
    #[error("IO error: {0}")]
    Io(String),
    /// Parse error in the config file
    #[error("Parse error: {0}")]
    Parse(String),
    /// Validation errors, all of them
    #[error("Validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = RunConfig::default();
        config.log_level = "loud".to_string();
        let result = config.validate();
        match result {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("log_level")));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_validate_zero_workers() {
        let mut config = RunConfig::default();
        config.workers = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_multiple_errors_collected() {
        let mut config = RunConfig::default();
        config.log_level = "loud".to_string();
        config.workers = Some(0);
        config.output_dir = PathBuf::from("");
        match config.validate() {
            Err(ConfigError::Validation(errors)) => assert!(errors.len() >= 3),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("indicators.toml");
        std::fs::write(
            &path,
            "ledger_path = \"extracts/march.csv\"\nentities = [\"FRANFINANCE\", \"MILLA\"]\n",
        )
        .unwrap();

        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.ledger_path, PathBuf::from("extracts/march.csv"));
        assert_eq!(config.entities.len(), 2);
        assert_eq!(config.log_level, "info");
    }
}
