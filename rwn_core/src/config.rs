//! Configuration file support for rwn.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/rwn/config.toml`.

use crate::lexer::parse_clock_tenths;
use crate::validate::ValidationLimits;
use crate::{Error, Parser, Result, DEFAULT_MAX_NESTING_DEPTH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub parser: ParserConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub estimate: EstimateConfig,
}

/// Notation parser limits
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ParserConfig {
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: default_max_nesting_depth(),
        }
    }
}

/// Soft-warning thresholds used by `validate`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ValidationConfig {
    #[serde(default = "default_max_repeats")]
    pub max_repeats: u32,

    #[serde(default = "default_max_distance_meters")]
    pub max_distance_meters: u32,

    #[serde(default = "default_max_duration_seconds")]
    pub max_duration_seconds: u32,

    #[serde(default = "default_max_rest_seconds")]
    pub max_rest_seconds: u32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_repeats: default_max_repeats(),
            max_distance_meters: default_max_distance_meters(),
            max_duration_seconds: default_max_duration_seconds(),
            max_rest_seconds: default_max_rest_seconds(),
        }
    }
}

/// Duration estimate defaults
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EstimateConfig {
    /// Split per 500m used when a step has no absolute pace, as `m:ss`
    #[serde(default = "default_pace")]
    pub default_pace: String,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            default_pace: default_pace(),
        }
    }
}

// Default value functions
fn default_max_nesting_depth() -> usize {
    DEFAULT_MAX_NESTING_DEPTH
}

fn default_max_repeats() -> u32 {
    ValidationLimits::default().max_repeats
}

fn default_max_distance_meters() -> u32 {
    ValidationLimits::default().max_distance_meters
}

fn default_max_duration_seconds() -> u32 {
    ValidationLimits::default().max_duration_seconds
}

fn default_max_rest_seconds() -> u32 {
    ValidationLimits::default().max_rest_seconds
}

fn default_pace() -> String {
    "2:00".into()
}

impl ParserConfig {
    pub fn parser(&self) -> Parser {
        Parser::with_max_depth(self.max_nesting_depth)
    }
}

impl ValidationConfig {
    pub fn limits(&self) -> ValidationLimits {
        ValidationLimits {
            max_repeats: self.max_repeats,
            max_distance_meters: self.max_distance_meters,
            max_duration_seconds: self.max_duration_seconds,
            max_rest_seconds: self.max_rest_seconds,
        }
    }
}

impl EstimateConfig {
    /// Default pace in seconds per 500m
    pub fn default_pace_seconds(&self) -> Result<f64> {
        parse_pace_seconds(&self.default_pace)
    }
}

/// Parse an `m:ss` split into seconds per 500m
pub fn parse_pace_seconds(text: &str) -> Result<f64> {
    match parse_clock_tenths(text.trim()) {
        Some(tenths) if tenths > 0 => Ok(f64::from(tenths) / 10.0),
        _ => Err(Error::Config(format!(
            "Invalid pace {:?}, expected m:ss per 500m",
            text
        ))),
    }
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.check()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values that would make every call fail
    fn check(&self) -> Result<()> {
        if self.parser.max_nesting_depth == 0 {
            return Err(Error::Config(
                "parser.max_nesting_depth must be at least 1".into(),
            ));
        }
        self.estimate.default_pace_seconds()?;
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from(".config"));
        base.join("rwn").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.parser.max_nesting_depth, 16);
        assert_eq!(config.validation.max_repeats, 50);
        assert_eq!(config.validation.max_distance_meters, 50_000);
        assert_eq!(config.validation.limits(), ValidationLimits::default());
        assert_eq!(config.estimate.default_pace_seconds().unwrap(), 120.0);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[validation]
max_repeats = 30
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.validation.max_repeats, 30);
        assert_eq!(config.validation.max_rest_seconds, 1800); // default
        assert_eq!(config.estimate.default_pace, "2:00");
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.estimate.default_pace = "1:55.5".into();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.estimate.default_pace_seconds().unwrap(), 115.5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "[estimate]\ndefault_pace = \"fast\"\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));

        std::fs::write(&path, "[parser]\nmax_nesting_depth = 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
