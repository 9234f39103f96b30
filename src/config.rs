//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{GattError, Result};
use crate::telemetry::OutputFormat;

/// Output formats the telemetry writer supports
pub const OUTPUT_FORMATS: &[&str] = &["jsonl", "text"];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub cadence: CadenceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Telemetry output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_format")]
    pub format: String,

    #[serde(default = "default_timestamps")]
    pub timestamps: bool,
}

/// Cadence derivation configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CadenceConfig {
    /// Correct 16-bit counter rollover between samples
    #[serde(default = "default_correct_wraparound")]
    pub correct_wraparound: bool,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for a daily rolling log file; empty logs to stderr only
    #[serde(default)]
    pub log_dir: String,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

// Default value functions
fn default_output_format() -> String { "jsonl".to_string() }
fn default_timestamps() -> bool { true }

fn default_correct_wraparound() -> bool { true }

fn default_log_level() -> String { "info".to_string() }
fn default_file_prefix() -> String { "gatt-measure.log".to_string() }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_output_format(),
            timestamps: default_timestamps(),
        }
    }
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            correct_wraparound: default_correct_wraparound(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: String::new(),
            file_prefix: default_file_prefix(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gatt_measure::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if OutputFormat::from_name(&self.output.format).is_none() {
            return Err(invalid(format!(
                "output format must be one of: {}",
                OUTPUT_FORMATS.join(", ")
            )));
        }

        if self.logging.level.trim().is_empty() {
            return Err(invalid("logging level cannot be empty"));
        }

        if !self.logging.log_dir.is_empty() && self.logging.file_prefix.is_empty() {
            return Err(invalid("logging file_prefix cannot be empty when log_dir is set"));
        }

        Ok(())
    }

    /// Configured output format, JSON Lines if unrecognized
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_name(&self.output.format).unwrap_or_default()
    }
}

fn invalid(message: impl std::fmt::Display) -> GattError {
    GattError::Config(toml::de::Error::custom(message))
}
