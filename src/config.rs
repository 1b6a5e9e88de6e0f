//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{EkfLogError, Result};
use crate::format::binary::{BinaryCodec, ByteOrder};
use crate::format::layout::{Field, FieldLayout, FieldSpec};
use crate::format::text::TextCodec;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub binary: BinaryConfig,

    #[serde(default)]
    pub text: TextConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Binary format configuration
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct BinaryConfig {
    #[serde(default)]
    pub byte_order: ByteOrder,

    /// Per-field overrides applied on top of the current layout
    #[serde(default)]
    pub layout: BTreeMap<Field, FieldSpec>,
}

/// Text format configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TextConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path; logs go to stderr when unset
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self { delimiter: default_delimiter() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

// Default value functions
fn default_delimiter() -> char { ',' }
fn default_log_level() -> String { "info".to_string() }

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

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
    /// use ekflog::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any value is unusable
    pub fn validate(&self) -> Result<()> {
        // The merged layout must still describe every field
        self.layout().validate()?;

        // Validate delimiter (csv works on single bytes)
        let delimiter = self.text.delimiter;
        if !delimiter.is_ascii() || delimiter == '"' || delimiter == '\n' || delimiter == '\r' {
            return Err(EkfLogError::Configuration(format!(
                "text delimiter {:?} must be a single ASCII character other than a quote or newline",
                delimiter
            )));
        }

        // Validate log level
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(EkfLogError::Configuration(format!(
                "log level must be one of: {}",
                LOG_LEVELS.join(", ")
            )));
        }

        if matches!(&self.logging.file, Some(file) if file.is_empty()) {
            return Err(EkfLogError::Configuration(
                "logging file cannot be empty when set".to_string(),
            ));
        }

        Ok(())
    }

    /// Current layout with the configured overrides applied
    pub fn layout(&self) -> FieldLayout {
        FieldLayout::current().merged(&self.binary.layout)
    }

    /// Binary codec described by this configuration
    pub fn binary_codec(&self) -> Result<BinaryCodec> {
        BinaryCodec::new(self.layout(), self.binary.byte_order)
    }

    /// Text codec described by this configuration
    pub fn text_codec(&self) -> Result<TextCodec> {
        u8::try_from(self.text.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .map(TextCodec::new)
            .ok_or_else(|| {
                EkfLogError::Configuration(format!(
                    "text delimiter {:?} is not an ASCII character",
                    self.text.delimiter
                ))
            })
    }
}
