//! Configuration parsing and management.
//!
//! This module handles parsing of the calculator configuration file (TOML)
//! that controls rate formatting and tier validation policy. Every field has
//! a default, so an empty file (or no file at all) is a valid configuration.
//!
//! ```toml
//! [format]
//! fraction_digits = 2
//! percentage_joiner = "in"
//!
//! [tiers]
//! split_policy = "independent"
//! split_tolerance = 0.0001
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tier::SplitPolicy;

/// Largest accepted `format.fraction_digits`.
pub const MAX_FRACTION_DIGITS: u8 = 8;

/// Top-level calculator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CalculatorConfig {
    /// Rate formatting.
    #[serde(default)]
    pub format: FormatConfig,

    /// Tier validation.
    #[serde(default)]
    pub tiers: TierConfig,
}

impl CalculatorConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML file, or return defaults if the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed, or
    /// validated.
    pub fn from_file_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or a value is out of range.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validates value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.format.fraction_digits > MAX_FRACTION_DIGITS {
            return Err(ConfigError::Validation(format!(
                "format.fraction_digits must be at most {MAX_FRACTION_DIGITS}, got {}",
                self.format.fraction_digits
            )));
        }
        let tolerance = self.tiers.split_tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ConfigError::Validation(format!(
                "tiers.split_tolerance must be a non-negative number, got {tolerance}"
            )));
        }
        Ok(())
    }
}

/// Rate formatting configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatConfig {
    /// Maximum number of decimals in a formatted rate. Trailing zeros are
    /// always trimmed.
    #[serde(default = "default_fraction_digits")]
    pub fraction_digits: u8,

    /// Word placed between a percentage and the token label
    /// (`"7.5% in USDC"`).
    #[serde(default = "default_percentage_joiner")]
    pub percentage_joiner: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            fraction_digits: default_fraction_digits(),
            percentage_joiner: default_percentage_joiner(),
        }
    }
}

/// Tier validation configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierConfig {
    /// Whether the three split percentages must sum to one.
    #[serde(default)]
    pub split_policy: SplitPolicySetting,

    /// Allowed deviation from one under `sum_to_one`.
    #[serde(default = "default_split_tolerance")]
    pub split_tolerance: f64,
}

impl TierConfig {
    /// Returns the split policy to validate tiers with.
    #[must_use]
    pub const fn policy(&self) -> SplitPolicy {
        match self.split_policy {
            SplitPolicySetting::Independent => SplitPolicy::Independent,
            SplitPolicySetting::SumToOne => SplitPolicy::SumToOne {
                tolerance: self.split_tolerance,
            },
        }
    }
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            split_policy: SplitPolicySetting::default(),
            split_tolerance: default_split_tolerance(),
        }
    }
}

/// Split policy as written in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicySetting {
    /// Split percentages are independent fields.
    #[default]
    Independent,
    /// Split percentages must sum to one within `split_tolerance`.
    SumToOne,
}

const fn default_fraction_digits() -> u8 {
    2
}

fn default_percentage_joiner() -> String {
    "in".to_string()
}

const fn default_split_tolerance() -> f64 {
    1e-4
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading configuration file.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Validation error.
    #[error("configuration validation failed: {0}")]
    Validation(String),
}
