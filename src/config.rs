//! Engine configuration

use std::{fs, io, path::Path};

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading an [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file")]
    Io(#[from] io::Error),

    /// The config document is not valid.
    #[error("failed to parse config")]
    Yaml(#[from] serde_norway::Error),
}

/// What a regular discount's fixed amount is multiplied by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedAmountScope {
    /// Once per discount application
    #[default]
    PerOrder,

    /// Once per eligible line item
    PerLineItem,

    /// Once per eligible unit
    PerUnit,
}

/// Order in which units are drawn from an eligible pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSelection {
    /// Cart order
    #[default]
    ListOrder,

    /// Lowest unit price first, cart order on ties
    CheapestFirst,

    /// Highest unit price first, cart order on ties
    MostExpensiveFirst,
}

/// Pricing engine settings. Every field has a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Multiplier for regular discounts' fixed amount
    pub regular_fixed: FixedAmountScope,

    /// Unit draw order for bulk, bundle and buy-X-get-Y discounts
    pub unit_selection: UnitSelection,

    /// Whether evo entries list the units consumed per line item
    pub record_line_items: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            regular_fixed: FixedAmountScope::default(),
            unit_selection: UnitSelection::default(),
            record_line_items: true,
        }
    }
}

impl EngineConfig {
    /// Parse a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the document is not a valid config.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_norway::from_str(yaml)?)
    }

    /// Read and parse a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_yaml_str(&fs::read_to_string(path)?)
    }
}
