//! Configuration for deferred selection
//!
//! Describes the key accessor, the base filter and an initial (typically
//! persisted) selection filter. Loadable from TOML or JSON:
//!
//! ```toml
//! key = ["region", "id"]
//! filter = ["status", "=", "open"]
//! selection_filter = [
//!     ["status", "=", "open"],
//!     "and",
//!     ["!", [["region", "=", "eu"], "and", ["id", "=", 7]]],
//! ]
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::expr::FilterExpr;
use crate::key::KeyExpr;

/// Selection configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Field(s) identifying a row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<KeyExpr>,
    /// Base filter of the displayed data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterExpr>,
    /// Initial selection; absent means everything is selected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection_filter: Option<FilterExpr>,
}

impl SelectionConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.key {
            Some(KeyExpr::Single(field)) if field.is_empty() => {
                Err(ConfigError::InvalidKey("key field name is empty".to_string()))
            }
            Some(KeyExpr::Compound(fields)) if fields.is_empty() => {
                Err(ConfigError::InvalidKey("compound key has no fields".to_string()))
            }
            Some(KeyExpr::Compound(fields)) if fields.iter().any(String::is_empty) => Err(
                ConfigError::InvalidKey("compound key has an empty field name".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

/// Configuration error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}
