//! Error types for implore-deferred-selection

use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for selection operations
pub type Result<T> = std::result::Result<T, SelectionError>;

/// Code reported when the data source has no key
pub const MISSING_KEY_CODE: &str = "E1042";

/// Main error type for selection operations
#[derive(Error, Debug)]
pub enum SelectionError {
    /// The key accessor is configured but yields no key
    #[error("E1042: deferred selection requires the data source key to be specified")]
    MissingKey,

    /// Retrieval through the data source failed
    #[error("Data source error: {0}")]
    DataSource(#[from] DataSourceError),

    /// A filter could not be decoded
    #[error("Grammar error: {0}")]
    Grammar(#[from] GrammarError),

    /// Invalid configuration
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl SelectionError {
    /// Stable error code, for errors that carry one
    pub fn code(&self) -> Option<&'static str> {
        match self {
            SelectionError::MissingKey => Some(MISSING_KEY_CODE),
            _ => None,
        }
    }
}

/// Errors raised by a data source while loading rows
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataSourceError {
    #[error("Load failed: {0}")]
    Load(String),
}

/// Errors decoding the filter array grammar
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GrammarError {
    #[error("Expected an array, found {0}")]
    NotAnArray(String),

    #[error("Unknown comparison operator: {0}")]
    UnknownComparison(String),

    #[error("Unknown logical operator: {0}")]
    UnknownLogical(String),

    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
}
