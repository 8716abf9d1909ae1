//! Error types for the settings crate.
//!
//! This module provides structured error types for configuration loading
//! and settings validation.

use std::io;
use thiserror::Error;

/// Errors that can occur during settings operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A configuration value is invalid.
    #[error("Invalid value for '{key}': {value}")]
    InvalidValue { key: String, value: String },

    /// The configuration file format is not supported.
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

impl SettingsError {
    /// Create an invalid value error
    pub fn invalid(key: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.to_string(),
        }
    }
}

impl From<SettingsError> for toollife_core::Error {
    fn from(err: SettingsError) -> Self {
        toollife_core::Error::Config(err.to_string())
    }
}

/// Result type alias for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;
