//! Configuration set
//!
//! A flat key/value view of the configuration, for example
//! `Tool.Expiration.ByPart = "true"`. Nested TOML or JSON tables are
//! flattened with `.` separators, so both of these files define the same key:
//!
//! ```toml
//! [Tool.Expiration]
//! ByPart = false
//! ```
//!
//! ```json
//! { "Tool.Expiration.ByPart": false }
//! ```

use chrono::TimeDelta;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::duration::parse_duration;
use crate::error::{SettingsError, SettingsResult};

/// Application directory under the platform configuration directory
pub const CONFIG_DIR_NAME: &str = "toollife";

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Flat key/value configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSet {
    values: BTreeMap<String, String>,
}

impl ConfigSet {
    /// Create an empty configuration set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, builder style
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    /// Set a value
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.values.insert(key.into(), value.to_string());
    }

    /// Remove a value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// Raw value of a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Is the set empty?
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keys in lexicographic order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Overwrite the values of this set with the ones of `other`
    pub fn merge(&mut self, other: &ConfigSet) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Parse a value, falling back to `default` when the key is missing or
    /// the value does not parse
    pub fn load_and_get<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(key) {
            None => default,
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(key, value = raw, error = %e, "Invalid config value, using the default");
                    default
                }
            },
        }
    }

    /// Parse a duration (seconds or `[d.]hh:mm:ss`), `None` when missing or invalid
    pub fn get_duration(&self, key: &str) -> Option<TimeDelta> {
        let raw = self.get(key)?;
        let duration = parse_duration(raw);
        if duration.is_none() {
            tracing::warn!(key, value = raw, "Invalid duration in config");
        }
        duration
    }

    /// Parse a duration, falling back to `default`
    pub fn load_and_get_duration(&self, key: &str, default: TimeDelta) -> TimeDelta {
        self.get_duration(key).unwrap_or(default)
    }

    /// Load a configuration set from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;

        let set = match extension(path) {
            Some("json") => Self::from_json_str(&content)?,
            Some("toml") => Self::from_toml_str(&content)?,
            other => {
                return Err(SettingsError::UnsupportedFormat(
                    other.unwrap_or_default().to_string(),
                ))
            }
        };

        tracing::debug!(path = %path.display(), keys = set.len(), "Configuration loaded");
        Ok(set)
    }

    /// Save the configuration set to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        let content = match extension(path) {
            Some("json") => serde_json::to_string_pretty(&self.values)?,
            Some("toml") => toml::to_string_pretty(&self.values)?,
            other => {
                return Err(SettingsError::UnsupportedFormat(
                    other.unwrap_or_default().to_string(),
                ))
            }
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> SettingsResult<Self> {
        let table: toml::Table = toml::from_str(content)?;
        let mut set = Self::new();
        for (key, value) in &table {
            set.flatten_toml(key.clone(), value);
        }
        Ok(set)
    }

    /// Parse JSON text, the top level must be an object
    pub fn from_json_str(content: &str) -> SettingsResult<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        let serde_json::Value::Object(map) = value else {
            return Err(SettingsError::invalid("<root>", "JSON object expected"));
        };
        let mut set = Self::new();
        for (key, value) in &map {
            set.flatten_json(key.clone(), value);
        }
        Ok(set)
    }

    /// Default configuration file: `<config dir>/toollife/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the default configuration file. A missing file is an empty set.
    pub fn load_default() -> SettingsResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            Some(path) => {
                tracing::debug!(path = %path.display(), "No configuration file, using the defaults");
                Ok(Self::new())
            }
            None => {
                tracing::debug!("No platform configuration directory, using the defaults");
                Ok(Self::new())
            }
        }
    }

    fn flatten_toml(&mut self, key: String, value: &toml::Value) {
        match value {
            toml::Value::Table(table) => {
                for (child, value) in table {
                    self.flatten_toml(format!("{}.{}", key, child), value);
                }
            }
            toml::Value::String(s) => self.set(key, s),
            toml::Value::Integer(i) => self.set(key, i),
            toml::Value::Float(f) => self.set(key, f),
            toml::Value::Boolean(b) => self.set(key, b),
            toml::Value::Datetime(d) => self.set(key, d),
            toml::Value::Array(_) => {
                tracing::warn!(key, "Array values are not supported in the configuration set");
            }
        }
    }

    fn flatten_json(&mut self, key: String, value: &serde_json::Value) {
        match value {
            serde_json::Value::Object(map) => {
                for (child, value) in map {
                    self.flatten_json(format!("{}.{}", key, child), value);
                }
            }
            serde_json::Value::String(s) => self.set(key, s),
            serde_json::Value::Number(n) => self.set(key, n),
            serde_json::Value::Bool(b) => self.set(key, b),
            serde_json::Value::Null => {}
            serde_json::Value::Array(_) => {
                tracing::warn!(key, "Array values are not supported in the configuration set");
            }
        }
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}
