//! Toollife Settings Crate
//!
//! Handles the configuration set and the resolved tool expiration settings.

pub mod config_set;
pub mod duration;
pub mod error;
pub mod expiration;

pub use config_set::ConfigSet;
pub use duration::parse_duration;
pub use error::{SettingsError, SettingsResult};
pub use expiration::{keys, ExpirationOverrides, ExpirationSettings, SisterToolsOrdering};
