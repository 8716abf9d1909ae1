//! Tool expiration settings
//!
//! Resolved once per forecast from the configuration set and the request
//! overrides. Overrides take precedence, then the configuration set, then
//! the defaults below.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use toollife_core::ProgressMode;

use crate::config_set::ConfigSet;
use crate::error::{SettingsError, SettingsResult};

/// Configuration keys
pub mod keys {
    /// Progress estimator used for the active tools: `""`, `cycle` or `operation`
    pub const PROGRESS: &str = "Tool.Expiration.Progress";
    /// Tool lives in number of parts really count parts, not cycles
    pub const BY_PART: &str = "Tool.Expiration.ByPart";
    /// Tool lives in number of times really count uses, not cycles
    pub const BY_NUMBER_OF_TIMES: &str = "Tool.Expiration.ByNumberOfTimes";
    /// Max age of the last effective operation slot
    pub const EFFECTIVE_OPERATION_MAX_AGE: &str = "Tool.Expiration.EffectiveOperationMaxAge";
    /// Number of full cycles under which the cycle progress refines a duration estimate
    pub const MIN_CYCLE_NUMBER_FOR_CYCLE_PROGRESS: &str =
        "Tool.Expiration.MinCycleNumberForCycleProgress";
    /// Computation budget of one forecast
    pub const TIMEOUT_BUDGET: &str = "Tool.Expiration.TimeoutBudget";
    /// Max lag of the detection watermark before a forecast is pending
    pub const DETECTION_MAX_LAG: &str = "Tool.Expiration.DetectionMaxLag";
    /// `legacy` or `fixed` ordering of the valid sister tools
    pub const VALID_SISTER_TOOLS_ORDERING: &str = "Tool.Expiration.ValidSisterToolsOrdering";
    /// Short cache timeout
    pub const CACHE_TIMEOUT_SHORT: &str = "Cache.Timeout.CurrentShort";
    /// Long cache timeout
    pub const CACHE_TIMEOUT_LONG: &str = "Cache.Timeout.CurrentLong";
}

/// How the valid sister tools flag takes part in the ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SisterToolsOrdering {
    /// The flag never changes the order
    #[default]
    Legacy,
    /// Tools with valid sister tools after them sort after the others
    Fixed,
}

impl fmt::Display for SisterToolsOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Fixed => write!(f, "fixed"),
        }
    }
}

impl FromStr for SisterToolsOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "fixed" => Ok(Self::Fixed),
            other => Err(format!("Unknown sister tools ordering: {}", other)),
        }
    }
}

/// Per request overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpirationOverrides {
    /// Progress estimator
    pub progress: Option<ProgressMode>,
    /// Parts are really counted by part
    pub by_part: Option<bool>,
    /// Uses are really counted by use
    pub by_number_of_times: Option<bool>,
    /// Max age of the effective operation, in seconds
    pub effective_operation_max_age_secs: Option<u64>,
    /// Precision threshold of the duration estimates, in cycles
    pub min_cycle_number_for_cycle_progress: Option<i64>,
    /// Computation budget, in milliseconds
    pub timeout_budget_ms: Option<u64>,
    /// Max lag of the detection watermark, in seconds
    pub detection_max_lag_secs: Option<u64>,
    /// Ordering of the valid sister tools
    pub valid_sister_tools_ordering: Option<SisterToolsOrdering>,
}

/// Resolved expiration settings
#[derive(Debug, Clone, PartialEq)]
pub struct ExpirationSettings {
    /// Progress estimator
    pub progress_mode: ProgressMode,
    /// Parts are really counted by part
    pub by_part: bool,
    /// Uses are really counted by use
    pub by_number_of_times: bool,
    /// Max age of the effective operation
    pub effective_operation_max_age: TimeDelta,
    /// Precision threshold of the duration estimates, in cycles
    pub min_cycle_number_for_cycle_progress: i64,
    /// Computation budget
    pub timeout_budget: Duration,
    /// Max lag of the detection watermark, `None` to never report a pending forecast
    pub detection_max_lag: Option<TimeDelta>,
    /// Ordering of the valid sister tools
    pub valid_sister_tools_ordering: SisterToolsOrdering,
    /// Short cache timeout
    pub cache_timeout_short: TimeDelta,
    /// Long cache timeout
    pub cache_timeout_long: TimeDelta,
}

impl Default for ExpirationSettings {
    fn default() -> Self {
        Self {
            progress_mode: ProgressMode::None,
            by_part: true,
            by_number_of_times: true,
            effective_operation_max_age: TimeDelta::days(7),
            min_cycle_number_for_cycle_progress: 1,
            timeout_budget: Duration::from_secs(30),
            detection_max_lag: None,
            valid_sister_tools_ordering: SisterToolsOrdering::Legacy,
            cache_timeout_short: TimeDelta::minutes(3),
            cache_timeout_long: TimeDelta::minutes(10),
        }
    }
}

impl ExpirationSettings {
    /// Resolve the settings of one forecast
    pub fn resolve(config: &ConfigSet, overrides: &ExpirationOverrides) -> SettingsResult<Self> {
        let defaults = Self::default();

        let timeout_budget = match overrides.timeout_budget_ms {
            Some(ms) => Duration::from_millis(ms),
            None => config
                .get_duration(keys::TIMEOUT_BUDGET)
                .and_then(|d| d.to_std().ok())
                .unwrap_or(defaults.timeout_budget),
        };

        let settings = Self {
            progress_mode: overrides
                .progress
                .unwrap_or_else(|| config.load_and_get(keys::PROGRESS, defaults.progress_mode)),
            by_part: overrides
                .by_part
                .unwrap_or_else(|| config.load_and_get(keys::BY_PART, defaults.by_part)),
            by_number_of_times: overrides.by_number_of_times.unwrap_or_else(|| {
                config.load_and_get(keys::BY_NUMBER_OF_TIMES, defaults.by_number_of_times)
            }),
            effective_operation_max_age: match overrides.effective_operation_max_age_secs {
                Some(secs) => seconds(keys::EFFECTIVE_OPERATION_MAX_AGE, secs)?,
                None => config.load_and_get_duration(
                    keys::EFFECTIVE_OPERATION_MAX_AGE,
                    defaults.effective_operation_max_age,
                ),
            },
            min_cycle_number_for_cycle_progress: overrides
                .min_cycle_number_for_cycle_progress
                .unwrap_or_else(|| {
                    config.load_and_get(
                        keys::MIN_CYCLE_NUMBER_FOR_CYCLE_PROGRESS,
                        defaults.min_cycle_number_for_cycle_progress,
                    )
                }),
            timeout_budget,
            detection_max_lag: match overrides.detection_max_lag_secs {
                Some(secs) => Some(seconds(keys::DETECTION_MAX_LAG, secs)?),
                None => config.get_duration(keys::DETECTION_MAX_LAG),
            },
            valid_sister_tools_ordering: overrides.valid_sister_tools_ordering.unwrap_or_else(
                || {
                    config.load_and_get(
                        keys::VALID_SISTER_TOOLS_ORDERING,
                        defaults.valid_sister_tools_ordering,
                    )
                },
            ),
            cache_timeout_short: config
                .load_and_get_duration(keys::CACHE_TIMEOUT_SHORT, defaults.cache_timeout_short),
            cache_timeout_long: config
                .load_and_get_duration(keys::CACHE_TIMEOUT_LONG, defaults.cache_timeout_long),
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> SettingsResult<()> {
        if self.effective_operation_max_age <= TimeDelta::zero() {
            return Err(SettingsError::invalid(
                keys::EFFECTIVE_OPERATION_MAX_AGE,
                self.effective_operation_max_age,
            ));
        }

        if self.min_cycle_number_for_cycle_progress < 0 {
            return Err(SettingsError::invalid(
                keys::MIN_CYCLE_NUMBER_FOR_CYCLE_PROGRESS,
                self.min_cycle_number_for_cycle_progress,
            ));
        }

        if self.cache_timeout_short > self.cache_timeout_long {
            return Err(SettingsError::invalid(
                keys::CACHE_TIMEOUT_SHORT,
                format!(
                    "{} is longer than {} {}",
                    self.cache_timeout_short,
                    keys::CACHE_TIMEOUT_LONG,
                    self.cache_timeout_long
                ),
            ));
        }

        Ok(())
    }
}

fn seconds(key: &str, secs: u64) -> SettingsResult<TimeDelta> {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(|| SettingsError::invalid(key, secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings =
            ExpirationSettings::resolve(&ConfigSet::new(), &ExpirationOverrides::default())
                .unwrap();
        assert_eq!(settings, ExpirationSettings::default());
        assert_eq!(settings.progress_mode, ProgressMode::None);
        assert_eq!(settings.effective_operation_max_age, TimeDelta::days(7));
        assert_eq!(settings.timeout_budget, Duration::from_secs(30));
        assert!(settings.detection_max_lag.is_none());
    }

    #[test]
    fn test_config_then_overrides() {
        let config = ConfigSet::new()
            .with(keys::PROGRESS, "Cycle")
            .with(keys::BY_PART, "false")
            .with(keys::EFFECTIVE_OPERATION_MAX_AGE, "1.00:00:00")
            .with(keys::VALID_SISTER_TOOLS_ORDERING, "fixed")
            .with(keys::DETECTION_MAX_LAG, "120");
        let settings =
            ExpirationSettings::resolve(&config, &ExpirationOverrides::default()).unwrap();
        assert_eq!(settings.progress_mode, ProgressMode::Cycle);
        assert!(!settings.by_part);
        assert_eq!(settings.effective_operation_max_age, TimeDelta::days(1));
        assert_eq!(settings.valid_sister_tools_ordering, SisterToolsOrdering::Fixed);
        assert_eq!(settings.detection_max_lag, Some(TimeDelta::minutes(2)));

        let overrides = ExpirationOverrides {
            progress: Some(ProgressMode::Operation),
            by_part: Some(true),
            timeout_budget_ms: Some(0),
            ..Default::default()
        };
        let settings = ExpirationSettings::resolve(&config, &overrides).unwrap();
        assert_eq!(settings.progress_mode, ProgressMode::Operation);
        assert!(settings.by_part);
        assert_eq!(settings.timeout_budget, Duration::ZERO);
    }

    #[test]
    fn test_invalid_value_falls_back_to_default() {
        let config = ConfigSet::new().with(keys::MIN_CYCLE_NUMBER_FOR_CYCLE_PROGRESS, "many");
        let settings =
            ExpirationSettings::resolve(&config, &ExpirationOverrides::default()).unwrap();
        assert_eq!(settings.min_cycle_number_for_cycle_progress, 1);
    }

    #[test]
    fn test_validation() {
        let config = ConfigSet::new().with(keys::MIN_CYCLE_NUMBER_FOR_CYCLE_PROGRESS, "-2");
        let err = ExpirationSettings::resolve(&config, &ExpirationOverrides::default());
        assert!(matches!(err, Err(SettingsError::InvalidValue { .. })));

        let config = ConfigSet::new()
            .with(keys::CACHE_TIMEOUT_SHORT, "00:20:00")
            .with(keys::CACHE_TIMEOUT_LONG, "00:10:00");
        assert!(ExpirationSettings::resolve(&config, &ExpirationOverrides::default()).is_err());
    }

    #[test]
    fn test_overrides_deserialize() {
        let overrides: ExpirationOverrides =
            serde_json::from_str(r#"{ "progress": "cycle", "detection_max_lag_secs": 60 }"#)
                .unwrap();
        assert_eq!(overrides.progress, Some(ProgressMode::Cycle));
        assert_eq!(overrides.detection_max_lag_secs, Some(60));
        assert!(overrides.by_part.is_none());
    }
}
