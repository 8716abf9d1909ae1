//! Cycle / operation progress
//!
//! Estimate of how far the machine is through its current cycle, as
//! returned by a progress estimator.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::data::{MachineModuleId, Sequence};

/// Which progress estimator to use for the tool expiration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressMode {
    /// No progress is estimated
    #[default]
    None,
    /// Progress of the current cycle
    Cycle,
    /// Progress of the current operation
    Operation,
}

impl fmt::Display for ProgressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, ""),
            Self::Cycle => write!(f, "cycle"),
            Self::Operation => write!(f, "operation"),
        }
    }
}

impl FromStr for ProgressMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "cycle" => Ok(Self::Cycle),
            "operation" => Ok(Self::Operation),
            other => Err(format!("Unknown progress mode: {}", other)),
        }
    }
}

/// Progress of one machine module
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModuleProgress {
    /// Sequences of the cycle, for this machine module
    pub sequences: Vec<Sequence>,
    /// Sequence in progress
    pub current_sequence: Option<Sequence>,
    /// Time already spent in the current sequence
    pub current_sequence_elapsed: Option<TimeDelta>,
    /// Standard time of the current sequence
    pub current_sequence_standard_time: Option<TimeDelta>,
}

impl ModuleProgress {
    /// Does any sequence of this module use the tool number?
    pub fn references_tool(&self, tool_number: &str) -> bool {
        self.sequences.iter().any(|s| s.uses_tool(tool_number))
    }

    /// Sequences ordered by their position in the cycle
    pub fn ordered_sequences(&self) -> Vec<&Sequence> {
        let mut sequences: Vec<&Sequence> = self.sequences.iter().collect();
        sequences.sort_by_key(|s| s.order);
        sequences
    }
}

/// Progress estimate of a machine
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressSnapshot {
    /// Estimated end of the current cycle
    pub estimated_end: Option<DateTime<Utc>>,
    /// Completion of the current cycle (0..=1), considering the machining periods
    pub machining_completion: Option<f64>,
    /// Progress by machine module, `None` if the estimator is deactivated
    pub machine_modules: Option<BTreeMap<MachineModuleId, ModuleProgress>>,
}

impl ProgressSnapshot {
    /// Progress when no estimator is configured
    pub fn deactivated() -> Self {
        Self::default()
    }

    /// First machine module progress that references the tool number
    pub fn module_referencing_tool(&self, tool_number: &str) -> Option<&ModuleProgress> {
        self.machine_modules
            .as_ref()?
            .values()
            .find(|p| p.references_tool(tool_number))
    }
}
