//! Tool life snapshots
//!
//! Read-only facts about one physical tool position, as written by the
//! acquisition pipeline:
//! - Tool position (tool id, tool number, pot, magazine)
//! - Wear unit and counting direction
//! - Current value, limit and warning offset

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::MachineModuleId;

/// Unit a tool wear counter is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolUnit {
    /// Number of operation cycles
    NumberOfCycles,
    /// Number of produced parts
    NumberOfParts,
    /// Number of times the tool was used
    NumberOfTimes,
    /// Cutting duration in hours
    DurationHours,
    /// Cutting duration in minutes
    DurationMinutes,
    /// Cutting duration in seconds
    DurationSeconds,
    /// Cutting distance
    Distance,
    /// Unknown or unsupported unit
    Unknown,
}

impl ToolUnit {
    /// Is the counter one of the duration units?
    pub fn is_duration(&self) -> bool {
        matches!(
            self,
            Self::DurationHours | Self::DurationMinutes | Self::DurationSeconds
        )
    }

    /// Is the counter one of the count units (cycles, parts, uses)?
    pub fn is_count(&self) -> bool {
        matches!(
            self,
            Self::NumberOfCycles | Self::NumberOfParts | Self::NumberOfTimes
        )
    }

    /// Convert a counter value expressed in this unit into a duration.
    ///
    /// `None` for non duration units.
    pub fn to_duration(&self, value: f64) -> Option<TimeDelta> {
        let seconds = match self {
            Self::DurationHours => value * 3600.0,
            Self::DurationMinutes => value * 60.0,
            Self::DurationSeconds => value,
            _ => return None,
        };
        // `as` saturates, only i64::MIN is out of range
        let ms = (seconds * 1000.0).round() as i64;
        Some(TimeDelta::try_milliseconds(ms).unwrap_or(TimeDelta::MIN))
    }
}

impl fmt::Display for ToolUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NumberOfCycles => write!(f, "cycles"),
            Self::NumberOfParts => write!(f, "parts"),
            Self::NumberOfTimes => write!(f, "times"),
            Self::DurationHours => write!(f, "h"),
            Self::DurationMinutes => write!(f, "min"),
            Self::DurationSeconds => write!(f, "s"),
            Self::Distance => write!(f, "distance"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Counting direction of a tool life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolLifeDirection {
    /// The value increases from 0 to the limit
    Up,
    /// The value decreases from the limit to 0
    #[default]
    Down,
}

/// Physical slot of a tool on a machine module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPosition {
    /// Identifier of the physical tool
    pub tool_id: String,
    /// Tool number used by the part programs. Sister tools share it.
    pub tool_number: String,
    /// Pot number in the magazine
    pub pot: Option<i32>,
    /// Magazine number
    pub magazine: Option<i32>,
    /// Label reported by the controller, if any
    #[serde(default)]
    pub label: Option<String>,
}

impl ToolPosition {
    /// Create a position from a tool id and a tool number
    pub fn new(tool_id: impl Into<String>, tool_number: impl Into<String>) -> Self {
        Self {
            tool_id: tool_id.into(),
            tool_number: tool_number.into(),
            pot: None,
            magazine: None,
            label: None,
        }
    }

    /// Set the pot number
    pub fn with_pot(mut self, pot: i32) -> Self {
        self.pot = Some(pot);
        self
    }

    /// Set the magazine number
    pub fn with_magazine(mut self, magazine: i32) -> Self {
        self.magazine = Some(magazine);
        self
    }

    /// Set the label reported by the controller
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Human readable label of the position
    pub fn display(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        if self.tool_id == self.tool_number {
            format!("T{}", self.tool_number)
        } else {
            format!("T{} ({})", self.tool_number, self.tool_id)
        }
    }
}

/// Tool life snapshot
///
/// Immutable for the duration of one forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolLife {
    /// Machine module the tool is mounted on
    pub machine_module: MachineModuleId,
    /// Tool position
    pub position: ToolPosition,
    /// Wear unit
    pub unit: ToolUnit,
    /// Counting direction
    #[serde(default)]
    pub direction: ToolLifeDirection,
    /// Current value
    pub value: f64,
    /// Limit, `None` if the tool has no limit
    pub limit: Option<f64>,
    /// Distance to the limit at which the tool enters warning
    pub warning_offset: Option<f64>,
}

impl ToolLife {
    /// Create a tool life counting down to zero
    pub fn new(
        machine_module: MachineModuleId,
        position: ToolPosition,
        unit: ToolUnit,
        value: f64,
    ) -> Self {
        Self {
            machine_module,
            position,
            unit,
            direction: ToolLifeDirection::Down,
            value,
            limit: None,
            warning_offset: None,
        }
    }

    /// Set the limit. A zero limit means no limit.
    pub fn with_limit(mut self, limit: f64) -> Self {
        self.limit = if limit == 0.0 { None } else { Some(limit) };
        self
    }

    /// Set the warning offset. A zero offset means no warning.
    pub fn with_warning_offset(mut self, offset: f64) -> Self {
        self.warning_offset = if offset == 0.0 { None } else { Some(offset) };
        self
    }

    /// Set the counting direction
    pub fn with_direction(mut self, direction: ToolLifeDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Display of the tool position
    pub fn display(&self) -> String {
        self.position.display()
    }

    /// Remaining life before the limit is reached, in the tool unit
    ///
    /// `None` if the tool counts up without any limit.
    pub fn remaining_life_to_limit(&self) -> Option<f64> {
        match self.direction {
            ToolLifeDirection::Down => Some(self.value),
            ToolLifeDirection::Up => self.limit.map(|limit| limit - self.value),
        }
    }

    /// Remaining life before the limit is reached, for duration units only
    pub fn remaining_life_duration_to_limit(&self) -> Option<TimeDelta> {
        self.remaining_life_to_limit()
            .and_then(|remaining| self.unit.to_duration(remaining))
    }

    /// Has the limit been reached?
    pub fn is_limit_reached(&self) -> bool {
        self.remaining_life_to_limit()
            .is_some_and(|remaining| remaining <= 0.0)
    }

    /// Is the tool within its warning offset of the limit?
    pub fn is_warning_reached(&self) -> bool {
        match (self.remaining_life_to_limit(), self.warning_offset) {
            (Some(remaining), Some(offset)) => remaining <= offset,
            _ => false,
        }
    }
}
