//! Forecast responses
//!
//! One [`ToolLifeResponse`] per tool life, plus one synthetic entry per
//! sister tool group, collected in a [`ToolLivesByMachineResponse`].

use chrono::{DateTime, TimeDelta, Utc};

use toollife_core::{MachineId, Operation, Range, ToolLife};

/// Forecast of one tool, or of a sister tool group
#[derive(Debug, Clone, PartialEq)]
pub struct ToolLifeResponse {
    /// Tool life, `None` for a group
    pub tool_life: Option<ToolLife>,
    /// Synthetic group aggregate
    pub group: bool,
    /// Tool or group display
    pub display: String,
    /// Display of the next sister tool, set on the active sister tool only
    pub next: Option<String>,
    /// Is it the active sister tool (`true` for tools without sister tools)
    pub active_sister_tool: bool,
    /// Are there still valid sister tools after it?
    pub valid_sister_tools: bool,
    /// The tool life limit is reached
    pub expired: bool,
    /// The tool life is in warning
    pub warning: bool,
    /// Remaining cycles before the limit, `None` if not applicable
    pub remaining_cycles_to_limit: Option<f64>,
    /// Remaining time before the limit
    pub remaining_time: Option<TimeDelta>,
    /// Remaining time range before the limit, empty if unknown
    pub remaining_time_range: Range<TimeDelta>,
    /// Estimated expiration, or actual expiration of an expired tool
    pub expiration_date_time: Option<DateTime<Utc>>,
    /// Estimated expiration range, empty if unknown
    pub expiration_date_time_range: Range<DateTime<Utc>>,
}

impl ToolLifeResponse {
    /// Response of an individual tool
    pub fn new(tool_life: ToolLife) -> Self {
        let display = tool_life.display();
        Self {
            tool_life: Some(tool_life),
            display,
            ..Self::blank()
        }
    }

    /// Synthetic group aggregate
    pub fn group(display: impl Into<String>) -> Self {
        Self {
            group: true,
            display: display.into(),
            active_sister_tool: false,
            ..Self::blank()
        }
    }

    fn blank() -> Self {
        Self {
            tool_life: None,
            group: false,
            display: String::new(),
            next: None,
            active_sister_tool: true,
            valid_sister_tools: false,
            expired: false,
            warning: false,
            remaining_cycles_to_limit: None,
            remaining_time: None,
            remaining_time_range: Range::empty(),
            expiration_date_time: None,
            expiration_date_time_range: Range::empty(),
        }
    }

    /// Tool number of an individual tool
    pub fn tool_number(&self) -> Option<&str> {
        self.tool_life
            .as_ref()
            .map(|tl| tl.position.tool_number.as_str())
    }

    /// Has a remaining time range been estimated?
    pub fn has_remaining_time_range(&self) -> bool {
        !self.remaining_time_range.is_empty()
    }

    /// Set an exact remaining time
    pub(crate) fn set_remaining_time(&mut self, remaining: TimeDelta) {
        self.remaining_time = Some(remaining);
        self.remaining_time_range = Range::point(remaining);
    }

    /// Set a remaining time range `[lower, upper)`, collapsed to an exact
    /// remaining time when both bounds are equal
    pub(crate) fn set_remaining_time_range(&mut self, lower: TimeDelta, upper: TimeDelta) {
        if lower == upper {
            self.set_remaining_time(lower);
        } else {
            self.remaining_time_range = Range::half_open(lower, upper);
        }
    }
}

/// Forecast of all the tools of a machine
#[derive(Debug, Clone, PartialEq)]
pub struct ToolLivesByMachineResponse {
    /// Machine
    pub machine_id: MachineId,
    /// Current operation of the machine
    pub operation: Option<Operation>,
    /// Tools and groups, the first expiring first
    pub tools: Vec<ToolLifeResponse>,
    /// UTC date/time of the response
    pub date_time: DateTime<Utc>,
    /// One of the tools expired without any valid sister tool
    pub expired: bool,
    /// One of the tools is in warning
    pub warning: bool,
    /// Minimum remaining time of the active tools and groups
    pub min_remaining_time: Option<TimeDelta>,
}

impl ToolLivesByMachineResponse {
    /// Individual tools only
    pub fn individual_tools(&self) -> impl Iterator<Item = &ToolLifeResponse> {
        self.tools.iter().filter(|t| !t.group)
    }

    /// Group aggregates only
    pub fn groups(&self) -> impl Iterator<Item = &ToolLifeResponse> {
        self.tools.iter().filter(|t| t.group)
    }

    /// First entry with this display
    pub fn find(&self, display: &str) -> Option<&ToolLifeResponse> {
        self.tools.iter().find(|t| t.display == display)
    }
}
