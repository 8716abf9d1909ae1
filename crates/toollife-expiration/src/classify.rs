//! Tool life classification
//!
//! Which estimator applies to a tool life, how sister tools are grouped
//! and ordered, and how groups are displayed. The group identifier is the
//! tool number today.

use chrono::TimeDelta;

use toollife_core::{ToolLife, ToolUnit};
use toollife_settings::ExpirationSettings;

/// Counted in cycles, parts or uses
pub(crate) fn is_by_cycle(tool_life: &ToolLife) -> bool {
    tool_life.unit.is_count()
}

/// Counted in parts, and the parts are really counted by part
pub(crate) fn is_by_number_of_parts(tool_life: &ToolLife, settings: &ExpirationSettings) -> bool {
    tool_life.unit == ToolUnit::NumberOfParts && settings.by_part
}

/// Counted in uses, and the uses are really counted by use
pub(crate) fn is_by_number_of_times(tool_life: &ToolLife, settings: &ExpirationSettings) -> bool {
    tool_life.unit == ToolUnit::NumberOfTimes && settings.by_number_of_times
}

/// Counted in hours, minutes or seconds
pub(crate) fn is_by_duration(tool_life: &ToolLife) -> bool {
    tool_life.unit.is_duration()
}

pub(crate) fn group_tool_number(tool_life: &ToolLife) -> &str {
    &tool_life.position.tool_number
}

/// Sister tools share the same group identifier
pub(crate) fn group_identifier(tool_life: &ToolLife) -> &str {
    group_tool_number(tool_life)
}

pub(crate) fn group_display(tool_life: &ToolLife) -> String {
    format!("T{}", group_identifier(tool_life))
}

/// Order of the sister tools in a group
pub(crate) fn group_sort_key(tool_life: &ToolLife) -> i32 {
    tool_life.position.pot.unwrap_or(0)
}

/// Display of a member whose own display collides with the group display.
///
/// `position` starts from 1.
pub(crate) fn alternative_display(tool_life: &ToolLife, group_display: &str, position: usize) -> String {
    if let Some(pot) = tool_life.position.pot {
        let alternative = format!("T{}", pot);
        if alternative != group_display {
            return alternative;
        }
    }
    format!("{}#{}", group_display, position)
}

/// `duration * n`, saturating
pub(crate) fn scale(duration: TimeDelta, n: i64) -> TimeDelta {
    let ms = duration.num_milliseconds().saturating_mul(n);
    TimeDelta::try_milliseconds(ms).unwrap_or(if ms < 0 {
        TimeDelta::MIN
    } else {
        TimeDelta::MAX
    })
}

/// `a + b`, saturating
pub(crate) fn saturating_add(a: TimeDelta, b: TimeDelta) -> TimeDelta {
    a.checked_add(&b).unwrap_or(if b < TimeDelta::zero() {
        TimeDelta::MIN
    } else {
        TimeDelta::MAX
    })
}

/// `a - b`, saturating
pub(crate) fn saturating_sub(a: TimeDelta, b: TimeDelta) -> TimeDelta {
    a.checked_sub(&b).unwrap_or(if b < TimeDelta::zero() {
        TimeDelta::MAX
    } else {
        TimeDelta::MIN
    })
}

/// Number of full `total` periods left in `remaining`, not counting the
/// last one when the division is exact
pub(crate) fn full_cycles(remaining: TimeDelta, total: TimeDelta) -> i64 {
    let remaining = remaining.num_milliseconds();
    let total = total.num_milliseconds();
    if total <= 0 {
        return 0;
    }
    let n = remaining / total;
    if 0 < n && remaining % total == 0 {
        n - 1
    } else {
        n
    }
}
