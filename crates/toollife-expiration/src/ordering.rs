//! Order of the forecast entries, the first expiring first

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use toollife_settings::SisterToolsOrdering;

use crate::response::ToolLifeResponse;

/// `f64` ordered with [`f64::total_cmp`]
#[derive(Debug, Clone, Copy)]
struct TotalF64(f64);

impl PartialEq for TotalF64 {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TotalF64 {}

impl PartialOrd for TotalF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TotalF64 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Lexicographic sort key. `false` sorts first.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct SortKey {
    not_expired: bool,
    no_range: bool,
    range_lower: Option<DateTime<Utc>>,
    no_date_time: bool,
    date_time: Option<DateTime<Utc>>,
    no_cycles: bool,
    cycles: TotalF64,
    not_active: bool,
    valid_rank: bool,
    not_warning: bool,
}

impl SortKey {
    fn new(tool: &ToolLifeResponse, ordering: SisterToolsOrdering) -> Self {
        let range_lower = tool.expiration_date_time_range.lower();
        let cycles = tool.remaining_cycles_to_limit.filter(|&c| 0.0 <= c);
        Self {
            not_expired: !tool.expired,
            no_range: range_lower.is_none(),
            range_lower,
            no_date_time: tool.expiration_date_time.is_none(),
            date_time: tool.expiration_date_time,
            no_cycles: cycles.is_none(),
            cycles: TotalF64(cycles.unwrap_or_default()),
            not_active: !tool.active_sister_tool,
            valid_rank: match ordering {
                SisterToolsOrdering::Legacy => false,
                SisterToolsOrdering::Fixed => tool.valid_sister_tools,
            },
            not_warning: !tool.warning,
        }
    }
}

/// Stable sort: expired, then by expiration, by remaining cycles, active
/// first and warning first
pub(crate) fn sort_tools(tools: &mut [ToolLifeResponse], ordering: SisterToolsOrdering) {
    tools.sort_by_key(|t| SortKey::new(t, ordering));
}
