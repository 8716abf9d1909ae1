//! Sister tool groups
//!
//! Tool lives sharing a group identifier are backup tools used one after
//! the other, in pot order. Only one of them is active.

use std::collections::HashMap;

use crate::budget::{Halt, TimeoutBudget};
use crate::classify::{alternative_display, group_display, group_identifier, group_sort_key};
use crate::response::ToolLifeResponse;

/// Indices of the responses of one group, ordered by pot
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SisterGroup {
    pub identifier: String,
    pub members: Vec<usize>,
}

impl SisterGroup {
    /// More than one member
    pub fn is_real(&self) -> bool {
        self.members.len() > 1
    }
}

/// Partition the individual tools accepted by `filter` into groups.
///
/// Groups come in order of first appearance, members in pot order (stable).
pub(crate) fn sister_groups(
    tools: &[ToolLifeResponse],
    filter: impl Fn(&ToolLifeResponse) -> bool,
) -> Vec<SisterGroup> {
    let mut groups: Vec<SisterGroup> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for (index, tool) in tools.iter().enumerate() {
        let Some(tool_life) = tool.tool_life.as_ref() else {
            continue;
        };
        if !filter(tool) {
            continue;
        }
        let identifier = group_identifier(tool_life);
        let position = *positions.entry(identifier).or_insert_with(|| {
            groups.push(SisterGroup {
                identifier: identifier.to_string(),
                members: Vec::new(),
            });
            groups.len() - 1
        });
        groups[position].members.push(index);
    }

    for group in &mut groups {
        group.members.sort_by_key(|&i| {
            tools[i]
                .tool_life
                .as_ref()
                .map(group_sort_key)
                .unwrap_or_default()
        });
    }
    groups
}

/// Set the active sister tool, the next tool and the valid sister tools flag
pub(crate) fn set_sister_tool_properties(
    tools: &mut [ToolLifeResponse],
    budget: &TimeoutBudget,
) -> Result<(), Halt> {
    for group in sister_groups(tools, |_| true)
        .into_iter()
        .filter(SisterGroup::is_real)
    {
        budget.check("sister_tools")?;

        for &i in &group.members {
            tools[i].active_sister_tool = false;
        }

        if group.members.iter().any(|&i| !tools[i].expired) {
            let except_last = &group.members[..group.members.len() - 1];
            for &i in except_last {
                tools[i].valid_sister_tools = true;
            }
        }

        let usable: Vec<usize> = group
            .members
            .iter()
            .copied()
            .filter(|&i| !tools[i].expired && !tools[i].group)
            .collect();
        if let Some(&active) = usable.first() {
            tools[active].active_sister_tool = true;
            if tools[active].valid_sister_tools {
                match usable.get(1).copied() {
                    Some(next) => tools[active].next = Some(tools[next].display.clone()),
                    None => tracing::warn!(
                        tool_number = %group.identifier,
                        display = %tools[active].display,
                        "No usable sister tool after the active one"
                    ),
                }
            }
        }
    }
    Ok(())
}

/// Append one aggregate per real group of individual tools
pub(crate) fn create_groups(
    tools: &mut Vec<ToolLifeResponse>,
    budget: &TimeoutBudget,
) -> Result<(), Halt> {
    let groups: Vec<SisterGroup> = sister_groups(tools, |t| !t.group)
        .into_iter()
        .filter(SisterGroup::is_real)
        .collect();

    for group in groups {
        budget.check("groups")?;

        let Some(display) = tools[group.members[0]].tool_life.as_ref().map(group_display) else {
            continue;
        };

        for (position, &i) in group.members.iter().enumerate() {
            let member = &mut tools[i];
            if member.display == display {
                if let Some(tool_life) = member.tool_life.as_ref() {
                    member.display = alternative_display(tool_life, &display, position + 1);
                }
            }
        }

        let members: Vec<&ToolLifeResponse> = group.members.iter().map(|&i| &tools[i]).collect();
        let aggregate = aggregate(display, &members);
        tools.push(aggregate);
    }
    Ok(())
}

fn aggregate(display: String, members: &[&ToolLifeResponse]) -> ToolLifeResponse {
    let mut group = ToolLifeResponse::group(display);

    group.expired = members.iter().all(|t| t.expired);
    group.warning = !group.expired && members.iter().all(|t| t.expired || t.warning);

    group.remaining_cycles_to_limit = Some(
        members
            .iter()
            .filter_map(|t| t.remaining_cycles_to_limit)
            .filter(|&cycles| 0.0 < cycles)
            .sum(),
    );

    group.remaining_time = members.iter().filter_map(|t| t.remaining_time).max();

    // Member range with the greatest lower bound, the first one on ties
    let mut widest: Option<&ToolLifeResponse> = None;
    for member in members.iter().copied().filter(|t| t.has_remaining_time_range()) {
        let greater = widest.is_none_or(|w| {
            w.remaining_time_range.lower() < member.remaining_time_range.lower()
        });
        if greater {
            widest = Some(member);
        }
    }
    if let Some(member) = widest {
        group.remaining_time_range = member.remaining_time_range;
    }

    group
}
