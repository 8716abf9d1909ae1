//! Remaining time of the tools counted in cycles, parts or uses
//!
//! A: remaining cycles from the remaining count.
//! B: remaining time from the remaining cycles and the standard cycle duration.
//! C: sister tools run one after the other, so their times add up in pot order.

use chrono::TimeDelta;

use toollife_core::{Operation, Range, ToolLife};

use crate::budget::Halt;
use crate::classify::{
    is_by_cycle, is_by_number_of_parts, is_by_number_of_times, saturating_add, scale,
};
use crate::context::{ForecastContext, ProgressMemo};
use crate::grouping::sister_groups;
use crate::response::ToolLifeResponse;

fn is_eligible(tool: &ToolLifeResponse) -> bool {
    !tool.expired && tool.tool_life.as_ref().is_some_and(is_by_cycle)
}

/// Any tool the cycle based estimate applies to?
pub(crate) fn applies(tools: &[ToolLifeResponse]) -> bool {
    tools.iter().any(is_eligible)
}

pub(crate) fn set_remaining_time_if_by_cycle(
    ctx: &ForecastContext<'_>,
    tools: &mut [ToolLifeResponse],
    progress: &mut ProgressMemo,
) -> Result<(), Halt> {
    let eligible: Vec<usize> = (0..tools.len()).filter(|&i| is_eligible(&tools[i])).collect();
    if eligible.is_empty() {
        return Ok(());
    }

    for &i in &eligible {
        ctx.budget.check("cycles_to_limit")?;
        let Some(tool_life) = tools[i].tool_life.as_ref() else {
            continue;
        };
        let Some(remaining) = tool_life.remaining_life_to_limit() else {
            continue;
        };
        let cycles = remaining_cycles_to_limit(ctx, tool_life, remaining)?;
        tools[i].remaining_cycles_to_limit = Some(cycles);
    }

    if let Some(operation) = ctx.operation {
        set_remaining_time_from_cycles(ctx, operation, tools, &eligible, progress)?;
    }

    accumulate_sister_tool_times(ctx, tools)
}

fn remaining_cycles_to_limit(
    ctx: &ForecastContext<'_>,
    tool_life: &ToolLife,
    remaining: f64,
) -> Result<f64, Halt> {
    let count = remaining.trunc() as i64;
    let tool_number = tool_life.position.tool_number.as_str();

    match ctx.operation {
        Some(operation) if is_by_number_of_parts(tool_life, ctx.settings) => {
            let pieces = i64::from(operation.total_intermediate_work_pieces());
            if pieces == 0 {
                tracing::error!(
                    operation_id = %operation.id,
                    tool_number,
                    "The operation makes no intermediate work piece, please correct it"
                );
                Ok(count as f64)
            } else {
                Ok((count / pieces) as f64)
            }
        }
        Some(operation) if is_by_number_of_times(tool_life, ctx.settings) => {
            let times = ctx
                .collaborators
                .operations
                .operation_tool_sequences(operation, tool_number)?
                .len() as i64;
            if times == 0 {
                tracing::error!(
                    operation_id = %operation.id,
                    tool_number,
                    "No sequence of the operation uses the tool, please correct it"
                );
                Ok(count as f64)
            } else {
                Ok((count / times) as f64)
            }
        }
        _ => Ok(count as f64),
    }
}

fn set_remaining_time_from_cycles(
    ctx: &ForecastContext<'_>,
    operation: &Operation,
    tools: &mut [ToolLifeResponse],
    eligible: &[usize],
    progress: &mut ProgressMemo,
) -> Result<(), Halt> {
    let Some(cycle_duration) = ctx
        .collaborators
        .operations
        .standard_cycle_duration(operation, ctx.machine)
    else {
        tracing::debug!(operation_id = %operation.id, "No standard cycle duration");
        return Ok(());
    };

    // Partition first: the active tool cycles are adjusted below
    let (last_cycle, more_cycles): (Vec<usize>, Vec<usize>) = eligible
        .iter()
        .copied()
        .filter(|&i| tools[i].remaining_cycles_to_limit.is_some())
        .partition(|&i| tools[i].remaining_cycles_to_limit == Some(0.0));
    let more_cycles: Vec<usize> = more_cycles
        .into_iter()
        .filter(|&i| tools[i].remaining_cycles_to_limit.is_some_and(|c| 0.0 < c))
        .collect();

    for i in last_cycle {
        ctx.budget.check("last_cycle")?;
        let tool = &mut tools[i];
        if !tool.active_sister_tool {
            // May be swapped at any time
            tool.set_remaining_time(TimeDelta::zero());
            continue;
        }
        let (cycle_end, completion) = current_cycle(ctx, progress)?;
        match cycle_end {
            Some(cycle_end) => tool.set_remaining_time_range(TimeDelta::zero(), cycle_end),
            None => tool.set_remaining_time(TimeDelta::zero()),
        }
        add_completion(tool, completion);
    }

    for i in more_cycles {
        ctx.budget.check("more_cycles")?;
        let tool = &mut tools[i];
        let cycles = tool.remaining_cycles_to_limit.unwrap_or_default() as i64;
        if !tool.active_sister_tool {
            tool.set_remaining_time(scale(cycle_duration, cycles));
            continue;
        }
        let before_last_cycle = scale(cycle_duration, cycles - 1);
        let (cycle_end, completion) = current_cycle(ctx, progress)?;
        match cycle_end {
            Some(cycle_end) => {
                tool.set_remaining_time(saturating_add(before_last_cycle, cycle_end))
            }
            None => {
                tool.set_remaining_time_range(before_last_cycle, scale(cycle_duration, cycles))
            }
        }
        add_completion(tool, completion);
    }
    Ok(())
}

/// Time to the end of the current cycle (never negative) and its completion
fn current_cycle(
    ctx: &ForecastContext<'_>,
    progress: &mut ProgressMemo,
) -> Result<(Option<TimeDelta>, Option<f64>), Halt> {
    let snapshot = progress.get(ctx)?;
    let cycle_end = snapshot
        .estimated_end
        .map(|end| (end - ctx.now).max(TimeDelta::zero()));
    Ok((cycle_end, snapshot.machining_completion))
}

fn add_completion(tool: &mut ToolLifeResponse, completion: Option<f64>) {
    if let (Some(cycles), Some(completion)) = (tool.remaining_cycles_to_limit, completion) {
        tool.remaining_cycles_to_limit = Some(cycles + 1.0 - completion);
    }
}

/// Run out the first tool of each group, then the next one, and so on
fn accumulate_sister_tool_times(
    ctx: &ForecastContext<'_>,
    tools: &mut [ToolLifeResponse],
) -> Result<(), Halt> {
    let groups = sister_groups(tools, |t| is_eligible(t) && t.has_remaining_time_range());

    for group in groups.into_iter().filter(|g| g.is_real()) {
        ctx.budget.check("sister_tool_times")?;

        let first = &tools[group.members[0]];
        let mut remaining = first.remaining_time;
        let mut lower = first.remaining_time_range.lower();
        let mut upper = first.remaining_time_range.upper();

        for &i in &group.members[1..] {
            let tool = &mut tools[i];
            // Unknown once unknown
            remaining = match (remaining, tool.remaining_time) {
                (Some(acc), Some(own)) => Some(saturating_add(acc, own)),
                _ => None,
            };
            tool.remaining_time = remaining;

            if let (Some(acc), Some(own)) = (lower, tool.remaining_time_range.lower()) {
                lower = Some(saturating_add(acc, own));
            }
            if let (Some(acc), Some(own)) = (upper, tool.remaining_time_range.upper()) {
                upper = Some(saturating_add(acc, own));
            }

            match (lower, upper) {
                (Some(l), Some(u)) if l == u => {
                    if tool.remaining_time.is_none() {
                        tool.remaining_time = Some(l);
                    }
                    tool.remaining_time_range = Range::point(l);
                }
                _ => tool.remaining_time_range = Range::collapsing(lower, upper),
            }
        }
    }
    Ok(())
}
