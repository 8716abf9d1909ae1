//! Remaining time of the tools counted in machining time
//!
//! The tool life is consumed only while a sequence using the tool runs.
//! The number of full cycles left gives a coarse range. For the active tool
//! in its last cycle, a walk through the sequences of the machine module
//! gives an exact estimate.

use chrono::TimeDelta;

use toollife_core::{EstimationError, ModuleProgress, Operation, ProgressSnapshot, Sequence};

use crate::budget::Halt;
use crate::classify::{full_cycles, is_by_duration, saturating_add, saturating_sub, scale};
use crate::context::{ForecastContext, ProgressMemo};
use crate::grouping::sister_groups;
use crate::response::ToolLifeResponse;

fn is_eligible(tool: &ToolLifeResponse) -> bool {
    !tool.expired && tool.tool_life.as_ref().is_some_and(is_by_duration)
}

/// Any tool the duration based estimate applies to?
pub(crate) fn applies(tools: &[ToolLifeResponse]) -> bool {
    tools.iter().any(is_eligible)
}

/// Cycle of the current operation, as seen by one tool number
struct ToolCycle {
    /// Standard duration of a full cycle
    cycle_duration: TimeDelta,
    /// Machining time of the tool in one cycle
    tool_duration: TimeDelta,
}

pub(crate) fn set_remaining_time_if_by_duration(
    ctx: &ForecastContext<'_>,
    tools: &mut [ToolLifeResponse],
    progress: &mut ProgressMemo,
) -> Result<(), Halt> {
    let Some(operation) = ctx.operation else {
        return Ok(());
    };
    let Some(cycle_duration) = ctx
        .collaborators
        .operations
        .standard_cycle_duration(operation, ctx.machine)
    else {
        tracing::debug!(operation_id = %operation.id, "No standard cycle duration");
        return Ok(());
    };

    for group in sister_groups(tools, is_eligible) {
        ctx.budget.check("duration_groups")?;

        let tool_duration = tool_duration_in_cycle(ctx, operation, &group.identifier)?;
        if tool_duration <= TimeDelta::zero() {
            tracing::error!(
                operation_id = %operation.id,
                tool_number = %group.identifier,
                "No machining time for the tool in the operation, please correct it"
            );
            continue;
        }
        let cycle = ToolCycle {
            cycle_duration,
            tool_duration,
        };

        if group.is_real() {
            let mut accumulated = TimeDelta::zero();
            for &i in &group.members {
                let Some(own) = tools[i]
                    .tool_life
                    .as_ref()
                    .and_then(|tl| tl.remaining_life_duration_to_limit())
                else {
                    continue;
                };
                accumulated = saturating_add(accumulated, own);
                estimate(ctx, &mut tools[i], accumulated, &cycle, progress)?;
            }
        } else {
            let tool = &mut tools[group.members[0]];
            let Some(remaining) = tool
                .tool_life
                .as_ref()
                .and_then(|tl| tl.remaining_life_duration_to_limit())
            else {
                continue;
            };
            if remaining < TimeDelta::zero() {
                tracing::error!(
                    display = %tool.display,
                    remaining_ms = remaining.num_milliseconds(),
                    "Unexpected negative remaining life of a non expired tool"
                );
                continue;
            }
            estimate(ctx, tool, remaining, &cycle, progress)?;
        }
    }
    Ok(())
}

/// Sum of the standard times of the sequences using the tool
fn tool_duration_in_cycle(
    ctx: &ForecastContext<'_>,
    operation: &Operation,
    tool_number: &str,
) -> Result<TimeDelta, Halt> {
    let operations = &ctx.collaborators.operations;
    Ok(operations
        .operation_tool_sequences(operation, tool_number)?
        .iter()
        .filter_map(|s| operations.sequence_standard_time(s))
        .fold(TimeDelta::zero(), saturating_add))
}

fn estimate(
    ctx: &ForecastContext<'_>,
    tool: &mut ToolLifeResponse,
    remaining: TimeDelta,
    cycle: &ToolCycle,
    progress: &mut ProgressMemo,
) -> Result<(), Halt> {
    let cycles = full_cycles(remaining, cycle.tool_duration);
    tool.remaining_cycles_to_limit = Some(cycles as f64);
    let lower = scale(cycle.cycle_duration, cycles);
    let coarse = |tool: &mut ToolLifeResponse| {
        tool.set_remaining_time_range(lower, saturating_add(lower, cycle.cycle_duration))
    };

    // A backup tool is not tracked precisely
    if !tool.active_sister_tool {
        coarse(tool);
        return Ok(());
    }

    if ctx.max_expiration_time.is_some_and(|max| max < lower) {
        tracing::debug!(
            display = %tool.display,
            lower_ms = lower.num_milliseconds(),
            "Expires after the max expiration time, no estimate"
        );
        return Ok(());
    }

    if ctx.settings.min_cycle_number_for_cycle_progress <= cycles {
        coarse(tool);
        return Ok(());
    }

    let snapshot = progress.get(ctx)?;
    if snapshot.machine_modules.is_none() {
        coarse(tool);
        return Ok(());
    }
    let Some(tool_number) = tool.tool_number().map(str::to_owned) else {
        return Ok(());
    };
    if snapshot.module_referencing_tool(&tool_number).is_none() {
        tracing::info!(
            tool_number = %tool_number,
            "No machine module progress references the tool, it is probably not active"
        );
        return Ok(());
    }

    let remaining_time = precise_remaining_time(ctx, snapshot, &tool_number, remaining, cycle)?;
    tool.set_remaining_time(remaining_time);
    Ok(())
}

/// Machining time left of the tool, and machine time elapsed so far
#[derive(Debug, Clone, Copy)]
struct Walk {
    time: TimeDelta,
    remaining: TimeDelta,
}

impl Walk {
    /// Run a sequence of `duration`, `Some` with the total time once the
    /// tool life is consumed
    fn run(self, duration: TimeDelta, uses_tool: bool) -> (Self, Option<TimeDelta>) {
        if !uses_tool {
            return (
                Self {
                    time: saturating_add(self.time, duration),
                    ..self
                },
                None,
            );
        }
        if self.remaining <= duration {
            let time = saturating_add(self.time, self.remaining);
            return (
                Self {
                    time,
                    remaining: TimeDelta::zero(),
                },
                Some(time),
            );
        }
        (
            Self {
                time: saturating_add(self.time, duration),
                remaining: self.remaining - duration,
            },
            None,
        )
    }

    fn run_sequences<'s>(
        mut self,
        ctx: &ForecastContext<'_>,
        sequences: impl IntoIterator<Item = &'s Sequence>,
        tool_number: &str,
    ) -> Result<(Self, Option<TimeDelta>), Halt> {
        for sequence in sequences {
            ctx.budget.check("duration_walk")?;
            let Some(duration) = ctx.collaborators.operations.sequence_standard_time(sequence)
            else {
                continue;
            };
            let (next, resolved) = self.run(duration, sequence.uses_tool(tool_number));
            if resolved.is_some() {
                return Ok((next, resolved));
            }
            self = next;
        }
        Ok((self, None))
    }
}

fn precise_remaining_time(
    ctx: &ForecastContext<'_>,
    snapshot: &ProgressSnapshot,
    tool_number: &str,
    remaining: TimeDelta,
    cycle: &ToolCycle,
) -> Result<TimeDelta, Halt> {
    let Some(module) = snapshot.module_referencing_tool(tool_number) else {
        tracing::error!(tool_number, "Machine module progress unavailable for the walk");
        return Err(EstimationError::ProgressUnavailable {
            tool_number: tool_number.to_string(),
        }
        .into());
    };

    let mut walk = Walk {
        time: TimeDelta::zero(),
        remaining,
    };

    if let Some(left) = current_sequence_left(module, tool_number) {
        let (next, resolved) = walk.run(left, true);
        if let Some(time) = resolved {
            return Ok(time);
        }
        walk = next;
    }

    let sequences = module.ordered_sequences();
    let current_order = module.current_sequence.as_ref().map(|s| s.order);
    let next_sequences = sequences
        .iter()
        .copied()
        .filter(|s| current_order.is_none_or(|order| order < s.order));
    let (next, resolved) = walk.run_sequences(ctx, next_sequences, tool_number)?;
    if let Some(time) = resolved {
        return Ok(time);
    }
    walk = next;

    let cycles = full_cycles(walk.remaining, cycle.tool_duration);
    walk.time = saturating_add(walk.time, scale(cycle.cycle_duration, cycles));
    walk.remaining = saturating_sub(walk.remaining, scale(cycle.tool_duration, cycles));
    if walk.remaining <= TimeDelta::zero() {
        return Ok(walk.time);
    }

    let (last, resolved) = walk.run_sequences(ctx, sequences.iter().copied(), tool_number)?;
    match resolved {
        Some(time) => Ok(time),
        None => {
            tracing::error!(
                tool_number,
                remaining_ms = last.remaining.num_milliseconds(),
                "The sequence walk did not consume the tool life"
            );
            Err(EstimationError::UnresolvedDurationWalk {
                tool_number: tool_number.to_string(),
                remaining_ms: last.remaining.num_milliseconds(),
            }
            .into())
        }
    }
}

/// Time left in the current sequence when it uses the tool
fn current_sequence_left(module: &ModuleProgress, tool_number: &str) -> Option<TimeDelta> {
    let current = module.current_sequence.as_ref()?;
    if !current.uses_tool(tool_number) {
        return None;
    }
    let elapsed = module.current_sequence_elapsed?;
    let standard = module.current_sequence_standard_time?;
    Some(saturating_sub(standard, elapsed).max(TimeDelta::zero()))
}
