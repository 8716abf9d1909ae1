//! Response assembly
//!
//! Everything around the estimators: which tool lives are considered,
//! their expired and warning status, the max expiration time filter, the
//! projection of the remaining times on the wall clock and the machine
//! summary.

use std::collections::HashSet;

use chrono::{DateTime, TimeDelta, Utc};

use toollife_core::{EstimationError, Range, ToolLife};

use crate::budget::Halt;
use crate::context::ForecastContext;
use crate::response::ToolLifeResponse;

/// Tool lives of the current operation, one per tool id
pub(crate) fn select_tool_lives(
    ctx: &ForecastContext<'_>,
    tool_lives: Vec<ToolLife>,
) -> Result<Vec<ToolLife>, Halt> {
    let tool_lives = match ctx.operation {
        Some(operation) => {
            let tools = ctx.collaborators.operations.operation_tools(operation)?;
            if tools.is_empty() {
                tracing::info!(
                    operation_id = %operation.id,
                    "No tool number in the operation, all the tools are considered"
                );
                tool_lives
            } else {
                tool_lives
                    .into_iter()
                    .filter(|tl| tools.contains(&tl.position.tool_number))
                    .collect()
            }
        }
        None => tool_lives,
    };

    let mut seen = HashSet::new();
    Ok(tool_lives
        .into_iter()
        .filter(|tl| seen.insert(tl.position.tool_id.clone()))
        .collect())
}

pub(crate) fn create_responses(tool_lives: Vec<ToolLife>) -> Vec<ToolLifeResponse> {
    tool_lives.into_iter().map(ToolLifeResponse::new).collect()
}

pub(crate) fn complete_expired_warning_status(
    ctx: &ForecastContext<'_>,
    tools: &mut [ToolLifeResponse],
) -> Result<(), Halt> {
    for tool in tools.iter_mut() {
        let Some(tool_life) = tool.tool_life.as_ref() else {
            continue;
        };
        if !tool_life.is_limit_reached() {
            tool.warning = tool_life.is_warning_reached();
            continue;
        }

        tool.expired = true;
        ctx.budget.check("expiration_events")?;
        let expiration = ctx
            .collaborators
            .tool_life_events
            .last_expiration(tool_life.machine_module, &tool_life.position.tool_id)?;
        match expiration {
            Some(date_time) => {
                tool.expiration_date_time = Some(date_time);
                tool.expiration_date_time_range = Range::point(date_time);
            }
            None => tracing::warn!(
                display = %tool.display,
                tool_id = %tool_life.position.tool_id,
                "No expiration event for an expired tool"
            ),
        }
    }
    Ok(())
}

/// Keep the expired tools, the tools in warning and the tools that may
/// expire before `max`
pub(crate) fn filter_with_max_expiration_time(tools: &mut Vec<ToolLifeResponse>, max: TimeDelta) {
    tools.retain(|t| {
        t.expired
            || t.warning
            || t.remaining_time.is_some_and(|remaining| remaining <= max)
            || (t.has_remaining_time_range()
                && t.remaining_time_range.lower().is_none_or(|lower| lower <= max))
    });
}

pub(crate) fn complete_expiration_date_time(now: DateTime<Utc>, tools: &mut [ToolLifeResponse]) {
    let at = |remaining: TimeDelta| {
        now.checked_add_signed(remaining)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    };

    for tool in tools.iter_mut() {
        if tool.expiration_date_time.is_none() {
            if let Some(remaining) = tool.remaining_time {
                let date_time = at(remaining);
                tool.expiration_date_time = Some(date_time);
                tool.expiration_date_time_range = Range::point(date_time);
                continue;
            }
        }

        if tool.has_remaining_time_range() && tool.expiration_date_time_range.is_empty() {
            let range = tool.remaining_time_range;
            if range.lower().is_none() && range.upper().is_none() {
                let err = EstimationError::InconsistentRange {
                    display: tool.display.clone(),
                    range: format!("{:?}", range),
                };
                tracing::error!(error = %err, "Unbounded remaining time range");
                continue;
            }
            tool.expiration_date_time_range = range.map(at);
        }
    }
}

/// Machine summary: expired, warning, min remaining time
pub(crate) fn summary(tools: &[ToolLifeResponse]) -> (bool, bool, Option<TimeDelta>) {
    let expired = tools
        .iter()
        .any(|t| t.expired && (t.group || !t.valid_sister_tools));
    let warning = tools.iter().any(|t| t.warning);

    // Groups and the tools without any backup
    let candidates = || {
        tools
            .iter()
            .filter(|t| t.group || (t.active_sister_tool && !t.valid_sister_tools))
    };
    let min_remaining_time = candidates()
        .filter_map(|t| t.remaining_time)
        .min()
        .or_else(|| {
            candidates()
                .filter_map(|t| t.remaining_time_range.lower())
                .min()
        });

    (expired, warning, min_remaining_time)
}
