mod common;

use std::collections::BTreeMap;

use chrono::TimeDelta;

use common::{now, operation, tool_life, Fake};
use toollife_core::{ProgressMode, ProgressSnapshot, ToolUnit};
use toollife_expiration::{ToolLifeResponse, ToolLivesByMachine, ToolLivesByMachineResponse};
use toollife_settings::{ConfigSet, ExpirationOverrides};

/// A machine mixing groups, expired tools, cycle and duration tools
fn workshop() -> Fake {
    let mut fake = Fake::with_tools(vec![
        tool_life("a", "5", 1, ToolUnit::NumberOfCycles, 0.0),
        tool_life("b", "5", 2, ToolUnit::NumberOfCycles, 6.0),
        tool_life("c", "5", 3, ToolUnit::NumberOfCycles, 10.0).with_warning_offset(12.0),
        tool_life("d", "8", 1, ToolUnit::NumberOfCycles, 0.0),
        tool_life("e", "8", 2, ToolUnit::NumberOfCycles, -1.0),
        tool_life("f", "9", 1, ToolUnit::NumberOfParts, 30.0),
        tool_life("g", "11", 1, ToolUnit::DurationMinutes, 25.0),
        tool_life("h", "11", 2, ToolUnit::DurationMinutes, 40.0),
        tool_life("i", "12", 1, ToolUnit::DurationSeconds, 50.0),
    ])
    .running(operation().with_work_piece("Part", 2), TimeDelta::minutes(5))
    .sequence(1, 1, "11", TimeDelta::minutes(2))
    .sequence(2, 2, "12", TimeDelta::seconds(90))
    .sequence(3, 3, "5", TimeDelta::minutes(1))
    .in_sequence(2, TimeDelta::seconds(30));
    fake.progress.estimated_end = Some(now() + TimeDelta::minutes(3));
    fake.progress.machining_completion = Some(0.4);
    fake
}

fn forecast(fake: Fake) -> ToolLivesByMachineResponse {
    let (_, collaborators) = fake.into_collaborators();
    let overrides = ExpirationOverrides {
        progress: Some(ProgressMode::Operation),
        ..Default::default()
    };
    ToolLivesByMachine::new(common::machine())
        .with_overrides(overrides)
        .get(&collaborators, &ConfigSet::new())
        .unwrap()
        .into_final()
        .unwrap()
}

fn members<'a>(response: &'a ToolLivesByMachineResponse) -> BTreeMap<&'a str, Vec<&'a ToolLifeResponse>> {
    let mut groups: BTreeMap<&str, Vec<&ToolLifeResponse>> = BTreeMap::new();
    for tool in response.individual_tools() {
        groups.entry(tool.tool_number().unwrap()).or_default().push(tool);
    }
    groups
}

#[test]
fn test_idempotence() {
    let (_, collaborators) = workshop().into_collaborators();
    let request = ToolLivesByMachine::new(common::machine()).with_overrides(ExpirationOverrides {
        progress: Some(ProgressMode::Operation),
        ..Default::default()
    });
    let config = ConfigSet::new();

    let first = request.get(&collaborators, &config).unwrap();
    let second = request.get(&collaborators, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_one_active_tool_per_group() {
    let response = forecast(workshop());

    for (tool_number, tools) in members(&response) {
        if tools.len() < 2 {
            continue;
        }
        let active = tools.iter().filter(|t| t.active_sister_tool).count();
        let usable = tools.iter().any(|t| !t.expired);
        assert_eq!(
            active,
            usize::from(usable),
            "group {} has {} active tools",
            tool_number,
            active
        );
    }
}

#[test]
fn test_point_ranges_have_a_remaining_time() {
    let response = forecast(workshop());

    for tool in &response.tools {
        if let Some(point) = tool.remaining_time_range.as_point() {
            assert_eq!(
                tool.remaining_time,
                Some(point),
                "{} has a point range without remaining time",
                tool.display
            );
        }
    }
}

#[test]
fn test_expired_tools_first() {
    let response = forecast(workshop());

    let first_not_expired = response
        .tools
        .iter()
        .position(|t| !t.expired)
        .unwrap_or(response.tools.len());
    assert!(response.tools[first_not_expired..].iter().all(|t| !t.expired));
    assert!(response.tools[..first_not_expired].iter().all(|t| t.expired));
}

#[test]
fn test_group_expiry_derivation() {
    let response = forecast(workshop());
    let members = members(&response);

    assert_eq!(response.groups().count(), 3);
    for group in response.groups() {
        let tool_number = group.display.trim_start_matches('T');
        let tools = &members[tool_number];
        let expired = tools.iter().all(|t| t.expired);
        let warning = !expired && tools.iter().all(|t| t.expired || t.warning);
        assert_eq!(group.expired, expired, "{}", group.display);
        assert_eq!(group.warning, warning, "{}", group.display);
    }

    let all_expired = response.find("T8").unwrap();
    assert!(all_expired.expired);
    assert!(response.expired);
}

#[test]
fn test_progress_estimated_once() {
    let mut fake = Fake::with_tools(vec![
        tool_life("1", "1", 1, ToolUnit::NumberOfCycles, 3.0),
        tool_life("2", "2", 1, ToolUnit::NumberOfCycles, 4.0),
        tool_life("3", "3", 1, ToolUnit::NumberOfCycles, 0.5),
    ])
    .running(operation(), TimeDelta::minutes(5));
    fake.progress = ProgressSnapshot {
        estimated_end: Some(now() + TimeDelta::minutes(1)),
        machining_completion: Some(0.8),
        machine_modules: None,
    };
    let (fake, collaborators) = fake.into_collaborators();

    let response = ToolLivesByMachine::new(common::machine())
        .with_overrides(ExpirationOverrides {
            progress: Some(ProgressMode::Cycle),
            ..Default::default()
        })
        .get(&collaborators, &ConfigSet::new())
        .unwrap()
        .into_final()
        .unwrap();

    assert_eq!(fake.estimate_calls(), 1);
    assert_eq!(
        response.find("T1").unwrap().remaining_time,
        Some(TimeDelta::minutes(11))
    );
    assert_eq!(
        response.find("T2").unwrap().remaining_time,
        Some(TimeDelta::minutes(16))
    );
    let last_cycle = response.find("T3").unwrap();
    assert_eq!(last_cycle.remaining_time, None);
    assert_eq!(
        last_cycle.remaining_time_range.upper(),
        Some(TimeDelta::minutes(1))
    );
}

#[test]
fn test_no_progress_without_estimator() {
    let fake = Fake::with_tools(vec![tool_life("1", "1", 1, ToolUnit::NumberOfCycles, 3.0)])
        .running(operation(), TimeDelta::minutes(5));
    let (fake, collaborators) = fake.into_collaborators();

    ToolLivesByMachine::new(common::machine())
        .get(&collaborators, &ConfigSet::new())
        .unwrap();
    assert_eq!(fake.estimate_calls(), 0);
}
