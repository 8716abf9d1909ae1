mod common;

use std::collections::BTreeMap;

use chrono::TimeDelta;

use common::{operation, tool_life, Fake, MODULE};
use toollife_core::{ModuleProgress, ProgressMode, Sequence, ToolUnit};
use toollife_expiration::{Outcome, ToolLivesByMachine, ToolLivesByMachineResponse};
use toollife_settings::{ConfigSet, ExpirationOverrides};

/// Tool 7 machines 100s twice per cycle, tool 8 50s in between
fn lathe(remaining_secs: f64) -> Fake {
    Fake::with_tools(vec![tool_life(
        "7",
        "7",
        1,
        ToolUnit::DurationSeconds,
        remaining_secs,
    )])
    .running(operation(), TimeDelta::seconds(250))
    .sequence(1, 1, "7", TimeDelta::seconds(100))
    .sequence(2, 2, "8", TimeDelta::seconds(50))
    .sequence(3, 3, "7", TimeDelta::seconds(100))
    .in_sequence(1, TimeDelta::seconds(40))
}

fn get(fake: Fake, overrides: ExpirationOverrides) -> toollife_core::Result<Outcome<ToolLivesByMachineResponse>> {
    let (_, collaborators) = fake.into_collaborators();
    ToolLivesByMachine::new(common::machine())
        .with_overrides(ExpirationOverrides {
            progress: Some(ProgressMode::Operation),
            ..overrides
        })
        .get(&collaborators, &ConfigSet::new())
}

fn remaining_time(fake: Fake, overrides: ExpirationOverrides) -> Option<TimeDelta> {
    get(fake, overrides)
        .unwrap()
        .into_final()
        .unwrap()
        .tools[0]
        .remaining_time
}

#[test]
fn test_walk_within_the_current_cycle() {
    // 60s left in sequence 1, 50s of sequence 2, 90s of sequence 3
    assert_eq!(
        remaining_time(lathe(150.0), ExpirationOverrides::default()),
        Some(TimeDelta::seconds(200))
    );
}

#[test]
fn test_walk_within_the_current_sequence() {
    assert_eq!(
        remaining_time(lathe(45.0), ExpirationOverrides::default()),
        Some(TimeDelta::seconds(45))
    );
}

#[test]
fn test_walk_over_full_cycles() {
    let overrides = ExpirationOverrides {
        min_cycle_number_for_cycle_progress: Some(5),
        ..Default::default()
    };
    // 210s to the cycle end, one full cycle, 90s in the next one
    assert_eq!(
        remaining_time(lathe(450.0), overrides),
        Some(TimeDelta::seconds(550))
    );
}

#[test]
fn test_coarse_range_above_the_threshold() {
    let response = get(lathe(450.0), ExpirationOverrides::default())
        .unwrap()
        .into_final()
        .unwrap();
    let tool = &response.tools[0];
    assert_eq!(tool.remaining_cycles_to_limit, Some(2.0));
    assert_eq!(tool.remaining_time, None);
    assert_eq!(
        tool.remaining_time_range.lower(),
        Some(TimeDelta::seconds(500))
    );
    assert_eq!(
        tool.remaining_time_range.upper(),
        Some(TimeDelta::seconds(750))
    );
}

#[test]
fn test_tool_not_in_progress() {
    let mut fake = lathe(150.0);
    if let Some(modules) = fake.progress.machine_modules.as_mut() {
        for module in modules.values_mut() {
            module.sequences.retain(|s| !s.uses_tool("7"));
        }
    }
    let response = get(fake, ExpirationOverrides::default())
        .unwrap()
        .into_final()
        .unwrap();
    let tool = &response.tools[0];
    assert_eq!(tool.remaining_cycles_to_limit, Some(0.0));
    assert!(!tool.has_remaining_time_range());
}

#[test]
fn test_unresolved_walk_is_an_error() {
    let mut fake = lathe(150.0);
    // The module only knows a sequence without standard time
    fake.progress.machine_modules = Some(BTreeMap::from([(
        MODULE,
        ModuleProgress {
            sequences: vec![Sequence::new(9, 1, "7")],
            ..Default::default()
        },
    )]));
    let err = get(fake, ExpirationOverrides::default()).unwrap_err();
    assert!(err.is_invariant_violation());
    assert!(err.to_string().contains("did not resolve"));
}

#[test]
fn test_max_expiration_time_skips_the_estimate() {
    let (_, collaborators) = lathe(450.0).into_collaborators();
    let response = ToolLivesByMachine::new(common::machine())
        .with_max_expiration_time(TimeDelta::seconds(300))
        .get(&collaborators, &ConfigSet::new())
        .unwrap()
        .into_final()
        .unwrap();
    assert!(response.tools.is_empty());
}

#[test]
fn test_duration_sister_tools() {
    let fake = Fake::with_tools(vec![
        tool_life("a", "7", 1, ToolUnit::DurationSeconds, 300.0),
        tool_life("b", "7", 2, ToolUnit::DurationSeconds, 900.0),
    ])
    .running(operation(), TimeDelta::seconds(250))
    .sequence(1, 1, "7", TimeDelta::seconds(200));
    let (_, collaborators) = fake.into_collaborators();
    let response = ToolLivesByMachine::new(common::machine())
        .get(&collaborators, &ConfigSet::new())
        .unwrap()
        .into_final()
        .unwrap();

    let active = response.find("T7 (a)").unwrap();
    assert_eq!(active.remaining_cycles_to_limit, Some(1.0));
    assert_eq!(
        active.remaining_time_range.lower(),
        Some(TimeDelta::seconds(250))
    );
    assert_eq!(active.next.as_deref(), Some("T7 (b)"));

    // Runs after the active tool: 1200s exactly is 5 full cycles
    let backup = response.find("T7 (b)").unwrap();
    assert_eq!(backup.remaining_cycles_to_limit, Some(5.0));
    assert_eq!(
        backup.remaining_time_range.lower(),
        Some(TimeDelta::seconds(1250))
    );

    let group = response.find("T7").unwrap();
    assert_eq!(group.remaining_cycles_to_limit, Some(6.0));
    assert_eq!(
        group.remaining_time_range.lower(),
        Some(TimeDelta::seconds(1250))
    );
    assert_eq!(response.min_remaining_time, Some(TimeDelta::seconds(1250)));
}

#[test]
fn test_zero_tool_duration_is_skipped() {
    let fake = Fake::with_tools(vec![tool_life(
        "7",
        "7",
        1,
        ToolUnit::DurationMinutes,
        10.0,
    )])
    .running(operation(), TimeDelta::seconds(250))
    .sequence(1, 1, "8", TimeDelta::seconds(100));
    let (_, collaborators) = fake.into_collaborators();
    let response = ToolLivesByMachine::new(common::machine())
        .get(&collaborators, &ConfigSet::new())
        .unwrap()
        .into_final()
        .unwrap();
    let tool = &response.tools[0];
    assert_eq!(tool.remaining_cycles_to_limit, None);
    assert!(!tool.has_remaining_time_range());
}

#[test]
fn test_walk_without_current_sequence() {
    let without_current = |remaining_secs: f64| {
        let mut fake = lathe(remaining_secs);
        if let Some(modules) = fake.progress.machine_modules.as_mut() {
            for module in modules.values_mut() {
                module.current_sequence = None;
                module.current_sequence_elapsed = None;
                module.current_sequence_standard_time = None;
            }
        }
        fake
    };

    // The whole cycle is ahead: 100s, 50s, then 50s of sequence 3
    assert_eq!(
        remaining_time(without_current(150.0), ExpirationOverrides::default()),
        Some(TimeDelta::seconds(200))
    );

    // One pass over the cycle, then 50s of sequence 1 in the next one
    let overrides = ExpirationOverrides {
        min_cycle_number_for_cycle_progress: Some(5),
        ..Default::default()
    };
    assert_eq!(
        remaining_time(without_current(250.0), overrides),
        Some(TimeDelta::seconds(300))
    );
}

#[test]
fn test_huge_duration_counter_saturates() {
    let fake = Fake::with_tools(vec![tool_life(
        "7",
        "7",
        1,
        ToolUnit::DurationSeconds,
        3e12,
    )])
    .running(operation(), TimeDelta::hours(1))
    .sequence(1, 1, "7", TimeDelta::seconds(1));
    let response = get(fake, ExpirationOverrides::default())
        .unwrap()
        .into_final()
        .unwrap();

    let tool = &response.tools[0];
    assert_eq!(tool.remaining_cycles_to_limit, Some(3e12 - 1.0));
    assert_eq!(tool.remaining_time, Some(TimeDelta::MAX));
}
