// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use jw_core::{ActionSpec, FakeClock, WatcherDefinition, WatcherId, WatcherState};

fn definition() -> WatcherDefinition {
    WatcherDefinition {
        name: "error-watch".to_string(),
        pattern: "ERROR".to_string(),
        captures: Vec::new(),
        stream: Default::default(),
        interval_seconds: 30,
        condition: None,
        actions: vec![ActionSpec::LogEvent {
            message: None,
            condition: None,
        }],
        timer_mode_enabled: false,
        timer_interval_seconds: None,
        array_spec: None,
        max_triggers: None,
    }
}

fn instance(id: &str, state: WatcherState) -> WatcherInstance {
    let clock = FakeClock::new();
    WatcherInstance {
        state,
        ..WatcherInstance::new(WatcherId::new(id), "4242", "node042", definition(), &clock)
    }
}

fn event(watcher_id: &str, action_type: &str, success: bool, minute: u32) -> WatcherEvent {
    WatcherEvent {
        id: format!("evt-{watcher_id}-{minute}"),
        watcher_id: watcher_id.to_string(),
        watcher_name: format!("{watcher_id}-name"),
        job_id: "4242".to_string(),
        hostname: "node042".to_string(),
        timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, 0).unwrap(),
        matched_text: "ERROR".to_string(),
        captured_vars: Default::default(),
        action_type: action_type.to_string(),
        action_result: None,
        success,
    }
}

#[test]
fn states_are_counted() {
    let instances = vec![
        instance("w-1", WatcherState::Active),
        instance("w-2", WatcherState::Active),
        instance("w-3", WatcherState::Paused),
        instance("w-4", WatcherState::Completed),
    ];

    let now = Utc.with_ymd_and_hms(2026, 3, 1, 13, 0, 0).unwrap();
    let stats = derive(&instances, &[], now, 5);

    assert_eq!(stats.by_state.get("active"), Some(&2));
    assert_eq!(stats.by_state.get("paused"), Some(&1));
    assert_eq!(stats.by_state.get("completed"), Some(&1));
    assert_eq!(stats.by_state.get("failed"), None);
}

#[test]
fn action_tallies_split_successes_and_failures() {
    let events = vec![
        event("w-1", "log_event", true, 0),
        event("w-1", "log_event", true, 1),
        event("w-1", "notify_slack", false, 2),
    ];

    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
    let stats = derive([], &events, now, 5);

    let log_tally = stats.by_action.get("log_event").unwrap();
    assert_eq!(log_tally.total, 2);
    assert_eq!(log_tally.succeeded, 2);

    let slack_tally = stats.by_action.get("notify_slack").unwrap();
    assert_eq!(slack_tally.failed, 1);
}

#[test]
fn lifecycle_records_are_not_action_tallies() {
    let events = vec![
        event("w-1", LIFECYCLE_ACTION, true, 0),
        event("w-1", "log_event", true, 1),
    ];

    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
    let stats = derive([], &events, now, 5);

    assert!(!stats.by_action.contains_key(LIFECYCLE_ACTION));
    assert_eq!(stats.by_action.len(), 1);
    // they still count as activity
    assert_eq!(stats.events_last_hour, 2);
}

#[test]
fn hourly_total_excludes_older_events() {
    let events = vec![
        event("w-1", "log_event", true, 0),
        event("w-1", "log_event", true, 50),
    ];

    // one hour after the first event
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 13, 0, 0).unwrap();
    let stats = derive([], &events, now, 5);

    assert_eq!(stats.events_last_hour, 2);

    let later = Utc.with_ymd_and_hms(2026, 3, 1, 13, 30, 0).unwrap();
    let stats = derive([], &events, later, 5);
    assert_eq!(stats.events_last_hour, 1);
}

#[test]
fn busiest_ranking_is_ordered_and_capped() {
    let mut events = Vec::new();
    for minute in 0..3 {
        events.push(event("w-1", "log_event", true, minute));
    }
    for minute in 10..15 {
        events.push(event("w-2", "log_event", true, minute));
    }
    events.push(event("w-3", "log_event", true, 20));

    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
    let stats = derive([], &events, now, 2);

    assert_eq!(stats.busiest.len(), 2);
    assert_eq!(stats.busiest[0].watcher_id, "w-2");
    assert_eq!(stats.busiest[0].events, 5);
    assert_eq!(stats.busiest[1].watcher_id, "w-1");
    assert_eq!(stats.busiest[1].watcher_name, "w-1-name");
}
