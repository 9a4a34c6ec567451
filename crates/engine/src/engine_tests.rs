// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use jw_adapters::{FakeJobControl, FakeMetricSink, FakeNotifier, FakeOutputReader, FakeRemoteExec};
use jw_core::{ActionSpec, FakeClock, SequentialIdGen};

type TestEngine = Engine<
    FakeOutputReader,
    FakeJobControl,
    FakeNotifier,
    FakeRemoteExec,
    FakeMetricSink,
    FakeClock,
    SequentialIdGen,
>;

struct Rig {
    engine: TestEngine,
    clock: FakeClock,
    output: FakeOutputReader,
}

fn rig() -> Rig {
    let clock = FakeClock::new();
    let output = FakeOutputReader::new();
    let deps = EngineDeps {
        output: output.clone(),
        jobs: FakeJobControl::new(),
        notify: FakeNotifier::new(),
        remote: FakeRemoteExec::new(),
        metrics: FakeMetricSink::new(),
        store: EventStore::in_memory(),
    };
    let engine = Engine::new(
        EngineConfig::for_testing(),
        deps,
        clock.clone(),
        SequentialIdGen::new("w"),
    );
    Rig {
        engine,
        clock,
        output,
    }
}

fn definition(name: &str, pattern: &str) -> WatcherDefinition {
    WatcherDefinition {
        name: name.to_string(),
        pattern: pattern.to_string(),
        captures: vec![],
        stream: OutputStream::Stdout,
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

/// Advance the clock, fire due timers, and apply every completion
async fn step(rig: &mut Rig, seconds: u64) {
    rig.clock.advance(Duration::from_secs(seconds));
    let now = rig.clock.now();
    rig.engine.tick_at(now);
    rig.engine.settle().await;
}

#[test]
fn register_returns_the_client_view() {
    let mut rig = rig();

    let view = rig
        .engine
        .register("4242", "node-01", definition("error-watch", "ERROR"))
        .unwrap();

    assert_eq!(view.id, "w-1");
    assert_eq!(view.job_id, "4242");
    assert_eq!(view.hostname, "node-01");
    assert_eq!(view.pattern, "ERROR");
    assert_eq!(view.state, WatcherState::Pending);
    assert_eq!(view.trigger_count, 0);
    assert_eq!(rig.engine.watcher("w-1").unwrap(), view);
}

#[test]
fn register_rejects_invalid_patterns() {
    let mut rig = rig();

    let err = rig
        .engine
        .register("4242", "node-01", definition("bad", "("))
        .unwrap_err();

    assert!(matches!(err, EngineError::Definition(_)));
    assert!(matches!(
        rig.engine.watcher("w-1"),
        Err(EngineError::UnknownWatcher(_))
    ));
}

#[test]
fn register_script_instantiates_each_directive() {
    let mut rig = rig();
    let script = concat!(
        "#!/bin/bash\n",
        "#SBATCH --job-name=train\n",
        "#WATCHER name=\"errors\" pattern=\"ERROR|FAIL\" action=log_event()\n",
        "#WATCHER pattern=\"loss: ([0-9.]+)\" captures=[loss_value] ",
        "action=store_metric(name=\"loss\", value=\"${loss_value}\")\n",
        "srun train.py\n",
    );

    let views = rig.engine.register_script("4242", "node-01", script).unwrap();

    assert_eq!(views.len(), 2);
    assert_eq!(views[0].name, "errors");
    assert_eq!(views[1].name, "watcher-2");
    assert_eq!(views[1].captures, vec!["loss_value".to_string()]);
}

#[test]
fn registration_is_audited() {
    let mut rig = rig();

    let view = rig
        .engine
        .register("4242", "node-01", definition("error-watch", "ERROR"))
        .unwrap();

    let events = rig.engine.events_for_watcher(&view.id);
    assert_eq!(events.count, 1);
    assert_eq!(events.events[0].action_type, "lifecycle");
    assert_eq!(events.events[0].action_result.as_deref(), Some("registered"));
    assert!(events.events[0].success);
}

#[test]
fn unknown_watcher_ids_error() {
    let mut rig = rig();

    assert!(matches!(
        rig.engine.pause("w-9"),
        Err(EngineError::UnknownWatcher(_))
    ));
    assert!(matches!(
        rig.engine.resume("w-9"),
        Err(EngineError::UnknownWatcher(_))
    ));
    assert!(matches!(
        rig.engine.delete("w-9"),
        Err(EngineError::UnknownWatcher(_))
    ));
}

#[tokio::test]
async fn pause_from_paused_is_absorbed() {
    let mut rig = rig();
    let view = rig
        .engine
        .register("4242", "node-01", definition("error-watch", "ERROR"))
        .unwrap();
    step(&mut rig, 30).await;

    rig.engine.pause(&view.id).unwrap();
    let second = rig.engine.pause(&view.id).unwrap();

    assert_eq!(second.state, WatcherState::Paused);
    let events = rig.engine.events_for_watcher(&view.id);
    let paused = events
        .events
        .iter()
        .filter(|e| e.action_result.as_deref() == Some("paused"))
        .count();
    assert_eq!(paused, 1);
}

#[tokio::test]
async fn evaluate_static_rejects_live_watchers() {
    let mut rig = rig();
    let view = rig
        .engine
        .register("4242", "node-01", definition("error-watch", "ERROR"))
        .unwrap();

    let err = rig.engine.evaluate_static(&view.id).await.unwrap_err();

    assert!(matches!(err, EngineError::NotStatic(_)));
}

#[tokio::test]
async fn first_tick_activates_and_reads() {
    let mut rig = rig();
    let view = rig
        .engine
        .register("4242", "node-01", definition("error-watch", "ERROR"))
        .unwrap();
    assert!(rig.output.calls().is_empty());

    step(&mut rig, 30).await;

    let watcher = rig.engine.watcher(&view.id).unwrap();
    assert_eq!(watcher.state, WatcherState::Active);
    let reads = rig.output.calls();
    assert_eq!(reads.len(), 1);
    assert_eq!(reads[0].job_id, "4242");
    assert_eq!(reads[0].from_position, 0);
    let events = rig.engine.events_for_watcher(&view.id);
    assert!(events
        .events
        .iter()
        .any(|e| e.action_result.as_deref() == Some("activated")));
}

#[tokio::test]
async fn stats_gather_states_and_actions() {
    let mut rig = rig();
    rig.engine
        .register("4242", "node-01", definition("first", "ERROR"))
        .unwrap();
    rig.engine
        .register("4242", "node-01", definition("second", "FAIL"))
        .unwrap();
    rig.output.append("4242", OutputStream::Stdout, b"ERROR: boom\n");
    step(&mut rig, 30).await;

    let stats = rig.engine.stats();

    assert_eq!(stats.by_state.get("active"), Some(&2));
    let logs = stats.by_action.get("log_event").unwrap();
    assert_eq!(logs.total, 1);
    assert_eq!(logs.succeeded, 1);
    // lifecycle records count toward activity but not the action tallies
    assert!(!stats.by_action.contains_key("lifecycle"));
    assert_eq!(stats.events_last_hour, 5);
    assert_eq!(stats.busiest[0].watcher_name, "first");
}

#[test]
fn watchers_for_job_sorted_and_scoped() {
    let mut rig = rig();
    let first = rig
        .engine
        .register("4242", "node-01", definition("first", "ERROR"))
        .unwrap();
    rig.clock.advance(Duration::from_secs(1));
    let second = rig
        .engine
        .register("4242", "node-01", definition("second", "FAIL"))
        .unwrap();
    rig.engine
        .register("9999", "node-02", definition("other", "WARN"))
        .unwrap();

    let listed = rig.engine.watchers_for_job("4242");

    assert_eq!(listed.job_id, "4242");
    assert_eq!(listed.count, 2);
    assert_eq!(listed.watchers[0].id, first.id);
    assert_eq!(listed.watchers[1].id, second.id);
}
