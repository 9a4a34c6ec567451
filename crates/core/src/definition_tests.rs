// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn make_definition() -> WatcherDefinition {
    WatcherDefinition {
        name: "loss-guard".to_string(),
        pattern: r"loss: ([0-9.]+)".to_string(),
        captures: vec!["loss_value".to_string()],
        stream: OutputStream::Stdout,
        interval_seconds: 30,
        condition: Some("float(loss_value) > 5.0".to_string()),
        actions: vec![ActionSpec::CancelJob { condition: None }],
        timer_mode_enabled: false,
        timer_interval_seconds: None,
        array_spec: None,
        max_triggers: None,
    }
}

#[test]
fn valid_definition_passes() {
    assert!(make_definition().validate().is_ok());
}

#[test]
fn pattern_without_groups_needs_no_captures() {
    let def = WatcherDefinition {
        pattern: "ERROR|FAIL".to_string(),
        captures: vec![],
        condition: None,
        ..make_definition()
    };
    assert!(def.validate().is_ok());
}

#[test]
fn capture_count_must_match_group_count() {
    let def = WatcherDefinition {
        pattern: r"Step (\d+)/(\d+)".to_string(),
        captures: vec!["current".to_string()],
        condition: None,
        ..make_definition()
    };
    let err = def.validate().unwrap_err();
    assert!(matches!(
        err,
        DefinitionError::CaptureMismatch {
            groups: 2,
            declared: 1
        }
    ));
}

#[test]
fn extra_captures_are_rejected_too() {
    let def = WatcherDefinition {
        pattern: "ERROR".to_string(),
        captures: vec!["oops".to_string()],
        condition: None,
        ..make_definition()
    };
    assert!(matches!(
        def.validate().unwrap_err(),
        DefinitionError::CaptureMismatch {
            groups: 0,
            declared: 1
        }
    ));
}

#[test]
fn unparseable_regex_is_rejected() {
    let def = WatcherDefinition {
        pattern: "([unclosed".to_string(),
        captures: vec![],
        condition: None,
        ..make_definition()
    };
    assert!(matches!(
        def.validate().unwrap_err(),
        DefinitionError::Pattern(_)
    ));
}

#[test]
fn zero_interval_is_rejected() {
    let def = WatcherDefinition {
        interval_seconds: 0,
        ..make_definition()
    };
    assert!(matches!(
        def.validate().unwrap_err(),
        DefinitionError::ZeroInterval
    ));
}

#[test]
fn timer_mode_requires_timer_interval() {
    let def = WatcherDefinition {
        timer_mode_enabled: true,
        timer_interval_seconds: None,
        ..make_definition()
    };
    assert!(matches!(
        def.validate().unwrap_err(),
        DefinitionError::MissingTimerInterval
    ));
}

#[test]
fn malformed_definition_condition_is_rejected() {
    let def = WatcherDefinition {
        condition: Some("float(loss_value) >".to_string()),
        ..make_definition()
    };
    assert!(matches!(
        def.validate().unwrap_err(),
        DefinitionError::Condition { .. }
    ));
}

#[test]
fn malformed_action_condition_is_rejected() {
    let def = WatcherDefinition {
        actions: vec![ActionSpec::CancelJob {
            condition: Some("not".to_string()),
        }],
        ..make_definition()
    };
    assert!(matches!(
        def.validate().unwrap_err(),
        DefinitionError::Condition { .. }
    ));
}

use yare::parameterized;

#[parameterized(
    simple_range = { "0-99", Some(100) },
    single_task = { "7", Some(1) },
    comma_list = { "1,3,5", Some(3) },
    stepped_range = { "0-15:2", Some(8) },
    throttled = { "0-9%4", Some(10) },
    mixed = { "0-3,10", Some(5) },
    garbage = { "tasks", None },
    reversed = { "9-0", None },
    empty = { "", None },
)]
fn array_spec_task_counts(range: &str, expected: Option<u32>) {
    assert_eq!(ArraySpec::new(range).task_count(), expected);
}

#[test]
fn array_template_flag_follows_array_spec() {
    let mut def = make_definition();
    assert!(!def.is_array_template());
    def.array_spec = Some(ArraySpec::new("0-9"));
    assert!(def.is_array_template());
    assert_eq!(def.expected_task_count(), Some(10));
}

#[test]
fn child_for_task_drops_template_marker() {
    let def = WatcherDefinition {
        array_spec: Some(ArraySpec::new("0-9")),
        ..make_definition()
    };
    let child = def.child_for_task(3);
    assert_eq!(child.name, "loss-guard[3]");
    assert!(child.array_spec.is_none());
    assert_eq!(child.pattern, def.pattern);
    assert_eq!(child.actions, def.actions);
}

#[test]
fn action_spec_serializes_with_type_tag() {
    let action = ActionSpec::StoreMetric {
        name: "loss".to_string(),
        value: "${loss_value}".to_string(),
        condition: None,
    };
    let json = serde_json::to_value(&action).unwrap();
    assert_eq!(json["type"], "store_metric");
    assert_eq!(json["name"], "loss");
    // absent condition is omitted, not null
    assert!(json.get("condition").is_none());
}

#[test]
fn action_spec_round_trips() {
    let action = ActionSpec::Resubmit {
        modifications: [("memory".to_string(), "64G".to_string())].into(),
        cancel_original: true,
        condition: Some("int(attempt) < 3".to_string()),
    };
    let json = serde_json::to_string(&action).unwrap();
    let back: ActionSpec = serde_json::from_str(&json).unwrap();
    assert_eq!(back, action);
}

#[test]
fn resolved_substitutes_string_params() {
    let vars: BTreeMap<String, String> = [("loss_value".to_string(), "7.5".to_string())].into();
    let action = ActionSpec::NotifyEmail {
        to: "user@example.com".to_string(),
        subject: "loss hit ${loss_value}".to_string(),
        body: Some("current loss: ${loss_value}".to_string()),
        condition: Some("float(loss_value) > 5.0".to_string()),
    };
    let resolved = action.resolved(&vars);
    assert!(matches!(
        resolved,
        ActionSpec::NotifyEmail { subject, body, condition, .. }
            if subject == "loss hit 7.5"
                && body.as_deref() == Some("current loss: 7.5")
                // conditions are evaluated against the snapshot, never rewritten
                && condition.as_deref() == Some("float(loss_value) > 5.0")
    ));
}

#[test]
fn resolved_substitutes_modification_values() {
    let vars: BTreeMap<String, String> = [("mem".to_string(), "128G".to_string())].into();
    let action = ActionSpec::Resubmit {
        modifications: [("memory".to_string(), "${mem}".to_string())].into(),
        cancel_original: false,
        condition: None,
    };
    let resolved = action.resolved(&vars);
    assert!(matches!(
        resolved,
        ActionSpec::Resubmit { modifications, .. }
            if modifications.get("memory").map(String::as_str) == Some("128G")
    ));
}

#[test]
fn action_types_are_stable_strings() {
    let actions = [
        (ActionSpec::LogEvent { message: None, condition: None }, "log_event"),
        (ActionSpec::CancelJob { condition: None }, "cancel_job"),
        (
            ActionSpec::RunCommand {
                command: "true".to_string(),
                timeout_seconds: None,
                condition: None,
            },
            "run_command",
        ),
    ];
    for (action, expected) in actions {
        assert_eq!(action.action_type(), expected);
    }
}
