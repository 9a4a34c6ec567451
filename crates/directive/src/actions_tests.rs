// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn builds_log_event_with_optional_message() {
    let action = build_action("log_event", params(&[("message", "loss is ${loss_value}")])).unwrap();
    assert_eq!(
        action,
        ActionSpec::LogEvent {
            message: Some("loss is ${loss_value}".to_string()),
            condition: None,
        }
    );

    let bare = build_action("log_event", vec![]).unwrap();
    assert_eq!(
        bare,
        ActionSpec::LogEvent {
            message: None,
            condition: None,
        }
    );
}

#[test]
fn builds_notify_email() {
    let action = build_action(
        "notify_email",
        params(&[("to", "me@lab"), ("subject", "alert"), ("body", "details")]),
    )
    .unwrap();
    assert_eq!(
        action,
        ActionSpec::NotifyEmail {
            to: "me@lab".to_string(),
            subject: "alert".to_string(),
            body: Some("details".to_string()),
            condition: None,
        }
    );
}

#[test]
fn condition_param_is_lifted_off_every_action() {
    let action = build_action(
        "cancel_job",
        params(&[("condition", "float(loss_value) > 10.0")]),
    )
    .unwrap();
    assert_eq!(
        action,
        ActionSpec::CancelJob {
            condition: Some("float(loss_value) > 10.0".to_string()),
        }
    );
}

#[test]
fn resubmit_folds_leftover_params_into_modifications() {
    let action = build_action(
        "resubmit",
        params(&[("mem", "64G"), ("cancel_original", "true"), ("time", "04:00:00")]),
    )
    .unwrap();
    match action {
        ActionSpec::Resubmit {
            modifications,
            cancel_original,
            condition,
        } => {
            assert!(cancel_original);
            assert!(condition.is_none());
            assert_eq!(modifications.get("mem").map(String::as_str), Some("64G"));
            assert_eq!(
                modifications.get("time").map(String::as_str),
                Some("04:00:00")
            );
            assert!(!modifications.contains_key("cancel_original"));
        }
        other => panic!("expected resubmit, got {other:?}"),
    }
}

#[test]
fn run_command_accepts_timeout_alias() {
    let action = build_action(
        "run_command",
        params(&[("command", "nvidia-smi"), ("timeout", "30")]),
    )
    .unwrap();
    assert_eq!(
        action,
        ActionSpec::RunCommand {
            command: "nvidia-smi".to_string(),
            timeout_seconds: Some(30),
            condition: None,
        }
    );
}

#[parameterized(
    store_metric_name = { "store_metric", &[("value", "1")], "name" },
    store_metric_value = { "store_metric", &[("name", "step")], "value" },
    email_to = { "notify_email", &[("subject", "s")], "to" },
    email_subject = { "notify_email", &[("to", "me@lab")], "subject" },
    slack_channel = { "notify_slack", &[("message", "m")], "channel" },
    slack_message = { "notify_slack", &[("channel", "#hpc")], "message" },
    command = { "run_command", &[], "command" },
)]
fn missing_required_params_are_rejected(action_type: &str, given: &[(&str, &str)], missing: &str) {
    let err = build_action(action_type, params(given)).unwrap_err();
    match err {
        ActionError::MissingParam { param, .. } => assert_eq!(param, missing),
        other => panic!("expected MissingParam, got {other:?}"),
    }
}

#[test]
fn unknown_action_type_is_rejected() {
    let err = build_action("page_oncall", vec![]).unwrap_err();
    assert_eq!(err, ActionError::UnknownType("page_oncall".to_string()));
}

#[test]
fn unexpected_params_are_rejected() {
    let err = build_action("cancel_job", params(&[("force", "true")])).unwrap_err();
    assert_eq!(
        err,
        ActionError::UnexpectedParam {
            action: "cancel_job".to_string(),
            param: "force".to_string(),
        }
    );
}

#[test]
fn bad_bool_and_number_params_are_rejected() {
    let err = build_action("resubmit", params(&[("cancel_original", "yes")])).unwrap_err();
    assert!(matches!(
        err,
        ActionError::BadParam {
            param: "cancel_original",
            ..
        }
    ));

    let err = build_action(
        "run_command",
        params(&[("command", "ls"), ("timeout_seconds", "soon")]),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ActionError::BadParam {
            param: "timeout_seconds",
            ..
        }
    ));
}
