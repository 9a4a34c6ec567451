// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use jw_core::definition::DefinitionError;

#[test]
fn script_without_directives_parses_empty() {
    let script = "#!/bin/bash\n#SBATCH --job-name=train\nsrun python train.py\n";
    assert!(parse_script(script).unwrap().is_empty());
}

#[test]
fn inline_directive_with_defaults() {
    let script = r##"#!/bin/bash
#WATCHER pattern="ERROR|FAIL" action=log_event()
srun python train.py
"##;
    let definitions = parse_script(script).unwrap();
    assert_eq!(definitions.len(), 1);

    let definition = &definitions[0];
    assert_eq!(definition.name, "watcher-1");
    assert_eq!(definition.pattern, "ERROR|FAIL");
    assert_eq!(definition.interval_seconds, DEFAULT_INTERVAL_SECONDS);
    assert_eq!(definition.stream, jw_core::OutputStream::Stdout);
    assert!(definition.captures.is_empty());
    assert!(definition.condition.is_none());
    assert_eq!(definition.actions.len(), 1);
}

#[test]
fn inline_directive_with_captures_and_condition() {
    let script = r##"#WATCHER name="loss-guard" pattern="loss: ([0-9.]+)" captures=[loss_value] condition="float(loss_value) > 5.0" interval=60 action=cancel_job() action=notify_email(to="me@lab", subject="loss ${loss_value}")"##;
    let definitions = parse_script(script).unwrap();
    let definition = &definitions[0];

    assert_eq!(definition.name, "loss-guard");
    assert_eq!(definition.captures, vec!["loss_value".to_string()]);
    assert_eq!(
        definition.condition.as_deref(),
        Some("float(loss_value) > 5.0")
    );
    assert_eq!(definition.interval_seconds, 60);
    assert_eq!(definition.actions.len(), 2);
    assert_eq!(definition.actions[0].action_type(), "cancel_job");
    assert_eq!(definition.actions[1].action_type(), "notify_email");
}

#[test]
fn inline_accepts_stream_and_trigger_cap() {
    let script = r##"#WATCHER pattern="CUDA out of memory" stream="stderr" max_triggers=1 action=resubmit(mem="64G", cancel_original=true)"##;
    let definition = &parse_script(script).unwrap()[0];

    assert_eq!(definition.stream, jw_core::OutputStream::Stderr);
    assert_eq!(definition.max_triggers, Some(1));
    assert_eq!(definition.actions[0].action_type(), "resubmit");
}

#[test]
fn block_directive_full_form() {
    let script = r##"#!/bin/bash
#SBATCH --job-name=train
#WATCHER_BEGIN
# name: temp-guard
# pattern: Temperature: (\d+)
# captures: [temp]
# interval: 30
# condition: int(temp) > 80
# timer_mode_enabled: true
# timer_interval_seconds: 300
# actions:
#   - type: log_event
#   - type: notify_slack
#     params: {channel: "#hpc-alerts", message: "temp ${temp} on ${hostname}"}
#   - cancel_job()
#WATCHER_END
srun python train.py
"##;
    let definitions = parse_script(script).unwrap();
    assert_eq!(definitions.len(), 1);

    let definition = &definitions[0];
    assert_eq!(definition.name, "temp-guard");
    assert_eq!(definition.pattern, r"Temperature: (\d+)");
    assert_eq!(definition.captures, vec!["temp".to_string()]);
    assert_eq!(definition.condition.as_deref(), Some("int(temp) > 80"));
    assert!(definition.timer_mode_enabled);
    assert_eq!(definition.timer_interval_seconds, Some(300));

    let types: Vec<_> = definition.actions.iter().map(|a| a.action_type()).collect();
    assert_eq!(types, vec!["log_event", "notify_slack", "cancel_job"]);
    assert_eq!(
        definition.actions[1],
        jw_core::ActionSpec::NotifySlack {
            channel: "#hpc-alerts".to_string(),
            message: "temp ${temp} on ${hostname}".to_string(),
            condition: None,
        }
    );
}

#[test]
fn block_accepts_single_action_shorthand() {
    let script = r##"#WATCHER_BEGIN
# pattern: Step (\d+)/(\d+)
# captures: [current, total]
# action: store_metric(name="step", value="${current}")
#WATCHER_END
"##;
    let definition = &parse_script(script).unwrap()[0];
    assert_eq!(definition.actions.len(), 1);
    assert_eq!(definition.actions[0].action_type(), "store_metric");
}

#[test]
fn block_pattern_keeps_colons_and_quotes_strip_once() {
    let script = r##"#WATCHER_BEGIN
# pattern: loss: ([0-9.]+)
# captures: [loss_value]
# condition: "float(loss_value) > 5.0"
# action: cancel_job()
#WATCHER_END
"##;
    let definition = &parse_script(script).unwrap()[0];
    assert_eq!(definition.pattern, "loss: ([0-9.]+)");
    assert_eq!(
        definition.condition.as_deref(),
        Some("float(loss_value) > 5.0")
    );
}

#[test]
fn block_declares_array_template() {
    let script = r##"#WATCHER_BEGIN
# pattern: ERROR
# array_spec: 0-99
# action: log_event()
#WATCHER_END
"##;
    let definition = &parse_script(script).unwrap()[0];
    assert!(definition.is_array_template());
    assert_eq!(definition.expected_task_count(), Some(100));
}

#[test]
fn mixed_directives_auto_name_by_ordinal() {
    let script = r##"#WATCHER pattern="ERROR" action=log_event()
#WATCHER_BEGIN
# pattern: WARN
# action: log_event()
#WATCHER_END
#WATCHER pattern="FATAL" action=cancel_job()
"##;
    let definitions = parse_script(script).unwrap();
    let names: Vec<_> = definitions.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["watcher-1", "watcher-2", "watcher-3"]);
}

#[test]
fn interval_seconds_alias_is_accepted() {
    let script = r##"#WATCHER pattern="ERROR" interval_seconds=120 action=log_event()"##;
    let definition = &parse_script(script).unwrap()[0];
    assert_eq!(definition.interval_seconds, 120);
}

#[test]
fn watcher_prefixed_comments_are_not_directives() {
    let script = "#WATCHERS fired today: 3\n# WATCHER disabled\n";
    assert!(parse_script(script).unwrap().is_empty());
}

#[test]
fn capture_count_mismatch_fails_the_parse() {
    let script = r##"#WATCHER pattern="loss: ([0-9.]+)" captures=[loss_value, step] action=log_event()"##;
    let err = parse_script(script).unwrap_err();
    match err {
        ParseError::Definition {
            line: 1,
            source: DefinitionError::CaptureMismatch { groups, declared },
        } => {
            assert_eq!(groups, 1);
            assert_eq!(declared, 2);
        }
        other => panic!("expected capture mismatch, got {other:?}"),
    }
}

#[test]
fn bad_regex_fails_the_parse() {
    let script = r##"#WATCHER pattern="loss: ([0-9.+" action=log_event()"##;
    let err = parse_script(script).unwrap_err();
    assert!(matches!(
        err,
        ParseError::Definition {
            source: DefinitionError::Pattern(_),
            ..
        }
    ));
}

#[test]
fn unknown_action_type_fails_the_parse() {
    let script = r##"#WATCHER pattern="ERROR" action=page_oncall()"##;
    let err = parse_script(script).unwrap_err();
    assert!(matches!(
        err,
        ParseError::Action {
            line: 1,
            source: ActionError::UnknownType(name),
        } if name == "page_oncall"
    ));
}

#[test]
fn non_numeric_interval_fails_the_parse() {
    let script = r##"#WATCHER pattern="ERROR" interval=soon action=log_event()"##;
    let err = parse_script(script).unwrap_err();
    assert!(matches!(
        err,
        ParseError::InvalidNumber { key, .. } if key == "interval"
    ));
}

#[test]
fn missing_pattern_fails_the_parse() {
    let err = parse_script(r##"#WATCHER action=log_event()"##).unwrap_err();
    assert!(matches!(
        err,
        ParseError::MissingField {
            field: "pattern",
            ..
        }
    ));
}

#[test]
fn directive_without_actions_fails_the_parse() {
    let err = parse_script(r##"#WATCHER pattern="ERROR""##).unwrap_err();
    assert!(matches!(
        err,
        ParseError::MissingField {
            field: "actions",
            ..
        }
    ));
}

#[test]
fn unknown_key_fails_the_parse() {
    let err = parse_script(r##"#WATCHER pattern="ERROR" cadence=5 action=log_event()"##)
        .unwrap_err();
    assert!(matches!(err, ParseError::UnknownKey { key, .. } if key == "cadence"));
}

#[test]
fn duplicate_key_fails_the_parse() {
    let err =
        parse_script(r##"#WATCHER pattern="ERROR" pattern="FAIL" action=log_event()"##).unwrap_err();
    assert!(matches!(err, ParseError::DuplicateKey { key, .. } if key == "pattern"));
}

#[test]
fn unterminated_block_reports_the_begin_line() {
    let script = "#!/bin/bash\n#WATCHER_BEGIN\n# pattern: ERROR\n";
    let err = parse_script(script).unwrap_err();
    assert!(matches!(err, ParseError::UnterminatedBlock { line: 2 }));
}

#[test]
fn end_without_begin_is_rejected() {
    let err = parse_script("#WATCHER_END\n").unwrap_err();
    assert!(matches!(err, ParseError::InvalidDirective { line: 1, .. }));
}

#[test]
fn non_comment_line_inside_block_is_rejected() {
    let script = "#WATCHER_BEGIN\n# pattern: ERROR\necho hello\n#WATCHER_END\n";
    let err = parse_script(script).unwrap_err();
    assert!(matches!(err, ParseError::InvalidDirective { line: 3, .. }));
}

#[test]
fn params_without_item_is_rejected() {
    let script = "#WATCHER_BEGIN\n# pattern: ERROR\n# actions:\n#   params: {x: \"1\"}\n#WATCHER_END\n";
    let err = parse_script(script).unwrap_err();
    assert!(matches!(err, ParseError::InvalidDirective { line: 4, .. }));
}

#[test]
fn bad_action_condition_fails_validation() {
    let script = r##"#WATCHER pattern="ERROR" action=cancel_job(condition="loss >") "##;
    let err = parse_script(script).unwrap_err();
    assert!(matches!(
        err,
        ParseError::Definition {
            source: DefinitionError::Condition { .. },
            ..
        }
    ));
}
