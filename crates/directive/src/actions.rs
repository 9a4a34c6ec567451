// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed action construction from directive params

use jw_core::ActionSpec;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors turning a directive's `type(params)` into an [`ActionSpec`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("unknown action type `{0}`")]
    UnknownType(String),
    #[error("`{action}` requires param `{param}`")]
    MissingParam {
        action: &'static str,
        param: &'static str,
    },
    #[error("`{action}` param `{param}` must be {expected}, got `{value}`")]
    BadParam {
        action: &'static str,
        param: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("`{action}` does not accept param `{param}`")]
    UnexpectedParam { action: String, param: String },
}

fn take(params: &mut Vec<(String, String)>, key: &str) -> Option<String> {
    let idx = params.iter().position(|(k, _)| k == key)?;
    Some(params.remove(idx).1)
}

fn require(
    params: &mut Vec<(String, String)>,
    action: &'static str,
    param: &'static str,
) -> Result<String, ActionError> {
    take(params, param).ok_or(ActionError::MissingParam { action, param })
}

fn take_bool(
    params: &mut Vec<(String, String)>,
    action: &'static str,
    param: &'static str,
) -> Result<Option<bool>, ActionError> {
    match take(params, param).as_deref() {
        None => Ok(None),
        Some("true") => Ok(Some(true)),
        Some("false") => Ok(Some(false)),
        Some(other) => Err(ActionError::BadParam {
            action,
            param,
            expected: "true or false",
            value: other.to_string(),
        }),
    }
}

fn take_u64(
    params: &mut Vec<(String, String)>,
    action: &'static str,
    param: &'static str,
) -> Result<Option<u64>, ActionError> {
    match take(params, param) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| ActionError::BadParam {
            action,
            param,
            expected: "a number of seconds",
            value,
        }),
    }
}

/// Reject any params left over after the action consumed its own
fn finish(action: &str, params: Vec<(String, String)>) -> Result<(), ActionError> {
    match params.into_iter().next() {
        None => Ok(()),
        Some((param, _)) => Err(ActionError::UnexpectedParam {
            action: action.to_string(),
            param,
        }),
    }
}

/// Build a typed action from a directive's action type and params.
///
/// Every action accepts an optional `condition` param; `resubmit`
/// folds all unrecognized params into its modifications map.
pub fn build_action(
    action_type: &str,
    mut params: Vec<(String, String)>,
) -> Result<ActionSpec, ActionError> {
    let condition = take(&mut params, "condition");
    let action = match action_type {
        "log_event" => ActionSpec::LogEvent {
            message: take(&mut params, "message"),
            condition,
        },
        "store_metric" => ActionSpec::StoreMetric {
            name: require(&mut params, "store_metric", "name")?,
            value: require(&mut params, "store_metric", "value")?,
            condition,
        },
        "notify_email" => ActionSpec::NotifyEmail {
            to: require(&mut params, "notify_email", "to")?,
            subject: require(&mut params, "notify_email", "subject")?,
            body: take(&mut params, "body"),
            condition,
        },
        "notify_slack" => ActionSpec::NotifySlack {
            channel: require(&mut params, "notify_slack", "channel")?,
            message: require(&mut params, "notify_slack", "message")?,
            condition,
        },
        "cancel_job" => ActionSpec::CancelJob { condition },
        "resubmit" => {
            let cancel_original =
                take_bool(&mut params, "resubmit", "cancel_original")?.unwrap_or(false);
            // everything else is a submission modification, e.g. mem="64G"
            let modifications: BTreeMap<String, String> = params.drain(..).collect();
            ActionSpec::Resubmit {
                modifications,
                cancel_original,
                condition,
            }
        }
        "run_command" => {
            let timeout_seconds = match take_u64(&mut params, "run_command", "timeout_seconds")? {
                Some(t) => Some(t),
                None => take_u64(&mut params, "run_command", "timeout")?,
            };
            ActionSpec::RunCommand {
                command: require(&mut params, "run_command", "command")?,
                timeout_seconds,
                condition,
            }
        }
        other => return Err(ActionError::UnknownType(other.to_string())),
    };
    finish(action_type, params)?;
    Ok(action)
}

#[cfg(test)]
#[path = "actions_tests.rs"]
mod tests;
