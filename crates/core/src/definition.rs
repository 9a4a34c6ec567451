// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watcher definitions: the immutable rule parsed from a job script
//!
//! A definition pairs a line pattern (or timer cadence) with an ordered
//! action list. Definitions validate once at parse time; everything the
//! engine later assumes — pattern compiles, capture arity matches,
//! conditions are well-formed — is checked here so a bad directive is
//! rejected instead of instantiated.

use crate::condition::{Condition, ConditionError};
use crate::template::interpolate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Which output stream a pattern watcher scans
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    #[default]
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn name(&self) -> &'static str {
        match self {
            OutputStream::Stdout => "stdout",
            OutputStream::Stderr => "stderr",
        }
    }
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Declared task range of an array-template watcher, e.g. `0-99`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArraySpec(pub String);

impl ArraySpec {
    pub fn new(range: impl Into<String>) -> Self {
        Self(range.into())
    }

    /// Number of tasks the range declares, if it is well-formed
    ///
    /// Accepts SLURM-style ranges: `0-99`, `1,3,5`, `0-15:2`, plus an
    /// ignored `%limit` suffix. Returns `None` for anything else; the
    /// expander then relies purely on discovery.
    pub fn task_count(&self) -> Option<u32> {
        let spec = self.0.split('%').next().unwrap_or_default();
        let mut count: u32 = 0;
        for part in spec.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            let (range, step) = match part.split_once(':') {
                Some((range, step)) => (range, step.parse::<u32>().ok()?),
                None => (part, 1),
            };
            if step == 0 {
                return None;
            }
            match range.split_once('-') {
                Some((lo, hi)) => {
                    let lo = lo.trim().parse::<u32>().ok()?;
                    let hi = hi.trim().parse::<u32>().ok()?;
                    if hi < lo {
                        return None;
                    }
                    count += (hi - lo) / step + 1;
                }
                None => {
                    range.trim().parse::<u32>().ok()?;
                    count += 1;
                }
            }
        }
        Some(count)
    }
}

impl fmt::Display for ArraySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One action in a watcher's ordered action list
///
/// Params are typed per action at the parse boundary; string values may
/// carry `${var}` placeholders resolved against the trigger's capture
/// snapshot just before dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionSpec {
    LogEvent {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
    },
    StoreMetric {
        name: String,
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
    },
    NotifyEmail {
        to: String,
        subject: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
    },
    NotifySlack {
        channel: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
    },
    CancelJob {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
    },
    Resubmit {
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        modifications: BTreeMap<String, String>,
        #[serde(default)]
        cancel_original: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
    },
    RunCommand {
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_seconds: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
    },
}

impl ActionSpec {
    pub fn action_type(&self) -> &'static str {
        match self {
            ActionSpec::LogEvent { .. } => "log_event",
            ActionSpec::StoreMetric { .. } => "store_metric",
            ActionSpec::NotifyEmail { .. } => "notify_email",
            ActionSpec::NotifySlack { .. } => "notify_slack",
            ActionSpec::CancelJob { .. } => "cancel_job",
            ActionSpec::Resubmit { .. } => "resubmit",
            ActionSpec::RunCommand { .. } => "run_command",
        }
    }

    pub fn condition(&self) -> Option<&str> {
        match self {
            ActionSpec::LogEvent { condition, .. }
            | ActionSpec::StoreMetric { condition, .. }
            | ActionSpec::NotifyEmail { condition, .. }
            | ActionSpec::NotifySlack { condition, .. }
            | ActionSpec::CancelJob { condition }
            | ActionSpec::Resubmit { condition, .. }
            | ActionSpec::RunCommand { condition, .. } => condition.as_deref(),
        }
    }

    /// Copy of this action with `${var}` placeholders substituted in
    /// every string-valued param
    pub fn resolved(&self, vars: &BTreeMap<String, String>) -> ActionSpec {
        let fill = |s: &str| interpolate(s, vars);
        match self {
            ActionSpec::LogEvent { message, condition } => ActionSpec::LogEvent {
                message: message.as_deref().map(fill),
                condition: condition.clone(),
            },
            ActionSpec::StoreMetric {
                name,
                value,
                condition,
            } => ActionSpec::StoreMetric {
                name: fill(name),
                value: fill(value),
                condition: condition.clone(),
            },
            ActionSpec::NotifyEmail {
                to,
                subject,
                body,
                condition,
            } => ActionSpec::NotifyEmail {
                to: fill(to),
                subject: fill(subject),
                body: body.as_deref().map(fill),
                condition: condition.clone(),
            },
            ActionSpec::NotifySlack {
                channel,
                message,
                condition,
            } => ActionSpec::NotifySlack {
                channel: fill(channel),
                message: fill(message),
                condition: condition.clone(),
            },
            ActionSpec::CancelJob { condition } => ActionSpec::CancelJob {
                condition: condition.clone(),
            },
            ActionSpec::Resubmit {
                modifications,
                cancel_original,
                condition,
            } => ActionSpec::Resubmit {
                modifications: modifications
                    .iter()
                    .map(|(k, v)| (k.clone(), fill(v)))
                    .collect(),
                cancel_original: *cancel_original,
                condition: condition.clone(),
            },
            ActionSpec::RunCommand {
                command,
                timeout_seconds,
                condition,
            } => ActionSpec::RunCommand {
                command: fill(command),
                timeout_seconds: *timeout_seconds,
                condition: condition.clone(),
            },
        }
    }
}

/// Errors that reject a definition before it is ever instantiated
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("captures list names {declared} variables but pattern has {groups} capture groups")]
    CaptureMismatch { groups: usize, declared: usize },
    #[error("interval must be at least 1 second")]
    ZeroInterval,
    #[error("timer mode enabled without timer_interval_seconds")]
    MissingTimerInterval,
    #[error("invalid condition '{source}': {error}")]
    Condition {
        source: String,
        #[source]
        error: ConditionError,
    },
}

/// An immutable watcher rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatcherDefinition {
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub captures: Vec<String>,
    #[serde(default)]
    pub stream: OutputStream,
    pub interval_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
    #[serde(default)]
    pub timer_mode_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_interval_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_spec: Option<ArraySpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_triggers: Option<u32>,
}

impl WatcherDefinition {
    /// Check every property the engine relies on later
    pub fn validate(&self) -> Result<(), DefinitionError> {
        let regex = Regex::new(&self.pattern)?;
        // captures_len counts the implicit whole-match group
        let groups = regex.captures_len() - 1;
        if groups != self.captures.len() {
            return Err(DefinitionError::CaptureMismatch {
                groups,
                declared: self.captures.len(),
            });
        }
        if self.interval_seconds == 0 {
            return Err(DefinitionError::ZeroInterval);
        }
        if self.timer_mode_enabled && self.timer_interval_seconds.is_none() {
            return Err(DefinitionError::MissingTimerInterval);
        }
        if let Some(source) = &self.condition {
            Condition::parse(source).map_err(|error| DefinitionError::Condition {
                source: source.clone(),
                error,
            })?;
        }
        for action in &self.actions {
            if let Some(source) = action.condition() {
                Condition::parse(source).map_err(|error| DefinitionError::Condition {
                    source: source.to_string(),
                    error,
                })?;
            }
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn timer_interval(&self) -> Option<Duration> {
        self.timer_interval_seconds.map(Duration::from_secs)
    }

    pub fn is_array_template(&self) -> bool {
        self.array_spec.is_some()
    }

    /// Declared array size, when the range is well-formed
    pub fn expected_task_count(&self) -> Option<u32> {
        self.array_spec.as_ref().and_then(ArraySpec::task_count)
    }

    /// Definition a discovered array task runs under: same rule, scoped
    /// to one task, no longer a template
    pub fn child_for_task(&self, task_id: u32) -> WatcherDefinition {
        WatcherDefinition {
            name: format!("{}[{}]", self.name, task_id),
            array_spec: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
#[path = "definition_tests.rs"]
mod tests;
