// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Script scanning and directive assembly

use crate::actions::{build_action, ActionError};
use crate::scan::{scan_attributes, scan_call, scan_map, AttrValue, ScanError};
use jw_core::{ActionSpec, ArraySpec, DefinitionError, OutputStream, WatcherDefinition};
use std::collections::BTreeSet;
use thiserror::Error;

/// Poll cadence used when a directive does not declare one
pub const DEFAULT_INTERVAL_SECONDS: u64 = 30;

/// Errors naming the offending directive by script line
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: unterminated directive block")]
    UnterminatedBlock { line: usize },
    #[error("line {line}: {reason}")]
    InvalidDirective { line: usize, reason: String },
    #[error("line {line}: {source}")]
    Attribute { line: usize, source: ScanError },
    #[error("line {line}: {source}")]
    Action { line: usize, source: ActionError },
    #[error("line {line}: missing required field `{field}`")]
    MissingField { line: usize, field: &'static str },
    #[error("line {line}: unknown key `{key}`")]
    UnknownKey { line: usize, key: String },
    #[error("line {line}: duplicate key `{key}`")]
    DuplicateKey { line: usize, key: String },
    #[error("line {line}: `{key}` must be a number, got `{value}`")]
    InvalidNumber {
        line: usize,
        key: String,
        value: String,
    },
    #[error("line {line}: `{key}` must be true or false, got `{value}`")]
    InvalidBool {
        line: usize,
        key: String,
        value: String,
    },
    #[error("line {line}: {source}")]
    Definition { line: usize, source: DefinitionError },
}

/// Extract every watcher definition embedded in a job script.
///
/// A directive that fails to parse or validate fails the whole scan;
/// definitions are never silently dropped.
pub fn parse_script(script: &str) -> Result<Vec<WatcherDefinition>, ParseError> {
    let mut definitions = Vec::new();
    let mut lines = script.lines().enumerate();

    while let Some((idx, raw)) = lines.next() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if let Some(rest) = trimmed.strip_prefix("#WATCHER_BEGIN") {
            if !rest.trim().is_empty() {
                return Err(ParseError::InvalidDirective {
                    line,
                    reason: "unexpected content after #WATCHER_BEGIN".to_string(),
                });
            }
            let definition = parse_block(&mut lines, line, definitions.len())?;
            definitions.push(definition);
        } else if trimmed.strip_prefix("#WATCHER_END").is_some_and(|r| r.trim().is_empty()) {
            return Err(ParseError::InvalidDirective {
                line,
                reason: "#WATCHER_END without #WATCHER_BEGIN".to_string(),
            });
        } else if let Some(rest) = trimmed.strip_prefix("#WATCHER") {
            // `#WATCHERS did fire` is an ordinary comment, not a directive
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                let definition = parse_inline(line, rest, definitions.len())?;
                definitions.push(definition);
            }
        }
    }
    Ok(definitions)
}

/// One-line `#WATCHER key="value" ...` form
fn parse_inline(
    line: usize,
    rest: &str,
    ordinal: usize,
) -> Result<WatcherDefinition, ParseError> {
    let attrs = scan_attributes(rest).map_err(|source| ParseError::Attribute { line, source })?;
    let mut builder = DefinitionBuilder::default();

    for (key, value) in attrs {
        match (key.as_str(), value) {
            ("action", AttrValue::Call { name, args }) => {
                let action =
                    build_action(&name, args).map_err(|source| ParseError::Action { line, source })?;
                builder.actions.push(action);
            }
            // bare form: action=cancel_job
            ("action", AttrValue::Scalar(name)) => {
                let action = build_action(&name, Vec::new())
                    .map_err(|source| ParseError::Action { line, source })?;
                builder.actions.push(action);
            }
            ("captures", AttrValue::List(names)) => {
                builder.mark(line, "captures")?;
                builder.captures = names;
            }
            (_, AttrValue::Scalar(value)) => builder.set_scalar(line, &key, value)?,
            (_, AttrValue::List(_) | AttrValue::Call { .. }) => {
                return Err(ParseError::InvalidDirective {
                    line,
                    reason: format!("`{key}` expects a scalar value"),
                });
            }
        }
    }
    builder.finish(line, ordinal)
}

/// A `- type: x` list item waiting for an optional `params:` line
struct PendingTyped {
    line: usize,
    action_type: String,
    params: Option<Vec<(String, String)>>,
}

fn flush_pending(
    pending: &mut Option<PendingTyped>,
    actions: &mut Vec<ActionSpec>,
) -> Result<(), ParseError> {
    if let Some(item) = pending.take() {
        let action = build_action(&item.action_type, item.params.unwrap_or_default())
            .map_err(|source| ParseError::Action {
                line: item.line,
                source,
            })?;
        actions.push(action);
    }
    Ok(())
}

/// `#WATCHER_BEGIN` ... `#WATCHER_END` block form
fn parse_block(
    lines: &mut std::iter::Enumerate<std::str::Lines<'_>>,
    begin_line: usize,
    ordinal: usize,
) -> Result<WatcherDefinition, ParseError> {
    let mut builder = DefinitionBuilder::default();
    let mut actions_open = false;
    let mut pending: Option<PendingTyped> = None;

    loop {
        let Some((idx, raw)) = lines.next() else {
            return Err(ParseError::UnterminatedBlock { line: begin_line });
        };
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed == "#WATCHER_END" {
            break;
        }
        if trimmed.is_empty() {
            continue;
        }
        let Some(content) = trimmed.strip_prefix('#') else {
            return Err(ParseError::InvalidDirective {
                line,
                reason: "non-comment line inside directive block".to_string(),
            });
        };
        let content = content.trim();
        if content.is_empty() {
            continue;
        }

        // actions list items: `- type: x` or `- shorthand(...)`
        if let Some(item) = content.strip_prefix('-') {
            if !actions_open {
                return Err(ParseError::InvalidDirective {
                    line,
                    reason: "list item outside an `actions:` list".to_string(),
                });
            }
            let item = item.trim();
            flush_pending(&mut pending, &mut builder.actions)?;
            if let Some(type_name) = item.strip_prefix("type:") {
                pending = Some(PendingTyped {
                    line,
                    action_type: type_name.trim().to_string(),
                    params: None,
                });
            } else {
                let (name, args) =
                    scan_call(item).map_err(|source| ParseError::Attribute { line, source })?;
                let action = build_action(&name, args)
                    .map_err(|source| ParseError::Action { line, source })?;
                builder.actions.push(action);
            }
            continue;
        }

        let Some((key, value)) = content.split_once(':') else {
            return Err(ParseError::InvalidDirective {
                line,
                reason: "expected `key: value`".to_string(),
            });
        };
        let key = key.trim();
        let value = value.trim();

        match key {
            "params" => match pending.as_mut() {
                Some(item) if item.params.is_none() => {
                    item.params = Some(
                        scan_map(value).map_err(|source| ParseError::Attribute { line, source })?,
                    );
                }
                _ => {
                    return Err(ParseError::InvalidDirective {
                        line,
                        reason: "`params` without a preceding `- type:` item".to_string(),
                    });
                }
            },
            "actions" => {
                if !value.is_empty() {
                    return Err(ParseError::InvalidDirective {
                        line,
                        reason: "`actions` introduces a list of `- ` items".to_string(),
                    });
                }
                builder.mark(line, "actions")?;
                actions_open = true;
            }
            // single shorthand alternative to a full list
            "action" => {
                flush_pending(&mut pending, &mut builder.actions)?;
                actions_open = false;
                let (name, args) =
                    scan_call(value).map_err(|source| ParseError::Attribute { line, source })?;
                let action = build_action(&name, args)
                    .map_err(|source| ParseError::Action { line, source })?;
                builder.actions.push(action);
            }
            _ => {
                flush_pending(&mut pending, &mut builder.actions)?;
                actions_open = false;
                builder.set_scalar(line, key, strip_quotes(value).to_string())?;
            }
        }
    }

    flush_pending(&mut pending, &mut builder.actions)?;
    builder.finish(begin_line, ordinal)
}

#[derive(Default)]
struct DefinitionBuilder {
    name: Option<String>,
    pattern: Option<String>,
    captures: Vec<String>,
    stream: Option<OutputStream>,
    interval_seconds: Option<u64>,
    condition: Option<String>,
    actions: Vec<ActionSpec>,
    timer_mode_enabled: Option<bool>,
    timer_interval_seconds: Option<u64>,
    array_spec: Option<String>,
    max_triggers: Option<u32>,
    seen: BTreeSet<&'static str>,
}

impl DefinitionBuilder {
    /// Record a key as set, rejecting repeats by canonical name
    fn mark(&mut self, line: usize, key: &'static str) -> Result<(), ParseError> {
        if !self.seen.insert(key) {
            return Err(ParseError::DuplicateKey {
                line,
                key: key.to_string(),
            });
        }
        Ok(())
    }

    fn set_scalar(&mut self, line: usize, key: &str, value: String) -> Result<(), ParseError> {
        match key {
            "name" => {
                self.mark(line, "name")?;
                self.name = Some(value);
            }
            "pattern" => {
                self.mark(line, "pattern")?;
                self.pattern = Some(value);
            }
            "condition" => {
                self.mark(line, "condition")?;
                self.condition = Some(value);
            }
            "captures" => {
                self.mark(line, "captures")?;
                self.captures = split_list(&value);
            }
            "stream" => {
                self.mark(line, "stream")?;
                self.stream = Some(match value.as_str() {
                    "stdout" => OutputStream::Stdout,
                    "stderr" => OutputStream::Stderr,
                    other => {
                        return Err(ParseError::InvalidDirective {
                            line,
                            reason: format!("stream must be stdout or stderr, got `{other}`"),
                        });
                    }
                });
            }
            "interval" | "interval_seconds" => {
                self.mark(line, "interval")?;
                self.interval_seconds = Some(parse_number(line, "interval", &value)?);
            }
            "timer_interval" | "timer_interval_seconds" => {
                self.mark(line, "timer_interval_seconds")?;
                self.timer_interval_seconds =
                    Some(parse_number(line, "timer_interval_seconds", &value)?);
            }
            "timer_mode_enabled" => {
                self.mark(line, "timer_mode_enabled")?;
                self.timer_mode_enabled = Some(parse_bool(line, "timer_mode_enabled", &value)?);
            }
            "max_triggers" => {
                self.mark(line, "max_triggers")?;
                self.max_triggers = Some(parse_number(line, "max_triggers", &value)?);
            }
            "array_spec" => {
                self.mark(line, "array_spec")?;
                self.array_spec = Some(value);
            }
            other => {
                return Err(ParseError::UnknownKey {
                    line,
                    key: other.to_string(),
                });
            }
        }
        Ok(())
    }

    fn finish(self, line: usize, ordinal: usize) -> Result<WatcherDefinition, ParseError> {
        let pattern = self.pattern.ok_or(ParseError::MissingField {
            line,
            field: "pattern",
        })?;
        if self.actions.is_empty() {
            return Err(ParseError::MissingField {
                line,
                field: "actions",
            });
        }
        let definition = WatcherDefinition {
            name: self
                .name
                .unwrap_or_else(|| format!("watcher-{}", ordinal + 1)),
            pattern,
            captures: self.captures,
            stream: self.stream.unwrap_or_default(),
            interval_seconds: self.interval_seconds.unwrap_or(DEFAULT_INTERVAL_SECONDS),
            condition: self.condition,
            actions: self.actions,
            timer_mode_enabled: self.timer_mode_enabled.unwrap_or(false),
            timer_interval_seconds: self.timer_interval_seconds,
            array_spec: self.array_spec.map(ArraySpec::new),
            max_triggers: self.max_triggers,
        };
        definition
            .validate()
            .map_err(|source| ParseError::Definition { line, source })?;
        Ok(definition)
    }
}

fn parse_number<T: std::str::FromStr>(
    line: usize,
    key: &str,
    value: &str,
) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidNumber {
        line,
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(line: usize, key: &str, value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ParseError::InvalidBool {
            line,
            key: key.to_string(),
            value: other.to_string(),
        }),
    }
}

/// Split `[a, b]` or `a, b` into trimmed names
fn split_list(value: &str) -> Vec<String> {
    value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Strip one layer of matching surrounding quotes
fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    let stripped = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')));
    stripped.unwrap_or(value)
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
