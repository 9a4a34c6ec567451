// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit records for executed actions and lifecycle changes

use crate::effect::Notice;
use crate::instance::WatcherInstance;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Action type recorded on lifecycle audit entries
pub const LIFECYCLE_ACTION: &str = "lifecycle";

/// Action type recorded when a trigger condition fails to evaluate
pub const CONDITION_ACTION: &str = "condition";

/// One audit record: a single action executed for a trigger, or a
/// lifecycle change such as activation or completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherEvent {
    pub id: String,
    pub watcher_id: String,
    pub watcher_name: String,
    pub job_id: String,
    pub hostname: String,
    pub timestamp: DateTime<Utc>,
    pub matched_text: String,
    pub captured_vars: BTreeMap<String, String>,
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_result: Option<String>,
    pub success: bool,
}

impl WatcherEvent {
    /// Record for one executed action, successful until marked otherwise
    pub fn action(
        id: impl Into<String>,
        instance: &WatcherInstance,
        timestamp: DateTime<Utc>,
        matched_text: impl Into<String>,
        captured_vars: BTreeMap<String, String>,
        action_type: &str,
    ) -> Self {
        Self {
            id: id.into(),
            watcher_id: instance.id.0.clone(),
            watcher_name: instance.definition.name.clone(),
            job_id: instance.job_id.clone(),
            hostname: instance.hostname.clone(),
            timestamp,
            matched_text: matched_text.into(),
            captured_vars,
            action_type: action_type.to_string(),
            action_result: None,
            success: true,
        }
    }

    /// Attach the action's output
    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.action_result = Some(result.into());
        self
    }

    /// Mark the action failed, keeping the error as its result
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.action_result = Some(error.into());
        self
    }

    /// Record for a lifecycle notice; failures and degradations audit as
    /// unsuccessful entries
    pub fn lifecycle(
        id: impl Into<String>,
        instance: &WatcherInstance,
        timestamp: DateTime<Utc>,
        notice: &Notice,
    ) -> Self {
        Self {
            id: id.into(),
            watcher_id: instance.id.0.clone(),
            watcher_name: instance.definition.name.clone(),
            job_id: instance.job_id.clone(),
            hostname: instance.hostname.clone(),
            timestamp,
            matched_text: String::new(),
            captured_vars: BTreeMap::new(),
            action_type: LIFECYCLE_ACTION.to_string(),
            action_result: Some(notice.describe()),
            success: !notice.is_failure(),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
