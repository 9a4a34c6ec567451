// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Field-exact JSON shapes served to the web and iOS clients

use crate::definition::{ActionSpec, ArraySpec};
use crate::event::WatcherEvent;
use crate::instance::{WatcherInstance, WatcherState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Client view of one watcher instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watcher {
    pub id: String,
    pub job_id: String,
    pub hostname: String,
    pub name: String,
    pub pattern: String,
    pub interval_seconds: u64,
    pub captures: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub actions: Vec<ActionSpec>,
    pub state: WatcherState,
    pub trigger_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_position: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub timer_mode_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_interval_seconds: Option<u64>,
    #[serde(default)]
    pub timer_mode_active: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
    #[serde(default)]
    pub is_array_template: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_spec: Option<ArraySpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_watcher_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovered_task_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_task_count: Option<u32>,
}

impl From<&WatcherInstance> for Watcher {
    fn from(instance: &WatcherInstance) -> Self {
        let definition = &instance.definition;
        Self {
            id: instance.id.0.clone(),
            job_id: instance.job_id.clone(),
            hostname: instance.hostname.clone(),
            name: definition.name.clone(),
            pattern: definition.pattern.clone(),
            interval_seconds: definition.interval_seconds,
            captures: definition.captures.clone(),
            condition: definition.condition.clone(),
            actions: definition.actions.clone(),
            state: instance.state,
            trigger_count: instance.trigger_count,
            last_check: instance.last_check,
            last_position: instance.last_position,
            created_at: instance.created_at,
            timer_mode_enabled: definition.timer_mode_enabled,
            timer_interval_seconds: definition.timer_interval_seconds,
            timer_mode_active: instance.timer_mode_active,
            variables: instance.variables.clone(),
            is_array_template: instance.is_template(),
            array_spec: definition.array_spec.clone(),
            parent_watcher_id: instance.parent_watcher_id.clone(),
            discovered_task_count: instance.discovered_task_count,
            expected_task_count: instance.expected_task_count,
        }
    }
}

/// Watchers attached to one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchersResponse {
    pub job_id: String,
    pub watchers: Vec<Watcher>,
    pub count: usize,
}

impl WatchersResponse {
    pub fn new(job_id: impl Into<String>, watchers: Vec<Watcher>) -> Self {
        Self {
            job_id: job_id.into(),
            count: watchers.len(),
            watchers,
        }
    }
}

/// A page of audit records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherEventsResponse {
    pub events: Vec<WatcherEvent>,
    pub count: usize,
}

impl WatcherEventsResponse {
    pub fn new(events: Vec<WatcherEvent>) -> Self {
        Self {
            count: events.len(),
            events,
        }
    }
}

/// Success and failure totals for one action type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTally {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl ActionTally {
    pub fn record(&mut self, success: bool) {
        self.total += 1;
        if success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// One entry in the busiest-watchers ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyWatcher {
    pub watcher_id: String,
    pub watcher_name: String,
    pub events: u64,
}

/// Aggregate view across all instances and their audit records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherStats {
    /// Instance counts keyed by state name
    pub by_state: BTreeMap<String, u64>,
    /// Event totals keyed by action type
    pub by_action: BTreeMap<String, ActionTally>,
    pub events_last_hour: u64,
    /// Watchers with the most audit records, busiest first
    pub busiest: Vec<BusyWatcher>,
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
