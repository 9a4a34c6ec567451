// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watcher instance state machine
//!
//! An instance is the live execution of a definition against one job
//! (or one array task). The engine's tick loop is the sole writer of
//! instance state; transitions are pure and return the timer and audit
//! effects for the engine to execute.
//!
//! States: PENDING -> ACTIVE <-> PAUSED -> COMPLETED | FAILED, with
//! STATIC as a creation-only state for watchers attached to already
//! finished jobs (manual one-shot evaluation, never auto-ticked).

use crate::clock::Clock;
use crate::definition::WatcherDefinition;
use crate::effect::{Effect, Notice};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Unique identifier for a watcher instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WatcherId(pub String);

impl WatcherId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for WatcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WatcherId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WatcherId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle state of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatcherState {
    Pending,
    Active,
    Paused,
    Static,
    Completed,
    Failed,
}

impl WatcherState {
    pub fn name(&self) -> &'static str {
        match self {
            WatcherState::Pending => "pending",
            WatcherState::Active => "active",
            WatcherState::Paused => "paused",
            WatcherState::Static => "static",
            WatcherState::Completed => "completed",
            WatcherState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WatcherState::Completed | WatcherState::Failed)
    }

    /// Whether the due queue may hold ticks for this state
    pub fn is_schedulable(&self) -> bool {
        matches!(self, WatcherState::Pending | WatcherState::Active)
    }
}

impl fmt::Display for WatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Attempted backward move of the scan position; a fatal engine error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("scan position moved backwards: {attempted} < {current}")]
pub struct PositionRegression {
    pub current: u64,
    pub attempted: u64,
}

/// Events that can transition an instance's state
#[derive(Debug, Clone)]
pub enum InstanceEvent {
    /// First due tick after registration
    FirstCheck,
    /// Manual suspend
    Pause,
    /// Manual resume, re-entering the queue due now
    Resume,
    /// Owning job reached a terminal state
    JobFinished,
    /// Per-definition trigger cap reached
    TriggerCapReached,
    /// Manual soft delete
    Delete,
    /// Unrecoverable definition or runtime error
    Fault { reason: String },
    /// One-shot static evaluation finished
    StaticEvaluated,
}

/// The live, engine-owned execution of a watcher definition
#[derive(Debug, Clone)]
pub struct WatcherInstance {
    pub id: WatcherId,
    pub job_id: String,
    pub hostname: String,
    pub definition: WatcherDefinition,
    pub state: WatcherState,
    /// Byte offset already scanned; monotonically non-decreasing
    pub last_position: u64,
    pub last_check: Option<DateTime<Utc>>,
    pub trigger_count: u32,
    /// Latest capture snapshot, reused by timer-mode ticks
    pub variables: BTreeMap<String, String>,
    pub parent_watcher_id: Option<String>,
    pub discovered_task_count: Option<u32>,
    pub expected_task_count: Option<u32>,
    pub timer_mode_active: bool,
    /// Transient output reads kept failing past the retry bound
    pub degraded: bool,
    pub created_at: DateTime<Utc>,
}

impl WatcherInstance {
    /// Create a pending instance for a starting job
    pub fn new(
        id: WatcherId,
        job_id: impl Into<String>,
        hostname: impl Into<String>,
        definition: WatcherDefinition,
        clock: &impl Clock,
    ) -> Self {
        let timer_mode_active =
            definition.timer_mode_enabled && definition.timer_interval_seconds.is_some();
        let is_template = definition.is_array_template();
        let expected_task_count = definition.expected_task_count();
        Self {
            id,
            job_id: job_id.into(),
            hostname: hostname.into(),
            definition,
            state: WatcherState::Pending,
            last_position: 0,
            last_check: None,
            trigger_count: 0,
            variables: BTreeMap::new(),
            parent_watcher_id: None,
            discovered_task_count: if is_template { Some(0) } else { None },
            expected_task_count: if is_template { expected_task_count } else { None },
            timer_mode_active,
            degraded: false,
            created_at: clock.now_utc(),
        }
    }

    /// Create a static instance attached to an already-finished job
    pub fn new_static(
        id: WatcherId,
        job_id: impl Into<String>,
        hostname: impl Into<String>,
        definition: WatcherDefinition,
        clock: &impl Clock,
    ) -> Self {
        Self {
            state: WatcherState::Static,
            ..Self::new(id, job_id, hostname, definition, clock)
        }
    }

    /// Create an active child instance for a discovered array task
    pub fn new_child(
        id: WatcherId,
        parent: &WatcherInstance,
        task_id: u32,
        clock: &impl Clock,
    ) -> Self {
        let child_definition = parent.definition.child_for_task(task_id);
        // SLURM names a task's job "<array_job_id>_<task_id>"
        let job_id = format!("{}_{}", parent.job_id, task_id);
        Self {
            state: WatcherState::Active,
            parent_watcher_id: Some(parent.id.0.clone()),
            ..Self::new(id, job_id, parent.hostname.clone(), child_definition, clock)
        }
    }

    /// Timer ID for the poll cadence
    pub fn check_timer_id(&self) -> String {
        format!("watch:{}:check", self.id)
    }

    /// Timer ID for timer-mode ticks
    pub fn timer_tick_id(&self) -> String {
        format!("watch:{}:timer", self.id)
    }

    pub fn is_template(&self) -> bool {
        self.definition.is_array_template()
    }

    /// Pure state transition returning the new state and effects
    pub fn transition(&self, event: InstanceEvent, _clock: &impl Clock) -> (Self, Vec<Effect>) {
        match (&self.state, event) {
            (WatcherState::Pending, InstanceEvent::FirstCheck) => {
                let next = WatcherInstance {
                    state: WatcherState::Active,
                    ..self.clone()
                };
                let effects = vec![Effect::Emit(Notice::Activated {
                    id: self.id.0.clone(),
                })];
                (next, effects)
            }

            (WatcherState::Active, InstanceEvent::Pause) => {
                let next = WatcherInstance {
                    state: WatcherState::Paused,
                    ..self.clone()
                };
                let mut effects = vec![Effect::CancelTimer {
                    id: self.check_timer_id(),
                }];
                if self.timer_mode_active {
                    effects.push(Effect::CancelTimer {
                        id: self.timer_tick_id(),
                    });
                }
                effects.push(Effect::Emit(Notice::Paused {
                    id: self.id.0.clone(),
                }));
                (next, effects)
            }

            (WatcherState::Paused, InstanceEvent::Resume) => {
                let next = WatcherInstance {
                    state: WatcherState::Active,
                    ..self.clone()
                };
                // Poll re-enters due now; timer mode resumes at full cadence
                let mut effects = vec![Effect::SetTimer {
                    id: self.check_timer_id(),
                    duration: Duration::ZERO,
                }];
                if self.timer_mode_active {
                    if let Some(interval) = self.definition.timer_interval() {
                        effects.push(Effect::SetTimer {
                            id: self.timer_tick_id(),
                            duration: interval,
                        });
                    }
                }
                effects.push(Effect::Emit(Notice::Resumed {
                    id: self.id.0.clone(),
                }));
                (next, effects)
            }

            (
                WatcherState::Pending | WatcherState::Active | WatcherState::Paused,
                InstanceEvent::JobFinished,
            ) => self.retire("job finished"),

            (WatcherState::Active, InstanceEvent::TriggerCapReached) => {
                self.retire("trigger cap reached")
            }

            (
                WatcherState::Pending
                | WatcherState::Active
                | WatcherState::Paused
                | WatcherState::Static,
                InstanceEvent::Delete,
            ) => self.retire("deleted"),

            (state, InstanceEvent::Fault { reason }) if !state.is_terminal() => {
                let next = WatcherInstance {
                    state: WatcherState::Failed,
                    ..self.clone()
                };
                let mut effects = self.cancel_timer_effects();
                effects.push(Effect::Emit(Notice::Failed {
                    id: self.id.0.clone(),
                    reason,
                }));
                (next, effects)
            }

            (WatcherState::Static, InstanceEvent::StaticEvaluated) => {
                let next = WatcherInstance {
                    state: WatcherState::Completed,
                    ..self.clone()
                };
                let effects = vec![Effect::Emit(Notice::Completed {
                    id: self.id.0.clone(),
                    reason: "static evaluation complete".to_string(),
                })];
                (next, effects)
            }

            // Invalid transitions are no-ops
            _ => (self.clone(), vec![]),
        }
    }

    fn retire(&self, reason: &str) -> (Self, Vec<Effect>) {
        let next = WatcherInstance {
            state: WatcherState::Completed,
            ..self.clone()
        };
        let mut effects = self.cancel_timer_effects();
        effects.push(Effect::Emit(Notice::Completed {
            id: self.id.0.clone(),
            reason: reason.to_string(),
        }));
        (next, effects)
    }

    fn cancel_timer_effects(&self) -> Vec<Effect> {
        let mut effects = vec![Effect::CancelTimer {
            id: self.check_timer_id(),
        }];
        if self.timer_mode_active {
            effects.push(Effect::CancelTimer {
                id: self.timer_tick_id(),
            });
        }
        effects
    }

    /// Advance the scan cursor; a backward move is fatal
    pub fn advance_position(&mut self, new_position: u64) -> Result<(), PositionRegression> {
        if new_position < self.last_position {
            return Err(PositionRegression {
                current: self.last_position,
                attempted: new_position,
            });
        }
        self.last_position = new_position;
        Ok(())
    }

    pub fn note_check(&mut self, now: DateTime<Utc>) {
        self.last_check = Some(now);
    }

    /// Count a trigger and keep its snapshot as the latest variables.
    /// Returns true when this trigger hit the definition's cap.
    pub fn record_trigger(&mut self, vars: &BTreeMap<String, String>) -> bool {
        self.trigger_count += 1;
        self.variables = vars.clone();
        self.definition
            .max_triggers
            .is_some_and(|cap| self.trigger_count >= cap)
    }

    /// Flip the degraded flag; returns true when the value changed
    pub fn set_degraded(&mut self, degraded: bool) -> bool {
        let changed = self.degraded != degraded;
        self.degraded = degraded;
        changed
    }

    /// Count one newly discovered array task (templates only)
    pub fn record_discovered(&mut self) {
        if let Some(count) = self.discovered_task_count.as_mut() {
            *count += 1;
        }
    }

    /// Whether discovery has reached the declared array size
    pub fn discovery_complete(&self) -> bool {
        match (self.discovered_task_count, self.expected_task_count) {
            (Some(discovered), Some(expected)) => discovered >= expected,
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
