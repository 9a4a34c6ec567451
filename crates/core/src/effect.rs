// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects requested by instance state transitions
//!
//! Transitions are pure; they return effects the engine executes:
//! arming/cancelling due-queue timers and emitting lifecycle notices
//! into the audit trail.

use std::time::Duration;

/// Side effects that state transitions request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Arm a due-queue timer
    SetTimer { id: String, duration: Duration },
    /// Cancel a due-queue timer
    CancelTimer { id: String },
    /// Record a lifecycle notice in the audit trail
    Emit(Notice),
}

/// Lifecycle notices recorded in the audit trail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Registered {
        id: String,
    },
    Activated {
        id: String,
    },
    Paused {
        id: String,
    },
    Resumed {
        id: String,
    },
    Completed {
        id: String,
        reason: String,
    },
    Failed {
        id: String,
        reason: String,
    },
    Degraded {
        id: String,
        error: String,
    },
    Recovered {
        id: String,
    },
    ChildSpawned {
        id: String,
        child_id: String,
        task_id: u32,
    },
}

impl Notice {
    /// Watcher the notice belongs to
    pub fn watcher_id(&self) -> &str {
        match self {
            Notice::Registered { id }
            | Notice::Activated { id }
            | Notice::Paused { id }
            | Notice::Resumed { id }
            | Notice::Completed { id, .. }
            | Notice::Failed { id, .. }
            | Notice::Degraded { id, .. }
            | Notice::Recovered { id }
            | Notice::ChildSpawned { id, .. } => id,
        }
    }

    /// Human-readable line stored as the audit record's result
    pub fn describe(&self) -> String {
        match self {
            Notice::Registered { .. } => "registered".to_string(),
            Notice::Activated { .. } => "activated".to_string(),
            Notice::Paused { .. } => "paused".to_string(),
            Notice::Resumed { .. } => "resumed".to_string(),
            Notice::Completed { reason, .. } => format!("completed: {reason}"),
            Notice::Failed { reason, .. } => format!("failed: {reason}"),
            Notice::Degraded { error, .. } => format!("degraded: {error}"),
            Notice::Recovered { .. } => "output read recovered".to_string(),
            Notice::ChildSpawned {
                child_id, task_id, ..
            } => format!("spawned child {child_id} for task {task_id}"),
        }
    }

    /// Whether the notice marks a failure in the audit trail
    pub fn is_failure(&self) -> bool {
        matches!(self, Notice::Failed { .. } | Notice::Degraded { .. })
    }
}

#[cfg(test)]
#[path = "effect_tests.rs"]
mod tests;
