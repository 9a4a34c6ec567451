// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    registered = { Notice::Registered { id: "w-1".into() }, "registered" },
    activated = { Notice::Activated { id: "w-1".into() }, "activated" },
    paused = { Notice::Paused { id: "w-1".into() }, "paused" },
    resumed = { Notice::Resumed { id: "w-1".into() }, "resumed" },
    recovered = { Notice::Recovered { id: "w-1".into() }, "output read recovered" },
)]
fn notices_describe_themselves(notice: Notice, expected: &str) {
    assert_eq!(notice.describe(), expected);
    assert_eq!(notice.watcher_id(), "w-1");
    assert!(!notice.is_failure());
}

#[test]
fn completion_and_failure_notices_carry_their_reason() {
    let completed = Notice::Completed {
        id: "w-2".into(),
        reason: "trigger cap reached".into(),
    };
    assert_eq!(completed.describe(), "completed: trigger cap reached");
    assert!(!completed.is_failure());

    let failed = Notice::Failed {
        id: "w-2".into(),
        reason: "scan position moved backwards".into(),
    };
    assert_eq!(failed.describe(), "failed: scan position moved backwards");
    assert!(failed.is_failure());

    let degraded = Notice::Degraded {
        id: "w-2".into(),
        error: "output not available".into(),
    };
    assert_eq!(degraded.describe(), "degraded: output not available");
    assert!(degraded.is_failure());
}

#[test]
fn child_spawned_names_the_child_and_task() {
    let notice = Notice::ChildSpawned {
        id: "w-3".into(),
        child_id: "w-4".into(),
        task_id: 7,
    };
    assert_eq!(notice.watcher_id(), "w-3");
    assert_eq!(notice.describe(), "spawned child w-4 for task 7");
}

#[test]
fn timer_effects_compare_by_id_and_duration() {
    let set = Effect::SetTimer {
        id: "watch:w-1:check".into(),
        duration: Duration::from_secs(30),
    };
    assert_eq!(
        set,
        Effect::SetTimer {
            id: "watch:w-1:check".into(),
            duration: Duration::from_secs(30),
        }
    );
    assert_ne!(
        set,
        Effect::CancelTimer {
            id: "watch:w-1:check".into(),
        }
    );
}
