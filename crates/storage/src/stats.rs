// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Statistics derived from live instances and the event history

use chrono::{DateTime, TimeDelta, Utc};
use jw_core::{BusyWatcher, WatcherEvent, WatcherInstance, WatcherStats, LIFECYCLE_ACTION};
use std::collections::BTreeMap;

/// Derive the aggregate stats view.
///
/// Lifecycle records count toward per-watcher activity and the hourly
/// total but not toward the per-action tallies.
pub fn derive<'a, I>(
    instances: I,
    events: &[WatcherEvent],
    now: DateTime<Utc>,
    top_n: usize,
) -> WatcherStats
where
    I: IntoIterator<Item = &'a WatcherInstance>,
{
    let mut stats = WatcherStats::default();

    for instance in instances {
        *stats
            .by_state
            .entry(instance.state.name().to_string())
            .or_insert(0) += 1;
    }

    let hour_ago = now - TimeDelta::hours(1);
    let mut per_watcher: BTreeMap<&str, (u64, &str)> = BTreeMap::new();

    for event in events {
        if event.action_type != LIFECYCLE_ACTION {
            stats
                .by_action
                .entry(event.action_type.clone())
                .or_default()
                .record(event.success);
        }
        if event.timestamp >= hour_ago {
            stats.events_last_hour += 1;
        }
        let entry = per_watcher
            .entry(&event.watcher_id)
            .or_insert((0, &event.watcher_name));
        entry.0 += 1;
        entry.1 = &event.watcher_name;
    }

    let mut busiest: Vec<BusyWatcher> = per_watcher
        .into_iter()
        .map(|(id, (count, name))| BusyWatcher {
            watcher_id: id.to_string(),
            watcher_name: name.to_string(),
            events: count,
        })
        .collect();
    busiest.sort_by(|a, b| {
        b.events
            .cmp(&a.events)
            .then_with(|| a.watcher_id.cmp(&b.watcher_id))
    });
    busiest.truncate(top_n);
    stats.busiest = busiest;

    stats
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
