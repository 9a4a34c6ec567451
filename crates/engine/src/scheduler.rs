// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Due queue for watcher check and timer-mode ticks
//!
//! Timers are one-shot: a fired timer stays gone until the engine
//! re-arms it after the tick's work completes, so a slow tick slips
//! the next check instead of bunching catch-up ticks. Re-arming an id
//! supersedes its queued entry through a generation bump; superseded
//! heap entries are skipped when they surface.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct QueueEntry {
    due: Instant,
    generation: u64,
    id: String,
}

/// Min-heap of armed timers with liveness tracked per id
pub struct Scheduler {
    queue: BinaryHeap<Reverse<QueueEntry>>,
    live: HashMap<String, u64>,
    generation: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            live: HashMap::new(),
            generation: 0,
        }
    }

    /// Arm (or re-arm) a timer to fire `duration` after `now`
    pub fn set_timer(&mut self, id: String, duration: Duration, now: Instant) {
        self.generation += 1;
        self.live.insert(id.clone(), self.generation);
        self.queue.push(Reverse(QueueEntry {
            due: now + duration,
            generation: self.generation,
            id,
        }));
    }

    /// Disarm a timer; its queued entry is skipped when it surfaces
    pub fn cancel_timer(&mut self, id: &str) {
        self.live.remove(id);
    }

    /// Pop every timer due at `now`, earliest first. Fired timers are
    /// disarmed; the caller re-arms what should keep ticking.
    pub fn fired_timers(&mut self, now: Instant) -> Vec<String> {
        let mut fired = Vec::new();
        while let Some(Reverse(entry)) = self.queue.peek() {
            if entry.due > now {
                break;
            }
            let Some(Reverse(entry)) = self.queue.pop() else {
                break;
            };
            if self.live.get(&entry.id) == Some(&entry.generation) {
                self.live.remove(&entry.id);
                fired.push(entry.id);
            }
        }
        fired
    }

    /// Whether any timer is armed
    pub fn has_timers(&self) -> bool {
        !self.live.is_empty()
    }

    /// Earliest armed due time. Sheds superseded heap entries as a
    /// side effect.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        while let Some(Reverse(entry)) = self.queue.peek() {
            if self.live.get(&entry.id) == Some(&entry.generation) {
                return Some(entry.due);
            }
            self.queue.pop();
        }
        None
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
