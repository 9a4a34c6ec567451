// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine tuning knobs

use std::time::Duration;

/// Timings and limits for the engine loop
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Background tasks (reads, discovery, action batches) running at once
    pub worker_concurrency: usize,
    /// Deadline applied to each dispatched action
    pub action_timeout: Duration,
    /// Output read attempts per check before the watcher degrades
    pub read_retry_limit: u32,
    /// Delay before the first read retry; doubles per attempt
    pub read_retry_backoff: Duration,
    /// Entries kept in the busiest-watchers ranking
    pub stats_top_n: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_concurrency: 16,
            action_timeout: Duration::from_secs(60),
            read_retry_limit: 3,
            read_retry_backoff: Duration::from_millis(500),
            stats_top_n: 5,
        }
    }
}

impl EngineConfig {
    /// Tight timings for deterministic tests
    pub fn for_testing() -> Self {
        Self {
            worker_concurrency: 2,
            action_timeout: Duration::from_millis(250),
            read_retry_limit: 2,
            read_retry_backoff: Duration::from_millis(1),
            stats_top_n: 3,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
