// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jw-engine: the watcher engine loop
//!
//! Owns every live watcher instance and drives them from a due queue:
//! incremental output scans, trigger gating, action dispatch, array
//! task discovery, and the audit trail. Adapter work runs on a bounded
//! worker pool so a slow cluster call never stalls the loop.

mod config;
mod cursor;
mod dispatcher;
mod engine;
mod error;
mod pool;
mod scheduler;

pub use config::EngineConfig;
pub use cursor::{scan_window, LineMatch, ScanOutcome};
pub use dispatcher::ActionRunner;
pub use engine::{Engine, EngineDeps};
pub use error::EngineError;
pub use pool::{BatchOutcome, Completion, DiscoveryOutcome, ReadOutcome, WorkerPool};
pub use scheduler::Scheduler;
