// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jw-core: Core library for the jobwatch engine
//!
//! This crate provides:
//! - The watcher definition model parsed from job-script directives
//! - A pure state machine for watcher instances
//! - The sandboxed condition evaluator for trigger guards
//! - Placeholder interpolation for action parameters
//! - Audit records and the wire model served to clients

pub mod clock;
pub mod id;

pub mod condition;
pub mod definition;
pub mod effect;
pub mod event;
pub mod instance;
pub mod template;
pub mod wire;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use condition::{Condition, ConditionError, EvalError};
pub use definition::{ActionSpec, ArraySpec, DefinitionError, OutputStream, WatcherDefinition};
pub use effect::{Effect, Notice};
pub use event::{WatcherEvent, CONDITION_ACTION, LIFECYCLE_ACTION};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use instance::{InstanceEvent, PositionRegression, WatcherId, WatcherInstance, WatcherState};
pub use template::interpolate;
pub use wire::{
    ActionTally, BusyWatcher, Watcher, WatcherEventsResponse, WatcherStats, WatchersResponse,
};
