// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Job-script directive parsing
//!
//! Watcher definitions travel inside job scripts as shell comments:
//! a one-line `#WATCHER key="value" ...` attribute form, or a
//! `#WATCHER_BEGIN` / `#WATCHER_END` block of `key: value` lines.
//! Parsing is a pure transform from script text to validated
//! [`jw_core::WatcherDefinition`]s; a bad directive fails the whole
//! parse rather than being silently dropped.

mod actions;
mod parser;
mod scan;

pub use actions::{build_action, ActionError};
pub use parser::{parse_script, ParseError, DEFAULT_INTERVAL_SECONDS};
pub use scan::{scan_attributes, scan_call, scan_map, AttrValue, ScanError};
