// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake remote exec for tests

#![cfg_attr(coverage_nightly, coverage(off))]

use super::{RemoteError, RemoteExec, RemoteOutcome};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A recorded remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCall {
    pub hostname: String,
    pub command: String,
    pub timeout: Duration,
}

/// Remote exec that serves scripted outcomes in order.
///
/// With nothing scripted, every command succeeds with exit code 0 and
/// empty output.
#[derive(Debug, Clone, Default)]
pub struct FakeRemoteExec {
    outcomes: Arc<Mutex<VecDeque<Result<RemoteOutcome, RemoteError>>>>,
    calls: Arc<Mutex<Vec<RemoteCall>>>,
}

impl FakeRemoteExec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the outcome of the next unscripted command.
    pub fn push_outcome(&self, exit_code: i32, output: &str) {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Ok(RemoteOutcome {
                exit_code,
                output: output.to_string(),
            }));
    }

    /// Script an error for the next unscripted command.
    pub fn push_error(&self, error: RemoteError) {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl RemoteExec for FakeRemoteExec {
    async fn run_remote_command(
        &self,
        hostname: &str,
        command: &str,
        timeout: Duration,
    ) -> Result<RemoteOutcome, RemoteError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RemoteCall {
                hostname: hostname.to_string(),
                command: command.to_string(),
                timeout,
            });
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(Ok(RemoteOutcome {
                exit_code: 0,
                output: String::new(),
            }))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
