// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote command execution adapters

mod ssh;

pub use ssh::SshRemoteExec;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeRemoteExec, RemoteCall};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors from remote command execution
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("command timed out after {0:?}")]
    Timeout(Duration),
    #[error("exec failed: {0}")]
    ExecFailed(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result of a remote command that ran to completion.
///
/// A non-zero exit code is not an error at this layer; callers decide
/// what an exit code means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOutcome {
    pub exit_code: i32,
    pub output: String,
}

/// Adapter for running a shell command on a job's compute node
#[async_trait]
pub trait RemoteExec: Clone + Send + Sync + 'static {
    async fn run_remote_command(
        &self,
        hostname: &str,
        command: &str,
        timeout: Duration,
    ) -> Result<RemoteOutcome, RemoteError>;
}

/// Remote exec that runs nothing and reports success.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpRemoteExec;

#[async_trait]
impl RemoteExec for NoOpRemoteExec {
    async fn run_remote_command(
        &self,
        _hostname: &str,
        _command: &str,
        _timeout: Duration,
    ) -> Result<RemoteOutcome, RemoteError> {
        Ok(RemoteOutcome {
            exit_code: 0,
            output: String::new(),
        })
    }
}
