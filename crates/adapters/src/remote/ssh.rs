// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote execution over ssh

use super::{RemoteError, RemoteExec, RemoteOutcome};
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

/// Runs commands on compute nodes through non-interactive ssh.
///
/// Assumes host-based or key-based auth is already set up, which is
/// the norm inside a cluster.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshRemoteExec;

impl SshRemoteExec {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RemoteExec for SshRemoteExec {
    async fn run_remote_command(
        &self,
        hostname: &str,
        command: &str,
        timeout: Duration,
    ) -> Result<RemoteOutcome, RemoteError> {
        let mut ssh = Command::new("ssh");
        ssh.args(["-o", "BatchMode=yes", "-o", "ConnectTimeout=10"])
            .arg(hostname)
            .arg(command);

        let output = tokio::time::timeout(timeout, ssh.output())
            .await
            .map_err(|_| RemoteError::Timeout(timeout))?
            .map_err(|e| RemoteError::ExecFailed(e.to_string()))?;

        let mut text = String::from_utf8_lossy(&output.stdout)
            .trim_end()
            .to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim_end();
        if !stderr.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(stderr);
        }

        Ok(RemoteOutcome {
            exit_code: output.status.code().unwrap_or(-1),
            output: text,
        })
    }
}
