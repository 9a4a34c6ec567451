// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job control through the SLURM command-line tools

use super::{JobControl, JobError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Drives `sbatch`, `scancel`, `scontrol` and `sacct` on the submit host.
#[derive(Clone, Copy, Debug, Default)]
pub struct SlurmJobControl;

impl SlurmJobControl {
    pub fn new() -> Self {
        Self
    }
}

async fn run(program: &str, args: &[&str]) -> Result<String, JobError> {
    let output = Command::new(program).args(args).output().await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(JobError::CommandFailed(format!(
            "{program} {}: {}",
            args.join(" "),
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Extract distinct task ids from `sacct` job id lines such as
/// `123_4` and `123_4.batch`
pub(crate) fn parse_task_ids(array_job_id: &str, sacct_output: &str) -> Vec<u32> {
    let prefix = format!("{array_job_id}_");
    let mut ids: Vec<u32> = sacct_output
        .lines()
        .filter_map(|line| line.trim().strip_prefix(&prefix))
        .filter_map(|rest| {
            let digits = rest.split('.').next().unwrap_or(rest);
            digits.parse().ok()
        })
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[async_trait]
impl JobControl for SlurmJobControl {
    async fn get_array_task_ids(&self, array_job_id: &str) -> Result<Vec<u32>, JobError> {
        // sacct sees completed tasks too, unlike squeue
        let stdout = run(
            "sacct",
            &["-j", array_job_id, "--format=JobID", "-n", "-P"],
        )
        .await?;
        Ok(parse_task_ids(array_job_id, &stdout))
    }

    async fn cancel_job(&self, job_id: &str) -> Result<(), JobError> {
        run("scancel", &[job_id]).await?;
        Ok(())
    }

    async fn resubmit_job(
        &self,
        job_id: &str,
        modifications: &BTreeMap<String, String>,
        cancel_original: bool,
    ) -> Result<(), JobError> {
        let script = run("scontrol", &["write", "batch_script", job_id, "-"]).await?;

        // modification keys map onto sbatch long options, e.g. mem=64G
        let mut command = Command::new("sbatch");
        for (key, value) in modifications {
            command.arg(format!("--{key}={value}"));
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = command.spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(script.as_bytes()).await?;
        }
        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(JobError::CommandFailed(format!(
                "sbatch: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        if cancel_original {
            run("scancel", &[job_id]).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "slurm_tests.rs"]
mod tests;
