// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SLURM job control adapters

mod noop;
mod slurm;

pub use noop::NoOpJobControl;
pub use slurm::SlurmJobControl;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeJobControl, JobCall};

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from job-control operations
#[derive(Debug, Error)]
pub enum JobError {
    #[error("unknown job: {0}")]
    UnknownJob(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Adapter for controlling jobs through the cluster scheduler
#[async_trait]
pub trait JobControl: Clone + Send + Sync + 'static {
    /// Task ids currently known for an array job
    async fn get_array_task_ids(&self, array_job_id: &str) -> Result<Vec<u32>, JobError>;

    /// Cancel a running or pending job
    async fn cancel_job(&self, job_id: &str) -> Result<(), JobError>;

    /// Resubmit a job with submission parameters overridden by
    /// `modifications` (e.g. more memory), optionally cancelling the
    /// original first
    async fn resubmit_job(
        &self,
        job_id: &str,
        modifications: &BTreeMap<String, String>,
        cancel_original: bool,
    ) -> Result<(), JobError>;
}
