// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::job::{JobControl, JobError};
use crate::output::{OutputError, OutputReader};
use async_trait::async_trait;
use jw_core::definition::OutputStream;
use std::collections::BTreeMap;
use tracing::Instrument;

/// Wrapper that adds tracing to any OutputReader
#[derive(Clone)]
pub struct TracedOutputReader<O> {
    inner: O,
}

impl<O> TracedOutputReader<O> {
    pub fn new(inner: O) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<O: OutputReader> OutputReader for TracedOutputReader<O> {
    async fn read_new_output(
        &self,
        job_id: &str,
        hostname: &str,
        stream: OutputStream,
        from_position: u64,
    ) -> Result<Vec<u8>, OutputError> {
        let span =
            tracing::debug_span!("output.read", job_id, hostname, stream = ?stream, from_position);
        // spans attach via `instrument`; an enter guard cannot cross an await
        async move {
            let start = std::time::Instant::now();
            let result = self
                .inner
                .read_new_output(job_id, hostname, stream, from_position)
                .await;
            let elapsed = start.elapsed();

            match &result {
                Ok(bytes) => tracing::debug!(
                    bytes = bytes.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "read"
                ),
                // reads fail routinely before the job starts writing
                Err(e) => tracing::warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "read failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any JobControl
#[derive(Clone)]
pub struct TracedJobControl<J> {
    inner: J,
}

impl<J> TracedJobControl<J> {
    pub fn new(inner: J) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<J: JobControl> JobControl for TracedJobControl<J> {
    async fn get_array_task_ids(&self, array_job_id: &str) -> Result<Vec<u32>, JobError> {
        let result = self.inner.get_array_task_ids(array_job_id).await;
        tracing::debug!(
            array_job_id,
            tasks = result.as_ref().map(|v| v.len()).ok(),
            "listed array tasks"
        );
        result
    }

    async fn cancel_job(&self, job_id: &str) -> Result<(), JobError> {
        let span = tracing::info_span!("job.cancel", job_id);
        async move {
            tracing::info!("cancelling");

            let start = std::time::Instant::now();
            let result = self.inner.cancel_job(job_id).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(()) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "cancelled"),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "cancel failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn resubmit_job(
        &self,
        job_id: &str,
        modifications: &BTreeMap<String, String>,
        cancel_original: bool,
    ) -> Result<(), JobError> {
        let span = tracing::info_span!("job.resubmit", job_id, cancel_original);
        async move {
            tracing::info!(modifications = modifications.len(), "resubmitting");

            let start = std::time::Instant::now();
            let result = self
                .inner
                .resubmit_job(job_id, modifications, cancel_original)
                .await;
            let elapsed = start.elapsed();

            match &result {
                Ok(()) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "resubmitted"),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "resubmit failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
