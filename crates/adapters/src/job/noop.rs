// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op job control for hosts without a scheduler

use super::{JobControl, JobError};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Job control that accepts every request and does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpJobControl;

#[async_trait]
impl JobControl for NoOpJobControl {
    async fn get_array_task_ids(&self, _array_job_id: &str) -> Result<Vec<u32>, JobError> {
        Ok(Vec::new())
    }

    async fn cancel_job(&self, _job_id: &str) -> Result<(), JobError> {
        Ok(())
    }

    async fn resubmit_job(
        &self,
        _job_id: &str,
        _modifications: &BTreeMap<String, String>,
        _cancel_original: bool,
    ) -> Result<(), JobError> {
        Ok(())
    }
}
