// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake job control for tests

#![cfg_attr(coverage_nightly, coverage(off))]

use super::{JobControl, JobError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// A recorded job-control call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobCall {
    ArrayTaskIds {
        job_id: String,
    },
    Cancel {
        job_id: String,
    },
    Resubmit {
        job_id: String,
        modifications: BTreeMap<String, String>,
        cancel_original: bool,
    },
}

/// In-memory job control that records calls and serves scripted
/// array task ids.
#[derive(Debug, Clone, Default)]
pub struct FakeJobControl {
    task_ids: Arc<Mutex<HashMap<String, Vec<u32>>>>,
    calls: Arc<Mutex<Vec<JobCall>>>,
    fail_with: Arc<Mutex<Option<String>>>,
}

impl FakeJobControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the task ids reported for an array job.
    pub fn set_task_ids(&self, array_job_id: &str, ids: Vec<u32>) {
        self.task_ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(array_job_id.to_string(), ids);
    }

    /// Make every subsequent call fail with the given message.
    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<JobCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, call: JobCall) -> Result<(), JobError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
        match &*self.fail_with.lock().unwrap_or_else(|e| e.into_inner()) {
            Some(message) => Err(JobError::CommandFailed(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl JobControl for FakeJobControl {
    async fn get_array_task_ids(&self, array_job_id: &str) -> Result<Vec<u32>, JobError> {
        self.record(JobCall::ArrayTaskIds {
            job_id: array_job_id.to_string(),
        })?;
        let ids = self
            .task_ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(array_job_id)
            .cloned()
            .unwrap_or_default();
        Ok(ids)
    }

    async fn cancel_job(&self, job_id: &str) -> Result<(), JobError> {
        self.record(JobCall::Cancel {
            job_id: job_id.to_string(),
        })
    }

    async fn resubmit_job(
        &self,
        job_id: &str,
        modifications: &BTreeMap<String, String>,
        cancel_original: bool,
    ) -> Result<(), JobError> {
        self.record(JobCall::Resubmit {
            job_id: job_id.to_string(),
            modifications: modifications.clone(),
            cancel_original,
        })
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
