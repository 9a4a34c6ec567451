// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake metric sink for tests

#![cfg_attr(coverage_nightly, coverage(off))]

use super::{MetricError, MetricSink};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// A recorded metric sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricCall {
    pub name: String,
    pub value: String,
    pub job_id: String,
}

/// Metric sink that records every sample in memory.
#[derive(Debug, Clone, Default)]
pub struct FakeMetricSink {
    calls: Arc<Mutex<Vec<MetricCall>>>,
    fail_with: Arc<Mutex<Option<String>>>,
}

impl FakeMetricSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent store fail with the given message.
    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<MetricCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl MetricSink for FakeMetricSink {
    async fn store_metric(&self, name: &str, value: &str, job_id: &str) -> Result<(), MetricError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(MetricCall {
                name: name.to_string(),
                value: value.to_string(),
                job_id: job_id.to_string(),
            });
        match &*self.fail_with.lock().unwrap_or_else(|e| e.into_inner()) {
            Some(message) => Err(MetricError::StoreFailed(message.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
