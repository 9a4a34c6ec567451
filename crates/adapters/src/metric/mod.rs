// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metric storage adapters

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeMetricSink, MetricCall};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from metric storage
#[derive(Debug, Error)]
pub enum MetricError {
    #[error("store failed: {0}")]
    StoreFailed(String),
}

/// Adapter for recording named metric samples against a job.
///
/// Values arrive as text because they come from captured log output;
/// sinks parse them if they need numbers.
#[async_trait]
pub trait MetricSink: Clone + Send + Sync + 'static {
    async fn store_metric(&self, name: &str, value: &str, job_id: &str)
        -> Result<(), MetricError>;
}

/// Metric sink that discards every sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetricSink;

#[async_trait]
impl MetricSink for NoOpMetricSink {
    async fn store_metric(
        &self,
        _name: &str,
        _value: &str,
        _job_id: &str,
    ) -> Result<(), MetricError> {
        Ok(())
    }
}

/// Metric sink that writes samples to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMetricSink;

#[async_trait]
impl MetricSink for LogMetricSink {
    async fn store_metric(&self, name: &str, value: &str, job_id: &str) -> Result<(), MetricError> {
        tracing::info!(metric = name, value, job_id, "metric sample");
        Ok(())
    }
}
