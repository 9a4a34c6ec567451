// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake output reader for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{OutputError, OutputReader};
use async_trait::async_trait;
use jw_core::OutputStream;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Recorded read request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadCall {
    pub job_id: String,
    pub stream: OutputStream,
    pub from_position: u64,
}

/// Fake output reader backed by in-memory buffers.
///
/// Tests append bytes per (job, stream) and may inject a bounded run of
/// transient failures to exercise retry paths.
#[derive(Clone, Default)]
pub struct FakeOutputReader {
    buffers: Arc<Mutex<HashMap<(String, OutputStream), Vec<u8>>>>,
    calls: Arc<Mutex<Vec<ReadCall>>>,
    fail_reads: Arc<Mutex<u32>>,
}

impl FakeOutputReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes to a job's stream, as the running job would
    pub fn append(&self, job_id: &str, stream: OutputStream, bytes: &[u8]) {
        self.buffers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry((job_id.to_string(), stream))
            .or_default()
            .extend_from_slice(bytes);
    }

    /// Make the next `count` reads fail with a transient error
    pub fn fail_next_reads(&self, count: u32) {
        *self.fail_reads.lock().unwrap_or_else(|e| e.into_inner()) = count;
    }

    /// Get all recorded read requests
    pub fn calls(&self) -> Vec<ReadCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl OutputReader for FakeOutputReader {
    async fn read_new_output(
        &self,
        job_id: &str,
        _hostname: &str,
        stream: OutputStream,
        from_position: u64,
    ) -> Result<Vec<u8>, OutputError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ReadCall {
                job_id: job_id.to_string(),
                stream,
                from_position,
            });

        {
            let mut fail = self.fail_reads.lock().unwrap_or_else(|e| e.into_inner());
            if *fail > 0 {
                *fail -= 1;
                return Err(OutputError::Unavailable("injected failure".to_string()));
            }
        }

        let buffers = self.buffers.lock().unwrap_or_else(|e| e.into_inner());
        let buffer = buffers
            .get(&(job_id.to_string(), stream))
            .map(Vec::as_slice)
            .unwrap_or_default();
        let start = (from_position as usize).min(buffer.len());
        Ok(buffer[start..].to_vec())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
