// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job output reading adapters

mod file;
mod noop;

pub use file::FileOutputReader;
pub use noop::NoOpOutputReader;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeOutputReader, ReadCall};

use async_trait::async_trait;
use jw_core::OutputStream;
use thiserror::Error;

/// Errors from output reads; all are treated as transient by callers
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("output not available: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Adapter for reading a job's captured output incrementally
#[async_trait]
pub trait OutputReader: Clone + Send + Sync + 'static {
    /// Return the bytes of `stream` from `from_position` to the current
    /// end of output. An empty result means nothing new was written.
    async fn read_new_output(
        &self,
        job_id: &str,
        hostname: &str,
        stream: OutputStream,
        from_position: u64,
    ) -> Result<Vec<u8>, OutputError>;
}
