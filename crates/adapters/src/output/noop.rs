// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op output reader for when output scanning is disabled.

use super::{OutputError, OutputReader};
use async_trait::async_trait;
use jw_core::OutputStream;

/// Output reader that always returns nothing new.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpOutputReader;

impl NoOpOutputReader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OutputReader for NoOpOutputReader {
    async fn read_new_output(
        &self,
        _job_id: &str,
        _hostname: &str,
        _stream: OutputStream,
        _from_position: u64,
    ) -> Result<Vec<u8>, OutputError> {
        Ok(Vec::new())
    }
}
