// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output reader for SLURM output files on a shared filesystem

use super::{OutputError, OutputReader};
use async_trait::async_trait;
use jw_core::OutputStream;
use std::io::SeekFrom;
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Reads `slurm-<job_id>.out` / `.err` style files below a base
/// directory. The hostname is ignored; the filesystem is shared.
#[derive(Debug, Clone)]
pub struct FileOutputReader {
    base_dir: PathBuf,
    /// Filename patterns with SLURM's `%j` job-id placeholder
    stdout_pattern: String,
    stderr_pattern: String,
}

impl FileOutputReader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            stdout_pattern: "slurm-%j.out".to_string(),
            stderr_pattern: "slurm-%j.err".to_string(),
        }
    }

    /// Override the default filename patterns
    pub fn with_patterns(
        mut self,
        stdout_pattern: impl Into<String>,
        stderr_pattern: impl Into<String>,
    ) -> Self {
        self.stdout_pattern = stdout_pattern.into();
        self.stderr_pattern = stderr_pattern.into();
        self
    }

    fn path_for(&self, job_id: &str, stream: OutputStream) -> PathBuf {
        let pattern = match stream {
            OutputStream::Stdout => &self.stdout_pattern,
            OutputStream::Stderr => &self.stderr_pattern,
        };
        self.base_dir.join(pattern.replace("%j", job_id))
    }
}

#[async_trait]
impl OutputReader for FileOutputReader {
    async fn read_new_output(
        &self,
        job_id: &str,
        _hostname: &str,
        stream: OutputStream,
        from_position: u64,
    ) -> Result<Vec<u8>, OutputError> {
        let path = self.path_for(job_id, stream);
        let mut file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // the job may not have started writing yet
                return Err(OutputError::Unavailable(format!(
                    "{} does not exist",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let len = file.metadata().await?.len();
        if from_position >= len {
            return Ok(Vec::new());
        }
        file.seek(SeekFrom::Start(from_position)).await?;
        let mut buf = Vec::with_capacity((len - from_position) as usize);
        file.read_to_end(&mut buf).await?;
        Ok(buf)
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
