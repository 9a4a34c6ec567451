// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only event history, one JSON record per line

use chrono::{DateTime, Utc};
use jw_core::WatcherEvent;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur in event storage
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable store of watcher events.
///
/// The file is the durable copy, replayed on open; the full history is
/// also kept in memory so queries never touch disk.
pub struct EventStore {
    file: Option<File>,
    events: Vec<WatcherEvent>,
    sequence: u64,
}

impl EventStore {
    /// Open or create an event log at the given path, replaying any
    /// existing records
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;

        let events = Self::replay(path)?;
        let sequence = events.len() as u64;

        Ok(Self {
            file: Some(file),
            events,
            sequence,
        })
    }

    /// Store that keeps history in memory only
    pub fn in_memory() -> Self {
        Self {
            file: None,
            events: Vec::new(),
            sequence: 0,
        }
    }

    /// Append an event, flushing it to disk before returning
    pub fn append(&mut self, event: &WatcherEvent) -> Result<u64, StorageError> {
        self.sequence += 1;
        if let Some(file) = &mut self.file {
            let record = EventRecord {
                seq: self.sequence,
                event: event.clone(),
            };
            let line = serde_json::to_string(&record)?;
            writeln!(file, "{}", line)?;
            file.sync_all()?;
        }
        self.events.push(event.clone());
        Ok(self.sequence)
    }

    /// Get the current sequence number
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// All events in append order
    pub fn all(&self) -> &[WatcherEvent] {
        &self.events
    }

    /// Events for one watcher, in append order
    pub fn for_watcher(&self, watcher_id: &str) -> Vec<WatcherEvent> {
        self.events
            .iter()
            .filter(|e| e.watcher_id == watcher_id)
            .cloned()
            .collect()
    }

    /// Events for one job, in append order
    pub fn for_job(&self, job_id: &str) -> Vec<WatcherEvent> {
        self.events
            .iter()
            .filter(|e| e.job_id == job_id)
            .cloned()
            .collect()
    }

    /// The most recent `limit` events, newest first
    pub fn recent(&self, limit: usize) -> Vec<WatcherEvent> {
        self.events.iter().rev().take(limit).cloned().collect()
    }

    /// Events stamped at or after the cutoff, in append order
    pub fn since(&self, cutoff: DateTime<Utc>) -> Vec<WatcherEvent> {
        self.events
            .iter()
            .filter(|e| e.timestamp >= cutoff)
            .cloned()
            .collect()
    }

    /// Replay all events from a log file
    pub fn replay(path: &Path) -> Result<Vec<WatcherEvent>, StorageError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let reader = BufReader::new(file);
        let mut events = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let record: EventRecord = serde_json::from_str(&line)?;
            events.push(record.event);
        }

        Ok(events)
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct EventRecord {
    seq: u64,
    event: WatcherEvent,
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
