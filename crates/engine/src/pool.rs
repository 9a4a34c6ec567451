// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded worker pool for adapter calls
//!
//! The engine loop owns all watcher state and never blocks on the
//! cluster. Output reads, array discovery, and action batches run on
//! spawned tasks gated by a semaphore; each task reports back through
//! a completion channel that the loop drains between timer ticks.

use jw_core::WatcherEvent;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Semaphore;

/// Result of one output read
#[derive(Debug)]
pub struct ReadOutcome {
    pub watcher_id: String,
    pub from_position: u64,
    pub result: Result<Vec<u8>, String>,
}

/// Result of one array task discovery poll
#[derive(Debug)]
pub struct DiscoveryOutcome {
    pub watcher_id: String,
    pub result: Result<Vec<u32>, String>,
}

/// Audit records from one finished action batch
#[derive(Debug)]
pub struct BatchOutcome {
    pub watcher_id: String,
    pub events: Vec<WatcherEvent>,
}

/// A finished worker task, routed back to the engine loop
#[derive(Debug)]
pub enum Completion {
    Read(ReadOutcome),
    Discovery(DiscoveryOutcome),
    Batch(BatchOutcome),
}

#[derive(Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    completions: UnboundedSender<Completion>,
}

impl WorkerPool {
    pub fn new(concurrency: usize) -> (Self, UnboundedReceiver<Completion>) {
        let (completions, rx) = mpsc::unbounded_channel();
        let pool = Self {
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            completions,
        };
        (pool, rx)
    }

    /// Run a task once a permit frees up; its completion is dropped if
    /// the receiver side shut down first.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            // the semaphore is never closed
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            let completion = task.await;
            let _ = completions.send(completion);
        });
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
