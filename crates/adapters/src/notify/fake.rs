// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake notifier for tests

#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Notifier, NotifyError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A recorded notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyCall {
    pub channel: String,
    pub subject: String,
    pub body: String,
}

/// Notifier that records every message in memory.
#[derive(Debug, Clone, Default)]
pub struct FakeNotifier {
    calls: Arc<Mutex<Vec<NotifyCall>>>,
    fail_with: Arc<Mutex<Option<String>>>,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent delivery fail with the given message.
    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.to_string());
    }

    /// Make every subsequent delivery sleep first, to exercise deadlines.
    pub fn delay_responses(&self, delay: Duration) {
        *self.delay.lock().unwrap_or_else(|e| e.into_inner()) = Some(delay);
    }

    pub fn calls(&self) -> Vec<NotifyCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn send_notification(
        &self,
        channel: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        let delay = *self.delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(NotifyCall {
                channel: channel.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
        match &*self.fail_with.lock().unwrap_or_else(|e| e.into_inner()) {
            Some(message) => Err(NotifyError::DeliveryFailed(message.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
