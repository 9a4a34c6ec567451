// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification delivery adapters

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifier, NotifyCall};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from notification delivery
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),
}

/// Adapter for delivering notifications to people.
///
/// `channel` is an email address for mail-style delivery or a channel
/// name for chat-style delivery; the adapter decides what to do with
/// the subject line.
#[async_trait]
pub trait Notifier: Clone + Send + Sync + 'static {
    async fn send_notification(
        &self,
        channel: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError>;
}

/// Notifier that silently drops every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn send_notification(
        &self,
        _channel: &str,
        _subject: &str,
        _body: &str,
    ) -> Result<(), NotifyError> {
        Ok(())
    }
}
