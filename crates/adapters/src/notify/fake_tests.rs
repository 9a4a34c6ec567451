// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn fake_notifier_records_calls() {
    let notifier = FakeNotifier::new();

    notifier
        .send_notification("#hpc-alerts", "error-watch", "ERROR at step 12")
        .await
        .unwrap();
    notifier
        .send_notification("ops@example.com", "Job 17 failed", "")
        .await
        .unwrap();

    let calls = notifier.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].channel, "#hpc-alerts");
    assert_eq!(calls[0].subject, "error-watch");
    assert_eq!(calls[1].channel, "ops@example.com");
}

#[tokio::test]
async fn injected_failures_surface_as_delivery_errors() {
    let notifier = FakeNotifier::new();
    notifier.fail_with("smtp refused");

    let err = notifier
        .send_notification("ops@example.com", "subject", "body")
        .await
        .unwrap_err();
    assert!(matches!(err, NotifyError::DeliveryFailed(m) if m == "smtp refused"));
    assert_eq!(notifier.calls().len(), 1);
}
