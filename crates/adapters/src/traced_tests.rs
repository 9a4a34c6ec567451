// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn new() -> Self {
        Self::default()
    }

    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::new();
    let logs_clone = logs.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs_clone)
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

// =============================================================================
// Tracing output verification tests
// =============================================================================

#[test]
fn traced_read_logs_bytes_and_timing() {
    let (logs, result) = with_tracing(|| async {
        let fake = crate::output::FakeOutputReader::new();
        fake.append("4242", OutputStream::Stdout, b"step 1 done\n");
        let traced = TracedOutputReader::new(fake);

        traced
            .read_new_output("4242", "node042", OutputStream::Stdout, 0)
            .await
    });

    assert!(result.is_ok(), "read should succeed: {:?}", result);

    assert!(
        logs.contains("output.read"),
        "Should log span name. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("4242"),
        "Should log job id. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("elapsed_ms"),
        "Should log timing. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_read_logs_failures_as_warnings() {
    let (logs, result) = with_tracing(|| async {
        let fake = crate::output::FakeOutputReader::new();
        fake.fail_next_reads(1);
        let traced = TracedOutputReader::new(fake);

        traced
            .read_new_output("4242", "node042", OutputStream::Stdout, 0)
            .await
    });

    assert!(result.is_err());
    assert!(
        logs.contains("read failed"),
        "Should log the failure. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_cancel_logs_entry_and_completion() {
    let (logs, result) = with_tracing(|| async {
        let fake = crate::job::FakeJobControl::new();
        let traced = TracedJobControl::new(fake);

        traced.cancel_job("4242").await
    });

    assert!(result.is_ok());
    assert!(
        logs.contains("job.cancel"),
        "Should log span name. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("cancelling"),
        "Should log entry message. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("cancelled"),
        "Should log completion. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_resubmit_logs_failures() {
    let (logs, result) = with_tracing(|| async {
        let fake = crate::job::FakeJobControl::new();
        fake.fail_with("scheduler unreachable");
        let traced = TracedJobControl::new(fake);

        traced
            .resubmit_job("4242", &BTreeMap::new(), false)
            .await
    });

    assert!(result.is_err());
    assert!(
        logs.contains("resubmit failed"),
        "Should log the failure. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("scheduler unreachable"),
        "Should log the error detail. Logs:\n{}",
        logs
    );
}

// =============================================================================
// Delegation tests - verify traced wrapper delegates to inner adapter
// =============================================================================

#[tokio::test]
async fn traced_reader_delegates_to_inner() {
    let fake = crate::output::FakeOutputReader::new();
    fake.append("4242", OutputStream::Stderr, b"oops\n");
    let traced = TracedOutputReader::new(fake.clone());

    let bytes = traced
        .read_new_output("4242", "node042", OutputStream::Stderr, 0)
        .await
        .unwrap();
    assert_eq!(bytes, b"oops\n");

    let calls = fake.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].job_id, "4242");
    assert_eq!(calls[0].from_position, 0);
}

#[tokio::test]
async fn traced_job_control_delegates_to_inner() {
    let fake = crate::job::FakeJobControl::new();
    fake.set_task_ids("4242", vec![0, 1]);
    let traced = TracedJobControl::new(fake.clone());

    let ids = traced.get_array_task_ids("4242").await.unwrap();
    assert_eq!(ids, vec![0, 1]);

    traced.cancel_job("4242").await.unwrap();

    let calls = fake.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[1],
        crate::job::JobCall::Cancel {
            job_id: "4242".to_string()
        }
    );
}
