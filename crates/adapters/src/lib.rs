// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for the engine's external collaborators
//!
//! Each family pairs a trait with a production implementation, a no-op,
//! and an in-memory fake for tests: job output reading, SLURM job
//! control, notification delivery, remote command execution, and metric
//! storage.

pub mod job;
pub mod metric;
pub mod notify;
pub mod output;
pub mod remote;
pub mod traced;

pub use job::{JobControl, JobError, NoOpJobControl, SlurmJobControl};
pub use metric::{LogMetricSink, MetricError, MetricSink, NoOpMetricSink};
pub use notify::{NoOpNotifier, Notifier, NotifyError};
pub use output::{FileOutputReader, NoOpOutputReader, OutputError, OutputReader};
pub use remote::{NoOpRemoteExec, RemoteError, RemoteExec, RemoteOutcome, SshRemoteExec};
pub use traced::{TracedJobControl, TracedOutputReader};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use job::{FakeJobControl, JobCall};
#[cfg(any(test, feature = "test-support"))]
pub use metric::{FakeMetricSink, MetricCall};
#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifier, NotifyCall};
#[cfg(any(test, feature = "test-support"))]
pub use output::{FakeOutputReader, ReadCall};
#[cfg(any(test, feature = "test-support"))]
pub use remote::{FakeRemoteExec, RemoteCall};
