// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Action batch execution against the cluster adapters
//!
//! One trigger dispatches one batch: the definition's actions in
//! order, each gated by its own optional condition, with `${var}`
//! placeholders resolved against the trigger's frozen capture
//! snapshot. A failed action is recorded and the batch continues.

use crate::config::EngineConfig;
use chrono::{DateTime, Utc};
use jw_adapters::{JobControl, MetricSink, Notifier, RemoteExec};
use jw_core::{ActionSpec, Condition, IdGen, WatcherEvent, WatcherInstance};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

enum Gate {
    Run,
    Skip,
    Error(String),
}

/// Runs a trigger's ordered action list
#[derive(Clone)]
pub struct ActionRunner<J, N, R, M, I> {
    jobs: J,
    notify: N,
    remote: R,
    metrics: M,
    id_gen: I,
    action_timeout: Duration,
}

impl<J, N, R, M, I> ActionRunner<J, N, R, M, I>
where
    J: JobControl,
    N: Notifier,
    R: RemoteExec,
    M: MetricSink,
    I: IdGen,
{
    pub fn new(jobs: J, notify: N, remote: R, metrics: M, id_gen: I, config: &EngineConfig) -> Self {
        Self {
            jobs,
            notify,
            remote,
            metrics,
            id_gen,
            action_timeout: config.action_timeout,
        }
    }

    /// Execute every action for one trigger, returning audit records
    /// in action order. Timer-mode ticks pass the latest variable
    /// snapshot and an empty matched line.
    pub async fn run_batch(
        &self,
        instance: &WatcherInstance,
        matched_text: &str,
        vars: &BTreeMap<String, String>,
        now: DateTime<Utc>,
    ) -> Vec<WatcherEvent> {
        let mut events = Vec::with_capacity(instance.definition.actions.len());
        for action in &instance.definition.actions {
            let event = WatcherEvent::action(
                self.id_gen.next(),
                instance,
                now,
                matched_text,
                vars.clone(),
                action.action_type(),
            );
            let event = match gate(action, vars) {
                Gate::Run => self.dispatch(action.resolved(vars), instance, event).await,
                Gate::Skip => event.with_result("skipped: condition not met"),
                Gate::Error(message) => event.failed(message),
            };
            if event.success {
                tracing::debug!(
                    watcher_id = %event.watcher_id,
                    action = %event.action_type,
                    "action done"
                );
            } else {
                tracing::warn!(
                    watcher_id = %event.watcher_id,
                    action = %event.action_type,
                    result = event.action_result.as_deref().unwrap_or(""),
                    "action failed"
                );
            }
            events.push(event);
        }
        events
    }

    async fn dispatch(
        &self,
        action: ActionSpec,
        instance: &WatcherInstance,
        event: WatcherEvent,
    ) -> WatcherEvent {
        match action {
            ActionSpec::LogEvent { message, .. } => match message {
                Some(message) => event.with_result(message),
                None => event,
            },
            ActionSpec::StoreMetric { name, value, .. } => {
                match self
                    .bounded(self.metrics.store_metric(&name, &value, &instance.job_id))
                    .await
                {
                    Ok(Ok(())) => event.with_result(format!("{name}={value}")),
                    Ok(Err(e)) => event.failed(e.to_string()),
                    Err(timed_out) => event.failed(timed_out),
                }
            }
            ActionSpec::NotifyEmail {
                to, subject, body, ..
            } => {
                let body = body.as_deref().unwrap_or("");
                match self
                    .bounded(self.notify.send_notification(&to, &subject, body))
                    .await
                {
                    Ok(Ok(())) => event.with_result(format!("emailed {to}")),
                    Ok(Err(e)) => event.failed(e.to_string()),
                    Err(timed_out) => event.failed(timed_out),
                }
            }
            ActionSpec::NotifySlack {
                channel, message, ..
            } => {
                // the watcher name doubles as the message subject
                let subject = instance.definition.name.as_str();
                match self
                    .bounded(self.notify.send_notification(&channel, subject, &message))
                    .await
                {
                    Ok(Ok(())) => event.with_result(format!("notified {channel}")),
                    Ok(Err(e)) => event.failed(e.to_string()),
                    Err(timed_out) => event.failed(timed_out),
                }
            }
            ActionSpec::CancelJob { .. } => {
                match self.bounded(self.jobs.cancel_job(&instance.job_id)).await {
                    Ok(Ok(())) => event.with_result("job cancelled"),
                    Ok(Err(e)) => event.failed(e.to_string()),
                    Err(timed_out) => event.failed(timed_out),
                }
            }
            ActionSpec::Resubmit {
                modifications,
                cancel_original,
                ..
            } => {
                match self
                    .bounded(
                        self.jobs
                            .resubmit_job(&instance.job_id, &modifications, cancel_original),
                    )
                    .await
                {
                    Ok(Ok(())) => event.with_result("job resubmitted"),
                    Ok(Err(e)) => event.failed(e.to_string()),
                    Err(timed_out) => event.failed(timed_out),
                }
            }
            ActionSpec::RunCommand {
                command,
                timeout_seconds,
                ..
            } => {
                // the remote adapter owns this deadline
                let limit = timeout_seconds
                    .map(Duration::from_secs)
                    .unwrap_or(self.action_timeout);
                match self
                    .remote
                    .run_remote_command(&instance.hostname, &command, limit)
                    .await
                {
                    Ok(outcome) if outcome.exit_code == 0 => {
                        if outcome.output.is_empty() {
                            event.with_result("exit 0")
                        } else {
                            event.with_result(outcome.output)
                        }
                    }
                    Ok(outcome) => {
                        event.failed(format!("exit {}: {}", outcome.exit_code, outcome.output))
                    }
                    Err(e) => event.failed(e.to_string()),
                }
            }
        }
    }

    /// Apply the batch deadline to one adapter call
    async fn bounded<T>(&self, call: impl Future<Output = T>) -> Result<T, String> {
        tokio::time::timeout(self.action_timeout, call)
            .await
            .map_err(|_| format!("timed out after {:?}", self.action_timeout))
    }
}

/// Evaluate an action's own condition against the capture snapshot
fn gate(action: &ActionSpec, vars: &BTreeMap<String, String>) -> Gate {
    let Some(source) = action.condition() else {
        return Gate::Run;
    };
    let condition = match Condition::parse(source) {
        Ok(condition) => condition,
        Err(e) => return Gate::Error(format!("condition error: {e}")),
    };
    match condition.evaluate(vars) {
        Ok(true) => Gate::Run,
        Ok(false) => Gate::Skip,
        Err(e) => Gate::Error(format!("condition error: {e}")),
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
