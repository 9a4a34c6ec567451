// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The engine loop: sole writer of watcher state
//!
//! Control calls (register, pause, resume, delete) mutate state
//! synchronously. Timer ticks hand output reads, array discovery, and
//! action batches to the worker pool; completions flow back over a
//! channel and are applied by the same loop, so no lock guards any
//! instance. A watcher has at most one check outstanding; its cadence
//! re-arms from the moment the check lands, never from the old
//! deadline, so slow reads slip the schedule instead of stacking up.

use crate::config::EngineConfig;
use crate::cursor::{scan_window, LineMatch};
use crate::dispatcher::ActionRunner;
use crate::error::EngineError;
use crate::pool::{BatchOutcome, Completion, DiscoveryOutcome, ReadOutcome, WorkerPool};
use crate::scheduler::Scheduler;
use jw_adapters::{JobControl, MetricSink, Notifier, OutputReader, RemoteExec};
use jw_core::definition::OutputStream;
use jw_core::{
    Clock, Condition, DefinitionError, Effect, IdGen, InstanceEvent, Notice, Watcher,
    WatcherDefinition, WatcherEvent, WatcherEventsResponse, WatcherId, WatcherInstance,
    WatcherState, WatcherStats, WatchersResponse, CONDITION_ACTION,
};
use jw_storage::EventStore;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;

/// Compiled pattern and trigger guard, kept beside the instance
#[derive(Clone)]
struct CompiledRule {
    regex: Regex,
    condition: Option<Condition>,
}

/// External collaborators handed to the engine at construction
pub struct EngineDeps<O, J, N, R, M> {
    pub output: O,
    pub jobs: J,
    pub notify: N,
    pub remote: R,
    pub metrics: M,
    pub store: EventStore,
}

pub struct Engine<O, J, N, R, M, C, I> {
    config: EngineConfig,
    output: O,
    jobs: J,
    runner: ActionRunner<J, N, R, M, I>,
    clock: C,
    id_gen: I,
    scheduler: Scheduler,
    instances: HashMap<String, WatcherInstance>,
    rules: HashMap<String, CompiledRule>,
    /// Task IDs already seen per array template
    seen_tasks: HashMap<String, HashSet<u32>>,
    /// Watchers with a check outstanding on the pool
    checking: HashSet<String>,
    /// Worker tasks not yet applied; drained by [`Engine::settle`]
    in_flight: usize,
    store: EventStore,
    pool: WorkerPool,
    completions: UnboundedReceiver<Completion>,
}

enum Step {
    Apply(Option<Completion>),
    Tick,
}

impl<O, J, N, R, M, C, I> Engine<O, J, N, R, M, C, I>
where
    O: OutputReader,
    J: JobControl,
    N: Notifier,
    R: RemoteExec,
    M: MetricSink,
    C: Clock,
    I: IdGen + 'static,
{
    pub fn new(config: EngineConfig, deps: EngineDeps<O, J, N, R, M>, clock: C, id_gen: I) -> Self {
        let (pool, completions) = WorkerPool::new(config.worker_concurrency);
        let runner = ActionRunner::new(
            deps.jobs.clone(),
            deps.notify,
            deps.remote,
            deps.metrics,
            id_gen.clone(),
            &config,
        );
        Self {
            config,
            output: deps.output,
            jobs: deps.jobs,
            runner,
            clock,
            id_gen,
            scheduler: Scheduler::new(),
            instances: HashMap::new(),
            rules: HashMap::new(),
            seen_tasks: HashMap::new(),
            checking: HashSet::new(),
            in_flight: 0,
            store: deps.store,
            pool,
            completions,
        }
    }

    /// Register one watcher against a running job.
    ///
    /// The first check lands a full interval out; a job that just
    /// started has no output yet.
    pub fn register(
        &mut self,
        job_id: &str,
        hostname: &str,
        definition: WatcherDefinition,
    ) -> Result<Watcher, EngineError> {
        definition.validate()?;
        let rule = compile_rule(&definition)?;
        let id = WatcherId::new(self.id_gen.next());
        let instance = WatcherInstance::new(id, job_id, hostname, definition, &self.clock);

        let now = self.clock.now();
        self.scheduler.set_timer(
            instance.check_timer_id(),
            instance.definition.interval(),
            now,
        );
        if instance.timer_mode_active {
            if let Some(interval) = instance.definition.timer_interval() {
                self.scheduler
                    .set_timer(instance.timer_tick_id(), interval, now);
            }
        }
        if instance.is_template() {
            self.seen_tasks.insert(instance.id.0.clone(), HashSet::new());
        }

        let view = Watcher::from(&instance);
        tracing::info!(
            watcher_id = %instance.id,
            job_id = %instance.job_id,
            name = %instance.definition.name,
            "watcher registered"
        );
        self.record_notice(
            &instance,
            &Notice::Registered {
                id: instance.id.0.clone(),
            },
        );
        self.rules.insert(instance.id.0.clone(), rule);
        self.instances.insert(instance.id.0.clone(), instance);
        Ok(view)
    }

    /// Register every directive found in a job script
    pub fn register_script(
        &mut self,
        job_id: &str,
        hostname: &str,
        script: &str,
    ) -> Result<Vec<Watcher>, EngineError> {
        let definitions = jw_directive::parse_script(script)?;
        let mut views = Vec::with_capacity(definitions.len());
        for definition in definitions {
            views.push(self.register(job_id, hostname, definition)?);
        }
        Ok(views)
    }

    /// Attach a watcher to an already-finished job. It never enters the
    /// due queue; [`Engine::evaluate_static`] runs it once on demand.
    pub fn attach_static(
        &mut self,
        job_id: &str,
        hostname: &str,
        definition: WatcherDefinition,
    ) -> Result<Watcher, EngineError> {
        definition.validate()?;
        let rule = compile_rule(&definition)?;
        let id = WatcherId::new(self.id_gen.next());
        let instance = WatcherInstance::new_static(id, job_id, hostname, definition, &self.clock);

        let view = Watcher::from(&instance);
        tracing::info!(
            watcher_id = %instance.id,
            job_id = %instance.job_id,
            "static watcher attached"
        );
        self.record_notice(
            &instance,
            &Notice::Registered {
                id: instance.id.0.clone(),
            },
        );
        self.rules.insert(instance.id.0.clone(), rule);
        self.instances.insert(instance.id.0.clone(), instance);
        Ok(view)
    }

    pub fn pause(&mut self, watcher_id: &str) -> Result<Watcher, EngineError> {
        self.apply_control(watcher_id, InstanceEvent::Pause)
    }

    pub fn resume(&mut self, watcher_id: &str) -> Result<Watcher, EngineError> {
        self.apply_control(watcher_id, InstanceEvent::Resume)
    }

    /// Soft delete: the instance retires but its audit trail stays
    pub fn delete(&mut self, watcher_id: &str) -> Result<Watcher, EngineError> {
        self.apply_control(watcher_id, InstanceEvent::Delete)
    }

    /// Retire every watcher bound to the job, array children included
    pub fn job_finished(&mut self, job_id: &str) {
        let child_prefix = format!("{job_id}_");
        let affected: Vec<String> = self
            .instances
            .values()
            .filter(|i| i.job_id == job_id || i.job_id.starts_with(&child_prefix))
            .map(|i| i.id.0.clone())
            .collect();
        tracing::info!(job_id, watchers = affected.len(), "job finished");
        for watcher_id in affected {
            let Some(instance) = self.instances.get(&watcher_id) else {
                continue;
            };
            let (next, effects) = instance.transition(InstanceEvent::JobFinished, &self.clock);
            self.instances.insert(watcher_id.clone(), next);
            self.apply_effects(&watcher_id, effects);
        }
    }

    /// Evaluate a static watcher against the job's full output, run
    /// any triggered actions inline, and complete the watcher.
    pub async fn evaluate_static(
        &mut self,
        watcher_id: &str,
    ) -> Result<Vec<WatcherEvent>, EngineError> {
        let instance = self
            .instances
            .get(watcher_id)
            .ok_or_else(|| EngineError::UnknownWatcher(watcher_id.to_string()))?;
        if instance.state != WatcherState::Static {
            return Err(EngineError::NotStatic(watcher_id.to_string()));
        }
        let (regex, condition) = self.rule_handles(watcher_id)?;
        let job_id = instance.job_id.clone();
        let hostname = instance.hostname.clone();
        let stream = instance.definition.stream;
        let now_utc = self.clock.now_utc();

        let mut bytes = self
            .output
            .read_new_output(&job_id, &hostname, stream, 0)
            .await
            .map_err(|e| EngineError::Read(e.to_string()))?;
        // a finished job's final line may lack its newline
        if !bytes.is_empty() && bytes.last() != Some(&b'\n') {
            bytes.push(b'\n');
        }

        let Some(instance) = self.instances.get_mut(watcher_id) else {
            return Err(EngineError::UnknownWatcher(watcher_id.to_string()));
        };
        let outcome = scan_window(&regex, &instance.definition.captures, 0, &bytes);
        instance.note_check(now_utc);
        let mut triggers: Vec<LineMatch> = Vec::new();
        let mut events = Vec::new();
        for m in outcome.matches {
            match gate(&condition, &m.captures, watcher_id) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(reason) => {
                    let event = WatcherEvent::action(
                        self.id_gen.next(),
                        instance,
                        now_utc,
                        m.line,
                        m.captures,
                        CONDITION_ACTION,
                    )
                    .failed(reason);
                    events.push(event);
                    continue;
                }
            }
            let cap_hit = instance.record_trigger(&m.captures);
            triggers.push(m);
            if cap_hit {
                break;
            }
        }
        let snapshot = instance.clone();

        for m in &triggers {
            let batch = self
                .runner
                .run_batch(&snapshot, &m.line, &m.captures, now_utc)
                .await;
            events.extend(batch);
        }
        for event in &events {
            if let Err(e) = self.store.append(event) {
                tracing::error!(error = %e, "audit append failed");
            }
        }
        let (next, effects) = snapshot.transition(InstanceEvent::StaticEvaluated, &self.clock);
        self.instances.insert(watcher_id.to_string(), next);
        self.apply_effects(watcher_id, effects);
        Ok(events)
    }

    /// Current client view of one watcher
    pub fn watcher(&self, watcher_id: &str) -> Result<Watcher, EngineError> {
        self.instances
            .get(watcher_id)
            .map(Watcher::from)
            .ok_or_else(|| EngineError::UnknownWatcher(watcher_id.to_string()))
    }

    /// Watchers bound to a job, array children included, oldest first
    pub fn watchers_for_job(&self, job_id: &str) -> WatchersResponse {
        let child_prefix = format!("{job_id}_");
        let mut matched: Vec<&WatcherInstance> = self
            .instances
            .values()
            .filter(|i| i.job_id == job_id || i.job_id.starts_with(&child_prefix))
            .collect();
        matched.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        WatchersResponse::new(job_id, matched.into_iter().map(Watcher::from).collect())
    }

    pub fn events_for_watcher(&self, watcher_id: &str) -> WatcherEventsResponse {
        WatcherEventsResponse::new(self.store.for_watcher(watcher_id))
    }

    pub fn recent_events(&self, limit: usize) -> WatcherEventsResponse {
        WatcherEventsResponse::new(self.store.recent(limit))
    }

    pub fn stats(&self) -> WatcherStats {
        jw_storage::stats::derive(
            self.instances.values(),
            self.store.all(),
            self.clock.now_utc(),
            self.config.stats_top_n,
        )
    }

    /// Drive timers and completions until the completion channel closes
    pub async fn run(&mut self) {
        loop {
            let step = match self.scheduler.next_deadline() {
                Some(due) => {
                    tokio::select! {
                        completion = self.completions.recv() => Step::Apply(completion),
                        _ = tokio::time::sleep_until(tokio::time::Instant::from_std(due)) => {
                            Step::Tick
                        }
                    }
                }
                None => Step::Apply(self.completions.recv().await),
            };
            match step {
                Step::Apply(Some(completion)) => self.apply_completion(completion),
                Step::Apply(None) => break,
                Step::Tick => {
                    let now = self.clock.now();
                    self.tick_at(now);
                }
            }
        }
    }

    /// Fire every timer due at `now`. Reads and discovery land on the
    /// worker pool; [`Engine::settle`] applies their completions.
    pub fn tick_at(&mut self, now: Instant) {
        for timer_id in self.scheduler.fired_timers(now) {
            self.route_timer(&timer_id);
        }
    }

    /// Apply queued completions until no worker task remains in flight
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            match self.completions.recv().await {
                Some(completion) => self.apply_completion(completion),
                None => break,
            }
        }
    }

    fn route_timer(&mut self, timer_id: &str) {
        let Some(rest) = timer_id.strip_prefix("watch:") else {
            tracing::warn!(timer_id, "unroutable timer");
            return;
        };
        if let Some(watcher_id) = rest.strip_suffix(":check") {
            self.on_check_due(watcher_id);
        } else if let Some(watcher_id) = rest.strip_suffix(":timer") {
            self.on_timer_due(watcher_id);
        } else {
            tracing::warn!(timer_id, "unroutable timer");
        }
    }

    fn on_check_due(&mut self, watcher_id: &str) {
        if let Some(instance) = self.instances.get(watcher_id) {
            if instance.state == WatcherState::Pending {
                let (next, effects) = instance.transition(InstanceEvent::FirstCheck, &self.clock);
                self.instances.insert(watcher_id.to_string(), next);
                self.apply_effects(watcher_id, effects);
            }
        }
        let Some(instance) = self.instances.get(watcher_id) else {
            return;
        };
        if instance.state != WatcherState::Active {
            return;
        }
        if self.checking.contains(watcher_id) {
            // previous check still running; its completion owns the re-arm
            return;
        }
        if instance.is_template() {
            self.spawn_discovery(watcher_id);
        } else {
            self.spawn_read(watcher_id);
        }
    }

    fn on_timer_due(&mut self, watcher_id: &str) {
        let Some(instance) = self.instances.get(watcher_id) else {
            return;
        };
        if !instance.timer_mode_active {
            return;
        }
        let Some(interval) = instance.definition.timer_interval() else {
            return;
        };
        // cadence holds while the job is pending; actions start once active
        let dispatch = instance.state == WatcherState::Active;
        if instance.state.is_schedulable() {
            let timer_id = instance.timer_tick_id();
            let now = self.clock.now();
            self.scheduler.set_timer(timer_id, interval, now);
        }
        if dispatch {
            self.dispatch_timer_batch(watcher_id);
        }
    }

    fn spawn_read(&mut self, watcher_id: &str) {
        let Some(instance) = self.instances.get(watcher_id) else {
            return;
        };
        let output = self.output.clone();
        let job_id = instance.job_id.clone();
        let hostname = instance.hostname.clone();
        let stream = instance.definition.stream;
        let from_position = instance.last_position;
        let id = watcher_id.to_string();
        let attempts = self.config.read_retry_limit.max(1);
        let backoff = self.config.read_retry_backoff;

        self.checking.insert(id.clone());
        self.in_flight += 1;
        self.pool.spawn(async move {
            let result = read_with_retries(
                &output,
                &job_id,
                &hostname,
                stream,
                from_position,
                attempts,
                backoff,
            )
            .await;
            Completion::Read(ReadOutcome {
                watcher_id: id,
                from_position,
                result,
            })
        });
    }

    fn spawn_discovery(&mut self, watcher_id: &str) {
        let Some(instance) = self.instances.get(watcher_id) else {
            return;
        };
        let jobs = self.jobs.clone();
        let job_id = instance.job_id.clone();
        let id = watcher_id.to_string();

        self.checking.insert(id.clone());
        self.in_flight += 1;
        self.pool.spawn(async move {
            let result = jobs
                .get_array_task_ids(&job_id)
                .await
                .map_err(|e| e.to_string());
            Completion::Discovery(DiscoveryOutcome {
                watcher_id: id,
                result,
            })
        });
    }

    fn dispatch_timer_batch(&mut self, watcher_id: &str) {
        let Some(instance) = self.instances.get(watcher_id) else {
            return;
        };
        let snapshot = instance.clone();
        let runner = self.runner.clone();
        let now_utc = self.clock.now_utc();
        let id = watcher_id.to_string();

        self.in_flight += 1;
        self.pool.spawn(async move {
            let events = runner
                .run_batch(&snapshot, "", &snapshot.variables, now_utc)
                .await;
            Completion::Batch(BatchOutcome {
                watcher_id: id,
                events,
            })
        });
    }

    fn apply_completion(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match completion {
            Completion::Read(outcome) => self.apply_read(outcome),
            Completion::Discovery(outcome) => self.apply_discovery(outcome),
            Completion::Batch(outcome) => self.apply_batch(outcome),
        }
    }

    fn apply_read(&mut self, outcome: ReadOutcome) {
        let ReadOutcome {
            watcher_id,
            from_position,
            result,
        } = outcome;
        self.checking.remove(&watcher_id);
        let Some(instance) = self.instances.get(&watcher_id) else {
            return;
        };
        if instance.state != WatcherState::Active {
            // paused or retired while the read was in flight
            return;
        }
        match result {
            Ok(bytes) => self.apply_scan(&watcher_id, from_position, &bytes),
            Err(error) => self.apply_read_failure(&watcher_id, &error),
        }
    }

    fn apply_read_failure(&mut self, watcher_id: &str, error: &str) {
        let now_utc = self.clock.now_utc();
        let Some(instance) = self.instances.get_mut(watcher_id) else {
            return;
        };
        instance.note_check(now_utc);
        let timer_id = instance.check_timer_id();
        let interval = instance.definition.interval();
        let event = if instance.set_degraded(true) {
            let notice = Notice::Degraded {
                id: watcher_id.to_string(),
                error: error.to_string(),
            };
            Some(WatcherEvent::lifecycle(
                self.id_gen.next(),
                instance,
                now_utc,
                &notice,
            ))
        } else {
            None
        };
        tracing::warn!(watcher_id, error, "output read failed");
        if let Some(event) = event {
            self.append_audit(event);
        }
        // degraded watchers keep their cadence; the job may still be fine
        let now = self.clock.now();
        self.scheduler.set_timer(timer_id, interval, now);
    }

    fn apply_scan(&mut self, watcher_id: &str, from_position: u64, bytes: &[u8]) {
        let Ok((regex, condition)) = self.rule_handles(watcher_id) else {
            return;
        };
        let now_utc = self.clock.now_utc();
        let Some(instance) = self.instances.get_mut(watcher_id) else {
            return;
        };
        let outcome = scan_window(&regex, &instance.definition.captures, from_position, bytes);
        let recovered = instance.set_degraded(false);
        if let Err(regression) = instance.advance_position(outcome.new_position) {
            tracing::error!(watcher_id, error = %regression, "scan cursor regressed");
            let (next, effects) = instance.transition(
                InstanceEvent::Fault {
                    reason: regression.to_string(),
                },
                &self.clock,
            );
            self.instances.insert(watcher_id.to_string(), next);
            self.apply_effects(watcher_id, effects);
            return;
        }
        instance.note_check(now_utc);

        let mut triggers: Vec<LineMatch> = Vec::new();
        let mut faults: Vec<WatcherEvent> = Vec::new();
        let mut cap_hit = false;
        for m in outcome.matches {
            match gate(&condition, &m.captures, watcher_id) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(reason) => {
                    // the match is audited but triggers nothing
                    let event = WatcherEvent::action(
                        self.id_gen.next(),
                        instance,
                        now_utc,
                        m.line,
                        m.captures,
                        CONDITION_ACTION,
                    )
                    .failed(reason);
                    faults.push(event);
                    continue;
                }
            }
            cap_hit = instance.record_trigger(&m.captures);
            triggers.push(m);
            if cap_hit {
                // matches past the cap fall away with the watcher
                break;
            }
        }
        let snapshot = instance.clone();

        if recovered {
            let notice = Notice::Recovered {
                id: watcher_id.to_string(),
            };
            let event =
                WatcherEvent::lifecycle(self.id_gen.next(), &snapshot, now_utc, &notice);
            self.append_audit(event);
        }
        for event in faults {
            self.append_audit(event);
        }
        for m in &triggers {
            let runner = self.runner.clone();
            let snapshot = snapshot.clone();
            let line = m.line.clone();
            let vars = m.captures.clone();
            let id = watcher_id.to_string();
            self.in_flight += 1;
            self.pool.spawn(async move {
                let events = runner.run_batch(&snapshot, &line, &vars, now_utc).await;
                Completion::Batch(BatchOutcome {
                    watcher_id: id,
                    events,
                })
            });
        }
        if cap_hit {
            let (next, effects) = snapshot.transition(InstanceEvent::TriggerCapReached, &self.clock);
            self.instances.insert(watcher_id.to_string(), next);
            self.apply_effects(watcher_id, effects);
        } else {
            let now = self.clock.now();
            self.scheduler
                .set_timer(snapshot.check_timer_id(), snapshot.definition.interval(), now);
        }
    }

    fn apply_discovery(&mut self, outcome: DiscoveryOutcome) {
        let DiscoveryOutcome { watcher_id, result } = outcome;
        self.checking.remove(&watcher_id);
        let Some(instance) = self.instances.get(&watcher_id) else {
            return;
        };
        if instance.state != WatcherState::Active {
            return;
        }
        let timer_id = instance.check_timer_id();
        let interval = instance.definition.interval();
        let task_ids = match result {
            Ok(task_ids) => task_ids,
            Err(error) => {
                tracing::warn!(watcher_id = %watcher_id, error, "array discovery failed");
                let now = self.clock.now();
                self.scheduler.set_timer(timer_id, interval, now);
                return;
            }
        };

        let mut fresh = Vec::new();
        {
            let seen = self.seen_tasks.entry(watcher_id.clone()).or_default();
            for task_id in task_ids {
                if seen.insert(task_id) {
                    fresh.push(task_id);
                }
            }
        }
        for task_id in fresh {
            self.spawn_child(&watcher_id, task_id);
        }

        let Some(instance) = self.instances.get(&watcher_id) else {
            return;
        };
        if instance.discovery_complete() {
            // children carry on; the template has nothing left to poll
            tracing::info!(
                watcher_id = %watcher_id,
                tasks = instance.discovered_task_count.unwrap_or(0),
                "array discovery complete"
            );
        } else {
            let now = self.clock.now();
            self.scheduler.set_timer(timer_id, interval, now);
        }
    }

    fn spawn_child(&mut self, parent_id: &str, task_id: u32) {
        let Some(parent) = self.instances.get_mut(parent_id) else {
            return;
        };
        parent.record_discovered();
        let parent_snapshot = parent.clone();
        let Some(rule) = self.rules.get(parent_id).cloned() else {
            tracing::warn!(parent_id, task_id, "template rule missing; child not spawned");
            return;
        };

        let child_id = WatcherId::new(self.id_gen.next());
        let child = WatcherInstance::new_child(child_id, &parent_snapshot, task_id, &self.clock);
        let notice = Notice::ChildSpawned {
            id: parent_id.to_string(),
            child_id: child.id.0.clone(),
            task_id,
        };
        let event = WatcherEvent::lifecycle(
            self.id_gen.next(),
            &parent_snapshot,
            self.clock.now_utc(),
            &notice,
        );
        self.append_audit(event);

        // the task is already running; check it right away
        let now = self.clock.now();
        self.scheduler
            .set_timer(child.check_timer_id(), Duration::ZERO, now);
        if child.timer_mode_active {
            if let Some(interval) = child.definition.timer_interval() {
                self.scheduler.set_timer(child.timer_tick_id(), interval, now);
            }
        }
        tracing::info!(parent_id, child = %child.id, task_id, "array child spawned");
        self.rules.insert(child.id.0.clone(), rule);
        self.instances.insert(child.id.0.clone(), child);
    }

    fn apply_batch(&mut self, outcome: BatchOutcome) {
        tracing::debug!(
            watcher_id = %outcome.watcher_id,
            events = outcome.events.len(),
            "action batch recorded"
        );
        for event in &outcome.events {
            if let Err(e) = self.store.append(event) {
                tracing::error!(error = %e, "audit append failed");
            }
        }
    }

    fn apply_control(
        &mut self,
        watcher_id: &str,
        event: InstanceEvent,
    ) -> Result<Watcher, EngineError> {
        let instance = self
            .instances
            .get(watcher_id)
            .ok_or_else(|| EngineError::UnknownWatcher(watcher_id.to_string()))?;
        let (next, effects) = instance.transition(event, &self.clock);
        let view = Watcher::from(&next);
        self.instances.insert(watcher_id.to_string(), next);
        self.apply_effects(watcher_id, effects);
        Ok(view)
    }

    fn apply_effects(&mut self, watcher_id: &str, effects: Vec<Effect>) {
        let now = self.clock.now();
        for effect in effects {
            match effect {
                Effect::SetTimer { id, duration } => self.scheduler.set_timer(id, duration, now),
                Effect::CancelTimer { id } => self.scheduler.cancel_timer(&id),
                Effect::Emit(notice) => {
                    let Some(instance) = self.instances.get(watcher_id) else {
                        continue;
                    };
                    let event = WatcherEvent::lifecycle(
                        self.id_gen.next(),
                        instance,
                        self.clock.now_utc(),
                        &notice,
                    );
                    self.append_audit(event);
                }
            }
        }
    }

    fn record_notice(&mut self, instance: &WatcherInstance, notice: &Notice) {
        let event = WatcherEvent::lifecycle(
            self.id_gen.next(),
            instance,
            self.clock.now_utc(),
            notice,
        );
        self.append_audit(event);
    }

    fn append_audit(&mut self, event: WatcherEvent) {
        let detail = event.action_result.as_deref().unwrap_or("");
        if event.success {
            tracing::info!(watcher_id = %event.watcher_id, detail, "watcher lifecycle");
        } else {
            tracing::warn!(watcher_id = %event.watcher_id, detail, "watcher lifecycle");
        }
        if let Err(e) = self.store.append(&event) {
            tracing::error!(error = %e, "audit append failed");
        }
    }

    fn rule_handles(&self, watcher_id: &str) -> Result<(Regex, Option<Condition>), EngineError> {
        let rule = self
            .rules
            .get(watcher_id)
            .ok_or_else(|| EngineError::UnknownWatcher(watcher_id.to_string()))?;
        Ok((rule.regex.clone(), rule.condition.clone()))
    }
}

fn compile_rule(definition: &WatcherDefinition) -> Result<CompiledRule, EngineError> {
    let regex = Regex::new(&definition.pattern).map_err(DefinitionError::Pattern)?;
    let condition = match &definition.condition {
        Some(source) => Some(Condition::parse(source).map_err(|error| {
            DefinitionError::Condition {
                source: source.clone(),
                error,
            }
        })?),
        None => None,
    };
    Ok(CompiledRule { regex, condition })
}

/// Evaluate the definition-level trigger guard. `Ok(false)` drops the
/// match silently; an evaluation error is returned so the caller can
/// audit the failed match.
fn gate(
    condition: &Option<Condition>,
    vars: &BTreeMap<String, String>,
    watcher_id: &str,
) -> Result<bool, String> {
    let Some(condition) = condition else {
        return Ok(true);
    };
    match condition.evaluate(vars) {
        Ok(hit) => Ok(hit),
        Err(e) => {
            tracing::warn!(watcher_id, error = %e, "trigger condition failed to evaluate");
            Err(e.to_string())
        }
    }
}

async fn read_with_retries<O: OutputReader>(
    output: &O,
    job_id: &str,
    hostname: &str,
    stream: OutputStream,
    from_position: u64,
    attempts: u32,
    backoff: Duration,
) -> Result<Vec<u8>, String> {
    let mut delay = backoff;
    for attempt in 1..=attempts {
        match output
            .read_new_output(job_id, hostname, stream, from_position)
            .await
        {
            Ok(bytes) => return Ok(bytes),
            Err(e) if attempt == attempts => return Err(e.to_string()),
            Err(e) => {
                tracing::debug!(job_id, attempt, error = %e, "output read failed; retrying");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }
    Err("no read attempts configured".to_string())
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
