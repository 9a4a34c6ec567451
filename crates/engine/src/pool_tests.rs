// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn read_completion(watcher_id: &str) -> Completion {
    Completion::Read(ReadOutcome {
        watcher_id: watcher_id.to_string(),
        from_position: 0,
        result: Ok(vec![]),
    })
}

#[tokio::test]
async fn completions_arrive_for_every_task() {
    let (pool, mut rx) = WorkerPool::new(4);

    for i in 0..10 {
        let id = format!("w-{i}");
        pool.spawn(async move { read_completion(&id) });
    }

    let mut seen = Vec::new();
    for _ in 0..10 {
        match rx.recv().await.unwrap() {
            Completion::Read(outcome) => seen.push(outcome.watcher_id),
            other => panic!("unexpected completion: {other:?}"),
        }
    }
    seen.sort();
    assert_eq!(seen.len(), 10);
    assert_eq!(seen[0], "w-0");
    assert_eq!(seen[9], "w-9");
}

#[tokio::test]
async fn concurrency_stays_within_the_bound() {
    let (pool, mut rx) = WorkerPool::new(2);
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    for i in 0..8 {
        let running = Arc::clone(&running);
        let peak = Arc::clone(&peak);
        let id = format!("w-{i}");
        pool.spawn(async move {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            running.fetch_sub(1, Ordering::SeqCst);
            read_completion(&id)
        });
    }

    for _ in 0..8 {
        rx.recv().await.unwrap();
    }
    assert!(peak.load(Ordering::SeqCst) <= 2);
}
