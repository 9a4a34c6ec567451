// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn defaults_suit_a_production_poll_cadence() {
    let config = EngineConfig::default();
    assert_eq!(config.worker_concurrency, 16);
    assert_eq!(config.action_timeout, Duration::from_secs(60));
    assert_eq!(config.read_retry_limit, 3);
    assert_eq!(config.read_retry_backoff, Duration::from_millis(500));
    assert_eq!(config.stats_top_n, 5);
}

#[test]
fn testing_profile_keeps_waits_short() {
    let config = EngineConfig::for_testing();
    assert!(config.action_timeout < Duration::from_secs(1));
    assert!(config.read_retry_backoff <= Duration::from_millis(10));
    assert!(config.worker_concurrency >= 2);
}
