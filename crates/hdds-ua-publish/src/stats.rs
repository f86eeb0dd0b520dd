// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publish engine counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Cumulative engine counters (Relaxed atomics).
#[derive(Debug)]
pub struct EngineStats {
    pub publish_sent: AtomicU64,
    pub publish_succeeded: AtomicU64,
    pub publish_failed: AtomicU64,
    pub acknowledgements_sent: AtomicU64,
    pub keep_alives: AtomicU64,
    pub notifications_delivered: AtomicU64,
    /// Responses for unknown subscriptions or a terminated engine.
    pub notifications_dropped: AtomicU64,
    /// Handler errors and panics.
    pub delivery_failures: AtomicU64,
    pub throttle_events: AtomicU64,
    /// Acknowledgements the server answered with a bad status.
    pub bad_acknowledgements: AtomicU64,
    pub republished: AtomicU64,
    pub recreated: AtomicU64,
    created: Instant,
}

impl EngineStats {
    pub fn new() -> Self {
        Self {
            publish_sent: AtomicU64::new(0),
            publish_succeeded: AtomicU64::new(0),
            publish_failed: AtomicU64::new(0),
            acknowledgements_sent: AtomicU64::new(0),
            keep_alives: AtomicU64::new(0),
            notifications_delivered: AtomicU64::new(0),
            notifications_dropped: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
            throttle_events: AtomicU64::new(0),
            bad_acknowledgements: AtomicU64::new(0),
            republished: AtomicU64::new(0),
            recreated: AtomicU64::new(0),
            created: Instant::now(),
        }
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Get snapshot of current stats.
    pub fn snapshot(&self) -> EngineStatsSnapshot {
        EngineStatsSnapshot {
            publish_sent: self.publish_sent.load(Ordering::Relaxed),
            publish_succeeded: self.publish_succeeded.load(Ordering::Relaxed),
            publish_failed: self.publish_failed.load(Ordering::Relaxed),
            acknowledgements_sent: self.acknowledgements_sent.load(Ordering::Relaxed),
            keep_alives: self.keep_alives.load(Ordering::Relaxed),
            notifications_delivered: self.notifications_delivered.load(Ordering::Relaxed),
            notifications_dropped: self.notifications_dropped.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            throttle_events: self.throttle_events.load(Ordering::Relaxed),
            bad_acknowledgements: self.bad_acknowledgements.load(Ordering::Relaxed),
            republished: self.republished.load(Ordering::Relaxed),
            recreated: self.recreated.load(Ordering::Relaxed),
            uptime_secs: self.created.elapsed().as_secs(),
        }
    }
}

impl Default for EngineStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of engine statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineStatsSnapshot {
    pub publish_sent: u64,
    pub publish_succeeded: u64,
    pub publish_failed: u64,
    pub acknowledgements_sent: u64,
    pub keep_alives: u64,
    pub notifications_delivered: u64,
    pub notifications_dropped: u64,
    pub delivery_failures: u64,
    pub throttle_events: u64,
    pub bad_acknowledgements: u64,
    pub republished: u64,
    pub recreated: u64,
    pub uptime_secs: u64,
}

impl EngineStatsSnapshot {
    /// Poll requests still awaiting a response at snapshot time.
    pub fn publish_outstanding(&self) -> u64 {
        self.publish_sent
            .saturating_sub(self.publish_succeeded + self.publish_failed)
    }
}
