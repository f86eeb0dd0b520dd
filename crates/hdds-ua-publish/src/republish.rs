// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Post-reconnect recovery of missed notification messages.
//!
//! ## Protocol Flow
//!
//! ```text
//! Client                                       Server
//!   |--- REPUBLISH (sub=3, seq=last+1) ---------->|
//!   |<-- notification #last+1 --------------------|  deliver, keep going
//!   |--- REPUBLISH (sub=3, seq=last+2) ---------->|
//!   |<-- BadMessageNotAvailable ------------------|  done
//!
//!   |--- REPUBLISH (sub=9, seq=...) ------------->|
//!   |<-- BadSubscriptionIdInvalid ----------------|  recreate, then done
//! ```
//!
//! One repair runs per registered subscription, all concurrently. Repairs are
//! spawned tasks, so they finish even if the caller stops waiting.

use tokio::sync::mpsc;

use crate::dispatcher::deliver;
use crate::engine::PublishEngine;
use crate::error::RecoveryError;
use crate::stats::EngineStats;
use crate::status::StatusCode;
use crate::subscription::Subscription;
use crate::types::{next_sequence_number, RepublishRequest, SubscriptionId};
use std::sync::Arc;

/// Terminal state of one subscription repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RepairOutcome {
    /// Nothing (more) to retransmit, or the session went away.
    Done { republished: u64 },
    /// Server had discarded the subscription; it was recreated.
    Recreated { republished: u64 },
    /// Session invalid; the whole pass fails.
    Aborted(StatusCode),
}

/// Result of a successful recovery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoverySummary {
    /// Subscriptions whose repair reached `Done`.
    pub repaired: usize,
    /// Subscriptions recreated after the server discarded them.
    pub recreated: usize,
    /// Notification messages re-delivered.
    pub republished: u64,
}

impl PublishEngine {
    /// Re-deliver notifications missed while disconnected.
    ///
    /// Completes once every registered subscription's repair has finished.
    /// The first session-invalid failure is reported; other repairs still run
    /// to completion. On success the pipeline is refilled.
    pub async fn recover_after_reconnect(&self) -> Result<RecoverySummary, RecoveryError> {
        let subscriptions = self.inner.state.lock().registry.handles();
        tracing::info!(
            "Recovering {} subscription(s) after reconnect",
            subscriptions.len()
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        for subscription in subscriptions {
            let engine = self.clone();
            let tx = tx.clone();
            self.inner.runtime.spawn(async move {
                let id = subscription.id();
                let outcome = engine.repair_subscription(subscription).await;
                let _ = tx.send((id, outcome));
            });
        }
        drop(tx);

        let mut summary = RecoverySummary::default();
        let mut failure: Option<RecoveryError> = None;
        while let Some((subscription_id, outcome)) = rx.recv().await {
            match outcome {
                RepairOutcome::Done { republished } => {
                    summary.repaired += 1;
                    summary.republished += republished;
                }
                RepairOutcome::Recreated { republished } => {
                    summary.recreated += 1;
                    summary.republished += republished;
                }
                RepairOutcome::Aborted(status) => {
                    tracing::warn!(
                        "Recovery of subscription {} aborted: {}",
                        subscription_id,
                        status
                    );
                    failure.get_or_insert(RecoveryError::SessionInvalid {
                        subscription_id,
                        status,
                    });
                }
            }
        }

        if let Some(err) = failure {
            return Err(err);
        }

        tracing::info!(
            "Recovery complete: {} repaired, {} recreated, {} republished",
            summary.repaired,
            summary.recreated,
            summary.republished
        );
        if !self.is_terminated() && !self.is_suspended() && !self.is_halted() {
            self.replenish();
        }
        Ok(summary)
    }

    /// Sequential retransmission loop for one subscription.
    async fn repair_subscription(&self, subscription: Arc<dyn Subscription>) -> RepairOutcome {
        let id = subscription.id();
        let mut cursor = subscription.last_sequence_number();
        let mut republished = 0;

        loop {
            let Some(session) = self.session() else {
                return RepairOutcome::Done { republished };
            };
            if session.is_closed() {
                return RepairOutcome::Done { republished };
            }

            let request = RepublishRequest {
                subscription_id: id,
                retransmit_sequence_number: next_sequence_number(cursor),
            };
            let result = session.republish(request).await;
            drop(session);

            match result {
                Ok(response) => {
                    if self.is_terminated() {
                        return RepairOutcome::Done { republished };
                    }
                    cursor = response.notification.sequence_number;
                    republished += 1;
                    EngineStats::bump(&self.inner.stats.republished);
                    tracing::debug!("Subscription {}: republished #{}", id, cursor);
                    deliver(subscription.as_ref(), response.notification, &self.inner.stats);
                }
                Err(StatusCode::BadMessageNotAvailable) => {
                    return RepairOutcome::Done { republished };
                }
                Err(StatusCode::BadSessionIdInvalid) => {
                    return RepairOutcome::Aborted(StatusCode::BadSessionIdInvalid);
                }
                Err(StatusCode::BadSubscriptionIdInvalid) => {
                    self.recreate(id, subscription.as_ref()).await;
                    return RepairOutcome::Recreated { republished };
                }
                Err(status) => {
                    tracing::debug!(
                        "Subscription {}: republish of #{} failed ({}), giving up",
                        id,
                        request.retransmit_sequence_number,
                        status
                    );
                    return RepairOutcome::Done { republished };
                }
            }
        }
    }

    async fn recreate(&self, id: SubscriptionId, subscription: &dyn Subscription) {
        tracing::info!("Subscription {} unknown to server, recreating", id);
        match subscription.recreate().await {
            Ok(()) => EngineStats::bump(&self.inner.stats.recreated),
            Err(err) => tracing::warn!("Subscription {} recreation failed: {}", id, err),
        }
    }
}
