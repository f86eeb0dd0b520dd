// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Notification dispatch: publish response -> owning subscription.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::engine::PublishEngine;
use crate::stats::EngineStats;
use crate::subscription::Subscription;
use crate::types::{NotificationMessage, PublishResponse};

impl PublishEngine {
    /// Route one successful publish response.
    ///
    /// Data-bearing messages are acknowledged on the next poll request;
    /// keep-alives never are. Responses for unknown subscriptions or a
    /// terminated engine are dropped: both are normal during teardown.
    pub(crate) fn dispatch(&self, response: PublishResponse) {
        let PublishResponse {
            subscription_id,
            notification,
            results,
            ..
        } = response;

        self.record_acknowledgement_results(&results);

        if self.is_terminated() {
            tracing::trace!(
                "Dropping notification {}#{}: engine terminated",
                subscription_id,
                notification.sequence_number
            );
            EngineStats::bump(&self.inner.stats.notifications_dropped);
            return;
        }

        let keep_alive = notification.is_keep_alive();
        let subscription = {
            let mut state = self.inner.state.lock();
            let subscription = state.registry.get(subscription_id);
            if subscription.is_some() && !keep_alive {
                state
                    .acks
                    .push(subscription_id, notification.sequence_number);
            }
            subscription
        };

        if keep_alive {
            EngineStats::bump(&self.inner.stats.keep_alives);
        }

        let Some(subscription) = subscription else {
            tracing::trace!(
                "Dropping notification {}#{}: subscription not registered",
                subscription_id,
                notification.sequence_number
            );
            EngineStats::bump(&self.inner.stats.notifications_dropped);
            return;
        };

        deliver(subscription.as_ref(), notification, &self.inner.stats);
    }

    fn record_acknowledgement_results(&self, results: &[crate::status::StatusCode]) {
        let bad = results.iter().filter(|status| !status.is_good()).count();
        if bad > 0 {
            tracing::debug!("Server rejected {} of {} acknowledgements", bad, results.len());
            EngineStats::add(&self.inner.stats.bad_acknowledgements, bad as u64);
        }
    }
}

/// Hand a message to its subscription with error and panic isolation.
///
/// Returns `true` when the handler accepted the message.
pub(crate) fn deliver(
    subscription: &dyn Subscription,
    message: NotificationMessage,
    stats: &EngineStats,
) -> bool {
    let id = subscription.id();
    let seq = message.sequence_number;

    match catch_unwind(AssertUnwindSafe(|| subscription.on_notification(message))) {
        Ok(Ok(())) => {
            EngineStats::bump(&stats.notifications_delivered);
            true
        }
        Ok(Err(err)) => {
            tracing::warn!("Subscription {} failed to handle #{}: {}", id, seq, err);
            EngineStats::bump(&stats.delivery_failures);
            false
        }
        Err(_) => {
            tracing::warn!("Subscription {} panicked while handling #{}", id, seq);
            EngineStats::bump(&stats.delivery_failures);
            false
        }
    }
}
