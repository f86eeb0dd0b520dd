// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Poll completion classifier.
//!
//! | Condition                                    | Decision          |
//! |----------------------------------------------|-------------------|
//! | success                                      | `Continue`        |
//! | channel / transport not connected           | `AwaitReconnect`  |
//! | no subscription, while >= 1 active locally   | `Disagreement`    |
//! | session closed / session id invalid          | `SessionLost`     |
//! | too many publish requests                    | `Throttle`        |
//! | anything else                                | `Skip`            |
//!
//! Only `Continue` re-arms the pipeline.

use crate::status::StatusCode;

/// What the pipeline does after a poll request completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineDecision {
    /// Issue one replacement request.
    Continue,
    /// Idle until reconnection is signaled.
    AwaitReconnect,
    /// Server has no subscription but the client does; logged only.
    Disagreement,
    /// Session gone; halt this engine for good.
    SessionLost,
    /// Server queue full; shrink the learned cap.
    Throttle,
    /// Drop this cycle only.
    Skip,
}

impl PipelineDecision {
    /// Whether a replacement request should be issued.
    #[must_use]
    pub fn rearms(self) -> bool {
        matches!(self, Self::Continue)
    }
}

/// Classify a failed poll request.
#[must_use]
pub fn classify(status: StatusCode, active_subscriptions: usize) -> PipelineDecision {
    match status {
        s if s.is_channel_failure() => PipelineDecision::AwaitReconnect,
        StatusCode::BadNoSubscription if active_subscriptions >= 1 => {
            PipelineDecision::Disagreement
        }
        s if s.is_session_failure() => PipelineDecision::SessionLost,
        StatusCode::BadTooManyPublishRequests => PipelineDecision::Throttle,
        _ => PipelineDecision::Skip,
    }
}

/// Learned cap after a `Throttle` decision.
///
/// `in_flight_at_failure` includes the rejected request, so the result is
/// never zero and never grows.
#[must_use]
pub fn throttled_cap(current_cap: u32, in_flight_at_failure: u32) -> u32 {
    current_cap.min(in_flight_at_failure.max(1))
}
