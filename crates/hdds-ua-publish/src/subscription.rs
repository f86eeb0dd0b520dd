// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subscription handle contract.

use async_trait::async_trait;

use crate::error::SubscriptionError;
use crate::types::{NotificationMessage, SequenceNumber, SubscriptionId};

/// Client-managed subscription, referenced (not owned) by the engine.
///
/// Monitored item bookkeeping stays inside the implementation; the engine
/// only routes notification messages and asks for recreation.
#[async_trait]
pub trait Subscription: Send + Sync {
    /// Server-assigned id, stable while registered.
    fn id(&self) -> SubscriptionId;

    /// Acknowledgement-timeout hint in milliseconds.
    fn timeout_hint_ms(&self) -> u32;

    /// Last sequence number successfully processed.
    fn last_sequence_number(&self) -> SequenceNumber;

    /// Deliver one notification message (data or keep-alive).
    ///
    /// Errors and panics are isolated by the engine and only logged.
    fn on_notification(&self, message: NotificationMessage) -> Result<(), SubscriptionError>;

    /// Recreate the subscription and its monitored items after the server
    /// discarded it. Resolves once recreation has finished.
    async fn recreate(&self) -> Result<(), SubscriptionError>;
}
