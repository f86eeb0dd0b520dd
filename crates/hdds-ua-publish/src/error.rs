// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for the publish engine.

use thiserror::Error;

use crate::config::ConfigError;
use crate::status::StatusCode;
use crate::types::SubscriptionId;

/// Contract violations on the engine surface.
///
/// None of these leave side effects behind: the call is rejected as a whole.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine is already suspended")]
    AlreadySuspended,

    #[error("Engine is not suspended")]
    NotSuspended,

    #[error("Subscription id 0 is not valid")]
    InvalidSubscriptionId,

    #[error("Subscription {0} is already registered")]
    DuplicateSubscription(SubscriptionId),

    #[error("Subscription {0} is not registered")]
    UnknownSubscription(SubscriptionId),

    #[error("No Tokio runtime available to drive the publish pipeline")]
    NoRuntime,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failure of a post-reconnect recovery pass.
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// The session became unusable while repairing a subscription.
    #[error("Session invalid while repairing subscription {subscription_id}: {status}")]
    SessionInvalid {
        subscription_id: SubscriptionId,
        #[source]
        status: StatusCode,
    },
}

/// Failure raised by a subscription handle.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("Notification handler failed: {0}")]
    Handler(String),

    #[error("Subscription recreation failed: {0}")]
    Recreate(String),

    #[error("Service fault: {0}")]
    Status(#[from] StatusCode),
}
