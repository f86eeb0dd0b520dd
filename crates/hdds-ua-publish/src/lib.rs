// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HDDS UA Publish Engine
//!
//! Client-side engine that keeps notifications flowing from a
//! session-oriented industrial control server (OPC UA style) to the
//! subscriptions a client manages.
//!
//! # Overview
//!
//! | Component | Role |
//! |-----------|------|
//! | `SubscriptionRegistry` | Subscription id -> handle |
//! | `AcknowledgementQueue` | Acknowledgements piggybacked on the next poll request |
//! | `PublishEngine` | Self-feeding pipeline of poll requests, bounded by a learned cap |
//! | `classify` | Turns a failed poll into a pipeline decision |
//! | dispatcher | Routes each response to its subscription |
//! | republish | Sequential re-delivery after reconnection |
//!
//! # Example
//!
//! ```rust,ignore
//! use hdds_ua_publish::{EngineConfig, PublishEngine};
//!
//! let engine = PublishEngine::new(&session, EngineConfig::default())?;
//! engine.register(subscription)?;
//!
//! // after the session reconnects
//! let summary = engine.recover_after_reconnect().await?;
//! ```
//!
//! The session (channel, encoding, timeouts) and the subscriptions (monitored
//! items) are collaborators, see [`Session`] and [`Subscription`].

pub mod ack_queue;
pub mod classifier;
pub mod config;
mod dispatcher;
pub mod engine;
pub mod error;
pub mod registry;
mod republish;
pub mod session;
pub mod stats;
pub mod status;
pub mod subscription;
pub mod types;

pub use ack_queue::AcknowledgementQueue;
pub use classifier::{classify, PipelineDecision};
pub use config::{ConfigError, EngineConfig};
pub use engine::PublishEngine;
pub use error::{EngineError, RecoveryError, SubscriptionError};
pub use registry::SubscriptionRegistry;
pub use republish::RecoverySummary;
pub use session::Session;
pub use stats::{EngineStats, EngineStatsSnapshot};
pub use status::StatusCode;
pub use subscription::Subscription;
pub use types::{
    next_sequence_number, NotificationData, NotificationMessage, PublishRequest, PublishResponse,
    RepublishRequest, RepublishResponse, SequenceNumber, SubscriptionAcknowledgement,
    SubscriptionId,
};
