// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Session collaborator contract.
//!
//! The session owns the secure channel, request encoding and per-request
//! timeouts. The engine only issues requests and checks channel health.

use async_trait::async_trait;

use crate::status::StatusCode;
use crate::types::{PublishRequest, PublishResponse, RepublishRequest, RepublishResponse};

/// Established session to the server.
///
/// The engine holds it weakly: dropping the last strong reference terminates
/// the engine just like [`crate::PublishEngine::terminate`].
#[async_trait]
pub trait Session: Send + Sync {
    /// Issue one poll request and wait for its response.
    async fn publish(&self, request: PublishRequest) -> Result<PublishResponse, StatusCode>;

    /// Ask the server to retransmit one notification message.
    async fn republish(&self, request: RepublishRequest) -> Result<RepublishResponse, StatusCode>;

    /// Whether the underlying channel can carry a request right now.
    fn is_channel_valid(&self) -> bool;

    /// Whether the session has been closed.
    fn is_closed(&self) -> bool;
}
