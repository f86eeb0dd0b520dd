// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Request and response shapes exchanged with the session.
//!
//! Wire encoding belongs to the session; these are plain values.

use std::time::SystemTime;

use crate::status::StatusCode;

/// Server-assigned subscription identifier. Zero is never valid.
pub type SubscriptionId = u32;

/// Per-subscription notification sequence number.
pub type SequenceNumber = u32;

/// Sequence number following `seq`, wrapping from `u32::MAX` back to 1.
///
/// Zero is reserved and never assigned to a notification message.
#[must_use]
pub fn next_sequence_number(seq: SequenceNumber) -> SequenceNumber {
    if seq == SequenceNumber::MAX {
        1
    } else {
        seq + 1
    }
}

/// Acknowledgement of one received notification message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionAcknowledgement {
    pub subscription_id: SubscriptionId,
    pub sequence_number: SequenceNumber,
}

impl SubscriptionAcknowledgement {
    #[must_use]
    pub fn new(subscription_id: SubscriptionId, sequence_number: SequenceNumber) -> Self {
        Self {
            subscription_id,
            sequence_number,
        }
    }
}

/// Opaque encoded notification item (data change, event, status change).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotificationData(pub Vec<u8>);

/// A sequence-numbered batch of notifications for one subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub sequence_number: SequenceNumber,
    pub publish_time: SystemTime,
    pub notification_data: Vec<NotificationData>,
}

impl NotificationMessage {
    /// Message carrying data items.
    #[must_use]
    pub fn new(sequence_number: SequenceNumber, notification_data: Vec<NotificationData>) -> Self {
        Self {
            sequence_number,
            publish_time: SystemTime::now(),
            notification_data,
        }
    }

    /// Keep-alive message: no data, must not be acknowledged.
    #[must_use]
    pub fn keep_alive(sequence_number: SequenceNumber) -> Self {
        Self::new(sequence_number, Vec::new())
    }

    #[must_use]
    pub fn is_keep_alive(&self) -> bool {
        self.notification_data.is_empty()
    }
}

/// Outgoing poll request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PublishRequest {
    /// How long the server may hold this request, in milliseconds.
    pub timeout_hint_ms: u32,
    pub acknowledgements: Vec<SubscriptionAcknowledgement>,
}

/// Poll response routed to one subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResponse {
    pub subscription_id: SubscriptionId,
    pub notification: NotificationMessage,
    /// Sequence numbers the server still holds for retransmission.
    pub available_sequence_numbers: Vec<SequenceNumber>,
    pub more_notifications: bool,
    /// One result per acknowledgement carried by the originating request.
    pub results: Vec<StatusCode>,
}

impl PublishResponse {
    #[must_use]
    pub fn new(subscription_id: SubscriptionId, notification: NotificationMessage) -> Self {
        Self {
            subscription_id,
            notification,
            available_sequence_numbers: Vec::new(),
            more_notifications: false,
            results: Vec::new(),
        }
    }
}

/// Request to retransmit one notification message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepublishRequest {
    pub subscription_id: SubscriptionId,
    pub retransmit_sequence_number: SequenceNumber,
}

/// Successful retransmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepublishResponse {
    pub notification: NotificationMessage,
}
