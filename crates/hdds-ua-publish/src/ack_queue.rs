// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Pending acknowledgements, piggybacked on the next poll request.

use std::mem;

use crate::types::{SequenceNumber, SubscriptionAcknowledgement, SubscriptionId};

/// Ordered acknowledgements awaiting transmission.
///
/// `take` swaps the contents out, so every queued acknowledgement rides on
/// exactly one outgoing request.
#[derive(Debug, Default)]
pub struct AcknowledgementQueue {
    pending: Vec<SubscriptionAcknowledgement>,
}

impl AcknowledgementQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subscription_id: SubscriptionId, sequence_number: SequenceNumber) {
        self.pending
            .push(SubscriptionAcknowledgement::new(subscription_id, sequence_number));
    }

    /// Drop every pending acknowledgement for `subscription_id`.
    pub fn purge(&mut self, subscription_id: SubscriptionId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|ack| ack.subscription_id != subscription_id);
        before - self.pending.len()
    }

    /// Detach the current contents for one outgoing request.
    pub fn take(&mut self) -> Vec<SubscriptionAcknowledgement> {
        mem::take(&mut self.pending)
    }

    #[must_use]
    pub fn contains(&self, subscription_id: SubscriptionId) -> bool {
        self.pending
            .iter()
            .any(|ack| ack.subscription_id == subscription_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
