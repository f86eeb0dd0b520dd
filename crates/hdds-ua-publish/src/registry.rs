// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subscription registry: id -> handle.

use std::collections::HashMap;
use std::sync::Arc;

use crate::subscription::Subscription;
use crate::types::SubscriptionId;

/// Registered subscriptions, keyed by server-assigned id.
#[derive(Default)]
pub struct SubscriptionRegistry {
    subscriptions: HashMap<SubscriptionId, Arc<dyn Subscription>>,
}

impl SubscriptionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a handle. Returns `false` (and keeps the existing one) if the id
    /// is already taken.
    pub fn insert(&mut self, subscription: Arc<dyn Subscription>) -> bool {
        let id = subscription.id();
        if self.subscriptions.contains_key(&id) {
            return false;
        }
        self.subscriptions.insert(id, subscription);
        true
    }

    pub fn remove(&mut self, id: SubscriptionId) -> Option<Arc<dyn Subscription>> {
        self.subscriptions.remove(&id)
    }

    #[must_use]
    pub fn get(&self, id: SubscriptionId) -> Option<Arc<dyn Subscription>> {
        self.subscriptions.get(&id).cloned()
    }

    #[must_use]
    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.subscriptions.contains_key(&id)
    }

    /// Registered ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<SubscriptionId> {
        let mut ids: Vec<_> = self.subscriptions.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Snapshot of all handles, for recovery fan-out.
    #[must_use]
    pub fn handles(&self) -> Vec<Arc<dyn Subscription>> {
        self.subscriptions.values().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Largest acknowledgement-timeout hint among registered subscriptions.
    #[must_use]
    pub fn max_timeout_hint_ms(&self) -> Option<u32> {
        self.subscriptions
            .values()
            .map(|s| s.timeout_hint_ms())
            .max()
    }
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}
