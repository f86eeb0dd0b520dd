// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publish engine aggregate and pipeline controller.
//!
//! ## Pipeline
//!
//! ```text
//! register / resume ──> replenish ──> request_send x depth
//!                                          │ (yield one turn)
//!                                          v
//!                            send_publish_request ──> Session::publish
//!                                          │
//!                                          v
//!                               on_publish_complete
//!                          ┌───────────────┴──────────────┐
//!                      Ok: dispatch                 Err: classify
//!                          └──── Continue? ──> request_send (x1)
//! ```
//!
//! Every completion that is judged non-fatal re-arms exactly one request, so
//! the pipeline keeps itself full once started. The in-flight cap is checked
//! when a send is requested and again, together with the increment, when the
//! request is actually issued.
//!
//! All mutable state sits behind one mutex that is never held across an
//! `.await` or a subscription callback.

use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;

use crate::ack_queue::AcknowledgementQueue;
use crate::classifier::{classify, throttled_cap, PipelineDecision};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::registry::SubscriptionRegistry;
use crate::session::Session;
use crate::stats::{EngineStats, EngineStatsSnapshot};
use crate::status::StatusCode;
use crate::subscription::Subscription;
use crate::types::{PublishRequest, PublishResponse, SequenceNumber, SubscriptionId};

pub(crate) struct EngineState {
    pub(crate) suspended: bool,
    /// Latched once the server reports the session closed or invalid.
    pub(crate) halted: bool,
    pub(crate) timeout_hint_ms: u32,
    pub(crate) in_flight: u32,
    pub(crate) max_in_flight: u32,
    pub(crate) registry: SubscriptionRegistry,
    pub(crate) acks: AcknowledgementQueue,
}

impl EngineState {
    fn new(config: &EngineConfig) -> Self {
        Self {
            suspended: false,
            halted: false,
            timeout_hint_ms: config.min_timeout_hint_ms,
            in_flight: 0,
            max_in_flight: config.initial_max_in_flight,
            registry: SubscriptionRegistry::new(),
            acks: AcknowledgementQueue::new(),
        }
    }

    fn can_send(&self) -> bool {
        !self.suspended && !self.halted && self.in_flight < self.max_in_flight
    }

    fn refresh_timeout_hint(&mut self, floor_ms: u32) {
        self.timeout_hint_ms = self
            .registry
            .max_timeout_hint_ms()
            .unwrap_or(0)
            .max(floor_ms);
    }
}

pub(crate) struct EngineInner {
    pub(crate) config: EngineConfig,
    session: RwLock<Option<Weak<dyn Session>>>,
    pub(crate) state: Mutex<EngineState>,
    pub(crate) stats: EngineStats,
    pub(crate) runtime: Handle,
}

/// Client-side publish engine bound to one session.
///
/// Cloning is cheap; all clones drive the same engine.
///
/// # Example
///
/// ```rust,ignore
/// let engine = PublishEngine::new(&session, EngineConfig::default())?;
/// engine.register(subscription)?;          // fills the pipeline
/// // ... connection drops and comes back ...
/// engine.recover_after_reconnect().await?; // re-delivers missed messages
/// engine.terminate();
/// ```
#[derive(Clone)]
pub struct PublishEngine {
    pub(crate) inner: Arc<EngineInner>,
}

impl PublishEngine {
    /// Create an engine driven by the current Tokio runtime.
    pub fn new(session: &Arc<dyn Session>, config: EngineConfig) -> Result<Self, EngineError> {
        let runtime = Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
        Self::with_runtime(session, config, runtime)
    }

    /// Create an engine whose tasks run on `runtime`.
    pub fn with_runtime(
        session: &Arc<dyn Session>,
        config: EngineConfig,
        runtime: Handle,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        tracing::debug!(
            "Publish engine created (depth={}, cap={})",
            config.pipeline_depth,
            config.initial_max_in_flight
        );

        Ok(Self {
            inner: Arc::new(EngineInner {
                state: Mutex::new(EngineState::new(&config)),
                config,
                session: RwLock::new(Some(Arc::downgrade(session))),
                stats: EngineStats::new(),
                runtime,
            }),
        })
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a subscription and fill the pipeline for it.
    pub fn register(&self, subscription: Arc<dyn Subscription>) -> Result<(), EngineError> {
        let id = subscription.id();
        if id == 0 {
            return Err(EngineError::InvalidSubscriptionId);
        }

        {
            let mut state = self.inner.state.lock();
            if !state.registry.insert(subscription) {
                return Err(EngineError::DuplicateSubscription(id));
            }
            state.refresh_timeout_hint(self.inner.config.min_timeout_hint_ms);
            tracing::info!(
                "Subscription {} registered ({} active, timeout hint {} ms)",
                id,
                state.registry.len(),
                state.timeout_hint_ms
            );
        }

        self.replenish();
        Ok(())
    }

    /// Unregister a subscription, dropping its pending acknowledgements.
    ///
    /// A dispatch already in progress may still deliver to the returned handle.
    pub fn unregister(&self, id: SubscriptionId) -> Result<Arc<dyn Subscription>, EngineError> {
        let mut state = self.inner.state.lock();
        let removed = state
            .registry
            .remove(id)
            .ok_or(EngineError::UnknownSubscription(id))?;
        let purged = state.acks.purge(id);
        state.refresh_timeout_hint(self.inner.config.min_timeout_hint_ms);

        tracing::info!(
            "Subscription {} unregistered ({} active, {} acknowledgements purged)",
            id,
            state.registry.len(),
            purged
        );
        Ok(removed)
    }

    /// Queue an acknowledgement for the next poll request.
    ///
    /// Ignored for subscriptions that are not registered.
    pub fn acknowledge(&self, id: SubscriptionId, sequence_number: SequenceNumber) {
        let mut state = self.inner.state.lock();
        if state.registry.contains(id) {
            state.acks.push(id, sequence_number);
        } else {
            tracing::trace!(
                "Acknowledgement {}#{} ignored: subscription not registered",
                id,
                sequence_number
            );
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Suspend or resume the pipeline. Resuming refills it.
    ///
    /// Requesting the current state is rejected.
    pub fn suspend(&self, suspended: bool) -> Result<(), EngineError> {
        {
            let mut state = self.inner.state.lock();
            match (state.suspended, suspended) {
                (true, true) => return Err(EngineError::AlreadySuspended),
                (false, false) => return Err(EngineError::NotSuspended),
                _ => state.suspended = suspended,
            }
        }

        if suspended {
            tracing::debug!("Publish engine suspended");
        } else {
            tracing::debug!("Publish engine resumed");
            self.replenish();
        }
        Ok(())
    }

    /// Detach the session. Every pending continuation becomes a no-op.
    pub fn terminate(&self) {
        if self.inner.session.write().take().is_some() {
            tracing::info!("Publish engine terminated");
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub fn active_subscription_count(&self) -> usize {
        self.inner.state.lock().registry.len()
    }

    /// Registered subscription ids, ascending.
    #[must_use]
    pub fn subscription_ids(&self) -> Vec<SubscriptionId> {
        self.inner.state.lock().registry.ids()
    }

    #[must_use]
    pub fn subscription(&self, id: SubscriptionId) -> Option<Arc<dyn Subscription>> {
        self.inner.state.lock().registry.get(id)
    }

    #[must_use]
    pub fn has_subscription(&self, id: SubscriptionId) -> bool {
        self.inner.state.lock().registry.contains(id)
    }

    #[must_use]
    pub fn in_flight(&self) -> u32 {
        self.inner.state.lock().in_flight
    }

    /// Learned in-flight cap.
    #[must_use]
    pub fn max_in_flight(&self) -> u32 {
        self.inner.state.lock().max_in_flight
    }

    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.inner.state.lock().suspended
    }

    /// Whether the server reported the session closed or invalid.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.inner.state.lock().halted
    }

    /// Session detached or dropped.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.session().is_none()
    }

    #[must_use]
    pub fn timeout_hint_ms(&self) -> u32 {
        self.inner.state.lock().timeout_hint_ms
    }

    #[must_use]
    pub fn pending_acknowledgements(&self) -> usize {
        self.inner.state.lock().acks.len()
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn stats(&self) -> EngineStatsSnapshot {
        self.inner.stats.snapshot()
    }

    pub(crate) fn session(&self) -> Option<Arc<dyn Session>> {
        self.inner.session.read().as_ref().and_then(Weak::upgrade)
    }

    // ========================================================================
    // Pipeline controller
    // ========================================================================

    /// Issue `pipeline_depth` requests back-to-back.
    pub(crate) fn replenish(&self) {
        if self.active_subscription_count() == 0 {
            return;
        }
        for _ in 0..self.inner.config.pipeline_depth {
            self.request_send();
        }
    }

    /// Attempt to issue one poll request.
    pub(crate) fn request_send(&self) {
        let Some(session) = self.session() else {
            tracing::trace!("Publish engine terminated, send skipped");
            return;
        };
        if !self.inner.state.lock().can_send() {
            return;
        }

        let engine = self.clone();
        if !session.is_channel_valid() {
            let interval = self.inner.config.poll_interval();
            self.inner.runtime.spawn(async move {
                tokio::time::sleep(interval).await;
                if engine.active_subscription_count() == 0 {
                    return;
                }
                engine.request_send();
            });
            return;
        }

        self.inner.runtime.spawn(async move {
            // Let a just-set suspension or termination land before sending.
            tokio::task::yield_now().await;
            engine.send_publish_request().await;
        });
    }

    async fn send_publish_request(&self) {
        let Some(session) = self.session() else {
            tracing::trace!("Publish engine terminated before send");
            return;
        };

        let request = {
            let mut state = self.inner.state.lock();
            if !state.can_send() {
                return;
            }
            state.in_flight += 1;
            PublishRequest {
                timeout_hint_ms: state.timeout_hint_ms.saturating_mul(state.in_flight),
                acknowledgements: state.acks.take(),
            }
        };

        EngineStats::bump(&self.inner.stats.publish_sent);
        EngineStats::add(
            &self.inner.stats.acknowledgements_sent,
            request.acknowledgements.len() as u64,
        );
        tracing::trace!(
            "Publish request sent (timeout hint {} ms, {} acknowledgements)",
            request.timeout_hint_ms,
            request.acknowledgements.len()
        );

        let result = session.publish(request).await;
        drop(session);
        self.on_publish_complete(result);
    }

    /// Completion handler: account, classify, dispatch, re-arm.
    fn on_publish_complete(&self, result: Result<PublishResponse, StatusCode>) {
        let decision = {
            let mut state = self.inner.state.lock();
            let in_flight_at_completion = state.in_flight;
            state.in_flight = state.in_flight.saturating_sub(1);

            match &result {
                Ok(_) => PipelineDecision::Continue,
                Err(status) => {
                    let decision = classify(*status, state.registry.len());
                    match decision {
                        PipelineDecision::Throttle => {
                            let cap = throttled_cap(state.max_in_flight, in_flight_at_completion);
                            tracing::warn!(
                                "Server rejected publish request ({}); in-flight cap {} -> {}",
                                status,
                                state.max_in_flight,
                                cap
                            );
                            state.max_in_flight = cap;
                        }
                        PipelineDecision::SessionLost => state.halted = true,
                        _ => {}
                    }
                    decision
                }
            }
        };

        match result {
            Ok(response) => {
                EngineStats::bump(&self.inner.stats.publish_succeeded);
                self.dispatch(response);
            }
            Err(status) => {
                EngineStats::bump(&self.inner.stats.publish_failed);
                self.log_publish_failure(status, decision);
            }
        }

        if decision.rearms() && self.active_subscription_count() > 0 {
            self.request_send();
        }
    }

    fn log_publish_failure(&self, status: StatusCode, decision: PipelineDecision) {
        match decision {
            PipelineDecision::AwaitReconnect => {
                tracing::debug!("Publish failed ({}); waiting for reconnection", status);
            }
            PipelineDecision::Disagreement => {
                tracing::warn!(
                    "Server reports no subscription while {} are active locally; publishing stopped",
                    self.active_subscription_count()
                );
            }
            PipelineDecision::SessionLost => {
                tracing::warn!("Publish failed ({}); session lost, pipeline halted", status);
            }
            PipelineDecision::Throttle => {
                EngineStats::bump(&self.inner.stats.throttle_events);
            }
            PipelineDecision::Skip | PipelineDecision::Continue => {
                tracing::debug!("Publish failed ({}); skipping this cycle", status);
            }
        }
    }
}

impl std::fmt::Debug for PublishEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("PublishEngine")
            .field("suspended", &state.suspended)
            .field("halted", &state.halted)
            .field("in_flight", &state.in_flight)
            .field("max_in_flight", &state.max_in_flight)
            .field("registry", &state.registry)
            .field("pending_acks", &state.acks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubscriptionError;
    use crate::types::{NotificationMessage, RepublishRequest, RepublishResponse};
    use async_trait::async_trait;

    /// Session whose requests never complete.
    struct StalledSession;

    #[async_trait]
    impl Session for StalledSession {
        async fn publish(&self, _request: PublishRequest) -> Result<PublishResponse, StatusCode> {
            std::future::pending().await
        }
        async fn republish(
            &self,
            _request: RepublishRequest,
        ) -> Result<RepublishResponse, StatusCode> {
            Err(StatusCode::BadMessageNotAvailable)
        }
        fn is_channel_valid(&self) -> bool {
            true
        }
        fn is_closed(&self) -> bool {
            false
        }
    }

    struct Quiet {
        id: SubscriptionId,
        hint: u32,
    }

    #[async_trait]
    impl Subscription for Quiet {
        fn id(&self) -> SubscriptionId {
            self.id
        }
        fn timeout_hint_ms(&self) -> u32 {
            self.hint
        }
        fn last_sequence_number(&self) -> SequenceNumber {
            0
        }
        fn on_notification(&self, _message: NotificationMessage) -> Result<(), SubscriptionError> {
            Ok(())
        }
        async fn recreate(&self) -> Result<(), SubscriptionError> {
            Ok(())
        }
    }

    fn engine(session: &Arc<dyn Session>) -> PublishEngine {
        PublishEngine::new(session, EngineConfig::default()).expect("engine")
    }

    #[test]
    fn test_new_requires_runtime() {
        let session: Arc<dyn Session> = Arc::new(StalledSession);
        let result = PublishEngine::new(&session, EngineConfig::default());
        assert!(matches!(result, Err(EngineError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let session: Arc<dyn Session> = Arc::new(StalledSession);
        let result = PublishEngine::new(&session, EngineConfig::default().pipeline_depth(0));
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[tokio::test]
    async fn test_register_contract() {
        let session: Arc<dyn Session> = Arc::new(StalledSession);
        let engine = engine(&session);

        assert!(matches!(
            engine.register(Arc::new(Quiet { id: 0, hint: 0 })),
            Err(EngineError::InvalidSubscriptionId)
        ));
        engine
            .register(Arc::new(Quiet { id: 4, hint: 3000 }))
            .expect("register");
        assert!(matches!(
            engine.register(Arc::new(Quiet { id: 4, hint: 9000 })),
            Err(EngineError::DuplicateSubscription(4))
        ));

        assert_eq!(engine.active_subscription_count(), 1);
        assert_eq!(engine.timeout_hint_ms(), 3000);
        assert!(engine.has_subscription(4));
        assert!(matches!(
            engine.unregister(5),
            Err(EngineError::UnknownSubscription(5))
        ));
    }

    #[tokio::test]
    async fn test_timeout_hint_follows_registry() {
        let session: Arc<dyn Session> = Arc::new(StalledSession);
        let engine = PublishEngine::new(
            &session,
            EngineConfig::default().min_timeout_hint_ms(1000),
        )
        .expect("engine");
        assert_eq!(engine.timeout_hint_ms(), 1000);

        engine
            .register(Arc::new(Quiet { id: 1, hint: 5000 }))
            .expect("register");
        engine
            .register(Arc::new(Quiet { id: 2, hint: 8000 }))
            .expect("register");
        assert_eq!(engine.timeout_hint_ms(), 8000);

        engine.unregister(2).expect("unregister");
        assert_eq!(engine.timeout_hint_ms(), 5000);
        engine.unregister(1).expect("unregister");
        assert_eq!(engine.timeout_hint_ms(), 1000);
    }

    #[tokio::test]
    async fn test_suspend_contract() {
        let session: Arc<dyn Session> = Arc::new(StalledSession);
        let engine = engine(&session);

        assert!(matches!(
            engine.suspend(false),
            Err(EngineError::NotSuspended)
        ));
        engine.suspend(true).expect("suspend");
        assert!(engine.is_suspended());
        assert!(matches!(
            engine.suspend(true),
            Err(EngineError::AlreadySuspended)
        ));
        engine.suspend(false).expect("resume");
        assert!(!engine.is_suspended());
    }

    #[tokio::test]
    async fn test_acknowledge_requires_registration() {
        let session: Arc<dyn Session> = Arc::new(StalledSession);
        let engine = engine(&session);
        engine.suspend(true).expect("suspend");

        engine.acknowledge(9, 1);
        assert_eq!(engine.pending_acknowledgements(), 0);

        engine
            .register(Arc::new(Quiet { id: 9, hint: 0 }))
            .expect("register");
        engine.acknowledge(9, 1);
        engine.acknowledge(9, 2);
        assert_eq!(engine.pending_acknowledgements(), 2);

        engine.unregister(9).expect("unregister");
        assert_eq!(engine.pending_acknowledgements(), 0);
    }

    #[tokio::test]
    async fn test_terminate_is_idempotent() {
        let session: Arc<dyn Session> = Arc::new(StalledSession);
        let engine = engine(&session);
        assert!(!engine.is_terminated());

        engine.terminate();
        engine.terminate();
        assert!(engine.is_terminated());
    }

    #[tokio::test]
    async fn test_dropped_session_counts_as_terminated() {
        let session: Arc<dyn Session> = Arc::new(StalledSession);
        let engine = engine(&session);
        drop(session);
        assert!(engine.is_terminated());
    }
}
