// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scripted session and recording subscription shared by integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use hdds_ua_publish::{
    EngineConfig, NotificationData, NotificationMessage, PublishEngine, PublishRequest,
    PublishResponse, RepublishRequest, RepublishResponse, SequenceNumber, Session, StatusCode,
    Subscription, SubscriptionError, SubscriptionId,
};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

pub const WAIT: Duration = Duration::from_secs(2);

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Session
// ============================================================================

/// A publish request parked until the test answers it.
pub struct PendingPublish {
    pub request: PublishRequest,
    reply: oneshot::Sender<Result<PublishResponse, StatusCode>>,
}

impl PendingPublish {
    pub fn respond(self, result: Result<PublishResponse, StatusCode>) {
        let _ = self.reply.send(result);
    }

    pub fn keep_alive(self, subscription_id: SubscriptionId, seq: SequenceNumber) {
        self.respond(Ok(PublishResponse::new(
            subscription_id,
            NotificationMessage::keep_alive(seq),
        )));
    }

    pub fn data(self, subscription_id: SubscriptionId, seq: SequenceNumber) {
        self.respond(Ok(PublishResponse::new(
            subscription_id,
            data_message(seq),
        )));
    }

    pub fn fail(self, status: StatusCode) {
        self.respond(Err(status));
    }
}

pub fn data_message(seq: SequenceNumber) -> NotificationMessage {
    NotificationMessage::new(seq, vec![NotificationData(vec![0xCA, 0xFE])])
}

pub struct MockSession {
    publishes: mpsc::UnboundedSender<PendingPublish>,
    republish_script: Mutex<HashMap<SubscriptionId, VecDeque<Result<NotificationMessage, StatusCode>>>>,
    pub republish_requests: Mutex<Vec<RepublishRequest>>,
    pub channel_valid: AtomicBool,
    pub closed: AtomicBool,
}

impl MockSession {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PendingPublish>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Arc::new(Self {
            publishes: tx,
            republish_script: Mutex::new(HashMap::new()),
            republish_requests: Mutex::new(Vec::new()),
            channel_valid: AtomicBool::new(true),
            closed: AtomicBool::new(false),
        });
        (session, rx)
    }

    /// Queue republish answers for one subscription, consumed in order.
    /// Once exhausted, the session answers `BadMessageNotAvailable`.
    pub fn script_republish(
        &self,
        subscription_id: SubscriptionId,
        answers: Vec<Result<NotificationMessage, StatusCode>>,
    ) {
        self.republish_script
            .lock()
            .entry(subscription_id)
            .or_default()
            .extend(answers);
    }

    pub fn republished_for(&self, subscription_id: SubscriptionId) -> Vec<SequenceNumber> {
        self.republish_requests
            .lock()
            .iter()
            .filter(|r| r.subscription_id == subscription_id)
            .map(|r| r.retransmit_sequence_number)
            .collect()
    }
}

#[async_trait]
impl Session for MockSession {
    async fn publish(&self, request: PublishRequest) -> Result<PublishResponse, StatusCode> {
        let (reply, rx) = oneshot::channel();
        if self.publishes.send(PendingPublish { request, reply }).is_err() {
            return Err(StatusCode::BadConnectionClosed);
        }
        rx.await.unwrap_or(Err(StatusCode::BadConnectionClosed))
    }

    async fn republish(&self, request: RepublishRequest) -> Result<RepublishResponse, StatusCode> {
        self.republish_requests.lock().push(request);
        let answer = self
            .republish_script
            .lock()
            .get_mut(&request.subscription_id)
            .and_then(VecDeque::pop_front);
        match answer {
            Some(Ok(notification)) => Ok(RepublishResponse { notification }),
            Some(Err(status)) => Err(status),
            None => Err(StatusCode::BadMessageNotAvailable),
        }
    }

    fn is_channel_valid(&self) -> bool {
        self.channel_valid.load(Ordering::SeqCst)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Subscription
// ============================================================================

pub struct RecordingSubscription {
    id: SubscriptionId,
    timeout_hint_ms: u32,
    last: AtomicU32,
    pub received: Mutex<Vec<NotificationMessage>>,
    pub fail_delivery: AtomicBool,
    pub recreate_calls: AtomicUsize,
    recreate_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl RecordingSubscription {
    pub fn new(id: SubscriptionId, timeout_hint_ms: u32) -> Arc<Self> {
        Self::starting_at(id, timeout_hint_ms, 0)
    }

    pub fn starting_at(
        id: SubscriptionId,
        timeout_hint_ms: u32,
        last: SequenceNumber,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            timeout_hint_ms,
            last: AtomicU32::new(last),
            received: Mutex::new(Vec::new()),
            fail_delivery: AtomicBool::new(false),
            recreate_calls: AtomicUsize::new(0),
            recreate_gate: Mutex::new(None),
        })
    }

    /// Make `recreate` block until the returned sender fires.
    pub fn gate_recreate(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.recreate_gate.lock() = Some(rx);
        tx
    }

    pub fn received_sequence_numbers(&self) -> Vec<SequenceNumber> {
        self.received
            .lock()
            .iter()
            .map(|m| m.sequence_number)
            .collect()
    }
}

#[async_trait]
impl Subscription for RecordingSubscription {
    fn id(&self) -> SubscriptionId {
        self.id
    }

    fn timeout_hint_ms(&self) -> u32 {
        self.timeout_hint_ms
    }

    fn last_sequence_number(&self) -> SequenceNumber {
        self.last.load(Ordering::SeqCst)
    }

    fn on_notification(&self, message: NotificationMessage) -> Result<(), SubscriptionError> {
        if !message.is_keep_alive() {
            self.last.store(message.sequence_number, Ordering::SeqCst);
        }
        self.received.lock().push(message);
        if self.fail_delivery.load(Ordering::SeqCst) {
            return Err(SubscriptionError::Handler("rejected by test".into()));
        }
        Ok(())
    }

    async fn recreate(&self) -> Result<(), SubscriptionError> {
        self.recreate_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.recreate_gate.lock().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub session: Arc<MockSession>,
    /// Strong reference kept so the engine's weak handle stays alive.
    pub dyn_session: Arc<dyn Session>,
    pub engine: PublishEngine,
    pub publishes: mpsc::UnboundedReceiver<PendingPublish>,
}

impl Harness {
    pub fn new(config: EngineConfig) -> Self {
        init_tracing();
        let (session, publishes) = MockSession::new();
        let dyn_session: Arc<dyn Session> = session.clone();
        let engine = PublishEngine::new(&dyn_session, config).expect("engine");
        Self {
            session,
            dyn_session,
            engine,
            publishes,
        }
    }

    pub fn register(&self, subscription: &Arc<RecordingSubscription>) {
        let handle: Arc<dyn Subscription> = subscription.clone();
        self.engine.register(handle).expect("register");
    }

    pub async fn next_publish(&mut self) -> PendingPublish {
        tokio::time::timeout(WAIT, self.publishes.recv())
            .await
            .expect("publish request within timeout")
            .expect("publish channel open")
    }

    pub async fn take_publishes(&mut self, n: usize) -> Vec<PendingPublish> {
        let mut pending = Vec::with_capacity(n);
        for _ in 0..n {
            pending.push(self.next_publish().await);
        }
        pending
    }

    /// Assert no publish request shows up within `window`.
    pub async fn expect_no_publish(&mut self, window: Duration) {
        if let Ok(Some(pending)) = tokio::time::timeout(window, self.publishes.recv()).await {
            panic!("unexpected publish request: {:?}", pending.request);
        }
    }
}

/// Poll `condition` until it holds or the wait budget runs out.
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within {:?}",
            WAIT
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
