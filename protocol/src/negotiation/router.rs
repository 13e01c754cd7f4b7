//! Routing of inbound messages to concurrently running negotiations.
//!
//! Each negotiation runs as its own task and owns its context outright;
//! the router only holds the sending half of each task's inbox, keyed by
//! `txId`. The shared keychain is what serializes coin selection across
//! them.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::context::PaymentRequest;
use super::error::NegotiationError;
use super::messages::InboundMessage;
use super::sender::{NegotiationOutcome, SenderNegotiation};

/// Default inbox depth per negotiation. A negotiation consumes at most a
/// handful of messages, so this only absorbs duplicates.
pub const DEFAULT_INBOX_CAPACITY: usize = 16;

/// `txId` → inbox of the task running that negotiation.
pub struct NegotiationRouter {
    routes: DashMap<Uuid, mpsc::Sender<InboundMessage>>,
    capacity: usize,
}

impl NegotiationRouter {
    /// Empty router with the given per-negotiation inbox depth.
    pub fn new(capacity: usize) -> Self {
        Self {
            routes: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Open an inbox for `tx_id`.
    pub fn register(&self, tx_id: Uuid) -> mpsc::Receiver<InboundMessage> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.routes.insert(tx_id, tx);
        rx
    }

    /// Close the inbox for `tx_id`.
    pub fn unregister(&self, tx_id: Uuid) {
        self.routes.remove(&tx_id);
    }

    /// Number of negotiations currently routed.
    pub fn active(&self) -> usize {
        self.routes.len()
    }

    /// Deliver one message to its negotiation. Returns `false` if no
    /// negotiation with that id is running.
    pub async fn route(&self, message: InboundMessage) -> bool {
        let tx_id = message.tx_id();
        // Clone the sender out so no map guard is held across the await.
        let Some(inbox) = self.routes.get(&tx_id).map(|entry| entry.value().clone()) else {
            warn!(tx_id = %tx_id, "message for unknown negotiation dropped");
            return false;
        };
        if inbox.send(message).await.is_err() {
            debug!(tx_id = %tx_id, "negotiation finished before message arrived");
            self.unregister(tx_id);
            return false;
        }
        true
    }

    /// Start `negotiation` and spawn its event loop.
    ///
    /// The inbox is registered before the invitation goes out, so a fast
    /// reply cannot race the registration. Starting proves the change
    /// output, which is CPU-bound, so it runs on the blocking pool. If
    /// starting fails the route is removed and the cause returned.
    pub async fn launch(
        self: &Arc<Self>,
        mut negotiation: SenderNegotiation,
        request: PaymentRequest,
    ) -> Result<JoinHandle<NegotiationOutcome>, NegotiationError> {
        let tx_id = negotiation.tx_id();
        let inbox = self.register(tx_id);

        let started = tokio::task::spawn_blocking(move || {
            let result = negotiation.start(request);
            (negotiation, result)
        })
        .await;
        let negotiation = match started {
            Ok((negotiation, Ok(()))) => negotiation,
            Ok((_, Err(e))) => {
                self.unregister(tx_id);
                return Err(e);
            }
            Err(e) => {
                self.unregister(tx_id);
                return Err(NegotiationError::TaskAborted(e.to_string()));
            }
        };

        let router = Arc::clone(self);
        Ok(tokio::spawn(async move {
            let outcome = negotiation.run(inbox).await;
            router.unregister(outcome.tx_id);
            outcome
        }))
    }

    /// Route every message from `inbound` until it closes.
    pub async fn run(self: Arc<Self>, mut inbound: mpsc::Receiver<InboundMessage>) {
        while let Some(message) = inbound.recv().await {
            self.route(message).await;
        }
        debug!("inbound transport closed, router stopping");
    }
}

impl Default for NegotiationRouter {
    fn default() -> Self {
        Self::new(DEFAULT_INBOX_CAPACITY)
    }
}
