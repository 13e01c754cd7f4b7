//! # Sender Negotiation Driver
//!
//! Owns one negotiation: its state, its [`TransactionContext`] and handles
//! to the shared keychain, gateway and proof system. Every event goes
//! through [`transition`]; the resulting effects are executed in order and
//! only then is the new state adopted.
//!
//! Transient states (`Invited`, `Confirmed`) are left immediately by
//! feeding [`Event::Advance`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::context::{Funding, PaymentRequest, TransactionContext};
use super::error::NegotiationError;
use super::messages::InboundMessage;
use super::state::{transition, Effect, Environment, Event, SenderState};
use crate::config::NegotiationConfig;
use crate::gateway::Gateway;
use crate::keychain::{Keychain, KeychainError};
use crate::transaction::CoinId;
use crate::zkp::ProofSystem;

/// How a negotiation ended (or where it stalled).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NegotiationOutcome {
    /// Negotiation id.
    pub tx_id: Uuid,
    /// Final state.
    pub state: SenderState,
}

/// The sender side of one payment negotiation.
pub struct SenderNegotiation {
    tx_id: Uuid,
    state: SenderState,
    context: Option<TransactionContext>,
    keychain: Arc<dyn Keychain>,
    gateway: Arc<dyn Gateway>,
    proofs: Arc<ProofSystem>,
    config: NegotiationConfig,
}

impl SenderNegotiation {
    /// A fresh negotiation in `Init` with a newly generated id.
    pub fn new(
        keychain: Arc<dyn Keychain>,
        gateway: Arc<dyn Gateway>,
        proofs: Arc<ProofSystem>,
        config: NegotiationConfig,
    ) -> Self {
        Self {
            tx_id: Uuid::new_v4(),
            state: SenderState::Init,
            context: None,
            keychain,
            gateway,
            proofs,
            config,
        }
    }

    /// Negotiation id.
    pub fn tx_id(&self) -> Uuid {
        self.tx_id
    }

    /// Current state.
    pub fn state(&self) -> &SenderState {
        &self.state
    }

    /// The transaction context, once started.
    pub fn context(&self) -> Option<&TransactionContext> {
        self.context.as_ref()
    }

    /// Snapshot of id and state.
    pub fn outcome(&self) -> NegotiationOutcome {
        NegotiationOutcome {
            tx_id: self.tx_id,
            state: self.state.clone(),
        }
    }

    /// initTx: select and lock coins, derive the change key, then build,
    /// store and send.
    ///
    /// Fails without touching the keychain for a zero amount, and without
    /// touching the gateway when funds are insufficient. Returns the cause
    /// if the negotiation ended in `Failed`.
    pub fn start(&mut self, request: PaymentRequest) -> Result<(), NegotiationError> {
        if self.state != SenderState::Init {
            return Err(NegotiationError::InvalidState {
                state: self.state.name(),
                event: "Start",
            });
        }
        info!(tx_id = %self.tx_id, amount = request.amount, "starting negotiation");

        if request.amount == 0 {
            return self.abort(NegotiationError::ZeroAmount);
        }

        let coins = match self.keychain.select_coins(request.amount) {
            Ok(coins) => coins,
            Err(e) => return self.abort(e.into()),
        };

        let change_key = match self.keychain.derive_blinding_factor() {
            Ok(key) => key,
            Err(e) => {
                let ids: Vec<_> = coins.iter().map(|c| c.id).collect();
                self.release(&ids, None);
                return self.abort(e.into());
            }
        };

        self.apply(Event::Start(Funding {
            tx_id: self.tx_id,
            request,
            coins,
            change_key,
        }))?;

        match &self.state {
            SenderState::Failed(cause) => Err(cause.clone()),
            _ => Ok(()),
        }
    }

    /// Feed one inbound message. `Err` means it was rejected and the state
    /// did not change.
    pub fn handle(&mut self, message: InboundMessage) -> Result<&SenderState, NegotiationError> {
        let event = match message {
            InboundMessage::TxInitCompleted(m) => Event::TxInitCompleted(m),
            InboundMessage::TxOutputConfirmCompleted(m) => Event::TxOutputConfirmCompleted(m),
            InboundMessage::TxFailed(m) => Event::TxFailed(m),
        };
        self.apply(event)?;
        Ok(&self.state)
    }

    /// Process inbound messages until the negotiation is terminal or the
    /// inbox closes. Suspends on the channel between events.
    pub async fn run(mut self, mut inbox: mpsc::Receiver<InboundMessage>) -> NegotiationOutcome {
        while !self.state.is_terminal() {
            let Some(message) = inbox.recv().await else {
                warn!(tx_id = %self.tx_id, state = self.state.name(), "inbox closed before completion");
                break;
            };
            if let Err(e) = self.handle(message) {
                warn!(tx_id = %self.tx_id, error = %e, "inbound message rejected");
            }
        }
        self.outcome()
    }

    fn abort(&mut self, cause: NegotiationError) -> Result<(), NegotiationError> {
        warn!(tx_id = %self.tx_id, error = %cause, "negotiation failed before invitation");
        self.state = SenderState::Failed(cause.clone());
        Err(cause)
    }

    fn apply(&mut self, event: Event) -> Result<(), NegotiationError> {
        let mut next = Some(event);
        while let Some(event) = next.take() {
            self.step(event)?;
            if self.state.is_transient() {
                next = Some(Event::Advance);
            }
        }
        Ok(())
    }

    fn step(&mut self, event: Event) -> Result<(), NegotiationError> {
        let env = Environment {
            config: &self.config,
            proofs: &self.proofs,
        };
        let outcome = transition(&self.state, event, &mut self.context, &env)?;

        if let Err(e) = self.execute_all(&outcome.effects) {
            return self.storage_failed(e);
        }

        if outcome.state != self.state {
            info!(
                tx_id = %self.tx_id,
                from = self.state.name(),
                to = outcome.state.name(),
                "state transition"
            );
        }
        self.state = outcome.state;
        Ok(())
    }

    /// Re-enter the previous state with `StorageFailed`; its effects are
    /// best-effort releases, so no further storage failure can occur.
    fn storage_failed(&mut self, error: KeychainError) -> Result<(), NegotiationError> {
        warn!(tx_id = %self.tx_id, state = self.state.name(), error = %error, "storage effect failed");
        let env = Environment {
            config: &self.config,
            proofs: &self.proofs,
        };
        let outcome = transition(
            &self.state,
            Event::StorageFailed(error.to_string()),
            &mut self.context,
            &env,
        )?;
        self.execute_all(&outcome.effects)?;
        self.state = outcome.state;
        Ok(())
    }

    fn execute_all(&self, effects: &[Effect]) -> Result<(), KeychainError> {
        for effect in effects {
            self.execute(effect)?;
        }
        Ok(())
    }

    fn execute(&self, effect: &Effect) -> Result<(), KeychainError> {
        match effect {
            Effect::StoreCoin(coin) => {
                debug!(tx_id = %self.tx_id, coin = %coin.id, "storing change coin");
                self.keychain.store(coin)?;
            }
            Effect::SendInvitation(invitation) => {
                debug!(tx_id = %self.tx_id, "sending invitation");
                self.gateway.send_invitation(invitation.clone());
            }
            Effect::SendConfirmation(confirmation) => {
                debug!(tx_id = %self.tx_id, "sending confirmation");
                self.gateway.send_confirmation(confirmation.clone());
            }
            Effect::SendOutputConfirmation(confirmation) => {
                debug!(tx_id = %self.tx_id, "sending output confirmation");
                self.gateway.send_output_confirmation(confirmation.clone());
            }
            Effect::ReleaseCoins { inputs, change } => {
                self.release(inputs, *change);
            }
            Effect::PersistCoins(coins) => {
                debug!(tx_id = %self.tx_id, coins = coins.len(), "persisting settled coins");
                self.keychain.persist(coins)?;
            }
        }
        Ok(())
    }

    fn release(&self, inputs: &[CoinId], change: Option<CoinId>) {
        match self.keychain.release(inputs) {
            Ok(()) => info!(tx_id = %self.tx_id, inputs = inputs.len(), "coin locks released"),
            Err(e) => warn!(tx_id = %self.tx_id, error = %e, "failed to release locked coins"),
        }
        if let Some(change) = change {
            // The change coin may never have reached storage.
            if let Err(e) = self.keychain.discard(change) {
                debug!(tx_id = %self.tx_id, coin = %change, error = %e, "change coin not discarded");
            }
        }
    }
}
